//! Spreadsheet package access
//!
//! Locates the first worksheet and the shared-string table inside the zip
//! container. Part locations come from the workbook relationships; packages
//! without usable relationships fall back to the conventional part names.

use super::{DecodeError, SharedStrings, SheetRows};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::{debug, warn};
use zip::read::ZipFile;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const DEFAULT_SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const WORKSHEET_PREFIX: &str = "xl/worksheets/sheet";
const SHARED_STRINGS_REL_SUFFIX: &str = "/sharedStrings";
/// Upper bound on buffer space reserved from a part's declared size
const MAX_PREALLOCATION: u64 = 1024 * 1024;

/// Rows of a worksheet streamed straight out of the archive
pub type WorksheetRows<'a> = SheetRows<'a, BufReader<ZipFile<'a>>>;

/// An opened spreadsheet package
pub struct Workbook<R: Read + Seek = File> {
    archive: ZipArchive<R>,
    sheet_part: Option<String>,
    shared_strings: Option<SharedStrings>,
}

impl Workbook<File> {
    /// Open a package from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let file = File::open(path.as_ref())?;
        Self::new(file)
    }
}

impl<R: Read + Seek> Workbook<R> {
    /// Read the package directory, locate the first sheet and load the
    /// shared-string table
    pub fn new(reader: R) -> Result<Self, DecodeError> {
        let mut archive = ZipArchive::new(reader)?;

        let relationships = match read_part(&mut archive, WORKBOOK_RELS_PART)? {
            Some(bytes) => parse_relationships(&bytes)?,
            None => HashMap::new(),
        };

        let sheet_part = match read_part(&mut archive, WORKBOOK_PART)? {
            Some(bytes) => first_sheet_relationship(&bytes)?
                .and_then(|id| relationships.get(&id))
                .map(|rel| resolve_target(&rel.target))
                .filter(|part| has_part(&archive, part)),
            None => None,
        }
        .or_else(|| lowest_numbered_sheet(&archive));

        let strings_part = relationships
            .values()
            .find(|rel| rel.kind.ends_with(SHARED_STRINGS_REL_SUFFIX))
            .map(|rel| resolve_target(&rel.target))
            .filter(|part| has_part(&archive, part))
            .or_else(|| {
                has_part(&archive, DEFAULT_SHARED_STRINGS_PART)
                    .then(|| DEFAULT_SHARED_STRINGS_PART.to_string())
            });

        let shared_strings = match strings_part {
            Some(part) => {
                let entry = archive.by_name(&part)?;
                let table = SharedStrings::parse(BufReader::new(entry))?;
                debug!(part = %part, strings = table.len(), "Loaded shared strings");
                Some(table)
            }
            None => None,
        };

        Ok(Self {
            archive,
            sheet_part,
            shared_strings,
        })
    }

    /// Archive path of the worksheet that will be decoded
    pub fn sheet_part(&self) -> Option<&str> {
        self.sheet_part.as_deref()
    }

    pub fn shared_strings(&self) -> Option<&SharedStrings> {
        self.shared_strings.as_ref()
    }

    /// Stream the data rows of the first worksheet
    ///
    /// Returns `None` when the package has no worksheet or no shared-string
    /// table; such a package contributes no rows.
    pub fn first_sheet_rows(&mut self) -> Result<Option<WorksheetRows<'_>>, DecodeError> {
        let Some(part) = self.sheet_part.as_deref() else {
            warn!("Package contains no worksheet");
            return Ok(None);
        };
        let Some(strings) = self.shared_strings.as_ref() else {
            warn!(sheet = %part, "Package contains no shared string table");
            return Ok(None);
        };

        let entry = self.archive.by_name(part)?;
        debug!(sheet = %part, "Streaming worksheet");
        Ok(Some(SheetRows::new(BufReader::new(entry), strings)))
    }
}

#[derive(Debug, Clone)]
struct Relationship {
    kind: String,
    target: String,
}

fn has_part<R: Read + Seek>(archive: &ZipArchive<R>, name: &str) -> bool {
    archive.file_names().any(|n| n == name)
}

/// Read a small part fully. Missing parts are `None`.
fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, DecodeError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut bytes = Vec::with_capacity(preallocation(entry.size()));
    entry.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

/// The declared size comes from the archive header and may be corrupt
fn preallocation(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOCATION)).unwrap_or(0)
}

fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, Relationship>, DecodeError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut relationships = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut kind = String::new();
                let mut target = String::new();
                for attr in e.attributes() {
                    let attr = attr?;
                    let value = attr.unescape_value()?.into_owned();
                    match attr.key.local_name().as_ref() {
                        b"Id" => id = Some(value),
                        b"Type" => kind = value,
                        b"Target" => target = value,
                        _ => {}
                    }
                }
                if let Some(id) = id {
                    relationships.insert(id, Relationship { kind, target });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}

/// Relationship id of the first `<sheet>` in workbook order
fn first_sheet_relationship(xml: &[u8]) -> Result<Option<String>, DecodeError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"sheet" => {
                for attr in e.attributes() {
                    let attr = attr?;
                    // r:id, whatever the relationships namespace prefix is
                    if attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"id" {
                        return Ok(Some(attr.unescape_value()?.into_owned()));
                    }
                }
                return Ok(None);
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// Relationship targets are relative to `xl/` unless absolute
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target.trim_start_matches("./")),
    }
}

fn lowest_numbered_sheet<R: Read + Seek>(archive: &ZipArchive<R>) -> Option<String> {
    archive
        .file_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix(WORKSHEET_PREFIX)?
                .strip_suffix(".xml")?
                .parse::<u32>()
                .ok()?;
            Some((number, name.to_string()))
        })
        .min_by_key(|(number, _)| *number)
        .map(|(_, name)| name)
}
