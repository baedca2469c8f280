//! Streaming reader for packaged spreadsheet exports (`.xlsx`)
//!
//! A package is a zip archive holding a workbook part, a shared-string table
//! and one or more worksheets. Only the first worksheet is decoded, and only
//! row by row: the sheet XML is never held in memory as a whole.
//!
//! - [`package`]: opens the archive and locates the parts
//! - [`shared_strings`]: the deduplicated string pool cells refer to
//! - [`sheet`]: the row state machine and its pull iterator

pub mod package;
pub mod shared_strings;
pub mod sheet;

pub use package::{Workbook, WorksheetRows};
pub use shared_strings::SharedStrings;
pub use sheet::{SheetRows, SheetState};

use quick_xml::events::Event;
use thiserror::Error;

/// One decoded spreadsheet row: cell text by column position
pub type RawRow = Vec<String>;

/// Fatal decoding failure for one package
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed XML attribute: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    /// Cell refers past the end of the shared-string table
    #[error("Shared string index {index} out of range (table holds {len} strings)")]
    SharedStringIndex { index: usize, len: usize },

    /// Shared-string cell whose value is not an index
    #[error("Invalid shared string reference {0:?}")]
    SharedStringReference(String),

    /// Part does not open with the expected root element
    #[error("Expected a <{0}> root element")]
    MissingRoot(&'static str),

    /// Part ended before its elements were closed
    #[error("XML ended with {open} element(s) still open inside <{root}>")]
    Truncated { root: &'static str, open: usize },
}

/// Element nesting of one XML part
///
/// quick-xml reports end of input without checking that every element was
/// closed, so a cut-off part would otherwise read as a short but valid one.
#[derive(Debug)]
pub(crate) struct Nesting {
    root: &'static str,
    depth: usize,
    rooted: bool,
}

impl Nesting {
    pub(crate) fn new(root: &'static str) -> Self {
        Self {
            root,
            depth: 0,
            rooted: false,
        }
    }

    pub(crate) fn observe(&mut self, event: &Event<'_>) -> Result<(), DecodeError> {
        match event {
            Event::Start(e) => {
                if self.depth == 0 {
                    self.open_root(e.local_name().as_ref())?;
                }
                self.depth += 1;
            }
            Event::Empty(e) if self.depth == 0 => self.open_root(e.local_name().as_ref())?,
            Event::End(_) => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        Ok(())
    }

    /// Check the part was complete once input runs out
    pub(crate) fn finish(&self) -> Result<(), DecodeError> {
        if !self.rooted {
            return Err(DecodeError::MissingRoot(self.root));
        }
        if self.depth > 0 {
            return Err(DecodeError::Truncated {
                root: self.root,
                open: self.depth,
            });
        }
        Ok(())
    }

    fn open_root(&mut self, name: &[u8]) -> Result<(), DecodeError> {
        if self.rooted {
            return Ok(());
        }
        if name != self.root.as_bytes() {
            return Err(DecodeError::MissingRoot(self.root));
        }
        self.rooted = true;
        Ok(())
    }
}
