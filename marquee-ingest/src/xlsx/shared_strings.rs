//! Shared-string table
//!
//! Text cells store an index into this table instead of the text itself.
//! The table is read once per package; lookups are pure.

use super::{DecodeError, Nesting};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::io::BufRead;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedStrings {
    strings: Vec<String>,
}

impl SharedStrings {
    pub fn new(strings: Vec<String>) -> Self {
        Self { strings }
    }

    /// Parse a `sharedStrings.xml` part
    ///
    /// Each `<si>` item becomes one entry. Rich-text runs are concatenated and
    /// phonetic hints (`<rPh>`) are left out. The table must close with
    /// `</sst>`.
    pub fn parse<R: BufRead>(source: R) -> Result<Self, DecodeError> {
        let mut reader = Reader::from_reader(source);
        let mut buf = Vec::with_capacity(4096);
        let mut strings = Vec::new();

        let mut current = String::new();
        let mut in_item = false;
        let mut in_text = false;
        let mut phonetic_depth = 0usize;
        let mut nesting = Nesting::new("sst");

        loop {
            let event = reader.read_event_into(&mut buf)?;
            nesting.observe(&event)?;
            match event {
                Event::Start(ref e) => match e.local_name().as_ref() {
                    b"si" => {
                        in_item = true;
                        current.clear();
                    }
                    b"rPh" => phonetic_depth += 1,
                    b"t" if in_item && phonetic_depth == 0 => in_text = true,
                    _ => {}
                },
                Event::Empty(ref e) => {
                    if e.local_name().as_ref() == b"si" {
                        strings.push(String::new());
                    }
                }
                Event::Text(ref e) => {
                    if in_text {
                        current.push_str(&e.unescape()?);
                    }
                }
                Event::CData(ref e) => {
                    if in_text {
                        current.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Event::End(ref e) => match e.local_name().as_ref() {
                    b"si" => {
                        in_item = false;
                        strings.push(decode_escapes(&current));
                    }
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    b"t" => in_text = false,
                    _ => {}
                },
                Event::Eof => {
                    nesting.finish()?;
                    break;
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { strings })
    }

    /// Literal text stored at `index`
    pub fn resolve(&self, index: usize) -> Result<&str, DecodeError> {
        self.strings
            .get(index)
            .map(String::as_str)
            .ok_or(DecodeError::SharedStringIndex {
                index,
                len: self.strings.len(),
            })
    }

    /// Resolve the raw `<v>` text of a shared-string cell
    pub fn resolve_reference(&self, reference: &str) -> Result<&str, DecodeError> {
        let index = reference
            .trim()
            .parse::<usize>()
            .map_err(|_| DecodeError::SharedStringReference(reference.to_string()))?;
        self.resolve(index)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Expand `_xHHHH_` escapes used for characters XML cannot carry directly
///
/// `_x005F_` escapes a literal underscore, so `_x005F_x000D_` stays `_x000D_`.
pub(crate) fn decode_escapes(text: &str) -> String {
    if !text.contains("_x") {
        return text.to_string();
    }

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    let mut literal_start = 0;

    while i < bytes.len() {
        if let Some(ch) = escape_at(bytes, i) {
            out.push_str(&text[literal_start..i]);
            out.push(ch);
            i += 7;
            literal_start = i;
        } else {
            i += 1;
        }
    }
    out.push_str(&text[literal_start..]);
    out
}

fn escape_at(bytes: &[u8], i: usize) -> Option<char> {
    let candidate = bytes.get(i..i + 7)?;
    if candidate[0] != b'_' || candidate[1] != b'x' || candidate[6] != b'_' {
        return None;
    }
    let hex = std::str::from_utf8(&candidate[2..6]).ok()?;
    let code = u32::from_str_radix(hex, 16).ok()?;
    char::from_u32(code)
}
