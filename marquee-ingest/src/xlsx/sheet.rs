//! Worksheet row decoding
//!
//! [`SheetState`] is the event-driven state machine: it reacts to cell starts,
//! value text, value ends and row ends, and hands back a finished row when one
//! closes. [`SheetRows`] pulls XML events from a reader and feeds them through
//! the state machine, yielding rows lazily.
//!
//! The first row of a sheet is the column header and is never emitted. A
//! part that ends before `</worksheet>` is an error, not a short sheet.

use super::shared_strings::decode_escapes;
use super::{DecodeError, Nesting, RawRow, SharedStrings};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::io::BufRead;

/// How a cell's `<v>` text is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellKind {
    /// Index into the shared-string table (`t="s"`)
    SharedString,
    /// Text held inside the cell (`t="inlineStr"`)
    InlineString,
    /// Numbers, booleans, formula results: the value text is taken verbatim
    #[default]
    Literal,
}

impl CellKind {
    fn from_type_attr(value: Option<&str>) -> Self {
        match value {
            Some("s") => CellKind::SharedString,
            Some("inlineStr") => CellKind::InlineString,
            _ => CellKind::Literal,
        }
    }
}

/// Row-assembly state for one worksheet
#[derive(Debug, Default)]
pub struct SheetState {
    kind: CellKind,
    /// 0-based column of the open cell, when the cell carried a reference
    column: Option<usize>,
    text: String,
    capturing: bool,
    in_inline: bool,
    phonetic_depth: usize,
    row: RawRow,
    rows_seen: u64,
}

impl SheetState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows closed so far, header included
    pub fn rows_seen(&self) -> u64 {
        self.rows_seen
    }

    pub fn on_row_start(&mut self) {
        self.row.clear();
        self.reset_cell();
    }

    /// A `<c>` element opened
    pub fn on_cell_start(&mut self, kind: CellKind, column: Option<usize>) {
        self.reset_cell();
        self.kind = kind;
        self.column = column;
    }

    /// A `<v>` element (or an inline `<t>` run) opened
    pub fn on_value_start(&mut self) {
        if !self.in_inline {
            self.text.clear();
        }
        self.capturing = true;
    }

    pub fn on_text(&mut self, text: &str) {
        if self.capturing && self.phonetic_depth == 0 {
            self.text.push_str(text);
        }
    }

    /// A value closed: resolve it and append it at its column
    pub fn on_value_end(&mut self, strings: &SharedStrings) -> Result<(), DecodeError> {
        self.capturing = false;
        let value = match self.kind {
            CellKind::SharedString => strings.resolve_reference(&self.text)?.to_string(),
            CellKind::InlineString | CellKind::Literal => std::mem::take(&mut self.text),
        };
        self.push_cell(value);
        Ok(())
    }

    /// A row closed. Returns the row unless it is the header.
    pub fn on_row_end(&mut self) -> Option<RawRow> {
        self.rows_seen += 1;
        self.reset_cell();
        let row = std::mem::take(&mut self.row);
        if self.rows_seen == 1 {
            None
        } else {
            Some(row)
        }
    }

    fn on_inline_start(&mut self) {
        self.in_inline = true;
        self.text.clear();
    }

    fn on_inline_end(&mut self) {
        self.in_inline = false;
        self.capturing = false;
        let value = decode_escapes(&self.text);
        self.text.clear();
        self.push_cell(value);
    }

    fn push_cell(&mut self, value: String) {
        if let Some(column) = self.column.take() {
            if column > self.row.len() {
                self.row.resize(column, String::new());
            }
        }
        self.row.push(value);
    }

    fn reset_cell(&mut self) {
        self.kind = CellKind::Literal;
        self.column = None;
        self.text.clear();
        self.capturing = false;
        self.in_inline = false;
        self.phonetic_depth = 0;
    }

    /// Apply one XML event. Returns a row when a data row closes.
    pub fn handle_event(
        &mut self,
        event: &Event<'_>,
        strings: &SharedStrings,
    ) -> Result<Option<RawRow>, DecodeError> {
        match event {
            Event::Start(e) => {
                self.on_start(e)?;
                Ok(None)
            }
            Event::Empty(e) => {
                // Self-closing elements open and close in one event
                match e.local_name().as_ref() {
                    b"row" => {
                        self.on_row_start();
                        Ok(self.on_row_end())
                    }
                    b"c" => {
                        self.on_start(e)?;
                        Ok(None)
                    }
                    b"v" => {
                        self.on_value_start();
                        self.on_value_end(strings)?;
                        Ok(None)
                    }
                    _ => Ok(None),
                }
            }
            Event::Text(e) => {
                if self.capturing {
                    self.on_text(&e.unescape()?);
                }
                Ok(None)
            }
            Event::CData(e) => {
                if self.capturing {
                    self.on_text(&String::from_utf8_lossy(e));
                }
                Ok(None)
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" if !self.in_inline => {
                    self.on_value_end(strings)?;
                    Ok(None)
                }
                b"t" if self.in_inline => {
                    self.capturing = false;
                    Ok(None)
                }
                b"rPh" => {
                    self.phonetic_depth = self.phonetic_depth.saturating_sub(1);
                    Ok(None)
                }
                b"is" if self.in_inline => {
                    self.on_inline_end();
                    Ok(None)
                }
                b"row" => Ok(self.on_row_end()),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    fn on_start(&mut self, e: &BytesStart<'_>) -> Result<(), DecodeError> {
        match e.local_name().as_ref() {
            b"row" => self.on_row_start(),
            b"c" => {
                let mut kind = None;
                let mut column = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.local_name().as_ref() {
                        b"t" => kind = Some(attr.unescape_value()?.into_owned()),
                        b"r" => column = column_index(&attr.unescape_value()?),
                        _ => {}
                    }
                }
                self.on_cell_start(CellKind::from_type_attr(kind.as_deref()), column);
            }
            b"v" if !self.in_inline => self.on_value_start(),
            b"is" if self.kind == CellKind::InlineString => self.on_inline_start(),
            b"t" if self.in_inline => self.on_value_start(),
            b"rPh" if self.in_inline => self.phonetic_depth += 1,
            _ => {}
        }
        Ok(())
    }
}

/// 0-based column of a cell reference such as `C7` or `AB12`
pub fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }

    let mut index = 0usize;
    for letter in letters {
        index = index * 26 + (letter.to_ascii_uppercase() - b'A' + 1) as usize;
    }
    Some(index - 1)
}

/// Lazily decoded data rows of one worksheet
///
/// Yields each data row once, in document order. A decode error is yielded
/// once and ends the sequence.
pub struct SheetRows<'a, R: BufRead> {
    reader: Reader<R>,
    strings: &'a SharedStrings,
    state: SheetState,
    nesting: Nesting,
    buf: Vec<u8>,
    finished: bool,
}

impl<'a, R: BufRead> SheetRows<'a, R> {
    pub fn new(source: R, strings: &'a SharedStrings) -> Self {
        Self {
            reader: Reader::from_reader(source),
            strings,
            state: SheetState::new(),
            nesting: Nesting::new("worksheet"),
            buf: Vec::with_capacity(8 * 1024),
            finished: false,
        }
    }

    /// Rows closed so far, header included
    pub fn rows_seen(&self) -> u64 {
        self.state.rows_seen()
    }
}

impl<'a, R: BufRead> Iterator for SheetRows<'a, R> {
    type Item = Result<RawRow, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            };

            if matches!(event, Event::Eof) {
                self.finished = true;
                return self.nesting.finish().err().map(Err);
            }

            if let Err(e) = self.nesting.observe(&event) {
                self.finished = true;
                return Some(Err(e));
            }

            match self.state.handle_event(&event, self.strings) {
                Ok(Some(row)) => return Some(Ok(row)),
                Ok(None) => {}
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings() -> SharedStrings {
        SharedStrings::new(vec![
            "filmid".to_string(),
            "title".to_string(),
            "Heat".to_string(),
            "Alien".to_string(),
        ])
    }

    fn sheet(rows: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
            rows
        )
    }

    fn decode(xml: &str, strings: &SharedStrings) -> Vec<Result<RawRow, DecodeError>> {
        SheetRows::new(xml.as_bytes(), strings).collect()
    }

    #[test]
    fn test_header_is_skipped() {
        let xml = sheet(
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
<row r="2"><c r="A2"><v>949</v></c><c r="B2" t="s"><v>2</v></c></row>
<row r="3"><c r="A3"><v>348</v></c><c r="B3" t="s"><v>3</v></c></row>"#,
        );
        let strings = strings();
        let rows: Vec<RawRow> = decode(&xml, &strings)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(rows, vec![vec!["949", "Heat"], vec!["348", "Alien"]]);
    }

    #[test]
    fn test_header_only_sheet_yields_nothing() {
        let xml = sheet(r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>"#);
        assert!(decode(&xml, &strings()).is_empty());
    }

    #[test]
    fn test_empty_row_element_counts_as_row() {
        let xml = sheet(r#"<row r="1"/><row r="2"><c r="A2"><v>1</v></c></row><row r="3"/>"#);
        let strings = strings();
        let rows: Vec<RawRow> = decode(&xml, &strings)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(rows, vec![vec!["1".to_string()], Vec::<String>::new()]);
    }

    #[test]
    fn test_sparse_cells_are_padded() {
        let xml = sheet(
            r#"<row r="1"><c r="A1"><v>h</v></c></row>
<row r="2"><c r="A2"><v>1</v></c><c r="D2" t="s"><v>2</v></c><c r="E2" s="3"/><c r="F2"><v>7.5</v></c></row>"#,
        );
        let strings = strings();
        let rows: Vec<RawRow> = decode(&xml, &strings)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(rows, vec![vec!["1", "", "", "Heat", "", "7.5"]]);
    }

    #[test]
    fn test_cells_without_reference_append() {
        let xml = sheet(r#"<row><c><v>h</v></c></row><row><c><v>1</v></c><c><v>2</v></c></row>"#);
        let strings = strings();
        let rows: Vec<RawRow> = decode(&xml, &strings)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(rows, vec![vec!["1", "2"]]);
    }

    #[test]
    fn test_inline_and_formula_cells() {
        let xml = sheet(
            r#"<row r="1"><c r="A1"><v>h</v></c></row>
<row r="2"><c r="A2" t="inlineStr"><is><r><t>In</t></r><r><t>line</t></r></is></c><c r="B2" t="str"><f>A2&amp;"!"</f><v>Inline!</v></c><c r="C2" t="b"><v>1</v></c></row>"#,
        );
        let strings = strings();
        let rows: Vec<RawRow> = decode(&xml, &strings)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(rows, vec![vec!["Inline", "Inline!", "1"]]);
    }

    #[test]
    fn test_inline_text_escapes_are_decoded() {
        let xml = sheet(
            r#"<row r="1"><c r="A1"><v>h</v></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>one_x000A_two</t></is></c></row>"#,
        );
        let strings = strings();
        let rows = decode(&xml, &strings);
        assert_eq!(rows[0].as_ref().unwrap(), &vec!["one\ntwo".to_string()]);
    }

    #[test]
    fn test_truncated_sheet_is_fatal_after_complete_rows() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1"><v>h</v></c></row>
<row r="2"><c r="A2"><v>1</v></c></row>
<row r="3"><c r="A3"><v>2</v></c>"#;
        let strings = strings();
        let rows = decode(xml, &strings);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].as_ref().unwrap(), &vec!["1".to_string()]);
        assert!(matches!(
            rows[1],
            Err(DecodeError::Truncated { root: "worksheet", open: 3 })
        ));
    }

    #[test]
    fn test_non_xml_part_is_fatal() {
        let strings = strings();
        let rows = decode("filmid,similar\n1,2\n", &strings);

        assert_eq!(rows.len(), 1);
        assert!(matches!(rows[0], Err(DecodeError::MissingRoot("worksheet"))));
    }

    #[test]
    fn test_escaped_literal_text() {
        let xml = sheet(
            r#"<row r="1"><c r="A1"><v>h</v></c></row><row r="2"><c r="A2" t="str"><v>Tom &amp; Jerry</v></c></row>"#,
        );
        let strings = strings();
        let rows = decode(&xml, &strings);
        assert_eq!(rows[0].as_ref().unwrap(), &vec!["Tom & Jerry".to_string()]);
    }

    #[test]
    fn test_out_of_range_shared_string_is_fatal() {
        let xml = sheet(
            r#"<row r="1"><c r="A1"><v>h</v></c></row>
<row r="2"><c r="A2" t="s"><v>99</v></c></row>
<row r="3"><c r="A3"><v>1</v></c></row>"#,
        );
        let strings = strings();
        let rows = decode(&xml, &strings);

        assert_eq!(rows.len(), 1);
        assert!(matches!(
            rows[0],
            Err(DecodeError::SharedStringIndex { index: 99, len: 4 })
        ));
    }

    #[test]
    fn test_rows_seen_counts_header() {
        let xml = sheet(r#"<row r="1"/><row r="2"/><row r="3"/>"#);
        let strings = strings();
        let mut rows = SheetRows::new(xml.as_bytes(), &strings);
        while rows.next().is_some() {}
        assert_eq!(rows.rows_seen(), 3);
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("C7"), Some(2));
        assert_eq!(column_index("Z10"), Some(25));
        assert_eq!(column_index("AA3"), Some(26));
        assert_eq!(column_index("ab12"), Some(27));
        assert_eq!(column_index("12"), None);
    }

    #[test]
    fn test_state_machine_transitions() {
        let strings = strings();
        let mut state = SheetState::new();

        state.on_row_start();
        state.on_cell_start(CellKind::SharedString, Some(0));
        state.on_value_start();
        state.on_text("0");
        state.on_value_end(&strings).unwrap();
        assert_eq!(state.on_row_end(), None);

        state.on_row_start();
        state.on_cell_start(CellKind::SharedString, Some(1));
        state.on_value_start();
        state.on_text("2");
        state.on_value_end(&strings).unwrap();
        assert_eq!(state.on_row_end(), Some(vec!["".to_string(), "Heat".to_string()]));
        assert_eq!(state.rows_seen(), 2);
    }
}
