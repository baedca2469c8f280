//! Writes small spreadsheet packages for decoder and loader tests

use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Stored in the shared-string table
    Text(String),
    /// Stored inline as a plain value
    Number(String),
    /// Omitted from the sheet XML entirely
    Empty,
}

pub fn text(value: &str) -> Cell {
    Cell::Text(value.to_string())
}

pub fn num(value: impl ToString) -> Cell {
    Cell::Number(value.to_string())
}

/// An 18-column movie export row
pub fn movie_row(filmid: i32, title: &str, vote_count: i32) -> Vec<Cell> {
    let mut row = vec![Cell::Empty; 18];
    row[0] = num(filmid - 1);
    row[1] = num(filmid);
    row[2] = text(title);
    row[10] = text(&format!("Overview of {}", title));
    row[12] = text(&format!("/{}.jpg", filmid));
    row[13] = text("2001-01-01");
    row[16] = num(7.5);
    row[17] = num(vote_count);
    row
}

/// Builds a workbook whose first row in every sheet is a header
#[derive(Debug, Clone)]
pub struct WorkbookBuilder {
    sheets: Vec<Vec<Vec<Cell>>>,
    shared_strings: bool,
}

impl Default for WorkbookBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            shared_strings: true,
        }
    }

    /// Add a sheet: `header` names become row 1, `rows` follow
    pub fn sheet(mut self, header: &[&str], rows: Vec<Vec<Cell>>) -> Self {
        let mut all = vec![header.iter().map(|h| text(h)).collect::<Vec<_>>()];
        all.extend(rows);
        self.sheets.push(all);
        self
    }

    /// Leave the shared-string table out of the package
    pub fn without_shared_strings(mut self) -> Self {
        self.shared_strings = false;
        self
    }

    pub fn write(&self, path: &Path) {
        let mut table: Vec<String> = Vec::new();
        let mut sheet_parts = Vec::new();

        for (i, rows) in self.sheets.iter().enumerate() {
            let xml = sheet_xml(rows, &mut table);
            sheet_parts.push((format!("xl/worksheets/sheet{}.xml", i + 1), xml));
        }

        let mut parts: Vec<(String, String)> = vec![
            ("[Content_Types].xml".to_string(), CONTENT_TYPES.to_string()),
            ("_rels/.rels".to_string(), ROOT_RELS.to_string()),
            ("xl/workbook.xml".to_string(), workbook_xml(self.sheets.len())),
            (
                "xl/_rels/workbook.xml.rels".to_string(),
                workbook_rels(self.sheets.len(), self.shared_strings),
            ),
        ];
        if self.shared_strings {
            parts.push(("xl/sharedStrings.xml".to_string(), shared_strings_xml(&table)));
        }
        parts.extend(sheet_parts);

        let borrowed: Vec<(&str, &str)> = parts
            .iter()
            .map(|(name, body)| (name.as_str(), body.as_str()))
            .collect();
        write_package(path, &borrowed);
    }
}

/// Write arbitrary parts into a zip package
pub fn write_package(path: &Path, parts: &[(&str, &str)]) {
    let file = File::create(path).expect("create package");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, body) in parts {
        zip.start_file(*name, options).expect("start part");
        zip.write_all(body.as_bytes()).expect("write part");
    }
    zip.finish().expect("finish package");
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

fn workbook_xml(sheet_count: usize) -> String {
    let sheets: String = (1..=sheet_count)
        .map(|i| format!(r#"<sheet name="Sheet{i}" sheetId="{i}" r:id="rId{i}"/>"#))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{sheets}</sheets></workbook>"#
    )
}

fn workbook_rels(sheet_count: usize, shared_strings: bool) -> String {
    let mut rels: String = (1..=sheet_count)
        .map(|i| {
            format!(
                r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
            )
        })
        .collect();
    if shared_strings {
        rels.push_str(
            r#"<Relationship Id="rIdSst" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        );
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
    )
}

fn shared_strings_xml(table: &[String]) -> String {
    let items: String = table
        .iter()
        .map(|s| format!(r#"<si><t xml:space="preserve">{}</t></si>"#, escape(s)))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{n}" uniqueCount="{n}">{items}</sst>"#,
        n = table.len()
    )
}

fn sheet_xml(rows: &[Vec<Cell>], table: &mut Vec<String>) -> String {
    let mut body = String::new();
    for (r, row) in rows.iter().enumerate() {
        let row_number = r + 1;
        body.push_str(&format!(r#"<row r="{}">"#, row_number));
        for (c, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_letters(c), row_number);
            match cell {
                Cell::Text(value) => {
                    let index = match table.iter().position(|s| s == value) {
                        Some(index) => index,
                        None => {
                            table.push(value.clone());
                            table.len() - 1
                        }
                    };
                    body.push_str(&format!(r#"<c r="{}" t="s"><v>{}</v></c>"#, reference, index));
                }
                Cell::Number(value) => {
                    body.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, escape(value)));
                }
                Cell::Empty => {}
            }
        }
        body.push_str("</row>");
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
        body
    )
}

fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ascii column letters")
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
