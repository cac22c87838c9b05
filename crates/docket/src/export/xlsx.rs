//! Minimal SpreadsheetML package writer.
//!
//! Produces an Office Open XML workbook: inline strings (no shared string
//! table), one date style, one worksheet part per sheet.

use std::io::{Cursor, Write};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;
use crate::source::Cell;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const WORKSHEET_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";

/// Excel caps sheet names at 31 characters.
const MAX_SHEET_NAME: usize = 31;

/// Style index of the date-time cell format in `styles.xml`.
const DATE_STYLE: &str = "1";

struct Sheet {
    name: String,
    rows: Vec<Vec<Cell>>,
}

/// Collects sheets and serializes them into an `.xlsx` byte buffer.
#[derive(Default)]
pub struct WorkbookWriter {
    sheets: Vec<Sheet>,
}

impl WorkbookWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sheet whose first row is `header`.
    pub fn add_sheet(&mut self, name: &str, header: &[String], rows: Vec<Vec<Cell>>) {
        let mut all_rows = Vec::with_capacity(rows.len() + 1);
        all_rows.push(header.iter().map(|h| Cell::from(h.as_str())).collect());
        all_rows.extend(rows);

        let name = self.unique_name(&sanitize_sheet_name(name));
        self.sheets.push(Sheet {
            name,
            rows: all_rows,
        });
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ExportError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut parts = vec![
            ("[Content_Types].xml".to_string(), self.content_types_xml()?),
            ("_rels/.rels".to_string(), root_rels_xml()?),
            ("xl/workbook.xml".to_string(), self.workbook_xml()?),
            (
                "xl/_rels/workbook.xml.rels".to_string(),
                self.workbook_rels_xml()?,
            ),
            ("xl/styles.xml".to_string(), styles_xml()?),
        ];
        for (idx, sheet) in self.sheets.iter().enumerate() {
            parts.push((
                format!("xl/worksheets/sheet{}.xml", idx + 1),
                worksheet_xml(sheet)?,
            ));
        }

        for (name, bytes) in parts {
            zip.start_file(name, options)?;
            zip.write_all(&bytes)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    fn unique_name(&self, base: &str) -> String {
        let taken = |candidate: &str| {
            self.sheets
                .iter()
                .any(|s| s.name.eq_ignore_ascii_case(candidate))
        };
        if !taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| {
                let suffix = format!(" ({})", n);
                let stem: String = base
                    .chars()
                    .take(MAX_SHEET_NAME - suffix.chars().count())
                    .collect();
                format!("{}{}", stem, suffix)
            })
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    fn content_types_xml(&self) -> Result<Vec<u8>, ExportError> {
        let mut writer = new_document()?;
        writer
            .create_element("Types")
            .with_attribute(("xmlns", CONTENT_TYPES_NS))
            .write_inner_content(|w| {
                w.create_element("Default")
                    .with_attribute(("Extension", "rels"))
                    .with_attribute((
                        "ContentType",
                        "application/vnd.openxmlformats-package.relationships+xml",
                    ))
                    .write_empty()?;
                w.create_element("Default")
                    .with_attribute(("Extension", "xml"))
                    .with_attribute(("ContentType", "application/xml"))
                    .write_empty()?;
                w.create_element("Override")
                    .with_attribute(("PartName", "/xl/workbook.xml"))
                    .with_attribute((
                        "ContentType",
                        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
                    ))
                    .write_empty()?;
                w.create_element("Override")
                    .with_attribute(("PartName", "/xl/styles.xml"))
                    .with_attribute((
                        "ContentType",
                        "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml",
                    ))
                    .write_empty()?;
                for idx in 1..=self.sheets.len() {
                    let part = format!("/xl/worksheets/sheet{}.xml", idx);
                    w.create_element("Override")
                        .with_attribute(("PartName", part.as_str()))
                        .with_attribute(("ContentType", WORKSHEET_TYPE))
                        .write_empty()?;
                }
                Ok(())
            })?;
        Ok(writer.into_inner())
    }

    fn workbook_xml(&self) -> Result<Vec<u8>, ExportError> {
        let mut writer = new_document()?;
        writer
            .create_element("workbook")
            .with_attribute(("xmlns", MAIN_NS))
            .with_attribute(("xmlns:r", REL_NS))
            .write_inner_content(|w| {
                w.create_element("sheets").write_inner_content(|w| {
                    for (idx, sheet) in self.sheets.iter().enumerate() {
                        let id = (idx + 1).to_string();
                        let rel = format!("rId{}", idx + 1);
                        w.create_element("sheet")
                            .with_attribute(("name", sheet.name.as_str()))
                            .with_attribute(("sheetId", id.as_str()))
                            .with_attribute(("r:id", rel.as_str()))
                            .write_empty()?;
                    }
                    Ok(())
                })?;
                Ok(())
            })?;
        Ok(writer.into_inner())
    }

    fn workbook_rels_xml(&self) -> Result<Vec<u8>, ExportError> {
        let mut writer = new_document()?;
        writer
            .create_element("Relationships")
            .with_attribute(("xmlns", PKG_REL_NS))
            .write_inner_content(|w| {
                for idx in 1..=self.sheets.len() {
                    let id = format!("rId{}", idx);
                    let target = format!("worksheets/sheet{}.xml", idx);
                    w.create_element("Relationship")
                        .with_attribute(("Id", id.as_str()))
                        .with_attribute((
                            "Type",
                            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet",
                        ))
                        .with_attribute(("Target", target.as_str()))
                        .write_empty()?;
                }
                let styles_id = format!("rId{}", self.sheets.len() + 1);
                w.create_element("Relationship")
                    .with_attribute(("Id", styles_id.as_str()))
                    .with_attribute((
                        "Type",
                        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles",
                    ))
                    .with_attribute(("Target", "styles.xml"))
                    .write_empty()?;
                Ok(())
            })?;
        Ok(writer.into_inner())
    }
}

fn new_document() -> Result<Writer<Vec<u8>>, ExportError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(writer)
}

fn root_rels_xml() -> Result<Vec<u8>, ExportError> {
    let mut writer = new_document()?;
    writer
        .create_element("Relationships")
        .with_attribute(("xmlns", PKG_REL_NS))
        .write_inner_content(|w| {
            w.create_element("Relationship")
                .with_attribute(("Id", "rId1"))
                .with_attribute((
                    "Type",
                    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
                ))
                .with_attribute(("Target", "xl/workbook.xml"))
                .write_empty()?;
            Ok(())
        })?;
    Ok(writer.into_inner())
}

fn styles_xml() -> Result<Vec<u8>, ExportError> {
    let mut writer = new_document()?;
    writer
        .create_element("styleSheet")
        .with_attribute(("xmlns", MAIN_NS))
        .write_inner_content(|w| {
            w.create_element("numFmts")
                .with_attribute(("count", "1"))
                .write_inner_content(|w| {
                    w.create_element("numFmt")
                        .with_attribute(("numFmtId", "164"))
                        .with_attribute(("formatCode", "yyyy-mm-dd hh:mm:ss"))
                        .write_empty()?;
                    Ok(())
                })?;
            w.create_element("fonts")
                .with_attribute(("count", "1"))
                .write_inner_content(|w| {
                    w.create_element("font").write_inner_content(|w| {
                        w.create_element("sz")
                            .with_attribute(("val", "11"))
                            .write_empty()?;
                        w.create_element("name")
                            .with_attribute(("val", "Calibri"))
                            .write_empty()?;
                        Ok(())
                    })?;
                    Ok(())
                })?;
            w.create_element("fills")
                .with_attribute(("count", "2"))
                .write_inner_content(|w| {
                    for pattern in ["none", "gray125"] {
                        w.create_element("fill").write_inner_content(|w| {
                            w.create_element("patternFill")
                                .with_attribute(("patternType", pattern))
                                .write_empty()?;
                            Ok(())
                        })?;
                    }
                    Ok(())
                })?;
            w.create_element("borders")
                .with_attribute(("count", "1"))
                .write_inner_content(|w| {
                    w.create_element("border").write_empty()?;
                    Ok(())
                })?;
            w.create_element("cellStyleXfs")
                .with_attribute(("count", "1"))
                .write_inner_content(|w| {
                    w.create_element("xf")
                        .with_attribute(("numFmtId", "0"))
                        .with_attribute(("fontId", "0"))
                        .with_attribute(("fillId", "0"))
                        .with_attribute(("borderId", "0"))
                        .write_empty()?;
                    Ok(())
                })?;
            w.create_element("cellXfs")
                .with_attribute(("count", "2"))
                .write_inner_content(|w| {
                    w.create_element("xf")
                        .with_attribute(("numFmtId", "0"))
                        .with_attribute(("fontId", "0"))
                        .with_attribute(("fillId", "0"))
                        .with_attribute(("borderId", "0"))
                        .with_attribute(("xfId", "0"))
                        .write_empty()?;
                    w.create_element("xf")
                        .with_attribute(("numFmtId", "164"))
                        .with_attribute(("fontId", "0"))
                        .with_attribute(("fillId", "0"))
                        .with_attribute(("borderId", "0"))
                        .with_attribute(("xfId", "0"))
                        .with_attribute(("applyNumberFormat", "1"))
                        .write_empty()?;
                    Ok(())
                })?;
            Ok(())
        })?;
    Ok(writer.into_inner())
}

fn worksheet_xml(sheet: &Sheet) -> Result<Vec<u8>, ExportError> {
    let mut writer = new_document()?;
    writer
        .create_element("worksheet")
        .with_attribute(("xmlns", MAIN_NS))
        .write_inner_content(|w| {
            w.create_element("sheetData").write_inner_content(|w| {
                for (row_idx, row) in sheet.rows.iter().enumerate() {
                    let row_number = (row_idx + 1).to_string();
                    w.create_element("row")
                        .with_attribute(("r", row_number.as_str()))
                        .write_inner_content(|w| {
                            for (col_idx, cell) in row.iter().enumerate() {
                                let reference =
                                    format!("{}{}", column_letters(col_idx), row_number);
                                write_cell(w, &reference, cell)?;
                            }
                            Ok(())
                        })?;
                }
                Ok(())
            })?;
            Ok(())
        })?;
    Ok(writer.into_inner())
}

fn write_cell(w: &mut Writer<Vec<u8>>, reference: &str, cell: &Cell) -> std::io::Result<()> {
    match cell {
        Cell::Empty => {}
        Cell::Number(n) if !n.is_finite() => {}
        Cell::Number(n) => {
            let value = n.to_string();
            w.create_element("c")
                .with_attribute(("r", reference))
                .write_inner_content(|w| {
                    w.create_element("v")
                        .write_text_content(BytesText::new(&value))?;
                    Ok(())
                })?;
        }
        Cell::Bool(b) => {
            w.create_element("c")
                .with_attribute(("r", reference))
                .with_attribute(("t", "b"))
                .write_inner_content(|w| {
                    w.create_element("v")
                        .write_text_content(BytesText::new(if *b { "1" } else { "0" }))?;
                    Ok(())
                })?;
        }
        Cell::DateTime(dt) => match excel_serial(dt) {
            Some(serial) => {
                let value = serial.to_string();
                w.create_element("c")
                    .with_attribute(("r", reference))
                    .with_attribute(("s", DATE_STYLE))
                    .write_inner_content(|w| {
                        w.create_element("v")
                            .write_text_content(BytesText::new(&value))?;
                        Ok(())
                    })?;
            }
            None => write_inline_string(w, reference, &cell.to_string())?,
        },
        Cell::Text(s) => write_inline_string(w, reference, s)?,
    }
    Ok(())
}

fn write_inline_string(w: &mut Writer<Vec<u8>>, reference: &str, text: &str) -> std::io::Result<()> {
    let text = strip_control_chars(text);
    w.create_element("c")
        .with_attribute(("r", reference))
        .with_attribute(("t", "inlineStr"))
        .write_inner_content(|w| {
            w.create_element("is").write_inner_content(|w| {
                w.create_element("t")
                    .with_attribute(("xml:space", "preserve"))
                    .write_text_content(BytesText::new(&text))?;
                Ok(())
            })?;
            Ok(())
        })?;
    Ok(())
}

/// XML 1.0 forbids most C0 control characters and the U+FFFE/U+FFFF
/// noncharacters, even when escaped.
fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .filter(|c| !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
        .collect()
}

/// Zero-based column index to spreadsheet letters: 0 → A, 26 → AA.
pub fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Serial day number in the 1900 date system; `None` before 1900-03-01,
/// where the system's phantom leap day makes serials ambiguous.
fn excel_serial(dt: &NaiveDateTime) -> Option<f64> {
    let first_exact = NaiveDate::from_ymd_opt(1900, 3, 1)?.and_time(NaiveTime::MIN);
    if *dt < first_exact {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    Some((*dt - epoch).num_milliseconds() as f64 / 86_400_000.0)
}

/// Replaces characters Excel rejects in sheet names and enforces the length cap.
fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME)
        .collect();
    let trimmed = cleaned.trim_matches('\'').trim();
    if trimmed.is_empty() {
        "Sheet".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn test_excel_serial() {
        let dt = NaiveDate::from_ymd_opt(2025, 4, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(excel_serial(&dt), Some(45748.5));

        let early = NaiveDate::from_ymd_opt(1900, 1, 15)
            .unwrap()
            .and_time(NaiveTime::MIN);
        assert_eq!(excel_serial(&early), None);
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("Top 20 Atrasos"), "Top 20 Atrasos");
        assert_eq!(sanitize_sheet_name("a/b:c"), "a_b_c");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).len(), 31);
        assert_eq!(sanitize_sheet_name("''"), "Sheet");
    }

    #[test]
    fn test_duplicate_sheet_names_made_unique() {
        let mut workbook = WorkbookWriter::new();
        workbook.add_sheet("Dados", &[], vec![]);
        workbook.add_sheet("dados", &[], vec![]);

        assert_eq!(workbook.sheet_count(), 2);
        assert_eq!(workbook.sheets[1].name, "dados (2)");
    }

    #[test]
    fn test_package_contains_all_parts() {
        let mut workbook = WorkbookWriter::new();
        workbook.add_sheet("Um", &["a".to_string()], vec![vec![Cell::Number(1.0)]]);
        workbook.add_sheet("Dois", &["b".to_string()], vec![]);
        let bytes = workbook.to_bytes().unwrap();

        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "xl/_rels/workbook.xml.rels",
                "xl/styles.xml",
                "xl/workbook.xml",
                "xl/worksheets/sheet1.xml",
                "xl/worksheets/sheet2.xml",
            ]
        );

        let workbook_xml = read_part(&bytes, "xl/workbook.xml");
        assert!(workbook_xml.contains(r#"<sheet name="Um" sheetId="1" r:id="rId1"/>"#));
        assert!(workbook_xml.contains(r#"<sheet name="Dois" sheetId="2" r:id="rId2"/>"#));
    }

    #[test]
    fn test_worksheet_cells_escaped_and_typed() {
        let mut workbook = WorkbookWriter::new();
        let when = NaiveDate::from_ymd_opt(2025, 4, 1)
            .unwrap()
            .and_time(NaiveTime::MIN);
        workbook.add_sheet(
            "Dados",
            &["nome".to_string(), "dias".to_string(), "prazo".to_string()],
            vec![vec![
                Cell::Text("A & B <x>\u{1}".to_string()),
                Cell::Number(29.0),
                Cell::DateTime(when),
            ]],
        );
        let bytes = workbook.to_bytes().unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");

        assert!(sheet.contains("A &amp; B &lt;x&gt;</t>"));
        assert!(sheet.contains(r#"<c r="B2"><v>29</v></c>"#));
        assert!(sheet.contains(r#"<c r="C2" s="1"><v>45748</v></c>"#));
    }

    #[test]
    fn test_invalid_xml_chars_stripped() {
        assert_eq!(strip_control_chars("a\u{FFFE}b\u{FFFF}c"), "abc");
        assert_eq!(strip_control_chars("x\u{1}\u{1F}y"), "xy");
        assert_eq!(strip_control_chars("linha\n\tok"), "linha\n\tok");
    }
}
