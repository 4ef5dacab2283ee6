//! Minimal `.xlsx` writer.
//!
//! Produces a workbook calamine (and spreadsheet apps) can open: one
//! worksheet per sheet, numbers as numeric cells, everything else as inline
//! strings. No styles and no shared strings.

use std::io::{Cursor, Write};
use thiserror::Error;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::record::CdrValue;

#[derive(Error, Debug)]
pub enum XlsxWriteError {
    #[error("xlsx archive error: {0}")]
    Zip(#[from] ZipError),

    #[error("xlsx write error: {0}")]
    Io(#[from] std::io::Error),
}

const CONTENT_TYPES_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Write `sheets` (name, rows) into an in-memory workbook, in order.
///
/// Empty text cells are left out.
pub fn write_xlsx(sheets: &[(&str, &[Vec<CdrValue>])]) -> Result<Vec<u8>, XlsxWriteError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    let mut content_types = CONTENT_TYPES_HEAD.to_string();
    let mut sheet_entries = String::new();
    let mut sheet_rels = String::new();
    for (idx, (name, _)) in sheets.iter().enumerate() {
        let n = idx + 1;
        content_types.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        sheet_entries.push_str(&format!(
            r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
            escape(name)
        ));
        sheet_rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));
    }
    content_types.push_str("</Types>");

    let workbook_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{sheet_entries}</sheets></workbook>"#
    );
    let workbook_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{sheet_rels}</Relationships>"#
    );

    let mut parts = vec![
        ("[Content_Types].xml".to_string(), content_types),
        ("_rels/.rels".to_string(), ROOT_RELS.to_string()),
        ("xl/workbook.xml".to_string(), workbook_xml),
        ("xl/_rels/workbook.xml.rels".to_string(), workbook_rels),
    ];
    for (idx, (_, rows)) in sheets.iter().enumerate() {
        parts.push((format!("xl/worksheets/sheet{}.xml", idx + 1), sheet_xml(rows)));
    }

    for (path, body) in parts {
        zip.start_file(path, options)?;
        zip.write_all(body.as_bytes())?;
    }
    Ok(zip.finish()?.into_inner())
}

fn sheet_xml(rows: &[Vec<CdrValue>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        let row_num = r + 1;
        xml.push_str(&format!(r#"<row r="{row_num}">"#));
        for (c, value) in row.iter().enumerate() {
            let cell_ref = format!("{}{row_num}", column_letter(c));
            match value {
                CdrValue::Number(n) if n.is_finite() => {
                    xml.push_str(&format!(r#"<c r="{cell_ref}"><v>{n}</v></c>"#));
                }
                CdrValue::Text(s) if s.is_empty() => {}
                other => xml.push_str(&format!(
                    r#"<c r="{cell_ref}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                    escape(&other.to_string())
                )),
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn column_letter(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (idx % 26) as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.iter().rev().collect()
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_auto_from_rs, Data, Reader};

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn test_written_workbook_reads_back() {
        let summary = vec![
            vec![CdrValue::Text("Metric".into()), CdrValue::Text("Value".into())],
            vec![CdrValue::Text("Total Calls".into()), CdrValue::Number(3.0)],
        ];
        let imeis = vec![
            vec![CdrValue::Text("name".into()), CdrValue::Text("count".into())],
            vec![CdrValue::Text("356938035643809".into()), CdrValue::Number(2.0)],
            vec![CdrValue::Text("A&B <x>".into()), CdrValue::Text(String::new())],
        ];
        let bytes = write_xlsx(&[("Summary", &summary[..]), ("Top IMEIs", &imeis[..])]).unwrap();

        let mut workbook = open_workbook_auto_from_rs(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Summary", "Top IMEIs"]);

        let range = workbook.worksheet_range("Summary").unwrap();
        assert_eq!(range.get_value((1, 1)), Some(&Data::Float(3.0)));

        let range = workbook.worksheet_range("Top IMEIs").unwrap();
        assert_eq!(
            range.get_value((1, 0)),
            Some(&Data::String("356938035643809".into()))
        );
        assert_eq!(range.get_value((2, 0)), Some(&Data::String("A&B <x>".into())));
    }
}
