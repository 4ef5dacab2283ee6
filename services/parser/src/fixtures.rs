//! In-memory `.xlsx` builder for tests.
//!
//! Cells that parse as `f64` are written as numbers, empty strings are left
//! out, everything else becomes an inline string.

use crate::record::CdrValue;
use crate::xlsx::write_xlsx;

/// Single-sheet workbook.
pub fn xlsx(rows: &[&[&str]]) -> Vec<u8> {
    workbook(&[("Sheet1", rows)])
}

/// Workbook with the given sheets, in order.
pub fn workbook(sheets: &[(&str, &[&[&str]])]) -> Vec<u8> {
    let typed: Vec<(&str, Vec<Vec<CdrValue>>)> = sheets
        .iter()
        .map(|(name, rows)| (*name, rows.iter().map(|row| row.iter().map(|v| cell(v)).collect()).collect()))
        .collect();
    let borrowed: Vec<(&str, &[Vec<CdrValue>])> =
        typed.iter().map(|(name, rows)| (*name, rows.as_slice())).collect();
    write_xlsx(&borrowed).expect("in-memory workbook")
}

fn cell(value: &str) -> CdrValue {
    match value.parse::<f64>() {
        Ok(n) => CdrValue::Number(n),
        Err(_) => CdrValue::Text(value.to_string()),
    }
}
