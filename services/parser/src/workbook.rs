use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{debug, info};

use crate::cell::{display_value, header_text};
use crate::datetime::fuse_date_time;
use crate::error::ParseFailure;
use crate::header::normalize_header;
use crate::record::{columns, CdrRecord};

/// Columns every CDR file must carry (after normalization), in the order
/// they are checked.
pub const REQUIRED_COLUMNS: &[&str] = &[columns::DATE, columns::TIME, columns::DURATION];

/// Raw header text whose value is fused with `date`. Case-sensitive.
const LITERAL_TIME_HEADER: &str = "Time";

/// Parse an in-memory workbook into records.
///
/// Only the first sheet is read. `file_name` is used for diagnostics only.
/// A sheet without data rows yields an empty vector, not an error.
pub fn parse_workbook(bytes: &[u8], file_name: &str) -> Result<Vec<CdrRecord>, ParseFailure> {
    if bytes.is_empty() {
        return Err(ParseFailure::FileRead {
            file_name: file_name.to_string(),
            reason: "file is empty".to_string(),
        });
    }

    // calamine auto-detects the format: xls, xlsx, xlsb, ods
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| ParseFailure::Parse {
            file_name: file_name.to_string(),
            reason: e.to_string(),
        })?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names.first().ok_or_else(|| ParseFailure::Parse {
        file_name: file_name.to_string(),
        reason: "workbook has no sheets".to_string(),
    })?;
    info!(
        file = file_name,
        sheet = %sheet_name,
        sheets = sheet_names.len(),
        "Reading first sheet"
    );

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| ParseFailure::Parse {
            file_name: file_name.to_string(),
            reason: e.to_string(),
        })?;

    parse_range(&range, file_name)
}

/// Parse an already-decoded sheet. Row 0 is the header row.
pub fn parse_range(range: &Range<Data>, file_name: &str) -> Result<Vec<CdrRecord>, ParseFailure> {
    let (row_count, col_count) = range.get_size();
    debug!(file = file_name, rows = row_count, cols = col_count, "Sheet size");

    let mut rows = range.rows();
    let header_row = match rows.next() {
        Some(row) if row_count >= 2 => row,
        _ => {
            info!(file = file_name, "Sheet has no data rows");
            return Ok(Vec::new());
        }
    };

    let raw_headers: Vec<String> = header_row.iter().map(header_text).collect();
    let normalized: Vec<String> = raw_headers.iter().map(|h| normalize_header(h)).collect();

    // Validate before touching any data row
    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|col| !normalized.iter().any(|h| h == *col))
    {
        return Err(ParseFailure::Validation {
            column: missing.to_string(),
        });
    }

    let keys: Vec<String> = record_keys(&raw_headers)
        .iter()
        .map(|h| normalize_header(h))
        .collect();
    let time_col = raw_headers.iter().position(|h| h == LITERAL_TIME_HEADER);

    let records: Vec<CdrRecord> = rows
        .filter_map(|row| build_record(row, &keys, time_col))
        .collect();

    info!(
        file = file_name,
        records = records.len(),
        columns = keys.len(),
        "Parsed CDR records"
    );
    Ok(records)
}

/// Column names used as record keys. Blank headers become `__EMPTY`,
/// repeated headers get `_1`, `_2`, ... suffixes.
fn record_keys(raw_headers: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw_headers
        .iter()
        .map(|h| {
            let base = if h.trim().is_empty() {
                "__EMPTY".to_string()
            } else {
                h.clone()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let key = if *count == 0 {
                base
            } else {
                format!("{base}_{count}")
            };
            *count += 1;
            key
        })
        .collect()
}

fn build_record(row: &[Data], keys: &[String], time_col: Option<usize>) -> Option<CdrRecord> {
    let mut fields = IndexMap::with_capacity(keys.len() + 1);
    let mut date_value = None;

    for (cell, key) in row.iter().zip(keys) {
        let Some(value) = display_value(cell) else {
            continue;
        };
        if key == columns::DATE {
            date_value = Some(value.to_string());
        }
        fields.insert(key.clone(), value);
    }

    if fields.is_empty() {
        return None;
    }

    let time_value = time_col
        .and_then(|idx| row.get(idx))
        .and_then(display_value)
        .map(|v| v.to_string());
    if let (Some(date), Some(time)) = (date_value, time_value) {
        fields.insert(columns::DATETIME.to_string(), fuse_date_time(&date, &time));
    }

    Some(CdrRecord::from_fields(fields))
}
