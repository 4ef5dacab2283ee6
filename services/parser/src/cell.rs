use calamine::Data;

use crate::datetime::{display_duration, display_iso, display_serial};
use crate::record::CdrValue;

/// Convert a cell to the value its author sees in the sheet.
///
/// Returns `None` for empty cells so they are left out of the record.
pub(crate) fn display_value(cell: &Data) -> Option<CdrValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(CdrValue::Text(s.clone())),
        Data::Int(i) => Some(CdrValue::Number(*i as f64)),
        Data::Float(f) => Some(CdrValue::Number(*f)),
        Data::Bool(b) => Some(CdrValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string())),
        Data::DateTime(dt) if dt.is_duration() => {
            let seconds = (dt.as_f64() * 86_400.0).round() as i64;
            Some(CdrValue::Text(display_duration(seconds)))
        }
        Data::DateTime(dt) => Some(CdrValue::Text(match dt.as_datetime() {
            Some(at) => display_serial(dt.as_f64(), at),
            None => dt.as_f64().to_string(),
        })),
        Data::DateTimeIso(s) => Some(CdrValue::Text(display_iso(s))),
        Data::DurationIso(s) => Some(CdrValue::Text(s.clone())),
        Data::Error(e) => Some(CdrValue::Text(e.to_string())),
    }
}

/// Header cell text, before normalization.
pub(crate) fn header_text(cell: &Data) -> String {
    display_value(cell).map(|v| v.to_string()).unwrap_or_default()
}
