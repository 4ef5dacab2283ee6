use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use crate::datetime::DATETIME_DISPLAY_FORMAT;
use crate::header::normalize_header;

/// Normalized keys the analysis layer knows about.
///
/// Every one of them is optional in a given file except `date`, `time` and
/// `duration`; consumers must degrade gracefully when a key is absent.
pub mod columns {
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
    pub const DURATION: &str = "duration";
    /// Synthetic: fused from `date` + the literal `Time` column.
    pub const DATETIME: &str = "datetime";
    pub const CDR_NO: &str = "cdrno";
    pub const B_PARTY: &str = "bparty";
    pub const CALL_TYPE: &str = "calltype";
    pub const IMEI: &str = "imei";
    pub const IMSI: &str = "imsi";
    pub const ROAMING: &str = "roaming";
    pub const CRIME: &str = "crime";
    pub const MAIN_CITY: &str = "maincityfirstcellid";
    pub const LAT_LONG_AZIMUTH: &str = "lat-long-azimuthfirstcellid";
    pub const IMEI_MANUFACTURER: &str = "imeimanufacturer";
}

/// A single cell value after display formatting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CdrValue {
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl CdrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CdrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CdrValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl fmt::Display for CdrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CdrValue::Text(s) => f.write_str(s),
            CdrValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            CdrValue::Number(n) => write!(f, "{n}"),
            CdrValue::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_DISPLAY_FORMAT)),
        }
    }
}

/// One spreadsheet row keyed by normalized header, in source column order.
///
/// Records are immutable once built; a refresh produces a new sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CdrRecord {
    fields: IndexMap<String, CdrValue>,
}

impl CdrRecord {
    pub(crate) fn from_fields(fields: IndexMap<String, CdrValue>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&CdrValue> {
        self.fields.get(key)
    }

    /// Display string for `key`, if present.
    pub fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).map(|v| v.to_string())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CdrValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Keys are passed through the header normalizer so hand-built records obey
/// the same key space as parsed ones.
impl<K: AsRef<str>> FromIterator<(K, CdrValue)> for CdrRecord {
    fn from_iter<I: IntoIterator<Item = (K, CdrValue)>>(iter: I) -> Self {
        let fields = iter
            .into_iter()
            .map(|(k, v)| (normalize_header(k.as_ref()), v))
            .collect();
        Self { fields }
    }
}
