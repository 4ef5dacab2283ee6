use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::record::CdrValue;

pub const DATE_DISPLAY_FORMAT: &str = "%Y-%m-%d";
pub const TIME_DISPLAY_FORMAT: &str = "%H:%M:%S";
pub const DATETIME_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date layouts accepted when fusing. Slash dates are month-first.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d %Y",
    "%b %d, %Y",
];

const TIME_FORMATS: &[&str] = &[
    "%H:%M:%S",
    "%H:%M:%S%.f",
    "%H:%M",
    "%I:%M:%S %p",
    "%I:%M %p",
];

/// Fuse a date string and a time string into a single value.
///
/// Never fails: when either half cannot be parsed the raw `"<date> <time>"`
/// text is kept instead.
pub fn fuse_date_time(date: &str, time: &str) -> CdrValue {
    match parse_date_time(date.trim(), time.trim()) {
        Some(dt) => CdrValue::DateTime(dt),
        None => CdrValue::Text(format!("{date} {time}")),
    }
}

fn parse_date_time(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = parse_date(date)?;
    let time = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(time, fmt).ok())?;
    Some(date.and_time(time))
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
        // A date cell formatted with a midnight time component
        .or_else(|| {
            NaiveDateTime::parse_from_str(date, DATETIME_DISPLAY_FORMAT)
                .ok()
                .filter(|dt| dt.time() == NaiveTime::MIN)
                .map(|dt| dt.date())
        })
}

/// Display text for a spreadsheet date/time serial.
///
/// Serials below one day are times of day, whole serials are dates and
/// everything else is a full timestamp.
pub(crate) fn display_serial(serial: f64, at: NaiveDateTime) -> String {
    if serial < 1.0 {
        at.format(TIME_DISPLAY_FORMAT).to_string()
    } else if serial.fract() == 0.0 {
        at.format(DATE_DISPLAY_FORMAT).to_string()
    } else {
        at.format(DATETIME_DISPLAY_FORMAT).to_string()
    }
}

/// Display text for an ISO 8601 cell value (ODS).
pub(crate) fn display_iso(raw: &str) -> String {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        if dt.time() == NaiveTime::MIN {
            return dt.format(DATE_DISPLAY_FORMAT).to_string();
        }
        return dt.format(DATETIME_DISPLAY_FORMAT).to_string();
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.format(DATE_DISPLAY_FORMAT).to_string();
    }
    if let Ok(t) = NaiveTime::parse_from_str(raw, "%H:%M:%S%.f") {
        return t.format(TIME_DISPLAY_FORMAT).to_string();
    }
    raw.to_string()
}

/// `[h]:mm:ss` rendering for duration-formatted cells.
pub(crate) fn display_duration(total_seconds: i64) -> String {
    let sign = if total_seconds < 0 { "-" } else { "" };
    let secs = total_seconds.abs();
    format!("{sign}{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    // -------------------------------------------------------------------------
    // FUSION TESTS
    // -------------------------------------------------------------------------

    #[test]
    fn test_fuse_iso_date() {
        let value = fuse_date_time("2024-01-01", "10:00:00");
        assert_eq!(value, CdrValue::DateTime(ymd_hms(2024, 1, 1, 10, 0, 0)));
    }

    #[test]
    fn test_fuse_us_slash_date() {
        let value = fuse_date_time("03/04/2024", "23:59");
        assert_eq!(value, CdrValue::DateTime(ymd_hms(2024, 3, 4, 23, 59, 0)));
    }

    #[test]
    fn test_fuse_twelve_hour_clock() {
        let value = fuse_date_time("2024-06-15", "01:30:15 PM");
        assert_eq!(value, CdrValue::DateTime(ymd_hms(2024, 6, 15, 13, 30, 15)));
    }

    #[test]
    fn test_fuse_trims_whitespace() {
        let value = fuse_date_time(" 2024-01-01 ", " 10:00:00 ");
        assert!(value.as_datetime().is_some());
    }

    #[test]
    fn test_fuse_failure_keeps_raw_text() {
        let value = fuse_date_time("not a date", "10:00:00");
        assert_eq!(value, CdrValue::Text("not a date 10:00:00".to_string()));

        let value = fuse_date_time("2024-01-01", "25:99");
        assert_eq!(value, CdrValue::Text("2024-01-01 25:99".to_string()));
    }

    #[test]
    fn test_fuse_round_trip_restringifies() {
        let cases = [
            ("2024-01-01", "10:00:00"),
            ("2023-12-31", "23:59:59"),
            ("2024-02-29", "00:00:01"),
        ];
        for (date, time) in cases {
            let fused = fuse_date_time(date, time);
            assert_eq!(fused.to_string(), format!("{date} {time}"));
        }
    }

    // -------------------------------------------------------------------------
    // DISPLAY TESTS
    // -------------------------------------------------------------------------

    #[test]
    fn test_display_serial_date_only() {
        let at = ymd_hms(2024, 1, 1, 0, 0, 0);
        assert_eq!(display_serial(45292.0, at), "2024-01-01");
    }

    #[test]
    fn test_display_serial_time_only() {
        let at = ymd_hms(1899, 12, 30, 10, 0, 0);
        assert_eq!(display_serial(0.416_666_666_7, at), "10:00:00");
    }

    #[test]
    fn test_display_serial_full_timestamp() {
        let at = ymd_hms(2024, 1, 1, 10, 0, 0);
        assert_eq!(display_serial(45292.416_666_666_7, at), "2024-01-01 10:00:00");
    }

    #[test]
    fn test_display_iso_variants() {
        assert_eq!(display_iso("2024-01-01T00:00:00"), "2024-01-01");
        assert_eq!(display_iso("2024-01-01T10:00:00"), "2024-01-01 10:00:00");
        assert_eq!(display_iso("2024-01-01"), "2024-01-01");
        assert_eq!(display_iso("garbage"), "garbage");
    }

    #[test]
    fn test_display_duration() {
        assert_eq!(display_duration(0), "0:00:00");
        assert_eq!(display_duration(3725), "1:02:05");
        assert_eq!(display_duration(90_000), "25:00:00");
    }
}
