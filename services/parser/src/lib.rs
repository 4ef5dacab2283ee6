//! CDR Parser - Turns call detail spreadsheets into normalized records
//!
//! Responsibilities:
//! - Normalize arbitrary column headers into a canonical key space
//! - Read the first sheet of an XLS/XLSX/ODS workbook from memory
//! - Reject files missing the required date/time/duration columns
//! - Convert cells to display values and fuse date + time into `datetime`
//! - Write typed rows back out as a minimal `.xlsx` workbook
//!
//! CRITICAL: parsing is DETERMINISTIC and side-effect free.
//! Same bytes = same records (and same rows = same workbook), no disk or
//! network access.

mod cell;
mod datetime;
mod error;
mod header;
mod record;
mod workbook;
mod xlsx;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use datetime::{fuse_date_time, DATETIME_DISPLAY_FORMAT};
pub use error::ParseFailure;
pub use header::normalize_header;
pub use record::{columns, CdrRecord, CdrValue};
pub use workbook::{parse_range, parse_workbook, REQUIRED_COLUMNS};
pub use xlsx::{write_xlsx, XlsxWriteError, XLSX_CONTENT_TYPE};
