//! API Service - Live CDR analysis dashboard
//!
//! Responsibilities:
//! - Hold the single active dashboard (records + analysis snapshot)
//! - Re-parse and re-analyze the active source on a fixed interval
//! - Serve snapshots, records and exports over HTTP
//!
//! Endpoints:
//! - GET /health - Health check
//! - POST /dashboard?name= - Upload a spreadsheet and open it
//! - GET /dashboard - Current snapshot
//! - DELETE /dashboard - Back to idle
//! - GET /dashboard/records - Parsed records
//! - GET /dashboard/export/records.csv - Records as CSV
//! - GET /dashboard/export/analysis - Analysis workbook sheets

pub mod config;
pub mod coordinator;
pub mod error;
pub mod export;
pub mod routes;
pub mod source;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use coordinator::{Dashboard, RefreshOutcome, Snapshot, ViewState};
pub use error::PipelineError;
pub use routes::{router, AppState};
pub use source::{content_hash, RecordSource, SourceData, SpreadsheetSource};
