//! Analyzer - Contract-checked CDR analysis through an external model
//!
//! Responsibilities:
//! - Sample records and build a deterministic analysis request
//! - Call the analysis service (Gemini) through a swappable capability
//! - Decode the response and enforce the result contract, all-or-nothing
//! - Derive map points from raw records

mod client;
mod contract;
mod decode;
mod error;
mod geo;
mod model;
mod prompt;

#[cfg(any(test, feature = "fixtures"))]
pub mod testing;

pub use client::{AnalysisService, GeminiClient, GeminiSettings};
pub use contract::{Shape, ANALYSIS_CONTRACT};
pub use decode::decode_response;
pub use error::{AnalysisError, Result};
pub use geo::{geo_points, map_center, GeoPoint};
pub use model::{
    AnalysisResult, CallAnalysis, CrimeAnalysis, DateCount, DeviceAnalysis, LocationAnalysis,
    NameCount, NameCountPercent, NameValue, SummaryStats,
};
pub use prompt::{build_request, sample, AnalysisRequest, KNOWN_COLUMNS, SAMPLE_LIMIT};

use parser::CdrRecord;
use tracing::info;

/// Run one analysis: build the request, call the service, validate.
pub async fn analyze<S>(service: &S, records: &[CdrRecord]) -> Result<AnalysisResult>
where
    S: AnalysisService + ?Sized,
{
    let request = build_request(records)?;
    let text = service.generate(&request).await?;
    let result = decode_response(&text)?;
    info!(
        total = request.total_records,
        top_crimes = result.crime_analysis.top_crimes.len(),
        days = result.call_analysis.calls_per_day.len(),
        "Analysis accepted"
    );
    Ok(result)
}
