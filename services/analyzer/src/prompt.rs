use parser::CdrRecord;
use serde_json::Value;
use tracing::info;

use crate::contract::ANALYSIS_CONTRACT;
use crate::error::{AnalysisError, Result};

/// Most records ever embedded in a single request.
pub const SAMPLE_LIMIT: usize = 500;

/// Column headers a CDR export may carry. Any of them can be missing.
pub const KNOWN_COLUMNS: &[&str] = &[
    "CdrNo",
    "B Party",
    "Date",
    "Time",
    "Duration",
    "Call Type",
    "First Cell ID",
    "First Cell ID Address",
    "Last Cell ID",
    "Last Cell ID Address",
    "IMEI",
    "IMSI",
    "Roaming",
    "Main City(First CellID)",
    "Sub City (First CellID)",
    "Lat-Long-Azimuth (First CellID)",
    "Crime",
    "Circle",
    "Operator",
    "LRN",
    "CallForward",
    "RoamingOriginated",
    "B Party Provider",
    "B Party Circle",
    "B Party Operator",
    "Type",
    "IMEI Manufacturer",
    "Device Type",
];

const INSTRUCTIONS: &str = r#"You are an expert data analyst specializing in Call Detail Records (CDR).
You will receive a JSON array of CDR records. Analyse them and answer with a single JSON object that strictly conforms to the provided response schema.

Compute every statistic for the FULL dataset, even though only a sample of it is included below:
1. Summary stats: total calls, total duration (in seconds and formatted HH:MM:SS), unique IMEIs, unique IMSIs, roaming calls, and the date range (earliest to latest date).
2. Crime analysis: the top 10 crimes by frequency, with count and percentage (0-100).
3. Call analysis: the top 10 B parties by call count; the distribution of call types (e.g. Incoming, Outgoing); the number of calls per day, sorted chronologically.
4. Location analysis: call counts per 'Main City(First CellID)'.
5. Device analysis: the top 10 IMEIs by call count; the distribution of IMEI manufacturers.

Handle missing or inconsistent data gracefully. If a column needed for an analysis is missing, return an empty array for that result."#;

/// A fully built request for the analysis service.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    /// Records in the source, not just in the sample.
    pub total_records: usize,
    pub sample_size: usize,
    pub prompt: String,
    /// Gemini `responseSchema` for the expected answer.
    pub response_schema: Value,
}

/// Leading records sent to the service. A prefix, never a random pick.
pub fn sample(records: &[CdrRecord]) -> &[CdrRecord] {
    &records[..records.len().min(SAMPLE_LIMIT)]
}

/// Build the request for `records`. Deterministic for a given sequence.
pub fn build_request(records: &[CdrRecord]) -> Result<AnalysisRequest> {
    let sample = sample(records);
    if sample.len() < records.len() {
        info!(
            total = records.len(),
            sample = sample.len(),
            "Truncating records for analysis request"
        );
    }

    let sample_json =
        serde_json::to_string(sample).map_err(|e| AnalysisError::RequestEncode(e.to_string()))?;

    let prompt = format!(
        "{INSTRUCTIONS}\n\nThe CDR data may contain the following columns, but some may be missing:\n{columns}\n\nThe total record count of the original file is {total}. Use it for every count and percentage calculation.\n\nHere is a sample of {size} CDR records:\n{sample_json}\n",
        columns = KNOWN_COLUMNS
            .iter()
            .map(|c| format!("'{c}'"))
            .collect::<Vec<_>>()
            .join(", "),
        total = records.len(),
        size = sample.len(),
    );

    Ok(AnalysisRequest {
        total_records: records.len(),
        sample_size: sample.len(),
        prompt,
        response_schema: ANALYSIS_CONTRACT.to_response_schema(),
    })
}
