use serde_json::Value;

use crate::contract::ANALYSIS_CONTRACT;
use crate::error::{AnalysisError, Result};
use crate::model::AnalysisResult;

/// Decode raw response text into a validated `AnalysisResult`.
///
/// Syntax errors surface as `ResponseDecode` before any contract check runs.
pub fn decode_response(text: &str) -> Result<AnalysisResult> {
    let cleaned = strip_code_fence(text);

    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| AnalysisError::ResponseDecode(e.to_string()))?;

    ANALYSIS_CONTRACT.validate(&value)?;

    serde_json::from_value(value).map_err(|e| AnalysisError::SchemaValidation {
        path: "<root>".to_string(),
        reason: e.to_string(),
    })
}

/// Remove a surrounding markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}
