use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Transport failure or an error reported by the service itself.
    #[error("Analysis service error: {0}")]
    Service(String),

    /// The response text is not a JSON document.
    #[error("Failed to decode analysis response: {0}")]
    ResponseDecode(String),

    /// Well-formed JSON that violates the analysis contract.
    #[error("Analysis response violates contract at {path}: {reason}")]
    SchemaValidation { path: String, reason: String },

    #[error("Failed to encode analysis request: {0}")]
    RequestEncode(String),
}

impl AnalysisError {
    /// Stable taxonomy name, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Service(_) => "AnalysisServiceError",
            AnalysisError::ResponseDecode(_) => "ResponseDecodeError",
            AnalysisError::SchemaValidation { .. } => "SchemaValidationError",
            AnalysisError::RequestEncode(_) => "RequestEncodeError",
        }
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        // Drop the URL from the message, it may carry query parameters
        AnalysisError::Service(err.without_url().to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
