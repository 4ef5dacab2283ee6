use thiserror::Error;

/// File-level parse failures. Field-level problems (e.g. an unparseable
/// date/time pair) never surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseFailure {
    #[error("File could not be read ({file_name}): {reason}")]
    FileRead { file_name: String, reason: String },

    #[error("Failed to parse {file_name}. It might be corrupted or in an unsupported format: {reason}")]
    Parse { file_name: String, reason: String },

    #[error("Missing required column: \"{column}\". Please ensure your file includes Date, Time, and Duration.")]
    Validation { column: String },
}

impl ParseFailure {
    /// Stable taxonomy name, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseFailure::FileRead { .. } => "FileReadError",
            ParseFailure::Parse { .. } => "ParseError",
            ParseFailure::Validation { .. } => "ValidationError",
        }
    }
}
