use analyzer::AnalysisError;
use parser::ParseFailure;
use thiserror::Error;

/// Anything that can abort a load-and-analyze cycle.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseFailure),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("The uploaded file seems to be empty or in an unsupported format.")]
    EmptySource,

    #[error("The load was cancelled by a reset or a newer upload.")]
    Superseded,
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Parse(e) => e.kind(),
            PipelineError::Analysis(e) => e.kind(),
            PipelineError::EmptySource => "EmptySourceError",
            PipelineError::Superseded => "SupersededError",
        }
    }
}
