use async_trait::async_trait;
use parser::{parse_workbook, CdrRecord, ParseFailure};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// Records read from a source, plus a hash of the bytes they came from.
#[derive(Debug, Clone)]
pub struct SourceData {
    pub records: Vec<CdrRecord>,
    pub content_hash: String,
}

/// Something the dashboard can (re-)parse on every cycle.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Display name, e.g. the uploaded file name.
    fn name(&self) -> &str;

    async fn load(&self) -> Result<SourceData, ParseFailure>;
}

/// Spreadsheet held in memory or re-read from disk on every load.
#[derive(Debug, Clone)]
pub enum SpreadsheetSource {
    Upload { name: String, bytes: Arc<[u8]> },
    File { name: String, path: PathBuf },
}

impl SpreadsheetSource {
    pub fn upload(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        SpreadsheetSource::Upload {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        SpreadsheetSource::File { name, path }
    }

    async fn read_bytes(&self) -> Result<Arc<[u8]>, ParseFailure> {
        match self {
            SpreadsheetSource::Upload { bytes, .. } => Ok(bytes.clone()),
            SpreadsheetSource::File { name, path } => fs::read(path)
                .await
                .map(Arc::from)
                .map_err(|e| ParseFailure::FileRead {
                    file_name: name.clone(),
                    reason: e.to_string(),
                }),
        }
    }
}

#[async_trait]
impl RecordSource for SpreadsheetSource {
    fn name(&self) -> &str {
        match self {
            SpreadsheetSource::Upload { name, .. } | SpreadsheetSource::File { name, .. } => name,
        }
    }

    async fn load(&self) -> Result<SourceData, ParseFailure> {
        let bytes = self.read_bytes().await?;
        let content_hash = content_hash(&bytes);
        debug!(file = self.name(), size = bytes.len(), hash = %content_hash, "Source read");

        // Workbook decoding is CPU-bound
        let name = self.name().to_string();
        let records = tokio::task::spawn_blocking(move || parse_workbook(&bytes, &name))
            .await
            .map_err(|e| ParseFailure::Parse {
                file_name: self.name().to_string(),
                reason: format!("parser task failed: {e}"),
            })??;

        Ok(SourceData {
            records,
            content_hash,
        })
    }
}

pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}
