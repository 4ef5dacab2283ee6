//! In-memory source and scripted analysis service for tests.

use analyzer::{testing::sample_response, AnalysisError, AnalysisRequest, AnalysisService};
use async_trait::async_trait;
use parser::{CdrRecord, CdrValue, ParseFailure};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use crate::source::{RecordSource, SourceData};

/// `n` records with distinct dates, durations and one shared cell location.
pub fn records(n: usize) -> Vec<CdrRecord> {
    (0..n)
        .map(|i| {
            [
                ("Date", CdrValue::Text(format!("2024-01-{:02}", i % 28 + 1))),
                ("Time", CdrValue::Text("10:00:00".to_string())),
                ("Duration", CdrValue::Number(60.0 + i as f64)),
                ("B Party", CdrValue::Text(format!("555-{i:04}"))),
                (
                    "Lat-Long-Azimuth (First CellID)",
                    CdrValue::Text("18.52,73.85,120".to_string()),
                ),
            ]
            .into_iter()
            .collect()
        })
        .collect()
}

pub struct StaticSource {
    records: Mutex<Vec<CdrRecord>>,
    failing: AtomicBool,
}

impl StaticSource {
    pub fn new(records: Vec<CdrRecord>) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(records),
            failing: AtomicBool::new(false),
        })
    }

    pub fn set_records(&self, records: Vec<CdrRecord>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    fn name(&self) -> &str {
        "static.xlsx"
    }

    async fn load(&self) -> Result<SourceData, ParseFailure> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ParseFailure::FileRead {
                file_name: self.name().to_string(),
                reason: "source unavailable".to_string(),
            });
        }
        let records = self.records.lock().unwrap().clone();
        Ok(SourceData {
            content_hash: format!("static:{}", records.len()),
            records,
        })
    }
}

/// Pauses one `generate` call until released.
pub struct Gate {
    pub entered: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

struct HeldCall {
    entered: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// Answers with `sample_response(total_records)` unless told otherwise.
pub struct FakeService {
    calls: AtomicUsize,
    failing: AtomicBool,
    response: Mutex<Option<Value>>,
    held: Mutex<Option<HeldCall>>,
}

impl FakeService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            response: Mutex::new(None),
            held: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn respond_with(&self, value: Value) {
        *self.response.lock().unwrap() = Some(value);
    }

    pub fn hold_next(&self) -> Gate {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.held.lock().unwrap() = Some(HeldCall {
            entered: entered_tx,
            release: release_rx,
        });
        Gate {
            entered: entered_rx,
            release: release_tx,
        }
    }
}

#[async_trait]
impl AnalysisService for FakeService {
    async fn generate(&self, request: &AnalysisRequest) -> analyzer::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let held = self.held.lock().unwrap().take();
        if let Some(held) = held {
            let _ = held.entered.send(());
            let _ = held.release.await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(AnalysisError::Service("HTTP 503: overloaded".to_string()));
        }
        let response = self.response.lock().unwrap().clone();
        Ok(response
            .unwrap_or_else(|| sample_response(request.total_records as u64))
            .to_string())
    }
}
