//! Dashboard state and background refresh
//!
//! The dashboard is a small state machine:
//!
//! ```text
//!   Idle --open ok--> Active --tick--> RefreshInFlight --done--> Active
//!     ^                 |                    |
//!     +-----reset-------+--------reset-------+
//! ```
//!
//! Records and analysis live in one `Snapshot` that is swapped as a whole.
//! Loads and refreshes only commit if the session they started for is still
//! current, so a reset (or a new upload) always wins over a late result.

use analyzer::{analyze, geo_points, AnalysisResult, AnalysisService, GeoPoint};
use chrono::{DateTime, Utc};
use parser::CdrRecord;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::source::{RecordSource, SourceData};

const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViewState {
    Idle,
    Active,
    RefreshInFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New records and analysis were committed.
    Refreshed,
    /// The cycle failed; the displayed data is untouched.
    Failed,
    /// Another refresh was already running.
    Dropped,
    /// The view was reset or replaced while the cycle ran.
    Discarded,
    /// Nothing to refresh.
    NotActive,
}

/// Records and the analysis derived from them, captured at the same moment.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub session_id: Uuid,
    pub file_name: String,
    pub content_hash: String,
    pub records: Vec<CdrRecord>,
    pub analysis: AnalysisResult,
    pub geo_points: Vec<GeoPoint>,
    pub loaded_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Handle to the dashboard. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<Inner>,
}

struct Inner {
    service: Arc<dyn AnalysisService>,
    refresh_interval: Duration,
    view: Mutex<View>,
}

enum View {
    Idle,
    /// Initial load for this session is running; reported as idle.
    Loading(Uuid),
    Active(ActiveView),
}

struct ActiveView {
    source: Arc<dyn RecordSource>,
    snapshot: Arc<Snapshot>,
    refreshing: Arc<AtomicBool>,
    _timer: RefreshTimer,
}

/// Recurring refresh task; aborted when the active view goes away.
struct RefreshTimer(JoinHandle<()>);

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Holds a session's single refresh slot until dropped.
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Dashboard {
    pub fn new(service: Arc<dyn AnalysisService>, refresh_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                service,
                refresh_interval: refresh_interval.max(MIN_REFRESH_INTERVAL),
                view: Mutex::new(View::Idle),
            }),
        }
    }

    fn view(&self) -> MutexGuard<'_, View> {
        self.inner.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ViewState {
        match &*self.view() {
            View::Idle | View::Loading(_) => ViewState::Idle,
            View::Active(active) if active.refreshing.load(Ordering::Acquire) => {
                ViewState::RefreshInFlight
            }
            View::Active(_) => ViewState::Active,
        }
    }

    /// Current snapshot, `None` while idle.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        match &*self.view() {
            View::Active(active) => Some(active.snapshot.clone()),
            View::Idle | View::Loading(_) => None,
        }
    }

    /// Load `source`, analyze it and make it the active view.
    ///
    /// Any previous view is dropped first. On error the dashboard stays idle
    /// and the error is returned for the caller to show; nothing is retried.
    /// A reset or another `open` while this one runs makes it return
    /// [`PipelineError::Superseded`] without touching the view.
    pub async fn open(&self, source: Arc<dyn RecordSource>) -> Result<Arc<Snapshot>, PipelineError> {
        let session_id = Uuid::new_v4();
        self.replace_view(View::Loading(session_id));
        info!(%session_id, file = source.name(), "Opening dashboard");

        let (data, analysis) =
            match run_cycle(source.as_ref(), self.inner.service.as_ref()).await {
                Ok(parts) => parts,
                Err(e) => {
                    let mut view = self.view();
                    if matches!(*view, View::Loading(id) if id == session_id) {
                        *view = View::Idle;
                    }
                    return Err(e);
                }
            };

        let now = Utc::now();
        let snapshot = Arc::new(Snapshot {
            session_id,
            file_name: source.name().to_string(),
            content_hash: data.content_hash,
            geo_points: geo_points(&data.records),
            records: data.records,
            analysis,
            loaded_at: now,
            last_updated: now,
        });

        {
            let mut view = self.view();
            if !matches!(*view, View::Loading(id) if id == session_id) {
                info!(%session_id, "View changed during load, discarding result");
                return Err(PipelineError::Superseded);
            }
            *view = View::Active(ActiveView {
                source,
                snapshot: snapshot.clone(),
                refreshing: Arc::new(AtomicBool::new(false)),
                _timer: self.spawn_timer(session_id),
            });
        }

        info!(%session_id, records = snapshot.records.len(), "Dashboard active");
        Ok(snapshot)
    }

    /// Return to idle. Stops the timer; in-flight refreshes will discard
    /// their result.
    pub fn reset(&self) {
        self.replace_view(View::Idle);
    }

    fn replace_view(&self, next: View) {
        let previous = std::mem::replace(&mut *self.view(), next);
        match previous {
            View::Active(active) => {
                info!(session_id = %active.snapshot.session_id, "Dashboard reset")
            }
            View::Loading(session_id) => info!(%session_id, "Pending load cancelled"),
            View::Idle => {}
        }
    }

    /// Run one refresh cycle for the currently active view.
    pub async fn refresh(&self) -> RefreshOutcome {
        let session_id = match &*self.view() {
            View::Active(active) => active.snapshot.session_id,
            View::Idle | View::Loading(_) => return RefreshOutcome::NotActive,
        };
        self.refresh_session(session_id).await
    }

    async fn refresh_session(&self, session_id: Uuid) -> RefreshOutcome {
        let (source, refreshing) = match &*self.view() {
            View::Active(active) if active.snapshot.session_id == session_id => {
                (active.source.clone(), active.refreshing.clone())
            }
            _ => return RefreshOutcome::NotActive,
        };

        let Some(_guard) = InFlightGuard::acquire(refreshing) else {
            debug!(%session_id, "Refresh already in flight, dropping tick");
            return RefreshOutcome::Dropped;
        };

        debug!(%session_id, file = source.name(), "Refreshing dashboard");
        let (data, analysis) =
            match run_cycle(source.as_ref(), self.inner.service.as_ref()).await {
                Ok(parts) => parts,
                Err(e) => {
                    warn!(%session_id, kind = e.kind(), error = %e, "Background refresh failed, keeping current data");
                    return RefreshOutcome::Failed;
                }
            };

        let mut view = self.view();
        match &mut *view {
            View::Active(active) if active.snapshot.session_id == session_id => {
                let previous = &active.snapshot;
                if previous.content_hash != data.content_hash {
                    info!(%session_id, hash = %data.content_hash, "Source content changed");
                }
                active.snapshot = Arc::new(Snapshot {
                    session_id,
                    file_name: previous.file_name.clone(),
                    content_hash: data.content_hash,
                    geo_points: geo_points(&data.records),
                    records: data.records,
                    analysis,
                    loaded_at: previous.loaded_at,
                    last_updated: Utc::now(),
                });
                info!(%session_id, records = active.snapshot.records.len(), "Dashboard refreshed");
                RefreshOutcome::Refreshed
            }
            _ => {
                info!(%session_id, "View changed during refresh, discarding result");
                RefreshOutcome::Discarded
            }
        }
    }

    fn spawn_timer(&self, session_id: Uuid) -> RefreshTimer {
        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.refresh_interval;

        RefreshTimer(tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                // Own task: cancelling the timer must not cancel a running cycle
                let dashboard = Dashboard { inner };
                tokio::spawn(async move {
                    dashboard.refresh_session(session_id).await;
                });
            }
        }))
    }
}

/// Parse, then analyze. Analysis is never attempted without records.
async fn run_cycle(
    source: &dyn RecordSource,
    service: &dyn AnalysisService,
) -> Result<(SourceData, AnalysisResult), PipelineError> {
    let data = source.load().await?;
    if data.records.is_empty() {
        return Err(PipelineError::EmptySource);
    }
    let analysis = analyze(service, &data.records).await?;
    Ok((data, analysis))
}
