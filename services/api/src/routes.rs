use analyzer::{map_center, AnalysisError, AnalysisResult, GeoPoint};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use parser::{CdrRecord, ParseFailure, XLSX_CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::coordinator::{Dashboard, Snapshot, ViewState};
use crate::error::PipelineError;
use crate::export::{analysis_workbook, records_csv, records_file_name};
use crate::source::SpreadsheetSource;

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_UPLOAD_NAME: &str = "upload.xlsx";

// ============================================================================
// State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Dashboard,
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

#[derive(Serialize)]
struct DashboardResponse<'a> {
    session_id: Uuid,
    state: ViewState,
    file_name: &'a str,
    content_hash: &'a str,
    loaded_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    record_count: usize,
    analysis: &'a AnalysisResult,
    geo_points: &'a [GeoPoint],
    map_center: Option<[f64; 2]>,
}

#[derive(Serialize)]
struct RecordsResponse<'a> {
    file_name: &'a str,
    records: &'a [CdrRecord],
}

// ============================================================================
// Query params
// ============================================================================

#[derive(Deserialize)]
struct OpenQuery {
    name: Option<String>,
}

// ============================================================================
// Helpers
// ============================================================================

fn error_response(status: StatusCode, error: String, kind: &'static str) -> Response {
    (status, Json(ErrorResponse { error, kind })).into_response()
}

fn not_loaded() -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "No dashboard loaded".to_string(),
        "NotLoaded",
    )
}

fn pipeline_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::EmptySource | PipelineError::Parse(ParseFailure::Validation { .. }) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PipelineError::Parse(_) => StatusCode::BAD_REQUEST,
        PipelineError::Superseded => StatusCode::CONFLICT,
        PipelineError::Analysis(AnalysisError::RequestEncode(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        PipelineError::Analysis(_) => StatusCode::BAD_GATEWAY,
    }
}

fn dashboard_response(snapshot: &Snapshot, state: ViewState) -> Response {
    Json(DashboardResponse {
        session_id: snapshot.session_id,
        state,
        file_name: &snapshot.file_name,
        content_hash: &snapshot.content_hash,
        loaded_at: snapshot.loaded_at,
        last_updated: snapshot.last_updated,
        record_count: snapshot.records.len(),
        analysis: &snapshot.analysis,
        geo_points: &snapshot.geo_points,
        map_center: map_center(&snapshot.geo_points).map(|(lat, lng)| [lat, lng]),
    })
    .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn open_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OpenQuery>,
    body: Bytes,
) -> Response {
    let name = params
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());
    let source = Arc::new(SpreadsheetSource::upload(name, body.to_vec()));

    match state.dashboard.open(source).await {
        Ok(snapshot) => {
            let mut response = dashboard_response(&snapshot, state.dashboard.state());
            *response.status_mut() = StatusCode::CREATED;
            response
        }
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "Dashboard load failed");
            error_response(pipeline_status(&e), e.to_string(), e.kind())
        }
    }
}

async fn dashboard_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.dashboard.snapshot() {
        Some(snapshot) => dashboard_response(&snapshot, state.dashboard.state()),
        None => not_loaded(),
    }
}

async fn reset_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    state.dashboard.reset();
    StatusCode::NO_CONTENT
}

async fn records_handler(State(state): State<Arc<AppState>>) -> Response {
    let Some(snapshot) = state.dashboard.snapshot() else {
        return not_loaded();
    };
    Json(RecordsResponse {
        file_name: &snapshot.file_name,
        records: &snapshot.records,
    })
    .into_response()
}

async fn records_csv_handler(State(state): State<Arc<AppState>>) -> Response {
    let Some(snapshot) = state.dashboard.snapshot() else {
        return not_loaded();
    };

    match records_csv(&snapshot.records) {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!(
                        "attachment; filename=\"{}\"",
                        records_file_name(&snapshot.file_name)
                    ),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Records export failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), "ExportError")
        }
    }
}

async fn analysis_export_handler(State(state): State<Arc<AppState>>) -> Response {
    let Some(snapshot) = state.dashboard.snapshot() else {
        return not_loaded();
    };

    let workbook = analysis_workbook(&snapshot.analysis, &snapshot.file_name);
    match workbook.to_xlsx() {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", workbook.file_name),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Analysis export failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), "ExportError")
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/dashboard",
            get(dashboard_handler)
                .post(open_handler)
                .delete(reset_handler),
        )
        .route("/dashboard/records", get(records_handler))
        .route("/dashboard/export/records.csv", get(records_csv_handler))
        .route("/dashboard/export/analysis.xlsx", get(analysis_export_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(Arc::new(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeService;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use parser::fixtures;
    use serde_json::Value;
    use std::time::Duration;
    use calamine::{open_workbook_auto_from_rs, Data, Reader};
    use std::io::Cursor;
    use tower::ServiceExt;

    fn app(service: &Arc<FakeService>) -> (Router, Dashboard) {
        let dashboard = Dashboard::new(service.clone(), Duration::from_secs(60));
        let router = router(AppState {
            dashboard: dashboard.clone(),
        });
        (router, dashboard)
    }

    fn calls_xlsx() -> Vec<u8> {
        fixtures::xlsx(&[
            &["Date", "Time", "Duration", "B Party", "Lat-Long-Azimuth (First CellID)"],
            &["2024-01-01", "10:00:00", "60", "555-1234", "18.52,73.85,120"],
            &["2024-01-01", "11:30:00", "45", "555-1234", "18.52,73.85,120"],
            &["2024-01-02", "09:15:00", "120", "555-9876", "19.07,72.87,45"],
        ])
    }

    fn upload(name: &str, bytes: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/dashboard?name={name}"))
            .body(Body::from(bytes))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // -------------------------------------------------------------------------
    // UPLOAD TESTS
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(&FakeService::new());
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["ok"], true);
    }

    #[tokio::test]
    async fn test_upload_opens_dashboard() {
        let service = FakeService::new();
        let (app, dashboard) = app(&service);

        let response = app.oneshot(upload("march.xlsx", calls_xlsx())).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json(response).await;
        assert_eq!(body["file_name"], "march.xlsx");
        assert_eq!(body["record_count"], 3);
        assert_eq!(body["analysis"]["summaryStats"]["totalCalls"], 3.0);
        assert_eq!(body["geo_points"].as_array().unwrap().len(), 2);
        assert_eq!(body["geo_points"][0]["count"], 2);
        assert!(body["map_center"].is_array());
        assert_eq!(dashboard.state(), ViewState::Active);
    }

    #[tokio::test]
    async fn test_upload_missing_column_is_unprocessable() {
        let service = FakeService::new();
        let (app, dashboard) = app(&service);
        let bytes = fixtures::xlsx(&[&["Date", "Duration"], &["2024-01-01", "60"]]);

        let response = app.oneshot(upload("bad.xlsx", bytes)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = json(response).await;
        assert_eq!(body["kind"], "ValidationError");
        assert!(body["error"].as_str().unwrap().contains("\"time\""));
        assert_eq!(service.calls(), 0);
        assert_eq!(dashboard.state(), ViewState::Idle);
    }

    #[tokio::test]
    async fn test_upload_header_only_is_empty_source() {
        let service = FakeService::new();
        let (app, _) = app(&service);
        let bytes = fixtures::xlsx(&[&["Date", "Time", "Duration"]]);

        let response = app.oneshot(upload("empty.xlsx", bytes)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json(response).await["kind"], "EmptySourceError");
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_upload_garbage_is_bad_request() {
        let (app, _) = app(&FakeService::new());
        let response = app
            .oneshot(upload("junk.xlsx", b"not a workbook".to_vec()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["kind"], "ParseError");
    }

    #[tokio::test]
    async fn test_upload_service_failure_is_bad_gateway() {
        let service = FakeService::new();
        service.set_failing(true);
        let (app, dashboard) = app(&service);

        let response = app.oneshot(upload("march.xlsx", calls_xlsx())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json(response).await["kind"], "AnalysisServiceError");
        assert!(dashboard.snapshot().is_none());
    }

    // -------------------------------------------------------------------------
    // DASHBOARD TESTS
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_dashboard_idle_is_not_found() {
        let (app, _) = app(&FakeService::new());
        for uri in [
            "/dashboard",
            "/dashboard/records",
            "/dashboard/export/records.csv",
            "/dashboard/export/analysis.xlsx",
        ] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_records_and_reset() {
        let (app, _) = app(&FakeService::new());
        app.clone()
            .oneshot(upload("march.xlsx", calls_xlsx()))
            .await
            .unwrap();

        let body = json(app.clone().oneshot(get("/dashboard/records")).await.unwrap()).await;
        let records = body["records"].as_array().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["bparty"], "555-1234");
        assert_eq!(records[0]["datetime"], "2024-01-01T10:00:00");

        let reset = Request::builder()
            .method("DELETE")
            .uri("/dashboard")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(reset).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.oneshot(get("/dashboard")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // -------------------------------------------------------------------------
    // EXPORT TESTS
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_records_csv_export() {
        let (app, _) = app(&FakeService::new());
        app.clone()
            .oneshot(upload("march.xlsx", calls_xlsx()))
            .await
            .unwrap();

        let response = app.oneshot(get("/dashboard/export/records.csv")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"march_data.csv\""
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let csv = String::from_utf8(bytes.to_vec()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,time,duration,bparty,lat-long-azimuthfirstcellid,datetime"
        );
        assert_eq!(csv.lines().count(), 4);
    }

    #[tokio::test]
    async fn test_analysis_export() {
        let (app, _) = app(&FakeService::new());
        app.clone()
            .oneshot(upload("march.xls", calls_xlsx()))
            .await
            .unwrap();

        let response = app
            .oneshot(get("/dashboard/export/analysis.xlsx"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], XLSX_CONTENT_TYPE);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"march_analysis.xlsx\""
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let mut book = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).unwrap();
        assert_eq!(book.sheet_names().len(), 8);
        assert_eq!(book.sheet_names()[0], "Summary");
        let summary = book.worksheet_range("Summary").unwrap();
        assert_eq!(
            summary.get_value((1, 0)),
            Some(&Data::String("Total Calls".into()))
        );
        assert_eq!(summary.get_value((1, 1)), Some(&Data::Float(3.0)));
    }
}
