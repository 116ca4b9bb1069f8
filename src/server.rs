// Bills Dashboard - HTTP view server
// Read-only JSON views over the shared collection, plus CSV export and refresh

use crate::bill::BillStatus;
use crate::dashboard::{page_view, sorted_view, Dashboard, ViewQuery};
use crate::export::{self, CSV_MIME};
use crate::filter::BillFilters;
use crate::sort::{SortDirection, SortField, SortSpec};
use crate::source::{BillSource, LoadReport};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock, RwLockReadGuard};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    dashboard: Arc<RwLock<Dashboard>>,
    source: Arc<dyn BillSource>,
}

impl AppState {
    pub fn new(dashboard: Dashboard, source: Arc<dyn BillSource>) -> Self {
        AppState {
            dashboard: Arc::new(RwLock::new(dashboard)),
            source,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Dashboard>, ApiError> {
        self.dashboard
            .read()
            .map_err(|_| ApiError::internal("dashboard state is unavailable"))
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

// ============================================================================
// Query parameters
// ============================================================================

/// `?search=&status=a,b&new_only=&sort=&direction=&page=&page_size=`
#[derive(Debug, Default, Deserialize)]
pub struct ViewParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub new_only: Option<bool>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl ViewParams {
    pub fn into_query(self) -> Result<ViewQuery, String> {
        let defaults = ViewQuery::default();

        let statuses = match self.status.as_deref() {
            None => Vec::new(),
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<BillStatus>().map_err(|e| e.to_string()))
                .collect::<Result<Vec<_>, _>>()?,
        };

        let field = match self.sort.as_deref() {
            Some(raw) => raw.parse::<SortField>()?,
            None => defaults.sort.field,
        };
        let direction = match self.direction.as_deref() {
            Some(raw) => raw.parse::<SortDirection>()?,
            None => defaults.sort.direction,
        };

        let page_size = match self.page_size {
            Some(size) => NonZeroUsize::new(size).ok_or("page_size must be at least 1")?,
            None => defaults.page_size,
        };

        Ok(ViewQuery {
            filters: BillFilters {
                search: self.search.unwrap_or_default(),
                statuses,
                show_new_only: self.new_only.unwrap_or(false),
            },
            sort: SortSpec { field, direction },
            page: self.page.unwrap_or(1).max(1),
            page_size,
        })
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/view - One page of the filtered, sorted collection
async fn get_view(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
) -> Result<Response, ApiError> {
    let query = params.into_query().map_err(ApiError::bad_request)?;
    let dashboard = state.read()?;
    let view = page_view(dashboard.all_bills(), &query);
    Ok(Json(ApiResponse::ok(view)).into_response())
}

/// GET /api/export.csv - Filtered, sorted, unpaginated CSV
async fn get_export(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
) -> Result<Response, ApiError> {
    let query = params.into_query().map_err(ApiError::bad_request)?;
    let dashboard = state.read()?;

    let bills = sorted_view(dashboard.all_bills(), &query.filters, query.sort);
    let body = export::to_csv_string(bills).map_err(|e| {
        tracing::error!(error = %e, "csv export failed");
        ApiError::internal(e.to_string())
    })?;
    let disposition = format!("attachment; filename=\"{}\"", dashboard.export_filename());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, CSV_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// POST /api/refresh - Re-fetch from the upstream bills API
async fn refresh(State(state): State<AppState>) -> Result<Json<ApiResponse<LoadReport>>, ApiError> {
    let dashboard = state.dashboard.clone();
    let source = state.source.clone();

    // The upstream client is blocking. Readers keep being served while it
    // runs; the write lock is only taken for the swap.
    let result = tokio::task::spawn_blocking(move || {
        let unavailable = || ApiError::internal("dashboard state is unavailable");

        let fetched_at = dashboard.read().map_err(|_| unavailable())?.now();
        let fetched = source.fetch(fetched_at);

        let mut dashboard = dashboard.write().map_err(|_| unavailable())?;
        dashboard.apply_load(fetched, fetched_at).map_err(|e| ApiError {
            status: StatusCode::BAD_GATEWAY,
            message: e.to_string(),
        })
    })
    .await
    .map_err(|e| ApiError::internal(e.to_string()))?;

    let report = result?;
    tracing::info!(loaded = report.loaded, skipped = report.skipped, "collection refreshed");
    Ok(Json(ApiResponse::ok(report)))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/view", get(get_view))
        .route("/api/export.csv", get(get_export))
        .route("/api/refresh", post(refresh))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bill::Bill;
    use crate::error::{BillError, Result};
    use crate::source::{RawBill, StaticSource};
    use crate::store::{BillStore, ManualClock};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::Value;
    use std::time::{Duration, Instant};
    use tower::ServiceExt;

    struct FailingSource;

    impl BillSource for FailingSource {
        fn fetch(&self, _fetched_at: DateTime<Utc>) -> Result<(Vec<Bill>, LoadReport)> {
            Err(BillError::UpstreamStatus(500))
        }
    }

    struct SlowSource(Duration);

    impl BillSource for SlowSource {
        fn fetch(&self, fetched_at: DateTime<Utc>) -> Result<(Vec<Bill>, LoadReport)> {
            std::thread::sleep(self.0);
            StaticSource::new(raws(7)).fetch(fetched_at)
        }
    }

    fn raws(count: u32) -> Vec<RawBill> {
        (1..=count)
            .map(|n| RawBill {
                bill_id: Some(format!("HB {}", n)),
                description: Some(format!("Relating to item {}", n)),
                patron_name: Some("Delegate Smith".to_string()),
                passed: Some(if n % 3 == 0 { "Yes" } else { "No" }.to_string()),
                introduction_date: Some(format!("2025-01-{:02}", n)),
                ..Default::default()
            })
            .collect()
    }

    fn state_with(count: u32, source: Arc<dyn BillSource>) -> AppState {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 7, 15, 0, 0).unwrap()));
        let mut dashboard = Dashboard::new(BillStore::with_clock(clock));
        dashboard.load_from(&StaticSource::new(raws(count))).unwrap();
        AppState::new(dashboard, source)
    }

    async fn send(state: AppState, method: &str, uri: &str) -> (StatusCode, Vec<u8>, Option<String>) {
        let response = router(state)
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec(), disposition)
    }

    fn json(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let state = state_with(1, Arc::new(StaticSource::new(vec![])));
        let (status, body, _) = send(state, "GET", "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body), serde_json::json!({"success": true, "data": "OK"}));
    }

    #[tokio::test]
    async fn test_view_defaults() {
        let state = state_with(25, Arc::new(StaticSource::new(vec![])));
        let (status, body, _) = send(state, "GET", "/api/view").await;
        assert_eq!(status, StatusCode::OK);

        let data = &json(&body)["data"];
        assert_eq!(data["total_bills"], 25);
        assert_eq!(data["total_pages"], 3);
        assert_eq!(data["current_page"], 1);
        assert_eq!(data["bills"].as_array().unwrap().len(), 10);
        assert_eq!(data["bills"][0]["billId"], "HB 25");
    }

    #[tokio::test]
    async fn test_view_with_filters_and_sort() {
        let state = state_with(12, Arc::new(StaticSource::new(vec![])));
        let (status, body, _) = send(
            state,
            "GET",
            "/api/view?status=passed&sort=billId&direction=asc&page_size=25",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let data = &json(&body)["data"];
        let ids: Vec<&str> = data["bills"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["billId"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["HB 12", "HB 3", "HB 6", "HB 9"]);
        assert_eq!(data["page_size"], 25);
    }

    #[tokio::test]
    async fn test_view_rejects_unknown_values() {
        let state = state_with(3, Arc::new(StaticSource::new(vec![])));
        let (status, body, _) = send(state.clone(), "GET", "/api/view?status=enacted").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let payload = json(&body);
        assert_eq!(payload["success"], false);
        assert!(payload["error"].as_str().unwrap().contains("enacted"));

        let (status, _, _) = send(state.clone(), "GET", "/api/view?sort=color").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = send(state, "GET", "/api/view?page_size=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_csv() {
        let state = state_with(12, Arc::new(StaticSource::new(vec![])));
        let (status, body, disposition) =
            send(state, "GET", "/api/export.csv?search=hb%201&sort=billId&direction=asc").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            disposition.as_deref(),
            Some("attachment; filename=\"virginia-bills-2025-03-07.csv\"")
        );

        let text = String::from_utf8(body).unwrap();
        let ids: Vec<&str> = text.lines().skip(1).map(|l| l.split(',').next().unwrap()).collect();
        assert_eq!(ids, vec!["HB 1", "HB 10", "HB 11", "HB 12"]);
    }

    #[tokio::test]
    async fn test_refresh_replaces_collection() {
        let state = state_with(2, Arc::new(StaticSource::new(raws(5))));
        let (status, body, _) = send(state.clone(), "POST", "/api/refresh").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["data"]["loaded"], 5);

        let (_, body, _) = send(state, "GET", "/api/view").await;
        assert_eq!(json(&body)["data"]["total_bills"], 5);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_collection() {
        let state = state_with(4, Arc::new(FailingSource));
        let (status, body, _) = send(state.clone(), "POST", "/api/refresh").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(json(&body)["error"].as_str().unwrap().contains("500"));

        let (_, body, _) = send(state, "GET", "/api/view").await;
        assert_eq!(json(&body)["data"]["total_bills"], 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_views_are_served_during_a_slow_refresh() {
        let state = state_with(3, Arc::new(SlowSource(Duration::from_millis(1500))));

        let refreshing = tokio::spawn(send(state.clone(), "POST", "/api/refresh"));
        tokio::time::sleep(Duration::from_millis(200)).await;

        let started = Instant::now();
        let (status, body, _) = send(state.clone(), "GET", "/api/view").await;
        assert_eq!(status, StatusCode::OK);
        assert!(started.elapsed() < Duration::from_millis(500), "view waited {:?}", started.elapsed());
        assert_eq!(json(&body)["data"]["total_bills"], 3);

        let (status, _, _) = refreshing.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        let (_, body, _) = send(state, "GET", "/api/view").await;
        assert_eq!(json(&body)["data"]["total_bills"], 7);
    }
}
