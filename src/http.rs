//! HTTP API layer: routes cache reads and forced refreshes over axum.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use common::{Error, Hemisphere, ServiceConfig};
use extent_cache::{ExtentSource, RefreshCoordinator, RefreshOutcome};

/// Shared handler state: the refresh coordinator (which owns the cache) plus
/// the service configuration. Passed to every handler via axum `State`.
pub struct AppState<S: ExtentSource> {
    pub coordinator: Arc<RefreshCoordinator<S>>,
    pub config: ServiceConfig,
}

/// Build the service router with CORS and request tracing layers.
pub fn router<S: ExtentSource>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/status", get(api_status))
        .route("/api/current", get(api_current))
        .route("/api/monthly/{hemisphere}", get(api_monthly))
        .route("/api/historical/{hemisphere}", get(api_historical))
        .route("/api/health", get(api_health))
        .route("/api/refresh", get(api_refresh))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Success envelope: `{"status": "success", "data": ..., "timestamp": ...}`.
fn success(data: Value) -> Json<Value> {
    Json(json!({
        "status": "success",
        "data": data,
        "timestamp": now_iso(),
    }))
}

/// Client-visible failure: a service error paired with its HTTP status.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match &self.0 {
            Error::InvalidHemisphere(_) => StatusCode::BAD_REQUEST,
            Error::RefreshTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::NotYetCached
            | Error::UpstreamUnavailable(_)
            | Error::MalformedUpstreamData(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "status": "error",
            "message": self.0.to_string(),
            "timestamp": now_iso(),
        }));

        (code, body).into_response()
    }
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(include_str!("../assets/dashboard.html"))
}

/// Full cache snapshot for both hemispheres.
async fn api_status<S: ExtentSource>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Value>, ApiError> {
    let snapshot = state.coordinator.cache().snapshot().await;
    if snapshot.is_empty() {
        return Err(Error::NotYetCached.into());
    }
    Ok(success(json!(snapshot)))
}

/// Latest reading per hemisphere, keyed the way the dashboard labels them.
async fn api_current<S: ExtentSource>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Value>, ApiError> {
    let cache = state.coordinator.cache();
    let arctic = cache.get(Hemisphere::North).map(|s| s.latest);
    let antarctic = cache.get(Hemisphere::South).map(|s| s.latest);

    if arctic.is_none() && antarctic.is_none() {
        return Err(Error::NotYetCached.into());
    }

    Ok(success(json!({
        "arctic": arctic,
        "antarctic": antarctic,
    })))
}

/// Trailing-month daily series for one hemisphere.
async fn api_monthly<S: ExtentSource>(
    State(state): State<Arc<AppState<S>>>,
    Path(hemisphere): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let hemisphere: Hemisphere = hemisphere.parse()?;
    let status = state
        .coordinator
        .cache()
        .get(hemisphere)
        .ok_or(Error::NotYetCached)?;

    Ok(success(json!({
        "hemisphere": hemisphere,
        "readings": status.monthly,
        "fetched_at": status.fetched_at,
    })))
}

/// Full historical daily series for one hemisphere.
async fn api_historical<S: ExtentSource>(
    State(state): State<Arc<AppState<S>>>,
    Path(hemisphere): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let hemisphere: Hemisphere = hemisphere.parse()?;
    let status = state
        .coordinator
        .cache()
        .get(hemisphere)
        .ok_or(Error::NotYetCached)?;

    Ok(success(json!({
        "hemisphere": hemisphere,
        "readings": status.historical,
        "fetched_at": status.fetched_at,
    })))
}

/// Liveness probe. Always 200 while the process is up.
async fn api_health<S: ExtentSource>(State(state): State<Arc<AppState<S>>>) -> Json<Value> {
    let last_refresh = state.coordinator.cache().last_refresh().await;
    Json(json!({
        "status": "healthy",
        "service": "Polar Ice Sheet Monitor",
        "version": env!("CARGO_PKG_VERSION"),
        "last_refresh": last_refresh,
        "timestamp": now_iso(),
    }))
}

/// Force a full refresh and return the updated snapshot.
///
/// Coalesces with any refresh already in flight; bounded by the configured
/// request deadline so a wedged upstream cannot hold the connection open.
async fn api_refresh<S: ExtentSource>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Value>, ApiError> {
    let deadline = state.config.timing.refresh_request_timeout_secs;

    let outcome = tokio::time::timeout(
        Duration::from_secs(deadline),
        state.coordinator.refresh_all(),
    )
    .await
    .map_err(|_| {
        warn!("Forced refresh exceeded its {}s deadline", deadline);
        Error::RefreshTimeout(deadline)
    })?;

    match outcome {
        RefreshOutcome::Completed { succeeded, failed } => {
            info!("Forced refresh completed: {} ok, {} failed", succeeded, failed);
        }
        RefreshOutcome::Coalesced => {
            info!("Forced refresh coalesced with an in-flight cycle");
        }
    }

    let snapshot = state.coordinator.cache().snapshot().await;
    if snapshot.is_empty() {
        return Err(Error::NotYetCached.into());
    }
    Ok(success(json!(snapshot)))
}
