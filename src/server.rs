//! HTTP API.
//!
//! `GET /` usage, `POST /search` to run a search, `GET /health` for probes.

use crate::models::{AnalysisResult, SearchRequest};
use crate::orchestrator::DispatchStats;
use crate::service::FareSearchService;
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

const USAGE: &str = "FareScout API

POST /search   {\"origin\": \"NYC\", \"destination\": \"TYO\", \"outbound_date\": \"2026-07-15\", \"return_date\": \"2026-07-25\"}
GET  /health   liveness probe
";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    service: Arc<FareSearchService>,
}

/// Raw search body; validated into a [`SearchRequest`] by the handler.
#[derive(Debug, Default, Deserialize)]
pub struct SearchBody {
    /// Origin airport or city code.
    #[serde(default)]
    pub origin: Option<String>,
    /// Destination airport or city code.
    #[serde(default)]
    pub destination: Option<String>,
    /// Outbound date, `YYYY-MM-DD`.
    #[serde(default)]
    pub outbound_date: Option<String>,
    /// Return date, `YYYY-MM-DD`; absent or blank for one-way.
    #[serde(default)]
    pub return_date: Option<String>,
}

/// Successful search response.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// Always `true`; failures use [`ApiError`].
    pub success: bool,
    /// The validated request.
    pub search: SearchRequest,
    /// Cash-vs-miles analysis.
    pub results: AnalysisResult,
    /// Per-provider dispatch statistics.
    pub providers: DispatchStats,
}

/// Errors surfaced to API clients as `{"error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    /// The request was malformed (400).
    BadRequest(String),
    /// The search itself failed unexpectedly (500).
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Builds the router.
pub fn router(service: Arc<FareSearchService>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/search", post(search))
        .route("/health", get(health))
        .with_state(AppState { service })
}

/// Binds `addr` and serves until the process exits.
pub async fn serve(service: Arc<FareSearchService>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🌐 FareScout API listening on http://{}", addr);

    axum::serve(listener, router(service))
        .await
        .context("HTTP server terminated unexpectedly")
}

pub async fn index() -> &'static str {
    USAGE
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn search(
    State(state): State<AppState>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        warn!("Rejected search body: {}", rejection.body_text());
        ApiError::BadRequest(rejection.body_text())
    })?;

    let request = SearchRequest::new(
        body.origin.as_deref().unwrap_or(""),
        body.destination.as_deref().unwrap_or(""),
        body.outbound_date.as_deref().unwrap_or(""),
        body.return_date.as_deref(),
    )
    .map_err(|e| {
        warn!("Invalid search request: {}", e);
        ApiError::BadRequest(e.to_string())
    })?;

    let service = Arc::clone(&state.service);
    let task_request = request.clone();
    let outcome = tokio::spawn(async move { service.search(&task_request).await })
        .await
        .map_err(|e| {
            error!("Search task failed: {}", e);
            ApiError::Internal(format!("search failed: {}", e))
        })?;

    Ok(Json(SearchResponse {
        success: true,
        search: request,
        results: outcome.analysis,
        providers: outcome.providers,
    }))
}
