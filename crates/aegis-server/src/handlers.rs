//! Aegis Request Handlers
//!
//! HTTP request handlers for the metrics API: batch queries, application
//! deletion, record ingestion, and health checks. Engine calls are blocking
//! and run on the blocking thread pool.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::request::decode_batch;
use crate::state::AppState;
use aegis_timeseries::MetricsRecord;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Error Response
// =============================================================================

/// Generic error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl ToString, code: impl ToString) -> Self {
        Self {
            error: error.to_string(),
            code: code.to_string(),
        }
    }
}

fn error_response(status: StatusCode, error: impl ToString, code: &str) -> Response {
    (status, Json(ErrorResponse::new(error, code))).into_response()
}

/// 404 handler.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Not found", "NOT_FOUND")),
    )
}

// =============================================================================
// Batch Query
// =============================================================================

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

/// Run a batch of metrics requests.
///
/// The body is a JSON array of request URIs. The response holds one entry
/// per request in the same order.
pub async fn handle_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !is_json(&headers) {
        return error_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Unsupported Media Type: expected application/json",
            "UNSUPPORTED_MEDIA_TYPE",
        );
    }

    let queries = match decode_batch(&body, state.parser.as_ref()) {
        Ok(queries) => queries,
        Err(e) => {
            tracing::debug!("Rejected metrics batch: {}", e);
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid request: {}", e),
                "INVALID_REQUEST",
            );
        }
    };

    let processor = state.processor.clone();
    match tokio::task::spawn_blocking(move || processor.process(&queries)).await {
        Ok(Ok(entries)) => (StatusCode::OK, Json(entries)).into_response(),
        Ok(Err(e)) => {
            tracing::error!("Metrics batch aborted: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e, "BATCH_FAILED")
        }
        Err(e) => {
            tracing::error!("Metrics batch task failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error while processing metrics batch",
                "INTERNAL_ERROR",
            )
        }
    }
}

// =============================================================================
// Application Deletion
// =============================================================================

/// Delete all metrics of an application.
pub async fn delete_app_metrics(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Response {
    let processor = state.processor.clone();
    let target = app_id.clone();

    match tokio::task::spawn_blocking(move || processor.delete_application(&target)).await {
        Ok(Ok(())) => (StatusCode::OK, "OK").into_response(),
        Ok(Err(e)) if e.is_user_error() => {
            error_response(StatusCode::BAD_REQUEST, e, "INVALID_REQUEST")
        }
        Ok(Err(e)) => {
            tracing::error!("Deleting metrics of {} failed: {}", app_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error while deleting application",
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Deletion task for {} failed: {}", app_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error while deleting application",
            )
                .into_response()
        }
    }
}

// =============================================================================
// Record Ingestion
// =============================================================================

/// Ingestion response.
#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub success: bool,
    pub records_written: usize,
}

/// Write metrics records into every table.
pub async fn write_records(
    State(state): State<AppState>,
    Json(records): Json<Vec<MetricsRecord>>,
) -> Response {
    let processor = state.processor.clone();
    let count = records.len();

    match tokio::task::spawn_blocking(move || processor.record(&records)).await {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(WriteResponse {
                success: true,
                records_written: count,
            }),
        )
            .into_response(),
        Ok(Err(e)) => {
            tracing::error!("Writing {} metrics records failed: {}", count, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e, "WRITE_FAILED")
        }
        Err(e) => {
            tracing::error!("Write task failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error while writing metrics",
                "INTERNAL_ERROR",
            )
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
