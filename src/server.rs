//! HTTP API for the analysis service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`/`POST` | `/analyze/{doc_id}` | Analyze a document (or return its stored analysis) |
//! | `GET`  | `/analysis/{doc_id}` | Stored analysis only; `404` if never analyzed |
//! | `GET`  | `/wordcloud/{ref}` | Word-cloud image (`image/png`) |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "document not found: essay.txt" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `empty_content` (422),
//! `timeout` (504), `unavailable` (502 when the content source failed, 503
//! when the store did).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the API can be called
//! directly from browser front-ends.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use docsift_core::error::{AnalyzeError, ErrorKind, StoreError};
use docsift_core::models::AnalysisResult;

use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::stores::create_store;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    analyzer: Arc<Analyzer>,
}

/// Starts the HTTP server on `[server].bind` and runs until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = create_store(config).await?;
    let analyzer = Arc::new(Analyzer::from_config(config, store)?);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        bind = %config.server.bind,
        source = ?config.source.kind,
        wordcloud = %config.wordcloud.provider,
        "docsift listening"
    );

    axum::serve(listener, build_router(analyzer)).await?;
    Ok(())
}

/// The full route table around an existing analyzer.
pub fn build_router(analyzer: Arc<Analyzer>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/analyze/{doc_id}",
            get(handle_analyze).post(handle_analyze),
        )
        .route("/analysis/{doc_id}", get(handle_stored))
        .route("/wordcloud/{blob_ref}", get(handle_wordcloud))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { analyzer })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AnalyzeError> for AppError {
    fn from(err: AnalyzeError) -> Self {
        let message = err.to_string();
        match (&err, err.kind()) {
            (AnalyzeError::EmptyContent { .. }, _) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "empty_content", message)
            }
            (_, ErrorKind::BadInput) => Self::new(StatusCode::BAD_REQUEST, "bad_request", message),
            (_, ErrorKind::NotFound) => Self::new(StatusCode::NOT_FOUND, "not_found", message),
            (_, ErrorKind::Timeout) => Self::new(StatusCode::GATEWAY_TIMEOUT, "timeout", message),
            (AnalyzeError::ContentFetch { .. }, ErrorKind::Unavailable) => {
                Self::new(StatusCode::BAD_GATEWAY, "unavailable", message)
            }
            (_, ErrorKind::Unavailable) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "unavailable", message)
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, "not_found", err.to_string())
            }
            other => Self::new(StatusCode::SERVICE_UNAVAILABLE, "unavailable", other.to_string()),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET|POST /analyze/{doc_id} ============

async fn handle_analyze(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<AnalysisResult>, AppError> {
    match state.analyzer.analyze(&doc_id).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            tracing::warn!(doc_id = %doc_id, error = %e, "analysis failed");
            Err(e.into())
        }
    }
}

// ============ GET /analysis/{doc_id} ============

async fn handle_stored(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<AnalysisResult>, AppError> {
    state
        .analyzer
        .stored(&doc_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            AppError::new(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("no analysis stored for document: {}", doc_id),
            )
        })
}

// ============ GET /wordcloud/{ref} ============

async fn handle_wordcloud(
    State(state): State<AppState>,
    Path(blob_ref): Path<String>,
) -> Result<Response, AppError> {
    let image = state.analyzer.store().get_blob(&blob_ref).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], image).into_response())
}
