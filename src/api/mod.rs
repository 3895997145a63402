//! HTTP API over the store and pipeline.

mod handlers;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::ingestion::MockGenerator;
use crate::pipeline::TriagePipeline;
use crate::store::MailStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MailStore>,
    pub pipeline: Arc<TriagePipeline>,
    /// Seeded generator behind `POST /api/generate-mock-data`.
    pub generator: Arc<Mutex<MockGenerator>>,
}

impl AppState {
    pub fn new(store: Arc<MailStore>, pipeline: Arc<TriagePipeline>, generator: MockGenerator) -> Self {
        Self {
            store,
            pipeline,
            generator: Arc::new(Mutex::new(generator)),
        }
    }
}

/// Build the router with every route and a permissive CORS layer.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/stats", get(handlers::stats))
        .route("/api/generate-mock-data", post(handlers::generate_mock_data))
        .route("/api/process-inbox", post(handlers::process_inbox))
        .route("/api/emails", get(handlers::list_emails))
        .route("/api/emails/categorized", get(handlers::categorized_emails))
        .route("/api/email/{id}", get(handlers::email_detail))
        .route("/api/threads", get(handlers::list_threads))
        .route("/api/thread/{id}", get(handlers::thread_detail))
        .route("/api/metrics", get(handlers::metrics))
        .route("/api/reset", post(handlers::reset))
        .route("/api/remote/status", get(handlers::remote_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler failure, rendered as `{"detail": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}
