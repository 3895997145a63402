use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ApiError, AppState};
use crate::compression::CompressionStats;
use crate::model::{Category, Message, PriorityLevel};
use crate::store::views::{DEFAULT_MESSAGE_LIMIT, DEFAULT_THREAD_LIMIT};
use crate::store::MessageFilter;

/// Emails generated when `count` is omitted.
const DEFAULT_MOCK_COUNT: usize = 100;
/// Threads added by every mock-data request.
const MOCK_THREADS: usize = 5;
const MOCK_THREAD_LENGTH: usize = 50;

// ── Health ──────────────────────────────────────────────────────────

pub(super) async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mailsift"
    }))
}

pub(super) async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.stats().await)
}

pub(super) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.metrics().await)
}

pub(super) async fn remote_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.pipeline.compressor().refresh_health().await)
}

// ── Data lifecycle ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(super) struct MockQuery {
    count: Option<usize>,
}

pub(super) async fn generate_mock_data(
    State(state): State<AppState>,
    Query(query): Query<MockQuery>,
) -> impl IntoResponse {
    let count = query.count.unwrap_or(DEFAULT_MOCK_COUNT);

    let (emails, threads) = {
        let mut generator = state.generator.lock().await;
        let emails = generator.generate_batch(count);
        let threads: Vec<_> = (0..MOCK_THREADS)
            .map(|_| generator.generate_thread(MOCK_THREAD_LENGTH, Category::Work))
            .collect();
        (emails, threads)
    };
    let threads_generated = threads.len();

    state.store.add_messages(emails).await;
    state.store.add_threads(threads).await;
    let totals = state.store.stats().await;
    info!(count, threads = threads_generated, "Mock data generated");

    Json(serde_json::json!({
        "status": "success",
        "emails_generated": count,
        "threads_generated": threads_generated,
        "total_emails": totals.total_emails,
        "total_threads": totals.total_threads,
    }))
}

pub(super) async fn process_inbox(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.pipeline.process_inbox(&state.store).await;
    Json(serde_json::json!({
        "status": "success",
        "emails_processed": report.emails_processed,
        "threads_compressed": report.threads_compressed,
    }))
}

pub(super) async fn reset(State(state): State<AppState>) -> impl IntoResponse {
    state.store.reset().await;
    Json(serde_json::json!({
        "status": "success",
        "message": "Store cleared"
    }))
}

// ── Emails ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(super) struct EmailQuery {
    category: Option<String>,
    priority: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl EmailQuery {
    fn into_filter(self) -> Result<MessageFilter, ApiError> {
        let category = self
            .category
            .map(|c| {
                c.parse::<Category>()
                    .map_err(|_| ApiError::BadRequest(format!("Invalid category: {c}")))
            })
            .transpose()?;
        let priority = self
            .priority
            .map(|p| {
                p.parse::<PriorityLevel>()
                    .map_err(|_| ApiError::BadRequest(format!("Invalid priority: {p}")))
            })
            .transpose()?;
        Ok(MessageFilter {
            category,
            priority,
            limit: self.limit.unwrap_or(DEFAULT_MESSAGE_LIMIT),
            offset: self.offset.unwrap_or(0),
        })
    }
}

pub(super) async fn list_emails(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query.into_filter()?;
    Ok(Json(state.store.list_messages(&filter).await))
}

pub(super) async fn categorized_emails(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.categorized().await)
}

/// A message with its thread's digest, when it belongs to a stored thread.
#[derive(Debug, Serialize)]
struct EmailDetail {
    email: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread: Option<ThreadDigestView>,
}

#[derive(Debug, Serialize)]
struct ThreadDigestView {
    thread_id: String,
    message_count: usize,
    compressed_summary: Option<String>,
    key_decisions: Vec<String>,
    unresolved_questions: Vec<String>,
    action_items: BTreeMap<String, Vec<String>>,
    compression_stats: Option<CompressionStats>,
}

pub(super) async fn email_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let email = state
        .store
        .get_message(&id)
        .await
        .ok_or(ApiError::NotFound("Email not found"))?;

    let thread = state
        .store
        .get_thread(&email.thread_id)
        .await
        .map(|thread| ThreadDigestView {
            compression_stats: thread.is_compressed().then(|| CompressionStats::from(&thread)),
            message_count: thread.message_count(),
            thread_id: thread.thread_id,
            compressed_summary: thread.compressed_summary,
            key_decisions: thread.key_decisions,
            unresolved_questions: thread.unresolved_questions,
            action_items: thread.action_items_by_person,
        });

    Ok(Json(EmailDetail { email, thread }))
}

// ── Threads ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(super) struct ThreadQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

pub(super) async fn list_threads(
    State(state): State<AppState>,
    Query(query): Query<ThreadQuery>,
) -> impl IntoResponse {
    let page = state
        .store
        .list_threads(
            query.limit.unwrap_or(DEFAULT_THREAD_LIMIT),
            query.offset.unwrap_or(0),
        )
        .await;
    Json(page)
}

pub(super) async fn thread_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let thread = state
        .store
        .get_thread(&id)
        .await
        .ok_or(ApiError::NotFound("Thread not found"))?;
    Ok(Json(thread))
}
