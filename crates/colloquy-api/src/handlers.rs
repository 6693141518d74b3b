//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path/query parameters via axum extractors,
//! interacts with AppState services, and returns JSON responses.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use colloquy_core::types::{ExchangeResult, Message, Thread};

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 100;
const MAX_TITLE_CHARS: usize = 200;

// =============================================================================
// Request / query parameter types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateThreadRequest {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateThreadRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: u64,
}

impl ThreadSummary {
    fn from_thread(thread: Thread, message_count: u64) -> Self {
        Self {
            id: thread.id,
            title: thread.title,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
            message_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadListResponse {
    pub threads: Vec<ThreadSummary>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<serde_json::Value>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            role: message.role.as_str().to_string(),
            content: message.content,
            created_at: message.created_at,
            model: message.model,
            usage: message.usage,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageListResponse {
    pub thread_id: String,
    pub messages: Vec<MessageResponse>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub thread_id: String,
    pub messages: Vec<MessageResponse>,
}

// =============================================================================
// Helpers
// =============================================================================

fn clamp_page(params: &PageParams) -> (u64, u64) {
    let skip = params.skip.unwrap_or(0);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (skip, limit)
}

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::UnprocessableEntity(
            "Title must not be empty".to_string(),
        ));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ApiError::UnprocessableEntity(format!(
            "Title exceeds maximum length of {} characters",
            MAX_TITLE_CHARS
        )));
    }
    Ok(())
}

/// 404 unless the thread exists.
fn require_thread(state: &AppState, thread_id: &str) -> Result<Thread, ApiError> {
    state
        .threads
        .find_by_id(thread_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Thread not found: {}", thread_id)))
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /health - liveness check, independent of the pipeline.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// POST /threads - create a thread with a server-generated id.
///
/// The new thread starts with the assistant greeting as its first message.
pub async fn create_thread(
    State(state): State<AppState>,
    body: Option<Json<CreateThreadRequest>>,
) -> Result<Json<AckResponse>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    if let Some(ref title) = request.title {
        validate_title(title)?;
    }

    let thread = state.orchestrator.create_thread(request.title)?;
    Ok(Json(AckResponse {
        ok: true,
        message: "Thread created".to_string(),
        thread_id: Some(thread.id),
    }))
}

/// GET /threads - list threads, most recently active first.
pub async fn list_threads(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<ThreadListResponse>, ApiError> {
    let (skip, limit) = clamp_page(&params);
    let total = state.threads.count()?;
    let threads = state
        .threads
        .list(skip, limit)?
        .into_iter()
        .map(|(thread, count)| ThreadSummary::from_thread(thread, count))
        .collect();

    Ok(Json(ThreadListResponse {
        threads,
        total,
        skip,
        limit,
    }))
}

/// GET /threads/{id} - fetch a single thread.
pub async fn get_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<ThreadSummary>, ApiError> {
    let thread = require_thread(&state, &thread_id)?;
    let count = state.messages.count_for_thread(&thread_id)?;
    Ok(Json(ThreadSummary::from_thread(thread, count)))
}

/// PUT /threads/{id} - rename a thread.
pub async fn update_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(request): Json<UpdateThreadRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    validate_title(&request.title)?;

    let updated = state
        .threads
        .update_title(&thread_id, &request.title, Utc::now())?;
    if !updated {
        return Err(ApiError::NotFound(format!(
            "Thread not found: {}",
            thread_id
        )));
    }

    Ok(Json(AckResponse {
        ok: true,
        message: "Thread updated".to_string(),
        thread_id: None,
    }))
}

/// DELETE /threads/{id} - delete a thread and all its messages.
pub async fn delete_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<AckResponse>, ApiError> {
    let deleted = state.threads.delete(&thread_id)?;
    if !deleted {
        return Err(ApiError::NotFound(format!(
            "Thread not found: {}",
            thread_id
        )));
    }

    tracing::info!(thread_id = %thread_id, "Thread deleted");
    Ok(Json(AckResponse {
        ok: true,
        message: "Thread deleted".to_string(),
        thread_id: None,
    }))
}

/// POST /threads/{id}/messages - run one conversation exchange.
///
/// The thread is created on first use; the response carries both persisted
/// message ids plus the assistant reply.
pub async fn send_message(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ExchangeResult>, ApiError> {
    let result = state
        .orchestrator
        .send_message(&thread_id, &request.content)
        .await?;
    Ok(Json(result))
}

/// GET /threads/{id}/messages - ordered messages with pagination.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<MessageListResponse>, ApiError> {
    require_thread(&state, &thread_id)?;

    let (skip, limit) = clamp_page(&params);
    let total = state.messages.count_for_thread(&thread_id)?;
    let messages = state
        .messages
        .list_for_thread(&thread_id, skip, limit)?
        .into_iter()
        .map(MessageResponse::from)
        .collect();

    Ok(Json(MessageListResponse {
        thread_id,
        messages,
        total,
        skip,
        limit,
    }))
}

/// GET /threads/{id}/history - the most recent turns, oldest first.
pub async fn get_history(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    require_thread(&state, &thread_id)?;

    let limit = params
        .limit
        .unwrap_or(state.config.chat.context_window as u64)
        .clamp(1, MAX_PAGE_SIZE);
    let messages = state
        .messages
        .recent_window(&thread_id, limit)?
        .into_iter()
        .map(MessageResponse::from)
        .collect();

    Ok(Json(HistoryResponse {
        thread_id,
        messages,
    }))
}
