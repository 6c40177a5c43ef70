//! Request handlers for the dashboard API.
//!
//! Endpoints:
//!
//! - `POST /api/chat`             : Send the full turn list, get one reply
//! - `POST /api/context/preview`  : Show the context block the model would read
//! - `GET  /health`               : Liveness plus provider and model in use

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use edupilot_assistant::{ChatPipeline, ChatRequest, ContextSnapshot, resolve_context};
use edupilot_core::error::{ChatError, ErrorKind};
use edupilot_core::message::ConversationTurn;
use edupilot_store::StoreClient;

/// Shared state for all handlers. Built once at startup.
pub struct AppState {
    pub pipeline: Arc<ChatPipeline>,
    /// `None` when no profile store is configured.
    pub store: Option<Arc<StoreClient>>,
    pub provider: String,
    pub model: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(pipeline: Arc<ChatPipeline>, store: Option<Arc<StoreClient>>) -> Self {
        let provider = pipeline.gateway().provider_name().to_string();
        let model = pipeline.gateway().model().to_string();
        Self {
            pipeline,
            store,
            provider,
            model,
            start_time: chrono::Utc::now(),
        }
    }
}

pub type SharedState = Arc<AppState>;

pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/context/preview", post(context_preview_handler))
        .with_state(state)
}

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    #[serde(default)]
    pub messages: Option<Vec<ConversationTurn>>,
    #[serde(default)]
    pub context_data: Option<serde_json::Value>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextPreviewBody {
    #[serde(default)]
    pub context_data: Option<serde_json::Value>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ContextPreviewResponse {
    /// The exact block prepended to the pending turn; empty without context.
    pub context: String,
    pub snapshot: Option<ContextSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub provider: String,
    pub model: String,
    pub uptime_secs: i64,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

/// Unparseable bodies are client errors; only the size limit keeps its own
/// status.
fn rejection_error(rejection: JsonRejection) -> ApiError {
    let status = match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    api_error(status, rejection.body_text())
}

fn status_for(err: &ChatError) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime = chrono::Utc::now() - state.start_time;
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        provider: state.provider.clone(),
        model: state.model.clone(),
        uptime_secs: uptime.num_seconds(),
    })
}

async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected malformed chat body");
        rejection_error(rejection)
    })?;

    let messages = body.messages.unwrap_or_default();
    if messages.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            ChatError::NoMessages.to_string(),
        ));
    }

    let request_id = uuid::Uuid::new_v4();
    info!(
        %request_id,
        turns = messages.len(),
        has_context = body.context_data.is_some(),
        has_user = body.user_id.is_some(),
        "Chat request"
    );

    let context = resolve_context(
        state.store.as_deref(),
        body.context_data,
        body.user_id.as_deref(),
    )
    .await;
    let request = ChatRequest { messages, context };

    match state.pipeline.run(request).await.into_result() {
        Ok(message) => Ok(Json(ChatReply { message })),
        Err(e) => {
            tracing::error!(%request_id, error = %e, "Chat request failed");
            Err(api_error(status_for(&e), e.to_string()))
        }
    }
}

async fn context_preview_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ContextPreviewBody>, JsonRejection>,
) -> Result<Json<ContextPreviewResponse>, ApiError> {
    let Json(body) = payload.map_err(rejection_error)?;

    let snapshot = resolve_context(
        state.store.as_deref(),
        body.context_data,
        body.user_id.as_deref(),
    )
    .await
    .map(|input| input.snapshot());
    let context = snapshot
        .as_ref()
        .map(ContextSnapshot::render)
        .unwrap_or_default();

    Ok(Json(ContextPreviewResponse { context, snapshot }))
}
