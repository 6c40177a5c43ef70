//! Error types for the EduPilot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type.

use thiserror::Error;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures of a single chat request.
///
/// Validation variants are raised before any upstream call is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("No messages provided")]
    NoMessages,

    #[error("Conversation history is empty")]
    EmptyHistory,

    #[error("Invalid conversation history: {0}")]
    InvalidHistory(String),

    /// The completion service was unreachable, rejected the call, or
    /// returned something unusable. Carries the underlying message.
    #[error("{message}")]
    Upstream { message: String },
}

/// Coarse classification used by the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected input, HTTP 400.
    Validation,
    /// Completion service failure, HTTP 500.
    Upstream,
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::NoMessages | ChatError::EmptyHistory | ChatError::InvalidHistory(_) => {
                ErrorKind::Validation
            }
            ChatError::Upstream { .. } => ErrorKind::Upstream,
        }
    }
}

impl From<ProviderError> for ChatError {
    fn from(err: ProviderError) -> Self {
        ChatError::Upstream {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Store not configured: {0}")]
    NotConfigured(String),
}
