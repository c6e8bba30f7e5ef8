//! Error types for triagent.

use std::time::Duration;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    #[error("Order store error: {0}")]
    OrderStore(#[from] OrderStoreError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors loading the static data tables (orders, rules, templates, policies).
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Data file not found: {path}")]
    Missing { path: String },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Engine-level errors surfaced at the boundary.
///
/// Input and protocol errors are rejected before any state mutation;
/// collaborator errors fail the turn with the stored snapshot untouched.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("ticket text must not be empty")]
    EmptyTicket,

    #[error("unknown thread: {thread_id}")]
    UnknownThread { thread_id: String },

    #[error("thread {thread_id} has no pending admin review")]
    NoPendingReview { thread_id: String },

    #[error("invalid review decision: {reason}")]
    InvalidReview { reason: String },

    #[error("turn exceeded the step budget ({limit} steps)")]
    StepBudgetExceeded { limit: u32 },

    #[error("order store failed: {0}")]
    OrderStore(#[from] OrderStoreError),

    #[error("state store failed: {0}")]
    Store(#[from] StoreError),
}

/// State-store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Snapshot serialization error: {0}")]
    Serialization(String),
}

/// Order-store collaborator errors.
///
/// A missing order is not an error (lookups return `Option`); these cover
/// the store itself being unreachable or misbehaving.
#[derive(Debug, thiserror::Error)]
pub enum OrderStoreError {
    #[error("Order store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Text-generation collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Invalid response from provider {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Missing credentials for provider {provider}")]
    MissingCredentials { provider: String },

    #[error("Text generation is disabled")]
    Disabled,
}

impl LlmError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. } | LlmError::RequestFailed { .. }
        )
    }
}

/// Policy-retrieval collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Policy index unavailable: {reason}")]
    Unavailable { reason: String },
}
