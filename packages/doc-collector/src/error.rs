//! Typed errors for the collection pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can match on
//! the quota signal instead of parsing messages.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the generative extraction service.
#[derive(Debug, Error)]
pub enum AiError {
    /// No credentials or endpoint; callers fail fast with an empty result.
    #[error("AI service not configured: {0}")]
    NotConfigured(String),

    /// Rate limit / quota exhausted (HTTP 429). Never retried.
    #[error("AI quota exhausted")]
    QuotaExhausted,

    /// Network error or non-success status
    #[error("AI request failed: {0}")]
    Transient(String),

    /// Response body could not be understood
    #[error("malformed AI response: {0}")]
    Malformed(String),
}

impl AiError {
    /// Whether the backoff loop should try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AiError::Transient(_) | AiError::Malformed(_))
    }
}

/// Errors that can occur while fetching a page or static resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Server answered with a non-success status
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    /// Request timed out
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Body could not be parsed into the expected shape
    #[error("parse error: {0}")]
    Parse(String),
}

/// Errors from the on-disk record, index, and registry storage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Organization or document key cannot be used as a path component
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        StoreError::Json {
            path: path.into(),
            source,
        }
    }
}

/// Errors a collector can report for one source.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The extraction service is rate limited; stop AI work for this run.
    #[error("AI quota exhausted")]
    QuotaExhausted,

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("extraction failed: {0}")]
    Extraction(AiError),
}

impl From<AiError> for CollectError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::QuotaExhausted => CollectError::QuotaExhausted,
            other => CollectError::Extraction(other),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
}

/// Result type alias for AI operations.
pub type AiResult<T> = std::result::Result<T, AiError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for collector operations.
pub type CollectResult<T> = std::result::Result<T, CollectError>;
