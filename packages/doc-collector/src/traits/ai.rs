//! Generative text model trait.
//!
//! A `TextModel` performs exactly one request and reports what happened as a
//! typed [`AiError`](crate::error::AiError). Retry, backoff and response
//! parsing live in [`ExtractionClient`](crate::ai::ExtractionClient).

use async_trait::async_trait;

use crate::error::AiResult;

/// A single prompt sent to the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRequest {
    /// System instruction
    pub system: String,

    /// User prompt (instructions + page content)
    pub prompt: String,

    /// Let the model ground its answer with web search.
    pub web_search: bool,
}

impl ModelRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            web_search: false,
        }
    }

    pub fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }
}

/// A generative model that answers a prompt with raw text.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Model identifier, for logging.
    fn name(&self) -> &str;

    /// Send one request. Must map HTTP 429 to `AiError::QuotaExhausted`.
    async fn generate(&self, request: &ModelRequest) -> AiResult<String>;
}
