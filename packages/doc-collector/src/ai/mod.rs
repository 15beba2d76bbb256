//! Generative extraction: the Gemini model, prompts, backoff and the
//! retrying [`ExtractionClient`].

pub mod backoff;
pub mod extractor;
pub mod gemini;
pub mod prompts;

use std::sync::Arc;

use tracing::{info, warn};

pub use backoff::{BackoffPolicy, Sleeper, TokioSleeper};
pub use extractor::{parse_json_reply, truncate_chars, ExtractionClient};
pub use gemini::{DisabledModel, GeminiModel};

use crate::config::CollectorConfig;
use crate::traits::ai::TextModel;

/// Build the model from configuration; missing credentials yield a
/// [`DisabledModel`] so AI-assisted sources fail fast with empty results.
pub fn model_from_config(config: &CollectorConfig) -> Arc<dyn TextModel> {
    let Some(credentials) = config.credentials.clone() else {
        warn!("GEMINI_API_KEY not set, AI-assisted collection disabled");
        return Arc::new(DisabledModel::new("GEMINI_API_KEY is not set"));
    };

    match GeminiModel::new(credentials, config.ai_timeout) {
        Ok(model) => {
            info!(model = %model.name(), "AI extraction enabled");
            Arc::new(model)
        }
        Err(e) => {
            warn!(error = %e, "AI model unavailable, AI-assisted collection disabled");
            Arc::new(DisabledModel::new(e.to_string()))
        }
    }
}

/// Build the extraction client with the configured limits and backoff.
pub fn client_from_config(config: &CollectorConfig) -> ExtractionClient {
    ExtractionClient::new(model_from_config(config))
        .with_policy(config.backoff.clone())
        .with_snippet_chars(config.snippet_chars)
        .with_max_documents(config.max_documents)
}
