//! AI-assisted document extraction with retry and quota handling.
//!
//! # Retry Strategy
//!
//! - Network error, non-success status, malformed body → retry with
//!   exponential backoff (1s, 2s, 4s, 8s by default, 5 attempts total)
//! - HTTP 429 → `AiError::QuotaExhausted`, returned immediately
//! - No credentials → empty result without calling out

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::ai::backoff::{BackoffPolicy, Sleeper, TokioSleeper};
use crate::ai::prompts;
use crate::error::{AiError, AiResult};
use crate::traits::ai::{ModelRequest, TextModel};
use crate::types::DocumentDescriptor;

/// Default cap on the page prefix sent to the model.
pub const DEFAULT_SNIPPET_CHARS: usize = 4000;

/// Default bound on descriptors accepted from one extraction.
pub const DEFAULT_MAX_DOCUMENTS: usize = 20;

#[derive(Deserialize)]
#[serde(untagged)]
enum DescriptorReply {
    List(Vec<Value>),
    Wrapped { documents: Vec<Value> },
}

/// Wraps a [`TextModel`] with backoff, JSON parsing and descriptor validation.
#[derive(Clone)]
pub struct ExtractionClient {
    model: Arc<dyn TextModel>,
    sleeper: Arc<dyn Sleeper>,
    policy: BackoffPolicy,
    snippet_chars: usize,
    max_documents: usize,
}

impl ExtractionClient {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self {
            model,
            sleeper: Arc::new(TokioSleeper),
            policy: BackoffPolicy::default(),
            snippet_chars: DEFAULT_SNIPPET_CHARS,
            max_documents: DEFAULT_MAX_DOCUMENTS,
        }
    }

    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_snippet_chars(mut self, chars: usize) -> Self {
        self.snippet_chars = chars;
        self
    }

    pub fn with_max_documents(mut self, max: usize) -> Self {
        self.max_documents = max;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Extract candidate documents from a page snippet.
    ///
    /// Returns an empty list when the service is not configured, and
    /// `AiError::QuotaExhausted` when it is rate limited. Any `id` in the
    /// reply is dropped: record keys for extracted documents always derive
    /// from organization and url.
    pub async fn extract(&self, url: &str, page_snippet: &str) -> AiResult<Vec<DocumentDescriptor>> {
        let snippet = truncate_chars(page_snippet, self.snippet_chars);
        let request = prompts::extraction_request(url, snippet, self.max_documents);

        let reply = match self.generate_json::<DescriptorReply>(&request).await {
            Ok(reply) => reply,
            Err(AiError::NotConfigured(reason)) => {
                warn!(url, reason = %reason, "AI extraction not configured, skipping");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let raw = match reply {
            DescriptorReply::List(items) => items,
            DescriptorReply::Wrapped { documents } => documents,
        };
        let total = raw.len();

        let descriptors: Vec<DocumentDescriptor> = raw
            .into_iter()
            .filter_map(|item| serde_json::from_value::<DocumentDescriptor>(item).ok())
            .filter(DocumentDescriptor::is_usable)
            .take(self.max_documents)
            .map(|mut desc| {
                desc.id = None;
                desc
            })
            .collect();

        debug!(url, total, kept = descriptors.len(), "AI extraction parsed");
        Ok(descriptors)
    }

    /// Send `request` and parse the reply as JSON, retrying transient failures.
    pub async fn generate_json<T: DeserializeOwned>(&self, request: &ModelRequest) -> AiResult<T> {
        let mut last_err = None;

        for attempt in 0..self.policy.max_attempts {
            let result = match self.model.generate(request).await {
                Ok(raw) => parse_json_reply::<T>(&raw),
                Err(e) => Err(e),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    let remaining = self.policy.max_attempts - attempt - 1;
                    if remaining > 0 {
                        let delay = self.policy.delay_for(attempt);
                        warn!(
                            model = %self.model.name(),
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "AI call failed, retrying after backoff"
                        );
                        self.sleeper.sleep(delay).await;
                    } else {
                        warn!(
                            model = %self.model.name(),
                            attempts = self.policy.max_attempts,
                            error = %e,
                            "AI call failed, giving up"
                        );
                    }
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| AiError::Transient("no attempts made".into())))
    }
}

/// Parse model output as JSON, tolerating markdown code fences.
pub fn parse_json_reply<T: DeserializeOwned>(raw: &str) -> AiResult<T> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body).map_err(|e| AiError::Malformed(e.to_string()))
}

/// Longest prefix of `s` holding at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockModel, RecordingSleeper};
    use std::time::Duration;

    fn client(model: MockModel, sleeper: Arc<RecordingSleeper>) -> ExtractionClient {
        ExtractionClient::new(Arc::new(model)).with_sleeper(sleeper)
    }

    #[tokio::test]
    async fn test_extract_parses_descriptors() {
        let model = MockModel::new().with_reply(
            r#"[{"title":"WEO","date":"2024-10-22","url":"https://x/weo","category":"Outlook"},
                {"title":"","url":"https://x/blank"},
                {"title":"No url"}]"#,
        );
        let sleeper = Arc::new(RecordingSleeper::new());
        let docs = client(model, sleeper.clone())
            .extract("https://x", "<html/>")
            .await
            .unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "WEO");
        assert_eq!(docs[0].category.as_deref(), Some("Outlook"));
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_model_supplied_ids_are_dropped() {
        let model = MockModel::new().with_reply(
            r#"[{"id":"1","title":"A","url":"https://x/a"},
                {"id":"status","title":"B","url":"https://x/b"}]"#,
        );
        let docs = client(model, Arc::new(RecordingSleeper::new()))
            .extract("https://x", "")
            .await
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d.id.is_none()));
    }

    #[tokio::test]
    async fn test_fenced_and_wrapped_replies() {
        let model = MockModel::new()
            .with_reply("```json\n{\"documents\":[{\"title\":\"A\",\"url\":\"https://x/a\"}]}\n```");
        let docs = client(model, Arc::new(RecordingSleeper::new()))
            .extract("https://x", "")
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_back_off_then_succeed() {
        let model = MockModel::new()
            .with_transient("503")
            .with_reply("not json at all")
            .with_reply(r#"[{"title":"A","url":"https://x/a"}]"#);
        let sleeper = Arc::new(RecordingSleeper::new());
        let model_handle = model.clone();

        let docs = client(model, sleeper.clone())
            .extract("https://x", "")
            .await
            .unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(model_handle.call_count(), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let model = MockModel::new().with_default_transient("connection reset");
        let sleeper = Arc::new(RecordingSleeper::new());
        let model_handle = model.clone();

        let err = client(model, sleeper.clone())
            .extract("https://x", "")
            .await
            .unwrap_err();

        assert!(matches!(err, AiError::Transient(_)));
        assert_eq!(model_handle.call_count(), 5);
        assert_eq!(
            sleeper.delays(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[tokio::test]
    async fn test_quota_is_not_retried() {
        let model = MockModel::new().with_rate_limit();
        let sleeper = Arc::new(RecordingSleeper::new());
        let model_handle = model.clone();

        let err = client(model, sleeper.clone())
            .extract("https://x", "")
            .await
            .unwrap_err();

        assert!(matches!(err, AiError::QuotaExhausted));
        assert_eq!(model_handle.call_count(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_not_configured_returns_empty() {
        let model = MockModel::new().with_not_configured();
        let model_handle = model.clone();
        let docs = client(model, Arc::new(RecordingSleeper::new()))
            .extract("https://x", "")
            .await
            .unwrap();
        assert!(docs.is_empty());
        assert_eq!(model_handle.call_count(), 1);
    }

    #[tokio::test]
    async fn test_snippet_and_result_are_bounded() {
        let items: Vec<String> = (0..30)
            .map(|i| format!(r#"{{"title":"Doc {i}","url":"https://x/{i}"}}"#))
            .collect();
        let model = MockModel::new().with_reply(format!("[{}]", items.join(",")));
        let model_handle = model.clone();

        let docs = client(model, Arc::new(RecordingSleeper::new()))
            .with_snippet_chars(10)
            .with_max_documents(5)
            .extract("https://x", &"x".repeat(100))
            .await
            .unwrap();

        assert_eq!(docs.len(), 5);
        let prompt = &model_handle.requests()[0].prompt;
        assert!(prompt.ends_with(&"x".repeat(10)));
        assert!(!prompt.contains(&"x".repeat(11)));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("令和7年度予算", 3), "令和7");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
