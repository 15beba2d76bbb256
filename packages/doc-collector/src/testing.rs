//! Testing utilities including mock implementations.
//!
//! These let the pipeline run end to end without network access or a real
//! model. Replies are scripted per call, and every call is recorded for
//! assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::ai::Sleeper;
use crate::error::{AiError, AiResult, FetchError, FetchResult};
use crate::traits::ai::{ModelRequest, TextModel};
use crate::traits::fetcher::{FetchedPage, PageFetcher};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One scripted model outcome.
#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Transient(String),
    RateLimited,
    NotConfigured,
}

impl Scripted {
    fn into_result(self) -> AiResult<String> {
        match self {
            Scripted::Reply(body) => Ok(body),
            Scripted::Transient(msg) => Err(AiError::Transient(msg)),
            Scripted::RateLimited => Err(AiError::QuotaExhausted),
            Scripted::NotConfigured => Err(AiError::NotConfigured("mock".into())),
        }
    }
}

#[derive(Default)]
struct MockModelState {
    /// Consumed front to back, one per call
    script: VecDeque<Scripted>,
    /// Replies chosen by a substring of the prompt; checked before `script`
    by_prompt: Vec<(String, Scripted)>,
    /// Used once the script runs out; `"[]"` when unset
    fallback: Option<Scripted>,
    requests: Vec<ModelRequest>,
}

/// A scripted [`TextModel`].
///
/// Clones share state, so a test can keep a handle for assertions after
/// moving the model into a client.
#[derive(Clone, Default)]
pub struct MockModel {
    state: Arc<Mutex<MockModelState>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, outcome: Scripted) -> Self {
        locked(&self.state).script.push_back(outcome);
        self
    }

    /// Queue a successful raw reply.
    pub fn with_reply(self, body: impl Into<String>) -> Self {
        self.push(Scripted::Reply(body.into()))
    }

    /// Queue a transient failure.
    pub fn with_transient(self, msg: &str) -> Self {
        self.push(Scripted::Transient(msg.to_string()))
    }

    /// Queue an HTTP 429.
    pub fn with_rate_limit(self) -> Self {
        self.push(Scripted::RateLimited)
    }

    pub fn with_not_configured(self) -> Self {
        self.push(Scripted::NotConfigured)
    }

    /// Answer with `body` whenever the prompt contains `needle`.
    pub fn with_reply_containing(self, needle: impl Into<String>, body: impl Into<String>) -> Self {
        locked(&self.state)
            .by_prompt
            .push((needle.into(), Scripted::Reply(body.into())));
        self
    }

    /// Fail transiently on every call once the script is used up.
    pub fn with_default_transient(self, msg: &str) -> Self {
        locked(&self.state).fallback = Some(Scripted::Transient(msg.to_string()));
        self
    }

    pub fn call_count(&self) -> usize {
        locked(&self.state).requests.len()
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        locked(&self.state).requests.clone()
    }
}

#[async_trait]
impl TextModel for MockModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &ModelRequest) -> AiResult<String> {
        let mut state = locked(&self.state);
        state.requests.push(request.clone());

        let matched = state
            .by_prompt
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, outcome)| outcome.clone());

        let outcome = matched
            .or_else(|| state.script.pop_front())
            .or_else(|| state.fallback.clone())
            .unwrap_or_else(|| Scripted::Reply("[]".to_string()));

        outcome.into_result()
    }
}

/// A [`PageFetcher`] serving canned bodies. Unknown URLs answer 404.
#[derive(Clone, Default)]
pub struct MockFetcher {
    pages: Arc<Mutex<HashMap<String, FetchResult<FetchedPage>>>>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        let url = url.into();
        let page = FetchedPage::new(url.clone(), body);
        locked(&self.pages).insert(url, Ok(page));
        self
    }

    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        let url = url.into();
        let err = FetchError::Status {
            url: url.clone(),
            status,
        };
        locked(&self.pages).insert(url, Err(err));
        self
    }

    pub fn with_timeout(self, url: impl Into<String>) -> Self {
        let url = url.into();
        let err = FetchError::Timeout { url: url.clone() };
        locked(&self.pages).insert(url, Err(err));
        self
    }

    /// URLs fetched so far, in order.
    pub fn requested(&self) -> Vec<String> {
        locked(&self.requested).clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        locked(&self.requested).push(url.to_string());

        match locked(&self.pages).get(url) {
            Some(Ok(page)) => Ok(page.clone()),
            Some(Err(FetchError::Status { url, status })) => Err(FetchError::Status {
                url: url.clone(),
                status: *status,
            }),
            Some(Err(FetchError::Timeout { url })) => Err(FetchError::Timeout { url: url.clone() }),
            Some(Err(other)) => Err(FetchError::Parse(other.to_string())),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// A [`Sleeper`] that records requested delays and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        locked(&self.delays).clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        locked(&self.delays).push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_model_script_order() {
        let model = MockModel::new().with_transient("boom").with_reply("[1]");
        let req = ModelRequest::new("s", "p");

        assert!(matches!(
            model.generate(&req).await,
            Err(AiError::Transient(_))
        ));
        assert_eq!(model.generate(&req).await.unwrap(), "[1]");
        assert_eq!(model.generate(&req).await.unwrap(), "[]");
        assert_eq!(model.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_model_prompt_match_wins() {
        let model = MockModel::new()
            .with_reply("scripted")
            .with_reply_containing("https://x/b", "matched");

        assert_eq!(
            model
                .generate(&ModelRequest::new("s", "Page URL: https://x/b"))
                .await
                .unwrap(),
            "matched"
        );
        assert_eq!(
            model
                .generate(&ModelRequest::new("s", "Page URL: https://x/a"))
                .await
                .unwrap(),
            "scripted"
        );
    }

    #[tokio::test]
    async fn test_mock_fetcher_unknown_is_404() {
        let fetcher = MockFetcher::new().with_page("https://x/a", "body");
        assert_eq!(fetcher.fetch("https://x/a").await.unwrap().body, "body");
        let err = fetcher.fetch("https://x/missing").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[test]
    fn test_recording_sleeper_returns_immediately() {
        let sleeper = RecordingSleeper::new();
        tokio_test::block_on(sleeper.sleep(Duration::from_secs(3600)));
        assert_eq!(sleeper.delays(), vec![Duration::from_secs(3600)]);
    }
}
