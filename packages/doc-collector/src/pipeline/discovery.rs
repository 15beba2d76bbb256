//! Best-effort discovery of new sources through the extraction service.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::ai::{prompts, ExtractionClient};
use crate::types::source::{slugify, url_key};
use crate::types::Source;

/// Default cap on sources returned by one discovery call.
pub const DEFAULT_MAX_NEW: usize = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    id: Option<String>,
    country: Option<String>,
    org: Option<String>,
    url: Option<String>,
    category: Option<String>,
}

/// Proposes sources that are not yet registered.
pub struct Discoverer {
    client: Arc<ExtractionClient>,
    max_new: usize,
    /// URLs already persisted as records; proposals matching them are dropped
    known_urls: HashSet<String>,
}

impl Discoverer {
    pub fn new(client: Arc<ExtractionClient>) -> Self {
        Self {
            client,
            max_new: DEFAULT_MAX_NEW,
            known_urls: HashSet::new(),
        }
    }

    pub fn with_max_new(mut self, max_new: usize) -> Self {
        self.max_new = max_new;
        self
    }

    pub fn with_known_urls(mut self, urls: impl IntoIterator<Item = String>) -> Self {
        self.known_urls.extend(urls.into_iter().map(|u| url_key(&u)));
        self
    }

    /// Ask for new sources and keep only URLs absent from `existing` and
    /// from the known record URLs. Any failure yields an empty list.
    pub async fn discover(&self, existing: &[Source]) -> Vec<Source> {
        if self.max_new == 0 {
            return Vec::new();
        }

        let request = prompts::discovery_request(existing, self.max_new);
        let raw = match self.client.generate_json::<Vec<Value>>(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "source discovery failed");
                return Vec::new();
            }
        };

        let mut seen: HashSet<String> = existing.iter().map(Source::url_key).collect();
        seen.extend(self.known_urls.iter().cloned());

        let total = raw.len();
        let found: Vec<Source> = raw
            .into_iter()
            .filter_map(|value| serde_json::from_value::<Candidate>(value).ok())
            .filter_map(into_source)
            .filter(|source| seen.insert(source.url_key()))
            .take(self.max_new)
            .collect();

        debug!(proposed = total, kept = found.len(), "discovery reply filtered");
        info!(count = found.len(), "new sources discovered");
        found
    }
}

/// A candidate needs an absolute http(s) URL; a missing org falls back to
/// the URL host.
fn into_source(candidate: Candidate) -> Option<Source> {
    let raw_url = candidate.url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
    let parsed = Url::parse(raw_url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    let org = candidate
        .org
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .or_else(|| parsed.host_str().map(str::to_string))?;

    let mut source = Source::new(org, raw_url);
    if let Some(id) = candidate.id.map(|i| slugify(&i)).filter(|i| !i.is_empty()) {
        source.id = id;
    }
    if let Some(country) = candidate.country {
        source.country = country.trim().to_ascii_uppercase();
    }
    if let Some(category) = candidate.category.filter(|c| !c.trim().is_empty()) {
        source.category = category;
    }
    Some(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockModel, RecordingSleeper};

    fn discoverer(model: MockModel) -> Discoverer {
        let client = ExtractionClient::new(Arc::new(model)).with_sleeper(Arc::new(RecordingSleeper::new()));
        Discoverer::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_filters_urls_already_collected() {
        let registry = vec![Source::new("IMF", "https://x/imf")];
        let model = MockModel::new().with_reply(r#"[{"url":"https://x/imf/report1"},{"url":"https://x/new"}]"#);

        let found = discoverer(model)
            .with_known_urls(vec!["https://x/imf/report1".to_string()])
            .discover(&registry)
            .await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://x/new");
        assert_eq!(found[0].org, "x");
    }

    #[tokio::test]
    async fn test_filters_registry_urls_and_repeats() {
        let registry = vec![Source::new("IMF", "https://x/imf")];
        let model = MockModel::new().with_reply(
            r#"[
                {"id":"imf","org":"IMF","url":"https://x/imf/"},
                {"id":"bcra","country":"arg","org":"BCRA","url":"https://bcra.gob.ar/pub","category":"Monetary"},
                {"org":"BCRA again","url":"https://bcra.gob.ar/pub"},
                {"org":"No url"},
                {"org":"Bad","url":"ftp://files"}
            ]"#,
        );

        let found = discoverer(model).discover(&registry).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "bcra");
        assert_eq!(found[0].country, "ARG");
        assert_eq!(found[0].category, "Monetary");
    }

    #[tokio::test]
    async fn test_failure_returns_empty() {
        let found = discoverer(MockModel::new().with_rate_limit())
            .discover(&[Source::new("IMF", "https://x/imf")])
            .await;
        assert!(found.is_empty());

        let found = discoverer(MockModel::new().with_default_transient("down"))
            .discover(&[])
            .await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_result_is_capped() {
        let items: Vec<String> = (0..5)
            .map(|i| format!(r#"{{"org":"Org{i}","url":"https://x/{i}"}}"#))
            .collect();
        let model = MockModel::new().with_reply(format!("[{}]", items.join(",")));
        let found = discoverer(model).with_max_new(2).discover(&[]).await;
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_request_uses_web_search() {
        let model = MockModel::new();
        let handle = model.clone();
        discoverer(model).discover(&[Source::new("IMF", "https://x/imf")]).await;
        assert!(handle.requests()[0].web_search);
    }
}
