//! US Federal Register documents API.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{CollectResult, FetchError};
use crate::traits::collector::{Collector, CollectorKind};
use crate::traits::fetcher::PageFetcher;
use crate::types::{DocumentDescriptor, Source, StatusLevel};

/// Number of documents requested per call.
pub const PAGE_SIZE: u32 = 5;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    results: Vec<ApiDocument>,
}

#[derive(Debug, Deserialize)]
struct ApiDocument {
    title: Option<String>,
    html_url: Option<String>,
    publication_date: Option<String>,
    #[serde(rename = "abstract")]
    summary: Option<String>,
}

/// Latest documents from the Federal Register JSON API.
pub struct FederalRegisterCollector {
    source: Source,
    fetcher: Arc<dyn PageFetcher>,
}

impl FederalRegisterCollector {
    pub fn new(source: Source, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { source, fetcher }
    }

    /// Source URL with `per_page` set unless the registry already pins it.
    pub fn api_url(&self) -> CollectResult<String> {
        let mut url = Url::parse(self.source.url.trim())
            .map_err(|e| FetchError::Parse(format!("{}: {e}", self.source.url)))?;
        if !url.query_pairs().any(|(k, _)| k == "per_page") {
            url.query_pairs_mut()
                .append_pair("per_page", &PAGE_SIZE.to_string());
        }
        Ok(url.into())
    }
}

#[async_trait]
impl Collector for FederalRegisterCollector {
    fn source(&self) -> &Source {
        &self.source
    }

    fn kind(&self) -> CollectorKind {
        CollectorKind::Stable
    }

    async fn fetch(&self) -> CollectResult<Vec<DocumentDescriptor>> {
        let url = self.api_url()?;
        let page = self.fetcher.fetch(&url).await?;
        let response: ApiResponse = serde_json::from_str(&page.body)
            .map_err(|e| FetchError::Parse(format!("federal register response: {e}")))?;

        let descriptors: Vec<DocumentDescriptor> = response
            .results
            .into_iter()
            .filter_map(|doc| {
                let mut desc = DocumentDescriptor::new(doc.title?, doc.html_url?)
                    .with_status_level(StatusLevel::Warning);
                desc.date = doc.publication_date;
                desc.summary = doc.summary;
                Some(desc)
            })
            .collect();

        debug!(url = %url, count = descriptors.len(), "federal register parsed");
        Ok(descriptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectError;
    use crate::testing::MockFetcher;

    const BASE: &str = "https://www.federalregister.gov/api/v1/documents.json";

    fn source(url: &str) -> Source {
        Source::new("FederalRegister", url).with_country("USA")
    }

    #[test]
    fn test_api_url_adds_page_size_once() {
        let fetcher = Arc::new(MockFetcher::new());
        let collector = FederalRegisterCollector::new(source(BASE), fetcher.clone());
        assert_eq!(collector.api_url().unwrap(), format!("{BASE}?per_page=5"));

        let pinned = format!("{BASE}?per_page=20");
        let collector = FederalRegisterCollector::new(source(&pinned), fetcher);
        assert_eq!(collector.api_url().unwrap(), pinned);
    }

    #[tokio::test]
    async fn test_maps_results() {
        let body = r#"{"count": 2, "results": [
            {"title": "Air Quality Rule", "html_url": "https://fr/1", "publication_date": "2025-01-15", "abstract": "EPA rule"},
            {"title": null, "html_url": "https://fr/2"}
        ]}"#;
        let fetcher = Arc::new(MockFetcher::new().with_page(format!("{BASE}?per_page=5"), body));
        let collector = FederalRegisterCollector::new(source(BASE), fetcher);

        let docs = collector.fetch().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].url, "https://fr/1");
        assert_eq!(docs[0].date.as_deref(), Some("2025-01-15"));
        assert_eq!(docs[0].summary.as_deref(), Some("EPA rule"));
        assert_eq!(docs[0].status_level.as_deref(), Some("Warning"));
        assert!(!collector.uses_ai());
    }

    #[tokio::test]
    async fn test_bad_body_is_fetch_error() {
        let fetcher = Arc::new(MockFetcher::new().with_page(format!("{BASE}?per_page=5"), "<html>"));
        let err = FederalRegisterCollector::new(source(BASE), fetcher)
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::Fetch(FetchError::Parse(_))));
    }
}
