//! RSS/Atom feed collector (Japanese e-Gov public comments by default).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CollectResult, FetchError};
use crate::traits::collector::{Collector, CollectorKind};
use crate::traits::fetcher::PageFetcher;
use crate::types::{DocumentDescriptor, Source, StatusLevel};

/// One entry per feed item; the item link is the document URL.
pub struct FeedCollector {
    source: Source,
    fetcher: Arc<dyn PageFetcher>,
}

impl FeedCollector {
    pub fn new(source: Source, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { source, fetcher }
    }
}

#[async_trait]
impl Collector for FeedCollector {
    fn source(&self) -> &Source {
        &self.source
    }

    fn kind(&self) -> CollectorKind {
        CollectorKind::Stable
    }

    async fn fetch(&self) -> CollectResult<Vec<DocumentDescriptor>> {
        let page = self.fetcher.fetch(&self.source.url).await?;
        let feed = feed_rs::parser::parse(page.body.as_bytes())
            .map_err(|e| FetchError::Parse(format!("feed {}: {e}", self.source.url)))?;

        let org = &self.source.org;
        let descriptors: Vec<DocumentDescriptor> = feed
            .entries
            .into_iter()
            .filter_map(|entry| {
                let url = entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;
                let title = entry.title.map(|t| t.content)?;

                let mut desc = DocumentDescriptor::new(title.trim(), url)
                    .with_summary(format!("{org}: {}", title.trim()))
                    .with_status_level(StatusLevel::Notice);
                desc.date = entry
                    .published
                    .or(entry.updated)
                    .map(|dt| dt.format("%Y-%m-%d").to_string());
                Some(desc)
            })
            .collect();

        debug!(url = %self.source.url, count = descriptors.len(), "feed parsed");
        Ok(descriptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    const FEED_URL: &str = "https://public-comment.e-gov.go.jp/servlet/PcmSearch?format=rss&target=0";

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>e-Gov</title>
    <link>https://public-comment.e-gov.go.jp/</link>
    <description>public comments</description>
    <item>
      <title>意見募集A</title>
      <link>https://public-comment.e-gov.go.jp/a</link>
      <pubDate>Tue, 14 Jan 2025 09:00:00 +0900</pubDate>
    </item>
    <item>
      <title>意見募集B</title>
      <link>https://public-comment.e-gov.go.jp/b</link>
    </item>
  </channel>
</rss>"#;

    #[tokio::test]
    async fn test_parses_items() {
        let fetcher = Arc::new(MockFetcher::new().with_page(FEED_URL, RSS));
        let collector = FeedCollector::new(Source::new("e-Gov", FEED_URL), fetcher);

        let docs = collector.fetch().await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].url, "https://public-comment.e-gov.go.jp/a");
        assert_eq!(docs[0].date.as_deref(), Some("2025-01-14"));
        assert_eq!(docs[0].summary.as_deref(), Some("e-Gov: 意見募集A"));
        assert_eq!(docs[1].date, None);
        assert_eq!(docs[1].status_level.as_deref(), Some("Notice"));
    }

    #[tokio::test]
    async fn test_unreachable_feed_is_error() {
        let fetcher = Arc::new(MockFetcher::new().with_status(FEED_URL, 503));
        let result = FeedCollector::new(Source::new("e-Gov", FEED_URL), fetcher)
            .fetch()
            .await;
        assert!(result.is_err());
    }
}
