//! Hand-curated collectors that return a fixed document list.

use async_trait::async_trait;

use crate::error::CollectResult;
use crate::traits::collector::{Collector, CollectorKind};
use crate::types::{DocumentDescriptor, Source};

/// Returns the same curated descriptors on every call. No network access.
pub struct StableCollector {
    source: Source,
    documents: Vec<DocumentDescriptor>,
}

impl StableCollector {
    pub fn new(source: Source, documents: Vec<DocumentDescriptor>) -> Self {
        Self { source, documents }
    }

    /// IMF flagship publications.
    pub fn imf(source: Source) -> Self {
        Self::new(
            source,
            vec![DocumentDescriptor::new(
                "World Economic Outlook, October 2024",
                "https://www.imf.org/-/media/Files/Publications/WEO/2024/October/English/text.ashx",
            )
            .with_id("imf_weo_2024_oct")
            .with_date("2024-10-22")
            .with_category("Global Economy")],
        )
    }

    /// Japan Ministry of Finance budget overview.
    pub fn japan_mof(source: Source) -> Self {
        Self::new(
            source,
            vec![DocumentDescriptor::new(
                "令和7年度予算案の概要",
                "https://www.mof.go.jp/budget/budger_workflow/budget/fy2025/seian/01.pdf",
            )
            .with_id("jpn_mof_budget_r7")
            .with_date("2024-12-24")
            .with_category("Budget")],
        )
    }
}

#[async_trait]
impl Collector for StableCollector {
    fn source(&self) -> &Source {
        &self.source
    }

    fn kind(&self) -> CollectorKind {
        CollectorKind::Stable
    }

    async fn fetch(&self) -> CollectResult<Vec<DocumentDescriptor>> {
        Ok(self.documents.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_curated_lists_are_deterministic() {
        let collector = StableCollector::imf(Source::new("IMF", "https://www.imf.org/en/Publications"));
        let first = collector.fetch().await.unwrap();
        let second = collector.fetch().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].id.as_deref(), Some("imf_weo_2024_oct"));
        assert!(!collector.uses_ai());
    }

    #[tokio::test]
    async fn test_japan_mof_budget() {
        let collector = StableCollector::japan_mof(Source::new("MOF", "https://www.mof.go.jp/budget/"));
        let docs = collector.fetch().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].date.as_deref(), Some("2024-12-24"));
        assert_eq!(collector.kind(), CollectorKind::Stable);
    }
}
