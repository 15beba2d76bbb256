//! Collector implementations and selection by source configuration.
//!
//! Available collectors:
//! - `StableCollector` - fixed, hand-curated document lists (`imf`, `japan-mof`)
//! - `FederalRegisterCollector` - US Federal Register API (`federal-register`)
//! - `FeedCollector` - RSS/Atom feeds (`egov-feed`)
//! - `GenericCollector` - page fetch + AI extraction (no `collector` set)

pub mod federal_register;
pub mod feed;
pub mod generic;
pub mod stable;

use std::sync::Arc;

use tracing::warn;

pub use federal_register::FederalRegisterCollector;
pub use feed::FeedCollector;
pub use generic::GenericCollector;
pub use stable::StableCollector;

use crate::ai::ExtractionClient;
use crate::traits::collector::Collector;
use crate::traits::fetcher::PageFetcher;
use crate::types::Source;

/// Shared collaborators handed to every collector.
#[derive(Clone)]
pub struct CollectorDeps {
    pub fetcher: Arc<dyn PageFetcher>,
    pub extractor: Arc<ExtractionClient>,
}

impl CollectorDeps {
    pub fn new(fetcher: Arc<dyn PageFetcher>, extractor: Arc<ExtractionClient>) -> Self {
        Self { fetcher, extractor }
    }
}

/// Pick the collector named by `source.collector`, defaulting to the AI one.
pub fn build_collector(source: Source, deps: &CollectorDeps) -> Box<dyn Collector> {
    let name = source
        .collector
        .as_deref()
        .map(|n| n.trim().to_ascii_lowercase());

    match name.as_deref() {
        Some("imf") => Box::new(StableCollector::imf(source)),
        Some("japan-mof") => Box::new(StableCollector::japan_mof(source)),
        Some("federal-register") => Box::new(FederalRegisterCollector::new(source, deps.fetcher.clone())),
        Some("egov-feed") => Box::new(FeedCollector::new(source, deps.fetcher.clone())),
        Some(other) if !other.is_empty() => {
            warn!(org = %source.org, collector = other, "unknown collector, using AI extraction");
            Box::new(GenericCollector::new(source, deps.fetcher.clone(), deps.extractor.clone()))
        }
        _ => Box::new(GenericCollector::new(source, deps.fetcher.clone(), deps.extractor.clone())),
    }
}

pub fn build_collectors(sources: &[Source], deps: &CollectorDeps) -> Vec<Box<dyn Collector>> {
    sources
        .iter()
        .cloned()
        .map(|source| build_collector(source, deps))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockFetcher, MockModel};
    use crate::traits::collector::CollectorKind;

    fn deps() -> CollectorDeps {
        CollectorDeps::new(
            Arc::new(MockFetcher::new()),
            Arc::new(ExtractionClient::new(Arc::new(MockModel::new()))),
        )
    }

    #[test]
    fn test_selection_by_name() {
        let deps = deps();
        let kinds: Vec<CollectorKind> = [
            Some("imf"),
            Some("Japan-MOF"),
            Some("federal-register"),
            Some("egov-feed"),
            Some("no-such-thing"),
            None,
        ]
        .into_iter()
        .map(|name| {
            let mut source = Source::new("Org", "https://x/org");
            source.collector = name.map(String::from);
            build_collector(source, &deps).kind()
        })
        .collect();

        assert_eq!(
            kinds,
            vec![
                CollectorKind::Stable,
                CollectorKind::Stable,
                CollectorKind::Stable,
                CollectorKind::Stable,
                CollectorKind::Generic,
                CollectorKind::Generic,
            ]
        );
    }

    #[test]
    fn test_build_collectors_keeps_order() {
        let sources = vec![
            Source::new("A", "https://x/a"),
            Source::new("B", "https://x/b").with_collector("imf"),
        ];
        let collectors = build_collectors(&sources, &deps());
        assert_eq!(collectors[0].source().org, "A");
        assert_eq!(collectors[1].source().org, "B");
    }
}
