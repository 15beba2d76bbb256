//! Batch orchestration.
//!
//! One run is a single sequential pass:
//! registry → collectors → records (saved one by one) → optional discovery
//! → index rebuild → status file.
//!
//! Failures stay contained per source. The quota signal stops every
//! remaining AI-assisted source for the run while stable sources keep going.
//! Only failing to write the index is fatal.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::ai::client_from_config;
use crate::collectors::{build_collectors, CollectorDeps};
use crate::config::CollectorConfig;
use crate::error::{CollectError, FetchResult, StoreResult};
use crate::fetchers::HttpFetcher;
use crate::pipeline::discovery::Discoverer;
use crate::pipeline::index::IndexBuilder;
use crate::stores::fs::write_json_atomic;
use crate::stores::{merge_sources, FsMetadataStore, SourceRegistry};
use crate::traits::collector::Collector;
use crate::traits::store::{MetadataStore, SaveOutcome};
use crate::types::{DocumentDescriptor, DocumentRecord, RunStatus, RunSummary, Source};

/// Sequential collection over a list of collectors.
pub struct Pipeline {
    store: Arc<dyn MetadataStore>,
}

impl Pipeline {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Run every collector in order, saving each descriptor as soon as it is
    /// produced.
    pub async fn collect(&self, collectors: &[Box<dyn Collector>]) -> RunSummary {
        let mut summary = RunSummary::default();

        for collector in collectors {
            let source = collector.source();

            if summary.quota_exhausted && collector.uses_ai() {
                debug!(org = %source.org, "AI quota exhausted, source skipped");
                summary.ai_sources_skipped += 1;
                continue;
            }

            summary.sources_processed += 1;
            info!(org = %source.org, url = %source.url, kind = ?collector.kind(), "collecting");

            let descriptors = match collector.fetch().await {
                Ok(descriptors) => descriptors,
                Err(CollectError::QuotaExhausted) => {
                    warn!(org = %source.org, "AI quota exhausted, stopping AI-assisted collection for this run");
                    summary.quota_exhausted = true;
                    continue;
                }
                Err(e) => {
                    warn!(org = %source.org, error = %e, "source failed");
                    summary.failed_sources += 1;
                    continue;
                }
            };

            if let Err(e) = self.persist(source, &descriptors, &mut summary).await {
                warn!(org = %source.org, error = %e, "saving records failed");
                summary.failed_sources += 1;
            }
        }

        info!(
            processed = summary.sources_processed,
            added = summary.documents_added,
            duplicates = summary.duplicates_skipped,
            failed = summary.failed_sources,
            ai_skipped = summary.ai_sources_skipped,
            quota_exhausted = summary.quota_exhausted,
            "collection pass finished"
        );
        summary
    }

    async fn persist(
        &self,
        source: &Source,
        descriptors: &[DocumentDescriptor],
        summary: &mut RunSummary,
    ) -> StoreResult<()> {
        for descriptor in descriptors {
            if !descriptor.is_usable() {
                debug!(org = %source.org, "descriptor without title or url dropped");
                continue;
            }

            let record = DocumentRecord::from_descriptor(descriptor, source, Utc::now());
            let doc_id = record.doc_id.clone().unwrap_or_default();

            match self.store.save(&source.org, &doc_id, &record).await? {
                SaveOutcome::Created => {
                    debug!(org = %source.org, doc_id = %doc_id, "record saved");
                    summary.documents_added += 1;
                }
                SaveOutcome::Duplicate => summary.duplicates_skipped += 1,
            }
        }
        Ok(())
    }
}

/// Everything a batch run needs, wired from configuration.
pub struct BatchRunner {
    config: CollectorConfig,
    deps: CollectorDeps,
    store: Arc<dyn MetadataStore>,
}

impl BatchRunner {
    /// Flat-file store under the configured data root.
    pub fn new(config: CollectorConfig, deps: CollectorDeps) -> Self {
        let store = FsMetadataStore::new(&config.data_dir).with_reserved(config.reserved_file_names());
        Self {
            config,
            deps,
            store: Arc::new(store),
        }
    }

    /// Real HTTP fetcher and Gemini client.
    pub fn from_config(config: CollectorConfig) -> FetchResult<Self> {
        let fetcher = HttpFetcher::new(config.fetch_timeout)?;
        let extractor = client_from_config(&config);
        let deps = CollectorDeps::new(Arc::new(fetcher), Arc::new(extractor));
        Ok(Self::new(config, deps))
    }

    pub fn with_store(mut self, store: Arc<dyn MetadataStore>) -> Self {
        self.store = store;
        self
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    fn registry(&self) -> SourceRegistry {
        SourceRegistry::new(&self.config.registry_path)
    }

    /// Load the registry, writing the seed list on first run.
    pub async fn load_sources(&self) -> Vec<Source> {
        let registry = self.registry();
        let existed = registry.exists();
        let sources = registry.load().await;
        if !existed {
            if let Err(e) = registry.persist(&sources).await {
                warn!(error = %e, "could not write seed registry");
            }
        }
        sources
    }

    /// Full batch: collect, optionally discover, rebuild the index, write
    /// the status file.
    pub async fn run_batch(&self) -> StoreResult<RunStatus> {
        let started = Utc::now();
        let mut sources = self.load_sources().await;
        info!(sources = sources.len(), "batch run starting");

        let collectors = build_collectors(&sources, &self.deps);
        let mut summary = Pipeline::new(self.store.clone()).collect(&collectors).await;

        if self.config.discovery.enabled {
            if summary.quota_exhausted {
                info!("discovery skipped, AI quota exhausted");
            } else {
                summary.sources_discovered = self.discover_into(&mut sources).await;
            }
        }

        let index_size = self.rebuild_index().await?;

        let status = RunStatus::new(summary, index_size);
        if let Err(e) = write_json_atomic(&self.config.status_path(), &status, false).await {
            warn!(error = %e, "could not write status file");
        }

        info!(
            index_size,
            elapsed_ms = (Utc::now() - started).num_milliseconds(),
            "batch run finished"
        );
        Ok(status)
    }

    /// Run discovery alone and persist any new sources. Returns how many
    /// were added.
    pub async fn discover_sources(&self) -> usize {
        let mut sources = self.load_sources().await;
        self.discover_into(&mut sources).await
    }

    async fn discover_into(&self, sources: &mut Vec<Source>) -> usize {
        let known = match self.store.known_urls().await {
            Ok(urls) => urls,
            Err(e) => {
                warn!(error = %e, "could not list known record URLs");
                Default::default()
            }
        };

        let found = Discoverer::new(self.deps.extractor.clone())
            .with_max_new(self.config.discovery.max_new)
            .with_known_urls(known)
            .discover(sources)
            .await;

        let added = merge_sources(sources, found);
        if added > 0 {
            if let Err(e) = self.registry().persist(sources).await {
                warn!(error = %e, "could not persist discovered sources");
                return 0;
            }
        }
        added
    }

    /// Rebuild the master index from the store.
    pub async fn rebuild_index(&self) -> StoreResult<usize> {
        IndexBuilder::new(self.config.index_path())
            .rebuild(self.store.as_ref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ExtractionClient;
    use crate::collectors::{GenericCollector, StableCollector};
    use crate::stores::MemoryStore;
    use crate::testing::{MockFetcher, MockModel, RecordingSleeper};

    fn extractor(model: MockModel) -> Arc<ExtractionClient> {
        Arc::new(ExtractionClient::new(Arc::new(model)).with_sleeper(Arc::new(RecordingSleeper::new())))
    }

    fn generic(org: &str, url: &str, fetcher: &Arc<MockFetcher>, extractor: &Arc<ExtractionClient>) -> Box<dyn Collector> {
        Box::new(GenericCollector::new(
            Source::new(org, url),
            fetcher.clone(),
            extractor.clone(),
        ))
    }

    #[tokio::test]
    async fn test_quota_stops_remaining_ai_sources_only() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_page("https://x/a", "<html/>")
                .with_page("https://x/b", "<html/>")
                .with_page("https://x/c", "<html/>"),
        );
        let model = MockModel::new().with_rate_limit();
        let handle = model.clone();
        let extractor = extractor(model);

        let collectors = vec![
            generic("A", "https://x/a", &fetcher, &extractor),
            generic("B", "https://x/b", &fetcher, &extractor),
            Box::new(StableCollector::imf(Source::new("IMF", "https://www.imf.org/en/Publications"))) as Box<dyn Collector>,
            generic("C", "https://x/c", &fetcher, &extractor),
        ];

        let store = Arc::new(MemoryStore::new());
        let summary = Pipeline::new(store.clone()).collect(&collectors).await;

        assert!(summary.quota_exhausted);
        assert_eq!(summary.ai_sources_skipped, 2);
        assert_eq!(summary.sources_processed, 2);
        assert_eq!(summary.documents_added, 1);
        assert_eq!(handle.call_count(), 1);
        assert_eq!(fetcher.requested(), vec!["https://x/a".to_string()]);
        assert_eq!(store.records_for("IMF").len(), 1);
    }

    #[tokio::test]
    async fn test_failed_source_does_not_stop_others() {
        let fetcher = Arc::new(MockFetcher::new().with_status("https://x/a", 500).with_page("https://x/b", "<html/>"));
        let model = MockModel::new().with_reply(r#"[{"title":"B1","url":"https://x/b/1","date":"2025-03-01"}]"#);
        let extractor = extractor(model);

        let collectors = vec![
            generic("A", "https://x/a", &fetcher, &extractor),
            generic("B", "https://x/b", &fetcher, &extractor),
        ];
        let store = Arc::new(MemoryStore::new());
        let summary = Pipeline::new(store.clone()).collect(&collectors).await;

        assert_eq!(summary.failed_sources, 1);
        assert_eq!(summary.documents_added, 1);
        assert_eq!(store.records_for("B")[0].date.as_deref(), Some("2025-03-01"));
    }

    #[tokio::test]
    async fn test_repeated_collection_adds_nothing() {
        let collectors: Vec<Box<dyn Collector>> = vec![Box::new(StableCollector::japan_mof(Source::new(
            "MOF",
            "https://www.mof.go.jp/budget/",
        )))];
        let store = Arc::new(MemoryStore::new());
        let pipeline = Pipeline::new(store.clone());

        let first = pipeline.collect(&collectors).await;
        let second = pipeline.collect(&collectors).await;

        assert_eq!(first.documents_added, 1);
        assert_eq!(second.documents_added, 0);
        assert_eq!(second.duplicates_skipped, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_unsaveable_org_counts_as_failed() {
        let collectors: Vec<Box<dyn Collector>> =
            vec![Box::new(StableCollector::imf(Source::new("../escape", "https://x/imf")))];
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsMetadataStore::new(dir.path()));

        let summary = Pipeline::new(store).collect(&collectors).await;
        assert_eq!(summary.failed_sources, 1);
        assert_eq!(summary.documents_added, 0);
    }
}
