//! AI-assisted collector: fetch the target page and let the model list the
//! documents it links to.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::ai::ExtractionClient;
use crate::error::CollectResult;
use crate::traits::collector::{Collector, CollectorKind};
use crate::traits::fetcher::PageFetcher;
use crate::types::{DocumentDescriptor, Source};

pub struct GenericCollector {
    source: Source,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<ExtractionClient>,
}

impl GenericCollector {
    pub fn new(source: Source, fetcher: Arc<dyn PageFetcher>, extractor: Arc<ExtractionClient>) -> Self {
        Self {
            source,
            fetcher,
            extractor,
        }
    }
}

#[async_trait]
impl Collector for GenericCollector {
    fn source(&self) -> &Source {
        &self.source
    }

    fn kind(&self) -> CollectorKind {
        CollectorKind::Generic
    }

    async fn fetch(&self) -> CollectResult<Vec<DocumentDescriptor>> {
        let page = self.fetcher.fetch(&self.source.url).await?;
        debug!(
            org = %self.source.org,
            url = %page.url,
            bytes = page.body.len(),
            "page fetched"
        );

        // Quota maps to CollectError::QuotaExhausted through From<AiError>
        let descriptors = self.extractor.extract(&self.source.url, &page.body).await?;

        info!(
            org = %self.source.org,
            model = %self.extractor.model_name(),
            count = descriptors.len(),
            "AI extraction finished"
        );
        Ok(descriptors)
    }
}
