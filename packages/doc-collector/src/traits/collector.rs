//! Collector trait.
//!
//! Stable and AI-assisted collectors share one capability: turn a source into
//! zero or more document descriptors. Persistence is done by the pipeline,
//! one descriptor at a time, so partial success is kept.

use async_trait::async_trait;

use crate::error::CollectResult;
use crate::types::{DocumentDescriptor, Source};

/// Which family a collector belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorKind {
    /// Hand-maintained fetch logic, no AI call.
    Stable,

    /// Page fetch + AI extraction; stops when the quota is exhausted.
    Generic,
}

#[async_trait]
pub trait Collector: Send + Sync {
    /// The source this collector works on.
    fn source(&self) -> &Source;

    fn kind(&self) -> CollectorKind;

    fn uses_ai(&self) -> bool {
        self.kind() == CollectorKind::Generic
    }

    /// Produce document descriptors for the source.
    ///
    /// AI-assisted collectors return `CollectError::QuotaExhausted` when the
    /// extraction service is rate limited.
    async fn fetch(&self) -> CollectResult<Vec<DocumentDescriptor>>;
}
