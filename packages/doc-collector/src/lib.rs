//! Public Economic Document Collector
//!
//! Batch pipeline that collects metadata about public economic and
//! regulatory documents from government and international bodies, stores
//! one record per document, and rebuilds a date-sorted master index.
//!
//! # Usage
//!
//! ```rust,ignore
//! use doc_collector::{BatchRunner, CollectorConfig};
//!
//! let config = CollectorConfig::from_env()?;
//! let runner = BatchRunner::from_config(config)?;
//! let status = runner.run_batch().await?;
//! println!("{} documents indexed", status.index_size);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (TextModel, PageFetcher, Collector, MetadataStore)
//! - [`types`] - Sources, descriptors, records and run status
//! - [`ai`] - Gemini model, prompts, backoff and the retrying extraction client
//! - [`collectors`] - Stable and AI-assisted collectors
//! - [`stores`] - Flat-file and in-memory record stores, source registry
//! - [`pipeline`] - Collection pass, discovery, index rebuild, batch runner
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod collectors;
pub mod config;
pub mod error;
pub mod fetchers;
pub mod pipeline;
pub mod security;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use config::CollectorConfig;
pub use error::{AiError, CollectError, ConfigError, FetchError, StoreError};
pub use traits::{
    ai::{ModelRequest, TextModel},
    collector::{Collector, CollectorKind},
    fetcher::{FetchedPage, PageFetcher},
    store::{MetadataStore, SaveOutcome},
};
pub use types::{
    DocumentDescriptor, DocumentRecord, RunStatus, RunSummary, Source, StatusLevel, StoredRecord,
};

pub use ai::{BackoffPolicy, ExtractionClient};
pub use collectors::{build_collector, CollectorDeps};
pub use pipeline::{rebuild_index, BatchRunner, Discoverer, IndexBuilder, Pipeline};
pub use stores::{FsMetadataStore, MemoryStore, SourceRegistry};
