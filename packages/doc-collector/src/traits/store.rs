//! Metadata store trait.
//!
//! The store is the unit of de-duplication: within one organization no two
//! records share a `url`.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::{DocumentRecord, StoredRecord};

/// What happened to a `save` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    /// A record with the same url or doc id already exists; nothing written.
    Duplicate,
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Write one record for `org` under `doc_id` if it is new.
    ///
    /// Existing records are never rewritten, which makes `save` idempotent.
    async fn save(&self, org: &str, doc_id: &str, record: &DocumentRecord)
        -> StoreResult<SaveOutcome>;

    /// Every record object, as stored. Entries that are not JSON objects with
    /// a `title` are skipped and logged.
    async fn list(&self) -> StoreResult<Vec<StoredRecord>>;

    /// URLs of every well-formed record, across organizations.
    async fn known_urls(&self) -> StoreResult<HashSet<String>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter_map(|r| r.url().filter(|u| !u.is_empty()).map(crate::types::source::url_key))
            .collect())
    }
}
