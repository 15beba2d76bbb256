//! In-memory metadata store for testing and dry runs.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::traits::store::{MetadataStore, SaveOutcome};
use crate::types::source::url_key;
use crate::types::{DocumentRecord, StoredRecord};

/// Records keyed by `(org, doc_id)`. Not suitable for production as data is
/// lost on exit.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<(String, String), DocumentRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records stored for one organization.
    pub fn records_for(&self, org: &str) -> Vec<DocumentRecord> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|((o, _), _)| o == org)
            .map(|(_, r)| r.clone())
            .collect()
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn save(
        &self,
        org: &str,
        doc_id: &str,
        record: &DocumentRecord,
    ) -> StoreResult<SaveOutcome> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let key = url_key(&record.url);

        let duplicate = records.contains_key(&(org.to_string(), doc_id.to_string()))
            || records
                .iter()
                .any(|((o, _), r)| o == org && !key.is_empty() && url_key(&r.url) == key);
        if duplicate {
            return Ok(SaveOutcome::Duplicate);
        }

        records.insert((org.to_string(), doc_id.to_string()), record.clone());
        Ok(SaveOutcome::Created)
    }

    async fn list(&self) -> StoreResult<Vec<StoredRecord>> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(StoredRecord::from)
            .collect())
    }
}
