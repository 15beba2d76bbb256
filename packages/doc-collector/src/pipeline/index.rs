//! Master index rebuild.
//!
//! The index is derived: every rebuild reads all current records and
//! replaces the index file in one atomic write. Records themselves are
//! never touched, so a rebuild can be repeated any number of times.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::INDEX_FILE_NAME;
use crate::error::StoreResult;
use crate::stores::fs::{write_json_atomic, FsMetadataStore};
use crate::traits::store::MetadataStore;
use crate::types::StoredRecord;

pub struct IndexBuilder {
    index_path: PathBuf,
}

impl IndexBuilder {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
        }
    }

    /// Rebuild the index from `store`. Returns the number of records written.
    pub async fn rebuild(&self, store: &dyn MetadataStore) -> StoreResult<usize> {
        let mut records = store.list().await?;
        sort_records(&mut records);

        write_json_atomic(&self.index_path, &records, true).await?;
        info!(
            path = %self.index_path.display(),
            count = records.len(),
            "master index rebuilt"
        );
        Ok(records.len())
    }
}

/// Date descending by plain string comparison; missing dates sort last.
/// The sort is stable, so ties keep the store's listing order.
pub fn sort_records(records: &mut [StoredRecord]) {
    records.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
}

/// Rebuild `{data_root}/master_index.json` from the record files under
/// `data_root`.
pub async fn rebuild_index(data_root: &Path) -> StoreResult<usize> {
    let store = FsMetadataStore::new(data_root);
    IndexBuilder::new(data_root.join(INDEX_FILE_NAME))
        .rebuild(&store)
        .await
}
