//! Flat-file metadata store.
//!
//! Layout: `{root}/{ORG}/{doc_id}.json`, one record per file. The index,
//! status and registry files in the root are reserved and never listed.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::{MetadataStore, SaveOutcome};
use crate::types::source::url_key;
use crate::types::{DocumentRecord, StoredRecord};

/// Stores each record as a JSON file in a per-organization directory.
pub struct FsMetadataStore {
    root: PathBuf,
    reserved: HashSet<String>,
    /// url keys per organization, loaded lazily from disk
    url_index: Mutex<HashMap<String, HashSet<String>>>,
}

impl FsMetadataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            reserved: [crate::config::INDEX_FILE_NAME, crate::config::STATUS_FILE_NAME]
                .into_iter()
                .map(String::from)
                .collect(),
            url_index: Mutex::new(HashMap::new()),
        }
    }

    /// Additional file names to leave out of `list` (e.g. the registry).
    pub fn with_reserved(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.reserved.extend(names.into_iter().map(Into::into));
        self
    }

    fn org_dir(&self, org: &str) -> StoreResult<PathBuf> {
        Ok(self.root.join(path_component(org)?))
    }

    fn is_record_file(&self, path: &Path) -> bool {
        let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
        let reserved = path
            .file_name()
            .map(|n| self.reserved.contains(n.to_string_lossy().as_ref()))
            .unwrap_or(false);
        is_json && !reserved
    }

    /// Read the url keys already stored for one organization.
    async fn scan_org_urls(&self, dir: &Path) -> StoreResult<HashSet<String>> {
        let mut urls = HashSet::new();
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(urls),
            Err(e) => return Err(StoreError::io(dir, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(dir, e))?
        {
            let path = entry.path();
            if !self.is_record_file(&path) {
                continue;
            }
            let Ok(bytes) = tokio::fs::read(&path).await else {
                continue;
            };
            if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(&bytes) {
                if let Some(url) = map.get("url").and_then(Value::as_str) {
                    urls.insert(url_key(url));
                }
            }
        }
        Ok(urls)
    }
}

#[async_trait]
impl MetadataStore for FsMetadataStore {
    async fn save(
        &self,
        org: &str,
        doc_id: &str,
        record: &DocumentRecord,
    ) -> StoreResult<SaveOutcome> {
        let dir = self.org_dir(org)?;
        let file_name = format!("{}.json", path_component(doc_id)?);
        if self.reserved.contains(&file_name) {
            return Err(StoreError::InvalidKey(doc_id.to_string()));
        }
        let path = dir.join(file_name);
        let key = url_key(&record.url);

        let cached = {
            let index = self.url_index.lock().unwrap_or_else(|e| e.into_inner());
            index.get(org).cloned()
        };
        let known = match cached {
            Some(urls) => urls,
            None => self.scan_org_urls(&dir).await?,
        };

        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        if exists || (!key.is_empty() && known.contains(&key)) {
            debug!(org, doc_id, url = %record.url, "record already stored");
            let mut index = self.url_index.lock().unwrap_or_else(|e| e.into_inner());
            index.insert(org.to_string(), known);
            return Ok(SaveOutcome::Duplicate);
        }

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))?;
        write_json_atomic(&path, record, false).await?;

        let mut known = known;
        if !key.is_empty() {
            known.insert(key);
        }
        let mut index = self.url_index.lock().unwrap_or_else(|e| e.into_inner());
        index.insert(org.to_string(), known);

        debug!(org, doc_id, path = %path.display(), "record saved");
        Ok(SaveOutcome::Created)
    }

    async fn list(&self) -> StoreResult<Vec<StoredRecord>> {
        let mut records = Vec::new();
        if !self.root.exists() {
            return Ok(records);
        }

        let walker = WalkDir::new(&self.root).sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.is_record_file(entry.path()) {
                continue;
            }

            let path = entry.path();
            let bytes = match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable record");
                    continue;
                }
            };
            let value = match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => value,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping malformed record");
                    continue;
                }
            };
            match StoredRecord::from_value(value) {
                Some(record) => records.push(record),
                None => warn!(path = %path.display(), "skipping record without a title"),
            }
        }

        Ok(records)
    }
}

/// Reject keys that would escape the store directory.
fn path_component(key: &str) -> StoreResult<&str> {
    let key = key.trim();
    if key.is_empty()
        || key == "."
        || key == ".."
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0')
    {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(key)
}

/// Serialize `value` to a sibling temp file, then rename it over `path`.
///
/// `wide_indent` selects 4-space indentation (used for the index).
pub(crate) async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    wide_indent: bool,
) -> StoreResult<()> {
    let mut buf = Vec::new();
    if wide_indent {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value
            .serialize(&mut ser)
            .map_err(|e| StoreError::json(path, e))?;
    } else {
        serde_json::to_writer_pretty(&mut buf, value).map_err(|e| StoreError::json(path, e))?;
    }
    buf.push(b'\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| StoreError::InvalidKey(path.display().to_string()))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    tokio::fs::write(&tmp, &buf)
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(StoreError::io(path, e));
    }
    Ok(())
}
