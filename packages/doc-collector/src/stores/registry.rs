//! Durable list of collection targets.
//!
//! The registry is a single JSON array of [`Source`] objects. A missing or
//! unreadable registry never fails a run: the built-in seed list is used
//! instead.

use std::collections::HashSet;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::StoreResult;
use crate::stores::fs::write_json_atomic;
use crate::types::Source;

/// Small seed list used on first run.
pub fn default_sources() -> Vec<Source> {
    vec![
        Source::new("IMF", "https://www.imf.org/en/Publications")
            .with_id("int_imf")
            .with_country("INT")
            .with_category("Global Economy")
            .with_collector("imf"),
        Source::new("MOF", "https://www.mof.go.jp/budget/")
            .with_id("jpn_mof")
            .with_country("JPN")
            .with_category("Budget")
            .with_collector("japan-mof"),
        Source::new(
            "FederalRegister",
            "https://www.federalregister.gov/api/v1/documents.json?per_page=5",
        )
        .with_id("usa_federal_register")
        .with_country("USA")
        .with_category("Regulatory")
        .with_collector("federal-register"),
        Source::new(
            "e-Gov",
            "https://public-comment.e-gov.go.jp/servlet/PcmSearch?format=rss&target=0",
        )
        .with_id("jpn_egov")
        .with_country("JPN")
        .with_category("Regulatory")
        .with_collector("egov-feed"),
        Source::new(
            "ECB",
            "https://www.ecb.europa.eu/press/pubbydate/html/index.en.html",
        )
        .with_id("eur_ecb")
        .with_country("EUR")
        .with_category("Monetary Policy"),
    ]
}

/// File-backed registry.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    path: PathBuf,
}

impl SourceRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the registry, falling back to [`default_sources`].
    ///
    /// Entries without `org` or `url` are dropped, as are repeated URLs.
    pub async fn load(&self) -> Vec<Source> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no registry yet, using seed sources");
                return default_sources();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "registry unreadable, using seed sources");
                return default_sources();
            }
        };

        let entries = match serde_json::from_slice::<Vec<Value>>(&bytes) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "registry invalid, using seed sources");
                return default_sources();
            }
        };

        let total = entries.len();
        let mut seen = HashSet::new();
        let mut sources = Vec::with_capacity(total);
        for entry in entries {
            match serde_json::from_value::<Source>(entry) {
                Ok(source) if source.is_valid() => {
                    if seen.insert(source.url_key()) {
                        sources.push(source);
                    } else {
                        warn!(url = %source.url, "duplicate registry entry dropped");
                    }
                }
                Ok(source) => warn!(org = %source.org, url = %source.url, "registry entry missing org or url"),
                Err(e) => warn!(error = %e, "malformed registry entry skipped"),
            }
        }

        if total > 0 && sources.is_empty() {
            warn!(path = %self.path.display(), "registry has no usable entries, using seed sources");
            return default_sources();
        }

        sources
    }

    /// Write the full sequence back.
    pub async fn persist(&self, sources: &[Source]) -> StoreResult<()> {
        write_json_atomic(&self.path, sources, false).await?;
        info!(path = %self.path.display(), count = sources.len(), "registry saved");
        Ok(())
    }
}

/// Append candidates whose URL is not already registered. Returns how many
/// were added.
pub fn merge_sources(existing: &mut Vec<Source>, candidates: impl IntoIterator<Item = Source>) -> usize {
    let mut urls: HashSet<String> = existing.iter().map(Source::url_key).collect();
    let mut added = 0;
    for candidate in candidates {
        if candidate.is_valid() && urls.insert(candidate.url_key()) {
            existing.push(candidate);
            added += 1;
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_registry_yields_seed() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SourceRegistry::new(dir.path().join("sources.json"));
        assert!(!registry.exists());
        assert_eq!(registry.load().await, default_sources());
    }

    #[tokio::test]
    async fn test_invalid_registry_yields_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.json");
        std::fs::write(&path, "{\"not\": \"a list\"}").unwrap();
        assert_eq!(SourceRegistry::new(&path).load().await, default_sources());
    }

    #[tokio::test]
    async fn test_persist_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SourceRegistry::new(dir.path().join("nested").join("sources.json"));
        let sources = vec![
            Source::new("IMF", "https://x/imf").with_collector("imf"),
            Source::new("BCRA", "https://x/bcra").with_country("ARG"),
        ];
        registry.persist(&sources).await.unwrap();
        assert_eq!(registry.load().await, sources);
    }

    #[tokio::test]
    async fn test_load_drops_incomplete_and_repeated_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.json");
        std::fs::write(
            &path,
            r#"[
                {"org":"IMF","url":"https://x/imf"},
                {"org":"","url":"https://x/blank"},
                {"url":"https://x/no-org"},
                {"org":"IMF again","url":"https://x/imf/"},
                "just a string"
            ]"#,
        )
        .unwrap();

        let sources = SourceRegistry::new(&path).load().await;
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].org, "IMF");
    }

    #[test]
    fn test_merge_dedups_by_url() {
        let mut existing = vec![Source::new("IMF", "https://x/imf")];
        let added = merge_sources(
            &mut existing,
            vec![
                Source::new("IMF dup", "https://x/imf/"),
                Source::new("New", "https://x/new"),
                Source::new("New twice", "https://x/new"),
            ],
        );
        assert_eq!(added, 1);
        assert_eq!(existing.len(), 2);
        assert_eq!(existing[1].org, "New");
    }
}
