//! Configuration loaded from environment variables.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

use crate::ai::BackoffPolicy;
use crate::ai::extractor::{DEFAULT_MAX_DOCUMENTS, DEFAULT_SNIPPET_CHARS};
use crate::error::ConfigError;
use crate::security::ModelCredentials;

/// Aggregate index file name inside the data root.
pub const INDEX_FILE_NAME: &str = "master_index.json";

/// Run status file name inside the data root.
pub const STATUS_FILE_NAME: &str = "status.json";

/// Default registry file name inside the data root.
pub const REGISTRY_FILE_NAME: &str = "sources.json";

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Root holding per-organization record directories, index and status
    pub data_dir: PathBuf,
    pub registry_path: PathBuf,
    /// `None` disables AI-assisted collection and discovery.
    pub credentials: Option<ModelCredentials>,
    pub snippet_chars: usize,
    pub max_documents: usize,
    pub fetch_timeout: Duration,
    pub ai_timeout: Duration,
    pub backoff: BackoffPolicy,
    pub discovery: DiscoveryConfig,
}

/// Source discovery settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub enabled: bool,
    /// Cap on sources added per discovery call
    pub max_new: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_new: 10,
        }
    }
}

impl CollectorConfig {
    /// Defaults rooted at `data_dir`, AI disabled.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            registry_path: data_dir.join(REGISTRY_FILE_NAME),
            data_dir,
            credentials: None,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
            max_documents: DEFAULT_MAX_DOCUMENTS,
            fetch_timeout: Duration::from_secs(20),
            ai_timeout: Duration::from_secs(50),
            backoff: BackoffPolicy::default(),
            discovery: DiscoveryConfig::default(),
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv();

        let data_dir = env::var("DOC_COLLECTOR_DATA_DIR").unwrap_or_else(|_| "data".to_string());
        let mut config = Self::new(data_dir);

        if let Ok(path) = env::var("DOC_COLLECTOR_REGISTRY") {
            config.registry_path = PathBuf::from(path);
        }

        config.credentials = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|key| {
                let mut creds = ModelCredentials::new(key);
                if let Ok(model) = env::var("GEMINI_MODEL") {
                    creds = creds.with_model(model);
                }
                if let Ok(base_url) = env::var("GEMINI_BASE_URL") {
                    creds = creds.with_base_url(base_url);
                }
                creds
            });

        config.snippet_chars = parse_var("DOC_COLLECTOR_SNIPPET_CHARS", config.snippet_chars)?;
        config.max_documents = parse_var("DOC_COLLECTOR_MAX_DOCUMENTS", config.max_documents)?;
        config.fetch_timeout = Duration::from_secs(parse_var(
            "DOC_COLLECTOR_FETCH_TIMEOUT_SECS",
            config.fetch_timeout.as_secs(),
        )?);
        config.ai_timeout = Duration::from_secs(parse_var(
            "DOC_COLLECTOR_AI_TIMEOUT_SECS",
            config.ai_timeout.as_secs(),
        )?);

        let attempts = parse_var("DOC_COLLECTOR_MAX_ATTEMPTS", config.backoff.max_attempts)?;
        let base_ms = parse_var(
            "DOC_COLLECTOR_BACKOFF_BASE_MS",
            config.backoff.base_delay.as_millis() as u64,
        )?;
        let jitter_ms = parse_var("DOC_COLLECTOR_BACKOFF_JITTER_MS", 0u64)?;
        config.backoff = BackoffPolicy::new(attempts, Duration::from_millis(base_ms))
            .with_jitter(Duration::from_millis(jitter_ms));

        config.discovery.enabled = parse_bool("DOC_COLLECTOR_DISCOVERY", false)?;
        config.discovery.max_new = parse_var("DOC_COLLECTOR_DISCOVERY_MAX", config.discovery.max_new)?;

        Ok(config)
    }

    /// Point at a different data root, moving the registry with it unless
    /// it was set explicitly elsewhere.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        if self.registry_path == self.data_dir.join(REGISTRY_FILE_NAME) {
            self.registry_path = data_dir.join(REGISTRY_FILE_NAME);
        }
        self.data_dir = data_dir;
        self
    }

    pub fn with_registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_path = path.into();
        self
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(INDEX_FILE_NAME)
    }

    pub fn status_path(&self) -> PathBuf {
        self.data_dir.join(STATUS_FILE_NAME)
    }

    /// File names inside the data root that are not document records.
    pub fn reserved_file_names(&self) -> Vec<String> {
        let mut names = vec![INDEX_FILE_NAME.to_string(), STATUS_FILE_NAME.to_string()];
        if let Some(name) = registry_name_within(&self.data_dir, &self.registry_path) {
            names.push(name);
        }
        names
    }
}

fn registry_name_within(data_dir: &Path, registry: &Path) -> Option<String> {
    registry
        .starts_with(data_dir)
        .then(|| registry.file_name())
        .flatten()
        .map(|n| n.to_string_lossy().to_string())
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(key: &str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key: key.to_string(),
                value,
            }),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CollectorConfig::new("data");
        assert_eq!(config.registry_path, PathBuf::from("data/sources.json"));
        assert_eq!(config.index_path(), PathBuf::from("data/master_index.json"));
        assert_eq!(config.snippet_chars, 4000);
        assert_eq!(config.backoff.max_attempts, 5);
        assert!(config.credentials.is_none());
        assert!(!config.discovery.enabled);
    }

    #[test]
    fn test_with_data_dir_moves_default_registry() {
        let config = CollectorConfig::new("data").with_data_dir("/tmp/run");
        assert_eq!(config.registry_path, PathBuf::from("/tmp/run/sources.json"));

        let config = CollectorConfig::new("data")
            .with_registry_path("/etc/sources.json")
            .with_data_dir("/tmp/run");
        assert_eq!(config.registry_path, PathBuf::from("/etc/sources.json"));
    }

    #[test]
    fn test_reserved_names_include_registry_inside_data_root() {
        let config = CollectorConfig::new("data");
        let names = config.reserved_file_names();
        assert!(names.contains(&"master_index.json".to_string()));
        assert!(names.contains(&"status.json".to_string()));
        assert!(names.contains(&"sources.json".to_string()));

        let config = config.with_registry_path("/etc/registry.json");
        assert_eq!(config.reserved_file_names().len(), 2);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        // Unique key so parallel tests don't interfere
        let key = "DOC_COLLECTOR_TEST_PARSE_GARBAGE";
        env::set_var(key, "lots");
        let err = parse_var::<usize>(key, 1).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        env::remove_var(key);
        assert_eq!(parse_var::<usize>(key, 7).unwrap(), 7);
    }
}
