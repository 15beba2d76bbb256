//! Document descriptors and persisted records.

use chrono::{DateTime, NaiveDate, Utc};
use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use super::source::{slugify, Source};

/// Sort key used for records without a date; sorts after every real date.
pub const MIN_DATE: &str = "0000-00-00";

/// An unvalidated, AI- or rule-extracted candidate document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    /// Curated identifier; derived from org + url when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, alias = "risk_level", skip_serializing_if = "Option::is_none")]
    pub status_level: Option<String>,
}

impl DocumentDescriptor {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_status_level(mut self, level: StatusLevel) -> Self {
        self.status_level = Some(level.as_str().to_string());
        self
    }

    /// A descriptor is usable only with a title and a url.
    pub fn is_usable(&self) -> bool {
        !self.title.trim().is_empty() && !self.url.trim().is_empty()
    }
}

/// Severity attached to a new record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum StatusLevel {
    Critical,
    Warning,
    #[default]
    Notice,
    Info,
}

impl StatusLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLevel::Critical => "Critical",
            StatusLevel::Warning => "Warning",
            StatusLevel::Notice => "Notice",
            StatusLevel::Info => "Info",
        }
    }

    /// Case-insensitive label parse; unknown labels become `Notice`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => StatusLevel::Critical,
            "warning" => StatusLevel::Warning,
            "info" => StatusLevel::Info,
            _ => StatusLevel::Notice,
        }
    }
}

/// A record as this version writes it (one shard file).
///
/// Write-only: shards already on disk are read back as [`StoredRecord`],
/// since older files use other shapes for dates and labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRecord {
    #[serde(rename = "id", skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,

    pub title: String,

    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_level: Option<StatusLevel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(rename = "org", skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<DateTime<Utc>>,
}

impl DocumentRecord {
    /// Normalize a descriptor collected from `source` at `collected_at`.
    pub fn from_descriptor(
        descriptor: &DocumentDescriptor,
        source: &Source,
        collected_at: DateTime<Utc>,
    ) -> Self {
        let doc_id = descriptor
            .id
            .as_deref()
            .map(sanitize_key)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| derive_doc_id(&source.org, &descriptor.url));

        let date = descriptor
            .date
            .as_deref()
            .and_then(normalize_date)
            .unwrap_or_else(|| collected_at.format("%Y-%m-%d").to_string());

        let status_level = descriptor
            .status_level
            .as_deref()
            .map(StatusLevel::from_label)
            .unwrap_or_default();

        Self {
            doc_id: Some(doc_id),
            title: descriptor.title.trim().to_string(),
            url: descriptor.url.trim().to_string(),
            date: Some(date),
            category: descriptor
                .category
                .clone()
                .or_else(|| Some(source.category.clone())),
            summary: descriptor.summary.clone(),
            status_level: Some(status_level),
            country: Some(source.country.clone()).filter(|c| !c.is_empty()),
            organization: Some(source.org.clone()),
            collected_at: Some(collected_at),
        }
    }
}

/// A record file as found on disk.
///
/// Any JSON object with a `title` key is a record. The object is kept
/// verbatim, so the index carries every field exactly as written, whatever
/// version wrote it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StoredRecord(Map<String, Value>);

impl StoredRecord {
    /// `None` unless `value` is an object with a `title` key.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) if map.contains_key("title") => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(Value::as_str)
    }

    pub fn url(&self) -> Option<&str> {
        self.0.get("url").and_then(Value::as_str)
    }

    /// Index ordering key: a string date as written, any other non-null
    /// date in its JSON form, otherwise [`MIN_DATE`].
    pub fn sort_key(&self) -> Cow<'_, str> {
        match self.0.get("date") {
            Some(Value::String(date)) => Cow::Borrowed(date.as_str()),
            None | Some(Value::Null) => Cow::Borrowed(MIN_DATE),
            Some(other) => Cow::Owned(other.to_string()),
        }
    }
}

impl From<&DocumentRecord> for StoredRecord {
    fn from(record: &DocumentRecord) -> Self {
        match serde_json::to_value(record) {
            Ok(Value::Object(map)) => Self(map),
            _ => Self(Map::new()),
        }
    }
}

/// Content-derived document id: stable for the same organization and URL.
pub fn derive_doc_id(org: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(org.trim().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.trim().as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    let prefix = slugify(org);
    if prefix.is_empty() {
        digest[..16].to_string()
    } else {
        format!("{}_{}", prefix, &digest[..16])
    }
}

/// Restrict a key to characters safe in a file name.
pub fn sanitize_key(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Normalize a date to `YYYY-MM-DD`; `None` if it can't be understood.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y/%m/%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).format("%Y-%m-%d").to_string());
    }
    None
}
