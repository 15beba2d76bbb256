//! Registered collection targets.

use serde::{Deserialize, Serialize};

fn default_category() -> String {
    "Economic".to_string()
}

/// A registered organization/URL pair targeted for document collection.
///
/// Uniquely identified by `url` within the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub id: String,

    /// ISO-3 country code or a region code such as `INT`
    #[serde(default)]
    pub country: String,

    /// Organization short name; also names the record directory
    pub org: String,

    pub url: String,

    #[serde(default = "default_category")]
    pub category: String,

    /// Name of a built-in stable collector; `None` selects the AI collector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector: Option<String>,
}

impl Source {
    pub fn new(org: impl Into<String>, url: impl Into<String>) -> Self {
        let org = org.into();
        Self {
            id: slugify(&org),
            country: String::new(),
            org,
            url: url.into(),
            category: default_category(),
            collector: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_collector(mut self, collector: impl Into<String>) -> Self {
        self.collector = Some(collector.into());
        self
    }

    /// Registry entries need both `org` and `url`.
    pub fn is_valid(&self) -> bool {
        !self.org.trim().is_empty() && !self.url.trim().is_empty()
    }

    /// URL in the form used for de-duplication.
    pub fn url_key(&self) -> String {
        url_key(&self.url)
    }
}

/// Normalize a URL for equality checks (trimmed, no trailing slash).
pub fn url_key(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Lowercase ASCII slug, non-alphanumerics collapsed to `_`.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut last_underscore = false;
    for c in value.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_underscore = false;
        } else if !last_underscore && !slug.is_empty() {
            slug.push('_');
            last_underscore = true;
        }
    }
    slug.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_entry_deserializes_with_defaults() {
        let source: Source =
            serde_json::from_str(r#"{"org":"IMF","url":"https://x/imf"}"#).unwrap();
        assert_eq!(source.org, "IMF");
        assert_eq!(source.category, "Economic");
        assert!(source.collector.is_none());
        assert!(source.is_valid());
    }

    #[test]
    fn test_url_key_ignores_trailing_slash() {
        assert_eq!(url_key(" https://x/new/ "), "https://x/new");
        assert_eq!(url_key("https://x/new"), "https://x/new");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Bank of Japan"), "bank_of_japan");
        assert_eq!(slugify("e-Gov"), "e_gov");
        assert_eq!(slugify("  "), "");
    }
}
