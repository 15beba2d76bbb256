//! Credential handling with secure memory.
//!
//! Uses the `secrecy` crate so the Gemini API key never ends up in logs.

use secrecy::{ExposeSecret, SecretString};

/// Default Gemini model used for extraction and discovery.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default Gemini REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// API key, model and endpoint for the generative extraction service.
///
/// `Debug` output redacts the key.
#[derive(Clone, Debug)]
pub struct ModelCredentials {
    api_key: SecretString,
    pub model: String,
    pub base_url: String,
}

impl ModelCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// The key, for the request header only.
    pub fn expose_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub fn has_key(&self) -> bool {
        !self.expose_key().trim().is_empty()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}
