//! Gemini implementation of the `TextModel` trait.
//!
//! Calls `POST {base}/models/{model}:generateContent` and returns the text of
//! the first candidate. HTTP 429 is reported as `AiError::QuotaExhausted`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AiError, AiResult};
use crate::security::ModelCredentials;
use crate::traits::ai::{ModelRequest, TextModel};

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiModel {
    client: Client,
    credentials: ModelCredentials,
}

impl GeminiModel {
    pub fn new(credentials: ModelCredentials, timeout: Duration) -> AiResult<Self> {
        if !credentials.has_key() {
            return Err(AiError::NotConfigured("GEMINI_API_KEY is empty".into()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AiError::NotConfigured(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            credentials,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.credentials.base_url, self.credentials.model
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: Content<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl TextModel for GeminiModel {
    fn name(&self) -> &str {
        &self.credentials.model
    }

    async fn generate(&self, request: &ModelRequest) -> AiResult<String> {
        // The search tool cannot be combined with a JSON response mime type.
        let (tools, mime) = if request.web_search {
            (vec![serde_json::json!({ "google_search": {} })], None)
        } else {
            (Vec::new(), Some("application/json"))
        };

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            system_instruction: Content {
                parts: vec![Part {
                    text: &request.system,
                }],
            },
            tools,
            generation_config: GenerationConfig {
                response_mime_type: mime,
            },
        };

        debug!(model = %self.credentials.model, prompt_len = request.prompt.len(), "Gemini request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.credentials.expose_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Transient(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::QuotaExhausted);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AiError::Transient(format!(
                "status {}: {}",
                status.as_u16(),
                text.chars().take(200).collect::<String>()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AiError::Malformed(e.to_string()))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
            .ok_or_else(|| AiError::Malformed("no candidate text in response".into()))
    }
}

/// Stand-in used when no credentials are configured.
#[derive(Debug, Clone, Default)]
pub struct DisabledModel {
    reason: String,
}

impl DisabledModel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TextModel for DisabledModel {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _request: &ModelRequest) -> AiResult<String> {
        Err(AiError::NotConfigured(self.reason.clone()))
    }
}
