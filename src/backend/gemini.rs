//! Backend for Google's Gemini generative-content API.
//!
//! Endpoint: `/v1beta/models/{model}:generateContent`, authenticated with
//! the `x-goog-api-key` header. The prompt is a single user text part.

use super::{normalize_base_url, redact, send_json, Backend, NO_TEXT_OUTPUT};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Backend for Gemini `generateContent`.
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiBackend {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(&base_url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_body(prompt: &str) -> Value {
        json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
        })
    }
}

/// Concatenate the text parts of the first candidate, skipping thought parts.
///
/// `None` when there is no candidate or no part carries text.
fn extract_text(resp: &Value) -> Option<String> {
    let parts = resp
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let texts: Vec<&str> = parts
        .iter()
        .filter(|p| !p.get("thought").and_then(Value::as_bool).unwrap_or(false))
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.concat())
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint();
        tracing::debug!(%url, prompt_len = prompt.len(), "sending Gemini request");

        let request = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_body(prompt));
        let json_resp = send_json(request, &url).await?;

        Ok(extract_text(&json_resp).unwrap_or_else(|| {
            let finish_reason = json_resp
                .pointer("/candidates/0/finishReason")
                .and_then(Value::as_str)
                .unwrap_or("none");
            tracing::warn!(
                backend = self.name(),
                finish_reason,
                "no text in response, using placeholder"
            );
            NO_TEXT_OUTPUT.to_string()
        }))
    }

    fn name(&self) -> &'static str {
        "Gemini"
    }
}
