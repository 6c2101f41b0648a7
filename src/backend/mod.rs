//! Backend trait and the provider identifiers the dispatcher accepts.
//!
//! The [`Backend`] trait hides each provider's request and response shape
//! behind a single text-in/text-out call. Built-in implementations:
//! [`OpenAiBackend`], [`DeepSeekBackend`], [`GeminiBackend`], plus
//! [`MockBackend`] for tests.
//!
//! ## Architecture
//!
//! ```text
//! Pipeline ──► prompt ──► Backend::complete() ──► text
//!                               │
//!          ┌────────────────────┼─────────────────────┐
//!    OpenAiBackend        DeepSeekBackend        GeminiBackend
//!    /v1/responses        /chat/completions      /v1beta/models/{m}:generateContent
//!    output_text or       choices[0].message     candidates[0].content.parts
//!    output[..].content   (trimmed)
//! ```
//!
//! Extraction is per provider. The Responses and generative-content
//! adapters fall back to [`NO_TEXT_OUTPUT`] when a successful response
//! carries no readable text; the chat adapter treats that as an error.
//! Transport and HTTP status failures always propagate.

pub mod deepseek;
pub mod gemini;
pub mod mock;
pub mod openai;

pub use deepseek::DeepSeekBackend;
pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use openai::OpenAiBackend;

use crate::error::Result;
use crate::PipelineError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Text returned in place of a completion whose text could not be located.
pub const NO_TEXT_OUTPUT: &str = "(No text output returned)";

/// Abstraction over LLM providers.
///
/// Implementors submit a fully assembled prompt and return the provider's
/// completion text. No implementation retries internally.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Submit `prompt` and return the completion text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Provider display name, reported in envelopes, errors and logs.
    fn name(&self) -> &'static str;
}

/// The backends a caller may request by identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// OpenAI Responses API.
    ChatGpt,
    /// DeepSeek chat completions.
    DeepSeek,
    /// Google Gemini generative content.
    Gemini,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [
        BackendKind::ChatGpt,
        BackendKind::DeepSeek,
        BackendKind::Gemini,
    ];

    /// Identifier accepted by [`FromStr`] and sent by front ends.
    pub fn id(self) -> &'static str {
        match self {
            BackendKind::ChatGpt => "chatGPT",
            BackendKind::DeepSeek => "DeepSeek",
            BackendKind::Gemini => "Gemini",
        }
    }

    /// Provider display name.
    pub fn display_name(self) -> &'static str {
        match self {
            BackendKind::ChatGpt => "ChatGPT",
            BackendKind::DeepSeek => "DeepSeek",
            BackendKind::Gemini => "Gemini",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for BackendKind {
    type Err = PipelineError;

    /// Case-insensitive; unknown identifiers are never mapped to a default.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PipelineError::UnsupportedBackend(s.to_string()))
    }
}

/// Strip trailing slashes so backends can append their own paths.
pub(crate) fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Parse a `Retry-After` header value as seconds.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Send a prepared JSON request and decode the JSON response body.
///
/// Non-success statuses become [`PipelineError::HttpError`] carrying the
/// body text and any `Retry-After` hint.
pub(crate) async fn send_json(request: reqwest::RequestBuilder, url: &str) -> Result<Value> {
    let resp = request.send().await.map_err(|e| {
        PipelineError::Other(format!("Failed to connect to LLM at {}: {}", url, e))
    })?;

    let status = resp.status().as_u16();

    if !resp.status().is_success() {
        let retry_after = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let text = resp.text().await.unwrap_or_default();
        return Err(PipelineError::HttpError {
            status,
            body: text,
            retry_after,
        });
    }

    let json_resp: Value = resp.json().await?;
    Ok(json_resp)
}

/// Mask a credential for `Debug` output, keeping a short prefix.
pub(crate) fn redact(key: &str) -> String {
    if key.len() > 6 && key.is_char_boundary(6) {
        format!("{}***", &key[..6])
    } else {
        "***".to_string()
    }
}
