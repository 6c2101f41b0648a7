//! Backend for the OpenAI Responses API.
//!
//! Endpoint: `/v1/responses` (synchronous request/response, no streaming).
//! The prompt is sent as a single user message in `input`.

use super::{normalize_base_url, redact, send_json, Backend, NO_TEXT_OUTPUT};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-5";

/// Backend for OpenAI's Responses API.
///
/// # Example
///
/// ```
/// use usecase_pipeline::backend::OpenAiBackend;
///
/// let backend = OpenAiBackend::new(reqwest::Client::new(), "sk-...")
///     .with_model("gpt-5-mini");
/// ```
#[derive(Clone)]
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiBackend {
    /// Create a backend that authenticates with `api_key`.
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Override the API host (e.g. a proxy or a test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(&base_url.into());
        self
    }

    /// Override the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "input": [{"role": "user", "content": prompt}],
        })
    }
}

/// Locate the completion text in a Responses API payload.
///
/// Prefers the aggregated `output_text` field when it is a non-empty
/// string. Otherwise takes the first output item that carries a `content`
/// array (reasoning items do not) and reads `content[0].text`. Returns
/// `None` when neither shape is present.
fn extract_text(resp: &Value) -> Option<String> {
    if let Some(text) = resp
        .get("output_text")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
    {
        return Some(text.to_string());
    }

    resp.get("output")?
        .as_array()?
        .iter()
        .find_map(|item| item.get("content").and_then(Value::as_array))?
        .first()?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl Backend for OpenAiBackend {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/responses", self.base_url);
        tracing::debug!(
            %url,
            model = %self.model,
            prompt_len = prompt.len(),
            "sending OpenAI request"
        );

        let request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.build_body(prompt));
        let json_resp = send_json(request, &url).await?;

        Ok(extract_text(&json_resp).unwrap_or_else(|| {
            tracing::warn!(backend = self.name(), "no text in response, using placeholder");
            NO_TEXT_OUTPUT.to_string()
        }))
    }

    fn name(&self) -> &'static str {
        "ChatGPT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PipelineError;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_extract_prefers_output_text() {
        let resp = json!({
            "output_text": "direct",
            "output": [{"content": [{"type": "output_text", "text": "nested"}]}]
        });
        assert_eq!(extract_text(&resp).as_deref(), Some("direct"));
    }

    #[test]
    fn test_extract_falls_back_to_structured_content() {
        let resp = json!({
            "output": [{"type": "message", "content": [{"type": "output_text", "text": "nested"}]}]
        });
        assert_eq!(extract_text(&resp).as_deref(), Some("nested"));
    }

    #[test]
    fn test_extract_empty_output_text_falls_back() {
        let resp = json!({
            "output_text": "",
            "output": [{"content": [{"text": "nested"}]}]
        });
        assert_eq!(extract_text(&resp).as_deref(), Some("nested"));
    }

    #[test]
    fn test_extract_skips_reasoning_items() {
        let resp = json!({
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "content": [{"type": "output_text", "text": "answer"}]}
            ]
        });
        assert_eq!(extract_text(&resp).as_deref(), Some("answer"));
    }

    #[test]
    fn test_extract_malformed_shapes() {
        assert_eq!(extract_text(&json!({})), None);
        assert_eq!(extract_text(&json!({"output": []})), None);
        assert_eq!(extract_text(&json!({"output": [{"content": []}]})), None);
        assert_eq!(extract_text(&json!({"output": [{"content": [{"type": "refusal"}]}]})), None);
    }

    #[test]
    fn test_request_body() {
        let backend = OpenAiBackend::new(Client::new(), "sk-test");
        let body = backend.build_body("@startuml\nA --> B\n@enduml");
        assert_eq!(body["model"], "gpt-5");
        assert_eq!(body["input"][0]["role"], "user");
        assert_eq!(body["input"][0]["content"], "@startuml\nA --> B\n@enduml");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let backend = OpenAiBackend::new(Client::new(), "sk-1234567890abcdef");
        let debug_output = format!("{:?}", backend);
        assert!(!debug_output.contains("1234567890abcdef"));
        assert!(debug_output.contains("sk-123***"));
    }

    #[tokio::test]
    async fn test_complete_reads_structured_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/responses"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "gpt-5"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "resp_1",
                "output": [{
                    "type": "message",
                    "content": [{"type": "output_text", "text": "  FR-1 shall  "}]
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new(Client::new(), "sk-test").with_base_url(server.uri());
        let text = backend.complete("rewrite this").await.unwrap();
        // Not trimmed: only chat-style providers strip whitespace.
        assert_eq!(text, "  FR-1 shall  ");
    }

    #[tokio::test]
    async fn test_complete_returns_placeholder_for_unreadable_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/responses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output": []})))
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new(Client::new(), "sk-test").with_base_url(server.uri());
        assert_eq!(backend.complete("x").await.unwrap(), NO_TEXT_OUTPUT);
    }

    #[tokio::test]
    async fn test_complete_propagates_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/responses"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "12")
                    .set_body_string("quota exceeded"),
            )
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new(Client::new(), "sk-test").with_base_url(server.uri());
        match backend.complete("x").await {
            Err(PipelineError::HttpError {
                status,
                body,
                retry_after,
            }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "quota exceeded");
                assert_eq!(retry_after, Some(std::time::Duration::from_secs(12)));
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_connection_failure_is_error() {
        let backend =
            OpenAiBackend::new(Client::new(), "sk-test").with_base_url("http://127.0.0.1:9");
        assert!(backend.complete("x").await.is_err());
    }
}
