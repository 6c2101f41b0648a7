//! Backend for DeepSeek's OpenAI-compatible chat API.
//!
//! Endpoint: `/chat/completions` (always chat mode, non-streaming).
//! Completion text is read from `choices[0].message.content` and trimmed.

use super::{normalize_base_url, redact, send_json, Backend};
use crate::error::Result;
use crate::PipelineError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
/// Default model.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Backend for DeepSeek chat completions.
///
/// Unlike the other adapters there is no placeholder fallback: a success
/// response without `choices[0].message.content` is a
/// [`PipelineError::MalformedResponse`].
///
/// # Example
///
/// ```
/// use usecase_pipeline::backend::DeepSeekBackend;
///
/// let backend = DeepSeekBackend::new(reqwest::Client::new(), "sk-...");
/// ```
#[derive(Clone)]
pub struct DeepSeekBackend {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for DeepSeekBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepSeekBackend")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl DeepSeekBackend {
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

    /// Build the request body for `/chat/completions`.
    fn build_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
        })
    }

    fn extract_text(&self, json_resp: &Value) -> Result<String> {
        json_resp
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| PipelineError::MalformedResponse {
                backend: self.name(),
                message: "missing choices[0].message.content".to_string(),
            })
    }
}

#[async_trait]
impl Backend for DeepSeekBackend {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(
            %url,
            model = %self.model,
            prompt_len = prompt.len(),
            "sending DeepSeek request"
        );

        let request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.build_body(prompt));
        let json_resp = send_json(request, &url).await?;

        self.extract_text(&json_resp)
    }

    fn name(&self) -> &'static str {
        "DeepSeek"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend() -> DeepSeekBackend {
        DeepSeekBackend::new(Client::new(), "sk-test")
    }

    #[test]
    fn test_chat_payload() {
        let body = backend().build_body("Why is the sky blue?");
        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["stream"], false);

        let messages = body["messages"].as_array().expect("messages");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "Why is the sky blue?");
    }

    #[test]
    fn test_extract_trims_content() {
        let resp = json!({
            "choices": [{"message": {"role": "assistant", "content": "\n  UC-1 Log in \n"}}]
        });
        assert_eq!(backend().extract_text(&resp).unwrap(), "UC-1 Log in");
    }

    #[test]
    fn test_extract_null_content_is_malformed() {
        let resp = json!({"choices": [{"message": {"role": "assistant", "content": null}}]});
        match backend().extract_text(&resp) {
            Err(PipelineError::MalformedResponse { backend, .. }) => {
                assert_eq!(backend, "DeepSeek")
            }
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_no_choices_is_malformed() {
        assert!(backend().extract_text(&json!({"choices": []})).is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let backend = DeepSeekBackend::new(Client::new(), "sk-1234567890abcdef");
        let debug_output = format!("{:?}", backend);
        assert!(!debug_output.contains("1234567890abcdef"));
        assert!(debug_output.contains("***"));
    }

    #[tokio::test]
    async fn test_complete_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "deepseek-chat"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": " @startuml\n@enduml \n"}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = backend()
            .with_base_url(format!("{}/", server.uri()))
            .complete("draw it")
            .await
            .unwrap();
        assert_eq!(text, "@startuml\n@enduml");
    }

    #[tokio::test]
    async fn test_complete_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = backend()
            .with_base_url(server.uri())
            .complete("x")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::HttpError { status: 401, .. }));
    }
}
