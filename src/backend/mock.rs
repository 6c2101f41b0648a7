//! Mock backend for testing without a live LLM.
//!
//! [`MockBackend`] returns pre-configured responses in order (or computes
//! them with a closure), counts calls, records every prompt it receives,
//! and can be told to fail on a given call.
//!
//! # Example
//!
//! ```
//! use usecase_pipeline::backend::MockBackend;
//!
//! let mock = MockBackend::fixed("Hello, world!").with_name("ChatGPT");
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::Backend;
use crate::error::Result;
use crate::PipelineError;

type ResponderFn = dyn Fn(usize, &str) -> Result<String> + Send + Sync;

enum Responder {
    Canned(Vec<String>),
    Func(Box<ResponderFn>),
}

/// A test backend with deterministic responses.
///
/// Calls are numbered from 1. Canned responses cycle back to the
/// beginning when exhausted.
pub struct MockBackend {
    name: &'static str,
    responder: Responder,
    fail_on: Option<usize>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("name", &self.name)
            .field("fail_on", &self.fail_on)
            .field("calls", &self.calls())
            .finish()
    }
}

impl MockBackend {
    /// Create a mock backend with the given canned responses.
    pub fn new(responses: Vec<String>) -> Self {
        assert!(!responses.is_empty(), "MockBackend requires at least one response");
        Self::with_responder(Responder::Canned(responses))
    }

    /// Create a mock that always returns the same response.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Create a mock that computes each response from `(call_number, prompt)`.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(usize, &str) -> Result<String> + Send + Sync + 'static,
    {
        Self::with_responder(Responder::Func(Box::new(f)))
    }

    fn with_responder(responder: Responder) -> Self {
        Self {
            name: "mock",
            responder,
            fail_on: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Report `name` as the provider display name.
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Fail the given 1-based call with an HTTP 500.
    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on = Some(call);
        self
    }

    /// Number of `complete` calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        if self.fail_on == Some(call) {
            return Err(PipelineError::HttpError {
                status: 500,
                body: format!("mock failure on call {}", call),
                retry_after: None,
            });
        }

        match &self.responder {
            Responder::Canned(responses) => Ok(responses[(call - 1) % responses.len()].clone()),
            Responder::Func(f) => f(call, prompt),
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fixed_response() {
        let mock = MockBackend::fixed("Hello!");
        let resp = mock.complete("test").await.unwrap();
        assert_eq!(resp, "Hello!");
        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.name(), "mock");
    }

    #[tokio::test]
    async fn test_mock_cycles_responses() {
        let mock = MockBackend::new(vec!["first".into(), "second".into()]);
        let r1 = mock.complete("a").await.unwrap();
        let r2 = mock.complete("b").await.unwrap();
        let r3 = mock.complete("c").await.unwrap();
        assert_eq!(r1, "first");
        assert_eq!(r2, "second");
        assert_eq!(r3, "first"); // cycles
        assert_eq!(mock.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_mock_from_fn() {
        let mock = MockBackend::from_fn(|call, prompt| Ok(format!("{call}:{prompt}")));
        assert_eq!(mock.complete("x").await.unwrap(), "1:x");
        assert_eq!(mock.complete("y").await.unwrap(), "2:y");
    }

    #[tokio::test]
    async fn test_mock_failing_on_call() {
        let mock = MockBackend::fixed("ok").with_name("Gemini").failing_on(2);
        assert!(mock.complete("a").await.is_ok());
        let err = mock.complete("b").await.unwrap_err();
        assert!(matches!(err, PipelineError::HttpError { status: 500, .. }));
        assert!(mock.complete("c").await.is_ok());
        assert_eq!(mock.calls(), 3);
        assert_eq!(mock.name(), "Gemini");
    }
}
