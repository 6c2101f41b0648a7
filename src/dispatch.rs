//! Backend selection and run dispatch.
//!
//! [`Dispatcher`] maps a requested backend identifier to an injected
//! adapter and runs the pipeline against it. Adapters are registered
//! either ready-made or as factories that are invoked on first use and
//! cached for the lifetime of the dispatcher, so a backend whose
//! credential is missing only fails when it is actually requested.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::OnceCell;

use crate::backend::{Backend, BackendKind, DeepSeekBackend, GeminiBackend, OpenAiBackend};
use crate::config::{AppConfig, Credentials};
use crate::error::Result;
use crate::input::Submission;
use crate::pipeline::Pipeline;
use crate::types::{RequirementsText, ResultEnvelope};
use crate::PipelineError;

/// Constructor for a backend, called at most once per successful build.
pub type BackendFactory = Arc<dyn Fn() -> Result<Arc<dyn Backend>> + Send + Sync>;

/// A registered backend: either ready-made, or built by `factory` on first use.
struct Slot {
    factory: Option<BackendFactory>,
    instance: OnceCell<Arc<dyn Backend>>,
}

impl Slot {
    fn ready(backend: Arc<dyn Backend>) -> Self {
        Self {
            factory: None,
            instance: OnceCell::new_with(Some(backend)),
        }
    }

    fn lazy(factory: BackendFactory) -> Self {
        Self {
            factory: Some(factory),
            instance: OnceCell::new(),
        }
    }

    async fn get(&self, kind: BackendKind) -> Result<Arc<dyn Backend>> {
        self.instance
            .get_or_try_init(|| async {
                match &self.factory {
                    Some(factory) => factory(),
                    None => Err(PipelineError::Other(format!(
                        "no backend registered for {}",
                        kind.display_name()
                    ))),
                }
            })
            .await
            .map(Arc::clone)
    }
}

/// Selects a backend by identifier and runs the pipeline against it.
///
/// # Example
///
/// ```no_run
/// use usecase_pipeline::{AppConfig, Credentials, Dispatcher, Submission};
///
/// # async fn demo() -> usecase_pipeline::Result<()> {
/// let config = AppConfig::default();
/// let dispatcher = Dispatcher::from_config(&config, &Credentials::from_env(&config))?;
///
/// let submission = Submission::new().with_text("The system shall allow users to log in.");
/// let envelope = dispatcher.submit("DeepSeek", &submission).await?;
/// println!("{}", envelope.render_report());
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher {
    pipeline: Pipeline,
    slots: HashMap<BackendKind, Slot>,
    max_input_bytes: Option<usize>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.slots.keys().map(|k| k.id()).collect();
        kinds.sort_unstable();
        f.debug_struct("Dispatcher")
            .field("backends", &kinds)
            .field("max_input_bytes", &self.max_input_bytes)
            .finish()
    }
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Register all three providers from configuration.
    ///
    /// One HTTP client (carrying the configured timeout) is shared by every
    /// backend. Backends are built on first use; a missing credential is
    /// reported as [`PipelineError::MissingCredential`] at that point.
    pub fn from_config(config: &AppConfig, credentials: &Credentials) -> Result<Self> {
        let mut client = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            client = client.timeout(timeout);
        }
        let client = client.build().map_err(|e| {
            PipelineError::InvalidConfig(format!("failed to build HTTP client: {}", e))
        })?;

        let mut builder = Self::builder().max_input_bytes(config.max_input_bytes);
        for kind in BackendKind::ALL {
            let provider = config.provider(kind).clone();
            let key = credentials.get(kind).map(str::to_string);
            let client = client.clone();
            builder = builder.lazy(kind, move || {
                let key = key.clone().ok_or_else(|| PipelineError::MissingCredential {
                    backend: kind.display_name(),
                    env_var: provider.api_key_env.clone(),
                })?;
                tracing::debug!(
                    backend = kind.display_name(),
                    model = %provider.model,
                    "constructing backend"
                );
                let backend: Arc<dyn Backend> = match kind {
                    BackendKind::ChatGpt => Arc::new(
                        OpenAiBackend::new(client.clone(), key)
                            .with_base_url(provider.base_url.as_str())
                            .with_model(provider.model.as_str()),
                    ),
                    BackendKind::DeepSeek => Arc::new(
                        DeepSeekBackend::new(client.clone(), key)
                            .with_base_url(provider.base_url.as_str())
                            .with_model(provider.model.as_str()),
                    ),
                    BackendKind::Gemini => Arc::new(
                        GeminiBackend::new(client.clone(), key)
                            .with_base_url(provider.base_url.as_str())
                            .with_model(provider.model.as_str()),
                    ),
                };
                Ok(backend)
            });
        }
        Ok(builder.build())
    }

    /// Registered backend kinds, in a stable order.
    pub fn supported(&self) -> Vec<BackendKind> {
        BackendKind::ALL
            .into_iter()
            .filter(|kind| self.slots.contains_key(kind))
            .collect()
    }

    /// Resolve a backend, constructing it on first use.
    pub async fn backend(&self, kind: BackendKind) -> Result<Arc<dyn Backend>> {
        let slot = self
            .slots
            .get(&kind)
            .ok_or_else(|| PipelineError::UnsupportedBackend(kind.id().to_string()))?;
        slot.get(kind).await
    }

    /// Parse `backend_id`; unknown or unregistered identifiers are rejected.
    pub fn resolve_kind(&self, backend_id: &str) -> Result<BackendKind> {
        let kind: BackendKind = backend_id.parse()?;
        if self.slots.contains_key(&kind) {
            Ok(kind)
        } else {
            Err(PipelineError::UnsupportedBackend(backend_id.to_string()))
        }
    }

    /// Run the pipeline on already-normalized text with the requested backend.
    pub async fn dispatch(
        &self,
        backend_id: &str,
        text: &RequirementsText,
    ) -> Result<ResultEnvelope> {
        let kind = self.resolve_kind(backend_id).inspect_err(|_| {
            tracing::warn!(backend_id, "unsupported backend requested");
        })?;
        let backend = self.backend(kind).await?;
        let run = self.pipeline.run(backend.as_ref(), text).await?;
        Ok(run.into_envelope())
    }

    /// Normalize a raw submission, then dispatch it.
    ///
    /// Input presence is checked before the backend identifier is resolved
    /// or any backend is constructed.
    pub async fn submit(
        &self,
        backend_id: &str,
        submission: &Submission,
    ) -> Result<ResultEnvelope> {
        let text = submission.normalize_with_limit(self.max_input_bytes)?;
        self.dispatch(backend_id, &text).await
    }
}

/// Builder for [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    pipeline: Option<Pipeline>,
    slots: HashMap<BackendKind, Slot>,
    max_input_bytes: Option<usize>,
}

impl DispatcherBuilder {
    /// Register a ready-made backend.
    pub fn backend(mut self, kind: BackendKind, backend: Arc<dyn Backend>) -> Self {
        self.slots.insert(kind, Slot::ready(backend));
        self
    }

    /// Register a backend factory, invoked on first use.
    pub fn lazy<F>(mut self, kind: BackendKind, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Backend>> + Send + Sync + 'static,
    {
        self.slots.insert(kind, Slot::lazy(Arc::new(factory)));
        self
    }

    /// Use a configured pipeline (e.g. one with an event handler).
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn max_input_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_input_bytes = limit;
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            pipeline: self.pipeline.unwrap_or_default(),
            slots: self.slots,
            max_input_bytes: self.max_input_bytes,
        }
    }
}
