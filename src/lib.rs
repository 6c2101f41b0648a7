//! # Use-Case Pipeline
//!
//! Turns a functional-requirements document into a requirements-engineering
//! artifact chain by running five dependent LLM prompts in sequence:
//!
//! 1. rewrite the requirements as IEEE 29148 system requirements
//! 2. derive use cases from actors and goals
//! 3. draw a PlantUML use-case diagram
//! 4. prune actor associations implied by `<<extend>>`/`<<include>>`
//! 5. reformat association and relationship arrows
//!
//! Each stage's prompt is a fixed instruction followed verbatim by the
//! previous stage's output, so the stages run strictly in order.
//!
//! ## Core Concepts
//!
//! - **[`Backend`]** — object-safe `complete(prompt) -> text` trait with
//!   OpenAI (Responses), DeepSeek (chat) and Gemini (generative content)
//!   implementations, plus [`MockBackend`] for tests.
//! - **[`Stage`]** — the five fixed stages and their instructions.
//! - **[`Pipeline`]** — the sequential runner producing a [`PipelineRun`].
//! - **[`Dispatcher`]** — resolves a backend identifier and runs the
//!   pipeline, returning a [`ResultEnvelope`].
//! - **[`Submission`]** — CSV upload or pasted text, normalized into
//!   [`RequirementsText`] before any backend is touched.
//!
//! ## Quick Start
//!
//! ```no_run
//! use usecase_pipeline::{AppConfig, Credentials, Dispatcher, Submission};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::default();
//!     let dispatcher = Dispatcher::from_config(&config, &Credentials::from_env(&config))?;
//!
//!     let submission = Submission::new().with_text("The system shall allow users to log in.");
//!     let envelope = dispatcher.submit("Gemini", &submission).await?;
//!     println!("{}", envelope.stage5);
//!     Ok(())
//! }
//! ```
//!
//! ## Testing without a provider
//!
//! ```
//! use usecase_pipeline::{MockBackend, Pipeline, RequirementsText};
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let backend = MockBackend::fixed("@startuml\n@enduml");
//! let run = rt
//!     .block_on(Pipeline::new().run(&backend, &RequirementsText::new("FR-1")))
//!     .unwrap();
//! assert_eq!(run.final_text(), "@startuml\n@enduml");
//! assert_eq!(backend.calls(), 5);
//! ```

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod input;
pub mod pipeline;
pub mod prompt;
pub mod stage;
pub mod types;

pub use backend::{
    Backend, BackendKind, DeepSeekBackend, GeminiBackend, MockBackend, OpenAiBackend,
    NO_TEXT_OUTPUT,
};
pub use config::{AppConfig, Credentials, ProviderConfig};
pub use dispatch::{Dispatcher, DispatcherBuilder};
pub use error::{PipelineError, Result};
pub use events::{Event, EventHandler, FnEventHandler};
pub use input::{Submission, Upload};
pub use pipeline::Pipeline;
pub use stage::Stage;
pub use types::{
    PipelineProgress, PipelineRun, RequirementsText, ResultEnvelope, StageOutput,
    SUGGESTED_FILE_NAME,
};
