//! Event system for run and stage lifecycle hooks.
//!
//! Provides an optional, non-intrusive way to observe pipeline execution.
//! The runner emits events when a run starts, as each stage starts and
//! finishes, and when the run ends. Implement [`EventHandler`] to feed a
//! progress UI or collect per-stage timings. Structured logging goes
//! through `tracing` independently of this hook.

use crate::stage::Stage;
use std::sync::Arc;

/// Events emitted during a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A run has started.
    RunStart {
        /// Display name of the backend.
        provider: &'static str,
        /// Length of the requirements text in bytes.
        input_len: usize,
    },
    /// A stage's completion call is about to be issued.
    StageStart {
        stage: Stage,
        /// Length of the assembled prompt in bytes.
        prompt_len: usize,
    },
    /// A stage's completion call has returned.
    StageEnd {
        stage: Stage,
        /// Whether the call succeeded.
        ok: bool,
        /// Length of the returned text (0 on failure).
        output_len: usize,
    },
    /// A run has finished, successfully or not.
    RunEnd {
        provider: &'static str,
        /// Whether all five stages completed.
        ok: bool,
    },
}

/// Handler for pipeline lifecycle events.
///
/// This is entirely optional -- runs work without an event handler.
///
/// # Example
///
/// ```
/// use usecase_pipeline::events::{Event, EventHandler};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: Event) {
///         match event {
///             Event::StageStart { stage, .. } => println!("[start] {}", stage),
///             Event::StageEnd { stage, ok, .. } => println!("[end] {} ok={}", stage, ok),
///             _ => {}
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    /// Called when the runner emits an event.
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// # Example
///
/// ```
/// use usecase_pipeline::events::{Event, FnEventHandler};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnEventHandler(|event: Event| {
///     if let Event::RunEnd { provider, ok } = event {
///         println!("{} finished ok={}", provider, ok);
///     }
/// }));
/// ```
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}
