use crate::{
    backend::Backend,
    error::Result,
    events::{emit, Event, EventHandler},
    stage::Stage,
    types::{PipelineProgress, PipelineRun, RequirementsText, StageOutput},
    PipelineError,
};
use std::sync::Arc;

/// Runner for the five-stage requirements chain.
///
/// Each stage's prompt is its fixed instruction followed by the previous
/// stage's output (the requirements text for stage 1). Stages run strictly
/// in order against a single backend; the first failed call aborts the run.
///
/// A `Pipeline` holds no per-run state, so one instance can serve
/// concurrent runs.
#[derive(Default, Clone)]
pub struct Pipeline {
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field(
                "stages",
                &Stage::ALL.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a handler for run and stage lifecycle events.
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// The stages this pipeline executes, in order.
    pub fn stages(&self) -> &'static [Stage] {
        &Stage::ALL
    }

    /// Execute all five stages against `backend`.
    pub async fn run(
        &self,
        backend: &dyn Backend,
        input: &RequirementsText,
    ) -> Result<PipelineRun> {
        self.run_with_progress(backend, input, |_| {}).await
    }

    /// Execute all five stages with a progress callback.
    ///
    /// The callback is invoked at the start of each stage, before its
    /// completion call is issued.
    pub async fn run_with_progress<F>(
        &self,
        backend: &dyn Backend,
        input: &RequirementsText,
        mut on_progress: F,
    ) -> Result<PipelineRun>
    where
        F: FnMut(PipelineProgress),
    {
        let provider = backend.name();
        tracing::info!(backend = provider, input_len = input.len(), "starting pipeline run");
        emit(
            &self.event_handler,
            Event::RunStart {
                provider,
                input_len: input.len(),
            },
        );

        let mut outputs: Vec<StageOutput> = Vec::with_capacity(Stage::COUNT);

        for stage in Stage::ALL {
            let previous = outputs.last().map_or(input.as_str(), |o| o.text.as_str());
            let prompt = stage.render_prompt(previous);

            on_progress(PipelineProgress {
                stage,
                total_stages: Stage::COUNT,
                provider: provider.to_string(),
            });
            emit(
                &self.event_handler,
                Event::StageStart {
                    stage,
                    prompt_len: prompt.len(),
                },
            );
            tracing::debug!(
                backend = provider,
                stage = stage.number(),
                prompt_len = prompt.len(),
                "issuing stage call"
            );

            let text = match backend.complete(&prompt).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(
                        backend = provider,
                        stage = stage.number(),
                        error = %e,
                        "stage failed, aborting run"
                    );
                    emit(
                        &self.event_handler,
                        Event::StageEnd {
                            stage,
                            ok: false,
                            output_len: 0,
                        },
                    );
                    emit(&self.event_handler, Event::RunEnd { provider, ok: false });
                    return Err(PipelineError::StageFailed {
                        stage: stage.number(),
                        stage_name: stage.name(),
                        backend: provider,
                        source: Box::new(e),
                    });
                }
            };

            tracing::info!(
                backend = provider,
                stage = stage.number(),
                output_len = text.len(),
                "stage complete"
            );
            emit(
                &self.event_handler,
                Event::StageEnd {
                    stage,
                    ok: true,
                    output_len: text.len(),
                },
            );
            outputs.push(StageOutput {
                stage,
                prompt,
                text,
            });
        }

        let stages: [StageOutput; Stage::COUNT] = outputs
            .try_into()
            .map_err(|_| {
                PipelineError::Other("Pipeline run produced the wrong number of stages".to_string())
            })?;

        emit(&self.event_handler, Event::RunEnd { provider, ok: true });
        tracing::info!(backend = provider, "pipeline run complete");

        Ok(PipelineRun {
            provider: provider.to_string(),
            stages,
        })
    }
}
