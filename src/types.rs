use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// File name suggested to the caller for saving a run's results.
pub const SUGGESTED_FILE_NAME: &str = "csv-analysis.txt";

/// Normalized requirements text: the seed for the first stage.
///
/// Produced once by [`Submission::normalize`](crate::input::Submission::normalize)
/// (or directly from trusted text) and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequirementsText(String);

impl RequirementsText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RequirementsText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output from a single stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutput {
    /// Which stage produced this output.
    pub stage: Stage,

    /// The exact prompt sent to the backend.
    pub prompt: String,

    /// Completion text returned by the backend (possibly the placeholder).
    pub text: String,
}

/// A completed five-stage run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Display name of the backend that produced every stage.
    pub provider: String,

    /// Stage outputs in execution order.
    pub stages: [StageOutput; Stage::COUNT],
}

impl PipelineRun {
    /// Output of the given stage.
    pub fn output(&self, stage: Stage) -> &StageOutput {
        &self.stages[stage.number() - 1]
    }

    /// Text of the last stage.
    pub fn final_text(&self) -> &str {
        &self.stages[Stage::COUNT - 1].text
    }

    /// Flatten into the caller-facing envelope, dropping the prompts.
    pub fn into_envelope(self) -> ResultEnvelope {
        let [stage1, stage2, stage3, stage4, stage5] = self.stages;
        ResultEnvelope {
            provider: self.provider,
            stage1: stage1.text,
            stage2: stage2.text,
            stage3: stage3.text,
            stage4: stage4.text,
            stage5: stage5.text,
            suggested_name: SUGGESTED_FILE_NAME.to_string(),
        }
    }
}

/// The sole externally visible artifact of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub provider: String,
    pub stage1: String,
    pub stage2: String,
    pub stage3: String,
    pub stage4: String,
    pub stage5: String,
    pub suggested_name: String,
}

impl ResultEnvelope {
    /// Stage texts in order.
    pub fn stages(&self) -> [&str; Stage::COUNT] {
        [
            &self.stage1,
            &self.stage2,
            &self.stage3,
            &self.stage4,
            &self.stage5,
        ]
    }

    /// Render a plain-text report with one titled section per stage.
    pub fn render_report(&self) -> String {
        let mut out = format!("Provider: {}\n", self.provider);
        for (stage, text) in Stage::ALL.iter().zip(self.stages()) {
            out.push_str(&format!(
                "\n== Stage {}: {} ==\n{}\n",
                stage.number(),
                stage.title(),
                text
            ));
        }
        out
    }
}

/// Progress update emitted at the start of each stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineProgress {
    /// Stage about to run.
    pub stage: Stage,

    /// Total number of stages in the run.
    pub total_stages: usize,

    /// Display name of the backend in use.
    pub provider: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run() -> PipelineRun {
        let stages = Stage::ALL.map(|stage| StageOutput {
            stage,
            prompt: format!("p{}", stage.number()),
            text: format!("t{}", stage.number()),
        });
        PipelineRun {
            provider: "DeepSeek".into(),
            stages,
        }
    }

    #[test]
    fn test_into_envelope_keeps_order() {
        let env = run().into_envelope();
        assert_eq!(env.provider, "DeepSeek");
        assert_eq!(env.stages(), ["t1", "t2", "t3", "t4", "t5"]);
        assert_eq!(env.suggested_name, SUGGESTED_FILE_NAME);
    }

    #[test]
    fn test_run_accessors() {
        let run = run();
        assert_eq!(run.output(Stage::Diagram).text, "t3");
        assert_eq!(run.final_text(), "t5");
    }

    #[test]
    fn test_render_report_sections() {
        let report = run().into_envelope().render_report();
        assert!(report.starts_with("Provider: DeepSeek\n"));
        assert!(report.contains("== Stage 1: System requirements ==\nt1\n"));
        assert!(report.contains("== Stage 5: Reformatted relationships ==\nt5\n"));
        let first = report.find("Stage 1").unwrap();
        let last = report.find("Stage 5").unwrap();
        assert!(first < last);
    }

    #[test]
    fn test_envelope_json_field_names() {
        let value = serde_json::to_value(run().into_envelope()).unwrap();
        assert_eq!(value["stage3"], "t3");
        assert_eq!(value["suggested_name"], "csv-analysis.txt");
    }

    #[test]
    fn test_requirements_text_serializes_transparently() {
        let text = RequirementsText::new("FR-1");
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"FR-1\"");
        assert_eq!(text.len(), 4);
        assert!(!text.is_empty());
    }
}
