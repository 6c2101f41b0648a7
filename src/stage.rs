use crate::prompt;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five fixed transformation steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Rewrite the requirements as professional system requirements.
    Rewrite,
    /// Derive use cases from actors and their goals.
    UseCases,
    /// Produce a PlantUML use-case diagram.
    Diagram,
    /// Remove actor associations made redundant by extend/include.
    PruneAssociations,
    /// Reformat association and relationship arrows.
    ReformatArrows,
}

impl Stage {
    /// Number of stages in a run.
    pub const COUNT: usize = 5;

    /// All stages in execution order.
    pub const ALL: [Stage; Stage::COUNT] = [
        Stage::Rewrite,
        Stage::UseCases,
        Stage::Diagram,
        Stage::PruneAssociations,
        Stage::ReformatArrows,
    ];

    /// 1-based position in the chain.
    pub fn number(self) -> usize {
        match self {
            Stage::Rewrite => 1,
            Stage::UseCases => 2,
            Stage::Diagram => 3,
            Stage::PruneAssociations => 4,
            Stage::ReformatArrows => 5,
        }
    }

    /// Look a stage up by its 1-based number.
    pub fn from_number(number: usize) -> Option<Stage> {
        number
            .checked_sub(1)
            .and_then(|idx| Stage::ALL.get(idx).copied())
    }

    /// Short name for logging and events.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Rewrite => "rewrite",
            Stage::UseCases => "use-cases",
            Stage::Diagram => "diagram",
            Stage::PruneAssociations => "prune-associations",
            Stage::ReformatArrows => "reformat-arrows",
        }
    }

    /// Human-readable title used in rendered reports.
    pub fn title(self) -> &'static str {
        match self {
            Stage::Rewrite => "System requirements",
            Stage::UseCases => "Use cases",
            Stage::Diagram => "PlantUML use case diagram",
            Stage::PruneAssociations => "Pruned actor associations",
            Stage::ReformatArrows => "Reformatted relationships",
        }
    }

    /// The fixed instruction text this stage prepends to its context.
    pub fn instruction(self) -> &'static str {
        match self {
            Stage::Rewrite => prompt::REWRITE_SRS,
            Stage::UseCases => prompt::DERIVE_USE_CASES,
            Stage::Diagram => prompt::GENERATE_PLANTUML,
            Stage::PruneAssociations => prompt::PRUNE_ASSOCIATIONS,
            Stage::ReformatArrows => prompt::REFORMAT_ARROWS,
        }
    }

    /// Build this stage's prompt from the previous stage's output
    /// (or the requirements text, for the first stage).
    pub fn render_prompt(self, previous: &str) -> String {
        prompt::compose(self.instruction(), previous)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} ({})", self.number(), self.name())
    }
}
