//! Fixed stage instructions and prompt composition.
//!
//! Every stage prompt is its instruction followed directly by the context
//! text. The context is appended as-is: no placeholder substitution, no
//! escaping, no trimming, so PlantUML or CSV fragments reach the model
//! byte-for-byte.

/// Stage 1: rewrite raw requirements as IEEE 29148 system requirements.
pub const REWRITE_SRS: &str = "You are a Software System Engineer using the IEEE 29148 SRS standard. \
Your task is to rewrite software functional requirements into a professional system requirement ";

/// Stage 2: extract actors and goals, then derive use cases.
pub const DERIVE_USE_CASES: &str = "You are a Software Systems Engineer who is given the following task: \
please extract actors from the functional requirements and describe their goals. \
Then convert their goals into use cases. Output only the use cases.";

/// Stage 3: relate the use cases and draw a PlantUML use-case diagram.
pub const GENERATE_PLANTUML: &str = "You are a Software Systems Engineer tasked with designing a UML use case diagram; \
given the following use cases, decide the appropriate relationships between them \
and then create a use case diagram using PlantUML notation.";

/// Stage 4: drop actor associations already implied by `<<extend>>`/`<<include>>`.
pub const PRUNE_ASSOCIATIONS: &str = "You are a Software Systems Engineer who is assigned the following: \
remove any actor-to-use case associations where the use case is already connected \
through an <<extend>> or <<include>> relationship.";

/// Stage 5: plain association lines, directed dotted extend/include arrows.
pub const REFORMAT_ARROWS: &str = "You are given three tasks. \
Your first task is to convert the actor use case association arrows into plain, non-directional lines. \
Your second task is to find any <<extend>> relationship and rewrite it using a dotted arrow \
with UP directional modifier using this format: X .up.> Y : <<extend>>. \
Then, your third task is find any <<include>> relationship and rewrite it using a dotted arrow \
with DOWN directional modifier using this format: X .down.> Y :<<include>>.";

/// Build a stage prompt: `instruction` immediately followed by `context`.
///
/// # Example
///
/// ```
/// use usecase_pipeline::prompt::compose;
///
/// assert_eq!(compose("Summarize: ", "a {b} c"), "Summarize: a {b} c");
/// ```
pub fn compose(instruction: &str, context: &str) -> String {
    let mut prompt = String::with_capacity(instruction.len() + context.len());
    prompt.push_str(instruction);
    prompt.push_str(context);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_appends_context_verbatim() {
        let context = "@startuml\nactor User\nUser --> (Log in)\n@enduml\n";
        let prompt = compose(PRUNE_ASSOCIATIONS, context);
        assert!(prompt.starts_with(PRUNE_ASSOCIATIONS));
        assert!(prompt.ends_with(context));
        assert_eq!(prompt.len(), PRUNE_ASSOCIATIONS.len() + context.len());
    }

    #[test]
    fn test_compose_keeps_braces_and_whitespace() {
        let context = "  {input} {{x}}  \n";
        assert_eq!(compose("I:", context), "I:  {input} {{x}}  \n");
    }

    #[test]
    fn test_compose_empty_context() {
        assert_eq!(compose(DERIVE_USE_CASES, ""), DERIVE_USE_CASES);
    }

    #[test]
    fn test_rewrite_instruction_separates_context() {
        assert!(REWRITE_SRS.ends_with(' '));
        assert!(REFORMAT_ARROWS.contains(".up.>"));
        assert!(REFORMAT_ARROWS.contains(".down.>"));
    }
}
