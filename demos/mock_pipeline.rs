//! Example: running the five-stage chain through a Dispatcher backed by
//! MockBackend, without a live LLM.
//!
//! Run with: `cargo run --example mock_pipeline`

use std::sync::Arc;

use usecase_pipeline::{
    BackendKind, Dispatcher, Event, FnEventHandler, MockBackend, Pipeline, Stage, Submission,
    Upload,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A stub that tags each stage's context so the chaining is visible
    let mock = MockBackend::from_fn(|call, prompt| {
        let context = Stage::from_number(call)
            .and_then(|stage| prompt.strip_prefix(stage.instruction()))
            .unwrap_or(prompt);
        Ok(format!("STAGE{call}:{context}"))
    })
    .with_name("DeepSeek");

    // Print a line as each stage starts and ends
    let pipeline = Pipeline::new().with_event_handler(Arc::new(FnEventHandler(|event: Event| {
        match event {
            Event::StageStart { stage, prompt_len } => {
                println!("[start] {} ({} bytes)", stage, prompt_len)
            }
            Event::StageEnd { stage, ok, .. } => println!("[end]   {} ok={}", stage, ok),
            _ => {}
        }
    })));

    let dispatcher = Dispatcher::builder()
        .backend(BackendKind::DeepSeek, Arc::new(mock))
        .pipeline(pipeline)
        .build();

    // A CSV upload takes precedence over pasted text
    let csv = "id,requirement\nFR-1,The system shall allow users to log in.\n";
    let submission = Submission::new()
        .with_upload(Upload::new("requirements.csv", csv))
        .with_text("ignored");

    let envelope = dispatcher.submit("DeepSeek", &submission).await?;
    println!();
    print!("{}", envelope.render_report());
    println!("\nSuggested file name: {}", envelope.suggested_name);

    Ok(())
}
