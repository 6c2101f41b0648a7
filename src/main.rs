//! usecase-pipeline CLI: run a requirements document through the
//! five-stage use-case chain and print or save the result.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use usecase_pipeline::{AppConfig, Credentials, Dispatcher, Submission, Upload};

/// Turn functional requirements into use cases and a PlantUML diagram.
#[derive(Parser)]
#[command(name = "usecase-pipeline", version, long_about = None)]
struct Cli {
    /// CSV file of requirements (takes precedence over --text).
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Requirements pasted as free text.
    #[arg(long, value_name = "TEXT")]
    text: Option<String>,

    /// Backend to use: chatGPT, DeepSeek or Gemini.
    #[arg(short, long, default_value = "chatGPT", env = "USECASE_BACKEND")]
    backend: String,

    /// TOML configuration file.
    #[arg(short, long, value_name = "PATH", env = "USECASE_CONFIG")]
    config: Option<PathBuf>,

    /// Print the result envelope as JSON instead of a text report.
    #[arg(long)]
    json: bool,

    /// Also write the report to the suggested file name in the current directory.
    #[arg(long)]
    save: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Initialize tracing on stderr so stdout carries only the result.
fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match cli.verbose {
        0 => "usecase_pipeline=info",
        1 => "usecase_pipeline=debug",
        _ => "usecase_pipeline=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

fn build_submission(cli: &Cli) -> Result<Submission> {
    let mut submission = Submission::new();
    if let Some(path) = &cli.csv {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        submission = submission.with_upload(Upload::new(file_name, bytes));
    }
    if let Some(text) = &cli.text {
        submission = submission.with_text(text.as_str());
    }
    Ok(submission)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    // Input is normalized before any backend is constructed.
    let config = AppConfig::load(cli.config.as_deref())?;
    let text = build_submission(&cli)?.normalize_with_limit(config.max_input_bytes)?;

    let credentials = Credentials::from_env(&config);
    let dispatcher = Dispatcher::from_config(&config, &credentials)?;

    let envelope = dispatcher
        .dispatch(&cli.backend, &text)
        .await
        .with_context(|| format!("pipeline run on '{}' failed", cli.backend))?;

    let report = envelope.render_report();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else {
        print!("{}", report);
    }

    if cli.save {
        std::fs::write(&envelope.suggested_name, &report)
            .with_context(|| format!("failed to write {}", envelope.suggested_name))?;
        tracing::info!(path = %envelope.suggested_name, "saved report");
    }

    Ok(())
}
