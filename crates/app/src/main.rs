use anyhow::{Context, Result};
use clap::Parser;
use research::DeepResearch;
use shared::agent_api::ConversationMessage;
use shared::settings::ResearchConfig;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod report;

/// Research a question with Gemini and verify every cited source.
#[derive(Parser, Debug)]
#[command(name = "deep-research", version, about, long_about = None)]
struct Cli {
    /// The research question
    question: String,

    /// Business context the model should use for "we/our/company"
    #[arg(long, conflicts_with = "context_file")]
    context: Option<String>,

    /// Read business context from a file
    #[arg(long)]
    context_file: Option<PathBuf>,

    /// Prior conversation as a JSON array of {"role", "content"} objects
    #[arg(long)]
    history: Option<PathBuf>,

    /// Print only the JSON result
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let website_context = match (&cli.context, &cli.context_file) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(path)) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read context file {}", path.display()))?,
        ),
        (None, None) => None,
    };
    let history = match &cli.history {
        Some(path) => load_history(path)?,
        None => Vec::new(),
    };

    let config = ResearchConfig::from_env()?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let runner = DeepResearch::new(&config)?.with_events(tx);

    let show_progress = !cli.json;
    let progress = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if show_progress {
                report::print_event(&event);
            }
        }
    });

    if !cli.json {
        println!("🔬 Running deep research with {}…", runner.model_id());
    }
    let start = Instant::now();
    let outcome = runner
        .run(&cli.question, website_context.as_deref(), &history)
        .await;

    // Dropping the orchestrator closes the channel so the printer drains and exits.
    drop(runner);
    let _ = progress.await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{}", report::format_error_message(&e.to_string()));
            std::process::exit(1);
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Completed in {:.1}s\n", start.elapsed().as_secs_f64());
        report::print_result(&result)?;
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_history(path: &Path) -> Result<Vec<ConversationMessage>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("History file {} is not a JSON array of messages", path.display()))
}
