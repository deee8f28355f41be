//! Command-line entry point for the workspace exporter.

use clap::Parser;
use slack_export::observability::init_logging;
use slack_export::{ExportClient, ExportConfig, Exporter};
use std::path::PathBuf;
use tracing::error;

/// Export a complete Slack workspace: users, conversations, message
/// history with threads, and file attachments.
///
/// Tokens come from the environment: `SLACK_USER_TOKEN` (xoxp-*) and/or
/// `SLACK_BOT_TOKEN` (xoxb-*).
#[derive(Parser, Debug)]
#[command(name = "slack-export", version)]
struct Cli {
    /// Resume the most recent interrupted run instead of starting fresh
    #[arg(long)]
    resume: bool,

    /// Output directory; each run writes into a timestamped subdirectory
    #[arg(long, short = 'o', default_value = "./export")]
    output: PathBuf,

    /// Run as a Marketplace-approved app (larger history pages, shorter
    /// spacing between history calls)
    #[arg(long)]
    marketplace_app: bool,

    /// Retry attempts per error class before abandoning a conversation
    /// (0 = retry forever)
    #[arg(long, default_value_t = 0)]
    max_retries: u32,

    /// Write one messages.json per conversation instead of per-day files
    #[arg(long)]
    no_split: bool,

    /// Prefer the bot token over the user token
    #[arg(long)]
    use_bot_token: bool,
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        error!(%err, "Export failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ExportConfig::from_env()?;
    config.output_path = cli.output;
    config.marketplace_app = cli.marketplace_app;
    config.max_retry_attempts = cli.max_retries;
    config.split_by_day = !cli.no_split;
    config.use_user_token = !cli.use_bot_token;

    let client = ExportClient::new(config)?;
    let summary = Exporter::new(client).run(cli.resume).await?;

    if summary.failed > 0 {
        error!(
            failed = summary.failed,
            "Some conversations were not exported; run again with --resume to retry"
        );
        std::process::exit(2);
    }
    Ok(())
}
