use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use newsroom_agents::config::NewsroomConfig;
use newsroom_agents::workflow::{Collaborators, WorkflowEngine};

#[derive(Parser)]
#[command(name = "newsroom-agents", about = "Run the daily editorial meeting")]
struct Cli {
    /// Per-source fetch limit.
    #[arg(long)]
    limit: Option<usize>,

    /// Compose the publish text but do not post it.
    #[arg(long)]
    dry_run: bool,

    /// Directory of persona Markdown files.
    #[arg(long)]
    personas_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = NewsroomConfig::default();
    if let Some(limit) = cli.limit {
        config.fetch_limit = limit;
    }
    if cli.dry_run {
        config.dry_run = true;
    }
    if let Some(dir) = cli.personas_dir {
        config.personas_dir = dir;
    }

    info!(
        model = %config.backend.model,
        limit = config.fetch_limit,
        dry_run = config.dry_run,
        "editorial meeting starting"
    );

    let collaborators = Collaborators::from_config(&config);
    let report = WorkflowEngine::new(config, collaborators).run().await?;

    info!("run complete");
    match report.final_article {
        Some(article) => {
            info!(title = %article.article.title, url = %article.article.url, "today's pick");
            if let Some(summary) = &report.summary {
                info!(recommendation = %summary, "recommendation");
            }
        }
        None => warn!(fetched = report.fetched, "run ended without a pick"),
    }
    if let Some(url) = &report.published_url {
        info!(url = %url, "published status");
    }
    if let Some(path) = &report.transcript_path {
        info!(path = %path.display(), "transcript saved");
    }

    Ok(())
}
