//! legalchat-status - one-shot backend status report
//!
//! Queries the assistant backend's health, service status, knowledge stats
//! and agent catalog, prints a summary and exits. Exits non-zero when the
//! backend cannot be reached.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use legalchat_core::{AgentType, BackendClient, Config, ServiceStatus};

#[derive(Parser)]
#[command(name = "legalchat-status")]
#[command(about = "Show legal assistant backend status")]
#[command(version)]
struct Args {
    /// Backend base URL (overrides backend.api_url)
    #[arg(long)]
    api_url: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also list the agents the backend exposes
    #[arg(short, long)]
    agents: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::load().context("failed to load configuration")?,
    };
    if let Some(api_url) = &args.api_url {
        config.backend.api_url = api_url.clone();
    }
    config.validate().context("invalid configuration")?;

    let _log_guard =
        legalchat_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let client = BackendClient::new(&config.backend).context("failed to create HTTP client")?;
    println!("Backend: {}", client.base_url());

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("invalid progress template")?,
    );
    pb.set_message("querying backend...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let (health, aws, stats, agents) = runtime.block_on(async {
        tokio::join!(
            client.health(),
            client.aws_status(),
            client.knowledge_stats(),
            client.agents()
        )
    });

    pb.finish_and_clear();

    let health = health.context("backend health check failed")?;
    tracing::info!(status = health.status.label(), "Backend health checked");

    println!("Health: {}", health.status.label());
    for (service, status) in &health.services {
        println!("  - {}: {}", service, status_marker(status));
    }

    match aws {
        Ok(aws) => {
            println!("Services:");
            println!("  - bedrock: {}", status_marker(&aws.bedrock));
            println!("  - opensearch: {}", status_marker(&aws.opensearch));
            println!("  - documentdb: {}", status_marker(&aws.documentdb));
            if let Some(llm) = &aws.llm {
                println!("  LLM: {}", llm);
            }
            if let Some(embeddings) = &aws.embeddings {
                println!("  Embeddings: {}", embeddings);
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Service status unavailable");
            println!("Services: unavailable ({})", e);
        }
    }

    match stats {
        Ok(stats) => {
            println!(
                "Knowledge base: {} documents, {} chunks",
                stats.total_documents.unwrap_or(0),
                stats.total_chunks.unwrap_or(0)
            );
            if let Some(index) = &stats.opensearch_index {
                println!("  Index: {}", index);
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Knowledge stats unavailable");
            println!("Knowledge base: unavailable ({})", e);
        }
    }

    if args.agents {
        match agents {
            Ok(agents) => {
                println!(
                    "Agents (team {}):",
                    if agents.team_available {
                        "available"
                    } else {
                        "unavailable"
                    }
                );
                for key in agents.agents.keys() {
                    let name = key
                        .parse::<AgentType>()
                        .map(|a| a.display_name().to_string())
                        .unwrap_or_else(|_| key.clone());
                    println!("  - {}", name);
                }
            }
            Err(e) => println!("Agents: unavailable ({})", e),
        }
    }

    Ok(())
}

fn status_marker(status: &ServiceStatus) -> String {
    let mark = if status.is_ok() { "✓" } else { "✗" };
    format!("{} {}", mark, status.label())
}
