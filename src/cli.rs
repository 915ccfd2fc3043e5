//!
//! This module implements the CLI interface for code-harvest: command parsing, configuration
//! and credential loading, and the user-visible summary of a run.
//!
//! All pipeline logic (search, aggregation, publishing) lives in the `code-harvest-core` crate;
//! this module only wires the GitHub client into it.
//!
//! ## Commands
//! - `sync`: search every keyword, and publish the aggregate document when anything was found.
//! - `preview`: search and aggregate only, printing (or saving) the document without publishing.
//!
//! Partial failures of a run are reported but do not change the exit code; only configuration
//! problems, detected before any request is sent, make the process fail.

use crate::github::GitHubClient;
use crate::load_config::{load_config, load_token, CliConfig};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use code_harvest_core::publish::build_document;
use code_harvest_core::search::{harvest, HarvestReport};
use code_harvest_core::synchronise::{synchronise, PublishStatus};
use std::path::PathBuf;

/// CLI for code-harvest: collect code matching keywords and publish it as one file.
#[derive(Parser)]
#[clap(
    name = "code-harvest",
    version,
    about = "Search GitHub code for keywords and publish the matches as a single file"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search all keywords and create or update the target file with the results
    Sync {
        /// Optional YAML file overriding the built-in settings
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Search all keywords and show the document that `sync` would publish
    Preview {
        /// Optional YAML file overriding the built-in settings
        #[clap(long)]
        config: Option<PathBuf>,
        /// Write the document to this file instead of stdout
        #[clap(long)]
        output: Option<PathBuf>,
    },
}

fn connect(config: &CliConfig) -> Result<GitHubClient> {
    let token = load_token(&config.token_env)?;
    GitHubClient::new(&config.harvest.api_base, token).context("Failed to construct GitHub client")
}

fn print_harvest_summary(report: &HarvestReport) {
    println!(
        "Searched {} keyword(s): {} snippet(s) collected, {} item(s) without download URL, {} failure(s)",
        report.keywords_searched,
        report.snippets.len(),
        report.items_skipped,
        report.failures.len()
    );
    for failure in &report.failures {
        println!("  [{}] {:?}: {}", failure.keyword, failure.stage, failure.reason);
    }
}

/// Async CLI entrypoint shared by main() and the integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { config } => {
            let config = load_config(config.as_deref())?;
            let client = connect(&config)?;
            tracing::info!(command = "sync", file = %config.harvest.target, "Starting synchronisation");
            println!("Harvest starting...");

            let report = synchronise(&config.harvest, &client, &client, &client, Utc::now()).await;

            print_harvest_summary(&report.harvest);
            match &report.publish {
                PublishStatus::Skipped => {
                    println!("No matching code files found; {} left untouched.", config.harvest.target)
                }
                PublishStatus::Published(published) => println!(
                    "{:?} {} with {} snippet(s), {} bytes.",
                    published.action,
                    config.harvest.target,
                    published.snippet_count,
                    published.document_bytes
                ),
                PublishStatus::Failed(reason) => println!("Publish failed: {reason}"),
            }
            tracing::info!(command = "sync", published = report.published(), "Synchronisation finished");
            Ok(())
        }
        Commands::Preview { config, output } => {
            let config = load_config(config.as_deref())?;
            let client = connect(&config)?;
            tracing::info!(command = "preview", "Starting preview harvest");

            let report = harvest(&config.harvest, &client, &client).await;
            print_harvest_summary(&report);
            if report.is_empty() {
                println!("No matching code files found; nothing to preview.");
                return Ok(());
            }

            let document = build_document(
                &report.snippets,
                Utc::now(),
                &config.harvest.banner_description,
            );
            match output {
                Some(path) => {
                    std::fs::write(&path, &document)
                        .with_context(|| format!("Failed to write preview to {}", path.display()))?;
                    println!("Preview written to {} ({} bytes).", path.display(), document.len());
                }
                None => println!("{document}"),
            }
            Ok(())
        }
    }
}
