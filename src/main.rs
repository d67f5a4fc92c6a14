//! Royale-Harvest main entry point
//!
//! Command-line interface for the Clash Royale battle-log harvester.

use anyhow::Context;
use clap::Parser;
use royale_harvest::config::load_config;
use royale_harvest::crawler::crawl;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Royale-Harvest: an incremental Clash Royale battle-log harvester
///
/// Crawls the clan graph via the official API, flattens battles into rows,
/// and grows a Parquet dataset across runs, resuming from a durable
/// visited-clans checkpoint.
#[derive(Parser, Debug)]
#[command(name = "royale-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Incremental Clash Royale battle-log harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would run without touching the network
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let token = std::env::var(&config.api.token_env).with_context(|| {
        format!(
            "credential env var {} is not set",
            config.api.token_env
        )
    })?;

    let summary = crawl(config, &token).await.context("crawl failed")?;

    tracing::info!(
        "Done: {} clans processed, {} rows added, {} rows total",
        summary.clans_processed,
        summary.rows_added,
        summary.total_rows
    );

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("royale_harvest=info,warn"),
            1 => EnvFilter::new("royale_harvest=debug,info"),
            2 => EnvFilter::new("royale_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and prints the plan
fn handle_dry_run(config: &royale_harvest::config::Config) {
    println!("=== Royale-Harvest Dry Run ===\n");

    println!("API:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  Token env var: {}", config.api.token_env);
    println!("  Max retries: {}", config.api.max_retries);
    println!("  Base delay: {}ms", config.api.base_delay_ms);

    println!("\nCrawl:");
    println!("  Starting clan tag: {}", config.crawl.starting_clan_tag);
    println!("  Max new clans per run: {}", config.crawl.max_new_clans_per_run);
    println!("  Game mode: {}", config.crawl.game_mode);
    println!("  Mirror opponent rows: {}", config.crawl.mirror_opponent_rows);

    println!("\nOutput:");
    println!("  Dataset: {}", config.output.dataset_path);
    println!("  Checkpoint: {}", config.output.checkpoint_path);

    println!("\n✓ Configuration is valid");
}
