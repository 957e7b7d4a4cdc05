//! Board-Harvest main entry point
//!
//! This is the command-line interface for the Board-Harvest listing harvester.

use anyhow::Context;
use board_harvest::config::{load_config_with_hash, Config};
use board_harvest::crawler::build_page_url;
use board_harvest::output::{print_statistics, read_posts, PostStatistics};
use board_harvest::pipeline::{run, RunOptions};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Board-Harvest: an incremental forum listing harvester
///
/// Board-Harvest collects recent listings from a paginated forum, extracts
/// structured market records from them in parallel batches, and publishes
/// the merged table and a summary.
#[derive(Parser, Debug)]
#[command(name = "board-harvest")]
#[command(version = "1.0.0")]
#[command(about = "An incremental forum listing harvester", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "from_posts"])]
    dry_run: bool,

    /// Show statistics for the existing posts file and exit
    #[arg(long, conflicts_with_all = ["dry_run", "from_posts"])]
    stats: bool,

    /// Analyse an existing posts TSV file instead of crawling
    #[arg(long, value_name = "PATH")]
    from_posts: Option<PathBuf>,

    /// Collect posts but do not run the extraction stage
    #[arg(long)]
    skip_analysis: bool,

    /// Do not send webhook notifications
    #[arg(long)]
    no_notify: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).context(format!("invalid configuration {}", cli.config.display()));
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        let options = RunOptions {
            from_posts: cli.from_posts,
            skip_analysis: cli.skip_analysis,
            notify: !cli.no_notify,
        };
        handle_run(&config, &options).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("board_harvest=info,warn"),
            1 => EnvFilter::new("board_harvest=debug,info"),
            2 => EnvFilter::new("board_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Board-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Days limit: {}", config.site.days_limit);
    println!("  Pages per board: {}", config.site.pages_per_board);

    let names = config.board_names();
    println!("\nBoards ({}):", config.site.boards.len());
    for board in &config.site.boards {
        let first_page = build_page_url(&config.site, board, 1)
            .with_context(|| format!("cannot build page address for board {}", board))?;
        println!("  - {} ({}): {}", names.lookup(board.as_str()), board, first_page);
    }

    println!("\nFetch:");
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  User agents: {}", config.fetch.user_agents.len());
    println!(
        "  Page delay: {}-{}ms, board delay: {}-{}ms",
        config.politeness.page_delay_min_ms,
        config.politeness.page_delay_max_ms,
        config.politeness.board_delay_min_ms,
        config.politeness.board_delay_max_ms
    );

    println!("\nAnalysis:");
    if config.analysis.enabled {
        println!("  Model: {} at {}", config.analysis.model, config.analysis.base_url);
        println!(
            "  Batch size: {}, workers: {}, attempts: {}",
            config.analysis.batch_size, config.analysis.workers, config.analysis.max_retries
        );
        let key_present = std::env::var(&config.analysis.api_key_env).is_ok();
        println!(
            "  API key (${}): {}",
            config.analysis.api_key_env,
            if key_present { "set" } else { "missing" }
        );
    } else {
        println!("  Disabled");
    }

    println!("\nOutput:");
    println!("  Posts: {}", config.output.posts_path);
    println!("  Table: {}", config.output.table_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would scan up to {} pages",
        config.site.boards.len() as u64 * u64::from(config.site.pages_per_board)
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics for the posts file
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = Path::new(&config.output.posts_path);
    println!("Posts file: {}\n", path.display());

    let posts = read_posts(path).with_context(|| format!("cannot read {}", path.display()))?;
    print_statistics(&PostStatistics::from_posts(&posts), &config.board_names());

    Ok(())
}

/// Handles the main harvest run
async fn handle_run(config: &Config, options: &RunOptions) -> anyhow::Result<()> {
    match &options.from_posts {
        Some(path) => tracing::info!("Analysing posts from {}", path.display()),
        None => tracing::info!(
            "Starting harvest of {} boards ({} days back)",
            config.site.boards.len(),
            config.site.days_limit
        ),
    }

    match run(config, options).await {
        Ok(summary) => {
            if summary.statistics.total_posts > 0 {
                print_statistics(&summary.statistics, &config.board_names());
            }
            if summary.success {
                tracing::info!("Harvest completed: {}", summary.message);
            } else {
                tracing::warn!("Harvest completed without posts: {}", summary.message);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
