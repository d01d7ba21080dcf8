//! Spindle main entry point
//!
//! This is the command-line interface for the Spindle web scraper.

use anyhow::Context;
use clap::Parser;
use spindle::config::{load_config_with_hash, Config};
use spindle::crawler::{build_http_client, crawl};
use spindle::output::{generate_markdown_summary, print_report};
use spindle::MimeRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Spindle: a depth-bounded web scraper
///
/// Spindle crawls the seed URL of each configured action, follows links up
/// to the action's maximum depth and saves the payloads whose MIME type the
/// action selects. Tasks run one after the other.
#[derive(Parser, Debug)]
#[command(name = "spindle")]
#[command(version)]
#[command(about = "A depth-bounded web scraper", long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML, or `.sconf`)
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run only the named task
    #[arg(long, value_name = "NAME")]
    task: Option<String>,

    /// Validate the configuration and show what would be crawled
    #[arg(long)]
    dry_run: bool,

    /// Build the MIME table from a reference document (file path or URL)
    #[arg(long, value_name = "PATH|URL")]
    mime_reference: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("invalid configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, cli.task.as_deref());
        return Ok(());
    }

    let registry = load_registry(&config, cli.mime_reference.as_deref()).await?;
    handle_crawl(config, registry, cli.task.as_deref()).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("spindle=info,warn"),
            1 => EnvFilter::new("spindle=debug,info"),
            2 => EnvFilter::new("spindle=trace,debug"),
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

/// Builds the MIME registry, from the reference document when one is given
async fn load_registry(config: &Config, reference: Option<&str>) -> anyhow::Result<Arc<MimeRegistry>> {
    let registry = match reference {
        None => MimeRegistry::builtin(),
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
            let client = build_http_client(&config.crawler, &config.user_agent)?;
            MimeRegistry::fetch_reference(&client, url).await?
        }
        Some(path) => {
            let html = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("cannot read MIME reference {}", path))?;
            MimeRegistry::from_reference_html(&html)?
        }
    };

    tracing::info!("MIME registry ready: {} types", registry.len());
    Ok(Arc::new(registry))
}

/// Handles the --dry-run mode: shows the configuration that would run
fn handle_dry_run(config: &Config, only: Option<&str>) {
    println!("=== Spindle Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Parallel transfers per action: {}",
        config.crawler.max_parallel_per_action
    );
    if let Some(cap) = config.crawler.max_concurrent_transfers {
        println!("  Concurrent transfer cap: {}", cap);
    }
    println!("  Poll interval: {}ms", config.crawler.poll_interval_ms);
    println!("  Transfer timeout: {}s", config.crawler.transfer_timeout_secs);
    if let Some(timeout) = config.crawler.crawl_timeout_secs {
        println!("  Crawl timeout: {}s", timeout);
    }

    println!("\nUser Agent: {}", config.user_agent.user_agent_string());

    println!("\nOutput:");
    println!("  Data root: {}", config.output.data_root.display());
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary.display());
    }

    println!("\nActions ({}):", config.actions.len());
    for action in &config.actions {
        println!("  - {} -> {}", action.name, action.url);
        println!(
            "    max depth {}, versioning {}",
            action.max_depth(),
            if action.versioning() { "on" } else { "off" }
        );
        let types = action.selected_types();
        if !types.is_empty() {
            let types: Vec<&str> = types.into_iter().collect();
            println!("    types: {}", types.join(", "));
        }
    }

    println!("\nTasks ({}):", config.tasks.len());
    for task in &config.tasks {
        if only.is_some_and(|name| name != task.name) {
            continue;
        }
        println!(
            "  - {} at {}: {}",
            task.name,
            task.launch_time(),
            task.actions.join(", ")
        );
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    registry: Arc<MimeRegistry>,
    only: Option<&str>,
) -> anyhow::Result<()> {
    tracing::info!(
        "Actions: {}, Tasks: {}",
        config.actions.len(),
        config.tasks.len()
    );

    let summary_path = config.output.summary_path.clone();
    let reports = match crawl(config, registry, only).await {
        Ok(reports) => reports,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    print_report(&reports);

    if let Some(path) = summary_path {
        generate_markdown_summary(&reports, &path)?;
        println!("✓ Summary written to: {}", path.display());
    }

    tracing::info!("Crawl completed successfully");
    Ok(())
}
