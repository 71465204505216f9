//! FareScout - cash vs miles flight search
//!
//! Queries cash-fare and award-inventory providers concurrently, then
//! recommends whether to pay cash or redeem miles.
//!
//! Exit codes:
//!   0 - Success (including searches that found no flights)
//!   1 - Error (invalid arguments, config, I/O, server failure)

mod analysis;
mod cli;
mod config;
mod models;
mod orchestrator;
mod providers;
mod report;
mod server;
mod service;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use report::SearchReport;
use service::FareSearchService;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // `general.verbose` feeds the log level
    let (config, source) = match prepare_config(&args) {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(config.log_level(&args));

    info!("FareScout v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    if let Err(e) = run(args, config).await {
        error!("FareScout failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .farescout.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Add a SerpAPI key under [providers.google_flights] for live fares.");
    Ok(())
}

/// Initialize logging at the given level.
///
/// Logs go to stderr so a report printed on stdout stays clean.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

async fn run(args: Args, config: Config) -> Result<()> {
    let service = Arc::new(FareSearchService::from_config(&config)?);

    if args.serve {
        return server::serve(service, &config.server.bind_addr()).await;
    }

    run_search(&args, &service).await
}

/// Run a single search and emit the report.
async fn run_search(args: &Args, service: &FareSearchService) -> Result<()> {
    let start_time = Instant::now();
    let request = args.search_request()?;

    let spinner = if args.quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .context("Invalid progress template")?,
        );
        pb.set_message(format!("Searching {}...", request.route()));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let outcome = service.search(&request).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    for failure in &outcome.providers.failures {
        warn!("Provider {} failed: {}", failure.provider, failure.error);
    }

    let report = SearchReport::new(outcome, start_time.elapsed().as_secs_f64());

    match args.output {
        Some(ref path) => {
            report::write_report(&report, args.format, path)?;

            if !args.quiet {
                println!("✈️  {}", report.analysis.summary);
                if let Some(rec) = report.analysis.recommendation() {
                    println!("{} {}", rec.kind.emoji(), rec.message);
                }
                println!("\n✅ Report saved to: {}", path.display());
            }
        }
        None => println!("{}", report::render(&report, args.format)?),
    }

    Ok(())
}

/// Load, merge and validate configuration.
///
/// Returns the config and the file it came from, if any.
fn prepare_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    let (mut config, source) = load_config(args)?;
    config.merge_with_args(args)?;
    config.validate()?;
    Ok((config, source))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    let config = Config::load_default()?;
    let source = config.as_ref().map(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
    Ok((config.unwrap_or_default(), source))
}
