//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::SearchRequest;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// FareScout - compare cash fares against award redemptions
///
/// Queries every configured provider concurrently and tells you whether
/// paying cash or burning miles is the better deal.
///
/// Examples:
///   farescout --origin NYC --destination TYO --outbound-date 2026-07-15
///   farescout --origin JFK --destination LHR --outbound-date 2026-07-15 --return-date 2026-07-25
///   farescout --origin NYC --destination TYO --outbound-date 2026-07-15 --format json --offline
///   farescout --serve --bind 127.0.0.1:8000
///   farescout --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Origin airport or city code (e.g. NYC)
    #[arg(long, value_name = "CODE", required_unless_present_any = ["serve", "init_config"])]
    pub origin: Option<String>,

    /// Destination airport or city code (e.g. TYO)
    #[arg(long, value_name = "CODE", required_unless_present_any = ["serve", "init_config"])]
    pub destination: Option<String>,

    /// Outbound date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", required_unless_present_any = ["serve", "init_config"])]
    pub outbound_date: Option<String>,

    /// Return date (YYYY-MM-DD); omit for one-way
    #[arg(long, value_name = "DATE")]
    pub return_date: Option<String>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Number of offers to include in the ranked list
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Overall search timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// SerpAPI key for live Google Flights results
    ///
    /// Without a key the Google Flights provider returns sample data.
    #[arg(long, value_name = "KEY", env = "SERPAPI_KEY", hide_env_values = true)]
    pub serpapi_key: Option<String>,

    /// Never call external APIs; use sample cash fares
    #[arg(long)]
    pub offline: bool,

    /// Skip the award provider
    #[arg(long)]
    pub no_award: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .farescout.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Run the HTTP API instead of a single search
    #[arg(long)]
    pub serve: bool,

    /// Address for --serve (HOST:PORT); defaults to the config file
    #[arg(long, value_name = "ADDR", requires = "serve")]
    pub bind: Option<String>,

    /// Generate a default .farescout.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        if !self.serve {
            self.search_request().map_err(|e| e.to_string())?;
        }

        Ok(())
    }

    /// Build the search request from the route flags.
    pub fn search_request(&self) -> Result<SearchRequest> {
        let request = SearchRequest::new(
            self.origin.as_deref().unwrap_or(""),
            self.destination.as_deref().unwrap_or(""),
            self.outbound_date.as_deref().unwrap_or(""),
            self.return_date.as_deref(),
        )?;
        Ok(request)
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
