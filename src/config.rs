//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.farescout.toml` files.

use crate::analysis::valuation::{default_airline_values, DEFAULT_CENTS_PER_MILE};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".farescout.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Search dispatch settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Provider settings.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Mile valuation settings.
    #[serde(default)]
    pub valuation: ValuationConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Number of offers kept in the ranked list.
    #[serde(default = "default_top_results")]
    pub top_results: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            top_results: default_top_results(),
        }
    }
}

fn default_top_results() -> usize {
    10
}

/// Search dispatch settings.
///
/// A timeout of `0` disables it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Overall deadline for one search, in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_seconds: u64,

    /// Deadline for a single provider, in seconds.
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_search_timeout(),
            provider_timeout_seconds: default_provider_timeout(),
        }
    }
}

fn default_search_timeout() -> u64 {
    30
}

fn default_provider_timeout() -> u64 {
    20
}

/// Settings for every provider agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Google Flights (SerpAPI) cash fares.
    #[serde(default)]
    pub google_flights: GoogleFlightsConfig,

    /// Award inventory.
    #[serde(default)]
    pub award: AwardConfig,
}

/// Google Flights provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleFlightsConfig {
    /// Query this provider.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// SerpAPI key. Mock data is returned when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// SerpAPI endpoint.
    #[serde(default = "default_serpapi_url")]
    pub base_url: String,

    /// Currency prices are quoted in.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// SerpAPI travel class (1 economy, 2 premium economy, 3 business, 4 first).
    #[serde(default = "default_travel_class")]
    pub travel_class: u8,

    /// Ask SerpAPI for browser-identical results (slower).
    #[serde(default = "default_true")]
    pub deep_search: bool,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,

    /// Serve mock data when the API call fails.
    #[serde(default = "default_true")]
    pub fallback_to_mock: bool,
}

impl Default for GoogleFlightsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: default_serpapi_url(),
            currency: default_currency(),
            travel_class: default_travel_class(),
            deep_search: true,
            timeout_seconds: default_request_timeout(),
            fallback_to_mock: true,
        }
    }
}

fn default_serpapi_url() -> String {
    "https://serpapi.com/search.json".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_travel_class() -> u8 {
    3
}

fn default_request_timeout() -> u64 {
    15
}

/// Award provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardConfig {
    /// Query this provider.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Airline whose award space is searched.
    #[serde(default = "default_award_airline")]
    pub airline: String,

    /// Artificial response delay in milliseconds.
    #[serde(default = "default_award_latency")]
    pub simulated_latency_ms: u64,
}

impl Default for AwardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            airline: default_award_airline(),
            simulated_latency_ms: default_award_latency(),
        }
    }
}

fn default_award_airline() -> String {
    "American Airlines".to_string()
}

fn default_award_latency() -> u64 {
    1000
}

/// Mile valuation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationConfig {
    /// Cents per mile for airlines not listed below.
    #[serde(default = "default_cents_per_mile")]
    pub default_cents_per_mile: f64,

    /// Cents per mile keyed by airline name.
    #[serde(default = "default_airline_values")]
    pub airlines: BTreeMap<String, f64>,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            default_cents_per_mile: DEFAULT_CENTS_PER_MILE,
            airlines: default_airline_values(),
        }
    }
}

fn default_cents_per_mile() -> f64 {
    DEFAULT_CENTS_PER_MILE
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.farescout.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) -> Result<()> {
        if let Some(top) = args.top {
            self.general.top_results = top;
        }

        if let Some(timeout) = args.timeout {
            self.search.timeout_seconds = timeout;
        }

        if let Some(ref key) = args.serpapi_key {
            self.providers.google_flights.api_key = Some(key.clone());
        }

        // Offline runs never touch the network, even with a configured key
        if args.offline {
            self.providers.google_flights.api_key = None;
        }

        if args.no_award {
            self.providers.award.enabled = false;
        }

        if let Some(ref bind) = args.bind {
            let (host, port) = bind
                .rsplit_once(':')
                .with_context(|| format!("Bind address must be HOST:PORT, got '{}'", bind))?;
            self.server.host = host.to_string();
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid port in bind address '{}'", bind))?;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }

        Ok(())
    }

    /// Reject settings that would silently produce useless searches.
    ///
    /// Call after [`Config::merge_with_args`]. Zero keeps its "disabled"
    /// meaning only for the `[search]` timeouts.
    pub fn validate(&self) -> Result<()> {
        if self.general.top_results == 0 {
            bail!("general.top_results must be at least 1");
        }

        if self.providers.google_flights.enabled
            && self.providers.google_flights.timeout_seconds == 0
        {
            bail!("providers.google_flights.timeout_seconds must be at least 1");
        }

        Ok(())
    }

    /// Log level from CLI flags and `general.verbose`; `--quiet` wins.
    pub fn log_level(&self, args: &crate::cli::Args) -> tracing::Level {
        if self.general.verbose && !args.quiet {
            tracing::Level::DEBUG
        } else {
            args.log_level()
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
