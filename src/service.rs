//! Search service shared by the CLI and the HTTP API.

use crate::analysis::{AnalysisEngine, MileValuation};
use crate::config::Config;
use crate::models::{AnalysisResult, SearchRequest};
use crate::orchestrator::{DispatchStats, OrchestratorConfig, SearchOrchestrator};
use crate::providers::{build_providers, ProviderAgent};
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Analysis plus the dispatch statistics that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Cash-vs-miles analysis.
    pub analysis: AnalysisResult,
    /// Which providers answered, failed or timed out.
    pub providers: DispatchStats,
}

/// Runs one search end to end: dispatch, then analyze.
///
/// Immutable after construction and cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct FareSearchService {
    providers: Vec<Arc<dyn ProviderAgent>>,
    orchestrator: SearchOrchestrator,
    engine: AnalysisEngine,
}

impl FareSearchService {
    /// Creates a service from its parts.
    pub fn new(
        providers: Vec<Arc<dyn ProviderAgent>>,
        orchestrator: SearchOrchestrator,
        engine: AnalysisEngine,
    ) -> Self {
        Self {
            providers,
            orchestrator,
            engine,
        }
    }

    /// Builds providers, orchestrator and engine from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let providers =
            build_providers(&config.providers).context("Failed to initialize providers")?;

        let orchestrator = SearchOrchestrator::new(OrchestratorConfig::from(&config.search));
        let engine = AnalysisEngine::new(
            MileValuation::from(&config.valuation),
            config.general.top_results,
        );

        Ok(Self::new(providers, orchestrator, engine))
    }

    /// Search all providers and analyze the merged offers.
    pub async fn search(&self, request: &SearchRequest) -> SearchOutcome {
        info!(
            "Searching {} provider(s) for {}",
            self.providers.len(),
            request
        );

        let outcome = self
            .orchestrator
            .dispatch_detailed(request, &self.providers)
            .await;

        info!(
            "Collected {} offers from {}/{} providers in {}ms",
            outcome.offers.len(),
            outcome.stats.providers_responded,
            outcome.stats.providers_queried,
            outcome.stats.elapsed_ms
        );

        SearchOutcome {
            analysis: self.engine.analyze(&outcome.offers, request),
            providers: outcome.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecommendationKind;

    fn offline_config() -> Config {
        let mut config = Config::default();
        config.providers.google_flights.api_key = None;
        config.providers.award.simulated_latency_ms = 0;
        config
    }

    fn request() -> SearchRequest {
        SearchRequest::new("NYC", "TYO", "2026-07-15", Some("2026-07-25")).unwrap()
    }

    #[tokio::test]
    async fn test_offline_search_end_to_end() {
        let service = FareSearchService::from_config(&offline_config()).unwrap();

        let outcome = service.search(&request()).await;

        assert_eq!(outcome.providers.providers_queried, 2);
        assert_eq!(outcome.providers.providers_responded, 2);
        assert!(outcome.providers.failures.is_empty());

        let analysis = outcome.analysis;
        assert_eq!(analysis.summary, "Found 2 cash flights and 2 award flights");
        assert_eq!(analysis.best_cash_option.unwrap().price(), Some(450.0));
        assert_eq!(analysis.best_award_option.unwrap().miles_cost(), Some(60_000));
        assert_eq!(
            analysis.recommendations[0].kind,
            RecommendationKind::CashBetter
        );
        assert_eq!(analysis.all_options.len(), 4);
    }

    #[tokio::test]
    async fn test_cash_only_search() {
        let mut config = offline_config();
        config.providers.award.enabled = false;
        let service = FareSearchService::from_config(&config).unwrap();

        let outcome = service.search(&request()).await;

        assert_eq!(outcome.analysis.award_count, 0);
        assert!(outcome.analysis.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_no_providers_yields_empty_result() {
        let mut config = offline_config();
        config.providers.google_flights.enabled = false;
        config.providers.award.enabled = false;
        let service = FareSearchService::from_config(&config).unwrap();

        let outcome = service.search(&request()).await;

        assert_eq!(outcome.analysis.summary, "No flights found");
        assert_eq!(outcome.providers.providers_queried, 0);
    }

    #[tokio::test]
    async fn test_top_results_from_config() {
        let mut config = offline_config();
        config.general.top_results = 1;
        let service = FareSearchService::from_config(&config).unwrap();

        let outcome = service.search(&request()).await;
        assert_eq!(outcome.analysis.all_options.len(), 1);
    }
}
