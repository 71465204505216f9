//! Search orchestration.
//!
//! The [`SearchOrchestrator`] fans one request out to every provider at
//! once, merges offers in completion order and tags each with the
//! provider id and the time it arrived. A failing, panicking or slow
//! provider never fails the dispatch; its absence is recorded instead.

use crate::config::SearchConfig;
use crate::models::{Offer, SearchRequest};
use crate::providers::{ProviderAgent, ProviderError};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

/// Configuration for dispatching searches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Overall budget for one dispatch in milliseconds; `None` waits for every provider.
    pub timeout_ms: Option<u64>,
    /// Budget for each provider in milliseconds.
    pub per_provider_timeout_ms: Option<u64>,
}

impl OrchestratorConfig {
    /// Creates a configuration with the given overall timeout.
    #[must_use]
    pub fn with_timeout(timeout_ms: u64) -> Self {
        Self {
            timeout_ms: Some(timeout_ms),
            ..Default::default()
        }
    }

    /// Sets the per-provider timeout.
    #[must_use]
    pub fn with_per_provider_timeout(mut self, timeout_ms: u64) -> Self {
        self.per_provider_timeout_ms = Some(timeout_ms);
        self
    }
}

impl From<&SearchConfig> for OrchestratorConfig {
    fn from(config: &SearchConfig) -> Self {
        // Zero disables a budget
        let to_ms = |secs: u64| (secs > 0).then(|| secs.saturating_mul(1000));
        Self {
            timeout_ms: to_ms(config.timeout_seconds),
            per_provider_timeout_ms: to_ms(config.provider_timeout_seconds),
        }
    }
}

/// A provider that did not contribute offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFailure {
    /// Provider identifier.
    pub provider: String,
    /// What went wrong.
    pub error: String,
}

/// Per-dispatch bookkeeping, without the offers themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    /// Number of providers the request was sent to.
    pub providers_queried: usize,
    /// Number of providers that returned offers (possibly zero offers).
    pub providers_responded: usize,
    /// Providers that errored or panicked.
    pub failures: Vec<ProviderFailure>,
    /// Providers still running when the overall timeout fired.
    pub timed_out: Vec<String>,
    /// Wall-clock time of the whole dispatch in milliseconds.
    pub elapsed_ms: u64,
}

/// Offers merged from every provider that answered.
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    /// Tagged offers in completion order.
    pub offers: Vec<Offer>,
    /// Bookkeeping for this dispatch.
    pub stats: DispatchStats,
}

/// Dispatches searches to providers concurrently.
#[derive(Debug, Clone, Default)]
pub struct SearchOrchestrator {
    config: OrchestratorConfig,
}

impl SearchOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(config: OrchestratorConfig) -> Self {
        Self { config }
    }

    /// Returns the current configuration.
    #[allow(dead_code)]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Searches every provider and returns the merged offers.
    ///
    /// Order is completion order and carries no meaning.
    #[allow(dead_code)] // Convenience wrapper when stats are not needed
    pub async fn dispatch(
        &self,
        request: &SearchRequest,
        agents: &[Arc<dyn ProviderAgent>],
    ) -> Vec<Offer> {
        self.dispatch_detailed(request, agents).await.offers
    }

    /// Searches every provider and returns the offers with dispatch statistics.
    pub async fn dispatch_detailed(
        &self,
        request: &SearchRequest,
        agents: &[Arc<dyn ProviderAgent>],
    ) -> DispatchOutcome {
        let started = Instant::now();
        let deadline = self
            .config
            .timeout_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));
        let per_provider = self.config.per_provider_timeout_ms.map(Duration::from_millis);

        let mut pending = FuturesUnordered::new();
        let mut abort_handles = Vec::with_capacity(agents.len());
        let mut finished = vec![false; agents.len()];

        for (index, agent) in agents.iter().enumerate() {
            let agent = Arc::clone(agent);
            let request = request.clone();

            let handle = tokio::spawn(async move {
                match per_provider {
                    Some(limit) => match timeout(limit, agent.search(&request)).await {
                        Ok(result) => result,
                        Err(_) => Err(ProviderError::timeout(format!(
                            "no answer after {}ms",
                            limit.as_millis()
                        ))),
                    },
                    None => agent.search(&request).await,
                }
            });

            abort_handles.push(handle.abort_handle());
            pending.push(async move { (index, handle.await) });
        }

        let mut outcome = DispatchOutcome::default();
        outcome.stats.providers_queried = agents.len();

        loop {
            let next = match deadline {
                Some(deadline) => match timeout_at(deadline, pending.next()).await {
                    Ok(next) => next,
                    Err(_) => break,
                },
                None => pending.next().await,
            };

            let Some((index, joined)) = next else {
                break;
            };
            finished[index] = true;
            let provider = agents[index].id();

            match joined {
                Ok(Ok(mut offers)) => {
                    let elapsed = started.elapsed();
                    for offer in &mut offers {
                        offer.tag(provider, elapsed);
                    }
                    info!(
                        "Got {} results from {} in {}ms",
                        offers.len(),
                        provider,
                        elapsed.as_millis()
                    );
                    outcome.stats.providers_responded += 1;
                    outcome.offers.extend(offers);
                }
                Ok(Err(e)) => {
                    if e.is_timeout() {
                        warn!("{} did not answer in time: {}", provider, e);
                    } else {
                        warn!("Error with {}: {}", provider, e);
                    }
                    outcome.stats.failures.push(ProviderFailure {
                        provider: provider.to_string(),
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Provider {} task failed: {}", provider, e);
                    outcome.stats.failures.push(ProviderFailure {
                        provider: provider.to_string(),
                        error: format!("task panicked: {}", e),
                    });
                }
            }
        }

        for (index, done) in finished.iter().enumerate() {
            if !done {
                abort_handles[index].abort();
                warn!("Search timed out waiting for {}", agents[index].id());
                outcome.stats.timed_out.push(agents[index].id().to_string());
            }
        }

        outcome.stats.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(
            "Dispatch finished: {}/{} providers responded, {} offers in {}ms",
            outcome.stats.providers_responded,
            outcome.stats.providers_queried,
            outcome.offers.len(),
            outcome.stats.elapsed_ms
        );

        outcome
    }
}
