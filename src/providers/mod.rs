//! Flight data providers.
//!
//! Every source of offers implements [`ProviderAgent`]. The orchestrator
//! treats providers as opaque: given a request, a provider yields
//! normalized offers or a [`ProviderError`].

pub mod award;
pub mod error;
pub mod google_flights;

pub use award::AwardSearchProvider;
pub use error::{ProviderError, ProviderResult};
pub use google_flights::GoogleFlightsProvider;

use crate::config::ProvidersConfig;
use crate::models::{Offer, SearchRequest};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// A single source of flight offers.
///
/// Implementations must not panic across this boundary and must not
/// return anything other than well-formed offers or a `ProviderError`.
/// They may degrade to mock data instead of failing.
#[async_trait]
pub trait ProviderAgent: Send + Sync + fmt::Debug {
    /// Stable identifier used for provenance tagging and logs.
    fn id(&self) -> &str;

    /// Runs one search against this provider.
    async fn search(&self, request: &SearchRequest) -> ProviderResult<Vec<Offer>>;
}

/// Build the enabled providers, in configuration order.
pub fn build_providers(config: &ProvidersConfig) -> ProviderResult<Vec<Arc<dyn ProviderAgent>>> {
    let mut providers: Vec<Arc<dyn ProviderAgent>> = Vec::new();

    if config.google_flights.enabled {
        providers.push(Arc::new(GoogleFlightsProvider::new(
            config.google_flights.clone(),
        )?));
    }

    if config.award.enabled {
        providers.push(Arc::new(AwardSearchProvider::new(config.award.clone())));
    }

    info!(
        "Registered {} provider(s): {}",
        providers.len(),
        providers
            .iter()
            .map(|p| p.id())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(providers)
}
