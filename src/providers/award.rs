//! Award (miles) inventory provider.
//!
//! Serves American Airlines award availability. There is no public award
//! API, so the inventory is a fixed table served after a configurable
//! delay that stands in for the upstream round trip.

use crate::config::AwardConfig;
use crate::models::{Offer, SearchRequest};
use crate::providers::{ProviderAgent, ProviderResult};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Identifier used in provenance tags.
pub const PROVIDER_ID: &str = "aa_award";

/// Provider returning award redemptions priced in miles.
#[derive(Debug, Clone)]
pub struct AwardSearchProvider {
    config: AwardConfig,
}

impl AwardSearchProvider {
    /// Create a new award provider.
    pub fn new(config: AwardConfig) -> Self {
        debug!(
            "Initialized award provider for {} ({}ms latency)",
            config.airline, config.simulated_latency_ms
        );
        Self { config }
    }

    fn inventory(&self, request: &SearchRequest) -> Vec<Offer> {
        let route = request.route();
        let airline = self.config.airline.as_str();

        vec![
            Offer::award(airline, Some(60_000), 45.60)
                .with_cabin("Economy")
                .with_times("10:30 AM", "2:45 PM")
                .with_duration("14h 15m")
                .with_stops(1)
                .with_availability("Good")
                .with_route(route.clone())
                .with_raw_data(json!({"mock": true, "award": true})),
            Offer::award(airline, Some(110_000), 85.40)
                .with_cabin("Business")
                .with_times("11:00 AM", "3:30 PM")
                .with_duration("14h 30m")
                .with_stops(1)
                .with_availability("Limited")
                .with_route(route)
                .with_raw_data(json!({"mock": true, "award": true})),
        ]
    }
}

#[async_trait]
impl ProviderAgent for AwardSearchProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    async fn search(&self, request: &SearchRequest) -> ProviderResult<Vec<Offer>> {
        info!("Searching {} award space: {}", self.config.airline, request);

        if self.config.simulated_latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.simulated_latency_ms)).await;
        }

        let offers = self.inventory(request);
        debug!("Award provider returned {} offers", offers.len());
        Ok(offers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(latency_ms: u64) -> AwardSearchProvider {
        AwardSearchProvider::new(AwardConfig {
            simulated_latency_ms: latency_ms,
            ..AwardConfig::default()
        })
    }

    #[test]
    fn test_award_inventory() {
        let request = SearchRequest::new("NYC", "TYO", "2026-07-15", None).unwrap();
        let offers = tokio_test::block_on(provider(0).search(&request)).unwrap();

        assert_eq!(offers.len(), 2);
        assert!(offers.iter().all(Offer::is_award));
        assert_eq!(offers[0].miles_cost(), Some(60_000));
        assert_eq!(offers[0].cash_cost(), Some(45.60));
        assert_eq!(offers[0].airline, "American Airlines");
        assert_eq!(offers[1].miles_cost(), Some(110_000));
        assert_eq!(offers[1].route.as_deref(), Some("NYC → TYO"));
        assert!(offers.iter().all(|o| o.provenance.is_none()));
    }

    #[tokio::test]
    async fn test_award_latency_is_applied() {
        let request = SearchRequest::new("NYC", "TYO", "2026-07-15", None).unwrap();
        let started = std::time::Instant::now();
        provider(50).search(&request).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
