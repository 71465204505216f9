//! Loyalty mile valuations.

use crate::config::ValuationConfig;
use std::collections::BTreeMap;
use tracing::warn;

/// Cents per mile used for airlines without a configured value.
pub const DEFAULT_CENTS_PER_MILE: f64 = 1.2;

/// Read-only table of what one mile is worth, per airline.
#[derive(Debug, Clone, PartialEq)]
pub struct MileValuation {
    default_cents_per_mile: f64,
    airlines: BTreeMap<String, f64>,
}

impl Default for MileValuation {
    fn default() -> Self {
        Self::new(DEFAULT_CENTS_PER_MILE, default_airline_values())
    }
}

impl From<&ValuationConfig> for MileValuation {
    fn from(config: &ValuationConfig) -> Self {
        Self::new(config.default_cents_per_mile, config.airlines.clone())
    }
}

impl MileValuation {
    /// Creates a valuation table.
    ///
    /// An unusable default falls back to [`DEFAULT_CENTS_PER_MILE`].
    pub fn new(default_cents_per_mile: f64, airlines: BTreeMap<String, f64>) -> Self {
        let default_cents_per_mile = if is_usable(default_cents_per_mile) {
            default_cents_per_mile
        } else {
            warn!(
                "Ignoring invalid default mile value {}; using {}",
                default_cents_per_mile, DEFAULT_CENTS_PER_MILE
            );
            DEFAULT_CENTS_PER_MILE
        };

        Self {
            default_cents_per_mile,
            airlines,
        }
    }

    /// Value of one mile of `airline`, in cents.
    ///
    /// Unknown airlines and unusable configured values fall back to the default.
    pub fn cents_per_mile(&self, airline: &str) -> f64 {
        self.airlines
            .get(airline)
            .copied()
            .filter(|cents| is_usable(*cents))
            .unwrap_or(self.default_cents_per_mile)
    }

    /// Dollar value of `miles` miles of `airline`.
    pub fn redemption_value(&self, airline: &str, miles: u64) -> f64 {
        miles as f64 * self.cents_per_mile(airline) / 100.0
    }
}

fn is_usable(cents: f64) -> bool {
    cents.is_finite() && cents >= 0.0
}

/// Built-in per-airline valuations, in cents per mile.
pub fn default_airline_values() -> BTreeMap<String, f64> {
    [
        ("American Airlines", 1.2),
        ("United", 1.3),
        ("Delta", 1.2),
    ]
    .into_iter()
    .map(|(airline, cents)| (airline.to_string(), cents))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_airlines() {
        let valuation = MileValuation::default();
        assert_eq!(valuation.cents_per_mile("United"), 1.3);
        assert_eq!(valuation.cents_per_mile("American Airlines"), 1.2);
        assert_eq!(valuation.cents_per_mile("Air Nowhere"), DEFAULT_CENTS_PER_MILE);
    }

    #[test]
    fn test_redemption_value() {
        let valuation = MileValuation::default();
        assert!((valuation.redemption_value("American Airlines", 60_000) - 720.0).abs() < 1e-9);
        assert!((valuation.redemption_value("United", 10_000) - 130.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_configured_value_uses_default() {
        let mut airlines = BTreeMap::new();
        airlines.insert("Broken".to_string(), f64::NAN);
        airlines.insert("Negative".to_string(), -1.0);
        let valuation = MileValuation::new(1.5, airlines);

        assert_eq!(valuation.cents_per_mile("Broken"), 1.5);
        assert_eq!(valuation.cents_per_mile("Negative"), 1.5);
    }

    #[test]
    fn test_invalid_default_falls_back() {
        for bad in [f64::NAN, f64::INFINITY, -1.0] {
            let valuation = MileValuation::new(bad, BTreeMap::new());
            assert_eq!(valuation.cents_per_mile("Anyone"), DEFAULT_CENTS_PER_MILE);
            assert!((valuation.redemption_value("Anyone", 10_000) - 120.0).abs() < 1e-9);
        }
    }
}
