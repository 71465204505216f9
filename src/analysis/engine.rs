//! Cash-vs-miles analysis.
//!
//! The [`AnalysisEngine`] turns a merged offer list into an
//! [`AnalysisResult`]: best cash fare, best award, a value comparison
//! priced through the mile valuation table, one recommendation, and the
//! top of the ranked list.

use crate::analysis::ranking::{best_award, best_cash, partition_offers, top_offers};
use crate::analysis::valuation::MileValuation;
use crate::models::{
    AnalysisResult, Offer, Recommendation, RecommendationKind, SearchRequest, ValueComparison,
};
use tracing::{debug, info};

/// Savings (USD) above which miles are recommended.
pub const AWARD_BETTER_THRESHOLD: f64 = 100.0;

/// Savings (USD) below which cash is recommended.
///
/// Deliberately smaller in magnitude than [`AWARD_BETTER_THRESHOLD`]: an
/// award has to win by more before it is recommended.
pub const CASH_BETTER_THRESHOLD: f64 = -50.0;

/// Number of offers kept in the ranked view.
pub const DEFAULT_TOP_N: usize = 10;

/// Analyses merged offers for one search.
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    valuation: MileValuation,
    top_n: usize,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new(MileValuation::default(), DEFAULT_TOP_N)
    }
}

impl AnalysisEngine {
    /// Creates an engine with the given valuation table and ranking size.
    pub fn new(valuation: MileValuation, top_n: usize) -> Self {
        Self { valuation, top_n }
    }

    /// Returns the mile valuation table.
    #[allow(dead_code)]
    pub fn valuation(&self) -> &MileValuation {
        &self.valuation
    }

    /// Analyze offers and produce a recommendation.
    ///
    /// Never fails: an empty list yields a "no flights" result and offers
    /// with missing numbers simply rank last.
    pub fn analyze(&self, offers: &[Offer], request: &SearchRequest) -> AnalysisResult {
        info!("Analyzing {} options", offers.len());

        if offers.is_empty() {
            return AnalysisResult::empty(request);
        }

        let (cash_offers, award_offers) = partition_offers(offers);

        let best_cash = best_cash(&cash_offers);
        if let Some(best) = best_cash {
            debug!("Best cash: {} - {:?}", best.airline, best.price());
        }

        let best_award = best_award(&award_offers);
        if let Some(best) = best_award {
            debug!("Best award: {} - {:?} miles", best.airline, best.miles_cost());
        }

        let value_comparison = match (best_cash, best_award) {
            (Some(cash), Some(award)) => self.compare(cash, award),
            _ => None,
        };

        let recommendations = value_comparison.iter().map(recommend).collect();

        AnalysisResult {
            summary: format!(
                "Found {} cash flights and {} award flights",
                cash_offers.len(),
                award_offers.len()
            ),
            cash_count: cash_offers.len(),
            award_count: award_offers.len(),
            best_cash_option: best_cash.cloned(),
            best_award_option: best_award.cloned(),
            value_comparison,
            recommendations,
            all_options: top_offers(offers, self.top_n),
            search_params: request.clone(),
        }
    }

    /// Price an award against a cash fare.
    ///
    /// Returns `None` when either offer lacks the number needed.
    pub fn compare(&self, cash: &Offer, award: &Offer) -> Option<ValueComparison> {
        let Some(cash_price) = cash.price() else {
            debug!("Best cash offer has no usable price; skipping comparison");
            return None;
        };
        let Some(miles_cost) = award.miles_cost() else {
            debug!("Best award offer has no miles cost; skipping comparison");
            return None;
        };

        let cents_per_mile = self.valuation.cents_per_mile(&award.airline);
        let redemption_cash_equivalent = self.valuation.redemption_value(&award.airline, miles_cost);
        let award_cash_cost = award.cash_cost().unwrap_or(0.0);
        let total_award_cost = redemption_cash_equivalent + award_cash_cost;

        Some(ValueComparison {
            cash_price,
            miles_cost,
            cents_per_mile,
            redemption_cash_equivalent,
            award_cash_cost,
            total_award_cost,
            savings: cash_price - total_award_cost,
        })
    }
}

/// Classify savings against the fixed thresholds.
pub fn classify(savings: f64) -> RecommendationKind {
    if savings > AWARD_BETTER_THRESHOLD {
        RecommendationKind::AwardBetter
    } else if savings < CASH_BETTER_THRESHOLD {
        RecommendationKind::CashBetter
    } else {
        RecommendationKind::Similar
    }
}

/// Build the recommendation for a comparison.
pub fn recommend(comparison: &ValueComparison) -> Recommendation {
    let kind = classify(comparison.savings);
    let miles = format_miles(comparison.miles_cost);

    let (message, details) = match kind {
        RecommendationKind::AwardBetter => (
            format!("Use miles! Save ~${:.2}", comparison.savings),
            format!(
                "Award flight costs {} miles (≈${:.2}) + ${:.2} taxes vs ${:.2} cash",
                miles,
                comparison.redemption_cash_equivalent,
                comparison.award_cash_cost,
                comparison.cash_price
            ),
        ),
        RecommendationKind::CashBetter => (
            "Pay cash! Better value than using miles".to_string(),
            format!(
                "Cash ${:.2} is better value than {} miles (≈${:.2} + ${:.2} taxes = ${:.2})",
                comparison.cash_price,
                miles,
                comparison.redemption_cash_equivalent,
                comparison.award_cash_cost,
                comparison.total_award_cost
            ),
        ),
        RecommendationKind::Similar => (
            "Similar value - your preference".to_string(),
            format!(
                "Cash ${:.2} and {} miles (≈${:.2} including taxes) are roughly equivalent in value",
                comparison.cash_price, miles, comparison.total_award_cost
            ),
        ),
    };

    Recommendation {
        kind,
        message,
        details,
    }
}

/// Format a mile count with thousands separators (e.g. `60,000`).
pub fn format_miles(miles: u64) -> String {
    let digits = miles.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(digit);
    }

    formatted
}
