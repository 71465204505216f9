//! Offer selection and ranking.
//!
//! Utilities for partitioning merged offers, picking the best of each
//! kind and ordering the mixed list. Offers without a usable number are
//! treated as infinitely expensive, so they lose every comparison but
//! never abort one.

use crate::models::Offer;
use std::collections::BTreeMap;

/// Split offers into cash and award subsets, preserving order.
pub fn partition_offers(offers: &[Offer]) -> (Vec<&Offer>, Vec<&Offer>) {
    offers.iter().partition(|offer| !offer.is_award())
}

/// Cheapest cash offer. Ties go to the first one encountered.
pub fn best_cash<'a>(offers: &[&'a Offer]) -> Option<&'a Offer> {
    offers.iter().copied().min_by(|a, b| {
        let a = a.price().unwrap_or(f64::INFINITY);
        let b = b.price().unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    })
}

/// Award offer needing the fewest miles. Ties go to the first one encountered.
pub fn best_award<'a>(offers: &[&'a Offer]) -> Option<&'a Offer> {
    offers
        .iter()
        .copied()
        .min_by_key(|offer| offer.miles_cost().unwrap_or(u64::MAX))
}

/// Sort offers ascending by price, else miles (stable).
///
/// Cash dollars and award miles share one scale here, so the mixed order is
/// only a rough value proxy.
pub fn sort_offers(offers: &mut [Offer]) {
    offers.sort_by(|a, b| a.rank_value().total_cmp(&b.rank_value()));
}

/// Get the top N offers by rank value.
pub fn top_offers(offers: &[Offer], n: usize) -> Vec<Offer> {
    let mut sorted = offers.to_vec();
    sort_offers(&mut sorted);
    sorted.truncate(n);
    sorted
}

/// Count offers per provider; untagged offers count as `unknown`.
pub fn offers_by_provider(offers: &[Offer]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();

    for offer in offers {
        let provider = offer
            .provenance
            .as_ref()
            .map_or("unknown", |p| p.agent.as_str());
        *counts.entry(provider.to_string()).or_default() += 1;
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cash(airline: &str, price: Option<f64>) -> Offer {
        Offer::cash(airline, price)
    }

    fn award(airline: &str, miles: Option<u64>) -> Offer {
        Offer::award(airline, miles, 50.0)
    }

    #[test]
    fn test_partition_offers() {
        let offers = vec![
            cash("A", Some(100.0)),
            award("B", Some(60_000)),
            cash("C", None),
            award("D", None),
        ];

        let (cash_offers, award_offers) = partition_offers(&offers);

        assert_eq!(cash_offers.len(), 2);
        assert_eq!(award_offers.len(), 2);
        assert_eq!(cash_offers[0].airline, "A");
        assert_eq!(cash_offers[1].airline, "C");
        assert_eq!(award_offers[0].airline, "B");
    }

    #[test]
    fn test_best_cash_ignores_missing_prices() {
        let offers = vec![
            cash("NoPrice", None),
            cash("Zero", Some(0.0)),
            cash("Pricey", Some(900.0)),
            cash("Cheap", Some(450.0)),
        ];
        let refs: Vec<&Offer> = offers.iter().collect();

        assert_eq!(best_cash(&refs).unwrap().airline, "Cheap");
        assert!(best_cash(&[]).is_none());
    }

    #[test]
    fn test_best_picks_first_on_ties() {
        let offers = vec![
            cash("First", Some(450.0)),
            cash("Second", Some(450.0)),
            award("AwardFirst", Some(60_000)),
            award("AwardSecond", Some(60_000)),
        ];
        let (cash_offers, award_offers) = partition_offers(&offers);

        assert_eq!(best_cash(&cash_offers).unwrap().airline, "First");
        assert_eq!(best_award(&award_offers).unwrap().airline, "AwardFirst");
    }

    #[test]
    fn test_best_award_without_miles_still_selected() {
        let offers = vec![award("Unknown", None)];
        let refs: Vec<&Offer> = offers.iter().collect();

        let best = best_award(&refs).unwrap();
        assert!(best.miles_cost().is_none());
    }

    #[test]
    fn test_top_offers_truncates_and_orders() {
        let mut offers: Vec<Offer> = (1..=10)
            .rev()
            .map(|i| cash(&format!("Cash{}", i), Some(f64::from(i) * 100.0)))
            .collect();
        offers.push(award("Award", Some(60_000)));
        offers.push(cash("Missing", None));

        let top = top_offers(&offers, 10);

        assert_eq!(top.len(), 10);
        assert_eq!(top[0].airline, "Cash1");
        assert_eq!(top[9].airline, "Cash10");
        assert!(top
            .windows(2)
            .all(|pair| pair[0].rank_value() <= pair[1].rank_value()));
    }

    #[test]
    fn test_missing_values_sort_last() {
        let mut offers = vec![
            Offer::cash("Nothing", None),
            award("Award", Some(60_000)),
            Offer::award("NoMiles", None, 10.0),
            cash("Cash", Some(450.0)),
        ];

        sort_offers(&mut offers);

        assert_eq!(offers[0].airline, "Cash");
        assert_eq!(offers[1].airline, "Award");
        // Both unpriced offers keep their input order at the end
        assert_eq!(offers[2].airline, "Nothing");
        assert_eq!(offers[3].airline, "NoMiles");
    }

    #[test]
    fn test_offers_by_provider() {
        let mut tagged = cash("A", Some(1.0));
        tagged.tag("google_flights", Duration::from_millis(5));
        let offers = vec![tagged.clone(), tagged, cash("B", Some(2.0))];

        let counts = offers_by_provider(&offers);
        assert_eq!(counts.get("google_flights"), Some(&2));
        assert_eq!(counts.get("unknown"), Some(&1));
    }
}
