//! Markdown and JSON report generation.
//!
//! This module renders a [`SearchReport`] for terminals, files and
//! downstream tooling.

use super::{ReportMetadata, SearchReport};
use crate::analysis::engine::format_miles;
use crate::analysis::ranking::offers_by_provider;
use crate::cli::OutputFormat;
use crate::models::{Fare, Offer, Recommendation, ValueComparison};
use crate::orchestrator::DispatchStats;
use anyhow::{Context, Result};
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &SearchReport) -> String {
    let mut output = String::new();

    output.push_str("# FareScout Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));

    output.push_str(&format!("**{}**\n\n", report.analysis.summary));

    output.push_str(&generate_recommendation_section(report.analysis.recommendation()));

    if let Some(ref comparison) = report.analysis.value_comparison {
        output.push_str(&generate_comparison_section(comparison));
    }

    output.push_str(&generate_best_options_section(
        report.analysis.best_cash_option.as_ref(),
        report.analysis.best_award_option.as_ref(),
    ));

    output.push_str(&generate_options_table(&report.analysis.all_options));

    output.push_str(&generate_providers_section(&report.providers));

    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Search\n\n");
    section.push_str(&format!("- **Route:** {}\n", metadata.route));
    section.push_str(&format!("- **Outbound:** {}\n", metadata.outbound_date));
    match metadata.return_date {
        Some(date) => section.push_str(&format!("- **Return:** {}\n", date)),
        None => section.push_str("- **Return:** one-way\n"),
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Search Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_recommendation_section(recommendation: Option<&Recommendation>) -> String {
    let mut section = String::new();

    section.push_str("## Recommendation\n\n");

    match recommendation {
        Some(rec) => {
            section.push_str(&format!("### {} {}\n\n", rec.kind.emoji(), rec.message));
            section.push_str(&format!("{}\n\n", rec.details));
        }
        None => {
            section.push_str(
                "No recommendation: a priced cash fare and an award fare are both needed to compare.\n\n",
            );
        }
    }

    section
}

fn generate_comparison_section(comparison: &ValueComparison) -> String {
    let mut section = String::new();

    section.push_str("## Value Comparison\n\n");
    section.push_str("| | Amount |\n");
    section.push_str("|:---|---:|\n");
    section.push_str(&format!("| Cash fare | ${:.2} |\n", comparison.cash_price));
    section.push_str(&format!(
        "| Miles required | {} |\n",
        format_miles(comparison.miles_cost)
    ));
    section.push_str(&format!(
        "| Mile value | {:.2}¢ |\n",
        comparison.cents_per_mile
    ));
    section.push_str(&format!(
        "| Miles worth | ${:.2} |\n",
        comparison.redemption_cash_equivalent
    ));
    section.push_str(&format!(
        "| Award taxes & fees | ${:.2} |\n",
        comparison.award_cash_cost
    ));
    section.push_str(&format!(
        "| Total award cost | ${:.2} |\n",
        comparison.total_award_cost
    ));
    section.push_str(&format!(
        "| **Savings with miles** | **${:.2}** |\n\n",
        comparison.savings
    ));

    section
}

fn generate_best_options_section(cash: Option<&Offer>, award: Option<&Offer>) -> String {
    if cash.is_none() && award.is_none() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Best Options\n\n");

    if let Some(offer) = cash {
        section.push_str(&format!("- 💵 **Cash:** {}\n", describe_offer(offer)));
    }
    if let Some(offer) = award {
        section.push_str(&format!("- 🎟️ **Award:** {}\n", describe_offer(offer)));
    }
    section.push('\n');

    section
}

fn generate_options_table(offers: &[Offer]) -> String {
    let mut section = String::new();

    section.push_str("## Top Options\n\n");

    if offers.is_empty() {
        section.push_str("No flights were returned for this search.\n\n");
        return section;
    }

    section.push_str("| # | Airline | Type | Cost | Cabin | Stops | Duration | Departs | Arrives | Source |\n");
    section.push_str("|:---:|:---|:---|---:|:---|:---:|:---|:---|:---|:---|\n");

    for (i, offer) in offers.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
            i + 1,
            table_cell(&offer.airline),
            offer.fare.label(),
            cost_label(offer),
            table_cell(offer.cabin.as_deref().unwrap_or("-")),
            offer.stops,
            table_cell(&offer.duration),
            table_cell(&offer.departure_time),
            table_cell(&offer.arrival_time),
            table_cell(
                offer
                    .provenance
                    .as_ref()
                    .map_or("-", |p| p.agent.as_str())
            ),
        ));
    }
    section.push('\n');

    // Per-provider breakdown of the ranked list
    let counts = offers_by_provider(offers);
    if counts.len() > 1 {
        let breakdown: Vec<String> = counts
            .iter()
            .map(|(provider, count)| format!("{} ({})", provider, count))
            .collect();
        section.push_str(&format!("*Sources: {}*\n\n", breakdown.join(", ")));
    }

    section
}

fn generate_providers_section(stats: &DispatchStats) -> String {
    let mut section = String::new();

    section.push_str("## Providers\n\n");
    section.push_str(&format!(
        "{} of {} providers responded in {}ms.\n\n",
        stats.providers_responded, stats.providers_queried, stats.elapsed_ms
    ));

    for failure in &stats.failures {
        section.push_str(&format!(
            "- ⚠️ `{}` failed: {}\n",
            failure.provider, failure.error
        ));
    }
    for provider in &stats.timed_out {
        section.push_str(&format!("- ⏱️ `{}` timed out\n", provider));
    }
    if !stats.failures.is_empty() || !stats.timed_out.is_empty() {
        section.push('\n');
    }

    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by FareScout*\n".to_string()
}

/// Escape provider text for a Markdown table cell.
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn cost_label(offer: &Offer) -> String {
    match offer.fare {
        Fare::Cash { .. } => offer
            .price()
            .map_or_else(|| "n/a".to_string(), |price| format!("${:.2}", price)),
        Fare::Award { cash_cost, .. } => match offer.miles_cost() {
            Some(miles) => format!("{} mi + ${:.2}", format_miles(miles), cash_cost),
            None => "n/a".to_string(),
        },
    }
}

fn describe_offer(offer: &Offer) -> String {
    let mut text = format!("{} {}", offer.airline, cost_label(offer));

    if let Some(ref cabin) = offer.cabin {
        text.push_str(&format!(", {}", cabin));
    }

    let stops = match offer.stops {
        0 => "nonstop".to_string(),
        1 => "1 stop".to_string(),
        n => format!("{} stops", n),
    };
    text.push_str(&format!(", {}, {}", stops, offer.duration));

    if let Some(ref availability) = offer.availability {
        text.push_str(&format!(" (availability: {})", availability));
    }
    if let Some(ref link) = offer.booking_link {
        text.push_str(&format!(" [book]({})", link));
    }

    text
}

/// Generate a JSON report.
pub fn generate_json_report(report: &SearchReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Render the report in the requested format.
pub fn render(report: &SearchReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => generate_json_report(report),
        OutputFormat::Markdown => Ok(generate_markdown_report(report)),
    }
}

/// Write the report to a file.
pub fn write_report(report: &SearchReport, format: OutputFormat, path: &Path) -> Result<()> {
    let content = render(report, format)?;

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisEngine;
    use crate::models::SearchRequest;
    use crate::orchestrator::ProviderFailure;
    use crate::service::SearchOutcome;
    use std::time::Duration;

    fn create_test_report(offers: Vec<Offer>) -> SearchReport {
        let request = SearchRequest::new("NYC", "TYO", "2026-07-15", None).unwrap();
        let analysis = AnalysisEngine::default().analyze(&offers, &request);

        let providers = DispatchStats {
            providers_queried: 3,
            providers_responded: 2,
            failures: vec![ProviderFailure {
                provider: "broken".to_string(),
                error: "connection error: refused".to_string(),
            }],
            timed_out: Vec::new(),
            elapsed_ms: 1012,
        };

        SearchReport::new(
            SearchOutcome {
                analysis,
                providers,
            },
            1.2,
        )
    }

    fn sample_offers() -> Vec<Offer> {
        let mut cash = Offer::cash("Delta", Some(1000.0))
            .with_stops(1)
            .with_duration("14h 5m");
        cash.tag("google_flights", Duration::from_millis(300));

        let mut award = Offer::award("American Airlines", Some(60_000), 45.60)
            .with_cabin("Economy")
            .with_availability("Good");
        award.tag("aa_award", Duration::from_millis(1000));

        vec![cash, award]
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report(sample_offers());
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# FareScout Report"));
        assert!(markdown.contains("- **Route:** NYC → TYO"));
        assert!(markdown.contains("- **Return:** one-way"));
        assert!(markdown.contains("### ✨ Use miles! Save ~$234.40"));
        assert!(markdown.contains("| Total award cost | $765.60 |"));
        assert!(markdown.contains("60,000 mi + $45.60"));
        assert!(markdown.contains("*Sources: aa_award (1), google_flights (1)*"));
        assert!(markdown.contains("2 of 3 providers responded"));
        assert!(markdown.contains("`broken` failed"));
    }

    #[test]
    fn test_markdown_without_results() {
        let report = create_test_report(Vec::new());
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("**No flights found**"));
        assert!(markdown.contains("No recommendation"));
        assert!(markdown.contains("No flights were returned"));
        assert!(!markdown.contains("## Value Comparison"));
        assert!(!markdown.contains("## Best Options"));
    }

    #[test]
    fn test_table_escapes_provider_text() {
        let offers = vec![Offer::cash("Acme | Air", Some(300.0)).with_duration("5h\n10m")];
        let table = generate_options_table(&offers);

        let row = table
            .lines()
            .find(|line| line.starts_with("| 1 |"))
            .unwrap();
        assert!(row.contains("Acme \\| Air"));
        assert!(row.contains("5h 10m"));
        // Ten columns means eleven unescaped separators
        assert_eq!(row.replace("\\|", "").matches('|').count(), 11);
    }

    #[test]
    fn test_describe_offer() {
        let offer = Offer::cash("Delta", Some(520.0))
            .with_stops(1)
            .with_duration("6h 30m")
            .with_booking_link("https://example.com/book");

        assert_eq!(
            describe_offer(&offer),
            "Delta $520.00, 1 stop, 6h 30m [book](https://example.com/book)"
        );
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report(sample_offers());
        let json = generate_json_report(&report).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metadata"]["route"], "NYC → TYO");
        assert_eq!(value["analysis"]["recommendations"][0]["type"], "award_better");
        assert_eq!(value["analysis"]["all_options"][1]["flight_type"], "award");
        assert_eq!(value["providers"]["failures"][0]["provider"], "broken");
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        let report = create_test_report(sample_offers());

        write_report(&report, OutputFormat::Markdown, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# FareScout Report"));
    }
}
