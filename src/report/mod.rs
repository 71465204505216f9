//! Search report rendering.

pub mod generator;

pub use generator::{render, write_report};

use crate::models::AnalysisResult;
use crate::orchestrator::DispatchStats;
use crate::service::SearchOutcome;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Report metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Route searched (e.g. `NYC → TYO`).
    pub route: String,
    pub outbound_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Wall-clock duration of the whole search, in seconds.
    pub duration_seconds: f64,
}

/// Complete report for one search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub metadata: ReportMetadata,
    pub analysis: AnalysisResult,
    pub providers: DispatchStats,
}

impl SearchReport {
    /// Wraps a search outcome with report metadata.
    pub fn new(outcome: SearchOutcome, duration_seconds: f64) -> Self {
        let request = &outcome.analysis.search_params;
        let metadata = ReportMetadata {
            route: request.route(),
            outbound_date: request.outbound_date(),
            return_date: request.return_date(),
            generated_at: Utc::now(),
            duration_seconds,
        };

        Self {
            metadata,
            analysis: outcome.analysis,
            providers: outcome.providers,
        }
    }
}
