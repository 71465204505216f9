//! Offer analysis.
//!
//! Ranking helpers, the mile valuation table and the engine that turns a
//! merged offer list into a cash-vs-miles recommendation.

pub mod engine;
pub mod ranking;
pub mod valuation;

pub use engine::{AnalysisEngine, DEFAULT_TOP_N};
pub use valuation::MileValuation;
