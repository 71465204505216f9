//! Data models for flight search and analysis.
//!
//! This module contains the core data structures shared by the providers,
//! the search orchestrator and the analysis engine: the validated
//! [`SearchRequest`], the normalized [`Offer`], and the derived
//! [`AnalysisResult`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Date format accepted for outbound and return dates.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Error raised when a search request is malformed.
///
/// Produced at the boundary (CLI or HTTP) and never seen by the core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was absent or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A date field could not be parsed.
    #[error("invalid {field}: '{value}' is not a YYYY-MM-DD date")]
    InvalidDate {
        /// Name of the offending field.
        field: &'static str,
        /// The raw value supplied.
        value: String,
    },

    /// The return date precedes the outbound date.
    #[error("return date {return_date} is before outbound date {outbound_date}")]
    ReturnBeforeOutbound {
        /// Outbound date.
        outbound_date: NaiveDate,
        /// Return date.
        return_date: NaiveDate,
    },
}

/// A validated flight search request.
///
/// Location codes are normalized to upper case. Instances can only be
/// built through [`SearchRequest::new`], so every request that reaches
/// the orchestrator is well formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    origin: String,
    destination: String,
    outbound_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_date: Option<NaiveDate>,
}

impl SearchRequest {
    /// Validate raw inputs and build a request.
    ///
    /// A blank `return_date` is treated as a one-way search.
    pub fn new(
        origin: &str,
        destination: &str,
        outbound_date: &str,
        return_date: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let origin = required("origin", origin)?.to_uppercase();
        let destination = required("destination", destination)?.to_uppercase();
        let outbound_date = parse_date("outbound_date", required("outbound_date", outbound_date)?)?;

        let return_date = match return_date.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(parse_date("return_date", raw)?),
            None => None,
        };

        if let Some(return_date) = return_date {
            if return_date < outbound_date {
                return Err(ValidationError::ReturnBeforeOutbound {
                    outbound_date,
                    return_date,
                });
            }
        }

        Ok(Self {
            origin,
            destination,
            outbound_date,
            return_date,
        })
    }

    /// Origin location code.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Destination location code.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Outbound travel date.
    pub fn outbound_date(&self) -> NaiveDate {
        self.outbound_date
    }

    /// Return travel date, if this is a round trip.
    pub fn return_date(&self) -> Option<NaiveDate> {
        self.return_date
    }

    /// Returns the route as a display string (e.g. `NYC → TYO`).
    pub fn route(&self) -> String {
        format!("{} → {}", self.origin, self.destination)
    }
}

impl fmt::Display for SearchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.route(), self.outbound_date)?;
        if let Some(return_date) = self.return_date {
            write!(f, ", returning {}", return_date)?;
        }
        Ok(())
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value)
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// How an offer is paid for.
///
/// Serialized inline into the offer under a `flight_type` tag, so a cash
/// offer carries `price` and an award offer carries `miles_cost` and
/// `cash_cost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flight_type", rename_all = "lowercase")]
pub enum Fare {
    /// A fare paid in money (USD).
    Cash {
        /// Fare amount; may be absent when the source did not quote one.
        #[serde(default)]
        price: Option<f64>,
    },
    /// A redemption paid in loyalty miles plus residual fees.
    Award {
        /// Miles required; may be absent when the source did not quote it.
        #[serde(default)]
        miles_cost: Option<u64>,
        /// Taxes and fees due in cash (USD).
        #[serde(default)]
        cash_cost: f64,
    },
}

impl Fare {
    /// Returns the `flight_type` label of this fare.
    pub fn label(&self) -> &'static str {
        match self {
            Fare::Cash { .. } => "cash",
            Fare::Award { .. } => "award",
        }
    }
}

/// Where an offer came from and how long it took to arrive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Identifier of the provider agent that produced the offer.
    pub agent: String,
    /// Milliseconds elapsed since dispatch start when the offer was merged.
    pub elapsed_ms: u64,
}

/// A normalized flight option from any provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    /// Operating or marketing carrier name.
    pub airline: String,
    /// Cash or award payload.
    #[serde(flatten)]
    pub fare: Fare,
    /// Cabin class, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cabin: Option<String>,
    /// Departure time as displayed by the source.
    pub departure_time: String,
    /// Arrival time as displayed by the source.
    pub arrival_time: String,
    /// Total travel duration as displayed by the source.
    pub duration: String,
    /// Number of intermediate stops.
    pub stops: u32,
    /// Route label (e.g. `NYC → TYO`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Seat availability hint from award sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    /// Link to book the fare, when the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_link: Option<String>,
    /// Added by the orchestrator after retrieval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
    /// Untouched provider payload, kept for traceability.
    #[serde(default)]
    pub raw_data: Value,
}

impl Offer {
    /// Creates a cash offer with placeholder schedule fields.
    pub fn cash(airline: impl Into<String>, price: Option<f64>) -> Self {
        Self::with_fare(airline, Fare::Cash { price })
    }

    /// Creates an award offer with placeholder schedule fields.
    pub fn award(airline: impl Into<String>, miles_cost: Option<u64>, cash_cost: f64) -> Self {
        Self::with_fare(
            airline,
            Fare::Award {
                miles_cost,
                cash_cost,
            },
        )
    }

    fn with_fare(airline: impl Into<String>, fare: Fare) -> Self {
        Self {
            airline: airline.into(),
            fare,
            cabin: None,
            departure_time: "Unknown".to_string(),
            arrival_time: "Unknown".to_string(),
            duration: "Unknown".to_string(),
            stops: 0,
            route: None,
            availability: None,
            booking_link: None,
            provenance: None,
            raw_data: Value::Null,
        }
    }

    /// Sets departure and arrival display times.
    #[must_use]
    pub fn with_times(mut self, departure: impl Into<String>, arrival: impl Into<String>) -> Self {
        self.departure_time = departure.into();
        self.arrival_time = arrival.into();
        self
    }

    /// Sets the duration display string.
    #[must_use]
    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    /// Sets the stop count.
    #[must_use]
    pub fn with_stops(mut self, stops: u32) -> Self {
        self.stops = stops;
        self
    }

    /// Sets the cabin class.
    #[must_use]
    pub fn with_cabin(mut self, cabin: impl Into<String>) -> Self {
        self.cabin = Some(cabin.into());
        self
    }

    /// Sets the route label.
    #[must_use]
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Sets the availability hint.
    #[must_use]
    pub fn with_availability(mut self, availability: impl Into<String>) -> Self {
        self.availability = Some(availability.into());
        self
    }

    /// Sets the booking link.
    #[must_use]
    pub fn with_booking_link(mut self, link: impl Into<String>) -> Self {
        self.booking_link = Some(link.into());
        self
    }

    /// Attaches the raw provider payload.
    #[must_use]
    pub fn with_raw_data(mut self, raw: Value) -> Self {
        self.raw_data = raw;
        self
    }

    /// Returns true for miles redemptions.
    pub fn is_award(&self) -> bool {
        matches!(self.fare, Fare::Award { .. })
    }

    /// Returns the cash price if it is a usable number.
    ///
    /// Zero, negative and non-finite prices count as missing.
    pub fn price(&self) -> Option<f64> {
        match self.fare {
            Fare::Cash { price } => price.filter(|p| p.is_finite() && *p > 0.0),
            Fare::Award { .. } => None,
        }
    }

    /// Returns the miles cost of an award offer.
    pub fn miles_cost(&self) -> Option<u64> {
        match self.fare {
            Fare::Award { miles_cost, .. } => miles_cost,
            Fare::Cash { .. } => None,
        }
    }

    /// Returns the residual cash fees of an award offer.
    pub fn cash_cost(&self) -> Option<f64> {
        match self.fare {
            Fare::Award { cash_cost, .. } => Some(cash_cost),
            Fare::Cash { .. } => None,
        }
    }

    /// Sort key for the mixed ranking: price, else miles, else infinity.
    pub fn rank_value(&self) -> f64 {
        match self.fare {
            Fare::Cash { .. } => self.price().unwrap_or(f64::INFINITY),
            Fare::Award { .. } => self
                .miles_cost()
                .map(|miles| miles as f64)
                .unwrap_or(f64::INFINITY),
        }
    }

    /// Records which agent produced this offer and when it was merged.
    pub fn tag(&mut self, agent: &str, elapsed: Duration) {
        self.provenance = Some(Provenance {
            agent: agent.to_string(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        });
    }
}

/// Outcome of the cash-vs-miles comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    /// Redeeming miles beats paying cash by a wide margin.
    AwardBetter,
    /// Paying cash beats redeeming miles.
    CashBetter,
    /// Neither option clearly wins.
    Similar,
}

impl fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationKind::AwardBetter => write!(f, "award_better"),
            RecommendationKind::CashBetter => write!(f, "cash_better"),
            RecommendationKind::Similar => write!(f, "similar"),
        }
    }
}

impl RecommendationKind {
    /// Returns an emoji representation of the recommendation.
    pub fn emoji(&self) -> &'static str {
        match self {
            RecommendationKind::AwardBetter => "✨",
            RecommendationKind::CashBetter => "💰",
            RecommendationKind::Similar => "🤷",
        }
    }
}

/// A human-readable recommendation with its numeric justification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Which option is recommended.
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    /// Short advice.
    pub message: String,
    /// Numbers behind the advice.
    pub details: String,
}

/// Numbers behind a cash-vs-miles comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueComparison {
    /// Cash price of the best cash offer (USD).
    pub cash_price: f64,
    /// Miles required by the best award offer.
    pub miles_cost: u64,
    /// Valuation applied to each mile, in cents.
    pub cents_per_mile: f64,
    /// Miles converted to dollars at `cents_per_mile`.
    pub redemption_cash_equivalent: f64,
    /// Taxes and fees due on the award (USD).
    pub award_cash_cost: f64,
    /// Redemption value plus fees (USD).
    pub total_award_cost: f64,
    /// Cash price minus total award cost; positive favours miles.
    pub savings: f64,
}

/// Result of analysing one search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// One-line description of what was found.
    pub summary: String,
    /// Number of cash offers considered.
    pub cash_count: usize,
    /// Number of award offers considered.
    pub award_count: usize,
    /// Cheapest cash offer.
    pub best_cash_option: Option<Offer>,
    /// Award offer needing the fewest miles.
    pub best_award_option: Option<Offer>,
    /// Comparison numbers, when both bests could be priced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_comparison: Option<ValueComparison>,
    /// Advice derived from the comparison.
    pub recommendations: Vec<Recommendation>,
    /// Top offers, best first.
    pub all_options: Vec<Offer>,
    /// The request that produced these results.
    pub search_params: SearchRequest,
}

impl AnalysisResult {
    /// Creates the result for a search that found nothing.
    pub fn empty(request: &SearchRequest) -> Self {
        Self {
            summary: "No flights found".to_string(),
            cash_count: 0,
            award_count: 0,
            best_cash_option: None,
            best_award_option: None,
            value_comparison: None,
            recommendations: Vec::new(),
            all_options: Vec::new(),
            search_params: request.clone(),
        }
    }

    /// Returns the single recommendation, if one was made.
    pub fn recommendation(&self) -> Option<&Recommendation> {
        self.recommendations.first()
    }
}
