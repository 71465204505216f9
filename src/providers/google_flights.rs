//! Google Flights provider via SerpAPI.
//!
//! Queries the SerpAPI `google_flights` engine and normalizes every entry
//! of `best_flights`, `other_flights` and `flights` into a cash offer.
//! Without a usable API key, or when the API fails and fallback is
//! enabled, the provider serves mock fares instead of failing.

use crate::config::GoogleFlightsConfig;
use crate::models::{Offer, SearchRequest};
use crate::providers::{ProviderAgent, ProviderError, ProviderResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Identifier used in provenance tags.
pub const PROVIDER_ID: &str = "google_flights";

/// Placeholder shipped in sample configs; treated as no key.
const PLACEHOLDER_KEY: &str = "your_serpapi_key_here";

/// Response sections that may hold flight entries.
const FLIGHT_SECTIONS: [&str; 3] = ["best_flights", "other_flights", "flights"];

/// Provider for cash fares from Google Flights.
#[derive(Debug)]
pub struct GoogleFlightsProvider {
    config: GoogleFlightsConfig,
    http_client: reqwest::Client,
}

/// Top-level SerpAPI response; only the parts we read.
#[derive(Debug, Default, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    best_flights: Vec<Value>,
    #[serde(default)]
    other_flights: Vec<Value>,
    #[serde(default)]
    flights: Vec<Value>,
}

impl SerpApiResponse {
    fn section(&self, name: &str) -> &[Value] {
        match name {
            "best_flights" => &self.best_flights,
            "other_flights" => &self.other_flights,
            _ => &self.flights,
        }
    }
}

/// One itinerary as returned by SerpAPI.
#[derive(Debug, Deserialize)]
struct SerpFlight {
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    airline: Option<String>,
    #[serde(default)]
    flights: Vec<SerpSegment>,
    #[serde(default)]
    layovers: Option<Vec<Value>>,
    #[serde(default)]
    total_duration: Option<Value>,
    #[serde(default)]
    booking_options: Vec<SerpBookingOption>,
}

#[derive(Debug, Deserialize)]
struct SerpSegment {
    #[serde(default)]
    airline: Option<String>,
    #[serde(default)]
    departure_airport: Option<SerpAirport>,
    #[serde(default)]
    arrival_airport: Option<SerpAirport>,
}

#[derive(Debug, Deserialize)]
struct SerpAirport {
    #[serde(default)]
    time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerpBookingOption {
    #[serde(default)]
    link: Option<String>,
}

impl GoogleFlightsProvider {
    /// Create a new provider.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Configuration` if the HTTP client cannot be built.
    pub fn new(config: GoogleFlightsConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let provider = Self {
            config,
            http_client,
        };

        if provider.api_key().is_some() {
            info!("SerpAPI key loaded for Google Flights");
        } else {
            warn!("No SerpAPI key configured; Google Flights will serve mock data");
        }

        Ok(provider)
    }

    /// Returns the API key unless it is blank or the sample placeholder.
    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_KEY)
    }

    /// Cabin label for the configured SerpAPI travel class.
    fn cabin(&self) -> &'static str {
        match self.config.travel_class {
            2 => "Premium Economy",
            3 => "Business",
            4 => "First",
            _ => "Economy",
        }
    }

    fn query_params(&self, request: &SearchRequest, api_key: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("engine", "google_flights".to_string()),
            ("departure_id", request.origin().to_string()),
            ("arrival_id", request.destination().to_string()),
            ("outbound_date", request.outbound_date().to_string()),
        ];

        // SerpAPI defaults to round trip; one-way must be explicit
        match request.return_date() {
            Some(return_date) => {
                params.push(("return_date", return_date.to_string()));
                params.push(("type", "1".to_string()));
            }
            None => params.push(("type", "2".to_string())),
        }

        params.extend([
            ("currency", self.config.currency.clone()),
            ("hl", "en".to_string()),
            ("gl", "us".to_string()),
            ("travel_class", self.config.travel_class.to_string()),
            ("deep_search", self.config.deep_search.to_string()),
            ("api_key", api_key.to_string()),
        ]);

        params
    }

    /// Call SerpAPI and normalize the response.
    async fn fetch(&self, request: &SearchRequest, api_key: &str) -> ProviderResult<Vec<Offer>> {
        debug!("Making SerpAPI request to {}", self.config.base_url);

        let response = self
            .http_client
            .get(&self.config.base_url)
            .query(&self.query_params(request, api_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::upstream_status(
                status.as_u16(),
                error_message(&body).unwrap_or(body),
            ));
        }

        let body: SerpApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::parse(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(ProviderError::upstream(error));
        }

        Ok(parse_flights(&body, self.cabin()))
    }
}

#[async_trait]
impl ProviderAgent for GoogleFlightsProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    async fn search(&self, request: &SearchRequest) -> ProviderResult<Vec<Offer>> {
        let Some(api_key) = self.api_key() else {
            warn!("No valid SerpAPI key; using mock data");
            return Ok(mock_offers(request));
        };

        info!("Searching Google Flights: {}", request);

        match self.fetch(request, api_key).await {
            Ok(offers) => {
                info!("Parsed {} flights from SerpAPI", offers.len());
                Ok(offers)
            }
            Err(e) if self.config.fallback_to_mock => {
                warn!("Google Flights search failed ({}); using mock data", e);
                Ok(mock_offers(request))
            }
            Err(e) => Err(e),
        }
    }
}

/// Pull the `error` field out of a SerpAPI error body.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("error")?
        .as_str()
        .map(String::from)
}

/// Normalize every flight entry of a response, skipping entries that do not parse.
fn parse_flights(response: &SerpApiResponse, cabin: &str) -> Vec<Offer> {
    let mut offers = Vec::new();

    for section in FLIGHT_SECTIONS {
        let entries = response.section(section);
        if entries.is_empty() {
            continue;
        }
        debug!("Found {} flights in '{}'", entries.len(), section);

        for raw in entries {
            match parse_flight(raw, cabin) {
                Ok(offer) => offers.push(offer),
                Err(e) => warn!("Skipping unparseable flight: {}", e),
            }
        }
    }

    if offers.is_empty() {
        debug!("No flights found in SerpAPI response");
    }

    offers
}

fn parse_flight(raw: &Value, cabin: &str) -> Result<Offer, serde_json::Error> {
    let flight: SerpFlight = serde_json::from_value(raw.clone())?;

    let airline = flight
        .airline
        .clone()
        .or_else(|| flight.flights.first().and_then(|s| s.airline.clone()))
        .unwrap_or_else(|| "Multiple Airlines".to_string());

    let departure = flight
        .flights
        .first()
        .and_then(|s| s.departure_airport.as_ref())
        .and_then(|a| a.time.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    let arrival = flight
        .flights
        .last()
        .and_then(|s| s.arrival_airport.as_ref())
        .and_then(|a| a.time.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    let stops = match &flight.layovers {
        Some(layovers) => layovers.len(),
        None => flight.flights.len().saturating_sub(1),
    };

    let mut offer = Offer::cash(airline, flight.price)
        .with_cabin(cabin)
        .with_times(departure, arrival)
        .with_duration(format_duration(flight.total_duration.as_ref()))
        .with_stops(u32::try_from(stops).unwrap_or(u32::MAX))
        .with_raw_data(raw.clone());

    if let Some(link) = flight.booking_options.first().and_then(|b| b.link.clone()) {
        offer = offer.with_booking_link(link);
    }

    Ok(offer)
}

/// SerpAPI reports durations in minutes; strings pass through unchanged.
fn format_duration(duration: Option<&Value>) -> String {
    match duration {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(minutes) => format!("{}h {}m", minutes / 60, minutes % 60),
            None => n.to_string(),
        },
        Some(Value::String(s)) => s.clone(),
        _ => "Unknown".to_string(),
    }
}

/// Fares served when SerpAPI is unavailable.
fn mock_offers(request: &SearchRequest) -> Vec<Offer> {
    let route = request.route();
    let raw = json!({"mock": true, "outbound_date": request.outbound_date().to_string()});

    vec![
        Offer::cash("American Airlines", Some(450.0))
            .with_times("08:00 AM", "11:30 AM")
            .with_duration("5h 30m")
            .with_stops(0)
            .with_route(route.clone())
            .with_raw_data(raw.clone()),
        Offer::cash("Delta", Some(520.0))
            .with_times("02:15 PM", "06:45 PM")
            .with_duration("6h 30m")
            .with_stops(1)
            .with_route(route)
            .with_raw_data(raw),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> SearchRequest {
        SearchRequest::new("NYC", "TYO", "2026-07-15", Some("2026-07-25")).unwrap()
    }

    fn provider(base_url: String, api_key: Option<&str>, fallback: bool) -> GoogleFlightsProvider {
        GoogleFlightsProvider::new(GoogleFlightsConfig {
            base_url,
            api_key: api_key.map(String::from),
            fallback_to_mock: fallback,
            timeout_seconds: 5,
            ..GoogleFlightsConfig::default()
        })
        .unwrap()
    }

    fn serpapi_body() -> Value {
        json!({
            "search_metadata": {"status": "Success"},
            "best_flights": [{
                "flights": [
                    {
                        "airline": "ANA",
                        "departure_airport": {"id": "JFK", "time": "2026-07-15 11:25"},
                        "arrival_airport": {"id": "HND", "time": "2026-07-16 14:40"}
                    }
                ],
                "total_duration": 855,
                "price": 1890,
                "booking_options": [{"link": "https://example.test/book/1"}]
            }],
            "other_flights": [
                {
                    "airline": "United",
                    "flights": [
                        {"departure_airport": {"time": "2026-07-15 07:00"}},
                        {"arrival_airport": {"time": "2026-07-16 18:05"}}
                    ],
                    "layovers": [{"id": "SFO"}],
                    "total_duration": "19h 5m",
                    "price": 1420.5
                },
                {"flights": "not-a-list", "price": 999}
            ]
        })
    }

    #[test]
    fn test_search_without_key_returns_mock_data() {
        let provider = provider("http://127.0.0.1:9".to_string(), None, true);
        let offers = tokio_test::block_on(provider.search(&request())).unwrap();

        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0].airline, "American Airlines");
        assert_eq!(offers[0].price(), Some(450.0));
        assert_eq!(offers[1].airline, "Delta");
        assert_eq!(offers[1].stops, 1);
        assert_eq!(offers[0].raw_data["mock"], true);
    }

    #[test]
    fn test_placeholder_key_counts_as_missing() {
        let provider = provider(String::new(), Some(PLACEHOLDER_KEY), false);
        assert!(provider.api_key().is_none());

        let provider = GoogleFlightsProvider::new(GoogleFlightsConfig {
            api_key: Some("  ".to_string()),
            ..GoogleFlightsConfig::default()
        })
        .unwrap();
        assert!(provider.api_key().is_none());
    }

    #[tokio::test]
    async fn test_parses_serpapi_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("engine", "google_flights"))
            .and(query_param("departure_id", "NYC"))
            .and(query_param("arrival_id", "TYO"))
            .and(query_param("return_date", "2026-07-25"))
            .and(query_param("api_key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serpapi_body()))
            .mount(&server)
            .await;

        let provider = provider(format!("{}/search.json", server.uri()), Some("secret"), false);
        let offers = provider.search(&request()).await.unwrap();

        // The malformed third entry is skipped
        assert_eq!(offers.len(), 2);

        let ana = &offers[0];
        assert_eq!(ana.airline, "ANA");
        assert_eq!(ana.price(), Some(1890.0));
        assert_eq!(ana.stops, 0);
        assert_eq!(ana.duration, "14h 15m");
        assert_eq!(ana.departure_time, "2026-07-15 11:25");
        assert_eq!(ana.arrival_time, "2026-07-16 14:40");
        assert_eq!(ana.cabin.as_deref(), Some("Business"));
        assert_eq!(ana.booking_link.as_deref(), Some("https://example.test/book/1"));
        assert_eq!(ana.raw_data["total_duration"], 855);

        let united = &offers[1];
        assert_eq!(united.airline, "United");
        assert_eq!(united.stops, 1);
        assert_eq!(united.duration, "19h 5m");
        assert_eq!(united.arrival_time, "2026-07-16 18:05");
        assert!(united.booking_link.is_none());
    }

    #[tokio::test]
    async fn test_one_way_search_sets_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("type", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"flights": []})))
            .expect(1)
            .mount(&server)
            .await;

        let one_way = SearchRequest::new("NYC", "TYO", "2026-07-15", None).unwrap();
        let provider = provider(server.uri(), Some("secret"), false);
        let offers = provider.search(&one_way).await.unwrap();
        assert!(offers.is_empty());
    }

    #[tokio::test]
    async fn test_api_error_falls_back_to_mock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"error": "Invalid API key."})),
            )
            .mount(&server)
            .await;

        let provider = provider(server.uri(), Some("bad"), true);
        let offers = provider.search(&request()).await.unwrap();
        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0].raw_data["mock"], true);
    }

    #[tokio::test]
    async fn test_http_error_without_fallback_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid API key."})),
            )
            .mount(&server)
            .await;

        let provider = provider(server.uri(), Some("bad"), false);
        let err = provider.search(&request()).await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::upstream_status(401, "Invalid API key.")
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Some(&json!(330))), "5h 30m");
        assert_eq!(format_duration(Some(&json!("6h 30m"))), "6h 30m");
        assert_eq!(format_duration(None), "Unknown");
    }
}
