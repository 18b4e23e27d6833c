//! Response DTOs for the FizzBuzz API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::{Deserialize, Serialize};

use crate::cache::StatsSnapshot;
use crate::metrics::RequestCount;

/// JSON body of `GET /fizz-buzz`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonResp {
    /// The comma separated sequence
    pub txt: String,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// False when the service runs without a cache
    pub cache_enabled: bool,
    /// Share of lookups answered from the cache
    pub hit_rate: f64,
    #[serde(flatten)]
    pub stats: StatsSnapshot,
}

impl StatsResponse {
    pub fn new(stats: Option<StatsSnapshot>) -> Self {
        let cache_enabled = stats.is_some();
        let stats = stats.unwrap_or_default();
        Self {
            cache_enabled,
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for the metrics endpoint (GET /metrics)
#[derive(Debug, Clone, Serialize)]
pub struct MetricsResponse {
    /// Requests served per parameter set
    pub requests: Vec<RequestCount>,
}

/// Response body for the health endpoints (GET /health, GET /readiness)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub result: bool,
    pub messages: Vec<String>,
    /// Service version
    pub version: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(service: &str) -> Self {
        Self {
            result: true,
            messages: vec![format!("The service {} responds correctly", service)],
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// HTTP status code
    pub code: u16,
    /// Error message describing what went wrong
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
