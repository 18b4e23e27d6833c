//! API Handlers
//!
//! HTTP request handlers for each FizzBuzz service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use tracing::{debug, warn};

use crate::cache::{compute_fn, CacheKey, ComputeFn, ResponseCache};
use crate::config::{Config, ParameterLimits};
use crate::error::{AppError, ComputeError};
use crate::fizzbuzz::{self, FizzBuzzParams, OutputFormat};
use crate::metrics::RequestCounter;
use crate::models::{FizzBuzzQuery, HealthResponse, MetricsResponse, StatsResponse};

const SERVICE_NAME: &str = "fizz-buzz";

/// Application state shared across all handlers.
///
/// Every field is reference counted, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Response cache, `None` when caching is disabled
    pub cache: Option<ResponseCache>,
    /// Function producing response bodies
    pub compute: ComputeFn,
    /// Bounds for request parameters
    pub limits: ParameterLimits,
    /// Per parameter set request counters
    pub requests: Arc<RequestCounter>,
}

impl AppState {
    pub fn new(cache: Option<ResponseCache>, compute: ComputeFn, limits: ParameterLimits) -> Self {
        Self {
            cache,
            compute,
            limits,
            requests: Arc::new(RequestCounter::new()),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// An invalid cache configuration is logged and the service runs
    /// uncached rather than refusing to start.
    pub fn from_config(config: &Config) -> Self {
        let cache = if config.cache_enabled {
            match ResponseCache::new(config.cache()) {
                Ok(cache) => Some(cache),
                Err(e) => {
                    warn!(error = %e, "Invalid cache configuration, running without cache");
                    None
                }
            }
        } else {
            None
        };

        Self::new(cache, compute_fn(fizzbuzz::render), config.limits)
    }
}

/// Handler for GET /fizz-buzz
///
/// The output format follows the request `Content-Type`. Validation
/// failures answer 412 in that same format.
pub async fn fizz_buzz_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FizzBuzzQuery>,
) -> Response {
    let format = OutputFormat::from_content_type(
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
    );

    match serve_fizz_buzz(&state, &query, format).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, format.content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            debug!(error = %e, "FizzBuzz request rejected");
            e.into_response_for(format)
        }
    }
}

async fn serve_fizz_buzz(
    state: &AppState,
    query: &FizzBuzzQuery,
    format: OutputFormat,
) -> Result<Bytes, AppError> {
    let params = query.validate(&state.limits, format)?;
    state.requests.record(&params);

    let body = match &state.cache {
        Some(cache) => cache.fetch(&CacheKey::from_params(&params), &state.compute).await?,
        None => compute_uncached(Arc::clone(&state.compute), params).await?,
    };

    Ok(body)
}

async fn compute_uncached(compute: ComputeFn, params: FizzBuzzParams) -> Result<Bytes, ComputeError> {
    let body = tokio::task::spawn_blocking(move || compute(&params))
        .await
        .map_err(|e| ComputeError::Aborted(e.to_string()))??;
    Ok(Bytes::from(body))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.cache.as_ref().map(ResponseCache::stats),
    ))
}

/// Handler for GET /metrics
///
/// Returns request counts per parameter set, most requested first.
pub async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        requests: state.requests.snapshot(),
    })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(SERVICE_NAME))
}

/// Handler for GET /readiness
pub async fn readiness_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(SERVICE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use axum::http::HeaderValue;

    fn query(limit: &str) -> FizzBuzzQuery {
        FizzBuzzQuery {
            limit: Some(limit.to_string()),
            nb_one: Some("3".to_string()),
            nb_two: Some("5".to_string()),
            str_one: Some("fizz".to_string()),
            str_two: Some("buzz".to_string()),
        }
    }

    fn cached_state() -> AppState {
        let cache = ResponseCache::new(CacheConfig::default()).unwrap();
        AppState::new(
            Some(cache),
            compute_fn(fizzbuzz::render),
            ParameterLimits::default(),
        )
    }

    async fn body_of(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_fizz_buzz_handler_text() {
        let state = cached_state();

        let response =
            fizz_buzz_handler(State(state), HeaderMap::new(), Query(query("15"))).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            body_of(response).await,
            "1,2,fizz,4,buzz,fizz,7,8,fizz,buzz,11,fizz,13,14,fizzbuzz"
        );
    }

    #[tokio::test]
    async fn test_fizz_buzz_handler_json() {
        let state = cached_state();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let response = fizz_buzz_handler(State(state), headers, Query(query("5"))).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_of(response).await, r#"{"txt":"1,2,fizz,4,buzz"}"#);
    }

    #[tokio::test]
    async fn test_fizz_buzz_handler_rejects_invalid_limit() {
        let state = cached_state();

        let response =
            fizz_buzz_handler(State(state.clone()), HeaderMap::new(), Query(query("abc"))).await;

        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
        // Rejected requests are not counted
        assert!(state.requests.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_fizz_buzz_handler_without_cache() {
        let state = AppState::new(
            None,
            compute_fn(fizzbuzz::render),
            ParameterLimits::default(),
        );

        let response =
            fizz_buzz_handler(State(state.clone()), HeaderMap::new(), Query(query("3"))).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await, "1,2,fizz");
        assert_eq!(state.requests.snapshot()[0].count, 1);
    }

    #[tokio::test]
    async fn test_fizz_buzz_handler_compute_failure() {
        let failing = compute_fn(|_: &FizzBuzzParams| {
            Err(ComputeError::Failed("renderer unavailable".to_string()))
        });
        let state = AppState::new(None, failing, ParameterLimits::default());

        let response = fizz_buzz_handler(State(state), HeaderMap::new(), Query(query("3"))).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_of(response).await,
            "Computation failed: renderer unavailable"
        );
    }

    #[tokio::test]
    async fn test_stats_handler_reports_disabled_cache() {
        let state = AppState::new(
            None,
            compute_fn(fizzbuzz::render),
            ParameterLimits::default(),
        );

        let Json(stats) = stats_handler(State(state)).await;

        assert!(!stats.cache_enabled);
        assert_eq!(stats.stats.entries, 0);
    }

    #[tokio::test]
    async fn test_stats_handler_counts_cached_entries() {
        let state = cached_state();

        let _ = fizz_buzz_handler(State(state.clone()), HeaderMap::new(), Query(query("5"))).await;
        let _ = fizz_buzz_handler(State(state.clone()), HeaderMap::new(), Query(query("5"))).await;

        let Json(stats) = stats_handler(State(state)).await;

        assert!(stats.cache_enabled);
        assert_eq!(stats.stats.entries, 1);
        assert_eq!(stats.stats.misses, 1);
        assert_eq!(stats.stats.hits, 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let Json(health) = health_handler().await;
        assert!(health.result);
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_from_config_respects_cache_flag() {
        let config = Config {
            cache_enabled: false,
            ..Config::default()
        };
        assert!(AppState::from_config(&config).cache.is_none());

        assert!(AppState::from_config(&Config::default()).cache.is_some());
    }

    #[test]
    fn test_from_config_falls_back_on_invalid_cache_config() {
        let config = Config {
            entry_ttl: 0,
            ..Config::default()
        };
        assert!(AppState::from_config(&config).cache.is_none());
    }
}
