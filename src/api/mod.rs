//! API Module
//!
//! HTTP handlers and routing for the FizzBuzz service.
//!
//! # Endpoints
//! - `GET /fizz-buzz` - FizzBuzz sequence served through the response cache
//! - `GET /health` - Health check endpoint
//! - `GET /readiness` - Readiness check endpoint
//! - `GET /stats` - Cache statistics
//! - `GET /metrics` - Request counters

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
