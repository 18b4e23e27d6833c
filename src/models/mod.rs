//! Request and Response models for the FizzBuzz API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::FizzBuzzQuery;
pub use responses::{ErrorResponse, HealthResponse, JsonResp, MetricsResponse, StatsResponse};
