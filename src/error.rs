//! Error types for the FizzBuzz service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::fizzbuzz::OutputFormat;
use crate::models::ErrorResponse;

// == Compute Error ==
/// Failure of the compute function backing the response cache.
///
/// Never stored in either cache store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputeError {
    /// The compute function itself reported a failure
    #[error("Computation failed: {0}")]
    Failed(String),

    /// The blocking task running the computation panicked or was cancelled
    #[error("Computation aborted: {0}")]
    Aborted(String),
}

// == Config Error ==
/// Invalid cache configuration, detected when the cache is constructed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

// == App Error ==
/// HTTP-facing error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or out-of-range request parameter
    #[error("{0}")]
    InvalidParameter(String),

    /// The computation failed
    #[error(transparent)]
    Compute(#[from] ComputeError),
}

impl AppError {
    /// HTTP status associated with the error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidParameter(_) => StatusCode::PRECONDITION_FAILED,
            AppError::Compute(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Renders the error in the format the client asked for.
    ///
    /// JSON clients get an `ErrorResponse` body, everybody else gets the
    /// message as plain text.
    pub fn into_response_for(self, format: OutputFormat) -> Response {
        let status = self.status();
        match format {
            OutputFormat::Json => {
                let body = ErrorResponse::new(status.as_u16(), self.to_string());
                (status, Json(body)).into_response()
            }
            OutputFormat::Text => (
                status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                self.to_string(),
            )
                .into_response(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_for(OutputFormat::Json)
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP layer.
pub type Result<T> = std::result::Result<T, AppError>;
