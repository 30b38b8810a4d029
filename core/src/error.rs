//! Error types for the Redmine request translator.
//!
//! # Design
//! Translation errors (`MissingRequiredParameter`, `InvalidParameter`,
//! `UnsupportedOperation`, `UnknownResource`) are raised before any request
//! exists, so a caller never receives a half-built request. Response errors
//! keep `NotFound` separate from other non-2xx statuses, the same split the
//! service itself makes.

use thiserror::Error;

/// Result type alias for translator and client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned while building requests or parsing responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required identity or create field is absent or empty.
    #[error("missing required parameter: {0}")]
    MissingRequiredParameter(String),

    /// A parameter is present but has the wrong shape.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The operation is not offered by the resource.
    #[error("operation '{operation}' is not supported for resource '{resource}'")]
    UnsupportedOperation { resource: String, operation: String },

    /// The operation name is not one any resource offers.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// The resource name is not one of issue, project, user.
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    /// The base URL and path do not form a valid URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The service returned 404.
    #[error("resource not found")]
    NotFound,

    /// The service returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The HTTP call itself failed before a status was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body is not valid JSON.
    #[error("deserialization failed: {0}")]
    DeserializationError(#[from] serde_json::Error),
}

impl ApiError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ApiError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// An error tied to the input item that produced it.
#[derive(Debug, Error)]
#[error("Redmine API error: {source}")]
pub struct BatchError {
    pub item_index: usize,
    #[source]
    pub source: ApiError,
}

/// Errors raised while loading credentials.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}
