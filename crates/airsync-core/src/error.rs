//! Error types for airsync-core.
//!
//! Errors from this module surface from [`ServiceClient`](crate::ServiceClient)
//! and any other [`SensorApi`](crate::SensorApi) implementation. The sync
//! layer never lets them escape a fetch: each one is logged, recorded in the
//! resource's health entry, and turned into
//! [`FetchOutcome::Failed`](crate::FetchOutcome::Failed).
//!
//! | Error | Typical cause |
//! |-------|---------------|
//! | [`Error::NotReachable`] | Service down, DNS failure, connection refused |
//! | [`Error::Api`] | Non-2xx status (404 when the service has no data yet) |
//! | [`Error::Decode`] | Body is not the expected JSON shape |
//! | [`Error::NoData`] | Service answered with an empty-window notice |
//! | [`Error::Contract`] | Decoded payload violates an invariant |
//! | [`Error::InvalidUrl`], [`Error::InvalidConfig`] | Fix configuration and restart |
//!
//! There is no retry layer. The next poll tick or manual refresh is the
//! retry.

use thiserror::Error;

use airsync_types::ContractError;

use crate::resource::Resource;

/// Errors that can occur when reading from the telemetry service.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The service is not reachable.
    #[error("Service not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP request failed after the connection was made.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The body could not be decoded into the resource's contract.
    #[error("Failed to decode {resource} response: {source}")]
    Decode {
        resource: Resource,
        #[source]
        source: serde_json::Error,
    },

    /// The service has no samples in the requested window.
    #[error("No {resource} data: {message}")]
    NoData { resource: Resource, message: String },

    /// The payload decoded but breaks one of its invariants.
    #[error("Invalid {resource} payload: {source}")]
    Contract {
        resource: Resource,
        #[source]
        source: ContractError,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// HTTP status code, when the service answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the failure means the resource has nothing to show yet,
    /// rather than something being broken.
    #[must_use]
    pub fn is_no_data(&self) -> bool {
        matches!(self, Error::NoData { .. } | Error::Api { status: 404, .. })
    }
}

/// Result type alias using airsync-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
