//! Error types for contract validation in airsync-types.

use thiserror::Error;
use time::OffsetDateTime;

use crate::types::Channel;

/// A decoded payload that violates one of its documented invariants.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ContractError {
    /// Channel statistics are not ordered `min <= median/avg <= max`.
    #[error(
        "{channel} stats out of order: min={min}, median={median}, avg={avg}, max={max}"
    )]
    UnorderedStats {
        /// The offending channel.
        channel: Channel,
        min: f64,
        median: f64,
        avg: f64,
        max: f64,
    },

    /// A time window ends before it starts.
    #[error("window ends before it starts ({start} > {end})")]
    InvertedWindow {
        start: OffsetDateTime,
        end: OffsetDateTime,
    },

    /// An hour-of-day value outside `0..24`.
    #[error("hour {0} is outside 0..24")]
    InvalidHour(u8),
}

/// Result type alias using airsync-types' ContractError type.
pub type ContractResult<T> = std::result::Result<T, ContractError>;
