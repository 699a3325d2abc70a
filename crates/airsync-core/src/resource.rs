//! The four remote resources a sync client reads.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A remote resource exposed by the aggregation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// Latest reading (`GET /status`).
    Status,
    /// Raw readings over a window (`GET /history`).
    History,
    /// Per-channel statistics over a window (`GET /stats`).
    Stats,
    /// Correlations, trends and AQI over a window (`GET /analysis`).
    Analysis,
}

impl Resource {
    /// All resources, in the order a full batch reports them.
    pub const ALL: [Resource; 4] = [
        Resource::Status,
        Resource::History,
        Resource::Stats,
        Resource::Analysis,
    ];

    /// Path of the endpoint below the API prefix.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Status => "/status",
            Resource::History => "/history",
            Resource::Stats => "/stats",
            Resource::Analysis => "/analysis",
        }
    }

    /// Whether the endpoint takes an `hours` window parameter.
    #[must_use]
    pub fn is_windowed(&self) -> bool {
        !matches!(self, Resource::Status)
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Resource::Status => 0,
            Resource::History => 1,
            Resource::Stats => 2,
            Resource::Analysis => 3,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Status => "status",
            Resource::History => "history",
            Resource::Stats => "stats",
            Resource::Analysis => "analysis",
        };
        f.write_str(name)
    }
}
