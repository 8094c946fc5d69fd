//! Request-scoped attempt context.
//!
//! Supplied by the caller for each access attempt and never persisted.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

/// What the caller observed about an access attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptContext {
    /// Network origin as reported by the transport. Kept raw so that a
    /// malformed value reaches the network gate and fails there.
    #[serde(default)]
    pub source_address: Option<String>,
    /// Instant of the attempt, with the offset it was observed in.
    pub timestamp: DateTime<FixedOffset>,
    /// Location of the attempt, if the client could supply one.
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl AttemptContext {
    /// Create a context with no address and no location.
    pub fn new(timestamp: DateTime<FixedOffset>) -> Self {
        AttemptContext {
            source_address: None,
            timestamp,
            coordinates: None,
        }
    }

    /// Sets the source address.
    pub fn with_source_address(mut self, address: impl Into<String>) -> Self {
        self.source_address = Some(address.into());
        self
    }

    /// Sets the coordinates.
    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }
}
