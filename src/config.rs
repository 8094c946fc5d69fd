//! Reference configuration.
//!
//! Trusted networks, per-unit geofences and the timezone policy. The engine
//! only reads it; it is passed into every evaluation call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::InputFault;
use crate::geo::Geofence;
use crate::network::NetworkRange;
use crate::temporal::TimezonePolicy;

/// Hard ceiling on trusted ranges.
pub const ABSOLUTE_MAX_TRUSTED_RANGES: usize = 65_536;

/// Hard ceiling on vertices per polygon geofence.
pub const ABSOLUTE_MAX_POLYGON_VERTICES: usize = 10_000;

/// Size limits checked by `ReferenceConfiguration::validate_with`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigLimits {
    /// Maximum number of trusted ranges.
    pub max_trusted_ranges: usize,
    /// Maximum number of registered geofences.
    pub max_geofences: usize,
    /// Maximum vertices in one polygon geofence.
    pub max_polygon_vertices: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        ConfigLimits {
            max_trusted_ranges: 1024,
            max_geofences: 4096,
            max_polygon_vertices: 1024,
        }
    }
}

/// Inputs shared by every evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceConfiguration {
    /// Addresses and CIDR blocks the network gate accepts.
    #[serde(default)]
    pub trusted_ranges: Vec<NetworkRange>,
    /// Facility boundaries keyed by unit.
    #[serde(default)]
    pub geofences: BTreeMap<String, Geofence>,
    /// How attempt instants map to local shift time.
    #[serde(default)]
    pub timezone: TimezonePolicy,
}

impl ReferenceConfiguration {
    /// Empty configuration: no trusted ranges, no geofences, UTC.
    pub fn new() -> Self {
        ReferenceConfiguration::default()
    }

    /// Add a trusted range.
    pub fn with_trusted_range(mut self, range: NetworkRange) -> Self {
        self.trusted_ranges.push(range);
        self
    }

    /// Register a unit's geofence, replacing any previous one.
    pub fn with_geofence(mut self, unit: impl Into<String>, fence: Geofence) -> Self {
        self.geofences.insert(unit.into(), fence);
        self
    }

    /// Set the timezone policy.
    pub fn with_timezone(mut self, timezone: TimezonePolicy) -> Self {
        self.timezone = timezone;
        self
    }

    /// Validate against the default limits.
    pub fn validate(&self) -> Result<(), InputFault> {
        self.validate_with(&ConfigLimits::default())
    }

    /// Validate sizes and geofence shapes.
    pub fn validate_with(&self, limits: &ConfigLimits) -> Result<(), InputFault> {
        let max_ranges = limits.max_trusted_ranges.min(ABSOLUTE_MAX_TRUSTED_RANGES);
        if self.trusted_ranges.len() > max_ranges {
            return Err(InputFault::MalformedConfiguration(format!(
                "too many trusted ranges: {} (max {max_ranges})",
                self.trusted_ranges.len()
            )));
        }
        if self.geofences.len() > limits.max_geofences {
            return Err(InputFault::MalformedConfiguration(format!(
                "too many geofences: {} (max {})",
                self.geofences.len(),
                limits.max_geofences
            )));
        }

        let max_vertices = limits.max_polygon_vertices.min(ABSOLUTE_MAX_POLYGON_VERTICES);
        for (unit, fence) in &self.geofences {
            fence.validate(unit)?;
            if fence.vertex_count() > max_vertices {
                return Err(InputFault::MalformedConfiguration(format!(
                    "geofence for unit {unit:?} has {} vertices (max {max_vertices})",
                    fence.vertex_count()
                )));
            }
        }
        Ok(())
    }
}
