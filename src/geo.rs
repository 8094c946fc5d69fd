//! Geo gate.
//!
//! Geofences are registered per unit. A unit with no geofence fails the
//! gate; missing configuration never grants.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::attempt::AttemptContext;
use crate::config::ReferenceConfiguration;
use crate::error::InputFault;
use crate::gate::{Gate, GateKind, GateResult};
use crate::record::IdentityRecord;
use crate::types::DenialReason;

/// Mean Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Degrees north, in `[-90, 90]`.
    pub latitude: f64,
    /// Degrees east, in `[-180, 180]`.
    pub longitude: f64,
}

impl Coordinates {
    /// Create a coordinate pair.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Coordinates {
            latitude,
            longitude,
        }
    }

    /// Returns `true` if both components are finite and in range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance in metres (haversine).
    pub fn distance_m(&self, other: &Coordinates) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let d_phi = (other.latitude - self.latitude).to_radians();
        let d_lambda = (other.longitude - self.longitude).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }
}

/// A facility boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Geofence {
    /// Everything within `radius_m` of `center`, boundary included.
    Circle {
        /// Centre of the facility.
        center: Coordinates,
        /// Radius in metres.
        radius_m: f64,
    },
    /// A simple polygon in latitude/longitude space.
    ///
    /// Containment uses the even-odd rule. Polygons must not cross the
    /// antimeridian.
    Polygon {
        /// Vertices in order; the ring closes implicitly.
        vertices: Vec<Coordinates>,
    },
}

impl Geofence {
    /// Create a circular geofence.
    pub fn circle(center: Coordinates, radius_m: f64) -> Self {
        Geofence::Circle { center, radius_m }
    }

    /// Create a polygonal geofence.
    pub fn polygon(vertices: Vec<Coordinates>) -> Self {
        Geofence::Polygon { vertices }
    }

    /// Number of vertices (zero for a circle).
    pub fn vertex_count(&self) -> usize {
        match self {
            Geofence::Circle { .. } => 0,
            Geofence::Polygon { vertices } => vertices.len(),
        }
    }

    /// Check the geofence is well formed.
    pub fn validate(&self, unit: &str) -> Result<(), InputFault> {
        let bad = |what: &str| {
            InputFault::MalformedConfiguration(format!("geofence for unit {unit:?}: {what}"))
        };
        match self {
            Geofence::Circle { center, radius_m } => {
                if !center.is_valid() {
                    return Err(bad("center is out of range"));
                }
                if !radius_m.is_finite() || *radius_m <= 0.0 {
                    return Err(bad("radius must be positive"));
                }
            }
            Geofence::Polygon { vertices } => {
                if vertices.len() < 3 {
                    return Err(bad("polygon needs at least 3 vertices"));
                }
                if !vertices.iter().all(Coordinates::is_valid) {
                    return Err(bad("vertex is out of range"));
                }
            }
        }
        Ok(())
    }

    /// Check if a point lies inside the geofence.
    pub fn contains(&self, point: &Coordinates) -> bool {
        match self {
            Geofence::Circle { center, radius_m } => center.distance_m(point) <= *radius_m,
            Geofence::Polygon { vertices } => polygon_contains(vertices, point),
        }
    }
}

fn polygon_contains(vertices: &[Coordinates], point: &Coordinates) -> bool {
    let (x, y) = (point.longitude, point.latitude);
    let mut inside = false;
    let mut j = match vertices.len() {
        0 => return false,
        n => n - 1,
    };

    for (i, vi) in vertices.iter().enumerate() {
        let vj = &vertices[j];
        let (xi, yi) = (vi.longitude, vi.latitude);
        let (xj, yj) = (vj.longitude, vj.latitude);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Evaluate the geo gate.
pub fn evaluate_geo(
    record: &IdentityRecord,
    attempt: &AttemptContext,
    geofences: &BTreeMap<String, Geofence>,
) -> GateResult {
    if !record.gates.is_enabled(GateKind::Geo) {
        return GateResult::Skipped;
    }
    check_location(record, attempt, geofences)
}

fn check_location(
    record: &IdentityRecord,
    attempt: &AttemptContext,
    geofences: &BTreeMap<String, Geofence>,
) -> GateResult {
    let point = match attempt.coordinates {
        Some(point) if point.is_valid() => point,
        _ => return GateResult::Failed(DenialReason::LocationUnavailable),
    };

    match geofences.get(&record.unit) {
        None => GateResult::Failed(DenialReason::NoGeofenceForUnit),
        Some(fence) if fence.contains(&point) => GateResult::Passed,
        Some(_) => GateResult::Failed(DenialReason::OutsideFacilityGeofence),
    }
}

/// The geo gate as a registered `Gate`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoGate;

impl Gate for GeoGate {
    fn kind(&self) -> GateKind {
        GateKind::Geo
    }

    fn check(
        &self,
        record: &IdentityRecord,
        attempt: &AttemptContext,
        config: &ReferenceConfiguration,
    ) -> GateResult {
        check_location(record, attempt, &config.geofences)
    }
}
