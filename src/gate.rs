//! Gate configuration and dispatch.
//!
//! A record carries an ordered list of `GateSetting`s instead of one boolean
//! field per gate. The engine runs every registered gate in `GateKind` order;
//! a gate that the record does not enable is `Skipped`, never `Failed`.
//!
//! Adding a gate means adding a `GateKind` variant and a `Gate` impl, and
//! registering it in `REGISTRY`. The record type does not change.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attempt::AttemptContext;
use crate::config::ReferenceConfiguration;
use crate::geo::GeoGate;
use crate::network::NetworkGate;
use crate::record::IdentityRecord;
use crate::temporal::TemporalGate;
use crate::types::DenialReason;

/// The gates known to the engine, in evaluation and reporting order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    /// Source-address restriction.
    Network,
    /// Shift-window restriction.
    Temporal,
    /// Facility geofence restriction.
    Geo,
}

impl GateKind {
    /// Every gate kind, in evaluation order.
    pub const ALL: [GateKind; 3] = [GateKind::Network, GateKind::Temporal, GateKind::Geo];

    /// Display name used in audit output.
    pub const fn name(&self) -> &'static str {
        match self {
            GateKind::Network => "Network",
            GateKind::Temporal => "Temporal",
            GateKind::Geo => "Geo",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a single gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum GateResult {
    /// The gate is active and the attempt satisfies it.
    Passed,
    /// The gate is not active for this record.
    Skipped,
    /// The gate is active and the attempt does not satisfy it.
    Failed(DenialReason),
}

impl GateResult {
    /// Returns `true` if the gate passed.
    #[inline]
    pub fn is_passed(&self) -> bool {
        matches!(self, GateResult::Passed)
    }

    /// Returns `true` if the gate was skipped.
    #[inline]
    pub fn is_skipped(&self) -> bool {
        matches!(self, GateResult::Skipped)
    }

    /// Returns `true` if the gate failed.
    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, GateResult::Failed(_))
    }
}

/// Whether a gate is active for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GateSetting {
    /// Which gate.
    pub kind: GateKind,
    /// Whether it is active.
    pub enabled: bool,
}

/// The per-record list of gate settings.
///
/// A kind absent from the list is disabled. Kinds must not repeat;
/// `IdentityRecord::validate` rejects a set with duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GateSet(Vec<GateSetting>);

impl GateSet {
    /// An empty set: every gate disabled.
    pub fn new() -> Self {
        GateSet(Vec::new())
    }

    /// Build from the three per-gate toggles.
    pub fn from_flags(ip_based: bool, time_based: bool, geo_location: bool) -> Self {
        GateSet(vec![
            GateSetting {
                kind: GateKind::Network,
                enabled: ip_based,
            },
            GateSetting {
                kind: GateKind::Temporal,
                enabled: time_based,
            },
            GateSetting {
                kind: GateKind::Geo,
                enabled: geo_location,
            },
        ])
    }

    /// Enable or disable a gate, replacing any existing setting for it.
    pub fn set(&mut self, kind: GateKind, enabled: bool) {
        match self.0.iter_mut().find(|s| s.kind == kind) {
            Some(setting) => setting.enabled = enabled,
            None => self.0.push(GateSetting { kind, enabled }),
        }
    }

    /// Returns `true` if the gate is active.
    pub fn is_enabled(&self, kind: GateKind) -> bool {
        self.0.iter().any(|s| s.kind == kind && s.enabled)
    }

    /// Returns `true` if no gate is active.
    pub fn none_enabled(&self) -> bool {
        !self.0.iter().any(|s| s.enabled)
    }

    /// The settings in declared order.
    pub fn settings(&self) -> &[GateSetting] {
        &self.0
    }

    /// The first kind that appears more than once, if any.
    pub fn first_duplicate(&self) -> Option<GateKind> {
        self.0
            .iter()
            .enumerate()
            .find(|(i, s)| self.0[..*i].iter().any(|p| p.kind == s.kind))
            .map(|(_, s)| s.kind)
    }
}

/// A single access predicate.
///
/// Implementations are pure: they read the record, the attempt and the
/// reference configuration and return a fresh result.
pub trait Gate: Send + Sync {
    /// Which gate this is.
    fn kind(&self) -> GateKind;

    /// Evaluate the predicate, assuming the gate is active.
    fn check(
        &self,
        record: &IdentityRecord,
        attempt: &AttemptContext,
        config: &ReferenceConfiguration,
    ) -> GateResult;

    /// Evaluate the gate for a record, skipping it when not active.
    fn evaluate(
        &self,
        record: &IdentityRecord,
        attempt: &AttemptContext,
        config: &ReferenceConfiguration,
    ) -> GateResult {
        if record.gates.is_enabled(self.kind()) {
            self.check(record, attempt, config)
        } else {
            GateResult::Skipped
        }
    }
}

/// Registered gates in evaluation order.
pub static REGISTRY: &[&dyn Gate] = &[&NetworkGate, &TemporalGate, &GeoGate];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_matches_kind_order() {
        let kinds: Vec<GateKind> = REGISTRY.iter().map(|g| g.kind()).collect();
        assert_eq!(kinds, GateKind::ALL.to_vec());
    }

    #[test]
    fn test_from_flags() {
        let set = GateSet::from_flags(true, false, true);
        assert!(set.is_enabled(GateKind::Network));
        assert!(!set.is_enabled(GateKind::Temporal));
        assert!(set.is_enabled(GateKind::Geo));
        assert!(!set.none_enabled());

        assert!(GateSet::from_flags(false, false, false).none_enabled());
        assert!(GateSet::new().none_enabled());
    }

    #[test]
    fn test_set_replaces_existing() {
        let mut set = GateSet::from_flags(false, false, false);
        set.set(GateKind::Temporal, true);
        assert!(set.is_enabled(GateKind::Temporal));
        assert_eq!(set.settings().len(), 3);

        let mut set = GateSet::new();
        set.set(GateKind::Geo, true);
        assert_eq!(set.settings().len(), 1);
        assert!(set.is_enabled(GateKind::Geo));
    }

    #[test]
    fn test_first_duplicate() {
        assert_eq!(GateSet::from_flags(true, true, true).first_duplicate(), None);

        let set: GateSet = serde_json::from_str(
            r#"[{"kind":"geo","enabled":true},{"kind":"network","enabled":false},{"kind":"geo","enabled":false}]"#,
        )
        .unwrap();
        assert_eq!(set.first_duplicate(), Some(GateKind::Geo));
    }

    #[test]
    fn test_gate_result_serialization() {
        assert_eq!(
            serde_json::to_string(&GateResult::Skipped).unwrap(),
            r#"{"outcome":"skipped"}"#
        );
        assert_eq!(
            serde_json::to_string(&GateResult::Failed(DenialReason::LocationUnavailable)).unwrap(),
            r#"{"outcome":"failed","reason":"location_unavailable"}"#
        );
    }
}
