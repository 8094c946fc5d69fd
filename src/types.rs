//! Decision types shared by the gates and the engine.
//!
//! Decisions own their data so they can be logged, serialized and compared
//! after the record snapshot they were computed from has been dropped.

use std::fmt;

use serde::Serialize;

use crate::gate::{GateKind, GateResult};

/// The effect of an access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Effect {
    /// Every activated gate passed.
    Granted,
    /// At least one activated gate failed.
    Denied,
}

impl Effect {
    /// Returns `true` if this effect is `Granted`.
    #[inline]
    pub fn is_granted(&self) -> bool {
        matches!(self, Effect::Granted)
    }

    /// Returns `true` if this effect is `Denied`.
    #[inline]
    pub fn is_denied(&self) -> bool {
        matches!(self, Effect::Denied)
    }
}

/// A stable reason code for audit logs.
///
/// Codes never change meaning between versions; messages may be reworded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ReasonCode(pub u32);

impl ReasonCode {
    /// Create a new reason code.
    #[inline]
    pub const fn new(code: u32) -> Self {
        ReasonCode(code)
    }

    /// Get the numeric value of this reason code.
    #[inline]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

/// Granted: at least one gate was active and all of them passed.
pub const ALL_GATES_PASSED: ReasonCode = ReasonCode(1);
/// Granted: the record activates no gate, so nothing constrains the attempt.
pub const NO_ACTIVE_GATES: ReasonCode = ReasonCode(2);
/// Network gate: origin outside every trusted range.
pub const ORIGIN_UNTRUSTED: ReasonCode = ReasonCode(101);
/// Temporal gate: attempt outside the shift window.
pub const OUTSIDE_SHIFT_WINDOW: ReasonCode = ReasonCode(201);
/// Geo gate: attempt carried no usable coordinates.
pub const LOCATION_UNAVAILABLE: ReasonCode = ReasonCode(301);
/// Geo gate: coordinates outside the unit's geofence.
pub const OUTSIDE_GEOFENCE: ReasonCode = ReasonCode(302);
/// Geo gate: the unit has no registered geofence.
pub const NO_GEOFENCE_FOR_UNIT: ReasonCode = ReasonCode(303);

/// Why an activated gate failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Source address missing, malformed, or outside every trusted range.
    OriginOutsideTrustedNetwork,
    /// Local time-of-day outside the shift window.
    OutsideShiftWindow,
    /// No usable coordinates on the attempt.
    LocationUnavailable,
    /// Coordinates outside the unit's geofence.
    OutsideFacilityGeofence,
    /// No geofence registered for the record's unit.
    NoGeofenceForUnit,
}

impl DenialReason {
    /// The stable code for this reason.
    pub const fn code(&self) -> ReasonCode {
        match self {
            DenialReason::OriginOutsideTrustedNetwork => ORIGIN_UNTRUSTED,
            DenialReason::OutsideShiftWindow => OUTSIDE_SHIFT_WINDOW,
            DenialReason::LocationUnavailable => LOCATION_UNAVAILABLE,
            DenialReason::OutsideFacilityGeofence => OUTSIDE_GEOFENCE,
            DenialReason::NoGeofenceForUnit => NO_GEOFENCE_FOR_UNIT,
        }
    }

    /// Human-readable message.
    pub const fn message(&self) -> &'static str {
        match self {
            DenialReason::OriginOutsideTrustedNetwork => "origin outside trusted network",
            DenialReason::OutsideShiftWindow => "outside permitted shift window",
            DenialReason::LocationUnavailable => "location unavailable",
            DenialReason::OutsideFacilityGeofence => "outside facility geofence",
            DenialReason::NoGeofenceForUnit => "no geofence configured for unit",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The result of one gate within a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateOutcome {
    /// Which gate ran.
    pub gate: GateKind,
    /// What it returned.
    pub result: GateResult,
}

/// A failing gate and its reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateFailure {
    /// The gate that failed.
    pub gate: GateKind,
    /// Why it failed.
    pub reason: DenialReason,
}

impl fmt::Display for GateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.gate, self.reason)
    }
}

/// The result of evaluating an access attempt.
///
/// `gates` holds one outcome per known gate in evaluation order, and
/// `failures` repeats the failing ones in that same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    /// The user the attempt was evaluated for.
    pub user_id: String,
    /// Granted or Denied.
    pub effect: Effect,
    /// Grant code, or the code of the first failure.
    pub reason: ReasonCode,
    /// Every gate's outcome in evaluation order.
    pub gates: Vec<GateOutcome>,
    /// Failing gates in evaluation order. Empty iff granted.
    pub failures: Vec<GateFailure>,
}

impl AccessDecision {
    /// Aggregate gate outcomes: granted iff no activated gate failed.
    pub fn from_outcomes(user_id: &str, gates: Vec<GateOutcome>) -> Self {
        let failures: Vec<GateFailure> = gates
            .iter()
            .filter_map(|o| match o.result {
                GateResult::Failed(reason) => Some(GateFailure {
                    gate: o.gate,
                    reason,
                }),
                _ => None,
            })
            .collect();

        let (effect, reason) = match failures.first() {
            Some(first) => (Effect::Denied, first.reason.code()),
            None if gates.iter().all(|o| o.result.is_skipped()) => {
                (Effect::Granted, NO_ACTIVE_GATES)
            }
            None => (Effect::Granted, ALL_GATES_PASSED),
        };

        AccessDecision {
            user_id: user_id.to_string(),
            effect,
            reason,
            gates,
            failures,
        }
    }

    /// Returns `true` if access is granted.
    #[inline]
    pub fn is_granted(&self) -> bool {
        self.effect.is_granted()
    }

    /// Returns `true` if access is denied.
    #[inline]
    pub fn is_denied(&self) -> bool {
        self.effect.is_denied()
    }

    /// Names of the failing gates, in evaluation order.
    pub fn failing_gates(&self) -> Vec<GateKind> {
        self.failures.iter().map(|f| f.gate).collect()
    }

    /// Outcome of a particular gate.
    pub fn outcome(&self, gate: GateKind) -> Option<GateResult> {
        self.gates.iter().find(|o| o.gate == gate).map(|o| o.result)
    }
}
