//! Evaluation statistics.
//!
//! Counts how many gates an access evaluation actually exercised. Returned
//! by `evaluate_access_with_stats` for monitoring and capacity planning.

use serde::Serialize;

use crate::types::GateOutcome;

/// Gate usage during a single access evaluation.
///
/// `Copy` so it can be returned alongside a decision without cloning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationStats {
    /// Gates that were active and ran their predicate.
    pub gates_checked: u8,

    /// Gates that were not active for the record.
    pub gates_skipped: u8,

    /// Active gates that failed.
    pub gates_failed: u8,
}

impl EvaluationStats {
    /// Create a new stats tracker initialized to zero.
    #[inline]
    pub const fn new() -> Self {
        EvaluationStats {
            gates_checked: 0,
            gates_skipped: 0,
            gates_failed: 0,
        }
    }

    /// Tally a list of gate outcomes.
    pub fn from_outcomes(outcomes: &[GateOutcome]) -> Self {
        let mut stats = EvaluationStats::new();
        for outcome in outcomes {
            stats.record(outcome);
        }
        stats
    }

    /// Count one gate outcome.
    #[inline]
    pub fn record(&mut self, outcome: &GateOutcome) {
        if outcome.result.is_skipped() {
            self.gates_skipped = self.gates_skipped.saturating_add(1);
            return;
        }
        self.gates_checked = self.gates_checked.saturating_add(1);
        if outcome.result.is_failed() {
            self.gates_failed = self.gates_failed.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{GateKind, GateResult};
    use crate::types::DenialReason;

    #[test]
    fn test_stats_default() {
        let stats = EvaluationStats::default();
        assert_eq!(stats, EvaluationStats::new());
        assert_eq!(stats.gates_checked, 0);
    }

    #[test]
    fn test_stats_from_outcomes() {
        let outcomes = [
            GateOutcome {
                gate: GateKind::Network,
                result: GateResult::Passed,
            },
            GateOutcome {
                gate: GateKind::Temporal,
                result: GateResult::Skipped,
            },
            GateOutcome {
                gate: GateKind::Geo,
                result: GateResult::Failed(DenialReason::NoGeofenceForUnit),
            },
        ];
        let stats = EvaluationStats::from_outcomes(&outcomes);
        assert_eq!(stats.gates_checked, 2);
        assert_eq!(stats.gates_skipped, 1);
        assert_eq!(stats.gates_failed, 1);
    }
}
