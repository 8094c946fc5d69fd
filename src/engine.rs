//! The policy engine.
//!
//! Loads record snapshots from a `RecordSource` and runs the pure evaluators
//! over them. Unknown users, malformed records and missing or malformed
//! configuration are `InputFault`s; everything else produces a decision.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::attempt::AttemptContext;
use crate::config::ReferenceConfiguration;
use crate::eligibility::{self, EligibilityDecision, TaskRequirements};
use crate::error::InputFault;
use crate::gate::REGISTRY;
use crate::masking::{self, DisplayRecord, MaskingPolicy};
use crate::record::{IdentityRecord, Role};
use crate::stats::EvaluationStats;
use crate::store::RecordSource;
use crate::types::{AccessDecision, GateOutcome};

/// Evaluate an access attempt against a record.
///
/// Runs every registered gate in fixed order. Granted iff no activated gate
/// fails; a record with no active gates is granted unconditionally.
pub fn evaluate_access(
    record: &IdentityRecord,
    attempt: &AttemptContext,
    config: &ReferenceConfiguration,
) -> AccessDecision {
    let outcomes: Vec<GateOutcome> = REGISTRY
        .iter()
        .map(|gate| {
            let result = gate.evaluate(record, attempt, config);
            debug!(user_id = %record.id, gate = %gate.kind(), ?result, "gate evaluated");
            GateOutcome {
                gate: gate.kind(),
                result,
            }
        })
        .collect();

    AccessDecision::from_outcomes(&record.id, outcomes)
}

/// Like `evaluate_access`, also returning gate usage counts.
pub fn evaluate_access_with_stats(
    record: &IdentityRecord,
    attempt: &AttemptContext,
    config: &ReferenceConfiguration,
) -> (AccessDecision, EvaluationStats) {
    let decision = evaluate_access(record, attempt, config);
    let stats = EvaluationStats::from_outcomes(&decision.gates);
    (decision, stats)
}

/// Orchestrates lookups and evaluations by user id.
///
/// Holds no mutable state, so one engine can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct PolicyEngine<S> {
    records: S,
    masking: MaskingPolicy,
}

impl<S: RecordSource> PolicyEngine<S> {
    /// Create an engine over a record source with an empty masking policy.
    pub fn new(records: S) -> Self {
        PolicyEngine {
            records,
            masking: MaskingPolicy::new(),
        }
    }

    /// Replace the masking policy.
    pub fn with_masking_policy(mut self, masking: MaskingPolicy) -> Self {
        self.masking = masking;
        self
    }

    /// The underlying record source.
    pub fn records(&self) -> &S {
        &self.records
    }

    /// The masking policy in effect.
    pub fn masking_policy(&self) -> &MaskingPolicy {
        &self.masking
    }

    /// Decide an access attempt for `user_id`.
    pub fn evaluate_access(
        &self,
        user_id: &str,
        attempt: &AttemptContext,
        config: Option<&ReferenceConfiguration>,
    ) -> Result<AccessDecision, InputFault> {
        self.evaluate_access_with_stats(user_id, attempt, config)
            .map(|(decision, _)| decision)
    }

    /// Decide an access attempt and report gate usage.
    pub fn evaluate_access_with_stats(
        &self,
        user_id: &str,
        attempt: &AttemptContext,
        config: Option<&ReferenceConfiguration>,
    ) -> Result<(AccessDecision, EvaluationStats), InputFault> {
        let record = self.load(user_id)?;
        let config = config.ok_or_else(|| {
            warn!(user_id, "access evaluated without reference configuration");
            InputFault::MissingReferenceConfiguration
        })?;
        config
            .validate()
            .inspect_err(|e| warn!(user_id, error = %e, "rejected reference configuration"))?;

        let (decision, stats) = evaluate_access_with_stats(&record, attempt, config);
        info!(
            user_id,
            effect = ?decision.effect,
            reason = decision.reason.value(),
            gates_checked = stats.gates_checked,
            gates_failed = stats.gates_failed,
            "access decision"
        );
        Ok((decision, stats))
    }

    /// Check whether `user_id` may be assigned a task.
    pub fn evaluate_eligibility(
        &self,
        user_id: &str,
        requirements: &TaskRequirements,
    ) -> Result<EligibilityDecision, InputFault> {
        let record = self.load(user_id)?;
        let decision = eligibility::evaluate_eligibility(&record, requirements);
        info!(
            user_id,
            eligible = decision.eligible,
            unmet = decision.unmet.len(),
            "eligibility decision"
        );
        Ok(decision)
    }

    /// Project `user_id`'s record for a viewer.
    pub fn project_for_display(
        &self,
        user_id: &str,
        viewer: Role,
    ) -> Result<DisplayRecord, InputFault> {
        let record = self.load(user_id)?;
        Ok(masking::project_for_display(&record, viewer, &self.masking))
    }

    fn load(&self, user_id: &str) -> Result<Arc<IdentityRecord>, InputFault> {
        let record = self.records.lookup(user_id).ok_or_else(|| {
            warn!(user_id, "unknown user id");
            InputFault::UnknownUser(user_id.to_string())
        })?;
        record
            .validate()
            .inspect_err(|e| warn!(user_id, error = %e, "rejected record"))?;
        Ok(record)
    }
}
