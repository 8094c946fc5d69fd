//! # Crewgate
//!
//! A deterministic, reason-coded access and eligibility policy engine for
//! workforce identity records.
//!
//! ## Overview
//!
//! Each worker's `IdentityRecord` activates any combination of three gates:
//!
//! - **Network**: the attempt must originate from a trusted address or CIDR block.
//! - **Temporal**: the attempt must fall inside the worker's shift window,
//!   which may wrap past midnight.
//! - **Geo**: the attempt must come from inside the geofence of the worker's unit.
//!
//! Given a record, an `AttemptContext` and a `ReferenceConfiguration`, the
//! engine returns an `AccessDecision` listing every gate's outcome. It also
//! resolves task eligibility from skills and organizational scope, and
//! projects records for display with sensitive fields masked.
//!
//! ## Guarantees
//!
//! - **Determinism**: gates run and are reported in fixed order
//!   (Network, Temporal, Geo); identical inputs give identical decisions
//! - **Fail closed**: an active gate with missing input or missing
//!   configuration fails; it never passes
//! - **Denials are decisions**: only unknown users, malformed records and
//!   missing or malformed configuration are errors (`InputFault`)
//! - **No shared mutable state**: evaluation reads immutable snapshots and can
//!   run concurrently without locking
//!
//! ## Example
//!
//! ```
//! use chrono::DateTime;
//! use crewgate::{
//!     AttemptContext, GateKind, IdentityRecord, NetworkRange, PolicyEngine, RecordStore,
//!     ReferenceConfiguration, Role, UserType, WorkTiming,
//! };
//!
//! let record = IdentityRecord::new(
//!     "w-17",
//!     "Asha Rao",
//!     Role::Technician,
//!     UserType::Technicians,
//!     WorkTiming::from_hm((22, 0), (6, 0)).unwrap(),
//! )
//! .with_gate(GateKind::Network, true)
//! .with_gate(GateKind::Temporal, true);
//!
//! let engine = PolicyEngine::new(RecordStore::from_records([record]).unwrap());
//! let config = ReferenceConfiguration::new()
//!     .with_trusted_range(NetworkRange::parse("10.0.0.0/8").unwrap());
//!
//! let attempt = AttemptContext::new(DateTime::parse_from_rfc3339("2024-03-01T23:30:00Z").unwrap())
//!     .with_source_address("10.4.2.1");
//! let decision = engine.evaluate_access("w-17", &attempt, Some(&config)).unwrap();
//! assert!(decision.is_granted());
//!
//! let attempt = AttemptContext::new(DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z").unwrap())
//!     .with_source_address("10.4.2.1");
//! let decision = engine.evaluate_access("w-17", &attempt, Some(&config)).unwrap();
//! assert!(decision.is_denied());
//! assert_eq!(decision.failing_gates(), vec![GateKind::Temporal]);
//! ```

mod attempt;
mod config;
mod eligibility;
mod engine;
mod error;
mod gate;
mod geo;
mod loader;
mod masking;
mod network;
mod record;
mod stats;
mod store;
mod temporal;
mod types;

// Public API exports
pub use attempt::AttemptContext;
pub use config::{ConfigLimits, ReferenceConfiguration};
pub use eligibility::{evaluate_eligibility, EligibilityDecision, TaskRequirements, UnmetRequirement};
pub use engine::{evaluate_access, evaluate_access_with_stats, PolicyEngine};
pub use error::InputFault;
pub use gate::{Gate, GateKind, GateResult, GateSet, GateSetting};
pub use geo::{evaluate_geo, Coordinates, Geofence};
pub use loader::{load_records_file, load_reference_file, parse_records, parse_reference};
pub use masking::{
    mask_mobile, project_for_display, DisplayRecord, DisplayValue, MaskOverride, MaskingPolicy,
    NOT_PROVIDED,
};
pub use network::{evaluate_network, NetworkRange};
pub use record::{IdentityRecord, Role, UserType, ALL_DEPARTMENTS};
pub use stats::EvaluationStats;
pub use store::{RecordSource, RecordStore};
pub use temporal::{evaluate_temporal, TimezonePolicy, WorkTiming};
pub use types::{
    AccessDecision, DenialReason, Effect, GateFailure, GateOutcome, ReasonCode, ALL_GATES_PASSED,
    LOCATION_UNAVAILABLE, NO_ACTIVE_GATES, NO_GEOFENCE_FOR_UNIT, ORIGIN_UNTRUSTED,
    OUTSIDE_GEOFENCE, OUTSIDE_SHIFT_WINDOW,
};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use chrono::DateTime;

    const PLANT: Coordinates = Coordinates::new(19.0760, 72.8777);

    fn reference() -> ReferenceConfiguration {
        parse_reference(
            r#"
trusted_ranges: ["10.20.0.0/16", "192.168.1.50"]
geofences:
  plant-a:
    shape: circle
    center: { latitude: 19.0760, longitude: 72.8777 }
    radius_m: 300
timezone:
  mode: organization
  utc_offset_minutes: 330
"#,
        )
        .unwrap()
    }

    fn at(local: &str) -> AttemptContext {
        AttemptContext::new(DateTime::parse_from_rfc3339(local).unwrap())
    }

    #[test]
    fn test_realistic_roster() {
        // Night-shift technician: network + shift gates.
        // Plant worker: every gate.
        // Executive: no gates.
        let night = IdentityRecord::new(
            "tech-1",
            "Kiran",
            Role::Technician,
            UserType::Technicians,
            WorkTiming::from_hm((22, 0), (6, 0)).unwrap(),
        )
        .with_scope("plant-a", "Maintenance")
        .with_access_flags(true, true, false)
        .with_skills(["hvac", "electrical"]);

        let plant = IdentityRecord::new(
            "work-1",
            "Sana",
            Role::Worker,
            UserType::Worker,
            WorkTiming::from_hm((8, 0), (17, 0)).unwrap(),
        )
        .with_scope("plant-a", "Assembly")
        .with_access_flags(true, true, true);

        let exec = IdentityRecord::new(
            "exec-1",
            "Meera",
            Role::Executive,
            UserType::Executives,
            WorkTiming::from_hm((9, 0), (18, 0)).unwrap(),
        )
        .with_scope("hq", ALL_DEPARTMENTS);

        let engine = PolicyEngine::new(RecordStore::from_records([night, plant, exec]).unwrap());
        let config = reference();

        // 23:30 IST on trusted network.
        let ok = at("2024-03-01T23:30:00+05:30").with_source_address("10.20.3.4");
        assert!(engine.evaluate_access("tech-1", &ok, Some(&config)).unwrap().is_granted());

        // Same attempt, expressed in UTC, is the same instant.
        let ok_utc = at("2024-03-01T18:00:00Z").with_source_address("10.20.3.4");
        assert!(engine.evaluate_access("tech-1", &ok_utc, Some(&config)).unwrap().is_granted());

        // Noon IST is outside the night shift.
        let noon = at("2024-03-01T12:00:00+05:30").with_source_address("10.20.3.4");
        let d = engine.evaluate_access("tech-1", &noon, Some(&config)).unwrap();
        assert_eq!(d.failing_gates(), vec![GateKind::Temporal]);
        assert_eq!(d.reason, OUTSIDE_SHIFT_WINDOW);

        // Plant worker inside the plant during the day.
        let on_site = at("2024-03-01T10:00:00+05:30")
            .with_source_address("192.168.1.50")
            .with_coordinates(PLANT);
        assert!(engine.evaluate_access("work-1", &on_site, Some(&config)).unwrap().is_granted());

        // Executive has no gates at all.
        let anywhere = at("2024-03-01T03:00:00Z").with_source_address("8.8.8.8");
        let d = engine.evaluate_access("exec-1", &anywhere, Some(&config)).unwrap();
        assert!(d.is_granted());
        assert_eq!(d.reason, NO_ACTIVE_GATES);

        // Eligibility
        let task = TaskRequirements::new().skills(["hvac"]).department("Maintenance");
        assert!(engine.evaluate_eligibility("tech-1", &task).unwrap().eligible);
        assert!(!engine.evaluate_eligibility("work-1", &task).unwrap().eligible);
        assert!(engine
            .evaluate_eligibility("exec-1", &TaskRequirements::new().department("Assembly"))
            .unwrap()
            .eligible);
    }

    #[test]
    fn test_denial_and_fault_are_distinct() {
        let engine = PolicyEngine::new(RecordStore::new());
        let result = engine.evaluate_access("nobody", &at("2024-03-01T10:00:00Z"), Some(&reference()));
        assert!(matches!(result, Err(InputFault::UnknownUser(_))));
    }
}
