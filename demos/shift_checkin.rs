//! Illustrative scenario: shift check-in at a plant.
//!
//! 1. A night-shift technician may only check in from the plant network
//!    between 22:00 and 06:00 (local plant time).
//! 2. A line worker must also be physically inside the plant geofence.
//! 3. A supervisor's view of the roster masks mobile numbers; an admin
//!    sees them in full.
//!
//! Run with `RUST_LOG=crewgate=debug cargo run --example shift_checkin`
//! to see every gate outcome.

use chrono::DateTime;
use crewgate::{
    parse_records, parse_reference, AttemptContext, Coordinates, MaskOverride, MaskingPolicy,
    PolicyEngine, RecordStore, Role, TaskRequirements,
};
use tracing_subscriber::EnvFilter;

const ROSTER: &str = r#"
- id: tech-1
  full_name: Kiran Shetty
  email: kiran@plant.example
  mobile: "+91 98765 43210"
  role: Technician
  user_type: Technicians
  unit: plant-a
  department: Maintenance
  mask_mobile: true
  gates:
    - { kind: network, enabled: true }
    - { kind: temporal, enabled: true }
  skill_set: [hvac, electrical]
  work_timing: { check_in: "22:00", check_out: "06:00" }
- id: work-1
  full_name: Sana Qureshi
  email: sana@plant.example
  mobile: "9000000002"
  emergency_contact: "Imran 9000000003"
  role: Worker
  user_type: Worker
  unit: plant-a
  department: Assembly
  gates:
    - { kind: network, enabled: true }
    - { kind: temporal, enabled: true }
    - { kind: geo, enabled: true }
  work_timing: { check_in: "08:00", check_out: "17:00" }
"#;

const REFERENCE: &str = r#"
trusted_ranges: ["10.20.0.0/16"]
geofences:
  plant-a:
    shape: circle
    center: { latitude: 19.0760, longitude: 72.8777 }
    radius_m: 300
timezone:
  mode: organization
  utc_offset_minutes: 330
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let store = RecordStore::from_records(parse_records(ROSTER)?)?;
    let config = parse_reference(REFERENCE)?;
    let engine = PolicyEngine::new(store)
        .with_masking_policy(MaskingPolicy::new().with_override(Role::Admin, MaskOverride::Reveal));

    println!("--- Crewgate Shift Check-in Example ---");

    // Scenario 1: technician checks in at 23:30 plant time from the plant network
    let night = AttemptContext::new(DateTime::parse_from_rfc3339("2024-03-01T23:30:00+05:30")?)
        .with_source_address("10.20.4.9");
    let d1 = engine.evaluate_access("tech-1", &night, Some(&config))?;
    println!("tech-1 at 23:30 from plant network -> {:?}", d1.effect);
    assert!(d1.is_granted());

    // Scenario 2: same technician tries at noon from home
    let noon = AttemptContext::new(DateTime::parse_from_rfc3339("2024-03-01T12:00:00+05:30")?)
        .with_source_address("203.0.113.50");
    let d2 = engine.evaluate_access("tech-1", &noon, Some(&config))?;
    println!("tech-1 at 12:00 from home -> {:?}", d2.effect);
    for failure in &d2.failures {
        println!("  {failure}");
    }
    assert!(d2.is_denied());

    // Scenario 3: worker on the plant network but without location
    let no_gps = AttemptContext::new(DateTime::parse_from_rfc3339("2024-03-01T09:00:00+05:30")?)
        .with_source_address("10.20.1.1");
    let d3 = engine.evaluate_access("work-1", &no_gps, Some(&config))?;
    println!("work-1 without location -> {:?} (reason {})", d3.effect, d3.reason.value());
    assert!(d3.is_denied());

    // Scenario 4: worker inside the plant
    let on_site = no_gps.with_coordinates(Coordinates::new(19.0761, 72.8778));
    let d4 = engine.evaluate_access("work-1", &on_site, Some(&config))?;
    println!("work-1 inside plant -> {:?}", d4.effect);
    assert!(d4.is_granted());

    // Eligibility for an HVAC job in Maintenance
    let hvac = TaskRequirements::new().skills(["hvac", "refrigeration"]).department("Maintenance");
    let e = engine.evaluate_eligibility("tech-1", &hvac)?;
    println!("tech-1 eligible for HVAC job: {} (missing {:?})", e.eligible, e.missing_skills());

    // Roster views
    for viewer in [Role::OperationManager, Role::Admin] {
        let view = engine.project_for_display("tech-1", viewer)?;
        println!(
            "{viewer:?} sees tech-1 mobile {} / emergency contact {}",
            view.mobile, view.emergency_contact
        );
    }

    Ok(())
}
