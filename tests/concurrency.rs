//! Concurrent evaluation against a store that is being updated.
//!
//! Readers must always see a complete record: either the version before an
//! update or the one after, never a mix.

use std::sync::Arc;
use std::thread;

use chrono::DateTime;

use crewgate::{
    AttemptContext, GateKind, IdentityRecord, NetworkRange, PolicyEngine, RecordStore,
    ReferenceConfiguration, Role, UserType, WorkTiming,
};

fn record(id: &str) -> IdentityRecord {
    IdentityRecord::new(
        id,
        "Concurrent Worker",
        Role::Worker,
        UserType::Worker,
        WorkTiming::from_hm((0, 0), (23, 59)).unwrap(),
    )
    .with_scope("north-depot", "Maintenance")
    .with_access_flags(false, false, false)
}

#[test]
fn test_readers_never_see_partial_updates() {
    let store = Arc::new(RecordStore::from_records([record("w-1")]).unwrap());
    let engine = Arc::new(PolicyEngine::new(Arc::clone(&store)));
    let config = Arc::new(
        ReferenceConfiguration::new().with_trusted_range(NetworkRange::parse("10.0.0.0/8").unwrap()),
    );

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..500 {
                let on = i % 2 == 0;
                // Both fields flip together; a reader must never see them differ.
                store
                    .update("w-1", |r| {
                        r.gates.set(GateKind::Network, on);
                        r.mask_mobile = on;
                    })
                    .unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let store = Arc::clone(&store);
            let config = Arc::clone(&config);
            thread::spawn(move || {
                let attempt =
                    AttemptContext::new(DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z").unwrap())
                        .with_source_address("198.51.100.1");
                for _ in 0..500 {
                    let snapshot = store.get("w-1").unwrap();
                    assert_eq!(snapshot.gates.is_enabled(GateKind::Network), snapshot.mask_mobile);

                    let decision = engine.evaluate_access("w-1", &attempt, Some(&config)).unwrap();
                    // Untrusted origin: denied exactly when the network gate was on.
                    if decision.is_denied() {
                        assert_eq!(decision.failing_gates(), vec![GateKind::Network]);
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn test_parallel_evaluation_is_consistent() {
    let store = Arc::new(
        RecordStore::from_records((0..16).map(|i| {
            record(&format!("w-{i}")).with_gate(GateKind::Network, i % 2 == 0)
        }))
        .unwrap(),
    );
    let engine = Arc::new(PolicyEngine::new(store));
    let config = Arc::new(
        ReferenceConfiguration::new().with_trusted_range(NetworkRange::parse("10.0.0.0/8").unwrap()),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let config = Arc::clone(&config);
            thread::spawn(move || {
                let attempt =
                    AttemptContext::new(DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z").unwrap())
                        .with_source_address("172.16.0.1");
                (0..16)
                    .map(|i| {
                        engine
                            .evaluate_access(&format!("w-{i}"), &attempt, Some(&config))
                            .unwrap()
                            .is_granted()
                    })
                    .collect::<Vec<bool>>()
            })
        })
        .collect();

    let expected: Vec<bool> = (0..16).map(|i| i % 2 != 0).collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
