// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::float_cmp)] // Test assertions with constants
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure

//! End-to-end priority admission through the carrier factory.

use hdds_carrier::{
    simulator, ArrivalPolicy, CarrierError, CarrierFactory, EventConfig, InboundConnection,
    ManualClock, PriorityElection, Route, ScenarioConfig, SourceConfig,
};
use std::io::Write;
use std::sync::Arc;

struct Harness {
    peers: Arc<PriorityElection>,
    clock: Arc<ManualClock>,
    factory: CarrierFactory,
}

impl Harness {
    fn new() -> Self {
        let peers = Arc::new(PriorityElection::new());
        let clock = Arc::new(ManualClock::new(0.0));
        let factory = CarrierFactory::with_defaults(Arc::clone(&peers), clock.clone());
        Self {
            peers,
            clock,
            factory,
        }
    }

    fn open(&self, from: &str, to: &str, params: &str) -> InboundConnection {
        let spec = format!("tcp+recv.priority{}", params);
        InboundConnection::open(&self.factory, Route::new(from, to, spec)).expect("open")
    }

    fn send(&self, conn: &mut InboundConnection, at: f64) -> bool {
        let payload = conn.route().from.clone();
        self.clock.set(at);
        conn.deliver(payload.as_bytes()).is_some()
    }
}

#[test]
fn test_two_sources() {
    let h = Harness::new();
    let mut a = h.open("/a", "/port1", "+level.10+time.2");
    let mut b = h.open("/b", "/port1", "+level.5+time.2");

    assert!(h.send(&mut a, 0.0));
    assert!(!h.send(&mut b, 0.1));
    assert!(h.send(&mut a, 0.2));

    // /a quiet for longer than its time constant.
    assert!(h.send(&mut b, 2.3));
    assert!(h.send(&mut b, 2.4));

    // /a is back and outranks /b again.
    assert!(h.send(&mut a, 2.5));
    assert!(!h.send(&mut b, 2.6));
}

#[test]
fn test_inhibitory_source() {
    let h = Harness::new();
    let mut stop = h.open("/stop", "/port1", "+level.50+time.1+inhibit");
    let mut worker = h.open("/worker", "/port1", "+level.10+time.5");

    assert!(h.send(&mut worker, 0.0));

    assert!(!h.send(&mut stop, 1.0));
    assert!(!h.send(&mut worker, 1.1));
    assert!(!h.send(&mut worker, 1.9));

    // Inhibition expires one time constant after the last stop message.
    assert!(h.send(&mut worker, 2.01));
    assert_eq!(stop.stats().snapshot().messages_delivered, 0);
}

#[test]
fn test_weak_inhibitor_does_not_block_stronger_source() {
    let h = Harness::new();
    let mut stop = h.open("/stop", "/port1", "+level.1+time.1+inhibit");
    let mut worker = h.open("/worker", "/port1", "+level.10+time.5");

    assert!(!h.send(&mut stop, 0.0));
    assert!(h.send(&mut worker, 0.1));
}

#[test]
fn test_ties_admit_both() {
    let h = Harness::new();
    let mut a = h.open("/a", "/port1", "+level.5+time.1");
    let mut b = h.open("/b", "/port1", "+level.5+time.1");

    assert!(h.send(&mut a, 0.0));
    assert!(h.send(&mut b, 0.0));
    assert!(h.send(&mut a, 0.0));
}

#[test]
fn test_sources_without_decay_stay_at_floor() {
    let h = Harness::new();
    let mut a = h.open("/a", "/port1", "+level.100");
    let mut b = h.open("/b", "/port1", "+level.1");

    assert!(h.send(&mut a, 0.0));
    assert!(h.send(&mut b, 0.0));
}

#[test]
fn test_endpoints_are_isolated() {
    let h = Harness::new();
    let mut a = h.open("/a", "/left", "+level.10+time.2");
    let mut b = h.open("/b", "/right", "+level.1+time.2");

    assert!(h.send(&mut a, 0.0));
    assert!(h.send(&mut b, 0.1));
    assert_eq!(h.peers.keys(), vec!["/left", "/right"]);
}

#[test]
fn test_arrival_policy_controls_stamping() {
    let h = Harness::new();
    let mut a = h.open("/a", "/port1", "+level.10+time.2");
    let mut observed = h.open("/obs", "/port1", "+level.5+time.2");
    let mut admitted = h.open("/adm", "/port1", "+level.5+time.2+arrival.admitted");

    assert!(h.send(&mut a, 0.0));
    assert!(!h.send(&mut observed, 0.1));
    assert!(!h.send(&mut admitted, 0.1));

    let group = h.peers.lookup("/port1").expect("group");
    let snapshot = group.snapshot(0.1);
    let arrival = |name: &str| {
        snapshot
            .iter()
            .find(|p| p.source_name == name)
            .and_then(|p| p.time_arrival)
    };
    assert_eq!(arrival("/obs"), Some(0.1));
    assert_eq!(arrival("/adm"), None);
}

#[test]
fn test_lifecycle_and_fresh_group() {
    let h = Harness::new();
    let a = h.open("/a", "/port1", "+level.10+time.2");
    let mut b = h.open("/b", "/port1", "+level.5+time.2");
    let first = h.peers.lookup("/port1").expect("group");
    assert_eq!(first.len(), 2);

    drop(a);
    assert_eq!(first.len(), 1);
    assert!(h.send(&mut b, 0.0));

    b.close();
    assert!(h.peers.lookup("/port1").is_none());

    let _c = h.open("/c", "/port1", "+level.1+time.1");
    let second = h.peers.lookup("/port1").expect("group");
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.len(), 1);
}

#[test]
fn test_refused_connections_leave_no_trace() {
    let h = Harness::new();

    let inhibit = InboundConnection::open(
        &h.factory,
        Route::new("/stop", "/port1", "tcp+recv.priority+inhibit"),
    );
    assert!(matches!(inhibit, Err(CarrierError::Misconfigured { .. })));

    let unknown = InboundConnection::open(
        &h.factory,
        Route::new("/a", "/port1", "tcp+recv.priority+recv.zip"),
    );
    assert!(matches!(unknown, Err(CarrierError::UnknownModifier(_))));

    assert_eq!(h.peers.group_count(), 0);
}

#[test]
fn test_scenario_file_round_trip() {
    let config = ScenarioConfig {
        name: "file".into(),
        sources: vec![
            SourceConfig::new("/a", 10.0, 2.0),
            SourceConfig::new("/b", 5.0, 2.0).arrival(ArrivalPolicy::Admitted),
        ],
        events: vec![
            EventConfig::new(0.0, "/a"),
            EventConfig::new(0.1, "/b"),
            EventConfig::new(3.0, "/b"),
        ],
        ..Default::default()
    };

    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(config.to_toml().expect("serialize").as_bytes())
        .expect("write");

    let loaded = ScenarioConfig::from_file(file.path()).expect("load");
    let report = simulator::run(&loaded).expect("run");
    assert_eq!(report.delivered(), vec![true, false, true]);
}
