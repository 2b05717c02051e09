// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::cast_precision_loss)] // Stats/metrics need this
#![allow(clippy::semicolon_if_nothing_returned)] // Benchmark code formatting
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hdds_carrier::{
    CarrierFactory, Direction, InboundConnection, ManualClock, ModifierConfig, PriorityElection,
    PriorityState, Route,
};
use std::sync::Arc;

// ============================================================================
// Decay Benchmarks
// ============================================================================

/// Benchmark: actual_priority inside the decay window
fn bench_actual_priority(c: &mut Criterion) {
    let mut state = PriorityState::new("/src", 10.0, 2.0);
    state.observe(0.0);

    c.bench_function("actual_priority", |b| {
        b.iter(|| state.actual_priority(black_box(0.5)))
    });
}

// ============================================================================
// Arbitration Benchmarks
// ============================================================================

/// Benchmark: one admission decision with N peers on the endpoint
fn bench_accept_incoming(c: &mut Criterion) {
    let mut group = c.benchmark_group("accept_incoming");

    for peers_count in [2usize, 8, 32, 128] {
        let peers = Arc::new(PriorityElection::new());
        let clock = Arc::new(ManualClock::new(0.0));
        let factory = CarrierFactory::with_defaults(Arc::clone(&peers), clock.clone());

        let mut conns: Vec<InboundConnection> = (0..peers_count)
            .map(|i| {
                let spec = format!("tcp+recv.priority+level.{}+time.5", i + 1);
                InboundConnection::open(&factory, Route::new(format!("/src{}", i), "/port1", spec))
                    .unwrap()
            })
            .collect();
        for conn in &mut conns {
            conn.deliver(b"warmup");
        }

        let last = conns.len() - 1;
        group.bench_with_input(
            BenchmarkId::from_parameter(peers_count),
            &peers_count,
            |b, _| {
                b.iter(|| {
                    clock.advance(1e-6);
                    black_box(conns[last].deliver(black_box(b"payload")))
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Setup Benchmarks
// ============================================================================

/// Benchmark: modifier string parsing
fn bench_parse_modifiers(c: &mut Criterion) {
    c.bench_function("parse_modifiers", |b| {
        b.iter(|| {
            ModifierConfig::parse(black_box(
                "tcp+recv.priority+level.15+time.2+inhibit+arrival.admitted",
            ))
        })
    });
}

/// Benchmark: build + configure + drop of a priority connection
fn bench_connection_lifecycle(c: &mut Criterion) {
    let peers = Arc::new(PriorityElection::new());
    let clock = Arc::new(ManualClock::new(0.0));
    let factory = CarrierFactory::with_defaults(Arc::clone(&peers), clock);
    let _anchor = InboundConnection::open(
        &factory,
        Route::new("/anchor", "/port1", "tcp+recv.priority+level.1+time.1"),
    )
    .unwrap();

    c.bench_function("connection_lifecycle", |b| {
        b.iter(|| {
            let route = Route::new("/src", "/port1", "tcp+recv.priority+level.15+time.2");
            drop(black_box(InboundConnection::open(&factory, route).unwrap()))
        })
    });

    c.bench_function("factory_build", |b| {
        b.iter(|| {
            black_box(
                factory
                    .build(black_box("tcp+recv.priority+level.15"), Direction::Recv)
                    .unwrap(),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_actual_priority,
    bench_accept_incoming,
    bench_parse_modifiers,
    bench_connection_lifecycle,
);
criterion_main!(benches);
