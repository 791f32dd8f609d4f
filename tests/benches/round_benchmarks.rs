//! # Round Benchmarks
//!
//! | Path | What dominates |
//! |------|----------------|
//! | `RegisterInput` processing | ownership proof verification |
//! | Log replay | event fold, per registered input |
//! | Idempotent retry | token lookup under the aggregate lock |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use ws_01_round::test_utils::{processor, started_round, TestAlice, TEST_ROUND_ID};
use ws_01_round::{RoundCommand, RoundEvent, RoundParameters, RoundState};
use ws_02_event_store::{Aggregate, EventStore, InMemoryEventStore};

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime builds")
}

/// Log of a default round with `inputs` registered P2WPKH inputs.
fn registration_log(rt: &Runtime, inputs: u8) -> Vec<RoundEvent> {
    let processor = processor();
    let mut state = started_round(None);
    let mut log = vec![
        RoundEvent::RoundStarted {
            parameters: RoundParameters::default(),
        },
        RoundEvent::AllInputsAllowed,
    ];
    for seed in 1..=inputs {
        let alice = TestAlice::p2wpkh(seed, 100_000);
        let events = rt
            .block_on(processor.handle(&alice.register(&state), &state))
            .expect("registration accepted");
        for event in &events {
            state = state.apply(event).expect("event folds");
        }
        log.extend(events);
    }
    log
}

// ============================================================================
// COMMAND PROCESSING
// ============================================================================

fn bench_register_input(c: &mut Criterion) {
    let mut group = c.benchmark_group("ws-01-register-input");
    group.measurement_time(Duration::from_secs(5));

    let rt = runtime();
    let processor = processor();
    let state = started_round(None);
    let p2wpkh = TestAlice::p2wpkh(1, 100_000).register(&state);
    let p2tr = TestAlice::p2tr(2, 100_000).register(&state);

    group.bench_function("p2wpkh", |b| {
        b.iter(|| black_box(rt.block_on(processor.handle(&p2wpkh, &state)).is_ok()))
    });
    group.bench_function("p2tr", |b| {
        b.iter(|| black_box(rt.block_on(processor.handle(&p2tr, &state)).is_ok()))
    });

    group.finish();
}

// ============================================================================
// REPLAY
// ============================================================================

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("ws-01-replay");
    let rt = runtime();

    for inputs in [10u8, 50, 200] {
        let log = registration_log(&rt, inputs);
        group.throughput(Throughput::Elements(log.len() as u64));
        group.bench_with_input(BenchmarkId::new("fold", inputs), &log, |b, log| {
            b.iter(|| black_box(RoundState::replay(TEST_ROUND_ID, log).is_ok()))
        });
    }

    group.finish();
}

// ============================================================================
// EVENT STORE
// ============================================================================

fn bench_idempotent_retry(c: &mut Criterion) {
    let mut group = c.benchmark_group("ws-02-event-store");
    let rt = runtime();

    let store = InMemoryEventStore::new(Arc::new(processor()));
    let state = rt
        .block_on(store.process_command(
            RoundCommand::start_round(RoundParameters::default(), None),
            &TEST_ROUND_ID,
        ))
        .expect("round starts")
        .state;
    let registration = TestAlice::p2wpkh(1, 100_000).register(&state);
    rt.block_on(store.process_command(registration.clone(), &TEST_ROUND_ID))
        .expect("registration accepted");

    group.bench_function("replayed_registration", |b| {
        b.iter(|| {
            let outcome = rt.block_on(store.process_command(registration.clone(), &TEST_ROUND_ID));
            black_box(outcome.map(|o| o.replayed).unwrap_or(false))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_register_input,
    bench_replay,
    bench_idempotent_retry
);
criterion_main!(benches);
