//! Fuzz target for arbitrary delivery schedules
//!
//! Drives a two-party conversation with fuzzer-chosen sends, partial
//! deliveries, replays and flushes.
//!
//! # Strategy
//!
//! - Bursts of sends from one side before any delivery
//! - Crossing messages in both directions
//! - Replays of already delivered ciphertexts at arbitrary points
//! - Mock primitives for long schedules, production primitives for short ones
//!
//! # Invariants
//!
//! - Honest operations never fail
//! - The standard invariant registry holds after every operation
//! - A final flush delivers everything with agreeing keys
//! - NEVER panic inside the protocol

#![no_main]

use arbitrary::Arbitrary;
use arke_core::CipherSuite;
use arke_crypto::StandardSuite;
use arke_harness::{InvariantRegistry, MockSuite, Operation, Side, Simulation, SimulationConfig};
use libfuzzer_sys::fuzz_target;

const MAX_MOCK_OPERATIONS: usize = 256;
const MAX_STANDARD_OPERATIONS: usize = 24;

#[derive(Debug, Clone, Arbitrary)]
struct Schedule {
    seed: u64,
    /// Run over X25519/Ed25519 instead of the mocks
    production: bool,
    operations: Vec<Operation>,
}

fn run<S: CipherSuite>(suite: &S, seed: u64, operations: &[Operation]) {
    let registry = InvariantRegistry::standard();
    let config = SimulationConfig { seed, ..SimulationConfig::default() };
    let mut sim = Simulation::new(suite, config);

    for (i, op) in operations.iter().enumerate() {
        // INVARIANT 1: Honest operations and rejected replays never error
        if let Err(err) = sim.apply(op) {
            panic!("operation {i} ({op:?}) failed: {err}");
        }

        // INVARIANT 2: Invariants hold after every step
        registry.assert_all(&sim.snapshot(), &format!("operation {i} ({op:?})"));
    }

    // INVARIANT 3: Everything in flight is eventually accepted
    sim.deliver_all();
    registry.assert_all(&sim.snapshot(), "final flush");
    assert_eq!(sim.in_flight(Side::Initiator), 0);
    assert_eq!(sim.in_flight(Side::Responder), 0);
}

fuzz_target!(|schedule: Schedule| {
    if schedule.production {
        let len = schedule.operations.len().min(MAX_STANDARD_OPERATIONS);
        run(&StandardSuite::default(), schedule.seed, &schedule.operations[..len]);
    } else {
        let len = schedule.operations.len().min(MAX_MOCK_OPERATIONS);
        run(&MockSuite, schedule.seed, &schedule.operations[..len]);
    }
});
