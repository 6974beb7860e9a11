//! Key agreement under asynchronous delivery.
//!
//! These tests verify critical invariants:
//! - Every delivered message yields the sender's session key
//! - Several sends before any receive are tolerated
//! - Messages crossing in flight are tolerated in both directions
//! - Runs are reproducible from the seed

use arke_harness::{InvariantRegistry, MockSuite, Side, Simulation, SimulationConfig};

fn simulation(seed: u64) -> Simulation<MockSuite> {
    Simulation::new(&MockSuite, SimulationConfig { seed, ..SimulationConfig::default() })
}

/// INVARIANT: Three sends before any receive all decrypt on delivery.
#[test]
fn out_of_order_sends_before_first_receive() {
    let registry = InvariantRegistry::standard();
    let mut sim = simulation(1);

    for _ in 0..3 {
        sim.send(Side::Initiator).unwrap();
    }
    registry.assert_all(&sim.snapshot(), "after initiator burst");

    assert_eq!(sim.deliver(Side::Initiator, 3), 3);
    registry.assert_all(&sim.snapshot(), "after delivering burst");

    // Reply encapsulates to all three queued kuKEM keys
    let reply = sim.send(Side::Responder).unwrap();
    assert_eq!(reply.used_keys(), 4);
    assert_eq!(sim.deliver(Side::Responder, 1), 1);

    registry.assert_all(&sim.snapshot(), "after reply");
    assert_eq!(sim.rejected(Side::Initiator) + sim.rejected(Side::Responder), 0);
}

/// INVARIANT: Both parties may send before seeing the other's message.
#[test]
fn crossing_messages_agree() {
    let registry = InvariantRegistry::standard();
    let mut sim = simulation(2);

    sim.send(Side::Initiator).unwrap();
    sim.send(Side::Responder).unwrap();
    sim.send(Side::Initiator).unwrap();
    sim.send(Side::Responder).unwrap();
    registry.assert_all(&sim.snapshot(), "before delivery");

    sim.deliver(Side::Initiator, 1);
    sim.send(Side::Responder).unwrap();
    sim.deliver(Side::Responder, 2);
    sim.send(Side::Initiator).unwrap();
    registry.assert_all(&sim.snapshot(), "mid conversation");

    assert_eq!(sim.deliver_all(), 3);
    registry.assert_all(&sim.snapshot(), "after flush");
    assert_eq!(sim.accepted(Side::Initiator), 3);
    assert_eq!(sim.accepted(Side::Responder), 3);
}

/// INVARIANT: Twenty messages each way under a random schedule all agree.
#[test]
fn random_schedule_agrees() {
    let registry = InvariantRegistry::standard();

    for seed in [1_785_324, 7, 42, 0xDEAD_BEEF] {
        let mut sim = simulation(seed);
        sim.run_random_schedule().unwrap();

        registry.assert_all(&sim.snapshot(), &format!("seed {seed}"));
        assert_eq!(sim.accepted(Side::Initiator), 20, "seed {seed}");
        assert_eq!(sim.accepted(Side::Responder), 20, "seed {seed}");
        assert_eq!(sim.in_flight(Side::Initiator) + sim.in_flight(Side::Responder), 0);
    }
}

/// INVARIANT: Schedules that only deliver at the very end still agree.
#[test]
fn fully_crossed_schedule_agrees() {
    let registry = InvariantRegistry::standard();
    let config =
        SimulationConfig { messages_per_party: 20, deliver_probability: 0.0, seed: 11 };
    let mut sim = Simulation::new(&MockSuite, config);

    sim.run_random_schedule().unwrap();

    registry.assert_all(&sim.snapshot(), "fully crossed");
    assert_eq!(sim.accepted(Side::Initiator), 20);
    assert_eq!(sim.accepted(Side::Responder), 20);
}

/// INVARIANT: The same seed produces the same conversation.
#[test]
fn runs_are_deterministic() {
    let mut first = simulation(3);
    let mut second = simulation(3);

    first.run_random_schedule().unwrap();
    second.run_random_schedule().unwrap();

    let first = first.snapshot();
    let second = second.snapshot();
    assert_eq!(first.parties, second.parties);
    for (a, b) in first.directions.iter().zip(&second.directions) {
        assert_eq!(a.sent_keys, b.sent_keys);
    }
}

/// INVARIANT: Different seeds produce different session keys.
#[test]
fn seeds_are_independent() {
    let mut first = simulation(4);
    let mut second = simulation(5);

    first.send(Side::Initiator).unwrap();
    second.send(Side::Initiator).unwrap();

    assert_ne!(
        first.snapshot().directions[0].sent_keys,
        second.snapshot().directions[0].sent_keys
    );
}
