//! Model-based property tests.
//!
//! These tests generate random operation sequences and check the standard
//! invariants after every step.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!                          ▼
//!                 Simulation<MockSuite>
//!                          │
//!                          ▼
//!          InvariantRegistry::standard() after each op
//! ```

use arke_harness::{InvariantRegistry, MockSuite, Operation, Side, Simulation, SimulationConfig};
use proptest::prelude::*;

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Initiator), Just(Side::Responder)]
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        4 => side_strategy().prop_map(|side| Operation::Send { side }),
        3 => (side_strategy(), 0..4u8).prop_map(|(side, count)| Operation::Deliver { side, count }),
        1 => side_strategy().prop_map(|side| Operation::Replay { side }),
        1 => Just(Operation::DeliverAll),
    ]
}

proptest! {
    /// Every operation sequence keeps the conversation consistent, and a final
    /// flush delivers every message with agreeing keys.
    #[test]
    fn prop_invariants_hold(
        seed in any::<u64>(),
        ops in prop::collection::vec(operation_strategy(), 0..60)
    ) {
        let registry = InvariantRegistry::standard();
        let config = SimulationConfig { seed, ..SimulationConfig::default() };
        let mut sim = Simulation::new(&MockSuite, config);

        for (i, op) in ops.iter().enumerate() {
            let result = sim.apply(op);
            prop_assert!(result.is_ok(), "operation {} ({:?}) failed: {:?}", i, op, result);

            let snapshot = sim.snapshot();
            let checked = registry.check_all(&snapshot);
            prop_assert!(checked.is_ok(), "after operation {} ({:?}): {:?}", i, op, checked);
        }

        sim.deliver_all();
        let checked = registry.check_all(&sim.snapshot());
        prop_assert!(checked.is_ok(), "after final flush: {:?}", checked);
        prop_assert_eq!(sim.in_flight(Side::Initiator), 0);
        prop_assert_eq!(sim.in_flight(Side::Responder), 0);
    }

    /// Only replays are ever rejected.
    #[test]
    fn prop_honest_traffic_is_never_rejected(
        seed in any::<u64>(),
        ops in prop::collection::vec(operation_strategy(), 0..60)
    ) {
        let config = SimulationConfig { seed, ..SimulationConfig::default() };
        let mut sim = Simulation::new(&MockSuite, config);
        let mut replays = [0usize; 2];

        for op in &ops {
            if let Operation::Replay { side } = op
                && sim.replay(*side).is_some()
            {
                replays[side.index()] += 1;
                continue;
            }
            prop_assert!(sim.apply(op).is_ok());
        }

        prop_assert_eq!(sim.rejected(Side::Initiator), replays[0]);
        prop_assert_eq!(sim.rejected(Side::Responder), replays[1]);
    }

    /// Random schedules with any delivery bias agree.
    #[test]
    fn prop_random_schedules_agree(
        seed in any::<u64>(),
        messages_per_party in 0..12usize,
        deliver_probability in 0.0..=1.0f64
    ) {
        let config = SimulationConfig { messages_per_party, deliver_probability, seed };
        let mut sim = Simulation::new(&MockSuite, config);

        prop_assert!(sim.run_random_schedule().is_ok());
        prop_assert!(InvariantRegistry::standard().check_all(&sim.snapshot()).is_ok());
        prop_assert_eq!(sim.accepted(Side::Initiator), messages_per_party);
        prop_assert_eq!(sim.accepted(Side::Responder), messages_per_party);
    }
}
