//! Deterministic simulation harness for arke protocol testing.
//!
//! # Mock Primitives
//!
//! [`MockSuite`] swaps every cryptographic primitive for a fast, transparent
//! stand-in that still rejects the wrong key, level or signer. Protocol bugs
//! show up as rejected messages or diverging session keys.
//!
//! # Simulation
//!
//! [`Simulation`] wires two parties to an in-memory channel driven by a single
//! seed. Tests either script deliveries step by step, replay a random
//! schedule, or feed it [`Operation`] sequences from proptest or a fuzzer.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all delivery schedules,
//! not specific scenarios. Use [`InvariantRegistry::standard()`] for the
//! conversation invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod mock;
pub mod operation;
pub mod simulation;

pub use invariants::{
    CounterConsistency, DirectionSnapshot, Invariant, InvariantRegistry, InvariantResult,
    KeyAgreement, PartySnapshot, QueueBounds, SystemSnapshot, Violation,
};
pub use mock::{MockSigner, MockSuite};
pub use operation::{Operation, Side};
pub use simulation::{SIMULATION_AD, Simulation, SimulationConfig};
