//! Deterministic two-party simulation.
//!
//! Runs an initiator and a responder over an in-memory channel with one FIFO
//! per direction. Messages can be held back arbitrarily long, so the two
//! directions cross freely, but a direction never reorders.
//!
//! All randomness comes from a single seed:
//! - bootstrap randomness, identical for both parties
//! - per-party randomness for sends
//! - schedule randomness for [`Simulation::run_random_schedule`]

use std::collections::VecDeque;

use arke_core::{AssociatedData, CipherSuite, Ciphertext, Party, ProtocolError, Role};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::{
    invariants::{DirectionSnapshot, PartySnapshot, SystemSnapshot},
    operation::{Operation, Side},
};

/// Associated data every simulated message carries.
pub const SIMULATION_AD: &[u8] = b"arke simulation";

/// Schedule parameters.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Messages each party sends during a random schedule
    pub messages_per_party: usize,
    /// Chance that a schedule step delivers instead of sending
    pub deliver_probability: f64,
    /// Seed for all simulation randomness
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { messages_per_party: 20, deliver_probability: 0.5, seed: 1_785_324 }
    }
}

/// A two-party conversation under test.
pub struct Simulation<S: CipherSuite> {
    config: SimulationConfig,
    ad: AssociatedData,
    parties: [Party<S>; 2],
    rngs: [ChaCha20Rng; 2],
    schedule: ChaCha20Rng,
    /// Per sending side
    in_flight: [VecDeque<Ciphertext<S>>; 2],
    /// Per sending side, for replays
    last_delivered: [Option<Ciphertext<S>>; 2],
    directions: [DirectionSnapshot; 2],
}

impl<S: CipherSuite> Simulation<S> {
    /// Bootstrap both parties from `config.seed`.
    pub fn new(suite: &S, config: SimulationConfig) -> Self {
        let bootstrap = ChaCha20Rng::seed_from_u64(config.seed);
        let initiator = Party::new(suite, &mut bootstrap.clone(), Role::Initiator);
        let responder = Party::new(suite, &mut bootstrap.clone(), Role::Responder);

        let mut seeds = ChaCha20Rng::seed_from_u64(config.seed ^ 0x5EED_5EED_5EED_5EED);
        let rngs = [ChaCha20Rng::from_seed(seeds.r#gen()), ChaCha20Rng::from_seed(seeds.r#gen())];
        let schedule = ChaCha20Rng::from_seed(seeds.r#gen());

        Self {
            config,
            ad: AssociatedData::from(SIMULATION_AD),
            parties: [initiator, responder],
            rngs,
            schedule,
            in_flight: [VecDeque::new(), VecDeque::new()],
            last_delivered: [None, None],
            directions: [DirectionSnapshot::default(), DirectionSnapshot::default()],
        }
    }

    /// Associated data used for every message.
    pub fn ad(&self) -> &AssociatedData {
        &self.ad
    }

    /// The party on `side`.
    pub fn party(&self, side: Side) -> &Party<S> {
        &self.parties[side.index()]
    }

    /// The party on `side`, mutably. For tests that inject their own
    /// ciphertexts.
    pub fn party_mut(&mut self, side: Side) -> &mut Party<S> {
        &mut self.parties[side.index()]
    }

    /// `side` sends one message. Returns the ciphertext, which is also queued
    /// for delivery.
    pub fn send(&mut self, side: Side) -> Result<Ciphertext<S>, ProtocolError> {
        let i = side.index();
        let (session_key, ciphertext) = self.parties[i].send(&mut self.rngs[i], &self.ad)?;
        self.directions[i].sent_keys.push(session_key);
        self.in_flight[i].push_back(ciphertext.clone());
        Ok(ciphertext)
    }

    /// Deliver up to `count` of the oldest messages sent by `side`. Returns
    /// how many the receiver accepted.
    pub fn deliver(&mut self, side: Side, count: usize) -> usize {
        let i = side.index();
        let receiver = side.peer().index();
        let mut accepted = 0;

        for _ in 0..count {
            let Some(ciphertext) = self.in_flight[i].pop_front() else { break };
            match self.parties[receiver].receive(&self.ad, &ciphertext) {
                Some(session_key) => {
                    self.directions[i].received_keys.push(session_key);
                    accepted += 1;
                },
                None => self.directions[i].rejected += 1,
            }
            self.last_delivered[i] = Some(ciphertext);
        }
        accepted
    }

    /// Deliver everything in flight, both directions.
    pub fn deliver_all(&mut self) -> usize {
        let mut accepted = 0;
        for side in Side::BOTH {
            let pending = self.in_flight[side.index()].len();
            accepted += self.deliver(side, pending);
        }
        accepted
    }

    /// Deliver the last delivered message from `side` again. Returns the
    /// receiver's verdict, or `None` if nothing was delivered yet.
    pub fn replay(&mut self, side: Side) -> Option<Result<(), ProtocolError>> {
        let ciphertext = self.last_delivered[side.index()].clone()?;
        let receiver = &mut self.parties[side.peer().index()];
        let verdict = receiver.try_receive(&self.ad, &ciphertext).map(|_| ());
        if verdict.is_err() {
            self.directions[side.index()].rejected += 1;
        }
        Some(verdict)
    }

    /// Apply a model operation.
    pub fn apply(&mut self, operation: &Operation) -> Result<(), ProtocolError> {
        match operation {
            Operation::Send { side } => self.send(*side).map(|_| ()),
            Operation::Deliver { side, count } => {
                self.deliver(*side, usize::from(*count));
                Ok(())
            },
            Operation::Replay { side } => match self.replay(*side) {
                Some(Ok(())) => Err(ProtocolError::desync("replayed ciphertext was accepted")),
                Some(Err(_)) | None => Ok(()),
            },
            Operation::DeliverAll => {
                self.deliver_all();
                Ok(())
            },
        }
    }

    /// Interleave `messages_per_party` sends per side with random deliveries,
    /// then flush both directions.
    pub fn run_random_schedule(&mut self) -> Result<(), ProtocolError> {
        let mut remaining = [self.config.messages_per_party; 2];
        let deliver_probability = self.config.deliver_probability.clamp(0.0, 1.0);

        while remaining.iter().any(|&n| n > 0) {
            let in_flight = self.in_flight.iter().any(|queue| !queue.is_empty());
            if in_flight && self.schedule.gen_bool(deliver_probability) {
                let side = self.random_side(|sim, side| !sim.in_flight[side.index()].is_empty());
                self.deliver(side, 1);
            } else {
                let side = self.random_side(|_, side| remaining[side.index()] > 0);
                remaining[side.index()] -= 1;
                self.send(side)?;
            }
        }

        self.deliver_all();
        tracing::debug!(seed = self.config.seed, "random schedule complete");
        Ok(())
    }

    /// Pick a side uniformly among those satisfying `eligible`. At least one
    /// side must be eligible.
    fn random_side(&mut self, eligible: impl Fn(&Self, Side) -> bool) -> Side {
        let candidates: Vec<Side> = Side::BOTH.into_iter().filter(|&s| eligible(self, s)).collect();
        match candidates.as_slice() {
            [only] => *only,
            _ => {
                if self.schedule.gen_bool(0.5) {
                    Side::Initiator
                } else {
                    Side::Responder
                }
            },
        }
    }

    /// Messages sent by `side` and not yet delivered.
    pub fn in_flight(&self, side: Side) -> usize {
        self.in_flight[side.index()].len()
    }

    /// Deliveries from `side` that the receiver rejected, replays included.
    pub fn rejected(&self, side: Side) -> usize {
        self.directions[side.index()].rejected
    }

    /// Keys accepted by the peer of `side`.
    pub fn accepted(&self, side: Side) -> usize {
        self.directions[side.index()].received_keys.len()
    }

    /// Observable state of both parties and both directions.
    pub fn snapshot(&self) -> SystemSnapshot {
        let mut directions = self.directions.clone();
        for side in Side::BOTH {
            directions[side.index()].in_flight = self.in_flight[side.index()].len();
        }
        SystemSnapshot {
            parties: [PartySnapshot::of(&self.parties[0]), PartySnapshot::of(&self.parties[1])],
            directions,
        }
    }
}
