//! End-to-end conversations over the production primitives.
//!
//! These tests verify critical invariants:
//! - Both parties agree on every session key with real X25519 and Ed25519
//! - Crossing and out-of-order traffic is tolerated
//! - Replays and tampered signatures are rejected without side effects

use arke_core::{AssociatedData, Ciphertext, Party, ProtocolError, Role};
use arke_crypto::{Ed25519Signature, OracleConfig, StandardSuite};
use arke_harness::{InvariantRegistry, PartySnapshot, Side, Simulation, SimulationConfig};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn simulation(seed: u64) -> Simulation<StandardSuite> {
    let config = SimulationConfig { seed, ..SimulationConfig::default() };
    Simulation::new(&StandardSuite::default(), config)
}

/// INVARIANT: A send/receive in each direction yields matching keys.
#[test]
fn direct_exchange_agrees() {
    let suite = StandardSuite::default();
    let bootstrap = ChaCha20Rng::seed_from_u64(1);
    let mut alice = Party::new(&suite, &mut bootstrap.clone(), Role::Initiator);
    let mut bob = Party::new(&suite, &mut bootstrap.clone(), Role::Responder);
    let mut rng = ChaCha20Rng::seed_from_u64(2);
    let ad = AssociatedData::new(b"standard suite".to_vec());

    let (sent, ciphertext) = alice.send(&mut rng, &ad).unwrap();
    assert_eq!(bob.receive(&ad, &ciphertext), Some(sent));

    let (sent, ciphertext) = bob.send(&mut rng, &ad).unwrap();
    assert_eq!(alice.receive(&ad, &ciphertext), Some(sent));
}

/// INVARIANT: Three sends before any receive all decrypt, and the reply
/// encapsulates to every queued kuKEM key.
#[test]
fn burst_then_reply_agrees() {
    let registry = InvariantRegistry::standard();
    let mut sim = simulation(3);

    for _ in 0..3 {
        sim.send(Side::Initiator).unwrap();
    }
    assert_eq!(sim.deliver(Side::Initiator, 3), 3);

    let reply = sim.send(Side::Responder).unwrap();
    assert_eq!(reply.used_keys(), 4);
    assert_eq!(sim.deliver(Side::Responder, 1), 1);

    registry.assert_all(&sim.snapshot(), "after reply");
}

/// INVARIANT: Twenty crossing messages per direction all agree.
#[test]
fn random_schedule_agrees() {
    let registry = InvariantRegistry::standard();

    for seed in [1_785_324, 99] {
        let mut sim = simulation(seed);
        sim.run_random_schedule().unwrap();

        registry.assert_all(&sim.snapshot(), &format!("seed {seed}"));
        assert_eq!(sim.accepted(Side::Initiator), 20);
        assert_eq!(sim.accepted(Side::Responder), 20);
        assert_eq!(sim.rejected(Side::Initiator) + sim.rejected(Side::Responder), 0);
    }
}

/// INVARIANT: A custom oracle configuration still agrees end to end.
#[test]
fn custom_oracle_config_agrees() {
    let config = OracleConfig { chaining_key_len: 64, context: b"custom".to_vec() };
    let suite = StandardSuite::new(config).unwrap();
    let config = SimulationConfig { messages_per_party: 8, ..SimulationConfig::default() };
    let mut sim = Simulation::new(&suite, config);

    sim.run_random_schedule().unwrap();

    InvariantRegistry::standard().assert_all(&sim.snapshot(), "custom oracle");
    assert_eq!(sim.accepted(Side::Initiator), 8);
}

/// INVARIANT: A replayed ciphertext fails against the rotated verification
/// key and leaves the receiver untouched.
#[test]
fn replay_is_rejected() {
    let mut sim = simulation(4);
    sim.send(Side::Initiator).unwrap();
    assert_eq!(sim.deliver(Side::Initiator, 1), 1);
    let before = PartySnapshot::of(sim.party(Side::Responder));

    assert_eq!(sim.replay(Side::Initiator), Some(Err(ProtocolError::SignatureInvalid)));
    assert_eq!(PartySnapshot::of(sim.party(Side::Responder)), before);

    sim.send(Side::Initiator).unwrap();
    assert_eq!(sim.deliver_all(), 1);
}

/// INVARIANT: Flipping a signature bit is caught by strict verification.
#[test]
fn tampered_signature_is_rejected() {
    let mut sim = simulation(5);
    let genuine = sim.send(Side::Initiator).unwrap();

    let mut bytes = genuine.signature().to_bytes();
    bytes[10] ^= 0x40;
    let tampered = Ciphertext::<StandardSuite>::from_parts(
        genuine.received_count(),
        genuine.public_key().clone(),
        *genuine.verification_key(),
        genuine.used_keys(),
        genuine.body().clone(),
        Ed25519Signature::from_bytes(&bytes),
    );
    let ad = sim.ad().clone();

    let result = sim.party_mut(Side::Responder).try_receive(&ad, &tampered);

    assert_eq!(result, Err(ProtocolError::SignatureInvalid));
    assert_eq!(sim.deliver(Side::Initiator, 1), 1);
}

/// INVARIANT: Parties bootstrapped from different randomness never agree.
#[test]
fn mismatched_bootstrap_is_rejected() {
    let suite = StandardSuite::default();
    let mut alice = Party::new(&suite, &mut ChaCha20Rng::seed_from_u64(6), Role::Initiator);
    let mut bob = Party::new(&suite, &mut ChaCha20Rng::seed_from_u64(7), Role::Responder);
    let mut rng = ChaCha20Rng::seed_from_u64(8);
    let ad = AssociatedData::new(b"mismatch".to_vec());

    let (_, ciphertext) = alice.send(&mut rng, &ad).unwrap();

    assert!(bob.receive(&ad, &ciphertext).is_none());
    assert_eq!(bob.received_count(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Random schedules with any delivery bias agree over real primitives.
    #[test]
    fn prop_random_schedules_agree(
        seed in any::<u64>(),
        messages_per_party in 0..6usize,
        deliver_probability in 0.0..=1.0f64
    ) {
        let config = SimulationConfig { messages_per_party, deliver_probability, seed };
        let mut sim = Simulation::new(&StandardSuite::default(), config);

        prop_assert!(sim.run_random_schedule().is_ok());
        prop_assert!(InvariantRegistry::standard().check_all(&sim.snapshot()).is_ok());
        prop_assert_eq!(sim.accepted(Side::Initiator), messages_per_party);
        prop_assert_eq!(sim.accepted(Side::Responder), messages_per_party);
    }
}
