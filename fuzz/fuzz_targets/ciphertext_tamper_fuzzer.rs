//! Fuzz target for tampered ciphertexts
//!
//! Builds a short honest conversation, then hands the receiver a mutated
//! copy of the next message. Mock signatures are re-forged over the mutated
//! fields so the counter and queue checks behind the signature get
//! exercised too.
//!
//! # Strategy
//!
//! - Arbitrary `received_count` and `used_keys`
//! - Dropped or duplicated kuKEM ciphertexts in the body
//! - Bodies and verification keys borrowed from other messages
//! - Signatures left stale after a mutation
//!
//! # Invariants
//!
//! - A mutation under the original signature is always rejected
//! - A re-forged mutation is rejected or accepted, never a panic
//! - Rejection leaves the receiver's state unchanged
//! - The genuine message is still accepted afterwards

#![no_main]

use arbitrary::Arbitrary;
use arke_core::{AssociatedData, Ciphertext, QueuedCiphertext};
use arke_harness::{
    InvariantRegistry, MockSigner, MockSuite, PartySnapshot, Side, Simulation, SimulationConfig,
    mock::MockVerificationKey,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct TamperScenario {
    seed: u64,
    /// Honest traffic before the target message, as (side, deliver) pairs
    warmup: Vec<(Side, bool)>,
    tamper: Tamper,
    /// Re-sign under the pinned key after mutating
    reforge: bool,
}

#[derive(Debug, Clone, Arbitrary)]
enum Tamper {
    ReceivedCount(u64),
    UsedKeys(u32),
    DropKuKemCiphertext,
    DuplicateKuKemCiphertext,
    BodyFromOtherMessage,
    VerificationKeyFromOtherMessage,
    StaleSignature,
}

type MockCiphertext = Ciphertext<MockSuite>;

fn mutate(target: &MockCiphertext, other: &MockCiphertext, tamper: &Tamper) -> MockCiphertext {
    let mut received_count = target.received_count();
    let mut used_keys = target.used_keys();
    let mut body = target.body().clone();
    let mut verification_key = target.verification_key().clone();
    let mut signature = target.signature().clone();

    match tamper {
        Tamper::ReceivedCount(value) => received_count = *value,
        Tamper::UsedKeys(value) => used_keys = *value,
        Tamper::DropKuKemCiphertext => {
            let mut kukem = body.kukem().to_vec();
            kukem.pop();
            body = QueuedCiphertext::new(body.kem().clone(), kukem);
        },
        Tamper::DuplicateKuKemCiphertext => {
            let mut kukem = body.kukem().to_vec();
            if let Some(last) = kukem.last().cloned() {
                kukem.push(last);
            }
            body = QueuedCiphertext::new(body.kem().clone(), kukem);
        },
        Tamper::BodyFromOtherMessage => body = other.body().clone(),
        Tamper::VerificationKeyFromOtherMessage => {
            verification_key = other.verification_key().clone();
        },
        Tamper::StaleSignature => signature = other.signature().clone(),
    }

    Ciphertext::from_parts(
        received_count,
        target.public_key().clone(),
        verification_key,
        used_keys,
        body,
        signature,
    )
}

fn reforge(
    ciphertext: &MockCiphertext,
    pinned: &MockVerificationKey,
    ad: &AssociatedData,
) -> MockCiphertext {
    let signature = MockSigner::forge(pinned, &ciphertext.signed_message(ad));
    Ciphertext::from_parts(
        ciphertext.received_count(),
        ciphertext.public_key().clone(),
        ciphertext.verification_key().clone(),
        ciphertext.used_keys(),
        ciphertext.body().clone(),
        signature,
    )
}

fuzz_target!(|scenario: TamperScenario| {
    let registry = InvariantRegistry::standard();
    let config = SimulationConfig { seed: scenario.seed, ..SimulationConfig::default() };
    let mut sim = Simulation::new(&MockSuite, config);

    for (side, deliver) in scenario.warmup.iter().take(16) {
        sim.send(*side).unwrap_or_else(|err| panic!("honest send failed: {err}"));
        if *deliver {
            sim.deliver_all();
        }
    }
    sim.deliver_all();

    // Responder pins this message's verification key on delivery
    let pinning = sim.send(Side::Initiator).unwrap_or_else(|err| panic!("send failed: {err}"));
    sim.deliver_all();

    let target = sim.send(Side::Initiator).unwrap_or_else(|err| panic!("send failed: {err}"));
    let other = sim.send(Side::Initiator).unwrap_or_else(|err| panic!("send failed: {err}"));
    let ad = sim.ad().clone();

    let mut tampered = mutate(&target, &other, &scenario.tamper);
    if scenario.reforge {
        tampered = reforge(&tampered, pinning.verification_key(), &ad);
    }
    let unchanged = tampered.entry_encoding(&ad) == target.entry_encoding(&ad);

    let before = PartySnapshot::of(sim.party(Side::Responder));
    let result = sim.party_mut(Side::Responder).try_receive(&ad, &tampered);

    if unchanged {
        // INVARIANT 1: An identical message is just the genuine one
        assert!(result.is_ok(), "genuine message rejected: {result:?}");
        return;
    }

    match result {
        Err(_) => {
            // INVARIANT 2: Rejection has no side effects
            assert_eq!(PartySnapshot::of(sim.party(Side::Responder)), before);

            // INVARIANT 3: Genuine traffic still flows
            assert_eq!(sim.deliver_all(), 2);
            registry.assert_all(&sim.snapshot(), "after tampering");
        },
        Ok(_) => {
            // INVARIANT 4: Only a forged signature gets a mutation accepted
            assert!(scenario.reforge, "mutation accepted under original signature: {scenario:?}");
        },
    }
});
