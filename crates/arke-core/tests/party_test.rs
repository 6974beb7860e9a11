//! Tests for the party state machine.
//!
//! These tests verify critical invariants:
//! - `used_keys` in a ciphertext equals the sender's `pending_key_count()`
//! - Counters follow the send/receive rules
//! - A receive consumes exactly `used_keys - 1` kuKEM secret keys

use arke_core::{AssociatedData, Party, ProtocolError, Role};
use arke_harness::MockSuite;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

struct Pair {
    alice: Party<MockSuite>,
    bob: Party<MockSuite>,
    rng: ChaCha20Rng,
    ad: AssociatedData,
}

fn pair(seed: u64) -> Pair {
    let bootstrap = ChaCha20Rng::seed_from_u64(seed);
    Pair {
        alice: Party::new(&MockSuite, &mut bootstrap.clone(), Role::Initiator),
        bob: Party::new(&MockSuite, &mut bootstrap.clone(), Role::Responder),
        rng: ChaCha20Rng::seed_from_u64(seed + 1),
        ad: AssociatedData::new(b"party test".to_vec()),
    }
}

/// INVARIANT: A fresh party encapsulates to its bootstrap KEM key only.
#[test]
fn fresh_party_state() {
    let Pair { alice, bob, .. } = pair(1);

    for party in [&alice, &bob] {
        assert_eq!(party.sent_count(), 0);
        assert_eq!(party.received_count(), 0);
        assert_eq!(party.pending_key_count(), 1);
        assert_eq!(party.queued_kukem().secret_key_count(), 0);
    }
    assert_eq!(alice.role(), Role::Initiator);
    assert_eq!(bob.role(), Role::Responder);
}

/// INVARIANT: The ciphertext records how many public keys were pending.
#[test]
fn used_keys_matches_pending_key_count() {
    let mut p = pair(2);

    for _ in 0..3 {
        let (_, ciphertext) = p.alice.send(&mut p.rng, &p.ad).unwrap();
        p.bob.receive(&p.ad, &ciphertext).unwrap();
    }

    assert_eq!(p.bob.pending_key_count(), 4);
    let (_, reply) = p.bob.send(&mut p.rng, &p.ad).unwrap();
    assert_eq!(reply.used_keys(), 4);
    assert_eq!(reply.received_count(), 3);
    assert_eq!(reply.body().kukem().len(), 3);
    assert_eq!(p.bob.pending_key_count(), 1);
}

/// INVARIANT: Send bumps `sent` and resets `received`; receive bumps
/// `received` and retires acknowledged sends.
#[test]
fn counters_follow_traffic() {
    let mut p = pair(3);

    let (_, a1) = p.alice.send(&mut p.rng, &p.ad).unwrap();
    let (_, a2) = p.alice.send(&mut p.rng, &p.ad).unwrap();
    assert_eq!(p.alice.sent_count(), 2);

    p.bob.receive(&p.ad, &a1).unwrap();
    p.bob.receive(&p.ad, &a2).unwrap();
    assert_eq!(p.bob.received_count(), 2);

    let (_, b1) = p.bob.send(&mut p.rng, &p.ad).unwrap();
    assert_eq!(p.bob.received_count(), 0);
    assert_eq!(p.bob.sent_count(), 1);

    p.alice.receive(&p.ad, &b1).unwrap();
    assert_eq!(p.alice.sent_count(), 0, "bob acknowledged both messages");
    assert_eq!(p.alice.received_count(), 1);
}

/// INVARIANT: A receive consumes exactly `used_keys - 1` kuKEM secret keys.
#[test]
fn receive_discards_used_secret_keys() {
    let mut p = pair(4);

    let (_, a1) = p.alice.send(&mut p.rng, &p.ad).unwrap();
    let (_, a2) = p.alice.send(&mut p.rng, &p.ad).unwrap();
    p.bob.receive(&p.ad, &a1).unwrap();

    // a2 is still in flight when bob replies, so alice keeps its key
    let (_, b1) = p.bob.send(&mut p.rng, &p.ad).unwrap();
    assert_eq!(b1.used_keys(), 2);
    assert_eq!(p.alice.queued_kukem().secret_key_count(), 2);

    p.alice.receive(&p.ad, &b1).unwrap();
    assert_eq!(p.alice.queued_kukem().secret_key_count(), 1);

    p.bob.receive(&p.ad, &a2).unwrap();
}

/// INVARIANT: Both parties derive the same key for every message.
#[test]
fn session_keys_agree() {
    let mut p = pair(5);

    let (sent, ciphertext) = p.alice.send(&mut p.rng, &p.ad).unwrap();
    assert_eq!(p.bob.receive(&p.ad, &ciphertext), Some(sent));

    let (sent, ciphertext) = p.bob.send(&mut p.rng, &p.ad).unwrap();
    assert_eq!(p.alice.receive(&p.ad, &ciphertext), Some(sent));
}

/// INVARIANT: A ciphertext is bound to its associated data.
#[test]
fn wrong_associated_data_is_rejected() {
    let mut p = pair(6);

    let (sent, ciphertext) = p.alice.send(&mut p.rng, &p.ad).unwrap();
    let other = AssociatedData::new(b"other channel".to_vec());

    assert_eq!(p.bob.try_receive(&other, &ciphertext), Err(ProtocolError::SignatureInvalid));
    assert_eq!(p.bob.received_count(), 0);
    assert_eq!(p.bob.receive(&p.ad, &ciphertext), Some(sent));
}

/// INVARIANT: A receiver never accepts its own messages.
#[test]
fn own_ciphertext_is_rejected() {
    let mut p = pair(7);

    let (_, ciphertext) = p.alice.send(&mut p.rng, &p.ad).unwrap();

    assert!(p.alice.receive(&p.ad, &ciphertext).is_none());
    assert_eq!(p.alice.sent_count(), 1);
}
