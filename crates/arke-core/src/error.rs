//! Error types for the ratcheted key exchange.
//!
//! Two layers: [`PrimitiveError`] for failures reported by a cryptographic
//! backend, and [`ProtocolError`] for the orchestration layer. A rejected
//! ciphertext is always a [`ProtocolError`]; [`crate::Party::receive`]
//! collapses every variant into `None` so the reason never reaches the peer.

use thiserror::Error;

/// Failures reported by a cryptographic primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// Ciphertext does not decapsulate under the given secret key
    #[error("decapsulation failed")]
    DecapsulationFailed,

    /// Signature manager has no one-time signing key left
    #[error("no signing key available")]
    NoSigningKey,

    /// Key material is malformed or degenerate
    #[error("invalid key: {0}")]
    InvalidKey(&'static str),
}

/// Errors from [`crate::Party`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Ciphertext signature does not verify under the pinned verification key
    #[error("signature verification failed")]
    SignatureInvalid,

    /// Ciphertext is inconsistent with local state (replayed, reordered past
    /// what the queues allow, or forged counters)
    #[error("desynchronized: {reason}")]
    Desynchronized {
        /// Which check failed
        reason: &'static str,
    },

    /// No partner KEM public key to encapsulate under
    #[error("no encapsulation target")]
    NoEncapsulationTarget,

    /// Backend failure outside of ciphertext validation
    #[error("primitive failure: {0}")]
    Primitive(#[from] PrimitiveError),
}

impl ProtocolError {
    /// Shorthand for [`ProtocolError::Desynchronized`].
    pub fn desync(reason: &'static str) -> Self {
        Self::Desynchronized { reason }
    }

    /// Returns true if this error rejects a received ciphertext.
    ///
    /// Rejections are caused by the peer or the network and leave local state
    /// untouched. Anything else points at local misuse of the party or a
    /// broken backend.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::SignatureInvalid | Self::Desynchronized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ciphertext_failures_are_rejections() {
        assert!(ProtocolError::SignatureInvalid.is_rejection());
        assert!(ProtocolError::desync("counter underflow").is_rejection());
    }

    #[test]
    fn local_failures_are_not_rejections() {
        assert!(!ProtocolError::NoEncapsulationTarget.is_rejection());
        assert!(!ProtocolError::from(PrimitiveError::NoSigningKey).is_rejection());
    }

    #[test]
    fn desync_reason_is_displayed() {
        let err = ProtocolError::desync("deferred transcript underflow");
        assert_eq!(err.to_string(), "desynchronized: deferred transcript underflow");
    }
}
