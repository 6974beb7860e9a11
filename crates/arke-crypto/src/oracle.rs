//! HKDF-SHA256 keyed random oracle.
//!
//! Each direction has its own chaining key. A query consumes the chaining
//! key and replaces it:
//!
//! ```text
//! ikm = key ‖ len(state) ‖ state ‖ chaining_key
//! session_key ‖ seed ‖ chaining_key' = HKDF-SHA256(salt = context, ikm)
//! ```
//!
//! Bootstrap derives two chains from one shared seed and assigns them by
//! role, so the initiator's send chain is the responder's receive chain and
//! vice versa.

use std::fmt;

use arke_core::{
    KEY_SEED_SIZE, KeySeed, KeyedRandomOracle, OracleOutput, Role, SYMMETRIC_KEY_SIZE,
    SymmetricKey, primitives::encode_field,
};
use hkdf::Hkdf;
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::ConfigError;

/// Smallest accepted chaining key
pub const MIN_CHAINING_KEY_LEN: usize = 16;

/// Largest accepted chaining key
pub const MAX_CHAINING_KEY_LEN: usize = 64;

const BOOTSTRAP_FIRST: &[u8] = b"arke oracle bootstrap first";
const BOOTSTRAP_SECOND: &[u8] = b"arke oracle bootstrap second";
const QUERY_INFO: &[u8] = b"arke oracle query";

/// Oracle parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConfig {
    /// Internal chaining key size in bytes
    pub chaining_key_len: usize,
    /// Domain separation bound into every query
    pub context: Vec<u8>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self { chaining_key_len: 32, context: b"arke oracle v1".to_vec() }
    }
}

impl OracleConfig {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_CHAINING_KEY_LEN..=MAX_CHAINING_KEY_LEN).contains(&self.chaining_key_len) {
            return Err(ConfigError::ChainingKeyLength {
                len: self.chaining_key_len,
                min: MIN_CHAINING_KEY_LEN,
                max: MAX_CHAINING_KEY_LEN,
            });
        }
        if self.context.is_empty() {
            return Err(ConfigError::EmptyContext);
        }
        Ok(())
    }
}

/// HKDF-SHA256 oracle with separate send and receive chains.
pub struct HkdfOracle {
    config: OracleConfig,
    send_chain: Zeroizing<Vec<u8>>,
    receive_chain: Zeroizing<Vec<u8>>,
}

impl HkdfOracle {
    /// Oracle with validated parameters. Chains are empty until
    /// [`KeyedRandomOracle::init`].
    pub fn new(config: OracleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_validated(config))
    }

    pub(crate) fn with_validated(config: OracleConfig) -> Self {
        Self { config, send_chain: Zeroizing::default(), receive_chain: Zeroizing::default() }
    }

    fn expand(&self, ikm: &[u8], info: &[u8], len: usize) -> Zeroizing<Vec<u8>> {
        let hkdf = Hkdf::<Sha256>::new(Some(self.config.context.as_slice()), ikm);
        let mut okm = Zeroizing::new(vec![0u8; len]);
        let Ok(()) = hkdf.expand(info, &mut okm[..]) else {
            unreachable!("oracle output is far below the HKDF-SHA256 limit");
        };
        okm
    }

    /// Output for one query plus the replacement chaining key.
    fn query(
        &self,
        chain: &[u8],
        key: &SymmetricKey,
        state: &[u8],
    ) -> (OracleOutput, Zeroizing<Vec<u8>>) {
        let capacity = SYMMETRIC_KEY_SIZE + 4 + state.len() + chain.len();
        let mut ikm = Zeroizing::new(Vec::with_capacity(capacity));
        ikm.extend_from_slice(key.as_bytes());
        encode_field(&mut ikm, state);
        ikm.extend_from_slice(chain);

        let okm = self.expand(
            &ikm,
            QUERY_INFO,
            SYMMETRIC_KEY_SIZE + KEY_SEED_SIZE + self.config.chaining_key_len,
        );

        let mut session_key = [0u8; SYMMETRIC_KEY_SIZE];
        session_key.copy_from_slice(&okm[..SYMMETRIC_KEY_SIZE]);
        let mut seed = [0u8; KEY_SEED_SIZE];
        seed.copy_from_slice(&okm[SYMMETRIC_KEY_SIZE..SYMMETRIC_KEY_SIZE + KEY_SEED_SIZE]);
        let next = Zeroizing::new(okm[SYMMETRIC_KEY_SIZE + KEY_SEED_SIZE..].to_vec());

        let session_key = SymmetricKey::new(session_key);
        (OracleOutput { session_key, seed: KeySeed::new(seed) }, next)
    }
}

impl fmt::Debug for HkdfOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HkdfOracle")
            .field("config", &self.config)
            .field("send_chain", &"[REDACTED]")
            .field("receive_chain", &"[REDACTED]")
            .finish()
    }
}

impl KeyedRandomOracle for HkdfOracle {
    fn init<R: RngCore + CryptoRng>(&mut self, rng: &mut R, role: Role) {
        let mut seed = Zeroizing::new([0u8; 32]);
        rng.fill_bytes(&mut seed[..]);

        let len = self.config.chaining_key_len;
        let first = self.expand(&seed[..], BOOTSTRAP_FIRST, len);
        let second = self.expand(&seed[..], BOOTSTRAP_SECOND, len);

        if role.is_initiator() {
            self.receive_chain = first;
            self.send_chain = second;
        } else {
            self.send_chain = first;
            self.receive_chain = second;
        }
    }

    fn query_send(&mut self, key: &SymmetricKey, transcript_state: &[u8]) -> OracleOutput {
        let (output, next) = self.query(&self.send_chain, key, transcript_state);
        self.send_chain = next;
        output
    }

    fn query_receive(&mut self, key: &SymmetricKey, transcript_state: &[u8]) -> OracleOutput {
        let (output, next) = self.query(&self.receive_chain, key, transcript_state);
        self.receive_chain = next;
        output
    }
}
