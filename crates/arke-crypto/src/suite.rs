//! Production cipher suite.

use arke_core::{Algorithms, CipherSuite};
use sha2::Sha256;

use crate::{
    deriver::Sha256Deriver,
    error::ConfigError,
    kem::X25519Kem,
    kukem::X25519KuKem,
    oracle::{HkdfOracle, OracleConfig},
    signature::Ed25519OneTimeSigner,
};

/// X25519 KEM and kuKEM, one-time Ed25519 signatures, HKDF-SHA256 oracle and
/// SHA-256 transcripts.
#[derive(Debug, Clone, Default)]
pub struct StandardSuite {
    oracle: OracleConfig,
}

impl StandardSuite {
    /// Suite with custom oracle parameters.
    pub fn new(oracle: OracleConfig) -> Result<Self, ConfigError> {
        oracle.validate()?;
        Ok(Self { oracle })
    }

    /// Oracle parameters every party of this suite uses.
    pub fn oracle_config(&self) -> &OracleConfig {
        &self.oracle
    }
}

impl CipherSuite for StandardSuite {
    type Kem = X25519Kem;
    type KuKem = X25519KuKem;
    type Signature = Ed25519OneTimeSigner;
    type Oracle = HkdfOracle;
    type Deriver = Sha256Deriver;
    type TranscriptHash = Sha256;

    fn instantiate(&self) -> Algorithms<Self> {
        Algorithms {
            kem: X25519Kem,
            kukem: X25519KuKem,
            signature: Ed25519OneTimeSigner::default(),
            oracle: HkdfOracle::with_validated(self.oracle.clone()),
            deriver: Sha256Deriver,
        }
    }
}
