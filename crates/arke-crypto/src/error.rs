//! Configuration errors for the concrete suite.

use thiserror::Error;

/// Invalid [`crate::OracleConfig`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Chaining key length outside the accepted range
    #[error("chaining key length {len} outside {min}..={max} bytes")]
    ChainingKeyLength {
        /// Requested length
        len: usize,
        /// Smallest accepted length
        min: usize,
        /// Largest accepted length
        max: usize,
    },

    /// Empty domain-separation context
    #[error("oracle context must not be empty")]
    EmptyContext,
}
