//! Errors raised while normalising provider configuration.

use thiserror::Error;

/// Errors from configuration normalization and settings extraction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A mapping key somewhere in the tree is not a string.
    ///
    /// Fatal to the whole normalization call; no partial tree is produced.
    #[error("configuration key is not a string (found {found})")]
    KeyType {
        /// Runtime type of the offending key.
        found: &'static str,
    },

    /// A settings key is present but holds a value of the wrong shape.
    #[error("configuration key '{key}' has the wrong type (expected {expected})")]
    ValueType {
        /// The key that was looked up.
        key: String,
        /// Shape the caller expected.
        expected: &'static str,
    },
}
