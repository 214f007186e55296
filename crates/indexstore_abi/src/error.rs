//! Error types for decoding wire values.

use thiserror::Error;

/// Result type for ABI decoding.
pub type AbiResult<T> = Result<T, AbiError>;

/// Errors produced when a value read from the library does not match the
/// enumerations known to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    /// A single-enumerator value is outside the known set.
    #[error("unknown {kind} value: {value}")]
    UnknownValue {
        /// Name of the enumeration.
        kind: &'static str,
        /// The raw value received.
        value: u64,
    },
}

impl AbiError {
    /// Creates an unknown value error.
    pub fn unknown(kind: &'static str, value: impl Into<u64>) -> Self {
        Self::UnknownValue {
            kind,
            value: value.into(),
        }
    }
}
