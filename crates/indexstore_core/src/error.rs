//! Error types for the access layer.

use indexstore_abi::AbiVersion;
use std::io;
use thiserror::Error;

/// Result type for access layer operations.
pub type IndexStoreResult<T> = Result<T, IndexStoreError>;

/// Failure to load the library or resolve its function table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The platform loader could not open the library.
    #[error("failed to open {path}: {message}")]
    OpenFailed {
        /// Path handed to the loader.
        path: String,
        /// Loader diagnostic.
        message: String,
    },

    /// A required operation is not exported by the library.
    #[error("missing required symbol: {0}")]
    MissingSymbol(String),

    /// No library path was configured and none could be discovered.
    #[error("index store library not found: {0}")]
    LibraryNotFound(String),
}

/// The loaded library does not satisfy the required versions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// Reported version fails the major/minor compatibility rule.
    #[error("incompatible {kind} version: required {required}, library reports {reported}")]
    Incompatible {
        /// Which version was checked.
        kind: &'static str,
        /// Version this layer requires.
        required: AbiVersion,
        /// Version the library reported.
        reported: AbiVersion,
    },

    /// Reported on-disk format version differs from the configured one.
    #[error("format version mismatch: required {required}, library reports {reported}")]
    FormatMismatch {
        /// Configured format version.
        required: u32,
        /// Format version the library reported.
        reported: u32,
    },
}

/// An error object produced by the store, copied out and already disposed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {description}")]
pub struct StoreError {
    /// Operation that produced the error.
    pub operation: &'static str,
    /// Description reported by the store.
    pub description: String,
}

/// Errors surfaced by the access layer.
#[derive(Debug, Error)]
pub enum IndexStoreError {
    /// Library could not be loaded.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// Library version is not usable.
    #[error("version error: {0}")]
    Version(#[from] VersionError),

    /// The store reported an error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The library behaved inconsistently with its documented contract.
    #[error("protocol violation in {operation}: {message}")]
    ProtocolViolation {
        /// Operation that misbehaved.
        operation: &'static str,
        /// What was observed.
        message: String,
    },

    /// An apply operation returned failure without a stop being requested.
    #[error("traversal failed in {operation}")]
    TraversalFailed {
        /// The apply operation.
        operation: &'static str,
    },

    /// An argument cannot be passed across the boundary.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl IndexStoreError {
    /// Creates a protocol violation error.
    pub fn protocol_violation(operation: &'static str, message: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            operation,
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Returns the store error, if this is one.
    #[must_use]
    pub fn as_store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}
