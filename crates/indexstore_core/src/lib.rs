//! # Index Store Core
//!
//! Runtime-loaded access layer for the index store library (`libIndexStore`).
//!
//! The library is opened with the platform loader, every operation of the
//! catalog in `indexstore_abi` is resolved by name, and the reported API
//! version is negotiated before anything else can be called. On top of the
//! resolved table this crate provides:
//!
//! - [`IndexStoreLibrary`]: the loaded, version-checked session object
//! - [`Store`], [`RecordReader`] and [`UnitReader`]: owning handles that are
//!   disposed exactly once
//! - Ephemeral views ([`Symbol`], [`Occurrence`], [`UnitDependency`], ...)
//!   handed to closures and never allowed to escape them
//! - One traversal protocol over both calling conventions of the library,
//!   with early stop and a three-valued outcome
//! - Unit event listening, directly or through a [`UnitEventFeed`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use indexstore_core::{IndexStoreLibrary, LibraryConfig, Store};
//!
//! let library = IndexStoreLibrary::load_with(&LibraryConfig::new())?;
//! let store = Store::open(&library, "/tmp/index/v5")?;
//! store.units_apply(true, |name| {
//!     println!("{name}");
//!     true
//! })?;
//! # Ok::<(), indexstore_core::IndexStoreError>(())
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod error_slot;
mod events;
mod library;
mod occurrence;
mod options;
mod record;
mod store;
mod string;
mod symbol;
mod traversal;
mod types;
mod unit;
mod version;

pub use config::{LibraryConfig, LIBRARY_PATH_ENV};
pub use error::{IndexStoreError, IndexStoreResult, LoadError, StoreError, VersionError};
pub use events::{UnitEvent, UnitEventBatch, UnitEventFeed, UnitEventNotification, UnitEventRecord};
pub use library::{DynamicLibrary, IndexStoreLibrary, SymbolSource};
pub use occurrence::{Occurrence, OccurrenceInfo, RelationInfo, SymbolRelation};
pub use options::CreationOptions;
pub use record::RecordReader;
pub use store::Store;
pub use symbol::{Symbol, SymbolInfo};
pub use traversal::{ApplyOutcome, CallingConvention, SearchVerdict};
pub use types::Timestamp;
pub use unit::{DependencyInfo, IncludeInfo, UnitDependency, UnitInclude, UnitInfo, UnitReader};
pub use version::{check_format, negotiate};

pub use indexstore_abi::{
    AbiVersion, DependencyKind, ListenOptions, SymbolKind, SymbolLanguage, SymbolProperties,
    SymbolRoles, SymbolSubKind, UnitEventKind, REQUIRED_VERSION,
};
