//! # Index Store ABI
//!
//! Compile-time description of the index store C API as it is resolved at
//! runtime by `indexstore_core`.
//!
//! This crate provides:
//! - The API version the access layer is written against ([`REQUIRED_VERSION`])
//! - `#[repr(C)]` boundary types ([`StringRef`], [`ListenOptions`], block layout)
//! - Function pointer types for both calling conventions
//! - The ordered operation catalog ([`OPERATIONS`])
//! - Wire-value enumerations and flag sets (symbol kinds, roles, languages, ...)
//!
//! Nothing here touches a loaded library. All items are plain data.
//!
//! ## Example
//!
//! ```rust
//! use indexstore_abi::{AbiVersion, SymbolRoles, REQUIRED_VERSION};
//!
//! assert!(REQUIRED_VERSION.is_compatible_with(AbiVersion::new(0, 16)));
//! let roles = SymbolRoles::DEFINITION | SymbolRoles::REL_CHILDOF;
//! assert!(roles.contains(SymbolRoles::DEFINITION));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod error;
pub mod functions;
mod roles;
mod symbol;
mod types;
mod unit;
mod version;

pub use catalog::{
    operation, optional_operations, required_operations, HandleKind, OperationDescriptor, Shape,
    OPERATIONS,
};
pub use error::{AbiError, AbiResult};
pub use roles::SymbolRoles;
pub use symbol::{SymbolKind, SymbolLanguage, SymbolProperties, SymbolSubKind};
pub use types::{
    BlockDescriptor, BlockLiteralHeader, ListenOptions, RawCreationOptions, RawError,
    RawOccurrence, RawRecordReader, RawStore, RawSymbol, RawSymbolRelation, RawUnitDependency,
    RawUnitEvent, RawUnitEventNotification, RawUnitInclude, RawUnitReader, StringRef,
    STACK_BLOCK_ISA_SYMBOL,
};
pub use unit::{DependencyKind, UnitEventKind};
pub use version::{AbiVersion, REQUIRED_VERSION};

/// Prefix shared by every exported symbol of the library.
pub const SYMBOL_PREFIX: &str = "indexstore_";
