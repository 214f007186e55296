//! # IndexStore Testkit
//!
//! Test utilities for the index store access layer.
//!
//! This crate provides:
//! - An in-process fake of the index store library, with or without
//!   closure support
//! - Store fixtures written to temporary directories
//! - Handle accounting, to check that every handle is disposed exactly once
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use indexstore_testkit::prelude::*;
//!
//! #[test]
//! fn lists_units() {
//!     let library = FakeLibrary::new().load().unwrap();
//!     let store = TestStore::sample();
//!     let names = store.open(&library).unwrap().unit_names(true).unwrap();
//!     assert_eq!(names.len(), 3);
//! }
//! ```

#![warn(missing_docs)]

mod exports;
pub mod fake;
pub mod fixtures;
pub mod generators;
mod handles;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fake::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fake::{handle_counts, FakeLibrary, HandleCounts, FAKE_FORMAT_VERSION};
pub use fixtures::{
    sample, sample_fixture, unit_name_for_output, DependencyFixture, IncludeFixture, ListenFault,
    OccurrenceFixture, RecordFixture, RelationFixture, StoreFixture, SymbolFixture, TestStore,
    UnitFixture, FIXTURE_FILE,
};
pub use generators::*;
