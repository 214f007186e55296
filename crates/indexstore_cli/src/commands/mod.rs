//! CLI command implementations.

pub mod info;
pub mod print_record;
pub mod print_unit;
pub mod purge;
pub mod unit_name;
pub mod units;

use clap::ValueEnum;
use indexstore_core::{IndexStoreLibrary, IndexStoreResult, LibraryConfig, Store};
use serde::Serialize;
use std::path::Path;

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Loads the library at `path`, or discovers one.
pub fn load_library(path: Option<&Path>) -> IndexStoreResult<IndexStoreLibrary> {
    let mut config = LibraryConfig::new();
    if let Some(path) = path {
        config = config.library_path(path);
    }
    IndexStoreLibrary::load_with(&config)
}

/// Opens the store at `path`.
pub fn open_store(library: &IndexStoreLibrary, path: &Path) -> IndexStoreResult<Store> {
    Store::open(library, path)
}

/// Prints `value` as JSON, or through `text` otherwise.
fn emit<T: Serialize>(
    value: &T,
    format: OutputFormat,
    text: impl FnOnce(&T),
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}
