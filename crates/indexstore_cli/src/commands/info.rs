//! Info command implementation.

use super::{emit, OutputFormat};
use indexstore_core::{IndexStoreLibrary, REQUIRED_VERSION};
use serde::Serialize;

/// Library information.
#[derive(Debug, Serialize)]
pub struct LibraryInfo {
    /// Path the library was loaded from.
    pub path: String,
    /// API version the library reports.
    pub version: String,
    /// API version this tool requires.
    pub required_version: String,
    /// On-disk format version.
    pub format_version: u32,
    /// Whether closure-form operations are exported.
    pub closure_support: bool,
    /// Calling convention in use.
    pub convention: String,
}

/// Describes a loaded library.
pub fn collect(library: &IndexStoreLibrary) -> LibraryInfo {
    LibraryInfo {
        path: library.path().display().to_string(),
        version: library.version().to_string(),
        required_version: REQUIRED_VERSION.to_string(),
        format_version: library.format_version(),
        closure_support: library.has_closure_support(),
        convention: library.convention().to_string(),
    }
}

/// Runs the info command.
pub fn run(
    library: &IndexStoreLibrary,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    emit(&collect(library), format, |info| {
        println!("Library:          {}", info.path);
        println!("API version:      {} (requires {})", info.version, info.required_version);
        println!("Format version:   {}", info.format_version);
        println!("Closure support:  {}", info.closure_support);
        println!("Convention:       {}", info.convention);
    })
}
