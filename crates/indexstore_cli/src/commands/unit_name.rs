//! Unit-name command implementation.

use super::{emit, OutputFormat};
use indexstore_core::{IndexStoreResult, Store};
use serde::Serialize;
use std::path::Path;

/// Output file to unit name mapping.
#[derive(Debug, Serialize)]
pub struct UnitNameResult {
    /// Output file as given.
    pub output_path: String,
    /// Unit name the store uses for it.
    pub unit_name: String,
    /// Whether the store holds such a unit.
    pub present: bool,
}

/// Maps an output file to its unit name.
pub fn collect(store: &Store, output_path: &Path) -> IndexStoreResult<UnitNameResult> {
    let unit_name = store.unit_name_from_output_path(output_path)?;
    let present = store.unit_names(false)?.contains(&unit_name);
    Ok(UnitNameResult {
        output_path: output_path.display().to_string(),
        unit_name,
        present,
    })
}

/// Runs the unit-name command.
pub fn run(
    store: &Store,
    output_path: &Path,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = collect(store, output_path)?;
    emit(&result, format, |result| {
        let note = if result.present { "" } else { " (not in store)" };
        println!("{}{note}", result.unit_name);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexstore_testkit::{sample, unit_name_for_output, FakeLibrary, TestStore};

    #[test]
    fn maps_known_and_unknown_outputs() {
        let test_store = TestStore::sample();
        let library = FakeLibrary::new().load().unwrap();
        let store = test_store.open(&library).unwrap();

        let known = collect(&store, Path::new(sample::UTIL_OUTPUT)).unwrap();
        assert_eq!(known.unit_name, unit_name_for_output(sample::UTIL_OUTPUT));
        assert!(known.present);

        let unknown = collect(&store, Path::new("/build/other.o")).unwrap();
        assert_eq!(unknown.unit_name, unit_name_for_output("/build/other.o"));
        assert!(!unknown.present);
    }
}
