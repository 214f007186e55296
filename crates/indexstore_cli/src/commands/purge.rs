//! Purge command implementation.

use super::{emit, OutputFormat};
use super::print_record::referenced_records;
use indexstore_core::{IndexStoreResult, Store};
use serde::Serialize;

/// Purge summary.
#[derive(Debug, Serialize)]
pub struct PurgeResult {
    /// Store path.
    pub path: String,
    /// Units in the store.
    pub units: usize,
    /// Records referenced by units after the purge.
    pub referenced_records: usize,
}

/// Purges the store and summarises what remains referenced.
pub fn collect(store: &Store) -> IndexStoreResult<PurgeResult> {
    store.purge_stale_data();
    Ok(PurgeResult {
        path: store.path().display().to_string(),
        units: store.unit_names(false)?.len(),
        referenced_records: referenced_records(store)?.len(),
    })
}

/// Runs the purge command.
pub fn run(store: &Store, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let result = collect(store)?;
    emit(&result, format, |result| {
        println!("Purged stale data in {}", result.path);
        println!(
            "{} unit(s), {} referenced record(s)",
            result.units, result.referenced_records
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexstore_testkit::{sample, FakeLibrary, TestStore};

    #[test]
    fn removes_unreferenced_records() {
        let test_store = TestStore::sample();
        let library = FakeLibrary::new().load().unwrap();
        let store = test_store.open(&library).unwrap();

        let result = collect(&store).unwrap();
        assert_eq!(result.units, 3);
        assert_eq!(result.referenced_records, 2);
        assert!(test_store
            .current_fixture()
            .find_record(sample::ORPHAN_RECORD)
            .is_none());
    }
}
