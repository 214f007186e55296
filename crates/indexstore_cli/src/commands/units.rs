//! Units command implementation.

use super::{emit, OutputFormat};
use indexstore_core::{IndexStoreResult, Store};

/// Lists unit names.
///
/// System units are dropped unless `include_system`; the remaining names are
/// kept in store order unless `sorted`.
pub fn collect(store: &Store, sorted: bool, include_system: bool) -> IndexStoreResult<Vec<String>> {
    if include_system {
        return store.unit_names(sorted);
    }
    let mut names = store.unit_names_filtered(false)?;
    if sorted {
        names.sort();
    }
    Ok(names)
}

/// Runs the units command.
pub fn run(
    store: &Store,
    sorted: bool,
    include_system: bool,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let names = collect(store, sorted, include_system)?;
    emit(&names, format, |names| {
        for name in names {
            println!("{name}");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexstore_testkit::{sample, unit_name_for_output, FakeLibrary, TestStore};

    #[test]
    fn sorted_without_system_units() {
        let test_store = TestStore::sample();
        let library = FakeLibrary::new().load().unwrap();
        let store = test_store.open(&library).unwrap();

        let mut expected = vec![
            unit_name_for_output(sample::MAIN_OUTPUT),
            unit_name_for_output(sample::UTIL_OUTPUT),
        ];
        expected.sort();
        assert_eq!(collect(&store, true, false).unwrap(), expected);
        assert_eq!(collect(&store, false, true).unwrap().len(), 3);
    }
}
