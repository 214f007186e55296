//! Store handles, unit readers and handle accounting.

use indexstore_core::{CreationOptions, DependencyKind, IndexStoreError, Store, Timestamp};
use indexstore_testkit::prelude::*;
use indexstore_testkit::sample::{
    MAIN_OUTPUT, MAIN_RECORD, ORPHAN_RECORD, SYSTEM_OUTPUT, UTIL_OUTPUT, UTIL_RECORD,
};

#[test]
fn open_missing_store_reports_and_disposes_the_error() {
    let library = FakeLibrary::new().load().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-store");

    let err = Store::open(&library, &missing).unwrap_err();
    let store_error = err.as_store_error().expect("store error");
    assert_eq!(store_error.operation, "store_create");
    assert!(store_error.description.contains("cannot open index store"));

    let counts = handle_counts(&missing);
    assert_eq!(counts.errors_created, 1);
    assert_eq!(counts.stores_created, 0);
    assert!(counts.balanced());
}

#[test]
fn every_handle_is_disposed_once() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    {
        let store = test_store.open(&library).unwrap();
        let unit = store.unit_name_from_output_path(MAIN_OUTPUT).unwrap();
        let unit_reader = store.unit_reader(&unit).unwrap();
        let record_reader = store.record_reader(MAIN_RECORD).unwrap();
        assert!(store.record_reader("nope").is_err());
        assert!(store.unit_reader("nope").is_err());
        record_reader.close();
        drop(unit_reader);

        let counts = handle_counts(test_store.path());
        assert_eq!(counts.stores_created, 1);
        assert_eq!(counts.stores_disposed, 0);
    }
    let counts = handle_counts(test_store.path());
    assert_eq!(counts.stores_disposed, 1);
    assert_eq!(counts.record_readers_created, 1);
    assert_eq!(counts.unit_readers_created, 1);
    assert_eq!(counts.errors_created, 2);
    assert!(counts.balanced(), "{counts:?}");
}

#[test]
fn reader_errors_carry_the_description() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();

    let err = store.record_reader("missing-record").unwrap_err();
    let store_error = err.as_store_error().unwrap();
    assert_eq!(store_error.operation, "record_reader_create");
    assert_eq!(store_error.description, "record not found: missing-record");

    let err = store.unit_reader("missing-unit").unwrap_err();
    assert_eq!(
        err.as_store_error().unwrap().description,
        "unit not found: missing-unit"
    );
}

#[test]
fn names_with_interior_nul_are_rejected() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();
    assert!(matches!(
        store.record_reader("bad\0name"),
        Err(IndexStoreError::InvalidArgument(_))
    ));
    assert!(matches!(
        store.discard_unit("bad\0name"),
        Err(IndexStoreError::InvalidArgument(_))
    ));
}

#[test]
fn unit_order_and_sorting() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();

    let stored: Vec<_> = test_store
        .fixture()
        .units
        .iter()
        .map(|unit| unit.name.clone())
        .collect();
    assert_eq!(store.unit_names(false).unwrap(), stored);

    let mut sorted = stored;
    sorted.sort();
    assert_eq!(store.unit_names(true).unwrap(), sorted);
}

#[test]
fn units_apply_stops_early() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().with_blocks(false).load().unwrap();
    let store = test_store.open(&library).unwrap();
    let mut seen = 0;
    let outcome = store
        .units_apply(true, |_| {
            seen += 1;
            false
        })
        .unwrap();
    assert!(outcome.is_stopped());
    assert_eq!(seen, 1);
}

#[test]
fn filtered_unit_names_skip_system_units() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();

    let user_units = store.unit_names_filtered(false).unwrap();
    assert_eq!(user_units.len(), 2);
    assert!(!user_units.contains(&unit_name_for_output(SYSTEM_OUTPUT)));
    assert_eq!(store.unit_names_filtered(true).unwrap().len(), 3);
}

#[test]
fn unit_name_round_trip() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();

    let name = store.unit_name_from_output_path(UTIL_OUTPUT).unwrap();
    assert_eq!(name, unit_name_for_output(UTIL_OUTPUT));
    let reader = store.unit_reader(&name).unwrap();
    assert_eq!(reader.output_file(), UTIL_OUTPUT);
}

#[test]
fn long_unit_names_are_not_truncated() {
    let output = format!("/build/{}.o", "x".repeat(400));
    let test_store = TestStore::new(StoreFixture::new().unit(UnitFixture::new(&output)));
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();

    let name = store.unit_name_from_output_path(&output).unwrap();
    assert_eq!(name, unit_name_for_output(&output));
    assert!(name.len() > 400);
}

#[test]
fn modification_times() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();
    let name = unit_name_for_output(MAIN_OUTPUT);

    let time = store.unit_modification_time(&name).unwrap();
    assert_eq!(time, Timestamp::new(1_700_000_200, 250));
    assert_eq!(store.unit_reader(&name).unwrap().modification_time(), time);

    let err = store.unit_modification_time("missing-unit").unwrap_err();
    assert_eq!(
        err.as_store_error().unwrap().operation,
        "store_get_unit_modification_time"
    );
    drop(store);
    assert!(handle_counts(test_store.path()).balanced());
}

#[test]
fn unit_info_snapshot() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();

    let main = store
        .unit_reader(&unit_name_for_output(MAIN_OUTPUT))
        .unwrap()
        .info()
        .unwrap();
    assert_eq!(main.provider_identifier, "clang");
    assert_eq!(main.main_file.as_deref(), Some("/src/main.c"));
    assert_eq!(main.sysroot_path, "/sdk");
    assert!(!main.is_system_unit);
    let kinds: Vec<_> = main.dependencies.iter().map(|dep| dep.kind).collect();
    assert_eq!(
        kinds,
        vec![
            Some(DependencyKind::Record),
            Some(DependencyKind::Unit),
            Some(DependencyKind::File),
        ]
    );
    assert_eq!(main.dependencies[0].name, MAIN_RECORD);

    let system = store
        .unit_reader(&unit_name_for_output(SYSTEM_OUTPUT))
        .unwrap()
        .info()
        .unwrap();
    assert!(system.is_system_unit);
    assert_eq!(system.main_file, None);
    assert_eq!(system.module_name, "libc");
}

#[test]
fn unknown_dependency_kind_is_kept_raw() {
    let mut dependency = DependencyFixture::file("/src/odd.h");
    dependency.kind = 42;
    let output = "/build/odd.o";
    let test_store =
        TestStore::new(StoreFixture::new().unit(UnitFixture::new(output).dependency(dependency)));
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();

    let reader = store.unit_reader(&unit_name_for_output(output)).unwrap();
    let dependencies = reader.dependencies().unwrap();
    assert_eq!(dependencies[0].kind, None);
    assert_eq!(dependencies[0].raw_kind, 42);
}

#[test]
fn discard_and_purge() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();

    store.purge_stale_data();
    assert!(store.record_reader(ORPHAN_RECORD).is_err());
    assert!(store.record_reader(UTIL_RECORD).is_ok());

    let util = unit_name_for_output(UTIL_OUTPUT);
    store.discard_unit(&util).unwrap();
    assert!(!store.unit_names(false).unwrap().contains(&util));
    assert!(test_store.current_fixture().find_unit(&util).is_none());

    store.purge_stale_data();
    assert!(store.record_reader(UTIL_RECORD).is_err());

    store.discard_record(MAIN_RECORD).unwrap();
    assert!(store.record_reader(MAIN_RECORD).is_err());
    assert!(test_store.current_fixture().records.is_empty());
}

#[test]
fn prefix_mappings_rewrite_unit_paths() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let mut options = CreationOptions::new(&library).unwrap();
    options.add_prefix_mapping("/src", "/home/dev/project").unwrap();
    assert_eq!(options.prefix_mappings().len(), 1);

    let store = Store::open_with_options(&library, test_store.path(), &options).unwrap();
    let reader = store.unit_reader(&unit_name_for_output(MAIN_OUTPUT)).unwrap();
    assert_eq!(reader.main_file(), "/home/dev/project/main.c");
    let includes = reader.includes().unwrap();
    assert_eq!(includes[0].target_path, "/home/dev/project/util.h");
    assert_eq!(includes[1].target_path, "/sdk/usr/include/stdio.h");
}

#[test]
fn options_from_another_library_are_rejected() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let other = FakeLibrary::new().load().unwrap();
    let options = CreationOptions::new(&other).unwrap();
    let err = Store::open_with_options(&library, test_store.path(), &options).unwrap_err();
    assert!(matches!(err, IndexStoreError::InvalidArgument(_)));
}

#[test]
fn readers_borrow_their_store() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();
    let reader = store.record_reader(MAIN_RECORD).unwrap();
    assert_eq!(reader.name(), MAIN_RECORD);
    assert_eq!(reader.store().path(), test_store.path());
}
