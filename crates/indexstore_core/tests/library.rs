//! Loading, resolution and version negotiation against the fake library.

use indexstore_core::{
    AbiVersion, CallingConvention, IndexStoreError, IndexStoreLibrary, LibraryConfig, LoadError,
    VersionError, REQUIRED_VERSION,
};
use indexstore_testkit::{FakeLibrary, TestStore, FAKE_FORMAT_VERSION};

#[test]
fn loads_with_closure_support() {
    let library = FakeLibrary::new().load().unwrap();
    assert_eq!(library.version(), REQUIRED_VERSION);
    assert_eq!(library.format_version(), FAKE_FORMAT_VERSION);
    assert!(library.has_closure_support());
    assert_eq!(library.convention(), CallingConvention::Closure);
}

#[test]
fn falls_back_to_context_pointers_without_blocks() {
    let library = FakeLibrary::new().with_blocks(false).load().unwrap();
    assert!(!library.has_closure_support());
    assert_eq!(library.convention(), CallingConvention::ContextPointer);
}

#[test]
fn prefer_closures_off_uses_context_pointers() {
    let config = LibraryConfig::new().prefer_closures(false);
    let library = FakeLibrary::new().load_with(&config).unwrap();
    assert!(library.has_closure_support());
    assert_eq!(library.convention(), CallingConvention::ContextPointer);
}

#[test]
fn missing_closure_form_disables_the_whole_set() {
    let library = FakeLibrary::new()
        .without("indexstore_record_reader_search_symbols")
        .load()
        .unwrap();
    assert!(!library.has_closure_support());
    assert_eq!(library.convention(), CallingConvention::ContextPointer);

    let store = TestStore::sample();
    let names = store.open(&library).unwrap().unit_names(true).unwrap();
    assert_eq!(names.len(), 3);
}

#[test]
fn missing_required_symbol_fails() {
    let err = FakeLibrary::new()
        .without("indexstore_unit_reader_get_target")
        .load()
        .unwrap_err();
    match err {
        IndexStoreError::Load(LoadError::MissingSymbol(symbol)) => {
            assert_eq!(symbol, "indexstore_unit_reader_get_target");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn older_minor_version_is_rejected() {
    let err = FakeLibrary::new()
        .with_version(AbiVersion::new(0, 14))
        .load()
        .unwrap_err();
    assert!(matches!(
        err,
        IndexStoreError::Version(VersionError::Incompatible { reported, .. })
            if reported == AbiVersion::new(0, 14)
    ));
}

#[test]
fn newer_minor_version_is_accepted() {
    let library = FakeLibrary::new()
        .with_version(AbiVersion::new(0, 16))
        .load()
        .unwrap();
    assert_eq!(library.version(), AbiVersion::new(0, 16));
}

#[test]
fn different_major_version_is_rejected() {
    let err = FakeLibrary::new()
        .with_version(AbiVersion::new(1, 15))
        .load()
        .unwrap_err();
    assert!(matches!(err, IndexStoreError::Version(_)));
}

#[test]
fn format_version_is_checked_only_when_configured() {
    let fake = FakeLibrary::new().with_format_version(12);
    assert!(fake.load().is_ok());

    let err = fake
        .load_with(&LibraryConfig::new().required_format_version(FAKE_FORMAT_VERSION))
        .unwrap_err();
    assert!(matches!(
        err,
        IndexStoreError::Version(VersionError::FormatMismatch {
            required: FAKE_FORMAT_VERSION,
            reported: 12,
        })
    ));
}

#[test]
fn clones_share_one_library() {
    let library = FakeLibrary::new().load().unwrap();
    let clone = library.clone();
    assert!(library.same_library(&clone));

    let other = FakeLibrary::new().load().unwrap();
    assert!(!library.same_library(&other));
}

#[test]
fn load_reports_unopenable_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = IndexStoreLibrary::load(dir.path().join("libIndexStore.so")).unwrap_err();
    assert!(matches!(
        err,
        IndexStoreError::Load(LoadError::OpenFailed { .. })
    ));
}
