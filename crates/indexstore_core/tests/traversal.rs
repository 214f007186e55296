//! Traversals through both calling conventions.

use indexstore_core::{
    ApplyOutcome, CallingConvention, IndexStoreLibrary, SearchVerdict, SymbolKind, SymbolRoles,
};
use indexstore_testkit::prelude::*;
use indexstore_testkit::sample::{HELPER_SYMBOL, MAIN_RECORD, MAIN_SYMBOL, UTIL_OUTPUT};
use proptest::prelude::*;

/// One library per calling convention.
fn libraries() -> Vec<IndexStoreLibrary> {
    let closures = FakeLibrary::new().load().unwrap();
    let functions = FakeLibrary::new().with_blocks(false).load().unwrap();
    assert_eq!(closures.convention(), CallingConvention::Closure);
    assert_eq!(functions.convention(), CallingConvention::ContextPointer);
    vec![closures, functions]
}

#[test]
fn occurrences_arrive_in_source_order() {
    let test_store = TestStore::sample();
    for library in libraries() {
        let store = test_store.open(&library).unwrap();
        let reader = store.record_reader(MAIN_RECORD).unwrap();
        let mut lines = Vec::new();
        let outcome = reader
            .occurrences_apply(|occurrence| {
                lines.push(occurrence.line());
                true
            })
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Completed);
        assert_eq!(lines, vec![1, 3, 10, 12, 14, 15, 20], "{}", library.convention());
    }
}

#[test]
fn line_range_is_half_open() {
    let test_store = TestStore::sample();
    for library in libraries() {
        let store = test_store.open(&library).unwrap();
        let reader = store.record_reader(MAIN_RECORD).unwrap();
        let mut lines = Vec::new();
        reader
            .occurrences_in_line_range_apply(10, 5, |occurrence| {
                lines.push(occurrence.line());
                true
            })
            .unwrap();
        assert_eq!(lines, vec![10, 12, 14]);
    }
}

#[test]
fn empty_line_range_is_left_to_the_store() {
    let test_store = TestStore::sample();
    for library in libraries() {
        let store = test_store.open(&library).unwrap();
        let reader = store.record_reader(MAIN_RECORD).unwrap();
        let before = handle_counts(test_store.path()).line_range_queries;

        let mut called = false;
        let outcome = reader
            .occurrences_in_line_range_apply(10, 0, |_| {
                called = true;
                true
            })
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Completed);
        assert!(!called);
        assert_eq!(handle_counts(test_store.path()).line_range_queries, before + 1);
    }
}

#[test]
fn relations_of_a_call() {
    let test_store = TestStore::sample();
    for library in libraries() {
        let store = test_store.open(&library).unwrap();
        let reader = store.record_reader(MAIN_RECORD).unwrap();
        let occurrences = reader.occurrences().unwrap();
        let call = occurrences.iter().find(|occurrence| occurrence.line == 12).unwrap();
        assert_eq!(call.symbol.name, "helper");
        assert!(call.roles.contains(SymbolRoles::CALL));
        assert_eq!(call.relations.len(), 1);
        assert_eq!(call.relations[0].symbol.name, "main");
        assert_eq!(call.relations[0].roles, SymbolRoles::REL_CALLEDBY);
    }
}

#[test]
fn search_delivers_accepted_symbols_only() {
    let test_store = TestStore::sample();
    for library in libraries() {
        let store = test_store.open(&library).unwrap();
        let reader = store.record_reader(MAIN_RECORD).unwrap();
        let mut examined = Vec::new();
        let mut received = Vec::new();
        let outcome = reader
            .search_symbols(
                |symbol| {
                    examined.push(symbol.name());
                    SearchVerdict::accept_if(symbol.kind() == SymbolKind::Function)
                },
                |symbol| received.push(symbol.name()),
            )
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Completed);
        assert_eq!(examined, vec!["main", "helper", "counter"]);
        assert_eq!(received, vec!["main", "helper"]);
    }
}

#[test]
fn search_stops_when_asked() {
    let test_store = TestStore::sample();
    for library in libraries() {
        let store = test_store.open(&library).unwrap();
        let reader = store.record_reader(MAIN_RECORD).unwrap();
        let mut examined = 0;
        let mut received = Vec::new();
        let outcome = reader
            .search_symbols(
                |symbol| {
                    examined += 1;
                    if symbol.name() == "helper" {
                        SearchVerdict::accept_and_stop()
                    } else {
                        SearchVerdict::REJECT
                    }
                },
                |symbol| received.push(symbol.name()),
            )
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Stopped);
        assert_eq!(examined, 2);
        assert_eq!(received, vec!["helper"]);
    }
}

#[test]
fn occurrences_of_symbols_and_related_symbols() {
    let test_store = TestStore::sample();
    for library in libraries() {
        let store = test_store.open(&library).unwrap();
        let reader = store.record_reader(MAIN_RECORD).unwrap();
        let symbols = reader.cached_symbols().unwrap();
        let main = symbols[MAIN_SYMBOL];
        assert_eq!(main.name(), "main");

        let mut direct = Vec::new();
        reader
            .occurrences_of_symbols_apply(&[main], &[], |occurrence| {
                direct.push(occurrence.line());
                true
            })
            .unwrap();
        assert_eq!(direct, vec![10]);

        let mut related = Vec::new();
        reader
            .occurrences_of_symbols_apply(&[], &[main], |occurrence| {
                related.push(occurrence.line());
                true
            })
            .unwrap();
        assert_eq!(related, vec![12, 14]);

        let helper = symbols[HELPER_SYMBOL];
        let mut both = Vec::new();
        reader
            .occurrences_of_symbols_apply(&[helper], &[main], |occurrence| {
                both.push(occurrence.line());
                true
            })
            .unwrap();
        assert_eq!(both, vec![12]);
    }
}

#[test]
fn empty_symbol_filters_select_every_occurrence() {
    let test_store = TestStore::sample();
    for library in libraries() {
        let store = test_store.open(&library).unwrap();
        let reader = store.record_reader(MAIN_RECORD).unwrap();
        let mut all = 0;
        reader
            .occurrences_apply(|_| {
                all += 1;
                true
            })
            .unwrap();

        let mut filtered = 0;
        let outcome = reader
            .occurrences_of_symbols_apply(&[], &[], |_| {
                filtered += 1;
                true
            })
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Completed);
        assert_eq!(all, 7);
        assert_eq!(filtered, all);
    }
}

#[test]
fn cached_listing_is_repeatable() {
    let test_store = TestStore::sample();
    for library in libraries() {
        let store = test_store.open(&library).unwrap();
        let reader = store.record_reader(MAIN_RECORD).unwrap();
        let listing = || -> Vec<(String, String)> {
            reader
                .cached_symbols()
                .unwrap()
                .iter()
                .map(|symbol| (symbol.name(), symbol.usr()))
                .collect()
        };
        let first = listing();
        assert_eq!(first.len(), 3);
        assert_eq!(first, listing());
    }
}

#[test]
fn symbols_from_another_library_are_rejected() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let other = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();
    let other_store = test_store.open(&other).unwrap();
    let reader = store.record_reader(MAIN_RECORD).unwrap();
    let other_reader = other_store.record_reader(MAIN_RECORD).unwrap();
    let foreign = other_reader.cached_symbols().unwrap();

    let err = reader
        .occurrences_of_symbols_apply(&foreign, &[], |_| true)
        .unwrap_err();
    assert!(matches!(err, indexstore_core::IndexStoreError::InvalidArgument(_)));
}

#[test]
fn symbol_details() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();
    let reader = store.record_reader(MAIN_RECORD).unwrap();
    let symbols = reader.symbols().unwrap();
    let main = &symbols[MAIN_SYMBOL];
    assert_eq!(main.name, "main");
    assert_eq!(main.usr, "c:@F@main");
    assert_eq!(main.codegen_name, "_main");
    assert_eq!(main.kind, SymbolKind::Function);
    assert_eq!(main.roles, SymbolRoles::DEFINITION);
}

#[test]
fn unit_dependencies_and_includes() {
    let test_store = TestStore::sample();
    for library in libraries() {
        let store = test_store.open(&library).unwrap();
        let name = store.unit_name_from_output_path("/build/main.o").unwrap();
        let reader = store.unit_reader(&name).unwrap();
        let dependencies = reader.dependencies().unwrap();
        assert_eq!(dependencies.len(), 3);
        assert_eq!(dependencies[1].name, unit_name_for_output(UTIL_OUTPUT));
        assert!(dependencies[2].is_system);
        assert_eq!(dependencies[2].module_name, "Darwin");

        let includes = reader.includes().unwrap();
        let lines: Vec<_> = includes.iter().map(|include| include.source_line).collect();
        assert_eq!(lines, vec![2, 1]);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn applier_stop_ends_traversal(
        record in record_fixture_strategy("generated.c-000001".to_owned(), 4, 24),
        stop_at in 1usize..30,
    ) {
        let total = record.occurrences.len();
        let test_store = TestStore::new(StoreFixture::new().record(record));
        for library in libraries() {
            let store = test_store.open(&library).unwrap();
            let reader = store.record_reader("generated.c-000001").unwrap();
            let mut seen = 0usize;
            let outcome = reader
                .occurrences_apply(|_| {
                    seen += 1;
                    seen < stop_at
                })
                .unwrap();
            if stop_at <= total {
                prop_assert_eq!(outcome, ApplyOutcome::Stopped);
                prop_assert_eq!(seen, stop_at);
            } else {
                prop_assert_eq!(outcome, ApplyOutcome::Completed);
                prop_assert_eq!(seen, total);
            }
        }
    }

    #[test]
    fn symbol_listing_matches_fixture(
        record in record_fixture_strategy("generated.c-000002".to_owned(), 6, 4),
    ) {
        let expected: Vec<_> = record.symbols.iter().map(|symbol| symbol.name.clone()).collect();
        let test_store = TestStore::new(StoreFixture::new().record(record));
        for library in libraries() {
            let store = test_store.open(&library).unwrap();
            let reader = store.record_reader("generated.c-000002").unwrap();
            let names: Vec<_> = reader.symbols().unwrap().into_iter().map(|symbol| symbol.name).collect();
            let cached: Vec<_> = reader.cached_symbols().unwrap().iter().map(|symbol| symbol.name()).collect();
            let cached_again: Vec<_> = reader.cached_symbols().unwrap().iter().map(|symbol| symbol.name()).collect();
            prop_assert_eq!(&names, &expected);
            prop_assert_eq!(&cached, &expected);
            prop_assert_eq!(&cached_again, &cached);
        }
    }

    #[test]
    fn search_receives_accepted_symbols_up_to_the_stop(
        record in record_fixture_strategy("generated.c-000003".to_owned(), 8, 0),
        accepted in prop::collection::vec(any::<bool>(), 8),
        stop_at in prop::option::of(0usize..10),
    ) {
        let names: Vec<_> = record.symbols.iter().map(|symbol| symbol.name.clone()).collect();
        let stop = stop_at.filter(|&index| index < names.len());
        let examined = stop.map_or(names.len(), |index| index + 1);
        let expected: Vec<_> = names[..examined]
            .iter()
            .zip(&accepted)
            .filter(|(_, accept)| **accept)
            .map(|(name, _)| name.clone())
            .collect();
        let expected_outcome = if stop.is_some() {
            ApplyOutcome::Stopped
        } else {
            ApplyOutcome::Completed
        };

        let test_store = TestStore::new(StoreFixture::new().record(record));
        for library in libraries() {
            let store = test_store.open(&library).unwrap();
            let reader = store.record_reader("generated.c-000003").unwrap();
            let mut index = 0usize;
            let mut received = Vec::new();
            let outcome = reader
                .search_symbols(
                    |_| {
                        let verdict = SearchVerdict {
                            accept: accepted[index],
                            stop: stop == Some(index),
                        };
                        index += 1;
                        verdict
                    },
                    |symbol| received.push(symbol.name()),
                )
                .unwrap();
            prop_assert_eq!(outcome, expected_outcome);
            prop_assert_eq!(index, examined);
            prop_assert_eq!(&received, &expected);
        }
    }
}
