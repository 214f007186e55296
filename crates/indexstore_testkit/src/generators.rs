//! Property-based test generators using proptest.
//!
//! Generated records always refer to symbols that exist, and their
//! occurrences are in source order.

use crate::fixtures::{
    DependencyFixture, OccurrenceFixture, RecordFixture, StoreFixture, SymbolFixture, UnitFixture,
};
use indexstore_abi::{SymbolKind, SymbolRoles};
use proptest::prelude::*;

/// Strategy for C identifiers.
pub fn identifier_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z_][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for symbol kinds that appear in C and C++ records.
pub fn symbol_kind_strategy() -> impl Strategy<Value = SymbolKind> {
    prop::sample::select(vec![
        SymbolKind::Function,
        SymbolKind::Variable,
        SymbolKind::Struct,
        SymbolKind::Union,
        SymbolKind::Enum,
        SymbolKind::EnumConstant,
        SymbolKind::Field,
        SymbolKind::TypeAlias,
        SymbolKind::Macro,
    ])
}

/// Strategy for occurrence roles.
pub fn roles_strategy() -> impl Strategy<Value = SymbolRoles> {
    prop::sample::select(vec![
        SymbolRoles::DECLARATION,
        SymbolRoles::DEFINITION,
        SymbolRoles::REFERENCE,
        SymbolRoles::REFERENCE | SymbolRoles::CALL,
        SymbolRoles::REFERENCE | SymbolRoles::READ,
        SymbolRoles::REFERENCE | SymbolRoles::WRITE,
    ])
}

/// Strategy for a symbol with a USR derived from its name.
pub fn symbol_fixture_strategy() -> impl Strategy<Value = SymbolFixture> {
    (identifier_strategy(), symbol_kind_strategy(), roles_strategy()).prop_map(
        |(name, kind, roles)| {
            let usr = format!("c:@{name}");
            SymbolFixture::new(&name, &usr, kind).roles(roles, SymbolRoles::NONE)
        },
    )
}

/// Strategy for a record named `name` with `1..=max_symbols` symbols and up
/// to `max_occurrences` occurrences.
pub fn record_fixture_strategy(
    name: String,
    max_symbols: usize,
    max_occurrences: usize,
) -> impl Strategy<Value = RecordFixture> {
    prop::collection::vec(symbol_fixture_strategy(), 1..=max_symbols.max(1)).prop_flat_map(
        move |symbols| {
            let count = symbols.len();
            let name = name.clone();
            let occurrence = (
                0..count,
                roles_strategy(),
                1u32..500,
                1u32..120,
                prop::option::of(0..count),
            );
            prop::collection::vec(occurrence, 0..=max_occurrences).prop_map(move |raw| {
                let mut occurrences: Vec<OccurrenceFixture> = raw
                    .into_iter()
                    .map(|(symbol, roles, line, column, related)| {
                        let occurrence = OccurrenceFixture::new(symbol, roles, line, column);
                        match related {
                            Some(related) => {
                                occurrence.relation(related, SymbolRoles::REL_CONTAINEDBY)
                            }
                            None => occurrence,
                        }
                    })
                    .collect();
                occurrences.sort_by_key(|occurrence| (occurrence.line, occurrence.column));
                RecordFixture {
                    name: name.clone(),
                    symbols: symbols.clone(),
                    occurrences,
                }
            })
        },
    )
}

/// Strategy for `1..=max` distinct output file paths.
pub fn output_paths_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(identifier_strategy(), 1..=max.max(1)).prop_map(|names| {
        names
            .into_iter()
            .map(|name| format!("/build/{name}.o"))
            .collect()
    })
}

/// Strategy for a store with up to `max_units` units, each depending on a
/// record of its own, in arbitrary store order.
pub fn store_fixture_strategy(max_units: usize) -> impl Strategy<Value = StoreFixture> {
    output_paths_strategy(max_units)
        .prop_flat_map(|outputs| {
            let units: Vec<_> = outputs
                .into_iter()
                .map(|output| {
                    let record = record_fixture_strategy(record_name_for(&output), 4, 8);
                    (Just(output), record)
                })
                .collect();
            units.prop_shuffle()
        })
        .prop_map(|units| {
            let mut fixture = StoreFixture::new();
            for (output, record) in units {
                let unit = UnitFixture::new(&output)
                    .dependency(DependencyFixture::record(&record.name, &output));
                fixture = fixture.unit(unit).record(record);
            }
            fixture
        })
}

fn record_name_for(output: &str) -> String {
    let stem = output.rsplit('/').next().unwrap_or(output);
    format!("{}-{:06x}", stem.trim_end_matches(".o"), stem.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn records_refer_to_existing_symbols(
            record in record_fixture_strategy("r".to_owned(), 5, 20)
        ) {
            for occurrence in &record.occurrences {
                prop_assert!(occurrence.symbol < record.symbols.len());
                for relation in &occurrence.relations {
                    prop_assert!(relation.symbol < record.symbols.len());
                }
            }
        }

        #[test]
        fn occurrences_are_in_source_order(
            record in record_fixture_strategy("r".to_owned(), 3, 20)
        ) {
            let positions: Vec<_> = record
                .occurrences
                .iter()
                .map(|occurrence| (occurrence.line, occurrence.column))
                .collect();
            let mut sorted = positions.clone();
            sorted.sort();
            prop_assert_eq!(positions, sorted);
        }

        #[test]
        fn every_unit_has_its_record(fixture in store_fixture_strategy(6)) {
            prop_assert_eq!(fixture.units.len(), fixture.records.len());
            for unit in &fixture.units {
                let record = &unit.dependencies[0].name;
                prop_assert!(fixture.find_record(record).is_some());
            }
            let mut names: Vec<_> = fixture.units.iter().map(|unit| &unit.name).collect();
            names.sort();
            names.dedup();
            prop_assert_eq!(names.len(), fixture.units.len());
        }
    }
}
