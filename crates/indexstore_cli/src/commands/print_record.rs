//! Print-record command implementation.

use super::{emit, OutputFormat};
use indexstore_core::{DependencyKind, IndexStoreResult, OccurrenceInfo, Store, SymbolInfo};
use serde::Serialize;
use std::collections::BTreeSet;

/// A record as printed.
#[derive(Debug, Serialize)]
pub struct RecordDump {
    /// Record name.
    pub name: String,
    /// Symbols in record order.
    pub symbols: Vec<SymbolDump>,
    /// Occurrences in source order.
    pub occurrences: Vec<OccurrenceDump>,
}

/// A symbol as printed.
#[derive(Debug, Serialize)]
pub struct SymbolDump {
    /// Kind name.
    pub kind: String,
    /// Language name, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Name.
    pub name: String,
    /// Unified symbol resolution string.
    pub usr: String,
    /// Roles across all occurrences.
    pub roles: String,
}

/// An occurrence as printed.
#[derive(Debug, Serialize)]
pub struct OccurrenceDump {
    /// `line:column`.
    pub location: String,
    /// Occurrence roles.
    pub roles: String,
    /// Symbol name.
    pub symbol: String,
    /// Related symbols as `roles name`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<String>,
}

impl From<SymbolInfo> for SymbolDump {
    fn from(symbol: SymbolInfo) -> Self {
        Self {
            kind: symbol.kind.to_string(),
            language: symbol.language.map(|language| language.to_string()),
            name: symbol.name,
            usr: symbol.usr,
            roles: symbol.roles.to_string(),
        }
    }
}

impl From<OccurrenceInfo> for OccurrenceDump {
    fn from(occurrence: OccurrenceInfo) -> Self {
        Self {
            location: format!("{}:{}", occurrence.line, occurrence.column),
            roles: occurrence.roles.to_string(),
            symbol: occurrence.symbol.name,
            relations: occurrence
                .relations
                .into_iter()
                .map(|relation| format!("{} {}", relation.roles, relation.symbol.name))
                .collect(),
        }
    }
}

/// Names of the records the store's units depend on, in name order.
pub fn referenced_records(store: &Store) -> IndexStoreResult<Vec<String>> {
    let mut records = BTreeSet::new();
    for unit in store.unit_names(true)? {
        let reader = store.unit_reader(&unit)?;
        reader.dependencies_apply(|dep| {
            if dep.kind() == Some(DependencyKind::Record) {
                records.insert(dep.name());
            }
            true
        })?;
    }
    Ok(records.into_iter().collect())
}

/// Reads the named record, or every record the units depend on.
pub fn collect(store: &Store, name: Option<&str>) -> IndexStoreResult<Vec<RecordDump>> {
    let names = match name {
        Some(name) => vec![name.to_owned()],
        None => referenced_records(store)?,
    };
    names
        .into_iter()
        .map(|name| {
            let reader = store.record_reader(&name)?;
            Ok(RecordDump {
                symbols: reader.symbols()?.into_iter().map(Into::into).collect(),
                occurrences: reader.occurrences()?.into_iter().map(Into::into).collect(),
                name,
            })
        })
        .collect()
}

/// Runs the print-record command.
pub fn run(
    store: &Store,
    name: Option<&str>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = collect(store, name)?;
    emit(&records, format, |records| {
        for record in records {
            print_text(record);
        }
    })
}

fn print_text(record: &RecordDump) {
    println!("=== {} ===", record.name);
    println!("symbols: {}", record.symbols.len());
    for symbol in &record.symbols {
        let language = symbol.language.as_deref().unwrap_or("?");
        println!(
            "  {} | {} | {} | {} | {}",
            symbol.kind, language, symbol.name, symbol.usr, symbol.roles
        );
    }
    println!("occurrences: {}", record.occurrences.len());
    for occurrence in &record.occurrences {
        println!(
            "  {} | {} | {}",
            occurrence.location, occurrence.symbol, occurrence.roles
        );
        for relation in &occurrence.relations {
            println!("    {relation}");
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexstore_testkit::{sample, FakeLibrary, TestStore};

    #[test]
    fn lists_only_referenced_records() {
        let test_store = TestStore::sample();
        let library = FakeLibrary::new().load().unwrap();
        let store = test_store.open(&library).unwrap();

        let records = referenced_records(&store).unwrap();
        assert_eq!(records, vec![sample::MAIN_RECORD, sample::UTIL_RECORD]);
        assert_eq!(collect(&store, None).unwrap().len(), 2);
    }

    #[test]
    fn dumps_relations() {
        let test_store = TestStore::sample();
        let library = FakeLibrary::new().with_blocks(false).load().unwrap();
        let store = test_store.open(&library).unwrap();

        let dump = collect(&store, Some(sample::MAIN_RECORD)).unwrap();
        let record = &dump[0];
        assert_eq!(record.symbols.len(), 3);
        let call = record
            .occurrences
            .iter()
            .find(|occurrence| occurrence.location == "12:3")
            .unwrap();
        assert_eq!(call.symbol, "helper");
        assert_eq!(call.relations.len(), 1);
        assert!(call.relations[0].ends_with(" main"));
    }

    #[test]
    fn unknown_record_is_an_error() {
        let test_store = TestStore::sample();
        let library = FakeLibrary::new().load().unwrap();
        let store = test_store.open(&library).unwrap();
        assert!(collect(&store, Some("missing")).is_err());
    }
}
