//! Store fixtures and helpers.
//!
//! A fixture describes the units and records of a store. [`TestStore`]
//! writes one as `fixture.json` into a temporary directory, which the fake
//! library then serves as an index store.

use indexstore_abi::{DependencyKind, SymbolKind, SymbolLanguage, SymbolProperties, SymbolRoles};
use indexstore_core::{IndexStoreLibrary, IndexStoreResult, Store};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use tempfile::TempDir;

/// File name of the fixture inside a store directory.
pub const FIXTURE_FILE: &str = "fixture.json";

/// Name the fake library gives the unit written for `output_path`.
///
/// The file name of the output followed by a hash of the full path, so
/// outputs with the same file name in different directories stay distinct.
pub fn unit_name_for_output(output_path: &str) -> String {
    let file_name = output_path.rsplit('/').next().unwrap_or(output_path);
    format!("{file_name}-{:016x}", fnv1a(output_path.as_bytes()))
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Contents of a fake store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreFixture {
    /// Units in store order.
    pub units: Vec<UnitFixture>,
    /// Records.
    pub records: Vec<RecordFixture>,
    /// Misbehaviour of the listening entry point.
    pub listen_fault: ListenFault,
}

/// How the fake's `store_start_unit_event_listening` departs from its
/// contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenFault {
    /// Follows the contract.
    #[default]
    None,
    /// Reports failure without an error object.
    FailWithoutError,
    /// Starts listening and also hands out an error object.
    SucceedWithError,
}

impl StoreFixture {
    /// Creates an empty fixture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit.
    pub fn unit(mut self, unit: UnitFixture) -> Self {
        self.units.push(unit);
        self
    }

    /// Adds a record.
    pub fn record(mut self, record: RecordFixture) -> Self {
        self.records.push(record);
        self
    }

    /// Makes the listening entry point misbehave.
    pub fn listen_fault(mut self, fault: ListenFault) -> Self {
        self.listen_fault = fault;
        self
    }

    /// Writes the fixture into `dir`.
    pub fn write_to(&self, dir: &Path) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(self).map_err(io::Error::other)?;
        std::fs::write(dir.join(FIXTURE_FILE), json)
    }

    /// Reads the fixture from `dir`.
    pub fn read_from(dir: &Path) -> io::Result<Self> {
        let bytes = std::fs::read(dir.join(FIXTURE_FILE))?;
        serde_json::from_slice(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Looks up a unit by name.
    pub fn find_unit(&self, name: &str) -> Option<&UnitFixture> {
        self.units.iter().find(|unit| unit.name == name)
    }

    /// Looks up a record by name.
    pub fn find_record(&self, name: &str) -> Option<&RecordFixture> {
        self.records.iter().find(|record| record.name == name)
    }
}

/// One unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitFixture {
    /// Name.
    pub name: String,
    /// Producer of the unit, such as `clang`.
    pub provider_identifier: String,
    /// Producer version.
    pub provider_version: String,
    /// Modification time, whole seconds.
    pub seconds: i64,
    /// Modification time, nanosecond part.
    pub nanoseconds: i64,
    /// System flag.
    pub is_system: bool,
    /// Module unit flag.
    pub is_module: bool,
    /// Debug compilation flag.
    pub is_debug: bool,
    /// Main source file, if any.
    pub main_file: Option<String>,
    /// Module name, empty if none.
    pub module_name: String,
    /// Working directory.
    pub working_dir: String,
    /// Output file.
    pub output_file: String,
    /// Sysroot.
    pub sysroot_path: String,
    /// Target triple.
    pub target: String,
    /// Dependencies in unit order.
    pub dependencies: Vec<DependencyFixture>,
    /// Include directives.
    pub includes: Vec<IncludeFixture>,
}

impl UnitFixture {
    /// Creates a unit for `output_file`, named as the fake library names it.
    pub fn new(output_file: &str) -> Self {
        Self {
            name: unit_name_for_output(output_file),
            provider_identifier: "clang".to_owned(),
            provider_version: "17.0.0".to_owned(),
            seconds: 1_700_000_000,
            nanoseconds: 0,
            working_dir: "/build".to_owned(),
            output_file: output_file.to_owned(),
            target: "x86_64-unknown-linux-gnu".to_owned(),
            ..Self::default()
        }
    }

    /// Sets the main file.
    pub fn main_file(mut self, path: &str) -> Self {
        self.main_file = Some(path.to_owned());
        self
    }

    /// Sets the module name.
    pub fn module_name(mut self, name: &str) -> Self {
        self.module_name = name.to_owned();
        self
    }

    /// Sets the system unit flag.
    pub fn system(mut self, value: bool) -> Self {
        self.is_system = value;
        self
    }

    /// Sets the modification time.
    pub fn modified_at(mut self, seconds: i64, nanoseconds: i64) -> Self {
        self.seconds = seconds;
        self.nanoseconds = nanoseconds;
        self
    }

    /// Sets the sysroot.
    pub fn sysroot(mut self, path: &str) -> Self {
        self.sysroot_path = path.to_owned();
        self
    }

    /// Adds a dependency.
    pub fn dependency(mut self, dependency: DependencyFixture) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Adds an include.
    pub fn include(mut self, source_path: &str, target_path: &str, source_line: u32) -> Self {
        self.includes.push(IncludeFixture {
            source_path: source_path.to_owned(),
            target_path: target_path.to_owned(),
            source_line,
        });
        self
    }
}

/// One unit dependency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyFixture {
    /// Raw kind value.
    pub kind: u32,
    /// System flag.
    pub is_system: bool,
    /// Path of the file depended on.
    pub file_path: String,
    /// Module name, empty if none.
    pub module_name: String,
    /// Name.
    pub name: String,
}

impl DependencyFixture {
    fn of_kind(kind: DependencyKind, name: &str, file_path: &str) -> Self {
        Self {
            kind: kind.as_raw(),
            file_path: file_path.to_owned(),
            name: name.to_owned(),
            ..Self::default()
        }
    }

    /// A dependency on a record.
    pub fn record(name: &str, file_path: &str) -> Self {
        Self::of_kind(DependencyKind::Record, name, file_path)
    }

    /// A dependency on another unit.
    pub fn unit(name: &str, file_path: &str) -> Self {
        Self::of_kind(DependencyKind::Unit, name, file_path)
    }

    /// A dependency on a plain file.
    pub fn file(file_path: &str) -> Self {
        Self::of_kind(DependencyKind::File, "", file_path)
    }

    /// Sets the system flag.
    pub fn system(mut self, value: bool) -> Self {
        self.is_system = value;
        self
    }

    /// Sets the module name.
    pub fn module_name(mut self, name: &str) -> Self {
        self.module_name = name.to_owned();
        self
    }
}

/// One include directive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncludeFixture {
    /// Including file.
    pub source_path: String,
    /// Included file.
    pub target_path: String,
    /// Line of the directive.
    pub source_line: u32,
}

/// One record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFixture {
    /// Name.
    pub name: String,
    /// Symbols, referred to by index.
    pub symbols: Vec<SymbolFixture>,
    /// Occurrences in source order.
    pub occurrences: Vec<OccurrenceFixture>,
}

impl RecordFixture {
    /// Creates an empty record.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    /// Adds a symbol.
    pub fn symbol(mut self, symbol: SymbolFixture) -> Self {
        self.symbols.push(symbol);
        self
    }

    /// Adds an occurrence.
    pub fn occurrence(mut self, occurrence: OccurrenceFixture) -> Self {
        self.occurrences.push(occurrence);
        self
    }
}

/// One symbol, with raw wire values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolFixture {
    /// Name.
    pub name: String,
    /// Unified symbol resolution string.
    pub usr: String,
    /// Code generation name.
    pub codegen_name: String,
    /// Raw kind value.
    pub kind: u32,
    /// Raw sub-kind value.
    pub sub_kind: u32,
    /// Raw language value.
    pub language: u32,
    /// Property bits.
    pub properties: u64,
    /// Role bits.
    pub roles: u64,
    /// Relation role bits.
    pub related_roles: u64,
}

impl SymbolFixture {
    /// Creates a C symbol.
    pub fn new(name: &str, usr: &str, kind: SymbolKind) -> Self {
        Self {
            name: name.to_owned(),
            usr: usr.to_owned(),
            kind: kind.as_raw(),
            language: SymbolLanguage::C.as_raw(),
            ..Self::default()
        }
    }

    /// Sets the language.
    pub fn language(mut self, language: SymbolLanguage) -> Self {
        self.language = language.as_raw();
        self
    }

    /// Sets the properties.
    pub fn properties(mut self, properties: SymbolProperties) -> Self {
        self.properties = properties.bits();
        self
    }

    /// Sets the occurrence and relation roles.
    pub fn roles(mut self, roles: SymbolRoles, related_roles: SymbolRoles) -> Self {
        self.roles = roles.bits();
        self.related_roles = related_roles.bits();
        self
    }

    /// Sets the code generation name.
    pub fn codegen_name(mut self, name: &str) -> Self {
        self.codegen_name = name.to_owned();
        self
    }
}

/// One occurrence. Symbols are referred to by index into the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OccurrenceFixture {
    /// Index of the symbol in the record.
    pub symbol: usize,
    /// Role bits.
    pub roles: u64,
    /// Line, 1-based.
    pub line: u32,
    /// Column, 1-based.
    pub column: u32,
    /// Relations to other symbols.
    pub relations: Vec<RelationFixture>,
}

impl OccurrenceFixture {
    /// Creates an occurrence of symbol `symbol`.
    pub fn new(symbol: usize, roles: SymbolRoles, line: u32, column: u32) -> Self {
        Self {
            symbol,
            roles: roles.bits(),
            line,
            column,
            relations: Vec::new(),
        }
    }

    /// Adds a relation to symbol `symbol`.
    pub fn relation(mut self, symbol: usize, roles: SymbolRoles) -> Self {
        self.relations.push(RelationFixture {
            symbol,
            roles: roles.bits(),
        });
        self
    }
}

/// One relation of an occurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationFixture {
    /// Index of the symbol in the record.
    pub symbol: usize,
    /// Role bits.
    pub roles: u64,
}

/// A fixture written into a temporary store directory.
pub struct TestStore {
    dir: TempDir,
    fixture: StoreFixture,
}

impl TestStore {
    /// Writes `fixture` into a fresh temporary directory.
    pub fn new(fixture: StoreFixture) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fixture
            .write_to(dir.path())
            .expect("Failed to write store fixture");
        Self { dir, fixture }
    }

    /// A store with the [`sample_fixture`] contents.
    pub fn sample() -> Self {
        Self::new(sample_fixture())
    }

    /// Store directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The fixture as written.
    pub fn fixture(&self) -> &StoreFixture {
        &self.fixture
    }

    /// The fixture as currently on disk.
    pub fn current_fixture(&self) -> StoreFixture {
        StoreFixture::read_from(self.dir.path()).expect("Failed to read store fixture")
    }

    /// Opens the store through `library`.
    pub fn open(&self, library: &IndexStoreLibrary) -> IndexStoreResult<Store> {
        Store::open(library, self.dir.path())
    }
}

/// Names used by [`sample_fixture`].
pub mod sample {
    /// Output of the main unit.
    pub const MAIN_OUTPUT: &str = "/build/main.o";
    /// Output of the util unit.
    pub const UTIL_OUTPUT: &str = "/build/util.o";
    /// Output of the system unit.
    pub const SYSTEM_OUTPUT: &str = "/sdk/lib/libc.o";
    /// Record of `main.c`.
    pub const MAIN_RECORD: &str = "main.c-1a2b3c";
    /// Record of `util.c`.
    pub const UTIL_RECORD: &str = "util.c-4d5e6f";
    /// Record no unit refers to.
    pub const ORPHAN_RECORD: &str = "orphan.c-777777";
    /// Symbol indices in the main record.
    pub const MAIN_SYMBOL: usize = 0;
    /// See [`MAIN_SYMBOL`].
    pub const HELPER_SYMBOL: usize = 1;
    /// See [`MAIN_SYMBOL`].
    pub const COUNTER_SYMBOL: usize = 2;
}

/// A small store: two user units, one system unit and three records, one
/// of which is stale.
///
/// Units are stored in the order util, main, system, which is not name
/// order. The main record has occurrences on lines 1 to 20.
pub fn sample_fixture() -> StoreFixture {
    use sample::*;

    let util = UnitFixture::new(UTIL_OUTPUT)
        .main_file("/src/util.c")
        .modified_at(1_700_000_100, 500)
        .dependency(DependencyFixture::record(UTIL_RECORD, "/src/util.c"))
        .include("/src/util.c", "/src/util.h", 1);

    let main = UnitFixture::new(MAIN_OUTPUT)
        .main_file("/src/main.c")
        .modified_at(1_700_000_200, 250)
        .sysroot("/sdk")
        .dependency(DependencyFixture::record(MAIN_RECORD, "/src/main.c"))
        .dependency(DependencyFixture::unit(&unit_name_for_output(UTIL_OUTPUT), UTIL_OUTPUT))
        .dependency(
            DependencyFixture::file("/sdk/usr/include/stdio.h")
                .system(true)
                .module_name("Darwin"),
        )
        .include("/src/main.c", "/src/util.h", 2)
        .include("/src/main.c", "/sdk/usr/include/stdio.h", 1);

    let system = UnitFixture::new(SYSTEM_OUTPUT)
        .system(true)
        .module_name("libc")
        .sysroot("/sdk");

    let defines_and_refs = SymbolRoles::DEFINITION | SymbolRoles::REFERENCE;
    let main_record = RecordFixture::new(MAIN_RECORD)
        .symbol(
            SymbolFixture::new("main", "c:@F@main", SymbolKind::Function)
                .roles(SymbolRoles::DEFINITION, SymbolRoles::NONE)
                .codegen_name("_main"),
        )
        .symbol(
            SymbolFixture::new("helper", "c:@F@helper", SymbolKind::Function).roles(
                SymbolRoles::DECLARATION | SymbolRoles::REFERENCE | SymbolRoles::CALL,
                SymbolRoles::NONE,
            ),
        )
        .symbol(
            SymbolFixture::new("counter", "c:@counter", SymbolKind::Variable)
                .roles(defines_and_refs | SymbolRoles::WRITE, SymbolRoles::NONE),
        )
        .occurrence(OccurrenceFixture::new(HELPER_SYMBOL, SymbolRoles::DECLARATION, 1, 6))
        .occurrence(OccurrenceFixture::new(COUNTER_SYMBOL, SymbolRoles::DEFINITION, 3, 5))
        .occurrence(OccurrenceFixture::new(MAIN_SYMBOL, SymbolRoles::DEFINITION, 10, 5))
        .occurrence(
            OccurrenceFixture::new(
                HELPER_SYMBOL,
                SymbolRoles::REFERENCE | SymbolRoles::CALL | SymbolRoles::REL_CALLEDBY,
                12,
                3,
            )
            .relation(MAIN_SYMBOL, SymbolRoles::REL_CALLEDBY),
        )
        .occurrence(
            OccurrenceFixture::new(
                COUNTER_SYMBOL,
                SymbolRoles::REFERENCE | SymbolRoles::WRITE | SymbolRoles::REL_CONTAINEDBY,
                14,
                3,
            )
            .relation(MAIN_SYMBOL, SymbolRoles::REL_CONTAINEDBY),
        )
        .occurrence(OccurrenceFixture::new(HELPER_SYMBOL, SymbolRoles::REFERENCE, 15, 10))
        .occurrence(OccurrenceFixture::new(COUNTER_SYMBOL, SymbolRoles::REFERENCE, 20, 12));

    let util_record = RecordFixture::new(UTIL_RECORD)
        .symbol(
            SymbolFixture::new("helper", "c:@F@helper", SymbolKind::Function)
                .roles(SymbolRoles::DEFINITION, SymbolRoles::NONE),
        )
        .occurrence(OccurrenceFixture::new(0, SymbolRoles::DEFINITION, 4, 6));

    let orphan_record = RecordFixture::new(ORPHAN_RECORD).symbol(SymbolFixture::new(
        "unused",
        "c:@F@unused",
        SymbolKind::Function,
    ));

    StoreFixture::new()
        .unit(util)
        .unit(main)
        .unit(system)
        .record(main_record)
        .record(util_record)
        .record(orphan_record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_names_are_stable_and_distinct() {
        let a = unit_name_for_output("/build/a/main.o");
        let b = unit_name_for_output("/build/b/main.o");
        assert!(a.starts_with("main.o-"));
        assert_ne!(a, b);
        assert_eq!(a, unit_name_for_output("/build/a/main.o"));
    }

    #[test]
    fn fixture_survives_disk() {
        let store = TestStore::sample();
        assert_eq!(&store.current_fixture(), store.fixture());
    }

    #[test]
    fn sample_units_are_not_in_name_order() {
        let fixture = sample_fixture();
        let names: Vec<_> = fixture.units.iter().map(|u| u.name.clone()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_ne!(names, sorted);
    }
}
