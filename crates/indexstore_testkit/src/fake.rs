//! An in-process stand-in for the index store library.
//!
//! [`FakeLibrary`] is a [`SymbolSource`] whose symbols are plain Rust
//! functions with the C signatures of the catalog. Stores are directories
//! holding a `fixture.json` (see [`crate::fixtures`]). Both calling
//! conventions are served from the same code.

use crate::exports;
use indexstore_abi::{AbiVersion, REQUIRED_VERSION, STACK_BLOCK_ISA_SYMBOL, SYMBOL_PREFIX};
use indexstore_core::{IndexStoreLibrary, IndexStoreResult, LibraryConfig, SymbolSource};
use parking_lot::Mutex;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

/// Format version reported by default.
pub const FAKE_FORMAT_VERSION: u32 = 13;

thread_local! {
    /// Values returned by the version entry points on this thread.
    static REPORTED: Cell<(u32, u32)> = const { Cell::new((0, 0)) };
}

pub(crate) fn reported_version() -> u32 {
    REPORTED.with(|reported| reported.get().0)
}

pub(crate) fn reported_format_version() -> u32 {
    REPORTED.with(|reported| reported.get().1)
}

/// Class object the fake hands out for stack blocks. Only its address matters.
static STACK_BLOCK_CLASS: [usize; 4] = [0; 4];

/// A fake index store library.
///
/// The version entry points return the configured values to the thread that
/// looked them up, which is the thread resolving the library.
#[derive(Debug, Clone)]
pub struct FakeLibrary {
    path: PathBuf,
    version: AbiVersion,
    format_version: u32,
    missing: BTreeSet<String>,
    blocks: bool,
}

impl FakeLibrary {
    /// A library reporting the required version, with closure support.
    pub fn new() -> Self {
        Self {
            path: PathBuf::from("<fake libIndexStore>"),
            version: REQUIRED_VERSION,
            format_version: FAKE_FORMAT_VERSION,
            missing: BTreeSet::new(),
            blocks: true,
        }
    }

    /// Reports `version`.
    pub fn with_version(mut self, version: AbiVersion) -> Self {
        self.version = version;
        self
    }

    /// Reports `format_version`.
    pub fn with_format_version(mut self, format_version: u32) -> Self {
        self.format_version = format_version;
        self
    }

    /// Hides an exported symbol.
    pub fn without(mut self, symbol: &str) -> Self {
        self.missing.insert(symbol.to_owned());
        self
    }

    /// Enables or disables the closure-form operations and the block runtime.
    pub fn with_blocks(mut self, enabled: bool) -> Self {
        self.blocks = enabled;
        self
    }

    /// Loads the fake with default requirements.
    pub fn load(&self) -> IndexStoreResult<IndexStoreLibrary> {
        self.load_with(&LibraryConfig::new())
    }

    /// Loads the fake with `config`. The configured library path is ignored.
    pub fn load_with(&self, config: &LibraryConfig) -> IndexStoreResult<IndexStoreLibrary> {
        IndexStoreLibrary::from_source(self.clone(), config)
    }
}

impl Default for FakeLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolSource for FakeLibrary {
    fn path(&self) -> &Path {
        &self.path
    }

    fn lookup(&self, symbol: &str) -> Option<*const c_void> {
        if self.missing.contains(symbol) {
            return None;
        }
        if symbol == STACK_BLOCK_ISA_SYMBOL {
            return self
                .blocks
                .then(|| std::ptr::addr_of!(STACK_BLOCK_CLASS).cast::<c_void>());
        }
        let name = symbol.strip_prefix(SYMBOL_PREFIX)?;
        if name == "version" || name == "format_version" {
            REPORTED.with(|reported| reported.set((self.version.encode(), self.format_version)));
        }
        match exports::lookup_block_form(name) {
            Some(address) => self.blocks.then_some(address),
            None => exports::lookup(name),
        }
    }
}

/// Handle counters for one store directory.
#[derive(Debug, Default)]
pub(crate) struct HandleStats {
    pub(crate) stores_created: AtomicUsize,
    pub(crate) stores_disposed: AtomicUsize,
    pub(crate) record_readers_created: AtomicUsize,
    pub(crate) record_readers_disposed: AtomicUsize,
    pub(crate) unit_readers_created: AtomicUsize,
    pub(crate) unit_readers_disposed: AtomicUsize,
    pub(crate) errors_created: AtomicUsize,
    pub(crate) errors_disposed: AtomicUsize,
    pub(crate) handlers_finalized: AtomicUsize,
    pub(crate) line_range_queries: AtomicUsize,
}

impl HandleStats {
    pub(crate) fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> HandleCounts {
        let load = |counter: &AtomicUsize| counter.load(Ordering::SeqCst);
        HandleCounts {
            stores_created: load(&self.stores_created),
            stores_disposed: load(&self.stores_disposed),
            record_readers_created: load(&self.record_readers_created),
            record_readers_disposed: load(&self.record_readers_disposed),
            unit_readers_created: load(&self.unit_readers_created),
            unit_readers_disposed: load(&self.unit_readers_disposed),
            errors_created: load(&self.errors_created),
            errors_disposed: load(&self.errors_disposed),
            handlers_finalized: load(&self.handlers_finalized),
            line_range_queries: load(&self.line_range_queries),
        }
    }
}

static STATS: LazyLock<Mutex<HashMap<PathBuf, Arc<HandleStats>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

pub(crate) fn stats_for(dir: &Path) -> Arc<HandleStats> {
    Arc::clone(STATS.lock().entry(dir.to_path_buf()).or_default())
}

/// How many handles the fake created and disposed for one store directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleCounts {
    /// Stores opened.
    pub stores_created: usize,
    /// Stores disposed.
    pub stores_disposed: usize,
    /// Record readers created.
    pub record_readers_created: usize,
    /// Record readers disposed.
    pub record_readers_disposed: usize,
    /// Unit readers created.
    pub unit_readers_created: usize,
    /// Unit readers disposed.
    pub unit_readers_disposed: usize,
    /// Error objects handed out.
    pub errors_created: usize,
    /// Error objects disposed.
    pub errors_disposed: usize,
    /// Event handler contexts released.
    pub handlers_finalized: usize,
    /// Line range traversals served.
    pub line_range_queries: usize,
}

impl HandleCounts {
    /// True if every created handle and error was disposed exactly once.
    pub fn balanced(&self) -> bool {
        self.stores_created == self.stores_disposed
            && self.record_readers_created == self.record_readers_disposed
            && self.unit_readers_created == self.unit_readers_disposed
            && self.errors_created == self.errors_disposed
    }
}

/// Handle counters for the store directory `dir`.
pub fn handle_counts(dir: &Path) -> HandleCounts {
    stats_for(dir).snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexstore_abi::{optional_operations, OPERATIONS};

    #[test]
    fn exports_every_operation() {
        let fake = FakeLibrary::new();
        for op in OPERATIONS {
            assert!(fake.lookup(op.symbol).is_some(), "{} not exported", op.symbol);
        }
        assert!(fake.lookup(STACK_BLOCK_ISA_SYMBOL).is_some());
        assert!(fake.lookup("indexstore_frobnicate").is_none());
    }

    #[test]
    fn without_blocks_hides_closure_forms() {
        let fake = FakeLibrary::new().with_blocks(false);
        for op in optional_operations() {
            assert!(fake.lookup(op.symbol).is_none(), "{}", op.symbol);
        }
        assert!(fake.lookup("indexstore_store_units_apply_f").is_some());
        assert!(fake.lookup(STACK_BLOCK_ISA_SYMBOL).is_none());
    }

    #[test]
    fn hidden_symbol() {
        let fake = FakeLibrary::new().without("indexstore_store_create");
        assert!(fake.lookup("indexstore_store_create").is_none());
        assert!(fake.lookup("indexstore_store_dispose").is_some());
    }

    #[test]
    fn version_follows_lookup() {
        let fake = FakeLibrary::new()
            .with_version(AbiVersion::new(0, 16))
            .with_format_version(7);
        fake.lookup("indexstore_version");
        assert_eq!(reported_version(), AbiVersion::new(0, 16).encode());
        assert_eq!(reported_format_version(), 7);
    }
}
