//! Dynamic resolution of the index store library.
//!
//! The library is opened once, every required operation is resolved by its
//! exported symbol name, and the reported version is negotiated before an
//! [`IndexStoreLibrary`] is handed out. Closure-form operations are resolved
//! as one optional group.

use crate::config::LibraryConfig;
use crate::error::{IndexStoreResult, LoadError};
use crate::traversal::CallingConvention;
use crate::version::{check_format, negotiate};
use indexstore_abi::functions::*;
use indexstore_abi::{
    optional_operations, required_operations, AbiVersion, STACK_BLOCK_ISA_SYMBOL, SYMBOL_PREFIX,
};
use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::mem::ManuallyDrop;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Something symbols can be looked up in.
///
/// Implemented by [`DynamicLibrary`] for shared libraries on disk. Any other
/// implementation must return addresses of functions with the signatures the
/// catalog declares.
pub trait SymbolSource: Send + Sync {
    /// Path or description of the source, for diagnostics.
    fn path(&self) -> &Path;

    /// Returns the address of `symbol`, or `None` if it is not exported.
    fn lookup(&self, symbol: &str) -> Option<*const c_void>;
}

/// A shared library opened through the platform loader.
///
/// The library is never unloaded, even when this value is dropped.
pub struct DynamicLibrary {
    path: PathBuf,
    library: ManuallyDrop<libloading::Library>,
}

impl DynamicLibrary {
    /// Opens the library at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        // SAFETY: loading runs the library's initialisers; the index store
        // library has no initialisers with preconditions.
        let library = unsafe { open_library(path) }.map_err(|err| LoadError::OpenFailed {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        debug!(path = %path.display(), "opened index store library");
        Ok(Self {
            path: path.to_path_buf(),
            library: ManuallyDrop::new(library),
        })
    }
}

#[cfg(unix)]
unsafe fn open_library(path: &Path) -> Result<libloading::Library, libloading::Error> {
    use libloading::os::unix::{Library, RTLD_LAZY, RTLD_LOCAL};
    Library::open(Some(path), RTLD_LAZY | RTLD_LOCAL).map(Into::into)
}

#[cfg(not(unix))]
unsafe fn open_library(path: &Path) -> Result<libloading::Library, libloading::Error> {
    libloading::Library::new(path)
}

impl SymbolSource for DynamicLibrary {
    fn path(&self) -> &Path {
        &self.path
    }

    fn lookup(&self, symbol: &str) -> Option<*const c_void> {
        // SAFETY: the address is only reinterpreted by the resolver, which
        // pairs it with the signature from the catalog.
        let address = unsafe { self.library.get::<*const c_void>(symbol.as_bytes()) }.ok()?;
        let address = *address;
        (!address.is_null()).then_some(address)
    }
}

impl fmt::Debug for DynamicLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn resolved_entry(
    resolved: &HashMap<&'static str, *const c_void>,
    name: &str,
) -> Result<*const c_void, LoadError> {
    resolved
        .get(name)
        .copied()
        .ok_or_else(|| LoadError::MissingSymbol(format!("{SYMBOL_PREFIX}{name}")))
}

/// Declares a table of typed entry points, one field per catalogued operation.
macro_rules! function_table {
    (
        $(#[$meta:meta])*
        $name:ident { $($field:ident: $ty:ty,)+ }
    ) => {
        $(#[$meta])*
        pub(crate) struct $name {
            $(pub(crate) $field: $ty,)+
        }

        impl $name {
            #[cfg(test)]
            const NAMES: &'static [&'static str] = &[$(stringify!($field)),+];

            /// # Safety
            ///
            /// Every resolved address must be a function with the signature
            /// declared for its field.
            unsafe fn assemble(
                resolved: &HashMap<&'static str, *const c_void>,
            ) -> Result<Self, LoadError> {
                Ok(Self {
                    $($field: std::mem::transmute::<*const c_void, $ty>(
                        resolved_entry(resolved, stringify!($field))?,
                    ),)+
                })
            }
        }
    };
}

function_table! {
    /// Operations every compatible library exports.
    Functions {
        error_get_description: ErrorGetDescriptionFn,
        error_dispose: ErrorDisposeFn,
        format_version: VersionFn,
        version: VersionFn,
        creation_options_create: CreationOptionsCreateFn,
        creation_options_dispose: CreationOptionsDisposeFn,
        creation_options_add_prefix_mapping: CreationOptionsAddPrefixMappingFn,
        store_create: StoreCreateFn,
        store_create_with_options: StoreCreateWithOptionsFn,
        store_dispose: StoreDisposeFn,
        store_units_apply_f: StoreUnitsApplyFFn,
        unit_event_notification_get_events_count: NotificationGetEventsCountFn,
        unit_event_notification_get_event: NotificationGetEventFn,
        unit_event_notification_is_initial: NotificationIsInitialFn,
        unit_event_get_kind: UnitEventGetKindFn,
        unit_event_get_unit_name: UnitEventGetUnitNameFn,
        store_set_unit_event_handler_f: StoreSetUnitEventHandlerFFn,
        store_start_unit_event_listening: StoreStartUnitEventListeningFn,
        store_stop_unit_event_listening: StoreActionFn,
        store_discard_unit: StoreDiscardFn,
        store_discard_record: StoreDiscardFn,
        store_purge_stale_data: StoreActionFn,
        store_get_unit_name_from_output_path: StoreGetUnitNameFromOutputPathFn,
        store_get_unit_modification_time: StoreGetUnitModificationTimeFn,
        symbol_get_language: SymbolEnumFn,
        symbol_get_kind: SymbolEnumFn,
        symbol_get_subkind: SymbolEnumFn,
        symbol_get_properties: SymbolFlagsFn,
        symbol_get_roles: SymbolFlagsFn,
        symbol_get_related_roles: SymbolFlagsFn,
        symbol_get_name: SymbolStringFn,
        symbol_get_usr: SymbolStringFn,
        symbol_get_codegen_name: SymbolStringFn,
        symbol_relation_get_roles: SymbolRelationGetRolesFn,
        symbol_relation_get_symbol: SymbolRelationGetSymbolFn,
        occurrence_get_symbol: OccurrenceGetSymbolFn,
        occurrence_relations_apply_f: OccurrenceRelationsApplyFFn,
        occurrence_get_roles: OccurrenceGetRolesFn,
        occurrence_get_line_col: OccurrenceGetLineColFn,
        record_reader_create: RecordReaderCreateFn,
        record_reader_dispose: RecordReaderDisposeFn,
        record_reader_search_symbols_f: RecordReaderSearchSymbolsFFn,
        record_reader_symbols_apply_f: RecordReaderSymbolsApplyFFn,
        record_reader_occurrences_apply_f: RecordReaderOccurrencesApplyFFn,
        record_reader_occurrences_in_line_range_apply_f: RecordReaderOccurrencesInLineRangeApplyFFn,
        record_reader_occurrences_of_symbols_apply_f: RecordReaderOccurrencesOfSymbolsApplyFFn,
        unit_reader_create: UnitReaderCreateFn,
        unit_reader_dispose: UnitReaderDisposeFn,
        unit_reader_get_provider_identifier: UnitReaderStringFn,
        unit_reader_get_provider_version: UnitReaderStringFn,
        unit_reader_get_modification_time: UnitReaderGetModificationTimeFn,
        unit_reader_is_system_unit: UnitReaderFlagFn,
        unit_reader_is_module_unit: UnitReaderFlagFn,
        unit_reader_is_debug_compilation: UnitReaderFlagFn,
        unit_reader_has_main_file: UnitReaderFlagFn,
        unit_reader_get_main_file: UnitReaderStringFn,
        unit_reader_get_module_name: UnitReaderStringFn,
        unit_reader_get_working_dir: UnitReaderStringFn,
        unit_reader_get_output_file: UnitReaderStringFn,
        unit_reader_get_sysroot_path: UnitReaderStringFn,
        unit_reader_get_target: UnitReaderStringFn,
        unit_dependency_get_kind: UnitDependencyGetKindFn,
        unit_dependency_is_system: UnitDependencyIsSystemFn,
        unit_dependency_get_filepath: UnitDependencyStringFn,
        unit_dependency_get_modulename: UnitDependencyStringFn,
        unit_dependency_get_name: UnitDependencyStringFn,
        unit_include_get_source_path: UnitIncludeStringFn,
        unit_include_get_target_path: UnitIncludeStringFn,
        unit_include_get_source_line: UnitIncludeGetSourceLineFn,
        unit_reader_dependencies_apply_f: UnitReaderDependenciesApplyFFn,
        unit_reader_includes_apply_f: UnitReaderIncludesApplyFFn,
    }
}

function_table! {
    /// Closure-form operations, present only with block support.
    BlockFunctions {
        store_units_apply: StoreUnitsApplyFn,
        store_set_unit_event_handler: StoreSetUnitEventHandlerFn,
        occurrence_relations_apply: OccurrenceRelationsApplyFn,
        record_reader_search_symbols: RecordReaderSearchSymbolsFn,
        record_reader_symbols_apply: RecordReaderSymbolsApplyFn,
        record_reader_occurrences_apply: RecordReaderOccurrencesApplyFn,
        record_reader_occurrences_in_line_range_apply: RecordReaderOccurrencesInLineRangeApplyFn,
        record_reader_occurrences_of_symbols_apply: RecordReaderOccurrencesOfSymbolsApplyFn,
        unit_reader_dependencies_apply: UnitReaderApplyFn,
        unit_reader_includes_apply: UnitReaderApplyFn,
    }
}

/// Closure-form operations together with the block runtime's stack block class.
pub(crate) struct BlockRuntime {
    pub(crate) stack_block_isa: *const c_void,
    pub(crate) functions: BlockFunctions,
}

// SAFETY: `stack_block_isa` is the address of an immutable class object
// that lives as long as the loaded library.
unsafe impl Send for BlockRuntime {}
unsafe impl Sync for BlockRuntime {}

/// Every resolved entry point of one loaded library. Immutable once built.
pub(crate) struct FunctionTable {
    pub(crate) functions: Functions,
    pub(crate) blocks: Option<BlockRuntime>,
}

/// Resolves the function table in catalog order.
///
/// Fails on the first required operation that is missing. Closure-form
/// operations are all-or-nothing: if any of them, or the stack block class,
/// is missing the table has no block runtime.
pub(crate) fn resolve(source: &dyn SymbolSource) -> Result<FunctionTable, LoadError> {
    let mut resolved = HashMap::new();
    for op in required_operations() {
        let address = source
            .lookup(op.symbol)
            .ok_or_else(|| LoadError::MissingSymbol(op.symbol.to_owned()))?;
        resolved.insert(op.name, address);
    }
    // SAFETY: every address was exported under the symbol whose signature
    // the field type declares.
    let functions = unsafe { Functions::assemble(&resolved)? };
    let blocks = resolve_block_runtime(source);
    Ok(FunctionTable { functions, blocks })
}

fn resolve_block_runtime(source: &dyn SymbolSource) -> Option<BlockRuntime> {
    let mut resolved = HashMap::new();
    let mut missing = Vec::new();
    for op in optional_operations() {
        match source.lookup(op.symbol) {
            Some(address) => {
                resolved.insert(op.name, address);
            }
            None => missing.push(op.symbol),
        }
    }
    let isa = source.lookup(STACK_BLOCK_ISA_SYMBOL);
    if isa.is_none() {
        missing.push(STACK_BLOCK_ISA_SYMBOL);
    }
    let stack_block_isa = match isa {
        Some(isa) if missing.is_empty() => isa,
        _ => {
            debug!(?missing, "closure calling convention unavailable");
            return None;
        }
    };
    // SAFETY: as in `resolve`.
    let functions = unsafe { BlockFunctions::assemble(&resolved) }.ok()?;
    Some(BlockRuntime {
        stack_block_isa,
        functions,
    })
}

struct LoadedLibrary {
    source: Box<dyn SymbolSource>,
    table: FunctionTable,
    version: AbiVersion,
    format_version: u32,
    convention: CallingConvention,
}

/// A loaded, version-checked index store library.
///
/// This is the session object every store handle is opened through. Cloning
/// is cheap and shares the same function table.
#[derive(Clone)]
pub struct IndexStoreLibrary {
    inner: Arc<LoadedLibrary>,
}

impl IndexStoreLibrary {
    /// Loads the library at `path` with default requirements.
    pub fn load(path: impl AsRef<Path>) -> IndexStoreResult<Self> {
        Self::load_with(&LibraryConfig::new().library_path(path.as_ref()))
    }

    /// Locates and loads the library described by `config`.
    pub fn load_with(config: &LibraryConfig) -> IndexStoreResult<Self> {
        let path = config.resolve_library_path()?;
        let library = DynamicLibrary::open(&path)?;
        Self::from_source(library, config)
    }

    /// Resolves and negotiates against an already opened symbol source.
    pub fn from_source(
        source: impl SymbolSource + 'static,
        config: &LibraryConfig,
    ) -> IndexStoreResult<Self> {
        let table = resolve(&source)?;

        // SAFETY: both entries were resolved from the source with the
        // catalogued signature and take no arguments.
        let (raw_version, format_version) = unsafe {
            (
                (table.functions.version)(),
                (table.functions.format_version)(),
            )
        };
        let version = AbiVersion::decode(raw_version);
        negotiate(config.required_version, version)?;
        check_format(config.required_format_version, format_version)?;

        let convention = if config.prefer_closures && table.blocks.is_some() {
            CallingConvention::Closure
        } else {
            CallingConvention::ContextPointer
        };
        debug!(
            path = %source.path().display(),
            %version,
            format_version,
            closures = table.blocks.is_some(),
            %convention,
            "index store library ready"
        );

        Ok(Self {
            inner: Arc::new(LoadedLibrary {
                source: Box::new(source),
                table,
                version,
                format_version,
                convention,
            }),
        })
    }

    /// API version reported by the library.
    #[must_use]
    pub fn version(&self) -> AbiVersion {
        self.inner.version
    }

    /// Format version reported by the library.
    #[must_use]
    pub fn format_version(&self) -> u32 {
        self.inner.format_version
    }

    /// Path the library was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.source.path()
    }

    /// Calling convention used for every traversal.
    #[must_use]
    pub fn convention(&self) -> CallingConvention {
        self.inner.convention
    }

    /// Returns true if the library exports the closure-form operations.
    #[must_use]
    pub fn has_closure_support(&self) -> bool {
        self.inner.table.blocks.is_some()
    }

    /// Returns true if both values share one loaded library.
    #[must_use]
    pub fn same_library(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn functions(&self) -> &Functions {
        &self.inner.table.functions
    }

    /// The block runtime, when traversals use the closure convention.
    pub(crate) fn block_runtime(&self) -> Option<&BlockRuntime> {
        match self.inner.convention {
            CallingConvention::Closure => self.inner.table.blocks.as_ref(),
            CallingConvention::ContextPointer => None,
        }
    }
}

impl fmt::Debug for IndexStoreLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexStoreLibrary")
            .field("path", &self.path())
            .field("version", &self.inner.version)
            .field("format_version", &self.inner.format_version)
            .field("convention", &self.inner.convention)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexstore_abi::OPERATIONS;
    use std::collections::HashSet;

    /// Hands out placeholder addresses that are never called.
    struct PlaceholderSource {
        missing: HashSet<&'static str>,
    }

    impl PlaceholderSource {
        fn without(missing: &[&'static str]) -> Self {
            Self {
                missing: missing.iter().copied().collect(),
            }
        }
    }

    impl SymbolSource for PlaceholderSource {
        fn path(&self) -> &Path {
            Path::new("placeholder")
        }

        fn lookup(&self, symbol: &str) -> Option<*const c_void> {
            (!self.missing.contains(symbol)).then_some(0x1000 as *const c_void)
        }
    }

    #[test]
    fn tables_cover_the_catalog() {
        let required: HashSet<_> = required_operations().map(|op| op.name).collect();
        let fields: HashSet<_> = Functions::NAMES.iter().copied().collect();
        assert_eq!(required, fields);

        let optional: HashSet<_> = optional_operations().map(|op| op.name).collect();
        let fields: HashSet<_> = BlockFunctions::NAMES.iter().copied().collect();
        assert_eq!(optional, fields);
    }

    #[test]
    fn resolves_everything() {
        let table = resolve(&PlaceholderSource::without(&[])).unwrap();
        assert!(table.blocks.is_some());
    }

    #[test]
    fn first_missing_required_symbol_is_reported() {
        let source =
            PlaceholderSource::without(&["indexstore_unit_reader_create", "indexstore_store_create"]);
        let err = resolve(&source).err().unwrap();
        assert_eq!(err, LoadError::MissingSymbol("indexstore_store_create".into()));
    }

    #[test]
    fn missing_block_operation_disables_closures() {
        let source = PlaceholderSource::without(&["indexstore_unit_reader_includes_apply"]);
        assert!(resolve(&source).unwrap().blocks.is_none());
    }

    #[test]
    fn missing_block_class_disables_closures() {
        let source = PlaceholderSource::without(&[STACK_BLOCK_ISA_SYMBOL]);
        assert!(resolve(&source).unwrap().blocks.is_none());
    }

    #[test]
    fn optional_symbols_are_not_required() {
        let missing: Vec<_> = OPERATIONS
            .iter()
            .filter(|op| op.optional)
            .map(|op| op.symbol)
            .collect();
        assert!(resolve(&PlaceholderSource::without(&missing)).is_ok());
    }

    #[test]
    fn open_failure() {
        let err = DynamicLibrary::open("/nonexistent/libIndexStore.so").unwrap_err();
        assert!(matches!(err, LoadError::OpenFailed { .. }));
    }
}
