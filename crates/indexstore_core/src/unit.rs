//! Unit readers: metadata, dependencies and includes of one compilation.

use crate::error::IndexStoreResult;
use crate::error_slot::ErrorSlot;
use crate::library::IndexStoreLibrary;
use crate::store::Store;
use crate::string::{copy_string_ref, to_c_string};
use crate::traversal::{drive, ApplyOutcome, Applier};
use crate::types::Timestamp;
use indexstore_abi::functions::UnitReaderStringFn;
use indexstore_abi::{DependencyKind, RawUnitDependency, RawUnitInclude, RawUnitReader};
use std::fmt;
use tracing::{debug, warn};

/// Reads one unit of a store.
pub struct UnitReader<'s> {
    store: &'s Store,
    raw: RawUnitReader,
    name: String,
}

impl<'s> UnitReader<'s> {
    /// Opens the unit named `unit_name`.
    pub fn open(store: &'s Store, unit_name: &str) -> IndexStoreResult<Self> {
        let c_name = to_c_string(unit_name)?;
        let library = store.library();
        let mut error = ErrorSlot::new(library);
        // SAFETY: live store; the name outlives the call.
        let raw = unsafe {
            (library.functions().unit_reader_create)(store.raw(), c_name.as_ptr(), error.as_out())
        };
        if raw.is_null() {
            return Err(error.into_error("unit_reader_create"));
        }
        debug!(unit = unit_name, "opened unit reader");
        Ok(Self {
            store,
            raw,
            name: unit_name.to_owned(),
        })
    }

    /// Name the unit was opened with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The store this reader belongs to.
    #[must_use]
    pub fn store(&self) -> &'s Store {
        self.store
    }

    /// Closes the reader.
    pub fn close(self) {
        drop(self);
    }

    fn library(&self) -> &IndexStoreLibrary {
        self.store.library()
    }

    fn string(&self, accessor: UnitReaderStringFn) -> String {
        // SAFETY: live reader; the string is copied before the call returns.
        unsafe { copy_string_ref(accessor(self.raw)) }
    }

    /// Identifier of the tool that produced the unit.
    #[must_use]
    pub fn provider_identifier(&self) -> String {
        self.string(self.library().functions().unit_reader_get_provider_identifier)
    }

    /// Version of the tool that produced the unit.
    #[must_use]
    pub fn provider_version(&self) -> String {
        self.string(self.library().functions().unit_reader_get_provider_version)
    }

    /// Main source file, empty when [`UnitReader::has_main_file`] is false.
    #[must_use]
    pub fn main_file(&self) -> String {
        self.string(self.library().functions().unit_reader_get_main_file)
    }

    /// Module name.
    #[must_use]
    pub fn module_name(&self) -> String {
        self.string(self.library().functions().unit_reader_get_module_name)
    }

    /// Working directory of the compilation.
    #[must_use]
    pub fn working_dir(&self) -> String {
        self.string(self.library().functions().unit_reader_get_working_dir)
    }

    /// Output file of the compilation.
    #[must_use]
    pub fn output_file(&self) -> String {
        self.string(self.library().functions().unit_reader_get_output_file)
    }

    /// SDK root.
    #[must_use]
    pub fn sysroot_path(&self) -> String {
        self.string(self.library().functions().unit_reader_get_sysroot_path)
    }

    /// Target triple.
    #[must_use]
    pub fn target(&self) -> String {
        self.string(self.library().functions().unit_reader_get_target)
    }

    /// Modification time of the unit.
    ///
    /// This query has no error channel; a zero timestamp is returned as is.
    #[must_use]
    pub fn modification_time(&self) -> Timestamp {
        let mut seconds = 0i64;
        let mut nanoseconds = 0i64;
        // SAFETY: both out-parameters are valid for writes.
        unsafe {
            (self.library().functions().unit_reader_get_modification_time)(
                self.raw,
                &mut seconds,
                &mut nanoseconds,
            );
        }
        Timestamp::new(seconds, nanoseconds)
    }

    /// True for units of system (SDK) files.
    #[must_use]
    pub fn is_system_unit(&self) -> bool {
        // SAFETY: live reader.
        unsafe { (self.library().functions().unit_reader_is_system_unit)(self.raw) }
    }

    /// True for units that build a module.
    #[must_use]
    pub fn is_module_unit(&self) -> bool {
        // SAFETY: live reader.
        unsafe { (self.library().functions().unit_reader_is_module_unit)(self.raw) }
    }

    /// True for debug compilations.
    #[must_use]
    pub fn is_debug_compilation(&self) -> bool {
        // SAFETY: live reader.
        unsafe { (self.library().functions().unit_reader_is_debug_compilation)(self.raw) }
    }

    /// True if the unit has a main source file.
    #[must_use]
    pub fn has_main_file(&self) -> bool {
        // SAFETY: live reader.
        unsafe { (self.library().functions().unit_reader_has_main_file)(self.raw) }
    }

    /// Calls `applier` with each dependency until it returns false.
    pub fn dependencies_apply<F>(&self, mut applier: F) -> IndexStoreResult<ApplyOutcome>
    where
        F: FnMut(UnitDependency<'_>) -> bool,
    {
        let library = self.library();
        let functions = library.functions();
        let raw = self.raw;
        drive(
            library,
            "unit_reader_dependencies_apply",
            |dependency: RawUnitDependency| applier(UnitDependency::new(library, dependency)),
            |callback| unsafe {
                match callback {
                    Applier::Block { functions: blocks, block } => {
                        (blocks.unit_reader_dependencies_apply)(raw, block)
                    }
                    Applier::Function { context, function } => {
                        (functions.unit_reader_dependencies_apply_f)(raw, context, function)
                    }
                }
            },
        )
    }

    /// Calls `applier` with each include until it returns false.
    pub fn includes_apply<F>(&self, mut applier: F) -> IndexStoreResult<ApplyOutcome>
    where
        F: FnMut(UnitInclude<'_>) -> bool,
    {
        let library = self.library();
        let functions = library.functions();
        let raw = self.raw;
        drive(
            library,
            "unit_reader_includes_apply",
            |include: RawUnitInclude| applier(UnitInclude::new(library, include)),
            |callback| unsafe {
                match callback {
                    Applier::Block { functions: blocks, block } => {
                        (blocks.unit_reader_includes_apply)(raw, block)
                    }
                    Applier::Function { context, function } => {
                        (functions.unit_reader_includes_apply_f)(raw, context, function)
                    }
                }
            },
        )
    }

    /// Copies every dependency.
    pub fn dependencies(&self) -> IndexStoreResult<Vec<DependencyInfo>> {
        let mut dependencies = Vec::new();
        self.dependencies_apply(|dependency| {
            dependencies.push(dependency.info());
            true
        })?;
        Ok(dependencies)
    }

    /// Copies every include.
    pub fn includes(&self) -> IndexStoreResult<Vec<IncludeInfo>> {
        let mut includes = Vec::new();
        self.includes_apply(|include| {
            includes.push(include.info());
            true
        })?;
        Ok(includes)
    }

    /// Copies the unit's metadata, dependencies and includes.
    pub fn info(&self) -> IndexStoreResult<UnitInfo> {
        Ok(UnitInfo {
            name: self.name.clone(),
            provider_identifier: self.provider_identifier(),
            provider_version: self.provider_version(),
            modification_time: self.modification_time(),
            is_system_unit: self.is_system_unit(),
            is_module_unit: self.is_module_unit(),
            is_debug_compilation: self.is_debug_compilation(),
            main_file: self.has_main_file().then(|| self.main_file()),
            module_name: self.module_name(),
            working_dir: self.working_dir(),
            output_file: self.output_file(),
            sysroot_path: self.sysroot_path(),
            target: self.target(),
            dependencies: self.dependencies()?,
            includes: self.includes()?,
        })
    }
}

impl Drop for UnitReader<'_> {
    fn drop(&mut self) {
        // SAFETY: disposed exactly once, here.
        unsafe { (self.library().functions().unit_reader_dispose)(self.raw) };
    }
}

impl fmt::Debug for UnitReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitReader")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A dependency of a unit on another unit, a record or a file.
#[derive(Clone, Copy)]
pub struct UnitDependency<'a> {
    library: &'a IndexStoreLibrary,
    raw: RawUnitDependency,
}

impl<'a> UnitDependency<'a> {
    fn new(library: &'a IndexStoreLibrary, raw: RawUnitDependency) -> Self {
        Self { library, raw }
    }

    /// Raw kind value.
    #[must_use]
    pub fn raw_kind(&self) -> u32 {
        // SAFETY: live dependency view.
        unsafe { (self.library.functions().unit_dependency_get_kind)(self.raw) }
    }

    /// Kind, or `None` for values this crate does not know.
    #[must_use]
    pub fn kind(&self) -> Option<DependencyKind> {
        let raw = self.raw_kind();
        let kind = DependencyKind::from_raw(raw);
        if kind.is_none() {
            warn!(what = "unit dependency kind", raw, "unknown wire value");
        }
        kind
    }

    /// True for dependencies on system files.
    #[must_use]
    pub fn is_system(&self) -> bool {
        // SAFETY: live dependency view.
        unsafe { (self.library.functions().unit_dependency_is_system)(self.raw) }
    }

    /// Path of the file.
    #[must_use]
    pub fn file_path(&self) -> String {
        // SAFETY: live dependency view; copied immediately.
        unsafe { copy_string_ref((self.library.functions().unit_dependency_get_filepath)(self.raw)) }
    }

    /// Module name.
    #[must_use]
    pub fn module_name(&self) -> String {
        // SAFETY: as above.
        unsafe {
            copy_string_ref((self.library.functions().unit_dependency_get_modulename)(self.raw))
        }
    }

    /// Name of the unit or record depended on.
    #[must_use]
    pub fn name(&self) -> String {
        // SAFETY: as above.
        unsafe { copy_string_ref((self.library.functions().unit_dependency_get_name)(self.raw)) }
    }

    /// Copies the dependency.
    #[must_use]
    pub fn info(&self) -> DependencyInfo {
        DependencyInfo {
            kind: self.kind(),
            raw_kind: self.raw_kind(),
            is_system: self.is_system(),
            file_path: self.file_path(),
            module_name: self.module_name(),
            name: self.name(),
        }
    }
}

impl fmt::Debug for UnitDependency<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UnitDependency").field(&self.raw).finish()
    }
}

/// An include directive recorded in a unit.
#[derive(Clone, Copy)]
pub struct UnitInclude<'a> {
    library: &'a IndexStoreLibrary,
    raw: RawUnitInclude,
}

impl<'a> UnitInclude<'a> {
    fn new(library: &'a IndexStoreLibrary, raw: RawUnitInclude) -> Self {
        Self { library, raw }
    }

    /// File containing the directive.
    #[must_use]
    pub fn source_path(&self) -> String {
        // SAFETY: live include view; copied immediately.
        unsafe { copy_string_ref((self.library.functions().unit_include_get_source_path)(self.raw)) }
    }

    /// File that was included.
    #[must_use]
    pub fn target_path(&self) -> String {
        // SAFETY: as above.
        unsafe { copy_string_ref((self.library.functions().unit_include_get_target_path)(self.raw)) }
    }

    /// Line of the directive.
    #[must_use]
    pub fn source_line(&self) -> u32 {
        // SAFETY: live include view.
        unsafe { (self.library.functions().unit_include_get_source_line)(self.raw) }
    }

    /// Copies the include.
    #[must_use]
    pub fn info(&self) -> IncludeInfo {
        IncludeInfo {
            source_path: self.source_path(),
            target_path: self.target_path(),
            source_line: self.source_line(),
        }
    }
}

impl fmt::Debug for UnitInclude<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UnitInclude").field(&self.raw).finish()
    }
}

/// Owned copy of a dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyInfo {
    /// Kind, if known.
    pub kind: Option<DependencyKind>,
    /// Raw kind value.
    pub raw_kind: u32,
    /// True for system dependencies.
    pub is_system: bool,
    /// File path.
    pub file_path: String,
    /// Module name.
    pub module_name: String,
    /// Unit or record name.
    pub name: String,
}

/// Owned copy of an include.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeInfo {
    /// Including file.
    pub source_path: String,
    /// Included file.
    pub target_path: String,
    /// Line of the directive.
    pub source_line: u32,
}

/// Owned copy of a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitInfo {
    /// Unit name.
    pub name: String,
    /// Producing tool.
    pub provider_identifier: String,
    /// Producing tool version.
    pub provider_version: String,
    /// Modification time.
    pub modification_time: Timestamp,
    /// System unit flag.
    pub is_system_unit: bool,
    /// Module unit flag.
    pub is_module_unit: bool,
    /// Debug compilation flag.
    pub is_debug_compilation: bool,
    /// Main file, if the unit has one.
    pub main_file: Option<String>,
    /// Module name.
    pub module_name: String,
    /// Working directory.
    pub working_dir: String,
    /// Output file.
    pub output_file: String,
    /// SDK root.
    pub sysroot_path: String,
    /// Target triple.
    pub target: String,
    /// Dependencies, in store order.
    pub dependencies: Vec<DependencyInfo>,
    /// Includes, in store order.
    pub includes: Vec<IncludeInfo>,
}
