//! The store handle.

use crate::error::{IndexStoreError, IndexStoreResult};
use crate::error_slot::ErrorSlot;
use crate::events::UnitEventFeed;
use crate::library::IndexStoreLibrary;
use crate::options::CreationOptions;
use crate::record::RecordReader;
use crate::string::{copy_string_ref, path_to_c_string, to_c_string};
use crate::traversal::{drive, ApplyOutcome, Applier};
use crate::types::Timestamp;
use crate::unit::UnitReader;
use indexstore_abi::{RawStore, StringRef};
use parking_lot::Mutex;
use std::ffi::c_uint;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Initial buffer size for unit names.
const UNIT_NAME_CAPACITY: usize = 256;

/// An open index store.
///
/// Readers opened from a store borrow it and cannot outlive it. The store is
/// disposed exactly once, when it is dropped or closed.
pub struct Store {
    library: IndexStoreLibrary,
    raw: RawStore,
    path: PathBuf,
    pub(crate) event_feed: Mutex<Option<Arc<UnitEventFeed>>>,
}

// SAFETY: the library synchronises store-level operations internally; the
// handle itself is never mutated after creation.
unsafe impl Send for Store {}
unsafe impl Sync for Store {}

impl Store {
    /// Opens the store at `path`.
    pub fn open(library: &IndexStoreLibrary, path: impl AsRef<Path>) -> IndexStoreResult<Self> {
        Self::open_impl(library, path.as_ref(), None)
    }

    /// Opens the store at `path` with creation options.
    pub fn open_with_options(
        library: &IndexStoreLibrary,
        path: impl AsRef<Path>,
        options: &CreationOptions,
    ) -> IndexStoreResult<Self> {
        Self::open_impl(library, path.as_ref(), Some(options))
    }

    fn open_impl(
        library: &IndexStoreLibrary,
        path: &Path,
        options: Option<&CreationOptions>,
    ) -> IndexStoreResult<Self> {
        if let Some(options) = options {
            if !options.library().same_library(library) {
                return Err(IndexStoreError::invalid_argument(
                    "creation options were created by a different library",
                ));
            }
        }
        let c_path = path_to_c_string(path)?;
        let functions = library.functions();
        let mut error = ErrorSlot::new(library);

        // SAFETY: the path and options outlive the call.
        let (operation, raw) = unsafe {
            match options {
                Some(options) => (
                    "store_create_with_options",
                    (functions.store_create_with_options)(
                        c_path.as_ptr(),
                        options.raw(),
                        error.as_out(),
                    ),
                ),
                None => (
                    "store_create",
                    (functions.store_create)(c_path.as_ptr(), error.as_out()),
                ),
            }
        };
        if raw.is_null() {
            return Err(error.into_error(operation));
        }

        debug!(path = %path.display(), "opened index store");
        Ok(Self {
            library: library.clone(),
            raw,
            path: path.to_path_buf(),
            event_feed: Mutex::new(None),
        })
    }

    /// Path the store was opened at.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The library the store was opened through.
    #[must_use]
    pub fn library(&self) -> &IndexStoreLibrary {
        &self.library
    }

    pub(crate) fn raw(&self) -> RawStore {
        self.raw
    }

    /// Closes the store.
    pub fn close(self) {
        drop(self);
    }

    /// Opens a record reader on this store.
    pub fn record_reader(&self, record_name: &str) -> IndexStoreResult<RecordReader<'_>> {
        RecordReader::open(self, record_name)
    }

    /// Opens a unit reader on this store.
    pub fn unit_reader(&self, unit_name: &str) -> IndexStoreResult<UnitReader<'_>> {
        UnitReader::open(self, unit_name)
    }

    /// Removes a unit from the store.
    pub fn discard_unit(&self, unit_name: &str) -> IndexStoreResult<()> {
        let c_name = to_c_string(unit_name)?;
        // SAFETY: live store; the name outlives the call.
        unsafe { (self.library.functions().store_discard_unit)(self.raw, c_name.as_ptr()) };
        debug!(unit = unit_name, "discarded unit");
        Ok(())
    }

    /// Removes a record from the store.
    pub fn discard_record(&self, record_name: &str) -> IndexStoreResult<()> {
        let c_name = to_c_string(record_name)?;
        // SAFETY: live store; the name outlives the call.
        unsafe { (self.library.functions().store_discard_record)(self.raw, c_name.as_ptr()) };
        debug!(record = record_name, "discarded record");
        Ok(())
    }

    /// Removes data no longer referenced by any unit.
    pub fn purge_stale_data(&self) {
        // SAFETY: live store.
        unsafe { (self.library.functions().store_purge_stale_data)(self.raw) };
        debug!(path = %self.path.display(), "purged stale data");
    }

    /// Returns the name of the unit that an output file was recorded under.
    pub fn unit_name_from_output_path(
        &self,
        output_path: impl AsRef<Path>,
    ) -> IndexStoreResult<String> {
        const OPERATION: &str = "store_get_unit_name_from_output_path";
        let c_path = path_to_c_string(output_path.as_ref())?;
        let function = self.library.functions().store_get_unit_name_from_output_path;

        let mut buffer = vec![0u8; UNIT_NAME_CAPACITY];
        for _ in 0..2 {
            // SAFETY: `buffer` is writable for `buffer.len()` bytes.
            let length = unsafe {
                function(
                    self.raw,
                    c_path.as_ptr(),
                    buffer.as_mut_ptr().cast(),
                    buffer.len(),
                )
            };
            if length < buffer.len() {
                buffer.truncate(length);
                return Ok(String::from_utf8_lossy(&buffer).into_owned());
            }
            buffer.resize(length + 1, 0);
        }
        Err(IndexStoreError::protocol_violation(
            OPERATION,
            "name length grew between calls",
        ))
    }

    /// Returns the modification time of a unit.
    pub fn unit_modification_time(&self, unit_name: &str) -> IndexStoreResult<Timestamp> {
        const OPERATION: &str = "store_get_unit_modification_time";
        let c_name = to_c_string(unit_name)?;
        let mut seconds = 0i64;
        let mut nanoseconds = 0i64;
        let mut error = ErrorSlot::new(&self.library);

        // SAFETY: all out-parameters are valid for writes.
        let failed = unsafe {
            (self.library.functions().store_get_unit_modification_time)(
                self.raw,
                c_name.as_ptr(),
                &mut seconds,
                &mut nanoseconds,
                error.as_out(),
            )
        };
        if failed || error.is_set() {
            return Err(error.into_error(OPERATION));
        }
        Ok(Timestamp::new(seconds, nanoseconds))
    }

    /// Calls `applier` with the name of each unit until it returns false.
    ///
    /// With `sorted`, names are delivered in name order; otherwise in the
    /// store's order.
    pub fn units_apply<F>(&self, sorted: bool, mut applier: F) -> IndexStoreResult<ApplyOutcome>
    where
        F: FnMut(&str) -> bool,
    {
        let functions = self.library.functions();
        let raw = self.raw;
        let sorted = c_uint::from(sorted);
        drive(
            &self.library,
            "store_units_apply",
            |name: StringRef| {
                // SAFETY: the name is valid for the duration of the callback.
                let name = unsafe { copy_string_ref(name) };
                applier(&name)
            },
            |callback| unsafe {
                match callback {
                    Applier::Block { functions: blocks, block } => {
                        (blocks.store_units_apply)(raw, sorted, block)
                    }
                    Applier::Function { context, function } => {
                        (functions.store_units_apply_f)(raw, sorted, context, function)
                    }
                }
            },
        )
    }

    /// Collects every unit name.
    pub fn unit_names(&self, sorted: bool) -> IndexStoreResult<Vec<String>> {
        let mut names = Vec::new();
        self.units_apply(sorted, |name| {
            names.push(name.to_owned());
            true
        })?;
        Ok(names)
    }

    /// Collects unit names, skipping system units unless `include_system`.
    ///
    /// Units that cannot be read are skipped with a warning.
    pub fn unit_names_filtered(&self, include_system: bool) -> IndexStoreResult<Vec<String>> {
        let names = self.unit_names(false)?;
        if include_system {
            return Ok(names);
        }
        let mut kept = Vec::with_capacity(names.len());
        for name in names {
            match self.unit_reader(&name) {
                Ok(reader) if reader.is_system_unit() => {}
                Ok(_) => kept.push(name),
                Err(err) => warn!(unit = %name, error = %err, "skipping unreadable unit"),
            }
        }
        Ok(kept)
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        // SAFETY: the handle is disposed exactly once, here; readers borrow
        // the store and are gone already.
        unsafe { (self.library.functions().store_dispose)(self.raw) };
        debug!(path = %self.path.display(), "closed index store");
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("library", &self.library.path())
            .finish()
    }
}
