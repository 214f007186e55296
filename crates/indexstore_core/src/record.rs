//! Record readers: symbols and occurrences of one compiled file.

use crate::error::{IndexStoreError, IndexStoreResult};
use crate::error_slot::ErrorSlot;
use crate::library::IndexStoreLibrary;
use crate::occurrence::{Occurrence, OccurrenceInfo};
use crate::store::Store;
use crate::string::to_c_string;
use crate::symbol::{Symbol, SymbolInfo};
use crate::traversal::{drive, drive_search, ApplyOutcome, Applier, SearchCallbacks, SearchVerdict};
use indexstore_abi::{RawOccurrence, RawRecordReader, RawSymbol};
use std::fmt;
use tracing::debug;

/// Reads one record of a store.
///
/// Symbol views handed out by a reader are only valid while it is open.
pub struct RecordReader<'s> {
    store: &'s Store,
    raw: RawRecordReader,
    name: String,
}

impl<'s> RecordReader<'s> {
    /// Opens the record named `record_name`.
    pub fn open(store: &'s Store, record_name: &str) -> IndexStoreResult<Self> {
        let c_name = to_c_string(record_name)?;
        let library = store.library();
        let mut error = ErrorSlot::new(library);
        // SAFETY: live store; the name outlives the call.
        let raw = unsafe {
            (library.functions().record_reader_create)(store.raw(), c_name.as_ptr(), error.as_out())
        };
        if raw.is_null() {
            return Err(error.into_error("record_reader_create"));
        }
        debug!(record = record_name, "opened record reader");
        Ok(Self {
            store,
            raw,
            name: record_name.to_owned(),
        })
    }

    /// Name the record was opened with.
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

    /// Calls `applier` with each symbol of the record until it returns false.
    ///
    /// Symbols are read without populating the reader's cache.
    pub fn symbols_apply<F>(&self, mut applier: F) -> IndexStoreResult<ApplyOutcome>
    where
        F: FnMut(Symbol<'_>) -> bool,
    {
        let library = self.library();
        self.symbols_apply_raw(true, |raw| applier(Symbol::new(library, raw)))
    }

    fn symbols_apply_raw<F>(&self, nocache: bool, applier: F) -> IndexStoreResult<ApplyOutcome>
    where
        F: FnMut(RawSymbol) -> bool,
    {
        let library = self.library();
        let functions = library.functions();
        let raw = self.raw;
        drive(library, "record_reader_symbols_apply", applier, |callback| unsafe {
            match callback {
                Applier::Block { functions: blocks, block } => {
                    (blocks.record_reader_symbols_apply)(raw, nocache, block)
                }
                Applier::Function { context, function } => {
                    (functions.record_reader_symbols_apply_f)(raw, nocache, context, function)
                }
            }
        })
    }

    /// Lists every symbol through the reader's cache.
    ///
    /// The returned views stay valid for as long as the reader is open, so
    /// they can be passed to [`RecordReader::occurrences_of_symbols_apply`].
    pub fn cached_symbols(&self) -> IndexStoreResult<Vec<Symbol<'_>>> {
        let library = self.library();
        let mut symbols = Vec::new();
        self.symbols_apply_raw(false, |raw| {
            symbols.push(Symbol::new(library, raw));
            true
        })?;
        Ok(symbols)
    }

    /// Two-stage symbol search.
    ///
    /// `filter` sees every symbol and decides acceptance and whether to
    /// stop; `receiver` gets each accepted symbol.
    pub fn search_symbols<P, R>(&self, mut filter: P, mut receiver: R) -> IndexStoreResult<ApplyOutcome>
    where
        P: FnMut(&Symbol<'_>) -> SearchVerdict,
        R: FnMut(Symbol<'_>),
    {
        let library = self.library();
        let functions = library.functions();
        let raw = self.raw;
        drive_search(
            library,
            "record_reader_search_symbols",
            |symbol: RawSymbol| filter(&Symbol::new(library, symbol)),
            |symbol: RawSymbol| receiver(Symbol::new(library, symbol)),
            |callbacks| unsafe {
                match callbacks {
                    SearchCallbacks::Block {
                        functions: blocks,
                        filter,
                        receiver,
                    } => (blocks.record_reader_search_symbols)(raw, filter, receiver),
                    SearchCallbacks::Function {
                        context,
                        filter,
                        receiver,
                    } => (functions.record_reader_search_symbols_f)(
                        raw, context, filter, context, receiver,
                    ),
                }
            },
        )
    }

    /// Calls `applier` with each occurrence in source order until it
    /// returns false.
    pub fn occurrences_apply<F>(&self, mut applier: F) -> IndexStoreResult<ApplyOutcome>
    where
        F: FnMut(Occurrence<'_>) -> bool,
    {
        let library = self.library();
        let functions = library.functions();
        let raw = self.raw;
        drive(
            library,
            "record_reader_occurrences_apply",
            |occurrence: RawOccurrence| applier(Occurrence::new(library, occurrence)),
            |callback| unsafe {
                match callback {
                    Applier::Block { functions: blocks, block } => {
                        (blocks.record_reader_occurrences_apply)(raw, block)
                    }
                    Applier::Function { context, function } => {
                        (functions.record_reader_occurrences_apply_f)(raw, context, function)
                    }
                }
            },
        )
    }

    /// Like [`RecordReader::occurrences_apply`], restricted to occurrences on
    /// lines `line_start .. line_start + line_count`.
    ///
    /// The range is passed to the store as given.
    pub fn occurrences_in_line_range_apply<F>(
        &self,
        line_start: u32,
        line_count: u32,
        mut applier: F,
    ) -> IndexStoreResult<ApplyOutcome>
    where
        F: FnMut(Occurrence<'_>) -> bool,
    {
        let library = self.library();
        let functions = library.functions();
        let raw = self.raw;
        drive(
            library,
            "record_reader_occurrences_in_line_range_apply",
            |occurrence: RawOccurrence| applier(Occurrence::new(library, occurrence)),
            |callback| unsafe {
                match callback {
                    Applier::Block { functions: blocks, block } => {
                        (blocks.record_reader_occurrences_in_line_range_apply)(
                            raw, line_start, line_count, block,
                        )
                    }
                    Applier::Function { context, function } => {
                        (functions.record_reader_occurrences_in_line_range_apply_f)(
                            raw, line_start, line_count, context, function,
                        )
                    }
                }
            },
        )
    }

    /// Calls `applier` with each occurrence whose symbol is in `symbols` and
    /// that has a relation to a symbol in `related`. An empty slice places no
    /// restriction, so two empty slices select every occurrence.
    ///
    /// The symbols must come from this reader, e.g. from
    /// [`RecordReader::cached_symbols`].
    pub fn occurrences_of_symbols_apply<F>(
        &self,
        symbols: &[Symbol<'_>],
        related: &[Symbol<'_>],
        mut applier: F,
    ) -> IndexStoreResult<ApplyOutcome>
    where
        F: FnMut(Occurrence<'_>) -> bool,
    {
        let library = self.library();
        if symbols
            .iter()
            .chain(related)
            .any(|symbol| !symbol.library().same_library(library))
        {
            return Err(IndexStoreError::invalid_argument(
                "symbols were read through a different library",
            ));
        }
        let mut symbols: Vec<RawSymbol> = symbols.iter().map(Symbol::raw).collect();
        let mut related: Vec<RawSymbol> = related.iter().map(Symbol::raw).collect();
        let (symbols_ptr, symbols_len) = (symbols.as_mut_ptr(), symbols.len());
        let (related_ptr, related_len) = (related.as_mut_ptr(), related.len());

        let functions = library.functions();
        let raw = self.raw;
        drive(
            library,
            "record_reader_occurrences_of_symbols_apply",
            |occurrence: RawOccurrence| applier(Occurrence::new(library, occurrence)),
            |callback| unsafe {
                match callback {
                    Applier::Block { functions: blocks, block } => {
                        (blocks.record_reader_occurrences_of_symbols_apply)(
                            raw,
                            symbols_ptr,
                            symbols_len,
                            related_ptr,
                            related_len,
                            block,
                        )
                    }
                    Applier::Function { context, function } => {
                        (functions.record_reader_occurrences_of_symbols_apply_f)(
                            raw,
                            symbols_ptr,
                            symbols_len,
                            related_ptr,
                            related_len,
                            context,
                            function,
                        )
                    }
                }
            },
        )
    }

    /// Copies every symbol.
    pub fn symbols(&self) -> IndexStoreResult<Vec<SymbolInfo>> {
        let mut symbols = Vec::new();
        self.symbols_apply(|symbol| {
            symbols.push(symbol.info());
            true
        })?;
        Ok(symbols)
    }

    /// Copies every occurrence, relations included.
    pub fn occurrences(&self) -> IndexStoreResult<Vec<OccurrenceInfo>> {
        let mut occurrences = Vec::new();
        let mut failure = None;
        self.occurrences_apply(|occurrence| match occurrence.info() {
            Ok(info) => {
                occurrences.push(info);
                true
            }
            Err(err) => {
                failure = Some(err);
                false
            }
        })?;
        match failure {
            Some(err) => Err(err),
            None => Ok(occurrences),
        }
    }
}

impl Drop for RecordReader<'_> {
    fn drop(&mut self) {
        // SAFETY: disposed exactly once, here.
        unsafe { (self.library().functions().record_reader_dispose)(self.raw) };
    }
}

impl fmt::Debug for RecordReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordReader")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
