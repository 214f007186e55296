//! The C entry points of the fake library.
//!
//! Every function here has the signature the catalog declares for its
//! operation. Closure-form operations read the block's invoke pointer from
//! its header and call it with the block as first argument.

use crate::fake::{reported_format_version, reported_version, stats_for, HandleStats};
use crate::fixtures::{unit_name_for_output, ListenFault};
use crate::handles::{
    report_error, FakeDependency, FakeError, FakeEvent, FakeInclude, FakeNotification,
    FakeOccurrence, FakeOptions, FakeRecordReader, FakeRelation, FakeStore, FakeSymbol,
    FakeUnitReader, RegisteredHandler,
};
use indexstore_abi::functions::{
    BlockPtr, ContextApplierFn, EventHandlerFn, FinalizerFn, SearchFilterFn, SearchReceiverFn,
};
use indexstore_abi::{
    BlockLiteralHeader, ListenOptions, RawCreationOptions, RawError, RawOccurrence,
    RawRecordReader, RawStore, RawSymbol, RawSymbolRelation, RawUnitDependency, RawUnitEvent,
    RawUnitEventNotification, RawUnitInclude, RawUnitReader, StringRef,
};
use std::ffi::{c_char, c_uint, c_void, CStr};
use std::path::PathBuf;

macro_rules! export_table {
    ($(#[$meta:meta])* $lookup:ident { $($name:ident,)+ }) => {
        $(#[$meta])*
        pub(crate) fn $lookup(name: &str) -> Option<*const c_void> {
            $(
                if name == stringify!($name) {
                    return Some($name as *const c_void);
                }
            )+
            None
        }
    };
}

export_table! {
    /// Address of a context-pointer or plain operation.
    lookup {
        error_get_description,
        error_dispose,
        format_version,
        version,
        creation_options_create,
        creation_options_dispose,
        creation_options_add_prefix_mapping,
        store_create,
        store_create_with_options,
        store_dispose,
        store_units_apply_f,
        unit_event_notification_get_events_count,
        unit_event_notification_get_event,
        unit_event_notification_is_initial,
        unit_event_get_kind,
        unit_event_get_unit_name,
        store_set_unit_event_handler_f,
        store_start_unit_event_listening,
        store_stop_unit_event_listening,
        store_discard_unit,
        store_discard_record,
        store_purge_stale_data,
        store_get_unit_name_from_output_path,
        store_get_unit_modification_time,
        symbol_get_language,
        symbol_get_kind,
        symbol_get_subkind,
        symbol_get_properties,
        symbol_get_roles,
        symbol_get_related_roles,
        symbol_get_name,
        symbol_get_usr,
        symbol_get_codegen_name,
        symbol_relation_get_roles,
        symbol_relation_get_symbol,
        occurrence_get_symbol,
        occurrence_relations_apply_f,
        occurrence_get_roles,
        occurrence_get_line_col,
        record_reader_create,
        record_reader_dispose,
        record_reader_search_symbols_f,
        record_reader_symbols_apply_f,
        record_reader_occurrences_apply_f,
        record_reader_occurrences_in_line_range_apply_f,
        record_reader_occurrences_of_symbols_apply_f,
        unit_reader_create,
        unit_reader_dispose,
        unit_reader_get_provider_identifier,
        unit_reader_get_provider_version,
        unit_reader_get_modification_time,
        unit_reader_is_system_unit,
        unit_reader_is_module_unit,
        unit_reader_is_debug_compilation,
        unit_reader_has_main_file,
        unit_reader_get_main_file,
        unit_reader_get_module_name,
        unit_reader_get_working_dir,
        unit_reader_get_output_file,
        unit_reader_get_sysroot_path,
        unit_reader_get_target,
        unit_dependency_get_kind,
        unit_dependency_is_system,
        unit_dependency_get_filepath,
        unit_dependency_get_modulename,
        unit_dependency_get_name,
        unit_include_get_source_path,
        unit_include_get_target_path,
        unit_include_get_source_line,
        unit_reader_dependencies_apply_f,
        unit_reader_includes_apply_f,
    }
}

export_table! {
    /// Address of a closure-form operation.
    lookup_block_form {
        store_units_apply,
        store_set_unit_event_handler,
        occurrence_relations_apply,
        record_reader_search_symbols,
        record_reader_symbols_apply,
        record_reader_occurrences_apply,
        record_reader_occurrences_in_line_range_apply,
        record_reader_occurrences_of_symbols_apply,
        unit_reader_dependencies_apply,
        unit_reader_includes_apply,
    }
}

/// Where an apply operation sends its items.
enum Sink<H> {
    Function(*mut c_void, ContextApplierFn<H>),
    Block(BlockPtr),
}

impl<H> Sink<H> {
    unsafe fn call(&self, item: H) -> bool {
        match self {
            Sink::Function(context, function) => function(*context, item),
            Sink::Block(block) => {
                let invoke: unsafe extern "C" fn(*mut c_void, H) -> bool = block_invoke(*block);
                invoke(*block, item)
            }
        }
    }

    /// Delivers `items` until the sink asks to stop. Returns false on a stop.
    unsafe fn apply(&self, items: impl IntoIterator<Item = H>) -> bool {
        for item in items {
            if !self.call(item) {
                return false;
            }
        }
        true
    }
}

/// Reads the invoke pointer of a block literal as a function of type `F`.
unsafe fn block_invoke<F>(block: BlockPtr) -> F {
    let header = &*block.cast::<BlockLiteralHeader>();
    std::mem::transmute_copy(&header.invoke)
}

fn string_ref(bytes: &[u8]) -> StringRef {
    StringRef::from_bytes(bytes)
}

unsafe fn c_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

unsafe fn store<'a>(raw: RawStore) -> &'a FakeStore {
    &*raw.cast::<FakeStore>()
}

unsafe fn record_reader<'a>(raw: RawRecordReader) -> &'a FakeRecordReader {
    &*raw.cast::<FakeRecordReader>()
}

unsafe fn unit_reader<'a>(raw: RawUnitReader) -> &'a FakeUnitReader {
    &*raw.cast::<FakeUnitReader>()
}

unsafe fn symbol<'a>(raw: RawSymbol) -> &'a FakeSymbol {
    &*raw.cast::<FakeSymbol>()
}

unsafe fn occurrence<'a>(raw: RawOccurrence) -> &'a FakeOccurrence {
    &*raw.cast::<FakeOccurrence>()
}

fn raw_symbol(symbol: *const FakeSymbol) -> RawSymbol {
    symbol.cast_mut().cast()
}

// Error channel and versions

unsafe extern "C" fn error_get_description(error: RawError) -> *const c_char {
    (*error.cast::<FakeError>()).description.as_ptr()
}

unsafe extern "C" fn error_dispose(error: RawError) {
    if !error.is_null() {
        drop(Box::from_raw(error.cast::<FakeError>()));
    }
}

unsafe extern "C" fn format_version() -> c_uint {
    reported_format_version()
}

unsafe extern "C" fn version() -> c_uint {
    reported_version()
}

// Creation options

unsafe extern "C" fn creation_options_create() -> RawCreationOptions {
    Box::into_raw(Box::<FakeOptions>::default()).cast()
}

unsafe extern "C" fn creation_options_dispose(options: RawCreationOptions) {
    if !options.is_null() {
        drop(Box::from_raw(options.cast::<FakeOptions>()));
    }
}

unsafe extern "C" fn creation_options_add_prefix_mapping(
    options: RawCreationOptions,
    from: *const c_char,
    to: *const c_char,
) {
    let options = &mut *options.cast::<FakeOptions>();
    options.prefix_mappings.push((c_str(from), c_str(to)));
}

// Store

unsafe fn create_store(
    path: *const c_char,
    prefix_mappings: Vec<(String, String)>,
    error: *mut RawError,
) -> RawStore {
    let dir = PathBuf::from(c_str(path));
    match FakeStore::open(&dir, prefix_mappings) {
        Ok(store) => Box::into_raw(Box::new(store)).cast(),
        Err(message) => {
            report_error(error, &stats_for(&dir), &message);
            std::ptr::null_mut()
        }
    }
}

unsafe extern "C" fn store_create(path: *const c_char, error: *mut RawError) -> RawStore {
    create_store(path, Vec::new(), error)
}

unsafe extern "C" fn store_create_with_options(
    path: *const c_char,
    options: RawCreationOptions,
    error: *mut RawError,
) -> RawStore {
    let mappings = if options.is_null() {
        Vec::new()
    } else {
        (*options.cast::<FakeOptions>()).prefix_mappings.clone()
    };
    create_store(path, mappings, error)
}

unsafe extern "C" fn store_dispose(raw: RawStore) {
    if !raw.is_null() {
        drop(Box::from_raw(raw.cast::<FakeStore>()));
    }
}

unsafe fn units_apply(raw: RawStore, sorted: c_uint, sink: Sink<StringRef>) -> bool {
    let names = store(raw).unit_names(sorted != 0);
    sink.apply(names.iter().map(|name| string_ref(name.as_bytes())))
}

unsafe extern "C" fn store_units_apply(raw: RawStore, sorted: c_uint, block: BlockPtr) -> bool {
    units_apply(raw, sorted, Sink::Block(block))
}

unsafe extern "C" fn store_units_apply_f(
    raw: RawStore,
    sorted: c_uint,
    context: *mut c_void,
    applier: ContextApplierFn<StringRef>,
) -> bool {
    units_apply(raw, sorted, Sink::Function(context, applier))
}

// Unit events

unsafe extern "C" fn unit_event_notification_get_events_count(
    notification: RawUnitEventNotification,
) -> usize {
    (*notification.cast::<FakeNotification>()).events.len()
}

unsafe extern "C" fn unit_event_notification_get_event(
    notification: RawUnitEventNotification,
    index: usize,
) -> RawUnitEvent {
    let notification = &*notification.cast::<FakeNotification>();
    match notification.events.get(index) {
        Some(event) => (event as *const FakeEvent).cast_mut().cast(),
        None => std::ptr::null_mut(),
    }
}

unsafe extern "C" fn unit_event_notification_is_initial(
    notification: RawUnitEventNotification,
) -> bool {
    (*notification.cast::<FakeNotification>()).initial
}

unsafe extern "C" fn unit_event_get_kind(event: RawUnitEvent) -> c_uint {
    (*event.cast::<FakeEvent>()).kind
}

unsafe extern "C" fn unit_event_get_unit_name(event: RawUnitEvent) -> StringRef {
    string_ref(&(*event.cast::<FakeEvent>()).unit_name)
}

unsafe extern "C" fn store_set_unit_event_handler(raw: RawStore, block: BlockPtr) {
    let store = store(raw);
    store.set_handler(RegisteredHandler::block(block, &store.stats));
}

unsafe extern "C" fn store_set_unit_event_handler_f(
    raw: RawStore,
    context: *mut c_void,
    handler: EventHandlerFn,
    finalizer: FinalizerFn,
) {
    let store = store(raw);
    store.set_handler(RegisteredHandler::function(
        context,
        handler,
        finalizer,
        &store.stats,
    ));
}

unsafe extern "C" fn store_start_unit_event_listening(
    raw: RawStore,
    options: *mut ListenOptions,
    options_size: usize,
    error: *mut RawError,
) -> bool {
    let store = store(raw);
    if options.is_null() || options_size < std::mem::size_of::<ListenOptions>() {
        report_error(error, &store.stats, "invalid unit event listen options");
        return false;
    }
    let fault = store.listen_fault();
    if fault == ListenFault::FailWithoutError {
        return false;
    }
    match store.start_listening((*options).wait_initial_sync) {
        Ok(()) => {
            if fault == ListenFault::SucceedWithError {
                report_error(error, &store.stats, "stale listener state");
            }
            true
        }
        Err(message) => {
            report_error(error, &store.stats, &message);
            false
        }
    }
}

unsafe extern "C" fn store_stop_unit_event_listening(raw: RawStore) {
    store(raw).stop_listening();
}

unsafe extern "C" fn store_discard_unit(raw: RawStore, name: *const c_char) {
    store(raw).discard_unit(&c_str(name));
}

unsafe extern "C" fn store_discard_record(raw: RawStore, name: *const c_char) {
    store(raw).discard_record(&c_str(name));
}

unsafe extern "C" fn store_purge_stale_data(raw: RawStore) {
    store(raw).purge();
}

/// Writes as much of the name as fits, NUL-terminated, and returns the full
/// length.
unsafe extern "C" fn store_get_unit_name_from_output_path(
    _raw: RawStore,
    output_path: *const c_char,
    buffer: *mut c_char,
    capacity: usize,
) -> usize {
    let name = unit_name_for_output(&c_str(output_path));
    let bytes = name.as_bytes();
    if capacity > 0 && !buffer.is_null() {
        let written = bytes.len().min(capacity - 1);
        std::ptr::copy_nonoverlapping(bytes.as_ptr().cast::<c_char>(), buffer, written);
        *buffer.add(written) = 0;
    }
    bytes.len()
}

/// Returns true if an error occurred.
unsafe extern "C" fn store_get_unit_modification_time(
    raw: RawStore,
    name: *const c_char,
    seconds: *mut i64,
    nanoseconds: *mut i64,
    error: *mut RawError,
) -> bool {
    let store = store(raw);
    let name = c_str(name);
    match store.unit(&name) {
        Some(unit) => {
            *seconds = unit.seconds;
            *nanoseconds = unit.nanoseconds;
            false
        }
        None => {
            report_error(error, &store.stats, &format!("unit not found: {name}"));
            true
        }
    }
}

// Symbols, relations, occurrences

unsafe extern "C" fn symbol_get_language(raw: RawSymbol) -> c_uint {
    symbol(raw).language
}

unsafe extern "C" fn symbol_get_kind(raw: RawSymbol) -> c_uint {
    symbol(raw).kind
}

unsafe extern "C" fn symbol_get_subkind(raw: RawSymbol) -> c_uint {
    symbol(raw).sub_kind
}

unsafe extern "C" fn symbol_get_properties(raw: RawSymbol) -> u64 {
    symbol(raw).properties
}

unsafe extern "C" fn symbol_get_roles(raw: RawSymbol) -> u64 {
    symbol(raw).roles
}

unsafe extern "C" fn symbol_get_related_roles(raw: RawSymbol) -> u64 {
    symbol(raw).related_roles
}

unsafe extern "C" fn symbol_get_name(raw: RawSymbol) -> StringRef {
    string_ref(&symbol(raw).name)
}

unsafe extern "C" fn symbol_get_usr(raw: RawSymbol) -> StringRef {
    string_ref(&symbol(raw).usr)
}

unsafe extern "C" fn symbol_get_codegen_name(raw: RawSymbol) -> StringRef {
    string_ref(&symbol(raw).codegen_name)
}

unsafe extern "C" fn symbol_relation_get_roles(raw: RawSymbolRelation) -> u64 {
    (*raw.cast::<FakeRelation>()).roles
}

unsafe extern "C" fn symbol_relation_get_symbol(raw: RawSymbolRelation) -> RawSymbol {
    raw_symbol((*raw.cast::<FakeRelation>()).symbol)
}

unsafe extern "C" fn occurrence_get_symbol(raw: RawOccurrence) -> RawSymbol {
    raw_symbol(occurrence(raw).symbol)
}

unsafe fn relations_apply(raw: RawOccurrence, sink: Sink<RawSymbolRelation>) -> bool {
    let relations = occurrence(raw).relations.iter();
    sink.apply(relations.map(|relation| (relation as *const FakeRelation).cast_mut().cast()))
}

unsafe extern "C" fn occurrence_relations_apply(raw: RawOccurrence, block: BlockPtr) -> bool {
    relations_apply(raw, Sink::Block(block))
}

unsafe extern "C" fn occurrence_relations_apply_f(
    raw: RawOccurrence,
    context: *mut c_void,
    applier: ContextApplierFn<RawSymbolRelation>,
) -> bool {
    relations_apply(raw, Sink::Function(context, applier))
}

unsafe extern "C" fn occurrence_get_roles(raw: RawOccurrence) -> u64 {
    occurrence(raw).roles
}

unsafe extern "C" fn occurrence_get_line_col(
    raw: RawOccurrence,
    line: *mut c_uint,
    column: *mut c_uint,
) {
    let occurrence = occurrence(raw);
    if !line.is_null() {
        *line = occurrence.line;
    }
    if !column.is_null() {
        *column = occurrence.column;
    }
}

// Record reader

unsafe extern "C" fn record_reader_create(
    raw: RawStore,
    name: *const c_char,
    error: *mut RawError,
) -> RawRecordReader {
    let store = store(raw);
    match FakeRecordReader::open(store, &c_str(name)) {
        Ok(reader) => Box::into_raw(Box::new(reader)).cast(),
        Err(message) => {
            report_error(error, &store.stats, &message);
            std::ptr::null_mut()
        }
    }
}

unsafe extern "C" fn record_reader_dispose(raw: RawRecordReader) {
    if !raw.is_null() {
        drop(Box::from_raw(raw.cast::<FakeRecordReader>()));
    }
}

fn occurrence_handles<'r>(
    occurrences: impl IntoIterator<Item = &'r FakeOccurrence> + 'r,
) -> impl Iterator<Item = RawOccurrence> + 'r {
    occurrences
        .into_iter()
        .map(|occurrence| (occurrence as *const FakeOccurrence).cast_mut().cast())
}

/// The filter sees every symbol; accepted ones go to the receiver. A stop
/// requested by the filter ends the search with a false result.
unsafe fn search_symbols(
    raw: RawRecordReader,
    mut filter: impl FnMut(RawSymbol, *mut bool) -> bool,
    mut receiver: impl FnMut(RawSymbol),
) -> bool {
    for symbol in &record_reader(raw).symbols {
        let symbol = raw_symbol(&**symbol);
        let mut stop = false;
        if filter(symbol, &mut stop) {
            receiver(symbol);
        }
        if stop {
            return false;
        }
    }
    true
}

unsafe extern "C" fn record_reader_search_symbols(
    raw: RawRecordReader,
    filter: BlockPtr,
    receiver: BlockPtr,
) -> bool {
    let filter_invoke: unsafe extern "C" fn(*mut c_void, RawSymbol, *mut bool) -> bool =
        block_invoke(filter);
    let receiver_invoke: unsafe extern "C" fn(*mut c_void, RawSymbol) = block_invoke(receiver);
    search_symbols(
        raw,
        |symbol, stop| filter_invoke(filter, symbol, stop),
        |symbol| receiver_invoke(receiver, symbol),
    )
}

unsafe extern "C" fn record_reader_search_symbols_f(
    raw: RawRecordReader,
    filter_context: *mut c_void,
    filter: SearchFilterFn,
    receiver_context: *mut c_void,
    receiver: SearchReceiverFn,
) -> bool {
    search_symbols(
        raw,
        |symbol, stop| filter(filter_context, symbol, stop),
        |symbol| receiver(receiver_context, symbol),
    )
}

unsafe fn symbols_apply(raw: RawRecordReader, sink: Sink<RawSymbol>) -> bool {
    let symbols = record_reader(raw).symbols.iter();
    sink.apply(symbols.map(|symbol| raw_symbol(&**symbol)))
}

unsafe extern "C" fn record_reader_symbols_apply(
    raw: RawRecordReader,
    _nocache: bool,
    block: BlockPtr,
) -> bool {
    symbols_apply(raw, Sink::Block(block))
}

unsafe extern "C" fn record_reader_symbols_apply_f(
    raw: RawRecordReader,
    _nocache: bool,
    context: *mut c_void,
    applier: ContextApplierFn<RawSymbol>,
) -> bool {
    symbols_apply(raw, Sink::Function(context, applier))
}

unsafe fn occurrences_apply(raw: RawRecordReader, sink: Sink<RawOccurrence>) -> bool {
    sink.apply(occurrence_handles(&record_reader(raw).occurrences))
}

unsafe extern "C" fn record_reader_occurrences_apply(raw: RawRecordReader, block: BlockPtr) -> bool {
    occurrences_apply(raw, Sink::Block(block))
}

unsafe extern "C" fn record_reader_occurrences_apply_f(
    raw: RawRecordReader,
    context: *mut c_void,
    applier: ContextApplierFn<RawOccurrence>,
) -> bool {
    occurrences_apply(raw, Sink::Function(context, applier))
}

/// Lines `line_start .. line_start + line_count`.
unsafe fn occurrences_in_line_range_apply(
    raw: RawRecordReader,
    line_start: c_uint,
    line_count: c_uint,
    sink: Sink<RawOccurrence>,
) -> bool {
    let reader = record_reader(raw);
    HandleStats::bump(&reader.stats.line_range_queries);
    // Half-open, so a zero count selects nothing.
    let line_end = line_start.saturating_add(line_count);
    let in_range = reader
        .occurrences
        .iter()
        .filter(|occurrence| occurrence.line >= line_start && occurrence.line < line_end);
    sink.apply(occurrence_handles(in_range))
}

unsafe extern "C" fn record_reader_occurrences_in_line_range_apply(
    raw: RawRecordReader,
    line_start: c_uint,
    line_count: c_uint,
    block: BlockPtr,
) -> bool {
    occurrences_in_line_range_apply(raw, line_start, line_count, Sink::Block(block))
}

unsafe extern "C" fn record_reader_occurrences_in_line_range_apply_f(
    raw: RawRecordReader,
    line_start: c_uint,
    line_count: c_uint,
    context: *mut c_void,
    applier: ContextApplierFn<RawOccurrence>,
) -> bool {
    occurrences_in_line_range_apply(raw, line_start, line_count, Sink::Function(context, applier))
}

unsafe fn symbol_slice<'a>(symbols: *mut RawSymbol, count: usize) -> &'a [RawSymbol] {
    if symbols.is_null() || count == 0 {
        return &[];
    }
    std::slice::from_raw_parts(symbols, count)
}

/// Occurrences of one of `symbols` that are related to one of `related`.
/// An empty list matches everything. Symbols are matched by handle identity.
unsafe fn occurrences_of_symbols_apply(
    raw: RawRecordReader,
    symbols: &[RawSymbol],
    related: &[RawSymbol],
    sink: Sink<RawOccurrence>,
) -> bool {
    let matching = record_reader(raw).occurrences.iter().filter(|occurrence| {
        let of_symbol = symbols.is_empty() || symbols.contains(&raw_symbol(occurrence.symbol));
        let has_related = related.is_empty()
            || occurrence
                .relations
                .iter()
                .any(|relation| related.contains(&raw_symbol(relation.symbol)));
        of_symbol && has_related
    });
    sink.apply(occurrence_handles(matching))
}

unsafe extern "C" fn record_reader_occurrences_of_symbols_apply(
    raw: RawRecordReader,
    symbols: *mut RawSymbol,
    symbols_count: usize,
    related: *mut RawSymbol,
    related_count: usize,
    block: BlockPtr,
) -> bool {
    occurrences_of_symbols_apply(
        raw,
        symbol_slice(symbols, symbols_count),
        symbol_slice(related, related_count),
        Sink::Block(block),
    )
}

unsafe extern "C" fn record_reader_occurrences_of_symbols_apply_f(
    raw: RawRecordReader,
    symbols: *mut RawSymbol,
    symbols_count: usize,
    related: *mut RawSymbol,
    related_count: usize,
    context: *mut c_void,
    applier: ContextApplierFn<RawOccurrence>,
) -> bool {
    occurrences_of_symbols_apply(
        raw,
        symbol_slice(symbols, symbols_count),
        symbol_slice(related, related_count),
        Sink::Function(context, applier),
    )
}

// Unit reader

unsafe extern "C" fn unit_reader_create(
    raw: RawStore,
    name: *const c_char,
    error: *mut RawError,
) -> RawUnitReader {
    let store = store(raw);
    match FakeUnitReader::open(store, &c_str(name)) {
        Ok(reader) => Box::into_raw(Box::new(reader)).cast(),
        Err(message) => {
            report_error(error, &store.stats, &message);
            std::ptr::null_mut()
        }
    }
}

unsafe extern "C" fn unit_reader_dispose(raw: RawUnitReader) {
    if !raw.is_null() {
        drop(Box::from_raw(raw.cast::<FakeUnitReader>()));
    }
}

unsafe extern "C" fn unit_reader_get_provider_identifier(raw: RawUnitReader) -> StringRef {
    string_ref(&unit_reader(raw).provider_identifier)
}

unsafe extern "C" fn unit_reader_get_provider_version(raw: RawUnitReader) -> StringRef {
    string_ref(&unit_reader(raw).provider_version)
}

unsafe extern "C" fn unit_reader_get_modification_time(
    raw: RawUnitReader,
    seconds: *mut i64,
    nanoseconds: *mut i64,
) {
    let reader = unit_reader(raw);
    *seconds = reader.seconds;
    *nanoseconds = reader.nanoseconds;
}

unsafe extern "C" fn unit_reader_is_system_unit(raw: RawUnitReader) -> bool {
    unit_reader(raw).is_system
}

unsafe extern "C" fn unit_reader_is_module_unit(raw: RawUnitReader) -> bool {
    unit_reader(raw).is_module
}

unsafe extern "C" fn unit_reader_is_debug_compilation(raw: RawUnitReader) -> bool {
    unit_reader(raw).is_debug
}

unsafe extern "C" fn unit_reader_has_main_file(raw: RawUnitReader) -> bool {
    unit_reader(raw).main_file.is_some()
}

unsafe extern "C" fn unit_reader_get_main_file(raw: RawUnitReader) -> StringRef {
    match &unit_reader(raw).main_file {
        Some(path) => string_ref(path),
        None => StringRef::null(),
    }
}

unsafe extern "C" fn unit_reader_get_module_name(raw: RawUnitReader) -> StringRef {
    string_ref(&unit_reader(raw).module_name)
}

unsafe extern "C" fn unit_reader_get_working_dir(raw: RawUnitReader) -> StringRef {
    string_ref(&unit_reader(raw).working_dir)
}

unsafe extern "C" fn unit_reader_get_output_file(raw: RawUnitReader) -> StringRef {
    string_ref(&unit_reader(raw).output_file)
}

unsafe extern "C" fn unit_reader_get_sysroot_path(raw: RawUnitReader) -> StringRef {
    string_ref(&unit_reader(raw).sysroot_path)
}

unsafe extern "C" fn unit_reader_get_target(raw: RawUnitReader) -> StringRef {
    string_ref(&unit_reader(raw).target)
}

unsafe fn dependency<'a>(raw: RawUnitDependency) -> &'a FakeDependency {
    &*raw.cast::<FakeDependency>()
}

unsafe fn include<'a>(raw: RawUnitInclude) -> &'a FakeInclude {
    &*raw.cast::<FakeInclude>()
}

unsafe extern "C" fn unit_dependency_get_kind(raw: RawUnitDependency) -> c_uint {
    dependency(raw).kind
}

unsafe extern "C" fn unit_dependency_is_system(raw: RawUnitDependency) -> bool {
    dependency(raw).is_system
}

unsafe extern "C" fn unit_dependency_get_filepath(raw: RawUnitDependency) -> StringRef {
    string_ref(&dependency(raw).file_path)
}

unsafe extern "C" fn unit_dependency_get_modulename(raw: RawUnitDependency) -> StringRef {
    string_ref(&dependency(raw).module_name)
}

unsafe extern "C" fn unit_dependency_get_name(raw: RawUnitDependency) -> StringRef {
    string_ref(&dependency(raw).name)
}

unsafe extern "C" fn unit_include_get_source_path(raw: RawUnitInclude) -> StringRef {
    string_ref(&include(raw).source_path)
}

unsafe extern "C" fn unit_include_get_target_path(raw: RawUnitInclude) -> StringRef {
    string_ref(&include(raw).target_path)
}

unsafe extern "C" fn unit_include_get_source_line(raw: RawUnitInclude) -> c_uint {
    include(raw).source_line
}

unsafe fn dependencies_apply(raw: RawUnitReader, sink: Sink<RawUnitDependency>) -> bool {
    let dependencies = unit_reader(raw).dependencies.iter();
    sink.apply(dependencies.map(|dep| (dep as *const FakeDependency).cast_mut().cast()))
}

unsafe fn includes_apply(raw: RawUnitReader, sink: Sink<RawUnitInclude>) -> bool {
    let includes = unit_reader(raw).includes.iter();
    sink.apply(includes.map(|include| (include as *const FakeInclude).cast_mut().cast()))
}

unsafe extern "C" fn unit_reader_dependencies_apply(raw: RawUnitReader, block: BlockPtr) -> bool {
    dependencies_apply(raw, Sink::Block(block))
}

unsafe extern "C" fn unit_reader_includes_apply(raw: RawUnitReader, block: BlockPtr) -> bool {
    includes_apply(raw, Sink::Block(block))
}

unsafe extern "C" fn unit_reader_dependencies_apply_f(
    raw: RawUnitReader,
    context: *mut c_void,
    applier: ContextApplierFn<RawUnitDependency>,
) -> bool {
    dependencies_apply(raw, Sink::Function(context, applier))
}

unsafe extern "C" fn unit_reader_includes_apply_f(
    raw: RawUnitReader,
    context: *mut c_void,
    applier: ContextApplierFn<RawUnitInclude>,
) -> bool {
    includes_apply(raw, Sink::Function(context, applier))
}
