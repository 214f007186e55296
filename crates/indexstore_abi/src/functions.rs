//! Function pointer types for every catalogued operation.
//!
//! Closure-form operations take a pointer to a block literal (see
//! [`BlockLiteralHeader`](crate::BlockLiteralHeader)) where the
//! context-pointer form takes a `(context, function)` pair.

use crate::types::{
    ListenOptions, RawCreationOptions, RawError, RawOccurrence, RawRecordReader, RawStore,
    RawSymbol, RawSymbolRelation, RawUnitDependency, RawUnitEvent, RawUnitEventNotification,
    RawUnitInclude, RawUnitReader, StringRef,
};
use std::ffi::{c_char, c_uint, c_void};

/// Pointer to a block literal passed to a closure-form operation.
pub type BlockPtr = *mut c_void;

/// Plain-function applier: receives the caller's context and one item.
pub type ContextApplierFn<H> = unsafe extern "C" fn(context: *mut c_void, item: H) -> bool;
/// Search filter: decides acceptance and may request a stop through `stop`.
pub type SearchFilterFn =
    unsafe extern "C" fn(context: *mut c_void, symbol: RawSymbol, stop: *mut bool) -> bool;
/// Search receiver: called for each accepted symbol.
pub type SearchReceiverFn = unsafe extern "C" fn(context: *mut c_void, symbol: RawSymbol);
/// Unit event handler.
pub type EventHandlerFn =
    unsafe extern "C" fn(context: *mut c_void, notification: RawUnitEventNotification);
/// Releases an event handler's context once the store no longer needs it.
pub type FinalizerFn = unsafe extern "C" fn(context: *mut c_void);

// Error channel and versions

/// `error_get_description`
pub type ErrorGetDescriptionFn = unsafe extern "C" fn(RawError) -> *const c_char;
/// `error_dispose`
pub type ErrorDisposeFn = unsafe extern "C" fn(RawError);
/// `format_version` and `version`
pub type VersionFn = unsafe extern "C" fn() -> c_uint;

// Creation options

/// `creation_options_create`
pub type CreationOptionsCreateFn = unsafe extern "C" fn() -> RawCreationOptions;
/// `creation_options_dispose`
pub type CreationOptionsDisposeFn = unsafe extern "C" fn(RawCreationOptions);
/// `creation_options_add_prefix_mapping`
pub type CreationOptionsAddPrefixMappingFn =
    unsafe extern "C" fn(RawCreationOptions, *const c_char, *const c_char);

// Store

/// `store_create`
pub type StoreCreateFn = unsafe extern "C" fn(*const c_char, *mut RawError) -> RawStore;
/// `store_create_with_options`
pub type StoreCreateWithOptionsFn =
    unsafe extern "C" fn(*const c_char, RawCreationOptions, *mut RawError) -> RawStore;
/// `store_dispose`
pub type StoreDisposeFn = unsafe extern "C" fn(RawStore);
/// `store_units_apply` (closure form)
pub type StoreUnitsApplyFn = unsafe extern "C" fn(RawStore, c_uint, BlockPtr) -> bool;
/// `store_units_apply_f`
pub type StoreUnitsApplyFFn =
    unsafe extern "C" fn(RawStore, c_uint, *mut c_void, ContextApplierFn<StringRef>) -> bool;
/// `store_set_unit_event_handler` (closure form)
pub type StoreSetUnitEventHandlerFn = unsafe extern "C" fn(RawStore, BlockPtr);
/// `store_set_unit_event_handler_f`
pub type StoreSetUnitEventHandlerFFn =
    unsafe extern "C" fn(RawStore, *mut c_void, EventHandlerFn, FinalizerFn);
/// `store_start_unit_event_listening`
pub type StoreStartUnitEventListeningFn =
    unsafe extern "C" fn(RawStore, *mut ListenOptions, usize, *mut RawError) -> bool;
/// `store_stop_unit_event_listening` and `store_purge_stale_data`
pub type StoreActionFn = unsafe extern "C" fn(RawStore);
/// `store_discard_unit` and `store_discard_record`
pub type StoreDiscardFn = unsafe extern "C" fn(RawStore, *const c_char);
/// `store_get_unit_name_from_output_path`
pub type StoreGetUnitNameFromOutputPathFn =
    unsafe extern "C" fn(RawStore, *const c_char, *mut c_char, usize) -> usize;
/// `store_get_unit_modification_time`; returns true if an error occurred.
pub type StoreGetUnitModificationTimeFn =
    unsafe extern "C" fn(RawStore, *const c_char, *mut i64, *mut i64, *mut RawError) -> bool;

// Unit events

/// `unit_event_notification_get_events_count`
pub type NotificationGetEventsCountFn = unsafe extern "C" fn(RawUnitEventNotification) -> usize;
/// `unit_event_notification_get_event`
pub type NotificationGetEventFn =
    unsafe extern "C" fn(RawUnitEventNotification, usize) -> RawUnitEvent;
/// `unit_event_notification_is_initial`
pub type NotificationIsInitialFn = unsafe extern "C" fn(RawUnitEventNotification) -> bool;
/// `unit_event_get_kind`
pub type UnitEventGetKindFn = unsafe extern "C" fn(RawUnitEvent) -> c_uint;
/// `unit_event_get_unit_name`
pub type UnitEventGetUnitNameFn = unsafe extern "C" fn(RawUnitEvent) -> StringRef;

// Symbols, relations, occurrences

/// `symbol_get_language`, `symbol_get_kind`, `symbol_get_subkind`
pub type SymbolEnumFn = unsafe extern "C" fn(RawSymbol) -> c_uint;
/// `symbol_get_properties`, `symbol_get_roles`, `symbol_get_related_roles`
pub type SymbolFlagsFn = unsafe extern "C" fn(RawSymbol) -> u64;
/// `symbol_get_name`, `symbol_get_usr`, `symbol_get_codegen_name`
pub type SymbolStringFn = unsafe extern "C" fn(RawSymbol) -> StringRef;
/// `symbol_relation_get_roles`
pub type SymbolRelationGetRolesFn = unsafe extern "C" fn(RawSymbolRelation) -> u64;
/// `symbol_relation_get_symbol`
pub type SymbolRelationGetSymbolFn = unsafe extern "C" fn(RawSymbolRelation) -> RawSymbol;
/// `occurrence_get_symbol`
pub type OccurrenceGetSymbolFn = unsafe extern "C" fn(RawOccurrence) -> RawSymbol;
/// `occurrence_relations_apply` (closure form)
pub type OccurrenceRelationsApplyFn = unsafe extern "C" fn(RawOccurrence, BlockPtr) -> bool;
/// `occurrence_relations_apply_f`
pub type OccurrenceRelationsApplyFFn = unsafe extern "C" fn(
    RawOccurrence,
    *mut c_void,
    ContextApplierFn<RawSymbolRelation>,
) -> bool;
/// `occurrence_get_roles`
pub type OccurrenceGetRolesFn = unsafe extern "C" fn(RawOccurrence) -> u64;
/// `occurrence_get_line_col`
pub type OccurrenceGetLineColFn = unsafe extern "C" fn(RawOccurrence, *mut c_uint, *mut c_uint);

// Record reader

/// `record_reader_create`
pub type RecordReaderCreateFn =
    unsafe extern "C" fn(RawStore, *const c_char, *mut RawError) -> RawRecordReader;
/// `record_reader_dispose`
pub type RecordReaderDisposeFn = unsafe extern "C" fn(RawRecordReader);
/// `record_reader_search_symbols` (closure form): filter block, receiver block.
pub type RecordReaderSearchSymbolsFn =
    unsafe extern "C" fn(RawRecordReader, BlockPtr, BlockPtr) -> bool;
/// `record_reader_symbols_apply` (closure form)
pub type RecordReaderSymbolsApplyFn = unsafe extern "C" fn(RawRecordReader, bool, BlockPtr) -> bool;
/// `record_reader_occurrences_apply` (closure form)
pub type RecordReaderOccurrencesApplyFn = unsafe extern "C" fn(RawRecordReader, BlockPtr) -> bool;
/// `record_reader_occurrences_in_line_range_apply` (closure form)
pub type RecordReaderOccurrencesInLineRangeApplyFn =
    unsafe extern "C" fn(RawRecordReader, c_uint, c_uint, BlockPtr) -> bool;
/// `record_reader_occurrences_of_symbols_apply` (closure form)
pub type RecordReaderOccurrencesOfSymbolsApplyFn = unsafe extern "C" fn(
    RawRecordReader,
    *mut RawSymbol,
    usize,
    *mut RawSymbol,
    usize,
    BlockPtr,
) -> bool;
/// `record_reader_search_symbols_f`
pub type RecordReaderSearchSymbolsFFn = unsafe extern "C" fn(
    RawRecordReader,
    *mut c_void,
    SearchFilterFn,
    *mut c_void,
    SearchReceiverFn,
) -> bool;
/// `record_reader_symbols_apply_f`
pub type RecordReaderSymbolsApplyFFn = unsafe extern "C" fn(
    RawRecordReader,
    bool,
    *mut c_void,
    ContextApplierFn<RawSymbol>,
) -> bool;
/// `record_reader_occurrences_apply_f`
pub type RecordReaderOccurrencesApplyFFn =
    unsafe extern "C" fn(RawRecordReader, *mut c_void, ContextApplierFn<RawOccurrence>) -> bool;
/// `record_reader_occurrences_in_line_range_apply_f`
pub type RecordReaderOccurrencesInLineRangeApplyFFn = unsafe extern "C" fn(
    RawRecordReader,
    c_uint,
    c_uint,
    *mut c_void,
    ContextApplierFn<RawOccurrence>,
) -> bool;
/// `record_reader_occurrences_of_symbols_apply_f`
pub type RecordReaderOccurrencesOfSymbolsApplyFFn = unsafe extern "C" fn(
    RawRecordReader,
    *mut RawSymbol,
    usize,
    *mut RawSymbol,
    usize,
    *mut c_void,
    ContextApplierFn<RawOccurrence>,
) -> bool;

// Unit reader

/// `unit_reader_create`
pub type UnitReaderCreateFn =
    unsafe extern "C" fn(RawStore, *const c_char, *mut RawError) -> RawUnitReader;
/// `unit_reader_dispose`
pub type UnitReaderDisposeFn = unsafe extern "C" fn(RawUnitReader);
/// String accessors of a unit reader.
pub type UnitReaderStringFn = unsafe extern "C" fn(RawUnitReader) -> StringRef;
/// Boolean accessors of a unit reader.
pub type UnitReaderFlagFn = unsafe extern "C" fn(RawUnitReader) -> bool;
/// `unit_reader_get_modification_time`
pub type UnitReaderGetModificationTimeFn = unsafe extern "C" fn(RawUnitReader, *mut i64, *mut i64);
/// `unit_dependency_get_kind`
pub type UnitDependencyGetKindFn = unsafe extern "C" fn(RawUnitDependency) -> c_uint;
/// `unit_dependency_is_system`
pub type UnitDependencyIsSystemFn = unsafe extern "C" fn(RawUnitDependency) -> bool;
/// String accessors of a unit dependency.
pub type UnitDependencyStringFn = unsafe extern "C" fn(RawUnitDependency) -> StringRef;
/// String accessors of a unit include.
pub type UnitIncludeStringFn = unsafe extern "C" fn(RawUnitInclude) -> StringRef;
/// `unit_include_get_source_line`
pub type UnitIncludeGetSourceLineFn = unsafe extern "C" fn(RawUnitInclude) -> c_uint;
/// `unit_reader_dependencies_apply` and `unit_reader_includes_apply` (closure form)
pub type UnitReaderApplyFn = unsafe extern "C" fn(RawUnitReader, BlockPtr) -> bool;
/// `unit_reader_dependencies_apply_f`
pub type UnitReaderDependenciesApplyFFn =
    unsafe extern "C" fn(RawUnitReader, *mut c_void, ContextApplierFn<RawUnitDependency>) -> bool;
/// `unit_reader_includes_apply_f`
pub type UnitReaderIncludesApplyFFn =
    unsafe extern "C" fn(RawUnitReader, *mut c_void, ContextApplierFn<RawUnitInclude>) -> bool;
