//! The ordered catalog of operations exported by the library.
//!
//! Order follows the library's own function table. Operations marked
//! `optional` only exist where the library was built with closure (block)
//! support; each of them has a context-pointer twin that is always present.

/// Kind of opaque handle carried by a parameter or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// `indexstore_error_t`
    Error,
    /// `indexstore_t`
    Store,
    /// `indexstore_creation_options_t`
    CreationOptions,
    /// `indexstore_unit_event_notification_t`
    UnitEventNotification,
    /// `indexstore_unit_event_t`
    UnitEvent,
    /// `indexstore_symbol_t`
    Symbol,
    /// `indexstore_symbol_relation_t`
    SymbolRelation,
    /// `indexstore_occurrence_t`
    Occurrence,
    /// `indexstore_record_reader_t`
    RecordReader,
    /// `indexstore_unit_reader_t`
    UnitReader,
    /// `indexstore_unit_dependency_t`
    UnitDependency,
    /// `indexstore_unit_include_t`
    UnitInclude,
}

/// Shape of a parameter or return value at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// No value.
    Void,
    /// `bool`
    Bool,
    /// `unsigned`
    Unsigned,
    /// `size_t`
    Size,
    /// `uint64_t`
    U64,
    /// `int64_t *` out-parameter.
    I64Out,
    /// `unsigned *` out-parameter.
    UnsignedOut,
    /// NUL-terminated input string.
    CString,
    /// Caller-provided character buffer.
    CharBuffer,
    /// `indexstore_string_ref_t`
    StringRef,
    /// A single opaque handle.
    Handle(HandleKind),
    /// Pointer to an array of handles.
    HandleArray(HandleKind),
    /// `indexstore_error_t *` out-parameter.
    ErrorOut,
    /// `indexstore_unit_event_listen_options_t *`
    ListenOptions,
    /// Opaque caller context pointer.
    Context,
    /// Plain function pointer invoked with a context.
    Function,
    /// Block literal (closure calling convention).
    Block,
}

/// Description of one exported operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// Operation name without the `indexstore_` prefix.
    pub name: &'static str,
    /// Exported symbol name.
    pub symbol: &'static str,
    /// Parameter shapes in order.
    pub params: &'static [Shape],
    /// Return shape.
    pub returns: Shape,
    /// True if the operation only exists with closure support.
    pub optional: bool,
}

impl OperationDescriptor {
    /// Returns true if the operation takes a block argument.
    #[must_use]
    pub fn takes_block(&self) -> bool {
        self.params.contains(&Shape::Block)
    }
}

macro_rules! op {
    (block $name:ident($($param:expr),* $(,)?) -> $ret:expr) => {
        OperationDescriptor {
            name: stringify!($name),
            symbol: concat!("indexstore_", stringify!($name)),
            params: &[$($param),*],
            returns: $ret,
            optional: true,
        }
    };
    ($name:ident($($param:expr),* $(,)?) -> $ret:expr) => {
        OperationDescriptor {
            name: stringify!($name),
            symbol: concat!("indexstore_", stringify!($name)),
            params: &[$($param),*],
            returns: $ret,
            optional: false,
        }
    };
}

use HandleKind as H;
use Shape::{
    Block, Bool, CString, CharBuffer, Context, ErrorOut, Function, Handle, HandleArray, I64Out,
    ListenOptions, Size, StringRef, Unsigned, UnsignedOut, Void, U64,
};

/// Every operation, in the library's function table order.
pub const OPERATIONS: &[OperationDescriptor] = &[
    op!(error_get_description(Handle(H::Error)) -> CString),
    op!(error_dispose(Handle(H::Error)) -> Void),
    op!(format_version() -> Unsigned),
    op!(version() -> Unsigned),
    op!(creation_options_create() -> Handle(H::CreationOptions)),
    op!(creation_options_dispose(Handle(H::CreationOptions)) -> Void),
    op!(creation_options_add_prefix_mapping(Handle(H::CreationOptions), CString, CString) -> Void),
    op!(store_create(CString, ErrorOut) -> Handle(H::Store)),
    op!(store_create_with_options(CString, Handle(H::CreationOptions), ErrorOut) -> Handle(H::Store)),
    op!(store_dispose(Handle(H::Store)) -> Void),
    op!(block store_units_apply(Handle(H::Store), Unsigned, Block) -> Bool),
    op!(store_units_apply_f(Handle(H::Store), Unsigned, Context, Function) -> Bool),
    op!(unit_event_notification_get_events_count(Handle(H::UnitEventNotification)) -> Size),
    op!(unit_event_notification_get_event(Handle(H::UnitEventNotification), Size) -> Handle(H::UnitEvent)),
    op!(unit_event_notification_is_initial(Handle(H::UnitEventNotification)) -> Bool),
    op!(unit_event_get_kind(Handle(H::UnitEvent)) -> Unsigned),
    op!(unit_event_get_unit_name(Handle(H::UnitEvent)) -> StringRef),
    op!(block store_set_unit_event_handler(Handle(H::Store), Block) -> Void),
    op!(store_set_unit_event_handler_f(Handle(H::Store), Context, Function, Function) -> Void),
    op!(store_start_unit_event_listening(Handle(H::Store), ListenOptions, Size, ErrorOut) -> Bool),
    op!(store_stop_unit_event_listening(Handle(H::Store)) -> Void),
    op!(store_discard_unit(Handle(H::Store), CString) -> Void),
    op!(store_discard_record(Handle(H::Store), CString) -> Void),
    op!(store_purge_stale_data(Handle(H::Store)) -> Void),
    op!(store_get_unit_name_from_output_path(Handle(H::Store), CString, CharBuffer, Size) -> Size),
    op!(store_get_unit_modification_time(Handle(H::Store), CString, I64Out, I64Out, ErrorOut) -> Bool),
    op!(symbol_get_language(Handle(H::Symbol)) -> Unsigned),
    op!(symbol_get_kind(Handle(H::Symbol)) -> Unsigned),
    op!(symbol_get_subkind(Handle(H::Symbol)) -> Unsigned),
    op!(symbol_get_properties(Handle(H::Symbol)) -> U64),
    op!(symbol_get_roles(Handle(H::Symbol)) -> U64),
    op!(symbol_get_related_roles(Handle(H::Symbol)) -> U64),
    op!(symbol_get_name(Handle(H::Symbol)) -> StringRef),
    op!(symbol_get_usr(Handle(H::Symbol)) -> StringRef),
    op!(symbol_get_codegen_name(Handle(H::Symbol)) -> StringRef),
    op!(symbol_relation_get_roles(Handle(H::SymbolRelation)) -> U64),
    op!(symbol_relation_get_symbol(Handle(H::SymbolRelation)) -> Handle(H::Symbol)),
    op!(occurrence_get_symbol(Handle(H::Occurrence)) -> Handle(H::Symbol)),
    op!(block occurrence_relations_apply(Handle(H::Occurrence), Block) -> Bool),
    op!(occurrence_relations_apply_f(Handle(H::Occurrence), Context, Function) -> Bool),
    op!(occurrence_get_roles(Handle(H::Occurrence)) -> U64),
    op!(occurrence_get_line_col(Handle(H::Occurrence), UnsignedOut, UnsignedOut) -> Void),
    op!(record_reader_create(Handle(H::Store), CString, ErrorOut) -> Handle(H::RecordReader)),
    op!(record_reader_dispose(Handle(H::RecordReader)) -> Void),
    op!(block record_reader_search_symbols(Handle(H::RecordReader), Block, Block) -> Bool),
    op!(block record_reader_symbols_apply(Handle(H::RecordReader), Bool, Block) -> Bool),
    op!(block record_reader_occurrences_apply(Handle(H::RecordReader), Block) -> Bool),
    op!(block record_reader_occurrences_in_line_range_apply(
        Handle(H::RecordReader), Unsigned, Unsigned, Block) -> Bool),
    op!(block record_reader_occurrences_of_symbols_apply(
        Handle(H::RecordReader), HandleArray(H::Symbol), Size, HandleArray(H::Symbol), Size, Block
    ) -> Bool),
    op!(record_reader_search_symbols_f(
        Handle(H::RecordReader), Context, Function, Context, Function) -> Bool),
    op!(record_reader_symbols_apply_f(Handle(H::RecordReader), Bool, Context, Function) -> Bool),
    op!(record_reader_occurrences_apply_f(Handle(H::RecordReader), Context, Function) -> Bool),
    op!(record_reader_occurrences_in_line_range_apply_f(
        Handle(H::RecordReader), Unsigned, Unsigned, Context, Function) -> Bool),
    op!(record_reader_occurrences_of_symbols_apply_f(
        Handle(H::RecordReader), HandleArray(H::Symbol), Size, HandleArray(H::Symbol), Size,
        Context, Function
    ) -> Bool),
    op!(unit_reader_create(Handle(H::Store), CString, ErrorOut) -> Handle(H::UnitReader)),
    op!(unit_reader_dispose(Handle(H::UnitReader)) -> Void),
    op!(unit_reader_get_provider_identifier(Handle(H::UnitReader)) -> StringRef),
    op!(unit_reader_get_provider_version(Handle(H::UnitReader)) -> StringRef),
    op!(unit_reader_get_modification_time(Handle(H::UnitReader), I64Out, I64Out) -> Void),
    op!(unit_reader_is_system_unit(Handle(H::UnitReader)) -> Bool),
    op!(unit_reader_is_module_unit(Handle(H::UnitReader)) -> Bool),
    op!(unit_reader_is_debug_compilation(Handle(H::UnitReader)) -> Bool),
    op!(unit_reader_has_main_file(Handle(H::UnitReader)) -> Bool),
    op!(unit_reader_get_main_file(Handle(H::UnitReader)) -> StringRef),
    op!(unit_reader_get_module_name(Handle(H::UnitReader)) -> StringRef),
    op!(unit_reader_get_working_dir(Handle(H::UnitReader)) -> StringRef),
    op!(unit_reader_get_output_file(Handle(H::UnitReader)) -> StringRef),
    op!(unit_reader_get_sysroot_path(Handle(H::UnitReader)) -> StringRef),
    op!(unit_reader_get_target(Handle(H::UnitReader)) -> StringRef),
    op!(unit_dependency_get_kind(Handle(H::UnitDependency)) -> Unsigned),
    op!(unit_dependency_is_system(Handle(H::UnitDependency)) -> Bool),
    op!(unit_dependency_get_filepath(Handle(H::UnitDependency)) -> StringRef),
    op!(unit_dependency_get_modulename(Handle(H::UnitDependency)) -> StringRef),
    op!(unit_dependency_get_name(Handle(H::UnitDependency)) -> StringRef),
    op!(unit_include_get_source_path(Handle(H::UnitInclude)) -> StringRef),
    op!(unit_include_get_target_path(Handle(H::UnitInclude)) -> StringRef),
    op!(unit_include_get_source_line(Handle(H::UnitInclude)) -> Unsigned),
    op!(block unit_reader_dependencies_apply(Handle(H::UnitReader), Block) -> Bool),
    op!(block unit_reader_includes_apply(Handle(H::UnitReader), Block) -> Bool),
    op!(unit_reader_dependencies_apply_f(Handle(H::UnitReader), Context, Function) -> Bool),
    op!(unit_reader_includes_apply_f(Handle(H::UnitReader), Context, Function) -> Bool),
];

/// Looks up an operation by name (without the `indexstore_` prefix).
#[must_use]
pub fn operation(name: &str) -> Option<&'static OperationDescriptor> {
    OPERATIONS.iter().find(|op| op.name == name)
}

/// Operations that must resolve for a load to succeed, in catalog order.
pub fn required_operations() -> impl Iterator<Item = &'static OperationDescriptor> {
    OPERATIONS.iter().filter(|op| !op.optional)
}

/// Closure-form operations, in catalog order.
pub fn optional_operations() -> impl Iterator<Item = &'static OperationDescriptor> {
    OPERATIONS.iter().filter(|op| op.optional)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = OPERATIONS.iter().map(|op| op.name).collect();
        assert_eq!(names.len(), OPERATIONS.len());
    }

    #[test]
    fn symbols_carry_prefix() {
        for op in OPERATIONS {
            assert_eq!(op.symbol, format!("{}{}", crate::SYMBOL_PREFIX, op.name));
        }
    }

    #[test]
    fn every_optional_operation_has_a_function_twin() {
        for op in optional_operations() {
            let twin = format!("{}_f", op.name);
            let twin = operation(&twin).unwrap_or_else(|| panic!("no twin for {}", op.name));
            assert!(!twin.optional);
            assert!(twin.params.contains(&Shape::Function));
        }
    }

    #[test]
    fn only_optional_operations_take_blocks() {
        for op in OPERATIONS {
            assert_eq!(op.optional, op.takes_block(), "{}", op.name);
        }
    }

    #[test]
    fn counts() {
        assert_eq!(optional_operations().count(), 10);
        assert_eq!(required_operations().count(), OPERATIONS.len() - 10);
    }

    #[test]
    fn lookup() {
        let op = operation("store_create").unwrap();
        assert_eq!(op.symbol, "indexstore_store_create");
        assert_eq!(op.returns, Shape::Handle(HandleKind::Store));
        assert!(operation("store_frobnicate").is_none());
    }
}
