//! Occurrence and relation views.

use crate::error::{IndexStoreError, IndexStoreResult};
use crate::library::IndexStoreLibrary;
use crate::symbol::{Symbol, SymbolInfo};
use crate::traversal::{drive, ApplyOutcome, Applier};
use indexstore_abi::{RawOccurrence, RawSymbolRelation, SymbolRoles};
use std::ffi::c_uint;
use std::fmt;

/// One occurrence of a symbol in a record. Valid for the callback it was
/// handed to.
#[derive(Clone, Copy)]
pub struct Occurrence<'a> {
    library: &'a IndexStoreLibrary,
    raw: RawOccurrence,
}

impl<'a> Occurrence<'a> {
    pub(crate) fn new(library: &'a IndexStoreLibrary, raw: RawOccurrence) -> Self {
        Self { library, raw }
    }

    /// The symbol that occurs.
    pub fn symbol(&self) -> IndexStoreResult<Symbol<'a>> {
        // SAFETY: live occurrence view.
        let raw = unsafe { (self.library.functions().occurrence_get_symbol)(self.raw) };
        if raw.is_null() {
            return Err(IndexStoreError::protocol_violation(
                "occurrence_get_symbol",
                "returned a null symbol",
            ));
        }
        Ok(Symbol::new(self.library, raw))
    }

    /// Roles of this occurrence, relation roles included.
    #[must_use]
    pub fn roles(&self) -> SymbolRoles {
        // SAFETY: live occurrence view.
        SymbolRoles::from_bits(unsafe { (self.library.functions().occurrence_get_roles)(self.raw) })
    }

    /// One-based line and column.
    #[must_use]
    pub fn line_col(&self) -> (u32, u32) {
        let mut line: c_uint = 0;
        let mut column: c_uint = 0;
        // SAFETY: both out-parameters are valid for writes.
        unsafe {
            (self.library.functions().occurrence_get_line_col)(self.raw, &mut line, &mut column);
        }
        (line, column)
    }

    /// One-based line.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line_col().0
    }

    /// One-based column.
    #[must_use]
    pub fn column(&self) -> u32 {
        self.line_col().1
    }

    /// Calls `applier` with each relation of the occurrence until it
    /// returns false.
    pub fn relations_apply<F>(&self, mut applier: F) -> IndexStoreResult<ApplyOutcome>
    where
        F: FnMut(SymbolRelation<'_>) -> bool,
    {
        let library = self.library;
        let functions = library.functions();
        let raw = self.raw;
        drive(
            library,
            "occurrence_relations_apply",
            |relation: RawSymbolRelation| applier(SymbolRelation::new(library, relation)),
            |callback| unsafe {
                match callback {
                    Applier::Block { functions: blocks, block } => {
                        (blocks.occurrence_relations_apply)(raw, block)
                    }
                    Applier::Function { context, function } => {
                        (functions.occurrence_relations_apply_f)(raw, context, function)
                    }
                }
            },
        )
    }

    /// Copies every relation.
    pub fn relations(&self) -> IndexStoreResult<Vec<RelationInfo>> {
        let mut relations = Vec::new();
        let mut failure = None;
        self.relations_apply(|relation| match relation.info() {
            Ok(info) => {
                relations.push(info);
                true
            }
            Err(err) => {
                failure = Some(err);
                false
            }
        })?;
        match failure {
            Some(err) => Err(err),
            None => Ok(relations),
        }
    }

    /// Copies everything out of the view, relations included.
    pub fn info(&self) -> IndexStoreResult<OccurrenceInfo> {
        let (line, column) = self.line_col();
        Ok(OccurrenceInfo {
            symbol: self.symbol()?.info(),
            roles: self.roles(),
            line,
            column,
            relations: self.relations()?,
        })
    }
}

impl fmt::Debug for Occurrence<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Occurrence").field(&self.raw).finish()
    }
}

/// A relation from an occurrence to another symbol.
#[derive(Clone, Copy)]
pub struct SymbolRelation<'a> {
    library: &'a IndexStoreLibrary,
    raw: RawSymbolRelation,
}

impl<'a> SymbolRelation<'a> {
    pub(crate) fn new(library: &'a IndexStoreLibrary, raw: RawSymbolRelation) -> Self {
        Self { library, raw }
    }

    /// Relation roles.
    #[must_use]
    pub fn roles(&self) -> SymbolRoles {
        // SAFETY: live relation view.
        SymbolRoles::from_bits(unsafe {
            (self.library.functions().symbol_relation_get_roles)(self.raw)
        })
    }

    /// The related symbol.
    pub fn symbol(&self) -> IndexStoreResult<Symbol<'a>> {
        // SAFETY: live relation view.
        let raw = unsafe { (self.library.functions().symbol_relation_get_symbol)(self.raw) };
        if raw.is_null() {
            return Err(IndexStoreError::protocol_violation(
                "symbol_relation_get_symbol",
                "returned a null symbol",
            ));
        }
        Ok(Symbol::new(self.library, raw))
    }

    /// Copies the relation.
    pub fn info(&self) -> IndexStoreResult<RelationInfo> {
        Ok(RelationInfo {
            roles: self.roles(),
            symbol: self.symbol()?.info(),
        })
    }
}

impl fmt::Debug for SymbolRelation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SymbolRelation").field(&self.raw).finish()
    }
}

/// Owned copy of a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationInfo {
    /// Relation roles.
    pub roles: SymbolRoles,
    /// The related symbol.
    pub symbol: SymbolInfo,
}

/// Owned copy of an occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceInfo {
    /// The symbol that occurs.
    pub symbol: SymbolInfo,
    /// Roles.
    pub roles: SymbolRoles,
    /// One-based line.
    pub line: u32,
    /// One-based column.
    pub column: u32,
    /// Relations to other symbols.
    pub relations: Vec<RelationInfo>,
}
