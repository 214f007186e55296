//! Symbol views.

use crate::library::IndexStoreLibrary;
use crate::string::copy_string_ref;
use indexstore_abi::{
    RawSymbol, SymbolKind, SymbolLanguage, SymbolProperties, SymbolRoles, SymbolSubKind,
};
use std::fmt;
use tracing::warn;

/// Maps an unknown wire value to `fallback`, logging it once per read.
pub(crate) fn known_or<T>(decoded: Option<T>, fallback: T, what: &'static str, raw: u32) -> T {
    decoded.unwrap_or_else(|| {
        warn!(what, raw, "unknown wire value");
        fallback
    })
}

/// A symbol, valid for the callback it was handed to, or for the lifetime
/// of its record reader when it came from a cached listing.
#[derive(Clone, Copy)]
pub struct Symbol<'a> {
    library: &'a IndexStoreLibrary,
    raw: RawSymbol,
}

impl<'a> Symbol<'a> {
    pub(crate) fn new(library: &'a IndexStoreLibrary, raw: RawSymbol) -> Self {
        Self { library, raw }
    }

    pub(crate) fn raw(&self) -> RawSymbol {
        self.raw
    }

    pub(crate) fn library(&self) -> &'a IndexStoreLibrary {
        self.library
    }

    /// Raw kind value.
    #[must_use]
    pub fn raw_kind(&self) -> u32 {
        // SAFETY: live symbol view.
        unsafe { (self.library.functions().symbol_get_kind)(self.raw) }
    }

    /// Kind, or [`SymbolKind::Unknown`] for values this crate does not know.
    #[must_use]
    pub fn kind(&self) -> SymbolKind {
        let raw = self.raw_kind();
        known_or(SymbolKind::from_raw(raw), SymbolKind::Unknown, "symbol kind", raw)
    }

    /// Raw sub-kind value.
    #[must_use]
    pub fn raw_sub_kind(&self) -> u32 {
        // SAFETY: live symbol view.
        unsafe { (self.library.functions().symbol_get_subkind)(self.raw) }
    }

    /// Sub-kind, or [`SymbolSubKind::None`] for unknown values.
    #[must_use]
    pub fn sub_kind(&self) -> SymbolSubKind {
        let raw = self.raw_sub_kind();
        known_or(
            SymbolSubKind::from_raw(raw),
            SymbolSubKind::None,
            "symbol sub-kind",
            raw,
        )
    }

    /// Raw language value.
    #[must_use]
    pub fn raw_language(&self) -> u32 {
        // SAFETY: live symbol view.
        unsafe { (self.library.functions().symbol_get_language)(self.raw) }
    }

    /// Language, or `None` for unknown values.
    #[must_use]
    pub fn language(&self) -> Option<SymbolLanguage> {
        let raw = self.raw_language();
        let language = SymbolLanguage::from_raw(raw);
        if language.is_none() {
            warn!(what = "symbol language", raw, "unknown wire value");
        }
        language
    }

    /// Properties.
    #[must_use]
    pub fn properties(&self) -> SymbolProperties {
        // SAFETY: live symbol view.
        SymbolProperties::from_bits(unsafe {
            (self.library.functions().symbol_get_properties)(self.raw)
        })
    }

    /// Union of the roles of every occurrence of the symbol in the record.
    #[must_use]
    pub fn roles(&self) -> SymbolRoles {
        // SAFETY: live symbol view.
        SymbolRoles::from_bits(unsafe { (self.library.functions().symbol_get_roles)(self.raw) })
    }

    /// Union of the roles the symbol has in relations.
    #[must_use]
    pub fn related_roles(&self) -> SymbolRoles {
        // SAFETY: live symbol view.
        SymbolRoles::from_bits(unsafe {
            (self.library.functions().symbol_get_related_roles)(self.raw)
        })
    }

    /// Name.
    #[must_use]
    pub fn name(&self) -> String {
        // SAFETY: live symbol view; the string is copied immediately.
        unsafe { copy_string_ref((self.library.functions().symbol_get_name)(self.raw)) }
    }

    /// Unified symbol resolution identifier.
    #[must_use]
    pub fn usr(&self) -> String {
        // SAFETY: as above.
        unsafe { copy_string_ref((self.library.functions().symbol_get_usr)(self.raw)) }
    }

    /// Code generation name, empty when there is none.
    #[must_use]
    pub fn codegen_name(&self) -> String {
        // SAFETY: as above.
        unsafe { copy_string_ref((self.library.functions().symbol_get_codegen_name)(self.raw)) }
    }

    /// Copies everything out of the view.
    #[must_use]
    pub fn info(&self) -> SymbolInfo {
        SymbolInfo {
            name: self.name(),
            usr: self.usr(),
            codegen_name: self.codegen_name(),
            kind: self.kind(),
            sub_kind: self.sub_kind(),
            language: self.language(),
            properties: self.properties(),
            roles: self.roles(),
            related_roles: self.related_roles(),
        }
    }
}

impl fmt::Debug for Symbol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Symbol").field(&self.raw).finish()
    }
}

/// Owned copy of a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolInfo {
    /// Name.
    pub name: String,
    /// Unified symbol resolution identifier.
    pub usr: String,
    /// Code generation name.
    pub codegen_name: String,
    /// Kind.
    pub kind: SymbolKind,
    /// Sub-kind.
    pub sub_kind: SymbolSubKind,
    /// Language, if known.
    pub language: Option<SymbolLanguage>,
    /// Properties.
    pub properties: SymbolProperties,
    /// Occurrence roles.
    pub roles: SymbolRoles,
    /// Relation roles.
    pub related_roles: SymbolRoles,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_or_falls_back() {
        assert_eq!(
            known_or(SymbolKind::from_raw(12), SymbolKind::Unknown, "symbol kind", 12),
            SymbolKind::Function
        );
        assert_eq!(
            known_or(SymbolKind::from_raw(77), SymbolKind::Unknown, "symbol kind", 77),
            SymbolKind::Unknown
        );
    }
}
