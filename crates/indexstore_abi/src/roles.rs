//! Occurrence and relation roles.

use std::fmt;

/// Set of roles an occurrence or relation plays. Combine with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SymbolRoles(u64);

impl SymbolRoles {
    /// No roles.
    pub const NONE: Self = Self(0);
    /// Declaration.
    pub const DECLARATION: Self = Self(1 << 0);
    /// Definition.
    pub const DEFINITION: Self = Self(1 << 1);
    /// Reference.
    pub const REFERENCE: Self = Self(1 << 2);
    /// Read access.
    pub const READ: Self = Self(1 << 3);
    /// Write access.
    pub const WRITE: Self = Self(1 << 4);
    /// Call.
    pub const CALL: Self = Self(1 << 5);
    /// Dynamic dispatch.
    pub const DYNAMIC: Self = Self(1 << 6);
    /// Address taken.
    pub const ADDRESSOF: Self = Self(1 << 7);
    /// Implicit.
    pub const IMPLICIT: Self = Self(1 << 8);
    /// Macro undefinition.
    pub const UNDEFINITION: Self = Self(1 << 19);
    /// Reference by name only.
    pub const NAMEREFERENCE: Self = Self(1 << 20);

    /// Child of the related symbol.
    pub const REL_CHILDOF: Self = Self(1 << 9);
    /// Base of the related symbol.
    pub const REL_BASEOF: Self = Self(1 << 10);
    /// Overrides the related symbol.
    pub const REL_OVERRIDEOF: Self = Self(1 << 11);
    /// Received by the related symbol.
    pub const REL_RECEIVEDBY: Self = Self(1 << 12);
    /// Called by the related symbol.
    pub const REL_CALLEDBY: Self = Self(1 << 13);
    /// Extended by the related symbol.
    pub const REL_EXTENDEDBY: Self = Self(1 << 14);
    /// Accessor of the related symbol.
    pub const REL_ACCESSOROF: Self = Self(1 << 15);
    /// Contained by the related symbol.
    pub const REL_CONTAINEDBY: Self = Self(1 << 16);
    /// Interface Builder type of the related symbol.
    pub const REL_IBTYPEOF: Self = Self(1 << 17);
    /// Specialization of the related symbol.
    pub const REL_SPECIALIZATIONOF: Self = Self(1 << 18);

    /// Canonical occurrence marker used by consumers, never set by the store.
    pub const CANONICAL: Self = Self(1 << 63);
    /// Every bit.
    pub const ALL: Self = Self(!0);

    /// Mask of the relation roles.
    pub const RELATION_MASK: Self = Self(0x7_fe00);

    const NAMED: &'static [(Self, &'static str)] = &[
        (Self::DECLARATION, "decl"),
        (Self::DEFINITION, "def"),
        (Self::REFERENCE, "ref"),
        (Self::READ, "read"),
        (Self::WRITE, "write"),
        (Self::CALL, "call"),
        (Self::DYNAMIC, "dyn"),
        (Self::ADDRESSOF, "addr"),
        (Self::IMPLICIT, "impl"),
        (Self::UNDEFINITION, "undef"),
        (Self::NAMEREFERENCE, "nameref"),
        (Self::REL_CHILDOF, "childOf"),
        (Self::REL_BASEOF, "baseOf"),
        (Self::REL_OVERRIDEOF, "overrideOf"),
        (Self::REL_RECEIVEDBY, "receivedBy"),
        (Self::REL_CALLEDBY, "calledBy"),
        (Self::REL_EXTENDEDBY, "extendedBy"),
        (Self::REL_ACCESSOROF, "accessorOf"),
        (Self::REL_CONTAINEDBY, "containedBy"),
        (Self::REL_IBTYPEOF, "ibTypeOf"),
        (Self::REL_SPECIALIZATIONOF, "specializationOf"),
        (Self::CANONICAL, "canon"),
    ];

    /// Creates a set from raw bits. Unknown bits are preserved.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns true if every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if any bit of `other` is set.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns true if no bit is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Keeps only the relation roles.
    #[must_use]
    pub const fn relations(self) -> Self {
        Self(self.0 & Self::RELATION_MASK.0)
    }

    /// Names of the known roles that are set.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMED
            .iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
    }
}

impl std::ops::BitOr for SymbolRoles {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for SymbolRoles {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for SymbolRoles {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for SymbolRoles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.names().collect();
        f.write_str(&names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values() {
        assert_eq!(SymbolRoles::DECLARATION.bits(), 1);
        assert_eq!(SymbolRoles::IMPLICIT.bits(), 256);
        assert_eq!(SymbolRoles::UNDEFINITION.bits(), 1 << 19);
        assert_eq!(SymbolRoles::NAMEREFERENCE.bits(), 1 << 20);
        assert_eq!(SymbolRoles::REL_SPECIALIZATIONOF.bits(), 1 << 18);
    }

    #[test]
    fn relation_mask_covers_exactly_relation_roles() {
        let all_relations = SymbolRoles::REL_CHILDOF
            | SymbolRoles::REL_BASEOF
            | SymbolRoles::REL_OVERRIDEOF
            | SymbolRoles::REL_RECEIVEDBY
            | SymbolRoles::REL_CALLEDBY
            | SymbolRoles::REL_EXTENDEDBY
            | SymbolRoles::REL_ACCESSOROF
            | SymbolRoles::REL_CONTAINEDBY
            | SymbolRoles::REL_IBTYPEOF
            | SymbolRoles::REL_SPECIALIZATIONOF;
        assert_eq!(all_relations, SymbolRoles::RELATION_MASK);

        let mixed = SymbolRoles::CALL | SymbolRoles::REL_CALLEDBY;
        assert_eq!(mixed.relations(), SymbolRoles::REL_CALLEDBY);
    }

    #[test]
    fn display_lists_set_roles() {
        let roles = SymbolRoles::REFERENCE | SymbolRoles::CALL | SymbolRoles::REL_CALLEDBY;
        assert_eq!(roles.to_string(), "ref,call,calledBy");
        assert_eq!(SymbolRoles::NONE.to_string(), "");
    }

    #[test]
    fn all_contains_everything() {
        assert!(SymbolRoles::ALL.contains(SymbolRoles::CANONICAL));
        assert!(SymbolRoles::ALL.intersects(SymbolRoles::WRITE));
    }
}
