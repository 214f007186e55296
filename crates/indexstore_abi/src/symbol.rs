//! Symbol kinds, sub-kinds, languages and properties.
//!
//! Numeric values are part of the library's contract and must not change.
//! Values at 1000 and above are reserved for comment tags and for
//! language-specific (Swift) additions.

use crate::error::AbiError;
use std::fmt;

/// Declares a single-enumerator wire type with exact discriminants.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[repr(u32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value,)+
        }

        impl $name {
            /// Decodes a raw value, or `None` if it is not a known enumerator.
            #[must_use]
            pub const fn from_raw(raw: u32) -> Option<Self> {
                match raw {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Returns the raw value.
            #[must_use]
            pub const fn as_raw(self) -> u32 {
                self as u32
            }

            /// Returns a short lowercase name.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl TryFrom<u32> for $name {
            type Error = AbiError;

            fn try_from(raw: u32) -> Result<Self, Self::Error> {
                Self::from_raw(raw).ok_or_else(|| AbiError::unknown($label, raw))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

pub(crate) use wire_enum;

wire_enum! {
    /// Kind of a symbol.
    SymbolKind, "symbol kind" {
        /// Unknown.
        Unknown = 0 => "unknown",
        /// Module.
        Module = 1 => "module",
        /// Namespace.
        Namespace = 2 => "namespace",
        /// Namespace alias.
        NamespaceAlias = 3 => "namespace-alias",
        /// Macro.
        Macro = 4 => "macro",
        /// Enum.
        Enum = 5 => "enum",
        /// Struct.
        Struct = 6 => "struct",
        /// Class.
        Class = 7 => "class",
        /// Protocol.
        Protocol = 8 => "protocol",
        /// Extension.
        Extension = 9 => "extension",
        /// Union.
        Union = 10 => "union",
        /// Type alias.
        TypeAlias = 11 => "type-alias",
        /// Free function.
        Function = 12 => "function",
        /// Variable.
        Variable = 13 => "variable",
        /// Field.
        Field = 14 => "field",
        /// Enum constant.
        EnumConstant = 15 => "enum-constant",
        /// Instance method.
        InstanceMethod = 16 => "instance-method",
        /// Class method.
        ClassMethod = 17 => "class-method",
        /// Static method.
        StaticMethod = 18 => "static-method",
        /// Instance property.
        InstanceProperty = 19 => "instance-property",
        /// Class property.
        ClassProperty = 20 => "class-property",
        /// Static property.
        StaticProperty = 21 => "static-property",
        /// Constructor.
        Constructor = 22 => "constructor",
        /// Destructor.
        Destructor = 23 => "destructor",
        /// Conversion function.
        ConversionFunction = 24 => "conversion-function",
        /// Parameter.
        Parameter = 25 => "parameter",
        /// Using declaration.
        Using = 26 => "using",
        /// Concept.
        Concept = 27 => "concept",
        /// Comment tag.
        CommentTag = 1000 => "comment-tag",
    }
}

wire_enum! {
    /// Sub-kind refining a symbol's kind.
    SymbolSubKind, "symbol sub-kind" {
        /// No sub-kind.
        None = 0 => "none",
        /// C++ copy constructor.
        CxxCopyConstructor = 1 => "cxx-copy-constructor",
        /// C++ move constructor.
        CxxMoveConstructor = 2 => "cxx-move-constructor",
        /// Getter accessor.
        AccessorGetter = 3 => "accessor-getter",
        /// Setter accessor.
        AccessorSetter = 4 => "accessor-setter",
        /// `using typename`.
        UsingTypeName = 5 => "using-typename",
        /// `using` value.
        UsingValue = 6 => "using-value",
        /// `using enum`.
        UsingEnum = 7 => "using-enum",
        /// Swift `willSet`.
        SwiftAccessorWillSet = 1000 => "swift-accessor-willset",
        /// Swift `didSet`.
        SwiftAccessorDidSet = 1001 => "swift-accessor-didset",
        /// Swift addressor.
        SwiftAccessorAddressor = 1002 => "swift-accessor-addressor",
        /// Swift mutable addressor.
        SwiftAccessorMutableAddressor = 1003 => "swift-accessor-mutable-addressor",
        /// Swift extension of a struct.
        SwiftExtensionOfStruct = 1004 => "swift-extension-of-struct",
        /// Swift extension of a class.
        SwiftExtensionOfClass = 1005 => "swift-extension-of-class",
        /// Swift extension of an enum.
        SwiftExtensionOfEnum = 1006 => "swift-extension-of-enum",
        /// Swift extension of a protocol.
        SwiftExtensionOfProtocol = 1007 => "swift-extension-of-protocol",
        /// Swift prefix operator.
        SwiftPrefixOperator = 1008 => "swift-prefix-operator",
        /// Swift postfix operator.
        SwiftPostfixOperator = 1009 => "swift-postfix-operator",
        /// Swift infix operator.
        SwiftInfixOperator = 1010 => "swift-infix-operator",
        /// Swift subscript.
        SwiftSubscript = 1011 => "swift-subscript",
        /// Swift associated type.
        SwiftAssociatedType = 1012 => "swift-associatedtype",
        /// Swift generic type parameter.
        SwiftGenericTypeParam = 1013 => "swift-generic-type-param",
        /// Swift `_read` accessor.
        SwiftAccessorRead = 1014 => "swift-accessor-read",
        /// Swift `_modify` accessor.
        SwiftAccessorModify = 1015 => "swift-accessor-modify",
        /// Swift `init` accessor.
        SwiftAccessorInit = 1016 => "swift-accessor-init",
    }
}

wire_enum! {
    /// Source language of a symbol.
    SymbolLanguage, "symbol language" {
        /// C.
        C = 0 => "c",
        /// Objective-C.
        ObjC = 1 => "objc",
        /// C++.
        Cxx = 2 => "cxx",
        /// Swift.
        Swift = 100 => "swift",
    }
}

/// Set of symbol properties. Bit 16 and above are language-specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SymbolProperties(u64);

impl SymbolProperties {
    /// No properties.
    pub const NONE: Self = Self(0);
    /// Generic.
    pub const GENERIC: Self = Self(1 << 0);
    /// Template partial specialization.
    pub const TEMPLATE_PARTIAL_SPECIALIZATION: Self = Self(1 << 1);
    /// Template specialization.
    pub const TEMPLATE_SPECIALIZATION: Self = Self(1 << 2);
    /// Unit test.
    pub const UNITTEST: Self = Self(1 << 3);
    /// Interface Builder annotated.
    pub const IBANNOTATED: Self = Self(1 << 4);
    /// Interface Builder outlet collection.
    pub const IBOUTLETCOLLECTION: Self = Self(1 << 5);
    /// GameplayKit inspectable.
    pub const GKINSPECTABLE: Self = Self(1 << 6);
    /// Local.
    pub const LOCAL: Self = Self(1 << 7);
    /// Protocol interface.
    pub const PROTOCOL_INTERFACE: Self = Self(1 << 8);
    /// Swift `async`.
    pub const SWIFT_ASYNC: Self = Self(1 << 16);

    const NAMED: &'static [(Self, &'static str)] = &[
        (Self::GENERIC, "generic"),
        (Self::TEMPLATE_PARTIAL_SPECIALIZATION, "template-partial-specialization"),
        (Self::TEMPLATE_SPECIALIZATION, "template-specialization"),
        (Self::UNITTEST, "unittest"),
        (Self::IBANNOTATED, "ibannotated"),
        (Self::IBOUTLETCOLLECTION, "iboutletcollection"),
        (Self::GKINSPECTABLE, "gkinspectable"),
        (Self::LOCAL, "local"),
        (Self::PROTOCOL_INTERFACE, "protocol-interface"),
        (Self::SWIFT_ASYNC, "swift-async"),
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

    /// Returns true if no bit is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Names of the known properties that are set.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMED
            .iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
    }
}

impl std::ops::BitOr for SymbolProperties {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for SymbolProperties {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for SymbolProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.names().collect();
        f.write_str(&names.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_wire_values() {
        assert_eq!(SymbolKind::Function.as_raw(), 12);
        assert_eq!(SymbolKind::Concept.as_raw(), 27);
        assert_eq!(SymbolKind::CommentTag.as_raw(), 1000);
        assert_eq!(SymbolKind::from_raw(16), Some(SymbolKind::InstanceMethod));
        assert_eq!(SymbolKind::from_raw(28), None);
    }

    #[test]
    fn subkind_swift_island() {
        assert_eq!(SymbolSubKind::UsingEnum.as_raw(), 7);
        assert_eq!(SymbolSubKind::SwiftAccessorWillSet.as_raw(), 1000);
        assert_eq!(
            SymbolSubKind::from_raw(1016),
            Some(SymbolSubKind::SwiftAccessorInit)
        );
        assert_eq!(SymbolSubKind::from_raw(8), None);
    }

    #[test]
    fn language_values() {
        assert_eq!(SymbolLanguage::Swift.as_raw(), 100);
        assert_eq!(SymbolLanguage::try_from(2), Ok(SymbolLanguage::Cxx));
        assert!(SymbolLanguage::try_from(3).is_err());
    }

    #[test]
    fn properties_combine() {
        let props = SymbolProperties::GENERIC | SymbolProperties::SWIFT_ASYNC;
        assert_eq!(props.bits(), 0x1_0001);
        assert!(props.contains(SymbolProperties::SWIFT_ASYNC));
        assert!(!props.contains(SymbolProperties::LOCAL));
        assert_eq!(props.to_string(), "generic|swift-async");
    }

    #[test]
    fn display_names() {
        assert_eq!(SymbolKind::InstanceMethod.to_string(), "instance-method");
        assert_eq!(SymbolLanguage::ObjC.to_string(), "objc");
    }
}
