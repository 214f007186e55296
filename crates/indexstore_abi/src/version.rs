//! API version constants and compatibility rule.

use std::fmt;

/// An index store API version.
///
/// The library reports its version as a single integer built as
/// `major * 10000 + minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AbiVersion {
    /// Incremented on source or ABI breaking changes.
    pub major: u32,
    /// Incremented on API additions.
    pub minor: u32,
}

/// The version this access layer requires (0.15, Swift init accessor sub-symbol).
pub const REQUIRED_VERSION: AbiVersion = AbiVersion::new(0, 15);

impl AbiVersion {
    const MAJOR_SCALE: u32 = 10_000;

    /// Creates a version from its parts.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Encodes the version the way the library reports it.
    #[must_use]
    pub const fn encode(self) -> u32 {
        self.major * Self::MAJOR_SCALE + self.minor
    }

    /// Decodes a version reported by the library.
    #[must_use]
    pub const fn decode(raw: u32) -> Self {
        Self {
            major: raw / Self::MAJOR_SCALE,
            minor: raw % Self::MAJOR_SCALE,
        }
    }

    /// Returns true if a library reporting `reported` satisfies `self`.
    ///
    /// Majors must match exactly; the reported minor must be at least the
    /// required one.
    #[must_use]
    pub const fn is_compatible_with(self, reported: AbiVersion) -> bool {
        self.major == reported.major && self.minor <= reported.minor
    }
}

impl fmt::Display for AbiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_matches_header_macro() {
        assert_eq!(AbiVersion::new(0, 15).encode(), 15);
        assert_eq!(AbiVersion::new(1, 3).encode(), 10_003);
    }

    #[test]
    fn decode_splits_major_and_minor() {
        assert_eq!(AbiVersion::decode(15), AbiVersion::new(0, 15));
        assert_eq!(AbiVersion::decode(20_001), AbiVersion::new(2, 1));
    }

    #[test]
    fn compatibility_rule() {
        let required = REQUIRED_VERSION;
        assert!(required.is_compatible_with(AbiVersion::new(0, 15)));
        assert!(required.is_compatible_with(AbiVersion::new(0, 16)));
        assert!(!required.is_compatible_with(AbiVersion::new(0, 14)));
        assert!(!required.is_compatible_with(AbiVersion::new(1, 15)));
    }

    #[test]
    fn display() {
        assert_eq!(REQUIRED_VERSION.to_string(), "0.15");
    }
}
