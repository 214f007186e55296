//! Unit dependency and unit event kinds.

use crate::error::AbiError;
use crate::symbol::wire_enum;
use std::fmt;

wire_enum! {
    /// What a unit dependency points at.
    DependencyKind, "unit dependency kind" {
        /// Another unit.
        Unit = 1 => "unit",
        /// A record holding symbol data for a file.
        Record = 2 => "record",
        /// A plain file with no record.
        File = 3 => "file",
    }
}

wire_enum! {
    /// Kind of change reported to a unit event handler.
    UnitEventKind, "unit event kind" {
        /// A unit was added.
        Added = 1 => "added",
        /// A unit was removed.
        Removed = 2 => "removed",
        /// A unit was modified.
        Modified = 3 => "modified",
        /// The units directory was deleted.
        DirectoryDeleted = 4 => "directory-deleted",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_kinds() {
        assert_eq!(DependencyKind::from_raw(2), Some(DependencyKind::Record));
        assert_eq!(DependencyKind::from_raw(0), None);
        assert_eq!(DependencyKind::File.to_string(), "file");
    }

    #[test]
    fn event_kinds() {
        assert_eq!(UnitEventKind::DirectoryDeleted.as_raw(), 4);
        let err = UnitEventKind::try_from(9).unwrap_err();
        assert_eq!(err.to_string(), "unknown unit event kind value: 9");
    }
}
