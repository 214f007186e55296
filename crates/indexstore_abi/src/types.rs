//! Boundary types shared with the C API.

use std::ffi::{c_char, c_int, c_ulong, c_void};

/// Opaque error object produced by fallible operations.
pub type RawError = *mut c_void;
/// Opaque store handle.
pub type RawStore = *mut c_void;
/// Opaque store creation options.
pub type RawCreationOptions = *mut c_void;
/// Opaque batch of unit events passed to an event handler.
pub type RawUnitEventNotification = *mut c_void;
/// Opaque single unit event.
pub type RawUnitEvent = *mut c_void;
/// Opaque symbol view.
pub type RawSymbol = *mut c_void;
/// Opaque symbol relation view.
pub type RawSymbolRelation = *mut c_void;
/// Opaque occurrence view.
pub type RawOccurrence = *mut c_void;
/// Opaque record reader.
pub type RawRecordReader = *mut c_void;
/// Opaque unit reader.
pub type RawUnitReader = *mut c_void;
/// Opaque unit dependency view.
pub type RawUnitDependency = *mut c_void;
/// Opaque unit include view.
pub type RawUnitInclude = *mut c_void;

/// A borrowed string crossing the boundary.
///
/// The bytes are not guaranteed to be NUL-terminated and are only valid for
/// as long as the handle they were read from.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StringRef {
    /// Pointer to the first byte, or null.
    pub data: *const c_char,
    /// Number of bytes.
    pub length: usize,
}

impl StringRef {
    /// A null reference.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            data: std::ptr::null(),
            length: 0,
        }
    }

    /// Builds a reference over `bytes`. The caller keeps `bytes` alive.
    #[must_use]
    pub const fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.as_ptr().cast(),
            length: bytes.len(),
        }
    }

    /// Returns true if the data pointer is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }
}

/// Options for `store_start_unit_event_listening`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenOptions {
    /// If true, starting to listen blocks until the initial set of units has
    /// been passed to the event handler.
    pub wait_initial_sync: bool,
}

impl ListenOptions {
    /// Sets whether to wait for the initial snapshot.
    #[must_use]
    pub const fn wait_initial_sync(mut self, value: bool) -> Self {
        self.wait_initial_sync = value;
        self
    }
}

/// Symbol naming the block runtime's class object for stack blocks.
pub const STACK_BLOCK_ISA_SYMBOL: &str = "_NSConcreteStackBlock";

/// Leading fields of a block literal, the callable object used by the
/// closure calling convention.
///
/// `invoke` is called with the block pointer as its first argument followed
/// by the applier's own arguments. Captured state follows the header.
#[repr(C)]
#[derive(Debug)]
pub struct BlockLiteralHeader {
    /// Class object of the block (stack, global or heap).
    pub isa: *const c_void,
    /// Block flags. Zero for a plain stack block without helpers.
    pub flags: c_int,
    /// Reserved, zero.
    pub reserved: c_int,
    /// Entry point.
    pub invoke: *const c_void,
    /// Size descriptor.
    pub descriptor: *const BlockDescriptor,
}

/// Descriptor referenced by every block literal.
#[repr(C)]
#[derive(Debug)]
pub struct BlockDescriptor {
    /// Reserved, zero.
    pub reserved: c_ulong,
    /// Size of the whole block literal in bytes.
    pub size: c_ulong,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_ref_over_bytes() {
        let bytes = b"c:@F@main";
        let r = StringRef::from_bytes(bytes);
        assert!(!r.is_null());
        assert_eq!(r.length, 9);
    }

    #[test]
    fn null_string_ref() {
        assert!(StringRef::null().is_null());
    }

    #[test]
    fn listen_options_builder() {
        assert!(!ListenOptions::default().wait_initial_sync);
        assert!(ListenOptions::default().wait_initial_sync(true).wait_initial_sync);
    }

    #[test]
    #[cfg(all(target_pointer_width = "64", not(windows)))]
    fn block_header_layout() {
        assert_eq!(std::mem::size_of::<BlockLiteralHeader>(), 32);
        assert_eq!(std::mem::size_of::<BlockDescriptor>(), 16);
    }
}
