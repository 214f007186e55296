//! Conversions for text crossing the boundary.

use crate::error::{IndexStoreError, IndexStoreResult};
use indexstore_abi::StringRef;
use std::ffi::{c_char, CStr, CString};
use std::path::Path;

/// Copies a borrowed string into an owned one.
///
/// The bytes are read by length and never assumed to be NUL-terminated.
/// Invalid UTF-8 is replaced.
///
/// # Safety
///
/// `value.data` must be null or point to `value.length` readable bytes.
pub(crate) unsafe fn copy_string_ref(value: StringRef) -> String {
    if value.data.is_null() || value.length == 0 {
        return String::new();
    }
    let bytes = std::slice::from_raw_parts(value.data.cast::<u8>(), value.length);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Copies a NUL-terminated string, or returns an empty one for null.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn copy_c_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Converts a name to a C string, rejecting interior NUL bytes.
pub(crate) fn to_c_string(value: &str) -> IndexStoreResult<CString> {
    CString::new(value)
        .map_err(|_| IndexStoreError::invalid_argument(format!("interior NUL in {value:?}")))
}

/// Converts a path to a C string.
pub(crate) fn path_to_c_string(path: &Path) -> IndexStoreResult<CString> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        CString::new(path.as_os_str().as_bytes()).map_err(|_| {
            IndexStoreError::invalid_argument(format!("interior NUL in {}", path.display()))
        })
    }
    #[cfg(not(unix))]
    {
        let text = path.to_str().ok_or_else(|| {
            IndexStoreError::invalid_argument(format!("non UTF-8 path {}", path.display()))
        })?;
        to_c_string(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_by_length() {
        let bytes = b"mainXXXX";
        let value = StringRef {
            data: bytes.as_ptr().cast(),
            length: 4,
        };
        assert_eq!(unsafe { copy_string_ref(value) }, "main");
    }

    #[test]
    fn null_and_empty() {
        assert_eq!(unsafe { copy_string_ref(StringRef::null()) }, "");
        assert_eq!(unsafe { copy_c_string(std::ptr::null()) }, "");
    }

    #[test]
    fn lossy_utf8() {
        let bytes = [b'a', 0xff, b'b'];
        let value = StringRef::from_bytes(&bytes);
        assert_eq!(unsafe { copy_string_ref(value) }, "a\u{fffd}b");
    }

    #[test]
    fn c_string_round() {
        let owned = CString::new("unit-name").unwrap();
        assert_eq!(unsafe { copy_c_string(owned.as_ptr()) }, "unit-name");
    }

    #[test]
    fn interior_nul_rejected() {
        let err = to_c_string("a\0b").unwrap_err();
        assert!(matches!(err, IndexStoreError::InvalidArgument(_)));
        assert!(path_to_c_string(Path::new("/tmp/store")).is_ok());
    }
}
