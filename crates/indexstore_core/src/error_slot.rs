//! The store's error out-parameter.

use crate::error::{IndexStoreError, StoreError};
use crate::library::IndexStoreLibrary;
use crate::string::copy_c_string;
use indexstore_abi::RawError;
use tracing::warn;

/// Receives an error object from a fallible operation.
///
/// Any error object written into the slot is copied out and disposed exactly
/// once, either by [`ErrorSlot::into_error`] or when the slot is dropped.
pub(crate) struct ErrorSlot<'l> {
    library: &'l IndexStoreLibrary,
    raw: RawError,
}

impl<'l> ErrorSlot<'l> {
    pub(crate) fn new(library: &'l IndexStoreLibrary) -> Self {
        Self {
            library,
            raw: std::ptr::null_mut(),
        }
    }

    /// Out-parameter to pass to the foreign call.
    pub(crate) fn as_out(&mut self) -> *mut RawError {
        &mut self.raw
    }

    /// Returns true if the library wrote an error object.
    pub(crate) fn is_set(&self) -> bool {
        !self.raw.is_null()
    }

    /// Takes the error object, if any, as an owned [`StoreError`].
    pub(crate) fn take(&mut self, operation: &'static str) -> Option<StoreError> {
        if self.raw.is_null() {
            return None;
        }
        let raw = std::mem::replace(&mut self.raw, std::ptr::null_mut());
        let functions = self.library.functions();
        // SAFETY: `raw` is a live error object owned by us; the description
        // is copied before the object is disposed.
        let description = unsafe {
            let description = copy_c_string((functions.error_get_description)(raw));
            (functions.error_dispose)(raw);
            description
        };
        Some(StoreError {
            operation,
            description,
        })
    }

    /// Converts a failed call into an error.
    ///
    /// A failure without an error object violates the error contract.
    pub(crate) fn into_error(mut self, operation: &'static str) -> IndexStoreError {
        match self.take(operation) {
            Some(err) => err.into(),
            None => IndexStoreError::protocol_violation(
                operation,
                "operation failed without producing an error object",
            ),
        }
    }
}

impl Drop for ErrorSlot<'_> {
    fn drop(&mut self) {
        if self.is_set() {
            if let Some(stray) = self.take("unused error") {
                warn!(
                    description = %stray.description,
                    "error object returned alongside success; released"
                );
            }
        }
    }
}
