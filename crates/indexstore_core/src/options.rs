//! Store creation options.

use crate::error::{IndexStoreError, IndexStoreResult};
use crate::library::IndexStoreLibrary;
use crate::string::to_c_string;
use indexstore_abi::RawCreationOptions;
use std::fmt;

/// Builder for store creation options, such as path prefix remapping.
///
/// The options may be dropped as soon as the store has been opened.
pub struct CreationOptions {
    library: IndexStoreLibrary,
    raw: RawCreationOptions,
    prefix_mappings: Vec<(String, String)>,
}

impl CreationOptions {
    /// Creates an empty set of options.
    pub fn new(library: &IndexStoreLibrary) -> IndexStoreResult<Self> {
        // SAFETY: resolved with the catalogued signature.
        let raw = unsafe { (library.functions().creation_options_create)() };
        if raw.is_null() {
            return Err(IndexStoreError::protocol_violation(
                "creation_options_create",
                "returned a null handle",
            ));
        }
        Ok(Self {
            library: library.clone(),
            raw,
            prefix_mappings: Vec::new(),
        })
    }

    /// Remaps paths starting with `from` to start with `to` instead.
    pub fn add_prefix_mapping(&mut self, from: &str, to: &str) -> IndexStoreResult<&mut Self> {
        let c_from = to_c_string(from)?;
        let c_to = to_c_string(to)?;
        // SAFETY: `self.raw` is live; the strings outlive the call.
        unsafe {
            (self.library.functions().creation_options_add_prefix_mapping)(
                self.raw,
                c_from.as_ptr(),
                c_to.as_ptr(),
            );
        }
        self.prefix_mappings.push((from.to_owned(), to.to_owned()));
        Ok(self)
    }

    /// Mappings added so far, in order.
    #[must_use]
    pub fn prefix_mappings(&self) -> &[(String, String)] {
        &self.prefix_mappings
    }

    pub(crate) fn library(&self) -> &IndexStoreLibrary {
        &self.library
    }

    pub(crate) fn raw(&self) -> RawCreationOptions {
        self.raw
    }
}

impl Drop for CreationOptions {
    fn drop(&mut self) {
        // SAFETY: disposed exactly once, here.
        unsafe { (self.library.functions().creation_options_dispose)(self.raw) };
    }
}

impl fmt::Debug for CreationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreationOptions")
            .field("prefix_mappings", &self.prefix_mappings)
            .finish()
    }
}
