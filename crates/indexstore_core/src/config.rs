//! Library loading configuration and discovery.

use crate::error::LoadError;
use indexstore_abi::{AbiVersion, REQUIRED_VERSION};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable consulted when no explicit library path is given.
pub const LIBRARY_PATH_ENV: &str = "INDEXSTORE_LIBRARY_PATH";

#[cfg(target_os = "macos")]
const LIBRARY_FILE_NAME: &str = "libIndexStore.dylib";
#[cfg(windows)]
const LIBRARY_FILE_NAME: &str = "IndexStore.dll";
#[cfg(not(any(target_os = "macos", windows)))]
const LIBRARY_FILE_NAME: &str = "libIndexStore.so";

/// Configuration for loading the index store library.
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    /// Explicit path to the library. Takes precedence over discovery.
    pub library_path: Option<PathBuf>,

    /// API version the library must be compatible with.
    pub required_version: AbiVersion,

    /// If set, the library's format version must equal this value.
    pub required_format_version: Option<u32>,

    /// Use the closure calling convention when the library supports it.
    pub prefer_closures: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            library_path: None,
            required_version: REQUIRED_VERSION,
            required_format_version: None,
            prefer_closures: true,
        }
    }
}

impl LibraryConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an explicit library path.
    #[must_use]
    pub fn library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    /// Sets the required API version.
    #[must_use]
    pub const fn required_version(mut self, version: AbiVersion) -> Self {
        self.required_version = version;
        self
    }

    /// Requires an exact format version.
    #[must_use]
    pub const fn required_format_version(mut self, version: u32) -> Self {
        self.required_format_version = Some(version);
        self
    }

    /// Sets whether the closure calling convention is preferred.
    #[must_use]
    pub const fn prefer_closures(mut self, value: bool) -> Self {
        self.prefer_closures = value;
        self
    }

    /// Determines which library file to load.
    ///
    /// Order: the explicit path, then [`LIBRARY_PATH_ENV`], then the active
    /// toolchain.
    pub fn resolve_library_path(&self) -> Result<PathBuf, LoadError> {
        select_library_path(
            self.library_path.as_deref(),
            std::env::var_os(LIBRARY_PATH_ENV),
            probe_toolchain,
        )
    }
}

fn select_library_path(
    explicit: Option<&Path>,
    from_env: Option<OsString>,
    probe: impl FnOnce() -> Option<PathBuf>,
) -> Result<PathBuf, LoadError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = from_env.filter(|value| !value.is_empty()) {
        debug!(env = LIBRARY_PATH_ENV, "using library path from environment");
        return Ok(PathBuf::from(path));
    }
    probe().ok_or_else(|| {
        LoadError::LibraryNotFound(format!(
            "no path configured, {LIBRARY_PATH_ENV} unset and no {LIBRARY_FILE_NAME} found in the active toolchain"
        ))
    })
}

/// Looks for the library next to the active toolchain.
#[cfg(target_os = "macos")]
fn probe_toolchain() -> Option<PathBuf> {
    let output = std::process::Command::new("xcode-select")
        .arg("--print-path")
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let developer_dir = String::from_utf8(output.stdout).ok()?;
    let candidate = Path::new(developer_dir.trim())
        .join("Toolchains/XcodeDefault.xctoolchain/usr/lib")
        .join(LIBRARY_FILE_NAME);
    debug!(candidate = %candidate.display(), "probing Xcode toolchain");
    candidate.is_file().then_some(candidate)
}

/// Looks for the library next to the active toolchain.
#[cfg(not(target_os = "macos"))]
fn probe_toolchain() -> Option<PathBuf> {
    let swift = which::which("swift").ok()?;
    let swift = std::fs::canonicalize(&swift).unwrap_or(swift);
    let candidate = library_beside_executable(&swift)?;
    debug!(candidate = %candidate.display(), "probing swift toolchain");
    candidate.is_file().then_some(candidate)
}

/// `<prefix>/bin/swift` maps to `<prefix>/lib/<library>`.
#[cfg_attr(target_os = "macos", allow(dead_code))]
fn library_beside_executable(executable: &Path) -> Option<PathBuf> {
    let prefix = executable.parent()?.parent()?;
    Some(prefix.join("lib").join(LIBRARY_FILE_NAME))
}
