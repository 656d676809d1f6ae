//! # toolpath
//!
//! Resolve external command-line tools by name against the executable search
//! path, the way a shell would, so callers can fail fast with a clear message
//! before spawning anything.
//!
//! ## How it works
//!
//! On each call to [`locate`]:
//!
//! 1. Splits the search path (`PATH` unless the caller supplies one).
//! 2. Checks every directory for a regular file with the requested name that
//!    is executable (Unix: any execute bit; Windows: `.exe` is also tried).
//! 3. If nothing matched and the name contains the digit `2`, repeats the
//!    search for the spelled-out alias (`pdf2ppm` → `pdftoppm`).
//!
//! Nothing is cached: tools installed or removed between two calls are seen
//! by the second one.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use toolpath::locate;
//!
//! let rasterizer = locate("pdf2ppm", None).expect("poppler-utils is not installed");
//! println!("using {}", rasterizer.display());
//! ```

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by toolpath lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    /// No candidate name resolved to an executable on the search path.
    #[error("Executable '{name}' not found on the search path (tried: {})", .tried.join(", "))]
    NotFound { name: String, tried: Vec<String> },

    /// The name is empty or contains a path separator.
    #[error("Invalid executable name '{0}'")]
    InvalidName(String),
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Names to try for `name`, in order.
///
/// The primary spelling always comes first. Only names containing the digit
/// `2` get a second candidate, with every `2` spelled out as `to`.
pub fn candidate_names(name: &str) -> Vec<String> {
    let mut names = vec![name.to_string()];
    if name.contains('2') {
        names.push(name.replace('2', "to"));
    }
    names
}

/// Resolve `name` to an executable path.
///
/// `search_path` overrides the `PATH` environment variable when given; it
/// uses the platform's path-list syntax (`:` on Unix, `;` on Windows).
pub fn locate(name: &str, search_path: Option<&OsStr>) -> Result<PathBuf, LocateError> {
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(LocateError::InvalidName(name.to_string()));
    }

    let search_path: OsString = match search_path {
        Some(p) => p.to_os_string(),
        None => std::env::var_os("PATH").unwrap_or_default(),
    };

    let tried = candidate_names(name);
    for candidate in &tried {
        if let Some(found) = find_in(candidate, &search_path) {
            debug!("Resolved '{}' → {}", name, found.display());
            return Ok(found);
        }
    }

    Err(LocateError::NotFound {
        name: name.to_string(),
        tried,
    })
}

/// Returns `true` when `path` points at something we are allowed to execute.
pub fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn find_in(name: &str, search_path: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(search_path) {
        // POSIX reads an empty entry as the current directory; we don't.
        if dir.as_os_str().is_empty() {
            continue;
        }
        for file_name in platform_file_names(name) {
            let candidate = dir.join(&file_name);
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(windows)]
fn platform_file_names(name: &str) -> Vec<String> {
    if Path::new(name).extension().is_some() {
        vec![name.to_string()]
    } else {
        vec![format!("{name}.exe"), name.to_string()]
    }
}

#[cfg(not(windows))]
fn platform_file_names(name: &str) -> Vec<String> {
    vec![name.to_string()]
}
