//! Job names: short random tokens used as the stem of every intermediate file.
//!
//! A token is only handed out if no entry of the working directory contains
//! it anywhere in its name, so `{job}.aux` can never clobber a user's file and
//! cleanup can never delete one. Retries are capped at
//! [`MAX_JOB_NAME_ATTEMPTS`].

use crate::error::PngLatexError;
use std::ffi::OsString;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

/// Bytes of randomness per token (rendered as twice as many hex digits).
pub const JOB_NAME_BYTES: usize = 6;

/// How many tokens to draw before giving up.
pub const MAX_JOB_NAME_ATTEMPTS: usize = 16;

/// Draw a fresh random token: 12 lowercase hex characters.
pub fn random_token() -> String {
    let id = Uuid::new_v4();
    id.as_bytes()[..JOB_NAME_BYTES]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Generate a job name unique among the entries of `dir`.
pub fn generate_job_name(dir: &Path) -> Result<String, PngLatexError> {
    generate_job_name_with(dir, MAX_JOB_NAME_ATTEMPTS, random_token)
}

/// Generate a job name using `next_token` as the source of candidates.
///
/// The directory is listed once; each candidate is checked against every
/// entry name as a substring.
pub fn generate_job_name_with(
    dir: &Path,
    max_attempts: usize,
    mut next_token: impl FnMut() -> String,
) -> Result<String, PngLatexError> {
    let existing = list_entry_names(dir)?;

    for attempt in 1..=max_attempts {
        let token = next_token();
        if !collides(&token, &existing) {
            debug!("Job name {} chosen after {} attempt(s)", token, attempt);
            return Ok(token);
        }
        debug!("Job name {} collides with an existing file, retrying", token);
    }

    Err(PngLatexError::JobNameExhausted {
        attempts: max_attempts,
    })
}

fn list_entry_names(dir: &Path) -> Result<Vec<OsString>, PngLatexError> {
    let to_err = |source: std::io::Error| PngLatexError::WorkDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(to_err)? {
        names.push(entry.map_err(to_err)?.file_name());
    }
    Ok(names)
}

fn collides(token: &str, names: &[OsString]) -> bool {
    names
        .iter()
        .any(|name| name.to_string_lossy().contains(token))
}
