//! Diagnostics: pull the first error out of a pdflatex `.log` file.
//!
//! The compiler's exit status is deliberately not a failure signal (the
//! encoder's is), so when a render fails the log is the only place that says
//! *why*. TeX reports errors as a line starting with `! ` followed, a few
//! lines later, by `l.<n> <source text>` pointing at the offending input
//! line. The log is read before cleanup removes it.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::Path;

static RE_ERROR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^! (.+?)\s*$").unwrap());

static RE_LOCATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^l\.(\d+)\s?(.*?)\s*$").unwrap());

/// How many lines after the `!` line to search for the `l.<n>` marker.
const LOCATION_WINDOW: usize = 8;

/// The first error TeX reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexError {
    /// Message without the leading `! `.
    pub message: String,
    /// Line number in the wrapped document, when TeX gave one.
    pub line: Option<u32>,
    /// Source text TeX had read up to the error.
    pub context: Option<String>,
}

impl fmt::Display for TexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(line) = self.line {
            write!(f, " (line {line}")?;
            match &self.context {
                Some(ctx) if !ctx.is_empty() => write!(f, ": {ctx})")?,
                _ => write!(f, ")")?,
            }
        }
        Ok(())
    }
}

/// Find the first error in the text of a TeX log.
pub fn first_error(log: &str) -> Option<TexError> {
    let lines: Vec<&str> = log.lines().collect();
    let (idx, caps) = lines
        .iter()
        .enumerate()
        .find_map(|(i, l)| RE_ERROR.captures(l).map(|c| (i, c)))?;
    let message = caps[1].to_string();

    let location = lines
        .iter()
        .skip(idx + 1)
        .take(LOCATION_WINDOW)
        .find_map(|l| RE_LOCATION.captures(l));

    let (line, context) = match location {
        Some(c) => (
            c[1].parse().ok(),
            Some(c[2].to_string()).filter(|s| !s.is_empty()),
        ),
        None => (None, None),
    };

    Some(TexError {
        message,
        line,
        context,
    })
}

/// Read `path` (lossily, TeX logs are not always UTF-8) and find its first
/// error. A missing or unreadable log yields `None`.
pub fn first_error_in_file(path: &Path) -> Option<TexError> {
    let bytes = std::fs::read(path).ok()?;
    first_error(&String::from_utf8_lossy(&bytes))
}
