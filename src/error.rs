//! Error types for the pnglatex library.
//!
//! A single [`PngLatexError`] covers every way a render can fail. Callers that
//! only care about the broad cause use [`PngLatexError::kind`], which folds the
//! variants into the three families a caller can act on:
//!
//! * [`ErrorKind::Input`]: the request itself is unusable (empty snippet,
//!   invalid configuration). Nothing was spawned or written.
//!
//! * [`ErrorKind::ToolResolution`]: one of the four external programs is not
//!   installed. Detected before any process runs.
//!
//! * [`ErrorKind::Generation`]: the pipeline ran but did not produce a PNG.
//!   Intermediate files and any partial output have already been removed
//!   when the caller sees this.

use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::Stage;

/// All errors returned by the pnglatex library.
#[derive(Debug, Error)]
pub enum PngLatexError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The LaTeX snippet was empty.
    #[error("LaTeX expression cannot be empty!")]
    EmptyInput,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Tool resolution ───────────────────────────────────────────────────
    /// A required external executable could not be located.
    #[error(
        "Executable {tool} not found (tried: {})\n\
Install it or point pnglatex at it with --{tool}.",
        .tried.join(", ")
    )]
    ToolNotFound { tool: String, tried: Vec<String> },

    // ── Generation errors ─────────────────────────────────────────────────
    /// Every job name drawn collided with a file in the working directory.
    #[error("Could not find a free job name after {attempts} attempts")]
    JobNameExhausted { attempts: usize },

    /// The working directory could not be listed.
    #[error("Cannot read working directory '{path}': {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external process could not be started.
    #[error("Failed to start the {stage} stage: {source}")]
    Spawn {
        stage: Stage,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on an external process failed at the OS level.
    #[error("Failed while waiting for the {stage} stage: {source}")]
    Wait {
        stage: Stage,
        #[source]
        source: std::io::Error,
    },

    /// A stage ran past the configured timeout and was killed.
    #[error("The {stage} stage timed out after {secs}s and was killed")]
    StageTimeout { stage: Stage, secs: u64 },

    /// The destination PNG could not be created.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The final stage did not produce a valid PNG.
    #[error("Failed to generate png file.{}", format_generation_detail(.status, .detail))]
    GenerationFailed { status: Option<i32>, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Broad failure families, see the module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    ToolResolution,
    Generation,
}

impl PngLatexError {
    /// Classify this error into one of the three failure families.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PngLatexError::EmptyInput | PngLatexError::InvalidConfig(_) => ErrorKind::Input,
            PngLatexError::ToolNotFound { .. } => ErrorKind::ToolResolution,
            PngLatexError::JobNameExhausted { .. }
            | PngLatexError::WorkDir { .. }
            | PngLatexError::Spawn { .. }
            | PngLatexError::Wait { .. }
            | PngLatexError::StageTimeout { .. }
            | PngLatexError::OutputWriteFailed { .. }
            | PngLatexError::GenerationFailed { .. }
            | PngLatexError::Internal(_) => ErrorKind::Generation,
        }
    }
}

impl From<toolpath::LocateError> for PngLatexError {
    fn from(e: toolpath::LocateError) -> Self {
        match e {
            toolpath::LocateError::NotFound { name, tried } => {
                PngLatexError::ToolNotFound { tool: name, tried }
            }
            toolpath::LocateError::InvalidName(name) => {
                PngLatexError::InvalidConfig(format!("invalid executable name '{name}'"))
            }
        }
    }
}

fn format_generation_detail(status: &Option<i32>, detail: &str) -> String {
    let mut out = String::new();
    match status {
        Some(0) => {}
        Some(code) => out.push_str(&format!("\nEncoder exited with status {code}.")),
        None => out.push_str("\nEncoder was terminated by a signal."),
    }
    if !detail.is_empty() {
        out.push('\n');
        out.push_str(detail);
    }
    out
}
