//! Result types returned by a successful render.

use crate::pipeline::Stage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::ExitStatus;

/// Everything a caller may want to know about a finished render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutput {
    /// Absolute path of the written PNG.
    pub path: PathBuf,
    /// Job name used as the stem of the (now removed) intermediate files.
    pub job_name: String,
    /// PNG width in pixels.
    pub width: u32,
    /// PNG height in pixels.
    pub height: u32,
    /// Size of the PNG file in bytes.
    pub file_size: u64,
    /// One entry per stage, in execution order.
    pub stages: Vec<StageReport>,
    /// Wall-clock time for the whole call, cleanup included.
    pub duration_ms: u64,
}

/// Outcome of one external process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    /// Exit code; `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
    pub success: bool,
    pub elapsed_ms: u64,
}

impl StageReport {
    pub(crate) fn new(stage: Stage, status: ExitStatus, elapsed_ms: u64) -> Self {
        Self {
            stage,
            exit_code: status.code(),
            success: status.success(),
            elapsed_ms,
        }
    }
}
