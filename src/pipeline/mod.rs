//! Pipeline stages for LaTeX-to-PNG rendering.
//!
//! Each submodule owns exactly one concern of a render run. The external
//! programs do the real work; this crate only names the job, feeds the
//! compiler, wires the processes together and cleans up after them.
//!
//! ## Data Flow
//!
//! ```text
//! snippet ──▶ document ──▶ compile ──▶ crop ──▶ rasterize ══▶ encode ──▶ PNG
//!             (template)   (pdflatex)  (pdfcrop) (pdf2ppm)  pipe (pnm2png)
//! ```
//!
//! 1. [`job`]: draw a job name no file in the working directory contains
//! 2. [`document`]: wrap the snippet in a minimal compilable document
//! 3. [`stages`]: run the four external programs; only rasterize → encode
//!    overlap, joined by an OS pipe
//! 4. [`cleanup`]: guards that remove intermediates (always) and a partial
//!    output file (on failure)
//!
//! [`process`] holds the child-process guard with the bounded wait, and
//! [`texlog`] pulls the first error out of the compiler's log for
//! diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tools::Tool;

pub mod cleanup;
pub mod document;
pub mod job;
pub(crate) mod process;
pub(crate) mod stages;
pub mod texlog;

/// One external program invocation in the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// LaTeX source → `{job}.pdf`.
    Compile,
    /// `{job}.pdf` → `{job}-crop.pdf`.
    Crop,
    /// `{job}-crop.pdf` → bitmap stream on stdout.
    Rasterize,
    /// Bitmap stream on stdin → PNG on stdout.
    Encode,
}

impl Stage {
    /// Stages in execution order.
    pub const ALL: [Stage; 4] = [Stage::Compile, Stage::Crop, Stage::Rasterize, Stage::Encode];

    /// The external tool this stage invokes.
    pub fn tool(self) -> Tool {
        match self {
            Stage::Compile => Tool::Compiler,
            Stage::Crop => Tool::Cropper,
            Stage::Rasterize => Tool::Rasterizer,
            Stage::Encode => Tool::Encoder,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Compile => "compile",
            Stage::Crop => "crop",
            Stage::Rasterize => "rasterize",
            Stage::Encode => "encode",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
