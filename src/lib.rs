//! # pnglatex
//!
//! Render a LaTeX snippet to a tightly cropped PNG image.
//!
//! The crate does no typesetting or image processing of its own. It drives
//! the classic TeX toolchain (`pdflatex`, `pdfcrop`, `pdf2ppm`/`pdftoppm`,
//! `pnm2png`/`pnmtopng`) as external processes, names and cleans up their
//! intermediate files, and reports what happened.
//!
//! ## Pipeline Overview
//!
//! ```text
//! "$x^2$"
//!  │
//!  ├─ 1. Resolve   locate all four tools on the search path
//!  ├─ 2. Job       draw a 12-hex-digit token no existing file contains
//!  ├─ 3. Wrap      snippet → minimal article document
//!  ├─ 4. Compile   pdflatex -jobname={job}   (document on stdin)
//!  ├─ 5. Crop      pdfcrop {job}.pdf
//!  ├─ 6. Raster ═▶ pdf2ppm {job}-crop.pdf | pnm2png > output.png
//!  └─ 7. Cleanup   remove {job}.{pdf,out,aux,log} and {job}-crop.pdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pnglatex::{render, RenderConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RenderConfig::builder().output("pythagoras.png").build()?;
//!     let output = render("$a^2 + b^2 = c^2$", &config)?;
//!     println!("{} ({}x{})", output.path.display(), output.width, output.height);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pnglatex` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pnglatex = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod tools;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RenderConfig, RenderConfigBuilder};
pub use error::{ErrorKind, PngLatexError};
pub use output::{RenderOutput, StageReport};
pub use pipeline::cleanup::remove_intermediates;
pub use pipeline::Stage;
pub use progress::{NoopProgressCallback, ProgressCallback, RenderProgressCallback};
pub use render::{render, render_async, render_to_bytes, render_to_file};
pub use tools::{Tool, ToolSet};
