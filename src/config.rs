//! Configuration types for LaTeX-to-PNG rendering.
//!
//! All render behaviour is controlled through [`RenderConfig`], built via its
//! [`RenderConfigBuilder`]. The defaults reproduce the classic behaviour:
//! `{job}.png` in the current directory, tools found on `PATH`, the plain
//! `article` template and the rasterizer's own resolution.

use crate::error::PngLatexError;
use crate::progress::ProgressCallback;
use crate::tools::Tool;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Lowest resolution accepted for the rasterizer.
pub const MIN_DPI: u32 = 36;
/// Highest resolution accepted for the rasterizer.
pub const MAX_DPI: u32 = 2400;

/// Configuration for a LaTeX-to-PNG render.
///
/// Built via [`RenderConfig::builder()`] or using [`RenderConfig::default()`].
///
/// # Example
/// ```rust
/// use pnglatex::RenderConfig;
///
/// let config = RenderConfig::builder()
///     .output("formula.png")
///     .dpi(300)
///     .preamble("\\usepackage{amsmath}")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RenderConfig {
    /// Destination PNG. Relative paths are taken relative to `work_dir`.
    /// Default: `{job}.png` in `work_dir`.
    pub output: Option<PathBuf>,

    /// Directory the external tools run in and where intermediate files
    /// (`{job}.pdf`, `{job}.aux`, …) live. Default: `.`.
    pub work_dir: PathBuf,

    /// Extra preamble lines placed right after `\documentclass{article}`,
    /// e.g. `\usepackage{amsmath}`. Default: none.
    pub preamble: Option<String>,

    /// Rasterizer resolution, passed as `-r <dpi>`. Range: 36–2400.
    /// Default: None (the rasterizer's own default, 150 for poppler).
    pub dpi: Option<u32>,

    /// Upper bound on each stage's run time in seconds; a stage that exceeds
    /// it is killed. `0` waits forever. Default: 60.
    ///
    /// LaTeX waits for terminal input on some errors and a broken PDF can
    /// make a rasterizer spin; without a bound either would hang the caller.
    pub stage_timeout_secs: u64,

    /// Search path used to locate tools instead of the `PATH` environment
    /// variable. Default: None.
    pub search_path: Option<OsString>,

    /// Per-tool overrides: either a path to the executable or a different
    /// name to search for (e.g. `lualatex` for the compiler).
    pub tool_overrides: HashMap<Tool, PathBuf>,

    /// Optional stage-level progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output: None,
            work_dir: PathBuf::from("."),
            preamble: None,
            dpi: None,
            stage_timeout_secs: 60,
            search_path: None,
            tool_overrides: HashMap::new(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("output", &self.output)
            .field("work_dir", &self.work_dir)
            .field("preamble", &self.preamble)
            .field("dpi", &self.dpi)
            .field("stage_timeout_secs", &self.stage_timeout_secs)
            .field("search_path", &self.search_path)
            .field("tool_overrides", &self.tool_overrides)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn RenderProgressCallback>"),
            )
            .finish()
    }
}

impl RenderConfig {
    /// Create a new builder for `RenderConfig`.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }

    /// The per-stage wait bound, or `None` when disabled.
    pub fn stage_timeout(&self) -> Option<Duration> {
        (self.stage_timeout_secs > 0).then(|| Duration::from_secs(self.stage_timeout_secs))
    }
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output = Some(path.into());
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = dir.into();
        self
    }

    pub fn preamble(mut self, preamble: impl Into<String>) -> Self {
        self.config.preamble = Some(preamble.into());
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = Some(dpi.clamp(MIN_DPI, MAX_DPI));
        self
    }

    pub fn stage_timeout_secs(mut self, secs: u64) -> Self {
        self.config.stage_timeout_secs = secs;
        self
    }

    pub fn search_path(mut self, path: impl Into<OsString>) -> Self {
        self.config.search_path = Some(path.into());
        self
    }

    pub fn tool_path(mut self, tool: Tool, path: impl Into<PathBuf>) -> Self {
        self.config.tool_overrides.insert(tool, path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, PngLatexError> {
        let c = &self.config;
        if let Some(dpi) = c.dpi {
            if !(MIN_DPI..=MAX_DPI).contains(&dpi) {
                return Err(PngLatexError::InvalidConfig(format!(
                    "DPI must be {MIN_DPI}–{MAX_DPI}, got {dpi}"
                )));
            }
        }
        if c.work_dir.as_os_str().is_empty() {
            return Err(PngLatexError::InvalidConfig(
                "Working directory must not be empty".into(),
            ));
        }
        if let Some(out) = &c.output {
            if out.as_os_str().is_empty() {
                return Err(PngLatexError::InvalidConfig(
                    "Output path must not be empty".into(),
                ));
            }
        }
        if let Some(preamble) = &c.preamble {
            if preamble.contains("\\begin{document}") {
                return Err(PngLatexError::InvalidConfig(
                    "Preamble must not contain \\begin{document}".into(),
                ));
            }
        }
        for (tool, path) in &c.tool_overrides {
            if path.as_os_str().is_empty() {
                return Err(PngLatexError::InvalidConfig(format!(
                    "Override for {tool} must not be empty"
                )));
            }
        }
        Ok(self.config)
    }
}
