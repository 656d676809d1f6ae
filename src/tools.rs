//! The four external programs behind the pipeline and how they are found.
//!
//! Resolution happens at call time, before any process is spawned, so a
//! missing tool surfaces as [`PngLatexError::ToolNotFound`] without leaving
//! anything behind in the working directory.

use crate::config::RenderConfig;
use crate::error::PngLatexError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// An external program the pipeline depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// LaTeX compiler (`pdflatex`).
    Compiler,
    /// PDF cropper (`pdfcrop`).
    Cropper,
    /// PDF-to-bitmap converter (`pdf2ppm`, also installed as `pdftoppm`).
    Rasterizer,
    /// Bitmap-to-PNG converter (`pnm2png`, also installed as `pnmtopng`).
    Encoder,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Compiler, Tool::Cropper, Tool::Rasterizer, Tool::Encoder];

    /// Executable name looked up on the search path when no override is set.
    pub fn default_name(self) -> &'static str {
        match self {
            Tool::Compiler => "pdflatex",
            Tool::Cropper => "pdfcrop",
            Tool::Rasterizer => "pdf2ppm",
            Tool::Encoder => "pnm2png",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_name())
    }
}

/// Absolute locations of all four tools for one render run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSet {
    pub compiler: PathBuf,
    pub cropper: PathBuf,
    pub rasterizer: PathBuf,
    pub encoder: PathBuf,
}

impl ToolSet {
    /// Resolve every tool named by `config`, failing on the first one that
    /// cannot be found.
    pub fn resolve(config: &RenderConfig) -> Result<Self, PngLatexError> {
        Ok(Self {
            compiler: resolve_tool(Tool::Compiler, config)?,
            cropper: resolve_tool(Tool::Cropper, config)?,
            rasterizer: resolve_tool(Tool::Rasterizer, config)?,
            encoder: resolve_tool(Tool::Encoder, config)?,
        })
    }
}

/// Resolve a single tool.
///
/// An override containing a path separator is taken as a file path and only
/// checked for executability; a bare override name goes through the same
/// search (and `2` → `to` fallback) as the default name.
pub fn resolve_tool(tool: Tool, config: &RenderConfig) -> Result<PathBuf, PngLatexError> {
    let requested = config.tool_overrides.get(&tool);

    if let Some(path) = requested.filter(|p| p.components().count() > 1 || p.is_absolute()) {
        if toolpath::is_executable(path) {
            debug!("Using {} override: {}", tool, path.display());
            return Ok(path.clone());
        }
        return Err(PngLatexError::ToolNotFound {
            tool: tool.default_name().to_string(),
            tried: vec![path.display().to_string()],
        });
    }

    let name = match requested {
        Some(p) => p.to_string_lossy().into_owned(),
        None => tool.default_name().to_string(),
    };

    toolpath::locate(&name, config.search_path.as_deref()).map_err(|e| match e {
        toolpath::LocateError::NotFound { tried, .. } => PngLatexError::ToolNotFound {
            tool: tool.default_name().to_string(),
            tried,
        },
        other => other.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_match_the_classic_toolchain() {
        let names: Vec<&str> = Tool::ALL.iter().map(|t| t.default_name()).collect();
        assert_eq!(names, vec!["pdflatex", "pdfcrop", "pdf2ppm", "pnm2png"]);
    }

    #[test]
    fn missing_tool_reports_tool_and_candidates() {
        let empty = tempfile::tempdir().unwrap();
        let config = RenderConfig::builder()
            .search_path(empty.path().as_os_str())
            .build()
            .unwrap();

        let err = resolve_tool(Tool::Rasterizer, &config).unwrap_err();
        match err {
            PngLatexError::ToolNotFound { tool, tried } => {
                assert_eq!(tool, "pdf2ppm");
                assert_eq!(tried, vec!["pdf2ppm".to_string(), "pdftoppm".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn path_override_must_exist() {
        let config = RenderConfig::builder()
            .tool_path(Tool::Cropper, "/definitely/not/here/pdfcrop")
            .build()
            .unwrap();

        let err = resolve_tool(Tool::Cropper, &config).unwrap_err();
        assert!(matches!(err, PngLatexError::ToolNotFound { .. }));
        assert!(err.to_string().contains("/definitely/not/here/pdfcrop"));
    }

    #[cfg(unix)]
    #[test]
    fn tool_set_resolves_all_four_with_aliases() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        for name in ["pdflatex", "pdfcrop", "pdftoppm", "pnmtopng"] {
            let path = dir.path().join(name);
            std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let config = RenderConfig::builder()
            .search_path(dir.path().as_os_str())
            .build()
            .unwrap();

        let tools = ToolSet::resolve(&config).unwrap();
        assert_eq!(tools.compiler, dir.path().join("pdflatex"));
        assert_eq!(tools.cropper, dir.path().join("pdfcrop"));
        assert_eq!(tools.rasterizer, dir.path().join("pdftoppm"));
        assert_eq!(tools.encoder, dir.path().join("pnmtopng"));
    }

    #[cfg(unix)]
    #[test]
    fn bare_name_override_is_searched() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("lualatex");
        std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = RenderConfig::builder()
            .search_path(dir.path().as_os_str())
            .tool_path(Tool::Compiler, "lualatex")
            .build()
            .unwrap();

        assert_eq!(resolve_tool(Tool::Compiler, &config).unwrap(), script);
    }
}
