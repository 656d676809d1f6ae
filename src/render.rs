//! Render entry points.
//!
//! [`render`] is the primary API and is synchronous: the work is done by
//! external processes and the calling thread only waits on them. Async
//! callers use [`render_async`], which moves the same call onto tokio's
//! blocking pool.

use crate::config::RenderConfig;
use crate::error::PngLatexError;
use crate::output::RenderOutput;
use crate::pipeline::cleanup::JobArtifacts;
use crate::pipeline::stages::{self, PipelineRequest};
use crate::pipeline::{document, job};
use crate::tools::ToolSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Render a LaTeX snippet to a cropped PNG.
///
/// The snippet is placed in the body of a minimal `article` document, so
/// math must be delimited by the caller (`"$x^2$"`, `"\\[ \\sum_i i \\]"`).
///
/// # Returns
/// `Ok(RenderOutput)` with the absolute path of the PNG, its pixel size and
/// a per-stage report. No intermediate file is left in the working
/// directory, whatever the outcome.
///
/// # Errors
/// - [`PngLatexError::EmptyInput`] for an empty snippet. Nothing is spawned
///   or written.
/// - [`PngLatexError::ToolNotFound`] when one of the four programs is
///   missing. Checked before any process runs.
/// - [`PngLatexError::GenerationFailed`] and the other generation variants
///   when the pipeline did not produce a PNG. An output file created by this
///   call has already been removed.
pub fn render(snippet: &str, config: &RenderConfig) -> Result<RenderOutput, PngLatexError> {
    let result = render_job(snippet, config);
    if let Some(ref cb) = config.progress_callback {
        cb.on_render_complete(result.is_ok());
    }
    result
}

fn render_job(snippet: &str, config: &RenderConfig) -> Result<RenderOutput, PngLatexError> {
    let total_start = Instant::now();

    if snippet.is_empty() {
        return Err(PngLatexError::EmptyInput);
    }

    // ── Step 1: Resolve tools ────────────────────────────────────────────
    let tools = ToolSet::resolve(config)?;
    debug!("Resolved tools: {:?}", tools);

    // ── Step 2: Name the job and arm cleanup ─────────────────────────────
    let work_dir = config.work_dir.as_path();
    let job_name = job::generate_job_name(work_dir)?;
    let artifacts = JobArtifacts::new(work_dir, job_name.as_str());
    let output = output_path(config, &job_name);
    info!(
        "Rendering job {} into {}",
        job_name,
        output.display()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_render_start(&job_name);
    }

    // ── Step 3: Run the pipeline ─────────────────────────────────────────
    let document = document::wrap_document(snippet, config.preamble.as_deref());
    let request = PipelineRequest {
        tools: &tools,
        work_dir,
        job: &job_name,
        document: &document,
        output: &output,
        dpi: config.dpi,
        timeout: config.stage_timeout(),
        progress: config.progress_callback.as_ref(),
    };
    let result = stages::run_pipeline(&request);

    // ── Step 4: Cleanup ──────────────────────────────────────────────────
    drop(artifacts);

    let run = match result {
        Ok(run) => run,
        Err(e) => {
            warn!("Job {} failed: {}", job_name, e);
            return Err(e);
        }
    };

    let path = std::path::absolute(&run.output).unwrap_or(run.output);
    let duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Rendered {} ({}x{}, {} bytes) in {}ms",
        path.display(),
        run.width,
        run.height,
        run.file_size,
        duration_ms
    );

    Ok(RenderOutput {
        path,
        job_name,
        width: run.width,
        height: run.height,
        file_size: run.file_size,
        stages: run.stages,
        duration_ms,
    })
}

/// Render to an explicit destination and return its absolute path.
///
/// `output` overrides any `output` already set on `config`. A relative path
/// is taken relative to the configured working directory.
pub fn render_to_file(
    snippet: &str,
    output: impl AsRef<Path>,
    config: &RenderConfig,
) -> Result<PathBuf, PngLatexError> {
    let mut config = config.clone();
    config.output = Some(output.as_ref().to_path_buf());
    render(snippet, &config).map(|out| out.path)
}

/// Render and return the PNG bytes instead of leaving a file behind.
///
/// The image is written to a managed [`tempfile`] that is removed on return.
/// Intermediate files still go to the configured working directory.
///
/// # Example
/// ```rust,no_run
/// use pnglatex::{render_to_bytes, RenderConfig};
///
/// let png = render_to_bytes("$e^{i\\pi} + 1 = 0$", &RenderConfig::default())?;
/// assert_eq!(&png[..4], b"\x89PNG");
/// # Ok::<(), pnglatex::PngLatexError>(())
/// ```
pub fn render_to_bytes(snippet: &str, config: &RenderConfig) -> Result<Vec<u8>, PngLatexError> {
    let tmp = tempfile::Builder::new()
        .prefix("pnglatex-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| PngLatexError::Internal(format!("tempfile: {e}")))?;

    let path = render_to_file(snippet, tmp.path(), config)?;
    // `tmp` is dropped (and the file deleted) once the bytes are read
    std::fs::read(&path).map_err(|source| PngLatexError::OutputWriteFailed { path, source })
}

/// Async wrapper around [`render`].
///
/// Runs the blocking render on tokio's blocking thread pool so the calling
/// task's worker thread is never stalled on a child process.
pub async fn render_async(
    snippet: impl Into<String>,
    config: RenderConfig,
) -> Result<RenderOutput, PngLatexError> {
    let snippet = snippet.into();
    tokio::task::spawn_blocking(move || render(&snippet, &config))
        .await
        .map_err(|e| PngLatexError::Internal(format!("Render task panicked: {}", e)))?
}

/// Where the PNG goes: the configured output (relative to the working
/// directory) or `{job}.png` in the working directory.
fn output_path(config: &RenderConfig, job_name: &str) -> PathBuf {
    match &config.output {
        Some(path) => config.work_dir.join(path),
        None => config.work_dir.join(format!("{job_name}.png")),
    }
}
