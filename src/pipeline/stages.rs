//! The four-stage process chain: compile → crop → rasterize ═▶ encode.
//!
//! Compile and crop run to completion one after the other and talk through
//! files named after the job. Rasterize and encode run together: the
//! rasterizer's stdout is handed to the encoder as its stdin, so the bitmap
//! streams through an OS pipe and never sits in this process's memory.
//!
//! Only the encoder's exit status (plus a readable PNG header) decides
//! success. Upstream statuses are recorded, logged and folded into the
//! error detail.

use crate::error::PngLatexError;
use crate::output::StageReport;
use crate::pipeline::cleanup::OutputGuard;
use crate::pipeline::process::StageChild;
use crate::pipeline::{texlog, Stage};
use crate::progress::ProgressCallback;
use crate::tools::ToolSet;
use image::{ImageFormat, ImageReader};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Inputs for one pipeline run.
pub(crate) struct PipelineRequest<'a> {
    pub tools: &'a ToolSet,
    pub work_dir: &'a Path,
    pub job: &'a str,
    pub document: &'a str,
    pub output: &'a Path,
    pub dpi: Option<u32>,
    pub timeout: Option<Duration>,
    pub progress: Option<&'a ProgressCallback>,
}

/// What a successful run produced.
#[derive(Debug)]
pub(crate) struct PipelineRun {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub stages: Vec<StageReport>,
}

/// Run all four stages and validate the PNG they produced.
///
/// On any error the output file is removed if this run created it.
/// Intermediate files are left for the caller's cleanup guard.
pub(crate) fn run_pipeline(req: &PipelineRequest<'_>) -> Result<PipelineRun, PngLatexError> {
    let mut stages = Vec::with_capacity(Stage::ALL.len());

    stages.push(compile(req)?);
    warn_if_missing(req, Stage::Compile, &format!("{}.pdf", req.job));

    stages.push(crop(req)?);
    warn_if_missing(req, Stage::Crop, &format!("{}-crop.pdf", req.job));

    let out_file = File::create(req.output).map_err(|source| PngLatexError::OutputWriteFailed {
        path: req.output.to_path_buf(),
        source,
    })?;
    let guard = OutputGuard::new(req.output);
    let (rasterize, encode) = rasterize_and_encode(req, out_file)?;
    stages.push(rasterize);
    stages.push(encode.clone());

    if !encode.success {
        return Err(PngLatexError::GenerationFailed {
            status: encode.exit_code,
            detail: failure_detail(req, &stages),
        });
    }

    let (width, height) = match png_dimensions(req.output) {
        Ok(dims) => dims,
        Err(reason) => {
            let mut detail = format!("Output is not a valid PNG: {reason}");
            let upstream = failure_detail(req, &stages);
            if !upstream.is_empty() {
                detail.push('\n');
                detail.push_str(&upstream);
            }
            return Err(PngLatexError::GenerationFailed {
                status: encode.exit_code,
                detail,
            });
        }
    };

    let file_size = std::fs::metadata(req.output)
        .map_err(|source| PngLatexError::OutputWriteFailed {
            path: req.output.to_path_buf(),
            source,
        })?
        .len();

    let output = guard.commit().unwrap_or_else(|| req.output.to_path_buf());
    Ok(PipelineRun {
        output,
        width,
        height,
        file_size,
        stages,
    })
}

// ── Stage 1: Compile ─────────────────────────────────────────────────────────

fn compile(req: &PipelineRequest<'_>) -> Result<StageReport, PngLatexError> {
    notify_start(req, Stage::Compile);

    let mut cmd = Command::new(&req.tools.compiler);
    cmd.arg(format!("-jobname={}", req.job))
        .current_dir(req.work_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    let mut child = StageChild::spawn(Stage::Compile, &mut cmd)?;

    // Feed the document from a scoped thread so the stage timeout also
    // bounds a compiler that never drains its stdin. Dropping the handle at
    // the end of the write closes stdin, so the compiler sees EOF instead of
    // waiting for terminal input on an error.
    let stdin = child.take_stdin();
    let document = req.document.as_bytes();
    let (waited, written) = thread::scope(|s| {
        let writer = s.spawn(move || match stdin {
            Some(mut stdin) => stdin.write_all(document),
            None => Ok(()),
        });
        let waited = child.wait(req.timeout);
        if waited.is_err() {
            // Unblocks a writer stuck on a full pipe.
            child.kill();
        }
        (waited, writer.join())
    });

    let status = waited?;
    match written {
        Ok(Ok(())) => {}
        Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("Compiler closed stdin early");
        }
        Ok(Err(e)) => {
            return Err(PngLatexError::Internal(format!(
                "failed to write document to compiler stdin: {e}"
            )));
        }
        Err(_) => {
            return Err(PngLatexError::Internal(
                "compiler stdin writer panicked".into(),
            ));
        }
    }

    let report = StageReport::new(Stage::Compile, status, child.elapsed_ms());
    if !report.success {
        warn!(
            "Compiler exited with {} for job {}; continuing",
            status, req.job
        );
    }
    notify_complete(req, &report);
    Ok(report)
}

// ── Stage 2: Crop ────────────────────────────────────────────────────────────

fn crop(req: &PipelineRequest<'_>) -> Result<StageReport, PngLatexError> {
    notify_start(req, Stage::Crop);

    let mut cmd = Command::new(&req.tools.cropper);
    cmd.arg(format!("{}.pdf", req.job))
        .current_dir(req.work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    let mut child = StageChild::spawn(Stage::Crop, &mut cmd)?;

    let status = child.wait(req.timeout)?;
    let report = StageReport::new(Stage::Crop, status, child.elapsed_ms());
    if !report.success {
        warn!("Cropper exited with {} for job {}; continuing", status, req.job);
    }
    notify_complete(req, &report);
    Ok(report)
}

// ── Stages 3 + 4: Rasterize piped into Encode ────────────────────────────────

fn rasterize_and_encode(
    req: &PipelineRequest<'_>,
    out_file: File,
) -> Result<(StageReport, StageReport), PngLatexError> {
    notify_start(req, Stage::Rasterize);
    let mut cmd = Command::new(&req.tools.rasterizer);
    if let Some(dpi) = req.dpi {
        cmd.arg("-r").arg(dpi.to_string());
    }
    cmd.arg(format!("{}-crop.pdf", req.job))
        .current_dir(req.work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    let mut rasterizer = StageChild::spawn(Stage::Rasterize, &mut cmd)?;
    // Drop the builder so its copy of any stdio handle is closed.
    drop(cmd);

    let bitmap = rasterizer.take_stdout().ok_or_else(|| {
        PngLatexError::Internal("rasterizer stdout was not captured".into())
    })?;

    notify_start(req, Stage::Encode);
    let mut cmd = Command::new(&req.tools.encoder);
    cmd.current_dir(req.work_dir)
        .stdin(Stdio::from(bitmap))
        .stdout(Stdio::from(out_file))
        .stderr(Stdio::null());
    let mut encoder = StageChild::spawn(Stage::Encode, &mut cmd)?;
    // The pipe's read end and the output file must belong to the encoder alone.
    drop(cmd);

    let encode_status = encoder.wait(req.timeout)?;
    let encode = StageReport::new(Stage::Encode, encode_status, encoder.elapsed_ms());

    let raster_status = rasterizer.wait(req.timeout)?;
    let rasterize = StageReport::new(Stage::Rasterize, raster_status, rasterizer.elapsed_ms());
    if !rasterize.success {
        warn!(
            "Rasterizer exited with {} for job {}",
            raster_status, req.job
        );
    }

    notify_complete(req, &rasterize);
    notify_complete(req, &encode);
    Ok((rasterize, encode))
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn notify_start(req: &PipelineRequest<'_>, stage: Stage) {
    if let Some(cb) = req.progress {
        cb.on_stage_start(stage);
    }
}

fn notify_complete(req: &PipelineRequest<'_>, report: &StageReport) {
    if let Some(cb) = req.progress {
        cb.on_stage_complete(report);
    }
}

fn warn_if_missing(req: &PipelineRequest<'_>, stage: Stage, file_name: &str) {
    if !req.work_dir.join(file_name).exists() {
        warn!("{} stage did not produce {}", stage, file_name);
    }
}

/// Human-readable account of what went wrong upstream, built while the
/// intermediate files still exist.
fn failure_detail(req: &PipelineRequest<'_>, stages: &[StageReport]) -> String {
    let mut parts = Vec::new();

    for report in stages.iter().filter(|r| r.stage != Stage::Encode && !r.success) {
        parts.push(match report.exit_code {
            Some(code) => format!("The {} stage exited with status {code}.", report.stage),
            None => format!("The {} stage was terminated by a signal.", report.stage),
        });
    }

    let log_path = req.work_dir.join(format!("{}.log", req.job));
    if let Some(err) = texlog::first_error_in_file(&log_path) {
        parts.push(format!("LaTeX error: {err}"));
    }

    parts.join("\n")
}

fn png_dimensions(path: &Path) -> Result<(u32, u32), String> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| e.to_string())?;
    if reader.format() != Some(ImageFormat::Png) {
        return Err("missing PNG signature".into());
    }
    reader.into_dimensions().map_err(|e| e.to_string())
}
