//! Progress-callback trait for per-stage render events.
//!
//! Inject an [`Arc<dyn RenderProgressCallback>`] via
//! [`crate::config::RenderConfigBuilder::progress_callback`] to receive events
//! as the pipeline moves through its four stages. The CLI uses this to drive
//! its spinner; a server could forward the same events to a log or a socket.
//!
//! # Example
//!
//! ```rust
//! use pnglatex::{RenderConfig, RenderProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct PrintStages;
//!
//! impl RenderProgressCallback for PrintStages {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("running {stage}…");
//!     }
//! }
//!
//! let config = RenderConfig::builder()
//!     .progress_callback(Arc::new(PrintStages) as Arc<dyn RenderProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::StageReport;
use crate::pipeline::Stage;
use std::sync::Arc;

/// Called by the render pipeline as it runs each stage.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Rasterize and encode run concurrently, so both of
/// their `on_stage_start` events fire before either completes.
pub trait RenderProgressCallback: Send + Sync {
    /// Called once the job name is known, before the first stage starts.
    fn on_render_start(&self, job_name: &str) {
        let _ = job_name;
    }

    /// Called right before the stage's process is spawned.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called after the stage's process has been reaped.
    fn on_stage_complete(&self, report: &StageReport) {
        let _ = report;
    }

    /// Called once per render after cleanup, whatever the outcome. This also
    /// fires for failures before a job name exists, such as a missing tool.
    fn on_render_complete(&self, success: bool) {
        let _ = success;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RenderProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RenderConfig`].
pub type ProgressCallback = Arc<dyn RenderProgressCallback>;
