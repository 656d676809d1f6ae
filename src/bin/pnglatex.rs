//! CLI binary for pnglatex.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RenderConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pnglatex::{
    render_async, ProgressCallback, RenderConfig, RenderProgressCallback, Stage, StageReport, Tool,
};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that names the stage currently running and logs one line
/// per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Locating tools…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl RenderProgressCallback for CliProgressCallback {
    fn on_render_start(&self, job_name: &str) {
        self.bar.set_prefix("Rendering");
        self.bar.set_message(format!("job {job_name}"));
    }

    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{stage} ({})", stage.tool()));
    }

    fn on_stage_complete(&self, report: &StageReport) {
        let mark = if report.success { green("✓") } else { red("✗") };
        let status = match report.exit_code {
            Some(code) => format!("exit {code}"),
            None => "killed".to_string(),
        };
        self.bar.println(format!(
            "  {} {:<10} {:<8} {}",
            mark,
            report.stage,
            dim(&status),
            dim(&format!("{:.1}s", report.elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_render_complete(&self, _success: bool) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render to a randomly named PNG in the current directory
  pnglatex -c '$x^2$'

  # Render to a chosen file
  pnglatex -c '$e^{i\pi} + 1 = 0$' -o euler.png

  # Load packages and raise the resolution
  pnglatex -c '\[ \mathbb{R}^n \]' --preamble '\usepackage{amssymb}' --dpi 300

  # Use a different compiler and print a JSON report
  pnglatex -c '$\alpha$' --pdflatex lualatex --json

REQUIRED PROGRAMS:
  pdflatex   LaTeX compiler
  pdfcrop    PDF cropper
  pdf2ppm    PDF rasterizer (pdftoppm is also accepted)
  pnm2png    PNG encoder (pnmtopng is also accepted)

ENVIRONMENT VARIABLES:
  PNGLATEX_PDFLATEX / _PDFCROP / _PDF2PPM / _PNM2PNG
                    Tool overrides (a path, or a name to search for)
  RUST_LOG          Override the log filter (e.g. RUST_LOG=pnglatex=debug)
"#;

/// Convert LaTeX snippets to cropped PNG images.
#[derive(Parser, Debug)]
#[command(
    name = "pnglatex",
    version,
    about = "pnglatex, a small program that converts latex snippets to png",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// The LaTeX string to convert.
    #[arg(short = 'c', value_name = "LaTeX string")]
    latex: String,

    /// The output filename. Default: a random `{job}.png`.
    #[arg(short = 'o', value_name = "filename", env = "PNGLATEX_OUTPUT")]
    output: Option<PathBuf>,

    /// Directory to run the tools in; intermediate files live here.
    #[arg(long, env = "PNGLATEX_WORKDIR", default_value = ".")]
    workdir: PathBuf,

    /// Extra preamble lines, e.g. '\usepackage{amsmath}'.
    #[arg(long, env = "PNGLATEX_PREAMBLE")]
    preamble: Option<String>,

    /// Rasterizer resolution in DPI (36–2400).
    #[arg(long, env = "PNGLATEX_DPI",
          value_parser = clap::value_parser!(u32).range(36..=2400))]
    dpi: Option<u32>,

    /// Per-stage timeout in seconds (0 waits forever).
    #[arg(long, env = "PNGLATEX_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Override the LaTeX compiler.
    #[arg(long, env = "PNGLATEX_PDFLATEX", value_name = "PATH")]
    pdflatex: Option<PathBuf>,

    /// Override the PDF cropper.
    #[arg(long, env = "PNGLATEX_PDFCROP", value_name = "PATH")]
    pdfcrop: Option<PathBuf>,

    /// Override the PDF rasterizer.
    #[arg(long, env = "PNGLATEX_PDF2PPM", value_name = "PATH")]
    pdf2ppm: Option<PathBuf>,

    /// Override the PNG encoder.
    #[arg(long, env = "PNGLATEX_PNM2PNG", value_name = "PATH")]
    pnm2png: Option<PathBuf>,

    /// Output structured JSON (RenderOutput) instead of a confirmation line.
    #[arg(long, env = "PNGLATEX_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PNGLATEX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PNGLATEX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PNGLATEX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner is the feedback while it runs; keep library INFO logs
    // from tearing through it.
    let show_progress =
        !cli.quiet && !cli.no_progress && !cli.json && io::stderr().is_terminal();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn RenderProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Render ───────────────────────────────────────────────────────────
    let output = render_async(cli.latex.clone(), config)
        .await
        .context("Rendering failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        println!(
            "{}  {}  {}",
            green("✔"),
            bold(&output.path.display().to_string()),
            dim(&format!(
                "{}x{} px, {} bytes, {}ms",
                output.width, output.height, output.file_size, output.duration_ms
            )),
        );
    }

    Ok(())
}

/// Map CLI args to `RenderConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RenderConfig> {
    let mut builder = RenderConfig::builder()
        .work_dir(&cli.workdir)
        .stage_timeout_secs(cli.timeout);

    if let Some(ref output) = cli.output {
        builder = builder.output(output);
    }
    if let Some(ref preamble) = cli.preamble {
        builder = builder.preamble(preamble);
    }
    if let Some(dpi) = cli.dpi {
        builder = builder.dpi(dpi);
    }

    let overrides = [
        (Tool::Compiler, &cli.pdflatex),
        (Tool::Cropper, &cli.pdfcrop),
        (Tool::Rasterizer, &cli.pdf2ppm),
        (Tool::Encoder, &cli.pnm2png),
    ];
    for (tool, path) in overrides {
        if let Some(path) = path {
            builder = builder.tool_path(tool, path);
        }
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
