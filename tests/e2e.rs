//! End-to-end tests against a real TeX installation.
//!
//! These need pdflatex, pdfcrop, poppler (`pdftoppm`) and netpbm
//! (`pnmtopng`) on `PATH`. They are gated behind the `E2E_ENABLED`
//! environment variable so they do not run in CI unless explicitly
//! requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture

use pnglatex::{render, PngLatexError, RenderConfig, Stage};

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("pnglatex=debug"))
        .with_test_writer()
        .try_init();
}

#[test]
fn e2e_renders_inline_math() {
    e2e_skip_unless_ready!();
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = RenderConfig::builder().work_dir(dir.path()).build().unwrap();

    let out = render("$x^2$", &config).unwrap();

    assert!(out.width > 0 && out.height > 0);
    // Cropped: an inline x² is far smaller than a page.
    assert!(out.width < 400, "not cropped: {}x{}", out.width, out.height);
    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![format!("{}.png", out.job_name)]);
    println!("{}: {}x{} in {}ms", out.path.display(), out.width, out.height, out.duration_ms);
}

#[test]
fn e2e_higher_dpi_gives_a_larger_image() {
    e2e_skip_unless_ready!();
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let low = RenderConfig::builder()
        .work_dir(dir.path())
        .output("low.png")
        .dpi(100)
        .build()
        .unwrap();
    let high = RenderConfig::builder()
        .work_dir(dir.path())
        .output("high.png")
        .dpi(400)
        .build()
        .unwrap();

    let low = render("$\\int_0^1 x\\,dx$", &low).unwrap();
    let high = render("$\\int_0^1 x\\,dx$", &high).unwrap();
    assert!(high.width > low.width * 3);
}

#[test]
fn e2e_rejected_latex_fails_cleanly() {
    e2e_skip_unless_ready!();
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = RenderConfig::builder()
        .work_dir(dir.path())
        .output("bad.png")
        .build()
        .unwrap();

    let err = render("$\\undefinedmacro{x}$", &config).unwrap_err();

    assert!(matches!(err, PngLatexError::GenerationFailed { .. }), "{err}");
    println!("{err}");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn e2e_stage_reports_cover_all_stages() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let config = RenderConfig::builder()
        .work_dir(dir.path())
        .preamble("\\usepackage{amsmath}")
        .build()
        .unwrap();

    let out = render("$\\begin{pmatrix} a & b \\\\ c & d \\end{pmatrix}$", &config).unwrap();
    let stages: Vec<Stage> = out.stages.iter().map(|s| s.stage).collect();
    assert_eq!(stages, Stage::ALL.to_vec());
    assert!(out.stages.iter().all(|s| s.success));
}
