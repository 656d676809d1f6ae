//! Fake toolchain for integration tests.
//!
//! Each tool is a small `/bin/sh` script written into a private `bin/`
//! directory. The scripts mimic the file contract of the real programs:
//! the compiler writes `{job}.pdf` (the document itself), `.aux`, `.log` and
//! `.out`; the cropper copies to `{job}-crop.pdf`; the rasterizer prints the
//! file it is given; the encoder checks it received a document and prints a
//! real PNG fixture.
//!
//! The rasterizer and encoder are installed under their alternate names
//! (`pdftoppm`, `pnmtopng`) so every run also exercises the alias lookup.

#![allow(dead_code)]

use pnglatex::{RenderConfig, RenderConfigBuilder};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

/// Writing an executable while another thread forks can leave the child
/// holding the write end, and exec then fails with ETXTBSY. Every test that
/// writes scripts or spawns them holds this lock.
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

pub fn lock() -> MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

pub const COMPILER_OK: &str = r#"job="${1#-jobname=}"
cat > "$job.pdf"
echo relax > "$job.aux"
echo "This is fake pdfTeX" > "$job.log"
: > "$job.out"
"#;

pub const COMPILER_FAILS: &str = r#"job="${1#-jobname=}"
cat > /dev/null
echo relax > "$job.aux"
printf '%s\n' 'This is fake pdfTeX' '! Undefined control sequence.' 'l.4 $\foo' '          {x}$' > "$job.log"
exit 1
"#;

pub const COMPILER_HANGS: &str = "exec sleep 30\n";

pub const CROPPER_OK: &str = r#"[ -f "$1" ] || exit 1
cp "$1" "${1%.pdf}-crop.pdf"
"#;

pub const ENCODER_FAILS: &str = "cat > /dev/null\nprintf 'partial'\nexit 1\n";

pub const ENCODER_NOT_PNG: &str = "cat > /dev/null\nprintf 'P6\\n1 1\\n255\\n...'\n";

/// A temporary toolchain plus a separate, initially empty working directory.
pub struct FakeToolchain {
    root: TempDir,
}

impl FakeToolchain {
    /// All four tools succeed.
    pub fn new() -> Self {
        let tc = Self {
            root: tempfile::tempdir().unwrap(),
        };
        std::fs::create_dir(tc.bin_dir()).unwrap();
        std::fs::create_dir(tc.work_dir()).unwrap();

        image::RgbaImage::from_pixel(24, 10, image::Rgba([0, 0, 0, 255]))
            .save(tc.fixture_png())
            .unwrap();

        tc.install("pdflatex", COMPILER_OK);
        tc.install("pdfcrop", CROPPER_OK);
        tc.install(
            "pdftoppm",
            &format!(
                "printf '%s\\n' \"$@\" > '{}'\nfor last; do :; done\ncat \"$last\"\n",
                tc.rasterizer_args().display()
            ),
        );
        tc.install(
            "pnmtopng",
            &format!(
                "if grep 'begin{{document}}' > /dev/null; then cat '{}'; else exit 1; fi\n",
                tc.fixture_png().display()
            ),
        );
        tc
    }

    /// Write (or replace) `name` in the fake `bin/` directory.
    pub fn install(&self, name: &str, body: &str) -> PathBuf {
        let path = self.bin_dir().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    pub fn remove(&self, name: &str) {
        std::fs::remove_file(self.bin_dir().join(name)).unwrap();
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.path().join("bin")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.root.path().join("work")
    }

    pub fn fixture_png(&self) -> PathBuf {
        self.root.path().join("fixture.png")
    }

    /// Where the rasterizer records the arguments it was called with.
    pub fn rasterizer_args(&self) -> PathBuf {
        self.root.path().join("rasterizer.args")
    }

    /// Config builder pointed at this toolchain and working directory.
    pub fn builder(&self) -> RenderConfigBuilder {
        RenderConfig::builder()
            .work_dir(self.work_dir())
            .search_path(self.bin_dir().into_os_string())
            .stage_timeout_secs(20)
    }

    /// Names of everything currently in the working directory, sorted.
    pub fn work_entries(&self) -> Vec<String> {
        entries(&self.work_dir())
    }
}

pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
