//! Cleanup guards for intermediate files and partial output.
//!
//! [`JobArtifacts`] is armed as soon as a job name exists and removes the five
//! intermediate files when dropped, so early returns, `?` and panics that
//! unwind through the caller all clean up the same way. [`OutputGuard`] does
//! the same for the destination PNG until the run commits it.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Suffixes appended to the job name for every intermediate file the
/// compiler and cropper may create.
pub const INTERMEDIATE_SUFFIXES: [&str; 5] = [".pdf", ".out", ".aux", ".log", "-crop.pdf"];

/// Paths of all intermediate files for `job` inside `dir`.
pub fn intermediate_paths(dir: &Path, job: &str) -> Vec<PathBuf> {
    INTERMEDIATE_SUFFIXES
        .iter()
        .map(|suffix| dir.join(format!("{job}{suffix}")))
        .collect()
}

/// Delete every intermediate file for `job`. Missing files are skipped.
///
/// Returns how many files were actually removed. Safe to call repeatedly.
pub fn remove_intermediates(dir: &Path, job: &str) -> usize {
    let mut removed = 0;
    for path in intermediate_paths(dir, job) {
        match remove_if_exists(&path) {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => warn!("Could not remove {}: {}", path.display(), e),
        }
    }
    debug!("Removed {} intermediate file(s) for job {}", removed, job);
    removed
}

/// Remove `path`, treating "not found" as success. Returns whether a file was
/// removed.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Removes a job's intermediate files when dropped.
#[derive(Debug)]
pub struct JobArtifacts {
    dir: PathBuf,
    job: String,
}

impl JobArtifacts {
    pub fn new(dir: impl Into<PathBuf>, job: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            job: job.into(),
        }
    }
}

impl Drop for JobArtifacts {
    fn drop(&mut self) {
        remove_intermediates(&self.dir, &self.job);
    }
}

/// Removes a partially written output file unless [`OutputGuard::commit`] is
/// called.
#[derive(Debug)]
pub struct OutputGuard {
    path: Option<PathBuf>,
}

impl OutputGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Keep the file and return its path.
    pub fn commit(mut self) -> Option<PathBuf> {
        self.path.take()
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            match remove_if_exists(&path) {
                Ok(true) => debug!("Removed partial output {}", path.display()),
                Ok(false) => {}
                Err(e) => warn!("Could not remove partial output {}: {}", path.display(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_all(dir: &Path, job: &str) {
        for p in intermediate_paths(dir, job) {
            std::fs::write(p, b"x").unwrap();
        }
    }

    #[test]
    fn paths_use_fixed_suffixes() {
        let paths = intermediate_paths(Path::new("w"), "abc");
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["abc.pdf", "abc.out", "abc.aux", "abc.log", "abc-crop.pdf"]
        );
    }

    #[test]
    fn guard_removes_all_intermediates_and_nothing_else() {
        let dir = tempfile::tempdir().unwrap();
        create_all(dir.path(), "job1");
        std::fs::write(dir.path().join("job1.png"), b"keep").unwrap();
        std::fs::write(dir.path().join("other.pdf"), b"keep").unwrap();

        drop(JobArtifacts::new(dir.path(), "job1"));

        for p in intermediate_paths(dir.path(), "job1") {
            assert!(!p.exists(), "{} should be gone", p.display());
        }
        assert!(dir.path().join("job1.png").exists());
        assert!(dir.path().join("other.pdf").exists());
    }

    #[test]
    fn removal_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        create_all(dir.path(), "job2");

        assert_eq!(remove_intermediates(dir.path(), "job2"), 5);
        assert_eq!(remove_intermediates(dir.path(), "job2"), 0);
        drop(JobArtifacts::new(dir.path(), "job2"));
    }

    #[test]
    fn partial_intermediates_are_fine() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("job3.log"), b"x").unwrap();
        assert_eq!(remove_intermediates(dir.path(), "job3"), 1);
    }

    #[test]
    fn guard_runs_during_unwind() {
        let dir = tempfile::tempdir().unwrap();
        create_all(dir.path(), "job4");
        let path = dir.path().to_path_buf();

        let result = std::panic::catch_unwind(move || {
            let _guard = JobArtifacts::new(&path, "job4");
            panic!("stage blew up");
        });

        assert!(result.is_err());
        for p in intermediate_paths(dir.path(), "job4") {
            assert!(!p.exists());
        }
    }

    #[test]
    fn output_guard_removes_unless_committed() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.png");

        std::fs::write(&out, b"partial").unwrap();
        drop(OutputGuard::new(&out));
        assert!(!out.exists());

        std::fs::write(&out, b"done").unwrap();
        let kept = OutputGuard::new(&out).commit();
        assert_eq!(kept.as_deref(), Some(out.as_path()));
        assert!(out.exists());
    }

    #[test]
    fn output_guard_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        drop(OutputGuard::new(dir.path().join("never-written.png")));
    }
}
