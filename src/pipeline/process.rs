//! Child-process handling shared by all stages.
//!
//! [`StageChild`] owns a spawned process until it has been reaped. Waiting is
//! bounded by an optional timeout: std has no timed wait, so we poll
//! `try_wait` against a deadline. A child that is still running when its
//! guard drops (an error path skipped the wait) is killed and reaped so no
//! zombie or runaway tool outlives the render call.

use crate::error::PngLatexError;
use crate::pipeline::Stage;
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Sleep between `try_wait` polls.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub(crate) struct StageChild {
    stage: Stage,
    child: Option<Child>,
    started: Instant,
}

impl StageChild {
    /// Spawn `cmd` as the process for `stage`.
    pub(crate) fn spawn(stage: Stage, cmd: &mut Command) -> Result<Self, PngLatexError> {
        debug!("Spawning {} stage: {:?}", stage, cmd);
        let child = cmd
            .spawn()
            .map_err(|source| PngLatexError::Spawn { stage, source })?;
        Ok(Self {
            stage,
            child: Some(child),
            started: Instant::now(),
        })
    }

    pub(crate) fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.as_mut().and_then(|c| c.stdin.take())
    }

    pub(crate) fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.as_mut().and_then(|c| c.stdout.take())
    }

    /// Milliseconds since the process was spawned.
    pub(crate) fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Wait for the process to exit.
    ///
    /// With a `timeout`, the process is killed once it has been running for
    /// longer than that and [`PngLatexError::StageTimeout`] is returned.
    pub(crate) fn wait(&mut self, timeout: Option<Duration>) -> Result<ExitStatus, PngLatexError> {
        let stage = self.stage;
        let Some(child) = self.child.as_mut() else {
            return Err(PngLatexError::Internal(format!(
                "{stage} stage waited on twice"
            )));
        };

        let status = match timeout {
            None => child
                .wait()
                .map_err(|source| PngLatexError::Wait { stage, source })?,
            Some(limit) => loop {
                if let Some(status) = child
                    .try_wait()
                    .map_err(|source| PngLatexError::Wait { stage, source })?
                {
                    break status;
                }
                if self.started.elapsed() >= limit {
                    warn!(
                        "{} stage exceeded {}s, killing pid {}",
                        stage,
                        limit.as_secs(),
                        child.id()
                    );
                    let _ = child.kill();
                    let _ = child.wait();
                    self.child = None;
                    return Err(PngLatexError::StageTimeout {
                        stage,
                        secs: limit.as_secs(),
                    });
                }
                thread::sleep(POLL_INTERVAL);
            },
        };

        self.child = None;
        debug!(
            "{} stage exited with {} after {}ms",
            stage,
            status,
            self.elapsed_ms()
        );
        Ok(status)
    }

    /// Kill and reap the process if it is still owned. No-op after a
    /// successful [`wait`](Self::wait).
    pub(crate) fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!("Killing unreaped {} stage (pid {})", self.stage, child.id());
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for StageChild {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Stdio;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }

    #[test]
    fn reports_exit_status() {
        let mut child = StageChild::spawn(Stage::Crop, &mut sh("exit 3")).unwrap();
        let status = child.wait(Some(Duration::from_secs(10))).unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[test]
    fn unbounded_wait_works() {
        let mut child = StageChild::spawn(Stage::Crop, &mut sh("exit 0")).unwrap();
        assert!(child.wait(None).unwrap().success());
    }

    #[test]
    fn hanging_process_is_killed() {
        let started = Instant::now();
        let mut child = StageChild::spawn(Stage::Compile, &mut sh("exec sleep 30")).unwrap();
        let err = child.wait(Some(Duration::from_millis(200))).unwrap_err();
        assert!(matches!(
            err,
            PngLatexError::StageTimeout {
                stage: Stage::Compile,
                ..
            }
        ));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn second_wait_is_an_internal_error() {
        let mut child = StageChild::spawn(Stage::Encode, &mut sh("exit 0")).unwrap();
        child.wait(None).unwrap();
        assert!(matches!(child.wait(None), Err(PngLatexError::Internal(_))));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let mut cmd = Command::new("/nonexistent/pnglatex-test-binary");
        let err = StageChild::spawn(Stage::Rasterize, &mut cmd).err().unwrap();
        assert!(matches!(
            err,
            PngLatexError::Spawn {
                stage: Stage::Rasterize,
                ..
            }
        ));
    }

    #[test]
    fn kill_reaps_and_disarms() {
        let mut child = StageChild::spawn(Stage::Crop, &mut sh("exec sleep 30")).unwrap();
        child.kill();
        child.kill();
        assert!(matches!(child.wait(None), Err(PngLatexError::Internal(_))));
    }

    #[test]
    fn dropping_kills_the_child() {
        let started = Instant::now();
        let child = StageChild::spawn(Stage::Encode, &mut sh("exec sleep 30")).unwrap();
        drop(child);
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
