//! Running a child process under a deadline.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// What a finished process left behind.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Outcome of a bounded launch.
#[derive(Debug, Clone)]
pub enum Invocation {
    Completed(ProcessOutput),
    /// The program could not be found.
    NotFound,
    /// The deadline passed; the child was killed and reaped.
    TimedOut,
}

/// Spawn `cmd` with captured output and wait at most `timeout` for it.
///
/// stdin is closed. On unix the child leads its own process group, and on
/// timeout the whole group is killed, so helpers it forked do not outlive
/// the call. The child is reaped before returning. A timeout too large to
/// represent as a deadline means no deadline. Spawn failures other than
/// not-found are returned as errors.
pub async fn run_bounded(mut cmd: Command, timeout: Duration) -> std::io::Result<Invocation> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let deadline = Instant::now().checked_add(timeout);
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Program not found: {:?}", cmd.as_std().get_program());
            return Ok(Invocation::NotFound);
        }
        Err(e) => return Err(e),
    };

    let stdout = tokio::spawn(drain(child.stdout.take()));
    let stderr = tokio::spawn(drain(child.stderr.take()));

    let waited = match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, child.wait()).await,
        None => Ok(child.wait().await),
    };

    match waited {
        Ok(status) => {
            let status = status?;
            // A grandchild may keep the pipes open after the child exits.
            let stdout = collect(stdout, deadline).await;
            let stderr = collect(stderr, deadline).await;
            tracing::debug!(%status, "Process exited");
            Ok(Invocation::Completed(ProcessOutput {
                status,
                stdout,
                stderr,
            }))
        }
        Err(_) => {
            tracing::warn!(
                "Process exceeded {:.1}s, killing it",
                timeout.as_secs_f64()
            );
            kill_group(&child);
            if let Err(e) = child.kill().await {
                tracing::warn!("Failed to kill timed-out process: {e}");
            }
            stdout.abort();
            stderr.abort();
            Ok(Invocation::TimedOut)
        }
    }
}

/// SIGKILL the process group led by `child`.
#[cfg(unix)]
fn kill_group(child: &Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        tracing::debug!("Failed to kill process group {pid}: {e}");
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut bytes = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut bytes).await;
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

async fn collect(task: JoinHandle<String>, deadline: Option<Instant>) -> String {
    let mut task = task;
    let Some(deadline) = deadline else {
        return task.await.unwrap_or_default();
    };
    // Leave a short grace period even when the deadline is nearly spent.
    let grace = Instant::now() + Duration::from_millis(250);
    match tokio::time::timeout_at(deadline.max(grace), &mut task).await {
        Ok(Ok(text)) => text,
        Ok(Err(_)) => String::new(),
        Err(_) => {
            task.abort();
            String::new()
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[tokio::test]
    async fn test_captures_output_and_status() {
        let result = run_bounded(sh("echo out; echo err >&2; exit 3"), Duration::from_secs(10))
            .await
            .unwrap();
        match result {
            Invocation::Completed(out) => {
                assert_eq!(out.status.code(), Some(3));
                assert_eq!(out.stdout, "out\n");
                assert_eq!(out.stderr, "err\n");
                assert!(!out.success());
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program() {
        let cmd = Command::new("/nonexistent/definitely-not-soffice");
        let result = run_bounded(cmd, Duration::from_secs(1)).await.unwrap();
        assert!(matches!(result, Invocation::NotFound));
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let started = std::time::Instant::now();
        let result = run_bounded(sh("exec sleep 30"), Duration::from_millis(300))
            .await
            .unwrap();
        assert!(matches!(result, Invocation::TimedOut));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_means_no_deadline() {
        let result = run_bounded(sh("echo done"), Duration::MAX).await.unwrap();
        match result {
            Invocation::Completed(out) => assert_eq!(out.stdout, "done\n"),
            other => panic!("expected completion, got {other:?}"),
        }
    }
}
