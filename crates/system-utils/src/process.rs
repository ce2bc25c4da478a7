use std::process::{ExitStatus, Stdio};

use anyhow::Context;
use tokio::process::{Child, Command};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::stream::read_stream_capture;
pub use crate::stream::CapturedStream;

const TERMINATE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy)]
pub struct CaptureLimits {
    pub timeout: Option<Duration>,
    pub max_output_bytes: usize,
}

#[derive(Debug)]
pub enum Termination {
    Exited(ExitStatus),
    TimedOut(Duration),
    Cancelled,
}

#[derive(Debug)]
pub struct CapturedOutput {
    pub termination: Termination,
    pub stdout: CapturedStream,
    pub stderr: CapturedStream,
}

impl CapturedOutput {
    pub fn exit_code(&self) -> Option<i32> {
        match &self.termination {
            Termination::Exited(status) => status.code(),
            _ => None,
        }
    }
}

/// Spawns `cmd` with stdin closed and both output streams captured, then waits
/// for it to exit, time out, or be cancelled. A spawn failure is returned as
/// an error; everything after a successful spawn is reported through
/// [`Termination`].
pub async fn run_captured(
    cmd: &mut Command,
    limits: CaptureLimits,
    cancel: &CancellationToken,
    label: &str,
) -> anyhow::Result<CapturedOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    apply_process_group(cmd);
    let mut child = cmd.spawn().with_context(|| format!("failed to spawn {label}"))?;

    let stdout = child.stdout.take().context("missing stdout")?;
    let stderr = child.stderr.take().context("missing stderr")?;
    let stdout_task = tokio::spawn(read_stream_capture(stdout, limits.max_output_bytes));
    let stderr_task = tokio::spawn(read_stream_capture(stderr, limits.max_output_bytes));

    let timeout = async {
        match limits.timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending::<()>().await,
        }
    };

    let termination = tokio::select! {
        status = child.wait() => {
            Termination::Exited(status.with_context(|| format!("wait on {label}"))?)
        }
        _ = timeout => {
            terminate_child(&mut child).await;
            Termination::TimedOut(limits.timeout.unwrap_or_default())
        }
        _ = cancel.cancelled() => {
            terminate_child(&mut child).await;
            Termination::Cancelled
        }
    };

    let stdout = stdout_task
        .await
        .context("stdout task join")?
        .context("stdout read")?;
    let stderr = stderr_task
        .await
        .context("stderr task join")?
        .context("stderr read")?;

    Ok(CapturedOutput {
        termination,
        stdout,
        stderr,
    })
}

#[cfg(unix)]
fn apply_process_group(cmd: &mut Command) {
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn apply_process_group(_cmd: &mut Command) {}

#[cfg(unix)]
fn signal_group(child: &Child, signal: i32) {
    if let Some(pid) = child.id() {
        unsafe {
            libc::kill(-(pid as i32), signal);
        }
    }
}

/// Interrupts the child's process group, escalating to a kill when it does
/// not exit within the grace period.
pub async fn terminate_child(child: &mut Child) -> Option<ExitStatus> {
    #[cfg(unix)]
    signal_group(child, libc::SIGINT);
    #[cfg(not(unix))]
    let _ = child.start_kill();

    if let Ok(status) = tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
        return status.ok();
    }
    #[cfg(unix)]
    signal_group(child, libc::SIGKILL);
    let _ = child.kill().await;
    match tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
        Ok(status) => status.ok(),
        Err(_) => None,
    }
}
