use chrono::{DateTime, Local};
use launch_types::{Candidate, LauncherConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use system_utils::process::{run_captured, CaptureLimits, Termination};
use tokio_util::sync::CancellationToken;

use super::launcher::Launcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttemptStatus {
    Success,
    Failed,
    Cancelled,
}

impl AttemptStatus {
    pub(crate) fn label(self) -> &'static str {
        match self {
            AttemptStatus::Success => "Success",
            AttemptStatus::Failed => "Failed",
            AttemptStatus::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    Exited {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    Cancelled {
        stdout: String,
        stderr: String,
    },
    TimedOut(Duration),
    LaunchFailed(String),
}

impl AttemptOutcome {
    pub(crate) fn status(&self) -> AttemptStatus {
        match self {
            AttemptOutcome::Exited {
                exit_code: Some(0),
                ..
            } => AttemptStatus::Success,
            AttemptOutcome::Cancelled { .. } => AttemptStatus::Cancelled,
            _ => AttemptStatus::Failed,
        }
    }
}

/// One executed (target dir, script, script dir) triple.
#[derive(Debug)]
pub(crate) struct Attempt {
    pub(crate) script: String,
    pub(crate) script_path: PathBuf,
    pub(crate) target_dir: String,
    pub(crate) started_at: DateTime<Local>,
    pub(crate) finished_at: DateTime<Local>,
    pub(crate) outcome: AttemptOutcome,
}

pub(crate) async fn execute_attempt(
    candidate: &Candidate<'_>,
    config: &LauncherConfig,
    cancel: &CancellationToken,
) -> Attempt {
    let started_at = Local::now();
    // The child runs in the target dir, so a relative script dir must be
    // resolved against our own cwd first.
    let script_path =
        std::path::absolute(&candidate.path).unwrap_or_else(|_| candidate.path.clone());
    let launcher = Launcher::resolve(candidate.script, config);
    let label = launcher.describe(&script_path);
    let mut cmd = launcher.command(&script_path, Path::new(candidate.target_dir));
    let limits = CaptureLimits {
        timeout: config.limits.timeout,
        max_output_bytes: usize::try_from(config.limits.max_output_bytes).unwrap_or(usize::MAX),
    };

    tracing::info!(
        script = candidate.script,
        target_dir = candidate.target_dir,
        command = %label,
        "starting attempt"
    );

    let outcome = match run_captured(&mut cmd, limits, cancel, &label).await {
        Ok(output) => {
            let exit_code = output.exit_code();
            let stdout = output.stdout.to_text();
            let stderr = output.stderr.to_text();
            match output.termination {
                Termination::Exited(_) => AttemptOutcome::Exited {
                    exit_code,
                    stdout,
                    stderr,
                },
                Termination::Cancelled => AttemptOutcome::Cancelled { stdout, stderr },
                Termination::TimedOut(after) => AttemptOutcome::TimedOut(after),
            }
        }
        Err(err) => AttemptOutcome::LaunchFailed(format!("{err:#}")),
    };

    Attempt {
        script: candidate.script.to_string(),
        script_path,
        target_dir: candidate.target_dir.to_string(),
        started_at,
        finished_at: Local::now(),
        outcome,
    }
}
