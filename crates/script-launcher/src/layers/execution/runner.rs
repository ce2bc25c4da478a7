use chrono::Local;
use launch_types::{LauncherConfig, RunRequest};
use tokio_util::sync::CancellationToken;

use super::attempt::{execute_attempt, AttemptStatus};
use super::batch_log::{format_timestamp, BatchLog};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct BatchSummary {
    pub(crate) attempts: usize,
    pub(crate) succeeded: usize,
    pub(crate) failed: usize,
    pub(crate) skipped: usize,
    pub(crate) cancelled: bool,
}

impl BatchSummary {
    fn record(&mut self, status: AttemptStatus) {
        self.attempts += 1;
        match status {
            AttemptStatus::Success => self.succeeded += 1,
            AttemptStatus::Failed => self.failed += 1,
            AttemptStatus::Cancelled => self.cancelled = true,
        }
    }

    pub(crate) fn describe(&self) -> String {
        let mut text = format!(
            "{} attempts, {} succeeded, {} failed, {} skipped",
            self.attempts, self.succeeded, self.failed, self.skipped
        );
        if self.cancelled {
            text.push_str(" (cancelled)");
        }
        text
    }
}

/// Runs every existing candidate of `request` one after another, appending a
/// block per attempt to `log`. Missing script paths are skipped without a log
/// entry; attempt failures never stop the batch. Only a cancellation or a log
/// write error ends it early.
pub(crate) async fn run_batch(
    request: &RunRequest,
    config: &LauncherConfig,
    log: &mut BatchLog,
    cancel: &CancellationToken,
) -> anyhow::Result<BatchSummary> {
    let mut summary = BatchSummary::default();

    for candidate in request.candidates() {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            break;
        }
        if !tokio::fs::try_exists(&candidate.path).await.unwrap_or(false) {
            tracing::debug!(path = %candidate.path.display(), "script not found, skipping");
            summary.skipped += 1;
            continue;
        }

        let attempt = execute_attempt(&candidate, config, cancel).await;
        let status = attempt.outcome.status();
        summary.record(status);
        tracing::info!(
            script = %attempt.script,
            path = %attempt.script_path.display(),
            target_dir = %attempt.target_dir,
            status = status.label(),
            "attempt finished"
        );
        log.append_attempt(&attempt).await?;

        if status == AttemptStatus::Cancelled {
            break;
        }
    }

    if summary.cancelled {
        log.append(&format!(
            "Batch cancelled at {}\n",
            format_timestamp(Local::now())
        ))
        .await?;
    }

    Ok(summary)
}
