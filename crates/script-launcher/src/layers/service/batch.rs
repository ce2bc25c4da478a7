use chrono::Local;
use launch_types::{LauncherConfig, RunRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::events::BatchEvent;
use crate::layers::execution::{run_batch, BatchLog};

/// A batch running on its own task. Dropping the handle does not stop it.
pub(crate) struct BatchHandle {
    id: Uuid,
    log_path: PathBuf,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl BatchHandle {
    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn is_cancelling(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Creates the batch log (header included) before returning, so a tailer can
/// attach to `log_path` right away, then runs the batch in the background.
/// Completion is reported as [`BatchEvent::Finished`] on `events`.
pub(crate) fn spawn_batch(
    request: RunRequest,
    config: Arc<LauncherConfig>,
    events: mpsc::Sender<BatchEvent>,
) -> anyhow::Result<BatchHandle> {
    let id = Uuid::new_v4();
    let mut log = BatchLog::create(
        &config.log_dir,
        Local::now(),
        &system_utils::host::current_user(),
        &system_utils::host::hostname(),
    )?;
    let log_path = log.path().to_path_buf();
    let cancel = CancellationToken::new();

    tracing::info!(
        batch_id = %id,
        log = %log_path.display(),
        scripts = request.scripts.len(),
        script_dirs = request.script_dirs.len(),
        target_dirs = request.target_dirs.len(),
        "batch started"
    );

    let span = tracing::info_span!("batch", batch_id = %id);
    let task_cancel = cancel.clone();
    let task_log_path = log_path.clone();
    let task = tokio::spawn(
        async move {
            let result = run_batch(&request, &config, &mut log, &task_cancel).await;
            match &result {
                Ok(summary) => tracing::info!(
                    attempts = summary.attempts,
                    failed = summary.failed,
                    skipped = summary.skipped,
                    cancelled = summary.cancelled,
                    "batch finished"
                ),
                Err(err) => tracing::warn!(error = %err, "batch aborted"),
            }
            let _ = events
                .send(BatchEvent::Finished {
                    id,
                    log_path: task_log_path,
                    result,
                })
                .await;
        }
        .instrument(span),
    );

    Ok(BatchHandle {
        id,
        log_path,
        cancel,
        task,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn header_exists_before_batch_finishes_and_event_arrives() {
        let logs = tempfile::tempdir().expect("logs");
        let scripts = tempfile::tempdir().expect("scripts");
        std::fs::write(scripts.path().join("a.sh"), "echo hi\n").expect("write");
        let mut config = LauncherConfig::from_toml("[interpreters]\nsh = \"/bin/sh\"\n")
            .expect("config");
        config.log_dir = logs.path().to_path_buf();
        let request = RunRequest {
            scripts: vec!["a.sh".to_string()],
            script_dirs: vec![scripts.path().to_string_lossy().to_string()],
            target_dirs: vec![logs.path().to_string_lossy().to_string()],
        };
        let (tx, mut rx) = mpsc::channel(4);
        let handle = spawn_batch(request, Arc::new(config), tx).expect("spawn");

        let header = std::fs::read_to_string(handle.log_path()).expect("header");
        assert!(header.starts_with("Log created on: "));

        match rx.recv().await.expect("event") {
            BatchEvent::Finished {
                id,
                log_path,
                result,
            } => {
                assert_eq!(id, handle.id());
                assert_eq!(log_path, handle.log_path());
                let summary = result.expect("summary");
                assert_eq!(summary.succeeded, 1);
            }
        }
        let content = std::fs::read_to_string(handle.log_path()).expect("log");
        assert!(content.contains("Output:\nhi\n"));
    }

    #[tokio::test]
    async fn cancel_stops_running_attempt() {
        let logs = tempfile::tempdir().expect("logs");
        let scripts = tempfile::tempdir().expect("scripts");
        std::fs::write(scripts.path().join("slow.sh"), "sleep 30\n").expect("write");
        let mut config = LauncherConfig::from_toml("[interpreters]\nsh = \"/bin/sh\"\n")
            .expect("config");
        config.log_dir = logs.path().to_path_buf();
        let request = RunRequest {
            scripts: vec!["slow.sh".to_string(), "slow.sh".to_string()],
            script_dirs: vec![scripts.path().to_string_lossy().to_string()],
            target_dirs: vec![logs.path().to_string_lossy().to_string()],
        };
        let (tx, mut rx) = mpsc::channel(4);
        let handle = spawn_batch(request, Arc::new(config), tx).expect("spawn");
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        handle.cancel();
        assert!(handle.is_cancelling());

        let BatchEvent::Finished { result, .. } = rx.recv().await.expect("event");
        let summary = result.expect("summary");
        assert!(summary.cancelled);
        assert_eq!(summary.attempts, 1);
        let content = std::fs::read_to_string(handle.log_path()).expect("log");
        assert!(content.contains("Status: Cancelled\n"));
        assert!(content.contains("Batch cancelled at "));
    }
}
