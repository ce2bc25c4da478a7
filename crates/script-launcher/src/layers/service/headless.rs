use anyhow::Context;
use launch_types::{LauncherConfig, RunRequest};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::batch::spawn_batch;
use super::events::BatchEvent;
use super::tail::LogTailer;
use crate::layers::execution::BatchSummary;

/// Runs one batch without the UI, echoing the batch log to stdout as it
/// grows. Ctrl+C cancels the batch; the call still waits for it to wind down.
pub(crate) async fn run_headless(
    request: RunRequest,
    config: Arc<LauncherConfig>,
) -> anyhow::Result<BatchSummary> {
    if request.is_empty() {
        tracing::warn!("run request has an empty list, no script will run");
    }
    let interval = config.tail_interval;
    let (events_tx, mut events_rx) = mpsc::channel(4);
    let handle = spawn_batch(request, config, events_tx)?;
    eprintln!("batch log: {}", handle.log_path().display());

    let mut tailer = LogTailer::new(handle.log_path());
    let mut ticker = tokio::time::interval(interval);
    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                write_chunk(&mut stdout, &tailer.poll())?;
            }
            event = events_rx.recv() => {
                write_chunk(&mut stdout, &tailer.poll())?;
                return match event {
                    Some(BatchEvent::Finished { result, .. }) => result,
                    None => anyhow::bail!("batch task ended without reporting"),
                };
            }
            signal = tokio::signal::ctrl_c(), if !handle.is_cancelling() => {
                signal.context("failed to listen for ctrl-c")?;
                tracing::info!(batch_id = %handle.id(), "cancel requested");
                eprintln!("cancelling batch...");
                handle.cancel();
            }
        }
    }
}

/// Follows an existing batch log until Ctrl+C.
pub(crate) async fn follow_log(path: &Path, interval: Duration) -> anyhow::Result<()> {
    let mut tailer = LogTailer::new(path);
    let mut ticker = tokio::time::interval(interval);
    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                write_chunk(&mut stdout, &tailer.poll())?;
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                tracing::debug!(
                    path = %tailer.path().display(),
                    cursor = tailer.cursor(),
                    "tail stopped"
                );
                return Ok(());
            }
        }
    }
}

fn write_chunk(out: &mut impl Write, chunk: &str) -> anyhow::Result<()> {
    if chunk.is_empty() {
        return Ok(());
    }
    out.write_all(chunk.as_bytes())?;
    out.flush()?;
    Ok(())
}
