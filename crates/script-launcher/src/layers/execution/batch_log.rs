use anyhow::Context;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use super::attempt::{Attempt, AttemptOutcome};

const SEPARATOR_WIDTH: usize = 40;
const MAX_NAME_SUFFIX: usize = 1000;

/// Append-only writer for one batch's log file.
pub(crate) struct BatchLog {
    path: PathBuf,
    file: File,
}

impl BatchLog {
    /// Creates a fresh `script_log_<stamp>.txt` in `dir` and writes the header.
    /// An existing file is never overwritten; a numeric suffix is added instead.
    pub(crate) fn create(
        dir: &Path,
        created_at: DateTime<Local>,
        user: &str,
        host: &str,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log dir {}", dir.display()))?;
        let (path, mut file) = create_unique(dir, &log_file_stem(created_at))?;
        file.write_all(format_header(created_at, user, host).as_bytes())
            .with_context(|| format!("failed to write log header {}", path.display()))?;
        file.flush()?;
        Ok(Self {
            path,
            file: File::from_std(file),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) async fn append_attempt(&mut self, attempt: &Attempt) -> anyhow::Result<()> {
        self.append(&format_attempt(attempt)).await
    }

    pub(crate) async fn append(&mut self, text: &str) -> anyhow::Result<()> {
        self.file
            .write_all(text.as_bytes())
            .await
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        self.file.flush().await?;
        Ok(())
    }
}

fn create_unique(dir: &Path, stem: &str) -> anyhow::Result<(PathBuf, std::fs::File)> {
    for suffix in 0..MAX_NAME_SUFFIX {
        let name = if suffix == 0 {
            format!("{stem}.txt")
        } else {
            format!("{stem}_{suffix}.txt")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(err).with_context(|| format!("failed to create {}", path.display()))
            }
        }
    }
    anyhow::bail!("no free log file name for {stem} in {}", dir.display())
}

pub(crate) fn log_file_stem(created_at: DateTime<Local>) -> String {
    format!("script_log_{}", created_at.format("%Y%m%d_%H%M%S"))
}

pub(crate) fn format_timestamp(time: DateTime<Local>) -> String {
    time.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

pub(crate) fn format_header(created_at: DateTime<Local>, user: &str, host: &str) -> String {
    format!(
        "Log created on: {}\nUser: {user}\nHost: {host}\n\n",
        format_timestamp(created_at)
    )
}

pub(crate) fn format_attempt(attempt: &Attempt) -> String {
    let mut out = String::new();
    let started = format_timestamp(attempt.started_at);
    let finished = format_timestamp(attempt.finished_at);
    match &attempt.outcome {
        AttemptOutcome::Exited { stdout, stderr, .. }
        | AttemptOutcome::Cancelled { stdout, stderr } => {
            let _ = writeln!(out, "Script: {}", attempt.script);
            let _ = writeln!(out, "Directory: {}", attempt.target_dir);
            let _ = writeln!(out, "Start Time: {started}");
            out.push_str("Output:\n");
            out.push_str(stdout);
            out.push('\n');
            if !stderr.is_empty() {
                out.push_str("Errors:\n");
                out.push_str(stderr);
                out.push('\n');
            }
            let _ = writeln!(out, "End Time: {finished}");
            if let AttemptOutcome::Exited { exit_code, .. } = &attempt.outcome {
                match exit_code {
                    Some(code) => {
                        let _ = writeln!(out, "Exit Code: {code}");
                    }
                    None => out.push_str("Exit Code: none (terminated by signal)\n"),
                }
            }
            let _ = writeln!(out, "Status: {}", attempt.outcome.status().label());
        }
        AttemptOutcome::TimedOut(after) => {
            write_failure(
                &mut out,
                attempt,
                &started,
                &format!("timed out after {}s", after.as_secs_f64()),
                &finished,
            );
        }
        AttemptOutcome::LaunchFailed(message) => {
            write_failure(&mut out, attempt, &started, message, &finished);
        }
    }
    out.push_str(&"-".repeat(SEPARATOR_WIDTH));
    out.push('\n');
    out
}

fn write_failure(
    out: &mut String,
    attempt: &Attempt,
    started: &str,
    error: &str,
    finished: &str,
) {
    let _ = writeln!(out, "Failed to run script: {} at {started}", attempt.script);
    let _ = writeln!(out, "Directory: {}", attempt.target_dir);
    let _ = writeln!(out, "Error: {error}");
    let _ = writeln!(out, "End Time: {finished}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn at(hour: u32, min: u32, sec: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 9, hour, min, sec)
            .single()
            .expect("unambiguous time")
    }

    fn attempt(outcome: AttemptOutcome) -> Attempt {
        Attempt {
            script: "build.py".to_string(),
            script_path: PathBuf::from("/s/build.py"),
            target_dir: "/t".to_string(),
            started_at: at(10, 0, 0),
            finished_at: at(10, 0, 5),
            outcome,
        }
    }

    #[test]
    fn stem_uses_compact_timestamp() {
        assert_eq!(log_file_stem(at(7, 8, 9)), "script_log_20240309_070809");
    }

    #[test]
    fn header_lists_time_user_and_host() {
        let header = format_header(at(7, 8, 9), "alice", "buildbox");
        assert_eq!(
            header,
            "Log created on: 2024-03-09 07:08:09.000000\nUser: alice\nHost: buildbox\n\n"
        );
    }

    #[test]
    fn success_block_omits_empty_errors() {
        let block = format_attempt(&attempt(AttemptOutcome::Exited {
            exit_code: Some(0),
            stdout: "done\n".to_string(),
            stderr: String::new(),
        }));
        assert_eq!(
            block,
            "Script: build.py\n\
             Directory: /t\n\
             Start Time: 2024-03-09 10:00:00.000000\n\
             Output:\n\
             done\n\n\
             End Time: 2024-03-09 10:00:05.000000\n\
             Exit Code: 0\n\
             Status: Success\n\
             ----------------------------------------\n"
        );
    }

    #[test]
    fn failed_block_includes_errors() {
        let block = format_attempt(&attempt(AttemptOutcome::Exited {
            exit_code: Some(2),
            stdout: String::new(),
            stderr: "boom".to_string(),
        }));
        assert!(block.contains("Errors:\nboom\n"));
        assert!(block.contains("Exit Code: 2\n"));
        assert!(block.contains("Status: Failed\n"));
    }

    #[test]
    fn launch_failure_block_carries_message() {
        let block = format_attempt(&attempt(AttemptOutcome::LaunchFailed(
            "permission denied".to_string(),
        )));
        assert!(block.starts_with(
            "Failed to run script: build.py at 2024-03-09 10:00:00.000000\n"
        ));
        assert!(block.contains("Error: permission denied\n"));
        assert!(block.contains("End Time: 2024-03-09 10:00:05.000000\n"));
        assert!(!block.contains("Status:"));
        assert!(block.ends_with(&format!("{}\n", "-".repeat(40))));
    }

    #[test]
    fn timeout_block_reports_duration() {
        let block = format_attempt(&attempt(AttemptOutcome::TimedOut(Duration::from_secs(30))));
        assert!(block.contains("Error: timed out after 30s\n"));
    }

    #[test]
    fn cancelled_block_has_cancelled_status() {
        let block = format_attempt(&attempt(AttemptOutcome::Cancelled {
            stdout: "partial".to_string(),
            stderr: String::new(),
        }));
        assert!(block.contains("Output:\npartial\n"));
        assert!(block.contains("Status: Cancelled\n"));
        assert!(!block.contains("Exit Code"));
    }

    #[tokio::test]
    async fn create_writes_header_and_avoids_collisions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = BatchLog::create(dir.path(), at(7, 8, 9), "alice", "box").expect("first");
        let second = BatchLog::create(dir.path(), at(7, 8, 9), "alice", "box").expect("second");
        assert_eq!(
            first.path().file_name().and_then(|n| n.to_str()),
            Some("script_log_20240309_070809.txt")
        );
        assert_eq!(
            second.path().file_name().and_then(|n| n.to_str()),
            Some("script_log_20240309_070809_1.txt")
        );
        let content = std::fs::read_to_string(first.path()).expect("read");
        assert!(content.starts_with("Log created on: 2024-03-09 07:08:09"));
    }

    #[tokio::test]
    async fn append_goes_to_the_end() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut log = BatchLog::create(dir.path(), at(7, 8, 9), "alice", "box").expect("log");
        log.append("first\n").await.expect("append");
        log.append("second\n").await.expect("append");
        let content = std::fs::read_to_string(log.path()).expect("read");
        assert!(content.ends_with("\n\nfirst\nsecond\n"));
    }
}
