use launch_types::{LauncherConfig, RunRequest, Session};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::editor::TextBuffer;
use super::log_view::LogView;
use crate::layers::service::batch::{spawn_batch, BatchHandle};
use crate::layers::service::events::BatchEvent;
use crate::layers::service::import::target_dirs_text;
use crate::layers::service::tail::LogTailer;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Focus {
    #[default]
    Scripts,
    TargetDirs,
    ScriptDirs,
    Log,
}

impl Focus {
    pub(crate) fn next(self) -> Self {
        match self {
            Focus::Scripts => Focus::TargetDirs,
            Focus::TargetDirs => Focus::ScriptDirs,
            Focus::ScriptDirs => Focus::Log,
            Focus::Log => Focus::Scripts,
        }
    }

    pub(crate) fn prev(self) -> Self {
        match self {
            Focus::Scripts => Focus::Log,
            Focus::TargetDirs => Focus::Scripts,
            Focus::ScriptDirs => Focus::TargetDirs,
            Focus::Log => Focus::ScriptDirs,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PromptKind {
    LoadSession,
    SaveSession,
    ImportTargetDirs,
}

impl PromptKind {
    pub(crate) fn title(self) -> &'static str {
        match self {
            PromptKind::LoadSession => "Load session (JSON path)",
            PromptKind::SaveSession => "Save session (JSON path)",
            PromptKind::ImportTargetDirs => "Load target directories from folder",
        }
    }
}

#[derive(Debug)]
pub(crate) struct Prompt {
    pub(crate) kind: PromptKind,
    pub(crate) input: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StatusLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug)]
pub(crate) struct StatusLine {
    pub(crate) level: StatusLevel,
    pub(crate) text: String,
}

/// Everything the key handlers and the renderer work on.
pub(crate) struct AppState {
    pub(crate) config: Arc<LauncherConfig>,
    pub(crate) events: mpsc::Sender<BatchEvent>,
    pub(crate) scripts: TextBuffer,
    pub(crate) target_dirs: TextBuffer,
    pub(crate) script_dirs: TextBuffer,
    pub(crate) focus: Focus,
    pub(crate) log: LogView,
    pub(crate) tailer: Option<LogTailer>,
    pub(crate) batch: Option<BatchHandle>,
    pub(crate) prompt: Option<Prompt>,
    pub(crate) status: Option<StatusLine>,
    pub(crate) session_path: Option<PathBuf>,
    pub(crate) confirm_quit: bool,
}

impl AppState {
    pub(crate) fn new(config: Arc<LauncherConfig>, events: mpsc::Sender<BatchEvent>) -> Self {
        Self {
            config,
            events,
            scripts: TextBuffer::default(),
            target_dirs: TextBuffer::default(),
            script_dirs: TextBuffer::default(),
            focus: Focus::default(),
            log: LogView::default(),
            tailer: None,
            batch: None,
            prompt: None,
            status: None,
            session_path: None,
            confirm_quit: false,
        }
    }

    pub(crate) fn session(&self) -> Session {
        Session {
            script_files: self.scripts.text(),
            target_dirs: self.target_dirs.text(),
            script_dirs: self.script_dirs.text(),
        }
    }

    pub(crate) fn apply_session(&mut self, session: &Session) {
        self.scripts.set_text(&session.script_files);
        self.target_dirs.set_text(&session.target_dirs);
        self.script_dirs.set_text(&session.script_dirs);
    }

    pub(crate) fn run_request(&self) -> RunRequest {
        RunRequest::from_text(
            &self.scripts.text(),
            &self.script_dirs.text(),
            &self.target_dirs.text(),
        )
    }

    pub(crate) fn focused_editor(&mut self) -> Option<&mut TextBuffer> {
        match self.focus {
            Focus::Scripts => Some(&mut self.scripts),
            Focus::TargetDirs => Some(&mut self.target_dirs),
            Focus::ScriptDirs => Some(&mut self.script_dirs),
            Focus::Log => None,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.batch.as_ref().is_some_and(|batch| !batch.is_finished())
    }

    pub(crate) fn set_status(&mut self, level: StatusLevel, text: impl Into<String>) {
        self.status = Some(StatusLine {
            level,
            text: text.into(),
        });
    }

    /// Starts a batch from the current inputs and points the log view at its
    /// log file. Refused while another batch is still running.
    pub(crate) fn launch(&mut self) {
        if self.is_running() {
            self.set_status(StatusLevel::Warn, "a batch is already running");
            return;
        }
        let request = self.run_request();
        if request.is_empty() {
            self.set_status(
                StatusLevel::Warn,
                "scripts, target dirs and script dirs each need at least one entry",
            );
            return;
        }
        match spawn_batch(request, Arc::clone(&self.config), self.events.clone()) {
            Ok(handle) => {
                self.log.clear();
                self.tailer = Some(LogTailer::new(handle.log_path()));
                self.set_status(
                    StatusLevel::Info,
                    format!("running, log {}", handle.log_path().display()),
                );
                self.batch = Some(handle);
                self.poll_log();
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to start batch");
                self.set_status(StatusLevel::Error, format!("launch failed: {err:#}"));
            }
        }
    }

    pub(crate) fn cancel_batch(&mut self) {
        match &self.batch {
            Some(batch) if !batch.is_finished() => {
                batch.cancel();
                tracing::info!(batch_id = %batch.id(), "cancel requested");
                self.set_status(StatusLevel::Warn, "cancelling batch...");
            }
            _ => self.set_status(StatusLevel::Warn, "no batch is running"),
        }
    }

    /// One tail step: append whatever the log grew by since the last poll.
    pub(crate) fn poll_log(&mut self) {
        if let Some(tailer) = self.tailer.as_mut() {
            let chunk = tailer.poll();
            self.log.append(&chunk);
        }
    }

    pub(crate) fn handle_event(&mut self, event: BatchEvent) {
        match event {
            BatchEvent::Finished {
                id,
                log_path,
                result,
            } => {
                if self.batch.as_ref().map(BatchHandle::id) != Some(id) {
                    return;
                }
                self.poll_log();
                self.batch = None;
                self.confirm_quit = false;
                match result {
                    Ok(summary) => {
                        let level = if summary.failed > 0 || summary.cancelled {
                            StatusLevel::Warn
                        } else {
                            StatusLevel::Info
                        };
                        self.set_status(
                            level,
                            format!("finished: {} ({})", summary.describe(), log_path.display()),
                        );
                    }
                    Err(err) => {
                        self.set_status(StatusLevel::Error, format!("batch aborted: {err:#}"));
                    }
                }
            }
        }
    }

    pub(crate) fn open_prompt(&mut self, kind: PromptKind) {
        let input = match kind {
            PromptKind::LoadSession | PromptKind::SaveSession => self
                .session_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
            PromptKind::ImportTargetDirs => String::new(),
        };
        self.prompt = Some(Prompt { kind, input });
    }

    pub(crate) fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        let raw = prompt.input.trim();
        if raw.is_empty() {
            self.set_status(StatusLevel::Warn, "no path given");
            return;
        }
        let path = PathBuf::from(raw);
        match prompt.kind {
            PromptKind::LoadSession => self.load_session(path),
            PromptKind::SaveSession => self.save_session(path),
            PromptKind::ImportTargetDirs => self.import_target_dirs(path),
        }
    }

    pub(crate) fn load_session(&mut self, path: PathBuf) {
        match Session::load(&path) {
            Ok(session) => {
                self.apply_session(&session);
                self.set_status(StatusLevel::Info, format!("loaded {}", path.display()));
                self.session_path = Some(path);
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load session");
                self.set_status(StatusLevel::Error, format!("{err:#}"));
            }
        }
    }

    fn save_session(&mut self, path: PathBuf) {
        match self.session().save(&path) {
            Ok(()) => {
                self.set_status(StatusLevel::Info, format!("saved {}", path.display()));
                self.session_path = Some(path);
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to save session");
                self.set_status(StatusLevel::Error, format!("{err:#}"));
            }
        }
    }

    fn import_target_dirs(&mut self, folder: PathBuf) {
        match target_dirs_text(&folder) {
            Ok(text) => {
                let count = text.lines().count();
                self.target_dirs.set_text(&text);
                self.focus = Focus::TargetDirs;
                self.set_status(
                    StatusLevel::Info,
                    format!("imported {count} directories from {}", folder.display()),
                );
            }
            Err(err) => self.set_status(StatusLevel::Error, format!("{err:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> AppState {
        let (tx, _rx) = mpsc::channel(4);
        AppState::new(Arc::new(LauncherConfig::default()), tx)
    }

    #[test]
    fn session_round_trips_through_buffers() {
        let mut state = app();
        let session = Session {
            script_files: "a.py\n\nb.pl".to_string(),
            target_dirs: "/t1\n/t2\n".to_string(),
            script_dirs: "/s".to_string(),
        };
        state.apply_session(&session);
        assert_eq!(state.session(), session);
    }

    #[test]
    fn run_request_uses_all_three_inputs() {
        let mut state = app();
        state.scripts.set_text("a.py\nb.py");
        state.target_dirs.set_text("/t");
        state.script_dirs.set_text("/s1\n\n/s2");
        let request = state.run_request();
        assert_eq!(request.scripts, vec!["a.py", "b.py"]);
        assert_eq!(request.target_dirs, vec!["/t"]);
        assert_eq!(request.script_dirs, vec!["/s1", "/s2"]);
    }

    #[test]
    fn launch_with_empty_inputs_only_warns() {
        let mut state = app();
        state.launch();
        assert!(state.batch.is_none());
        assert_eq!(state.status.as_ref().map(|s| s.level), Some(StatusLevel::Warn));
    }

    #[test]
    fn focus_cycles_through_all_panes() {
        let mut focus = Focus::Scripts;
        for _ in 0..4 {
            focus = focus.next();
        }
        assert_eq!(focus, Focus::Scripts);
        assert_eq!(Focus::Scripts.prev(), Focus::Log);
    }

    #[test]
    fn save_then_load_prompt_restores_inputs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        let mut state = app();
        state.scripts.set_text("run.py\n\n");
        state.target_dirs.set_text("/work");
        state.script_dirs.set_text("/scripts");
        state.open_prompt(PromptKind::SaveSession);
        if let Some(prompt) = state.prompt.as_mut() {
            prompt.input = path.display().to_string();
        }
        state.submit_prompt();
        assert!(path.exists());

        let mut fresh = app();
        fresh.open_prompt(PromptKind::LoadSession);
        if let Some(prompt) = fresh.prompt.as_mut() {
            prompt.input = path.display().to_string();
        }
        fresh.submit_prompt();
        assert_eq!(fresh.scripts.text(), "run.py\n\n");
        assert_eq!(fresh.session_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn malformed_session_sets_error_status() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"script_files": "a.py"}"#).expect("write");
        let mut state = app();
        state.scripts.set_text("keep.py");
        state.load_session(path);
        assert_eq!(state.scripts.text(), "keep.py");
        let status = state.status.expect("status");
        assert_eq!(status.level, StatusLevel::Error);
        assert!(status.text.contains("target_dirs") || status.text.contains("missing field"));
    }

    #[test]
    fn import_prompt_fills_target_dirs() {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(root.path().join("a")).expect("a");
        std::fs::create_dir(root.path().join("b")).expect("b");
        let mut state = app();
        state.target_dirs.set_text("/old");
        state.open_prompt(PromptKind::ImportTargetDirs);
        if let Some(prompt) = state.prompt.as_mut() {
            prompt.input = root.path().display().to_string();
        }
        state.submit_prompt();
        let text = state.target_dirs.text();
        assert_eq!(text.lines().count(), 2);
        assert!(!text.contains("/old"));
        assert_eq!(state.focus, Focus::TargetDirs);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn launch_tails_log_and_finish_event_clears_batch() {
        let logs = tempfile::tempdir().expect("logs");
        let scripts = tempfile::tempdir().expect("scripts");
        std::fs::write(scripts.path().join("hello.sh"), "echo hello\n").expect("write");
        let mut config =
            LauncherConfig::from_toml("[interpreters]\nsh = \"/bin/sh\"\n").expect("config");
        config.log_dir = logs.path().to_path_buf();
        let (tx, mut rx) = mpsc::channel(4);
        let mut state = AppState::new(Arc::new(config), tx);
        state.scripts.set_text("hello.sh");
        state.script_dirs.set_text(&scripts.path().display().to_string());
        state.target_dirs.set_text(&logs.path().display().to_string());

        state.launch();
        assert!(state.batch.is_some());
        assert!(state.log.text().starts_with("Log created on: "));

        let event = rx.recv().await.expect("event");
        state.handle_event(event);
        assert!(state.batch.is_none());
        assert!(state.log.text().contains("Script: hello.sh"));
        assert!(state.log.text().contains("Status: Success"));
        let status = state.status.expect("status");
        assert_eq!(status.level, StatusLevel::Info);
        assert!(status.text.contains("1 succeeded"));
    }
}
