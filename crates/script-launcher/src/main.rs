mod cli;
mod layers;

use crate::cli::{Args, Command};
use crate::layers::service::events::BatchEvent;
use crate::layers::service::headless::{follow_log, run_headless};
use crate::layers::service::import::target_dirs_text;
use crate::layers::service::logging::init_tracing;
use crate::layers::ui::{draw_ui, handle_key_event, restore_terminal, setup_terminal, AppState};
use anyhow::Context;
use clap::Parser;
use crossterm::event::{self, Event};
use launch_types::{LauncherConfig, Session};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Ui { session: None });
    let ui_mode = matches!(command, Command::Ui { .. });

    let _file_guard = init_tracing(&args.trace_dir, args.log_to_stderr && !ui_mode)?;

    let config = LauncherConfig::load_or_default(args.config.as_deref())?;
    let config = Arc::new(config);

    match command {
        Command::Ui { session } => run_ui(config, session).await,
        Command::Run(run) => {
            let request = run.request()?;
            let summary = run_headless(request, config).await?;
            tracing::info!(summary = %summary.describe(), "batch finished");
            Ok(())
        }
        Command::ImportDirs { folder, session } => import_dirs(&folder, session.as_deref()),
        Command::Tail { log } => follow_log(&log, config.tail_interval).await,
    }
}

fn import_dirs(folder: &Path, session_path: Option<&Path>) -> anyhow::Result<()> {
    let text = target_dirs_text(folder)?;
    let Some(path) = session_path else {
        if !text.is_empty() {
            println!("{text}");
        }
        return Ok(());
    };
    let mut session = if path.exists() {
        Session::load(path)?
    } else {
        Session::default()
    };
    session.target_dirs = text;
    session.save(path)?;
    tracing::info!(
        folder = %folder.display(),
        session = %path.display(),
        "target directories imported"
    );
    Ok(())
}

async fn run_ui(config: Arc<LauncherConfig>, session: Option<PathBuf>) -> anyhow::Result<()> {
    let (events_tx, mut events_rx) = mpsc::channel::<BatchEvent>(16);
    let tail_interval = config.tail_interval;
    let mut app = AppState::new(config, events_tx);
    if let Some(path) = session {
        app.load_session(path);
    }

    let mut terminal = setup_terminal().context("failed to set up terminal")?;
    let result = ui_loop(&mut terminal, &mut app, &mut events_rx, tail_interval);
    restore_terminal(&mut terminal)?;

    if let Some(batch) = app.batch.take() {
        if !batch.is_finished() {
            tracing::info!(batch_id = %batch.id(), "ui closed, cancelling running batch");
            batch.cancel();
            while !batch.is_finished() {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }
    result
}

fn ui_loop(
    terminal: &mut crate::layers::ui::terminal::Tui,
    app: &mut AppState,
    events_rx: &mut mpsc::Receiver<BatchEvent>,
    tail_interval: Duration,
) -> anyhow::Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tail = Instant::now();
    loop {
        while let Ok(event) = events_rx.try_recv() {
            app.handle_event(event);
        }
        if last_tail.elapsed() >= tail_interval {
            app.poll_log();
            last_tail = Instant::now();
        }

        terminal.draw(|frame| draw_ui(frame, app))?;

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) => {
                    if handle_key_event(key, app) {
                        break;
                    }
                }
                Event::Paste(text) => {
                    if let Some(prompt) = app.prompt.as_mut() {
                        prompt.input.push_str(text.trim_end_matches(['\r', '\n']));
                    } else if let Some(editor) = app.focused_editor() {
                        editor.insert_str(&text);
                    }
                }
                _ => {}
            }
        }
    }
    Ok(())
}
