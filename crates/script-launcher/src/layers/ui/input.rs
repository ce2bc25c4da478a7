use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::app::{AppState, Focus, PromptKind};

/// Applies one key press. Returns `true` when the app should exit.
pub(crate) fn handle_key_event(key: KeyEvent, app: &mut AppState) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }

    if app.prompt.is_some() {
        handle_prompt_key(key, app);
        return false;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if app.confirm_quit {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') if ctrl => return true,
            KeyCode::Esc => {
                app.confirm_quit = false;
                return false;
            }
            _ => app.confirm_quit = false,
        }
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Char('c') if ctrl => {
            if !app.is_running() {
                return true;
            }
            app.confirm_quit = true;
        }
        KeyCode::Char('o') if ctrl => app.open_prompt(PromptKind::LoadSession),
        KeyCode::Char('s') if ctrl => app.open_prompt(PromptKind::SaveSession),
        KeyCode::Char('d') if ctrl && app.focus != Focus::Log => {
            app.open_prompt(PromptKind::ImportTargetDirs)
        }
        KeyCode::Char('x') if ctrl => app.cancel_batch(),
        KeyCode::Char('r') if ctrl => app.launch(),
        KeyCode::F(5) => app.launch(),
        KeyCode::Enter if ctrl => app.launch(),
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.prev(),
        _ if app.focus == Focus::Log => handle_log_key(key, app),
        _ => handle_editor_key(key, app),
    }
    false
}

fn handle_prompt_key(key: KeyEvent, app: &mut AppState) {
    match key.code {
        KeyCode::Esc => app.prompt = None,
        KeyCode::Enter => app.submit_prompt(),
        KeyCode::Backspace => {
            if let Some(prompt) = app.prompt.as_mut() {
                prompt.input.pop();
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(prompt) = app.prompt.as_mut() {
                prompt.input.push(ch);
            }
        }
        _ => {}
    }
}

fn handle_editor_key(key: KeyEvent, app: &mut AppState) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let Some(editor) = app.focused_editor() else {
        return;
    };
    match key.code {
        KeyCode::Char(ch) if !ctrl => editor.insert_char(ch),
        KeyCode::Enter => editor.insert_newline(),
        KeyCode::Backspace => editor.backspace(),
        KeyCode::Delete => editor.delete(),
        KeyCode::Left => editor.move_left(),
        KeyCode::Right => editor.move_right(),
        KeyCode::Up => editor.move_up(),
        KeyCode::Down => editor.move_down(),
        KeyCode::Home => editor.move_home(),
        KeyCode::End => editor.move_end(),
        _ => {}
    }
}

fn handle_log_key(key: KeyEvent, app: &mut AppState) {
    let log = &mut app.log;
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => log.scroll_down(1),
        KeyCode::Up | KeyCode::Char('k') => log.scroll_up(1),
        KeyCode::PageDown => log.scroll_down(log.page_size()),
        KeyCode::PageUp => log.scroll_up(log.page_size()),
        KeyCode::Char('f') if ctrl => log.scroll_down(log.page_size()),
        KeyCode::Char('b') if ctrl => log.scroll_up(log.page_size()),
        KeyCode::Char('d') if ctrl => log.scroll_down(log.half_page_size()),
        KeyCode::Char('u') if ctrl => log.scroll_up(log.half_page_size()),
        KeyCode::Char('g') => {
            if log.pending_g {
                log.scroll_to_top();
            } else {
                log.pending_g = true;
            }
        }
        KeyCode::Char('G') | KeyCode::End => log.scroll_to_bottom(),
        KeyCode::Home => log.scroll_to_top(),
        _ => log.pending_g = false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launch_types::LauncherConfig;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn app() -> AppState {
        let (tx, _rx) = mpsc::channel(4);
        AppState::new(Arc::new(LauncherConfig::default()), tx)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    #[test]
    fn typing_goes_to_focused_editor() {
        let mut state = app();
        for ch in "a.py".chars() {
            handle_key_event(press(KeyCode::Char(ch)), &mut state);
        }
        handle_key_event(press(KeyCode::Tab), &mut state);
        handle_key_event(press(KeyCode::Char('/')), &mut state);
        assert_eq!(state.scripts.text(), "a.py");
        assert_eq!(state.target_dirs.text(), "/");
        assert_eq!(state.focus, Focus::TargetDirs);
    }

    #[test]
    fn ctrl_q_quits_when_idle() {
        let mut state = app();
        assert!(handle_key_event(ctrl('q'), &mut state));
    }

    #[test]
    fn release_events_are_ignored() {
        let mut state = app();
        let mut key = press(KeyCode::Char('x'));
        key.kind = KeyEventKind::Release;
        handle_key_event(key, &mut state);
        assert_eq!(state.scripts.text(), "");
    }

    #[test]
    fn prompt_captures_text_until_escape() {
        let mut state = app();
        handle_key_event(ctrl('s'), &mut state);
        handle_key_event(press(KeyCode::Char('x')), &mut state);
        assert_eq!(state.prompt.as_ref().map(|p| p.input.as_str()), Some("x"));
        assert_eq!(state.scripts.text(), "");
        handle_key_event(press(KeyCode::Esc), &mut state);
        assert!(state.prompt.is_none());
    }

    #[test]
    fn log_pane_keys_scroll() {
        let mut state = app();
        state.focus = Focus::Log;
        state.log.set_metrics(20, 5);
        handle_key_event(press(KeyCode::Char('k')), &mut state);
        assert_eq!(state.log.scroll, 14);
        assert!(!state.log.follow);
        handle_key_event(press(KeyCode::Char('g')), &mut state);
        handle_key_event(press(KeyCode::Char('g')), &mut state);
        assert_eq!(state.log.scroll, 0);
        handle_key_event(press(KeyCode::Char('G')), &mut state);
        assert_eq!(state.log.scroll, 15);
        assert!(state.log.follow);
    }

    #[test]
    fn ctrl_d_in_editor_opens_import_prompt() {
        let mut state = app();
        handle_key_event(ctrl('d'), &mut state);
        assert_eq!(
            state.prompt.as_ref().map(|p| p.kind),
            Some(PromptKind::ImportTargetDirs)
        );
    }
}
