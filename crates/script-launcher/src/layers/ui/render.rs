use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Clear, Paragraph};

use super::app::{AppState, Focus};
use super::editor::TextBuffer;
use super::text::{truncate_front, wrap_text_lines};
use super::theme::Theme;

pub(crate) fn draw_ui(frame: &mut ratatui::Frame, app: &mut AppState) {
    let theme = Theme::dark();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(3)])
        .split(frame.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[0]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(body[0]);

    let focus = app.focus;
    let editing = app.prompt.is_none();
    draw_editor(
        frame,
        &theme,
        left[0],
        "Scripts",
        &mut app.scripts,
        editing && focus == Focus::Scripts,
    );
    draw_editor(
        frame,
        &theme,
        left[1],
        "Target Directories",
        &mut app.target_dirs,
        editing && focus == Focus::TargetDirs,
    );
    draw_editor(
        frame,
        &theme,
        left[2],
        "Script Directories",
        &mut app.script_dirs,
        editing && focus == Focus::ScriptDirs,
    );

    draw_log(frame, &theme, body[1], app);
    draw_footer(frame, &theme, chunks[1], app);

    if app.prompt.is_some() {
        draw_prompt(frame, &theme, app);
    }
}

fn draw_editor(
    frame: &mut ratatui::Frame,
    theme: &Theme,
    area: Rect,
    title: &str,
    buffer: &mut TextBuffer,
    focused: bool,
) {
    let block = theme.block(title, focused);
    let inner = block.inner(area);
    let height = inner.height.max(1) as usize;
    let first = buffer.scroll_for(height);
    let lines = buffer
        .lines()
        .iter()
        .skip(first)
        .take(height)
        .map(|line| Line::from(line.as_str()))
        .collect::<Vec<_>>();
    let widget = Paragraph::new(lines)
        .block(block)
        .style(theme.text_style());
    frame.render_widget(widget, area);

    if focused && inner.width > 0 && inner.height > 0 {
        let (row, col) = buffer.cursor();
        let x = inner.x + (col as u16).min(inner.width.saturating_sub(1));
        let y = inner.y + (row - first) as u16;
        frame.set_cursor_position((x, y));
    }
}

fn draw_log(frame: &mut ratatui::Frame, theme: &Theme, area: Rect, app: &mut AppState) {
    let state = if app.batch.as_ref().is_some_and(|batch| batch.is_cancelling()) {
        " [cancelling]"
    } else if app.is_running() {
        " [running]"
    } else {
        ""
    };
    let path = app
        .tailer
        .as_ref()
        .map(|tailer| tailer.path().display().to_string())
        .unwrap_or_else(|| "no batch yet".to_string());
    let max_path = (area.width as usize).saturating_sub(state.len() + 10);
    let title = format!("Log: {}{state}", truncate_front(&path, max_path));

    let block = theme.block(&title, app.focus == Focus::Log);
    let inner = block.inner(area);
    let wrapped = wrap_text_lines(app.log.text(), inner.width.max(1) as usize);
    app.log.set_metrics(wrapped.len(), inner.height);

    // Only the visible window is handed to ratatui; its scroll offset is a u16.
    let start = app.log.scroll.min(wrapped.len());
    let end = (start + inner.height as usize).min(wrapped.len());
    let lines = wrapped[start..end]
        .iter()
        .map(|line| Line::styled(line.as_str(), theme.log_line_style(line)))
        .collect::<Vec<_>>();
    let widget = Paragraph::new(Text::from(lines)).block(block);
    frame.render_widget(widget, area);
}

fn draw_footer(frame: &mut ratatui::Frame, theme: &Theme, area: Rect, app: &AppState) {
    let mut spans = vec![Span::styled(
        "F5=run  ^X=cancel  ^O=load  ^S=save  ^D=import dirs  Tab=focus  ^Q=quit  ",
        theme.help_style(),
    )];
    if app.focus == Focus::Log {
        spans.push(Span::styled(
            format!(
                "line {}/{}  ",
                app.log.scroll.saturating_add(1),
                app.log.total_lines
            ),
            theme.accent_style(),
        ));
    }
    if app.confirm_quit {
        spans.push(Span::styled(
            "batch still running: ^Q again to quit, Esc to stay  ",
            theme.warn_style(),
        ));
    } else if let Some(status) = &app.status {
        spans.push(Span::styled(
            status.text.as_str(),
            theme.status_style(status.level),
        ));
    }
    let footer = Paragraph::new(Line::from(spans)).block(theme.block("Controls", false));
    frame.render_widget(footer, area);
}

fn draw_prompt(frame: &mut ratatui::Frame, theme: &Theme, app: &AppState) {
    let Some(prompt) = &app.prompt else {
        return;
    };
    let area = centered_rect(frame.area(), 70, 3);
    let block = theme.block(prompt.kind.title(), true);
    let inner = block.inner(area);
    let visible = truncate_front(&prompt.input, inner.width.saturating_sub(1) as usize);
    let cursor_x = inner.x + visible.chars().count() as u16;
    let widget = Paragraph::new(Line::styled(visible, theme.text_style())).block(block);
    frame.render_widget(Clear, area);
    frame.render_widget(widget, area);
    if inner.width > 0 && inner.height > 0 {
        frame.set_cursor_position((cursor_x, inner.y));
    }
}

fn centered_rect(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = (area.width as u32 * percent_x as u32 / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launch_types::LauncherConfig;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn rendered(app: &mut AppState) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal.draw(|frame| draw_ui(frame, app)).expect("draw");
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn draws_inputs_and_log() {
        let (tx, _rx) = mpsc::channel(4);
        let mut app = AppState::new(Arc::new(LauncherConfig::default()), tx);
        app.scripts.set_text("build.py");
        app.log.append("Script: build.py\nStatus: Success\n");
        let screen = rendered(&mut app);
        assert!(screen.contains("Scripts"));
        assert!(screen.contains("build.py"));
        assert!(screen.contains("Status: Success"));
        assert!(screen.contains("no batch yet"));
    }

    #[test]
    fn log_longer_than_u16_lines_shows_its_end() {
        let (tx, _rx) = mpsc::channel(4);
        let mut app = AppState::new(Arc::new(LauncherConfig::default()), tx);
        let text = (0..70_000).map(|i| format!("L{i}\n")).collect::<String>();
        app.log.append(&text);
        let screen = rendered(&mut app);
        assert!(screen.contains("L69999"));
        assert!(!screen.contains("L0 "));
        assert_eq!(app.log.total_lines, 70_000);
        assert_eq!(app.log.scroll, app.log.max_scroll);
    }

    #[test]
    fn prompt_popup_is_drawn() {
        let (tx, _rx) = mpsc::channel(4);
        let mut app = AppState::new(Arc::new(LauncherConfig::default()), tx);
        app.open_prompt(super::super::app::PromptKind::SaveSession);
        let screen = rendered(&mut app);
        assert!(screen.contains("Save session"));
    }
}
