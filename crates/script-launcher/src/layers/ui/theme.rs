use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders};

use super::app::StatusLevel;

pub(crate) struct Theme {
    border: Color,
    focus_border: Color,
    title: Color,
    text: Color,
    dim: Color,
    accent: Color,
    warn: Color,
    ok: Color,
    error: Color,
}

impl Theme {
    pub(crate) fn dark() -> Self {
        Self {
            border: Color::DarkGray,
            focus_border: Color::Cyan,
            title: Color::Blue,
            text: Color::White,
            dim: Color::Gray,
            accent: Color::Cyan,
            warn: Color::Yellow,
            ok: Color::Green,
            error: Color::Red,
        }
    }

    pub(crate) fn block<'a>(&self, title: &'a str, focused: bool) -> Block<'a> {
        let border = if focused { self.focus_border } else { self.border };
        Block::default()
            .title(Span::styled(
                title,
                Style::default().fg(self.title).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
    }

    pub(crate) fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub(crate) fn help_style(&self) -> Style {
        Style::default().fg(self.dim)
    }

    pub(crate) fn accent_style(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub(crate) fn warn_style(&self) -> Style {
        Style::default().fg(self.warn).add_modifier(Modifier::BOLD)
    }

    pub(crate) fn status_style(&self, level: StatusLevel) -> Style {
        match level {
            StatusLevel::Info => Style::default().fg(self.ok),
            StatusLevel::Warn => self.warn_style(),
            StatusLevel::Error => Style::default().fg(self.error).add_modifier(Modifier::BOLD),
        }
    }

    /// Colour for one line of a batch log.
    pub(crate) fn log_line_style(&self, line: &str) -> Style {
        if line.starts_with("Status: Success") {
            Style::default().fg(self.ok).add_modifier(Modifier::BOLD)
        } else if line.starts_with("Status: Failed")
            || line.starts_with("Failed to run script")
            || line.starts_with("Error")
        {
            Style::default().fg(self.error).add_modifier(Modifier::BOLD)
        } else if line.starts_with("Status: Cancelled") || line.starts_with("Batch cancelled") {
            self.warn_style()
        } else if line.starts_with("Script: ") {
            self.accent_style()
        } else if line.starts_with("Directory: ")
            || line.starts_with("Start Time: ")
            || line.starts_with("End Time: ")
            || line.starts_with("Exit Code: ")
        {
            Style::default().fg(self.dim)
        } else {
            self.text_style()
        }
    }
}
