/// Minimal multi-line text input. The cursor column counts chars, not bytes.
#[derive(Debug, Clone)]
pub(crate) struct TextBuffer {
    lines: Vec<String>,
    row: usize,
    col: usize,
    scroll: usize,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
            scroll: 0,
        }
    }
}

impl TextBuffer {
    /// Replaces the content; `text()` returns exactly what was set.
    pub(crate) fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_string).collect();
        self.row = 0;
        self.col = 0;
        self.scroll = 0;
    }

    pub(crate) fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub(crate) fn lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub(crate) fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.insert_newline();
            return;
        }
        let idx = self.byte_index();
        self.lines[self.row].insert(idx, ch);
        self.col += 1;
    }

    pub(crate) fn insert_str(&mut self, text: &str) {
        for ch in text.chars().filter(|ch| *ch != '\r') {
            self.insert_char(ch);
        }
    }

    pub(crate) fn insert_newline(&mut self) {
        let idx = self.byte_index();
        let rest = self.lines[self.row].split_off(idx);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    pub(crate) fn backspace(&mut self) {
        if self.col > 0 {
            self.col -= 1;
            let idx = self.byte_index();
            self.lines[self.row].remove(idx);
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = char_len(&self.lines[self.row]);
            self.lines[self.row].push_str(&line);
        }
    }

    pub(crate) fn delete(&mut self) {
        if self.col < char_len(&self.lines[self.row]) {
            let idx = self.byte_index();
            self.lines[self.row].remove(idx);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    pub(crate) fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = char_len(&self.lines[self.row]);
        }
    }

    pub(crate) fn move_right(&mut self) {
        if self.col < char_len(&self.lines[self.row]) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub(crate) fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.clamp_col();
        }
    }

    pub(crate) fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.clamp_col();
        }
    }

    pub(crate) fn move_home(&mut self) {
        self.col = 0;
    }

    pub(crate) fn move_end(&mut self) {
        self.col = char_len(&self.lines[self.row]);
    }

    /// First visible line for a pane `height` rows tall, scrolled just enough
    /// to keep the cursor row on screen.
    pub(crate) fn scroll_for(&mut self, height: usize) -> usize {
        let height = height.max(1);
        if self.row < self.scroll {
            self.scroll = self.row;
        } else if self.row >= self.scroll + height {
            self.scroll = self.row + 1 - height;
        }
        self.scroll
    }

    fn clamp_col(&mut self) {
        self.col = self.col.min(char_len(&self.lines[self.row]));
    }

    fn byte_index(&self) -> usize {
        let line = &self.lines[self.row];
        line.char_indices()
            .nth(self.col)
            .map(|(idx, _)| idx)
            .unwrap_or(line.len())
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_text_round_trips_blank_lines() {
        let mut buffer = TextBuffer::default();
        buffer.set_text("a.py\n\nb.py\n");
        assert_eq!(buffer.text(), "a.py\n\nb.py\n");
        assert_eq!(buffer.lines().len(), 4);
    }

    #[test]
    fn typing_and_newlines_build_lines() {
        let mut buffer = TextBuffer::default();
        buffer.insert_str("ab\ncd");
        assert_eq!(buffer.text(), "ab\ncd");
        assert_eq!(buffer.cursor(), (1, 2));
        buffer.move_home();
        buffer.backspace();
        assert_eq!(buffer.text(), "abcd");
        assert_eq!(buffer.cursor(), (0, 2));
    }

    #[test]
    fn editing_respects_multibyte_chars() {
        let mut buffer = TextBuffer::default();
        buffer.insert_str("żółw");
        buffer.move_left();
        buffer.backspace();
        assert_eq!(buffer.text(), "żów");
        buffer.move_home();
        buffer.delete();
        assert_eq!(buffer.text(), "ów");
    }

    #[test]
    fn delete_at_line_end_joins_next_line() {
        let mut buffer = TextBuffer::default();
        buffer.set_text("one\ntwo");
        buffer.move_end();
        buffer.delete();
        assert_eq!(buffer.text(), "onetwo");
    }

    #[test]
    fn vertical_moves_clamp_column() {
        let mut buffer = TextBuffer::default();
        buffer.set_text("long line\nx");
        buffer.move_end();
        buffer.move_down();
        assert_eq!(buffer.cursor(), (1, 1));
        buffer.move_up();
        assert_eq!(buffer.cursor(), (0, 1));
    }

    #[test]
    fn scroll_follows_cursor() {
        let mut buffer = TextBuffer::default();
        buffer.set_text("1\n2\n3\n4\n5");
        for _ in 0..4 {
            buffer.move_down();
        }
        assert_eq!(buffer.scroll_for(2), 3);
        buffer.move_up();
        buffer.move_up();
        buffer.move_up();
        assert_eq!(buffer.scroll_for(2), 1);
    }

    #[test]
    fn paste_drops_carriage_returns() {
        let mut buffer = TextBuffer::default();
        buffer.insert_str("a\r\nb");
        assert_eq!(buffer.text(), "a\nb");
    }
}
