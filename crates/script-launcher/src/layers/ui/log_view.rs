use super::text::sanitize_text_for_tui;

const MAX_BUFFER_BYTES: usize = 4 * 1024 * 1024;
const MAX_HELD_BYTES: usize = 4096;

/// Display buffer for the tailed batch log. While `follow` is set the view
/// sticks to the last line.
#[derive(Debug)]
pub(crate) struct LogView {
    text: String,
    held: String,
    pub(crate) scroll: usize,
    pub(crate) max_scroll: usize,
    pub(crate) total_lines: usize,
    pub(crate) view_height: u16,
    pub(crate) follow: bool,
    pub(crate) pending_g: bool,
}

impl Default for LogView {
    fn default() -> Self {
        Self {
            text: String::new(),
            held: String::new(),
            scroll: 0,
            max_scroll: 0,
            total_lines: 0,
            view_height: 0,
            follow: true,
            pending_g: false,
        }
    }
}

impl LogView {
    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    /// Appends polled log text. A trailing `\r` or unfinished escape sequence
    /// waits for the next chunk so it is sanitised as a whole.
    pub(crate) fn append(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        let mut pending = std::mem::take(&mut self.held);
        pending.push_str(chunk);
        let hold = held_suffix_len(&pending);
        if hold < MAX_HELD_BYTES {
            self.held = pending.split_off(pending.len() - hold);
        }
        self.text.push_str(&sanitize_text_for_tui(&pending));
        if self.text.len() > MAX_BUFFER_BYTES {
            self.drop_oldest_lines();
        }
    }

    fn drop_oldest_lines(&mut self) {
        let mut start = self.text.len() - MAX_BUFFER_BYTES;
        while !self.text.is_char_boundary(start) {
            start += 1;
        }
        let cut = self.text[start..]
            .find('\n')
            .map(|pos| start + pos + 1)
            .unwrap_or(start);
        self.text.drain(..cut);
    }

    pub(crate) fn set_metrics(&mut self, total_lines: usize, view_height: u16) {
        let total_lines = total_lines.max(1);
        self.total_lines = total_lines;
        self.view_height = view_height;
        self.max_scroll = total_lines.saturating_sub(view_height as usize);
        if self.follow || self.scroll > self.max_scroll {
            self.scroll = self.max_scroll;
        }
    }

    pub(crate) fn scroll_down(&mut self, lines: usize) {
        self.scroll = (self.scroll + lines).min(self.max_scroll);
        self.follow = self.scroll == self.max_scroll;
        self.pending_g = false;
    }

    pub(crate) fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow = false;
        self.pending_g = false;
    }

    pub(crate) fn scroll_to_top(&mut self) {
        self.scroll = 0;
        self.follow = false;
        self.pending_g = false;
    }

    pub(crate) fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll;
        self.follow = true;
        self.pending_g = false;
    }

    pub(crate) fn page_size(&self) -> usize {
        let height = self.view_height.max(1) as usize;
        height.saturating_sub(1).max(1)
    }

    pub(crate) fn half_page_size(&self) -> usize {
        let height = self.view_height.max(1) as usize;
        (height / 2).max(1)
    }
}

/// Bytes at the end of `text` that cannot be sanitised yet.
fn held_suffix_len(text: &str) -> usize {
    if let Some(pos) = text.rfind('\u{1b}') {
        if !escape_is_complete(&text[pos + 1..]) {
            return text.len() - pos;
        }
    }
    usize::from(text.ends_with('\r'))
}

fn escape_is_complete(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        None => false,
        Some('[') => chars.any(|ch| ('@'..='~').contains(&ch)),
        Some(']') => chars.any(|ch| ch == '\u{7}'),
        Some(_) => true,
    }
}
