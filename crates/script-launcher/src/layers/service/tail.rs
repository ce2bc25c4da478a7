use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Follows a growing log file from a remembered byte offset.
#[derive(Debug)]
pub(crate) struct LogTailer {
    path: PathBuf,
    cursor: u64,
}

impl LogTailer {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cursor: 0,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn cursor(&self) -> u64 {
        self.cursor
    }

    pub(crate) fn poll(&mut self) -> String {
        poll(&self.path, &mut self.cursor)
    }
}

/// Returns everything appended to `log_path` since `cursor` and moves the
/// cursor past it. Read failures come back as an inline error line and leave
/// the cursor where it was.
pub(crate) fn poll(log_path: &Path, cursor: &mut u64) -> String {
    match read_from(log_path, *cursor) {
        Ok((text, consumed)) => {
            *cursor += consumed;
            text
        }
        Err(err) => format!("Error reading log file: {err}\n"),
    }
}

fn read_from(path: &Path, offset: u64) -> io::Result<(String, u64)> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    let complete = bytes.len() - incomplete_tail_len(&bytes);
    bytes.truncate(complete);
    Ok((String::from_utf8_lossy(&bytes).into_owned(), complete as u64))
}

/// Length of a trailing, not yet complete UTF-8 sequence. Those bytes stay
/// unread until the writer finishes the character.
fn incomplete_tail_len(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let byte = bytes[bytes.len() - back];
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let width = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if width > back { back } else { 0 };
    }
    0
}
