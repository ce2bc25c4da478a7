use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Bytes read from a child stream, capped at the configured limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedStream {
    pub bytes: Vec<u8>,
    pub truncated: bool,
}

impl CapturedStream {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_text(&self) -> String {
        let mut out = String::from_utf8_lossy(&self.bytes).into_owned();
        if self.truncated {
            out.push_str("\n[output truncated]");
        }
        out
    }
}

/// Drains `reader` to EOF. Bytes past `max_bytes` are discarded so the child
/// never blocks on a full pipe.
pub(crate) async fn read_stream_capture<R: AsyncRead + Unpin>(
    mut reader: R,
    max_bytes: usize,
) -> io::Result<CapturedStream> {
    let mut captured = CapturedStream::default();
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if captured.bytes.len() < max_bytes {
            let remaining = max_bytes - captured.bytes.len();
            let to_copy = remaining.min(n);
            captured.bytes.extend_from_slice(&chunk[..to_copy]);
            if to_copy < n {
                captured.truncated = true;
            }
        } else {
            captured.truncated = true;
        }
    }
    Ok(captured)
}
