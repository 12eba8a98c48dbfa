//! Bounded line reading for subprocess pipes.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Appended to a line that was cut at the maximum length.
pub const TRUNCATION_MARKER: &str = " [truncated]";

/// Reads newline-terminated lines, never buffering more than `max_length`
/// bytes of a single line.
///
/// An over-long line is cut at `max_length`, gets [`TRUNCATION_MARKER`]
/// appended, and the rest of it is dropped; reading resumes after the next
/// newline. A trailing `\r` is stripped. Invalid UTF-8 is replaced.
pub struct LineReader<R> {
    reader: R,
    max_length: usize,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(reader: R, max_length: usize) -> Self {
        Self {
            reader,
            max_length: max_length.max(1),
            buf: Vec::new(),
        }
    }

    /// Next line, or `None` at end of stream.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.buf.clear();
        let mut truncated = false;
        let mut read_any = false;

        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                if !read_any {
                    return Ok(None);
                }
                break;
            }
            read_any = true;

            let (chunk, consumed, complete) = match available.iter().position(|b| *b == b'\n') {
                Some(i) => (&available[..i], i + 1, true),
                None => (available, available.len(), false),
            };

            if !truncated {
                let room = self.max_length.saturating_sub(self.buf.len());
                if chunk.len() > room {
                    self.buf.extend_from_slice(&chunk[..room]);
                    truncated = true;
                } else {
                    self.buf.extend_from_slice(chunk);
                }
            }

            self.reader.consume(consumed);
            if complete {
                break;
            }
        }

        if !truncated && self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }

        let mut line = String::from_utf8_lossy(&self.buf).into_owned();
        if truncated {
            line.push_str(TRUNCATION_MARKER);
        }
        Ok(Some(line))
    }
}
