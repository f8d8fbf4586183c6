//! Incremental decoder for the server's SSE byte stream.
//!
//! Bytes arrive in arbitrary chunks. The decoder buffers them, cuts complete
//! `\n`-terminated lines off the front, and turns each `data:` line into a
//! [`StreamEvent`]. A partial line stays buffered until the rest arrives, so
//! chunk boundaries (including ones inside a multi-byte character) never
//! change the decoded output.

use bytes::BytesMut;
use tracing::warn;

use riskwatch_core::StreamEvent;

/// Line-oriented SSE record decoder.
#[derive(Debug, Default)]
pub struct RecordDecoder {
    buf: BytesMut,
    dropped: u64,
}

impl RecordDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(line_end) = find_newline(&self.buf) {
            let line = self.buf.split_to(line_end);
            if let Some(event) = self.decode_line(&line[..line.len() - 1]) {
                events.push(event);
            }
        }
        events
    }

    /// Decode whatever is left once the stream has ended.
    ///
    /// A final record without a trailing newline is still honoured.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = self.buf.split();
        self.decode_line(&rest)
    }

    /// Records that could not be parsed and were skipped.
    pub fn dropped_records(&self) -> u64 {
        self.dropped
    }

    /// Bytes waiting for the end of their line.
    pub fn pending_bytes(&self) -> usize {
        self.buf.len()
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<StreamEvent> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        // Blank record separators and keep-alive comments.
        if line.is_empty() || line[0] == b':' {
            return None;
        }

        // `event:`, `id:` and `retry:` carry nothing we use.
        let data = line.strip_prefix(b"data:")?;
        let data = data.strip_prefix(b" ").unwrap_or(data);

        match serde_json::from_slice::<StreamEvent>(data) {
            Ok(event) => Some(event),
            Err(e) => {
                self.dropped += 1;
                warn!(
                    error = %e,
                    record = %String::from_utf8_lossy(data),
                    "Skipping malformed stream record"
                );
                None
            }
        }
    }
}

/// Find the next newline in the buffer, returning the position after it.
fn find_newline(buf: &BytesMut) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n').map(|pos| pos + 1)
}
