//! Incremental `text/event-stream` line parser.
//!
//! Two pieces: [`LineBuffer`] splits raw body chunks into protocol lines
//! across chunk boundaries, and [`apply_line`] folds one non-blank line
//! into the in-progress [`SseEvent`].

use std::time::Duration;

use tracing::debug;

use super::record::SseEvent;

/// Fold one line into the in-progress record.
///
/// Returns `true` when the line carried a recognized field
/// (`data`, `event`, `id`, `retry`) and the record was mutated or created.
/// Returns `false` without touching the record for empty/whitespace lines
/// and `:`-prefixed comments.
///
/// A line carrying any *other* field name discards the in-progress record
/// entirely and returns `false`. Unknown fields corrupt only the current
/// record, not the stream: parsing resumes with the next line.
pub fn apply_line(line: &str, current: &mut Option<SseEvent>, default_retry: Duration) -> bool {
    if line.trim().is_empty() || line.starts_with(':') {
        return false;
    }

    let (field, value) = match line.split_once(':') {
        Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
        // A bare field name is a field with an empty value.
        None => (line, ""),
    };

    let record = current.get_or_insert_with(SseEvent::default);
    match field {
        "data" => record.append_data(value),
        "event" => record.event = Some(value.to_string()),
        "id" => record.id = Some(value.to_string()),
        "retry" => {
            record.retry = Some(match value.trim().parse::<u64>() {
                Ok(millis) => Duration::from_millis(millis),
                Err(_) => default_retry,
            });
        }
        other => {
            debug!(field = other, "unknown SSE field, discarding current record");
            *current = None;
            return false;
        }
    }
    true
}

/// Splits a byte stream into lines across chunk boundaries.
///
/// Handles LF and CRLF terminators; a trailing partial line is held back
/// until the terminator arrives in a later chunk.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one body chunk, returning every complete line it closed.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }
}
