//! Server-Sent-Events record type.

use std::time::Duration;

/// One server-sent event, accumulated line by line.
///
/// Fields mirror the `text/event-stream` wire protocol. A record is
/// *complete* (dispatchable to consumers) only once `data` has been
/// appended to at least once; `event`, `id`, and `retry` alone never make
/// it complete.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// Accumulated `data:` payload. Multiple lines are joined with `\n`.
    /// `None` until the first append.
    pub data: Option<String>,
    /// Optional event name from an `event:` line.
    pub event: Option<String>,
    /// Optional event id from an `id:` line.
    pub id: Option<String>,
    /// Optional retry-interval override from a `retry:` line.
    pub retry: Option<Duration>,
}

impl SseEvent {
    /// Append one `data:` line value.
    pub fn append_data(&mut self, value: &str) {
        match &mut self.data {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => self.data = Some(value.to_string()),
        }
    }

    /// Returns `true` once `data` has been appended at least once.
    pub fn is_complete(&self) -> bool {
        self.data.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_is_incomplete() {
        let record = SseEvent::default();
        assert!(!record.is_complete());
    }

    #[test]
    fn metadata_alone_does_not_complete() {
        let record = SseEvent {
            event: Some("tick".to_string()),
            id: Some("42".to_string()),
            retry: Some(Duration::from_secs(3)),
            ..Default::default()
        };
        assert!(!record.is_complete());
    }

    #[test]
    fn any_data_append_completes() {
        let mut record = SseEvent::default();
        record.append_data("");
        assert!(record.is_complete());
    }

    #[test]
    fn data_lines_concatenate_with_newline() {
        let mut record = SseEvent::default();
        record.append_data("first");
        record.append_data("second");
        assert_eq!(record.data.as_deref(), Some("first\nsecond"));
    }
}
