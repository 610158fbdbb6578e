//! Unbounded single-consumer hand-off queue.
//!
//! Every manager in this crate runs exactly two activities: an I/O-driving
//! producer and a dispatch consumer. They communicate only through an
//! [`EventQueue`] so the I/O path never blocks on user code.

use std::sync::Mutex;

use tokio::sync::mpsc;

/// Writer side of the queue. Owned by the background I/O task.
///
/// `push` never blocks (the queue is unbounded) and `complete` is an
/// idempotent "no more items" signal: once called, the reader drains the
/// remaining buffered items and then observes end-of-stream.
pub struct EventQueue<T> {
    tx: Mutex<Option<mpsc::UnboundedSender<T>>>,
}

/// Reader side of the queue. Owned by the dispatch task.
pub struct QueueReader<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

/// Create a connected writer/reader pair.
pub fn event_queue<T>() -> (EventQueue<T>, QueueReader<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        EventQueue {
            tx: Mutex::new(Some(tx)),
        },
        QueueReader { rx },
    )
}

impl<T> EventQueue<T> {
    /// Enqueue one item.
    ///
    /// Returns `false` when the queue has been completed or the reader has
    /// gone away; the item is dropped in that case.
    pub fn push(&self, item: T) -> bool {
        match self.sender().as_ref() {
            Some(tx) => tx.send(item).is_ok(),
            None => false,
        }
    }

    /// Signal that no more items will arrive. Idempotent.
    pub fn complete(&self) {
        self.sender().take();
    }

    /// Returns `true` once [`complete`](Self::complete) has been called.
    pub fn is_complete(&self) -> bool {
        self.sender().is_none()
    }

    fn sender(&self) -> std::sync::MutexGuard<'_, Option<mpsc::UnboundedSender<T>>> {
        self.tx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<T> Drop for EventQueue<T> {
    fn drop(&mut self) {
        self.complete();
    }
}

impl<T> QueueReader<T> {
    /// Receive the next item in FIFO order.
    ///
    /// Returns `None` only after the writer completed the queue (or was
    /// dropped) and all buffered items have been drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn items_are_drained_in_fifo_order() {
        let (queue, mut reader) = event_queue();
        assert!(queue.push(1));
        assert!(queue.push(2));
        assert!(queue.push(3));
        queue.complete();

        assert_eq!(reader.recv().await, Some(1));
        assert_eq!(reader.recv().await, Some(2));
        assert_eq!(reader.recv().await, Some(3));
        assert_eq!(reader.recv().await, None);
    }

    #[tokio::test]
    async fn complete_is_idempotent() {
        let (queue, mut reader) = event_queue();
        assert!(queue.push("a"));
        queue.complete();
        queue.complete();
        assert!(queue.is_complete());

        assert_eq!(reader.recv().await, Some("a"));
        assert_eq!(reader.recv().await, None);
    }

    #[tokio::test]
    async fn push_after_complete_is_not_observed() {
        let (queue, mut reader) = event_queue();
        assert!(queue.push(1));
        queue.complete();
        assert!(!queue.push(2));

        assert_eq!(reader.recv().await, Some(1));
        assert_eq!(reader.recv().await, None);
    }

    #[tokio::test]
    async fn dropped_writer_ends_the_stream() {
        let (queue, mut reader) = event_queue::<u32>();
        drop(queue);
        assert_eq!(reader.recv().await, None);
    }
}
