//! The hook → worker event queue.
//!
//! Producer: the OS hook callback.  It must return within the OS budget, so
//! [`EventQueue::enqueue`] never blocks and never grows past the capacity fixed
//! at construction.
//!
//! Consumer: the single worker thread, via [`EventQueue::try_dequeue`], which
//! waits on a signal for at most the given timeout.
//!
//! Disposal is one-way.  After [`EventQueue::dispose`] both endpoints fail
//! closed: enqueue drops its input, dequeue returns `None`, and a dequeue that
//! is already waiting wakes immediately.
//!
//! One channel carries both keys and buffer-clear signals, so a clear raised by
//! the hook is applied by the worker in order with the surrounding keys.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::domain::key_event::KeyEvent;

/// Default number of events the queue can hold before the hook starts dropping.
pub const DEFAULT_CAPACITY: usize = 1024;

/// An item travelling from the hook thread to the worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A relevant key-down to run through the engine.
    Key(KeyEvent),
    /// The hook saw a chord, Tab or Escape; the engine's pending composition
    /// must be discarded.
    ClearBuffer,
}

/// Single-producer/single-consumer FIFO between the hook and the worker.
pub struct EventQueue {
    tx: Sender<PipelineEvent>,
    rx: Receiver<PipelineEvent>,
    /// Dropped on dispose; the disconnect wakes a blocked `try_dequeue`.
    wake_tx: Mutex<Option<Sender<()>>>,
    wake_rx: Receiver<()>,
    disposed: AtomicBool,
    dropped: AtomicU64,
    capacity: usize,
}

impl EventQueue {
    /// Creates a queue holding at most `capacity` pending events.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = bounded(capacity);
        let (wake_tx, wake_rx) = bounded(0);
        Self {
            tx,
            rx,
            wake_tx: Mutex::new(Some(wake_tx)),
            wake_rx,
            disposed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
            capacity,
        }
    }

    /// Appends an event.  Called only from the hook thread.
    ///
    /// Returns `false` if the event was dropped because the queue is disposed
    /// or full.  Never blocks.
    pub fn enqueue(&self, event: PipelineEvent) -> bool {
        if self.disposed.load(Ordering::Acquire) {
            return false;
        }
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                // Runs on the hook thread; keep it below debug.
                trace!(dropped, capacity = self.capacity, "event queue full; event dropped");
                false
            }
        }
    }

    /// Waits up to `timeout` for the next event.  Called only from the worker.
    ///
    /// Returns `None` on timeout and whenever the queue is disposed, including
    /// when disposal happens while waiting.
    pub fn try_dequeue(&self, timeout: Duration) -> Option<PipelineEvent> {
        if self.is_disposed() {
            return None;
        }
        let event = select! {
            recv(self.rx) -> msg => msg.ok(),
            recv(self.wake_rx) -> _ => None,
            default(timeout) => None,
        };
        // Disposal may have raced with a ready event.
        if self.is_disposed() {
            return None;
        }
        event
    }

    /// Marks the queue disposed and wakes any waiting consumer.  Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        drop(self.wake_tx.lock().take());
        debug!(pending = self.rx.len(), dropped = self.dropped_count(), "event queue disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Approximate number of pending events.  Diagnostics only.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Approximate emptiness.  Diagnostics only.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Maximum number of pending events.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of events dropped because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    use super::*;

    fn key(vk: u16) -> PipelineEvent {
        PipelineEvent::Key(KeyEvent::new(vk, false, false))
    }

    #[test]
    fn test_dequeue_returns_events_in_enqueue_order() {
        // Arrange
        let queue = EventQueue::new(16);
        queue.enqueue(key(0x41));
        queue.enqueue(PipelineEvent::ClearBuffer);
        queue.enqueue(key(0x42));

        // Act
        let drained: Vec<_> = std::iter::from_fn(|| queue.try_dequeue(Duration::from_millis(1)))
            .collect();

        // Assert
        assert_eq!(drained.len(), 3);
        assert!(matches!(drained[0], PipelineEvent::Key(KeyEvent { vk_code: 0x41, .. })));
        assert_eq!(drained[1], PipelineEvent::ClearBuffer);
        assert!(matches!(drained[2], PipelineEvent::Key(KeyEvent { vk_code: 0x42, .. })));
    }

    #[test]
    fn test_dequeue_times_out_on_empty_queue() {
        let queue = EventQueue::new(4);
        let start = Instant::now();

        assert_eq!(queue.try_dequeue(Duration::from_millis(10)), None);
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_zero_capacity_is_floored_to_one() {
        let queue = EventQueue::new(0);

        assert_eq!(queue.capacity(), 1);
        assert!(queue.enqueue(key(0x41)));
        assert!(!queue.enqueue(key(0x42)));
        assert_eq!(queue.dropped_count(), 1);
    }

    #[test]
    fn test_enqueue_on_full_queue_drops_without_blocking() {
        // Arrange
        let queue = EventQueue::new(2);
        assert!(queue.enqueue(key(0x41)));
        assert!(queue.enqueue(key(0x42)));

        // Act
        let accepted = queue.enqueue(key(0x43));

        // Assert
        assert!(!accepted);
        assert_eq!(queue.dropped_count(), 1);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_enqueue_after_dispose_is_silently_dropped() {
        let queue = EventQueue::new(4);
        queue.dispose();

        assert!(!queue.enqueue(key(0x41)));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_dequeue_after_dispose_returns_none_even_with_pending_events() {
        let queue = EventQueue::new(4);
        queue.enqueue(key(0x41));
        queue.dispose();

        assert_eq!(queue.try_dequeue(Duration::from_millis(50)), None);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let queue = EventQueue::new(4);
        queue.dispose();
        queue.dispose();
        assert!(queue.is_disposed());
    }

    #[test]
    fn test_dispose_wakes_blocked_consumer_promptly() {
        // Arrange
        let queue = Arc::new(EventQueue::new(4));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let start = Instant::now();
                let result = queue.try_dequeue(Duration::from_secs(10));
                (result, start.elapsed())
            })
        };
        thread::sleep(Duration::from_millis(20));

        // Act
        queue.dispose();
        let (result, waited) = consumer.join().expect("consumer thread panicked");

        // Assert
        assert_eq!(result, None);
        assert!(waited < Duration::from_secs(2), "consumer waited {waited:?}");
    }

    #[test]
    fn test_single_producer_single_consumer_preserves_order_across_threads() {
        // Arrange
        const COUNT: u16 = 500;
        let queue = Arc::new(EventQueue::new(usize::from(COUNT)));
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for vk in 0..COUNT {
                    assert!(queue.enqueue(key(vk)));
                }
            })
        };

        // Act
        let mut seen = Vec::with_capacity(usize::from(COUNT));
        while seen.len() < usize::from(COUNT) {
            if let Some(PipelineEvent::Key(ev)) = queue.try_dequeue(Duration::from_millis(5)) {
                seen.push(ev.vk_code);
            }
        }
        producer.join().expect("producer thread panicked");

        // Assert
        let expected: Vec<u16> = (0..COUNT).collect();
        assert_eq!(seen, expected);
    }
}
