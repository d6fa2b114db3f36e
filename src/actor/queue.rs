//! Pending-keystroke queue.
//!
//! Keys that arrive while an emission is in flight are parked here and
//! replayed, in arrival order, by whoever owns the emission. The queue is
//! unbounded so a burst of typing never blocks or drops the producer.

use super::messages::KeyEvent;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::time::Duration;

/// FIFO of key events with a wake-up signal for the replay worker.
#[derive(Debug, Clone)]
pub struct PendingQueue {
    tx: Sender<KeyEvent>,
    rx: Receiver<KeyEvent>,
    /// Level-triggered wake-up; holds at most one token.
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl Default for PendingQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        let (wake_tx, wake_rx) = bounded(1);
        Self { tx, rx, wake_tx, wake_rx }
    }

    /// Append an event.
    pub fn enqueue(&self, event: KeyEvent) {
        // Both ends live in `self`, so the channel cannot be disconnected.
        let _ = self.tx.send(event);
        // A full wake channel already holds a pending wake-up.
        let _ = self.wake_tx.try_send(());
    }

    /// Take everything buffered right now, in order.
    ///
    /// Events enqueued while the drain runs are left for the next drain.
    pub fn drain_all(&self) -> Vec<KeyEvent> {
        let snapshot = self.rx.len();
        self.rx.try_iter().take(snapshot).collect()
    }

    /// Take the oldest event, if any.
    pub fn pop(&self) -> Option<KeyEvent> {
        self.rx.try_recv().ok()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Number of buffered events.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Wait up to `timeout` for a wake-up.
    ///
    /// Returns true if events may be waiting. Spurious wake-ups are
    /// possible; callers re-check the queue.
    pub fn wait(&self, timeout: Duration) -> bool {
        self.wake_rx.recv_timeout(timeout).is_ok() || !self.is_empty()
    }

    /// Wake a waiting worker without enqueuing anything.
    pub fn notify(&self) {
        let _ = self.wake_tx.try_send(());
    }
}
