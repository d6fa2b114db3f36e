//! Replay Worker: Dedicated thread that drains keys left in the queue.
//!
//! Normally the thread that finishes an emission replays what was queued
//! during it. A key that lands just after that thread's last drain would
//! otherwise wait for the next keystroke; the worker picks it up instead.

use super::controller::Controller;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::trace;

/// Background replayer for the pending queue.
pub struct ReplayWorker {
    /// Handle to the worker thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
}

impl ReplayWorker {
    /// Spawn the worker thread.
    ///
    /// `poll` bounds how long the worker sleeps between shutdown checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS fails to spawn the thread.
    pub fn spawn(controller: Arc<Controller>, poll: Duration) -> io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("backtype-replay".to_string())
            .spawn(move || Self::run_loop(&controller, &shutdown_clone, poll))?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    /// Signal the worker to shut down.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Wait for the worker thread to finish.
    pub fn join(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main worker loop.
    fn run_loop(controller: &Controller, shutdown: &AtomicBool, poll: Duration) {
        let queue = controller.queue().clone();
        while !shutdown.load(Ordering::Relaxed) {
            // Busy owners drain the queue themselves; a failed replay
            // just means somebody else got there first.
            if queue.wait(poll) && controller.replay_pending() {
                trace!("worker replayed queued keys");
            }
        }
    }
}

impl Drop for ReplayWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
