//! Time source for emission pacing.
//!
//! Emission timing is the only synchronization available with a consumer
//! that cannot be observed, so every sleep goes through a [`Clock`]. Tests
//! swap in a [`ManualClock`] that advances virtual time instead of blocking.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// A monotonic clock that can block the calling thread.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Block for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time via [`Instant`] and [`thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

/// Virtual clock: `sleep` advances time without blocking.
///
/// Clones share the same timeline.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualState>>,
}

#[derive(Debug)]
struct ManualState {
    origin: Instant,
    now: Instant,
    slept: Vec<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Create a clock starting at the current instant.
    pub fn new() -> Self {
        let origin = Instant::now();
        Self {
            inner: Arc::new(Mutex::new(ManualState {
                origin,
                now: origin,
                slept: Vec::new(),
            })),
        }
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        self.state().now += duration;
    }

    /// Virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        let state = self.state();
        state.now - state.origin
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state().slept.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.state().now
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.state();
        state.now += duration;
        state.slept.push(duration);
    }
}

/// A bounded poll: up to `attempts` checks, `backoff` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedRetry {
    /// Maximum number of waits.
    pub attempts: u32,
    /// Time slept between checks.
    pub backoff: Duration,
}

impl Default for BoundedRetry {
    fn default() -> Self {
        Self {
            attempts: 10,
            backoff: Duration::from_millis(5),
        }
    }
}

impl BoundedRetry {
    /// Create a retry policy.
    pub const fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }

    /// Wait until `done` returns true or the attempts run out.
    ///
    /// Returns whether the condition was met. Giving up is not an error;
    /// the caller decides whether to log it.
    pub fn wait_until(&self, clock: &dyn Clock, mut done: impl FnMut() -> bool) -> bool {
        for _ in 0..self.attempts {
            if done() {
                return true;
            }
            clock.sleep(self.backoff);
        }
        done()
    }
}
