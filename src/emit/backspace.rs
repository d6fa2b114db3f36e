//! Fake-backspace accounting.
//!
//! Backspaces injected as synthetic key events come back through the key
//! source like real ones. The counter holds how many are still expected,
//! so the producer can let those echoes through instead of treating them
//! as user input.

use std::sync::atomic::{AtomicI32, Ordering};

/// Count of injected backspaces not yet seen coming back.
///
/// Shared between the emitter (sets it before injecting) and the producer
/// (decrements it for each echo) without locking.
#[derive(Debug, Default)]
pub struct FakeBackspaceCounter {
    pending: AtomicI32,
}

impl FakeBackspaceCounter {
    /// Create a counter at zero.
    pub const fn new() -> Self {
        Self {
            pending: AtomicI32::new(0),
        }
    }

    /// Current count.
    #[inline]
    pub fn get(&self) -> i32 {
        self.pending.load(Ordering::Acquire)
    }

    /// Overwrite the count.
    #[inline]
    pub fn set(&self, count: i32) {
        self.pending.store(count, Ordering::Release);
    }

    /// Forget every outstanding backspace.
    #[inline]
    pub fn reset(&self) {
        self.set(0);
    }

    /// Whether nothing is outstanding.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.get() <= 0
    }

    /// Consume one expected echo.
    ///
    /// Returns true if the count was positive and has been decremented.
    pub fn absorb(&self) -> bool {
        self.pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n > 0).then(|| n - 1))
            .is_ok()
    }
}
