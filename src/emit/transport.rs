//! Transports: The channels through which edits reach the consumer.
//!
//! A transport is fire-and-forget. None of its operations are acknowledged
//! by the consumer; an `Err` only means the request could not be handed
//! off at all.

use super::backspace::FakeBackspaceCounter;
use crate::actor::{keysym, KeyEvent, KeyState};
use crate::error::TransportError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Operations a consumer can be driven with.
pub trait Transport: Send {
    /// Inject one synthetic backspace press/release through low-level
    /// key injection.
    fn inject_backspace(&mut self) -> Result<(), TransportError>;

    /// Ask the consumer to delete `count` runes starting `offset` runes
    /// from the cursor (negative is before it).
    fn delete_surrounding_text(&mut self, offset: i32, count: u32) -> Result<(), TransportError>;

    /// Re-deliver a key event to the consumer unchanged.
    fn forward_key_event(&mut self, event: KeyEvent) -> Result<(), TransportError>;

    /// Commit a string as text in one operation.
    fn commit_text(&mut self, text: &str) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn inject_backspace(&mut self) -> Result<(), TransportError> {
        (**self).inject_backspace()
    }

    fn delete_surrounding_text(&mut self, offset: i32, count: u32) -> Result<(), TransportError> {
        (**self).delete_surrounding_text(offset, count)
    }

    fn forward_key_event(&mut self, event: KeyEvent) -> Result<(), TransportError> {
        (**self).forward_key_event(event)
    }

    fn commit_text(&mut self, text: &str) -> Result<(), TransportError> {
        (**self).commit_text(text)
    }
}

/// A single operation as seen by the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOp {
    /// One injected backspace.
    InjectBackspace,
    /// A surrounding-text deletion.
    DeleteSurrounding {
        /// Offset from the cursor.
        offset: i32,
        /// Runes deleted.
        count: u32,
    },
    /// A forwarded key event.
    Forward(KeyEvent),
    /// Committed text.
    Commit(String),
}

impl TransportOp {
    /// Whether this operation deletes (or selects for deletion) text.
    pub fn is_deletion(&self) -> bool {
        match self {
            Self::InjectBackspace | Self::DeleteSurrounding { .. } => true,
            Self::Forward(event) => {
                !event.is_release()
                    && (event.keyval == keysym::BACKSPACE
                        || (event.keyval == keysym::LEFT && event.state.contains(KeyState::SHIFT)))
            }
            Self::Commit(_) => false,
        }
    }
}

#[derive(Debug, Default)]
struct Recorded {
    ops: Vec<TransportOp>,
    text: Vec<char>,
    selected: usize,
    failing: bool,
    echo: Option<Arc<FakeBackspaceCounter>>,
}

impl Recorded {
    fn delete_back(&mut self, count: usize) {
        let count = if self.selected > 0 {
            std::mem::take(&mut self.selected)
        } else {
            count
        };
        let keep = self.text.len().saturating_sub(count);
        self.text.truncate(keep);
    }

    fn insert(&mut self, text: impl IntoIterator<Item = char>) {
        self.delete_back(0);
        self.text.extend(text);
    }
}

/// A transport that records every operation and models the consumer.
///
/// The model is a single line edited at its end: backspaces and
/// surrounding deletes remove runes, Shift+Left grows a selection that the
/// next insertion or deletion replaces, and printable forwarded keys type
/// their rune. Clones share the same record, so a test can keep one clone
/// while the emitter owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingTransport {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Echo each injected backspace back into `counter`, as a consumer
    /// whose key source replays synthetic events would.
    #[must_use]
    pub fn with_echo(self, counter: Arc<FakeBackspaceCounter>) -> Self {
        self.lock().echo = Some(counter);
        self
    }

    /// Make every following operation fail without effect.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Operations recorded so far.
    pub fn ops(&self) -> Vec<TransportOp> {
        self.lock().ops.clone()
    }

    /// Drop the recorded operations, keeping the modelled text.
    pub fn clear_ops(&self) {
        self.lock().ops.clear();
    }

    /// The consumer's text according to the model.
    pub fn text(&self) -> String {
        self.lock().text.iter().collect()
    }

    /// Number of deletion-equivalent operations recorded.
    pub fn deletion_ops(&self) -> usize {
        self.lock().ops.iter().filter(|op| op.is_deletion()).count()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, op: TransportOp) -> Result<(), TransportError> {
        let mut rec = self.lock();
        if rec.failing {
            return Err(TransportError::Disconnected);
        }

        match &op {
            TransportOp::InjectBackspace => {
                rec.delete_back(1);
                if let Some(counter) = &rec.echo {
                    counter.absorb();
                }
            }
            TransportOp::DeleteSurrounding { offset, count } => {
                if offset.unsigned_abs() == *count {
                    rec.delete_back(*count as usize);
                }
            }
            TransportOp::Forward(event) if !event.is_release() => match event.keyval {
                keysym::BACKSPACE => rec.delete_back(1),
                keysym::LEFT if event.state.contains(KeyState::SHIFT) => {
                    rec.selected = (rec.selected + 1).min(rec.text.len());
                }
                _ => match event.to_char() {
                    Some(c) if !event.state.intersects(KeyState::SHORTCUT) => rec.insert([c]),
                    _ => rec.selected = 0,
                },
            },
            TransportOp::Forward(_) => {}
            TransportOp::Commit(text) => rec.insert(text.chars()),
        }

        rec.ops.push(op);
        Ok(())
    }
}

impl Transport for RecordingTransport {
    fn inject_backspace(&mut self) -> Result<(), TransportError> {
        self.record(TransportOp::InjectBackspace)
    }

    fn delete_surrounding_text(&mut self, offset: i32, count: u32) -> Result<(), TransportError> {
        self.record(TransportOp::DeleteSurrounding { offset, count })
    }

    fn forward_key_event(&mut self, event: KeyEvent) -> Result<(), TransportError> {
        self.record(TransportOp::Forward(event))
    }

    fn commit_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.record(TransportOp::Commit(text.to_string()))
    }
}
