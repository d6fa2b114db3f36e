//! Batch: Coalesced text for keystrokes replayed from the pending queue.
//!
//! A batch is a list of segments. Each segment holds the full composed text
//! of one word; a word break closes the current segment and opens an empty
//! one. Only the last segment is ever rewritten, since the composition
//! engine reports its whole word on every key.
//!
//! ```text
//! keys:      t  o  o  ␣  a
//! segments: ["t"] ["to"] ["tô"] ["tô ", ""] ["tô ", "a"]
//! ```

use super::diff::diff;

/// Segments accumulated while draining the pending queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    segments: Vec<String>,
}

impl Default for Batch {
    fn default() -> Self {
        Self::new()
    }
}

impl Batch {
    /// Create a batch with a single empty segment.
    pub fn new() -> Self {
        Self {
            segments: vec![String::new()],
        }
    }

    /// Create a batch whose first segment is `head`.
    ///
    /// If `closed` is set the head ended on a word break and a fresh
    /// segment is opened after it.
    pub fn with_head(head: String, closed: bool) -> Self {
        let mut batch = Self { segments: vec![head] };
        if closed {
            batch.segments.push(String::new());
        }
        batch
    }

    /// Replace the open segment with `text`, closing it on a word break.
    pub fn extend(&mut self, text: String, word_break: bool) {
        if let Some(last) = self.segments.last_mut() {
            *last = text;
        }
        if word_break {
            self.segments.push(String::new());
        }
    }

    /// The full text of every segment, in order.
    pub fn text(&self) -> String {
        self.segments.concat()
    }

    /// The open (last) segment.
    pub fn open_segment(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Number of segments, including the open one.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

/// What is still to be sent after part of a batch's deletions went out.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchPatch {
    /// Deletions on top of the ones already dispatched.
    pub extra_deletions: usize,
    /// Runes to commit.
    pub inserted: Vec<char>,
}

/// Work out the remainder of an edit whose deletions were partly sent.
///
/// `planned` deletions have already been dispatched against `old`. Those
/// cannot be recalled, so when the real edit needs fewer of them the
/// insertion is re-sliced from the position the consumer is actually at
/// (`len(old) - planned`) instead of issuing a negative deletion. Every rune
/// before that position is part of the common prefix of `old` and `new`,
/// which keeps the slice in bounds.
///
/// On a word break the replacement is committed without further deletions:
/// the word is closing and nothing will correct it afterwards. A re-slice
/// is checked first and applies on a word break too; it never adds
/// deletions either.
pub fn plan_batch_commit(old: &[char], new: &[char], planned: usize, word_break: bool) -> BatchPatch {
    let edit = diff(old, new);
    let required = edit.deletion_count;

    if required < planned {
        let offset = old.len().saturating_sub(planned).min(new.len());
        return BatchPatch {
            extra_deletions: 0,
            inserted: new[offset..].to_vec(),
        };
    }

    let extra_deletions = if word_break { 0 } else { required - planned };
    BatchPatch {
        extra_deletions,
        inserted: edit.inserted,
    }
}
