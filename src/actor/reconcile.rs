//! Reconciler: Keeps the consumer's text in step with the composer.
//!
//! The composer reports the whole word on every key. The reconciler
//! remembers what it last sent (the tracked text), diffs the composer's new
//! output against it and has the [`Emitter`] realize the difference. While
//! an emission is running, later keys wait in the [`PendingQueue`]; the
//! next pass folds them into one [`Batch`] so a burst of typing costs one
//! round of deletions instead of one per key.

use super::messages::{KeyEvent, KeyState};
use super::queue::PendingQueue;
use crate::compose::{ComposeMode, Composer, KeyClass, KeyClassifier};
use crate::config::{ConfigFlags, ConsumerProfile};
use crate::emit::{EmissionMode, Emitter, FakeBackspaceCounter};
use crate::text::{common_prefix_len, diff, plan_batch_commit, Batch};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Upper-case a rune when it has a single-rune upper-case form.
fn to_upper(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

fn to_string(runes: &[char]) -> String {
    runes.iter().collect()
}

/// State of one pass over the pending queue.
struct Pass {
    /// Consumer text the pass edits.
    base: Vec<char>,
    /// Deletions already sent against `base`.
    planned: usize,
    /// Insertion still owed for the key that started the pass.
    head: Vec<char>,
    batch: Batch,
    /// The batch holds text not covered by `head`.
    dirty: bool,
    /// The key that started the pass closed its word.
    word_break: bool,
}

impl Pass {
    /// A pass that picks up after a flush, with nothing sent or owed.
    fn resume(base: Vec<char>) -> Self {
        Self {
            batch: Batch::with_head(to_string(&base), false),
            base,
            planned: 0,
            head: Vec::new(),
            dirty: false,
            word_break: false,
        }
    }
}

/// The composition state machine.
///
/// All methods run with the controller's lock held, on whichever thread
/// owns the current emission.
pub struct Reconciler {
    composer: Box<dyn Composer>,
    classifier: Arc<dyn KeyClassifier>,
    emitter: Emitter,
    fake_backspaces: Arc<FakeBackspaceCounter>,
    queue: PendingQueue,
    flags: ConfigFlags,
    /// What the consumer is believed to show for the current word.
    tracked: Vec<char>,
    /// The current word was started through the first-key fast path and
    /// has not yet needed the autocomplete workaround.
    first_correction: bool,
    /// English once the current word has been given back as typed.
    compose_mode: ComposeMode,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("emitter", &self.emitter)
            .field("flags", &self.flags)
            .field("tracked", &to_string(&self.tracked))
            .field("first_correction", &self.first_correction)
            .field("compose_mode", &self.compose_mode)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Create a reconciler around its collaborators.
    pub fn new(
        composer: Box<dyn Composer>,
        classifier: Arc<dyn KeyClassifier>,
        emitter: Emitter,
        fake_backspaces: Arc<FakeBackspaceCounter>,
        queue: PendingQueue,
        flags: ConfigFlags,
    ) -> Self {
        Self {
            composer,
            classifier,
            emitter,
            fake_backspaces,
            queue,
            flags,
            tracked: Vec::new(),
            first_correction: false,
            compose_mode: ComposeMode::Native,
        }
    }

    /// Text believed to be shown for the current word.
    pub fn tracked_text(&self) -> String {
        to_string(&self.tracked)
    }

    /// The active consumer profile.
    pub const fn profile(&self) -> ConsumerProfile {
        self.emitter.profile()
    }

    /// Switch consumer profile. Applies from the next emission.
    pub fn set_profile(&mut self, profile: ConsumerProfile) {
        self.emitter.set_profile(profile);
    }

    /// Forget the current word and any in-flight backspaces.
    pub fn reset(&mut self) {
        self.end_word();
        self.fake_backspaces.reset();
        self.tracked.clear();
    }

    /// Handle a key on the synchronous path.
    ///
    /// Returns true if the key was handled and must not reach the consumer.
    pub fn process_key_event(&mut self, event: KeyEvent, class: KeyClass) -> bool {
        if class == KeyClass::Movement {
            self.reset();
            return false;
        }

        if self.takes_fast_path(event, class) {
            return self.commit_first_key(event, class);
        }
        self.key_press(event, class)
    }

    /// Replay everything left in the queue, forwarding unhandled keys.
    pub fn replay_queue(&mut self) {
        while let Some(event) = self.queue.pop() {
            let class = self.classifier.classify(&event);
            self.key_press_forward(event, class);
        }
    }

    /// A key that starts a word with nothing pending can be committed as is.
    fn takes_fast_path(&self, event: KeyEvent, class: KeyClass) -> bool {
        if self.flags.contains(ConfigFlags::MACRO_ENABLED)
            || !self.queue.is_empty()
            || self.composer.raw_key_len() > 0
            || !class.is_text()
        {
            return false;
        }
        event
            .to_char()
            .is_some_and(|c| !self.composer.appending_keys().contains(&c))
    }

    fn commit_first_key(&mut self, event: KeyEvent, class: KeyClass) -> bool {
        let Some(c) = event.to_char() else { return false };
        if class != KeyClass::Printable || !self.composer.can_process_key(c) {
            return false;
        }

        self.first_correction = true;
        let c = if event.state.contains(KeyState::LOCK) { to_upper(c) } else { c };
        self.composer.process_key(c, ComposeMode::Native);
        let text: Vec<char> = self.composer.composed_text().chars().collect();
        trace!(text = %to_string(&text), "first key of word");
        self.emitter.commit(&text);
        self.tracked = text;
        true
    }

    /// Run the handler; forward the key when it was not handled.
    fn key_press_forward(&mut self, event: KeyEvent, class: KeyClass) {
        if !self.key_press(event, class) {
            self.emitter.forward(event);
        }
    }

    fn key_press(&mut self, event: KeyEvent, class: KeyClass) -> bool {
        match class {
            KeyClass::Movement => {
                self.reset();
                false
            }
            KeyClass::Backspace => self.handle_backspace(),
            KeyClass::Tab => self.accept_alternate(),
            KeyClass::WordBreak | KeyClass::Printable => {
                let Some((new, word_break)) = self.compose_event(event, class) else {
                    return false;
                };
                let old = self.tracked.clone();
                if self.should_append_dead_key(&old, &new) {
                    debug!("appending a dead key for autocompletion");
                    self.emitter.commit(&[' ']);
                    self.emitter.pause(self.emitter.timing().autocomplete_pause);
                    self.first_correction = false;
                    self.emitter.delete(1);
                }
                self.update_in_batch(old, new, word_break);
                true
            }
            KeyClass::Other => false,
        }
    }

    fn handle_backspace(&mut self) -> bool {
        if self.composer.raw_key_len() == 0 {
            return false;
        }
        if !self.flags.contains(ConfigFlags::AUTO_NON_VN_RESTORE) {
            self.composer.remove_last_char(false);
            self.tracked = self.composer.composed_text().chars().collect();
            return false;
        }

        if self.should_fall_back_to_raw() {
            debug!("word does not compose, restoring raw keys");
            self.composer.restore_last_word(false);
            self.compose_mode = ComposeMode::English;
        }
        self.composer.remove_last_char(true);
        let new: Vec<char> = self.composer.composed_text().chars().collect();
        let old = std::mem::take(&mut self.tracked);
        if !old.is_empty() && common_prefix_len(&old, &new) != new.len() {
            self.update_previous_text(&old, new);
            return true;
        }
        self.tracked = new;
        false
    }

    /// A word carrying composed runes that the composer rejects is given
    /// back as typed.
    fn should_fall_back_to_raw(&self) -> bool {
        self.flags.contains(ConfigFlags::AUTO_NON_VN_RESTORE)
            && self.composer.composed_text().chars().any(|c| !c.is_ascii())
            && !self.composer.is_valid_word()
    }

    fn accept_alternate(&mut self) -> bool {
        let handled = match self.composer.alternate_text() {
            Some(alternate) => {
                let old = self.tracked.clone();
                self.update_previous_text(&old, alternate.chars().collect());
                true
            }
            None => false,
        };
        self.end_word();
        self.tracked.clear();
        handled
    }

    /// Feed a text key to the composer.
    ///
    /// Returns the text the current segment should show and whether the
    /// key closed the word.
    fn compose_event(&mut self, event: KeyEvent, class: KeyClass) -> Option<(Vec<char>, bool)> {
        if !class.is_text() {
            return None;
        }
        let mut c = event.to_char()?;
        if event.state.contains(KeyState::LOCK) {
            c = to_upper(c);
        }

        if class == KeyClass::Printable && self.composer.can_process_key(c) {
            if self.composer.raw_key_len() == 0 {
                self.compose_mode = ComposeMode::Native;
            }
            self.composer.process_key(c, self.compose_mode);
            return Some((self.composer.composed_text().chars().collect(), false));
        }

        let mut text: Vec<char> = self.composer.composed_text().chars().collect();
        text.push(c);
        self.end_word();
        Some((text, true))
    }

    fn end_word(&mut self) {
        self.composer.reset();
        self.compose_mode = ComposeMode::Native;
    }

    /// Browser address bars swallow the first correction of a word into
    /// their autocompletion.
    fn should_append_dead_key(&self, old: &[char], new: &[char]) -> bool {
        let offset = common_prefix_len(old, new);
        let profile = self.emitter.profile();
        self.first_correction
            && offset < new.len()
            && offset < old.len()
            && profile.autocomplete_workaround
            && profile.mode != EmissionMode::ShiftLeftForwarding
    }

    /// Replace `old` with `new` in one edit.
    fn update_previous_text(&mut self, old: &[char], new: Vec<char>) {
        let edit = diff(old, &new);
        self.emitter.emit(edit.deletion_count, &edit.inserted);
        info!(old = %to_string(old), new = %to_string(&new), "updating previous text");
        self.tracked = new;
    }

    /// Send the deletions for `old -> new` now and fold whatever is queued
    /// into the insertion.
    fn update_in_batch(&mut self, old: Vec<char>, new: Vec<char>, word_break: bool) {
        let edit = diff(&old, &new);
        self.emitter.delete(edit.deletion_count);

        let mut pass = Pass {
            batch: Batch::with_head(to_string(&new), word_break),
            base: old,
            planned: edit.deletion_count,
            head: edit.inserted,
            dirty: false,
            word_break,
        };

        let pending = self.queue.drain_all();
        if !pending.is_empty() {
            debug!(count = pending.len(), "draining queued keys into batch");
        }
        for event in pending {
            let class = self.classifier.classify(&event);
            if let Some((text, closed)) = self.compose_event(event, class) {
                pass.batch.extend(to_string(&text), closed);
                pass.dirty = true;
                continue;
            }

            self.flush(&pass);
            self.key_press_forward(event, class);
            pass = Pass::resume(self.tracked.clone());
        }
        self.flush(&pass);
    }

    fn flush(&mut self, pass: &Pass) {
        if pass.dirty {
            let new: Vec<char> = pass.batch.text().chars().collect();
            if new.is_empty() {
                self.emitter.commit(&[]);
            } else {
                let patch = plan_batch_commit(&pass.base, &new, pass.planned, pass.word_break);
                info!(old = %to_string(&pass.base), new = %pass.batch.text(), "batch commit");
                self.emitter.emit(patch.extra_deletions, &patch.inserted);
            }
        } else {
            self.emitter.commit(&pass.head);
        }
        self.tracked = pass.batch.open_segment().chars().collect();
    }
}
