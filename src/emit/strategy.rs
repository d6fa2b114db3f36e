//! Emitter: Realizes edits against the consumer in the active mode.
//!
//! Every call blocks the calling thread. The sleeps are the only
//! synchronization available with a consumer that cannot be observed, so
//! they are part of the contract rather than a tuning detail.

use super::backspace::FakeBackspaceCounter;
use super::clock::{BoundedRetry, Clock};
use super::keysym::symbol_keyval;
use super::mode::EmissionMode;
use super::transport::Transport;
use crate::actor::{keycode, keysym, KeyEvent, KeyState};
use crate::config::{ConsumerProfile, EmitTiming};
use crate::error::TransportError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Delay scaled by a key count.
fn scaled(delay: Duration, count: usize) -> Duration {
    delay.saturating_mul(u32::try_from(count).unwrap_or(u32::MAX))
}

/// Log a failed transport call. Delivery is fire-and-forget.
fn delivered(op: &str, result: Result<(), TransportError>) {
    if let Err(e) = result {
        warn!(op, error = %e, "transport delivery failed");
    }
}

/// Drives a [`Transport`] according to the active [`EmissionMode`].
pub struct Emitter {
    transport: Box<dyn Transport>,
    clock: Arc<dyn Clock>,
    fake_backspaces: Arc<FakeBackspaceCounter>,
    profile: ConsumerProfile,
    timing: EmitTiming,
    settle: BoundedRetry,
    /// Time of the most recent commit.
    last_commit: Option<Instant>,
    /// Runes selected with Shift+Left and not yet replaced.
    selection: bool,
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("profile", &self.profile)
            .field("timing", &self.timing)
            .field("settle", &self.settle)
            .field("last_commit", &self.last_commit)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

impl Emitter {
    /// Create an emitter.
    pub fn new(
        transport: Box<dyn Transport>,
        clock: Arc<dyn Clock>,
        fake_backspaces: Arc<FakeBackspaceCounter>,
        profile: ConsumerProfile,
        timing: EmitTiming,
        settle: BoundedRetry,
    ) -> Self {
        Self {
            transport,
            clock,
            fake_backspaces,
            profile,
            timing,
            settle,
            last_commit: None,
            selection: false,
        }
    }

    /// The active mode.
    pub const fn mode(&self) -> EmissionMode {
        self.profile.mode
    }

    /// The active consumer profile.
    pub const fn profile(&self) -> ConsumerProfile {
        self.profile
    }

    /// Switch to another consumer profile.
    pub fn set_profile(&mut self, profile: ConsumerProfile) {
        if profile != self.profile {
            debug!(from = %self.profile.mode, to = %profile.mode, "switching emission mode");
        }
        self.profile = profile;
    }

    /// The emission delays in use.
    pub const fn timing(&self) -> EmitTiming {
        self.timing
    }

    /// Time of the last commit, if any.
    pub const fn last_commit(&self) -> Option<Instant> {
        self.last_commit
    }

    /// Block for `duration` on the emitter's clock.
    pub fn pause(&self, duration: Duration) {
        self.clock.sleep(duration);
    }

    /// Delete `deletion_count` runes, then insert `inserted`.
    pub fn emit(&mut self, deletion_count: usize, inserted: &[char]) {
        self.delete(deletion_count);
        self.commit(inserted);
    }

    /// Delete `count` runes before the cursor.
    pub fn delete(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.wait_commit_gap();

        let timing = self.timing;
        match self.profile.mode {
            EmissionMode::FakeKeyEvent => {
                self.fake_backspaces.set(i32::try_from(count).unwrap_or(i32::MAX));
                debug!(count, "sending backspaces via key injection");
                self.clock.sleep(timing.fake_key_lead);
                for _ in 0..count {
                    delivered("inject_backspace", self.transport.inject_backspace());
                }
                let counter = &self.fake_backspaces;
                if !self.settle.wait_until(self.clock.as_ref(), || counter.is_settled()) {
                    warn!(
                        pending = counter.get(),
                        "consumer did not absorb injected backspaces in time, proceeding"
                    );
                }
                self.clock.sleep(scaled(timing.fake_key_per_key, count));
            }
            EmissionMode::SurroundingTextDelete => {
                self.clock.sleep(timing.surrounding_settle);
                debug!(count, "sending backspaces via surrounding text");
                let n = u32::try_from(count).unwrap_or(u32::MAX);
                let offset = i32::try_from(count).map_or(i32::MIN, |c| -c);
                delivered(
                    "delete_surrounding_text",
                    self.transport.delete_surrounding_text(offset, n),
                );
                self.clock.sleep(timing.surrounding_settle);
            }
            EmissionMode::ForwardAsCommit => {
                self.clock.sleep(timing.forward_commit_lead);
                debug!(count, "sending backspaces via forward-as-commit");
                self.forward_chords(keysym::BACKSPACE, keycode::BACKSPACE, KeyState::empty(), count);
                self.clock.sleep(scaled(timing.forward_commit_per_key, count));
            }
            EmissionMode::ShiftLeftForwarding => {
                self.clock.sleep(timing.shift_left_per_key);
                debug!(count, "sending Shift+Left via forwarding");
                self.forward_chords(keysym::LEFT, keycode::LEFT, KeyState::SHIFT, count);
                self.selection = true;
                self.clock.sleep(scaled(timing.shift_left_per_key, count));
            }
            EmissionMode::BackspaceForwarding => {
                self.clock.sleep(timing.backspace_forward_per_key);
                debug!(count, "sending backspaces via forwarding");
                self.forward_chords(keysym::BACKSPACE, keycode::BACKSPACE, KeyState::empty(), count);
                self.clock.sleep(scaled(timing.backspace_forward_per_key, count));
            }
        }
    }

    /// Insert `runes` at the cursor.
    ///
    /// An empty commit after a Shift+Left deletion removes the selection
    /// with one BackSpace, since there is no text to replace it.
    pub fn commit(&mut self, runes: &[char]) {
        if runes.is_empty() {
            if std::mem::take(&mut self.selection) {
                debug!("removing Shift+Left selection with nothing to replace it");
                self.forward_chords(keysym::BACKSPACE, keycode::BACKSPACE, KeyState::empty(), 1);
            }
            return;
        }
        self.wait_commit_gap();
        self.selection = false;

        if self.profile.mode == EmissionMode::ForwardAsCommit {
            for &c in runes {
                let keyval = symbol_keyval(c);
                delivered(
                    "forward_key_event",
                    self.transport.forward_key_event(KeyEvent::new(keyval, 0, KeyState::empty())),
                );
                delivered(
                    "forward_key_event",
                    self.transport.forward_key_event(KeyEvent::new(keyval, 0, KeyState::RELEASE)),
                );
            }
            self.clock.sleep(scaled(self.timing.forward_commit_per_rune, runes.len()));
        } else {
            let text: String = runes.iter().collect();
            delivered("commit_text", self.transport.commit_text(&text));
        }
        self.last_commit = Some(self.clock.now());
    }

    /// Forward a key event to the consumer unchanged.
    pub fn forward(&mut self, event: KeyEvent) {
        delivered("forward_key_event", self.transport.forward_key_event(event));
    }

    /// Block until the minimum gap since the last commit has passed.
    fn wait_commit_gap(&self) {
        let Some(last) = self.last_commit else { return };
        let since = self.clock.now().saturating_duration_since(last);
        if let Some(remaining) = self.timing.min_commit_gap.checked_sub(since) {
            self.clock.sleep(remaining);
        }
    }

    /// Forward `count` press/release chords of one key.
    fn forward_chords(&mut self, keyval: u32, keycode: u32, state: KeyState, count: usize) {
        for _ in 0..count {
            delivered(
                "forward_key_event",
                self.transport.forward_key_event(KeyEvent::new(keyval, keycode, state)),
            );
            delivered(
                "forward_key_event",
                self.transport.forward_key_event(KeyEvent::new(keyval, keycode, KeyState::RELEASE)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{ManualClock, RecordingTransport, TransportOp};

    struct Fixture {
        emitter: Emitter,
        transport: RecordingTransport,
        clock: ManualClock,
        counter: Arc<FakeBackspaceCounter>,
    }

    fn fixture(mode: EmissionMode) -> Fixture {
        let counter = Arc::new(FakeBackspaceCounter::new());
        let transport = RecordingTransport::new().with_echo(Arc::clone(&counter));
        let clock = ManualClock::new();
        let emitter = Emitter::new(
            Box::new(transport.clone()),
            Arc::new(clock.clone()),
            Arc::clone(&counter),
            ConsumerProfile::new(mode),
            EmitTiming::default(),
            BoundedRetry::default(),
        );
        Fixture { emitter, transport, clock, counter }
    }

    fn runes(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_every_mode_sends_n_deletions() {
        for mode in EmissionMode::ALL {
            let mut f = fixture(mode);
            f.emitter.commit(&runes("hello"));
            f.transport.clear_ops();

            f.emitter.delete(3);

            let expected = if mode == EmissionMode::SurroundingTextDelete { 1 } else { 3 };
            assert_eq!(f.transport.deletion_ops(), expected, "{mode}");

            // Shift+Left only selects; the next commit replaces the selection
            f.emitter.commit(&runes("y"));
            assert_eq!(f.transport.text(), "hey", "{mode}");
        }
    }

    #[test]
    fn test_surrounding_delete_is_one_request() {
        let mut f = fixture(EmissionMode::SurroundingTextDelete);
        f.emitter.delete(4);
        assert_eq!(f.transport.ops(), vec![TransportOp::DeleteSurrounding { offset: -4, count: 4 }]);
        assert_eq!(
            f.clock.sleeps(),
            vec![Duration::from_millis(20), Duration::from_millis(20)]
        );
    }

    #[test]
    fn test_every_mode_reaches_target_text() {
        for mode in EmissionMode::ALL {
            let mut f = fixture(mode);
            f.emitter.emit(0, &runes("toi"));
            f.emitter.emit(2, &runes("ôi"));
            assert_eq!(f.transport.text(), "tôi", "{mode}");
        }
    }

    #[test]
    fn test_pure_deletion_reaches_target_text() {
        for mode in EmissionMode::ALL {
            let mut f = fixture(mode);
            f.emitter.emit(0, &runes("không"));
            f.emitter.emit(4, &[]);
            assert_eq!(f.transport.text(), "k", "{mode}");

            // a movement key afterwards must not bring the runes back
            f.emitter.forward(KeyEvent::from_keyval(keysym::RIGHT));
            assert_eq!(f.transport.text(), "k", "{mode}");
        }
    }

    #[test]
    fn test_shift_left_selection_removed_once() {
        let mut f = fixture(EmissionMode::ShiftLeftForwarding);
        f.emitter.commit(&runes("ko"));
        f.transport.clear_ops();

        f.emitter.emit(1, &[]);
        f.emitter.commit(&[]);

        let backspaces = f
            .transport
            .ops()
            .into_iter()
            .filter(|op| matches!(op, TransportOp::Forward(e) if e.keyval == keysym::BACKSPACE && !e.is_release()))
            .count();
        assert_eq!(backspaces, 1);
        assert_eq!(f.transport.text(), "k");
    }

    #[test]
    fn test_fake_key_event_settles_on_echo() {
        let mut f = fixture(EmissionMode::FakeKeyEvent);
        f.emitter.delete(2);

        assert_eq!(f.counter.get(), 0);
        // lead, no settle polls, then per-key delay
        assert_eq!(
            f.clock.sleeps(),
            vec![Duration::from_millis(10), Duration::from_millis(20)]
        );
    }

    #[test]
    fn test_fake_key_event_gives_up_without_echo() {
        let counter = Arc::new(FakeBackspaceCounter::new());
        let transport = RecordingTransport::new();
        let clock = ManualClock::new();
        let mut emitter = Emitter::new(
            Box::new(transport.clone()),
            Arc::new(clock.clone()),
            Arc::clone(&counter),
            ConsumerProfile::new(EmissionMode::FakeKeyEvent),
            EmitTiming::default(),
            BoundedRetry::default(),
        );

        emitter.delete(1);

        assert_eq!(counter.get(), 1);
        assert_eq!(transport.deletion_ops(), 1);
        // 10ms lead + 10 polls of 5ms + 10ms per key
        assert_eq!(clock.elapsed(), Duration::from_millis(70));
    }

    #[test]
    fn test_forward_as_commit_types_symbols() {
        let mut f = fixture(EmissionMode::ForwardAsCommit);
        f.emitter.commit(&runes("đi"));

        assert_eq!(
            f.transport.ops(),
            vec![
                TransportOp::Forward(KeyEvent::new(0x01f0, 0, KeyState::empty())),
                TransportOp::Forward(KeyEvent::new(0x01f0, 0, KeyState::RELEASE)),
                TransportOp::Forward(KeyEvent::new(u32::from('i'), 0, KeyState::empty())),
                TransportOp::Forward(KeyEvent::new(u32::from('i'), 0, KeyState::RELEASE)),
            ]
        );
        assert_eq!(f.clock.elapsed(), Duration::from_millis(10));
    }

    #[test]
    fn test_min_commit_gap_blocks_second_emission() {
        let mut f = fixture(EmissionMode::SurroundingTextDelete);
        f.emitter.emit(0, &runes("a"));
        f.clock.advance(Duration::from_millis(15));

        let before = f.clock.now();
        f.emitter.emit(0, &runes("b"));

        let committed_at = f.emitter.last_commit().unwrap();
        assert_eq!(committed_at - before, Duration::from_millis(35));
        assert_eq!(f.clock.elapsed(), Duration::from_millis(50));
    }

    #[test]
    fn test_min_commit_gap_already_elapsed() {
        let mut f = fixture(EmissionMode::FakeKeyEvent);
        f.emitter.commit(&runes("a"));
        f.clock.advance(Duration::from_millis(80));
        f.emitter.commit(&runes("b"));

        assert!(f.clock.sleeps().is_empty());
    }

    #[test]
    fn test_transport_errors_are_swallowed() {
        let mut f = fixture(EmissionMode::BackspaceForwarding);
        f.transport.set_failing(true);

        f.emitter.emit(2, &runes("x"));

        assert!(f.transport.ops().is_empty());
        assert!(f.emitter.last_commit().is_some());
    }
}
