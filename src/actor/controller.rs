//! Controller: Decides whether a key is handled now or queued.
//!
//! At most one emission is in flight. The thread that claims the busy flag
//! runs the edit and then replays anything that was queued while it ran;
//! everyone else parks their key in the [`PendingQueue`] and returns at
//! once. Echoes of injected backspaces are recognized before any of this
//! so they never wait behind the emission that produced them.
//!
//! ```text
//!            dispatch(key)
//!                 │
//!   echo? ───────▶ absorb, let it through
//!                 │
//!   busy? ───────▶ enqueue ──────────────┐
//!                 │                      │
//!        claim ──▶ process ──▶ replay ◀──┘
//!                 │
//!              release ──▶ wake worker if keys are left
//! ```

use super::messages::KeyEvent;
use super::queue::PendingQueue;
use super::reconcile::Reconciler;
use crate::compose::{Composer, DefaultClassifier, KeyClass, KeyClassifier};
use crate::config::{ConsumerProfile, EngineConfig, ModeRules};
use crate::emit::{Clock, EmissionMode, Emitter, FakeBackspaceCounter, SystemClock, Transport};
use crate::error::ConfigError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, trace, warn};

/// What the controller is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerState {
    /// Nothing in flight and nothing queued.
    Idle,
    /// An edit is being emitted and no key is waiting.
    SynchronousEdit,
    /// Keys are waiting to be replayed.
    QueuedDrain,
}

/// Entry point for key events.
///
/// `Controller` is `Sync`; the key producer and the replay worker share it
/// through an `Arc`.
pub struct Controller {
    reconciler: Mutex<Reconciler>,
    queue: PendingQueue,
    busy: AtomicBool,
    fake_backspaces: Arc<FakeBackspaceCounter>,
    classifier: Arc<dyn KeyClassifier>,
    queue_keystrokes: bool,
    mode_rules: ModeRules,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state())
            .field("pending", &self.queue.len())
            .field("fake_backspaces", &self.fake_backspaces.get())
            .field("queue_keystrokes", &self.queue_keystrokes)
            .finish_non_exhaustive()
    }
}

impl Controller {
    /// Create a controller with the default configuration.
    pub fn new(composer: impl Composer + 'static, transport: impl Transport + 'static) -> Self {
        Self::with_config(EngineConfig::default(), composer, transport)
    }

    /// Create a controller with a custom configuration, the X11 key
    /// classifier and the system clock.
    pub fn with_config(
        config: EngineConfig,
        composer: impl Composer + 'static,
        transport: impl Transport + 'static,
    ) -> Self {
        Self::with_parts(
            config,
            Box::new(composer),
            Box::new(transport),
            Arc::new(DefaultClassifier),
            Arc::new(SystemClock),
        )
    }

    /// Create a controller from all of its collaborators.
    pub fn with_parts(
        config: EngineConfig,
        composer: Box<dyn Composer>,
        transport: Box<dyn Transport>,
        classifier: Arc<dyn KeyClassifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let fake_backspaces = Arc::new(FakeBackspaceCounter::new());
        let queue = PendingQueue::new();
        let emitter = Emitter::new(
            transport,
            clock,
            Arc::clone(&fake_backspaces),
            config.profile,
            config.timing,
            config.settle,
        );
        let reconciler = Reconciler::new(
            composer,
            Arc::clone(&classifier),
            emitter,
            Arc::clone(&fake_backspaces),
            queue.clone(),
            config.flags,
        );

        Self {
            reconciler: Mutex::new(reconciler),
            queue,
            busy: AtomicBool::new(false),
            fake_backspaces,
            classifier,
            queue_keystrokes: config.queue_keystrokes,
            mode_rules: config.mode_rules,
        }
    }

    /// Handle a key event from the producer.
    ///
    /// Returns true if the engine took the key; false means the host should
    /// deliver it to the consumer as usual.
    pub fn dispatch(&self, event: KeyEvent) -> bool {
        let class = self.classifier.classify(&event);
        if class == KeyClass::Backspace && self.fake_backspaces.absorb() {
            trace!(remaining = self.fake_backspaces.get(), "absorbed injected backspace");
            return false;
        }

        if !self.queue_keystrokes {
            return self.lock().process_key_event(event, class);
        }

        if !self.try_claim() {
            self.queue.enqueue(event);
            debug!(pending = self.queue.len(), "emission in flight, key queued");
            return true;
        }

        let handled = {
            let mut reconciler = self.lock();
            if self.queue.is_empty() {
                reconciler.process_key_event(event, class)
            } else {
                // keys queued earlier go first
                self.queue.enqueue(event);
                reconciler.replay_queue();
                true
            }
        };
        self.release();
        handled
    }

    /// Replay keys left in the queue, if no emission is in flight.
    ///
    /// Returns true if a replay ran.
    pub fn replay_pending(&self) -> bool {
        if self.queue.is_empty() || !self.try_claim() {
            return false;
        }
        debug!(pending = self.queue.len(), "replaying queued keys");
        self.lock().replay_queue();
        self.release();
        true
    }

    /// Resolve the emission mode for a newly focused application.
    ///
    /// On error the current mode stays in place.
    pub fn apply_app_class(&self, app_class: &str) -> Result<EmissionMode, ConfigError> {
        match self.mode_rules.profile_for(app_class) {
            Ok(profile) => {
                info!(app_class, mode = %profile.mode, "consumer focused");
                self.lock().set_profile(profile);
                Ok(profile.mode)
            }
            Err(e) => {
                warn!(app_class, error = %e, "keeping current emission mode");
                Err(e)
            }
        }
    }

    /// Switch consumer profile directly.
    pub fn set_profile(&self, profile: ConsumerProfile) {
        self.lock().set_profile(profile);
    }

    /// The active emission mode.
    pub fn mode(&self) -> EmissionMode {
        self.lock().profile().mode
    }

    /// Forget the current word. Queued keys are kept.
    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Text believed to be shown for the current word.
    pub fn tracked_text(&self) -> String {
        self.lock().tracked_text()
    }

    /// Injected backspaces not yet echoed back.
    pub fn fake_backspaces(&self) -> &Arc<FakeBackspaceCounter> {
        &self.fake_backspaces
    }

    /// The pending-keystroke queue.
    pub const fn queue(&self) -> &PendingQueue {
        &self.queue
    }

    /// Number of queued keys.
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Whether an emission is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Current state, derived from the busy flag and the queue.
    pub fn state(&self) -> ControllerState {
        match (self.is_busy(), self.queue.is_empty()) {
            (false, true) => ControllerState::Idle,
            (true, true) => ControllerState::SynchronousEdit,
            (_, false) => ControllerState::QueuedDrain,
        }
    }

    fn try_claim(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn release(&self) {
        self.busy.store(false, Ordering::Release);
        // a key may have been queued after the last drain
        if !self.queue.is_empty() {
            self.queue.notify();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Reconciler> {
        self.reconciler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::keysym;
    use crate::config::EmitTiming;
    use crate::emit::{ManualClock, RecordingTransport, TransportOp};
    use crate::testing::MiniTelex;
    use std::thread;

    fn controller(config: EngineConfig) -> (Controller, RecordingTransport) {
        let transport = RecordingTransport::new();
        let controller = Controller::with_parts(
            config,
            Box::new(MiniTelex::new()),
            Box::new(transport.clone()),
            Arc::new(DefaultClassifier),
            Arc::new(ManualClock::new()),
        );
        (controller, transport)
    }

    fn surrounding() -> EngineConfig {
        EngineConfig::default().with_mode(EmissionMode::SurroundingTextDelete)
    }

    fn type_str(controller: &Controller, keys: &str) {
        for c in keys.chars() {
            controller.dispatch(KeyEvent::from_char(c));
        }
    }

    #[test]
    fn test_idle_dispatch_is_synchronous() {
        let (controller, transport) = controller(surrounding());
        type_str(&controller, "toois");

        assert_eq!(transport.text(), "tối");
        assert_eq!(controller.tracked_text(), "tối");
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[test]
    fn test_backspace_echoes_are_absorbed() {
        let (controller, transport) = controller(EngineConfig::default());
        type_str(&controller, "to");
        transport.clear_ops();
        controller.fake_backspaces().set(2);

        let backspace = KeyEvent::from_keyval(keysym::BACKSPACE);
        assert!(!controller.dispatch(backspace));
        assert!(!controller.dispatch(backspace));

        assert_eq!(controller.fake_backspaces().get(), 0);
        assert!(transport.ops().is_empty());
        // the composer never saw them
        assert_eq!(controller.tracked_text(), "to");
    }

    #[test]
    fn test_keys_queue_while_busy() {
        let (controller, transport) = controller(surrounding());
        type_str(&controller, "t");

        controller.busy.store(true, Ordering::Release);
        assert!(controller.dispatch(KeyEvent::from_char('o')));
        assert!(controller.dispatch(KeyEvent::from_char('o')));
        assert_eq!(controller.state(), ControllerState::QueuedDrain);
        assert_eq!(transport.ops(), vec![TransportOp::Commit("t".into())]);

        // cannot replay while the owner is still emitting
        assert!(!controller.replay_pending());

        controller.release();
        assert!(controller.replay_pending());
        assert_eq!(transport.text(), "tô");
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[test]
    fn test_queued_keys_replay_before_new_key() {
        let (controller, transport) = controller(surrounding());
        type_str(&controller, "t");
        controller.queue().enqueue(KeyEvent::from_char('o'));

        // the owner replays 'o' first, then the new key rides in the same batch
        assert!(controller.dispatch(KeyEvent::from_char('o')));

        assert_eq!(transport.text(), "tô");
        assert!(controller.queue().is_empty());
        assert!(!controller.is_busy());
    }

    #[test]
    fn test_batch_flushes_before_non_text_key() {
        let (controller, transport) = controller(surrounding());
        type_str(&controller, "t");

        controller.busy.store(true, Ordering::Release);
        for event in [
            KeyEvent::from_char('o'),
            KeyEvent::from_char('i'),
            KeyEvent::from_char('s'),
            KeyEvent::from_keyval(keysym::HOME),
        ] {
            controller.dispatch(event);
        }
        controller.release();
        controller.replay_pending();

        let ops = transport.ops();
        assert_eq!(ops.last(), Some(&TransportOp::Forward(KeyEvent::from_keyval(keysym::HOME))));
        assert_eq!(transport.text(), "tói");
        assert_eq!(controller.tracked_text(), "");
    }

    #[test]
    fn test_without_queue_every_key_runs_inline() {
        let (controller, transport) = controller(surrounding().with_queue(false));
        type_str(&controller, "t");
        controller.busy.store(true, Ordering::Release);

        assert!(controller.dispatch(KeyEvent::from_char('o')));
        assert!(controller.queue().is_empty());
        assert_eq!(transport.text(), "to");
    }

    #[test]
    fn test_apply_app_class() {
        let (controller, transport) = controller(EngineConfig::default());
        assert_eq!(controller.mode(), EmissionMode::FakeKeyEvent);

        assert_eq!(
            controller.apply_app_class("libreoffice-writer"),
            Ok(EmissionMode::SurroundingTextDelete)
        );
        type_str(&controller, "tooi");
        assert!(transport.ops().contains(&TransportOp::DeleteSurrounding { offset: -1, count: 1 }));
    }

    #[test]
    fn test_unmatched_app_class_keeps_mode() {
        let config = surrounding().with_mode_rules(ModeRules::empty());
        let (controller, _) = controller(config);

        assert!(controller.apply_app_class("gedit").is_err());
        assert_eq!(controller.mode(), EmissionMode::SurroundingTextDelete);
    }

    #[test]
    fn test_concurrent_producers_keep_every_key() {
        let config = surrounding().with_timing(EmitTiming::immediate());
        let (controller, transport) = controller(config);
        let controller = Arc::new(controller);

        let producers: Vec<_> = (0..4)
            .map(|_| {
                let controller = Arc::clone(&controller);
                thread::spawn(move || {
                    for _ in 0..25 {
                        assert!(controller.dispatch(KeyEvent::from_char('k')));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        // a key queued just after the owner's last drain waits for the worker
        while controller.replay_pending() {}

        assert_eq!(transport.text(), "k".repeat(100));
        assert!(controller.queue().is_empty());
        assert!(!controller.is_busy());
    }
}
