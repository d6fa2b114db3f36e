//! Engine: Main coordinator that ties the controller and worker together.
//!
//! The Engine is the entry point for input methods embedding backtype. It
//! owns the [`Controller`] and the [`ReplayWorker`] that keeps the pending
//! queue moving, and forwards the host's calls to the controller.

use super::controller::{Controller, ControllerState};
use super::messages::KeyEvent;
use super::worker::ReplayWorker;
use crate::compose::{Composer, DefaultClassifier, KeyClassifier};
use crate::config::{ConsumerProfile, EngineConfig};
use crate::emit::{Clock, EmissionMode, SystemClock, Transport};
use crate::error::ConfigError;
use std::io;
use std::sync::Arc;
use tracing::info;

/// The backtype engine.
pub struct Engine {
    controller: Arc<Controller>,
    /// Replay worker handle; `None` when queueing is disabled.
    worker: Option<ReplayWorker>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("controller", &self.controller)
            .field("worker", &self.worker.is_some())
            .finish()
    }
}

impl Engine {
    /// Create an engine with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the replay worker thread cannot be spawned.
    pub fn new(composer: impl Composer + 'static, transport: impl Transport + 'static) -> io::Result<Self> {
        Self::with_config(EngineConfig::default(), composer, transport)
    }

    /// Create an engine with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the replay worker thread cannot be spawned.
    pub fn with_config(
        config: EngineConfig,
        composer: impl Composer + 'static,
        transport: impl Transport + 'static,
    ) -> io::Result<Self> {
        Self::with_parts(
            config,
            Box::new(composer),
            Box::new(transport),
            Arc::new(DefaultClassifier),
            Arc::new(SystemClock),
        )
    }

    /// Create an engine from all of its collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the replay worker thread cannot be spawned.
    pub fn with_parts(
        config: EngineConfig,
        composer: Box<dyn Composer>,
        transport: Box<dyn Transport>,
        classifier: Arc<dyn KeyClassifier>,
        clock: Arc<dyn Clock>,
    ) -> io::Result<Self> {
        let poll = config.worker_poll;
        let queueing = config.queue_keystrokes;
        info!(mode = %config.profile.mode, queueing, "starting engine");

        let controller = Arc::new(Controller::with_parts(config, composer, transport, classifier, clock));
        let worker = if queueing {
            Some(ReplayWorker::spawn(Arc::clone(&controller), poll)?)
        } else {
            None
        };

        Ok(Self { controller, worker })
    }

    /// Handle a key event. See [`Controller::dispatch`].
    pub fn process_key_event(&self, event: KeyEvent) -> bool {
        self.controller.dispatch(event)
    }

    /// The shared controller.
    pub const fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }

    /// Switch emission mode for a newly focused application.
    pub fn focus_app(&self, app_class: &str) -> Result<EmissionMode, ConfigError> {
        self.controller.apply_app_class(app_class)
    }

    /// Switch consumer profile directly.
    pub fn set_profile(&self, profile: ConsumerProfile) {
        self.controller.set_profile(profile);
    }

    /// The active emission mode.
    pub fn mode(&self) -> EmissionMode {
        self.controller.mode()
    }

    /// Forget the current word, e.g. when focus moves.
    pub fn reset(&self) {
        self.controller.reset();
    }

    /// Current controller state.
    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }

    /// Stop the replay worker and wait for it.
    pub fn shutdown(mut self) {
        if let Some(worker) = self.worker.take() {
            worker.join();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.join();
        }
    }
}
