//! # Backtype
//!
//! Keystroke reconciliation and output synchronization for input-method
//! editors that cannot own a preedit area.
//!
//! Such an input method commits text straight into the focused application
//! and, when composition changes an earlier rune, has to delete and retype
//! it. Backtype decides how much to delete, how to delete it in the focused
//! application, and what to do with keys typed while that is happening.
//!
//! ## Core Concepts
//!
//! - **Longest-common-prefix diff**: Minimal delete-then-insert edit between
//!   what was sent and what the composer now reports
//! - **Emission modes**: Five ways to realize an edit, chosen per application
//! - **Pending queue**: Keys typed during an emission are replayed in order,
//!   coalesced into a single commit
//! - **Fake backspace accounting**: Echoes of injected backspaces are let
//!   through instead of being taken for user input
//!
//! ## Example
//!
//! ```rust,ignore
//! use backtype::{Engine, KeyEvent, TerminalTransport};
//!
//! let engine = Engine::new(my_composer, TerminalTransport::new(std::io::stdout()))?;
//! if !engine.process_key_event(KeyEvent::from_char('a')) {
//!     // not taken: deliver the key as usual
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod compose;
pub mod config;
pub mod emit;
pub mod error;
pub mod terminal;
pub mod text;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use actor::{Controller, ControllerState, Engine, KeyEvent, KeyState, PendingQueue, ReplayWorker};
pub use compose::{ComposeMode, Composer, DefaultClassifier, KeyClass, KeyClassifier};
pub use config::{ConfigFlags, ConsumerProfile, EmitTiming, EngineConfig, ModeRules};
pub use emit::{BoundedRetry, Clock, EmissionMode, Emitter, FakeBackspaceCounter, RecordingTransport, Transport};
pub use error::{ConfigError, TransportError};
pub use terminal::{convert_key_event, TerminalTransport};
pub use text::{diff, diff_str, plan_batch_commit, Batch, Edit};
