//! Emission: Turning an edit into operations on the consumer.
//!
//! This module contains:
//! - [`EmissionMode`]: The five consumer-specific strategies
//! - [`Emitter`]: Realizes deletions and insertions in the active mode
//! - [`Transport`]: The operations a consumer accepts, plus a recording model
//! - [`FakeBackspaceCounter`]: Accounting for injected backspaces
//! - [`Clock`] and [`BoundedRetry`]: Injectable time for pacing and settling

mod backspace;
mod clock;
mod keysym;
mod mode;
mod strategy;
mod transport;

pub use backspace::FakeBackspaceCounter;
pub use clock::{BoundedRetry, Clock, ManualClock, SystemClock};
pub use keysym::{keysym_to_char, symbol_keyval};
pub use mode::EmissionMode;
pub use strategy::Emitter;
pub use transport::{RecordingTransport, Transport, TransportOp};
