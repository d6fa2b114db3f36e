//! Terminal: A terminal line as the consumer.
//!
//! This module contains:
//! - [`TerminalTransport`]: Renders edits onto a terminal line with crossterm
//! - [`convert_key_event`]: crossterm key events as engine key events

mod keys;
mod transport;

pub use keys::convert_key_event;
pub use transport::TerminalTransport;
