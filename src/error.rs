//! Error types for backtype.
//!
//! None of these ever reach the key producer. Transport errors are logged
//! and dropped by the emitter; configuration errors are logged where a
//! profile is resolved and leave the previous mode in place.

use thiserror::Error;

/// Errors a transport can report for a single operation.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The consumer connection is gone.
    #[error("consumer disconnected")]
    Disconnected,

    /// The consumer refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Writing to the consumer failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors resolving configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An emission mode name that does not exist.
    #[error("unknown emission mode: {0}")]
    UnknownMode(String),

    /// No rule matched the application class and no default is set.
    #[error("no emission mode for application class {0:?}")]
    NoMatchingMode(String),
}
