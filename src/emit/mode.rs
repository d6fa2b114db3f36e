//! Emission modes: How an edit is realized against a consumer.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Strategy used to delete and insert text in the consumer.
///
/// Exactly one mode is active per consumer. The right one depends on the
/// application's quirks and is usually chosen by application class (see
/// [`ModeRules`](crate::config::ModeRules)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmissionMode {
    /// Synthetic backspaces through low-level key injection, tracked by the
    /// fake-backspace counter until the consumer echoes them back.
    #[default]
    FakeKeyEvent,
    /// One atomic "delete N runes before the cursor" request.
    SurroundingTextDelete,
    /// Text is typed out as forwarded key presses instead of committed.
    ForwardAsCommit,
    /// Deletion by selecting left with forwarded Shift+Left chords.
    ShiftLeftForwarding,
    /// Plain forwarded backspace chords.
    BackspaceForwarding,
}

impl EmissionMode {
    /// Every mode, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::FakeKeyEvent,
        Self::SurroundingTextDelete,
        Self::ForwardAsCommit,
        Self::ShiftLeftForwarding,
        Self::BackspaceForwarding,
    ];

    /// Kebab-case name, as used in configuration.
    pub const fn name(self) -> &'static str {
        match self {
            Self::FakeKeyEvent => "fake-key-event",
            Self::SurroundingTextDelete => "surrounding-text",
            Self::ForwardAsCommit => "forward-as-commit",
            Self::ShiftLeftForwarding => "shift-left-forwarding",
            Self::BackspaceForwarding => "backspace-forwarding",
        }
    }
}

impl fmt::Display for EmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EmissionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownMode(s.to_string()))
    }
}
