//! Configuration consumed by the engine.
//!
//! The engine does not own a configuration surface. It is handed an
//! [`EngineConfig`] and, whenever the focused application changes, a
//! [`ConsumerProfile`] resolved through [`ModeRules`].

use crate::emit::{BoundedRetry, EmissionMode};
use crate::error::ConfigError;
use bitflags::bitflags;
use std::time::Duration;

bitflags! {
    /// Feature switches read by the reconciliation logic.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ConfigFlags: u32 {
        /// On backspace, let the composer restore the raw keys of a word
        /// that stopped looking Vietnamese, correcting the consumer text.
        const AUTO_NON_VN_RESTORE = 1 << 0;
        /// Macro expansion is on; disables the first-key fast path.
        const MACRO_ENABLED = 1 << 1;
    }
}

/// Delays used when realizing an edit.
///
/// The defaults are tuned against real toolkits and should only be changed
/// for testing or for a consumer known to need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitTiming {
    /// Minimum time between the last commit and the next emission.
    pub min_commit_gap: Duration,
    /// Delay before injecting synthetic backspaces.
    pub fake_key_lead: Duration,
    /// Extra delay per injected backspace after settlement.
    pub fake_key_per_key: Duration,
    /// Delay before and after a surrounding-text delete.
    pub surrounding_settle: Duration,
    /// Delay before forwarded backspaces in forward-as-commit mode.
    pub forward_commit_lead: Duration,
    /// Delay per forwarded backspace in forward-as-commit mode.
    pub forward_commit_per_key: Duration,
    /// Delay per rune typed out in forward-as-commit mode.
    pub forward_commit_per_rune: Duration,
    /// Lead and per-chord delay for Shift+Left forwarding.
    pub shift_left_per_key: Duration,
    /// Lead and per-chord delay for backspace forwarding.
    pub backspace_forward_per_key: Duration,
    /// Pause between the space and backspace of the autocomplete workaround.
    pub autocomplete_pause: Duration,
}

impl Default for EmitTiming {
    fn default() -> Self {
        Self {
            min_commit_gap: Duration::from_millis(50),
            fake_key_lead: Duration::from_millis(10),
            fake_key_per_key: Duration::from_millis(10),
            surrounding_settle: Duration::from_millis(20),
            forward_commit_lead: Duration::from_millis(20),
            forward_commit_per_key: Duration::from_millis(20),
            forward_commit_per_rune: Duration::from_millis(5),
            shift_left_per_key: Duration::from_millis(30),
            backspace_forward_per_key: Duration::from_millis(30),
            autocomplete_pause: Duration::from_millis(10),
        }
    }
}

impl EmitTiming {
    /// All delays zero. Emission still happens in the same order.
    pub const fn immediate() -> Self {
        Self {
            min_commit_gap: Duration::ZERO,
            fake_key_lead: Duration::ZERO,
            fake_key_per_key: Duration::ZERO,
            surrounding_settle: Duration::ZERO,
            forward_commit_lead: Duration::ZERO,
            forward_commit_per_key: Duration::ZERO,
            forward_commit_per_rune: Duration::ZERO,
            shift_left_per_key: Duration::ZERO,
            backspace_forward_per_key: Duration::ZERO,
            autocomplete_pause: Duration::ZERO,
        }
    }
}

/// How the engine should treat the currently focused consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsumerProfile {
    /// Emission mode for this consumer.
    pub mode: EmissionMode,
    /// The consumer pops up autocompletion that swallows the first
    /// backspace of a word (browser address bars).
    pub autocomplete_workaround: bool,
}

impl ConsumerProfile {
    /// Profile with the given mode and no workarounds.
    pub const fn new(mode: EmissionMode) -> Self {
        Self {
            mode,
            autocomplete_workaround: false,
        }
    }
}

/// Application classes known to autocomplete in their address bar.
const BROWSER_CLASSES: &[&str] = &[
    "firefox",
    "chromium",
    "google-chrome",
    "brave",
    "vivaldi",
    "opera",
    "microsoft-edge",
];

/// How a rule matches an application class (both lowercased).
#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassPattern {
    Contains(String),
    Exact(String),
}

impl ClassPattern {
    fn matches(&self, class: &str) -> bool {
        match self {
            Self::Contains(p) => class.contains(p.as_str()),
            Self::Exact(p) => class == p,
        }
    }
}

/// Ordered lookup from application class to emission mode.
///
/// Rules match case-insensitively, on a substring of the class or on the
/// whole class; the first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeRules {
    rules: Vec<(ClassPattern, EmissionMode)>,
    default: Option<EmissionMode>,
}

impl Default for ModeRules {
    fn default() -> Self {
        Self::empty()
            .with_rule("libreoffice", EmissionMode::SurroundingTextDelete)
            .with_rule("soffice", EmissionMode::SurroundingTextDelete)
            .with_rule("jetbrains", EmissionMode::ShiftLeftForwarding)
            .with_exact_rule("code", EmissionMode::ShiftLeftForwarding)
            .with_rule("code-oss", EmissionMode::ShiftLeftForwarding)
            .with_rule("vscodium", EmissionMode::ShiftLeftForwarding)
            .with_rule("xterm", EmissionMode::ForwardAsCommit)
            .with_rule("wine", EmissionMode::BackspaceForwarding)
            .with_default(EmissionMode::FakeKeyEvent)
    }
}

impl ModeRules {
    /// No rules and no default.
    pub const fn empty() -> Self {
        Self {
            rules: Vec::new(),
            default: None,
        }
    }

    /// Append a rule matching any class that contains `class_pattern`.
    #[must_use]
    pub fn with_rule(mut self, class_pattern: &str, mode: EmissionMode) -> Self {
        self.rules
            .push((ClassPattern::Contains(class_pattern.to_ascii_lowercase()), mode));
        self
    }

    /// Append a rule matching exactly `class`.
    #[must_use]
    pub fn with_exact_rule(mut self, class: &str, mode: EmissionMode) -> Self {
        self.rules.push((ClassPattern::Exact(class.to_ascii_lowercase()), mode));
        self
    }

    /// Set the fallback mode for unmatched classes.
    #[must_use]
    pub fn with_default(mut self, mode: EmissionMode) -> Self {
        self.default = Some(mode);
        self
    }

    /// Parse `class=mode` lines, one rule per line.
    ///
    /// Blank lines and lines starting with `#` are skipped. A class of `*`
    /// sets the default, and a class in double quotes must match exactly.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut rules = Self::empty();
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (class, mode) = line
                .split_once('=')
                .ok_or_else(|| ConfigError::UnknownMode(line.to_string()))?;
            let mode: EmissionMode = mode.parse()?;
            let class = class.trim();
            if class == "*" {
                rules.default = Some(mode);
            } else if let Some(exact) = class.strip_prefix('"').and_then(|c| c.strip_suffix('"')) {
                rules = rules.with_exact_rule(exact, mode);
            } else {
                rules = rules.with_rule(class, mode);
            }
        }
        Ok(rules)
    }

    /// Emission mode for an application class.
    pub fn mode_for(&self, app_class: &str) -> Result<EmissionMode, ConfigError> {
        let class = app_class.to_ascii_lowercase();
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches(&class))
            .map(|&(_, mode)| mode)
            .or(self.default)
            .ok_or_else(|| ConfigError::NoMatchingMode(app_class.to_string()))
    }

    /// Full profile for an application class.
    pub fn profile_for(&self, app_class: &str) -> Result<ConsumerProfile, ConfigError> {
        let mode = self.mode_for(app_class)?;
        let class = app_class.to_ascii_lowercase();
        Ok(ConsumerProfile {
            mode,
            autocomplete_workaround: BROWSER_CLASSES.iter().any(|b| class.contains(b)),
        })
    }
}

/// Configuration for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Feature switches.
    pub flags: ConfigFlags,
    /// Active consumer profile.
    pub profile: ConsumerProfile,
    /// Emission delays.
    pub timing: EmitTiming,
    /// Bounded wait for injected backspaces to echo back.
    pub settle: BoundedRetry,
    /// Queue keys that arrive during an emission instead of blocking on it.
    pub queue_keystrokes: bool,
    /// How long the replay worker waits for a wake-up before re-checking
    /// its shutdown flag.
    pub worker_poll: Duration,
    /// Rules used by [`Controller::apply_app_class`](crate::Controller::apply_app_class).
    pub mode_rules: ModeRules,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            flags: ConfigFlags::AUTO_NON_VN_RESTORE,
            profile: ConsumerProfile::default(),
            timing: EmitTiming::default(),
            settle: BoundedRetry::default(),
            queue_keystrokes: true,
            worker_poll: Duration::from_millis(10),
            mode_rules: ModeRules::default(),
        }
    }
}

impl EngineConfig {
    /// Set the feature flags.
    #[must_use]
    pub fn with_flags(mut self, flags: ConfigFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the emission mode, keeping other profile settings.
    #[must_use]
    pub fn with_mode(mut self, mode: EmissionMode) -> Self {
        self.profile.mode = mode;
        self
    }

    /// Set the consumer profile.
    #[must_use]
    pub fn with_profile(mut self, profile: ConsumerProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Set the emission delays.
    #[must_use]
    pub fn with_timing(mut self, timing: EmitTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Set the backspace settlement policy.
    #[must_use]
    pub fn with_settle(mut self, settle: BoundedRetry) -> Self {
        self.settle = settle;
        self
    }

    /// Enable or disable the pending-keystroke queue.
    #[must_use]
    pub fn with_queue(mut self, enabled: bool) -> Self {
        self.queue_keystrokes = enabled;
        self
    }

    /// Replace the application-class rules.
    #[must_use]
    pub fn with_mode_rules(mut self, rules: ModeRules) -> Self {
        self.mode_rules = rules;
        self
    }
}
