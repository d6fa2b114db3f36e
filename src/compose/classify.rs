//! Key classification: Which path a key event takes through the engine.

use crate::actor::{keysym, KeyEvent, KeyState};

/// Category of a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyClass {
    /// Cursor movement; invalidates everything known about consumer text.
    Movement,
    /// BackSpace.
    Backspace,
    /// Tab; accepts the composer's alternate text.
    Tab,
    /// Printable key that ends a word (space, punctuation, digits).
    WordBreak,
    /// Printable key that may take part in composition.
    Printable,
    /// Anything else: shortcuts, function keys, releases.
    Other,
}

impl KeyClass {
    /// Whether the key produces text the engine commits.
    pub const fn is_text(self) -> bool {
        matches!(self, Self::WordBreak | Self::Printable)
    }
}

/// Maps raw key events to a [`KeyClass`].
pub trait KeyClassifier: Send + Sync {
    /// Classify one event.
    fn classify(&self, event: &KeyEvent) -> KeyClass;
}

/// Whether the modifier state allows the key to type text.
pub const fn is_valid_state(state: KeyState) -> bool {
    !state.intersects(KeyState::SHORTCUT) && !state.contains(KeyState::RELEASE)
}

/// Classifier for X11 keysyms with a Latin keyboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl DefaultClassifier {
    fn is_movement(keyval: u32) -> bool {
        matches!(
            keyval,
            keysym::LEFT
                | keysym::RIGHT
                | keysym::UP
                | keysym::DOWN
                | keysym::HOME
                | keysym::END
                | keysym::PAGE_UP
                | keysym::PAGE_DOWN
                | keysym::RETURN
                | keysym::KP_ENTER
                | keysym::ESCAPE
        )
    }
}

impl KeyClassifier for DefaultClassifier {
    fn classify(&self, event: &KeyEvent) -> KeyClass {
        if event.is_release() {
            return KeyClass::Other;
        }
        match event.keyval {
            keysym::BACKSPACE => return KeyClass::Backspace,
            k if Self::is_movement(k) => return KeyClass::Movement,
            _ => {}
        }
        if !is_valid_state(event.state) {
            return KeyClass::Other;
        }
        if event.keyval == keysym::TAB {
            return KeyClass::Tab;
        }
        match event.to_char() {
            Some(c) if c.is_ascii_punctuation() || c.is_ascii_digit() || c.is_whitespace() => {
                KeyClass::WordBreak
            }
            Some(_) => KeyClass::Printable,
            None => KeyClass::Other,
        }
    }
}
