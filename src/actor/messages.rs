//! Message types for key dispatch.
//!
//! Keys travel through the engine as the `(keyval, keycode, state)` triple
//! an input-method bus delivers. Keyvals are X11 keysyms.

use crate::emit::keysym_to_char;
use bitflags::bitflags;

/// X11 keysyms the engine handles specially.
pub mod keysym {
    /// BackSpace.
    pub const BACKSPACE: u32 = 0xff08;
    /// Tab.
    pub const TAB: u32 = 0xff09;
    /// Return.
    pub const RETURN: u32 = 0xff0d;
    /// Escape.
    pub const ESCAPE: u32 = 0xff1b;
    /// Home.
    pub const HOME: u32 = 0xff50;
    /// Left arrow.
    pub const LEFT: u32 = 0xff51;
    /// Up arrow.
    pub const UP: u32 = 0xff52;
    /// Right arrow.
    pub const RIGHT: u32 = 0xff53;
    /// Down arrow.
    pub const DOWN: u32 = 0xff54;
    /// Page Up.
    pub const PAGE_UP: u32 = 0xff55;
    /// Page Down.
    pub const PAGE_DOWN: u32 = 0xff56;
    /// End.
    pub const END: u32 = 0xff57;
    /// Insert.
    pub const INSERT: u32 = 0xff63;
    /// Keypad Enter.
    pub const KP_ENTER: u32 = 0xff8d;
    /// F1; F2..F12 follow contiguously.
    pub const F1: u32 = 0xffbe;
    /// Delete.
    pub const DELETE: u32 = 0xffff;
    /// Space.
    pub const SPACE: u32 = 0x0020;
    /// Offset of directly encoded Unicode keysyms.
    pub const UNICODE_OFFSET: u32 = 0x0100_0000;
}

/// Evdev keycodes used when forwarding synthesized chords.
///
/// These are X keycodes minus the 8-code offset the bus expects.
pub mod keycode {
    /// BackSpace.
    pub const BACKSPACE: u32 = 22 - 8;
    /// Left arrow.
    pub const LEFT: u32 = 113 - 8;
}

bitflags! {
    /// Modifier state of a key event.
    ///
    /// Bit positions follow the X11 / IBus modifier mask so states can be
    /// passed through from a bus without translation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyState: u32 {
        /// Shift held.
        const SHIFT = 1 << 0;
        /// Caps Lock active.
        const LOCK = 1 << 1;
        /// Control held.
        const CONTROL = 1 << 2;
        /// Alt held.
        const MOD1 = 1 << 3;
        /// Num Lock active.
        const MOD2 = 1 << 4;
        /// Windows/Super on most layouts.
        const MOD4 = 1 << 6;
        /// Super held.
        const SUPER = 1 << 26;
        /// Hyper held.
        const HYPER = 1 << 27;
        /// Meta held.
        const META = 1 << 28;
        /// Key release rather than press.
        const RELEASE = 1 << 30;
    }
}

impl KeyState {
    /// Modifiers that turn a key into a shortcut rather than text input.
    pub const SHORTCUT: Self = Self::CONTROL
        .union(Self::MOD1)
        .union(Self::MOD4)
        .union(Self::SUPER)
        .union(Self::HYPER)
        .union(Self::META);
}

/// A single key event, as queued and replayed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// Keysym.
    pub keyval: u32,
    /// Hardware keycode.
    pub keycode: u32,
    /// Modifier state.
    pub state: KeyState,
}

impl KeyEvent {
    /// Create a key event.
    pub const fn new(keyval: u32, keycode: u32, state: KeyState) -> Self {
        Self { keyval, keycode, state }
    }

    /// A key press for a printable character with no modifiers.
    pub fn from_char(c: char) -> Self {
        Self::new(char_to_keyval(c), 0, KeyState::empty())
    }

    /// A key press for a keysym with no modifiers.
    pub const fn from_keyval(keyval: u32) -> Self {
        Self::new(keyval, 0, KeyState::empty())
    }

    /// Return a copy with the given modifier state.
    #[must_use]
    pub const fn with_state(mut self, state: KeyState) -> Self {
        self.state = state;
        self
    }

    /// Whether this is a key release.
    pub const fn is_release(&self) -> bool {
        self.state.contains(KeyState::RELEASE)
    }

    /// The rune this key types, if it is printable.
    pub fn to_char(&self) -> Option<char> {
        keysym_to_char(self.keyval)
    }
}

/// Encode a rune as a keysym.
///
/// Latin-1 maps onto itself; everything else uses the Unicode keysym range.
pub fn char_to_keyval(c: char) -> u32 {
    let cp = u32::from(c);
    if (0x20..0x7f).contains(&cp) || (0xa0..=0xff).contains(&cp) {
        cp
    } else {
        keysym::UNICODE_OFFSET | cp
    }
}
