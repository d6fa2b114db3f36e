//! Composition collaborators.
//!
//! The composition engine and the key classifier are supplied by the
//! embedding input method. This module defines the interfaces the
//! reconciler needs from them, plus a classifier for X11 keysyms.

mod classify;
mod traits;

pub use classify::{is_valid_state, DefaultClassifier, KeyClass, KeyClassifier};
pub use traits::{ComposeMode, Composer};
