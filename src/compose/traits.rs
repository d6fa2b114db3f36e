//! Composer trait: The composition engine seen from the reconciler.
//!
//! The composer turns logical keystrokes into the composed text of the
//! word being typed. Its rules are opaque here; the reconciler only reads
//! its output and tells it when keys are added, removed, or the word ends.

/// Whether keys are composed or passed through as typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComposeMode {
    /// Apply the composition rules.
    #[default]
    Native,
    /// Append keys verbatim.
    English,
}

/// A composition engine.
pub trait Composer: Send {
    /// Feed one rune.
    fn process_key(&mut self, key: char, mode: ComposeMode);

    /// Drop the last logical character.
    ///
    /// With `restore` set the composer may also restore the raw keys of a
    /// word that no longer composes, which can change earlier runes.
    fn remove_last_char(&mut self, restore: bool);

    /// Replace the current word with its raw keystrokes.
    fn restore_last_word(&mut self, native: bool);

    /// Forget the current word.
    fn reset(&mut self);

    /// Composed text of the current word.
    fn composed_text(&self) -> String;

    /// Number of raw keys fed into the current word.
    fn raw_key_len(&self) -> usize;

    /// Keys that only make sense appended to an existing word (tone marks,
    /// modifier keys of the input method).
    fn appending_keys(&self) -> &[char];

    /// Whether the current word is spelled correctly in the composed
    /// language. Words that are not can be given back as typed on
    /// backspace.
    fn is_valid_word(&self) -> bool {
        true
    }

    /// Whether `key` takes part in composition.
    fn can_process_key(&self, key: char) -> bool;

    /// Alternate text offered for the current word (a macro expansion or
    /// candidate), accepted with Tab.
    fn alternate_text(&self) -> Option<String> {
        None
    }
}
