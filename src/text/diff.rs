//! Diffing Engine: Minimal suffix replacement between two texts.
//!
//! Consumers of an input method have no cursor addressing: the only edit
//! they support is "delete N runes before the cursor, then append". The
//! diff is therefore a longest-common-prefix diff:
//! 1. Walk both rune sequences while they agree
//! 2. Everything after that point in `old` is deleted
//! 3. Everything after that point in `new` is inserted
//!
//! A matching suffix is never reused.

/// A suffix replacement turning one text into another.
///
/// `deletion_count` always equals `len(old) - retained_prefix_len`, and
/// `inserted` is `new[retained_prefix_len..]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Edit {
    /// Number of leading runes shared by both texts.
    pub retained_prefix_len: usize,
    /// Runes to delete from the end of the old text.
    pub deletion_count: usize,
    /// Runes to append after the deletions.
    pub inserted: Vec<char>,
}

impl Edit {
    /// Check if applying this edit changes nothing.
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.deletion_count == 0 && self.inserted.is_empty()
    }

    /// The inserted runes as a string.
    pub fn inserted_text(&self) -> String {
        self.inserted.iter().collect()
    }

    /// Apply the edit to `old`, returning the resulting runes.
    ///
    /// Used to check a diff against its inputs; the engine itself never
    /// applies edits locally.
    pub fn apply(&self, old: &[char]) -> Vec<char> {
        let keep = old.len().saturating_sub(self.deletion_count);
        let mut out = Vec::with_capacity(keep + self.inserted.len());
        out.extend_from_slice(&old[..keep]);
        out.extend_from_slice(&self.inserted);
        out
    }
}

/// Length of the longest common prefix of two rune slices.
#[inline]
pub fn common_prefix_len(old: &[char], new: &[char]) -> usize {
    old.iter().zip(new).take_while(|(a, b)| a == b).count()
}

/// Compute the suffix replacement from `old` to `new`.
///
/// # Example
///
/// ```
/// use backtype::text::diff;
///
/// let old: Vec<char> = "toi".chars().collect();
/// let new: Vec<char> = "tôi".chars().collect();
/// let edit = diff(&old, &new);
/// assert_eq!(edit.retained_prefix_len, 1);
/// assert_eq!(edit.deletion_count, 2);
/// assert_eq!(edit.inserted_text(), "ôi");
/// ```
pub fn diff(old: &[char], new: &[char]) -> Edit {
    let retained_prefix_len = common_prefix_len(old, new);
    Edit {
        retained_prefix_len,
        deletion_count: old.len() - retained_prefix_len,
        inserted: new[retained_prefix_len..].to_vec(),
    }
}

/// Convenience wrapper over [`diff`] for string inputs.
pub fn diff_str(old: &str, new: &str) -> Edit {
    let old: Vec<char> = old.chars().collect();
    let new: Vec<char> = new.chars().collect();
    diff(&old, &new)
}
