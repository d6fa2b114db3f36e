//! Test fixtures shared by the unit tests.

use crate::compose::{ComposeMode, Composer};
use std::collections::HashMap;

const VOWELS: &[char] = &['a', 'ă', 'â', 'e', 'ê', 'i', 'o', 'ô', 'ơ', 'u', 'ư', 'y'];
const MARKED: &[char] = &['ă', 'â', 'ê', 'ô', 'ơ', 'ư'];
const ACUTE: &[char] = &['á', 'ắ', 'ấ', 'é', 'ế', 'í', 'ó', 'ố', 'ớ', 'ú', 'ứ', 'ý'];
const GRAVE: &[char] = &['à', 'ằ', 'ầ', 'è', 'ề', 'ì', 'ò', 'ồ', 'ờ', 'ù', 'ừ', 'ỳ'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Acute,
    Grave,
}

fn is_vowel(c: char) -> bool {
    c.to_lowercase().any(|l| VOWELS.contains(&l))
}

fn with_tone(c: char, tone: Tone) -> char {
    let lower = c.to_lowercase().next().unwrap_or(c);
    let Some(i) = VOWELS.iter().position(|&v| v == lower) else { return c };
    let toned = match tone {
        Tone::Acute => ACUTE[i],
        Tone::Grave => GRAVE[i],
    };
    if c.is_uppercase() {
        toned.to_uppercase().next().unwrap_or(toned)
    } else {
        toned
    }
}

/// Compose raw Telex-style keys: `aa ee oo dd` double, `w` hooks, `s`/`f`
/// set acute/grave.
fn compose(raw: &[char]) -> String {
    let mut out: Vec<char> = Vec::new();
    let mut tone = None;
    for &k in raw {
        let last = out.last().map(|c| c.to_lowercase().next().unwrap_or(*c));
        let merged = match (last, k.to_ascii_lowercase()) {
            (Some('a'), 'a') => Some('â'),
            (Some('e'), 'e') => Some('ê'),
            (Some('o'), 'o') => Some('ô'),
            (Some('d'), 'd') => Some('đ'),
            (Some('a'), 'w') => Some('ă'),
            (Some('o'), 'w') => Some('ơ'),
            (Some('u'), 'w') => Some('ư'),
            _ => None,
        };
        let has_vowel = out.iter().any(|&c| is_vowel(c));
        match (merged, k.to_ascii_lowercase()) {
            (Some(m), _) => {
                let prev = out.pop().unwrap();
                out.push(if prev.is_uppercase() { m.to_uppercase().next().unwrap() } else { m });
            }
            (None, 's') if has_vowel => tone = Some(Tone::Acute),
            (None, 'f') if has_vowel => tone = Some(Tone::Grave),
            _ => out.push(k),
        }
    }

    if let Some(tone) = tone {
        let target = out
            .iter()
            .rposition(|c| c.to_lowercase().any(|l| MARKED.contains(&l)))
            .or_else(|| {
                let last = out.iter().rposition(|&c| is_vowel(c))?;
                let first = (0..=last).rev().take_while(|&i| is_vowel(out[i])).last()?;
                let word_final = last + 1 == out.len();
                Some(if word_final && last > first { first } else { last })
            });
        if let Some(i) = target {
            out[i] = with_tone(out[i], tone);
        }
    }
    out.into_iter().collect()
}

/// A tiny Telex-like composer.
///
/// Removing the last char drops the last raw key, so removing a tone key
/// rewrites an earlier rune.
#[derive(Debug, Default, Clone)]
pub struct MiniTelex {
    raw: Vec<char>,
    english: bool,
    macros: HashMap<String, String>,
}

impl MiniTelex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_macro(mut self, from: &str, to: &str) -> Self {
        self.macros.insert(from.to_string(), to.to_string());
        self
    }
}

impl Composer for MiniTelex {
    fn process_key(&mut self, key: char, mode: ComposeMode) {
        if mode == ComposeMode::English {
            self.english = true;
        }
        self.raw.push(key);
    }

    fn remove_last_char(&mut self, _restore: bool) {
        self.raw.pop();
    }

    fn restore_last_word(&mut self, native: bool) {
        self.english = !native;
    }

    fn reset(&mut self) {
        self.raw.clear();
        self.english = false;
    }

    fn composed_text(&self) -> String {
        if self.english {
            self.raw.iter().collect()
        } else {
            compose(&self.raw)
        }
    }

    fn raw_key_len(&self) -> usize {
        self.raw.len()
    }

    fn appending_keys(&self) -> &[char] {
        &['s', 'f', 'w']
    }

    fn is_valid_word(&self) -> bool {
        !self.composed_text().chars().any(|c| matches!(c.to_ascii_lowercase(), 'f' | 'j' | 'w' | 'z'))
    }

    fn can_process_key(&self, key: char) -> bool {
        key.is_ascii_alphabetic()
    }

    fn alternate_text(&self) -> Option<String> {
        self.macros.get(&self.composed_text()).cloned()
    }
}

#[test]
fn test_mini_telex_rules() {
    let run = |keys: &str| {
        let mut c = MiniTelex::new();
        keys.chars().for_each(|k| c.process_key(k, ComposeMode::Native));
        c.composed_text()
    };
    assert_eq!(run("toi"), "toi");
    assert_eq!(run("tooi"), "tôi");
    assert_eq!(run("tois"), "tói");
    assert_eq!(run("toois"), "tối");
    assert_eq!(run("dduowngf"), "đuờng");
    assert_eq!(run("vieetj"), "viêtj");
    assert_eq!(run("sao"), "sao");
    assert_eq!(run("TOO"), "TÔ");
}

#[test]
fn test_mini_telex_validity_and_restore() {
    let mut c = MiniTelex::new();
    "vieetjs".chars().for_each(|k| c.process_key(k, ComposeMode::Native));
    assert!(!c.is_valid_word());

    c.restore_last_word(false);
    assert_eq!(c.composed_text(), "vieetjs");

    c.reset();
    "tooi".chars().for_each(|k| c.process_key(k, ComposeMode::Native));
    assert!(c.is_valid_word());
}
