//! Symbol mapping for runes forwarded as key events.
//!
//! When a consumer only accepts key events, committed text has to be typed
//! out one keysym at a time. Latin-1 runes are their own keysyms. A few
//! Vietnamese letters have legacy Latin-2/3/4 keysyms that older toolkits
//! understand better than the Unicode range, so those are mapped explicitly.

use crate::actor::keysym::UNICODE_OFFSET;

/// Legacy keysyms for Vietnamese letters outside Latin-1.
const LEGACY_KEYSYMS: &[(char, u32)] = &[
    ('Ă', 0x01c3),
    ('ă', 0x01e3),
    ('Đ', 0x01d0),
    ('đ', 0x01f0),
    ('Ĩ', 0x03a5),
    ('ĩ', 0x03b5),
    ('Ũ', 0x03dd),
    ('ũ', 0x03fd),
];

/// Whether a rune belongs to the Vietnamese letters that need the Unicode
/// keysym range.
fn is_vietnamese_extended(c: char) -> bool {
    matches!(c, 'Ơ' | 'ơ' | 'Ư' | 'ư') || ('\u{1ea0}'..='\u{1ef9}').contains(&c)
}

/// Keysym used to forward `c` as a key press.
///
/// Runes without a mapping fall back to their raw code point.
pub fn symbol_keyval(c: char) -> u32 {
    if let Some(&(_, keyval)) = LEGACY_KEYSYMS.iter().find(|(ch, _)| *ch == c) {
        return keyval;
    }
    if is_vietnamese_extended(c) {
        return UNICODE_OFFSET | u32::from(c);
    }
    u32::from(c)
}

/// Rune typed by a keysym, if it is a printable one.
pub fn keysym_to_char(keyval: u32) -> Option<char> {
    match keyval {
        0x20..=0x7e | 0xa0..=0xff => char::from_u32(keyval),
        k if k & 0xff00_0000 == UNICODE_OFFSET => {
            char::from_u32(k - UNICODE_OFFSET).filter(|c| !c.is_control())
        }
        k => LEGACY_KEYSYMS.iter().find(|(_, sym)| *sym == k).map(|&(c, _)| c),
    }
}
