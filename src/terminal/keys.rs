//! Terminal key input: crossterm key events as engine [`KeyEvent`]s.

use crate::actor::{char_to_keyval, keycode, keysym, KeyEvent, KeyState};
use crossterm::event::{self, KeyEventKind, KeyEventState};

/// Convert a crossterm key event.
///
/// Returns `None` for keys the engine has no keysym for (media keys,
/// modifier-only presses and the like).
pub fn convert_key_event(key: event::KeyEvent) -> Option<KeyEvent> {
    let (keyval, code) = convert_key_code(key.code)?;
    let mut state = convert_modifiers(key.modifiers);
    if key.state.contains(KeyEventState::CAPS_LOCK) {
        state |= KeyState::LOCK;
    }
    if key.kind == KeyEventKind::Release {
        state |= KeyState::RELEASE;
    }
    Some(KeyEvent::new(keyval, code, state))
}

/// Keysym and hardware keycode for a crossterm key code.
fn convert_key_code(code: event::KeyCode) -> Option<(u32, u32)> {
    let keyval = match code {
        event::KeyCode::Char(c) => char_to_keyval(c),
        event::KeyCode::F(n @ 1..=12) => keysym::F1 + u32::from(n) - 1,
        event::KeyCode::Backspace => return Some((keysym::BACKSPACE, keycode::BACKSPACE)),
        event::KeyCode::Left => return Some((keysym::LEFT, keycode::LEFT)),
        event::KeyCode::Enter => keysym::RETURN,
        event::KeyCode::Right => keysym::RIGHT,
        event::KeyCode::Up => keysym::UP,
        event::KeyCode::Down => keysym::DOWN,
        event::KeyCode::Home => keysym::HOME,
        event::KeyCode::End => keysym::END,
        event::KeyCode::PageUp => keysym::PAGE_UP,
        event::KeyCode::PageDown => keysym::PAGE_DOWN,
        event::KeyCode::Tab => keysym::TAB,
        event::KeyCode::Delete => keysym::DELETE,
        event::KeyCode::Insert => keysym::INSERT,
        event::KeyCode::Esc => keysym::ESCAPE,
        _ => return None,
    };
    Some((keyval, 0))
}

fn convert_modifiers(mods: event::KeyModifiers) -> KeyState {
    let mut state = KeyState::empty();
    for (from, to) in [
        (event::KeyModifiers::SHIFT, KeyState::SHIFT),
        (event::KeyModifiers::CONTROL, KeyState::CONTROL),
        (event::KeyModifiers::ALT, KeyState::MOD1),
        (event::KeyModifiers::SUPER, KeyState::SUPER),
        (event::KeyModifiers::HYPER, KeyState::HYPER),
        (event::KeyModifiers::META, KeyState::META),
    ] {
        if mods.contains(from) {
            state |= to;
        }
    }
    state
}
