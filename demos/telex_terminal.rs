//! Telex Terminal: Type Vietnamese into a terminal line through the engine.
//!
//! A toy Telex composer (`aa` → â, `dd` → đ, `ow` → ơ, `s`/`f` for the
//! acute/grave tone) drives the engine, and the terminal plays the focused
//! application. Pass an application class as the first argument to pick
//! its emission mode, e.g. `cargo run --example telex_terminal -- xterm`.
//!
//! Logs go to stderr: `RUST_LOG=backtype=debug ... 2>backtype.log`.
//! Press Escape or Ctrl+C to quit.

use backtype::{
    convert_key_event, ComposeMode, Composer, Engine, EngineConfig, KeyEvent, TerminalTransport, Transport,
    TransportError,
};
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::terminal;
use std::io::{self, Stdout};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const PLAIN: &str = "aăâeêioôơuưy";
const ACUTE: &str = "áắấéếíóốớúứý";
const GRAVE: &str = "àằầèềìòồờùừỳ";

/// Just enough Telex to see corrections happen.
#[derive(Default)]
struct ToyTelex {
    raw: Vec<char>,
}

impl ToyTelex {
    fn toned(c: char, tones: &str) -> Option<char> {
        let i = PLAIN.chars().position(|p| p == c)?;
        tones.chars().nth(i)
    }
}

impl Composer for ToyTelex {
    fn process_key(&mut self, key: char, _mode: ComposeMode) {
        self.raw.push(key);
    }

    fn remove_last_char(&mut self, _restore: bool) {
        self.raw.pop();
    }

    fn restore_last_word(&mut self, _native: bool) {}

    fn reset(&mut self) {
        self.raw.clear();
    }

    fn composed_text(&self) -> String {
        let mut out: Vec<char> = Vec::new();
        let mut tone = None;
        for &k in &self.raw {
            let merged = match (out.last(), k) {
                (Some('a'), 'a') => Some('â'),
                (Some('e'), 'e') => Some('ê'),
                (Some('o'), 'o') => Some('ô'),
                (Some('d'), 'd') => Some('đ'),
                (Some('a'), 'w') => Some('ă'),
                (Some('o'), 'w') => Some('ơ'),
                (Some('u'), 'w') => Some('ư'),
                _ => None,
            };
            let has_vowel = out.iter().any(|&c| PLAIN.contains(c));
            match (merged, k) {
                (Some(m), _) => {
                    out.pop();
                    out.push(m);
                }
                (None, 's') if has_vowel => tone = Some(ACUTE),
                (None, 'f') if has_vowel => tone = Some(GRAVE),
                _ => out.push(k),
            }
        }
        if let Some(tones) = tone {
            if let Some(i) = out.iter().rposition(|&c| PLAIN.contains(c)) {
                out[i] = Self::toned(out[i], tones).unwrap_or(out[i]);
            }
        }
        out.into_iter().collect()
    }

    fn raw_key_len(&self) -> usize {
        self.raw.len()
    }

    fn appending_keys(&self) -> &[char] {
        &['s', 'f', 'w']
    }

    fn can_process_key(&self, key: char) -> bool {
        key.is_ascii_lowercase()
    }
}

/// The terminal, shared between the engine and the host loop that
/// delivers keys the engine did not take.
#[derive(Clone)]
struct SharedTerminal(Arc<Mutex<TerminalTransport<Stdout>>>);

impl SharedTerminal {
    fn with<T>(&self, f: impl FnOnce(&mut TerminalTransport<Stdout>) -> T) -> T {
        f(&mut self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Transport for SharedTerminal {
    fn inject_backspace(&mut self) -> Result<(), TransportError> {
        self.with(|t| t.inject_backspace())
    }

    fn delete_surrounding_text(&mut self, offset: i32, count: u32) -> Result<(), TransportError> {
        self.with(|t| t.delete_surrounding_text(offset, count))
    }

    fn forward_key_event(&mut self, event: KeyEvent) -> Result<(), TransportError> {
        self.with(|t| t.forward_key_event(event))
    }

    fn commit_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.with(|t| t.commit_text(text))
    }
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let app_class = std::env::args().nth(1).unwrap_or_else(|| "xterm".to_string());

    println!("Backtype Telex Terminal");
    println!("=======================");
    println!("Consumer: {app_class}. Type Telex; Escape or Ctrl+C quits.\r");

    let mut host = SharedTerminal(Arc::new(Mutex::new(TerminalTransport::new(io::stdout()))));
    let engine = Engine::with_config(EngineConfig::default(), ToyTelex::default(), host.clone())?;
    if let Err(e) = engine.focus_app(&app_class) {
        eprintln!("{e}; keeping {}", engine.mode());
    }

    terminal::enable_raw_mode()?;
    let result = run(&engine, &mut host);
    terminal::disable_raw_mode()?;
    println!();

    engine.shutdown();
    result
}

fn run(engine: &Engine, host: &mut SharedTerminal) -> io::Result<()> {
    loop {
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(key) = event::read()? else { continue };
        let quit = key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL));
        if quit {
            return Ok(());
        }

        let Some(event) = convert_key_event(key) else { continue };
        if !engine.process_key_event(event) {
            // not taken: the "application" receives the key itself
            host.forward_key_event(event).map_err(io::Error::other)?;
        }
    }
}
