//! `TerminalTransport`: Realizes consumer operations on a terminal line.
//!
//! The transport keeps its own copy of the line being edited, since a
//! terminal cannot be asked what it shows. Each operation is rendered
//! into a scratch buffer of ANSI sequences and handed to the writer in a
//! single `write()` to avoid flicker.

use crate::actor::{keysym, KeyEvent, KeyState};
use crate::emit::Transport;
use crate::error::TransportError;
use crossterm::cursor::{MoveLeft, MoveRight};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Write};
use unicode_width::UnicodeWidthChar;

/// Display width of a run of runes.
fn width(runes: &[char]) -> usize {
    runes.iter().map(|c| c.width().unwrap_or(0)).sum()
}

fn columns(width: usize) -> u16 {
    u16::try_from(width).unwrap_or(u16::MAX)
}

/// A consumer that is a single line of a terminal.
///
/// Shift+Left grows a logical selection (not highlighted) that the next
/// insertion or deletion replaces. Return ends the line.
pub struct TerminalTransport<W: Write> {
    writer: W,
    /// Scratch buffer for one operation.
    out: Vec<u8>,
    line: Vec<char>,
    /// Cursor position as a rune index into `line`.
    cursor: usize,
    /// Runes selected to the left of the cursor.
    selected: usize,
}

impl<W: Write> TerminalTransport<W> {
    /// Create a transport writing to `writer`, starting on an empty line.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            out: Vec::with_capacity(256),
            line: Vec::new(),
            cursor: 0,
            selected: 0,
        }
    }

    /// The line as the transport believes it is shown.
    pub fn line(&self) -> String {
        self.line.iter().collect()
    }

    /// Cursor position as a rune index.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Get a reference to the writer.
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// Consume the transport, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Send the scratch buffer in one write.
    fn flush(&mut self) -> io::Result<()> {
        if self.out.is_empty() {
            return Ok(());
        }
        let result = self.writer.write_all(&self.out).and_then(|()| self.writer.flush());
        self.out.clear();
        result
    }

    /// Redraw everything from the cursor to the end of the line and put
    /// the cursor back.
    fn redraw_tail(&mut self) -> io::Result<()> {
        let tail: String = self.line[self.cursor..].iter().collect();
        queue!(self.out, Print(&tail), Clear(ClearType::UntilNewLine))?;
        let back = width(&self.line[self.cursor..]);
        if back > 0 {
            queue!(self.out, MoveLeft(columns(back)))?;
        }
        Ok(())
    }

    fn delete_back(&mut self, count: usize) -> io::Result<()> {
        let count = if self.selected > 0 {
            std::mem::take(&mut self.selected)
        } else {
            count
        };
        let start = self.cursor.saturating_sub(count);
        if start == self.cursor {
            return Ok(());
        }

        let removed = width(&self.line[start..self.cursor]);
        self.line.drain(start..self.cursor);
        self.cursor = start;
        if removed > 0 {
            queue!(self.out, MoveLeft(columns(removed)))?;
        }
        self.redraw_tail()?;
        self.flush()
    }

    fn insert(&mut self, runes: &[char]) -> io::Result<()> {
        if self.selected > 0 {
            self.delete_back(0)?;
        }
        self.line.splice(self.cursor..self.cursor, runes.iter().copied());
        let text: String = runes.iter().collect();
        queue!(self.out, Print(text))?;
        self.cursor += runes.len();
        if self.cursor < self.line.len() {
            self.redraw_tail()?;
        }
        self.flush()
    }

    fn move_cursor(&mut self, to: usize) -> io::Result<()> {
        self.selected = 0;
        let to = to.min(self.line.len());
        if to < self.cursor {
            let w = width(&self.line[to..self.cursor]);
            if w > 0 {
                queue!(self.out, MoveLeft(columns(w)))?;
            }
        } else if to > self.cursor {
            let w = width(&self.line[self.cursor..to]);
            if w > 0 {
                queue!(self.out, MoveRight(columns(w)))?;
            }
        }
        self.cursor = to;
        self.flush()
    }

    fn new_line(&mut self) -> io::Result<()> {
        self.out.extend_from_slice(b"\r\n");
        self.line.clear();
        self.cursor = 0;
        self.selected = 0;
        self.flush()
    }
}

impl<W: Write> std::fmt::Debug for TerminalTransport<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalTransport")
            .field("line", &self.line())
            .field("cursor", &self.cursor)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl<W: Write + Send> Transport for TerminalTransport<W> {
    fn inject_backspace(&mut self) -> Result<(), TransportError> {
        Ok(self.delete_back(1)?)
    }

    fn delete_surrounding_text(&mut self, offset: i32, count: u32) -> Result<(), TransportError> {
        if i64::from(offset) != -i64::from(count) {
            return Err(TransportError::Rejected(format!(
                "only deletion right before the cursor is supported (offset {offset}, count {count})"
            )));
        }
        Ok(self.delete_back(usize::try_from(count).unwrap_or(usize::MAX))?)
    }

    fn forward_key_event(&mut self, event: KeyEvent) -> Result<(), TransportError> {
        if event.is_release() {
            return Ok(());
        }
        match event.keyval {
            keysym::BACKSPACE => self.delete_back(1)?,
            keysym::LEFT if event.state.contains(KeyState::SHIFT) => {
                self.selected = (self.selected + 1).min(self.cursor);
            }
            keysym::LEFT => self.move_cursor(self.cursor.saturating_sub(1))?,
            keysym::RIGHT => self.move_cursor(self.cursor + 1)?,
            keysym::HOME => self.move_cursor(0)?,
            keysym::END => self.move_cursor(self.line.len())?,
            keysym::RETURN | keysym::KP_ENTER => self.new_line()?,
            _ => {
                if let Some(c) = event.to_char().filter(|_| !event.state.intersects(KeyState::SHORTCUT)) {
                    self.insert(&[c])?;
                }
            }
        }
        Ok(())
    }

    fn commit_text(&mut self, text: &str) -> Result<(), TransportError> {
        let runes: Vec<char> = text.chars().collect();
        Ok(self.insert(&runes)?)
    }
}
