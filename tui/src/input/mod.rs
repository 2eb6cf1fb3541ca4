//! Live edit buffer and key handling for the active prompt.

mod history;
mod word_boundary;

pub use history::CommandHistory;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use unicode_segmentation::UnicodeSegmentation;

use crate::transcript::LiveRegion;
use crate::transcript::Transcript;

/// What a key did to the edit buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// Enter was pressed; carries the captured buffer. The buffer and live
    /// region are already cleared.
    Submit(String),
    /// The key was consumed (buffer possibly unchanged).
    Handled,
    /// The controller is disarmed or the key has no binding.
    Ignored,
}

#[derive(Debug)]
enum InputState {
    Armed(LiveRegion),
    /// A request is in flight; keystrokes are dropped until re-armed.
    Disabled,
}

/// Owns the edit buffer and mirrors it into the live region of the newest prompt.
#[derive(Debug)]
pub struct InputController {
    buffer: String,
    /// Byte offset of the edit cursor, always on a grapheme boundary.
    cursor: usize,
    state: InputState,
}

impl Default for InputController {
    fn default() -> Self {
        Self::new()
    }
}

impl InputController {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            state: InputState::Disabled,
        }
    }

    /// Take ownership of a fresh live region and start accepting keys.
    pub fn arm(&mut self, region: LiveRegion, transcript: &mut Transcript) {
        self.state = InputState::Armed(region);
        self.mirror(transcript);
    }

    /// Stop accepting keys until the next [`InputController::arm`].
    pub fn disarm(&mut self) {
        self.state = InputState::Disabled;
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, InputState::Armed(_))
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn handle_key(
        &mut self,
        key_event: KeyEvent,
        history: &mut CommandHistory,
        transcript: &mut Transcript,
    ) -> InputOutcome {
        if key_event.kind == KeyEventKind::Release || !self.is_armed() {
            return InputOutcome::Ignored;
        }

        let outcome = match key_event {
            KeyEvent {
                code: KeyCode::Enter,
                ..
            } => {
                let command = std::mem::take(&mut self.buffer);
                self.cursor = 0;
                InputOutcome::Submit(command)
            }
            KeyEvent {
                code: KeyCode::Up, ..
            } => {
                if let Some(entry) = history.back() {
                    self.set_buffer(entry);
                }
                InputOutcome::Handled
            }
            KeyEvent {
                code: KeyCode::Down,
                ..
            } => {
                if let Some(entry) = history.forward() {
                    self.set_buffer(entry);
                }
                InputOutcome::Handled
            }
            KeyEvent {
                code: KeyCode::Char(ch),
                modifiers,
                ..
            } if modifiers.contains(KeyModifiers::CONTROL) => self.handle_control_char(ch),
            KeyEvent {
                code: KeyCode::Char(ch),
                modifiers,
                ..
            } if modifiers.contains(KeyModifiers::ALT) => match ch {
                'b' => self.move_cursor_to(word_boundary::beginning_of_previous_word(
                    &self.buffer,
                    self.cursor,
                )),
                'f' => self.move_cursor_to(word_boundary::end_of_next_word(
                    &self.buffer,
                    self.cursor,
                )),
                _ => InputOutcome::Ignored,
            },
            KeyEvent {
                code: KeyCode::Char(ch),
                ..
            } => {
                self.insert_str(ch.encode_utf8(&mut [0; 4]));
                InputOutcome::Handled
            }
            KeyEvent {
                code: KeyCode::Backspace,
                ..
            } => {
                let start = self.prev_boundary();
                self.buffer.replace_range(start..self.cursor, "");
                self.cursor = start;
                InputOutcome::Handled
            }
            KeyEvent {
                code: KeyCode::Delete,
                ..
            } => {
                let end = self.next_boundary();
                self.buffer.replace_range(self.cursor..end, "");
                InputOutcome::Handled
            }
            KeyEvent {
                code: KeyCode::Left,
                ..
            } => self.move_cursor_to(self.prev_boundary()),
            KeyEvent {
                code: KeyCode::Right,
                ..
            } => self.move_cursor_to(self.next_boundary()),
            KeyEvent {
                code: KeyCode::Home,
                ..
            } => self.move_cursor_to(0),
            KeyEvent {
                code: KeyCode::End, ..
            } => self.move_cursor_to(self.buffer.len()),
            _ => InputOutcome::Ignored,
        };

        // Re-sync on every key, not only on the ones that edited the buffer.
        self.mirror(transcript);
        outcome
    }

    /// Insert pasted text at the cursor. The prompt is a single line, so line
    /// breaks are dropped.
    pub fn handle_paste(&mut self, pasted: &str, transcript: &mut Transcript) -> InputOutcome {
        if !self.is_armed() {
            return InputOutcome::Ignored;
        }
        let single_line: String = pasted
            .chars()
            .filter(|ch| !matches!(ch, '\r' | '\n'))
            .collect();
        self.insert_str(&single_line);
        self.mirror(transcript);
        InputOutcome::Handled
    }

    fn handle_control_char(&mut self, ch: char) -> InputOutcome {
        match ch {
            'a' => self.move_cursor_to(0),
            'e' => self.move_cursor_to(self.buffer.len()),
            'b' => self.move_cursor_to(self.prev_boundary()),
            'f' => self.move_cursor_to(self.next_boundary()),
            'u' => {
                self.buffer.replace_range(..self.cursor, "");
                self.cursor = 0;
                InputOutcome::Handled
            }
            'k' => {
                self.buffer.truncate(self.cursor);
                InputOutcome::Handled
            }
            'w' => {
                let start = word_boundary::beginning_of_previous_word(&self.buffer, self.cursor);
                self.buffer.replace_range(start..self.cursor, "");
                self.cursor = start;
                InputOutcome::Handled
            }
            _ => InputOutcome::Ignored,
        }
    }

    fn set_buffer(&mut self, text: String) {
        self.buffer = text;
        self.cursor = self.buffer.len();
    }

    fn insert_str(&mut self, text: &str) {
        self.buffer.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    fn move_cursor_to(&mut self, pos: usize) -> InputOutcome {
        self.cursor = pos.min(self.buffer.len());
        InputOutcome::Handled
    }

    fn prev_boundary(&self) -> usize {
        self.buffer[..self.cursor]
            .grapheme_indices(true)
            .next_back()
            .map_or(0, |(idx, _)| idx)
    }

    fn next_boundary(&self) -> usize {
        self.buffer[self.cursor..]
            .graphemes(true)
            .next()
            .map_or(self.cursor, |grapheme| self.cursor + grapheme.len())
    }

    fn mirror(&self, transcript: &mut Transcript) {
        if let InputState::Armed(region) = &self.state
            && !transcript.set_live_text(region, &self.buffer)
        {
            tracing::debug!("live region retired before the input controller was re-armed");
        }
    }
}
