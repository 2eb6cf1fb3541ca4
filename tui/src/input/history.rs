use std::collections::VecDeque;

/// Shell-style command history driven by Up/Down.
///
/// Entries are kept newest first and live only as long as the session. The
/// cursor indexes into `entries`; `None` means the user is not browsing and
/// the edit buffer holds their own draft.
#[derive(Debug, Default)]
pub struct CommandHistory {
    entries: VecDeque<String>,
    cursor: Option<usize>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submitted command. Blank commands are ignored; everything
    /// else is kept verbatim, repeats included. Returns whether the command
    /// was recorded.
    pub fn record(&mut self, command: &str) -> bool {
        if command.trim().is_empty() {
            return false;
        }

        self.entries.push_front(command.to_string());
        self.cursor = None;
        true
    }

    /// Handle <Up>: step to the next older entry.
    ///
    /// Returns `None` when already at the oldest entry (or the history is
    /// empty); the caller leaves its draft untouched in that case.
    pub fn back(&mut self) -> Option<String> {
        let next = self.cursor.map_or(0, |idx| idx + 1);
        let entry = self.entries.get(next)?;
        self.cursor = Some(next);
        Some(entry.clone())
    }

    /// Handle <Down>: step to the next newer entry.
    ///
    /// Moving past the newest entry leaves browsing mode and yields an empty
    /// string so the caller clears its buffer. When not browsing this is a
    /// no-op and returns `None`.
    pub fn forward(&mut self) -> Option<String> {
        match self.cursor? {
            0 => {
                self.cursor = None;
                Some(String::new())
            }
            idx => {
                let next = idx - 1;
                self.cursor = Some(next);
                self.entries.get(next).cloned()
            }
        }
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}
