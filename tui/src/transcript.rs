//! Append-only log of everything the terminal has shown.
//!
//! The transcript holds static [`TranscriptLine`]s plus at most one live
//! prompt: the prompt whose trailing region mirrors the edit buffer while the
//! user types. [`Transcript::append_prompt`] hands out an owned
//! [`LiveRegion`] for that prompt; appending the next prompt freezes the live
//! text into a static line and invalidates the old handle.

use webpi_protocol::LineKind;

/// `user@host` shown in front of every prompt unless configured otherwise.
pub const DEFAULT_PROMPT_LABEL: &str = "pi@webpi";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    text: String,
    kind: LineKind,
    /// Byte length of the `label:path$ ` prefix for prompt and echo lines.
    prompt_len: usize,
}

impl TranscriptLine {
    pub fn new(text: impl Into<String>, kind: LineKind) -> Self {
        Self {
            text: text.into(),
            kind,
            prompt_len: 0,
        }
    }

    fn prompted(prefix: &str, rest: &str, kind: LineKind) -> Self {
        Self {
            text: format!("{prefix}{rest}"),
            kind,
            prompt_len: prefix.len(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    /// Splits the line into its `label:path$ ` prefix and the remainder.
    pub fn split_prompt(&self) -> (&str, &str) {
        self.text.split_at(self.prompt_len)
    }
}

/// Owned handle to the single editable region of the newest prompt.
///
/// Deliberately not `Clone`: whoever holds it is the only writer of the live
/// text. Once a newer prompt is appended the handle goes stale and writes
/// through it are rejected.
#[derive(Debug, PartialEq, Eq)]
pub struct LiveRegion {
    id: u64,
}

#[derive(Debug)]
enum Entry {
    Static(TranscriptLine),
    Live(LivePrompt),
}

#[derive(Debug)]
struct LivePrompt {
    id: u64,
    prefix: String,
    text: String,
}

impl LivePrompt {
    fn freeze(self) -> TranscriptLine {
        TranscriptLine::prompted(&self.prefix, &self.text, LineKind::Prompt)
    }
}

/// Borrowed view of one transcript entry, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryView<'a> {
    Static(&'a TranscriptLine),
    Live { prefix: &'a str, text: &'a str },
}

#[derive(Debug)]
pub struct Transcript {
    label: String,
    entries: Vec<Entry>,
    live_index: Option<usize>,
    next_live_id: u64,
    /// Rows scrolled up from the bottom. Zero means the view follows the newest line.
    scroll_offset: usize,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT_LABEL)
    }
}

impl Transcript {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: Vec::new(),
            live_index: None,
            next_live_id: 0,
            scroll_offset: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// `label:path$ `, the text that precedes both live prompts and echoed commands.
    pub fn prompt_prefix(&self, path: &str) -> String {
        format!("{}:{path}$ ", self.label)
    }

    /// Append a static line and jump back to the bottom of the log.
    pub fn append(&mut self, text: impl Into<String>, kind: LineKind) {
        self.push(Entry::Static(TranscriptLine::new(text, kind)));
    }

    /// Echo a submitted command the way it looked at the prompt.
    pub fn append_command_echo(&mut self, path: &str, command: &str) {
        let prefix = self.prompt_prefix(path);
        self.push(Entry::Static(TranscriptLine::prompted(
            &prefix,
            command,
            LineKind::CommandEcho,
        )));
    }

    /// Append a fresh prompt for `path` and return the handle of its live region.
    ///
    /// Any previous live region is retired first, so there is never more than one.
    pub fn append_prompt(&mut self, path: &str) -> LiveRegion {
        self.retire_live_region();

        let id = self.next_live_id;
        self.next_live_id += 1;
        self.live_index = Some(self.entries.len());
        let prefix = self.prompt_prefix(path);
        self.push(Entry::Live(LivePrompt {
            id,
            prefix,
            text: String::new(),
        }));
        LiveRegion { id }
    }

    /// Replace the text of the live region. Returns `false` if `region` has
    /// been retired.
    pub fn set_live_text(&mut self, region: &LiveRegion, text: &str) -> bool {
        let Some(live) = self.live_prompt_mut(region) else {
            return false;
        };
        if live.text != text {
            live.text.clear();
            live.text.push_str(text);
        }
        true
    }

    pub fn is_current(&self, region: &LiveRegion) -> bool {
        self.live_index
            .and_then(|idx| self.entries.get(idx))
            .is_some_and(|entry| matches!(entry, Entry::Live(live) if live.id == region.id))
    }

    /// Drop every line, including the live region.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.live_index = None;
        self.scroll_offset = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = EntryView<'_>> {
        self.entries.iter().map(|entry| match entry {
            Entry::Static(line) => EntryView::Static(line),
            Entry::Live(live) => EntryView::Live {
                prefix: &live.prefix,
                text: &live.text,
            },
        })
    }

    /// All lines as they currently read, with the live prompt rendered as a
    /// prompt line holding its current text.
    pub fn snapshot(&self) -> Vec<TranscriptLine> {
        self.entries
            .iter()
            .map(|entry| match entry {
                Entry::Static(line) => line.clone(),
                Entry::Live(live) => {
                    TranscriptLine::prompted(&live.prefix, &live.text, LineKind::Prompt)
                }
            })
            .collect()
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(rows);
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(rows);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    /// Called by the renderer once it knows how far up the log can actually go.
    pub(crate) fn clamp_scroll(&mut self, max_offset: usize) {
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }

    fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
        self.scroll_to_bottom();
    }

    fn retire_live_region(&mut self) {
        let Some(idx) = self.live_index.take() else {
            return;
        };
        let Some(slot) = self.entries.get_mut(idx) else {
            return;
        };
        let placeholder = Entry::Static(TranscriptLine::new(String::new(), LineKind::Prompt));
        if let Entry::Live(live) = std::mem::replace(slot, placeholder) {
            *slot = Entry::Static(live.freeze());
        }
    }

    fn live_prompt_mut(&mut self, region: &LiveRegion) -> Option<&mut LivePrompt> {
        let idx = self.live_index?;
        match self.entries.get_mut(idx)? {
            Entry::Live(live) if live.id == region.id => Some(live),
            _ => None,
        }
    }
}
