//! Draws the transcript, the live prompt and a one-row footer.
//!
//! Lines are hard-wrapped per cell the way a real terminal wraps, so the row
//! holding the edit cursor can be computed exactly.

use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Position;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthChar;
use webpi_protocol::LineKind;

use crate::dispatcher::CommandExecutor;
use crate::dispatcher::PendingRequest;
use crate::style;
use crate::terminal_session::TerminalSession;
use crate::terminal_session::TerminalState;
use crate::transcript::EntryView;

const FOOTER_HINT: &str = "↑/↓ history · PgUp/PgDn scroll · ^L clear · ^C quit";

/// Draw a full frame for `session`, keeping its scroll offset in range.
pub(crate) fn draw_session<E: CommandExecutor>(
    frame: &mut Frame,
    session: &mut TerminalSession<E>,
) {
    let area = frame.area();
    let layout = TerminalLayout::new(area);
    session.set_viewport_rows(layout.transcript.height);

    let rows = transcript_rows(session.state(), layout.transcript.width);
    let max_offset = rows
        .lines
        .len()
        .saturating_sub(usize::from(layout.transcript.height));
    session.transcript_mut().clamp_scroll(max_offset);

    let view = TerminalView::new(session.state(), session.pending());
    if let Some(cursor) = view.render(area, frame.buffer_mut()) {
        frame.set_cursor_position(cursor);
    }
}

struct TerminalLayout {
    transcript: Rect,
    footer: Option<Rect>,
}

impl TerminalLayout {
    fn new(area: Rect) -> Self {
        if area.height < 2 {
            return Self {
                transcript: area,
                footer: None,
            };
        }
        let transcript = Rect::new(area.x, area.y, area.width, area.height - 1);
        let footer = Rect::new(area.x, area.bottom() - 1, area.width, 1);
        Self {
            transcript,
            footer: Some(footer),
        }
    }
}

pub(crate) struct TerminalView<'a> {
    state: &'a TerminalState,
    pending: Option<&'a PendingRequest>,
}

impl<'a> TerminalView<'a> {
    pub(crate) fn new(state: &'a TerminalState, pending: Option<&'a PendingRequest>) -> Self {
        Self { state, pending }
    }

    /// Render into `buf` and return where the terminal cursor belongs, if it
    /// should be shown at all.
    pub(crate) fn render(&self, area: Rect, buf: &mut Buffer) -> Option<Position> {
        let layout = TerminalLayout::new(area);
        let area = layout.transcript;
        let rows = transcript_rows(self.state, area.width);

        let height = usize::from(area.height);
        let total = rows.lines.len();
        let offset = self
            .state
            .transcript
            .scroll_offset()
            .min(total.saturating_sub(height));
        let start = total.saturating_sub(height).saturating_sub(offset);
        let end = (start + height).min(total);

        Paragraph::new(rows.lines[start..end].to_vec()).render(area, buf);

        if let Some(footer) = layout.footer {
            Paragraph::new(Line::from(self.footer_text()).style(style::footer_style()))
                .render(footer, buf);
        }

        let (row, col) = rows.cursor?;
        if row < start || row >= end {
            return None;
        }
        let y = area.y + u16::try_from(row - start).ok()?;
        let x = area.x + col;
        Some(Position::new(x, y))
    }

    fn footer_text(&self) -> String {
        if let Some(pending) = self.pending {
            return format!(
                "running `{}` · {}s",
                pending.command(),
                pending.elapsed().as_secs()
            );
        }
        match self.state.transcript.scroll_offset() {
            0 => FOOTER_HINT.to_string(),
            rows => format!("scrolled back {rows} rows · PgDn to return"),
        }
    }
}

struct TranscriptRows {
    lines: Vec<Line<'static>>,
    /// `(row, column)` of the edit cursor while the input controller is armed.
    cursor: Option<(usize, u16)>,
}

fn transcript_rows(state: &TerminalState, width: u16) -> TranscriptRows {
    let width = usize::from(width.max(1));
    let label = state.transcript.label();
    let mut lines = Vec::new();
    let mut cursor = None;

    for entry in state.transcript.entries() {
        match entry {
            EntryView::Static(line) => {
                let (prefix, body) = line.split_prompt();
                let body_style = style::body_style(line.kind());
                for (idx, logical) in body.split('\n').enumerate() {
                    let mut spans = if idx == 0 {
                        prompt_spans(prefix, label)
                    } else {
                        Vec::new()
                    };
                    spans.push(Span::styled(logical.to_string(), body_style));
                    lines.extend(wrap_spans(spans, width));
                }
            }
            EntryView::Live { prefix, text } => {
                let start_row = lines.len();
                let mut spans = prompt_spans(prefix, label);
                spans.push(Span::styled(
                    text.to_string(),
                    style::body_style(LineKind::Prompt),
                ));
                lines.extend(wrap_spans(spans, width));

                if state.input.is_armed() {
                    let split = state.input.cursor().min(text.len());
                    let (before, after) = text.split_at_checked(split).unwrap_or((text, ""));
                    let (row, col) = cursor_cell(
                        prefix.chars().chain(before.chars()),
                        after.chars().next(),
                        width,
                    );
                    let row = start_row + row;
                    if row >= lines.len() {
                        lines.push(Line::default());
                    }
                    cursor = Some((row, u16::try_from(col).unwrap_or(0)));
                }
            }
        }
    }

    TranscriptRows { lines, cursor }
}

fn prompt_spans(prefix: &str, label: &str) -> Vec<Span<'static>> {
    if prefix.is_empty() {
        return Vec::new();
    }
    match prefix.strip_prefix(label) {
        Some(rest) if !label.is_empty() => vec![
            Span::styled(label.to_string(), style::prompt_label_style()),
            Span::styled(rest.to_string(), style::prompt_path_style()),
        ],
        _ => vec![Span::styled(prefix.to_string(), style::prompt_path_style())],
    }
}

/// Row and column of the cursor after `before` is laid out the way
/// [`wrap_spans`] lays it out, with `next` being the character under the cursor.
fn cursor_cell(
    before: impl Iterator<Item = char>,
    next: Option<char>,
    width: usize,
) -> (usize, usize) {
    let mut row = 0;
    let mut col = 0;
    for ch in before {
        let ch_width = ch.width().unwrap_or(0);
        if col + ch_width > width && col > 0 {
            row += 1;
            col = 0;
        }
        col += ch_width;
    }

    // A full row, or a wide character that will not fit, starts the next row.
    let next_width = next.and_then(UnicodeWidthChar::width).unwrap_or(0);
    if col >= width || (col > 0 && col + next_width > width) {
        (row + 1, 0)
    } else {
        (row, col)
    }
}

/// Hard-wrap styled spans at `width` cells. Always yields at least one row.
fn wrap_spans(spans: Vec<Span<'static>>, width: usize) -> Vec<Line<'static>> {
    let mut rows: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0;

    for span in spans {
        let mut chunk = String::new();
        for ch in span.content.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if current_width + ch_width > width && current_width > 0 {
                if !chunk.is_empty() {
                    current.push(Span::styled(std::mem::take(&mut chunk), span.style));
                }
                rows.push(Line::from(std::mem::take(&mut current)));
                current_width = 0;
            }
            chunk.push(ch);
            current_width += ch_width;
        }
        if !chunk.is_empty() {
            current.push(Span::styled(chunk, span.style));
        }
    }

    if !current.is_empty() || rows.is_empty() {
        rows.push(Line::from(current));
    }
    rows
}
