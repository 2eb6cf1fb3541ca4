use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use webpi_protocol::LineKind;

/// `user@host` portion of a prompt.
pub fn prompt_label_style() -> Style {
    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
}

/// `:path$ ` portion of a prompt.
pub fn prompt_path_style() -> Style {
    Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
}

/// Body text of a line, after any prompt prefix.
pub fn body_style(kind: LineKind) -> Style {
    match kind {
        LineKind::Prompt | LineKind::CommandEcho | LineKind::Output => Style::default(),
        LineKind::Error => Style::default().fg(Color::Red),
    }
}

pub fn footer_style() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}
