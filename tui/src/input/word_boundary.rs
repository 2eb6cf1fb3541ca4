//! Word-boundary helpers for word-wise cursor motion and deletion in the edit buffer.

use unicode_segmentation::UnicodeSegmentation;

/// Shell punctuation treated as word separators in addition to whitespace.
pub const WORD_SEPARATORS: &str = "`~!@#$%^&*()-=+[{]}\\|;:'\",.<>/?";

/// Return the byte index of the start of the previous word.
pub fn beginning_of_previous_word(text: &str, cursor_pos: usize) -> usize {
    let cursor_pos = clamp_pos_to_char_boundary(text, cursor_pos);
    text[..cursor_pos]
        .split_word_bound_indices()
        .rev()
        .find(|(_, segment)| is_word(segment))
        .map_or(0, |(start, _)| start)
}

/// Return the byte index of the end of the next word.
pub fn end_of_next_word(text: &str, cursor_pos: usize) -> usize {
    let cursor_pos = clamp_pos_to_char_boundary(text, cursor_pos);
    text[cursor_pos..]
        .split_word_bound_indices()
        .find(|(_, segment)| is_word(segment))
        .map_or(text.len(), |(start, segment)| {
            cursor_pos + start + segment.len()
        })
}

fn is_word(segment: &str) -> bool {
    segment
        .chars()
        .any(|ch| !ch.is_whitespace() && !WORD_SEPARATORS.contains(ch))
}

fn clamp_pos_to_char_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn previous_word_skips_trailing_whitespace_and_separators() {
        let text = "cd /tmp/logs  ";
        assert_eq!(beginning_of_previous_word(text, text.len()), 8);
        assert_eq!(beginning_of_previous_word(text, 8), 4);
        assert_eq!(beginning_of_previous_word(text, 4), 0);
        assert_eq!(beginning_of_previous_word(text, 0), 0);
    }

    #[test]
    fn next_word_stops_at_word_end() {
        let text = "cat  README.md";
        assert_eq!(end_of_next_word(text, 0), 3);
        // `README.md` is a single word segment.
        assert_eq!(end_of_next_word(text, 3), 14);
        assert_eq!(end_of_next_word(text, 14), 14);
    }

    #[test]
    fn positions_inside_multibyte_chars_are_clamped() {
        let text = "echo héllo";
        // Byte 7 falls inside `é`.
        assert_eq!(beginning_of_previous_word(text, 7), 5);
        assert_eq!(end_of_next_word(text, 100), text.len());
    }
}
