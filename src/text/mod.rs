//! # Text Measurement
//!
//! Greedy line wrapping against standard font metrics.
//!
//! Callers size boxes from the *line count* before anything is drawn, so
//! wrapping is a pure function of (text, width, font, size). Lines only break
//! after whitespace or at hard line breaks; a word wider than the line is
//! emitted whole as an oversized line instead of being split.

use crate::font::StandardFont;
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// Wrap `text` in regular Helvetica. See [`wrap_with_font`].
pub fn wrap(text: &str, max_width: f64, font_size: f64) -> Vec<String> {
    wrap_with_font(text, max_width, font_size, StandardFont::Helvetica)
}

/// Break `text` into lines no wider than `max_width` points.
///
/// Always returns at least one line: the empty string wraps to a single
/// empty line so that a blank row stays visible.
pub fn wrap_with_font(
    text: &str,
    max_width: f64,
    font_size: f64,
    font: StandardFont,
) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    let mut line = String::new();

    for (segment, mandatory) in segments(text) {
        let candidate = format!("{}{}", line, segment);
        let overflows = font.measure(candidate.trim_end(), font_size) > max_width;
        if overflows && !line.trim_end().is_empty() {
            lines.push(finish_line(&line));
            line = segment.trim_start().to_string();
        } else {
            line = candidate;
        }

        if mandatory {
            lines.push(finish_line(&line));
            line.clear();
        }
    }

    if !line.is_empty() {
        lines.push(finish_line(&line));
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn finish_line(line: &str) -> String {
    line.trim_end_matches(is_hard_break)
        .trim_end()
        .to_string()
}

fn is_hard_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}')
}

/// Split `text` into unbreakable segments, each ending at a whitespace break
/// opportunity. The flag marks segments that end in a hard line break.
///
/// UAX#14 also allows breaks after hyphens, slashes and similar; those are
/// merged into the following segment so that only whitespace breaks a line.
fn segments(text: &str) -> Vec<(&str, bool)> {
    let mut out = Vec::new();
    let mut start = 0;

    for (end, opp) in linebreaks(text) {
        let piece = &text[start..end];
        let mandatory = matches!(opp, BreakOpportunity::Mandatory);
        let ends_in_space = piece.chars().last().is_some_and(char::is_whitespace);
        if mandatory || ends_in_space || end == text.len() {
            // A mandatory break at end-of-text only closes the last line when
            // the text itself ends in a hard break.
            let hard = mandatory && piece.chars().last().is_some_and(is_hard_break);
            out.push((piece, hard));
            start = end;
        }
    }

    if start < text.len() {
        out.push((&text[start..], false));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_string_is_one_empty_line() {
        assert_eq!(wrap("", 100.0, 10.0), vec![String::new()]);
    }

    #[test]
    fn short_text_single_line() {
        assert_eq!(wrap("Hello world", 200.0, 10.0), vec!["Hello world"]);
    }

    #[test]
    fn wraps_at_spaces() {
        let lines = wrap("The quick brown fox jumps over the lazy dog", 80.0, 10.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(StandardFont::Helvetica.measure(line, 10.0) <= 80.0, "{line}");
            assert_eq!(line.trim(), line);
        }
        assert_eq!(lines.join(" "), "The quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn explicit_newline_breaks() {
        let lines = wrap("first\nsecond", 500.0, 10.0);
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn blank_line_between_paragraphs_is_kept() {
        let lines = wrap("a\n\nb", 500.0, 10.0);
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn long_word_is_one_oversized_line() {
        let word = "Pneumonoultramicroscopicsilicovolcanoconiosis";
        let lines = wrap(word, 20.0, 10.0);
        assert_eq!(lines, vec![word]);
    }

    #[test]
    fn hyphen_is_not_a_break() {
        let lines = wrap("north-east-facing-corner-plot", 30.0, 10.0);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn oversized_word_sits_on_its_own_line() {
        let lines = wrap("a Pneumonoultramicroscopicsilicovolcanoconiosis b", 60.0, 10.0);
        assert_eq!(lines, vec!["a", "Pneumonoultramicroscopicsilicovolcanoconiosis", "b"]);
    }

    proptest! {
        #[test]
        fn wrap_is_deterministic(text in ".{0,200}", width in 10.0f64..400.0, size in 6.0f64..16.0) {
            let a = wrap(&text, width, size);
            let b = wrap(&text, width, size);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn never_zero_lines(text in ".{0,120}", width in 1.0f64..300.0) {
            prop_assert!(!wrap(&text, width, 10.0).is_empty());
        }

        #[test]
        fn no_whitespace_means_one_line(text in "[A-Za-z0-9,./()-]{1,80}", width in 1.0f64..40.0) {
            prop_assert_eq!(wrap(&text, width, 10.0).len(), 1);
        }

        #[test]
        fn multi_word_lines_fit(words in prop::collection::vec("[a-z]{1,8}", 1..30), width in 60.0f64..300.0) {
            let text = words.join(" ");
            for line in wrap(&text, width, 10.0) {
                if line.contains(' ') {
                    prop_assert!(StandardFont::Helvetica.measure(&line, 10.0) <= width);
                }
            }
        }
    }
}
