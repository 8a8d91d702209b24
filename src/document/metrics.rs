//! Text measurement for the standard-14 fonts the builders use.
//!
//! Widths come from the Adobe core-font AFM files, in 1/1000 em. Characters
//! outside printable ASCII are measured with the width of a digit, which is
//! close enough for Latin-1 text and never under-estimates by much.
//!
//! ## Wrapping policy
//!
//! [`split_text_to_size`] wraps greedily at whitespace. Explicit newlines
//! always start a new line (an empty paragraph yields an empty line). A word
//! wider than the available width on its own is broken between characters,
//! keeping at least one character per line so wrapping always terminates.

use super::{FontFamily, FontStyle};

/// PDF points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

const FALLBACK_WIDTH: u16 = 556;
const COURIER_WIDTH: u16 = 600;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Advance width of `ch` in 1/1000 em.
pub fn char_width(family: FontFamily, style: FontStyle, ch: char) -> u16 {
    if family == FontFamily::Courier {
        return COURIER_WIDTH;
    }
    let table = match style {
        FontStyle::Normal => &HELVETICA,
        FontStyle::Bold => &HELVETICA_BOLD,
    };
    match ch as u32 {
        c @ 32..=126 => table[(c - 32) as usize],
        _ => FALLBACK_WIDTH,
    }
}

/// Rendered width of `text` in millimetres at `size` points.
pub fn text_width(text: &str, family: FontFamily, style: FontStyle, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| char_width(family, style, c) as u32)
        .sum();
    units as f32 / 1000.0 * size / PT_PER_MM
}

/// Wrap `text` into lines no wider than `max_width` millimetres.
pub fn split_text_to_size(
    text: &str,
    family: FontFamily,
    style: FontStyle,
    size: f32,
    max_width: f32,
) -> Vec<String> {
    let width = |s: &str| text_width(s, family, style, size);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            if width(word) > max_width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let mut pieces = break_word(word, max_width, &width);
                // The tail of a broken word may still share its line.
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
                continue;
            }

            if current.is_empty() {
                current.push_str(word);
                continue;
            }

            let candidate_width = width(&current) + width(" ") + width(word);
            if candidate_width <= max_width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }

        lines.push(current);
    }

    lines
}

fn break_word(word: &str, max_width: f32, width: &impl Fn(&str) -> f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for ch in word.chars() {
        piece.push(ch);
        if piece.chars().count() > 1 && width(&piece) > max_width {
            piece.pop();
            pieces.push(std::mem::replace(&mut piece, ch.to_string()));
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Encode `text` as WinAnsiEncoding bytes. Unmappable characters become `?`.
pub fn to_winansi(text: &str) -> Vec<u8> {
    text.chars().map(winansi_byte).collect()
}

fn winansi_byte(ch: char) -> u8 {
    match ch as u32 {
        c @ 0x20..=0x7E => c as u8,
        c @ 0xA0..=0xFF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        0x09 => b' ',
        _ => b'?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: FontFamily = FontFamily::Helvetica;
    const N: FontStyle = FontStyle::Normal;

    fn split(text: &str, max: f32) -> Vec<String> {
        split_text_to_size(text, H, N, 12.0, max)
    }

    #[test]
    fn widths_follow_afm() {
        assert_eq!(char_width(H, N, 'i'), 222);
        assert_eq!(char_width(H, FontStyle::Bold, 'i'), 278);
        assert_eq!(char_width(H, N, 'W'), 944);
        assert_eq!(char_width(FontFamily::Courier, FontStyle::Bold, 'i'), 600);
        assert_eq!(char_width(H, N, 'é'), FALLBACK_WIDTH);
    }

    #[test]
    fn text_width_in_mm() {
        // 1000 units at 72pt is exactly one inch.
        let w = text_width("m", FontFamily::Courier, N, 72.0 / 0.6);
        assert!((w - 25.4).abs() < 1e-3, "got {w}");
    }

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(split("Hello world", 170.0), vec!["Hello world"]);
    }

    #[test]
    fn wraps_at_whitespace_within_width() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let lines = split(text, 40.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, H, N, 12.0) <= 40.0, "{line:?} too wide");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn newlines_start_new_lines() {
        assert_eq!(split("one\ntwo\r\n\nthree", 170.0), vec!["one", "two", "", "three"]);
    }

    #[test]
    fn overlong_word_is_broken_between_characters() {
        let word = "x".repeat(200);
        let lines = split(&word, 20.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        for line in &lines {
            assert!(text_width(line, H, N, 12.0) <= 20.0);
        }
    }

    #[test]
    fn broken_word_tail_shares_line_with_next_word() {
        let lines = split(&format!("{} end", "x".repeat(60)), 30.0);
        assert!(lines.last().unwrap().ends_with(" end"));
    }

    #[test]
    fn width_narrower_than_one_char_still_terminates() {
        let lines = split("WWW", 0.5);
        assert_eq!(lines, vec!["W", "W", "W"]);
    }

    #[test]
    fn empty_text_yields_single_empty_line() {
        assert_eq!(split("", 100.0), vec![String::new()]);
    }

    #[test]
    fn winansi_encoding() {
        assert_eq!(to_winansi("A€—é"), vec![b'A', 0x80, 0x97, 0xE9]);
        assert_eq!(to_winansi("中"), vec![b'?']);
    }
}
