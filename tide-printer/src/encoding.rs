//! Text width and encoding utilities for western receipt printers
//!
//! Receipt printers in the generic and Star families default to a single-byte
//! code page. This module provides utilities for:
//! - Measuring and fitting strings to a fixed number of character cells
//! - Converting UTF-8 text to Windows-1252 bytes

/// Width of a string in printer character cells
///
/// Every character occupies one cell on a single-byte code page.
pub fn text_width(s: &str) -> usize {
    s.chars().count()
}

/// Truncate a string to fit within `max_width` cells
pub fn truncate_width(s: &str, max_width: usize) -> String {
    s.chars().take(max_width).collect()
}

/// Pad a string to exactly `width` cells
///
/// If the string is longer than the width, it will be truncated.
pub fn pad_width(s: &str, width: usize, align_right: bool) -> String {
    let current_width = text_width(s);
    if current_width >= width {
        return truncate_width(s, width);
    }
    let spaces = width - current_width;
    if align_right {
        format!("{}{}", " ".repeat(spaces), s)
    } else {
        format!("{}{}", s, " ".repeat(spaces))
    }
}

/// Convert UTF-8 text to Windows-1252
///
/// ASCII passes through unchanged. Characters the code page cannot
/// represent are printed as `?`.
pub fn encode_text(s: &str) -> Vec<u8> {
    let mut result = Vec::with_capacity(s.len());
    let mut scratch = [0u8; 4];
    for c in s.chars() {
        if c.is_ascii() {
            result.push(c as u8);
            continue;
        }
        let (cow, _, had_errors) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut scratch));
        if had_errors || cow.len() != 1 {
            result.push(b'?');
        } else {
            result.extend_from_slice(&cow);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width() {
        assert_eq!(text_width("hello"), 5);
        assert_eq!(text_width("café"), 4);
    }

    #[test]
    fn test_truncate_width() {
        assert_eq!(truncate_width("hello world", 5), "hello");
        assert_eq!(truncate_width("hi", 5), "hi");
    }

    #[test]
    fn test_pad_width() {
        assert_eq!(pad_width("hi", 5, false), "hi   ");
        assert_eq!(pad_width("hi", 5, true), "   hi");
        assert_eq!(pad_width("hello world", 5, false), "hello");
    }

    #[test]
    fn test_encode_text() {
        assert_eq!(encode_text("Total"), b"Total".to_vec());
        // é is 0xE9 in Windows-1252
        assert_eq!(encode_text("café"), vec![b'c', b'a', b'f', 0xE9]);
        // CJK has no mapping
        assert_eq!(encode_text("茶"), vec![b'?']);
    }
}
