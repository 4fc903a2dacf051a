//! Text encodings for payload measurement
//!
//! The size that matters is the size the host writes to disk, so page text
//! is measured in the host's encoding rather than in characters.

use std::fmt;

/// Byte encoding the host uses when it serializes page text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    /// Standard UTF-8
    #[default]
    Utf8,
    /// Modified UTF-8 as written by tag-based save formats.
    ///
    /// NUL takes two bytes and supplementary characters are written as a
    /// surrogate pair of three bytes each.
    ModifiedUtf8,
    /// UTF-16, two bytes per code unit
    Utf16,
}

impl TextEncoding {
    /// Encoded byte length of `text`, or `None` if it does not fit in `usize`
    pub fn encoded_len(self, text: &str) -> Option<usize> {
        match self {
            TextEncoding::Utf8 => Some(text.len()),
            TextEncoding::ModifiedUtf8 => text
                .chars()
                .try_fold(0usize, |acc, c| acc.checked_add(modified_utf8_len(c))),
            TextEncoding::Utf16 => text.encode_utf16().count().checked_mul(2),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::ModifiedUtf8 => "modified UTF-8",
            TextEncoding::Utf16 => "UTF-16",
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn modified_utf8_len(c: char) -> usize {
    match c as u32 {
        0x0000 => 2,
        0x0001..=0x007F => 1,
        0x0080..=0x07FF => 2,
        0x0800..=0xFFFF => 3,
        _ => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_counts_bytes_not_chars() {
        assert_eq!(TextEncoding::Utf8.encoded_len("abc"), Some(3));
        assert_eq!(TextEncoding::Utf8.encoded_len("é"), Some(2));
        assert_eq!(TextEncoding::Utf8.encoded_len("日本"), Some(6));
        assert_eq!(TextEncoding::Utf8.encoded_len("🦀"), Some(4));
    }

    #[test]
    fn test_modified_utf8() {
        assert_eq!(TextEncoding::ModifiedUtf8.encoded_len("abc"), Some(3));
        // NUL is never written as a single zero byte
        assert_eq!(TextEncoding::ModifiedUtf8.encoded_len("\0"), Some(2));
        assert_eq!(TextEncoding::ModifiedUtf8.encoded_len("日"), Some(3));
        assert_eq!(TextEncoding::ModifiedUtf8.encoded_len("🦀"), Some(6));
    }

    #[test]
    fn test_utf16() {
        assert_eq!(TextEncoding::Utf16.encoded_len("ab"), Some(4));
        assert_eq!(TextEncoding::Utf16.encoded_len("🦀"), Some(4));
        assert_eq!(TextEncoding::Utf16.encoded_len(""), Some(0));
    }

    #[test]
    fn test_display() {
        assert_eq!(TextEncoding::default().to_string(), "UTF-8");
        assert_eq!(TextEncoding::ModifiedUtf8.to_string(), "modified UTF-8");
    }
}
