//! Conversions between the byte columns interpreters report and character indices.
//!
//! Python records frame columns as offsets into the UTF-8 encoding of a line, while
//! slicing and underline rendering work in characters. Decoding is lossy: a malformed
//! unit (or a prefix cut in the middle of a character) becomes U+FFFD instead of an error.

/// Converts a byte offset into `line` to the number of characters before it.
///
/// The offset is clamped to the line length.
#[must_use]
pub fn char_offset(line: &[u8], byte_offset: usize) -> usize {
    let prefix = &line[..byte_offset.min(line.len())];
    String::from_utf8_lossy(prefix).chars().count()
}

/// Converts a character index into `line` to the byte offset where that character starts.
///
/// Indices past the end of the line map to the line length.
#[must_use]
pub fn byte_offset(line: &str, char_offset: usize) -> usize {
    line.char_indices().nth(char_offset).map_or(line.len(), |(index, _)| index)
}

/// Returns the byte range of the characters `[start, end)` (0-based character indices) of `text`.
///
/// Both bounds are clamped to the text.
pub(crate) fn char_range(text: &str, start: usize, end: usize) -> std::ops::Range<usize> {
    let start_byte = byte_offset(text, start);
    let end_byte = byte_offset(text, end.max(start));
    start_byte..end_byte
}

/// Counts the leading whitespace characters of a line, as `str.lstrip()` would remove them.
pub(crate) fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|ch| ch.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_offsets_are_unchanged() {
        assert_eq!(char_offset(b"result = x + y", 9), 9);
        assert_eq!(byte_offset("result = x + y", 9), 9);
    }

    #[test]
    fn multi_byte_characters_count_once() {
        let line = "name = 'é' + 1";
        // 'é' is two bytes, so the `+` sits at byte 12 but character 11.
        assert_eq!(char_offset(line.as_bytes(), 12), 11);
        assert_eq!(byte_offset(line, 11), 12);
    }

    #[test]
    fn offsets_past_the_end_are_clamped() {
        assert_eq!(char_offset(b"abc", 99), 3);
        assert_eq!(byte_offset("abc", 99), 3);
    }

    #[test]
    fn malformed_bytes_become_replacement_characters() {
        let line = [b'a', 0xff, 0xfe, b'b', b'c'];
        assert_eq!(char_offset(&line, 4), 4);
    }

    #[test]
    fn cut_inside_a_character_counts_a_replacement() {
        let line = "é!".as_bytes();
        assert_eq!(char_offset(line, 1), 1);
    }

    #[test]
    fn char_range_maps_to_bytes() {
        assert_eq!(char_range("αβγ", 1, 2), 2..4);
        assert_eq!(char_range("abc", 2, 1), 2..2);
    }
}
