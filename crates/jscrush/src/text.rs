//! # Byte-Length Utilities
//!
//! The smallest leaves of the dependency graph: computing the UTF-8 byte
//! length of a string, and the byte length it would occupy once escaped
//! for inclusion inside a backtick-delimited (or otherwise delimited)
//! template-literal-style string.

/// The raw UTF-8 byte length of `s`.
///
/// ## Arguments
/// * `s` - the string to measure.
///
/// ## Returns
/// The number of UTF-8 bytes in `s`.
pub fn byte_len(s: &str) -> usize {
    s.len()
}

/// The byte length of `s` once backslashes and `delimiter` are escaped.
///
/// Every occurrence of a backslash or of `delimiter` costs two output
/// bytes (`\\` or `\` + delimiter); every other byte costs one.
///
/// ## Arguments
/// * `s` - the string to measure.
/// * `delimiter` - the byte used to delimit the packed string literal.
///
/// ## Returns
/// The escaped byte length of `s`.
pub fn escaped_byte_len(
    s: &str,
    delimiter: u8,
) -> usize {
    s.bytes()
        .map(|b| if b == b'\\' || b == delimiter { 2 } else { 1 })
        .sum()
}

/// Replace every non-overlapping occurrence of `pattern` in `text` with
/// `replacement`, scanning left to right, and report how many
/// replacements were made.
///
/// ## Arguments
/// * `text` - the text to rewrite.
/// * `pattern` - the substring to replace.
/// * `replacement` - the substring to substitute in its place.
///
/// ## Returns
/// The rewritten text, and the number of non-overlapping copies replaced.
pub fn replace_counted(
    text: &str,
    pattern: &str,
    replacement: &str,
) -> (String, usize) {
    let copies = count_non_overlapping(text, pattern);
    (text.replace(pattern, replacement), copies)
}

/// Count the non-overlapping occurrences of `pattern` in `text`, scanning
/// left to right.
///
/// ## Arguments
/// * `text` - the text to search.
/// * `pattern` - the substring to count.
///
/// ## Returns
/// The number of non-overlapping copies found.
pub fn count_non_overlapping(
    text: &str,
    pattern: &str,
) -> usize {
    if pattern.is_empty() {
        return 0;
    }
    text.matches(pattern).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_len() {
        assert_eq!(byte_len("abc"), 3);
        assert_eq!(byte_len("é"), 2);
    }

    #[test]
    fn test_escaped_byte_len() {
        assert_eq!(escaped_byte_len("abc", b'`'), 3);
        assert_eq!(escaped_byte_len("a`b", b'`'), 4);
        assert_eq!(escaped_byte_len(r"a\b", b'`'), 4);
        assert_eq!(escaped_byte_len(r"a\`b", b'`'), 6);
    }

    #[test]
    fn test_count_non_overlapping() {
        assert_eq!(count_non_overlapping("abcabcabc", "abc"), 3);
        assert_eq!(count_non_overlapping("aaaa", "aa"), 2);
        assert_eq!(count_non_overlapping("abc", "xyz"), 0);
    }

    #[test]
    fn test_replace_counted() {
        let (text, copies) = replace_counted("abcabcabc", "abc", "T");
        assert_eq!(text, "TTT");
        assert_eq!(copies, 3);
    }
}
