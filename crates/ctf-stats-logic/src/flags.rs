//! Fixed regex search for flag tokens in byte buffers.

use regex::Regex;

/// Scans `buffer` (decoded UTF-8 lossy) for non-overlapping matches of
/// `pattern`, returning `(byte_offset, matched_text)` pairs in order.
pub fn scan(buffer: &[u8], pattern: &Regex) -> Vec<(usize, String)> {
    let text = String::from_utf8_lossy(buffer);
    pattern
        .find_iter(&text)
        .map(|m| (m.start(), m.as_str().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::flag_format_to_regex;

    #[test]
    fn finds_single_flag() {
        let re = flag_format_to_regex("ctf{}");
        let matches = scan(b"prefix ctf{deadbeef} suffix", &re);
        assert_eq!(matches, vec![(7, "ctf{deadbeef}".to_string())]);
    }

    #[test]
    fn finds_multiple_non_overlapping_flags() {
        let re = flag_format_to_regex("ctf{}");
        let matches = scan(b"ctf{a} middle ctf{b}", &re);
        assert_eq!(
            matches,
            vec![(0, "ctf{a}".to_string()), (14, "ctf{b}".to_string())]
        );
    }

    #[test]
    fn no_match_returns_empty() {
        let re = flag_format_to_regex("ctf{}");
        assert!(scan(b"nothing here", &re).is_empty());
    }
}
