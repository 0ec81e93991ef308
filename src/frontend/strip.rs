//! Comment and string masking
//!
//! One deterministic pass over the source produces a text of identical byte
//! length in which comment bytes and string-literal contents are replaced by
//! spaces. Newlines survive so line numbers stay valid. Later stages count
//! delimiters and match templates on the masked text, then slice the original
//! by the same offsets.

use crate::comments::{Comment, CommentStyle};

/// Lexical conventions the masker needs
#[derive(Debug, Clone, Copy)]
pub struct StripRules {
    pub slash_comments: bool,
    pub hash_comments: bool,
    pub triple_quotes: bool,
    pub backtick_strings: bool,
    /// `'a` may be a Rust lifetime rather than a char literal
    pub lifetimes: bool,
}

#[derive(Debug)]
pub struct Stripped {
    pub masked: String,
    pub comments: Vec<Comment>,
}

pub fn strip(source: &str, rules: &StripRules) -> Stripped {
    let bytes = source.as_bytes();
    let mut masked = bytes.to_vec();
    let mut comments = Vec::new();
    let mut i = 0;

    let blank = |masked: &mut Vec<u8>, from: usize, to: usize| {
        for byte in &mut masked[from..to] {
            if *byte != b'\n' {
                *byte = b' ';
            }
        }
    };

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();

        if rules.slash_comments && b == b'/' && next == Some(b'/') {
            let end = find_byte(bytes, i, b'\n');
            comments.push(Comment::new(&source[i..end], CommentStyle::Line, i, end));
            blank(&mut masked, i, end);
            i = end;
        } else if rules.slash_comments && b == b'/' && next == Some(b'*') {
            let end = find_seq(bytes, i + 2, b"*/").map_or(bytes.len(), |p| p + 2);
            comments.push(Comment::new(&source[i..end], CommentStyle::Block, i, end));
            blank(&mut masked, i, end);
            i = end;
        } else if rules.hash_comments && b == b'#' {
            let end = find_byte(bytes, i, b'\n');
            comments.push(Comment::new(&source[i..end], CommentStyle::Hash, i, end));
            blank(&mut masked, i, end);
            i = end;
        } else if b == b'"' || (b == b'\'' && !is_lifetime(bytes, i, rules)) || (b == b'`' && rules.backtick_strings) {
            let triple = rules.triple_quotes && next == Some(b) && bytes.get(i + 2) == Some(&b);
            let (open, end) = if triple {
                let close = find_seq(bytes, i + 3, &[b, b, b]).map_or(bytes.len(), |p| p + 3);
                (i + 3, close)
            } else {
                (i + 1, string_end(bytes, i + 1, b))
            };
            // Keep the quotes, blank the contents
            let content_end = if triple {
                end.saturating_sub(3).max(open)
            } else if end > open && bytes.get(end - 1) == Some(&b) {
                end - 1
            } else {
                end
            };
            blank(&mut masked, open, content_end);
            i = end;
        } else {
            i += 1;
        }
    }

    // Only ASCII bytes were written, and only over whole UTF-8 sequences
    // inside comments or strings, so the result is valid UTF-8 of the same
    // length.
    let masked = String::from_utf8(masked).unwrap_or_else(|err| {
        log::warn!("masking produced invalid UTF-8, falling back to lossy text: {}", err);
        String::from_utf8_lossy(err.as_bytes()).into_owned()
    });

    Stripped { masked, comments }
}

fn is_lifetime(bytes: &[u8], i: usize, rules: &StripRules) -> bool {
    if !rules.lifetimes {
        return false;
    }
    // 'x' and '\n' are char literals; 'a followed by anything else is a lifetime
    match (bytes.get(i + 1), bytes.get(i + 2)) {
        (Some(b'\\'), _) => false,
        (Some(_), Some(b'\'')) => false,
        (Some(c), _) if *c >= 0x80 => !bytes[i + 1..].iter().take(5).any(|&b| b == b'\''),
        _ => true,
    }
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| b == needle)
        .map_or(bytes.len(), |p| from + p)
}

fn find_seq(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}

/// Offset one past the closing quote, or the end of the line when the
/// literal is unterminated
fn string_end(bytes: &[u8], mut i: usize, quote: u8) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' if quote != b'`' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c_like() -> StripRules {
        StripRules {
            slash_comments: true,
            hash_comments: false,
            triple_quotes: false,
            backtick_strings: true,
            lifetimes: false,
        }
    }

    #[test]
    fn test_masking_preserves_length_and_lines() {
        let source = "let s = \"a { b\"; // brace }\nx";
        let stripped = strip(source, &c_like());
        assert_eq!(stripped.masked.len(), source.len());
        assert_eq!(stripped.masked, "let s = \"     \";           \nx");
        assert_eq!(stripped.comments.len(), 1);
        assert_eq!(stripped.comments[0].content, "// brace }");
    }

    #[test]
    fn test_escaped_quote_stays_inside_string() {
        let source = r#"f("a\"b") + 1"#;
        let stripped = strip(source, &c_like());
        assert_eq!(stripped.masked, r#"f("    ") + 1"#);
    }

    #[test]
    fn test_python_triple_quotes_and_hash_comments() {
        let rules = StripRules {
            slash_comments: false,
            hash_comments: true,
            triple_quotes: true,
            backtick_strings: false,
            lifetimes: false,
        };
        let source = "def f():\n    \"\"\"Doc # not comment\"\"\"\n    # real\n";
        let stripped = strip(source, &rules);
        assert_eq!(stripped.comments.len(), 1);
        assert_eq!(stripped.comments[0].content, "# real");
        assert!(!stripped.masked.contains("Doc"));
        assert_eq!(stripped.masked.lines().count(), source.lines().count());
    }

    #[test]
    fn test_rust_lifetimes_are_not_quotes() {
        let rules = StripRules {
            lifetimes: true,
            ..c_like()
        };
        let source = "fn f<'a>(x: &'a str) -> char { 'x' }";
        let stripped = strip(source, &rules);
        assert_eq!(stripped.masked, "fn f<'a>(x: &'a str) -> char { ' ' }");
    }

    #[test]
    fn test_multibyte_content_is_masked_bytewise() {
        let source = "s = \"héllo\"";
        let stripped = strip(source, &c_like());
        assert_eq!(stripped.masked.len(), source.len());
        assert!(stripped.masked.is_ascii());
    }
}
