//! Boundary detection over masked text
//!
//! All functions work on byte offsets into the masked text, which has the
//! same layout as the original source.

use crate::error::{SourceLocation, Span};
use std::ops::Range;

/// Offset to line/column conversion
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    /// 1-based line and column of a byte offset
    pub fn location(&self, offset: usize) -> SourceLocation {
        let line = self.starts.partition_point(|&start| start <= offset);
        let line_start = self.starts[line.saturating_sub(1)];
        SourceLocation::new(line, offset - line_start + 1)
    }

    pub fn span(&self, range: &Range<usize>) -> Span {
        Span::new(self.location(range.start), self.location(range.end))
    }
}

/// How items are separated at one nesting level
#[derive(Debug, Clone, Copy)]
pub struct ScanRules {
    /// A depth-0 newline may end an item
    pub newline_terminates: bool,
    /// Items are grouped by indentation (Python)
    pub indentation: bool,
}

/// Split `range` of the masked text into top-level items
pub fn items(masked: &str, range: Range<usize>, rules: &ScanRules) -> Vec<Range<usize>> {
    if rules.indentation {
        indented_items(masked, range)
    } else {
        delimited_items(masked, range, rules.newline_terminates)
    }
}

fn is_open(b: u8) -> bool {
    matches!(b, b'(' | b'[' | b'{')
}

fn is_close(b: u8) -> bool {
    matches!(b, b')' | b']' | b'}')
}

fn trim_range(bytes: &[u8], mut range: Range<usize>) -> Range<usize> {
    while range.start < range.end && bytes[range.start].is_ascii_whitespace() {
        range.start += 1;
    }
    while range.end > range.start && bytes[range.end - 1].is_ascii_whitespace() {
        range.end -= 1;
    }
    range
}

fn next_non_space(bytes: &[u8], mut i: usize, end: usize) -> Option<u8> {
    while i < end {
        if !bytes[i].is_ascii_whitespace() {
            return Some(bytes[i]);
        }
        i += 1;
    }
    None
}

/// Whether a line ending here leaves the item syntactically open
fn line_continues(bytes: &[u8], start: usize, here: usize, end: usize) -> bool {
    let last = bytes[start..here]
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map(|p| start + p);
    let dangling = match last {
        Some(p) => {
            let b = bytes[p];
            let prev = if p > start { bytes[p - 1] } else { b' ' };
            matches!(b, b',' | b'=' | b'(' | b':' | b'+' | b'-' | b'*' | b'/' | b'|' | b'&' | b'.' | b'@')
                || (b == b'>' && (prev == b'=' || prev == b'-'))
                || bytes[start..=p].starts_with(b"@") && !bytes[start..=p].contains(&b'\n')
        }
        None => true,
    };
    dangling || matches!(next_non_space(bytes, here, end), Some(b'{' | b'.' | b'=' | b'?' | b':'))
}

/// Whether a depth-0 `}` is followed on its line by a word that keeps the
/// item going, as in `import { x } from "./x";`
fn continues_after_brace(bytes: &[u8], at: usize, end: usize) -> bool {
    let mut i = at;
    while i < end && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    let word_end = bytes[i..end]
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))
        .map_or(end, |p| i + p);
    matches!(&bytes[i..word_end], b"from" | b"as" | b"satisfies")
}

fn delimited_items(masked: &str, range: Range<usize>, newline_terminates: bool) -> Vec<Range<usize>> {
    let bytes = masked.as_bytes();
    let end = range.end.min(bytes.len());
    let mut items = Vec::new();
    let mut i = range.start;

    while i < end {
        while i < end && (bytes[i].is_ascii_whitespace() || bytes[i] == b';' || bytes[i] == b',') {
            i += 1;
        }
        if i >= end {
            break;
        }

        let start = i;
        let mut depth = 0usize;
        let mut j = start;
        while j < end {
            let b = bytes[j];
            if is_open(b) {
                depth += 1;
            } else if is_close(b) {
                depth = depth.saturating_sub(1);
                if b == b'}' && depth == 0 {
                    j += 1;
                    if continues_after_brace(bytes, j, end) {
                        continue;
                    }
                    // A trailing `;` belongs to the same item
                    if next_non_space(bytes, j, end) == Some(b';') {
                        while j < end && bytes[j] != b';' {
                            j += 1;
                        }
                        j = (j + 1).min(end);
                    }
                    break;
                }
            } else if b == b';' && depth == 0 {
                j += 1;
                break;
            } else if b == b'\n'
                && depth == 0
                && newline_terminates
                && !line_continues(bytes, start, j, end)
            {
                break;
            }
            j += 1;
        }

        let item = trim_range(bytes, start..j.min(end));
        if !item.is_empty() {
            items.push(item);
        }
        i = j.max(start + 1);
    }

    items
}

fn line_indent(line: &[u8]) -> usize {
    line.iter()
        .take_while(|b| **b == b' ' || **b == b'\t')
        .map(|b| if *b == b'\t' { 4 } else { 1 })
        .sum()
}

fn indented_items(masked: &str, range: Range<usize>) -> Vec<Range<usize>> {
    let bytes = masked.as_bytes();
    let end = range.end.min(bytes.len());

    // (start, end) of each line in range, end excluding the newline
    let mut lines = Vec::new();
    let mut line_start = range.start;
    for i in range.start..end {
        if bytes[i] == b'\n' {
            lines.push(line_start..i);
            line_start = i + 1;
        }
    }
    if line_start < end {
        lines.push(line_start..end);
    }

    let is_blank = |r: &Range<usize>| bytes[r.clone()].iter().all(|b| b.is_ascii_whitespace());

    let Some(base) = lines.iter().find(|r| !is_blank(r)).map(|r| line_indent(&bytes[r.clone()])) else {
        return Vec::new();
    };

    let mut items = Vec::new();
    let mut current: Option<Range<usize>> = None;
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut decorator_only = false;

    for line in &lines {
        let text = &bytes[line.clone()];
        let blank = is_blank(line);
        let indent = line_indent(text);
        let continues = depth > 0 || quote.is_some() || decorator_only || blank || indent > base;

        match (&mut current, continues) {
            (Some(item), true) => item.end = line.end,
            _ => {
                if let Some(done) = current.take() {
                    items.push(trim_range(bytes, done));
                }
                if !blank {
                    current = Some(line.clone());
                }
            }
        }

        if !blank && indent <= base && depth == 0 && quote.is_none() {
            decorator_only = text.iter().skip_while(|b| b.is_ascii_whitespace()).next() == Some(&b'@');
        }

        let mut escaped = false;
        for &b in text {
            match quote {
                Some(q) => {
                    if escaped {
                        escaped = false;
                    } else if b == b'\\' {
                        escaped = true;
                    } else if b == q {
                        quote = None;
                    }
                }
                None => {
                    if b == b'"' || b == b'\'' {
                        quote = Some(b);
                    } else if is_open(b) {
                        depth += 1;
                    } else if is_close(b) {
                        depth = depth.saturating_sub(1);
                    }
                }
            }
        }
        // Backslash continuation
        if text.last() == Some(&b'\\') {
            decorator_only = true;
        }
    }

    if let Some(done) = current {
        items.push(trim_range(bytes, done));
    }
    items.retain(|r| !r.is_empty());
    items
}

/// Offset of the bracket closing the one at `open`
pub fn matching_close(masked: &str, open: usize) -> Option<usize> {
    let bytes = masked.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if is_open(b) {
            depth += 1;
        } else if is_close(b) {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Split at depth-0 occurrences of `separator`.
///
/// With `angle` set, `<`/`>` count as delimiters (type text), except the `>`
/// of `->` and `=>`.
pub fn split_top_level(text: &str, separator: u8, angle: bool) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let prev = if i > 0 { bytes[i - 1] } else { b' ' };
        if is_open(b) || (angle && b == b'<') {
            depth += 1;
        } else if is_close(b) || (angle && b == b'>' && prev != b'-' && prev != b'=') {
            depth = depth.saturating_sub(1);
        } else if b == separator && depth == 0 {
            parts.push(start..i);
            start = i + 1;
        }
    }
    parts.push(start..bytes.len());
    parts
        .into_iter()
        .map(|r| trim_range(bytes, r))
        .filter(|r| !r.is_empty())
        .collect()
}

/// First depth-0 occurrence of `needle` at or after `from`
pub fn find_top_level(text: &str, from: usize, needle: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        if b == needle && depth == 0 {
            return Some(i);
        }
        if is_open(b) {
            depth += 1;
        } else if is_close(b) {
            depth = depth.saturating_sub(1);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(source: &'a str, ranges: &[Range<usize>]) -> Vec<&'a str> {
        ranges.iter().map(|r| &source[r.clone()]).collect()
    }

    #[test]
    fn test_brace_items() {
        let source = "use std::fmt;\n\nstruct A { x: i32 }\n\nfn f() -> i32 {\n    1\n}\nconst X: i32 = 1;";
        let rules = ScanRules {
            newline_terminates: false,
            indentation: false,
        };
        let found = items(source, 0..source.len(), &rules);
        assert_eq!(
            texts(source, &found),
            vec![
                "use std::fmt;",
                "struct A { x: i32 }",
                "fn f() -> i32 {\n    1\n}",
                "const X: i32 = 1;"
            ]
        );
    }

    #[test]
    fn test_brace_import_runs_to_its_semicolon() {
        let source = "import { x, y } from \"./x\";\nexport { x };\nconst z = { a: 1 } as const;\nfunction f() {}\n";
        let rules = ScanRules {
            newline_terminates: true,
            indentation: false,
        };
        let found = items(source, 0..source.len(), &rules);
        assert_eq!(
            texts(source, &found),
            vec![
                "import { x, y } from \"./x\";",
                "export { x };",
                "const z = { a: 1 } as const;",
                "function f() {}"
            ]
        );
    }

    #[test]
    fn test_newline_terminated_items_respect_open_lines() {
        let source = "package main\nimport \"fmt\"\nfunc add(a int,\n  b int) int {\n  return a + b\n}\nvar x = 1 +\n  2\n";
        let rules = ScanRules {
            newline_terminates: true,
            indentation: false,
        };
        let found = items(source, 0..source.len(), &rules);
        assert_eq!(found.len(), 4);
        assert_eq!(&source[found[3].clone()], "var x = 1 +\n  2");
    }

    #[test]
    fn test_indented_items_group_bodies_and_decorators() {
        let source = "import os\n\n@dataclass\nclass A:\n    x: int\n\n    def f(self):\n        return (1 +\n2)\n\ndef g():\n    pass\n";
        let found = items(
            source,
            0..source.len(),
            &ScanRules {
                newline_terminates: true,
                indentation: true,
            },
        );
        let found = texts(source, &found);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0], "import os");
        assert!(found[1].starts_with("@dataclass\nclass A:"));
        assert!(found[1].ends_with("2)"));
        assert_eq!(found[2], "def g():\n    pass");
    }

    #[test]
    fn test_split_top_level_counts_angles_in_type_text() {
        let text = "a: Map<String, i32>, cb: (x: number) => void, c";
        let parts = split_top_level(text, b',', true);
        assert_eq!(
            texts(text, &parts),
            vec!["a: Map<String, i32>", "cb: (x: number) => void", "c"]
        );
    }

    #[test]
    fn test_line_index_locations() {
        let index = LineIndex::new("ab\ncd\n");
        assert_eq!(index.location(0), SourceLocation::new(1, 1));
        assert_eq!(index.location(4), SourceLocation::new(2, 2));
    }

    #[test]
    fn test_matching_close_skips_nested() {
        let text = "f(a, (b), [c]) + 1";
        assert_eq!(matching_close(text, 1), Some(13));
    }
}
