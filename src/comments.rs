//! Comment handling
//!
//! Front-ends collect comments during the strip pre-pass and turn the run of
//! comments directly above a declaration into its documentation text.
//! Back-ends render documentation and marker comments in the target syntax.

/// A comment found in source text
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// The comment text including its delimiters
    pub content: String,
    pub style: CommentStyle,
    /// Byte offset of the first delimiter character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

/// Comment style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `// ...`, including `///` and `//!`
    Line,
    /// `/* ... */`, including `/** ... */`
    Block,
    /// `# ...`
    Hash,
}

impl Comment {
    pub fn new(content: impl Into<String>, style: CommentStyle, start: usize, end: usize) -> Self {
        Comment {
            content: content.into(),
            style,
            start,
            end,
        }
    }

    /// Text without delimiters, one entry per line, leading `*` gutters removed
    pub fn raw_lines(&self) -> Vec<String> {
        match self.style {
            CommentStyle::Line => {
                let body = self.content.trim_start_matches('/');
                let body = body.strip_prefix('!').unwrap_or(body);
                vec![body.strip_prefix(' ').unwrap_or(body).trim_end().to_string()]
            }
            CommentStyle::Hash => {
                let body = self.content.trim_start_matches('#');
                vec![body.strip_prefix(' ').unwrap_or(body).trim_end().to_string()]
            }
            CommentStyle::Block => {
                let inner = self
                    .content
                    .strip_prefix("/*")
                    .and_then(|c| c.strip_suffix("*/"))
                    .unwrap_or(&self.content);
                let inner = inner.trim_start_matches('*');
                inner
                    .lines()
                    .map(|line| {
                        let line = line.trim();
                        let line = line.strip_prefix('*').unwrap_or(line);
                        line.strip_prefix(' ').unwrap_or(line).trim_end().to_string()
                    })
                    .collect()
            }
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self.style, CommentStyle::Block)
    }

    pub fn is_line(&self) -> bool {
        !self.is_block()
    }
}

/// Join a run of comments into documentation text.
///
/// Blank lines at either end are dropped; interior blank lines survive.
/// Returns `None` when nothing but whitespace remains.
pub fn doc_text<'a, I>(comments: I) -> Option<String>
where
    I: IntoIterator<Item = &'a Comment>,
{
    let lines: Vec<String> = comments.into_iter().flat_map(|c| c.raw_lines()).collect();
    let first = lines.iter().position(|l| !l.trim().is_empty())?;
    let last = lines.iter().rposition(|l| !l.trim().is_empty())?;
    Some(lines[first..=last].join("\n"))
}

/// How a target writes documentation comments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocStyle {
    /// `/// text`
    TripleSlash,
    /// `// text`
    DoubleSlash,
    /// `# text`
    Hash,
    /// `/** text */`
    JavaDoc,
}

impl DocStyle {
    /// Line prefix for plain (non-doc) comments in the same language
    pub fn line_prefix(self) -> &'static str {
        match self {
            DocStyle::Hash => "#",
            _ => "//",
        }
    }
}

/// Render documentation text above a declaration at `indent`
pub fn render_doc(text: &str, style: DocStyle, indent: &str) -> String {
    let mut out = String::new();
    match style {
        DocStyle::JavaDoc => {
            out.push_str(indent);
            out.push_str("/**\n");
            for line in text.lines() {
                push_prefixed(&mut out, indent, " *", &line.replace("*/", "* /"));
            }
            out.push_str(indent);
            out.push_str(" */\n");
        }
        _ => {
            let prefix = match style {
                DocStyle::TripleSlash => "///",
                DocStyle::Hash => "#",
                _ => "//",
            };
            for line in text.lines() {
                push_prefixed(&mut out, indent, prefix, line);
            }
        }
    }
    out
}

/// Render a labelled marker comment such as `// OPAQUE: ...`, one comment
/// line per line of `text`
pub fn render_marker(label: &str, text: &str, style: DocStyle, indent: &str) -> String {
    let prefix = style.line_prefix();
    let mut out = String::new();
    let mut lines = text.lines();
    let first = lines.next().unwrap_or("");
    out.push_str(&format!("{}{} {}: {}\n", indent, prefix, label, first.trim_end()));
    for line in lines {
        push_prefixed(&mut out, indent, prefix, line.trim_end());
    }
    out
}

fn push_prefixed(out: &mut String, indent: &str, prefix: &str, line: &str) {
    out.push_str(indent);
    out.push_str(prefix);
    if !line.is_empty() {
        out.push(' ');
        out.push_str(line);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_text_from_javadoc_block() {
        let comment = Comment::new(
            "/**\n     * Adds two numbers.\n     *\n     * Overflow wraps.\n     */",
            CommentStyle::Block,
            0,
            0,
        );
        assert_eq!(
            doc_text([&comment]).as_deref(),
            Some("Adds two numbers.\n\nOverflow wraps.")
        );
    }

    #[test]
    fn test_doc_text_joins_line_comments() {
        let first = Comment::new("/// The user", CommentStyle::Line, 0, 12);
        let second = Comment::new("/// record.", CommentStyle::Line, 13, 24);
        assert_eq!(doc_text([&first, &second]).as_deref(), Some("The user\nrecord."));
    }

    #[test]
    fn test_empty_comment_has_no_doc() {
        let comment = Comment::new("#", CommentStyle::Hash, 0, 1);
        assert_eq!(doc_text([&comment]), None);
    }

    #[test]
    fn test_render_doc_styles() {
        assert_eq!(render_doc("Hi\nthere", DocStyle::TripleSlash, ""), "/// Hi\n/// there\n");
        assert_eq!(render_doc("Hi", DocStyle::JavaDoc, "  "), "  /**\n   * Hi\n   */\n");
    }

    #[test]
    fn test_render_marker_spans_lines() {
        assert_eq!(
            render_marker("OPAQUE", "weird {\n  stuff\n}", DocStyle::Hash, ""),
            "# OPAQUE: weird {\n#   stuff\n# }\n"
        );
    }
}
