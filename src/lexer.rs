//! Tokenizer for function bodies
//!
//! Keywords are not recognised here: every word is an `Identifier` and the
//! statement parser interprets it against the source language's keyword
//! table. Comments are skipped. Offsets are byte positions into the full
//! source file so statements can be sliced back out as opaque text.

use crate::error::{SourceLocation, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Identifiers and literals
    Identifier(String),
    IntLiteral(i64),
    FloatLiteral(String),
    StringLiteral(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equal,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AndAnd,
    OrOr,
    Bang,
    Question,
    /// `+=` and friends, carrying the operator character
    CompoundAssign(char),
    /// Go short declaration `:=`
    ColonEqual,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Semicolon,
    Colon,
    PathSep,
    Comma,
    Dot,
    Arrow,
    FatArrow,

    /// Any character outside the recognised set
    Other(char),

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub column: usize,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

impl Token {
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    pub fn identifier(&self) -> Option<&str> {
        match &self.token_type {
            TokenType::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn is(&self, word: &str) -> bool {
        self.identifier() == Some(word)
    }
}

/// Lexical differences between source languages
#[derive(Debug, Clone, Copy, Default)]
pub struct LexerConfig {
    /// `#` starts a line comment
    pub hash_comments: bool,
    /// Emit `Indent`/`Dedent` tokens from leading whitespace
    pub indentation: bool,
    /// `'a` outside a char literal is a lifetime, not a quote
    pub lifetimes: bool,
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    byte_offset: usize,
    line: usize,
    column: usize,
    config: LexerConfig,
    paren_depth: usize,
    indent_stack: Vec<usize>,
    at_line_start: bool,
}

impl Lexer {
    pub fn new(input: &str, config: LexerConfig) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            byte_offset: 0,
            line: 1,
            column: 1,
            config,
            paren_depth: 0,
            indent_stack: vec![0],
            at_line_start: true,
        }
    }

    /// Place the text at a position inside a larger file
    pub fn with_origin(mut self, location: SourceLocation, byte_offset: usize) -> Self {
        self.line = location.line;
        self.column = location.column;
        self.byte_offset = byte_offset;
        self
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            if self.at_line_start && self.config.indentation && self.paren_depth == 0 {
                self.handle_indentation(&mut tokens);
                if self.is_at_end() {
                    break;
                }
            }

            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }

            if let Some(token) = self.next_token() {
                match token.token_type {
                    TokenType::LeftParen | TokenType::LeftBracket => self.paren_depth += 1,
                    TokenType::LeftBrace if self.config.indentation => self.paren_depth += 1,
                    TokenType::RightParen | TokenType::RightBracket => {
                        self.paren_depth = self.paren_depth.saturating_sub(1)
                    }
                    TokenType::RightBrace if self.config.indentation => {
                        self.paren_depth = self.paren_depth.saturating_sub(1)
                    }
                    _ => {}
                }

                let is_newline = token.token_type == TokenType::Newline;
                if is_newline {
                    self.at_line_start = self.paren_depth == 0;
                    // Implicit line joining inside brackets; collapse blank lines
                    let skip = self.paren_depth > 0
                        || matches!(
                            tokens.last().map(|t: &Token| &t.token_type),
                            None | Some(TokenType::Newline) | Some(TokenType::Indent) | Some(TokenType::Dedent)
                        );
                    if skip {
                        continue;
                    }
                }
                tokens.push(token);
            }
        }

        if self.config.indentation {
            if !matches!(tokens.last().map(|t| &t.token_type), None | Some(TokenType::Newline)) {
                tokens.push(self.make_token(TokenType::Newline, self.line, self.column, self.offset()));
            }
            while self.indent_stack.len() > 1 {
                self.indent_stack.pop();
                tokens.push(self.make_token(TokenType::Dedent, self.line, self.column, self.offset()));
            }
        }

        tokens.push(self.make_token(TokenType::Eof, self.line, self.column, self.offset()));
        tokens
    }

    fn handle_indentation(&mut self, tokens: &mut Vec<Token>) {
        // Measure this line; blank and comment-only lines do not count
        let mut width = 0;
        let mut cursor = self.position;
        while let Some(&ch) = self.input.get(cursor) {
            match ch {
                ' ' => width += 1,
                '\t' => width += 4,
                _ => break,
            }
            cursor += 1;
        }
        match self.input.get(cursor) {
            None | Some('\n') | Some('\r') | Some('#') => return,
            _ => {}
        }

        self.at_line_start = false;
        let current = self.indent_stack.last().copied().unwrap_or(0);
        if width > current {
            self.indent_stack.push(width);
            tokens.push(self.make_token(TokenType::Indent, self.line, self.column, self.offset()));
        } else {
            while width < self.indent_stack.last().copied().unwrap_or(0) && self.indent_stack.len() > 1 {
                self.indent_stack.pop();
                tokens.push(self.make_token(TokenType::Dedent, self.line, self.column, self.offset()));
            }
        }
    }

    fn offset(&self) -> usize {
        self.byte_offset
    }

    fn make_token(&self, token_type: TokenType, line: usize, column: usize, start: usize) -> Token {
        Token {
            token_type,
            line,
            column,
            start,
            end: self.byte_offset,
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        let start_line = self.line;
        let start_column = self.column;
        let start = self.byte_offset;

        let ch = self.advance()?;

        let token_type = match ch {
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            '{' => TokenType::LeftBrace,
            '}' => TokenType::RightBrace,
            '[' => TokenType::LeftBracket,
            ']' => TokenType::RightBracket,
            ';' => TokenType::Semicolon,
            ',' => TokenType::Comma,
            '.' => TokenType::Dot,
            '?' => TokenType::Question,
            ':' => match self.peek() {
                Some(':') => {
                    self.advance();
                    TokenType::PathSep
                }
                Some('=') => {
                    self.advance();
                    TokenType::ColonEqual
                }
                _ => TokenType::Colon,
            },
            '+' | '*' | '%' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenType::CompoundAssign(ch)
                } else {
                    match ch {
                        '+' => TokenType::Plus,
                        '*' => TokenType::Star,
                        _ => TokenType::Percent,
                    }
                }
            }
            '-' => match self.peek() {
                Some('>') => {
                    self.advance();
                    TokenType::Arrow
                }
                Some('=') => {
                    self.advance();
                    TokenType::CompoundAssign('-')
                }
                _ => TokenType::Minus,
            },
            '/' => match self.peek() {
                Some('/') => {
                    self.read_while(|c| c != '\n');
                    return None;
                }
                Some('*') => {
                    self.skip_block_comment();
                    return None;
                }
                Some('=') => {
                    self.advance();
                    TokenType::CompoundAssign('/')
                }
                _ => TokenType::Slash,
            },
            '#' if self.config.hash_comments => {
                self.read_while(|c| c != '\n');
                return None;
            }
            '=' => match self.peek() {
                Some('=') => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                    }
                    TokenType::EqualEqual
                }
                Some('>') => {
                    self.advance();
                    TokenType::FatArrow
                }
                _ => TokenType::Equal,
            },
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                    }
                    TokenType::NotEqual
                } else {
                    TokenType::Bang
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                }
            }
            '&' if self.peek() == Some('&') => {
                self.advance();
                TokenType::AndAnd
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                TokenType::OrOr
            }
            '\n' => TokenType::Newline,
            '\'' if self.config.lifetimes && !self.is_char_literal() => TokenType::Other('\''),
            '"' | '\'' | '`' => TokenType::StringLiteral(self.read_string(ch)),
            _ if ch.is_ascii_digit() => self.read_number(ch),
            _ if ch.is_alphabetic() || ch == '_' || ch == '$' => {
                let identifier = self.read_identifier(ch);
                let is_prefix = matches!(identifier.as_str(), "r" | "b" | "f" | "u" | "rb" | "br" | "fr");
                match self.peek() {
                    Some(q @ ('"' | '\'')) if is_prefix => {
                        self.advance();
                        TokenType::StringLiteral(self.read_string(q))
                    }
                    _ => TokenType::Identifier(identifier),
                }
            }
            other => TokenType::Other(other),
        };

        Some(Token {
            token_type,
            line: start_line,
            column: start_column,
            start,
            end: self.byte_offset,
        })
    }

    fn is_char_literal(&self) -> bool {
        match (self.peek(), self.peek_next()) {
            (Some('\\'), _) => true,
            (Some(_), Some('\'')) => true,
            _ => false,
        }
    }

    fn read_string(&mut self, quote: char) -> String {
        // Triple-quoted strings
        if self.peek() == Some(quote) && self.peek_next() == Some(quote) {
            self.advance();
            self.advance();
            let mut value = String::new();
            while !self.is_at_end() {
                if self.peek() == Some(quote)
                    && self.peek_next() == Some(quote)
                    && self.input.get(self.position + 2) == Some(&quote)
                {
                    self.advance();
                    self.advance();
                    self.advance();
                    break;
                }
                if let Some(ch) = self.advance() {
                    value.push(ch);
                }
            }
            return value;
        }

        let mut value = String::new();
        while let Some(ch) = self.peek() {
            if ch == quote || (ch == '\n' && quote != '`') {
                break;
            }
            self.advance();
            if ch == '\\' {
                if let Some(escaped) = self.advance() {
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                }
            } else {
                value.push(ch);
            }
        }

        if self.peek() == Some(quote) {
            self.advance(); // Consume closing quote
        }

        value
    }

    fn read_number(&mut self, first_digit: char) -> TokenType {
        let mut value = String::from(first_digit);
        if first_digit == '0' && matches!(self.peek(), Some('x' | 'X')) {
            self.advance();
            let hex = self.read_while(|c| c.is_ascii_hexdigit() || c == '_');
            return TokenType::IntLiteral(i64::from_str_radix(&hex.replace('_', ""), 16).unwrap_or(0));
        }

        value.push_str(&self.read_while(|c| c.is_ascii_digit() || c == '_'));
        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            value.push_str(&self.read_while(|c| c.is_ascii_digit() || c == '.' || c == '_'));
        }
        if matches!(self.peek(), Some('e' | 'E'))
            && self
                .peek_next()
                .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '+')
        {
            is_float = true;
            if let Some(e) = self.advance() {
                value.push(e);
            }
            if let Some(sign) = self.advance() {
                value.push(sign);
            }
            value.push_str(&self.read_while(|c| c.is_ascii_digit()));
        }

        // Type suffixes such as 10u32, 1.5f, 3L
        let suffix = self.read_while(|c| c.is_ascii_alphanumeric());
        if suffix.starts_with('f') || suffix.starts_with('F') || suffix == "d" || suffix == "D" {
            is_float = true;
        }

        let digits = value.replace('_', "");
        if is_float {
            TokenType::FloatLiteral(digits)
        } else {
            TokenType::IntLiteral(digits.parse().unwrap_or(0))
        }
    }

    fn read_identifier(&mut self, first_char: char) -> String {
        let mut value = String::from(first_char);
        value.push_str(&self.read_while(|c| c.is_alphanumeric() || c == '_' || c == '$'));
        value
    }

    fn skip_block_comment(&mut self) {
        self.advance(); // consume '*'
        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_next() == Some('/') {
                self.advance();
                self.advance();
                break;
            }
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        self.read_while(|ch| matches!(ch, ' ' | '\r' | '\t'));
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;
        self.byte_offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn read_while<F>(&mut self, mut predicate: F) -> String
    where
        F: FnMut(char) -> bool,
    {
        let mut value = String::new();

        while let Some(ch) = self.peek() {
            if !predicate(ch) {
                break;
            }
            self.advance();
            value.push(ch);
        }

        value
    }
}

/// Span covering tokens `first..=last`
pub fn span_between(first: &Token, last: &Token) -> Span {
    let end_column = if last.end > last.start {
        last.column + (last.end - last.start)
    } else {
        last.column
    };
    Span::new(first.location(), SourceLocation::new(last.line, end_column))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(text: &str, config: LexerConfig) -> Vec<TokenType> {
        Lexer::new(text, config)
            .tokenize()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn test_operators_and_literals() {
        let tokens = types("x += 1.5 && y != \"a\\n\"", LexerConfig::default());
        assert_eq!(
            tokens,
            vec![
                TokenType::Identifier("x".into()),
                TokenType::CompoundAssign('+'),
                TokenType::FloatLiteral("1.5".into()),
                TokenType::AndAnd,
                TokenType::Identifier("y".into()),
                TokenType::NotEqual,
                TokenType::StringLiteral("a\n".into()),
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = types("a // note\n/* block */ b", LexerConfig::default());
        assert_eq!(
            tokens,
            vec![
                TokenType::Identifier("a".into()),
                TokenType::Newline,
                TokenType::Identifier("b".into()),
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_indentation_tokens() {
        let config = LexerConfig {
            hash_comments: true,
            indentation: true,
            lifetimes: false,
        };
        let tokens = types("if x:\n    y\n# gap\nz\n", config);
        assert_eq!(
            tokens,
            vec![
                TokenType::Identifier("if".into()),
                TokenType::Identifier("x".into()),
                TokenType::Colon,
                TokenType::Newline,
                TokenType::Indent,
                TokenType::Identifier("y".into()),
                TokenType::Newline,
                TokenType::Dedent,
                TokenType::Identifier("z".into()),
                TokenType::Newline,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_offsets_follow_origin() {
        let tokens = Lexer::new("ab cd", LexerConfig::default())
            .with_origin(SourceLocation::new(7, 5), 100)
            .tokenize();
        assert_eq!(tokens[1].start, 103);
        assert_eq!(tokens[1].end, 105);
        assert_eq!((tokens[1].line, tokens[1].column), (7, 8));
    }
}
