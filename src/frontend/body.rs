//! Statement and expression parsing for function bodies
//!
//! Bodies are tokenized with the shared [`Lexer`] and parsed by recursive
//! descent, with precedence climbing for binary operators. Only the canonical
//! statement subset is recognised. Any other statement is kept verbatim as an
//! `Opaque` node, reported as a warning, and parsing resumes at the next
//! statement boundary.

use crate::ast::{AstBuilder, BinaryOp, Literal, NodeId, NodeKind, UnaryOp};
use crate::error::{ConvertError, Span};
use crate::frontend::typetext::parse_type_or_dynamic;
use crate::lexer::{span_between, Lexer, LexerConfig, Token, TokenType};
use crate::mapping::SourceAliases;
use crate::types::TypeRef;
use std::collections::BTreeSet;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocks {
    Braces,
    Indentation,
}

/// Where a local declaration spells its type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalTypes {
    /// `let x: T`
    AfterColon,
    /// `var x T`
    AfterName,
    /// `T x`
    Leading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForLoops {
    /// `for x in xs`
    Bare,
    /// `for (x in xs)`, `for (T x : xs)`, `for (const x of xs)`
    Parenthesized,
    /// `for _, x := range xs` and condition-only `for`
    Range,
}

/// Statement-level syntax of one source language
#[derive(Debug, Clone)]
pub struct BodySyntax {
    pub lexer: LexerConfig,
    pub blocks: Blocks,
    /// Newlines end statements
    pub newline_statements: bool,
    pub self_words: &'static [&'static str],
    pub true_word: &'static str,
    pub false_word: &'static str,
    pub null_words: &'static [&'static str],
    /// `and`, `or`, `not`, `is` are operators
    pub word_logic: bool,
    /// Keywords introducing a local, with the mutability each implies
    pub local_keywords: &'static [(&'static str, bool)],
    pub local_types: LocalTypes,
    pub for_loops: ForLoops,
    pub for_keywords: &'static [&'static str],
    pub elif_word: Option<&'static str>,
    /// A trailing expression without `;` is the value of its block
    pub implicit_return: bool,
    /// Postfix `?` propagates an error
    pub try_operator: bool,
    /// Assigning to an unseen plain name declares it
    pub declare_on_assign: bool,
    /// Statements with no effect (`pass`)
    pub skip_words: &'static [&'static str],
    /// A bare name in a method may refer to a field of its type
    pub implicit_members: bool,
}

impl BodySyntax {
    fn braces(lexer: LexerConfig) -> Self {
        Self {
            lexer,
            blocks: Blocks::Braces,
            newline_statements: false,
            self_words: &["this"],
            true_word: "true",
            false_word: "false",
            null_words: &["null"],
            word_logic: false,
            local_keywords: &[],
            local_types: LocalTypes::AfterColon,
            for_loops: ForLoops::Parenthesized,
            for_keywords: &["for"],
            elif_word: None,
            implicit_return: false,
            try_operator: false,
            declare_on_assign: false,
            skip_words: &[],
            implicit_members: false,
        }
    }

    pub fn rust() -> Self {
        Self {
            self_words: &["self"],
            null_words: &["None"],
            local_keywords: &[("let", false)],
            for_loops: ForLoops::Bare,
            implicit_return: true,
            try_operator: true,
            ..Self::braces(LexerConfig {
                lifetimes: true,
                ..LexerConfig::default()
            })
        }
    }

    pub fn python() -> Self {
        Self {
            blocks: Blocks::Indentation,
            newline_statements: true,
            self_words: &["self"],
            true_word: "True",
            false_word: "False",
            null_words: &["None"],
            word_logic: true,
            for_loops: ForLoops::Bare,
            elif_word: Some("elif"),
            declare_on_assign: true,
            skip_words: &["pass"],
            ..Self::braces(LexerConfig {
                hash_comments: true,
                indentation: true,
                lifetimes: false,
            })
        }
    }

    pub fn java() -> Self {
        Self {
            local_keywords: &[("var", true), ("final", false)],
            local_types: LocalTypes::Leading,
            implicit_members: true,
            ..Self::braces(LexerConfig::default())
        }
    }

    pub fn csharp() -> Self {
        Self {
            local_keywords: &[("var", true), ("const", false)],
            local_types: LocalTypes::Leading,
            implicit_members: true,
            for_keywords: &["foreach"],
            ..Self::braces(LexerConfig::default())
        }
    }

    pub fn go() -> Self {
        Self {
            newline_statements: true,
            self_words: &[],
            null_words: &["nil"],
            local_keywords: &[("var", true), ("const", false)],
            local_types: LocalTypes::AfterName,
            for_loops: ForLoops::Range,
            ..Self::braces(LexerConfig::default())
        }
    }

    pub fn typescript() -> Self {
        Self {
            newline_statements: true,
            null_words: &["null", "undefined"],
            local_keywords: &[("let", true), ("const", false), ("var", true)],
            ..Self::braces(LexerConfig::default())
        }
    }

    pub fn kotlin() -> Self {
        Self {
            newline_statements: true,
            local_keywords: &[("val", false), ("var", true)],
            implicit_members: true,
            ..Self::braces(LexerConfig::default())
        }
    }
}

/// Words that never start a `T x` local
const NOT_A_TYPE: &[&str] = &[
    "await", "break", "case", "continue", "default", "delete", "do", "else", "goto", "new", "throw", "typeof", "yield",
];

/// Words that never start an expression
const NOT_AN_EXPRESSION: &[&str] = &[
    "if", "while", "for", "foreach", "match", "switch", "when", "try", "lambda", "fn", "func", "function", "return",
];

/// Words continuing a compound statement after its first block
const CONTINUATIONS: &[&str] = &["else", "elif", "catch", "except", "finally"];

type Parse<T> = std::result::Result<T, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    /// `}` of the enclosing block
    Brace,
    /// `Dedent` of the enclosing suite
    Dedent,
    /// End of the body text
    Eof,
}

/// Parses one function body into a `Block`
pub struct BodyParser<'a> {
    builder: &'a mut AstBuilder,
    syntax: &'a BodySyntax,
    aliases: &'a SourceAliases,
    source: &'a str,
    tokens: Vec<Token>,
    current: usize,
    span: Span,
    text: Range<usize>,
    receiver: Option<String>,
    locals: BTreeSet<String>,
    /// Expression statements not closed by `;`
    open_values: BTreeSet<NodeId>,
    warnings: Vec<ConvertError>,
}

impl<'a> BodyParser<'a> {
    /// Prepare to parse `range` of `source`; `span` locates the range in the file
    pub fn new(
        builder: &'a mut AstBuilder,
        syntax: &'a BodySyntax,
        aliases: &'a SourceAliases,
        source: &'a str,
        range: Range<usize>,
        span: Span,
    ) -> Self {
        let text = source.get(range.clone()).unwrap_or_default();
        let mut tokens = Lexer::new(text, syntax.lexer)
            .with_origin(span.start, range.start)
            .tokenize();
        if !syntax.newline_statements {
            tokens.retain(|t| t.token_type != TokenType::Newline);
        }
        Self {
            builder,
            syntax,
            aliases,
            source,
            tokens,
            current: 0,
            span,
            text: range,
            receiver: None,
            locals: BTreeSet::new(),
            open_values: BTreeSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Name bound to the receiver, for languages that let methods choose it
    pub fn with_receiver(mut self, name: Option<&str>) -> Self {
        self.receiver = name.map(str::to_string);
        self
    }

    /// Names already in scope (parameters)
    pub fn with_locals<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locals.extend(names.into_iter().map(Into::into));
        self
    }

    /// Parse the body and append the resulting block to `parent`.
    ///
    /// Returns the block and the warnings for statements kept verbatim.
    pub fn parse(mut self, parent: NodeId, returns_value: bool) -> (NodeId, Vec<ConvertError>) {
        let block = self.builder.add(parent, NodeKind::Block, self.span);
        self.statements(block, End::Eof);
        if self.syntax.implicit_return && returns_value {
            self.promote_tail(block);
        }
        log::debug!(
            "parsed body at {} into {} statement(s), {} verbatim",
            self.span,
            self.builder.children_of(block).len(),
            self.warnings.len()
        );
        (block, self.warnings)
    }

    /// Parse the whole range as one expression appended to `parent`.
    ///
    /// Text outside the expression subset becomes an `Opaque` node.
    pub fn parse_expression(mut self, parent: NodeId) -> (NodeId, Vec<ConvertError>) {
        let value = self.expression_or_opaque();
        self.builder.append(parent, value);
        (value, self.warnings)
    }

    /// Parse an `= expr` body into a block evaluating (or returning) it
    pub fn parse_expression_body(mut self, parent: NodeId, returns_value: bool) -> (NodeId, Vec<ConvertError>) {
        let block = self.builder.add(parent, NodeKind::Block, self.span);
        let value = self.expression_or_opaque();
        let is_opaque = matches!(self.builder.kind(value), NodeKind::Opaque { .. });
        if returns_value && !is_opaque {
            let span = self.builder.span(value);
            let ret = self.builder.add(block, NodeKind::Return, span);
            self.builder.append(ret, value);
        } else {
            self.builder.append(block, value);
        }
        (block, self.warnings)
    }

    fn skip_layout(&mut self) {
        while matches!(
            self.peek().token_type,
            TokenType::Newline | TokenType::Indent | TokenType::Dedent | TokenType::Semicolon
        ) {
            self.advance();
        }
    }

    fn expression_or_opaque(&mut self) -> NodeId {
        self.skip_layout();
        let parsed = self.expression(0);
        self.skip_layout();
        let failure = match parsed {
            Ok(value) if self.is_at_end() => return value,
            Ok(_) => self.unexpected("the end of the expression"),
            Err(message) => message,
        };
        let text = self.source.get(self.text.clone()).unwrap_or_default().trim().to_string();
        log::debug!("expression at {} kept verbatim: {}", self.span, failure);
        self.warnings.push(
            ConvertError::parse("expression outside the translatable subset was kept verbatim")
                .with_span(self.span)
                .with_note(failure),
        );
        self.builder.node(NodeKind::Opaque { text }, self.span)
    }

    // Token cursor

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, ahead: usize) -> &TokenType {
        &self.tokens[(self.current + ahead).min(self.tokens.len() - 1)].token_type
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn advance(&mut self) -> usize {
        let index = self.current;
        if !self.is_at_end() {
            self.current += 1;
        }
        index
    }

    fn check(&self, token_type: &TokenType) -> bool {
        std::mem::discriminant(&self.peek().token_type) == std::mem::discriminant(token_type)
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_word(&mut self, word: &str) -> bool {
        if self.peek().is(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, token_type: &TokenType, expected: &str) -> Parse<usize> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn identifier(&mut self) -> Parse<String> {
        match self.peek().identifier() {
            Some(name) => {
                let name = name.to_string();
                self.advance();
                Ok(name)
            }
            None => Err(self.unexpected("a name")),
        }
    }

    fn unexpected(&self, expected: &str) -> String {
        format!("expected {}, found {:?}", expected, self.peek().token_type)
    }

    fn skip_newlines(&mut self) {
        while self.match_token(&TokenType::Newline) {}
    }

    fn span_since(&self, start: usize) -> Span {
        let last = self.current.saturating_sub(1).max(start);
        span_between(&self.tokens[start], &self.tokens[last.min(self.tokens.len() - 1)])
    }

    fn node(&mut self, kind: NodeKind, start: usize, children: &[NodeId]) -> NodeId {
        let span = self.span_since(start);
        let id = self.builder.node(kind, span);
        for &child in children {
            self.builder.append(id, child);
        }
        id
    }

    // Statements

    fn at_block_end(&self, end: End) -> bool {
        match self.peek().token_type {
            TokenType::Eof => true,
            TokenType::RightBrace => end == End::Brace,
            TokenType::Dedent => end == End::Dedent,
            _ => false,
        }
    }

    fn skip_separators(&mut self, end: End) {
        loop {
            match self.peek().token_type {
                TokenType::Newline | TokenType::Semicolon => {
                    self.advance();
                }
                // Stray layout at the top of a body carries no structure
                TokenType::Indent | TokenType::Dedent if end == End::Eof => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn statements(&mut self, block: NodeId, end: End) {
        loop {
            self.skip_separators(end);
            if self.at_block_end(end) {
                break;
            }
            let start = self.current;
            match self.statement() {
                Ok(Some(statement)) => self.builder.append(block, statement),
                Ok(None) => {}
                Err(message) => {
                    self.current = start;
                    self.recover(block, &message);
                }
            }
        }
    }

    fn statement(&mut self) -> Parse<Option<NodeId>> {
        if let Some(word) = self.peek().identifier() {
            let word = word.to_string();
            if self.syntax.skip_words.contains(&word.as_str()) {
                self.advance();
                self.terminator()?;
                return Ok(None);
            }
            match word.as_str() {
                "if" => return self.if_statement().map(Some),
                "while" => return self.while_statement().map(Some),
                "return" => return self.return_statement().map(Some),
                w if self.syntax.for_keywords.contains(&w) => return self.for_statement().map(Some),
                w if self.local_keyword(w).is_some() => return self.local_declaration().map(Some),
                _ => {}
            }
        }

        if self.syntax.blocks == Blocks::Braces && self.check(&TokenType::LeftBrace) {
            return self.block().map(Some);
        }

        if self.syntax.local_types == LocalTypes::Leading {
            if let Some(name_at) = self.leading_typed_local() {
                return self.typed_local(name_at, true).map(Some);
            }
        }

        self.simple_statement().map(Some)
    }

    fn local_keyword(&self, word: &str) -> Option<bool> {
        self.syntax
            .local_keywords
            .iter()
            .find(|(keyword, _)| *keyword == word)
            .map(|(_, mutable)| *mutable)
    }

    /// `;`, a newline, or the end of the enclosing construct
    fn terminator(&mut self) -> Parse<bool> {
        match self.peek().token_type {
            TokenType::Semicolon => {
                self.advance();
                Ok(true)
            }
            TokenType::Newline => {
                self.advance();
                Ok(false)
            }
            TokenType::RightBrace | TokenType::Dedent | TokenType::Eof => Ok(false),
            _ if CONTINUATIONS.iter().any(|w| self.peek().is(w)) => Ok(false),
            _ => Err(self.unexpected("end of statement")),
        }
    }

    fn block(&mut self) -> Parse<NodeId> {
        let start = self.current;
        let block = self.builder.node(NodeKind::Block, Span::single(self.peek().location()));
        match self.syntax.blocks {
            Blocks::Braces => {
                if self.match_token(&TokenType::LeftBrace) {
                    self.statements(block, End::Brace);
                    self.consume(&TokenType::RightBrace, "'}'")?;
                } else {
                    // Single-statement body
                    self.skip_newlines();
                    if let Some(statement) = self.statement()? {
                        self.builder.append(block, statement);
                    }
                }
            }
            Blocks::Indentation => {
                self.consume(&TokenType::Colon, "':'")?;
                if self.match_token(&TokenType::Newline) {
                    self.consume(&TokenType::Indent, "an indented block")?;
                    self.statements(block, End::Dedent);
                    self.match_token(&TokenType::Dedent);
                } else if let Some(statement) = self.statement()? {
                    self.builder.append(block, statement);
                }
            }
        }
        let span = self.span_since(start);
        self.builder.set_span(block, span);
        Ok(block)
    }

    fn if_statement(&mut self) -> Parse<NodeId> {
        let start = self.advance();
        let condition = self.expression(1)?;
        let then = self.block()?;
        let mut children = vec![condition, then];

        let resume = self.current;
        if self.syntax.blocks == Blocks::Braces {
            self.skip_newlines();
        }
        let elif = self.syntax.elif_word.is_some_and(|w| self.peek().is(w));
        if elif {
            children.push(self.if_statement()?);
        } else if self.match_word("else") {
            if self.syntax.blocks == Blocks::Braces && self.peek().is("if") {
                children.push(self.if_statement()?);
            } else {
                children.push(self.block()?);
            }
        } else {
            self.current = resume;
        }

        Ok(self.node(NodeKind::If, start, &children))
    }

    fn while_statement(&mut self) -> Parse<NodeId> {
        let start = self.advance();
        let condition = self.expression(1)?;
        let body = self.block()?;
        Ok(self.node(NodeKind::While, start, &[condition, body]))
    }

    fn for_statement(&mut self) -> Parse<NodeId> {
        let start = self.advance();
        let (binding, iterable) = match self.syntax.for_loops {
            ForLoops::Bare => {
                let binding = self.identifier()?;
                if !self.match_word("in") {
                    return Err(self.unexpected("'in'"));
                }
                (binding, self.expression(1)?)
            }
            ForLoops::Parenthesized => {
                self.consume(&TokenType::LeftParen, "'('")?;
                let mut binding = None;
                while !(self.check(&TokenType::Colon) || self.peek().is("in") || self.peek().is("of")) {
                    match &self.peek().token_type {
                        TokenType::Identifier(name) => binding = Some(name.clone()),
                        TokenType::Semicolon | TokenType::Eof | TokenType::RightParen => {
                            return Err("counting loop".to_string())
                        }
                        _ => {}
                    }
                    self.advance();
                }
                self.advance();
                let binding = binding.ok_or_else(|| self.unexpected("a loop variable"))?;
                let iterable = self.expression(1)?;
                self.consume(&TokenType::RightParen, "')'")?;
                (binding, iterable)
            }
            ForLoops::Range => return self.go_for(start),
        };
        let body = self.block()?;
        Ok(self.node(NodeKind::For { binding }, start, &[iterable, body]))
    }

    fn go_for(&mut self, start: usize) -> Parse<NodeId> {
        if self.check(&TokenType::LeftBrace) {
            let condition = self.literal_node(Literal::Bool(true), self.current);
            let body = self.block()?;
            return Ok(self.node(NodeKind::While, start, &[condition, body]));
        }

        let is_range = matches!(
            (self.peek_at(1), self.peek_at(2), self.peek_at(3), self.peek_at(4)),
            (TokenType::Comma, TokenType::Identifier(_), TokenType::ColonEqual, TokenType::Identifier(r)) if r == "range"
        );
        if is_range {
            if !self.peek().is("_") {
                return Err("range loop over index and value".to_string());
            }
            self.current += 2;
            let binding = self.identifier()?;
            self.current += 2;
            let iterable = self.expression(1)?;
            let body = self.block()?;
            return Ok(self.node(NodeKind::For { binding }, start, &[iterable, body]));
        }

        let condition = self.expression(1)?;
        if !self.check(&TokenType::LeftBrace) {
            return Err("counting loop".to_string());
        }
        let body = self.block()?;
        Ok(self.node(NodeKind::While, start, &[condition, body]))
    }

    fn return_statement(&mut self) -> Parse<NodeId> {
        let start = self.advance();
        let ends_here = matches!(
            self.peek().token_type,
            TokenType::Semicolon | TokenType::Newline | TokenType::RightBrace | TokenType::Dedent | TokenType::Eof
        );
        let value = if ends_here { None } else { Some(self.expression(1)?) };
        let node = self.node(NodeKind::Return, start, &[]);
        if let Some(value) = value {
            self.builder.append(node, value);
        }
        self.terminator()?;
        Ok(node)
    }

    fn local_declaration(&mut self) -> Parse<NodeId> {
        let start = self.current;
        let mut mutable = true;
        while let Some(implied) = self.peek().identifier().and_then(|w| self.local_keyword(w)) {
            mutable &= implied;
            self.advance();
        }
        if self.match_word("mut") {
            mutable = true;
        }

        if self.syntax.local_types == LocalTypes::Leading {
            if let Some(name_at) = self.leading_typed_local() {
                let node = self.typed_local(name_at, mutable)?;
                let span = self.span_since(start);
                self.builder.set_span(node, span);
                return Ok(node);
            }
        }

        let name_at = self.current;
        let name = self.identifier()?;
        let local_types = self.syntax.local_types;
        let ty = match local_types {
            LocalTypes::AfterColon if self.match_token(&TokenType::Colon) => Some(self.type_until_value()?),
            LocalTypes::AfterName if !self.at_value_or_end() => Some(self.type_until_value()?),
            _ => None,
        };
        self.finish_local(start, name_at, name, mutable, ty)
    }

    /// `T x = value` where the cursor is at `T` and `name_at` indexes `x`
    fn typed_local(&mut self, name_at: usize, mutable: bool) -> Parse<NodeId> {
        let start = self.current;
        let ty = self.type_between(start, name_at);
        self.current = name_at;
        let name = self.identifier()?;
        self.finish_local(start, name_at, name, mutable, Some(ty))
    }

    fn finish_local(
        &mut self,
        start: usize,
        name_at: usize,
        name: String,
        mutable: bool,
        ty: Option<TypeRef>,
    ) -> Parse<NodeId> {
        let value = if self.match_token(&TokenType::Equal) {
            self.skip_newlines();
            Some(self.expression(1)?)
        } else {
            None
        };
        self.terminator()?;

        self.locals.insert(name.clone());
        let target = self.identifier_node(name, name_at);
        let node = self.node(
            NodeKind::Assign {
                declares: true,
                mutable,
                ty,
            },
            start,
            &[target],
        );
        if let Some(value) = value {
            self.builder.append(node, value);
        }
        Ok(node)
    }

    fn at_value_or_end(&self) -> bool {
        matches!(
            self.peek().token_type,
            TokenType::Equal
                | TokenType::Semicolon
                | TokenType::Newline
                | TokenType::RightBrace
                | TokenType::Eof
        )
    }

    /// Read type text up to a depth-0 `=` or the end of the statement
    fn type_until_value(&mut self) -> Parse<TypeRef> {
        let start = self.current;
        let mut depth = 0usize;
        loop {
            match self.peek().token_type {
                TokenType::Less | TokenType::LeftParen | TokenType::LeftBracket => depth += 1,
                TokenType::Greater | TokenType::RightParen | TokenType::RightBracket => {
                    depth = depth.saturating_sub(1)
                }
                TokenType::Equal | TokenType::Semicolon | TokenType::Newline | TokenType::RightBrace
                    if depth == 0 =>
                {
                    break
                }
                TokenType::Eof => break,
                _ => {}
            }
            self.advance();
        }
        if self.current == start {
            return Err(self.unexpected("a type"));
        }
        Ok(self.type_between(start, self.current))
    }

    fn type_between(&self, first: usize, end: usize) -> TypeRef {
        let from = self.tokens[first].start;
        let to = self.tokens[end.saturating_sub(1).max(first)].end;
        let text = self.source.get(from..to).unwrap_or_default();
        parse_type_or_dynamic(text, self.aliases)
    }

    /// Index of `x` when the cursor starts a `T x =` or `T x;` local
    fn leading_typed_local(&self) -> Option<usize> {
        let first = self.peek().identifier()?;
        if NOT_A_TYPE.contains(&first) || NOT_AN_EXPRESSION.contains(&first) {
            return None;
        }
        let mut angle = 0usize;
        let mut type_complete = false;
        let mut i = self.current;
        while let Some(token) = self.tokens.get(i) {
            match &token.token_type {
                TokenType::Identifier(_) if type_complete && angle == 0 => {
                    let next = &self.tokens.get(i + 1)?.token_type;
                    return matches!(next, TokenType::Equal | TokenType::Semicolon).then_some(i);
                }
                TokenType::Identifier(_) => type_complete = true,
                TokenType::Dot => type_complete = false,
                TokenType::Less => {
                    angle += 1;
                    type_complete = false;
                }
                TokenType::Greater => {
                    angle = angle.checked_sub(1)?;
                    type_complete = true;
                }
                TokenType::Comma if angle > 0 => type_complete = false,
                TokenType::LeftBracket if self.tokens.get(i + 1)?.token_type == TokenType::RightBracket => {
                    i += 1;
                    type_complete = true;
                }
                TokenType::Question => type_complete = true,
                _ => return None,
            }
            i += 1;
        }
        None
    }

    fn simple_statement(&mut self) -> Parse<NodeId> {
        let start = self.current;

        // Annotated first assignment: `x: int = 1`
        if self.syntax.declare_on_assign
            && matches!(self.peek_at(1), TokenType::Colon)
            && self.peek().identifier().is_some()
        {
            let name = self.identifier()?;
            self.advance();
            let ty = self.type_until_value()?;
            return self.finish_local(start, start, name, true, Some(ty));
        }

        let target = self.expression(1)?;
        let node = match self.peek().token_type.clone() {
            TokenType::Equal => {
                self.advance();
                self.skip_newlines();
                let value = self.expression(1)?;
                let declares = self.syntax.declare_on_assign && self.declares_new_name(target);
                self.node(
                    NodeKind::Assign {
                        declares,
                        mutable: true,
                        ty: None,
                    },
                    start,
                    &[target, value],
                )
            }
            TokenType::ColonEqual => {
                let NodeKind::Identifier { name } = self.builder.kind(target).clone() else {
                    return Err("short declaration of several names".to_string());
                };
                self.advance();
                let value = self.expression(1)?;
                self.locals.insert(name);
                self.node(
                    NodeKind::Assign {
                        declares: true,
                        mutable: true,
                        ty: None,
                    },
                    start,
                    &[target, value],
                )
            }
            TokenType::CompoundAssign(symbol) => {
                let op = compound_op(symbol).ok_or_else(|| format!("unsupported operator {}=", symbol))?;
                self.advance();
                let value = self.expression(1)?;
                self.update(start, target, op, value)
            }
            TokenType::Plus | TokenType::Minus if self.peek_at(1) == &self.peek().token_type => {
                let op = if self.check(&TokenType::Plus) { BinaryOp::Add } else { BinaryOp::Sub };
                let at = self.current;
                self.current += 2;
                let one = self.literal_node(Literal::Int(1), at);
                self.update(start, target, op, one)
            }
            _ => {
                let closed = self.terminator()?;
                if !closed {
                    self.open_values.insert(target);
                }
                return Ok(target);
            }
        };
        self.terminator()?;
        Ok(node)
    }

    /// `target = target op value`
    fn update(&mut self, start: usize, target: NodeId, op: BinaryOp, value: NodeId) -> NodeId {
        let current = self.builder.duplicate(target);
        let combined = self.node(NodeKind::Binary { op }, start, &[current, value]);
        self.node(
            NodeKind::Assign {
                declares: false,
                mutable: true,
                ty: None,
            },
            start,
            &[target, combined],
        )
    }

    fn declares_new_name(&mut self, target: NodeId) -> bool {
        match self.builder.kind(target) {
            NodeKind::Identifier { name } => {
                let name = name.clone();
                self.locals.insert(name)
            }
            _ => false,
        }
    }

    // Expressions

    fn expression(&mut self, min_precedence: u8) -> Parse<NodeId> {
        let start = self.current;
        let mut left = self.unary()?;
        while let Some((op, width)) = self.binary_op() {
            if op.precedence() < min_precedence {
                break;
            }
            self.current += width;
            self.skip_newlines();
            let right = self.expression(op.precedence() + 1)?;
            left = self.node(NodeKind::Binary { op }, start, &[left, right]);
        }
        Ok(left)
    }

    /// The binary operator at the cursor and how many tokens spell it
    fn binary_op(&self) -> Option<(BinaryOp, usize)> {
        let op = match &self.peek().token_type {
            TokenType::Plus => BinaryOp::Add,
            TokenType::Minus => BinaryOp::Sub,
            TokenType::Star => BinaryOp::Mul,
            TokenType::Slash => BinaryOp::Div,
            TokenType::Percent => BinaryOp::Rem,
            TokenType::EqualEqual => BinaryOp::Eq,
            TokenType::NotEqual => BinaryOp::Ne,
            TokenType::Less => BinaryOp::Lt,
            TokenType::LessEqual => BinaryOp::Le,
            TokenType::Greater => BinaryOp::Gt,
            TokenType::GreaterEqual => BinaryOp::Ge,
            TokenType::AndAnd => BinaryOp::And,
            TokenType::OrOr => BinaryOp::Or,
            TokenType::Identifier(word) if self.syntax.word_logic => match word.as_str() {
                "and" => BinaryOp::And,
                "or" => BinaryOp::Or,
                "is" if matches!(self.peek_at(1), TokenType::Identifier(n) if n == "not") => {
                    return Some((BinaryOp::Ne, 2))
                }
                "is" => BinaryOp::Eq,
                _ => return None,
            },
            _ => return None,
        };
        // `x++` is an update, not an addition
        if matches!(op, BinaryOp::Add | BinaryOp::Sub) && self.peek_at(1) == &self.peek().token_type {
            return None;
        }
        Some((op, 1))
    }

    fn unary(&mut self) -> Parse<NodeId> {
        let start = self.current;
        let op = match self.peek().token_type {
            TokenType::Minus => Some(UnaryOp::Neg),
            TokenType::Bang => Some(UnaryOp::Not),
            _ if self.syntax.word_logic && self.peek().is("not") => Some(UnaryOp::Not),
            _ => None,
        };
        let Some(op) = op else {
            return self.postfix();
        };
        self.advance();
        let operand = self.unary()?;

        if op == UnaryOp::Neg {
            if let NodeKind::Literal {
                value: Literal::Int(value),
            } = self.builder.kind(operand)
            {
                let negated = Literal::Int(value.wrapping_neg());
                return Ok(self.literal_node(negated, start));
            }
        }
        Ok(self.node(NodeKind::Unary { op }, start, &[operand]))
    }

    fn postfix(&mut self) -> Parse<NodeId> {
        let start = self.current;
        let mut expr = self.primary()?;
        loop {
            // Method chains continued on the next line
            if self.check(&TokenType::Newline) && self.syntax.blocks == Blocks::Braces {
                let mut ahead = 0;
                while self.peek_at(ahead) == &TokenType::Newline {
                    ahead += 1;
                }
                if self.peek_at(ahead) != &TokenType::Dot {
                    break;
                }
                self.skip_newlines();
            }

            match self.peek().token_type {
                TokenType::LeftParen => {
                    self.advance();
                    let mut children = vec![expr];
                    children.extend(self.arguments()?);
                    expr = self.node(NodeKind::Call, start, &children);
                }
                TokenType::Dot | TokenType::PathSep => {
                    self.advance();
                    let field = self.identifier()?;
                    expr = self.node(NodeKind::FieldAccess { field }, start, &[expr]);
                }
                TokenType::Question if self.syntax.try_operator => {
                    self.advance();
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Comma-separated arguments after an opening `(`, through the `)`
    fn arguments(&mut self) -> Parse<Vec<NodeId>> {
        let mut args = Vec::new();
        self.skip_newlines();
        if self.match_token(&TokenType::RightParen) {
            return Ok(args);
        }
        loop {
            self.skip_newlines();
            args.push(self.expression(1)?);
            self.skip_newlines();
            if self.match_token(&TokenType::Comma) {
                self.skip_newlines();
                if self.match_token(&TokenType::RightParen) {
                    return Ok(args);
                }
                continue;
            }
            self.consume(&TokenType::RightParen, "')' after arguments")?;
            return Ok(args);
        }
    }

    fn primary(&mut self) -> Parse<NodeId> {
        let start = self.current;
        let token_type = self.peek().token_type.clone();
        match token_type {
            TokenType::IntLiteral(value) => {
                self.advance();
                Ok(self.literal_node(Literal::Int(value), start))
            }
            TokenType::FloatLiteral(text) => {
                self.advance();
                Ok(self.literal_node(Literal::Float(text), start))
            }
            TokenType::StringLiteral(text) => {
                self.advance();
                Ok(self.literal_node(Literal::Str(text), start))
            }
            TokenType::LeftParen => {
                self.advance();
                self.skip_newlines();
                let inner = self.expression(1)?;
                self.skip_newlines();
                self.consume(&TokenType::RightParen, "')'")?;
                Ok(inner)
            }
            TokenType::Identifier(word) => {
                self.advance();
                self.word(word, start)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn word(&mut self, word: String, start: usize) -> Parse<NodeId> {
        let syntax = self.syntax;
        if word == syntax.true_word {
            Ok(self.literal_node(Literal::Bool(true), start))
        } else if word == syntax.false_word {
            Ok(self.literal_node(Literal::Bool(false), start))
        } else if syntax.null_words.contains(&word.as_str()) {
            Ok(self.literal_node(Literal::Null, start))
        } else if syntax.self_words.contains(&word.as_str()) || self.receiver.as_deref() == Some(word.as_str()) {
            Ok(self.node(NodeKind::SelfRef, start, &[]))
        } else if word == "new" && self.peek().identifier().is_some() {
            self.instantiation(start)
        } else if NOT_AN_EXPRESSION.contains(&word.as_str()) {
            Err(format!("'{}' expression", word))
        } else {
            Ok(self.identifier_node(word, start))
        }
    }

    /// `new X<..>(args)` as a call of `X`
    fn instantiation(&mut self, start: usize) -> Parse<NodeId> {
        let name_at = self.current;
        let mut name = self.identifier()?;
        while self.match_token(&TokenType::Dot) {
            name.push('.');
            name.push_str(&self.identifier()?);
        }
        if self.check(&TokenType::Less) {
            let mut depth = 0usize;
            loop {
                match self.peek().token_type {
                    TokenType::Less => depth += 1,
                    TokenType::Greater => depth = depth.saturating_sub(1),
                    TokenType::Eof | TokenType::Semicolon => return Err(self.unexpected("'>'")),
                    _ => {}
                }
                self.advance();
                if depth == 0 {
                    break;
                }
            }
        }
        let callee = self.identifier_node(name, name_at);
        self.consume(&TokenType::LeftParen, "'(' after constructor name")?;
        let mut children = vec![callee];
        children.extend(self.arguments()?);
        Ok(self.node(NodeKind::Call, start, &children))
    }

    fn literal_node(&mut self, value: Literal, at: usize) -> NodeId {
        let span = Span::single(self.tokens[at.min(self.tokens.len() - 1)].location());
        self.builder.node(NodeKind::Literal { value }, span)
    }

    fn identifier_node(&mut self, name: String, at: usize) -> NodeId {
        let span = Span::single(self.tokens[at.min(self.tokens.len() - 1)].location());
        self.builder.node(NodeKind::Identifier { name }, span)
    }

    // Recovery

    /// Keep the statement at the cursor as verbatim text
    fn recover(&mut self, block: NodeId, message: &str) {
        let first = self.current;
        let last = self.synchronize();
        if self.current == first {
            self.advance();
        }
        let from = self.tokens[first].start;
        let to = self.tokens[last.max(first)].end.max(from);
        let text = self.source.get(from..to).unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return;
        }

        let span = span_between(&self.tokens[first], &self.tokens[last.max(first)]);
        log::debug!("statement at {} kept verbatim: {}", span, message);
        self.builder.add(block, NodeKind::Opaque { text }, span);
        self.warnings.push(
            ConvertError::parse("statement outside the translatable subset was kept verbatim")
                .with_span(span)
                .with_note(message.to_string()),
        );
    }

    /// Skip to the end of the current statement; returns the index of its
    /// last token
    fn synchronize(&mut self) -> usize {
        let mut depth = 0usize;
        let mut last = self.current;
        loop {
            match self.peek().token_type {
                TokenType::Eof => return last,
                TokenType::LeftParen | TokenType::LeftBracket | TokenType::LeftBrace => depth += 1,
                TokenType::RightParen | TokenType::RightBracket => depth = depth.saturating_sub(1),
                TokenType::RightBrace if depth == 0 => return last,
                TokenType::RightBrace => {
                    depth -= 1;
                    if depth == 0 && self.syntax.blocks == Blocks::Braces {
                        last = self.advance();
                        if self.check(&TokenType::Semicolon) {
                            return self.advance();
                        }
                        if self.continues_compound(true) {
                            continue;
                        }
                        return last;
                    }
                }
                TokenType::Semicolon if depth == 0 => return self.advance(),
                TokenType::Dedent if depth == 0 => return last,
                TokenType::Newline if depth == 0 => {
                    if self.syntax.blocks == Blocks::Indentation && self.peek_at(1) == &TokenType::Indent {
                        last = self.skip_suite();
                        if self.continues_compound(false) {
                            continue;
                        }
                    }
                    return last;
                }
                _ => {}
            }
            last = self.advance();
        }
    }

    /// Consume `Newline Indent ... Dedent`; returns the index of the `Dedent`
    fn skip_suite(&mut self) -> usize {
        self.advance();
        let mut level = 0usize;
        loop {
            let index = self.advance();
            match self.tokens[index].token_type {
                TokenType::Indent => level += 1,
                TokenType::Dedent => {
                    level = level.saturating_sub(1);
                    if level == 0 {
                        return index;
                    }
                }
                TokenType::Eof => return index,
                _ => {}
            }
        }
    }

    fn continues_compound(&mut self, skip_newlines: bool) -> bool {
        let mut ahead = 0;
        if skip_newlines {
            while self.peek_at(ahead) == &TokenType::Newline {
                ahead += 1;
            }
        }
        let continues = matches!(self.peek_at(ahead), TokenType::Identifier(w) if CONTINUATIONS.contains(&w.as_str()));
        if continues {
            self.current += ahead;
        }
        continues
    }

    // Implicit block values

    /// Turn the trailing open expression of `block` (and of trailing `if`
    /// branches) into a `Return`
    fn promote_tail(&mut self, block: NodeId) {
        let Some(&last) = self.builder.children_of(block).last() else {
            return;
        };
        if self.open_values.contains(&last) {
            let index = self.builder.children_of(block).len() - 1;
            let span = self.builder.span(last);
            let ret = self.builder.node(NodeKind::Return, span);
            self.builder.append(ret, last);
            self.builder.insert(block, index, ret);
        } else if matches!(self.builder.kind(last), NodeKind::If) {
            self.promote_if(last);
        }
    }

    fn promote_if(&mut self, node: NodeId) {
        let branches: Vec<NodeId> = self.builder.children_of(node).iter().skip(1).copied().collect();
        for branch in branches {
            match self.builder.kind(branch) {
                NodeKind::Block => self.promote_tail(branch),
                NodeKind::If => self.promote_if(branch),
                _ => {}
            }
        }
    }
}

fn compound_op(symbol: char) -> Option<BinaryOp> {
    match symbol {
        '+' => Some(BinaryOp::Add),
        '-' => Some(BinaryOp::Sub),
        '*' => Some(BinaryOp::Mul),
        '/' => Some(BinaryOp::Div),
        '%' => Some(BinaryOp::Rem),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Ast, NodeRef};
    use crate::error::SourceLocation;

    fn parse(source: &str, syntax: BodySyntax, aliases: SourceAliases, returns_value: bool) -> (Ast, Vec<ConvertError>) {
        let mut builder = AstBuilder::new("test");
        let root = builder.root();
        let span = Span::single(SourceLocation::new(1, 1));
        let (_, warnings) = BodyParser::new(&mut builder, &syntax, &aliases, source, 0..source.len(), span)
            .with_locals(["n"])
            .parse(root, returns_value);
        (builder.finish(), warnings)
    }

    /// Compact s-expression rendering of a subtree
    fn shape(node: NodeRef<'_>) -> String {
        match node.kind() {
            NodeKind::Identifier { name } => name.clone(),
            NodeKind::Literal { value } => match value {
                Literal::Int(v) => v.to_string(),
                Literal::Float(v) => v.clone(),
                Literal::Str(v) => format!("{:?}", v),
                Literal::Bool(v) => v.to_string(),
                Literal::Null => "null".to_string(),
            },
            NodeKind::Opaque { text } => format!("<{}>", text),
            kind => {
                let label = match kind {
                    NodeKind::Binary { op } => op.symbol().to_string(),
                    NodeKind::Unary { op } => format!("{:?}", op).to_lowercase(),
                    NodeKind::FieldAccess { field } => format!(".{}", field),
                    NodeKind::For { binding } => format!("for {}", binding),
                    NodeKind::Assign { declares: true, mutable, .. } => {
                        if *mutable { "var".to_string() } else { "let".to_string() }
                    }
                    other => other.name().to_string(),
                };
                let children: Vec<String> = node.children().map(shape).collect();
                if children.is_empty() {
                    format!("({})", label)
                } else {
                    format!("({} {})", label, children.join(" "))
                }
            }
        }
    }

    fn body(ast: &Ast) -> String {
        ast.root().child(0).map(shape).unwrap_or_default()
    }

    #[test]
    fn test_rust_locals_and_tail_expression() {
        let source = "let mut total = n * 2;\ntotal += 1;\nif total > 10 { total } else { -1 }";
        let (ast, warnings) = parse(source, BodySyntax::rust(), SourceAliases::rust(), true);
        assert!(warnings.is_empty(), "{:?}", warnings);
        assert_eq!(
            body(&ast),
            "(block (var total (* n 2)) (assign total (+ total 1)) \
             (if (> total 10) (block (return total)) (block (return -1))))"
        );
    }

    #[test]
    fn test_rust_tail_is_not_promoted_in_unit_functions() {
        let (ast, _) = parse("self.log(n)", BodySyntax::rust(), SourceAliases::rust(), false);
        assert_eq!(body(&ast), "(block (call (.log (self)) n))");
    }

    #[test]
    fn test_python_first_assignment_declares() {
        let source = "\n    x = n\n    x = x + 1\n    if x is None:\n        return 0\n    elif not x:\n        pass\n    else:\n        self.count = x\n";
        let (ast, warnings) = parse(source, BodySyntax::python(), SourceAliases::python(), true);
        assert!(warnings.is_empty(), "{:?}", warnings);
        assert_eq!(
            body(&ast),
            "(block (var x n) (assign x (+ x 1)) \
             (if (== x null) (block (return 0)) (if (not x) (block) (block (assign (.count (self)) x)))))"
        );
    }

    #[test]
    fn test_java_typed_locals_and_foreach() {
        let source = "final List<String> names = new ArrayList<>();\nfor (String s : items) {\n    names.add(s);\n}\nreturn names;";
        let (ast, warnings) = parse(source, BodySyntax::java(), SourceAliases::java(), true);
        assert!(warnings.is_empty(), "{:?}", warnings);
        assert_eq!(
            body(&ast),
            "(block (let names (call ArrayList)) (for s items (block (call (.add names) s))) (return names))"
        );
        let local = ast.root().child(0).and_then(|b| b.child(0)).expect("local");
        match local.kind() {
            NodeKind::Assign { ty: Some(ty), .. } => assert_eq!(ty.to_string(), "list<string>"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_go_range_loop_and_receiver() {
        let source = "\n\tsum := 0\n\tfor _, v := range c.values {\n\t\tsum += v\n\t}\n\tc.total = sum\n\treturn sum\n";
        let mut builder = AstBuilder::new("test");
        let root = builder.root();
        let syntax = BodySyntax::go();
        let aliases = SourceAliases::go();
        let (_, warnings) = BodyParser::new(&mut builder, &syntax, &aliases, source, 0..source.len(), Span::default())
            .with_receiver(Some("c"))
            .parse(root, true);
        assert!(warnings.is_empty(), "{:?}", warnings);
        assert_eq!(
            body(&builder.finish()),
            "(block (var sum 0) (for v (.values (self)) (block (assign sum (+ sum v)))) \
             (assign (.total (self)) sum) (return sum))"
        );
    }

    #[test]
    fn test_unsupported_statement_becomes_opaque_and_parsing_resumes() {
        let source = "let x = 1;\nmatch x {\n    1 => println!(\"one\"),\n    _ => {}\n}\nreturn x;";
        let (ast, warnings) = parse(source, BodySyntax::rust(), SourceAliases::rust(), true);
        assert_eq!(warnings.len(), 1);
        let block = ast.root().child(0).expect("block");
        assert_eq!(block.child_count(), 3);
        let opaque = block.child(1).and_then(|n| n.opaque_text()).expect("opaque");
        assert!(opaque.starts_with("match x {"));
        assert!(opaque.ends_with('}'));
        assert_eq!(block.child(2).map(|n| n.kind().name()), Some("return"));
    }

    #[test]
    fn test_python_compound_statement_kept_whole() {
        let source = "\n    try:\n        go()\n    except E:\n        pass\n    return 1\n";
        let (ast, warnings) = parse(source, BodySyntax::python(), SourceAliases::python(), true);
        assert_eq!(warnings.len(), 1);
        let block = ast.root().child(0).expect("block");
        assert_eq!(block.child_count(), 2);
        let opaque = block.child(0).and_then(|n| n.opaque_text()).expect("opaque");
        assert!(opaque.starts_with("try:") && opaque.contains("except E:"));
    }

    #[test]
    fn test_increment_and_kotlin_single_statement_branches() {
        let source = "var i = 0\ni++\nif (i > 1) return i else return 0\n";
        let (ast, warnings) = parse(source, BodySyntax::kotlin(), SourceAliases::kotlin(), true);
        assert!(warnings.is_empty(), "{:?}", warnings);
        assert_eq!(
            body(&ast),
            "(block (var i 0) (assign i (+ i 1)) (if (> i 1) (block (return i)) (block (return 0))))"
        );
    }

    #[test]
    fn test_expression_body_returns_its_value() {
        let syntax = BodySyntax::kotlin();
        let aliases = SourceAliases::kotlin();
        let source = "x * 2";
        let mut builder = AstBuilder::new("test");
        let root = builder.root();
        let span = Span::single(SourceLocation::new(1, 1));
        let (_, warnings) = BodyParser::new(&mut builder, &syntax, &aliases, source, 0..source.len(), span)
            .parse_expression_body(root, true);
        assert!(warnings.is_empty());
        assert_eq!(body(&builder.finish()), "(block (return (* x 2)))");
    }

    #[test]
    fn test_default_value_outside_subset_is_opaque() {
        let syntax = BodySyntax::python();
        let aliases = SourceAliases::python();
        let source = "field(default_factory=list)";
        let mut builder = AstBuilder::new("test");
        let root = builder.root();
        let span = Span::single(SourceLocation::new(1, 1));
        let (_, warnings) = BodyParser::new(&mut builder, &syntax, &aliases, source, 0..source.len(), span)
            .parse_expression(root);
        assert_eq!(warnings.len(), 1);
        let ast = builder.finish();
        assert_eq!(ast.root().child(0).and_then(|n| n.opaque_text()), Some(source));
    }
}
