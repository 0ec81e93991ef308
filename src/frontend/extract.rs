//! Table-driven declaration extraction
//!
//! One pass per nesting level: split the masked text into items, strip
//! attributes, then try the table's templates in priority order (ignorable
//! items, containers, types, impl blocks, functions, embedded bases, fields).
//! Items that match nothing become opaque declarations with a `ParseError`.
//! Function bodies and default values go to the [`BodyParser`].

use super::body::BodyParser;
use super::scan::{self, LineIndex};
use super::strip::strip;
use super::syntax::{
    BaseMarker, BaseRule, Members, MissingReturn, Opener, ParamStyle, ParenRole, Place, SyntaxTable,
};
use super::typetext::parse_type_or_dynamic;
use crate::ast::{
    Ast, AstBuilder, BaseKind, BaseRelation, FieldDecl, FunctionDecl, Literal, NodeId, NodeKind,
    ParamDecl, TypeDecl, TypeKind, UnaryOp, Visibility,
};
use crate::comments::{doc_text, Comment};
use crate::error::{ConvertError, Diagnostics, ErrorKind, Span};
use crate::mapping::SourceAliases;
use crate::naming::is_dunder;
use crate::types::{TypeCategory, TypeRef};
use regex::Captures;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

/// Result of extracting one file
#[derive(Debug)]
pub struct Extraction {
    pub ast: Ast,
    pub diagnostics: Diagnostics,
}

impl Extraction {
    /// Declaration-level spans that were kept verbatim
    pub fn unparsed_spans(&self) -> Vec<Span> {
        self.diagnostics
            .errors()
            .iter()
            .filter(|e| e.kind == ErrorKind::ParseError)
            .filter_map(|e| e.context.span)
            .collect()
    }
}

/// Extract `source` with `table`
pub fn extract(table: &SyntaxTable, aliases: &SourceAliases, source: &str) -> Extraction {
    let stripped = strip(source, &table.strip);
    let extractor = Extractor {
        table,
        aliases,
        source,
        masked: &stripped.masked,
        comments: &stripped.comments,
        lines: LineIndex::new(source),
        builder: AstBuilder::new(table.language),
        diagnostics: Diagnostics::new(),
        types: BTreeMap::new(),
        detached: Vec::new(),
        hoisted: Vec::new(),
    };
    extractor.run()
}

#[derive(Debug, Clone)]
struct Owner {
    name: String,
    kind: TypeKind,
}

#[derive(Debug, Clone)]
struct Context {
    place: Place,
    owner: Option<Owner>,
    /// Words inherited from an enclosing group (`const`, `companion`)
    inherited: Vec<String>,
    /// Members of a trait implementation
    public_members: bool,
}

impl Context {
    fn top() -> Self {
        Self {
            place: Place::TopLevel,
            owner: None,
            inherited: Vec::new(),
            public_members: false,
        }
    }

    fn members_of(name: &str, kind: TypeKind) -> Self {
        Self {
            place: Place::Member,
            owner: Some(Owner {
                name: name.to_string(),
                kind,
            }),
            inherited: Vec::new(),
            public_members: false,
        }
    }
}

#[derive(Debug)]
struct Attribute {
    /// Last path segment of the attribute name
    name: String,
    text: String,
}

/// Methods declared away from their type (Rust `impl`, Go receivers)
#[derive(Debug)]
struct Detached {
    owner: String,
    /// Detached block holding the methods
    holder: NodeId,
    /// Program index at the point of declaration
    position: usize,
    implements: Option<TypeRef>,
    span: Span,
}

#[derive(Debug)]
struct TypeMatch {
    name: String,
    words: Vec<String>,
    kind: TypeKind,
    generics: Option<Range<usize>>,
    parens: Option<(ParenRole, Range<usize>)>,
    extends: Option<Range<usize>>,
    implements: Option<Range<usize>>,
    bases: Option<Range<usize>>,
    body: Option<Range<usize>>,
    members: Members,
    range: Range<usize>,
}

#[derive(Debug)]
struct ImplMatch {
    name: String,
    implements: Option<Range<usize>>,
    members: Option<Range<usize>>,
    range: Range<usize>,
}

#[derive(Debug, Clone)]
enum FnBody {
    Missing,
    Block(Range<usize>),
    Expr(Range<usize>),
}

#[derive(Debug)]
struct FunctionMatch {
    name: String,
    words: Vec<String>,
    generics: Option<Range<usize>>,
    receiver: Option<Range<usize>>,
    params: Range<usize>,
    ret: Option<Range<usize>>,
    throws: Option<Range<usize>>,
    body: FnBody,
    range: Range<usize>,
}

#[derive(Debug)]
struct FieldMatch {
    names: Vec<String>,
    words: Vec<String>,
    ty: Option<Range<usize>>,
    default: Option<Range<usize>>,
    optional_marker: bool,
    /// `Some(mutable)` for properties with accessor lists
    setter: Option<bool>,
    range: Range<usize>,
}

#[derive(Debug, Clone)]
struct ParamSpec {
    name: String,
    words: Vec<String>,
    ty: Option<String>,
    default: Option<Range<usize>>,
    optional: bool,
    /// Collected into a list (`*args`, `vararg`)
    collects: bool,
    /// Collected into a map (`**kwargs`)
    collects_named: bool,
    /// Source text of the whole parameter
    text: String,
    range: Range<usize>,
}

fn group(caps: &Captures<'_>, name: &str, base: usize) -> Option<Range<usize>> {
    caps.name(name)
        .map(|m| base + m.start()..base + m.end())
        .filter(|r| !r.is_empty())
}

fn words_of(caps: &Captures<'_>, names: &[&str]) -> Vec<String> {
    names
        .iter()
        .filter_map(|name| caps.name(name))
        .flat_map(|m| m.as_str().split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

fn skip_space(bytes: &[u8], mut i: usize, end: usize) -> usize {
    while i < end && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Offset of the `>` closing the `<` at `open`
fn matching_angle(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        let prev = if i > 0 { bytes[i - 1] } else { b' ' };
        match b {
            b'<' | b'(' | b'[' => depth += 1,
            b'>' if prev != b'-' && prev != b'=' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            b')' | b']' => depth = depth.checked_sub(1)?,
            b'{' | b'}' | b';' => return None,
            _ => {}
        }
    }
    None
}

/// Last path segment of a type or attribute name
fn last_segment(name: &str) -> &str {
    let name = name.split(['<', '[', '(']).next().unwrap_or(name).trim();
    name.rsplit(['.', ':']).next().unwrap_or(name)
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Depth-0 `=` that is an assignment rather than part of `==`, `=>`, `<=`...
fn find_assign(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' | b'<' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'>' if i > 0 && bytes[i - 1] != b'=' && bytes[i - 1] != b'-' => depth = depth.saturating_sub(1),
            b'=' if depth == 0 => {
                let prev = if i > 0 { bytes[i - 1] } else { b' ' };
                let next = bytes.get(i + 1).copied().unwrap_or(b' ');
                if !matches!(prev, b'=' | b'!' | b'<' | b'>' | b':') && !matches!(next, b'=' | b'>') {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Trim blank edges and common indentation from docstring text
fn dedent(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let first = lines.iter().position(|l| !l.is_empty())?;
    let last = lines.iter().rposition(|l| !l.is_empty())?;
    Some(lines[first..=last].join("\n"))
}

struct Extractor<'a> {
    table: &'a SyntaxTable,
    aliases: &'a SourceAliases,
    source: &'a str,
    masked: &'a str,
    comments: &'a [Comment],
    lines: LineIndex,
    builder: AstBuilder,
    diagnostics: Diagnostics,
    /// First declaration of each type name
    types: BTreeMap<String, NodeId>,
    detached: Vec<Detached>,
    /// Nested types waiting to be placed after their top-level ancestor
    hoisted: Vec<NodeId>,
}

impl<'a> Extractor<'a> {
    fn run(mut self) -> Extraction {
        let root = self.builder.root();
        self.items(root, 0..self.masked.len(), &Context::top());
        self.attach_detached();
        if self.table.body.implicit_members {
            self.resolve_members(root);
        }
        let ast = self.builder.finish();
        log::debug!(
            "extracted {} declaration(s) from {} source, {} unparsed",
            ast.root().child_count(),
            self.table.language,
            self.diagnostics.count_of(ErrorKind::ParseError)
        );
        Extraction {
            ast,
            diagnostics: self.diagnostics,
        }
    }

    fn span(&self, range: &Range<usize>) -> Span {
        self.lines.span(range)
    }

    fn text(&self, range: &Range<usize>) -> &'a str {
        self.source.get(range.clone()).unwrap_or_default().trim()
    }

    fn items(&mut self, parent: NodeId, range: Range<usize>, ctx: &Context) {
        let mut prev_end = range.start;
        for item in scan::items(self.masked, range, &self.table.scan) {
            let end = item.end;
            self.item(parent, item, prev_end, ctx);
            prev_end = end;
            if ctx.place != Place::Member {
                for nested in std::mem::take(&mut self.hoisted) {
                    self.builder.append(parent, nested);
                }
            }
        }
    }

    fn item(&mut self, parent: NodeId, range: Range<usize>, prev_end: usize, ctx: &Context) {
        let doc = self.leading_doc(prev_end, range.start);
        let (start, attributes) = self.strip_attributes(range.clone());
        if start >= range.end {
            return;
        }
        let range = start..range.end;
        let masked = self.masked;
        let text = &masked[range.clone()];

        if self.table.ignore.iter().any(|pattern| pattern.is_match(text)) {
            log::trace!("ignored item at {}", self.span(&range));
            return;
        }
        if self.container(parent, text, range.start, ctx) {
            return;
        }
        if let Some(found) = self.match_type(text, &range) {
            self.type_decl(parent, found, ctx, doc);
            return;
        }
        if let Some(found) = self.match_impl(text, &range) {
            self.impl_block(found, ctx);
            return;
        }
        if let Some(found) = self.match_function(text, &range, ctx) {
            self.function(parent, found, ctx, doc, &attributes);
            return;
        }
        if self.embedded(parent, text, ctx) {
            return;
        }
        if let Some(found) = self.match_field(text, &range, ctx) {
            self.fields(parent, found, ctx, doc);
            return;
        }
        self.opaque(parent, range);
    }

    /// The run of comments directly above `start`, without blank lines
    fn leading_doc(&self, prev_end: usize, start: usize) -> Option<String> {
        let before = self.comments.partition_point(|c| c.end <= start);
        let mut run: Vec<&Comment> = Vec::new();
        let mut boundary = start;
        for comment in self.comments[..before].iter().rev() {
            if comment.start < prev_end {
                break;
            }
            let gap = self.source.get(comment.end..boundary).unwrap_or_default();
            if gap.matches('\n').count() > 1 || comment.content.starts_with("//!") {
                break;
            }
            run.push(comment);
            boundary = comment.start;
        }
        // A comment trailing the previous item's line is not documentation
        if let Some(first) = run.last() {
            let between = self.source.get(prev_end..first.start).unwrap_or_default();
            if prev_end > 0 && !between.contains('\n') {
                run.pop();
            }
        }
        run.reverse();
        doc_text(run)
    }

    fn strip_attributes(&self, range: Range<usize>) -> (usize, Vec<Attribute>) {
        let bytes = self.masked.as_bytes();
        let mut start = range.start;
        let mut attributes = Vec::new();
        let Some(pattern) = &self.table.attributes else {
            return (start, attributes);
        };
        while start < range.end {
            let Some(found) = pattern.find(&self.masked[start..range.end]) else {
                break;
            };
            let mut end = start + found.end();
            if bytes[end - 1] == b'[' {
                match scan::matching_close(self.masked, end - 1) {
                    Some(close) if close < range.end => end = close + 1,
                    _ => break,
                }
            } else if end < range.end && bytes[end] == b'(' {
                match scan::matching_close(self.masked, end) {
                    Some(close) if close < range.end => end = close + 1,
                    _ => break,
                }
            }
            let text = self.source[start..end].to_string();
            let name = text.trim_start_matches(['#', '!', '@', '[', ' ']);
            let name = name
                .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.' || c == ':'))
                .next()
                .unwrap_or_default();
            attributes.push(Attribute {
                name: last_segment(name).to_string(),
                text,
            });
            start = skip_space(bytes, end, range.end);
        }
        (start, attributes)
    }

    fn opaque(&mut self, parent: NodeId, range: Range<usize>) {
        let text = self.text(&range).to_string();
        let span = self.span(&range);
        let first_line = text.lines().next().unwrap_or_default().to_string();
        log::warn!("declaration at {} matched no template and was kept verbatim", span);
        self.builder.add(parent, NodeKind::Opaque { text }, span);
        self.diagnostics.add_error(
            ConvertError::parse("declaration outside the translatable subset was kept verbatim")
                .with_span(span)
                .with_note(first_line),
        );
    }

    // Containers

    fn container(&mut self, parent: NodeId, text: &str, base: usize, ctx: &Context) -> bool {
        let Some(caps) = self.table.containers.iter().find_map(|pattern| pattern.captures(text)) else {
            return false;
        };
        let mods = words_of(&caps, &["mods"]);
        let members = caps.name("members").map(|m| base + m.start()..base + m.end());
        let mut inner = ctx.clone();
        if !mods.is_empty() && ctx.place != Place::Member {
            inner.place = Place::Grouped;
        }
        inner.inherited.extend(mods);
        if let Some(members) = members {
            self.items(parent, members, &inner);
        }
        true
    }

    // Types

    fn match_type(&self, text: &str, range: &Range<usize>) -> Option<TypeMatch> {
        let bytes = self.masked.as_bytes();
        let end = range.end;
        for template in &self.table.types {
            let Some(caps) = template.head.captures(text) else {
                continue;
            };
            let mut pos = skip_space(bytes, range.start + caps.get(0).map_or(0, |m| m.end()), end);

            let mut generics = None;
            let generic_close = match bytes.get(pos) {
                Some(b'<') => matching_angle(self.masked, pos),
                Some(b'[') if self.aliases.bracket_generics => scan::matching_close(self.masked, pos),
                _ => None,
            };
            if let Some(close) = generic_close.filter(|&c| c < end) {
                generics = Some(pos..close + 1);
                pos = skip_space(bytes, close + 1, end);
            }

            let mut parens = None;
            if let (Some(role), Some(b'(')) = (template.parens, bytes.get(pos)) {
                let Some(close) = scan::matching_close(self.masked, pos).filter(|&c| c < end) else {
                    continue;
                };
                parens = Some((role, pos + 1..close));
                pos = close + 1;
            }

            let (tail_end, body) = match self.table.opener {
                Opener::Brace => match scan::find_top_level(self.masked, pos, b'{').filter(|&i| i < end) {
                    Some(open) => match scan::matching_close(self.masked, open).filter(|&c| c < end) {
                        Some(close) => (open, Some(open + 1..close)),
                        None => continue,
                    },
                    None => (end, None),
                },
                Opener::Colon => match scan::find_top_level(self.masked, pos, b':').filter(|&i| i < end) {
                    Some(colon) => (colon, Some(colon + 1..end)),
                    None => continue,
                },
            };
            let tail_start = pos.min(tail_end);
            let Some(tail) = template.tail.captures(&self.masked[tail_start..tail_end]) else {
                continue;
            };

            let words = words_of(&caps, &["vis", "mods"]);
            let mut kind = template
                .kind
                .or_else(|| caps.name("kind").and_then(|k| self.table.kind_of(k.as_str())))
                .or_else(|| tail.name("kind").and_then(|k| self.table.kind_of(k.as_str())))
                .unwrap_or(TypeKind::Class);
            if words.iter().any(|w| w == "enum") {
                kind = TypeKind::Enum;
            }
            let members = if kind == TypeKind::Enum && self.table.opener == Opener::Brace {
                Members::Variants
            } else {
                template.members
            };

            return Some(TypeMatch {
                name: caps.name("name").map(|m| m.as_str().to_string()).unwrap_or_default(),
                words,
                kind,
                generics,
                parens,
                extends: group(&tail, "extends", tail_start),
                implements: group(&tail, "implements", tail_start),
                bases: group(&tail, "bases", tail_start),
                body,
                members,
                range: range.clone(),
            });
        }
        None
    }

    fn type_decl(&mut self, parent: NodeId, found: TypeMatch, ctx: &Context, doc: Option<String>) {
        let span = self.span(&found.range);
        let mut kind = found.kind;
        let mut type_params = self.type_params(found.generics.as_ref());

        let mut listed: Vec<(Range<usize>, Option<BaseKind>)> = Vec::new();
        if let Some(r) = &found.extends {
            listed.push((r.clone(), Some(BaseKind::Extends)));
        }
        if let Some(r) = &found.implements {
            listed.push((r.clone(), Some(BaseKind::Implements)));
        }
        if let Some(r) = &found.bases {
            listed.push((r.clone(), None));
        }
        if let Some((ParenRole::Bases, r)) = &found.parens {
            listed.push((r.clone(), None));
        }

        let mut bases = Vec::new();
        for (range, explicit) in listed {
            let text = &self.source[range.clone()];
            let separator = if explicit == Some(BaseKind::Extends) { b',' } else { self.table.base_separator };
            for part in scan::split_top_level(text, separator, true) {
                let part = text[part].trim();
                if part.starts_with('\'') || part.starts_with('?') || part.contains('=') {
                    continue;
                }
                let part = part.split(" by ").next().unwrap_or(part).trim();
                let name = last_segment(part);
                match self.table.marker_bases.iter().find(|(n, _)| *n == name).map(|(_, m)| *m) {
                    Some(BaseMarker::Ignore) => continue,
                    Some(BaseMarker::Enum) => {
                        kind = TypeKind::Enum;
                        continue;
                    }
                    Some(marker @ (BaseMarker::Interface | BaseMarker::Generic)) => {
                        if marker == BaseMarker::Interface {
                            kind = TypeKind::Interface;
                        }
                        if type_params.is_empty() {
                            let ty = parse_type_or_dynamic(part, self.aliases);
                            type_params = ty.args.iter().map(|a| a.base_name.clone()).collect();
                        }
                        continue;
                    }
                    None => {}
                }
                let invoked = part.contains('(');
                let type_text = part.split('(').next().unwrap_or(part);
                let base_kind = explicit.unwrap_or_else(|| match self.table.base_rule {
                    BaseRule::Invoked if invoked => BaseKind::Extends,
                    BaseRule::Invoked => BaseKind::Implements,
                    BaseRule::InterfacePrefix => {
                        let mut chars = name.chars();
                        let prefixed = chars.next() == Some('I') && chars.next().is_some_and(char::is_uppercase);
                        if prefixed {
                            BaseKind::Implements
                        } else {
                            BaseKind::Extends
                        }
                    }
                    BaseRule::AllInterfaces => BaseKind::Implements,
                    BaseRule::AllClasses => BaseKind::Extends,
                });
                bases.push(BaseRelation {
                    ty: parse_type_or_dynamic(type_text, self.aliases),
                    kind: base_kind,
                });
            }
        }
        if matches!(kind, TypeKind::Interface | TypeKind::Struct) {
            for base in &mut bases {
                base.kind = BaseKind::Implements;
            }
        }

        let mut doc = doc;
        let body = found.body.clone().map(|body| {
            let (rest, docstring) = self.split_docstring(body);
            doc = doc.take().or(docstring);
            rest
        });

        let name = found.name.trim_start_matches('#').to_string();
        let decl = TypeDecl {
            name: name.clone(),
            kind,
            visibility: self.visibility(&found.words, &found.name, ctx),
            bases,
            type_params,
            variants: Vec::new(),
            doc,
        };
        let node = if ctx.place == Place::Member {
            let node = self.builder.node(NodeKind::Type(decl), span);
            self.hoisted.push(node);
            node
        } else {
            self.builder.add(parent, NodeKind::Type(decl), span)
        };
        self.types.entry(name.clone()).or_insert(node);
        log::debug!("extracted type {} at {}", name, span);

        if let Some((ParenRole::Fields, r)) = &found.parens {
            self.paren_fields(node, r.clone(), kind);
        }
        let member_ctx = Context::members_of(&name, kind);
        if let Some(body) = body {
            match found.members {
                Members::Items => self.items(node, body, &member_ctx),
                Members::CommaFields => self.comma_fields(node, body, &member_ctx),
                Members::Variants => self.variants(node, body, &member_ctx),
            }
        }

        if self.table.constructor_fields {
            self.constructor_fields(node);
        }
        if kind == TypeKind::Enum && found.members == Members::Items {
            self.fields_to_variants(node);
        }
    }

    /// Fields declared in a primary-constructor or tuple list
    fn paren_fields(&mut self, owner: NodeId, range: Range<usize>, kind: TypeKind) {
        let positional = self.table.params == ParamStyle::NameColonType;
        for (index, part) in scan::split_top_level(&self.masked[range.clone()], b',', true)
            .into_iter()
            .enumerate()
        {
            let abs = range.start + part.start..range.start + part.end;
            let (start, _) = self.strip_attributes(abs.clone());
            let abs = start..abs.end;
            let text = &self.masked[abs.clone()];
            let spec = if positional && scan::find_top_level(text, 0, b':').is_none() {
                // Tuple field: the text is its type
                let mut words: Vec<String> = Vec::new();
                let mut ty = self.text(&abs);
                if let Some(rest) = ty.strip_prefix("pub") {
                    words.push("pub".to_string());
                    ty = rest.trim_start();
                }
                ParamSpec {
                    name: format!("_{}", index),
                    words,
                    ty: Some(ty.to_string()),
                    default: None,
                    optional: false,
                    collects: false,
                    collects_named: false,
                    text: self.text(&abs).to_string(),
                    range: abs.clone(),
                }
            } else {
                match self.param(abs.clone()) {
                    Some(spec) => spec,
                    None => continue,
                }
            };

            let visibility = match self.table.visibility_of(&spec.words) {
                Some(v) => v,
                None if matches!(kind, TypeKind::Struct) || self.table.visibility_words.is_empty() => {
                    self.table.member_visibility
                }
                None => Visibility::Public,
            };
            let mutable = if SyntaxTable::has_word(self.table.mutable_words, &spec.words) {
                true
            } else {
                !SyntaxTable::has_word(self.table.immutable_words, &spec.words) && self.table.mutable_words.is_empty()
            };
            let decl = FieldDecl {
                name: spec.name.clone(),
                ty: self.param_type(&spec),
                visibility,
                mutable,
                optional: spec.optional || spec.default.is_some(),
                is_static: false,
                doc: None,
            };
            let span = self.span(&spec.range);
            let node = self.builder.add(owner, NodeKind::Field(decl), span);
            if let Some(default) = spec.default {
                self.default_value(node, default, None);
            }
        }
    }

    /// Comma-separated fields of a brace body (Rust structs)
    fn comma_fields(&mut self, owner: NodeId, body: Range<usize>, ctx: &Context) {
        let mut prev_end = body.start;
        for part in scan::split_top_level(&self.masked[body.clone()], b',', true) {
            let abs = body.start + part.start..body.start + part.end;
            let doc = self.leading_doc(prev_end, abs.start);
            prev_end = abs.end;
            let (start, _) = self.strip_attributes(abs.clone());
            let abs = start..abs.end;
            let text = &self.masked[abs.clone()];
            match self.match_field(text, &abs, ctx) {
                Some(found) => self.fields(owner, found, ctx, doc),
                None => self.opaque(owner, abs),
            }
        }
    }

    fn variants(&mut self, owner: NodeId, body: Range<usize>, ctx: &Context) {
        let section_end = scan::find_top_level(self.masked, body.start, b';')
            .filter(|&i| i < body.end)
            .unwrap_or(body.end);
        let mut names = Vec::new();
        for part in scan::split_top_level(&self.masked[body.start..section_end], b',', false) {
            let abs = body.start + part.start..body.start + part.end;
            let (start, _) = self.strip_attributes(abs.clone());
            let abs = start..abs.end;
            if abs.is_empty() {
                continue;
            }
            match self.table.variant.captures(&self.masked[abs.clone()]) {
                Some(caps) => names.extend(caps.name("name").map(|m| m.as_str().to_string())),
                None => self.opaque(owner, abs),
            }
        }
        if let NodeKind::Type(decl) = self.builder.kind_mut(owner) {
            decl.variants = names;
        }
        if section_end < body.end {
            self.items(owner, section_end + 1..body.end, ctx);
        }
    }

    /// Enum classes written as assignments (`RED = 1`)
    fn fields_to_variants(&mut self, owner: NodeId) {
        let fields: Vec<NodeId> = self
            .builder
            .children_of(owner)
            .iter()
            .copied()
            .filter(|&c| matches!(self.builder.kind(c), NodeKind::Field(_)))
            .collect();
        let mut names = Vec::new();
        for field in fields {
            if let NodeKind::Field(decl) = self.builder.kind(field) {
                names.push(decl.name.clone());
            }
            self.builder.detach(field);
        }
        if let NodeKind::Type(decl) = self.builder.kind_mut(owner) {
            decl.variants.extend(names);
        }
    }

    /// Fields introduced by assigning to the receiver inside the constructor
    fn constructor_fields(&mut self, owner: NodeId) {
        let children = self.builder.children_of(owner).to_vec();
        let Some(ctor) = children
            .iter()
            .copied()
            .find(|&c| matches!(self.builder.kind(c), NodeKind::Function(f) if f.is_constructor))
        else {
            return;
        };
        let mut known: Vec<String> = children
            .iter()
            .filter_map(|&c| match self.builder.kind(c) {
                NodeKind::Field(f) => Some(f.name.clone()),
                _ => None,
            })
            .collect();
        let params: BTreeMap<String, TypeRef> = self
            .builder
            .children_of(ctor)
            .iter()
            .filter_map(|&c| match self.builder.kind(c) {
                NodeKind::Parameter(p) => Some((p.name.clone(), p.ty.clone())),
                _ => None,
            })
            .collect();

        let mut assigned = Vec::new();
        self.self_assignments(ctor, &mut assigned);

        let mut insert_at = children
            .iter()
            .position(|&c| matches!(self.builder.kind(c), NodeKind::Function(_)))
            .unwrap_or(children.len());
        for (name, value, span) in assigned {
            if known.contains(&name) {
                continue;
            }
            let ty = match self.builder.kind(value) {
                NodeKind::Identifier { name } if params.contains_key(name) => params[name].clone(),
                _ => self.inferred_type(value),
            };
            let decl = FieldDecl {
                name: name.clone(),
                ty,
                visibility: self.visibility(&[], &name, &Context::members_of("", TypeKind::Class)),
                mutable: true,
                optional: false,
                is_static: false,
                doc: None,
            };
            let field = self.builder.node(NodeKind::Field(decl), span);
            self.builder.insert(owner, insert_at, field);
            insert_at += 1;
            known.push(name);
        }
    }

    /// Bare names of instance fields inside methods become receiver accesses
    fn resolve_members(&mut self, parent: NodeId) {
        for child in self.builder.children_of(parent).to_vec() {
            if matches!(self.builder.kind(child), NodeKind::Type(_)) {
                self.resolve_members(child);
                self.resolve_in_type(child);
            }
        }
    }

    fn resolve_in_type(&mut self, owner: NodeId) {
        let children = self.builder.children_of(owner).to_vec();
        let fields: BTreeSet<String> = children
            .iter()
            .filter_map(|&c| match self.builder.kind(c) {
                NodeKind::Field(f) if !f.is_static => Some(f.name.clone()),
                _ => None,
            })
            .collect();
        if fields.is_empty() {
            return;
        }
        for method in children {
            if !matches!(self.builder.kind(method), NodeKind::Function(f) if !f.is_static) {
                continue;
            }
            let mut bound = BTreeSet::new();
            self.bound_names(method, &mut bound);
            let mut found = Vec::new();
            self.field_names(method, &fields, &bound, &mut found);
            for (id, name) in found {
                let span = self.builder.span(id);
                *self.builder.kind_mut(id) = NodeKind::FieldAccess { field: name };
                let receiver = self.builder.node(NodeKind::SelfRef, span);
                self.builder.append(id, receiver);
            }
        }
    }

    /// Parameters and locals anywhere in `node`
    fn bound_names(&self, node: NodeId, out: &mut BTreeSet<String>) {
        for &child in self.builder.children_of(node) {
            match self.builder.kind(child) {
                NodeKind::Parameter(p) => {
                    out.insert(p.name.clone());
                }
                NodeKind::For { binding } => {
                    out.insert(binding.clone());
                }
                NodeKind::Assign { declares: true, .. } => {
                    if let Some(NodeKind::Identifier { name }) = self.builder.children_of(child).first().map(|&t| self.builder.kind(t)) {
                        out.insert(name.clone());
                    }
                }
                _ => {}
            }
            self.bound_names(child, out);
        }
    }

    fn field_names(&self, node: NodeId, fields: &BTreeSet<String>, bound: &BTreeSet<String>, out: &mut Vec<(NodeId, String)>) {
        for &child in self.builder.children_of(node) {
            match self.builder.kind(child) {
                NodeKind::Identifier { name } if fields.contains(name) && !bound.contains(name) => {
                    out.push((child, name.clone()));
                }
                NodeKind::Parameter(_) => {}
                _ => self.field_names(child, fields, bound, out),
            }
        }
    }

    fn self_assignments(&self, node: NodeId, out: &mut Vec<(String, NodeId, Span)>) {
        for &child in self.builder.children_of(node) {
            match self.builder.kind(child) {
                NodeKind::Assign { .. } => {
                    let parts = self.builder.children_of(child);
                    if let (Some(&target), Some(&value)) = (parts.first(), parts.get(1)) {
                        if let NodeKind::FieldAccess { field } = self.builder.kind(target) {
                            let on_self = self
                                .builder
                                .children_of(target)
                                .first()
                                .is_some_and(|&o| matches!(self.builder.kind(o), NodeKind::SelfRef));
                            if on_self {
                                out.push((field.clone(), value, self.builder.span(child)));
                            }
                        }
                    }
                }
                NodeKind::Block | NodeKind::If | NodeKind::While | NodeKind::For { .. } => {
                    self.self_assignments(child, out)
                }
                _ => {}
            }
        }
    }

    // Impl blocks

    fn match_impl(&self, text: &str, range: &Range<usize>) -> Option<ImplMatch> {
        let caps = self.table.impls.iter().find_map(|pattern| pattern.captures(text))?;
        Some(ImplMatch {
            name: last_segment(caps.name("name")?.as_str()).to_string(),
            implements: group(&caps, "trait", range.start),
            members: caps.name("members").map(|m| range.start + m.start()..range.start + m.end()),
            range: range.clone(),
        })
    }

    fn impl_block(&mut self, found: ImplMatch, ctx: &Context) {
        let span = self.span(&found.range);
        let holder = self.builder.node(NodeKind::Block, span);
        let kind = self
            .types
            .get(&found.name)
            .and_then(|&t| match self.builder.kind(t) {
                NodeKind::Type(decl) => Some(decl.kind),
                _ => None,
            })
            .unwrap_or(TypeKind::Struct);
        let mut member_ctx = Context::members_of(&found.name, kind);
        member_ctx.public_members = found.implements.is_some();
        member_ctx.inherited = ctx.inherited.clone();
        if let Some(members) = found.members {
            self.items(holder, members, &member_ctx);
        }
        let implements = found
            .implements
            .map(|r| parse_type_or_dynamic(&self.source[r], self.aliases));
        let position = self.builder.children_of(self.builder.root()).len();
        log::debug!("deferred impl block for {} at {}", found.name, span);
        self.detached.push(Detached {
            owner: found.name,
            holder,
            position,
            implements,
            span,
        });
    }

    fn attach_detached(&mut self) {
        let root = self.builder.root();
        let mut inserted = 0;
        for detached in std::mem::take(&mut self.detached) {
            let target = match self.types.get(&detached.owner) {
                Some(&target) => target,
                None => {
                    let decl = TypeDecl {
                        name: detached.owner.clone(),
                        kind: TypeKind::Struct,
                        visibility: self.visibility(&[], &detached.owner, &Context::top()),
                        bases: Vec::new(),
                        type_params: Vec::new(),
                        variants: Vec::new(),
                        doc: None,
                    };
                    let shell = self.builder.node(NodeKind::Type(decl), detached.span);
                    self.builder.insert(root, detached.position + inserted, shell);
                    inserted += 1;
                    self.types.insert(detached.owner.clone(), shell);
                    log::debug!("created type shell for {}", detached.owner);
                    shell
                }
            };
            if let Some(interface) = detached.implements {
                if let NodeKind::Type(decl) = self.builder.kind_mut(target) {
                    if !decl.bases.iter().any(|b| b.ty == interface) {
                        decl.bases.push(BaseRelation {
                            ty: interface,
                            kind: BaseKind::Implements,
                        });
                    }
                }
            }
            for method in self.builder.children_of(detached.holder).to_vec() {
                self.builder.append(target, method);
            }
        }
    }

    // Functions

    /// Depth-0 `(` offsets before the body opens
    fn paren_candidates(&self, range: &Range<usize>) -> Vec<usize> {
        let bytes = self.masked.as_bytes();
        let mut candidates = Vec::new();
        let mut depth = 0usize;
        for i in range.clone() {
            match bytes[i] {
                b'(' => {
                    if depth == 0 {
                        candidates.push(i);
                    }
                    depth += 1;
                }
                b'[' => depth += 1,
                b')' | b']' => depth = depth.saturating_sub(1),
                b'{' if depth == 0 && self.table.opener == Opener::Brace => break,
                b':' if depth == 0 && self.table.opener == Opener::Colon && !candidates.is_empty() => break,
                _ => {}
            }
        }
        candidates
    }

    fn match_function(&self, text: &str, range: &Range<usize>, ctx: &Context) -> Option<FunctionMatch> {
        let candidates = self.paren_candidates(range);
        let end = range.end;
        for template in self.table.functions.iter().filter(|t| t.scope.allows(ctx.place)) {
            for &open in &candidates {
                let Some(caps) = template.head.captures(&text[..open - range.start]) else {
                    continue;
                };
                let Some(close) = scan::matching_close(self.masked, open).filter(|&c| c < end) else {
                    continue;
                };
                let after = close + 1;
                let (tail_range, opener) = match self.table.opener {
                    Opener::Brace => match scan::find_top_level(self.masked, after, b'{').filter(|&i| i < end) {
                        Some(brace) => (after..brace, Some(brace)),
                        None => {
                            let trimmed = self.masked[after..end].trim_end().trim_end_matches(';');
                            (after..after + trimmed.len(), None)
                        }
                    },
                    Opener::Colon => match scan::find_top_level(self.masked, after, b':').filter(|&i| i < end) {
                        Some(colon) => (after..colon, Some(colon)),
                        None => continue,
                    },
                };
                let Some(tail) = template.tail.captures(&self.masked[tail_range.clone()]) else {
                    continue;
                };

                let body = if let Some(expr) = group(&tail, "expr", tail_range.start) {
                    let trimmed = self.masked[expr.start..end].trim_end().trim_end_matches(';');
                    FnBody::Expr(expr.start..expr.start + trimmed.len())
                } else {
                    match (self.table.opener, opener) {
                        (Opener::Brace, Some(brace)) => {
                            match scan::matching_close(self.masked, brace).filter(|&c| c < end) {
                                Some(close) => FnBody::Block(brace + 1..close),
                                None => continue,
                            }
                        }
                        (Opener::Colon, Some(colon)) => FnBody::Block(colon + 1..end),
                        _ => FnBody::Missing,
                    }
                };

                return Some(FunctionMatch {
                    name: caps.name("name").map(|m| m.as_str().to_string()).unwrap_or_default(),
                    words: words_of(&caps, &["vis", "mods", "kw", "async"]),
                    generics: group(&caps, "generics", range.start),
                    receiver: group(&caps, "receiver", range.start),
                    params: open + 1..close,
                    ret: group(&caps, "ret", range.start).or_else(|| group(&tail, "ret", tail_range.start)),
                    throws: group(&tail, "throws", tail_range.start),
                    body,
                    range: range.clone(),
                });
            }
        }
        None
    }

    fn function(
        &mut self,
        parent: NodeId,
        found: FunctionMatch,
        ctx: &Context,
        doc: Option<String>,
        attributes: &[Attribute],
    ) {
        let span = self.span(&found.range);
        let mut words = found.words.clone();
        words.extend(ctx.inherited.iter().cloned());
        words.extend(attributes.iter().map(|a| a.name.clone()));

        // Go method receivers and Kotlin extension receivers
        let mut owner = ctx.owner.clone();
        let mut receiver_name: Option<String> = None;
        let mut extension: Option<String> = None;
        if let Some(r) = &found.receiver {
            let text = self.text(r);
            if self.table.params == ParamStyle::Go {
                let mut parts = text.split_whitespace();
                let (name, ty) = match (parts.next(), parts.next()) {
                    (Some(name), Some(ty)) => (Some(name), ty),
                    (Some(ty), None) => (None, ty),
                    _ => (None, ""),
                };
                receiver_name = name.map(str::to_string);
                owner = Some(Owner {
                    name: last_segment(ty.trim_start_matches('*')).to_string(),
                    kind: TypeKind::Struct,
                });
            } else {
                extension = Some(text.to_string());
            }
        }
        let detached = found.receiver.is_some() && extension.is_none();
        let in_type = ctx.place == Place::Member || detached;

        let mut params = self.params(found.params.clone());
        let mut has_receiver = false;
        if let (Some(pattern), Some(first)) = (&self.table.receiver_param, params.first()) {
            if (ctx.place == Place::Member || !self.table.explicit_receiver) && pattern.is_match(first.text.trim()) {
                if self.table.explicit_receiver {
                    receiver_name = Some(first.name.clone());
                }
                has_receiver = true;
                params.remove(0);
            }
        }
        if let Some(ty) = extension {
            params.insert(
                0,
                ParamSpec {
                    name: "receiver".to_string(),
                    words: Vec::new(),
                    ty: Some(ty.clone()),
                    default: None,
                    optional: false,
                    collects: false,
                    collects_named: false,
                    text: ty,
                    range: found.receiver.clone().unwrap_or_default(),
                },
            );
        }

        let name = found.name.trim_start_matches('#').to_string();
        let is_constructor = self.table.constructor_names.contains(&name.as_str())
            || (self.table.class_name_constructors
                && found.ret.is_none()
                && owner.as_ref().is_some_and(|o| o.name == name));
        let is_static = in_type
            && !is_constructor
            && if self.table.explicit_receiver {
                !has_receiver || SyntaxTable::has_word(self.table.static_words, &words)
            } else {
                SyntaxTable::has_word(self.table.static_words, &words)
            };
        let mut is_async = SyntaxTable::has_word(self.table.async_words, &words);
        let declared_abstract = SyntaxTable::has_word(self.table.abstract_words, &words);

        let mut throws: Vec<TypeRef> = Vec::new();
        if let Some(r) = &found.throws {
            let text = &self.source[r.clone()];
            for part in scan::split_top_level(text, b',', true) {
                throws.push(parse_type_or_dynamic(&text[part], self.aliases));
            }
        }
        for attribute in attributes.iter().filter(|a| a.name == "Throws") {
            let args = attribute.text.split_once('(').map_or("", |(_, rest)| rest.trim_end_matches(')'));
            for part in args.split(',') {
                let part = part.trim().trim_end_matches("::class").trim();
                if !part.is_empty() {
                    throws.push(parse_type_or_dynamic(part, self.aliases));
                }
            }
        }
        let declared = found
            .ret
            .as_ref()
            .map(|r| self.return_type(self.text(r), &mut is_async, &mut throws));

        let decl = FunctionDecl {
            name: name.clone(),
            return_type: TypeRef::void(),
            visibility: if is_constructor && self.table.visibility_by_case {
                Visibility::Public
            } else {
                self.visibility(&words, &found.name, ctx)
            },
            is_static,
            is_async,
            is_abstract: false,
            is_constructor,
            throws,
            type_params: self.type_params(found.generics.as_ref()),
            doc,
        };
        let node = if detached {
            let holder = self.builder.node(NodeKind::Block, span);
            let position = self.builder.children_of(self.builder.root()).len();
            self.detached.push(Detached {
                owner: owner.as_ref().map(|o| o.name.clone()).unwrap_or_default(),
                holder,
                position,
                implements: None,
                span,
            });
            self.builder.add(holder, NodeKind::Function(decl), span)
        } else {
            self.builder.add(parent, NodeKind::Function(decl), span)
        };

        let mut promoted = Vec::new();
        let mut locals = Vec::new();
        for spec in &params {
            let ty = self.param_type(spec);
            let decl = ParamDecl {
                name: spec.name.clone(),
                ty: ty.clone(),
                mutable: spec.words.iter().any(|w| w == "mut" || w == "var"),
                optional: spec.optional || spec.default.is_some(),
            };
            let param = self.builder.add(node, NodeKind::Parameter(decl), self.span(&spec.range));
            if let Some(default) = spec.default.clone() {
                self.default_value(param, default, None);
            }
            locals.push(spec.name.clone());
            if is_constructor
                && (self.table.visibility_of(&spec.words).is_some() || spec.words.iter().any(|w| w == "readonly"))
            {
                promoted.push((spec.clone(), ty));
            }
        }

        let returns_value = match (&declared, &found.body) {
            (Some(ty), _) => !ty.is_void(),
            (None, FnBody::Expr(_)) => true,
            (None, _) => false,
        };
        let mut doc_from_body = None;
        let mut has_body = false;
        match found.body.clone() {
            FnBody::Block(range) if !declared_abstract || self.table.opener == Opener::Brace => {
                let (range, docstring) = self.split_docstring(range);
                doc_from_body = docstring;
                let body_span = self.span(&range);
                let (_, warnings) = BodyParser::new(
                    &mut self.builder,
                    &self.table.body,
                    self.aliases,
                    self.source,
                    range,
                    body_span,
                )
                .with_receiver(receiver_name.as_deref())
                .with_locals(locals)
                .parse(node, returns_value);
                self.warn_all(warnings);
                has_body = true;
            }
            FnBody::Expr(range) => {
                let body_span = self.span(&range);
                let (_, warnings) = BodyParser::new(
                    &mut self.builder,
                    &self.table.body,
                    self.aliases,
                    self.source,
                    range,
                    body_span,
                )
                .with_receiver(receiver_name.as_deref())
                .with_locals(locals)
                .parse_expression_body(node, returns_value);
                self.warn_all(warnings);
                has_body = true;
            }
            _ => {}
        }

        let return_type = if is_constructor {
            TypeRef::void()
        } else if let Some(ty) = declared {
            ty
        } else {
            match (&found.body, self.table.missing_return) {
                (FnBody::Expr(_), _) => TypeRef::dynamic(),
                (_, MissingReturn::Void) => TypeRef::void(),
                (_, MissingReturn::Infer) if self.returns_value(node) => TypeRef::dynamic(),
                (_, MissingReturn::Infer) => TypeRef::void(),
            }
        };
        if let NodeKind::Function(decl) = self.builder.kind_mut(node) {
            decl.return_type = return_type;
            decl.is_abstract = !has_body || declared_abstract;
            if decl.doc.is_none() {
                decl.doc = doc_from_body;
            }
        }

        // Constructor parameters that declare fields
        if !promoted.is_empty() && !detached {
            let index = self
                .builder
                .children_of(parent)
                .iter()
                .position(|&c| c == node)
                .unwrap_or(0);
            for (offset, (spec, ty)) in promoted.into_iter().enumerate() {
                let decl = FieldDecl {
                    name: spec.name.clone(),
                    ty,
                    visibility: self.table.visibility_of(&spec.words).unwrap_or(Visibility::Public),
                    mutable: !spec.words.iter().any(|w| w == "readonly"),
                    optional: spec.optional || spec.default.is_some(),
                    is_static: false,
                    doc: None,
                };
                let field = self.builder.node(NodeKind::Field(decl), self.span(&spec.range));
                self.builder.insert(parent, index + offset, field);
            }
        }
        log::debug!("extracted function {} at {}", name, span);
    }

    fn warn_all(&mut self, warnings: Vec<ConvertError>) {
        for warning in warnings {
            self.diagnostics.add_warning(warning);
        }
    }

    fn returns_value(&self, node: NodeId) -> bool {
        self.builder.children_of(node).iter().any(|&child| match self.builder.kind(child) {
            NodeKind::Return => !self.builder.children_of(child).is_empty(),
            NodeKind::Block | NodeKind::If | NodeKind::While | NodeKind::For { .. } => self.returns_value(child),
            _ => false,
        })
    }

    /// Canonical return type of declared return text
    fn return_type(&self, text: &str, is_async: &mut bool, throws: &mut Vec<TypeRef>) -> TypeRef {
        let mut text = text.to_string();
        if let Some(inner) = self.async_inner(&text) {
            *is_async = true;
            if inner.is_empty() {
                return TypeRef::void();
            }
            text = inner;
        }

        if self.table.multi_return_errors {
            return self.go_results(&text, throws);
        }

        let ty = parse_type_or_dynamic(&text, self.aliases);
        if self.table.result_errors && ty.category == TypeCategory::Custom && ty.base_name == "Result" {
            let mut args = ty.args.clone();
            match args.len() {
                2 => {
                    throws.push(args.remove(1));
                    return args.remove(0);
                }
                1 => {
                    throws.push(TypeRef::custom("Error", Vec::new()));
                    return args.remove(0);
                }
                _ => {}
            }
        }
        ty
    }

    /// Inner text of an asynchronous return wrapper
    fn async_inner(&self, text: &str) -> Option<String> {
        let text = text.trim();
        let split = text.find(['<', '[']).unwrap_or(text.len());
        let name = last_segment(&text[..split]);
        if !self.table.async_wrappers.contains(&name) {
            return None;
        }
        let rest = &text[split..];
        if rest.is_empty() {
            return Some(String::new());
        }
        let inner = rest.get(1..rest.len().saturating_sub(1))?;
        let last = scan::split_top_level(inner, b',', true).pop()?;
        Some(inner[last].to_string())
    }

    fn go_results(&self, text: &str, throws: &mut Vec<TypeRef>) -> TypeRef {
        let text = text.trim();
        let list = text.strip_prefix('(').and_then(|t| t.strip_suffix(')'));
        let mut parts: Vec<String> = match list {
            Some(inner) => scan::split_top_level(inner, b',', true)
                .into_iter()
                .map(|r| {
                    let part = inner[r].trim();
                    // Drop result names
                    match part.split_once(char::is_whitespace) {
                        Some((first, rest))
                            if is_identifier(first)
                                && !matches!(first, "chan" | "func" | "map" | "struct" | "interface") =>
                        {
                            rest.trim().to_string()
                        }
                        _ => part.to_string(),
                    }
                })
                .collect(),
            None if text.is_empty() => Vec::new(),
            None => vec![text.to_string()],
        };
        if parts.last().is_some_and(|p| p == "error") {
            parts.pop();
            throws.push(TypeRef::custom("error", Vec::new()));
        }
        let mut types: Vec<TypeRef> = parts.iter().map(|p| parse_type_or_dynamic(p, self.aliases)).collect();
        match types.len() {
            0 => TypeRef::void(),
            1 => types.remove(0),
            _ => TypeRef::tuple(types),
        }
    }

    fn type_params(&self, generics: Option<&Range<usize>>) -> Vec<String> {
        let Some(range) = generics else {
            return Vec::new();
        };
        let text = &self.source[range.clone()];
        let inner = text.get(1..text.len().saturating_sub(1)).unwrap_or_default();
        scan::split_top_level(inner, b',', true)
            .into_iter()
            .filter_map(|part| {
                inner[part]
                    .split(|c: char| c.is_whitespace() || c == ':')
                    .find(|w| !w.is_empty() && !matches!(*w, "in" | "out" | "reified" | "const"))
                    .filter(|w| !w.starts_with('\''))
                    .map(|w| w.trim_end_matches(['=', ',']).to_string())
            })
            .filter(|w| is_identifier(w))
            .collect()
    }

    /// Split a body into its leading docstring and the rest
    fn split_docstring(&self, body: Range<usize>) -> (Range<usize>, Option<String>) {
        if !self.table.docstrings {
            return (body, None);
        }
        let bytes = self.source.as_bytes();
        let mut start = skip_space(bytes, body.start, body.end);
        while start < body.end && matches!(bytes[start], b'r' | b'R' | b'u' | b'U') {
            start += 1;
        }
        let Some(&quote) = bytes.get(start).filter(|b| **b == b'"' || **b == b'\'') else {
            return (body, None);
        };
        let triple = [quote; 3];
        let (open, close, end) = if self.source[start..body.end].as_bytes().starts_with(&triple) {
            let Some(found) = self.masked[start + 3..body.end].find(std::str::from_utf8(&triple).unwrap_or("\"\"\"")) else {
                return (body, None);
            };
            (start + 3, start + 3 + found, start + 6 + found)
        } else {
            let Some(found) = self.masked[start + 1..body.end].find(quote as char) else {
                return (body, None);
            };
            (start + 1, start + 1 + found, start + 2 + found)
        };
        let doc = dedent(&self.source[open..close]);
        (end..body.end, doc)
    }

    // Parameters

    fn params(&self, range: Range<usize>) -> Vec<ParamSpec> {
        let parts = scan::split_top_level(&self.masked[range.clone()], b',', true);
        let mut specs: Vec<ParamSpec> = parts
            .into_iter()
            .filter_map(|part| self.param(range.start + part.start..range.start + part.end))
            .collect();

        if self.table.params == ParamStyle::Go {
            // `a, b int`: names without a type take the next type
            if specs.iter().all(|s| s.ty.is_none()) {
                for (index, spec) in specs.iter_mut().enumerate() {
                    spec.ty = Some(std::mem::replace(&mut spec.name, format!("arg{}", index)));
                }
            } else {
                let mut next: Option<String> = None;
                for spec in specs.iter_mut().rev() {
                    match &spec.ty {
                        Some(ty) => next = Some(ty.clone()),
                        None => spec.ty = next.clone(),
                    }
                }
            }
        }
        specs
    }

    fn param(&self, range: Range<usize>) -> Option<ParamSpec> {
        let (start, _) = self.strip_attributes(range.clone());
        let range = start..range.end;
        let masked = self.masked[range.clone()].trim();
        if masked.is_empty() || masked == "/" || masked == "*" {
            return None;
        }
        let source_text = self.text(&range);
        let (decl_len, default) = match find_assign(masked) {
            Some(eq) => {
                let from = range.start + eq + 1;
                (eq, Some(skip_space(self.masked.as_bytes(), from, range.end)..range.end))
            }
            None => (masked.len(), None),
        };
        let decl_masked = masked[..decl_len].trim_end();
        let decl = source_text.get(..decl_masked.len()).unwrap_or(source_text);

        let mut words: Vec<String> = Vec::new();
        let mut optional = false;
        let mut collects = false;
        let mut collects_named = false;
        let (name, ty) = match self.table.params {
            ParamStyle::NameColonType => {
                let (name_part, ty) = match scan::find_top_level(decl_masked, 0, b':') {
                    Some(colon) => (&decl[..colon], Some(decl[colon + 1..].trim().to_string())),
                    None => (decl, None),
                };
                let mut tokens: Vec<&str> = name_part.split_whitespace().collect();
                let mut name = tokens.pop().unwrap_or_default();
                words.extend(tokens.iter().map(|t| t.to_string()));
                if let Some(rest) = name.strip_prefix("...") {
                    name = rest;
                } else if let Some(rest) = name.strip_prefix("**") {
                    name = rest;
                    collects_named = true;
                } else if let Some(rest) = name.strip_prefix('*') {
                    name = rest;
                    collects = true;
                }
                if let Some(rest) = name.strip_suffix('?') {
                    name = rest;
                    optional = true;
                }
                if words.iter().any(|w| w == "vararg") {
                    collects = true;
                }
                (name.to_string(), ty)
            }
            ParamStyle::TypeName => {
                let mut tokens: Vec<&str> = decl.split_whitespace().collect();
                let name = tokens.pop().unwrap_or_default();
                while let Some(first) = tokens.first() {
                    if matches!(*first, "final" | "ref" | "out" | "in" | "params" | "this" | "readonly" | "scoped") {
                        words.push(first.to_string());
                        tokens.remove(0);
                    } else {
                        break;
                    }
                }
                let ty = tokens.join(" ");
                (name.to_string(), (!ty.is_empty()).then_some(ty))
            }
            ParamStyle::Go => match decl.split_once(char::is_whitespace) {
                Some((name, ty)) => (name.to_string(), Some(ty.trim().to_string())),
                None => (decl.to_string(), None),
            },
        };
        if words.iter().any(|w| w == "params") {
            collects = false;
        }
        let name = if is_identifier(&name) { name } else { "arg".to_string() };
        Some(ParamSpec {
            name,
            words,
            ty,
            default,
            optional,
            collects,
            collects_named,
            text: source_text.to_string(),
            range,
        })
    }

    fn param_type(&self, spec: &ParamSpec) -> TypeRef {
        let ty = spec
            .ty
            .as_deref()
            .map_or_else(TypeRef::dynamic, |t| parse_type_or_dynamic(t, self.aliases));
        if spec.collects_named {
            TypeRef::map(TypeRef::string(), ty)
        } else if spec.collects {
            TypeRef::list(ty)
        } else if spec.optional && spec.ty.is_some() {
            // `name?: T` may be absent
            TypeRef::optional(ty)
        } else {
            ty
        }
    }

    fn default_value(&mut self, parent: NodeId, range: Range<usize>, receiver: Option<&str>) -> NodeId {
        let span = self.span(&range);
        let (value, warnings) = BodyParser::new(
            &mut self.builder,
            &self.table.body,
            self.aliases,
            self.source,
            range,
            span,
        )
        .with_receiver(receiver)
        .parse_expression(parent);
        self.warn_all(warnings);
        value
    }

    /// Type of a literal-ish initializer
    fn inferred_type(&self, value: NodeId) -> TypeRef {
        match self.builder.kind(value) {
            NodeKind::Literal { value } => match value {
                Literal::Int(_) => TypeRef::primitive(self.table.int_literal),
                Literal::Float(_) => TypeRef::float64(),
                Literal::Str(_) => TypeRef::string(),
                Literal::Bool(_) => TypeRef::bool(),
                Literal::Null => TypeRef::dynamic(),
            },
            NodeKind::Unary { op: UnaryOp::Neg } => self
                .builder
                .children_of(value)
                .first()
                .map_or_else(TypeRef::dynamic, |&inner| self.inferred_type(inner)),
            NodeKind::Unary { op: UnaryOp::Not } => TypeRef::bool(),
            NodeKind::Call => match self.builder.children_of(value).first().map(|&c| self.builder.kind(c)) {
                Some(NodeKind::Identifier { name }) if name.starts_with(char::is_uppercase) => {
                    TypeRef::custom(name.clone(), Vec::new())
                }
                _ => TypeRef::dynamic(),
            },
            _ => TypeRef::dynamic(),
        }
    }

    // Embedded bases and fields

    fn embedded(&mut self, parent: NodeId, text: &str, ctx: &Context) -> bool {
        let (Some(pattern), Some(owner)) = (&self.table.embedded, &ctx.owner) else {
            return false;
        };
        if ctx.place != Place::Member || !matches!(owner.kind, TypeKind::Struct | TypeKind::Interface) {
            return false;
        }
        let Some(caps) = pattern.captures(text) else {
            return false;
        };
        let name = caps.name("name").map_or("", |m| m.as_str()).trim_start_matches('*');
        let base = BaseRelation {
            ty: parse_type_or_dynamic(name, self.aliases),
            kind: if owner.kind == TypeKind::Interface {
                BaseKind::Implements
            } else {
                BaseKind::Extends
            },
        };
        if let NodeKind::Type(decl) = self.builder.kind_mut(parent) {
            decl.bases.push(base);
        }
        true
    }

    fn match_field(&self, text: &str, range: &Range<usize>, ctx: &Context) -> Option<FieldMatch> {
        let (pattern, caps) = self
            .table
            .fields
            .iter()
            .filter(|t| t.scope.allows(ctx.place))
            .find_map(|t| t.pattern.captures(text).map(|caps| (&t.pattern, caps)))?;
        let has_accessors = pattern.capture_names().any(|name| name == Some("set"));
        let names: Vec<String> = caps
            .name("name")?
            .as_str()
            .split(',')
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        Some(FieldMatch {
            names,
            words: words_of(&caps, &["vis", "mods", "kw"]),
            ty: group(&caps, "type", range.start),
            default: group(&caps, "default", range.start),
            optional_marker: caps.name("opt").is_some_and(|m| m.as_str() == "?"),
            setter: has_accessors.then(|| caps.name("set").is_some_and(|m| m.as_str() == "set")),
            range: range.clone(),
        })
    }

    fn fields(&mut self, parent: NodeId, found: FieldMatch, ctx: &Context, doc: Option<String>) {
        let span = self.span(&found.range);
        let mut words = found.words.clone();
        words.extend(ctx.inherited.iter().cloned());

        let mutable = match found.setter {
            Some(mutable) => mutable,
            None if SyntaxTable::has_word(self.table.mutable_words, &words) => true,
            None => !SyntaxTable::has_word(self.table.immutable_words, &words),
        };
        let is_static = SyntaxTable::has_word(self.table.static_words, &words);
        let ty = found.ty.as_ref().map(|r| {
            let ty = parse_type_or_dynamic(&self.source[r.clone()], self.aliases);
            if found.optional_marker {
                TypeRef::optional(ty)
            } else {
                ty
            }
        });

        // `a, b = 1, 2` pairs names with values
        let defaults: Vec<Option<Range<usize>>> = match &found.default {
            Some(r) if found.names.len() > 1 => {
                let parts = scan::split_top_level(&self.masked[r.clone()], b',', true);
                if parts.len() == found.names.len() {
                    parts.into_iter().map(|p| Some(r.start + p.start..r.start + p.end)).collect()
                } else {
                    vec![None; found.names.len()]
                }
            }
            other => vec![other.clone(); found.names.len()],
        };

        for (name, default) in found.names.iter().zip(defaults) {
            let decl = FieldDecl {
                name: name.trim_start_matches('#').to_string(),
                ty: ty.clone().unwrap_or_else(TypeRef::dynamic),
                visibility: self.visibility(&words, name, ctx),
                mutable,
                optional: default.is_some() || found.optional_marker,
                is_static,
                doc: doc.clone(),
            };
            let node = self.builder.add(parent, NodeKind::Field(decl), span);
            if let Some(default) = default {
                let value = self.default_value(node, default, None);
                if ty.is_none() {
                    let inferred = self.inferred_type(value);
                    if let NodeKind::Field(decl) = self.builder.kind_mut(node) {
                        decl.ty = inferred;
                    }
                }
            }
        }
    }

    fn visibility(&self, words: &[String], name: &str, ctx: &Context) -> Visibility {
        if ctx.owner.as_ref().is_some_and(|o| o.kind == TypeKind::Interface) || ctx.public_members {
            return Visibility::Public;
        }
        if let Some(visibility) = self.table.visibility_of(words) {
            return visibility;
        }
        if name.starts_with('#') {
            return Visibility::Private;
        }
        if self.table.visibility_by_case {
            return if name.starts_with(char::is_uppercase) {
                Visibility::Public
            } else {
                Visibility::Internal
            };
        }
        if self.table.underscore_private && name.starts_with('_') && !is_dunder(name) {
            return Visibility::Private;
        }
        if ctx.place == Place::Member {
            self.table.member_visibility
        } else {
            self.table.top_level_visibility
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeRef;
    use crate::mapping::MappingTable;

    fn run(tag: &str, source: &str) -> Extraction {
        let table = SyntaxTable::for_language(tag).expect("table");
        let mapping = MappingTable::builtin();
        let aliases = mapping.source(tag).expect("aliases");
        extract(&table, aliases, source)
    }

    fn names(ast: &Ast) -> Vec<String> {
        ast.declarations()
            .map(|d| match d.kind() {
                NodeKind::Function(f) => format!("fn {}", f.name),
                NodeKind::Type(t) => format!("type {}", t.name),
                NodeKind::Field(f) => format!("field {}", f.name),
                other => other.name().to_string(),
            })
            .collect()
    }

    fn param_types(function: NodeRef<'_>) -> Vec<String> {
        function
            .params()
            .filter_map(|p| p.as_param())
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect()
    }

    #[test]
    fn test_rust_struct_impl_and_trait() {
        let source = r#"
use std::fmt;

/// A point in space
#[derive(Debug, Clone)]
pub struct Point {
    pub x: f64,
    y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn norm(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
"#;
        let extraction = run("rust", source);
        let ast = &extraction.ast;
        assert_eq!(names(ast), vec!["type Point"]);

        let point = ast.root().child(0).expect("point");
        let decl = point.as_type().expect("type");
        assert_eq!(decl.kind, TypeKind::Struct);
        assert_eq!(decl.visibility, Visibility::Public);
        assert_eq!(decl.doc.as_deref(), Some("A point in space"));
        assert_eq!(decl.bases.len(), 1);
        assert_eq!(decl.bases[0].kind, BaseKind::Implements);
        assert_eq!(decl.bases[0].ty.base_name, "Display");

        let fields: Vec<(&str, Visibility)> = point
            .fields()
            .filter_map(|f| f.as_field())
            .map(|f| (f.name.as_str(), f.visibility))
            .collect();
        assert_eq!(fields, vec![("x", Visibility::Public), ("y", Visibility::Private)]);

        let methods: Vec<NodeRef<'_>> = point.methods().collect();
        assert_eq!(methods.len(), 3);
        let new = methods[0].as_function().expect("new");
        assert!(new.is_static);
        assert_eq!(param_types(methods[0]), vec!["x: float64", "y: float64"]);
        let norm = methods[1].as_function().expect("norm");
        assert!(!norm.is_static);
        assert_eq!(norm.return_type, TypeRef::float64());
        assert_eq!(methods[2].as_function().map(|f| f.visibility), Some(Visibility::Public));
    }

    #[test]
    fn test_rust_result_return_splits_error() {
        let extraction = run("rust", "fn parse(s: &str) -> Result<i32, ParseError> {\n    s.parse()\n}\n");
        let function = extraction.ast.root().child(0).expect("fn");
        let decl = function.as_function().expect("decl");
        assert_eq!(decl.return_type, TypeRef::int32());
        assert_eq!(decl.throws.len(), 1);
        assert_eq!(decl.throws[0].base_name, "ParseError");
    }

    #[test]
    fn test_impl_without_type_creates_shell_in_place() {
        let source = "fn before() {}\n\nimpl Remote {\n    fn go(&self) {}\n}\n\nfn after() {}\n";
        let extraction = run("rust", source);
        assert_eq!(
            names(&extraction.ast),
            vec!["fn before", "type Remote", "fn after"]
        );
    }

    #[test]
    fn test_unmatched_declaration_is_opaque_and_extraction_continues() {
        let source = "fn a() {}\nmacro_rules! m { () => {} }\nfn b() {}\n";
        let extraction = run("rust", source);
        assert_eq!(names(&extraction.ast), vec!["fn a", "opaque", "fn b"]);
        let spans = extraction.unparsed_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start_line(), 2);
    }

    #[test]
    fn test_python_class_with_docstring_and_constructor_fields() {
        let source = r#"
from dataclasses import dataclass


class Account(Base):
    """A bank account."""

    def __init__(self, owner: str, balance: float = 0.0):
        self.owner = owner
        self.balance = balance
        self._log = None

    def deposit(self, amount: float) -> None:
        self.balance += amount

    @staticmethod
    def bank():
        return "polybank"
"#;
        let extraction = run("python", source);
        let account = extraction.ast.root().child(0).expect("class");
        let decl = account.as_type().expect("type");
        assert_eq!(decl.doc.as_deref(), Some("A bank account."));
        assert_eq!(decl.bases[0].kind, BaseKind::Extends);

        let fields: Vec<String> = account
            .fields()
            .filter_map(|f| f.as_field())
            .map(|f| format!("{}: {}", f.name, f.ty))
            .collect();
        assert_eq!(fields, vec!["owner: string", "balance: float64", "_log: dynamic"]);

        let methods: Vec<_> = account.methods().filter_map(|m| m.as_function()).collect();
        assert!(methods[0].is_constructor);
        assert!(!methods[1].is_static);
        assert!(methods[2].is_static);
        assert_eq!(methods[2].return_type, TypeRef::dynamic());
        assert!(extraction.diagnostics.is_empty(), "{}", extraction.diagnostics);
    }

    #[test]
    fn test_python_enum_and_protocol_bases() {
        let source = "class Color(Enum):\n    RED = 1\n    GREEN = 2\n\nclass Shape(Protocol):\n    def area(self) -> float: ...\n";
        let extraction = run("python", source);
        let color = extraction.ast.root().child(0).and_then(|n| n.as_type()).expect("color");
        assert_eq!(color.kind, TypeKind::Enum);
        assert_eq!(color.variants, vec!["RED", "GREEN"]);
        let shape = extraction.ast.root().child(1).and_then(|n| n.as_type()).expect("shape");
        assert_eq!(shape.kind, TypeKind::Interface);
        assert!(shape.bases.is_empty());
    }

    #[test]
    fn test_java_class_with_constructor_and_throws() {
        let source = r#"
package demo;

import java.util.List;

public class Repo extends Base implements Closeable {
    private final List<String> names;

    public Repo(List<String> names) {
        this.names = names;
    }

    public CompletableFuture<Integer> count() throws IOException {
        return names.size();
    }
}
"#;
        let extraction = run("java", source);
        let repo = extraction.ast.root().child(0).expect("class");
        let decl = repo.as_type().expect("type");
        let bases: Vec<(String, BaseKind)> = decl.bases.iter().map(|b| (b.ty.base_name.clone(), b.kind)).collect();
        assert_eq!(
            bases,
            vec![
                ("Base".to_string(), BaseKind::Extends),
                ("Closeable".to_string(), BaseKind::Implements)
            ]
        );
        let field = repo.fields().next().and_then(|f| f.as_field()).expect("field");
        assert!(!field.mutable);
        assert_eq!(field.ty.to_string(), "list<string>");

        let methods: Vec<_> = repo.methods().filter_map(|m| m.as_function()).collect();
        assert!(methods[0].is_constructor);
        assert!(methods[1].is_async);
        assert_eq!(methods[1].return_type, TypeRef::int32());
        assert_eq!(methods[1].throws[0].base_name, "IOException");
    }

    #[test]
    fn test_go_struct_receiver_methods_and_embedding() {
        let source = r#"
package shapes

import "math"

// Circle is round.
type Circle struct {
	Base
	Radius float64 `json:"radius"`
	label  string
}

func (c *Circle) Area() float64 {
	return math.Pi * c.Radius * c.Radius
}

func Parse(s string) (*Circle, error) {
	return nil, nil
}

const (
	Unit = 1
	name = "circle"
)
"#;
        let extraction = run("go", source);
        let ast = &extraction.ast;
        assert_eq!(names(ast), vec!["type Circle", "fn Parse", "field Unit", "field name"]);

        let circle = ast.root().child(0).expect("circle");
        let decl = circle.as_type().expect("type");
        assert_eq!(decl.doc.as_deref(), Some("Circle is round."));
        assert_eq!(decl.bases[0].ty.base_name, "Base");
        assert_eq!(decl.bases[0].kind, BaseKind::Extends);
        let fields: Vec<(&str, Visibility)> = circle
            .fields()
            .filter_map(|f| f.as_field())
            .map(|f| (f.name.as_str(), f.visibility))
            .collect();
        assert_eq!(fields, vec![("Radius", Visibility::Public), ("label", Visibility::Internal)]);
        let area = circle.methods().next().and_then(|m| m.as_function()).expect("area");
        assert_eq!(area.name, "Area");
        assert!(!area.is_static);

        let parse = ast.root().child(1).and_then(|n| n.as_function()).expect("parse");
        assert_eq!(parse.throws[0].base_name, "error");
        assert_eq!(parse.return_type.category, TypeCategory::Optional);

        let unit = ast.root().child(2).and_then(|n| n.as_field()).expect("unit");
        assert!(!unit.mutable);
        assert_eq!(unit.ty, TypeRef::int64());
    }

    #[test]
    fn test_typescript_interface_class_and_arrow() {
        let source = r#"
import { x } from "./x";

export interface Named {
  name: string;
  greet(other?: Named): string;
}

export class Person implements Named {
  private age: number = 0;
  constructor(public name: string) {}

  greet(other?: Named): string {
    return this.name;
  }

  async load(): Promise<void> {}
}

export const double = (n: number): number => n * 2;
"#;
        let extraction = run("typescript", source);
        let ast = &extraction.ast;
        assert_eq!(names(ast), vec!["type Named", "type Person", "fn double"]);

        let named = ast.root().child(0).expect("named");
        let greet = named.methods().next().and_then(|m| m.as_function()).expect("greet");
        assert!(greet.is_abstract);

        let person = ast.root().child(1).expect("person");
        let fields: Vec<String> = person.fields().filter_map(|f| f.as_field()).map(|f| f.name.clone()).collect();
        assert_eq!(fields, vec!["age", "name"]);
        let load = person.methods().nth(2).and_then(|m| m.as_function()).expect("load");
        assert!(load.is_async);
        assert!(load.return_type.is_void());

        let double = ast.root().child(2).expect("double");
        assert_eq!(double.as_function().map(|f| f.visibility), Some(Visibility::Public));
        assert_eq!(double.body().map(|b| b.child_count()), Some(1));
    }

    #[test]
    fn test_decorated_python_declarations_keep_their_shape() {
        let source = "@cache\ndef g() -> int:\n    return 1\n\n@dataclass(frozen=True)\nclass P:\n    x: int = 0\n";
        let extraction = run("python", source);
        assert_eq!(names(&extraction.ast), vec!["fn g", "type P"]);
        assert!(extraction.diagnostics.is_empty(), "{}", extraction.diagnostics);
    }

    #[test]
    fn test_question_marker_makes_the_type_optional_but_defaults_do_not() {
        let source = "interface Post {\n  tags?: string[];\n}\n\nfunction f(x: number = 0, y?: string): number {\n  return x;\n}\n";
        let extraction = run("typescript", source);
        let post = extraction.ast.root().child(0).expect("post");
        let tags = post.fields().next().and_then(|f| f.as_field()).expect("tags");
        assert!(tags.optional);
        assert_eq!(tags.ty.to_string(), "optional<list<string>>");

        let f = extraction.ast.root().child(1).expect("f");
        let params: Vec<(String, bool)> = f
            .params()
            .filter_map(|p| p.as_param())
            .map(|p| (p.ty.to_string(), p.optional))
            .collect();
        assert_eq!(
            params,
            vec![("float64".to_string(), true), ("optional<string>".to_string(), true)]
        );
    }

    #[test]
    fn test_kotlin_data_class_companion_and_expression_function() {
        let source = r#"
package demo

data class User(val name: String, var age: Int = 0) : Entity(), Auditable {
    fun isAdult(): Boolean = age >= 18

    companion object {
        fun empty(): User = User("", 0)
    }
}
"#;
        let extraction = run("kotlin", source);
        let user = extraction.ast.root().child(0).expect("user");
        let decl = user.as_type().expect("type");
        let bases: Vec<BaseKind> = decl.bases.iter().map(|b| b.kind).collect();
        assert_eq!(bases, vec![BaseKind::Extends, BaseKind::Implements]);

        let fields: Vec<(String, bool, bool)> = user
            .fields()
            .filter_map(|f| f.as_field())
            .map(|f| (f.name.clone(), f.mutable, f.optional))
            .collect();
        assert_eq!(
            fields,
            vec![("name".to_string(), false, false), ("age".to_string(), true, true)]
        );
        let methods: Vec<_> = user.methods().filter_map(|m| m.as_function()).collect();
        assert_eq!(methods[0].return_type, TypeRef::bool());
        assert!(methods[1].is_static);
    }

    #[test]
    fn test_csharp_namespace_properties_and_expression_body() {
        let source = r#"
using System;

namespace Shop
{
    public class Item : BaseItem, IPriced
    {
        public string Name { get; set; }
        public decimal Price { get; }

        public decimal Total(int count) => Price * count;

        public async Task Save() { }
    }
}
"#;
        let extraction = run("csharp", source);
        let item = extraction.ast.root().child(0).expect("item");
        let decl = item.as_type().expect("type");
        let bases: Vec<BaseKind> = decl.bases.iter().map(|b| b.kind).collect();
        assert_eq!(bases, vec![BaseKind::Extends, BaseKind::Implements]);
        let fields: Vec<(String, bool)> = item
            .fields()
            .filter_map(|f| f.as_field())
            .map(|f| (f.name.clone(), f.mutable))
            .collect();
        assert_eq!(fields, vec![("Name".to_string(), true), ("Price".to_string(), false)]);
        let methods: Vec<_> = item.methods().filter_map(|m| m.as_function()).collect();
        assert_eq!(methods[0].name, "Total");
        assert!(methods[1].is_async);
        assert!(methods[1].return_type.is_void());
    }

    /// Identifier and field references below `node`, in source order
    fn references(node: NodeRef<'_>, out: &mut Vec<String>) {
        for child in node.children() {
            match child.kind() {
                NodeKind::Identifier { name } => out.push(name.clone()),
                NodeKind::FieldAccess { field } if child.child(0).is_some_and(|o| matches!(o.kind(), NodeKind::SelfRef)) => {
                    out.push(format!("self.{}", field))
                }
                _ => {}
            }
            references(child, out);
        }
    }

    #[test]
    fn test_bare_field_names_resolve_to_the_receiver_unless_shadowed() {
        let source = r#"
public class Greeter {
    private String name;
    private int count;

    public String greet() {
        return "Hi " + name + count;
    }

    public void rename(String name) {
        int count = 0;
        this.name = name + count;
    }
}
"#;
        let extraction = run("java", source);
        let greeter = extraction.ast.root().child(0).expect("class");
        let methods: Vec<NodeRef<'_>> = greeter.methods().collect();

        let mut greet = Vec::new();
        references(methods[0], &mut greet);
        assert_eq!(greet, vec!["self.name", "self.count"]);

        let mut rename = Vec::new();
        references(methods[1], &mut rename);
        assert_eq!(rename, vec!["count", "self.name", "name", "count"]);
    }

    #[test]
    fn test_python_bodies_keep_bare_names() {
        let source = "class Box:\n    def __init__(self, size: int):\n        self.size = size\n\n    def grow(self, size: int) -> int:\n        return size\n";
        let extraction = run("python", source);
        let class = extraction.ast.root().child(0).expect("class");
        let grow = class
            .methods()
            .find(|m| m.as_function().is_some_and(|f| f.name == "grow"))
            .expect("grow");
        let mut found = Vec::new();
        references(grow, &mut found);
        assert_eq!(found, vec!["size"]);
    }

    #[test]
    fn test_nested_types_are_hoisted_after_their_parent() {
        let source = "class Outer {\n    static class Inner {}\n    int x;\n}\nclass Next {}\n";
        let extraction = run("java", source);
        assert_eq!(names(&extraction.ast), vec!["type Outer", "type Inner", "type Next"]);
    }
}
