//! Target emission back-ends
//!
//! Each target walks the canonical tree once, in parsed order, and writes
//! text through a shared [`Emitter`]: type rendering through the mapping
//! table, identifier re-casing, documentation and marker comments, and
//! statement bodies through the table-driven [`body::BodyRenderer`].
//!
//! A declaration whose rendering fails is rolled back and replaced by an
//! `UNMAPPED` marker comment; the rest of the file is still emitted.

pub mod body;
pub mod go;
pub mod java;
pub mod kotlin;
pub mod python;
pub mod rust;
pub mod typescript;

use crate::ast::{Ast, BaseKind, NodeKind, NodeRef, TypeKind, Visibility, Visitor};
use crate::comments::{render_doc, render_marker, DocStyle};
use crate::config::Settings;
use crate::error::{ConvertError, Diagnostics, ErrorKind, Result, Span};
use crate::mapping::capabilities::{
    AsyncModel, ErrorModel, GenericSyntax, MultipleInheritance, NamingConventions, SingleInheritance,
};
use crate::mapping::{Capabilities, MappingTable, TargetProfile};
use crate::naming::{self, Case};
use crate::types::TypeRef;
use body::{BodyRenderer, BodyStyle, ReturnShape};
use regex::RegexSet;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Rendered text for one target plus what went wrong on the way
#[derive(Debug, Clone, Default, Serialize)]
pub struct Emission {
    pub text: String,
    pub diagnostics: Diagnostics,
}

/// Canonical AST to target text for one output language
pub trait Backend: Send + Sync {
    /// Canonical tag of the language
    fn language(&self) -> &str;

    /// File extension without the dot
    fn extension(&self) -> &str;

    /// Casing of suggested file names
    fn file_case(&self) -> Case;

    /// Option keys this back-end reads
    fn honored_options(&self) -> &[&'static str];

    /// Render `ast`; fails only when `mapping` has no profile for this target
    fn emit(&self, ast: &Ast, settings: &Settings, mapping: &MappingTable) -> Result<Emission>;

    /// File name for the output: the first top-level declaration, re-cased
    fn suggested_name(&self, ast: &Ast) -> Option<String> {
        let name = ast.declarations().find_map(|node| match node.kind() {
            NodeKind::Type(decl) => Some(decl.name.as_str()),
            NodeKind::Function(decl) => Some(decl.name.as_str()),
            NodeKind::Field(decl) => Some(decl.name.as_str()),
            _ => None,
        })?;
        Some(format!(
            "{}.{}",
            naming::convert(name, self.file_case()),
            self.extension()
        ))
    }
}

/// Tags of every built-in back-end
pub const BUILTIN: &[&str] = &["rust", "go", "python", "typescript", "java", "kotlin"];

/// The built-in back-end for `tag`
pub fn builtin(tag: &str) -> Result<Arc<dyn Backend>> {
    let backend: Arc<dyn Backend> = match tag {
        "rust" => Arc::new(rust::RustBackend),
        "go" => Arc::new(go::GoBackend),
        "python" => Arc::new(python::PythonBackend),
        "typescript" => Arc::new(typescript::TypeScriptBackend),
        "java" => Arc::new(java::JavaBackend),
        "kotlin" => Arc::new(kotlin::KotlinBackend),
        _ => return Err(ConvertError::unsupported_language(tag).with_note("no built-in back-end")),
    };
    Ok(backend)
}

/// Indented line writer
#[derive(Debug)]
pub(crate) struct Writer {
    out: String,
    level: usize,
    unit: String,
    pending_blank: bool,
}

/// Output position to roll back to
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    len: usize,
    level: usize,
}

impl Writer {
    pub fn new(unit: String) -> Self {
        Self {
            out: String::new(),
            level: 0,
            unit,
            pending_blank: false,
        }
    }

    pub fn prefix(&self) -> String {
        self.unit.repeat(self.level)
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn level(&self) -> usize {
        self.level
    }

    fn opens_block(&self) -> bool {
        let last = self.out.trim_end();
        last.is_empty() || last.ends_with('{') || last.ends_with(':') || last.ends_with('(')
    }

    fn flush_blank(&mut self) {
        if std::mem::take(&mut self.pending_blank) && !self.opens_block() {
            self.out.push('\n');
        }
    }

    /// One line at the current indentation
    pub fn line(&mut self, text: impl AsRef<str>) {
        self.flush_blank();
        let text = text.as_ref();
        if !text.is_empty() {
            self.out.push_str(&self.prefix());
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    /// Text that already carries its own indentation
    pub fn raw(&mut self, text: &str) {
        self.flush_blank();
        self.out.push_str(text);
    }

    /// Separate the next line from the previous one
    pub fn blank(&mut self) {
        self.pending_blank = true;
    }

    pub fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.level += 1;
    }

    pub fn close(&mut self, text: impl AsRef<str>) {
        self.pending_blank = false;
        self.level = self.level.saturating_sub(1);
        self.line(text);
    }

    pub fn dedent(&mut self) {
        self.pending_blank = false;
        self.level = self.level.saturating_sub(1);
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            len: self.out.len(),
            level: self.level,
        }
    }

    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.out.truncate(checkpoint.len);
        self.level = checkpoint.level;
        self.pending_blank = false;
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Byte offset of the end of the text so far
    pub fn position(&self) -> usize {
        self.out.len()
    }

    /// Insert finished lines at an earlier position
    pub fn insert(&mut self, at: usize, text: &str) {
        self.out.insert_str(at, text);
    }

    /// The text with exactly one trailing newline
    pub fn finish(self) -> String {
        let mut out = self.out.trim_end().to_string();
        out.push('\n');
        out
    }
}

/// How one target spells identifiers
#[derive(Debug, Clone, Copy)]
pub(crate) struct NamingPolicy {
    pub conventions: NamingConventions,
    pub reserved: &'static [&'static str],
    pub variants: Case,
    /// Case of constants (immutable statics and globals)
    pub constants: Case,
    /// Prefix marking non-public members (Python)
    pub private_prefix: Option<&'static str>,
    pub rust_idents: bool,
}

impl NamingPolicy {
    pub fn new(capabilities: &Capabilities, reserved: &'static [&'static str]) -> Self {
        Self {
            conventions: capabilities.naming,
            reserved,
            variants: Case::Pascal,
            constants: Case::ScreamingSnake,
            private_prefix: None,
            rust_idents: false,
        }
    }

    fn escape(&self, name: String) -> String {
        if self.rust_idents {
            naming::rust_ident(&name)
        } else {
            naming::escape_reserved(&name, self.reserved)
        }
    }

    fn member(&self, name: &str, case: Case, visibility: Visibility) -> String {
        if naming::is_dunder(name) {
            return name.to_string();
        }
        let case = match (visibility, self.conventions.exported) {
            (Visibility::Public, Some(exported)) => exported,
            _ => case,
        };
        let converted = naming::convert(name, case);
        let prefixed = match (self.private_prefix, visibility) {
            (Some(prefix), Visibility::Private | Visibility::Protected) => format!("{}{}", prefix, converted),
            _ => converted,
        };
        self.escape(prefixed)
    }

    pub fn type_name(&self, name: &str) -> String {
        self.escape(naming::convert(name, self.conventions.types))
    }

    pub fn function(&self, name: &str, visibility: Visibility) -> String {
        self.member(name, self.conventions.functions, visibility)
    }

    pub fn field(&self, name: &str, visibility: Visibility) -> String {
        self.member(name, self.conventions.fields, visibility)
    }

    pub fn constant(&self, name: &str, visibility: Visibility) -> String {
        match self.conventions.exported {
            // Go constants follow export casing instead
            Some(_) => self.member(name, self.conventions.fields, visibility),
            None => self.member(name, self.constants, visibility),
        }
    }

    pub fn variable(&self, name: &str) -> String {
        if naming::is_dunder(name) {
            return name.to_string();
        }
        self.escape(naming::recase(name, self.conventions.variables))
    }

    pub fn variant(&self, name: &str) -> String {
        self.escape(naming::convert(name, self.variants))
    }
}

/// Rendered names of everything declared in the file
#[derive(Debug, Default)]
pub(crate) struct Names {
    pub types: BTreeMap<String, String>,
    pub functions: BTreeMap<String, String>,
    pub globals: BTreeMap<String, String>,
    /// Fields and methods of every type; the first declaration wins
    pub members: BTreeMap<String, String>,
}

/// Whether a field is rendered as a constant
pub(crate) fn is_constant(node: NodeRef<'_>) -> bool {
    match node.as_field() {
        Some(field) => {
            let top_level = node.parent().is_some_and(|p| matches!(p.kind(), NodeKind::Program));
            (field.is_static || top_level) && !field.mutable && node.default_value().is_some()
        }
        None => false,
    }
}

impl Names {
    /// Collect names from `ast`; `field_visibility` decides how each field is
    /// exposed after restructuring
    pub fn collect<F>(ast: &Ast, policy: &NamingPolicy, field_visibility: F) -> Self
    where
        F: Fn(NodeRef<'_>) -> Visibility,
    {
        let mut names = Names::default();
        for node in ast.declarations() {
            match node.kind() {
                NodeKind::Type(decl) => {
                    names.types.insert(decl.name.clone(), policy.type_name(&decl.name));
                    names.collect_members(node, policy, &field_visibility);
                }
                NodeKind::Function(decl) => {
                    names
                        .functions
                        .insert(decl.name.clone(), policy.function(&decl.name, decl.visibility));
                }
                NodeKind::Field(decl) => {
                    let name = if is_constant(node) {
                        policy.constant(&decl.name, decl.visibility)
                    } else {
                        policy.field(&decl.name, decl.visibility)
                    };
                    names.globals.insert(decl.name.clone(), name);
                }
                _ => {}
            }
        }
        names
    }

    fn collect_members<F>(&mut self, node: NodeRef<'_>, policy: &NamingPolicy, field_visibility: &F)
    where
        F: Fn(NodeRef<'_>) -> Visibility,
    {
        for member in node.children() {
            match member.kind() {
                NodeKind::Field(decl) => {
                    let name = if is_constant(member) {
                        policy.constant(&decl.name, decl.visibility)
                    } else {
                        policy.field(&decl.name, field_visibility(member))
                    };
                    self.members.entry(decl.name.clone()).or_insert(name);
                }
                NodeKind::Function(decl) => {
                    self.members
                        .entry(decl.name.clone())
                        .or_insert_with(|| policy.function(&decl.name, decl.visibility));
                }
                _ => {}
            }
        }
    }

    pub fn member(&self, name: &str) -> Option<&str> {
        self.members.get(name).map(String::as_str)
    }
}

/// Target-specific spelling rules handed to an [`Emitter`]
pub(crate) struct Style {
    pub naming: NamingPolicy,
    pub body: BodyStyle,
    pub doc: DocStyle,
}

/// Shared state of one emission
pub(crate) struct Emitter<'a> {
    pub ast: &'a Ast,
    pub settings: &'a Settings,
    pub profile: &'a TargetProfile,
    pub naming: NamingPolicy,
    pub body: BodyStyle,
    pub doc_style: DocStyle,
    pub names: Names,
    /// Return rewriting for the body being rendered
    pub returns: Option<ReturnShape>,
    pub out: Writer,
    pub diagnostics: Diagnostics,
    /// Local classes rendered as interfaces because another type lists them
    /// after its first class base
    pub demoted: BTreeSet<String>,
    /// Reads of receiver fields go through getters (interface default methods)
    pub field_getters: bool,
    target: &'static str,
}

/// Bases of one type, sorted by how the target renders them
#[derive(Debug, Default)]
pub(crate) struct BasePlan<'a> {
    /// Extended natively, in order
    pub extends: Vec<&'a TypeRef>,
    /// Rendered as interfaces: declared behaviors and demoted classes
    pub interfaces: Vec<&'a TypeRef>,
    /// Embedded or held as fields
    pub composed: Vec<&'a TypeRef>,
}

impl<'a> Emitter<'a> {
    pub fn new(
        target: &'static str,
        ast: &'a Ast,
        settings: &'a Settings,
        profile: &'a TargetProfile,
        style: Style,
        names: Names,
    ) -> Self {
        let unit = if style.body.tabs {
            "\t".to_string()
        } else {
            " ".repeat(settings.indent_width)
        };
        Self {
            ast,
            settings,
            profile,
            naming: style.naming,
            body: style.body,
            doc_style: style.doc,
            names,
            returns: None,
            out: Writer::new(unit),
            diagnostics: Diagnostics::new(),
            demoted: demoted_classes(ast, &profile.capabilities),
            field_getters: false,
            target,
        }
    }

    pub fn caps(&self) -> &'a Capabilities {
        &self.profile.capabilities
    }

    /// Sort the bases of `node` by the target's inheritance entries
    pub fn plan_bases(&mut self, node: NodeRef<'a>) -> BasePlan<'a> {
        let mut plan = BasePlan::default();
        let Some(decl) = node.as_type() else {
            return plan;
        };
        let mut classes = Vec::new();
        for base in &decl.bases {
            let interface = local_type(self.ast, &base.ty).is_some_and(is_behavior) || self.demoted.contains(&base.ty.base_name);
            match base.kind {
                BaseKind::Extends if !interface => classes.push(&base.ty),
                _ => plan.interfaces.push(&base.ty),
            }
        }
        let caps = self.caps();
        match (classes.len(), caps.single_inheritance, caps.multiple_inheritance) {
            (0, _, _) => {}
            (1, SingleInheritance::Extends, _) | (_, _, MultipleInheritance::Native) => plan.extends = classes,
            (1, _, _) | (_, _, MultipleInheritance::EmbedAll | MultipleInheritance::ComposeAll) => plan.composed = classes,
            (_, _, MultipleInheritance::InterfaceDefaults | MultipleInheritance::InterfaceCopies) => {
                let rest = classes.split_off(1);
                for ty in &rest {
                    self.note(format!("'{}' implements base '{}' as an interface", decl.name, ty), node.span());
                }
                plan.extends = classes;
                plan.interfaces.extend(rest);
            }
        }
        plan
    }

    /// Declared errors change the signature only under this model
    pub fn errors(&self) -> ErrorModel {
        self.caps().errors
    }

    /// Modifier in front of an asynchronous function
    pub fn async_keyword(&self) -> &'static str {
        match self.caps().asynchrony {
            AsyncModel::Keyword => "async ",
            AsyncModel::Suspend => "suspend ",
            AsyncModel::ReturnWrapper(_) | AsyncModel::Unsupported => "",
        }
    }

    /// Declared parameter list of a generic type or function
    pub fn type_params(&self, params: &[String]) -> String {
        if params.is_empty() {
            return String::new();
        }
        match self.caps().generics {
            GenericSyntax::Angle => format!("<{}>", params.join(", ")),
            GenericSyntax::Bracket => format!("[{} any]", params.join(", ")),
            // Declared through the `Generic[..]` base instead
            GenericSyntax::TypeVar => String::new(),
        }
    }

    /// Argument list applying a generic type to its parameters
    pub fn type_args(&self, params: &[String]) -> String {
        if params.is_empty() {
            return String::new();
        }
        match self.caps().generics {
            GenericSyntax::Angle => format!("<{}>", params.join(", ")),
            GenericSyntax::Bracket | GenericSyntax::TypeVar => format!("[{}]", params.join(", ")),
        }
    }

    /// Render a type, recording a diagnostic for each placeholder
    pub fn ty(&mut self, ty: &TypeRef, span: Span) -> String {
        let mut unmapped = Vec::new();
        let text = self.profile.types.render(ty, &mut unmapped);
        self.unmapped(unmapped, span);
        text
    }

    /// Render a type in generic-argument position
    pub fn ty_arg(&mut self, ty: &TypeRef, span: Span) -> String {
        let mut unmapped = Vec::new();
        let text = self.profile.types.render_arg(ty, &mut unmapped);
        self.unmapped(unmapped, span);
        text
    }

    fn unmapped(&mut self, canonical: Vec<String>, span: Span) {
        for name in canonical {
            self.diagnostics.add_error(
                ConvertError::translation(format!("no {} rule for type '{}'", self.target, name))
                    .with_span(span)
                    .with_help("the type was rendered as a placeholder marked UNMAPPED"),
            );
        }
    }

    /// Documentation comment above the next declaration
    pub fn doc(&mut self, doc: Option<&str>) {
        if !self.settings.preserve_comments {
            return;
        }
        if let Some(text) = doc {
            let rendered = render_doc(text, self.doc_style, &self.out.prefix());
            self.out.raw(&rendered);
        }
    }

    /// Documentation followed by tag lines such as `@throws {IOError}`
    pub fn tagged_doc(&mut self, doc: Option<&str>, tags: &[String]) {
        let mut text = match doc {
            Some(doc) if self.settings.preserve_comments => doc.trim().to_string(),
            _ => String::new(),
        };
        if !tags.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&tags.join("\n"));
        }
        if !text.is_empty() {
            let rendered = render_doc(&text, self.doc_style, &self.out.prefix());
            self.out.raw(&rendered);
        }
    }

    /// Doc comment for a generated member, when requested
    pub fn generated_doc(&mut self, text: &str) {
        if self.settings.doc_comments {
            let rendered = render_doc(text, self.doc_style, &self.out.prefix());
            self.out.raw(&rendered);
        }
    }

    /// Labelled comment at the current indentation
    pub fn marker(&mut self, label: &str, text: &str) {
        let rendered = render_marker(label, text, self.doc_style, &self.out.prefix());
        self.out.raw(&rendered);
    }

    /// Generated-file banner
    pub fn header(&mut self) {
        if self.settings.header {
            let prefix = self.doc_style.line_prefix();
            self.out.line(format!(
                "{} Code generated by polyport from {}. DO NOT EDIT.",
                prefix,
                self.ast.source_language()
            ));
            // Imports are inserted after this point
            self.out.line("");
        }
    }

    /// Declaration kept verbatim by the front-end
    pub fn opaque_declaration(&mut self, node: NodeRef<'_>) {
        let span = node.span();
        if self.settings.preserve_comments {
            let text = node.opaque_text().unwrap_or_default();
            self.marker("OPAQUE", text);
        } else {
            self.marker("OPAQUE", &format!("source lines {}-{} not translated", span.start_line(), span.end_line()));
        }
    }

    /// Markers for the unparsed members of a type, at the current indentation
    pub fn opaque_members(&mut self, node: NodeRef<'_>) {
        for member in node.opaque_members() {
            self.opaque_declaration(member);
        }
    }

    /// Marker and diagnostic standing in for a declaration that failed
    pub fn placeholder(&mut self, node: NodeRef<'_>, error: ConvertError) {
        let name = match node.kind() {
            NodeKind::Type(decl) => decl.name.as_str(),
            NodeKind::Function(decl) => decl.name.as_str(),
            NodeKind::Field(decl) => decl.name.as_str(),
            _ => "",
        };
        log::warn!("{} back-end could not render {} '{}': {}", self.target, node.kind().name(), name, error.message);
        self.marker(
            "UNMAPPED",
            &format!("{} '{}' has no {} rendering: {}", node.kind().name(), name, self.target, error.message),
        );
        let error = if error.context.span.is_some() {
            error
        } else {
            error.with_span(node.span())
        };
        self.diagnostics.add_error(error);
    }

    /// Non-fatal note about a restructured construct
    pub fn note(&mut self, message: impl Into<String>, span: Span) {
        self.diagnostics.add_warning(ConvertError::translation(message).with_span(span));
    }

    pub fn renderer<'r>(&'r self, receiver: Option<&'r str>) -> BodyRenderer<'r> {
        BodyRenderer::new(
            &self.body,
            &self.profile.types,
            &self.naming,
            &self.names,
            self.out.unit(),
            receiver,
            self.settings.type_annotations,
        )
        .with_returns(self.returns)
        .with_field_getters(self.field_getters)
    }

    /// Statements of `block` at the current indentation
    pub fn statements(&mut self, block: NodeRef<'a>, receiver: Option<&str>) {
        let mut renderer = self.renderer(receiver);
        let text = renderer.block_lines(block, self.out.level());
        let (unmapped, opaque) = renderer.finish();
        self.absorb(unmapped, opaque, block.span());
        if text.trim().is_empty() {
            if let Some(empty) = self.body.empty_block {
                self.out.line(empty);
            }
        } else {
            self.out.raw(&text);
        }
    }

    /// One expression plus the trailing marker its opaque parts need
    pub fn expression(&mut self, node: NodeRef<'a>, receiver: Option<&str>) -> (String, String) {
        let mut renderer = self.renderer(receiver);
        let text = renderer.expr(node);
        let trailing = renderer.trailing_marker();
        let (unmapped, opaque) = renderer.finish();
        self.absorb(unmapped, opaque, node.span());
        (text, trailing)
    }

    fn absorb(&mut self, unmapped: Vec<String>, opaque: usize, span: Span) {
        self.unmapped(unmapped, span);
        if opaque > 0 {
            log::debug!("{} opaque statement(s) emitted as markers", opaque);
        }
    }

    /// Run a declaration visit, replacing a failed one with a placeholder
    pub fn guarded<V>(visitor: &mut V, node: NodeRef<'a>)
    where
        V: Visitor<'a, Output = ()> + HasEmitter<'a>,
    {
        let checkpoint = visitor.emitter().out.checkpoint();
        if let Err(error) = node.accept(visitor) {
            let emitter = visitor.emitter();
            emitter.out.rollback(checkpoint);
            emitter.placeholder(node, error);
        }
    }

    pub fn finish(self) -> Emission {
        log::debug!(
            "emitted {} bytes of {} with {} diagnostic(s)",
            self.out.as_str().len(),
            self.target,
            self.diagnostics.error_count() + self.diagnostics.warning_count()
        );
        Emission {
            text: self.out.finish(),
            diagnostics: self.diagnostics,
        }
    }
}

/// Local classes that some type lists after its first class base. Targets
/// that turn extra bases into interfaces declare these as interfaces.
pub(crate) fn demoted_classes(ast: &Ast, caps: &Capabilities) -> BTreeSet<String> {
    let mut demoted = BTreeSet::new();
    if !matches!(
        caps.multiple_inheritance,
        MultipleInheritance::InterfaceDefaults | MultipleInheritance::InterfaceCopies
    ) {
        return demoted;
    }
    for node in ast.declarations() {
        let Some(decl) = node.as_type() else {
            continue;
        };
        let classes = decl
            .bases
            .iter()
            .filter(|b| b.kind == BaseKind::Extends && !local_type(ast, &b.ty).is_some_and(is_behavior));
        for base in classes.skip(1) {
            let local = local_type(ast, &base.ty).and_then(|t| t.as_type());
            if local.is_some_and(|t| t.kind != TypeKind::Enum) {
                demoted.insert(base.ty.base_name.clone());
            }
        }
    }
    demoted
}

/// Instance fields of the demoted bases of `node`, which it must declare itself
pub(crate) fn demoted_fields<'a>(ast: &'a Ast, demoted: &BTreeSet<String>, node: NodeRef<'a>) -> Vec<NodeRef<'a>> {
    let Some(decl) = node.as_type() else {
        return Vec::new();
    };
    let own: BTreeSet<&str> = instance_fields(node)
        .iter()
        .filter_map(|f| f.as_field().map(|d| d.name.as_str()))
        .collect();
    let mut seen = BTreeSet::new();
    decl.bases
        .iter()
        .filter(|b| demoted.contains(&b.ty.base_name))
        .filter_map(|b| local_type(ast, &b.ty))
        .flat_map(instance_fields)
        .filter(|f| {
            f.as_field()
                .is_some_and(|d| !own.contains(d.name.as_str()) && seen.insert(d.name.clone()))
        })
        .collect()
}

/// Names of the methods a type declares, constructors excluded
pub(crate) fn declared_methods(node: NodeRef<'_>) -> BTreeSet<String> {
    node.methods()
        .filter_map(|m| m.as_function())
        .filter(|f| !f.is_constructor)
        .map(|f| f.name.clone())
        .collect()
}

/// Access to the shared emitter of a target visitor
pub(crate) trait HasEmitter<'a> {
    fn emitter(&mut self) -> &mut Emitter<'a>;
}

/// Default value of a field or parameter, rendered
pub(crate) fn default_text<'a>(emitter: &mut Emitter<'a>, node: NodeRef<'a>) -> Option<(String, String)> {
    node.default_value().map(|value| emitter.expression(value, None))
}

/// A named canonical type that is declared in the same file
pub(crate) fn local_type<'a>(ast: &'a Ast, ty: &TypeRef) -> Option<NodeRef<'a>> {
    ast.declarations()
        .find(|node| node.as_type().is_some_and(|decl| decl.name == ty.base_name))
}

/// Effective visibility of a field in a target with explicit accessors
pub(crate) fn accessor_field_visibility(settings: &Settings, node: NodeRef<'_>) -> Visibility {
    match node.as_field() {
        Some(field) if settings.accessors && !field.is_static && owner_has_accessors(node) => Visibility::Private,
        Some(field) => field.visibility,
        None => Visibility::Private,
    }
}

fn owner_has_accessors(node: NodeRef<'_>) -> bool {
    node.parent()
        .and_then(|p| p.as_type())
        .is_some_and(|t| matches!(t.kind, TypeKind::Class | TypeKind::Struct))
}

/// Fields of a type that get accessors and constructor parameters
pub(crate) fn instance_fields<'a>(node: NodeRef<'a>) -> Vec<NodeRef<'a>> {
    node.fields()
        .filter(|f| f.as_field().is_some_and(|d| !d.is_static))
        .collect()
}

/// The explicit constructor of a type, if any
pub(crate) fn constructor<'a>(node: NodeRef<'a>) -> Option<NodeRef<'a>> {
    node.methods()
        .find(|m| m.as_function().is_some_and(|f| f.is_constructor))
}

/// Interfaces that carry behavior; data-only interfaces render as records
pub(crate) fn is_behavior(node: NodeRef<'_>) -> bool {
    node.as_type().is_some_and(|t| {
        t.kind == TypeKind::Interface && (node.methods().next().is_some() || node.fields().next().is_none())
    })
}

/// Whether another type in the file extends `name`
pub(crate) fn extended_locally(ast: &Ast, name: &str) -> bool {
    ast.declarations().any(|node| {
        node.as_type().is_some_and(|t| {
            t.bases
                .iter()
                .any(|b| b.kind == BaseKind::Extends && b.ty.base_name == name)
        })
    })
}

/// Import lines whose trigger pattern occurs in `text`, in table order
pub(crate) fn needed_imports(text: &str, table: &[(&str, &str)]) -> Result<Vec<String>> {
    let set = RegexSet::new(table.iter().map(|(pattern, _)| *pattern))
        .map_err(|e| ConvertError::new(ErrorKind::InternalError, format!("import table: {}", e)))?;
    let matched = set.matches(text);
    let mut lines: Vec<String> = table
        .iter()
        .enumerate()
        .filter(|(index, _)| matched.matched(*index))
        .map(|(_, (_, line))| line.to_string())
        .collect();
    lines.dedup();
    Ok(lines)
}

/// Whether a body assigns through the receiver
pub(crate) fn assigns_receiver(node: NodeRef<'_>) -> bool {
    node.children().any(|child| {
        let direct = matches!(child.kind(), NodeKind::Assign { .. })
            && child.child(0).is_some_and(rooted_at_receiver);
        direct || assigns_receiver(child)
    })
}

fn rooted_at_receiver(node: NodeRef<'_>) -> bool {
    match node.kind() {
        NodeKind::SelfRef => true,
        NodeKind::FieldAccess { .. } => node.child(0).is_some_and(rooted_at_receiver),
        _ => false,
    }
}

/// Arguments of a base-constructor call statement (`super(..)`,
/// `super().__init__(..)`, `base(..)`)
pub(crate) fn super_call<'a>(statement: NodeRef<'a>) -> Option<Vec<NodeRef<'a>>> {
    if !matches!(statement.kind(), NodeKind::Call) {
        return None;
    }
    let callee = statement.child(0)?;
    let is_super = match callee.kind() {
        NodeKind::Identifier { name } => name == "super" || name == "base",
        NodeKind::FieldAccess { field } if field == "__init__" => callee.child(0).is_some_and(|object| {
            matches!(object.kind(), NodeKind::Call)
                && object
                    .child(0)
                    .is_some_and(|c| matches!(c.kind(), NodeKind::Identifier { name } if name == "super"))
        }),
        _ => false,
    };
    is_super.then(|| statement.children().skip(1).collect())
}

/// Field assigned by a top-level `self.x = value` statement
pub(crate) fn self_assignment<'a>(statement: NodeRef<'a>) -> Option<(&'a str, NodeRef<'a>)> {
    if !matches!(statement.kind(), NodeKind::Assign { declares: false, .. }) {
        return None;
    }
    let target = statement.child(0)?;
    let NodeKind::FieldAccess { field } = target.kind() else {
        return None;
    };
    if !matches!(target.child(0)?.kind(), NodeKind::SelfRef) {
        return None;
    }
    Some((field.as_str(), statement.child(1)?))
}

/// Whether the last statement of a body returns
pub(crate) fn ends_with_return(body: NodeRef<'_>) -> bool {
    match body.kind() {
        NodeKind::Block => body.children().last().is_some_and(|s| matches!(s.kind(), NodeKind::Return)),
        _ => false,
    }
}

/// Capitalise the first character
pub(crate) fn capitalized(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_indents_and_collapses_blank_after_open() {
        let mut writer = Writer::new("  ".to_string());
        writer.open("fn f() {");
        writer.blank();
        writer.line("x();");
        writer.blank();
        writer.close("}");
        assert_eq!(writer.finish(), "fn f() {\n  x();\n}\n");
    }

    #[test]
    fn test_writer_rollback_restores_level() {
        let mut writer = Writer::new("    ".to_string());
        writer.line("a");
        let checkpoint = writer.checkpoint();
        writer.open("b {");
        writer.line("c");
        writer.rollback(checkpoint);
        writer.line("d");
        assert_eq!(writer.finish(), "a\nd\n");
    }

    #[test]
    fn test_naming_policy_go_exports() {
        let policy = NamingPolicy::new(&Capabilities::go(), &[]);
        assert_eq!(policy.function("get_name", Visibility::Public), "GetName");
        assert_eq!(policy.function("get_name", Visibility::Internal), "getName");
        assert_eq!(policy.field("m_count", Visibility::Private), "count");
    }

    #[test]
    fn test_naming_policy_python_private_prefix() {
        let mut policy = NamingPolicy::new(&Capabilities::python(), &[]);
        policy.private_prefix = Some("_");
        assert_eq!(policy.field("secretValue", Visibility::Private), "_secret_value");
        assert_eq!(policy.function("__init__", Visibility::Public), "__init__");
    }

    #[test]
    fn test_unknown_backend_is_unsupported_language() {
        let err = builtin("cobol").err().expect("no cobol");
        assert_eq!(err.kind, crate::error::ErrorKind::UnsupportedLanguage);
    }

    #[test]
    fn test_later_base_classes_are_demoted_only_where_interfaces_stand_in() {
        let mapping = MappingTable::builtin();
        let frontend = crate::frontend::TableFrontend::for_language("python", &mapping).expect("frontend");
        let source = "class A:\n    pass\n\n\nclass B:\n    pass\n\n\nclass C(A, B):\n    pass\n";
        let ast = crate::frontend::Frontend::extract(&frontend, source).ast;

        for caps in [Capabilities::java(), Capabilities::kotlin(), Capabilities::typescript()] {
            let demoted: Vec<String> = demoted_classes(&ast, &caps).into_iter().collect();
            assert_eq!(demoted, vec!["B".to_string()]);
        }
        for caps in [Capabilities::rust(), Capabilities::go(), Capabilities::python()] {
            assert!(demoted_classes(&ast, &caps).is_empty());
        }
    }
}
