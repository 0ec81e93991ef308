//! Rust back-end
//!
//! Classes become a struct plus an inherent `impl`; methods that implement a
//! trait declared in the same file move into `impl Trait for Type`. Rust has
//! no inheritance, so every `extends` edge is composed: the base becomes a
//! field and its public methods are forwarded. Declared exceptions turn into
//! `Result` return types.

use super::body::{collect_reassigned, BodyStyle, ReturnShape};
use super::{
    accessor_field_visibility, assigns_receiver, constructor, default_text, ends_with_return, instance_fields,
    is_behavior, is_constant, local_type, needed_imports, self_assignment, super_call, Backend, Emission, Emitter,
    HasEmitter, NamingPolicy, Names, Style,
};
use crate::ast::{Ast, NodeKind, NodeRef, TypeKind, Visibility, Visitor};
use crate::comments::DocStyle;
use crate::config::{self, Settings};
use crate::error::{ConvertError, Result};
use crate::mapping::capabilities::{ErrorModel, PropertyModel};
use crate::mapping::MappingTable;
use crate::naming::{self, Case};
use crate::types::{TypeCategory, TypeRef};
use std::collections::{BTreeMap, BTreeSet};

pub struct RustBackend;

const IMPORTS: &[(&str, &str)] = &[
    (r"\bHashMap<", "use std::collections::HashMap;"),
    (r"\bHashSet<", "use std::collections::HashSet;"),
];

impl Backend for RustBackend {
    fn language(&self) -> &str {
        "rust"
    }

    fn extension(&self) -> &str {
        "rs"
    }

    fn file_case(&self) -> Case {
        Case::Snake
    }

    fn honored_options(&self) -> &[&'static str] {
        &[
            config::PRESERVE_COMMENTS,
            config::GENERATE_DOC_COMMENTS,
            config::INDENT_WIDTH,
            config::GENERATE_ACCESSORS,
            config::EMIT_HEADER,
        ]
    }

    fn emit(&self, ast: &Ast, settings: &Settings, mapping: &MappingTable) -> Result<Emission> {
        let profile = mapping.target("rust")?;
        let naming = NamingPolicy {
            rust_idents: true,
            ..NamingPolicy::new(&profile.capabilities, &[])
        };
        let accessors = settings.accessors && profile.capabilities.properties == PropertyModel::Accessors;
        let names = Names::collect(ast, &naming, |node| {
            if accessors {
                accessor_field_visibility(settings, node)
            } else {
                node.as_field().map(|f| f.visibility).unwrap_or(Visibility::Private)
            }
        });
        let style = Style {
            naming,
            body: BodyStyle::rust(),
            doc: DocStyle::TripleSlash,
        };
        let mut emitter = RustEmitter {
            e: Emitter::new("rust", ast, settings, profile, style, names),
            accessors,
            derived: BTreeMap::new(),
        };
        emitter.file()?;
        Ok(emitter.e.finish())
    }
}

struct RustEmitter<'a> {
    e: Emitter<'a>,
    accessors: bool,
    /// Derive list of each struct emitted so far
    derived: BTreeMap<String, &'static str>,
}

impl<'a> HasEmitter<'a> for RustEmitter<'a> {
    fn emitter(&mut self) -> &mut Emitter<'a> {
        &mut self.e
    }
}

fn visibility(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "pub ",
        Visibility::Protected | Visibility::Internal => "pub(crate) ",
        Visibility::Private => "",
    }
}

/// Copyable values are returned from getters by value
fn is_copy(ty: &TypeRef) -> bool {
    ty.category == TypeCategory::Primitive && ty.base_name != "string"
}

/// Derives a struct can carry, given its rendered members and the derives of
/// composed local bases
fn derives_for(
    members: &[(Option<&str>, String)],
    bases: &[(String, TypeRef)],
    derived: &BTreeMap<String, &'static str>,
) -> &'static str {
    let mut derives = if members.iter().any(|(_, line)| line.contains("dyn Fn")) {
        ""
    } else if members.iter().any(|(_, line)| line.contains("dyn ")) {
        "Debug"
    } else {
        "Debug, Clone"
    };
    for (_, ty) in bases {
        match derived.get(&ty.base_name) {
            Some(&base) if base.len() < derives.len() => derives = base,
            _ => {}
        }
    }
    derives
}

impl<'a> RustEmitter<'a> {
    fn file(&mut self) -> Result<()> {
        self.e.header();
        let imports_at = self.e.out.position();
        let ast = self.e.ast;
        for node in ast.declarations() {
            Emitter::guarded(self, node);
            self.e.out.blank();
        }
        let imports = needed_imports(self.e.out.as_str(), IMPORTS)?;
        if !imports.is_empty() {
            self.e.out.insert(imports_at, &format!("{}\n\n", imports.join("\n")));
        }
        Ok(())
    }

    fn type_name(&self, name: &str) -> String {
        self.e.names.types.get(name).cloned().unwrap_or_else(|| self.e.naming.type_name(name))
    }

    fn field_name(&self, node: NodeRef<'_>) -> String {
        let Some(field) = node.as_field() else {
            return String::new();
        };
        self.e.names.member(&field.name).map(str::to_string).unwrap_or_else(|| {
            self.e.naming.field(&field.name, field.visibility)
        })
    }

    /// Composed bases: field name and base type
    fn bases(&mut self, node: NodeRef<'a>) -> Vec<(String, TypeRef)> {
        let plan = self.e.plan_bases(node);
        let composed: Vec<&TypeRef> = plan.extends.into_iter().chain(plan.composed).collect();
        match composed.as_slice() {
            [] => Vec::new(),
            [single] => vec![("base".to_string(), (*single).clone())],
            many => many
                .iter()
                .map(|ty| (naming::convert(&ty.base_name, Case::Snake), (*ty).clone()))
                .collect(),
        }
    }

    fn struct_decl(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        let name = self.type_name(&decl.name);
        let params = self.e.type_params(&decl.type_params);
        let bases = self.bases(node);

        self.e.doc(decl.doc.as_deref());
        for ty in self.e.plan_bases(node).interfaces {
            if local_type(self.e.ast, ty).filter(|t| is_behavior(*t)).is_none() {
                self.e.marker("NOTE", &format!("implements {}", ty));
            }
        }
        if !bases.is_empty() {
            self.e.note(
                format!("'{}' composes its base type instead of inheriting", decl.name),
                node.span(),
            );
        }

        let fields: Vec<NodeRef<'a>> = instance_fields(node);
        let mut members: Vec<(Option<&'a str>, String)> = Vec::new();
        for (field, ty) in &bases {
            let ty = self.e.ty(ty, node.span());
            members.push((None, format!("{}: {},", field, ty)));
        }
        for field in &fields {
            members.extend(self.struct_field(*field));
        }
        let derives = derives_for(&members, &bases, &self.derived);
        self.derived.insert(decl.name.clone(), derives);
        if !derives.is_empty() {
            self.e.out.line(format!("#[derive({})]", derives));
        }
        if members.is_empty() && node.opaque_members().next().is_none() {
            self.e.out.line(format!("{}struct {}{};", visibility(decl.visibility), name, params));
        } else {
            self.e.out.open(format!("{}struct {}{} {{", visibility(decl.visibility), name, params));
            for (doc, line) in members {
                self.e.doc(doc);
                self.e.out.line(line);
            }
            self.e.opaque_members(node);
            self.e.out.close("}");
        }

        self.e.out.blank();
        self.inherent_impl(node, &name, &params, &bases)?;
        self.trait_impls(node, &name, &params)?;
        Ok(())
    }

    /// Doc text and line of one struct field
    fn struct_field(&mut self, node: NodeRef<'a>) -> Option<(Option<&'a str>, String)> {
        let field = node.as_field()?;
        let exposed = if self.accessors {
            Visibility::Private
        } else {
            field.visibility
        };
        let ty = self.e.ty(&field.ty, node.span());
        let name = self.field_name(node);
        Some((field.doc.as_deref(), format!("{}{}: {},", visibility(exposed), name, ty)))
    }

    /// Traits declared in this file that `node` implements
    fn local_traits(&mut self, node: NodeRef<'a>) -> Vec<(&'a TypeRef, NodeRef<'a>)> {
        let ast = self.e.ast;
        self.e
            .plan_bases(node)
            .interfaces
            .into_iter()
            .filter_map(|ty| local_type(ast, ty).filter(|t| is_behavior(*t)).map(|local| (ty, local)))
            .collect()
    }

    /// Methods of `node` that implement a trait declared in this file
    fn trait_methods(&mut self, node: NodeRef<'a>) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for (_, local) in self.local_traits(node) {
            for method in local.methods() {
                if let Some(f) = method.as_function() {
                    names.insert(f.name.clone());
                }
            }
        }
        names
    }

    fn inherent_impl(&mut self, node: NodeRef<'a>, name: &str, params: &str, bases: &[(String, TypeRef)]) -> Result<()> {
        let in_traits = self.trait_methods(node);
        let statics: Vec<NodeRef<'a>> = node
            .fields()
            .filter(|f| f.as_field().is_some_and(|d| d.is_static))
            .collect();
        let methods: Vec<NodeRef<'a>> = node
            .methods()
            .filter(|m| m.as_function().is_some_and(|f| f.is_constructor || !in_traits.contains(&f.name)))
            .collect();
        let fields = instance_fields(node);
        let needs_new = constructor(node).is_none() && (!fields.is_empty() || !bases.is_empty());
        let forwarded = self.forwardable(node, bases);

        if statics.is_empty() && methods.is_empty() && !needs_new && forwarded.is_empty() && !(self.accessors && !fields.is_empty()) {
            return Ok(());
        }

        self.e.out.open(format!("impl{} {}{} {{", params, name, params));
        for field in statics {
            self.associated_const(field);
        }
        if needs_new {
            self.synthesized_new(node, bases);
        }
        for method in &methods {
            if method.as_function().is_some_and(|f| f.is_constructor) {
                self.constructor(*method, node, bases)?;
                self.e.out.blank();
            }
        }
        if self.accessors {
            self.accessor_methods(node, &fields);
        }
        for method in &methods {
            if method.as_function().is_some_and(|f| !f.is_constructor) {
                self.e.out.blank();
                self.method(*method, true)?;
            }
        }
        for (field, method) in forwarded {
            self.e.out.blank();
            self.forward(&field, method);
        }
        self.e.out.close("}");
        Ok(())
    }

    fn trait_impls(&mut self, node: NodeRef<'a>, name: &str, params: &str) -> Result<()> {
        for (ty, local) in self.local_traits(node) {
            let wanted: BTreeSet<&str> = local
                .methods()
                .filter_map(|m| m.as_function().map(|f| f.name.as_str()))
                .collect();
            let trait_name = self.e.ty(ty, node.span());
            self.e.out.blank();
            self.e.out.open(format!("impl{} {} for {}{} {{", params, trait_name, name, params));
            let mut first = true;
            for method in node.methods() {
                if method.as_function().is_some_and(|f| wanted.contains(f.name.as_str())) {
                    if !first {
                        self.e.out.blank();
                    }
                    first = false;
                    self.method(method, false)?;
                }
            }
            self.e.out.close("}");
        }
        Ok(())
    }

    fn associated_const(&mut self, node: NodeRef<'a>) {
        let Some(field) = node.as_field() else {
            return;
        };
        let name = self.e.naming.constant(&field.name, field.visibility);
        let ty = self.e.ty(&field.ty, node.span());
        if !is_constant(node) {
            self.e.note(
                format!("static field '{}' rendered as an associated constant", field.name),
                node.span(),
            );
        }
        let (value, trailing) = default_text(&mut self.e, node).unwrap_or_else(|| ("todo!()".to_string(), String::new()));
        self.e.doc(field.doc.as_deref());
        self.e.out.line(format!("{}const {}: {} = {};{}", visibility(field.visibility), name, ty, value, trailing));
    }

    fn params(&mut self, function: NodeRef<'a>) -> Vec<String> {
        let mut reassigned = BTreeSet::new();
        if let Some(body) = function.body() {
            collect_reassigned(body, &mut reassigned);
        }
        let mut out = Vec::new();
        for param in function.params() {
            let Some(decl) = param.as_param() else {
                continue;
            };
            let ty = self.e.ty(&decl.ty, param.span());
            if param.default_value().is_some() {
                self.e.note(format!("default value of parameter '{}' dropped", decl.name), param.span());
            }
            let mutable = if reassigned.contains(&decl.name) { "mut " } else { "" };
            out.push(format!("{}{}: {}", mutable, self.e.naming.variable(&decl.name), ty));
        }
        out
    }

    /// Return type text and the return rewriting for the body
    fn return_type(&mut self, function: NodeRef<'a>) -> (String, Option<ReturnShape>) {
        let Some(decl) = function.as_function() else {
            return (String::new(), None);
        };
        let value = if decl.return_type.is_void() {
            "()".to_string()
        } else {
            self.e.ty(&decl.return_type, function.span())
        };
        if decl.throws.is_empty() || self.e.errors() != ErrorModel::ResultValue {
            let text = if decl.return_type.is_void() {
                String::new()
            } else {
                format!(" -> {}", value)
            };
            return (text, None);
        }
        let error = match decl.throws.as_slice() {
            [single] if single.category == TypeCategory::Custom && local_type(self.e.ast, single).is_some() => {
                self.e.ty(single, function.span())
            }
            _ => "Box<dyn std::error::Error>".to_string(),
        };
        let shape = ReturnShape {
            value: "Ok({0})",
            bare: "Ok(())",
        };
        (format!(" -> Result<{}, {}>", value, error), Some(shape))
    }

    fn method(&mut self, function: NodeRef<'a>, inherent: bool) -> Result<()> {
        let Some(decl) = function.as_function() else {
            return Ok(());
        };
        let name = self
            .e
            .names
            .member(&decl.name)
            .map(str::to_string)
            .unwrap_or_else(|| self.e.naming.function(&decl.name, decl.visibility));
        let mut params = self.params(function);
        if !decl.is_static {
            let receiver = match function.body() {
                Some(body) if assigns_receiver(body) => "&mut self",
                _ => "&self",
            };
            params.insert(0, receiver.to_string());
        }
        let vis = if inherent { visibility(decl.visibility) } else { "" };
        self.function_item(function, vis, &name, &params)
    }

    fn function_item(&mut self, function: NodeRef<'a>, vis: &str, name: &str, params: &[String]) -> Result<()> {
        let Some(decl) = function.as_function() else {
            return Ok(());
        };
        let asyncness = if decl.is_async { self.e.async_keyword() } else { "" };
        let (ret, shape) = self.return_type(function);
        self.e.doc(decl.doc.as_deref());
        let head = format!(
            "{}{}fn {}{}({}){}",
            vis,
            asyncness,
            name,
            self.e.type_params(&decl.type_params),
            params.join(", "),
            ret
        );
        match function.body() {
            Some(body) => {
                self.e.out.open(format!("{} {{", head));
                self.e.returns = shape;
                self.e.statements(body, None);
                self.e.returns = None;
                if shape.is_some() && decl.return_type.is_void() && !ends_with_return(body) {
                    self.e.out.line("Ok(())");
                }
                self.e.out.close("}");
            }
            None => {
                self.e.out.open(format!("{} {{", head));
                self.e.out.line("todo!()");
                self.e.out.close("}");
                self.e.note(format!("abstract method '{}' rendered with a todo!() body", decl.name), function.span());
            }
        }
        Ok(())
    }

    fn synthesized_new(&mut self, node: NodeRef<'a>, bases: &[(String, TypeRef)]) {
        let mut params = Vec::new();
        let mut inits = Vec::new();
        for (field, ty) in bases {
            let ty = self.e.ty(ty, node.span());
            params.push(format!("{}: {}", field, ty));
            inits.push(field.clone());
        }
        for field in instance_fields(node) {
            let Some(decl) = field.as_field() else {
                continue;
            };
            let name = self.field_name(field);
            match default_text(&mut self.e, field) {
                Some((value, _)) => inits.push(format!("{}: {}", name, value)),
                None => {
                    let ty = self.e.ty(&decl.ty, field.span());
                    params.push(format!("{}: {}", name, ty));
                    inits.push(name);
                }
            }
        }
        self.e.generated_doc("Creates a new instance from its field values.");
        self.e.out.open(format!("pub fn new({}) -> Self {{", params.join(", ")));
        self.e.out.line(format!("Self {{ {} }}", inits.join(", ")));
        self.e.out.close("}");
    }

    /// `new` from an explicit constructor: receiver assignments at the top
    /// level become field initialisers, the rest runs on the new instance
    fn constructor(&mut self, function: NodeRef<'a>, owner: NodeRef<'a>, bases: &[(String, TypeRef)]) -> Result<()> {
        let Some(decl) = function.as_function() else {
            return Ok(());
        };
        let params = self.params(function);
        let (ret, shape) = if decl.throws.is_empty() || self.e.errors() != ErrorModel::ResultValue {
            (" -> Self".to_string(), None)
        } else {
            (
                " -> Result<Self, Box<dyn std::error::Error>>".to_string(),
                Some(ReturnShape {
                    value: "Ok({0})",
                    bare: "Ok(instance)",
                }),
            )
        };

        let statements: Vec<NodeRef<'a>> = match function.body() {
            Some(body) if matches!(body.kind(), NodeKind::Block) => body.children().collect(),
            _ => Vec::new(),
        };
        let mut assigned = Vec::new();
        let mut base_args = None;
        let mut rest = Vec::new();
        for statement in &statements {
            if let Some((field, value)) = self_assignment(*statement) {
                assigned.push((field, value));
            } else if let Some(args) = super_call(*statement).filter(|_| base_args.is_none()) {
                base_args = Some(args);
            } else {
                rest.push(*statement);
            }
        }

        let mut inits = Vec::new();
        for (field, ty) in bases {
            let base_name = self.type_name(&ty.base_name);
            match &base_args {
                Some(args) if field == "base" || bases.len() == 1 => {
                    let rendered: Vec<String> = args.iter().map(|a| self.e.expression(*a, None).0).collect();
                    inits.push(format!("{}: {}::new({})", field, base_name, rendered.join(", ")));
                }
                _ => inits.push(format!("{}: Default::default()", field)),
            }
        }
        for field in instance_fields(owner) {
            let Some(fdecl) = field.as_field() else {
                continue;
            };
            let name = self.field_name(field);
            let value = match assigned.iter().find(|(f, _)| *f == fdecl.name) {
                Some((_, value)) => Some(self.e.expression(*value, None).0),
                None => default_text(&mut self.e, field).map(|(v, _)| v),
            };
            let value = value.unwrap_or_else(|| "Default::default()".to_string());
            if value == name {
                inits.push(name);
            } else {
                inits.push(format!("{}: {}", name, value));
            }
        }

        self.e.doc(decl.doc.as_deref());
        self.e.out.open(format!("{}fn new({}){} {{", visibility(decl.visibility), params.join(", "), ret));
        let literal = format!("Self {{ {} }}", inits.join(", "));
        let wrap = |text: String| if shape.is_some() { format!("Ok({})", text) } else { text };
        if rest.is_empty() {
            self.e.out.line(wrap(literal));
        } else {
            self.e.out.line(format!("let mut instance = {};", literal));
            self.e.returns = shape;
            for statement in rest {
                self.e.statements(statement, Some("instance"));
            }
            self.e.returns = None;
            self.e.out.line(wrap("instance".to_string()));
        }
        self.e.out.close("}");
        Ok(())
    }

    fn accessor_methods(&mut self, owner: NodeRef<'a>, fields: &[NodeRef<'a>]) {
        let taken: BTreeSet<String> = owner
            .methods()
            .filter_map(|m| m.as_function().map(|f| naming::convert(&f.name, Case::Snake)))
            .collect();
        for field in fields {
            let Some(decl) = field.as_field() else {
                continue;
            };
            let name = self.field_name(*field);
            let ty = self.e.ty(&decl.ty, field.span());
            if !taken.contains(&name) {
                self.e.out.blank();
                self.e.generated_doc(&format!("Returns the {} field.", name));
                if is_copy(&decl.ty) {
                    self.e.out.open(format!("pub fn {}(&self) -> {} {{", name, ty));
                    self.e.out.line(format!("self.{}", name));
                } else {
                    self.e.out.open(format!("pub fn {}(&self) -> &{} {{", name, ty));
                    self.e.out.line(format!("&self.{}", name));
                }
                self.e.out.close("}");
            }
            let setter = format!("set_{}", name.trim_start_matches("r#"));
            if decl.mutable && !taken.contains(&setter) {
                self.e.out.blank();
                self.e.generated_doc(&format!("Replaces the {} field.", name));
                self.e.out.open(format!("pub fn {}(&mut self, value: {}) {{", setter, ty));
                self.e.out.line(format!("self.{} = value;", name));
                self.e.out.close("}");
            }
        }
    }

    /// Public methods of local bases that the type does not define itself
    fn forwardable(&self, node: NodeRef<'a>, bases: &[(String, TypeRef)]) -> Vec<(String, NodeRef<'a>)> {
        let own: BTreeSet<&str> = node
            .methods()
            .filter_map(|m| m.as_function().map(|f| f.name.as_str()))
            .collect();
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for (field, ty) in bases {
            let Some(base) = local_type(self.e.ast, ty) else {
                continue;
            };
            for method in base.methods() {
                let Some(f) = method.as_function() else {
                    continue;
                };
                if f.is_constructor || f.is_static || f.visibility != Visibility::Public {
                    continue;
                }
                if own.contains(f.name.as_str()) || !seen.insert(f.name.clone()) {
                    continue;
                }
                out.push((field.clone(), method));
            }
        }
        out
    }

    fn forward(&mut self, field: &str, method: NodeRef<'a>) {
        let Some(decl) = method.as_function() else {
            return;
        };
        let name = self.e.naming.function(&decl.name, decl.visibility);
        let mut params = self.params(method);
        let receiver = match method.body() {
            Some(body) if assigns_receiver(body) => "&mut self",
            _ => "&self",
        };
        params.insert(0, receiver.to_string());
        let args: Vec<String> = method
            .params()
            .filter_map(|p| p.as_param().map(|d| self.e.naming.variable(&d.name)))
            .collect();
        let (ret, _) = self.return_type(method);
        let awaited = if decl.is_async { ".await" } else { "" };
        let asyncness = if decl.is_async { self.e.async_keyword() } else { "" };
        self.e.generated_doc(&format!("Forwards to the composed `{}`.", field));
        self.e.out.open(format!("pub {}fn {}({}){} {{", asyncness, name, params.join(", "), ret));
        self.e.out.line(format!("self.{}.{}({}){}", field, name, args.join(", "), awaited));
        self.e.out.close("}");
    }

    fn trait_decl(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        let name = self.type_name(&decl.name);
        let supertraits: Vec<String> = decl.bases.iter().map(|b| self.e.ty(&b.ty, node.span())).collect();
        let bounds = if supertraits.is_empty() {
            String::new()
        } else {
            format!(": {}", supertraits.join(" + "))
        };
        self.e.doc(decl.doc.as_deref());
        self.e.out.open(format!(
            "{}trait {}{}{} {{",
            visibility(decl.visibility),
            name,
            self.e.type_params(&decl.type_params),
            bounds
        ));
        let mut first = true;
        for field in node.fields() {
            let Some(f) = field.as_field() else {
                continue;
            };
            let getter = self.field_name(field);
            let ty = self.e.ty(&f.ty, field.span());
            self.e.out.line(format!("fn {}(&self) -> &{};", getter, ty));
            first = false;
        }
        for method in node.methods() {
            if !first {
                self.e.out.blank();
            }
            first = false;
            let Some(f) = method.as_function() else {
                continue;
            };
            if method.body().is_some() {
                self.method(method, false)?;
                continue;
            }
            let name = self.e.naming.function(&f.name, f.visibility);
            let mut params = self.params(method);
            if !f.is_static {
                params.insert(0, "&self".to_string());
            }
            let (ret, _) = self.return_type(method);
            let asyncness = if f.is_async { self.e.async_keyword() } else { "" };
            self.e.doc(f.doc.as_deref());
            self.e.out.line(format!(
                "{}fn {}{}({}){};",
                asyncness,
                name,
                self.e.type_params(&f.type_params),
                params.join(", "),
                ret
            ));
        }
        self.e.opaque_members(node);
        self.e.out.close("}");
        Ok(())
    }

    fn enum_decl(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        let name = self.type_name(&decl.name);
        self.e.doc(decl.doc.as_deref());
        self.e.out.line("#[derive(Debug, Clone, Copy, PartialEq, Eq)]");
        self.e.out.open(format!("{}enum {} {{", visibility(decl.visibility), name));
        for variant in &decl.variants {
            let variant = self.e.naming.variant(variant);
            self.e.out.line(format!("{},", variant));
        }
        self.e.opaque_members(node);
        self.e.out.close("}");
        if node.methods().next().is_some() {
            self.e.out.blank();
            self.e.out.open(format!("impl {} {{", name));
            let mut first = true;
            for method in node.methods() {
                if !first {
                    self.e.out.blank();
                }
                first = false;
                self.method(method, true)?;
            }
            self.e.out.close("}");
        }
        Ok(())
    }
}

impl<'a> Visitor<'a> for RustEmitter<'a> {
    type Output = ();

    fn visit_type(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        match decl.kind {
            TypeKind::Enum => self.enum_decl(node),
            TypeKind::Interface if is_behavior(node) => self.trait_decl(node),
            _ => self.struct_decl(node),
        }
    }

    fn visit_function(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_function() else {
            return Ok(());
        };
        let name = self
            .e
            .names
            .functions
            .get(&decl.name)
            .cloned()
            .unwrap_or_else(|| self.e.naming.function(&decl.name, decl.visibility));
        let params = self.params(node);
        let vis = visibility(decl.visibility);
        self.function_item(node, vis, &name, &params)
    }

    fn visit_field(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(field) = node.as_field() else {
            return Ok(());
        };
        let ty = self.e.ty(&field.ty, node.span());
        let Some((value, trailing)) = default_text(&mut self.e, node) else {
            return Err(ConvertError::translation(format!(
                "global '{}' has no initializer",
                field.name
            ))
            .with_help("Rust statics must be initialized"));
        };
        self.e.doc(field.doc.as_deref());
        let name = self.e.naming.constant(&field.name, field.visibility);
        if is_constant(node) {
            self.e.out.line(format!("{}const {}: {} = {};{}", visibility(field.visibility), name, ty, value, trailing));
        } else {
            self.e.note(format!("mutable global '{}' rendered as an immutable static", field.name), node.span());
            self.e.out.line(format!("{}static {}: {} = {};{}", visibility(field.visibility), name, ty, value, trailing));
        }
        Ok(())
    }

    fn visit_opaque(&mut self, node: NodeRef<'a>) -> Result<()> {
        self.e.opaque_declaration(node);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{Frontend, TableFrontend};

    fn convert(language: &str, source: &str) -> Emission {
        let mapping = MappingTable::builtin();
        let frontend = TableFrontend::for_language(language, &mapping).expect("frontend");
        let ast = frontend.extract(source).ast;
        let settings = Settings {
            header: false,
            ..Settings::default()
        };
        RustBackend.emit(&ast, &settings, &mapping).expect("emission")
    }

    #[test]
    fn test_function_signature() {
        let emission = convert("python", "def add(a: int, b: int) -> int:\n    return a + b\n");
        assert_eq!(emission.text, "pub fn add(a: i64, b: i64) -> i64 {\n    return a + b;\n}\n");
        assert!(emission.diagnostics.is_empty());
    }

    #[test]
    fn test_class_gets_struct_constructor_and_accessors() {
        let source = "\
public class Person {
    private String name;
    private int age;

    public Person(String name, int age) {
        this.name = name;
        this.age = age;
    }

    public void birthday() {
        this.age += 1;
    }
}
";
        let emission = convert("java", source);
        let text = &emission.text;
        assert!(text.contains("pub struct Person {\n    name: String,\n    age: i32,\n}"), "{}", text);
        assert!(text.contains("pub fn new(name: String, age: i32) -> Self {\n        Self { name, age }\n    }"), "{}", text);
        assert!(text.contains("pub fn name(&self) -> &String {"), "{}", text);
        assert!(text.contains("pub fn age(&self) -> i32 {"), "{}", text);
        assert!(text.contains("pub fn set_age(&mut self, value: i32) {"), "{}", text);
        assert!(text.contains("pub fn birthday(&mut self) {\n        self.age = self.age + 1;\n    }"), "{}", text);
        assert!(syn::parse_file(text).is_ok(), "{}", text);
    }

    #[test]
    fn test_inheritance_is_composed_with_forwarding() {
        let source = "\
class Animal {
    public String speak() {
        return \"...\";
    }
}

class Dog extends Animal {
    public String fetch() {
        return \"ball\";
    }
}
";
        let emission = convert("java", source);
        let text = &emission.text;
        assert!(text.contains("struct Dog {\n    base: Animal,\n}"), "{}", text);
        assert!(text.contains("pub fn speak(&self) -> String {\n        self.base.speak()\n    }"), "{}", text);
        assert_eq!(emission.diagnostics.warning_count(), 1);
        assert!(syn::parse_file(text).is_ok(), "{}", text);
    }

    #[test]
    fn test_throws_becomes_result() {
        let source = "\
class Reader {
    public String read(String path) throws IOException {
        return path;
    }
}
";
        let emission = convert("java", source);
        assert!(
            emission
                .text
                .contains("pub fn read(&self, path: String) -> Result<String, Box<dyn std::error::Error>> {\n        return Ok(path);"),
            "{}",
            emission.text
        );
    }

    #[test]
    fn test_interface_becomes_trait_with_impl() {
        let source = "\
interface Shape {
    area(): number;
}

class Square implements Shape {
    side: number = 1;

    area(): number {
        return this.side * this.side;
    }
}
";
        let emission = convert("typescript", source);
        let text = &emission.text;
        assert!(text.contains("trait Shape {\n    fn area(&self) -> f64;\n}"), "{}", text);
        assert!(text.contains("impl Shape for Square {\n    fn area(&self) -> f64 {"), "{}", text);
        assert!(syn::parse_file(text).is_ok(), "{}", text);
    }

    #[test]
    fn test_collections_pull_in_imports() {
        let emission = convert("python", "def index(words: list[str]) -> dict[str, int]:\n    pass\n");
        assert!(emission.text.starts_with("use std::collections::HashMap;\n\n"), "{}", emission.text);
    }

    #[test]
    fn test_opaque_declaration_is_marked() {
        let emission = convert("go", "package main\n\nfunc ok() int {\n\treturn 1\n}\n\nselect weird {\n}\n");
        assert!(emission.text.contains("// OPAQUE:"), "{}", emission.text);
        assert!(emission.text.contains("fn ok() -> i64 {"), "{}", emission.text);
    }

    #[test]
    fn test_dynamic_field_drops_clone() {
        let source = "\
class Holder:
    def __init__(self, value):
        self.value = value
";
        let emission = convert("python", source);
        let text = &emission.text;
        assert!(text.contains("#[derive(Debug)]\npub struct Holder {"), "{}", text);
        assert!(!text.contains("Clone"), "{}", text);
        assert!(syn::parse_file(text).is_ok(), "{}", text);
    }
}
