//! Java back-end
//!
//! Top-level functions and variables have no home in Java, so they are
//! gathered into a final `Main` class of static members. Fields sit behind
//! getters and setters unless accessors are turned off, and asynchronous
//! functions return a `CompletableFuture`.

use super::body::{BodyStyle, ReturnShape};
use super::{
    accessor_field_visibility, capitalized, constructor, declared_methods, default_text, demoted_fields,
    ends_with_return, instance_fields, is_behavior, is_constant, local_type, needed_imports, super_call, Backend,
    Emission, Emitter, HasEmitter, NamingPolicy, Names, Style,
};
use crate::ast::{Ast, NodeKind, NodeRef, TypeKind, Visibility, Visitor};
use crate::comments::DocStyle;
use crate::config::{self, Settings};
use crate::error::Result;
use crate::mapping::capabilities::{AsyncModel, ErrorModel};
use crate::mapping::MappingTable;
use crate::naming::{self, Case};
use std::collections::BTreeSet;

pub struct JavaBackend;

const RESERVED: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const", "continue",
    "default", "do", "double", "else", "enum", "extends", "final", "finally", "float", "for", "goto", "if",
    "implements", "import", "instanceof", "int", "interface", "long", "native", "new", "package", "private",
    "protected", "public", "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this",
    "throw", "throws", "transient", "try", "void", "volatile", "while",
];

const IMPORTS: &[(&str, &str)] = &[
    (r"\bList<", "import java.util.List;"),
    (r"\bMap<", "import java.util.Map;"),
    (r"\bObjects\.", "import java.util.Objects;"),
    (r"\bOptional<", "import java.util.Optional;"),
    (r"\bSet<", "import java.util.Set;"),
    (r"\bCompletableFuture\b", "import java.util.concurrent.CompletableFuture;"),
    (r"\bBiConsumer<", "import java.util.function.BiConsumer;"),
    (r"\bBiFunction<", "import java.util.function.BiFunction;"),
    (r"\bConsumer<", "import java.util.function.Consumer;"),
    (r"\bFunction<", "import java.util.function.Function;"),
    (r"\bSupplier<", "import java.util.function.Supplier;"),
];

/// Holder of top-level functions and variables
const MAIN: &str = "Main";

impl Backend for JavaBackend {
    fn language(&self) -> &str {
        "java"
    }

    fn extension(&self) -> &str {
        "java"
    }

    fn file_case(&self) -> Case {
        Case::Pascal
    }

    fn honored_options(&self) -> &[&'static str] {
        &[
            config::PRESERVE_COMMENTS,
            config::GENERATE_DOC_COMMENTS,
            config::INDENT_WIDTH,
            config::GENERATE_ACCESSORS,
            config::PACKAGE_NAME,
            config::EMIT_HEADER,
        ]
    }

    fn emit(&self, ast: &Ast, settings: &Settings, mapping: &MappingTable) -> Result<Emission> {
        let profile = mapping.target("java")?;
        let naming = NamingPolicy {
            variants: Case::ScreamingSnake,
            ..NamingPolicy::new(&profile.capabilities, RESERVED)
        };
        let names = Names::collect(ast, &naming, |node| accessor_field_visibility(settings, node));
        let style = Style {
            naming,
            body: BodyStyle::java(),
            doc: DocStyle::JavaDoc,
        };
        let mut emitter = JavaEmitter {
            e: Emitter::new("java", ast, settings, profile, style, names),
            primary: primary_type(ast),
        };
        emitter.file()?;
        Ok(emitter.e.finish())
    }

    /// The public class of the file names it
    fn suggested_name(&self, ast: &Ast) -> Option<String> {
        let name = primary_type(ast).unwrap_or_else(|| MAIN.to_string());
        Some(format!("{}.{}", naming::convert(&name, Case::Pascal), self.extension()))
    }
}

fn primary_type(ast: &Ast) -> Option<String> {
    ast.declarations().find_map(|node| node.as_type().map(|t| t.name.clone()))
}

fn visibility_keyword(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "public ",
        Visibility::Protected => "protected ",
        Visibility::Private => "private ",
        Visibility::Internal => "",
    }
}

struct JavaEmitter<'a> {
    e: Emitter<'a>,
    /// Canonical name of the one public top-level type
    primary: Option<String>,
}

impl<'a> HasEmitter<'a> for JavaEmitter<'a> {
    fn emitter(&mut self) -> &mut Emitter<'a> {
        &mut self.e
    }
}

impl<'a> JavaEmitter<'a> {
    fn file(&mut self) -> Result<()> {
        self.e.header();
        let package = self.e.settings.package_name.clone();
        if package != "main" {
            self.e.out.line(format!("package {};", package));
            self.e.out.blank();
        }
        let imports_at = self.e.out.position();

        let ast = self.e.ast;
        let (types, members): (Vec<NodeRef<'a>>, Vec<NodeRef<'a>>) =
            ast.declarations().partition(|node| matches!(node.kind(), NodeKind::Type(_) | NodeKind::Opaque { .. }));
        for node in types {
            Emitter::guarded(self, node);
            self.e.out.blank();
        }
        if !members.is_empty() {
            let public = if self.primary.is_none() { "public " } else { "" };
            self.e.out.open(format!("{}final class {} {{", public, MAIN));
            self.e.out.line(format!("private {}() {{}}", MAIN));
            for node in members {
                self.e.out.blank();
                Emitter::guarded(self, node);
            }
            self.e.out.close("}");
        }

        let imports = needed_imports(self.e.out.as_str(), IMPORTS)?;
        if !imports.is_empty() {
            let block = format!("{}\n\n", imports.join("\n"));
            self.e.out.insert(imports_at, &block);
        }
        Ok(())
    }

    fn type_name(&self, name: &str) -> String {
        self.e.names.types.get(name).cloned().unwrap_or_else(|| self.e.naming.type_name(name))
    }

    fn member_name(&self, name: &str, visibility: Visibility) -> String {
        self.e
            .names
            .member(name)
            .map(str::to_string)
            .unwrap_or_else(|| self.e.naming.function(name, visibility))
    }

    /// Only the primary type is public; Java allows one per file
    fn type_modifier(&self, name: &str) -> &'static str {
        if self.primary.as_deref() == Some(name) {
            "public "
        } else {
            ""
        }
    }

    fn params(&mut self, function: NodeRef<'a>) -> Vec<String> {
        let mut out = Vec::new();
        for param in function.params() {
            let Some(decl) = param.as_param() else {
                continue;
            };
            if param.default_value().is_some() {
                self.e.note(format!("default value of parameter '{}' dropped", decl.name), param.span());
            }
            let ty = self.e.ty(&decl.ty, param.span());
            out.push(format!("{} {}", ty, self.e.naming.variable(&decl.name)));
        }
        out
    }

    /// Return type and the return rewriting for the body
    fn result(&mut self, function: NodeRef<'a>) -> (String, Option<ReturnShape>) {
        let Some(decl) = function.as_function() else {
            return (String::new(), None);
        };
        if let (true, AsyncModel::ReturnWrapper(wrapper)) = (decl.is_async, self.e.caps().asynchrony) {
            let inner = self.e.ty_arg(&decl.return_type, function.span());
            return (
                wrapper.replace("{0}", &inner),
                Some(ReturnShape {
                    value: "CompletableFuture.completedFuture({0})",
                    bare: "CompletableFuture.completedFuture(null)",
                }),
            );
        }
        (self.e.ty(&decl.return_type, function.span()), None)
    }

    fn throws_clause(&self, function: NodeRef<'a>) -> String {
        match function.as_function() {
            Some(decl) if !decl.throws.is_empty() && self.e.errors() == ErrorModel::Declared => {
                let names: Vec<String> = decl.throws.iter().map(|t| t.to_string()).collect();
                format!(" throws {}", names.join(", "))
            }
            _ => String::new(),
        }
    }

    /// Signature plus body, or `;` when there is none
    fn function(&mut self, function: NodeRef<'a>, modifiers: String, name: &str) {
        let Some(decl) = function.as_function() else {
            return;
        };
        self.e.doc(decl.doc.as_deref());
        let type_params = if decl.type_params.is_empty() {
            String::new()
        } else {
            format!("{} ", self.e.type_params(&decl.type_params))
        };
        let (result, shape) = self.result(function);
        let params = self.params(function);
        let signature = format!(
            "{}{}{} {}({}){}",
            modifiers,
            type_params,
            result,
            name,
            params.join(", "),
            self.throws_clause(function)
        );
        match function.body() {
            Some(body) => {
                self.e.out.open(format!("{} {{", signature));
                self.e.returns = shape;
                self.e.statements(body, None);
                self.e.returns = None;
                if shape.is_some() && decl.return_type.is_void() && !ends_with_return(body) {
                    self.e.out.line("return CompletableFuture.completedFuture(null);");
                }
                self.e.out.close("}");
            }
            None => self.e.out.line(format!("{};", signature)),
        }
    }

    fn class_decl(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        let name = self.type_name(&decl.name);
        let plan = self.e.plan_bases(node);
        let extends: Vec<String> = plan.extends.iter().map(|ty| self.e.ty(ty, node.span())).collect();
        let implements: Vec<String> = plan.interfaces.iter().map(|ty| self.e.ty(ty, node.span())).collect();
        let is_abstract = node.methods().any(|m| m.body().is_none());

        let mut head = format!(
            "{}{}class {}{}",
            self.type_modifier(&decl.name),
            if is_abstract { "abstract " } else { "" },
            name,
            self.e.type_params(&decl.type_params)
        );
        if let Some(base) = extends.first() {
            head.push_str(&format!(" extends {}", base));
        }
        if !implements.is_empty() {
            head.push_str(&format!(" implements {}", implements.join(", ")));
        }
        self.e.doc(decl.doc.as_deref());
        self.e.out.open(format!("{} {{", head));

        for field in node.fields().filter(|f| f.as_field().is_some_and(|d| d.is_static)) {
            self.field_line(field);
        }
        let mut fields = instance_fields(node);
        let inherited = demoted_fields(self.e.ast, &self.e.demoted, node);
        fields.extend(inherited.iter().copied());
        for field in &fields {
            self.field_line(*field);
        }

        let base = plan.extends.first().and_then(|ty| local_type(self.e.ast, ty));
        match constructor(node) {
            Some(ctor) => {
                self.e.out.blank();
                self.constructor(ctor, &name);
            }
            None => {
                let base_params = base.map(|b| self.base_params(b)).unwrap_or_default();
                if !base_params.is_empty() || fields.iter().any(|f| f.default_value().is_none()) {
                    self.e.out.blank();
                    self.synthesized_constructor(&base_params, &fields, &name);
                }
            }
        }
        let methods = self.method_names(node);
        if self.e.settings.accessors {
            self.accessors(&fields, &methods, &inherited);
        } else {
            self.accessors(&inherited, &methods, &inherited);
        }
        for method in node.methods() {
            let Some(m) = method.as_function() else {
                continue;
            };
            if m.is_constructor {
                continue;
            }
            let mut modifiers = visibility_keyword(m.visibility).to_string();
            if m.is_static {
                modifiers.push_str("static ");
            }
            if method.body().is_none() {
                modifiers.push_str("abstract ");
            }
            let method_name = self.member_name(&m.name, m.visibility);
            self.e.out.blank();
            self.function(method, modifiers, &method_name);
        }
        self.e.opaque_members(node);
        self.e.out.close("}");
        Ok(())
    }

    /// Rendered names of the methods `node` declares
    fn method_names(&self, node: NodeRef<'a>) -> BTreeSet<String> {
        let declared = declared_methods(node);
        node.methods()
            .filter_map(|m| m.as_function())
            .filter(|m| declared.contains(&m.name))
            .map(|m| self.member_name(&m.name, m.visibility))
            .collect()
    }

    fn field_line(&mut self, field: NodeRef<'a>) {
        let Some(decl) = field.as_field() else {
            return;
        };
        let visibility = accessor_field_visibility(self.e.settings, field);
        let name = self.member_name(&decl.name, visibility);
        let mut modifiers = visibility_keyword(visibility).to_string();
        if decl.is_static {
            modifiers.push_str("static ");
        }
        if !decl.mutable {
            modifiers.push_str("final ");
        }
        let ty = self.e.ty(&decl.ty, field.span());
        self.e.doc(decl.doc.as_deref());
        match default_text(&mut self.e, field) {
            Some((value, trailing)) => self.e.out.line(format!("{}{} {} = {};{}", modifiers, ty, name, value, trailing)),
            None => self.e.out.line(format!("{}{} {};", modifiers, ty, name)),
        }
    }

    fn constructor(&mut self, ctor: NodeRef<'a>, name: &str) {
        let Some(decl) = ctor.as_function() else {
            return;
        };
        self.e.doc(decl.doc.as_deref());
        let params = self.params(ctor);
        self.e.out.open(format!(
            "{}{}({}){} {{",
            visibility_keyword(decl.visibility),
            name,
            params.join(", "),
            self.throws_clause(ctor)
        ));
        if let Some(body) = ctor.body() {
            let statements: Vec<NodeRef<'a>> = match body.kind() {
                NodeKind::Block => body.children().collect(),
                _ => vec![body],
            };
            // A base constructor call has to come first
            for args in statements.iter().filter_map(|s| super_call(*s)) {
                let rendered: Vec<String> = args.iter().map(|a| self.e.expression(*a, None).0).collect();
                self.e.out.line(format!("super({});", rendered.join(", ")));
            }
            for statement in statements.into_iter().filter(|s| super_call(*s).is_none()) {
                self.e.statements(statement, None);
            }
        }
        self.e.out.close("}");
    }

    /// Parameters the constructor of a local base class takes, with their names
    fn base_params(&mut self, base: NodeRef<'a>) -> Vec<(String, String)> {
        let mut out = Vec::new();
        match constructor(base) {
            Some(ctor) => {
                for param in ctor.params() {
                    if let Some(decl) = param.as_param() {
                        let ty = self.e.ty(&decl.ty, param.span());
                        out.push((ty, self.e.naming.variable(&decl.name)));
                    }
                }
            }
            None => {
                let mut fields = instance_fields(base);
                fields.extend(demoted_fields(self.e.ast, &self.e.demoted, base));
                for field in fields.into_iter().filter(|f| f.default_value().is_none()) {
                    if let Some(decl) = field.as_field() {
                        let ty = self.e.ty(&decl.ty, field.span());
                        out.push((ty, self.e.naming.variable(&decl.name)));
                    }
                }
            }
        }
        out
    }

    fn synthesized_constructor(&mut self, base_params: &[(String, String)], fields: &[NodeRef<'a>], name: &str) {
        let mut params: Vec<String> = base_params.iter().map(|(ty, param)| format!("{} {}", ty, param)).collect();
        let mut assignments = Vec::new();
        if !base_params.is_empty() {
            let args: Vec<&str> = base_params.iter().map(|(_, param)| param.as_str()).collect();
            assignments.push(format!("super({});", args.join(", ")));
        }
        for field in fields.iter().filter(|f| f.default_value().is_none()) {
            let Some(decl) = field.as_field() else {
                continue;
            };
            let ty = self.e.ty(&decl.ty, field.span());
            let param = self.e.naming.variable(&decl.name);
            let member = self.member_name(&decl.name, accessor_field_visibility(self.e.settings, *field));
            if !base_params.iter().any(|(_, taken)| *taken == param) {
                params.push(format!("{} {}", ty, param));
            }
            assignments.push(format!("this.{} = {};", member, param));
        }
        self.e.generated_doc(&format!("Creates a {} from its field values.", name));
        self.e.out.open(format!("public {}({}) {{", name, params.join(", ")));
        for assignment in assignments {
            self.e.out.line(assignment);
        }
        self.e.out.close("}");
    }

    /// Getters and setters for `fields`, skipping any name a declared method
    /// already takes. Accessors of `inherited` fields implement an interface.
    fn accessors(&mut self, fields: &[NodeRef<'a>], methods: &BTreeSet<String>, inherited: &[NodeRef<'a>]) {
        for field in fields {
            let Some(decl) = field.as_field() else {
                continue;
            };
            let member = self.member_name(&decl.name, Visibility::Private);
            let public = self.e.naming.field(&decl.name, Visibility::Public);
            let ty = self.e.ty(&decl.ty, field.span());
            let overrides = inherited.iter().any(|f| f.id() == field.id());
            let getter = format!("get{}", capitalized(&public));
            if !methods.contains(&getter) {
                self.e.out.blank();
                self.e.generated_doc(&format!("Returns the {}.", public));
                if overrides {
                    self.e.out.line("@Override");
                }
                self.e.out.open(format!("public {} {}() {{", ty, getter));
                self.e.out.line(format!("return {};", member));
                self.e.out.close("}");
            }
            let setter = format!("set{}", capitalized(&public));
            if decl.mutable && !methods.contains(&setter) {
                let param = self.e.naming.variable(&decl.name);
                self.e.out.blank();
                self.e.generated_doc(&format!("Sets the {}.", public));
                if overrides {
                    self.e.out.line("@Override");
                }
                self.e.out.open(format!("public void {}({} {}) {{", setter, ty, param));
                self.e.out.line(format!("this.{} = {};", member, param));
                self.e.out.close("}");
            }
        }
    }

    /// Interfaces, and classes that another class lists after its first base
    fn interface_decl(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        let name = self.type_name(&decl.name);
        let mut bases = Vec::new();
        for base in &decl.bases {
            let interface = local_type(self.e.ast, &base.ty).map_or(true, is_behavior) || self.e.demoted.contains(&base.ty.base_name);
            if interface {
                bases.push(self.e.ty(&base.ty, node.span()));
            } else {
                self.e.note(format!("interface '{}' cannot extend class '{}'", decl.name, base.ty), node.span());
            }
        }
        let extends = if bases.is_empty() {
            String::new()
        } else {
            format!(" extends {}", bases.join(", "))
        };
        self.e.doc(decl.doc.as_deref());
        self.e.out.open(format!(
            "{}interface {}{}{} {{",
            self.type_modifier(&decl.name),
            name,
            self.e.type_params(&decl.type_params),
            extends
        ));
        let mut first = true;
        for field in node.fields() {
            let Some(f) = field.as_field() else {
                continue;
            };
            if f.is_static {
                match default_text(&mut self.e, field) {
                    Some((value, trailing)) => {
                        let ty = self.e.ty(&f.ty, field.span());
                        let constant = self.e.naming.constant(&f.name, Visibility::Public);
                        self.e.out.line(format!("{} {} = {};{}", ty, constant, value, trailing));
                        first = false;
                    }
                    None => self.e.note(format!("static field '{}' without a value dropped from interface", f.name), field.span()),
                }
                continue;
            }
            let public = self.e.naming.field(&f.name, Visibility::Public);
            let ty = self.e.ty(&f.ty, field.span());
            if !first {
                self.e.out.blank();
            }
            first = false;
            self.e.out.line(format!("{} get{}();", ty, capitalized(&public)));
            if f.mutable && !is_behavior(node) {
                let param = self.e.naming.variable(&f.name);
                self.e.out.line(format!("void set{}({} {});", capitalized(&public), ty, param));
            }
        }
        let getters = std::mem::replace(&mut self.e.field_getters, !is_behavior(node));
        for method in node.methods() {
            let Some(m) = method.as_function() else {
                continue;
            };
            if m.is_constructor {
                self.e.note(format!("constructor of '{}' dropped; it is declared as an interface", decl.name), method.span());
                continue;
            }
            let modifiers = match (m.is_static, method.body().is_some()) {
                (true, _) => "static ",
                (false, true) => "default ",
                (false, false) => "",
            };
            let method_name = self.member_name(&m.name, m.visibility);
            if !first {
                self.e.out.blank();
            }
            first = false;
            self.function(method, modifiers.to_string(), &method_name);
        }
        self.e.field_getters = getters;
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
        self.e.out.open(format!("{}enum {} {{", self.type_modifier(&decl.name), name));
        let has_methods = node.methods().next().is_some();
        let count = decl.variants.len();
        for (index, variant) in decl.variants.iter().enumerate() {
            let variant = self.e.naming.variant(variant);
            let separator = match (index + 1 == count, has_methods) {
                (false, _) => ",",
                (true, true) => ";",
                (true, false) => "",
            };
            self.e.out.line(format!("{}{}", variant, separator));
        }
        for method in node.methods() {
            let Some(m) = method.as_function() else {
                continue;
            };
            let mut modifiers = visibility_keyword(m.visibility).to_string();
            if m.is_static {
                modifiers.push_str("static ");
            }
            let method_name = self.member_name(&m.name, m.visibility);
            self.e.out.blank();
            self.function(method, modifiers, &method_name);
        }
        self.e.opaque_members(node);
        self.e.out.close("}");
        Ok(())
    }
}

impl<'a> Visitor<'a> for JavaEmitter<'a> {
    type Output = ();

    fn visit_type(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        match decl.kind {
            TypeKind::Enum => self.enum_decl(node),
            TypeKind::Interface if is_behavior(node) => self.interface_decl(node),
            _ if self.e.demoted.contains(&decl.name) => self.interface_decl(node),
            _ => self.class_decl(node),
        }
    }

    /// Static method of `Main`
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
        let modifiers = format!("{}static ", visibility_keyword(decl.visibility));
        self.function(node, modifiers, &name);
        Ok(())
    }

    /// Static field of `Main`
    fn visit_field(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(field) = node.as_field() else {
            return Ok(());
        };
        let name = self
            .e
            .names
            .globals
            .get(&field.name)
            .cloned()
            .unwrap_or_else(|| self.e.naming.field(&field.name, field.visibility));
        let ty = self.e.ty(&field.ty, node.span());
        let mut modifiers = format!("{}static ", visibility_keyword(field.visibility));
        if is_constant(node) {
            modifiers.push_str("final ");
        }
        self.e.doc(field.doc.as_deref());
        match default_text(&mut self.e, node) {
            Some((value, trailing)) => self.e.out.line(format!("{}{} {} = {};{}", modifiers, ty, name, value, trailing)),
            None => self.e.out.line(format!("{}{} {};", modifiers, ty, name)),
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

    fn convert_with(language: &str, source: &str, settings: Settings) -> (Emission, Option<String>) {
        let mapping = MappingTable::builtin();
        let frontend = TableFrontend::for_language(language, &mapping).expect("frontend");
        let ast = frontend.extract(source).ast;
        let emission = JavaBackend.emit(&ast, &settings, &mapping).expect("emission");
        (emission, JavaBackend.suggested_name(&ast))
    }

    fn convert(language: &str, source: &str) -> Emission {
        let settings = Settings {
            header: false,
            ..Settings::default()
        };
        convert_with(language, source, settings).0
    }

    #[test]
    fn test_functions_live_in_main() {
        let (emission, name) = convert_with(
            "python",
            "def add(a: int, b: int) -> int:\n    return a + b\n",
            Settings {
                header: false,
                ..Settings::default()
            },
        );
        assert_eq!(
            emission.text,
            "public final class Main {\n    private Main() {}\n\n    public static long add(long a, long b) {\n        return a + b;\n    }\n}\n"
        );
        assert_eq!(name.as_deref(), Some("Main.java"));
    }

    #[test]
    fn test_class_gets_constructor_and_accessors() {
        let source = "\
class Person {
    name: string;
    age: number = 0;

    greet(): string {
        return \"Hi \" + this.name;
    }
}
";
        let text = convert("typescript", source).text;
        assert!(text.starts_with("public class Person {\n    private String name;\n    private double age = 0;\n"), "{}", text);
        assert!(text.contains("    public Person(String name) {\n        this.name = name;\n    }\n"), "{}", text);
        assert!(text.contains("    public String getName() {\n        return name;\n    }\n"), "{}", text);
        assert!(text.contains("    public void setAge(double age) {\n        this.age = age;\n    }\n"), "{}", text);
        assert!(text.contains("    public String greet() {\n        return \"Hi \" + this.name;\n    }\n"), "{}", text);
    }

    #[test]
    fn test_subclass_calls_super_first() {
        let source = "\
class Animal:
    def __init__(self, name: str):
        self.name = name

class Dog(Animal):
    def __init__(self, name: str, breed: str):
        self.breed = breed
        super().__init__(name)
";
        let (emission, name) = convert_with(
            "python",
            source,
            Settings {
                header: false,
                ..Settings::default()
            },
        );
        let text = &emission.text;
        assert!(text.contains("class Dog extends Animal {"), "{}", text);
        assert!(!text.contains("public class Dog"), "{}", text);
        assert!(text.contains("    public Dog(String name, String breed) {\n        super(name);\n        this.breed = breed;\n    }\n"), "{}", text);
        assert_eq!(name.as_deref(), Some("Animal.java"));
    }

    #[test]
    fn test_async_returns_completable_future() {
        let text = convert("python", "async def fetch(url: str) -> str:\n    return url\n").text;
        assert!(text.starts_with("import java.util.concurrent.CompletableFuture;\n\n"), "{}", text);
        assert!(
            text.contains("    public static CompletableFuture<String> fetch(String url) {\n        return CompletableFuture.completedFuture(url);\n    }\n"),
            "{}",
            text
        );
    }

    #[test]
    fn test_throws_clause_and_package() {
        let settings = Settings {
            header: false,
            package_name: "com.example".to_string(),
            ..Settings::default()
        };
        let source = "\
public class Loader {
    public String load(String path) throws IOException {
        return path;
    }
}
";
        let text = convert_with("java", source, settings).0.text;
        assert!(text.starts_with("package com.example;\n\npublic class Loader {\n"), "{}", text);
        assert!(text.contains("public String load(String path) throws IOException {"), "{}", text);
    }

    #[test]
    fn test_interface_and_enum() {
        let source = "\
interface Shape {
    area(): number;
}

enum Color { Red, DarkGreen }
";
        let text = convert("typescript", source).text;
        assert!(text.contains("interface Shape {\n    double area();\n}\n"), "{}", text);
        assert!(text.contains("enum Color {\n    RED,\n    DARK_GREEN\n}\n"), "{}", text);
    }

    #[test]
    fn test_second_base_class_becomes_an_interface_with_defaults() {
        let source = "\
class Named:
    def __init__(self, name: str):
        self.name = name


class Aged:
    def __init__(self, age: int):
        self.age = age

    def older(self) -> int:
        return self.age + 1


class Person(Named, Aged):
    def greet(self) -> str:
        return \"Hi \" + self.name
";
        let emission = convert("python", source);
        let text = &emission.text;
        assert!(text.contains("interface Aged {\n    long getAge();\n    void setAge(long age);\n"), "{}", text);
        assert!(text.contains("    default long older() {\n        return this.getAge() + 1;\n    }\n"), "{}", text);
        assert!(text.contains("class Person extends Named implements Aged {\n    private long age;\n"), "{}", text);
        assert!(text.contains("    public Person(String name, long age) {\n        super(name);\n        this.age = age;\n    }\n"), "{}", text);
        assert!(text.contains("    @Override\n    public long getAge() {\n        return age;\n    }\n"), "{}", text);
        assert!(!text.contains("class Aged"), "{}", text);
    }

    #[test]
    fn test_declared_getter_is_not_generated_again() {
        let source = "\
public class Person {
    private int age;

    public int getAge() {
        return age;
    }
}
";
        let text = convert("java", source).text;
        assert_eq!(text.matches("getAge()").count(), 1, "{}", text);
        assert!(text.contains("    public int getAge() {\n        return this.age;\n    }\n"), "{}", text);
        assert!(text.contains("    public void setAge(int age) {"), "{}", text);
    }
}
