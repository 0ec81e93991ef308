//! Kotlin back-end
//!
//! Classes without an explicit constructor put their properties in the
//! primary constructor; an explicit constructor becomes a secondary one that
//! delegates to `super`. Static members move into a `companion object`.

use super::body::BodyStyle;
use super::{
    capitalized, constructor, default_text, demoted_fields, extended_locally, instance_fields, is_behavior, is_constant, local_type,
    self_assignment, super_call, Backend, Emission, Emitter, HasEmitter, NamingPolicy, Names, Style,
};
use crate::ast::{Ast, NodeKind, NodeRef, TypeKind, Visibility, Visitor};
use crate::comments::DocStyle;
use crate::config::{self, Settings};
use crate::error::Result;
use crate::mapping::capabilities::ErrorModel;
use crate::mapping::MappingTable;
use crate::naming::Case;
use crate::types::{TypeCategory, TypeRef};
use std::collections::BTreeSet;

pub struct KotlinBackend;

const RESERVED: &[&str] = &[
    "as", "break", "class", "continue", "do", "else", "false", "for", "fun", "if", "in", "interface", "is", "null",
    "object", "package", "return", "super", "this", "throw", "true", "try", "typealias", "typeof", "val", "var",
    "when", "while",
];

impl Backend for KotlinBackend {
    fn language(&self) -> &str {
        "kotlin"
    }

    fn extension(&self) -> &str {
        "kt"
    }

    fn file_case(&self) -> Case {
        Case::Pascal
    }

    fn honored_options(&self) -> &[&'static str] {
        &[
            config::PRESERVE_COMMENTS,
            config::GENERATE_DOC_COMMENTS,
            config::INDENT_WIDTH,
            config::PACKAGE_NAME,
            config::EMIT_HEADER,
        ]
    }

    fn emit(&self, ast: &Ast, settings: &Settings, mapping: &MappingTable) -> Result<Emission> {
        let profile = mapping.target("kotlin")?;
        let naming = NamingPolicy {
            variants: Case::ScreamingSnake,
            ..NamingPolicy::new(&profile.capabilities, RESERVED)
        };
        let names = Names::collect(ast, &naming, |node| {
            node.as_field().map(|f| f.visibility).unwrap_or(Visibility::Private)
        });
        let style = Style {
            naming,
            body: BodyStyle::kotlin(),
            doc: DocStyle::JavaDoc,
        };
        let mut emitter = KotlinEmitter {
            e: Emitter::new("kotlin", ast, settings, profile, style, names),
        };
        emitter.file();
        Ok(emitter.e.finish())
    }
}

struct KotlinEmitter<'a> {
    e: Emitter<'a>,
}

impl<'a> HasEmitter<'a> for KotlinEmitter<'a> {
    fn emitter(&mut self) -> &mut Emitter<'a> {
        &mut self.e
    }
}

/// Public is the default and stays implicit
fn visibility_keyword(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "",
        Visibility::Protected => "protected ",
        Visibility::Internal => "internal ",
        Visibility::Private => "private ",
    }
}

/// Initial value of a property that has no default and no `lateinit` form
fn zero_value(ty: &TypeRef) -> Option<&'static str> {
    if ty.category == TypeCategory::Optional {
        return Some("null");
    }
    if ty.category != TypeCategory::Primitive {
        return None;
    }
    match ty.base_name.as_str() {
        "bool" => Some("false"),
        "char" => Some("'\\u0000'"),
        "float32" => Some("0f"),
        "float64" => Some("0.0"),
        "int64" | "uint64" => Some("0L"),
        "string" => None,
        _ => Some("0"),
    }
}

/// The owner declares `getX` or `setX` for this property, which would clash
/// with the accessors of a visible property
fn accessor_declared(field: NodeRef<'_>) -> bool {
    let Some(decl) = field.as_field() else {
        return false;
    };
    let suffix = capitalized(&decl.name);
    field.parent().is_some_and(|owner| {
        owner
            .methods()
            .filter_map(|m| m.as_function())
            .any(|m| m.name.strip_prefix("get").or_else(|| m.name.strip_prefix("set")) == Some(suffix.as_str()))
    })
}

/// Names of methods declared by the local ancestors of a type
fn inherited_methods(node: NodeRef<'_>, depth: usize, out: &mut BTreeSet<String>) {
    let Some(decl) = node.as_type() else {
        return;
    };
    if depth > 8 {
        return;
    }
    for base in &decl.bases {
        if let Some(parent) = local_type(node.ast(), &base.ty) {
            for method in parent.methods() {
                if let Some(m) = method.as_function().filter(|m| !m.is_constructor && !m.is_static) {
                    out.insert(m.name.clone());
                }
            }
            inherited_methods(parent, depth + 1, out);
        }
    }
}

impl<'a> KotlinEmitter<'a> {
    fn file(&mut self) {
        self.e.header();
        let package = self.e.settings.package_name.clone();
        if package != "main" {
            self.e.out.line(format!("package {}", package));
            self.e.out.blank();
        }
        let ast = self.e.ast;
        for node in ast.declarations() {
            Emitter::guarded(self, node);
            self.e.out.blank();
        }
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

    fn throws_tags(&self, function: NodeRef<'a>) -> Vec<String> {
        if self.e.errors() != ErrorModel::Documented {
            return Vec::new();
        }
        function
            .as_function()
            .map(|f| f.throws.iter().map(|t| format!("@throws {}", t)).collect())
            .unwrap_or_default()
    }

    fn params(&mut self, function: NodeRef<'a>) -> Vec<String> {
        let mut out = Vec::new();
        for param in function.params() {
            let Some(decl) = param.as_param() else {
                continue;
            };
            let ty = self.e.ty(&decl.ty, param.span());
            let name = self.e.naming.variable(&decl.name);
            match default_text(&mut self.e, param) {
                Some((value, _)) => out.push(format!("{}: {} = {}", name, ty, value)),
                None if decl.optional => out.push(format!("{}: {} = null", name, ty)),
                None => out.push(format!("{}: {}", name, ty)),
            }
        }
        out
    }

    fn returns(&mut self, function: NodeRef<'a>) -> String {
        match function.as_function() {
            Some(decl) if !decl.return_type.is_void() && !decl.is_constructor => {
                format!(": {}", self.e.ty(&decl.return_type, function.span()))
            }
            _ => String::new(),
        }
    }

    /// `fun` signature plus body; `;`-less signature when there is none
    fn function(&mut self, function: NodeRef<'a>, modifiers: &str, name: &str) {
        let Some(decl) = function.as_function() else {
            return;
        };
        let tags = self.throws_tags(function);
        self.e.tagged_doc(decl.doc.as_deref(), &tags);
        let suspend = if decl.is_async { self.e.async_keyword() } else { "" };
        let type_params = if decl.type_params.is_empty() {
            String::new()
        } else {
            format!("{} ", self.e.type_params(&decl.type_params))
        };
        let params = self.params(function);
        let returns = self.returns(function);
        let signature = format!("{}{}fun {}{}({}){}", modifiers, suspend, type_params, name, params.join(", "), returns);
        match function.body() {
            Some(body) => {
                self.e.out.open(format!("{} {{", signature));
                self.e.statements(body, None);
                self.e.out.close("}");
            }
            None => self.e.out.line(signature),
        }
    }

    /// Properties of a class declared as an interface are overridden publicly
    fn property_head(&self, field: NodeRef<'a>) -> String {
        let Some(decl) = field.as_field() else {
            return String::new();
        };
        let keyword = if decl.mutable { "var" } else { "val" };
        let name = self.member_name(&decl.name, decl.visibility);
        if self.from_interface(field) {
            return format!("override {} {}", keyword, name);
        }
        let visibility = if accessor_declared(field) { Visibility::Private } else { decl.visibility };
        format!("{}{} {}", visibility_keyword(visibility), keyword, name)
    }

    fn from_interface(&self, field: NodeRef<'a>) -> bool {
        field
            .parent()
            .and_then(|p| p.as_type())
            .is_some_and(|t| self.e.demoted.contains(&t.name))
    }

    fn field_type(&mut self, field: NodeRef<'a>) -> String {
        let Some(decl) = field.as_field() else {
            return String::new();
        };
        self.e.ty(&decl.ty, field.span())
    }

    /// Primary-constructor property
    fn primary_property(&mut self, field: NodeRef<'a>) -> String {
        let head = self.property_head(field);
        let ty = self.field_type(field);
        let optional = field.as_field().is_some_and(|f| f.optional);
        match default_text(&mut self.e, field) {
            Some((value, _)) => format!("{}: {} = {}", head, ty, value),
            None if optional => format!("{}: {} = null", head, ty),
            None => format!("{}: {}", head, ty),
        }
    }

    /// Body property of a class with an explicit constructor
    fn body_property(&mut self, field: NodeRef<'a>) {
        let Some(decl) = field.as_field() else {
            return;
        };
        let ty = self.field_type(field);
        self.e.doc(decl.doc.as_deref());
        if let Some((value, trailing)) = default_text(&mut self.e, field) {
            let head = self.property_head(field);
            self.e.out.line(format!("{}: {} = {}{}", head, ty, value, trailing));
            return;
        }
        match zero_value(&decl.ty) {
            Some(zero) => {
                let head = self.property_head(field);
                self.e.out.line(format!("{}: {} = {}", head, ty, zero));
            }
            None => {
                let name = self.member_name(&decl.name, decl.visibility);
                let modifier = if self.from_interface(field) { "override " } else { visibility_keyword(decl.visibility) };
                self.e.out.line(format!("{}lateinit var {}: {}", modifier, name, ty));
            }
        }
    }

    /// Parameters a class without a constructor takes on behalf of its base,
    /// with the arguments it passes on
    fn base_arguments(&mut self, base: NodeRef<'a>, own: &BTreeSet<String>) -> (Vec<String>, Vec<String>) {
        let mut params = Vec::new();
        let mut args = Vec::new();
        match constructor(base) {
            Some(ctor) => {
                let rendered = self.params(ctor);
                for (param, text) in ctor.params().zip(rendered) {
                    let Some(decl) = param.as_param() else {
                        continue;
                    };
                    if !own.contains(&decl.name) {
                        params.push(text);
                    }
                    args.push(self.e.naming.variable(&decl.name));
                }
            }
            None => {
                for field in instance_fields(base).into_iter().filter(|f| f.default_value().is_none()) {
                    let Some(decl) = field.as_field() else {
                        continue;
                    };
                    let name = self.e.naming.variable(&decl.name);
                    if !own.contains(&decl.name) {
                        let ty = self.field_type(field);
                        params.push(format!("{}: {}", name, ty));
                    }
                    let member = self.member_name(&decl.name, decl.visibility);
                    args.push(format!("{} = {}", member, name));
                }
            }
        }
        (params, args)
    }

    fn class_decl(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        let name = self.type_name(&decl.name);
        let ctor = constructor(node);
        let mut fields = instance_fields(node);
        fields.extend(demoted_fields(self.e.ast, &self.e.demoted, node));
        let statics: Vec<NodeRef<'a>> = node.fields().filter(|f| f.as_field().is_some_and(|d| d.is_static)).collect();
        let methods: Vec<NodeRef<'a>> = node
            .methods()
            .filter(|m| m.as_function().is_some_and(|f| !f.is_constructor))
            .collect();
        let is_abstract = methods.iter().any(|m| m.body().is_none());
        let open = !is_abstract && extended_locally(self.e.ast, &decl.name);
        let record = ctor.is_none()
            && !fields.is_empty()
            && methods.is_empty()
            && statics.is_empty()
            && decl.bases.is_empty()
            && (decl.kind == TypeKind::Struct || decl.kind == TypeKind::Interface)
            && !open;

        let mut head = visibility_keyword(decl.visibility).to_string();
        if is_abstract {
            head.push_str("abstract ");
        } else if open {
            head.push_str("open ");
        } else if record {
            head.push_str("data ");
        }
        head.push_str(&format!("class {}{}", name, self.e.type_params(&decl.type_params)));

        let plan = self.e.plan_bases(node);
        let mut supertypes = Vec::new();
        let mut primary = Vec::new();
        let has_superclass = !plan.extends.is_empty();
        for ty in &plan.extends {
            let text = self.e.ty(ty, node.span());
            // A secondary constructor delegates to `super` instead
            if ctor.is_some() {
                supertypes.push(text);
                continue;
            }
            let own: BTreeSet<String> = fields
                .iter()
                .filter_map(|f| f.as_field().map(|d| d.name.clone()))
                .collect();
            let (params, args) = match local_type(self.e.ast, ty) {
                Some(base) => self.base_arguments(base, &own),
                None => (Vec::new(), Vec::new()),
            };
            primary.extend(params);
            supertypes.push(format!("{}({})", text, args.join(", ")));
        }
        for ty in &plan.interfaces {
            supertypes.push(self.e.ty(ty, node.span()));
        }
        if ctor.is_none() {
            primary.extend(fields.iter().map(|f| self.primary_property(*f)));
        }
        if !primary.is_empty() {
            head.push_str(&format!("({})", primary.join(", ")));
        }
        if !supertypes.is_empty() {
            head.push_str(&format!(" : {}", supertypes.join(", ")));
        }

        self.e.doc(decl.doc.as_deref());
        let has_body =
            ctor.is_some() || !methods.is_empty() || !statics.is_empty() || node.opaque_members().next().is_some();
        if !has_body {
            self.e.out.line(head);
            return Ok(());
        }
        self.e.out.open(format!("{} {{", head));

        if let Some(ctor) = ctor {
            for field in &fields {
                self.body_property(*field);
            }
            self.e.out.blank();
            self.secondary_constructor(ctor, node, has_superclass);
        }

        let mut inherited = BTreeSet::new();
        inherited_methods(node, 0, &mut inherited);
        for method in methods.iter().filter(|m| m.as_function().is_some_and(|f| !f.is_static)) {
            let Some(m) = method.as_function() else {
                continue;
            };
            let mut modifiers = visibility_keyword(m.visibility).to_string();
            if inherited.contains(&m.name) {
                modifiers.push_str("override ");
            } else if method.body().is_none() {
                modifiers.push_str("abstract ");
            } else if open && m.visibility != Visibility::Private {
                modifiers.push_str("open ");
            }
            let method_name = self.member_name(&m.name, m.visibility);
            self.e.out.blank();
            self.function(*method, &modifiers, &method_name);
        }

        let static_methods: Vec<NodeRef<'a>> = methods
            .iter()
            .copied()
            .filter(|m| m.as_function().is_some_and(|f| f.is_static))
            .collect();
        self.companion(&statics, &static_methods);
        self.e.opaque_members(node);
        self.e.out.close("}");
        Ok(())
    }

    fn secondary_constructor(&mut self, ctor: NodeRef<'a>, owner: NodeRef<'a>, has_superclass: bool) {
        let Some(decl) = ctor.as_function() else {
            return;
        };
        let tags = self.throws_tags(ctor);
        self.e.tagged_doc(decl.doc.as_deref(), &tags);
        let params = self.params(ctor);
        let statements: Vec<NodeRef<'a>> = match ctor.body() {
            Some(body) if matches!(body.kind(), NodeKind::Block) => body.children().collect(),
            Some(body) => vec![body],
            None => Vec::new(),
        };
        let delegation = match statements.iter().find_map(|s| super_call(*s)) {
            Some(args) => {
                let rendered: Vec<String> = args.iter().map(|a| self.e.expression(*a, None).0).collect();
                format!(" : super({})", rendered.join(", "))
            }
            None if has_superclass => " : super()".to_string(),
            None => String::new(),
        };
        let head = format!("{}constructor({}){}", visibility_keyword(decl.visibility), params.join(", "), delegation);
        let rest: Vec<NodeRef<'a>> = statements.into_iter().filter(|s| super_call(*s).is_none()).collect();
        if rest.is_empty() {
            self.e.out.line(head);
            return;
        }
        let assigned: BTreeSet<&str> = rest.iter().filter_map(|s| self_assignment(*s)).map(|(f, _)| f).collect();
        if assigned.is_empty() && instance_fields(owner).iter().any(|f| f.default_value().is_none()) {
            self.e.note("constructor leaves some properties uninitialised", ctor.span());
        }
        self.e.out.open(format!("{} {{", head));
        for statement in rest {
            self.e.statements(statement, None);
        }
        self.e.out.close("}");
    }

    fn companion(&mut self, statics: &[NodeRef<'a>], methods: &[NodeRef<'a>]) {
        if statics.is_empty() && methods.is_empty() {
            return;
        }
        self.e.out.blank();
        self.e.out.open("companion object {");
        for field in statics {
            self.property(*field);
        }
        for method in methods {
            let Some(m) = method.as_function() else {
                continue;
            };
            let name = self.member_name(&m.name, m.visibility);
            self.e.out.blank();
            self.function(*method, visibility_keyword(m.visibility), &name);
        }
        self.e.out.close("}");
    }

    /// Top-level or companion property
    fn property(&mut self, node: NodeRef<'a>) {
        let Some(field) = node.as_field() else {
            return;
        };
        let name = match node.parent().map(|p| p.kind()) {
            Some(NodeKind::Program) => self.e.names.globals.get(&field.name).cloned(),
            _ => self.e.names.member(&field.name).map(str::to_string),
        }
        .unwrap_or_else(|| self.e.naming.field(&field.name, field.visibility));
        let ty = self.field_type(node);
        let visibility = visibility_keyword(field.visibility);
        self.e.doc(field.doc.as_deref());
        let literal = node.default_value().is_some_and(|v| matches!(v.kind(), NodeKind::Literal { .. }));
        let primitive = field.ty.category == TypeCategory::Primitive;
        match default_text(&mut self.e, node) {
            Some((value, trailing)) if is_constant(node) && literal && primitive => {
                self.e.out.line(format!("{}const val {} = {}{}", visibility, name, value, trailing))
            }
            Some((value, trailing)) => {
                let keyword = if field.mutable { "var" } else { "val" };
                self.e.out.line(format!("{}{} {}: {} = {}{}", visibility, keyword, name, ty, value, trailing))
            }
            None => {
                let zero = zero_value(&field.ty).unwrap_or("TODO()");
                self.e.out.line(format!("{}var {}: {} = {}", visibility, name, ty, zero))
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
        let supertypes = if bases.is_empty() {
            String::new()
        } else {
            format!(" : {}", bases.join(", "))
        };
        self.e.doc(decl.doc.as_deref());
        self.e.out.open(format!(
            "{}interface {}{}{} {{",
            visibility_keyword(decl.visibility),
            name,
            self.e.type_params(&decl.type_params),
            supertypes
        ));
        for field in node.fields() {
            let Some(f) = field.as_field() else {
                continue;
            };
            if f.is_static {
                self.e.note(format!("static field '{}' dropped from interface", f.name), field.span());
                continue;
            }
            if field.default_value().is_some() {
                self.e.note(format!("default value of '{}' dropped; interface properties are abstract", f.name), field.span());
            }
            let field_name = self.member_name(&f.name, f.visibility);
            let ty = self.field_type(field);
            let keyword = if f.mutable { "var" } else { "val" };
            self.e.out.line(format!("{} {}: {}", keyword, field_name, ty));
        }
        let mut inherited = BTreeSet::new();
        inherited_methods(node, 0, &mut inherited);
        for method in node.methods() {
            let Some(m) = method.as_function() else {
                continue;
            };
            if m.is_constructor {
                self.e.note(format!("constructor of '{}' dropped; it is declared as an interface", decl.name), method.span());
                continue;
            }
            let modifiers = if inherited.contains(&m.name) { "override " } else { "" };
            let method_name = self.member_name(&m.name, m.visibility);
            self.e.out.blank();
            self.function(method, modifiers, &method_name);
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
        self.e.out.open(format!("{}enum class {} {{", visibility_keyword(decl.visibility), name));
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
            let method_name = self.member_name(&m.name, m.visibility);
            self.e.out.blank();
            self.function(method, visibility_keyword(m.visibility), &method_name);
        }
        self.e.opaque_members(node);
        self.e.out.close("}");
        Ok(())
    }
}

impl<'a> Visitor<'a> for KotlinEmitter<'a> {
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
        // `protected` is meaningless at the top level
        let modifiers = match decl.visibility {
            Visibility::Protected => "",
            other => visibility_keyword(other),
        };
        self.function(node, modifiers, &name);
        Ok(())
    }

    fn visit_field(&mut self, node: NodeRef<'a>) -> Result<()> {
        self.property(node);
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
        KotlinBackend.emit(&ast, &settings, &mapping).expect("emission")
    }

    #[test]
    fn test_function_signature() {
        let emission = convert("python", "def add(a: int, b: int) -> int:\n    return a + b\n");
        assert_eq!(emission.text, "fun add(a: Long, b: Long): Long {\n    return a + b\n}\n");
    }

    #[test]
    fn test_primary_constructor_properties() {
        let source = "\
public class Person {
    private String name;
    private int age = 0;

    public String greet() {
        return \"Hi \" + name;
    }
}
";
        let text = convert("java", source).text;
        assert_eq!(
            text,
            "class Person(private var name: String, private var age: Int = 0) {\n    fun greet(): String {\n        return \"Hi \" + this.name\n    }\n}\n"
        );
    }

    #[test]
    fn test_struct_becomes_data_class() {
        let emission = convert("go", "type Point struct {\n\tX int\n\tY int\n}\n");
        assert_eq!(emission.text, "data class Point(var x: Long, var y: Long)\n");
    }

    #[test]
    fn test_secondary_constructor_and_overrides() {
        let source = "\
class Animal:
    def __init__(self, name: str):
        self.name = name

    def speak(self) -> str:
        return \"...\"

class Dog(Animal):
    def __init__(self, name: str, breed: str):
        super().__init__(name)
        self.breed = breed

    def speak(self) -> str:
        return \"Woof\"
";
        let text = convert("python", source).text;
        assert!(text.contains("open class Animal {\n    lateinit var name: String\n\n    constructor(name: String) {\n        this.name = name\n    }\n"), "{}", text);
        assert!(text.contains("    open fun speak(): String {"), "{}", text);
        assert!(text.contains("class Dog : Animal {\n    lateinit var breed: String\n\n    constructor(name: String, breed: String) : super(name) {\n        this.breed = breed\n    }\n"), "{}", text);
        assert!(text.contains("    override fun speak(): String {\n        return \"Woof\"\n    }\n"), "{}", text);
    }

    #[test]
    fn test_companion_object_and_kdoc_throws() {
        let source = "\
public class Config {
    public static final int MAX = 5;

    public static int twice(int x) {
        return x * 2;
    }

    public String read(String path) throws IOException {
        return path;
    }
}
";
        let text = convert("java", source).text;
        assert!(text.contains("    companion object {\n        const val MAX = 5\n\n        fun twice(x: Int): Int {\n            return x * 2\n        }\n    }\n"), "{}", text);
        assert!(text.contains("    /**\n     * @throws IOException\n     */\n    fun read(path: String): String {"), "{}", text);
    }

    #[test]
    fn test_suspend_and_enum() {
        let source = "\
async def fetch(url: str) -> str:
    return url

class Color(Enum):
    RED = 1
    DARK_GREEN = 2
";
        let text = convert("python", source).text;
        assert!(text.contains("suspend fun fetch(url: String): String {"), "{}", text);
        assert!(text.contains("enum class Color {\n    RED,\n    DARK_GREEN\n}\n"), "{}", text);
    }

    #[test]
    fn test_default_value_keeps_the_type_non_null() {
        let text = convert("python", "def f(x: int = 0) -> int:\n    return x\n").text;
        assert!(text.contains("fun f(x: Long = 0): Long {"), "{}", text);
        assert!(!text.contains("Long?"), "{}", text);
    }

    #[test]
    fn test_second_base_class_becomes_an_interface() {
        let source = "\
class Named:
    def __init__(self, name: str):
        self.name = name

    def label(self) -> str:
        return self.name


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
        let text = emission.text;
        assert!(text.contains("interface Aged {\n    var age: Long\n\n    fun older(): Long {"), "{}", text);
        assert!(!text.contains("class Aged"), "{}", text);
        assert!(text.contains("class Person(name: String, override var age: Long) : Named(name), Aged {"), "{}", text);
        assert!(emission.diagnostics.has_warnings());
    }

    #[test]
    fn test_base_constructor_arguments_are_passed_through() {
        let source = "\
class Animal {
    protected String name;

    public Animal(String name) {
        this.name = name;
    }
}

class Dog extends Animal {
    private int age;
}
";
        let text = convert("java", source).text;
        assert!(text.contains("class Dog(name: String, private var age: Int) : Animal(name)"), "{}", text);
    }

    #[test]
    fn test_property_with_declared_accessor_stays_private() {
        let source = "\
public class Account {
    public int balance;

    public int getBalance() {
        return balance;
    }
}
";
        let text = convert("java", source).text;
        assert!(text.contains("class Account(private var balance: Int) {"), "{}", text);
        assert!(text.contains("    fun getBalance(): Int {\n        return this.balance\n    }"), "{}", text);
    }
}
