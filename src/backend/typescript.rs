//! TypeScript back-end

use super::body::BodyStyle;
use super::{
    constructor, declared_methods, default_text, demoted_fields, instance_fields, is_constant, local_type, super_call,
    Backend, Emission, Emitter, HasEmitter, NamingPolicy, Names, Style,
};
use crate::ast::{Ast, NodeKind, NodeRef, TypeKind, Visibility, Visitor};
use crate::comments::DocStyle;
use crate::config::{self, Settings};
use crate::error::Result;
use crate::mapping::capabilities::ErrorModel;
use crate::mapping::MappingTable;
use crate::naming::Case;
use crate::types::TypeRef;

pub struct TypeScriptBackend;

const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do", "else", "enum",
    "export", "extends", "false", "finally", "for", "function", "if", "import", "in", "instanceof", "new", "null",
    "return", "super", "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with",
];

impl Backend for TypeScriptBackend {
    fn language(&self) -> &str {
        "typescript"
    }

    fn extension(&self) -> &str {
        "ts"
    }

    fn file_case(&self) -> Case {
        Case::Camel
    }

    fn honored_options(&self) -> &[&'static str] {
        &[
            config::PRESERVE_COMMENTS,
            config::GENERATE_DOC_COMMENTS,
            config::INDENT_WIDTH,
            config::EMIT_TYPE_ANNOTATIONS,
            config::EMIT_HEADER,
        ]
    }

    fn emit(&self, ast: &Ast, settings: &Settings, mapping: &MappingTable) -> Result<Emission> {
        let profile = mapping.target("typescript")?;
        let naming = NamingPolicy::new(&profile.capabilities, RESERVED);
        let names = Names::collect(ast, &naming, |node| {
            node.as_field().map(|f| f.visibility).unwrap_or(Visibility::Private)
        });
        let style = Style {
            naming,
            body: BodyStyle::typescript(),
            doc: DocStyle::JavaDoc,
        };
        let mut emitter = TypeScriptEmitter {
            e: Emitter::new("typescript", ast, settings, profile, style, names),
        };
        emitter.file();
        Ok(emitter.e.finish())
    }
}

struct TypeScriptEmitter<'a> {
    e: Emitter<'a>,
}

impl<'a> HasEmitter<'a> for TypeScriptEmitter<'a> {
    fn emitter(&mut self) -> &mut Emitter<'a> {
        &mut self.e
    }
}

/// Modifier of a class member
fn member_visibility(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Private => "private ",
        Visibility::Protected => "protected ",
        Visibility::Public | Visibility::Internal => "",
    }
}

fn exported(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "export ",
        _ => "",
    }
}

/// A `?` marker already says the value may be absent
fn marked_type(ty: &TypeRef, marked: bool) -> &TypeRef {
    match ty.inner() {
        Some(inner) if marked => inner,
        _ => ty,
    }
}

impl<'a> TypeScriptEmitter<'a> {
    fn file(&mut self) {
        self.e.header();
        let ast = self.e.ast;
        for node in ast.declarations() {
            Emitter::guarded(self, node);
            self.e.out.blank();
        }
    }

    fn annotations(&self) -> bool {
        self.e.settings.type_annotations
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

    /// `: T` when annotations are on
    fn annotation(&mut self, ty: &TypeRef, span: crate::error::Span) -> String {
        if self.annotations() {
            format!(": {}", self.e.ty(ty, span))
        } else {
            String::new()
        }
    }

    fn throws_tags(&self, function: NodeRef<'a>) -> Vec<String> {
        if self.e.errors() != ErrorModel::Documented {
            return Vec::new();
        }
        function
            .as_function()
            .map(|f| f.throws.iter().map(|t| format!("@throws {{{}}}", t)).collect())
            .unwrap_or_default()
    }

    fn params(&mut self, function: NodeRef<'a>) -> Vec<String> {
        let mut out = Vec::new();
        for param in function.params() {
            let Some(decl) = param.as_param() else {
                continue;
            };
            let name = self.e.naming.variable(&decl.name);
            let default = default_text(&mut self.e, param);
            let optional = decl.optional && default.is_none();
            let annotation = self.annotation(marked_type(&decl.ty, optional), param.span());
            let marker = if optional { "?" } else { "" };
            match default {
                Some((value, _)) => out.push(format!("{}{}{} = {}", name, marker, annotation, value)),
                None => out.push(format!("{}{}{}", name, marker, annotation)),
            }
        }
        out
    }

    fn returns(&mut self, function: NodeRef<'a>) -> String {
        let Some(decl) = function.as_function() else {
            return String::new();
        };
        if !self.annotations() || decl.is_constructor {
            return String::new();
        }
        let ty = self.e.ty(&decl.return_type, function.span());
        if decl.is_async {
            format!(": Promise<{}>", ty)
        } else {
            format!(": {}", ty)
        }
    }

    /// Signature head and body of a function or method
    fn function(&mut self, function: NodeRef<'a>, head: String, signature_only: bool) {
        let Some(decl) = function.as_function() else {
            return;
        };
        let tags = self.throws_tags(function);
        self.e.tagged_doc(decl.doc.as_deref(), &tags);
        let params = self.params(function);
        let returns = self.returns(function);
        let signature = format!("{}{}({}){}", head, self.e.type_params(&decl.type_params), params.join(", "), returns);
        match function.body() {
            Some(body) if !signature_only => {
                self.e.out.open(format!("{} {{", signature));
                self.e.statements(body, None);
                self.e.out.close("}");
            }
            Some(_) => {
                // Implementing classes carry a copy of the body
                if !self.owned_by_demoted(function) {
                    self.e.note(
                        format!("body of interface method '{}' dropped", decl.name),
                        function.span(),
                    );
                }
                self.e.out.line(format!("{};", signature));
            }
            None => self.e.out.line(format!("{};", signature)),
        }
    }

    fn owned_by_demoted(&self, member: NodeRef<'a>) -> bool {
        member
            .parent()
            .and_then(|p| p.as_type())
            .is_some_and(|t| self.e.demoted.contains(&t.name))
    }

    fn field_line(&mut self, field: NodeRef<'a>, definite: bool) {
        let Some(decl) = field.as_field() else {
            return;
        };
        let name = self.member_name(&decl.name, decl.visibility);
        let mut modifiers = member_visibility(decl.visibility).to_string();
        if decl.is_static {
            modifiers.push_str("static ");
        }
        if decl.is_static && !decl.mutable {
            modifiers.push_str("readonly ");
        }
        let default = default_text(&mut self.e, field);
        let marker = if decl.optional && default.is_none() {
            "?"
        } else if definite && default.is_none() {
            "!"
        } else {
            ""
        };
        let annotation = self.annotation(marked_type(&decl.ty, marker == "?"), field.span());
        self.e.doc(decl.doc.as_deref());
        match default {
            Some((value, trailing)) => {
                self.e.out.line(format!("{}{}{}{} = {};{}", modifiers, name, marker, annotation, value, trailing))
            }
            None => self.e.out.line(format!("{}{}{}{};", modifiers, name, marker, annotation)),
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

        let mut head = format!("{}{}class {}{}", exported(decl.visibility), if is_abstract { "abstract " } else { "" }, name, self.e.type_params(&decl.type_params));
        if let Some(base) = extends.first() {
            head.push_str(&format!(" extends {}", base));
        }
        if !implements.is_empty() {
            head.push_str(&format!(" implements {}", implements.join(", ")));
        }
        self.e.doc(decl.doc.as_deref());
        self.e.out.open(format!("{} {{", head));

        let ctor = constructor(node);
        let mut fields = instance_fields(node);
        fields.extend(demoted_fields(self.e.ast, &self.e.demoted, node));
        let required: Vec<NodeRef<'a>> = fields
            .iter()
            .copied()
            .filter(|f| f.default_value().is_none() && f.as_field().is_some_and(|d| !d.optional))
            .collect();
        let synthesize = ctor.is_none() && extends.is_empty() && !required.is_empty();
        let definite = ctor.is_none() && !synthesize;

        for field in node.fields().filter(|f| f.as_field().is_some_and(|d| d.is_static)) {
            self.field_line(field, false);
        }
        for field in &fields {
            self.field_line(*field, definite);
        }
        if let Some(ctor) = ctor {
            self.e.out.blank();
            self.constructor(ctor);
        } else if synthesize {
            self.e.out.blank();
            self.synthesized_constructor(&required);
        }
        for method in node.methods() {
            if method.as_function().is_some_and(|f| f.is_constructor) {
                continue;
            }
            self.e.out.blank();
            self.method(method, is_abstract);
        }
        for method in self.copied_methods(node) {
            self.e.out.blank();
            self.method(method, false);
        }
        self.e.opaque_members(node);
        self.e.out.close("}");
        Ok(())
    }

    /// Method bodies of interface-declared bases that `node` does not override
    fn copied_methods(&self, node: NodeRef<'a>) -> Vec<NodeRef<'a>> {
        let Some(decl) = node.as_type() else {
            return Vec::new();
        };
        let mut taken = declared_methods(node);
        let mut copied = Vec::new();
        for base in decl.bases.iter().filter(|b| self.e.demoted.contains(&b.ty.base_name)) {
            let Some(local) = local_type(self.e.ast, &base.ty) else {
                continue;
            };
            for method in local.methods() {
                let copy = method
                    .as_function()
                    .is_some_and(|f| !f.is_constructor && !f.is_static && method.body().is_some() && taken.insert(f.name.clone()));
                if copy {
                    copied.push(method);
                }
            }
        }
        copied
    }

    fn constructor(&mut self, ctor: NodeRef<'a>) {
        let Some(decl) = ctor.as_function() else {
            return;
        };
        let tags = self.throws_tags(ctor);
        self.e.tagged_doc(decl.doc.as_deref(), &tags);
        let params = self.params(ctor);
        self.e.out.open(format!("constructor({}) {{", params.join(", ")));
        if let Some(body) = ctor.body() {
            let statements: Vec<NodeRef<'a>> = match body.kind() {
                NodeKind::Block => body.children().collect(),
                _ => vec![body],
            };
            for statement in statements {
                match super_call(statement) {
                    Some(args) => {
                        let rendered: Vec<String> = args.iter().map(|a| self.e.expression(*a, None).0).collect();
                        self.e.out.line(format!("super({});", rendered.join(", ")));
                    }
                    None => self.e.statements(statement, None),
                }
            }
        }
        self.e.out.close("}");
    }

    fn synthesized_constructor(&mut self, fields: &[NodeRef<'a>]) {
        let mut params = Vec::new();
        let mut assignments = Vec::new();
        for field in fields {
            let Some(decl) = field.as_field() else {
                continue;
            };
            let param = self.e.naming.variable(&decl.name);
            let annotation = self.annotation(&decl.ty, field.span());
            params.push(format!("{}{}", param, annotation));
            let member = self.member_name(&decl.name, decl.visibility);
            assignments.push(format!("this.{} = {};", member, param));
        }
        self.e.generated_doc("Creates an instance from its field values.");
        self.e.out.open(format!("constructor({}) {{", params.join(", ")));
        for assignment in assignments {
            self.e.out.line(assignment);
        }
        self.e.out.close("}");
    }

    fn method(&mut self, method: NodeRef<'a>, in_abstract: bool) {
        let Some(decl) = method.as_function() else {
            return;
        };
        let name = self.member_name(&decl.name, decl.visibility);
        let mut head = member_visibility(decl.visibility).to_string();
        if decl.is_static {
            head.push_str("static ");
        }
        if in_abstract && method.body().is_none() {
            head.push_str("abstract ");
        }
        if decl.is_async && method.body().is_some() {
            head.push_str(self.e.async_keyword());
        }
        head.push_str(&name);
        self.function(method, head, false);
    }

    fn interface_decl(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        let name = self.type_name(&decl.name);
        let bases: Vec<String> = decl.bases.iter().map(|b| self.e.ty(&b.ty, node.span())).collect();
        let extends = if bases.is_empty() {
            String::new()
        } else {
            format!(" extends {}", bases.join(", "))
        };
        self.e.doc(decl.doc.as_deref());
        self.e.out.open(format!(
            "{}interface {}{}{} {{",
            exported(decl.visibility),
            name,
            self.e.type_params(&decl.type_params),
            extends
        ));
        for field in node.fields() {
            let Some(f) = field.as_field() else {
                continue;
            };
            if f.is_static {
                self.e.note(format!("static field '{}' dropped from interface", f.name), field.span());
                continue;
            }
            let field_name = self.member_name(&f.name, f.visibility);
            let marker = if f.optional { "?" } else { "" };
            let ty = self.e.ty(marked_type(&f.ty, f.optional), field.span());
            self.e.doc(f.doc.as_deref());
            self.e.out.line(format!("{}{}: {};", field_name, marker, ty));
        }
        for method in node.methods() {
            let Some(m) = method.as_function() else {
                continue;
            };
            if m.is_constructor || m.is_static {
                self.e.note(format!("'{}' of '{}' dropped; it is declared as an interface", m.name, decl.name), method.span());
                continue;
            }
            let head = self.member_name(&m.name, m.visibility);
            self.function(method, head, true);
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
        self.e.out.open(format!("{}enum {} {{", exported(decl.visibility), name));
        for variant in &decl.variants {
            let variant = self.e.naming.variant(variant);
            self.e.out.line(format!("{},", variant));
        }
        self.e.opaque_members(node);
        self.e.out.close("}");
        for method in node.methods() {
            let Some(m) = method.as_function() else {
                continue;
            };
            self.e.marker("NOTE", &format!("method '{}' of enum '{}' not translated", m.name, decl.name));
            self.e.note(format!("TypeScript enums cannot carry method '{}'", m.name), method.span());
        }
        Ok(())
    }
}

impl<'a> Visitor<'a> for TypeScriptEmitter<'a> {
    type Output = ();

    fn visit_type(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        match decl.kind {
            TypeKind::Enum => self.enum_decl(node),
            TypeKind::Interface => self.interface_decl(node),
            _ if self.e.demoted.contains(&decl.name) => self.interface_decl(node),
            TypeKind::Class | TypeKind::Struct => self.class_decl(node),
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
        let asyncness = if decl.is_async { self.e.async_keyword() } else { "" };
        let head = format!("{}{}function {}", exported(decl.visibility), asyncness, name);
        self.function(node, head, false);
        Ok(())
    }

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
        let keyword = if is_constant(node) || !field.mutable { "const" } else { "let" };
        let annotation = self.annotation(&field.ty, node.span());
        self.e.doc(field.doc.as_deref());
        match default_text(&mut self.e, node) {
            Some((value, trailing)) => self.e.out.line(format!(
                "{}{} {}{} = {};{}",
                exported(field.visibility),
                keyword,
                name,
                annotation,
                value,
                trailing
            )),
            None => self
                .e
                .out
                .line(format!("{}let {}{};", exported(field.visibility), name, annotation)),
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
        TypeScriptBackend.emit(&ast, &settings, &mapping).expect("emission")
    }

    #[test]
    fn test_function_signature() {
        let emission = convert("python", "def add(a: int, b: int) -> int:\n    return a + b\n");
        assert!(
            emission.text.contains("function add(a: number, b: number): number {\n    return a + b;\n}\n"),
            "{}",
            emission.text
        );
    }

    #[test]
    fn test_class_with_constructor_and_super_call() {
        let source = "\
class Animal:
    def __init__(self, name: str):
        self.name = name

class Dog(Animal):
    def __init__(self, name: str, breed: str):
        super().__init__(name)
        self.breed = breed

    def describe(self) -> str:
        return self.name + \" the \" + self.breed
";
        let emission = convert("python", source);
        let text = &emission.text;
        assert!(text.contains("class Dog extends Animal {"), "{}", text);
        assert!(text.contains("    constructor(name: string, breed: string) {\n        super(name);\n        this.breed = breed;\n    }\n"), "{}", text);
        assert!(text.contains("    describe(): string {\n        return this.name + \" the \" + this.breed;\n    }\n"), "{}", text);
    }

    #[test]
    fn test_record_class_gets_constructor() {
        let source = "\
public class Point {
    private int x;
    private int y;
}
";
        let emission = convert("java", source);
        let text = &emission.text;
        assert!(text.contains("export class Point {\n    private x: number;\n    private y: number;\n"), "{}", text);
        assert!(text.contains("    constructor(x: number, y: number) {\n        this.x = x;\n        this.y = y;\n    }\n"), "{}", text);
    }

    #[test]
    fn test_throws_become_jsdoc_and_async_returns_promise() {
        let source = "\
public class Loader {
    public String load(String path) throws IOException {
        return path;
    }
}
";
        let emission = convert("java", source);
        assert!(emission.text.contains("    /**\n     * @throws {IOException}\n     */\n    load(path: string): string {"), "{}", emission.text);
    }

    #[test]
    fn test_interface_and_enum() {
        let source = "\
interface Shape {
    double area();
}

enum Color { RED, DARK_GREEN }
";
        let emission = convert("java", source);
        let text = &emission.text;
        assert!(text.contains("interface Shape {\n    area(): number;\n}\n"), "{}", text);
        assert!(text.contains("enum Color {\n    Red,\n    DarkGreen,\n}\n"), "{}", text);
    }
}
