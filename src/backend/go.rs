//! Go back-end
//!
//! Base types are embedded, methods get pointer receivers, and declared
//! exceptions become a trailing `error` result. Go has no cooperative
//! `async`; such functions are emitted synchronously with a marker.

use super::body::{BodyStyle, ReturnShape};
use super::{
    accessor_field_visibility, capitalized, constructor, default_text, ends_with_return, instance_fields, is_behavior,
    is_constant, local_type, needed_imports, self_assignment, super_call, Backend, Emission, Emitter, HasEmitter,
    NamingPolicy, Names, Style,
};
use crate::ast::{Ast, NodeRef, TypeKind, Visibility, Visitor};
use crate::comments::DocStyle;
use crate::config::{self, Settings};
use crate::error::Result;
use crate::mapping::capabilities::{AsyncModel, ErrorModel};
use crate::mapping::MappingTable;
use crate::naming::Case;
use crate::types::TypeRef;
use std::collections::BTreeSet;

pub struct GoBackend;

const RESERVED: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough", "for", "func", "go",
    "goto", "if", "import", "interface", "map", "package", "range", "return", "select", "struct", "switch", "type",
    "var",
];

const IMPORTS: &[(&str, &str)] = &[(r"\berrors\.", "errors"), (r"\bfmt\.", "fmt")];

impl Backend for GoBackend {
    fn language(&self) -> &str {
        "go"
    }

    fn extension(&self) -> &str {
        "go"
    }

    fn file_case(&self) -> Case {
        Case::Snake
    }

    fn honored_options(&self) -> &[&'static str] {
        &[
            config::PRESERVE_COMMENTS,
            config::GENERATE_DOC_COMMENTS,
            config::GENERATE_ACCESSORS,
            config::PACKAGE_NAME,
            config::EMIT_HEADER,
        ]
    }

    fn emit(&self, ast: &Ast, settings: &Settings, mapping: &MappingTable) -> Result<Emission> {
        let profile = mapping.target("go")?;
        let naming = NamingPolicy::new(&profile.capabilities, RESERVED);
        let names = Names::collect(ast, &naming, |node| accessor_field_visibility(settings, node));
        let style = Style {
            naming,
            body: BodyStyle::go(),
            doc: DocStyle::DoubleSlash,
        };
        let mut emitter = GoEmitter {
            e: Emitter::new("go", ast, settings, profile, style, names),
        };
        emitter.file()?;
        Ok(emitter.e.finish())
    }
}

struct GoEmitter<'a> {
    e: Emitter<'a>,
}

impl<'a> HasEmitter<'a> for GoEmitter<'a> {
    fn emitter(&mut self) -> &mut Emitter<'a> {
        &mut self.e
    }
}

/// `p` for `Person`
fn receiver_name(type_name: &str) -> String {
    type_name
        .chars()
        .next()
        .map(|c| c.to_lowercase().to_string())
        .unwrap_or_else(|| "x".to_string())
}

impl<'a> GoEmitter<'a> {
    fn file(&mut self) -> Result<()> {
        self.e.header();
        let package = self.e.settings.package_name.clone();
        self.e.out.line(format!("package {}", package));
        self.e.out.blank();
        let imports_at = self.e.out.position();

        let ast = self.e.ast;
        for node in ast.declarations() {
            Emitter::guarded(self, node);
            self.e.out.blank();
        }

        let imports = needed_imports(self.e.out.as_str(), IMPORTS)?;
        let block = match imports.as_slice() {
            [] => String::new(),
            [single] => format!("import \"{}\"\n\n", single),
            many => {
                let lines: Vec<String> = many.iter().map(|i| format!("\t\"{}\"", i)).collect();
                format!("import (\n{}\n)\n\n", lines.join("\n"))
            }
        };
        self.e.out.insert(imports_at, &block);
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

    fn params(&mut self, function: NodeRef<'a>) -> Vec<String> {
        let mut out = Vec::new();
        for param in function.params() {
            let Some(decl) = param.as_param() else {
                continue;
            };
            let ty = self.e.ty(&decl.ty, param.span());
            if param.default_value().is_some() {
                self.e.note(format!("default value of parameter '{}' dropped", decl.name), param.span());
            }
            out.push(format!("{} {}", self.e.naming.variable(&decl.name), ty));
        }
        out
    }

    /// Result list and the return rewriting for the body
    fn results(&mut self, function: NodeRef<'a>) -> (String, Option<ReturnShape>) {
        let Some(decl) = function.as_function() else {
            return (String::new(), None);
        };
        let value = (!decl.return_type.is_void()).then(|| self.e.ty(&decl.return_type, function.span()));
        let plain = decl.throws.is_empty() || self.e.errors() != ErrorModel::MultiReturn;
        match (value, plain) {
            (None, true) => (String::new(), None),
            (Some(value), true) => (format!(" {}", value), None),
            (None, false) => (
                " error".to_string(),
                Some(ReturnShape {
                    value: "{0}",
                    bare: "nil",
                }),
            ),
            (Some(value), false) => (
                format!(" ({}, error)", value),
                Some(ReturnShape {
                    value: "{0}, nil",
                    bare: "nil",
                }),
            ),
        }
    }

    fn async_marker(&mut self, function: NodeRef<'a>) {
        if self.e.caps().asynchrony != AsyncModel::Unsupported {
            return;
        }
        if let Some(decl) = function.as_function().filter(|f| f.is_async) {
            self.e.marker(
                "NOTE",
                &format!("asynchronous in {}; call it in a goroutine", self.e.ast.source_language()),
            );
            self.e.note(
                format!("async function '{}' rendered synchronously", decl.name),
                function.span(),
            );
        }
    }

    fn documented(&mut self, function: NodeRef<'a>) {
        let Some(decl) = function.as_function() else {
            return;
        };
        self.e.doc(decl.doc.as_deref());
        self.async_marker(function);
    }

    /// `func head {` plus the body
    fn function_body(&mut self, function: NodeRef<'a>, head: String, receiver: Option<&str>) {
        let Some(decl) = function.as_function() else {
            return;
        };
        let (results, shape) = self.results(function);
        self.e.out.open(format!("{}{} {{", head, results));
        match function.body() {
            Some(body) => {
                self.e.returns = shape;
                self.e.statements(body, receiver);
                self.e.returns = None;
                if shape.is_some() && decl.return_type.is_void() && !ends_with_return(body) {
                    self.e.out.line("return nil");
                }
            }
            None => {
                self.e.out.line("panic(\"not implemented\")");
                self.e.note(format!("abstract method '{}' rendered with a panicking body", decl.name), function.span());
            }
        }
        self.e.out.close("}");
    }

    fn struct_decl(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        let name = self.type_name(&decl.name);
        let receiver = receiver_name(&name);
        let full = format!("{}{}", name, self.e.type_args(&decl.type_params));

        self.e.doc(decl.doc.as_deref());
        let plan = self.e.plan_bases(node);
        let embedded: Vec<&TypeRef> = plan.extends.into_iter().chain(plan.composed).collect();
        if !embedded.is_empty() {
            self.e.note(format!("'{}' embeds its base type instead of inheriting", decl.name), node.span());
        }
        for ty in &plan.interfaces {
            if local_type(self.e.ast, ty).filter(|t| is_behavior(*t)).is_none() {
                self.e.marker("NOTE", &format!("implements {}", ty));
            }
        }

        let fields = instance_fields(node);
        self.e.out.open(format!("type {}{} struct {{", name, self.e.type_params(&decl.type_params)));
        for base in &embedded {
            let text = self.e.ty(base, node.span());
            self.e.out.line(text);
        }
        let mut rows = Vec::new();
        for field in &fields {
            let Some(f) = field.as_field() else {
                continue;
            };
            let ty = self.e.ty(&f.ty, field.span());
            let field_name = self.member_name(&f.name, accessor_field_visibility(self.e.settings, *field));
            rows.push((f.doc.as_deref(), field_name, ty));
        }
        // gofmt column
        let width = rows.iter().map(|(_, name, _)| name.chars().count()).max().unwrap_or(0);
        for (doc, field_name, ty) in rows {
            self.e.doc(doc);
            self.e.out.line(format!("{:width$} {}", field_name, ty, width = width));
        }
        self.e.opaque_members(node);
        self.e.out.close("}");

        self.statics(node);

        match constructor(node) {
            Some(ctor) => self.constructor(ctor, node, &name)?,
            None if self.e.settings.accessors && !fields.is_empty() => self.synthesized_constructor(node, &name),
            None => {}
        }
        if self.e.settings.accessors {
            self.accessors(node, &fields, &full, &receiver);
        }
        for method in node.methods() {
            if method.as_function().is_some_and(|f| f.is_constructor) {
                continue;
            }
            self.e.out.blank();
            self.method(method, &full, &receiver);
        }
        self.assertions(node, &name);
        Ok(())
    }

    /// Static fields become package-level declarations
    fn statics(&mut self, node: NodeRef<'a>) {
        for field in node.fields().filter(|f| f.as_field().is_some_and(|d| d.is_static)) {
            self.e.out.blank();
            self.package_level(field);
        }
    }

    fn package_level(&mut self, node: NodeRef<'a>) {
        let Some(field) = node.as_field() else {
            return;
        };
        let ty = self.e.ty(&field.ty, node.span());
        let name = if is_constant(node) {
            self.e.naming.constant(&field.name, field.visibility)
        } else {
            self.e.naming.field(&field.name, field.visibility)
        };
        self.e.doc(field.doc.as_deref());
        let keyword = if is_constant(node) { "const" } else { "var" };
        match default_text(&mut self.e, node) {
            Some((value, trailing)) => self.e.out.line(format!("{} {} {} = {}{}", keyword, name, ty, value, trailing)),
            None => self.e.out.line(format!("var {} {}", name, ty)),
        }
    }

    fn constructor(&mut self, ctor: NodeRef<'a>, owner: NodeRef<'a>, name: &str) -> Result<()> {
        let Some(decl) = ctor.as_function() else {
            return Ok(());
        };
        let receiver = receiver_name(name);
        let params = self.params(ctor);
        let throws = !decl.throws.is_empty() && self.e.errors() == ErrorModel::MultiReturn;
        let results = if throws {
            format!("(*{}, error)", name)
        } else {
            format!("*{}", name)
        };

        self.e.out.blank();
        self.e.doc(decl.doc.as_deref());
        self.e.out.open(format!("func New{}({}) {} {{", name, params.join(", "), results));
        self.e.out.line(format!("{} := &{}{{}}", receiver, name));
        let assigned: BTreeSet<&str> = match ctor.body() {
            Some(body) => body.children().filter_map(self_assignment).map(|(f, _)| f).collect(),
            None => BTreeSet::new(),
        };
        for field in instance_fields(owner) {
            let Some(f) = field.as_field() else {
                continue;
            };
            if assigned.contains(f.name.as_str()) {
                continue;
            }
            if let Some((value, trailing)) = default_text(&mut self.e, field) {
                let field_name = self.member_name(&f.name, f.visibility);
                self.e.out.line(format!("{}.{} = {}{}", receiver, field_name, value, trailing));
            }
        }
        if let Some(body) = ctor.body() {
            self.e.returns = throws.then_some(ReturnShape {
                value: "{0}, nil",
                bare: "nil, nil",
            });
            for statement in body.children() {
                match super_call(statement) {
                    Some(args) => self.base_init(owner, &receiver, &args),
                    None => self.e.statements(statement, Some(receiver.as_str())),
                }
            }
            self.e.returns = None;
        }
        if throws {
            self.e.out.line(format!("return {}, nil", receiver));
        } else {
            self.e.out.line(format!("return {}", receiver));
        }
        self.e.out.close("}");
        Ok(())
    }

    /// `super(args)` assigns the embedded base
    fn base_init(&mut self, owner: NodeRef<'a>, receiver: &str, args: &[NodeRef<'a>]) {
        let plan = self.e.plan_bases(owner);
        let Some(base) = plan.extends.into_iter().chain(plan.composed).next() else {
            return;
        };
        let base_name = self.type_name(&base.base_name);
        let rendered: Vec<String> = args.iter().map(|a| self.e.expression(*a, Some(receiver)).0).collect();
        let value = if local_type(self.e.ast, base).is_some_and(|t| constructor(t).is_some() || t.fields().next().is_some()) {
            format!("*New{}({})", base_name, rendered.join(", "))
        } else {
            format!("{}{{}}", base_name)
        };
        self.e.out.line(format!("{}.{} = {}", receiver, base_name, value));
    }

    fn synthesized_constructor(&mut self, node: NodeRef<'a>, name: &str) {
        let mut params = Vec::new();
        let mut inits = Vec::new();
        for field in instance_fields(node) {
            let Some(f) = field.as_field() else {
                continue;
            };
            let field_name = self.member_name(&f.name, accessor_field_visibility(self.e.settings, field));
            match default_text(&mut self.e, field) {
                Some((value, _)) => inits.push(format!("{}: {}", field_name, value)),
                None => {
                    let ty = self.e.ty(&f.ty, field.span());
                    let param = self.e.naming.variable(&f.name);
                    params.push(format!("{} {}", param, ty));
                    inits.push(format!("{}: {}", field_name, param));
                }
            }
        }
        self.e.out.blank();
        self.e.generated_doc(&format!("New{} creates a {} from its field values.", name, name));
        self.e.out.open(format!("func New{}({}) *{} {{", name, params.join(", "), name));
        self.e.out.line(format!("return &{}{{{}}}", name, inits.join(", ")));
        self.e.out.close("}");
    }

    fn accessors(&mut self, owner: NodeRef<'a>, fields: &[NodeRef<'a>], full: &str, receiver: &str) {
        let taken: BTreeSet<String> = owner
            .methods()
            .filter_map(|m| m.as_function().map(|f| self.e.naming.function(&f.name, Visibility::Public)))
            .collect();
        for field in fields {
            let Some(f) = field.as_field() else {
                continue;
            };
            let field_name = self.member_name(&f.name, accessor_field_visibility(self.e.settings, *field));
            let exported = capitalized(&field_name);
            let ty = self.e.ty(&f.ty, field.span());
            // A source `getX` method already plays the getter
            if !taken.contains(&exported) && !taken.contains(&format!("Get{}", exported)) {
                self.e.out.blank();
                self.e.generated_doc(&format!("{} returns the {} field.", exported, field_name));
                self.e.out.open(format!("func ({} *{}) {}() {} {{", receiver, full, exported, ty));
                self.e.out.line(format!("return {}.{}", receiver, field_name));
                self.e.out.close("}");
            }
            let setter = format!("Set{}", exported);
            if f.mutable && !taken.contains(&setter) {
                self.e.out.blank();
                self.e.generated_doc(&format!("{} replaces the {} field.", setter, field_name));
                self.e.out.open(format!("func ({} *{}) {}(value {}) {{", receiver, full, setter, ty));
                self.e.out.line(format!("{}.{} = value", receiver, field_name));
                self.e.out.close("}");
            }
        }
    }

    fn method(&mut self, function: NodeRef<'a>, full: &str, receiver: &str) {
        let Some(decl) = function.as_function() else {
            return;
        };
        let name = self.member_name(&decl.name, decl.visibility);
        let params = self.params(function);
        self.documented(function);
        if decl.is_static {
            let owner = full.split('[').next().unwrap_or(full);
            let head = format!("func {}{}({})", owner, capitalized(&name), params.join(", "));
            self.function_body(function, head, None);
        } else {
            let head = format!("func ({} *{}) {}({})", receiver, full, name, params.join(", "));
            self.function_body(function, head, Some(receiver));
        }
    }

    /// `var _ Shape = (*Square)(nil)`
    fn assertions(&mut self, node: NodeRef<'a>, name: &str) {
        if !self.e.caps().interface_assertions {
            return;
        }
        for ty in self.e.plan_bases(node).interfaces {
            if local_type(self.e.ast, ty).is_some_and(is_behavior) {
                let interface = self.e.ty(ty, node.span());
                self.e.out.blank();
                self.e.out.line(format!("var _ {} = (*{})(nil)", interface, name));
            }
        }
    }

    fn interface_decl(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        let name = self.type_name(&decl.name);
        self.e.doc(decl.doc.as_deref());
        self.e.out.open(format!("type {}{} interface {{", name, self.e.type_params(&decl.type_params)));
        for base in &decl.bases {
            let text = self.e.ty(&base.ty, node.span());
            self.e.out.line(text);
        }
        for field in node.fields() {
            let Some(f) = field.as_field() else {
                continue;
            };
            let ty = self.e.ty(&f.ty, field.span());
            let getter = self.e.naming.function(&f.name, Visibility::Public);
            self.e.out.line(format!("{}() {}", getter, ty));
        }
        for method in node.methods() {
            let Some(f) = method.as_function() else {
                continue;
            };
            let method_name = self.e.naming.function(&f.name, f.visibility);
            let params = self.params(method);
            let (results, _) = self.results(method);
            self.e.doc(f.doc.as_deref());
            self.e.out.line(format!("{}({}){}", method_name, params.join(", "), results));
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
        self.e.out.line(format!("type {} int", name));
        if !decl.variants.is_empty() {
            self.e.out.blank();
            self.e.out.open("const (");
            for (index, variant) in decl.variants.iter().enumerate() {
                let constant = format!("{}{}", name, self.e.naming.variant(variant));
                if index == 0 {
                    self.e.out.line(format!("{} {} = iota", constant, name));
                } else {
                    self.e.out.line(constant);
                }
            }
            self.e.out.close(")");
        }
        let receiver = receiver_name(&name);
        for method in node.methods() {
            self.e.out.blank();
            self.method(method, &name, &receiver);
        }
        self.e.opaque_members(node);
        Ok(())
    }
}

impl<'a> Visitor<'a> for GoEmitter<'a> {
    type Output = ();

    fn visit_type(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        match decl.kind {
            TypeKind::Enum => self.enum_decl(node),
            TypeKind::Interface if is_behavior(node) => self.interface_decl(node),
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
        self.documented(node);
        let head = format!("func {}{}({})", name, self.e.type_params(&decl.type_params), params.join(", "));
        self.function_body(node, head, None);
        Ok(())
    }

    fn visit_field(&mut self, node: NodeRef<'a>) -> Result<()> {
        self.package_level(node);
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
        GoBackend.emit(&ast, &settings, &mapping).expect("emission")
    }

    #[test]
    fn test_function_in_package() {
        let emission = convert("python", "def add(a: int, b: int) -> int:\n    return a + b\n");
        assert_eq!(
            emission.text,
            "package main\n\nfunc Add(a int64, b int64) int64 {\n\treturn a + b\n}\n"
        );
    }

    #[test]
    fn test_class_gets_constructor_and_accessors() {
        let source = "\
class Person:
    def __init__(self, name: str, age: int):
        self.name = name
        self.age = age
";
        let emission = convert("python", source);
        let text = &emission.text;
        assert!(text.contains("type Person struct {\n\tname string\n\tage  int64\n}"), "{}", text);
        assert!(text.contains("func NewPerson(name string, age int64) *Person {\n\tp := &Person{}\n\tp.name = name\n"), "{}", text);
        assert!(text.contains("func (p *Person) Name() string {\n\treturn p.name\n}"), "{}", text);
        assert!(text.contains("func (p *Person) SetAge(value int64) {"), "{}", text);
    }

    #[test]
    fn test_base_is_embedded() {
        let source = "\
class Animal {
    String speak() {
        return \"...\";
    }
}

class Dog extends Animal {
    String fetch() {
        return \"ball\";
    }
}
";
        let emission = convert("java", source);
        assert!(emission.text.contains("type Dog struct {\n\tAnimal\n}"), "{}", emission.text);
        assert!(emission.text.contains("func (d *Dog) fetch() string {"), "{}", emission.text);
    }

    #[test]
    fn test_throws_adds_error_result() {
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
                .contains("func (r *Reader) Read(path string) (string, error) {\n\treturn path, nil\n}"),
            "{}",
            emission.text
        );
    }

    #[test]
    fn test_interface_assertion_and_print_import() {
        let source = "\
interface Greeter {
    greet(): void;
}

class Console implements Greeter {
    greet(): void {
        console.log(\"hi\");
    }
}
";
        let emission = convert("typescript", source);
        let text = &emission.text;
        assert!(text.contains("import \"fmt\"\n"), "{}", text);
        assert!(text.contains("type Greeter interface {\n\tGreet()\n}"), "{}", text);
        assert!(text.contains("fmt.Println(\"hi\")"), "{}", text);
        assert!(text.contains("var _ Greeter = (*Console)(nil)"), "{}", text);
    }

    #[test]
    fn test_enum_uses_iota() {
        let emission = convert("java", "enum Color { RED, GREEN }\n");
        assert!(
            emission.text.contains("type Color int\n\nconst (\n\tColorRed Color = iota\n\tColorGreen\n)"),
            "{}",
            emission.text
        );
    }

    #[test]
    fn test_async_is_marked() {
        let emission = convert("typescript", "async function load(): Promise<string> {\n    return \"x\";\n}\n");
        assert!(emission.text.contains("// NOTE: asynchronous in typescript"), "{}", emission.text);
        assert_eq!(emission.diagnostics.warning_count(), 1);
    }

    #[test]
    fn test_declared_getter_replaces_the_generated_one() {
        let source = "\
public class Account {
    private int balance;

    public int getBalance() {
        return balance;
    }
}
";
        let text = convert("java", source).text;
        assert!(text.contains("func (a *Account) GetBalance() int32 {\n\treturn a.balance\n}"), "{}", text);
        assert!(!text.contains("func (a *Account) Balance() int32"), "{}", text);
        assert!(text.contains("func (a *Account) SetBalance(value int32) {"), "{}", text);
    }
}
