//! Python back-end

use super::body::BodyStyle;
use super::{
    constructor, default_text, instance_fields, is_behavior, is_constant, needed_imports,
    self_assignment, super_call, Backend, Emission, Emitter, HasEmitter, NamingPolicy, Names, Style,
};
use crate::ast::{Ast, NodeKind, NodeRef, TypeKind, Visibility, Visitor};
use crate::comments::DocStyle;
use crate::config::{self, Settings};
use crate::error::Result;
use crate::mapping::capabilities::{ErrorModel, GenericSyntax};
use crate::mapping::MappingTable;
use crate::naming::Case;
use crate::types::TypeRef;
use std::collections::{BTreeMap, BTreeSet};

pub struct PythonBackend;

const RESERVED: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del",
    "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda", "nonlocal",
    "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// Trigger pattern and `module:name` to import
const IMPORTS: &[(&str, &str)] = &[
    (r"\bABC\b", "abc:ABC"),
    (r"@abstractmethod\b", "abc:abstractmethod"),
    (r"@dataclass\b", "dataclasses:dataclass"),
    (r"\(Enum\):", "enum:Enum"),
    (r"\bauto\(\)", "enum:auto"),
    (r"\bAny\b", "typing:Any"),
    (r"\bCallable\[", "typing:Callable"),
    (r"\bClassVar\[", "typing:ClassVar"),
    (r"\bDict\[", "typing:Dict"),
    (r"\bGeneric\[", "typing:Generic"),
    (r"\bList\[", "typing:List"),
    (r"\bOptional\[", "typing:Optional"),
    (r"\(Protocol\)|, Protocol\)", "typing:Protocol"),
    (r"\bSet\[", "typing:Set"),
    (r"\bTuple\[", "typing:Tuple"),
    (r"\bTypeVar\(", "typing:TypeVar"),
    (r"\bUnion\[", "typing:Union"),
];

impl Backend for PythonBackend {
    fn language(&self) -> &str {
        "python"
    }

    fn extension(&self) -> &str {
        "py"
    }

    fn file_case(&self) -> Case {
        Case::Snake
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
        let profile = mapping.target("python")?;
        let naming = NamingPolicy {
            private_prefix: Some("_"),
            variants: Case::ScreamingSnake,
            ..NamingPolicy::new(&profile.capabilities, RESERVED)
        };
        let names = Names::collect(ast, &naming, |node| {
            node.as_field().map(|f| f.visibility).unwrap_or(Visibility::Private)
        });
        let style = Style {
            naming,
            body: BodyStyle::python(),
            doc: DocStyle::Hash,
        };
        let mut emitter = PythonEmitter {
            e: Emitter::new("python", ast, settings, profile, style, names),
            type_vars: Vec::new(),
        };
        emitter.file()?;
        Ok(emitter.e.finish())
    }
}

struct PythonEmitter<'a> {
    e: Emitter<'a>,
    /// Generic parameters in first-seen order
    type_vars: Vec<String>,
}

impl<'a> HasEmitter<'a> for PythonEmitter<'a> {
    fn emitter(&mut self) -> &mut Emitter<'a> {
        &mut self.e
    }
}

/// Group `module:name` entries into `from module import a, b` lines
fn import_lines(entries: &[String]) -> Vec<String> {
    let mut modules: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for entry in entries {
        if let Some((module, name)) = entry.split_once(':') {
            modules.entry(module).or_default().push(name);
        }
    }
    modules
        .into_iter()
        .map(|(module, names)| format!("from {} import {}", module, names.join(", ")))
        .collect()
}

impl<'a> PythonEmitter<'a> {
    fn file(&mut self) -> Result<()> {
        self.e.header();
        let imports_at = self.e.out.position();

        let ast = self.e.ast;
        let mut first = true;
        for node in ast.declarations() {
            if !first {
                // Two blank lines between top-level definitions
                self.e.out.line("");
            }
            first = false;
            Emitter::guarded(self, node);
            self.e.out.blank();
        }

        let mut prelude = String::new();
        let mut entries = needed_imports(self.e.out.as_str(), IMPORTS)?;
        if !self.type_vars.is_empty() {
            entries.push("typing:TypeVar".to_string());
            entries.sort();
            entries.dedup();
        }
        for line in import_lines(&entries) {
            prelude.push_str(&line);
            prelude.push('\n');
        }
        if !self.type_vars.is_empty() {
            if !prelude.is_empty() {
                prelude.push('\n');
            }
            for var in &self.type_vars {
                prelude.push_str(&format!("{} = TypeVar(\"{}\")\n", var, var));
            }
        }
        if !prelude.is_empty() {
            prelude.push_str("\n\n");
            self.e.out.insert(imports_at, &prelude);
        }
        Ok(())
    }

    fn remember_type_vars(&mut self, params: &[String]) {
        for param in params {
            if !self.type_vars.contains(param) {
                self.type_vars.push(param.clone());
            }
        }
    }

    fn annotations(&self) -> bool {
        self.e.settings.type_annotations
    }

    fn type_name(&self, name: &str) -> String {
        self.e.names.types.get(name).cloned().unwrap_or_else(|| self.e.naming.type_name(name))
    }

    /// Triple-quoted docstring at the current indentation
    fn docstring(&mut self, doc: Option<&str>, raises: &[String]) {
        let mut text = String::new();
        if self.e.settings.preserve_comments {
            if let Some(doc) = doc {
                text.push_str(doc.trim());
            }
        }
        if !raises.is_empty() {
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str("Raises:");
            for raised in raises {
                text.push_str(&format!("\n    {}", raised));
            }
        }
        if text.is_empty() {
            return;
        }
        let text = text.replace("\"\"\"", "\\\"\\\"\\\"");
        if text.contains('\n') {
            let mut lines = text.lines();
            let first = lines.next().unwrap_or_default();
            self.e.out.line(format!("\"\"\"{}", first));
            for line in lines {
                self.e.out.line(line);
            }
            self.e.out.line("\"\"\"");
        } else {
            self.e.out.line(format!("\"\"\"{}\"\"\"", text));
        }
    }

    fn annotation(&mut self, ty: &TypeRef, node: NodeRef<'a>) -> String {
        if self.annotations() {
            format!(": {}", self.e.ty(ty, node.span()))
        } else {
            String::new()
        }
    }

    fn params(&mut self, function: NodeRef<'a>, receiver: Option<&str>) -> Vec<String> {
        let mut out: Vec<String> = receiver.map(str::to_string).into_iter().collect();
        for param in function.params() {
            let Some(decl) = param.as_param() else {
                continue;
            };
            let name = self.e.naming.variable(&decl.name);
            let annotation = self.annotation(&decl.ty, param);
            let default = match default_text(&mut self.e, param) {
                Some((value, _)) => format!(" = {}", value),
                None if decl.optional => " = None".to_string(),
                None => String::new(),
            };
            out.push(format!("{}{}{}", name, annotation, default));
        }
        out
    }

    fn returns(&mut self, function: NodeRef<'a>) -> String {
        let Some(decl) = function.as_function() else {
            return String::new();
        };
        if !self.annotations() {
            return String::new();
        }
        if decl.is_constructor || decl.return_type.is_void() {
            return " -> None".to_string();
        }
        format!(" -> {}", self.e.ty(&decl.return_type, function.span()))
    }

    fn raises(&self, function: NodeRef<'a>) -> Vec<String> {
        if self.e.errors() != ErrorModel::Documented {
            return Vec::new();
        }
        function
            .as_function()
            .map(|f| f.throws.iter().map(|t| t.to_string()).collect())
            .unwrap_or_default()
    }

    fn function(&mut self, function: NodeRef<'a>, name: &str, receiver: Option<&str>, abstract_marker: bool) {
        let Some(decl) = function.as_function() else {
            return;
        };
        self.remember_type_vars(&decl.type_params);
        if decl.is_static && receiver.is_none() && function.parent().is_some_and(|p| p.as_type().is_some()) {
            self.e.out.line("@staticmethod");
        }
        if abstract_marker && function.body().is_none() {
            self.e.out.line("@abstractmethod");
        }
        let params = self.params(function, receiver);
        let returns = self.returns(function);
        let asyncness = if decl.is_async { self.e.async_keyword() } else { "" };
        self.e.out.open(format!("{}def {}({}){}:", asyncness, name, params.join(", "), returns));
        let raises = self.raises(function);
        self.docstring(decl.doc.as_deref(), &raises);
        match function.body() {
            Some(body) => self.e.statements(body, None),
            None => self.e.out.line("..."),
        }
        self.e.out.dedent();
    }

    fn bases(&mut self, node: NodeRef<'a>, extra: &[&str]) -> String {
        let Some(decl) = node.as_type() else {
            return String::new();
        };
        let plan = self.e.plan_bases(node);
        let listed: Vec<&TypeRef> = plan.extends.into_iter().chain(plan.composed).chain(plan.interfaces).collect();
        let mut bases: Vec<String> = listed.into_iter().map(|ty| self.e.ty(ty, node.span())).collect();
        bases.extend(extra.iter().map(|s| s.to_string()));
        if !decl.type_params.is_empty() && self.e.caps().generics == GenericSyntax::TypeVar {
            bases.push(format!("Generic[{}]", decl.type_params.join(", ")));
        }
        if bases.is_empty() {
            String::new()
        } else {
            format!("({})", bases.join(", "))
        }
    }

    fn class_var(&mut self, field: NodeRef<'a>) {
        let Some(decl) = field.as_field() else {
            return;
        };
        let name = if is_constant(field) {
            self.e.naming.constant(&decl.name, decl.visibility)
        } else {
            self.e.naming.field(&decl.name, decl.visibility)
        };
        let annotation = if self.annotations() {
            format!(": ClassVar[{}]", self.e.ty_arg(&decl.ty, field.span()))
        } else {
            String::new()
        };
        let (value, trailing) = default_text(&mut self.e, field).unwrap_or_else(|| ("None".to_string(), String::new()));
        self.e.out.line(format!("{}{} = {}{}", name, annotation, value, trailing));
    }

    fn class_decl(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        self.remember_type_vars(&decl.type_params);
        let name = self.type_name(&decl.name);
        let ctor = constructor(node);
        let has_abstract = node.methods().any(|m| m.body().is_none());
        let dataclass = ctor.is_none() && !instance_fields(node).is_empty();

        let extra: &[&str] = if has_abstract { &["ABC"] } else { &[] };
        let bases = self.bases(node, extra);
        if dataclass {
            self.e.out.line("@dataclass");
        }
        self.e.out.open(format!("class {}{}:", name, bases));
        self.docstring(decl.doc.as_deref(), &[]);
        let mut empty = true;

        for field in node.fields().filter(|f| f.as_field().is_some_and(|d| d.is_static)) {
            self.class_var(field);
            empty = false;
        }
        if dataclass {
            for field in instance_fields(node) {
                self.dataclass_field(field);
                empty = false;
            }
        }
        if let Some(ctor) = ctor {
            self.e.out.blank();
            self.init(ctor, node);
            empty = false;
        }
        for method in node.methods() {
            if method.as_function().is_some_and(|f| f.is_constructor) {
                continue;
            }
            self.method(method, has_abstract);
            empty = false;
        }
        self.e.opaque_members(node);
        if empty {
            self.e.out.line("pass");
        }
        self.e.out.dedent();
        Ok(())
    }

    fn dataclass_field(&mut self, field: NodeRef<'a>) {
        let Some(decl) = field.as_field() else {
            return;
        };
        let name = self.e.names.member(&decl.name).map(str::to_string).unwrap_or_else(|| {
            self.e.naming.field(&decl.name, decl.visibility)
        });
        // Dataclass fields need their annotation even when annotations are off
        let ty = self.e.ty(&decl.ty, field.span());
        let default = match default_text(&mut self.e, field) {
            Some((value, trailing)) => format!(" = {}{}", value, trailing),
            None if decl.optional => " = None".to_string(),
            None => String::new(),
        };
        self.e.out.line(format!("{}: {}{}", name, ty, default));
    }

    fn method(&mut self, method: NodeRef<'a>, abstract_marker: bool) {
        let Some(decl) = method.as_function() else {
            return;
        };
        let name = self
            .e
            .names
            .member(&decl.name)
            .map(str::to_string)
            .unwrap_or_else(|| self.e.naming.function(&decl.name, decl.visibility));
        let receiver = (!decl.is_static).then_some("self");
        self.e.out.blank();
        self.function(method, &name, receiver, abstract_marker);
    }

    /// `__init__` from an explicit constructor; fields with defaults that
    /// the constructor leaves alone are initialised first
    fn init(&mut self, ctor: NodeRef<'a>, owner: NodeRef<'a>) {
        let Some(decl) = ctor.as_function() else {
            return;
        };
        let params = self.params(ctor, Some("self"));
        let returns = if self.annotations() { " -> None" } else { "" };
        self.e.out.open(format!("def __init__({}){}:", params.join(", "), returns));
        let raises = self.raises(ctor);
        self.docstring(decl.doc.as_deref(), &raises);

        let statements: Vec<NodeRef<'a>> = match ctor.body() {
            Some(body) if matches!(body.kind(), NodeKind::Block) => body.children().collect(),
            Some(body) => vec![body],
            None => Vec::new(),
        };
        let assigned: BTreeSet<&str> = statements.iter().filter_map(|s| self_assignment(*s)).map(|(f, _)| f).collect();

        let mut wrote = false;
        for statement in statements.iter().filter(|s| super_call(**s).is_some()) {
            let args = super_call(*statement).unwrap_or_default();
            let rendered: Vec<String> = args.iter().map(|a| self.e.expression(*a, None).0).collect();
            self.e.out.line(format!("super().__init__({})", rendered.join(", ")));
            wrote = true;
        }
        for field in instance_fields(owner) {
            let Some(f) = field.as_field() else {
                continue;
            };
            if assigned.contains(f.name.as_str()) {
                continue;
            }
            if let Some((value, trailing)) = default_text(&mut self.e, field) {
                let name = self
                    .e
                    .names
                    .member(&f.name)
                    .map(str::to_string)
                    .unwrap_or_else(|| self.e.naming.field(&f.name, f.visibility));
                let annotation = self.annotation(&f.ty, field);
                self.e.out.line(format!("self.{}{} = {}{}", name, annotation, value, trailing));
                wrote = true;
            }
        }
        for statement in statements.iter().filter(|s| super_call(**s).is_none()) {
            self.e.statements(*statement, None);
            wrote = true;
        }
        if !wrote {
            self.e.out.line("pass");
        }
        self.e.out.dedent();
    }

    fn protocol_decl(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        self.remember_type_vars(&decl.type_params);
        let name = self.type_name(&decl.name);
        let bases = self.bases(node, &["Protocol"]);
        self.e.out.open(format!("class {}{}:", name, bases));
        self.docstring(decl.doc.as_deref(), &[]);
        let mut empty = true;
        for field in node.fields() {
            let Some(f) = field.as_field() else {
                continue;
            };
            let field_name = self.e.naming.field(&f.name, f.visibility);
            let ty = self.e.ty(&f.ty, field.span());
            self.e.out.line(format!("{}: {}", field_name, ty));
            empty = false;
        }
        for method in node.methods() {
            self.method(method, false);
            empty = false;
        }
        self.e.opaque_members(node);
        if empty {
            self.e.out.line("...");
        }
        self.e.out.dedent();
        Ok(())
    }

    fn enum_decl(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        let name = self.type_name(&decl.name);
        self.e.out.open(format!("class {}(Enum):", name));
        self.docstring(decl.doc.as_deref(), &[]);
        for variant in &decl.variants {
            let variant = self.e.naming.variant(variant);
            self.e.out.line(format!("{} = auto()", variant));
        }
        if decl.variants.is_empty() {
            self.e.out.line("pass");
        }
        for method in node.methods() {
            self.method(method, false);
        }
        self.e.opaque_members(node);
        self.e.out.dedent();
        Ok(())
    }
}

impl<'a> Visitor<'a> for PythonEmitter<'a> {
    type Output = ();

    fn visit_type(&mut self, node: NodeRef<'a>) -> Result<()> {
        let Some(decl) = node.as_type() else {
            return Ok(());
        };
        match decl.kind {
            TypeKind::Enum => self.enum_decl(node),
            TypeKind::Interface if is_behavior(node) => self.protocol_decl(node),
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
        self.function(node, &name, None, false);
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
        let annotation = self.annotation(&field.ty, node);
        let (value, trailing) = default_text(&mut self.e, node).unwrap_or_else(|| ("None".to_string(), String::new()));
        self.e.doc(field.doc.as_deref());
        self.e.out.line(format!("{}{} = {}{}", name, annotation, value, trailing));
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

    fn convert_with(language: &str, source: &str, settings: Settings) -> Emission {
        let mapping = MappingTable::builtin();
        let frontend = TableFrontend::for_language(language, &mapping).expect("frontend");
        let ast = frontend.extract(source).ast;
        PythonBackend.emit(&ast, &settings, &mapping).expect("emission")
    }

    fn convert(language: &str, source: &str) -> Emission {
        convert_with(
            language,
            source,
            Settings {
                header: false,
                ..Settings::default()
            },
        )
    }

    #[test]
    fn test_function_signature() {
        let emission = convert("java", "class M {\n    static int add(int a, int b) {\n        return a + b;\n    }\n}\n");
        assert!(
            emission.text.contains("@staticmethod\n    def add(a: int, b: int) -> int:\n        return a + b\n"),
            "{}",
            emission.text
        );
    }

    #[test]
    fn test_record_becomes_dataclass() {
        let source = "\
interface Person {
    name: string;
    age?: number;
}
";
        let emission = convert("typescript", source);
        assert_eq!(
            emission.text,
            "from dataclasses import dataclass\nfrom typing import Optional\n\n\n@dataclass\nclass Person:\n    name: str\n    age: Optional[float] = None\n"
        );
    }

    #[test]
    fn test_constructor_and_private_fields() {
        let source = "\
public class Account {
    private String owner;
    private int balance = 0;

    public Account(String owner) {
        this.owner = owner;
    }

    public void deposit(int amount) throws IllegalArgumentException {
        this.balance += amount;
    }
}
";
        let emission = convert("java", source);
        let text = &emission.text;
        assert!(text.contains("class Account:\n    def __init__(self, owner: str) -> None:\n"), "{}", text);
        assert!(text.contains("        self._balance: int = 0\n        self._owner = owner\n"), "{}", text);
        assert!(text.contains("    def deposit(self, amount: int) -> None:\n        \"\"\"Raises:\n"), "{}", text);
        assert!(text.contains("self._balance = self._balance + amount"), "{}", text);
    }

    #[test]
    fn test_generics_declare_type_vars() {
        let source = "\
class Box<T> {
    T value;

    T get() {
        return this.value;
    }
}
";
        let emission = convert("java", source);
        let text = &emission.text;
        assert!(text.starts_with("from dataclasses import dataclass\nfrom typing import Generic, TypeVar\n\nT = TypeVar(\"T\")\n"), "{}", text);
        assert!(text.contains("class Box(Generic[T]):"), "{}", text);
    }

    #[test]
    fn test_interface_becomes_protocol_and_enum() {
        let source = "\
interface Shape {
    double area();
}

enum Color { RED, DARK_GREEN }
";
        let emission = convert("java", source);
        let text = &emission.text;
        assert!(text.contains("class Shape(Protocol):\n    def area(self) -> float:\n        ...\n"), "{}", text);
        assert!(text.contains("class Color(Enum):\n    RED = auto()\n    DARK_GREEN = auto()\n"), "{}", text);
        assert!(text.starts_with("from enum import Enum, auto\nfrom typing import Protocol\n"), "{}", text);
    }

    #[test]
    fn test_annotations_can_be_disabled() {
        let settings = Settings {
            header: false,
            type_annotations: false,
            ..Settings::default()
        };
        let emission = convert_with("typescript", "function add(a: number, b: number): number {\n    return a + b;\n}\n", settings);
        assert_eq!(emission.text, "def add(a, b):\n    return a + b\n");
    }

    #[test]
    fn test_banner_then_imports_then_two_blank_lines() {
        let emission = convert_with("typescript", "interface Point {\n    x: number;\n}\n", Settings::default());
        assert_eq!(
            emission.text,
            "# Code generated by polyport from typescript. DO NOT EDIT.\n\nfrom dataclasses import dataclass\n\n\n@dataclass\nclass Point:\n    x: float\n"
        );
    }
}
