//! Shared statement and expression rendering
//!
//! One visitor serves every target; what differs is data in the target's
//! [`BodyStyle`]. Statements render to indented lines, expressions to a
//! single line. An opaque expression renders as the target's placeholder
//! value and leaves an `OPAQUE` comment at the end of its statement; an
//! opaque statement becomes a marker comment of its own.

use super::{NamingPolicy, Names};
use crate::ast::{BinaryOp, Literal, NodeKind, NodeRef, UnaryOp, Visitor};
use crate::error::Result;
use crate::mapping::TargetTypeRules;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    /// `head {` ... `}`
    Braces,
    /// `head:` plus indentation
    Indented,
}

/// How a local declaration is spelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalStyle {
    /// `let mut x: T = v`, `const x: T = v`
    Keyword {
        mutable: &'static str,
        immutable: &'static str,
    },
    /// `x := v`, or `var x T = v` when typed
    Short,
    /// `var x = v`, or `T x = v` when typed
    LeadingType { immutable_prefix: &'static str },
    /// `x: T = v`
    Bare,
}

/// How a call of a well-known builtin is spelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintStyle {
    /// `println!("{} {}", a, b)`
    FormatMacro(&'static str),
    /// `print(a, b)`
    Variadic(&'static str),
    /// `System.out.println(a + " " + b)`
    Concatenated(&'static str),
}

/// Statement-level syntax of one target
#[derive(Debug, Clone)]
pub struct BodyStyle {
    /// Indent with tabs regardless of the configured width
    pub tabs: bool,
    pub blocks: BlockStyle,
    pub terminator: &'static str,
    /// Templates over `{cond}`, `{binding}` and `{iterable}`
    pub if_head: &'static str,
    pub else_if: &'static str,
    pub while_head: &'static str,
    pub for_head: &'static str,
    pub local: LocalStyle,
    /// Type annotation of a local, over `{ty}`
    pub annotation: &'static str,
    pub self_word: &'static str,
    pub null: &'static str,
    pub true_word: &'static str,
    pub false_word: &'static str,
    pub and: &'static str,
    pub or: &'static str,
    pub not: &'static str,
    /// Statement standing in for an empty body
    pub empty_block: Option<&'static str>,
    pub comment: &'static str,
    /// Expression standing in for opaque source text
    pub opaque_value: &'static str,
    /// Instantiation of a type declared in the file, over `{type}` and `{args}`
    pub construct: &'static str,
    pub print: PrintStyle,
    /// Length of a collection or string, over `{0}`
    pub length: &'static str,
    /// Characters escaped in string literals besides `\` and `"`
    pub escape_dollar: bool,
}

impl BodyStyle {
    fn braces() -> Self {
        Self {
            tabs: false,
            blocks: BlockStyle::Braces,
            terminator: ";",
            if_head: "if ({cond})",
            else_if: "else if",
            while_head: "while ({cond})",
            for_head: "for (const {binding} of {iterable})",
            local: LocalStyle::Keyword {
                mutable: "let",
                immutable: "const",
            },
            annotation: ": {ty}",
            self_word: "this",
            null: "null",
            true_word: "true",
            false_word: "false",
            and: "&&",
            or: "||",
            not: "!",
            empty_block: None,
            comment: "//",
            opaque_value: "null",
            construct: "new {type}({args})",
            print: PrintStyle::Variadic("console.log"),
            length: "{0}.length",
            escape_dollar: false,
        }
    }

    pub fn rust() -> Self {
        Self {
            if_head: "if {cond}",
            while_head: "while {cond}",
            for_head: "for {binding} in {iterable}",
            local: LocalStyle::Keyword {
                mutable: "let mut",
                immutable: "let",
            },
            self_word: "self",
            null: "None",
            opaque_value: "todo!()",
            construct: "{type}::new({args})",
            print: PrintStyle::FormatMacro("println!"),
            length: "{0}.len()",
            ..Self::braces()
        }
    }

    pub fn go() -> Self {
        Self {
            tabs: true,
            terminator: "",
            if_head: "if {cond}",
            while_head: "for {cond}",
            for_head: "for _, {binding} := range {iterable}",
            local: LocalStyle::Short,
            annotation: " {ty}",
            null: "nil",
            opaque_value: "nil",
            construct: "New{type}({args})",
            print: PrintStyle::Variadic("fmt.Println"),
            length: "len({0})",
            ..Self::braces()
        }
    }

    pub fn python() -> Self {
        Self {
            blocks: BlockStyle::Indented,
            terminator: "",
            if_head: "if {cond}",
            else_if: "elif",
            while_head: "while {cond}",
            for_head: "for {binding} in {iterable}",
            local: LocalStyle::Bare,
            self_word: "self",
            null: "None",
            true_word: "True",
            false_word: "False",
            and: "and",
            or: "or",
            not: "not ",
            empty_block: Some("pass"),
            comment: "#",
            opaque_value: "None",
            construct: "{type}({args})",
            print: PrintStyle::Variadic("print"),
            length: "len({0})",
            ..Self::braces()
        }
    }

    pub fn typescript() -> Self {
        Self::braces()
    }

    pub fn java() -> Self {
        Self {
            for_head: "for (var {binding} : {iterable})",
            local: LocalStyle::LeadingType {
                immutable_prefix: "final ",
            },
            print: PrintStyle::Concatenated("System.out.println"),
            length: "{0}.size()",
            ..Self::braces()
        }
    }

    pub fn kotlin() -> Self {
        Self {
            terminator: "",
            for_head: "for ({binding} in {iterable})",
            local: LocalStyle::Keyword {
                mutable: "var",
                immutable: "val",
            },
            opaque_value: "TODO()",
            construct: "{type}({args})",
            print: PrintStyle::Concatenated("println"),
            length: "{0}.size",
            escape_dollar: true,
            ..Self::braces()
        }
    }
}

/// Rewriting of `return` in functions whose failures travel in the value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnShape {
    /// Over `{0}`, the returned expression
    pub value: &'static str,
    /// Statement text of a bare `return`
    pub bare: &'static str,
}

/// Source spellings of printing
const PRINT_CALLS: &[&str] = &[
    "print",
    "println",
    "console.log",
    "fmt.Println",
    "System.out.println",
    "Console.WriteLine",
];

fn fill(template: &str, pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .fold(template.to_string(), |text, (key, value)| text.replace(&format!("{{{}}}", key), value))
}

/// Dotted path of a callee made of identifiers only
fn callee_path(node: NodeRef<'_>) -> Option<String> {
    match node.kind() {
        NodeKind::Identifier { name } => Some(name.clone()),
        NodeKind::FieldAccess { field } => {
            let object = node.child(0)?;
            Some(format!("{}.{}", callee_path(object)?, field))
        }
        _ => None,
    }
}

/// Renders statement bodies and expressions for one target
pub struct BodyRenderer<'a> {
    style: &'a BodyStyle,
    types: &'a TargetTypeRules,
    naming: &'a NamingPolicy,
    names: &'a Names,
    unit: &'a str,
    receiver: Option<&'a str>,
    annotations: bool,
    returns: Option<ReturnShape>,
    level: usize,
    /// Names assigned again after their declaration
    reassigned: BTreeSet<String>,
    trailing: Vec<String>,
    unmapped: Vec<String>,
    opaque: usize,
    /// Receiver fields are reached through `getX()`/`setX(..)`
    field_getters: bool,
}

impl<'a> BodyRenderer<'a> {
    pub(crate) fn new(
        style: &'a BodyStyle,
        types: &'a TargetTypeRules,
        naming: &'a NamingPolicy,
        names: &'a Names,
        unit: &'a str,
        receiver: Option<&'a str>,
        annotations: bool,
    ) -> Self {
        Self {
            style,
            types,
            naming,
            names,
            unit,
            receiver,
            annotations,
            returns: None,
            level: 0,
            reassigned: BTreeSet::new(),
            trailing: Vec::new(),
            unmapped: Vec::new(),
            opaque: 0,
            field_getters: false,
        }
    }

    pub fn with_returns(mut self, returns: Option<ReturnShape>) -> Self {
        self.returns = returns;
        self
    }

    pub fn with_field_getters(mut self, field_getters: bool) -> Self {
        self.field_getters = field_getters;
        self
    }

    /// Accessor suffix for a receiver field when fields go through accessors
    fn accessor_of(&self, node: NodeRef<'_>) -> Option<String> {
        let NodeKind::FieldAccess { field } = node.kind() else {
            return None;
        };
        let on_receiver = node.child(0).is_some_and(|o| matches!(o.kind(), NodeKind::SelfRef));
        (self.field_getters && on_receiver).then(|| super::capitalized(&self.member(field, false)))
    }

    /// Statements of `block`, indented at `level`
    pub fn block_lines<'n>(&mut self, block: NodeRef<'n>, level: usize) -> String {
        self.level = level;
        self.reassigned.clear();
        collect_reassigned(block, &mut self.reassigned);
        let statements: Vec<NodeRef<'n>> = match block.kind() {
            NodeKind::Block => block.children().collect(),
            _ => vec![block],
        };
        let mut out = String::new();
        for statement in statements {
            out.push_str(&self.statement(statement));
        }
        out
    }

    /// Types that had no rule, and the number of opaque statements
    pub fn finish(self) -> (Vec<String>, usize) {
        (self.unmapped, self.opaque)
    }

    /// Comment for the opaque expressions rendered since the last call
    pub fn trailing_marker(&mut self) -> String {
        if self.trailing.is_empty() {
            return String::new();
        }
        let texts = std::mem::take(&mut self.trailing);
        format!("  {} OPAQUE: {}", self.style.comment, texts.join("; "))
    }

    fn prefix(&self) -> String {
        self.unit.repeat(self.level)
    }

    fn line(&mut self, text: &str) -> String {
        let marker = self.trailing_marker();
        format!("{}{}{}\n", self.prefix(), text, marker)
    }

    /// One statement as indented lines
    pub fn statement<'n>(&mut self, node: NodeRef<'n>) -> String {
        if let Some(text) = node.opaque_text() {
            return self.opaque_statement(text);
        }
        if node.kind().is_expression() {
            let text = self.expr(node);
            let terminator = self.style.terminator;
            return self.line(&format!("{}{}", text, terminator));
        }
        match node.accept(self) {
            Ok(text) => text,
            Err(_) => self.opaque_statement(node.kind().name()),
        }
    }

    fn opaque_statement(&mut self, text: &str) -> String {
        self.opaque += 1;
        let prefix = self.prefix();
        let mut lines = text.lines();
        let mut out = format!(
            "{}{} OPAQUE: {}\n",
            prefix,
            self.style.comment,
            lines.next().unwrap_or_default().trim_end()
        );
        for line in lines {
            out.push_str(&format!("{}{} {}\n", prefix, self.style.comment, line.trim_end()));
        }
        out
    }

    /// One expression on a single line
    pub fn expr<'n>(&mut self, node: NodeRef<'n>) -> String {
        if !node.kind().is_expression() && !node.is_opaque() {
            self.trailing.push(node.kind().name().to_string());
            return self.style.opaque_value.to_string();
        }
        match node.accept(self) {
            Ok(text) => text,
            Err(_) => self.style.opaque_value.to_string(),
        }
    }

    fn ty(&mut self, ty: &crate::types::TypeRef) -> String {
        self.types.render(ty, &mut self.unmapped)
    }

    /// `head {` + body + `}` or `head:` + indented body
    fn nested<'n>(&mut self, head: &str, body: Option<NodeRef<'n>>) -> String {
        let mut out = match self.style.blocks {
            BlockStyle::Braces => self.line(&format!("{} {{", head)),
            BlockStyle::Indented => self.line(&format!("{}:", head)),
        };
        out.push_str(&self.inner(body));
        if self.style.blocks == BlockStyle::Braces {
            out.push_str(&format!("{}}}\n", self.prefix()));
        }
        out
    }

    fn inner<'n>(&mut self, body: Option<NodeRef<'n>>) -> String {
        self.level += 1;
        let mut out = String::new();
        if let Some(body) = body {
            let statements: Vec<NodeRef<'n>> = match body.kind() {
                NodeKind::Block => body.children().collect(),
                _ => vec![body],
            };
            for statement in statements {
                out.push_str(&self.statement(statement));
            }
        }
        if out.is_empty() {
            if let Some(empty) = self.style.empty_block {
                out = format!("{}{}\n", self.prefix(), empty);
            }
        }
        self.level -= 1;
        out
    }

    fn condition<'n>(&mut self, node: Option<NodeRef<'n>>) -> String {
        match node {
            Some(node) => self.expr(node),
            None => self.style.false_word.to_string(),
        }
    }

    fn operand<'n>(&mut self, node: NodeRef<'n>, parent: BinaryOp, right: bool) -> String {
        let text = self.expr(node);
        match node.kind() {
            NodeKind::Binary { op }
                if op.precedence() < parent.precedence() || (right && op.precedence() == parent.precedence()) =>
            {
                format!("({})", text)
            }
            _ => text,
        }
    }

    fn string_literal(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 2);
        out.push('"');
        for ch in text.chars() {
            match ch {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                '\r' => out.push_str("\\r"),
                '$' if self.style.escape_dollar => out.push_str("\\$"),
                _ => out.push(ch),
            }
        }
        out.push('"');
        out
    }

    fn identifier(&self, name: &str) -> String {
        if let Some(rendered) = self
            .names
            .types
            .get(name)
            .or_else(|| self.names.functions.get(name))
            .or_else(|| self.names.globals.get(name))
        {
            return rendered.clone();
        }
        self.naming.variable(name)
    }

    fn member(&self, name: &str, call: bool) -> String {
        if let Some(rendered) = self.names.member(name) {
            return rendered.to_string();
        }
        let case = if call {
            self.naming.conventions.functions
        } else {
            self.naming.conventions.fields
        };
        crate::naming::recase(name, case)
    }

    fn print<'n>(&mut self, args: &[NodeRef<'n>]) -> String {
        let rendered: Vec<String> = args.iter().map(|a| self.expr(*a)).collect();
        match self.style.print {
            PrintStyle::FormatMacro(name) => {
                let holes = vec!["{}"; rendered.len()].join(" ");
                if rendered.is_empty() {
                    format!("{}()", name)
                } else {
                    format!("{}(\"{}\", {})", name, holes, rendered.join(", "))
                }
            }
            PrintStyle::Variadic(name) => format!("{}({})", name, rendered.join(", ")),
            PrintStyle::Concatenated(name) => match rendered.len() {
                0 | 1 => format!("{}({})", name, rendered.join("")),
                _ => format!("{}(\"\" + {})", name, rendered.join(" + \" \" + ")),
            },
        }
    }

    /// `len(x)`, `x.len()`, `x.length`, `x.size()` in any source spelling
    fn length_of<'n>(&self, node: NodeRef<'n>) -> Option<NodeRef<'n>> {
        match node.kind() {
            NodeKind::Call => {
                let callee = node.child(0)?;
                match callee.kind() {
                    NodeKind::Identifier { name } if name == "len" && node.child_count() == 2 => node.child(1),
                    NodeKind::FieldAccess { field }
                        if matches!(field.as_str(), "len" | "size") && node.child_count() == 1 =>
                    {
                        callee.child(0)
                    }
                    _ => None,
                }
            }
            NodeKind::FieldAccess { field } if matches!(field.as_str(), "length" | "Count" | "Length") => node.child(0),
            _ => None,
        }
    }
}

pub(crate) fn collect_reassigned(node: NodeRef<'_>, out: &mut BTreeSet<String>) {
    for child in node.children() {
        if let NodeKind::Assign { declares: false, .. } = child.kind() {
            if let Some(NodeKind::Identifier { name }) = child.child(0).map(|t| t.kind()) {
                out.insert(name.clone());
            }
        }
        collect_reassigned(child, out);
    }
}

impl<'a, 'n> Visitor<'n> for BodyRenderer<'a> {
    type Output = String;

    fn visit_block(&mut self, node: NodeRef<'n>) -> Result<String> {
        match self.style.blocks {
            BlockStyle::Braces => {
                let mut out = format!("{}{{\n", self.prefix());
                out.push_str(&self.inner(Some(node)));
                out.push_str(&format!("{}}}\n", self.prefix()));
                Ok(out)
            }
            BlockStyle::Indented => {
                let mut out = String::new();
                for statement in node.children() {
                    out.push_str(&self.statement(statement));
                }
                Ok(out)
            }
        }
    }

    fn visit_if(&mut self, node: NodeRef<'n>) -> Result<String> {
        let mut out = String::new();
        let mut branch = Some(node);
        let mut first = true;

        while let Some(current) = branch {
            let (head, body, next) = if matches!(current.kind(), NodeKind::If) {
                let condition = self.condition(current.child(0));
                let head = fill(self.style.if_head, &[("cond", &condition)]);
                let head = if first {
                    head
                } else {
                    format!("{} {}", self.style.else_if, head.strip_prefix("if ").unwrap_or(&head))
                };
                (head, current.child(1), current.child(2))
            } else {
                ("else".to_string(), Some(current), None)
            };
            let part = self.nested(&head, body);
            if !first && self.style.blocks == BlockStyle::Braces {
                // `} else {` on the closing line of the previous branch
                let open = out.trim_end().len().saturating_sub(1);
                out.truncate(open);
                out.push_str("} ");
                out.push_str(part.trim_start());
            } else {
                out.push_str(&part);
            }
            first = false;
            branch = next;
        }
        Ok(out)
    }

    fn visit_while(&mut self, node: NodeRef<'n>) -> Result<String> {
        let condition = self.condition(node.child(0));
        let head = fill(self.style.while_head, &[("cond", &condition)]);
        Ok(self.nested(&head, node.child(1)))
    }

    fn visit_for(&mut self, node: NodeRef<'n>) -> Result<String> {
        let NodeKind::For { binding } = node.kind() else {
            return Ok(String::new());
        };
        let binding = self.naming.variable(binding);
        let iterable = match node.child(0) {
            Some(iterable) => self.expr(iterable),
            None => self.style.opaque_value.to_string(),
        };
        let head = fill(self.style.for_head, &[("binding", &binding), ("iterable", &iterable)]);
        Ok(self.nested(&head, node.child(1)))
    }

    fn visit_return(&mut self, node: NodeRef<'n>) -> Result<String> {
        let terminator = self.style.terminator;
        let text = match (node.child(0), self.returns) {
            (Some(value), Some(shape)) => {
                let value = self.expr(value);
                format!("return {}{}", fill(shape.value, &[("0", &value)]), terminator)
            }
            (Some(value), None) => format!("return {}{}", self.expr(value), terminator),
            (None, Some(shape)) => format!("return {}{}", shape.bare, terminator),
            (None, None) => format!("return{}", terminator),
        };
        Ok(self.line(&text))
    }

    fn visit_assign(&mut self, node: NodeRef<'n>) -> Result<String> {
        let NodeKind::Assign { declares, mutable, ty } = node.kind() else {
            return Ok(String::new());
        };
        let target = node.child(0);
        let value = node.child(1).map(|v| self.expr(v));
        let terminator = self.style.terminator;

        if !declares {
            let value = value.unwrap_or_else(|| self.style.null.to_string());
            if let Some(accessor) = target.and_then(|t| self.accessor_of(t)) {
                let text = format!("{}.set{}({}){}", self.style.self_word, accessor, value, terminator);
                return Ok(self.line(&text));
            }
            let target = target.map(|t| self.expr(t)).unwrap_or_default();
            return Ok(self.line(&format!("{} = {}{}", target, value, terminator)));
        }

        let source_name = match target.map(|t| t.kind()) {
            Some(NodeKind::Identifier { name }) => name.clone(),
            _ => String::new(),
        };
        let name = self.naming.variable(&source_name);
        let mutable = *mutable && self.reassigned.contains(&source_name);
        // Untyped declarations without a value still need their type
        let annotated = match ty {
            Some(ty) if self.annotations || value.is_none() => Some(self.ty(ty)),
            _ => None,
        };
        let annotated = annotated.as_ref();
        let assigned = value.as_ref().map(|v| format!(" = {}", v)).unwrap_or_default();

        let text = match self.style.local {
            LocalStyle::Keyword { mutable: m, immutable } => {
                let keyword = if mutable { m } else { immutable };
                let annotation = annotated
                    .map(|t| fill(self.style.annotation, &[("ty", t)]))
                    .unwrap_or_default();
                format!("{} {}{}{}{}", keyword, name, annotation, assigned, terminator)
            }
            LocalStyle::Short => match (annotated, &value) {
                (None, Some(value)) => format!("{} := {}", name, value),
                (Some(t), _) => format!("var {} {}{}", name, t, assigned),
                (None, None) => format!("var {} interface{{}}", name),
            },
            LocalStyle::LeadingType { immutable_prefix } => {
                let prefix = if mutable { "" } else { immutable_prefix };
                let leading = annotated.cloned().unwrap_or_else(|| "var".to_string());
                format!("{}{} {}{}{}", prefix, leading, name, assigned, terminator)
            }
            LocalStyle::Bare => {
                let annotation = annotated
                    .map(|t| fill(self.style.annotation, &[("ty", t)]))
                    .unwrap_or_default();
                let assigned = if assigned.is_empty() && annotation.is_empty() {
                    format!(" = {}", self.style.null)
                } else {
                    assigned
                };
                format!("{}{}{}", name, annotation, assigned)
            }
        };
        Ok(self.line(&text))
    }

    fn visit_binary(&mut self, node: NodeRef<'n>) -> Result<String> {
        let NodeKind::Binary { op } = node.kind() else {
            return Ok(String::new());
        };
        let (Some(left), Some(right)) = (node.child(0), node.child(1)) else {
            return Ok(self.style.opaque_value.to_string());
        };
        let left = self.operand(left, *op, false);
        let right = self.operand(right, *op, true);
        let symbol = match op {
            BinaryOp::And => self.style.and,
            BinaryOp::Or => self.style.or,
            other => other.symbol(),
        };
        Ok(format!("{} {} {}", left, symbol, right))
    }

    fn visit_unary(&mut self, node: NodeRef<'n>) -> Result<String> {
        let NodeKind::Unary { op } = node.kind() else {
            return Ok(String::new());
        };
        let Some(operand) = node.child(0) else {
            return Ok(self.style.opaque_value.to_string());
        };
        let text = self.expr(operand);
        let text = if matches!(operand.kind(), NodeKind::Binary { .. }) {
            format!("({})", text)
        } else {
            text
        };
        Ok(match op {
            UnaryOp::Neg => format!("-{}", text),
            UnaryOp::Not => format!("{}{}", self.style.not, text),
        })
    }

    fn visit_call(&mut self, node: NodeRef<'n>) -> Result<String> {
        if let Some(subject) = self.length_of(node) {
            let subject = self.expr(subject);
            return Ok(fill(self.style.length, &[("0", &subject)]));
        }
        let children: Vec<NodeRef<'n>> = node.children().collect();
        let Some((callee, args)) = children.split_first() else {
            return Ok(self.style.opaque_value.to_string());
        };

        let path = callee_path(*callee);
        if path.as_deref().is_some_and(|p| PRINT_CALLS.contains(&p)) {
            return Ok(self.print(args));
        }

        // `T(...)`, `new T(...)` and `T::new(...)` of a type in this file
        let constructed = match callee.kind() {
            NodeKind::Identifier { name } => self.names.types.get(name),
            NodeKind::FieldAccess { field } if field == "new" => match callee.child(0).map(|o| o.kind()) {
                Some(NodeKind::Identifier { name }) => self.names.types.get(name),
                _ => None,
            },
            _ => None,
        };
        let rendered: Vec<String> = args.iter().map(|a| self.expr(*a)).collect();
        if let Some(type_name) = constructed {
            return Ok(fill(self.style.construct, &[("type", type_name), ("args", &rendered.join(", "))]));
        }

        let callee = match callee.kind() {
            NodeKind::FieldAccess { field } => {
                let object = match callee.child(0) {
                    Some(object) => self.expr(object),
                    None => self.style.opaque_value.to_string(),
                };
                format!("{}.{}", object, self.member(field, true))
            }
            NodeKind::Identifier { name } => self.identifier(name),
            _ => self.expr(*callee),
        };
        Ok(format!("{}({})", callee, rendered.join(", ")))
    }

    fn visit_field_access(&mut self, node: NodeRef<'n>) -> Result<String> {
        if let Some(subject) = self.length_of(node) {
            let subject = self.expr(subject);
            return Ok(fill(self.style.length, &[("0", &subject)]));
        }
        let NodeKind::FieldAccess { field } = node.kind() else {
            return Ok(String::new());
        };
        let object = match node.child(0) {
            Some(object) => self.expr(object),
            None => self.style.opaque_value.to_string(),
        };
        if let Some(accessor) = self.accessor_of(node) {
            return Ok(format!("{}.get{}()", object, accessor));
        }
        Ok(format!("{}.{}", object, self.member(field, false)))
    }

    fn visit_literal(&mut self, node: NodeRef<'n>) -> Result<String> {
        let NodeKind::Literal { value } = node.kind() else {
            return Ok(String::new());
        };
        Ok(match value {
            Literal::Int(n) => n.to_string(),
            Literal::Float(text) => text.clone(),
            Literal::Str(text) => self.string_literal(text),
            Literal::Bool(true) => self.style.true_word.to_string(),
            Literal::Bool(false) => self.style.false_word.to_string(),
            Literal::Null => self.style.null.to_string(),
        })
    }

    fn visit_identifier(&mut self, node: NodeRef<'n>) -> Result<String> {
        match node.kind() {
            NodeKind::Identifier { name } => Ok(self.identifier(name)),
            _ => Ok(String::new()),
        }
    }

    fn visit_self(&mut self, _node: NodeRef<'n>) -> Result<String> {
        Ok(self.receiver.unwrap_or(self.style.self_word).to_string())
    }

    fn visit_opaque(&mut self, node: NodeRef<'n>) -> Result<String> {
        let text = node.opaque_text().unwrap_or_default();
        self.trailing.push(text.split_whitespace().collect::<Vec<_>>().join(" "));
        Ok(self.style.opaque_value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Ast, Visibility};
    use crate::frontend::{Frontend, TableFrontend};
    use crate::mapping::MappingTable;

    fn extract(language: &str, source: &str) -> Ast {
        let mapping = MappingTable::builtin();
        let frontend = TableFrontend::for_language(language, &mapping).expect("frontend");
        frontend.extract(source).ast
    }

    fn render(ast: &Ast, target: &str, style: &BodyStyle) -> String {
        let mapping = MappingTable::builtin();
        let profile = mapping.target(target).expect("target");
        let naming = NamingPolicy::new(&profile.capabilities, &[]);
        let names = Names::collect(ast, &naming, |node| {
            node.as_field().map(|f| f.visibility).unwrap_or(Visibility::Private)
        });
        let function = ast.declarations().next().expect("function");
        let body = function.body().expect("body");
        let mut renderer = BodyRenderer::new(style, &profile.types, &naming, &names, "    ", None, true);
        renderer.block_lines(body, 0)
    }

    const LOOP: &str = "\
def tally(items, limit):
    count = 0
    for item in items:
        if item > limit:
            count += 1
        elif item == 0:
            print(\"zero\")
        else:
            count = count - 1
    return count
";

    #[test]
    fn test_python_loop_in_rust_style() {
        let ast = extract("python", LOOP);
        let text = render(&ast, "rust", &BodyStyle::rust());
        assert!(text.contains("let mut count = 0;"), "{}", text);
        assert!(text.contains("for item in items {"), "{}", text);
        assert!(text.contains("    if item > limit {"), "{}", text);
        assert!(text.contains("count = count + 1;"), "{}", text);
        assert!(text.contains("} else if item == 0 {"), "{}", text);
        assert!(text.contains("println!(\"{}\", \"zero\");"), "{}", text);
        assert!(text.contains("} else {"), "{}", text);
        assert!(text.trim_end().ends_with("return count;"), "{}", text);
    }

    #[test]
    fn test_python_loop_in_go_style() {
        let ast = extract("python", LOOP);
        let text = render(&ast, "go", &BodyStyle::go());
        assert!(text.contains("count := 0\n"), "{}", text);
        assert!(text.contains("for _, item := range items {"), "{}", text);
        assert!(text.contains("fmt.Println(\"zero\")"), "{}", text);
    }

    #[test]
    fn test_java_body_in_python_style() {
        let source = "\
class Counter {
    static int clamp(int value, boolean strict) {
        if (strict && value < 0) {
            return 0;
        }
        return value;
    }
}
";
        let ast = extract("java", source);
        let mapping = MappingTable::builtin();
        let profile = mapping.target("python").expect("target");
        let naming = NamingPolicy::new(&profile.capabilities, &[]);
        let names = Names::default();
        let method = ast
            .declarations()
            .next()
            .and_then(|t| t.methods().next())
            .expect("method");
        let style = BodyStyle::python();
        let mut renderer = BodyRenderer::new(&style, &profile.types, &naming, &names, "    ", None, true);
        let text = renderer.block_lines(method.body().expect("body"), 1);
        assert_eq!(text, "    if strict and value < 0:\n        return 0\n    return value\n");
    }

    #[test]
    fn test_return_shape_wraps_values() {
        let ast = extract("python", "def f(x):\n    return x\n");
        let mapping = MappingTable::builtin();
        let profile = mapping.target("rust").expect("target");
        let naming = NamingPolicy::new(&profile.capabilities, &[]);
        let names = Names::default();
        let style = BodyStyle::rust();
        let body = ast.declarations().next().and_then(|f| f.body()).expect("body");
        let mut renderer = BodyRenderer::new(&style, &profile.types, &naming, &names, "    ", None, true)
            .with_returns(Some(ReturnShape {
                value: "Ok({0})",
                bare: "Ok(())",
            }));
        assert_eq!(renderer.block_lines(body, 0), "return Ok(x);\n");
    }

    #[test]
    fn test_opaque_statement_becomes_marker() {
        let ast = extract("python", "def f():\n    with open(path) as handle:\n        pass\n    return 1\n");
        let text = render(&ast, "typescript", &BodyStyle::typescript());
        assert!(text.contains("// OPAQUE:"), "{}", text);
        assert!(text.contains("return 1;"), "{}", text);
    }

    #[test]
    fn test_kotlin_strings_escape_dollar() {
        let ast = extract("python", "def f():\n    return \"cost: $5\"\n");
        let text = render(&ast, "kotlin", &BodyStyle::kotlin());
        assert_eq!(text, "return \"cost: \\$5\"\n");
    }
}
