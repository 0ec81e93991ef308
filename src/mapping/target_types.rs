//! Target-side type rules: how each canonical category is spelled
//!
//! Templates use `{0}`, `{1}`… for positional arguments, `{args}` for all
//! arguments joined, `{params}` / `{named_params}` for callable parameters and
//! `{ret}` for a callable's return type. Unknown placeholders are copied
//! through, so `interface{}` survives templating.

use crate::types::{TypeCategory, TypeRef};
use std::collections::BTreeMap;

/// A rendering rule for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Template(&'static str),
    /// Indexed by argument count; an empty entry means no rule
    ByArity(&'static [&'static str]),
}

impl Rule {
    fn pick(&self, arity: usize) -> Option<&'static str> {
        match self {
            Rule::Template(template) => Some(template),
            Rule::ByArity(templates) => templates.get(arity).copied().filter(|t| !t.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallableRule {
    pub returning: Rule,
    /// Shape used when the return type is void; falls back to `returning`
    pub void: Option<Rule>,
}

#[derive(Debug, Clone)]
pub struct TargetTypeRules {
    pub primitives: BTreeMap<&'static str, &'static str>,
    /// Spelling of a primitive used as a generic argument
    pub boxed: BTreeMap<&'static str, &'static str>,
    pub list: Option<Rule>,
    pub set: Option<Rule>,
    pub map: Option<Rule>,
    pub tuple: Option<Rule>,
    pub optional: Option<Rule>,
    pub union: Option<Rule>,
    pub union_separator: &'static str,
    pub callable: Option<CallableRule>,
    pub dynamic: &'static str,
    pub generic_open: &'static str,
    pub generic_close: &'static str,
    /// Placeholders carry an inline `/* UNMAPPED */` comment
    pub inline_marker: bool,
    /// Parenthesize compound element types (`(A | B)[]`)
    pub wrap_compound: bool,
}

/// Substitute template placeholders in one pass
fn fill(template: &str, positional: &[String], joined: &str, named: &str, ret: &str) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let key = &after[..close];
        let replacement = match key {
            "args" | "params" => Some(joined.to_string()),
            "named_params" => Some(named.to_string()),
            "ret" => Some(ret.to_string()),
            _ => key.parse::<usize>().ok().and_then(|i| positional.get(i).cloned()),
        };
        match replacement {
            Some(text) => out.push_str(&text),
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

impl TargetTypeRules {
    /// Render a canonical type; canonical text of every construct that fell
    /// back to a placeholder is appended to `unmapped`
    pub fn render(&self, ty: &TypeRef, unmapped: &mut Vec<String>) -> String {
        self.render_at(ty, false, unmapped)
    }

    /// Render a type in generic-argument position
    pub fn render_arg(&self, ty: &TypeRef, unmapped: &mut Vec<String>) -> String {
        self.render_at(ty, true, unmapped)
    }

    fn placeholder(&self, ty: &TypeRef, unmapped: &mut Vec<String>) -> String {
        let canonical = ty.to_string();
        log::warn!("no type rule for {}", canonical);
        let text = if self.inline_marker {
            format!("{} /* UNMAPPED: {} */", self.dynamic, canonical)
        } else {
            self.dynamic.to_string()
        };
        unmapped.push(canonical);
        text
    }

    fn render_at(&self, ty: &TypeRef, as_arg: bool, unmapped: &mut Vec<String>) -> String {
        match ty.category {
            TypeCategory::Primitive => {
                let name = ty.base_name.as_str();
                let boxed = if as_arg { self.boxed.get(name) } else { None };
                match boxed.or_else(|| self.primitives.get(name)) {
                    Some(spelling) => spelling.to_string(),
                    None => self.placeholder(ty, unmapped),
                }
            }
            TypeCategory::Dynamic => self.dynamic.to_string(),
            TypeCategory::Custom => {
                if ty.args.is_empty() {
                    return ty.base_name.clone();
                }
                let args: Vec<String> = ty.args.iter().map(|a| self.render_arg(a, unmapped)).collect();
                format!(
                    "{}{}{}{}",
                    ty.base_name,
                    self.generic_open,
                    args.join(", "),
                    self.generic_close
                )
            }
            TypeCategory::Collection => {
                let rule = match ty.base_name.as_str() {
                    "list" => self.list,
                    "set" => self.set,
                    "map" => self.map,
                    "tuple" => self.tuple,
                    _ => None,
                };
                self.apply(rule, ty, unmapped)
            }
            TypeCategory::Optional => {
                let text = self.apply(self.optional, ty, unmapped);
                // `T??` is never meaningful
                match text.strip_suffix("??") {
                    Some(single) => format!("{}?", single),
                    None => text,
                }
            }
            TypeCategory::Union => {
                let Some(template) = self.union.and_then(|r| r.pick(ty.args.len())) else {
                    return self.placeholder(ty, unmapped);
                };
                let args: Vec<String> = ty.args.iter().map(|a| self.render_arg(a, unmapped)).collect();
                fill(template, &args, &args.join(self.union_separator), "", "")
            }
            TypeCategory::Callable => self.render_callable(ty, unmapped),
        }
    }

    fn apply(&self, rule: Option<Rule>, ty: &TypeRef, unmapped: &mut Vec<String>) -> String {
        let Some(template) = rule.and_then(|r| r.pick(ty.args.len())) else {
            return self.placeholder(ty, unmapped);
        };
        let args: Vec<String> = ty
            .args
            .iter()
            .map(|a| {
                let text = self.render_arg(a, unmapped);
                if self.wrap_compound && (text.contains(" | ") || text.contains("=>")) {
                    format!("({})", text)
                } else {
                    text
                }
            })
            .collect();
        fill(template, &args, &args.join(", "), "", "")
    }

    fn render_callable(&self, ty: &TypeRef, unmapped: &mut Vec<String>) -> String {
        let (Some(rule), Some((params, ret))) = (self.callable, ty.callable_parts()) else {
            return self.placeholder(ty, unmapped);
        };
        let chosen = if ret.is_void() {
            rule.void.unwrap_or(rule.returning)
        } else {
            rule.returning
        };
        let Some(template) = chosen.pick(params.len()) else {
            return self.placeholder(ty, unmapped);
        };

        let rendered: Vec<String> = params.iter().map(|p| self.render_arg(p, unmapped)).collect();
        let named: Vec<String> = rendered
            .iter()
            .enumerate()
            .map(|(i, p)| format!("arg{}: {}", i, p))
            .collect();
        let ret_text = self.render_arg(ret, unmapped);
        fill(template, &rendered, &rendered.join(", "), &named.join(", "), &ret_text)
    }

    pub fn rust() -> Self {
        Self {
            primitives: BTreeMap::from([
                ("bool", "bool"),
                ("char", "char"),
                ("int8", "i8"),
                ("int16", "i16"),
                ("int32", "i32"),
                ("int64", "i64"),
                ("uint8", "u8"),
                ("uint16", "u16"),
                ("uint32", "u32"),
                ("uint64", "u64"),
                ("float32", "f32"),
                ("float64", "f64"),
                ("string", "String"),
                ("void", "()"),
            ]),
            boxed: BTreeMap::new(),
            list: Some(Rule::Template("Vec<{0}>")),
            set: Some(Rule::Template("HashSet<{0}>")),
            map: Some(Rule::Template("HashMap<{0}, {1}>")),
            tuple: Some(Rule::Template("({args})")),
            optional: Some(Rule::Template("Option<{0}>")),
            union: None,
            union_separator: ", ",
            callable: Some(CallableRule {
                returning: Rule::Template("Box<dyn Fn({params}) -> {ret}>"),
                void: Some(Rule::Template("Box<dyn Fn({params})>")),
            }),
            dynamic: "Box<dyn std::any::Any>",
            generic_open: "<",
            generic_close: ">",
            inline_marker: true,
            wrap_compound: false,
        }
    }

    pub fn go() -> Self {
        Self {
            primitives: BTreeMap::from([
                ("bool", "bool"),
                ("char", "rune"),
                ("int8", "int8"),
                ("int16", "int16"),
                ("int32", "int32"),
                ("int64", "int64"),
                ("uint8", "uint8"),
                ("uint16", "uint16"),
                ("uint32", "uint32"),
                ("uint64", "uint64"),
                ("float32", "float32"),
                ("float64", "float64"),
                ("string", "string"),
                ("void", "struct{}"),
            ]),
            boxed: BTreeMap::new(),
            list: Some(Rule::Template("[]{0}")),
            set: Some(Rule::Template("map[{0}]struct{}")),
            map: Some(Rule::Template("map[{0}]{1}")),
            tuple: None,
            optional: Some(Rule::Template("*{0}")),
            union: None,
            union_separator: ", ",
            callable: Some(CallableRule {
                returning: Rule::Template("func({params}) {ret}"),
                void: Some(Rule::Template("func({params})")),
            }),
            dynamic: "interface{}",
            generic_open: "[",
            generic_close: "]",
            inline_marker: true,
            wrap_compound: false,
        }
    }

    pub fn python() -> Self {
        Self {
            primitives: BTreeMap::from([
                ("bool", "bool"),
                ("char", "str"),
                ("int8", "int"),
                ("int16", "int"),
                ("int32", "int"),
                ("int64", "int"),
                ("uint8", "int"),
                ("uint16", "int"),
                ("uint32", "int"),
                ("uint64", "int"),
                ("float32", "float"),
                ("float64", "float"),
                ("string", "str"),
                ("void", "None"),
            ]),
            boxed: BTreeMap::new(),
            list: Some(Rule::Template("List[{0}]")),
            set: Some(Rule::Template("Set[{0}]")),
            map: Some(Rule::Template("Dict[{0}, {1}]")),
            tuple: Some(Rule::Template("Tuple[{args}]")),
            optional: Some(Rule::Template("Optional[{0}]")),
            union: Some(Rule::Template("Union[{args}]")),
            union_separator: ", ",
            callable: Some(CallableRule {
                returning: Rule::Template("Callable[[{params}], {ret}]"),
                void: None,
            }),
            dynamic: "Any",
            generic_open: "[",
            generic_close: "]",
            inline_marker: false,
            wrap_compound: false,
        }
    }

    pub fn typescript() -> Self {
        Self {
            primitives: BTreeMap::from([
                ("bool", "boolean"),
                ("char", "string"),
                ("int8", "number"),
                ("int16", "number"),
                ("int32", "number"),
                ("int64", "number"),
                ("uint8", "number"),
                ("uint16", "number"),
                ("uint32", "number"),
                ("uint64", "number"),
                ("float32", "number"),
                ("float64", "number"),
                ("string", "string"),
                ("void", "void"),
            ]),
            boxed: BTreeMap::new(),
            list: Some(Rule::Template("{0}[]")),
            set: Some(Rule::Template("Set<{0}>")),
            map: Some(Rule::Template("Map<{0}, {1}>")),
            tuple: Some(Rule::Template("[{args}]")),
            optional: Some(Rule::Template("{0} | null")),
            union: Some(Rule::Template("{args}")),
            union_separator: " | ",
            callable: Some(CallableRule {
                returning: Rule::Template("({named_params}) => {ret}"),
                void: None,
            }),
            dynamic: "any",
            generic_open: "<",
            generic_close: ">",
            inline_marker: true,
            wrap_compound: true,
        }
    }

    pub fn java() -> Self {
        Self {
            primitives: BTreeMap::from([
                ("bool", "boolean"),
                ("char", "char"),
                ("int8", "byte"),
                ("int16", "short"),
                ("int32", "int"),
                ("int64", "long"),
                ("uint8", "short"),
                ("uint16", "int"),
                ("uint32", "long"),
                ("uint64", "long"),
                ("float32", "float"),
                ("float64", "double"),
                ("string", "String"),
                ("void", "void"),
            ]),
            boxed: BTreeMap::from([
                ("bool", "Boolean"),
                ("char", "Character"),
                ("int8", "Byte"),
                ("int16", "Short"),
                ("int32", "Integer"),
                ("int64", "Long"),
                ("uint8", "Short"),
                ("uint16", "Integer"),
                ("uint32", "Long"),
                ("uint64", "Long"),
                ("float32", "Float"),
                ("float64", "Double"),
                ("void", "Void"),
            ]),
            list: Some(Rule::Template("List<{0}>")),
            set: Some(Rule::Template("Set<{0}>")),
            map: Some(Rule::Template("Map<{0}, {1}>")),
            tuple: None,
            optional: Some(Rule::Template("Optional<{0}>")),
            union: None,
            union_separator: ", ",
            callable: Some(CallableRule {
                returning: Rule::ByArity(&[
                    "Supplier<{ret}>",
                    "Function<{0}, {ret}>",
                    "BiFunction<{0}, {1}, {ret}>",
                ]),
                void: Some(Rule::ByArity(&["Runnable", "Consumer<{0}>", "BiConsumer<{0}, {1}>"])),
            }),
            dynamic: "Object",
            generic_open: "<",
            generic_close: ">",
            inline_marker: true,
            wrap_compound: false,
        }
    }

    pub fn kotlin() -> Self {
        Self {
            primitives: BTreeMap::from([
                ("bool", "Boolean"),
                ("char", "Char"),
                ("int8", "Byte"),
                ("int16", "Short"),
                ("int32", "Int"),
                ("int64", "Long"),
                ("uint8", "UByte"),
                ("uint16", "UShort"),
                ("uint32", "UInt"),
                ("uint64", "ULong"),
                ("float32", "Float"),
                ("float64", "Double"),
                ("string", "String"),
                ("void", "Unit"),
            ]),
            boxed: BTreeMap::new(),
            list: Some(Rule::Template("List<{0}>")),
            set: Some(Rule::Template("Set<{0}>")),
            map: Some(Rule::Template("Map<{0}, {1}>")),
            tuple: Some(Rule::ByArity(&["", "", "Pair<{0}, {1}>", "Triple<{0}, {1}, {2}>"])),
            optional: Some(Rule::Template("{0}?")),
            union: None,
            union_separator: ", ",
            callable: Some(CallableRule {
                returning: Rule::Template("({params}) -> {ret}"),
                void: None,
            }),
            dynamic: "Any",
            generic_open: "<",
            generic_close: ">",
            inline_marker: true,
            wrap_compound: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> TypeRef {
        TypeRef::optional(TypeRef::list(TypeRef::string()))
    }

    #[test]
    fn test_nested_optional_list_in_every_target() {
        let mut unmapped = Vec::new();
        let cases = [
            (TargetTypeRules::rust(), "Option<Vec<String>>"),
            (TargetTypeRules::go(), "*[]string"),
            (TargetTypeRules::python(), "Optional[List[str]]"),
            (TargetTypeRules::typescript(), "string[] | null"),
            (TargetTypeRules::java(), "Optional<List<String>>"),
            (TargetTypeRules::kotlin(), "List<String>?"),
        ];
        for (rules, expected) in cases {
            assert_eq!(rules.render(&nested(), &mut unmapped), expected);
        }
        assert!(unmapped.is_empty());
    }

    #[test]
    fn test_java_boxes_generic_arguments() {
        let mut unmapped = Vec::new();
        let ty = TypeRef::map(TypeRef::string(), TypeRef::int32());
        assert_eq!(TargetTypeRules::java().render(&ty, &mut unmapped), "Map<String, Integer>");
    }

    #[test]
    fn test_missing_rule_renders_placeholder() {
        let mut unmapped = Vec::new();
        let ty = TypeRef::union(vec![TypeRef::int64(), TypeRef::string()]);
        let text = TargetTypeRules::go().render(&ty, &mut unmapped);
        assert_eq!(text, "interface{} /* UNMAPPED: union<int64, string> */");
        assert_eq!(unmapped, vec!["union<int64, string>".to_string()]);
    }

    #[test]
    fn test_callable_shapes() {
        let mut unmapped = Vec::new();
        let ty = TypeRef::callable(vec![TypeRef::int32()], TypeRef::bool());
        assert_eq!(
            TargetTypeRules::typescript().render(&ty, &mut unmapped),
            "(arg0: number) => boolean"
        );
        assert_eq!(
            TargetTypeRules::java().render(&ty, &mut unmapped),
            "Function<Integer, Boolean>"
        );
        let proc_ty = TypeRef::callable(vec![TypeRef::string()], TypeRef::void());
        assert_eq!(
            TargetTypeRules::rust().render(&proc_ty, &mut unmapped),
            "Box<dyn Fn(String)>"
        );
    }

    #[test]
    fn test_kotlin_dynamic_optional_is_single_question_mark() {
        let mut unmapped = Vec::new();
        let ty = TypeRef::optional(TypeRef::dynamic());
        assert_eq!(TargetTypeRules::kotlin().render(&ty, &mut unmapped), "Any?");
    }
}
