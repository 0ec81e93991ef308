//! Source type text to canonical [`TypeRef`]
//!
//! `<`/`>` are delimiters here and only here; declaration scanning never
//! counts them.

use crate::mapping::{Alias, SourceAliases};
use crate::types::TypeRef;
use nonempty::NonEmpty;

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Word(String),
    Punct(&'static str),
    Lifetime,
}

const PUNCTS: &[&str] = &[
    "->", "=>", "::", "...", "<", ">", "[", "]", "(", ")", "{", "}", ",", "|", "?", "*", "&", ":", ";", "+", ".", "=",
];

fn tokenize(text: &str, lifetimes: bool) -> Result<Vec<Tok>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_alphanumeric() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                i += 1;
            }
            tokens.push(Tok::Word(chars[start..i].iter().collect()));
        } else if lifetimes && c == '\'' && chars.get(i + 1).is_some_and(|n| n.is_alphabetic()) {
            // Rust lifetime
            i += 1;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Tok::Lifetime);
        } else if c == '"' || c == '\'' {
            // Quoted forward reference
            let start = i + 1;
            i = start;
            while i < chars.len() && chars[i] != c {
                i += 1;
            }
            let inner: String = chars[start..i.min(chars.len())].iter().collect();
            i += 1;
            tokens.extend(tokenize(&inner, lifetimes)?);
        } else {
            let rest: String = chars[i..chars.len().min(i + 3)].iter().collect();
            let punct = PUNCTS
                .iter()
                .find(|p| rest.starts_with(**p))
                .ok_or_else(|| format!("unexpected character '{}' in type", c))?;
            tokens.push(Tok::Punct(punct));
            i += punct.chars().count();
        }
    }
    Ok(tokens)
}

struct TypeParser<'a> {
    tokens: Vec<Tok>,
    current: usize,
    aliases: &'a SourceAliases,
}

/// Parse source type text; empty text is `dynamic`
pub fn parse_type(text: &str, aliases: &SourceAliases) -> Result<TypeRef, String> {
    let tokens = tokenize(text.trim(), aliases.references)?;
    if tokens.is_empty() {
        return Ok(TypeRef::dynamic());
    }
    let mut parser = TypeParser {
        tokens,
        current: 0,
        aliases,
    };
    let ty = parser.union()?;
    match parser.peek() {
        None => Ok(ty),
        Some(tok) => Err(format!("unexpected {:?} after type", tok)),
    }
}

/// Like [`parse_type`], degrading to `dynamic` with a logged warning
pub fn parse_type_or_dynamic(text: &str, aliases: &SourceAliases) -> TypeRef {
    parse_type(text, aliases).unwrap_or_else(|err| {
        log::warn!("could not read type '{}': {}", text.trim(), err);
        TypeRef::dynamic()
    })
}

impl<'a> TypeParser<'a> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.current)
    }

    fn peek_at(&self, offset: usize) -> Option<&Tok> {
        self.tokens.get(self.current + offset)
    }

    fn advance(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.current).cloned();
        self.current += 1;
        tok
    }

    fn check(&self, punct: &str) -> bool {
        matches!(self.peek(), Some(Tok::Punct(p)) if *p == punct)
    }

    fn check_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Tok::Word(w)) if w == word)
    }

    fn match_punct(&mut self, punct: &str) -> bool {
        if self.check(punct) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn consume(&mut self, punct: &str) -> Result<(), String> {
        if self.match_punct(punct) {
            Ok(())
        } else {
            Err(format!("expected '{}' in type, found {:?}", punct, self.peek()))
        }
    }

    fn union(&mut self) -> Result<TypeRef, String> {
        let first = self.postfix()?;
        if !self.aliases.pipe_union || !self.check("|") {
            return Ok(first);
        }
        let mut members = NonEmpty::new(first);
        while self.match_punct("|") {
            members.push(self.postfix()?);
        }
        Ok(TypeRef::union(members.into()))
    }

    fn postfix(&mut self) -> Result<TypeRef, String> {
        let mut ty = self.prefix()?;
        loop {
            if self.aliases.array_suffix && self.check("[") && matches!(self.peek_at(1), Some(Tok::Punct("]"))) {
                self.current += 2;
                ty = TypeRef::list(ty);
            } else if self.aliases.nullable_suffix && self.check("?") {
                self.current += 1;
                ty = TypeRef::optional(ty);
            } else if self.check("...") {
                // Varargs are lists
                self.current += 1;
                ty = TypeRef::list(ty);
            } else {
                return Ok(ty);
            }
        }
    }

    fn type_list(&mut self, close: &str) -> Result<Vec<TypeRef>, String> {
        let mut items = Vec::new();
        while !self.check(close) {
            // Named parameters in function types: `(x: number) => void`
            if matches!(self.peek(), Some(Tok::Word(_)))
                && (matches!(self.peek_at(1), Some(Tok::Punct(":")))
                    || (matches!(self.peek_at(1), Some(Tok::Punct("?")))
                        && matches!(self.peek_at(2), Some(Tok::Punct(":")))))
            {
                self.advance();
                self.match_punct("?");
                self.advance();
            }
            items.push(self.union()?);
            if !self.match_punct(",") {
                break;
            }
        }
        self.consume(close)?;
        Ok(items)
    }

    fn prefix(&mut self) -> Result<TypeRef, String> {
        if self.aliases.references && self.match_punct("&") {
            if matches!(self.peek(), Some(Tok::Lifetime)) {
                self.current += 1;
            }
            if self.check_word("mut") {
                self.current += 1;
            }
            return self.prefix();
        }

        if self.match_punct("...") {
            // Go variadic `...T`
            return Ok(TypeRef::list(self.prefix()?));
        }

        if self.match_punct("*") {
            if self.check_word("const") || self.check_word("mut") {
                self.current += 1;
            }
            let inner = self.prefix()?;
            return Ok(if self.aliases.pointer_optional {
                TypeRef::optional(inner)
            } else {
                inner
            });
        }

        if self.match_punct("[") {
            if self.aliases.go_containers {
                // []T and [N]T
                while !self.check("]") && self.peek().is_some() {
                    self.current += 1;
                }
                self.consume("]")?;
                return Ok(TypeRef::list(self.prefix()?));
            }
            let items = self.type_list_with_length("]")?;
            // Rust slices and arrays are lists; elsewhere this is a tuple
            // (TypeScript) or a `Callable[[A, B], R]` parameter list (Python)
            return Ok(if self.aliases.references {
                TypeRef::list(items.into_iter().next().unwrap_or_else(TypeRef::dynamic))
            } else {
                TypeRef::tuple(items)
            });
        }

        if self.match_punct("(") {
            let items = self.type_list(")")?;
            if self.match_punct("=>") || self.match_punct("->") {
                let ret = self.union()?;
                return Ok(TypeRef::callable(items, ret));
            }
            return Ok(match items.len() {
                0 => TypeRef::void(),
                1 => items.into_iter().next().unwrap_or_else(TypeRef::void),
                _ => TypeRef::tuple(items),
            });
        }

        if self.match_punct("{") {
            // Structural object types have no canonical counterpart
            let mut depth = 1;
            while depth > 0 {
                match self.advance() {
                    Some(Tok::Punct("{")) => depth += 1,
                    Some(Tok::Punct("}")) => depth -= 1,
                    None => return Err("unterminated object type".into()),
                    _ => {}
                }
            }
            return Ok(TypeRef::dynamic());
        }

        if self.match_punct("?") {
            // Java wildcard
            if self.check_word("extends") || self.check_word("super") {
                self.current += 1;
                return self.union();
            }
            return Ok(TypeRef::dynamic());
        }

        let word = match self.advance() {
            Some(Tok::Word(w)) => w,
            other => return Err(format!("expected a type name, found {:?}", other)),
        };
        self.named(word)
    }

    fn type_list_with_length(&mut self, close: &str) -> Result<Vec<TypeRef>, String> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(self.union()?);
            if self.match_punct(";") {
                // `[T; N]`
                while !self.check(close) && self.peek().is_some() {
                    self.current += 1;
                }
                break;
            }
            if !self.match_punct(",") {
                break;
            }
        }
        self.consume(close)?;
        Ok(items)
    }

    fn named(&mut self, first: String) -> Result<TypeRef, String> {
        match first.as_str() {
            "dyn" | "impl" | "const" | "final" | "readonly" | "in" | "out" | "mut" | "unsafe" | "struct"
                if matches!(self.peek(), Some(Tok::Word(_)) | Some(Tok::Punct("&"))) =>
            {
                let ty = self.prefix()?;
                // Extra trait bounds
                while self.match_punct("+") {
                    if matches!(self.peek(), Some(Tok::Lifetime)) {
                        self.current += 1;
                    } else {
                        self.prefix()?;
                    }
                }
                return Ok(ty);
            }
            "interface" if self.aliases.go_containers && self.check("{") => {
                self.current += 1;
                self.consume("}")?;
                return Ok(TypeRef::dynamic());
            }
            "map" if self.aliases.go_containers && self.check("[") => {
                self.current += 1;
                let key = self.union()?;
                self.consume("]")?;
                let value = self.prefix()?;
                return Ok(TypeRef::map(key, value));
            }
            "chan" if self.aliases.go_containers => {
                let inner = self.prefix()?;
                return Ok(TypeRef::custom("chan", vec![inner]));
            }
            "func" | "fn" if self.check("(") => {
                self.current += 1;
                let params = self.type_list(")")?;
                let ret = if self.match_punct("->") || self.match_punct("=>") {
                    self.union()?
                } else if first == "func" && self.starts_type() {
                    self.union()?
                } else {
                    TypeRef::void()
                };
                return Ok(TypeRef::callable(params, ret));
            }
            _ => {}
        }

        // Qualified names keep only the last segment
        let mut name = first;
        while (self.check(".") || self.check("::")) && matches!(self.peek_at(1), Some(Tok::Word(_))) {
            self.current += 1;
            if let Some(Tok::Word(segment)) = self.advance() {
                name = segment;
            }
        }

        let mut args = Vec::new();
        let open = if self.aliases.bracket_generics { "[" } else { "<" };
        let close = if self.aliases.bracket_generics { "]" } else { ">" };
        let opens_generics = self.check(open)
            && !(self.aliases.array_suffix && matches!(self.peek_at(1), Some(Tok::Punct("]"))));
        if opens_generics {
            self.current += 1;
            if self.check(close) {
                // Diamond `<>`
                self.current += 1;
            } else {
                args = self.generic_args(close)?;
            }
        } else if matches!(name.as_str(), "Fn" | "FnMut" | "FnOnce") && self.check("(") {
            self.current += 1;
            let mut parts = self.type_list(")")?;
            let ret = if self.match_punct("->") {
                self.union()?
            } else {
                TypeRef::void()
            };
            parts.push(ret);
            args = parts;
        }

        Ok(self.resolve(name, args))
    }

    fn generic_args(&mut self, close: &str) -> Result<Vec<TypeRef>, String> {
        let mut args = Vec::new();
        loop {
            if matches!(self.peek(), Some(Tok::Lifetime)) {
                self.current += 1;
            } else {
                args.push(self.union()?);
            }
            if !self.match_punct(",") {
                break;
            }
        }
        self.consume(close)?;
        Ok(args)
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.peek(),
            Some(Tok::Word(_)) | Some(Tok::Punct("*")) | Some(Tok::Punct("[")) | Some(Tok::Punct("("))
        )
    }

    fn resolve(&self, name: String, mut args: Vec<TypeRef>) -> TypeRef {
        let first = |args: &mut Vec<TypeRef>| {
            if args.is_empty() {
                TypeRef::dynamic()
            } else {
                args.remove(0)
            }
        };

        match self.aliases.lookup(&name) {
            Some(Alias::Primitive(canonical)) => TypeRef::primitive(canonical),
            Some(Alias::List) => TypeRef::list(first(&mut args)),
            Some(Alias::Set) => TypeRef::set(first(&mut args)),
            Some(Alias::Map) => {
                let key = first(&mut args);
                let value = first(&mut args);
                TypeRef::map(key, value)
            }
            Some(Alias::Tuple) => TypeRef::tuple(args),
            Some(Alias::Optional) => TypeRef::optional(first(&mut args)),
            Some(Alias::Union) => TypeRef::union(args),
            Some(Alias::Callable) => {
                // `Callable[[A, B], R]` arrives as a tuple followed by R
                if args.len() == 2 && args[0].base_name == "tuple" {
                    let ret = args.remove(1);
                    let params = args.remove(0).args;
                    return TypeRef::callable(params, ret);
                }
                match args.pop() {
                    Some(ret) => TypeRef::callable(args, ret),
                    None => TypeRef::callable(vec![], TypeRef::dynamic()),
                }
            }
            Some(Alias::Procedure) => TypeRef::callable(args, TypeRef::void()),
            Some(Alias::Dynamic) => TypeRef::dynamic(),
            Some(Alias::Transparent) => first(&mut args),
            None => TypeRef::custom(name, args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeCategory;

    fn rust(text: &str) -> String {
        parse_type(text, &SourceAliases::rust()).expect("rust type").to_string()
    }

    #[test]
    fn test_rust_types() {
        assert_eq!(rust("Option<Vec<String>>"), "optional<list<string>>");
        assert_eq!(rust("&'a mut [u8]"), "list<uint8>");
        assert_eq!(rust("Box<dyn Fn(i32) -> bool + Send>"), "fn<int32, bool>");
        assert_eq!(rust("std::collections::HashMap<String, usize>"), "map<string, uint64>");
        assert_eq!(rust("()"), "void");
        assert_eq!(rust("(i32, String)"), "tuple<int32, string>");
    }

    #[test]
    fn test_python_types() {
        let aliases = SourceAliases::python();
        let ty = parse_type("Optional[List[str]]", &aliases).expect("type");
        assert_eq!(ty.to_string(), "optional<list<string>>");
        let ty = parse_type("int | None", &aliases).expect("type");
        assert_eq!(ty.to_string(), "optional<int64>");
        let ty = parse_type("Callable[[int, str], bool]", &aliases).expect("type");
        assert_eq!(ty.to_string(), "fn<int64, string, bool>");
        let ty = parse_type("'Node'", &aliases).expect("type");
        assert_eq!(ty, TypeRef::custom("Node", vec![]));
    }

    #[test]
    fn test_go_types() {
        let aliases = SourceAliases::go();
        assert_eq!(
            parse_type("map[string][]*User", &aliases).expect("type").to_string(),
            "map<string, list<optional<User>>>"
        );
        assert_eq!(parse_type("interface{}", &aliases).expect("type"), TypeRef::dynamic());
        assert_eq!(
            parse_type("func(int) error", &aliases).expect("type").to_string(),
            "fn<int64, error>"
        );
    }

    #[test]
    fn test_typescript_and_java_types() {
        let ts = SourceAliases::typescript();
        assert_eq!(
            parse_type("string[] | null", &ts).expect("type").to_string(),
            "optional<list<string>>"
        );
        assert_eq!(
            parse_type("(x: number, y?: string) => void", &ts).expect("type").to_string(),
            "fn<float64, string, void>"
        );
        assert_eq!(
            parse_type("Promise<number>", &ts).expect("type").category,
            TypeCategory::Primitive
        );

        let java = SourceAliases::java();
        assert_eq!(
            parse_type("Map<String, List<Integer>>", &java).expect("type").to_string(),
            "map<string, list<int32>>"
        );
        assert_eq!(parse_type("int[]", &java).expect("type").to_string(), "list<int32>");
        assert_eq!(parse_type("List<? extends Shape>", &java).expect("type").to_string(), "list<Shape>");
    }

    #[test]
    fn test_kotlin_nullable() {
        let ty = parse_type("List<String>?", &SourceAliases::kotlin()).expect("type");
        assert_eq!(ty.to_string(), "optional<list<string>>");
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(parse_type("Map<String", &SourceAliases::java()).is_err());
        assert_eq!(
            parse_type_or_dynamic("%%", &SourceAliases::java()),
            TypeRef::dynamic()
        );
    }
}
