//! Source-side alias tables: which type names a language spells, and which
//! canonical category each one stands for

use std::collections::BTreeMap;

/// Canonical meaning of a source type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alias {
    /// A canonical primitive, by canonical name
    Primitive(&'static str),
    List,
    Set,
    Map,
    Tuple,
    Optional,
    Union,
    /// Arguments are parameter types followed by the return type
    Callable,
    /// Arguments are parameter types; returns void
    Procedure,
    Dynamic,
    /// Wrappers with no canonical meaning (`Box<T>`, `Promise<T>`); the
    /// single argument is used in their place
    Transparent,
}

/// Type-text syntax of one source language plus its alias table
#[derive(Debug, Clone)]
pub struct SourceAliases {
    pub aliases: BTreeMap<&'static str, Alias>,
    /// `T?` marks an optional
    pub nullable_suffix: bool,
    /// `*T` marks an optional (Go pointers)
    pub pointer_optional: bool,
    /// `[]T` is a list and `map[K]V` a map
    pub go_containers: bool,
    /// `T[]` is a list
    pub array_suffix: bool,
    /// `A | B` is a union
    pub pipe_union: bool,
    /// Generic arguments are written `Name[A, B]`
    pub bracket_generics: bool,
    /// `&T` and `&mut T` are references to `T`
    pub references: bool,
}

impl SourceAliases {
    fn new(entries: &[(&'static str, Alias)]) -> Self {
        Self {
            aliases: entries.iter().copied().collect(),
            nullable_suffix: false,
            pointer_optional: false,
            go_containers: false,
            array_suffix: false,
            pipe_union: false,
            bracket_generics: false,
            references: false,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Alias> {
        self.aliases.get(name).copied()
    }

    pub fn rust() -> Self {
        use Alias::*;
        let mut table = Self::new(&[
            ("bool", Primitive("bool")),
            ("char", Primitive("char")),
            ("i8", Primitive("int8")),
            ("i16", Primitive("int16")),
            ("i32", Primitive("int32")),
            ("i64", Primitive("int64")),
            ("isize", Primitive("int64")),
            ("u8", Primitive("uint8")),
            ("u16", Primitive("uint16")),
            ("u32", Primitive("uint32")),
            ("u64", Primitive("uint64")),
            ("usize", Primitive("uint64")),
            ("f32", Primitive("float32")),
            ("f64", Primitive("float64")),
            ("String", Primitive("string")),
            ("str", Primitive("string")),
            ("Vec", List),
            ("VecDeque", List),
            ("LinkedList", List),
            ("HashSet", Set),
            ("BTreeSet", Set),
            ("HashMap", Map),
            ("BTreeMap", Map),
            ("Option", Optional),
            ("Fn", Callable),
            ("FnMut", Callable),
            ("FnOnce", Callable),
            ("Box", Transparent),
            ("Rc", Transparent),
            ("Arc", Transparent),
            ("RefCell", Transparent),
            ("Cell", Transparent),
            ("Mutex", Transparent),
            ("Cow", Transparent),
            ("Any", Dynamic),
        ]);
        table.references = true;
        table
    }

    pub fn python() -> Self {
        use Alias::*;
        let mut table = Self::new(&[
            ("bool", Primitive("bool")),
            ("int", Primitive("int64")),
            ("float", Primitive("float64")),
            ("str", Primitive("string")),
            ("None", Primitive("void")),
            ("list", List),
            ("List", List),
            ("Sequence", List),
            ("Iterable", List),
            ("set", Set),
            ("Set", Set),
            ("frozenset", Set),
            ("FrozenSet", Set),
            ("dict", Map),
            ("Dict", Map),
            ("Mapping", Map),
            ("tuple", Tuple),
            ("Tuple", Tuple),
            ("Optional", Optional),
            ("Union", Union),
            ("Callable", Callable),
            ("Awaitable", Transparent),
            ("Coroutine", Transparent),
            ("Any", Dynamic),
            ("object", Dynamic),
        ]);
        table.pipe_union = true;
        table.bracket_generics = true;
        table
    }

    pub fn java() -> Self {
        use Alias::*;
        let mut table = Self::new(&[
            ("boolean", Primitive("bool")),
            ("Boolean", Primitive("bool")),
            ("char", Primitive("char")),
            ("Character", Primitive("char")),
            ("byte", Primitive("int8")),
            ("Byte", Primitive("int8")),
            ("short", Primitive("int16")),
            ("Short", Primitive("int16")),
            ("int", Primitive("int32")),
            ("Integer", Primitive("int32")),
            ("long", Primitive("int64")),
            ("Long", Primitive("int64")),
            ("float", Primitive("float32")),
            ("Float", Primitive("float32")),
            ("double", Primitive("float64")),
            ("Double", Primitive("float64")),
            ("String", Primitive("string")),
            ("void", Primitive("void")),
            ("Void", Primitive("void")),
            ("List", List),
            ("ArrayList", List),
            ("LinkedList", List),
            ("Collection", List),
            ("Iterable", List),
            ("Set", Set),
            ("HashSet", Set),
            ("TreeSet", Set),
            ("Map", Map),
            ("HashMap", Map),
            ("TreeMap", Map),
            ("Optional", Optional),
            ("Function", Callable),
            ("BiFunction", Callable),
            ("Consumer", Procedure),
            ("BiConsumer", Procedure),
            ("Runnable", Procedure),
            ("CompletableFuture", Transparent),
            ("Future", Transparent),
            ("Object", Dynamic),
        ]);
        table.array_suffix = true;
        table
    }

    pub fn go() -> Self {
        use Alias::*;
        let mut table = Self::new(&[
            ("bool", Primitive("bool")),
            ("int", Primitive("int64")),
            ("int8", Primitive("int8")),
            ("int16", Primitive("int16")),
            ("int32", Primitive("int32")),
            ("int64", Primitive("int64")),
            ("uint", Primitive("uint64")),
            ("uint8", Primitive("uint8")),
            ("uint16", Primitive("uint16")),
            ("uint32", Primitive("uint32")),
            ("uint64", Primitive("uint64")),
            ("byte", Primitive("uint8")),
            ("rune", Primitive("char")),
            ("float32", Primitive("float32")),
            ("float64", Primitive("float64")),
            ("string", Primitive("string")),
            ("any", Dynamic),
            ("interface{}", Dynamic),
        ]);
        table.pointer_optional = true;
        table.go_containers = true;
        table.bracket_generics = true;
        table
    }

    /// Shared by TypeScript and JavaScript (JSDoc-style annotations)
    pub fn typescript() -> Self {
        use Alias::*;
        let mut table = Self::new(&[
            ("boolean", Primitive("bool")),
            ("number", Primitive("float64")),
            ("bigint", Primitive("int64")),
            ("string", Primitive("string")),
            ("void", Primitive("void")),
            ("undefined", Primitive("void")),
            ("null", Primitive("void")),
            ("Array", List),
            ("ReadonlyArray", List),
            ("Set", Set),
            ("ReadonlySet", Set),
            ("Map", Map),
            ("Record", Map),
            ("Promise", Transparent),
            ("any", Dynamic),
            ("unknown", Dynamic),
            ("object", Dynamic),
        ]);
        table.array_suffix = true;
        table.pipe_union = true;
        table
    }

    pub fn kotlin() -> Self {
        use Alias::*;
        let mut table = Self::new(&[
            ("Boolean", Primitive("bool")),
            ("Char", Primitive("char")),
            ("Byte", Primitive("int8")),
            ("Short", Primitive("int16")),
            ("Int", Primitive("int32")),
            ("Long", Primitive("int64")),
            ("UByte", Primitive("uint8")),
            ("UShort", Primitive("uint16")),
            ("UInt", Primitive("uint32")),
            ("ULong", Primitive("uint64")),
            ("Float", Primitive("float32")),
            ("Double", Primitive("float64")),
            ("String", Primitive("string")),
            ("Unit", Primitive("void")),
            ("List", List),
            ("MutableList", List),
            ("ArrayList", List),
            ("Array", List),
            ("Set", Set),
            ("MutableSet", Set),
            ("HashSet", Set),
            ("Map", Map),
            ("MutableMap", Map),
            ("HashMap", Map),
            ("Pair", Tuple),
            ("Triple", Tuple),
            ("Deferred", Transparent),
            ("Any", Dynamic),
        ]);
        table.nullable_suffix = true;
        table
    }

    pub fn csharp() -> Self {
        use Alias::*;
        let mut table = Self::new(&[
            ("bool", Primitive("bool")),
            ("Boolean", Primitive("bool")),
            ("char", Primitive("char")),
            ("sbyte", Primitive("int8")),
            ("short", Primitive("int16")),
            ("int", Primitive("int32")),
            ("Int32", Primitive("int32")),
            ("long", Primitive("int64")),
            ("Int64", Primitive("int64")),
            ("byte", Primitive("uint8")),
            ("ushort", Primitive("uint16")),
            ("uint", Primitive("uint32")),
            ("ulong", Primitive("uint64")),
            ("float", Primitive("float32")),
            ("double", Primitive("float64")),
            ("decimal", Primitive("float64")),
            ("string", Primitive("string")),
            ("String", Primitive("string")),
            ("void", Primitive("void")),
            ("List", List),
            ("IList", List),
            ("IEnumerable", List),
            ("ICollection", List),
            ("IReadOnlyList", List),
            ("HashSet", Set),
            ("ISet", Set),
            ("Dictionary", Map),
            ("IDictionary", Map),
            ("Nullable", Optional),
            ("Func", Callable),
            ("Action", Procedure),
            ("Task", Transparent),
            ("ValueTask", Transparent),
            ("object", Dynamic),
            ("dynamic", Dynamic),
        ]);
        table.nullable_suffix = true;
        table.array_suffix = true;
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_language() {
        assert_eq!(SourceAliases::rust().lookup("Vec"), Some(Alias::List));
        assert_eq!(SourceAliases::python().lookup("Any"), Some(Alias::Dynamic));
        assert_eq!(
            SourceAliases::kotlin().lookup("Int"),
            Some(Alias::Primitive("int32"))
        );
        assert_eq!(SourceAliases::go().lookup("Widget"), None);
    }
}
