//! Per-language syntax tables
//!
//! Every front-end is the same extractor driven by one of these tables. A
//! table lists anchored regular-expression templates per construct, in the
//! priority order the extractor tries them, plus the lexical and naming
//! conventions of the language. Supporting another language means writing
//! another table.
//!
//! Template capture groups:
//!
//! | group | meaning |
//! |---|---|
//! | `name` | declared name (fields: a comma-separated list) |
//! | `vis`, `mods`, `kw`, `async` | words feeding visibility and modifier flags |
//! | `kind` | type keyword (`class`, `struct`, `trait`, ...) |
//! | `generics` | generic parameter list, brackets included |
//! | `receiver` | Go method receiver or Kotlin extension receiver |
//! | `ret`, `throws` | return type and declared exceptions |
//! | `expr` | expression body after `=` or `=>` |
//! | `extends`, `implements`, `bases` | base type lists |
//! | `type`, `default`, `opt`, `set` | field type, initializer, `?` marker, setter |
//! | `members` | inner region of a container |

use super::body::BodySyntax;
use super::scan::ScanRules;
use super::strip::StripRules;
use crate::ast::{TypeKind, Visibility};
use crate::error::{ConvertError, ErrorKind, Result};
use regex::Regex;

/// Where an item sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    TopLevel,
    Member,
    /// Inside a keyword group such as Go's `var ( ... )`
    Grouped,
}

/// Which places a template applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Any,
    TopLevel,
    Member,
    Grouped,
}

impl Scope {
    pub fn allows(self, place: Place) -> bool {
        match self {
            Scope::Any => true,
            Scope::TopLevel => place == Place::TopLevel,
            Scope::Member => place == Place::Member,
            Scope::Grouped => place == Place::Grouped,
        }
    }
}

/// What opens a declaration body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opener {
    Brace,
    Colon,
}

/// Meaning of a parenthesised list right after a type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParenRole {
    /// Primary-constructor fields (Kotlin, records, Rust tuple structs)
    Fields,
    /// Base classes (Python)
    Bases,
}

/// How a type body is divided into members
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Members {
    /// Ordinary member items
    Items,
    /// Comma-separated fields (Rust structs)
    CommaFields,
    /// Comma-separated variants, optionally followed by `;` and members
    Variants,
}

/// How an undifferentiated base list splits into extends/implements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseRule {
    /// `A(), B`: the entry invoking a constructor is the superclass
    Invoked,
    /// `Base, IFoo`: `I`-prefixed entries are interfaces
    InterfacePrefix,
    /// Every entry is an interface (trait supertraits)
    AllInterfaces,
    /// Every entry is a superclass (Python)
    AllClasses,
}

/// Base names with a meaning beyond inheritance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseMarker {
    /// Dropped (`object`, `ABC`)
    Ignore,
    /// Makes the type an interface; arguments become type parameters
    Interface,
    /// Makes the type an enum
    Enum,
    /// Arguments become type parameters
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// `name: Type = default`
    NameColonType,
    /// `Type name`
    TypeName,
    /// `a, b int`
    Go,
}

/// Where a declaration without a return annotation gets its return type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingReturn {
    Void,
    /// `dynamic` when the body returns a value, `void` otherwise
    Infer,
}

#[derive(Debug)]
pub struct TypeTemplate {
    /// Matched at the start of the item; must capture `name`
    pub head: Regex,
    /// Matched against the header text between the name (plus generics and
    /// parens) and the body
    pub tail: Regex,
    pub kind: Option<TypeKind>,
    pub parens: Option<ParenRole>,
    pub members: Members,
}

#[derive(Debug)]
pub struct FunctionTemplate {
    /// Matched against the text before the parameter list's `(`
    pub head: Regex,
    /// Matched against the text between `)` and the body
    pub tail: Regex,
    pub scope: Scope,
}

#[derive(Debug)]
pub struct FieldTemplate {
    pub pattern: Regex,
    pub scope: Scope,
}

#[derive(Debug)]
pub struct SyntaxTable {
    pub language: &'static str,
    pub extensions: &'static [&'static str],
    pub strip: StripRules,
    pub scan: ScanRules,
    pub body: BodySyntax,
    pub opener: Opener,
    /// Leading attribute or decorator syntax stripped before matching
    pub attributes: Option<Regex>,
    pub ignore: Vec<Regex>,
    pub containers: Vec<Regex>,
    pub types: Vec<TypeTemplate>,
    pub impls: Vec<Regex>,
    pub functions: Vec<FunctionTemplate>,
    /// Bare type names inside a struct or interface body (Go embedding)
    pub embedded: Option<Regex>,
    pub fields: Vec<FieldTemplate>,
    /// One enum variant
    pub variant: Regex,
    pub base_rule: BaseRule,
    /// Separator of supertraits when not `,`
    pub base_separator: u8,
    pub marker_bases: &'static [(&'static str, BaseMarker)],
    pub params: ParamStyle,
    /// A first parameter that is the method receiver
    pub receiver_param: Option<Regex>,
    /// Methods without a receiver parameter are static
    pub explicit_receiver: bool,
    pub missing_return: MissingReturn,
    /// `Result<T, E>` returns mean `T` throwing `E`
    pub result_errors: bool,
    /// `(T, error)` returns mean `T` throwing `error`
    pub multi_return_errors: bool,
    pub visibility_words: &'static [(&'static str, Visibility)],
    pub top_level_visibility: Visibility,
    pub member_visibility: Visibility,
    /// Capitalised names are exported, others package-internal
    pub visibility_by_case: bool,
    /// `_name` is private
    pub underscore_private: bool,
    pub static_words: &'static [&'static str],
    pub abstract_words: &'static [&'static str],
    pub async_words: &'static [&'static str],
    pub immutable_words: &'static [&'static str],
    pub mutable_words: &'static [&'static str],
    pub kind_words: &'static [(&'static str, TypeKind)],
    /// Return wrappers that mark an asynchronous function
    pub async_wrappers: &'static [&'static str],
    pub constructor_names: &'static [&'static str],
    /// A member named like its class with no return type is a constructor
    pub class_name_constructors: bool,
    /// The first string of a body is its documentation
    pub docstrings: bool,
    /// Fields are declared by assigning to the receiver in the constructor
    pub constructor_fields: bool,
    /// Canonical type of an integer literal
    pub int_literal: &'static str,
}

fn re(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|err| {
        ConvertError::new(ErrorKind::InternalError, format!("invalid syntax template: {}", err))
    })
}

fn patterns(list: &[&str]) -> Result<Vec<Regex>> {
    list.iter().map(|p| re(p)).collect()
}

fn function(head: &str, tail: &str, scope: Scope) -> Result<FunctionTemplate> {
    Ok(FunctionTemplate {
        head: re(head)?,
        tail: re(tail)?,
        scope,
    })
}

fn field(pattern: &str, scope: Scope) -> Result<FieldTemplate> {
    Ok(FieldTemplate {
        pattern: re(pattern)?,
        scope,
    })
}

const DEFAULT_KINDS: &[(&str, TypeKind)] = &[
    ("class", TypeKind::Class),
    ("struct", TypeKind::Struct),
    ("interface", TypeKind::Interface),
    ("trait", TypeKind::Interface),
    ("enum", TypeKind::Enum),
    ("object", TypeKind::Class),
    ("record", TypeKind::Struct),
];

const JAVA_MODS: &str = "public|protected|private|static|final|abstract|synchronized|native|default|strictfp|transient|volatile|sealed|non-sealed";
const CSHARP_MODS: &str =
    "public|protected|private|internal|static|virtual|override|abstract|async|sealed|readonly|new|extern|unsafe|partial|const|volatile";
const KOTLIN_MODS: &str = "public|private|protected|internal|open|abstract|final|override|data|sealed|enum|inner|annotation|suspend|inline|operator|infix|tailrec|external|const|lateinit|expect|actual|value";

/// `= default`, never the `=>` of a function type
const DEFAULT: &str = r"(?:=\s*(?P<default>[^>\s].*?))?";

impl SyntaxTable {
    /// Table for a canonical source tag
    pub fn for_language(tag: &str) -> Result<Self> {
        match tag {
            "rust" => Self::rust(),
            "python" => Self::python(),
            "java" => Self::java(),
            "go" => Self::go(),
            "typescript" => Self::typescript(),
            "javascript" => Self::javascript(),
            "kotlin" => Self::kotlin(),
            "csharp" => Self::csharp(),
            other => Err(ConvertError::unsupported_language(other).with_note("no syntax table")),
        }
    }

    fn c_like_strip(backticks: bool) -> StripRules {
        StripRules {
            slash_comments: true,
            hash_comments: false,
            triple_quotes: false,
            backtick_strings: backticks,
            lifetimes: false,
        }
    }

    pub fn rust() -> Result<Self> {
        let vis = r"(?P<vis>pub(?:\s*\([^)]*\))?\s+)?";
        Ok(Self {
            language: "rust",
            extensions: &["rs"],
            strip: StripRules {
                lifetimes: true,
                ..Self::c_like_strip(false)
            },
            scan: ScanRules {
                newline_terminates: false,
                indentation: false,
            },
            body: BodySyntax::rust(),
            opener: Opener::Brace,
            attributes: Some(re(r"^#!?\s*\[")?),
            ignore: patterns(&[
                r"^(?:pub(?:\s*\([^)]*\))?\s+)?use\s",
                r"^extern\s+crate\s",
                r"^(?:pub(?:\s*\([^)]*\))?\s+)?mod\s+\w+\s*;$",
            ])?,
            containers: patterns(&[r"(?s)^(?:pub(?:\s*\([^)]*\))?\s+)?mod\s+\w+\s*\{(?P<members>.*)\}$"])?,
            types: vec![
                TypeTemplate {
                    head: re(&format!(r"^{}(?P<kind>struct)\s+(?P<name>\w+)", vis))?,
                    tail: re(r"(?s)^\s*(?:where\s+.*)?;?\s*$")?,
                    kind: None,
                    parens: Some(ParenRole::Fields),
                    members: Members::CommaFields,
                },
                TypeTemplate {
                    head: re(&format!(r"^{}(?P<kind>enum)\s+(?P<name>\w+)", vis))?,
                    tail: re(r"(?s)^\s*(?:where\s+.*)?$")?,
                    kind: None,
                    parens: None,
                    members: Members::Variants,
                },
                TypeTemplate {
                    head: re(&format!(r"^{}(?P<mods>(?:unsafe\s+)?)(?P<kind>trait)\s+(?P<name>\w+)", vis))?,
                    tail: re(r"(?s)^\s*(?::\s*(?P<implements>.+?))?\s*(?:where\s+.*)?$")?,
                    kind: None,
                    parens: None,
                    members: Members::Items,
                },
            ],
            impls: patterns(&[
                r"(?s)^(?:unsafe\s+)?impl\s*(?:<.*?>)?\s*(?:(?P<trait>[\w:]+(?:\s*<.*?>)?)\s+for\s+)?(?P<name>[\w:]+)\s*(?:<.*>)?\s*(?:where\s+.*)?\{(?P<members>.*)\}$",
            ])?,
            functions: vec![function(
                &format!(
                    r#"(?s)^{}(?P<mods>(?:(?:const|async|unsafe|default|extern(?:\s+"[^"]*")?)\s+)*)fn\s+(?P<name>\w+)\s*(?P<generics><.*>)?\s*$"#,
                    vis
                ),
                r"(?s)^\s*(?:->\s*(?P<ret>.+?))?\s*(?:where\s+.+)?$",
                Scope::Any,
            )?],
            embedded: None,
            fields: vec![
                field(
                    &format!(
                        r"(?s)^{}(?P<mods>(?:const|static(?:\s+mut)?)\s+)(?P<name>\w+)\s*:\s*(?P<type>.+?)\s*{}\s*;?$",
                        vis, DEFAULT
                    ),
                    Scope::Any,
                )?,
                field(&format!(r"(?s)^{}(?P<name>\w+)\s*:\s*(?P<type>.+)$", vis), Scope::Member)?,
            ],
            variant: re(r"(?s)^(?P<name>\w+)\s*(?:=\s*.+)?$")?,
            base_rule: BaseRule::AllInterfaces,
            base_separator: b'+',
            marker_bases: &[],
            params: ParamStyle::NameColonType,
            receiver_param: Some(re(r"(?s)^(?:&\s*(?:'\w+\s*)?)?(?:mut\s+)?self(?:\s*:.*)?$")?),
            explicit_receiver: true,
            missing_return: MissingReturn::Void,
            result_errors: true,
            multi_return_errors: false,
            visibility_words: &[("pub(self)", Visibility::Private), ("pub(", Visibility::Internal), ("pub", Visibility::Public)],
            top_level_visibility: Visibility::Private,
            member_visibility: Visibility::Private,
            visibility_by_case: false,
            underscore_private: false,
            static_words: &["static", "const"],
            abstract_words: &[],
            async_words: &["async"],
            immutable_words: &["const", "static"],
            mutable_words: &["mut"],
            kind_words: DEFAULT_KINDS,
            async_wrappers: &[],
            constructor_names: &[],
            class_name_constructors: false,
            docstrings: false,
            constructor_fields: false,
            int_literal: "int32",
        })
    }

    pub fn python() -> Result<Self> {
        Ok(Self {
            language: "python",
            extensions: &["py", "pyi"],
            strip: StripRules {
                slash_comments: false,
                hash_comments: true,
                triple_quotes: true,
                backtick_strings: false,
                lifetimes: false,
            },
            scan: ScanRules {
                newline_terminates: true,
                indentation: true,
            },
            body: BodySyntax::python(),
            opener: Opener::Colon,
            attributes: Some(re(r"^@(?:[\w.]+)")?),
            ignore: patterns(&[
                r"^(?:import|from)\s",
                r#"^[rRbBuUfF]*(?:"""|''')"#,
                r#"^[rRbBuUfF]*(?:"[^"\n]*"|'[^'\n]*')$"#,
                r"^\w+\s*=\s*TypeVar\s*\(",
                r"^(?:pass|\.\.\.)$",
            ])?,
            containers: Vec::new(),
            types: vec![TypeTemplate {
                head: re(r"^(?P<kind>class)\s+(?P<name>\w+)")?,
                tail: re(r"^\s*$")?,
                kind: None,
                parens: Some(ParenRole::Bases),
                members: Members::Items,
            }],
            impls: Vec::new(),
            functions: vec![function(
                r"(?s)^(?P<async>async\s+)?def\s+(?P<name>\w+)\s*(?P<generics>\[.*\])?\s*$",
                r"(?s)^\s*(?:->\s*(?P<ret>.+?))?\s*$",
                Scope::Any,
            )?],
            embedded: None,
            fields: vec![field(
                r"(?s)^(?P<name>[A-Za-z_]\w*)\s*(?::\s*(?P<type>[^=]+?))?\s*(?:=\s*(?P<default>[^=].*))?$",
                Scope::Any,
            )?],
            variant: re(r"(?s)^(?P<name>\w+)\s*(?:=\s*.+)?$")?,
            base_rule: BaseRule::AllClasses,
            base_separator: b',',
            marker_bases: &[
                ("object", BaseMarker::Ignore),
                ("ABC", BaseMarker::Ignore),
                ("Protocol", BaseMarker::Interface),
                ("Generic", BaseMarker::Generic),
                ("Enum", BaseMarker::Enum),
                ("IntEnum", BaseMarker::Enum),
                ("StrEnum", BaseMarker::Enum),
                ("Flag", BaseMarker::Enum),
                ("IntFlag", BaseMarker::Enum),
            ],
            params: ParamStyle::NameColonType,
            receiver_param: Some(re(r"^(?:self|cls)$")?),
            explicit_receiver: true,
            missing_return: MissingReturn::Infer,
            result_errors: false,
            multi_return_errors: false,
            visibility_words: &[],
            top_level_visibility: Visibility::Public,
            member_visibility: Visibility::Public,
            visibility_by_case: false,
            underscore_private: true,
            static_words: &["staticmethod", "classmethod"],
            abstract_words: &["abstractmethod"],
            async_words: &["async"],
            immutable_words: &[],
            mutable_words: &[],
            kind_words: DEFAULT_KINDS,
            async_wrappers: &["Awaitable", "Coroutine"],
            constructor_names: &["__init__"],
            class_name_constructors: false,
            docstrings: true,
            constructor_fields: true,
            int_literal: "int64",
        })
    }

    pub fn java() -> Result<Self> {
        let mods = format!(r"(?P<mods>(?:(?:{})\s+)*)", JAVA_MODS);
        let ty = r"[\w$.]+(?:\s*<.*>)?(?:\s*\[\s*\])*(?:\s*\.\.\.)?";
        Ok(Self {
            language: "java",
            extensions: &["java"],
            strip: Self::c_like_strip(false),
            scan: ScanRules {
                newline_terminates: false,
                indentation: false,
            },
            body: BodySyntax::java(),
            opener: Opener::Brace,
            attributes: Some(re(r"^@(?:[\w.]+)")?),
            ignore: patterns(&[r"^(?:package|import)\s"])?,
            containers: Vec::new(),
            types: vec![
                TypeTemplate {
                    head: re(&format!(r"^{}(?P<kind>class|interface|record)\s+(?P<name>\w+)", mods))?,
                    tail: re(
                        r"(?s)^\s*(?:extends\s+(?P<extends>.+?))?\s*(?:implements\s+(?P<implements>.+?))?\s*(?:permits\s+.+?)?\s*$",
                    )?,
                    kind: None,
                    parens: Some(ParenRole::Fields),
                    members: Members::Items,
                },
                TypeTemplate {
                    head: re(&format!(r"^{}(?P<kind>enum)\s+(?P<name>\w+)", mods))?,
                    tail: re(r"(?s)^\s*(?:implements\s+(?P<implements>.+?))?\s*$")?,
                    kind: None,
                    parens: None,
                    members: Members::Variants,
                },
            ],
            impls: Vec::new(),
            functions: vec![function(
                &format!(
                    r"(?s)^{}(?:(?P<generics><.*?>)\s*)?(?:(?P<ret>{})\s+)?(?P<name>[A-Za-z_$][\w$]*)\s*$",
                    mods, ty
                ),
                r"(?s)^\s*(?:throws\s+(?P<throws>.+?))?\s*(?:default\s+.+)?;?$",
                Scope::Member,
            )?],
            embedded: None,
            fields: vec![field(
                &format!(
                    r"(?s)^{}(?P<type>{})\s+(?P<name>[A-Za-z_$][\w$]*)\s*{}\s*;$",
                    mods, ty, DEFAULT
                ),
                Scope::Member,
            )?],
            variant: re(r"(?s)^(?P<name>\w+)\s*$")?,
            base_rule: BaseRule::InterfacePrefix,
            base_separator: b',',
            marker_bases: &[("Object", BaseMarker::Ignore)],
            params: ParamStyle::TypeName,
            receiver_param: None,
            explicit_receiver: false,
            missing_return: MissingReturn::Void,
            result_errors: false,
            multi_return_errors: false,
            visibility_words: &[
                ("public", Visibility::Public),
                ("protected", Visibility::Protected),
                ("private", Visibility::Private),
            ],
            top_level_visibility: Visibility::Internal,
            member_visibility: Visibility::Internal,
            visibility_by_case: false,
            underscore_private: false,
            static_words: &["static"],
            abstract_words: &["abstract"],
            async_words: &[],
            immutable_words: &["final"],
            mutable_words: &[],
            kind_words: DEFAULT_KINDS,
            async_wrappers: &["CompletableFuture", "Future"],
            constructor_names: &[],
            class_name_constructors: true,
            docstrings: false,
            constructor_fields: false,
            int_literal: "int32",
        })
    }

    pub fn csharp() -> Result<Self> {
        let mods = format!(r"(?P<mods>(?:(?:{})\s+)*)", CSHARP_MODS);
        let ty = r"[\w.]+(?:\s*<.*>)?\??(?:\s*\[\s*,*\s*\])*\??";
        Ok(Self {
            language: "csharp",
            extensions: &["cs"],
            strip: Self::c_like_strip(false),
            scan: ScanRules {
                newline_terminates: false,
                indentation: false,
            },
            body: BodySyntax::csharp(),
            opener: Opener::Brace,
            attributes: Some(re(r"^\[")?),
            ignore: patterns(&[r"^using\s", r"^namespace\s+[\w.]+\s*;$"])?,
            containers: patterns(&[r"(?s)^namespace\s+[\w.]+\s*\{(?P<members>.*)\}$"])?,
            types: vec![
                TypeTemplate {
                    head: re(&format!(
                        r"^{}(?P<kind>class|struct|interface|record(?:\s+(?:class|struct))?)\s+(?P<name>\w+)",
                        mods
                    ))?,
                    tail: re(r"(?s)^\s*(?::\s*(?P<bases>.+?))?\s*(?:where\s+.+)?;?$")?,
                    kind: None,
                    parens: Some(ParenRole::Fields),
                    members: Members::Items,
                },
                TypeTemplate {
                    head: re(&format!(r"^{}(?P<kind>enum)\s+(?P<name>\w+)", mods))?,
                    tail: re(r"(?s)^\s*(?::\s*\w+)?\s*$")?,
                    kind: None,
                    parens: None,
                    members: Members::Variants,
                },
            ],
            impls: Vec::new(),
            functions: vec![function(
                &format!(
                    r"(?s)^{}(?:(?P<ret>{})\s+)?(?P<name>[A-Za-z_]\w*)\s*(?P<generics><.*>)?\s*$",
                    mods, ty
                ),
                r"(?s)^\s*(?::\s*(?:base|this)\s*\(.*?\))?\s*(?:where\s+.+?)?\s*(?:=>\s*(?P<expr>.*?))?;?$",
                Scope::Member,
            )?],
            embedded: None,
            fields: vec![
                field(
                    &format!(
                        r"(?s)^{}(?P<type>{})\s+(?P<name>[A-Za-z_]\w*)\s*\{{\s*(?:(?:public|private|protected|internal)\s+)?get\s*;\s*(?:(?:(?:public|private|protected|internal)\s+)?(?P<set>set|init)\s*;\s*)?\}}$",
                        mods, ty
                    ),
                    Scope::Member,
                )?,
                field(
                    &format!(r"(?s)^{}(?P<type>{})\s+(?P<name>[A-Za-z_]\w*)\s*{}\s*;$", mods, ty, DEFAULT),
                    Scope::Member,
                )?,
            ],
            variant: re(r"(?s)^(?P<name>\w+)\s*(?:=\s*.+)?$")?,
            base_rule: BaseRule::InterfacePrefix,
            base_separator: b',',
            marker_bases: &[("object", BaseMarker::Ignore), ("Object", BaseMarker::Ignore)],
            params: ParamStyle::TypeName,
            receiver_param: None,
            explicit_receiver: false,
            missing_return: MissingReturn::Void,
            result_errors: false,
            multi_return_errors: false,
            visibility_words: &[
                ("public", Visibility::Public),
                ("protected", Visibility::Protected),
                ("internal", Visibility::Internal),
                ("private", Visibility::Private),
            ],
            top_level_visibility: Visibility::Internal,
            member_visibility: Visibility::Private,
            visibility_by_case: false,
            underscore_private: false,
            static_words: &["static", "const"],
            abstract_words: &["abstract"],
            async_words: &["async"],
            immutable_words: &["readonly", "const"],
            mutable_words: &[],
            kind_words: DEFAULT_KINDS,
            async_wrappers: &["Task", "ValueTask"],
            constructor_names: &[],
            class_name_constructors: true,
            docstrings: false,
            constructor_fields: false,
            int_literal: "int32",
        })
    }

    pub fn go() -> Result<Self> {
        Ok(Self {
            language: "go",
            extensions: &["go"],
            strip: Self::c_like_strip(true),
            scan: ScanRules {
                newline_terminates: true,
                indentation: false,
            },
            body: BodySyntax::go(),
            opener: Opener::Brace,
            attributes: None,
            ignore: patterns(&[r"^package\s", r"^import\b"])?,
            containers: patterns(&[r"(?s)^(?P<mods>var|const)\s*\((?P<members>.*)\)$"])?,
            types: vec![TypeTemplate {
                head: re(r"^type\s+(?P<name>\w+)")?,
                tail: re(r"^\s*(?P<kind>struct|interface)\s*$")?,
                kind: None,
                parens: None,
                members: Members::Items,
            }],
            impls: Vec::new(),
            functions: vec![
                function(
                    r"(?s)^func\s*(?:\((?P<receiver>[^)]*)\)\s*)?(?P<name>\w+)\s*(?P<generics>\[.*\])?\s*$",
                    r"(?s)^\s*(?P<ret>.*?)\s*$",
                    Scope::TopLevel,
                )?,
                function(r"^(?P<name>\w+)\s*$", r"(?s)^\s*(?P<ret>.*?)\s*$", Scope::Member)?,
            ],
            embedded: Some(re(r"^(?P<name>\*?[\w.]+(?:\[.*\])?)$")?),
            fields: vec![
                field(
                    &format!(
                        r"(?s)^(?P<mods>var|const)\s+(?P<name>\w+(?:\s*,\s*\w+)*)(?:\s+(?P<type>[^=]+?))?\s*{}$",
                        DEFAULT
                    ),
                    Scope::TopLevel,
                )?,
                field(
                    &format!(r"(?s)^(?P<name>\w+(?:\s*,\s*\w+)*)(?:\s+(?P<type>[^=]+?))?\s*{}$", DEFAULT),
                    Scope::Grouped,
                )?,
                field(
                    r#"(?s)^(?P<name>\w+(?:\s*,\s*\w+)*)\s+(?P<type>[^`"]+?)\s*(?:`[^`]*`|"[^"]*")?$"#,
                    Scope::Member,
                )?,
            ],
            variant: re(r"^(?P<name>\w+)$")?,
            base_rule: BaseRule::AllClasses,
            base_separator: b',',
            marker_bases: &[],
            params: ParamStyle::Go,
            receiver_param: None,
            explicit_receiver: false,
            missing_return: MissingReturn::Void,
            result_errors: false,
            multi_return_errors: true,
            visibility_words: &[],
            top_level_visibility: Visibility::Internal,
            member_visibility: Visibility::Internal,
            visibility_by_case: true,
            underscore_private: false,
            static_words: &[],
            abstract_words: &[],
            async_words: &[],
            immutable_words: &["const"],
            mutable_words: &[],
            kind_words: DEFAULT_KINDS,
            async_wrappers: &[],
            constructor_names: &[],
            class_name_constructors: false,
            docstrings: false,
            constructor_fields: false,
            int_literal: "int64",
        })
    }

    pub fn typescript() -> Result<Self> {
        let member_mods = r"(?P<mods>(?:(?:public|private|protected|static|readonly|declare|override|abstract|async|accessor)\s+)*)";
        Ok(Self {
            language: "typescript",
            extensions: &["ts", "tsx", "mts", "cts"],
            strip: Self::c_like_strip(true),
            scan: ScanRules {
                newline_terminates: true,
                indentation: false,
            },
            body: BodySyntax::typescript(),
            opener: Opener::Brace,
            attributes: Some(re(r"^@(?:[\w.]+)")?),
            ignore: patterns(&[
                r"^import[\s{*]",
                r"^export\s*(?:type\s*)?\{",
                r"^export\s*\*",
                r"^export\s+default\s+[\w$.]+\s*;?$",
                r#"^(?:"[^"]*"|'[^']*')\s*;?$"#,
            ])?,
            containers: patterns(&[
                r"(?s)^(?:export\s+)?(?:declare\s+)?(?:namespace|module)\s+[\w.$]+\s*\{(?P<members>.*)\}$",
            ])?,
            types: vec![
                TypeTemplate {
                    head: re(r"^(?P<mods>(?:(?:export|default|declare|abstract)\s+)*)(?P<kind>class|interface)\s+(?P<name>[\w$]+)")?,
                    tail: re(r"(?s)^\s*(?:extends\s+(?P<extends>.+?))?\s*(?:implements\s+(?P<implements>.+?))?\s*$")?,
                    kind: None,
                    parens: None,
                    members: Members::Items,
                },
                TypeTemplate {
                    head: re(r"^(?P<mods>(?:(?:export|declare|const)\s+)*)(?P<kind>enum)\s+(?P<name>[\w$]+)")?,
                    tail: re(r"^\s*$")?,
                    kind: None,
                    parens: None,
                    members: Members::Variants,
                },
                TypeTemplate {
                    head: re(r"^(?P<mods>(?:(?:export|declare)\s+)*)type\s+(?P<name>[\w$]+)")?,
                    tail: re(r"^\s*=\s*$")?,
                    kind: Some(TypeKind::Interface),
                    parens: None,
                    members: Members::Items,
                },
            ],
            impls: Vec::new(),
            functions: vec![
                function(
                    r"(?s)^(?P<mods>(?:(?:export|default|declare|async)\s+)*)function\s*\*?\s*(?P<name>[\w$]+)\s*(?P<generics><.*>)?\s*$",
                    r"(?s)^\s*(?::\s*(?P<ret>.+?))?\s*;?$",
                    Scope::TopLevel,
                )?,
                function(
                    r"(?s)^(?P<mods>(?:(?:export|declare)\s+)*)(?P<kw>const|let|var)\s+(?P<name>[\w$]+)\s*(?::\s*[^=]+)?=\s*(?P<async>async\s+)?(?P<generics><.*>)?\s*$",
                    r"(?s)^\s*(?::\s*(?P<ret>.+?))?\s*=>\s*(?P<expr>.*?)\s*;?$",
                    Scope::TopLevel,
                )?,
                function(
                    &format!(
                        r"(?s)^{}(?:(?:get|set)\s+)?(?P<name>#?[\w$]+)\s*\??\s*(?P<generics><.*>)?\s*$",
                        member_mods
                    ),
                    r"(?s)^\s*(?::\s*(?P<ret>.+?))?\s*;?$",
                    Scope::Member,
                )?,
            ],
            embedded: None,
            fields: vec![
                field(
                    &format!(
                        r"(?s)^(?P<mods>(?:(?:export|declare)\s+)*)(?P<kw>const|let|var)\s+(?P<name>[\w$]+)\s*(?::\s*(?P<type>.+?))?\s*{}\s*;?$",
                        DEFAULT
                    ),
                    Scope::TopLevel,
                )?,
                field(
                    &format!(
                        r"(?s)^{}(?P<name>#?[\w$]+)\s*(?P<opt>[?!])?\s*(?::\s*(?P<type>.+?))?\s*{}\s*[;,]?$",
                        member_mods, DEFAULT
                    ),
                    Scope::Member,
                )?,
            ],
            variant: re(r"(?s)^(?P<name>[\w$]+)\s*(?:=\s*.+)?$")?,
            base_rule: BaseRule::InterfacePrefix,
            base_separator: b',',
            marker_bases: &[],
            params: ParamStyle::NameColonType,
            receiver_param: Some(re(r"^this\s*:")?),
            explicit_receiver: false,
            missing_return: MissingReturn::Infer,
            result_errors: false,
            multi_return_errors: false,
            visibility_words: &[
                ("export", Visibility::Public),
                ("public", Visibility::Public),
                ("protected", Visibility::Protected),
                ("private", Visibility::Private),
            ],
            top_level_visibility: Visibility::Internal,
            member_visibility: Visibility::Public,
            visibility_by_case: false,
            underscore_private: false,
            static_words: &["static"],
            abstract_words: &["abstract"],
            async_words: &["async"],
            immutable_words: &["const", "readonly"],
            mutable_words: &[],
            kind_words: DEFAULT_KINDS,
            async_wrappers: &["Promise"],
            constructor_names: &["constructor"],
            class_name_constructors: false,
            docstrings: false,
            constructor_fields: false,
            int_literal: "float64",
        })
    }

    /// TypeScript templates without annotations
    pub fn javascript() -> Result<Self> {
        Ok(Self {
            language: "javascript",
            extensions: &["js", "jsx", "mjs", "cjs"],
            constructor_fields: true,
            ..Self::typescript()?
        })
    }

    pub fn kotlin() -> Result<Self> {
        let mods = format!(r"(?P<mods>(?:(?:{})\s+)*)", KOTLIN_MODS);
        Ok(Self {
            language: "kotlin",
            extensions: &["kt", "kts"],
            strip: Self::c_like_strip(false),
            scan: ScanRules {
                newline_terminates: true,
                indentation: false,
            },
            body: BodySyntax::kotlin(),
            opener: Opener::Brace,
            attributes: Some(re(r"^@(?:[\w.:]+)")?),
            ignore: patterns(&[r"^(?:package|import)\s", r"^@file\s*:"])?,
            containers: patterns(&[
                r"(?s)^(?:(?:public|private|internal)\s+)?(?P<mods>companion)\s+object(?:\s+\w+)?\s*\{(?P<members>.*)\}$",
            ])?,
            types: vec![TypeTemplate {
                head: re(&format!(r"^{}(?P<kind>class|interface|object)\s+(?P<name>\w+)", mods))?,
                tail: re(r"(?s)^\s*(?:(?:public|private|protected|internal)?\s*constructor\s*)?(?::\s*(?P<bases>.+?))?\s*(?:where\s+.+)?$")?,
                kind: None,
                parens: Some(ParenRole::Fields),
                members: Members::Items,
            }],
            impls: Vec::new(),
            functions: vec![
                function(
                    &format!(
                        r"(?s)^{}fun\s+(?:(?P<generics><.*?>)\s*)?(?:(?P<receiver>[\w.]+(?:<.*?>)?\??)\.)?(?P<name>\w+)\s*$",
                        mods
                    ),
                    r"(?s)^\s*(?::\s*(?P<ret>.+?))?\s*(?:where\s+.+?)?\s*(?:=\s*(?P<expr>.*))?$",
                    Scope::Any,
                )?,
                function(
                    r"^(?P<mods>(?:(?:public|private|protected|internal)\s+)*)(?P<name>constructor)\s*$",
                    r"(?s)^\s*(?::\s*(?:this|super)\s*\(.*\))?\s*$",
                    Scope::Member,
                )?,
            ],
            embedded: None,
            fields: vec![field(
                &format!(
                    r"(?s)^{}(?P<kw>val|var)\s+(?P<name>\w+)\s*(?::\s*(?P<type>[^=]+?))?\s*{}$",
                    mods, DEFAULT
                ),
                Scope::Any,
            )?],
            variant: re(r"(?s)^(?P<name>\w+)\s*$")?,
            base_rule: BaseRule::Invoked,
            base_separator: b',',
            marker_bases: &[("Any", BaseMarker::Ignore)],
            params: ParamStyle::NameColonType,
            receiver_param: None,
            explicit_receiver: false,
            missing_return: MissingReturn::Void,
            result_errors: false,
            multi_return_errors: false,
            visibility_words: &[
                ("public", Visibility::Public),
                ("protected", Visibility::Protected),
                ("internal", Visibility::Internal),
                ("private", Visibility::Private),
            ],
            top_level_visibility: Visibility::Public,
            member_visibility: Visibility::Public,
            visibility_by_case: false,
            underscore_private: false,
            static_words: &["companion", "const"],
            abstract_words: &["abstract"],
            async_words: &["suspend"],
            immutable_words: &["val"],
            mutable_words: &["var"],
            kind_words: DEFAULT_KINDS,
            async_wrappers: &["Deferred"],
            constructor_names: &["constructor"],
            class_name_constructors: false,
            docstrings: false,
            constructor_fields: false,
            int_literal: "int32",
        })
    }

    /// Explicit visibility named by any of `words`
    pub fn visibility_of(&self, words: &[String]) -> Option<Visibility> {
        words.iter().find_map(|word| {
            self.visibility_words.iter().find_map(|(spelling, visibility)| {
                let matches = if spelling.ends_with('(') {
                    word.starts_with(spelling)
                } else {
                    word == spelling
                };
                matches.then_some(*visibility)
            })
        })
    }

    pub fn kind_of(&self, word: &str) -> Option<TypeKind> {
        let last = word.split_whitespace().next_back()?;
        self.kind_words
            .iter()
            .find(|(spelling, _)| *spelling == last)
            .map(|(_, kind)| *kind)
    }

    pub fn has_word(list: &[&str], words: &[String]) -> bool {
        words.iter().any(|w| list.contains(&w.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAGS: &[&str] = &["rust", "python", "java", "go", "typescript", "javascript", "kotlin", "csharp"];

    #[test]
    fn test_every_table_compiles() {
        for tag in TAGS {
            let table = SyntaxTable::for_language(tag).unwrap_or_else(|e| panic!("{}: {}", tag, e));
            assert_eq!(table.language, *tag);
            assert!(!table.functions.is_empty());
        }
    }

    #[test]
    fn test_unknown_language_is_rejected() {
        let err = SyntaxTable::for_language("cobol").expect_err("no cobol");
        assert_eq!(err.kind, ErrorKind::UnsupportedLanguage);
    }

    #[test]
    fn test_rust_function_head_and_tail() {
        let table = SyntaxTable::rust().expect("table");
        let template = &table.functions[0];
        let caps = template.head.captures("pub(crate) async fn fetch<T: Into<U>>").expect("head");
        assert_eq!(&caps["name"], "fetch");
        assert_eq!(caps.name("generics").map(|m| m.as_str()), Some("<T: Into<U>>"));
        assert_eq!(table.visibility_of(&["pub(crate)".to_string()]), Some(Visibility::Internal));

        let caps = template.tail.captures(" -> Result<i32, String> where T: Clone ").expect("tail");
        assert_eq!(&caps["ret"], "Result<i32, String>");
    }

    #[test]
    fn test_java_method_head_separates_modifiers_and_return() {
        let table = SyntaxTable::java().expect("table");
        let caps = table.functions[0]
            .head
            .captures("public static <T> List<T> wrap")
            .expect("head");
        assert_eq!(&caps["mods"], "public static ");
        assert_eq!(&caps["ret"], "List<T>");
        assert_eq!(&caps["name"], "wrap");

        let ctor = table.functions[0].head.captures("public Point").expect("ctor");
        assert!(ctor.name("ret").is_none());
    }

    #[test]
    fn test_typescript_field_default_is_not_a_function_arrow() {
        let table = SyntaxTable::typescript().expect("table");
        let member = table.fields.iter().find(|f| f.scope == Scope::Member).expect("member field");
        let caps = member.pattern.captures("onChange: (value: number) => void;").expect("field");
        assert_eq!(&caps["type"], "(value: number) => void");
        assert!(caps.name("default").is_none());
    }

    #[test]
    fn test_go_method_receiver() {
        let table = SyntaxTable::go().expect("table");
        let caps = table.functions[0].head.captures("func (c *Counter) Inc").expect("head");
        assert_eq!(&caps["receiver"], "c *Counter");
        assert_eq!(&caps["name"], "Inc");
    }
}
