//! Construct restructuring policy per target
//!
//! Back-ends never hard-code how a construct without a direct equivalent is
//! rewritten; they read their entry here.

use crate::naming::Case;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleInheritance {
    /// `class B extends A`
    Extends,
    /// Anonymous embedding of the base (Go)
    Embed,
    /// A `base` field plus forwarding methods
    Compose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipleInheritance {
    /// All bases listed directly
    Native,
    /// The first class base is extended; the rest become interfaces that
    /// keep their method bodies as default methods
    InterfaceDefaults,
    /// As above, but interfaces only declare members, so every implementing
    /// class receives copies of the bodies
    InterfaceCopies,
    EmbedAll,
    ComposeAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorModel {
    /// `throws` clause
    Declared,
    /// Result-typed return value
    ResultValue,
    /// Extra `error` return value
    MultiReturn,
    /// Mentioned in a comment only
    Documented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncModel {
    /// `async fn` / `async def`
    Keyword,
    /// Kotlin `suspend fun`
    Suspend,
    /// Return type wrapped in the given template
    ReturnWrapper(&'static str),
    /// No cooperative concurrency; a marker comment is emitted
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyModel {
    Native,
    /// Private fields with getters, setters and a constructor
    Accessors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingConventions {
    pub types: Case,
    pub functions: Case,
    pub fields: Case,
    pub variables: Case,
    /// Public members use this case instead (Go exports)
    pub exported: Option<Case>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericSyntax {
    /// `Name<T>`
    Angle,
    /// `Name[T]`
    Bracket,
    /// `Generic[T]` base plus module-level type variables
    TypeVar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub single_inheritance: SingleInheritance,
    pub multiple_inheritance: MultipleInheritance,
    pub errors: ErrorModel,
    pub asynchrony: AsyncModel,
    pub properties: PropertyModel,
    pub naming: NamingConventions,
    pub generics: GenericSyntax,
    /// Emit a compile-time interface satisfaction check (Go)
    pub interface_assertions: bool,
}

impl Capabilities {
    pub fn rust() -> Self {
        Self {
            single_inheritance: SingleInheritance::Compose,
            multiple_inheritance: MultipleInheritance::ComposeAll,
            errors: ErrorModel::ResultValue,
            asynchrony: AsyncModel::Keyword,
            properties: PropertyModel::Accessors,
            naming: NamingConventions {
                types: Case::Pascal,
                functions: Case::Snake,
                fields: Case::Snake,
                variables: Case::Snake,
                exported: None,
            },
            generics: GenericSyntax::Angle,
            interface_assertions: false,
        }
    }

    pub fn go() -> Self {
        Self {
            single_inheritance: SingleInheritance::Embed,
            multiple_inheritance: MultipleInheritance::EmbedAll,
            errors: ErrorModel::MultiReturn,
            asynchrony: AsyncModel::Unsupported,
            properties: PropertyModel::Accessors,
            naming: NamingConventions {
                types: Case::Pascal,
                functions: Case::Camel,
                fields: Case::Camel,
                variables: Case::Camel,
                exported: Some(Case::Pascal),
            },
            generics: GenericSyntax::Bracket,
            interface_assertions: true,
        }
    }

    pub fn python() -> Self {
        Self {
            single_inheritance: SingleInheritance::Extends,
            multiple_inheritance: MultipleInheritance::Native,
            errors: ErrorModel::Documented,
            asynchrony: AsyncModel::Keyword,
            properties: PropertyModel::Native,
            naming: NamingConventions {
                types: Case::Pascal,
                functions: Case::Snake,
                fields: Case::Snake,
                variables: Case::Snake,
                exported: None,
            },
            generics: GenericSyntax::TypeVar,
            interface_assertions: false,
        }
    }

    pub fn typescript() -> Self {
        Self {
            single_inheritance: SingleInheritance::Extends,
            multiple_inheritance: MultipleInheritance::InterfaceCopies,
            errors: ErrorModel::Documented,
            asynchrony: AsyncModel::Keyword,
            properties: PropertyModel::Native,
            naming: NamingConventions {
                types: Case::Pascal,
                functions: Case::Camel,
                fields: Case::Camel,
                variables: Case::Camel,
                exported: None,
            },
            generics: GenericSyntax::Angle,
            interface_assertions: false,
        }
    }

    pub fn java() -> Self {
        Self {
            single_inheritance: SingleInheritance::Extends,
            multiple_inheritance: MultipleInheritance::InterfaceDefaults,
            errors: ErrorModel::Declared,
            asynchrony: AsyncModel::ReturnWrapper("CompletableFuture<{0}>"),
            properties: PropertyModel::Accessors,
            naming: NamingConventions {
                types: Case::Pascal,
                functions: Case::Camel,
                fields: Case::Camel,
                variables: Case::Camel,
                exported: None,
            },
            generics: GenericSyntax::Angle,
            interface_assertions: false,
        }
    }

    pub fn kotlin() -> Self {
        Self {
            single_inheritance: SingleInheritance::Extends,
            multiple_inheritance: MultipleInheritance::InterfaceDefaults,
            errors: ErrorModel::Documented,
            asynchrony: AsyncModel::Suspend,
            properties: PropertyModel::Native,
            naming: NamingConventions {
                types: Case::Pascal,
                functions: Case::Camel,
                fields: Case::Camel,
                variables: Case::Camel,
                exported: None,
            },
            generics: GenericSyntax::Angle,
            interface_assertions: false,
        }
    }
}
