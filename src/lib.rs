//! Best-effort structural translation of source code between programming
//! languages.
//!
//! Every source language is extracted into one canonical [`ast::Ast`] by a
//! table-driven [`frontend::Frontend`]; every target renders that tree through
//! a [`backend::Backend`] and the shared [`mapping::MappingTable`]. Whatever
//! cannot be recognised or mapped is kept visible as an opaque node or an
//! `UNMAPPED` placeholder instead of failing the file.
//!
//! ```ignore
//! use polyport::{convert, ConversionRequest, Registry};
//!
//! let registry = Registry::builtin();
//! let request = ConversionRequest::new("def add(a: int, b: int) -> int:\n    return a + b\n", "python", "go");
//! let conversion = convert(&registry, &request)?;
//! ```

pub mod ast;
pub mod backend;
pub mod comments;
pub mod config;
pub mod engine;
pub mod error;
pub mod frontend;
pub mod lexer;
pub mod mapping;
pub mod naming;
pub mod registry;
pub mod types;

pub use ast::{Ast, NodeKind, NodeRef};
pub use backend::{Backend, Emission};
pub use config::{Options, OptionsError, Settings};
pub use engine::{convert, convert_batch, extract, Conversion, ConversionRequest, SourceFile};
pub use error::{ConvertError, Diagnostics, ErrorFormatter, ErrorKind, Result, Severity};
pub use frontend::{Extraction, Frontend, TableFrontend};
pub use mapping::MappingTable;
pub use registry::{canonical_tag, Registry};
pub use types::{TypeCategory, TypeRef};
