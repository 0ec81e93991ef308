//! Registry lookups, fan-out emission and determinism

mod common;

use common::error_assertions::{assert_error_contains, assert_error_kind};
use common::{convert_source, quiet_options, TARGETS};
use polyport::backend::{Backend, Emission};
use polyport::mapping::MappingTable;
use polyport::naming::Case;
use polyport::{canonical_tag, extract, Ast, ErrorKind, Registry, Settings, SourceFile};
use std::sync::Arc;

const SHAPES_TS: &str = "\
/** Anything with an area */
interface Shape {
    area(): number;
}

export class Square implements Shape {
    side: number = 1;

    area(): number {
        return this.side * this.side;
    }
}

export function total(shapes: Shape[]): number {
    let sum = 0;
    for (const s of shapes) {
        sum += s.area();
    }
    return sum;
}
";

#[test]
fn test_every_builtin_pair_converts() {
    let registry = Registry::builtin();
    assert_eq!(
        registry.source_languages(),
        vec!["csharp", "go", "java", "javascript", "kotlin", "python", "rust", "typescript"]
    );
    assert_eq!(registry.target_languages(), vec!["go", "java", "kotlin", "python", "rust", "typescript"]);

    for target in TARGETS {
        let conversion = convert_source(SHAPES_TS, "ts", target);
        assert!(!conversion.text.is_empty(), "{} output is empty", target);
        assert!(!conversion.diagnostics.has_errors(), "{}: {}", target, conversion.diagnostics);
    }
}

#[test]
fn test_aliases_and_extensions_resolve_to_the_same_component() {
    let registry = Registry::builtin();
    assert_eq!(canonical_tag(" Golang "), "go");
    assert_eq!(canonical_tag("C#"), "csharp");
    let by_alias = registry.frontend("py").expect("python front-end");
    let by_extension = registry.frontend_for_extension(".pyi").expect("stub extension");
    assert_eq!(by_alias.language(), by_extension.language());
    assert!(registry.frontend_for_extension("exe").is_none());
}

#[test]
fn test_unknown_tags_list_what_is_registered() {
    let registry = Registry::builtin();
    let error = registry.backend("cobol").err().expect("no cobol back-end");
    assert_error_kind(&error, ErrorKind::UnsupportedLanguage);
    assert_error_contains(&error, "cobol");
    let help = error.context.help.as_deref().unwrap_or_default();
    assert!(help.contains("kotlin"), "{}", help);
}

#[test]
fn test_c_family_sources_and_script_targets_are_not_built_in() {
    let registry = Registry::builtin();
    for tag in ["c", "cpp"] {
        let error = registry.frontend(tag).err().expect("no C-family front-end");
        assert_error_kind(&error, ErrorKind::UnsupportedLanguage);
    }
    for tag in ["javascript", "js", "csharp", "c#"] {
        let error = registry.backend(tag).err().expect("no back-end for a source-only language");
        assert_error_kind(&error, ErrorKind::UnsupportedLanguage);
        assert_error_contains(&error, tag);
    }
}

#[test]
fn test_reemitting_the_same_tree_is_identical() {
    let registry = Registry::builtin();
    let extraction = extract(&registry, &SourceFile::new(SHAPES_TS, "typescript")).expect("front-end");
    let settings = quiet_options().resolve();

    let first = registry.emit_all(&extraction.ast, TARGETS, &settings);
    let second = registry.emit_all(&extraction.ast, TARGETS, &settings);
    assert_eq!(first.len(), TARGETS.len());
    for ((tag, a), (other, b)) in first.iter().zip(&second) {
        assert_eq!(tag, other);
        let a = a.as_ref().expect("first emission");
        let b = b.as_ref().expect("second emission");
        assert_eq!(a.text, b.text, "{} output differs between runs", tag);
    }
}

#[test]
fn test_fan_out_keeps_requested_order_and_reports_bad_tags() {
    let registry = Registry::builtin();
    let ast = extract(&registry, &SourceFile::new("def f() -> int:\n    return 1\n", "python"))
        .expect("front-end")
        .ast;
    let results = registry.emit_all(&ast, &["kt", "nope", "rs"], &Settings::default());
    let tags: Vec<&str> = results.iter().map(|(tag, _)| tag.as_str()).collect();
    assert_eq!(tags, vec!["kotlin", "nope", "rust"]);
    assert!(results[1].1.is_err());
    assert!(results[2].1.as_ref().is_ok_and(|e| e.text.contains("pub fn f() -> i64 {")));
}

#[test]
fn test_rust_output_parses() {
    for (source, language) in [
        (SHAPES_TS, "typescript"),
        ("class Counter:\n    def __init__(self):\n        self.count = 0\n\n    def bump(self) -> int:\n        self.count += 1\n        return self.count\n", "python"),
        ("package main\n\ntype Point struct {\n\tX int\n\tY int\n}\n\nfunc (p *Point) Sum() int {\n\treturn p.X + p.Y\n}\n", "go"),
    ] {
        let conversion = convert_source(source, language, "rust");
        assert!(syn::parse_file(&conversion.text).is_ok(), "{} -> rust:\n{}", language, conversion.text);
    }
}

/// Back-end that only reports what it was given
struct Outline;

impl Backend for Outline {
    fn language(&self) -> &str {
        "outline"
    }

    fn extension(&self) -> &str {
        "txt"
    }

    fn file_case(&self) -> Case {
        Case::Snake
    }

    fn honored_options(&self) -> &[&'static str] {
        &[]
    }

    fn emit(&self, ast: &Ast, _settings: &Settings, _mapping: &MappingTable) -> polyport::Result<Emission> {
        let names: Vec<String> = ast
            .declarations()
            .filter_map(|node| node.as_type().map(|t| t.name.clone()).or_else(|| node.as_function().map(|f| f.name.clone())))
            .collect();
        Ok(Emission {
            text: names.join("\n"),
            diagnostics: Default::default(),
        })
    }
}

#[test]
fn test_registered_backend_joins_the_registry() {
    let mut registry = Registry::builtin();
    registry.register_backend(Arc::new(Outline));
    assert!(registry.target_languages().contains(&"outline"));

    let conversion = common::convert_with_registry(&registry, SHAPES_TS, "typescript", "outline");
    assert_eq!(conversion.text, "Shape\nSquare\ntotal");
}
