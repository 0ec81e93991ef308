//! Degrade-not-fail behavior for single files and batches

mod common;

use common::error_assertions::{assert_diagnostic_count, assert_error_kind, assert_error_line};
use common::snapshot_utils::{batch_report, diagnostics_report, with_settings};
use common::{assert_contains, convert_source, marker_count, quiet_options, TARGETS};
use insta::assert_snapshot;
use polyport::ast::query::AstQuery;
use polyport::{convert_batch, extract, ErrorKind, Registry, SourceFile};

const MACRO: &str = "macro_rules! twice { ($e:expr) => { $e * 2 } }";

fn numbered_function(n: usize) -> String {
    format!("pub fn f{n}(a: i64) -> i64 {{\n    return a + {n};\n}}\n")
}

/// Nine functions with an unparseable item in the middle, on line 17
fn nine_and_one() -> String {
    let mut items: Vec<String> = (1..=9).map(numbered_function).collect();
    items.insert(4, format!("{}\n", MACRO));
    items.join("\n")
}

#[test]
fn test_one_bad_declaration_among_nine() {
    let source = nine_and_one();
    for target in TARGETS {
        let conversion = convert_source(&source, "rust", target);
        assert_eq!(
            marker_count(&conversion.text, "OPAQUE"),
            1,
            "{} output:\n{}",
            target,
            conversion.text
        );
        assert_eq!(marker_count(&conversion.text, "UNMAPPED"), 0, "{}", conversion.text);
        assert_diagnostic_count(&conversion.diagnostics, ErrorKind::ParseError, 1);
    }

    let rust = convert_source(&source, "rust", "rust");
    for n in 1..=9 {
        assert_contains(&rust.text, &format!("pub fn f{}(a: i64) -> i64 {{", n));
    }
    assert_contains(&rust.text, &format!("// OPAQUE: {}", MACRO));
    assert!(syn::parse_file(&rust.text).is_ok(), "{}", rust.text);
}

#[test]
fn test_tree_keeps_the_bad_declaration_in_place() {
    let registry = Registry::builtin();
    let extraction = extract(&registry, &SourceFile::new(nine_and_one(), "rust")).expect("front-end");
    let opaque = AstQuery::opaque_declarations(&extraction.ast);
    assert_eq!(opaque.len(), 1);
    assert!(opaque[0].opaque_text().is_some_and(|text| text.trim() == MACRO));
    let kinds: Vec<&str> = extraction.ast.declarations().map(|n| n.kind().name()).collect();
    assert_eq!(kinds.len(), 10);
    assert_eq!(kinds[4], "opaque");
    assert_eq!(AstQuery::declarations(extraction.ast.root()).len(), 9);
    assert_eq!(extraction.unparsed_spans().len(), 1);
}

#[test]
fn test_opaque_span_is_reported_where_it_starts() {
    let conversion = convert_source(&nine_and_one(), "rust", "python");
    let error = &conversion.diagnostics.errors()[0];
    assert_error_kind(error, ErrorKind::ParseError);
    assert_error_line(error, 17);
    with_settings(|| {
        assert_snapshot!(diagnostics_report(&conversion.diagnostics), @"error parse error at line 17");
    });
}

#[test]
fn test_opaque_text_is_hidden_without_comment_preservation() {
    let options = quiet_options().with(polyport::config::PRESERVE_COMMENTS, false);
    let conversion = common::convert_with(&nine_and_one(), "rust", "go", options);
    assert_contains(&conversion.text, "// OPAQUE: source lines 17-");
    assert!(!conversion.text.contains("macro_rules!"), "{}", conversion.text);
}

#[test]
fn test_unmapped_type_becomes_marked_placeholder() {
    let source = "def show(value: Union[int, str]) -> None:\n    pass\n";
    let conversion = convert_source(source, "python", "go");
    assert_contains(&conversion.text, "value interface{} /* UNMAPPED: union<int64, string> */");
    assert_diagnostic_count(&conversion.diagnostics, ErrorKind::TranslationError, 1);

    // TypeScript has unions, so nothing is lost there
    let typescript = convert_source(source, "python", "typescript");
    assert_contains(&typescript.text, "value: number | string");
    assert!(!typescript.diagnostics.has_errors(), "{}", typescript.diagnostics);
}

#[test]
fn test_batch_of_ten_with_one_malformed_file() {
    let registry = Registry::builtin();
    let mut files: Vec<SourceFile> = (1..=10)
        .map(|n| SourceFile::new(numbered_function(n), "rust"))
        .collect();
    files[7] = SourceFile::new(format!("{}\n\n{}", MACRO, numbered_function(8)), "rust");

    let results = convert_batch(&registry, &files, "go", &quiet_options());
    assert_eq!(results.len(), 10);
    with_settings(|| {
        assert_snapshot!(batch_report(&results), @r"
        #0: ok, 0 opaque, 0 unmapped, 0 error(s)
        #1: ok, 0 opaque, 0 unmapped, 0 error(s)
        #2: ok, 0 opaque, 0 unmapped, 0 error(s)
        #3: ok, 0 opaque, 0 unmapped, 0 error(s)
        #4: ok, 0 opaque, 0 unmapped, 0 error(s)
        #5: ok, 0 opaque, 0 unmapped, 0 error(s)
        #6: ok, 0 opaque, 0 unmapped, 0 error(s)
        #7: ok, 1 opaque, 0 unmapped, 1 error(s)
        #8: ok, 0 opaque, 0 unmapped, 0 error(s)
        #9: ok, 0 opaque, 0 unmapped, 0 error(s)
        ");
    });

    let degraded = results[7].as_ref().expect("degraded file still converts");
    assert_contains(&degraded.text, "func F8(a int64) int64 {");
}

#[test]
fn test_batch_records_unknown_language_and_continues() {
    let registry = Registry::builtin();
    let files = vec![
        SourceFile::new(numbered_function(1), "rust"),
        SourceFile::new("IDENTIFICATION DIVISION.", "cobol"),
        SourceFile::new("def g() -> int:\n    return 2\n", "python"),
    ];
    let results = convert_batch(&registry, &files, "kotlin", &quiet_options());
    with_settings(|| {
        assert_snapshot!(batch_report(&results), @r"
        #0: ok, 0 opaque, 0 unmapped, 0 error(s)
        #1: failed, unsupported language
        #2: ok, 0 opaque, 0 unmapped, 0 error(s)
        ");
    });
}

#[test]
fn test_batch_to_unknown_target_fails_every_file() {
    let registry = Registry::builtin();
    let files = vec![SourceFile::new(numbered_function(1), "rust")];
    let results = convert_batch(&registry, &files, "fortran", &quiet_options());
    let error = results[0].as_ref().expect_err("no fortran back-end");
    assert_error_kind(error, ErrorKind::UnsupportedLanguage);
}

const LOADER_PY: &str = "\
class Loader:
    print(\"loaded\")

    def load(self) -> int:
        return 1
";

const IO_JAVA: &str = "\
class Io {
    public async void x() {}

    public int y() {
        return 1;
    }
}
";

#[test]
fn test_unparsed_member_is_marked_inside_its_type() {
    for (source, language, member) in [(LOADER_PY, "python", "print(\"loaded\")"), (IO_JAVA, "java", "public async void x() {}")] {
        for target in TARGETS {
            let conversion = convert_source(source, language, target);
            assert_eq!(marker_count(&conversion.text, "OPAQUE"), 1, "{} -> {}:\n{}", language, target, conversion.text);
            assert_contains(&conversion.text, &format!("OPAQUE: {}", member));
            assert_diagnostic_count(&conversion.diagnostics, ErrorKind::ParseError, 1);
        }
    }

    let rust = convert_source(LOADER_PY, "python", "rust");
    assert_contains(&rust.text, "pub struct Loader {\n    // OPAQUE: print(\"loaded\")\n}");
    assert!(syn::parse_file(&rust.text).is_ok(), "{}", rust.text);

    let go = convert_source(IO_JAVA, "java", "go");
    assert_contains(&go.text, "type Io struct {\n\t// OPAQUE: public async void x() {}\n}");
}
