//! Assertions over errors and diagnostics

use polyport::{ConvertError, Diagnostics, ErrorKind};

/// Assert that an error has a specific kind
pub fn assert_error_kind(error: &ConvertError, expected_kind: ErrorKind) {
    if error.kind != expected_kind {
        panic!("Expected error kind {:?}, but got {:?}: {}", expected_kind, error.kind, error);
    }
}

/// Assert that an error message contains a substring
pub fn assert_error_contains(error: &ConvertError, substring: &str) {
    if !error.message.contains(substring) {
        panic!(
            "Expected error message to contain '{}', but got: '{}'",
            substring, error.message
        );
    }
}

/// Assert that an error starts on a given line
pub fn assert_error_line(error: &ConvertError, line: usize) {
    match &error.context.span {
        Some(span) if span.start.line == line => {}
        Some(span) => panic!("Expected error on line {}, but it starts on line {}", line, span.start.line),
        None => panic!("Expected error on line {}, but it has no span", line),
    }
}

/// Assert how many errors of `kind` were recorded
pub fn assert_diagnostic_count(diagnostics: &Diagnostics, kind: ErrorKind, expected: usize) {
    let actual = diagnostics.count_of(kind);
    if actual != expected {
        panic!("Expected {} {} diagnostic(s), found {}:\n{}", expected, kind, actual, diagnostics);
    }
}
