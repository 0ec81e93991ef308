//! Utilities for snapshot testing with insta

use insta::Settings;
use polyport::{Conversion, Diagnostics};

/// Configure insta settings for consistent snapshots
pub fn with_settings<F>(f: F)
where
    F: FnOnce(),
{
    let mut settings = Settings::clone_current();
    settings.set_prepend_module_to_snapshot(false);
    settings.set_omit_expression(true);
    settings.bind(f);
}

/// One line per diagnostic: severity, kind and starting line
pub fn diagnostics_report(diagnostics: &Diagnostics) -> String {
    let mut lines = Vec::new();
    let tagged = diagnostics
        .errors()
        .iter()
        .map(|e| ("error", e))
        .chain(diagnostics.warnings().iter().map(|w| ("warning", w)));
    for (severity, diagnostic) in tagged {
        let line = diagnostic
            .context
            .span
            .map(|span| span.start_line().to_string())
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!("{} {} at line {}", severity, diagnostic.kind, line));
    }
    if lines.is_empty() {
        lines.push("clean".to_string());
    }
    lines.join("\n")
}

/// Summary of a batch: one line per file with its outcome
pub fn batch_report(results: &[polyport::Result<Conversion>]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(index, result)| match result {
            Ok(conversion) => format!(
                "#{}: ok, {} opaque, {} unmapped, {} error(s)",
                index,
                super::marker_count(&conversion.text, "OPAQUE"),
                super::marker_count(&conversion.text, "UNMAPPED"),
                conversion.diagnostics.error_count()
            ),
            Err(e) => format!("#{}: failed, {}", index, e.kind),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_diagnostics_report_is_clean() {
        assert_eq!(diagnostics_report(&Diagnostics::new()), "clean");
    }
}
