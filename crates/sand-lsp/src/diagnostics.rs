use sand_ast::{ParseError, Span};
use sand_parser::Parser;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity};

use crate::position::span_to_range;

pub const SOURCE: &str = "sand";

/// Every parse and validation error of `text`
#[must_use]
pub fn diagnostics(text: &str) -> Vec<Diagnostic> {
    let (_, errors) = Parser::new(text).parse_recovering();
    errors
        .iter()
        .map(|err| to_diagnostic(text, err))
        .collect()
}

#[must_use]
pub fn to_diagnostic(text: &str, error: &ParseError) -> Diagnostic {
    // errors without a location sit on the first character
    let span = error
        .span()
        .unwrap_or_else(|| Span::new(0, text.chars().next().map_or(0, char::len_utf8)));

    Diagnostic {
        range: span_to_range(text, span),
        severity: Some(DiagnosticSeverity::ERROR),
        source: Some(SOURCE.to_string()),
        message: error.to_string(),
        ..Diagnostic::default()
    }
}
