//! Selector parsing on top of the generated LALRPOP parser

use sand_ast::{ParseError, Selector, Span};
use sand_lexer::SelectorLexer;

use crate::selector_grammar::PathParser;

/// Parse a selector such as `.intro.s1.ja`
///
/// A leading `#` is accepted so selectors can be copied out of documents.
///
/// # Errors
///
/// Returns `ParseError::Selector` when the text is not a selector
pub fn parse_selector(text: &str) -> Result<Selector, ParseError> {
    let text = text.trim();
    let body = text.strip_prefix('#').unwrap_or(text);
    parse_selector_at(body, Span::new(0, text.len()))
}

/// Parse selector text found in a document; errors point at `span`
pub(crate) fn parse_selector_at(text: &str, span: Span) -> Result<Selector, ParseError> {
    PathParser::new()
        .parse(SelectorLexer::new(text))
        .map_err(|err| {
            tracing::debug!(selector = text, ?err, "rejected selector");
            ParseError::Selector(text.to_string(), span)
        })
}
