//! String processing utilities for Sand content
//!
//! Block content is stored raw; these helpers turn it into output text.

/// Collapse every run of whitespace (newlines included) into one space and
/// trim both ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode Sand escapes
///
/// `\n` becomes a newline; `\#`, `\\`, `\/`, `\[`, `\]`, `\{` and `\}` become
/// the escaped character. Unknown escapes are kept verbatim.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(escaped @ ('#' | '\\' | '/' | '[' | ']' | '{' | '}')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

/// Whitespace-collapse, then decode escapes
///
/// The order matters: `\n` must survive collapsing so it can become a line
/// break afterwards.
pub fn content_text(raw: &str) -> String {
    unescape(&collapse_whitespace(raw))
}

/// Check that a string is a valid name or alias
///
/// Identifiers start with an ASCII letter or underscore, followed by ASCII
/// letters, digits or underscores
pub fn is_identifier(text: &str) -> bool {
    !text.is_empty() && sand_lexer::ident_len(text) == text.len()
}

/// Alias written between the `#` and the delimiter of a command head
pub fn head_alias(head: &str) -> Option<String> {
    let body = head.strip_prefix('#')?;
    let len = sand_lexer::ident_len(body);
    (len > 0).then(|| body[..len].to_string())
}
