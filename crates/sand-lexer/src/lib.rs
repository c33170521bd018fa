//! Lexical analysis for Sand documents and selectors
//!
//! Document text is mostly prose, so the lexer only splits out the
//! characters that can open or close a construct. Everything after a `#` is
//! classified by a callback that consumes the command head in one token.

use logos::Logos;
use sand_ast::Span;

/// What a `#` introduces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `#(`
    Names,
    /// `#alias##`, `###`
    Section,
    /// `#alias[`, `#[`
    Sentences,
    /// `#alias{`, `#{`
    Apply,
    /// `#.path.name`, `#./path.`
    Selector,
    /// `#` followed by nothing we understand
    Stray,
}

/// Document tokens
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Token {
    /// Command head, including alias and opening delimiter
    #[token("#", command)]
    Command(CommandKind),

    /// Backslash plus the escaped character
    #[token("\\", escape)]
    Escape,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,

    #[token("\n")]
    Newline,

    /// Run of ordinary characters, whitespace included
    #[regex(r"[^#\\\[\]{}),\n]+")]
    Text,

    /// End of input
    Eof,

    /// Lexer error
    Error,
}

fn command(lex: &mut logos::Lexer<'_, Token>) -> CommandKind {
    let rest = lex.remainder();
    let bytes = rest.as_bytes();

    match bytes.first() {
        Some(b'(') => {
            lex.bump(1);
            return CommandKind::Names;
        }
        Some(b'.') => {
            lex.bump(selector_len(rest));
            return CommandKind::Selector;
        }
        _ => {}
    }

    let alias = ident_len(rest);
    match bytes.get(alias) {
        Some(b'#') => {
            let hashes = bytes[alias..].iter().take_while(|&&b| b == b'#').count();
            lex.bump(alias + hashes);
            CommandKind::Section
        }
        Some(b'[') => {
            lex.bump(alias + 1);
            CommandKind::Sentences
        }
        Some(b'{') => {
            lex.bump(alias + 1);
            CommandKind::Apply
        }
        _ => CommandKind::Stray,
    }
}

fn escape(lex: &mut logos::Lexer<'_, Token>) {
    match lex.remainder().chars().next() {
        Some('\n') | None => {}
        Some(ch) => lex.bump(ch.len_utf8()),
    }
}

/// Length of a leading identifier: `[A-Za-z_][A-Za-z0-9_]*`
#[must_use]
pub fn ident_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => {}
        _ => return 0,
    }
    bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
        .count()
}

/// Length of the selector body starting at the leading `.`
fn selector_len(text: &str) -> usize {
    let mut len = 1;
    if text[len..].starts_with('/') {
        len += 1;
    }
    len + text[len..]
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'.')
        .count()
}

/// Token with location information
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
    pub text: String,
}

/// Lexer that produces tokens with spans
pub struct Lexer<'input> {
    lexer: logos::Lexer<'input, Token>,
    input: &'input str,
}

impl<'input> Lexer<'input> {
    #[must_use]
    pub fn new(input: &'input str) -> Self {
        Self {
            lexer: Token::lexer(input),
            input,
        }
    }

    /// Get the next token with span information
    pub fn next_token(&mut self) -> SpannedToken {
        match self.lexer.next() {
            Some(result) => {
                let span = self.lexer.span();
                let text = self.input[span.clone()].to_string();
                SpannedToken {
                    token: result.unwrap_or(Token::Error),
                    span: Span::new(span.start, span.end),
                    text,
                }
            }
            None => SpannedToken {
                token: Token::Eof,
                span: Span::new(self.input.len(), self.input.len()),
                text: String::new(),
            },
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Vec<SpannedToken> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.token == Token::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

/// Selector tokens: `./intro.0.ja`
#[derive(Logos, Debug, PartialEq, Eq, Clone)]
pub enum SelectorToken {
    #[token(".")]
    Dot,

    #[token("/")]
    Slash,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<usize>().ok())]
    Number(usize),
}

/// Unexpected input inside a selector
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unexpected `{text}` in selector")]
pub struct LexError {
    pub text: String,
    pub span: Span,
}

/// Selector token stream in the `(start, token, end)` shape the generated
/// parser consumes
pub struct SelectorLexer<'input> {
    lexer: logos::Lexer<'input, SelectorToken>,
}

impl<'input> SelectorLexer<'input> {
    #[must_use]
    pub fn new(input: &'input str) -> Self {
        Self {
            lexer: SelectorToken::lexer(input),
        }
    }
}

impl Iterator for SelectorLexer<'_> {
    type Item = Result<(usize, SelectorToken, usize), LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.lexer.next()?;
        let span = self.lexer.span();
        Some(match token {
            Ok(token) => Ok((span.start, token, span.end)),
            Err(()) => Err(LexError {
                text: self.lexer.slice().to_string(),
                span: Span::new(span.start, span.end),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .tokenize()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_names_declaration() {
        let tokens = Lexer::new("#(en, ja)").tokenize();

        assert_eq!(tokens.len(), 6); // #(, en, ",", " ja", ), EOF
        assert_eq!(tokens[0].token, Token::Command(CommandKind::Names));
        assert_eq!(tokens[0].text, "#(");
        assert_eq!(tokens[1].token, Token::Text);
        assert_eq!(tokens[1].text, "en");
        assert_eq!(tokens[2].token, Token::Comma);
        assert_eq!(tokens[3].text, " ja");
        assert_eq!(tokens[4].token, Token::RParen);
        assert_eq!(tokens[5].token, Token::Eof);
    }

    #[test]
    fn test_command_heads() {
        let test_cases = vec![
            ("#sentence##", CommandKind::Section),
            ("###", CommandKind::Section),
            ("#s1[", CommandKind::Sentences),
            ("#[", CommandKind::Sentences),
            ("#{", CommandKind::Apply),
            ("#all_{", CommandKind::Apply),
            ("#.sentence.s1.", CommandKind::Selector),
            ("#./0.ja", CommandKind::Selector),
            ("#.", CommandKind::Selector),
        ];

        for (input, expected) in test_cases {
            let tokens = Lexer::new(input).tokenize();
            assert_eq!(tokens.len(), 2, "{input}");
            assert_eq!(tokens[0].token, Token::Command(expected), "{input}");
            assert_eq!(tokens[0].text, input);
        }
    }

    #[test]
    fn test_stray_hash_consumes_only_itself() {
        let tokens = Lexer::new("#tag rest").tokenize();
        assert_eq!(tokens[0].token, Token::Command(CommandKind::Stray));
        assert_eq!(tokens[0].text, "#");
        assert_eq!(tokens[1].token, Token::Text);
        assert_eq!(tokens[1].text, "tag rest");
    }

    #[test]
    fn test_selector_stops_at_prose() {
        let tokens = Lexer::new("#.sentence.s1.ja 違う").tokenize();
        assert_eq!(tokens[0].text, "#.sentence.s1.ja");
        assert_eq!(tokens[1].text, " 違う");
    }

    #[test]
    fn test_escapes() {
        let tokens = Lexer::new(r"\#\# x\]").tokenize();
        assert_eq!(tokens[0].token, Token::Escape);
        assert_eq!(tokens[0].text, r"\#");
        assert_eq!(tokens[1].token, Token::Escape);
        assert_eq!(tokens[2].text, " x");
        assert_eq!(tokens[3].text, r"\]");

        // a trailing backslash escapes nothing
        let tokens = Lexer::new("a\\\nb").tokenize();
        assert_eq!(tokens[1].token, Token::Escape);
        assert_eq!(tokens[1].text, "\\");
        assert_eq!(tokens[2].token, Token::Newline);
    }

    #[test]
    fn test_sentence_block_tokens() {
        assert_eq!(
            kinds("#s1[\n\tThank you!\n][ありがとう]"),
            vec![
                Token::Command(CommandKind::Sentences),
                Token::Newline,
                Token::Text,
                Token::Newline,
                Token::RBracket,
                Token::LBracket,
                Token::Text,
                Token::RBracket,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_span_tracking_with_multibyte_text() {
        let tokens = Lexer::new("文#[a]").tokenize();
        assert_eq!(tokens[0].span, Span::new(0, 3));
        assert_eq!(tokens[1].span, Span::new(3, 5));
        assert_eq!(tokens[2].span, Span::new(5, 6));
    }

    #[test]
    fn test_selector_lexer() {
        let tokens: Vec<_> = SelectorLexer::new("./s2.0.ja")
            .map(|t| t.unwrap().1)
            .collect();
        assert_eq!(
            tokens,
            vec![
                SelectorToken::Dot,
                SelectorToken::Slash,
                SelectorToken::Ident("s2".to_string()),
                SelectorToken::Dot,
                SelectorToken::Number(0),
                SelectorToken::Dot,
                SelectorToken::Ident("ja".to_string()),
            ]
        );
    }

    #[test]
    fn test_selector_lexer_error() {
        let err = SelectorLexer::new(".a b")
            .find_map(Result::err)
            .unwrap();
        assert_eq!(err.text, " ");
        assert_eq!(err.span, Span::new(2, 3));
    }
}
