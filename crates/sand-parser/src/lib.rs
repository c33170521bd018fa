//! Parser for Sand documents
//!
//! Documents are parsed by hand over the logos token stream, since prose and
//! commands interleave freely. Selectors are a small context-free language
//! and go through the generated LALRPOP parser.

use sand_ast::{ApplyTarget, Document, Node, NodeKind, ParseError, SourceMap, Span};
use sand_lexer::{CommandKind, Lexer, SpannedToken, Token};

lalrpop_util::lalrpop_mod!(
    #[allow(clippy::all, clippy::pedantic, unused_imports)]
    selector_grammar
);

pub mod selector;
pub mod string_utils;
pub mod validate;

pub use selector::parse_selector;

use string_utils::{head_alias, is_identifier};

pub struct Parser {
    input: String,
    source_map: SourceMap,
    filename: String,
    tokens: Vec<SpannedToken>,
}

impl Parser {
    /// Create a new parser for the given input
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self::new_with_filename(input, "<input>")
    }

    /// Create a new parser for the given input with a filename
    #[must_use]
    pub fn new_with_filename(input: &str, filename: &str) -> Self {
        let tokens = Lexer::new(input).tokenize();

        Self {
            input: input.to_string(),
            source_map: SourceMap::new(input),
            filename: filename.to_string(),
            tokens,
        }
    }

    /// Parse and validate the input
    ///
    /// # Errors
    ///
    /// Returns every syntax and validation error found, in source order
    pub fn parse(&self) -> Result<Document, Vec<ParseError>> {
        let (document, errors) = self.parse_recovering();
        if errors.is_empty() {
            Ok(document)
        } else {
            Err(errors)
        }
    }

    /// Parse as much as possible, returning the tree built so far together
    /// with every error. Used by tooling that must keep working on broken
    /// documents.
    pub fn parse_recovering(&self) -> (Document, Vec<ParseError>) {
        let mut parser = DocumentParser::new(&self.input, &self.tokens);
        parser.run();
        let (document, mut errors, declared) = parser.finish();

        if declared {
            errors.extend(validate::validate(&document));
        }
        errors.sort_by_key(|err| err.span().map(|span| span.start));

        tracing::debug!(
            file = %self.filename,
            names = ?document.names,
            errors = errors.len(),
            "parsed document"
        );

        (document, errors)
    }

    /// Get access to the source map for error reporting
    #[must_use]
    pub const fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Get access to the filename
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Get access to the original input
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Get access to the tokens (useful for debugging)
    #[must_use]
    pub fn tokens(&self) -> &[SpannedToken] {
        &self.tokens
    }
}

/// Position in the token stream; never moves past `Eof`
struct Cursor<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> &'a SpannedToken {
        let tokens = self.tokens;
        &tokens[self.pos]
    }

    fn advance(&mut self) -> &'a SpannedToken {
        let token = self.peek();
        if token.token != Token::Eof {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        self.peek().token == Token::Eof
    }

    /// Skip newlines and whitespace-only text
    fn skip_blank(&mut self) {
        loop {
            let token = self.peek();
            let blank = match token.token {
                Token::Newline => true,
                Token::Text => token.text.trim().is_empty(),
                _ => false,
            };
            if !blank {
                break;
            }
            self.pos += 1;
        }
    }

    /// After an error: resume at the next line or the next command
    fn recover(&mut self) {
        loop {
            match self.peek().token {
                Token::Eof | Token::Command(_) => break,
                Token::Newline => {
                    self.pos += 1;
                    break;
                }
                _ => self.pos += 1,
            }
        }
    }
}

/// Section stack; sections nest by level
struct TreeBuilder {
    stack: Vec<Node>,
    errors: Vec<ParseError>,
}

impl TreeBuilder {
    fn new(len: usize) -> Self {
        Self {
            stack: vec![Node::root(Span::new(0, len))],
            errors: Vec::new(),
        }
    }

    fn attach(&mut self, node: Node) {
        let alias = node.alias.clone();
        let span = node.span;
        let Some(scope) = self.stack.last_mut().and_then(Node::scope_mut) else {
            return;
        };
        if let Err(existing) = scope.push(node) {
            let earlier = scope.children()[existing].span;
            let alias = alias.unwrap_or_default();
            self.errors
                .push(ParseError::DuplicateAlias(alias.clone(), span));
            self.errors.push(ParseError::DuplicateAlias(alias, earlier));
        }
    }

    fn open_section(&mut self, section: Node) {
        let level = section.level().unwrap_or(1);
        while self.stack.len() > 1
            && self
                .stack
                .last()
                .and_then(Node::level)
                .is_some_and(|top| top >= level)
        {
            self.close_top(section.span.start);
        }
        self.stack.push(section);
    }

    /// Close the innermost section; its extent runs up to `end`
    fn close_top(&mut self, end: usize) {
        if let Some(mut node) = self.stack.pop() {
            let start = node.span.start;
            if let Some(scope) = node.scope_mut() {
                scope.set_extent(Span::new(start, end.max(start)));
            }
            self.attach(node);
        }
    }

    fn finish(mut self, end: usize) -> (Node, Vec<ParseError>) {
        while self.stack.len() > 1 {
            self.close_top(end);
        }
        let root = self
            .stack
            .pop()
            .unwrap_or_else(|| Node::root(Span::new(0, end)));
        (root, self.errors)
    }
}

struct DocumentParser<'a> {
    input: &'a str,
    cursor: Cursor<'a>,
    tree: TreeBuilder,
    names: Option<Vec<String>>,
    errors: Vec<ParseError>,
}

impl<'a> DocumentParser<'a> {
    fn new(input: &'a str, tokens: &'a [SpannedToken]) -> Self {
        Self {
            input,
            cursor: Cursor { tokens, pos: 0 },
            tree: TreeBuilder::new(input.len()),
            names: None,
            errors: Vec::new(),
        }
    }

    fn run(&mut self) {
        while !self.cursor.at_eof() {
            let token = self.cursor.advance();
            let result = match token.token {
                Token::Command(CommandKind::Names) => self.declare_names(token),
                Token::Command(CommandKind::Section) => {
                    self.section(token);
                    Ok(())
                }
                Token::Command(CommandKind::Sentences) => self.sentences(token),
                Token::Command(CommandKind::Apply) => self.apply(token),
                Token::Command(CommandKind::Selector) => self.selector(token),
                Token::Command(CommandKind::Stray) => Err(ParseError::syntax(
                    "`#` does not start a command here; write `\\#` for a literal hash",
                    token.span,
                )),
                Token::Error => Err(ParseError::syntax(
                    format!("unexpected `{}`", token.text),
                    token.span,
                )),
                // prose
                _ => Ok(()),
            };

            if let Err(err) = result {
                self.errors.push(err);
                self.cursor.recover();
            }
        }
    }

    /// Returns the document, all structural errors, and whether names were
    /// declared
    fn finish(self) -> (Document, Vec<ParseError>, bool) {
        let (root, tree_errors) = self.tree.finish(self.input.len());
        let mut errors = self.errors;
        errors.extend(tree_errors);

        let declared = self.names.is_some();
        if !declared {
            errors.push(ParseError::MissingNames);
        }

        let document = Document {
            names: self.names.unwrap_or_default(),
            root,
        };
        (document, errors, declared)
    }

    /// `#(en, ja)`
    fn declare_names(&mut self, head: &SpannedToken) -> Result<(), ParseError> {
        let (items, close) = self.read_list(head.span, Token::RParen, "`)`", "name list")?;
        let span = Span::new(head.span.start, close.end);

        if self.names.is_some() {
            self.errors.push(ParseError::MultipleNameDefine(span));
            return Ok(());
        }

        let mut names: Vec<String> = Vec::with_capacity(items.len());
        for (name, name_span) in items {
            if names.contains(&name) {
                self.errors.push(ParseError::DuplicateNames(name, name_span));
            } else {
                names.push(name);
            }
        }
        self.names = Some(names);
        Ok(())
    }

    /// `#alias## heading`; the heading runs to the end of the line
    fn section(&mut self, head: &SpannedToken) {
        let alias = head_alias(&head.text);
        let alias_len = alias.as_ref().map_or(0, String::len);
        let level = head.text.len() - 1 - alias_len;

        let start = head.span.end;
        let mut end = start;
        while !matches!(self.cursor.peek().token, Token::Newline | Token::Eof) {
            end = self.cursor.advance().span.end;
        }
        let raw = &self.input[start..end];
        let span = Span::new(head.span.start, start + raw.trim_end().len());

        self.tree
            .open_section(Node::section(level, raw.trim().to_string(), alias, span));
    }

    /// `#alias[ .. ][ .. ]`
    fn sentences(&mut self, head: &SpannedToken) -> Result<(), ParseError> {
        let (first, mut close) = self.read_block(head.span, Token::RBracket, "`]`")?;
        let mut blocks = vec![first];

        loop {
            let saved = self.cursor.pos;
            self.cursor.skip_blank();
            if self.cursor.peek().token != Token::LBracket {
                self.cursor.pos = saved;
                break;
            }
            let open = self.cursor.advance().span;
            let (block, end) = self.read_block(open, Token::RBracket, "`]`")?;
            blocks.push(block);
            close = end;
        }

        self.tree.attach(Node {
            kind: NodeKind::Sentences(blocks),
            alias: head_alias(&head.text),
            span: Span::new(head.span.start, close.end),
        });
        Ok(())
    }

    /// `#alias{{ .. }}`, `#{all, { .. }}`, `#{[ja, en], { .. }}`
    fn apply(&mut self, head: &SpannedToken) -> Result<(), ParseError> {
        self.cursor.skip_blank();
        let next = self.cursor.peek();
        let target = match next.token {
            Token::LBrace => ApplyTarget::All,
            Token::Text if next.text.trim() == "all" => {
                self.cursor.advance();
                self.expect_comma()?;
                ApplyTarget::All
            }
            Token::LBracket => {
                let open = self.cursor.advance().span;
                let (items, _) = self.read_list(open, Token::RBracket, "`]`", "name list")?;
                self.expect_comma()?;
                ApplyTarget::Names(items.into_iter().map(|(name, _)| name).collect())
            }
            _ => {
                return Err(ParseError::syntax(
                    "expected `{`, `all` or `[names]` after `#{`",
                    next.span,
                ));
            }
        };

        self.cursor.skip_blank();
        let open = self.cursor.peek();
        if open.token != Token::LBrace {
            return Err(ParseError::syntax("expected `{` to start the content", open.span));
        }
        self.cursor.advance();
        let (content, _) = self.read_block(open.span, Token::RBrace, "`}`")?;

        self.cursor.skip_blank();
        let close = self.cursor.peek();
        if close.token != Token::RBrace {
            return Err(ParseError::syntax(
                format!("expected `}}` to close `{}`", head.text),
                close.span,
            ));
        }
        self.cursor.advance();

        self.tree.attach(Node {
            kind: NodeKind::Apply { target, content },
            alias: head_alias(&head.text),
            span: Span::new(head.span.start, close.span.end),
        });
        Ok(())
    }

    /// `#.path.name`
    fn selector(&mut self, head: &SpannedToken) -> Result<(), ParseError> {
        let selector = selector::parse_selector_at(&head.text[1..], head.span)?;
        self.tree.attach(Node {
            kind: NodeKind::Selector(selector),
            alias: None,
            span: head.span,
        });
        Ok(())
    }

    fn expect_comma(&mut self) -> Result<(), ParseError> {
        self.cursor.skip_blank();
        let token = self.cursor.peek();
        if token.token == Token::Comma {
            self.cursor.advance();
            Ok(())
        } else {
            Err(ParseError::syntax("expected `,`", token.span))
        }
    }

    /// Raw text up to the closing delimiter, plus the delimiter's span.
    /// Commands may not appear inside; the offending command is left for the
    /// main loop.
    fn read_block(
        &mut self,
        open: Span,
        close: Token,
        closing: &str,
    ) -> Result<(String, Span), ParseError> {
        let start = open.end;
        loop {
            let token = self.cursor.peek();
            match token.token {
                t if t == close => {
                    self.cursor.advance();
                    return Ok((self.input[start..token.span.start].to_string(), token.span));
                }
                Token::Eof => {
                    return Err(ParseError::syntax(
                        format!("unclosed block: expected {closing}"),
                        open,
                    ));
                }
                Token::Command(_) => {
                    return Err(ParseError::syntax(
                        format!("expected {closing} before the next command; write `\\#` for a literal hash"),
                        token.span,
                    ));
                }
                _ => {
                    self.cursor.advance();
                }
            }
        }
    }

    /// Comma separated identifiers on one line, up to `close`
    fn read_list(
        &mut self,
        open: Span,
        close: Token,
        closing: &str,
        what: &str,
    ) -> Result<(Vec<(String, Span)>, Span), ParseError> {
        let mut items = Vec::new();
        let mut item_start = open.end;

        loop {
            let token = self.cursor.peek();
            match token.token {
                Token::Text => {}
                Token::Comma => {
                    items.push(self.list_item(item_start, token.span.start, what)?);
                    item_start = token.span.end;
                }
                t if t == close => {
                    self.cursor.advance();
                    items.push(self.list_item(item_start, token.span.start, what)?);
                    return Ok((items, token.span));
                }
                Token::Eof | Token::Newline | Token::Command(_) => {
                    return Err(ParseError::syntax(
                        format!("expected {closing} to close the {what}"),
                        open,
                    ));
                }
                _ => {
                    return Err(ParseError::syntax(
                        format!("unexpected `{}` in {what}", token.text),
                        token.span,
                    ));
                }
            }
            self.cursor.advance();
        }
    }

    fn list_item(&self, start: usize, end: usize, what: &str) -> Result<(String, Span), ParseError> {
        let raw = &self.input[start..end];
        let name = raw.trim();
        let offset = start + (raw.len() - raw.trim_start().len());
        let span = Span::new(offset, offset + name.len());

        if name.is_empty() {
            return Err(ParseError::syntax(format!("empty entry in {what}"), Span::new(start, end)));
        }
        if !is_identifier(name) {
            return Err(ParseError::syntax(format!("`{name}` is not a valid name"), span));
        }
        Ok((name.to_string(), span))
    }
}
