//! Syntax tree definitions for Sand
//!
//! Every node keeps the byte span it was parsed from so that errors,
//! hovers and definitions can point back into the source.

use serde::Serialize;

pub mod document;
pub mod selector;

pub use document::{ApplyTarget, Document, Node, NodeKind, Scope, SelectorSite, Target};
pub use selector::{Segment, Selector};

/// Byte range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Smallest span covering both `self` and `other`
    #[must_use]
    pub const fn join(self, other: Self) -> Self {
        let start = if self.start < other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end > other.end {
            self.end
        } else {
            other.end
        };
        Self { start, end }
    }

    /// Whether `offset` falls inside the span (end inclusive, so a cursor
    /// right after a token still counts)
    #[must_use]
    pub const fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

impl From<Span> for std::ops::Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

/// Line and column position in source text (both 1-based, column in bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Convert byte span to line/column positions
pub struct SourceMap {
    line_starts: Vec<usize>,
}

impl SourceMap {
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (pos, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(pos + 1);
            }
        }
        Self { line_starts }
    }

    #[must_use]
    pub fn position(&self, byte_offset: usize) -> Position {
        match self.line_starts.binary_search(&byte_offset) {
            Ok(line) => Position::new(line + 1, 1),
            Err(line) => {
                let line_start = self.line_starts[line - 1];
                Position::new(line, byte_offset - line_start + 1)
            }
        }
    }

    #[must_use]
    pub fn span_to_positions(&self, span: Span) -> (Position, Position) {
        (self.position(span.start), self.position(span.end))
    }

    /// Byte offset where the 0-based `line` starts
    #[must_use]
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Everything that can be wrong with a Sand document
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{message}")]
    Syntax { message: String, span: Span },

    #[error("names are defined more than once")]
    MultipleNameDefine(Span),

    #[error("duplicate name: `{0}`")]
    DuplicateNames(String, Span),

    #[error("duplicate alias: `{0}`")]
    DuplicateAlias(String, Span),

    #[error("alias `{0}` conflicts with a name")]
    AliasConflictWithNames(String, Span),

    #[error("selector syntax is incorrect: {0}")]
    Selector(String, Span),

    #[error("selector `{0}` does not point to anything")]
    UnresolvedSelector(String, Span),

    #[error("unknown name: `{0}`")]
    UnknownName(String, Span),

    #[error("expected {expected} sentences (one per name), found {found}")]
    SentenceCount {
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("names are not defined")]
    MissingNames,
}

impl ParseError {
    #[must_use]
    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::Syntax {
            message: message.into(),
            span,
        }
    }

    #[must_use]
    pub const fn span(&self) -> Option<Span> {
        match self {
            Self::Syntax { span, .. }
            | Self::SentenceCount { span, .. }
            | Self::MultipleNameDefine(span)
            | Self::DuplicateNames(_, span)
            | Self::DuplicateAlias(_, span)
            | Self::AliasConflictWithNames(_, span)
            | Self::Selector(_, span)
            | Self::UnresolvedSelector(_, span)
            | Self::UnknownName(_, span) => Some(*span),
            Self::MissingNames => None,
        }
    }
}
