//! Sand: one document, several languages
//!
//! Facade over the workspace crates.

pub use sand_ast as ast;
pub use sand_cli as cli;
pub use sand_grammar as grammar;
pub use sand_lexer as lexer;
pub use sand_lsp as lsp;
pub use sand_parser as parser;
pub use sand_render as render;

pub use sand_ast::{Document, ParseError, Selector, Span};
pub use sand_cli::{convert_parse_error, convert_syntax_error, print_completions};
pub use sand_parser::{Parser, parse_selector};
pub use sand_render::{Format, Rendering, render_markdown, render_plain};
