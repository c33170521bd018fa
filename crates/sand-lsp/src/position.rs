//! Byte offsets to LSP positions and back
//!
//! LSP columns count UTF-16 code units; spans count UTF-8 bytes.

use sand_ast::Span;
use tower_lsp::lsp_types::{Position, Range};

/// Position of a byte offset; offsets past the end clamp to the end, offsets
/// inside a character snap to its start
#[must_use]
pub fn offset_to_position(text: &str, offset: usize) -> Position {
    let mut line = 0u32;
    let mut character = 0u32;

    for (index, ch) in text.char_indices() {
        if index >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            character = 0;
        } else {
            character += ch.len_utf16() as u32;
        }
    }

    Position { line, character }
}

/// Byte offset of a position; `None` if the line does not exist. Columns past
/// the end of the line clamp to the line end.
#[must_use]
pub fn position_to_offset(text: &str, position: Position) -> Option<usize> {
    let line_start = if position.line == 0 {
        0
    } else {
        text.match_indices('\n')
            .nth(position.line as usize - 1)
            .map(|(index, _)| index + 1)?
    };

    let line = &text[line_start..];
    let mut units = 0u32;
    for (index, ch) in line.char_indices() {
        if ch == '\n' || units >= position.character {
            return Some(line_start + index);
        }
        units += ch.len_utf16() as u32;
    }
    Some(text.len())
}

#[must_use]
pub fn span_to_range(text: &str, span: Span) -> Range {
    Range::new(
        offset_to_position(text, span.start),
        offset_to_position(text, span.end),
    )
}
