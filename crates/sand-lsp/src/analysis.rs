//! Editor queries answered from a parsed document

use sand_ast::{Document, Span, Target};
use sand_parser::{Parser, parse_selector};
use sand_render::{Format, render_target};
use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind};

fn document(text: &str) -> Document {
    Parser::new(text).parse_recovering().0
}

fn target_at(doc: &Document, offset: usize) -> Option<Target<'_>> {
    let site = doc.selector_at(offset)?;
    doc.resolve(site.selector, site.base)
}

/// Markdown list of what the selector under the cursor renders to
#[must_use]
pub fn hover(text: &str, offset: usize) -> Option<(String, Span)> {
    let doc = document(text);
    let site = doc.selector_at(offset)?;
    let target = doc.resolve(site.selector, site.base)?;

    let value = render_target(&doc, target, Format::Plain)
        .into_iter()
        .map(|rendering| {
            let text = rendering.text.replace('\n', " ⏎ ");
            format!("- **{}**: {}", rendering.name, text)
        })
        .collect::<Vec<_>>()
        .join("\n");
    Some((value, site.node.span))
}

/// Span of the node the selector under the cursor points to
#[must_use]
pub fn definition(text: &str, offset: usize) -> Option<Span> {
    let doc = document(text);
    target_at(&doc, offset).map(|target| target.node.span)
}

/// Completions for a selector being typed right before `offset`
#[must_use]
pub fn completions(text: &str, offset: usize) -> Vec<CompletionItem> {
    let Some(prefix) = typed_selector(text, offset) else {
        return Vec::new();
    };
    let Ok(selector) = parse_selector(prefix) else {
        return Vec::new();
    };

    let doc = document(text);
    let base = doc.scope_at(offset);
    let Some(scope) = doc
        .resolve(&selector, base)
        .and_then(|target| target.node.scope())
    else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for (index, child) in scope.indexable().enumerate() {
        let detail = child.kind_label().to_string();
        if let Some(alias) = &child.alias {
            items.push(CompletionItem {
                label: alias.clone(),
                kind: Some(CompletionItemKind::FIELD),
                detail: Some(detail.clone()),
                ..CompletionItem::default()
            });
        }
        items.push(CompletionItem {
            label: index.to_string(),
            kind: Some(CompletionItemKind::VALUE),
            detail: Some(detail),
            ..CompletionItem::default()
        });
    }
    for name in doc.names() {
        items.push(CompletionItem {
            label: name.clone(),
            kind: Some(CompletionItemKind::CONSTANT),
            detail: Some("name".to_string()),
            ..CompletionItem::default()
        });
    }
    items
}

/// The complete part of a selector typed on the current line, up to and
/// including its last `.` (or `./`)
fn typed_selector(text: &str, offset: usize) -> Option<&str> {
    let before = text.get(..offset)?;
    let line = &before[before.rfind('\n').map_or(0, |i| i + 1)..];

    let hash = line.rfind("#.")?;
    if line[..hash].ends_with('\\') {
        return None;
    }
    let typed = &line[hash + 1..];
    if !typed
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'/')
    {
        return None;
    }

    let mut end = typed.rfind('.').map_or(0, |i| i + 1);
    if typed.starts_with("./") {
        end = end.max(2);
    }
    Some(&typed[..end])
}
