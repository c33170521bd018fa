//! Turn a selected part of a document into text for each name

use sand_ast::{Document, Node, NodeKind, Selector, Target};
use sand_parser::string_utils::{collapse_whitespace, content_text};

/// Output style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Plain,
    /// Plain text plus `#` headings for sections
    Markdown,
}

/// Text of the selection for one name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendering {
    pub name: String,
    pub text: String,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("local selector `{0}` can only be used inside a document")]
    Local(String),

    #[error("selector `{0}` does not point to anything")]
    Unresolved(String),
}

/// Render `selector` as plain text
///
/// # Errors
///
/// Fails for local selectors and for selectors that do not resolve
pub fn render_plain(doc: &Document, selector: &Selector) -> Result<Vec<Rendering>, RenderError> {
    render(doc, selector, Format::Plain)
}

/// Render `selector` as Markdown
///
/// # Errors
///
/// Fails for local selectors and for selectors that do not resolve
pub fn render_markdown(
    doc: &Document,
    selector: &Selector,
) -> Result<Vec<Rendering>, RenderError> {
    render(doc, selector, Format::Markdown)
}

/// Resolve a document-level selector and render it
///
/// # Errors
///
/// Fails for local selectors and for selectors that do not resolve
pub fn render(
    doc: &Document,
    selector: &Selector,
    format: Format,
) -> Result<Vec<Rendering>, RenderError> {
    if selector.local {
        return Err(RenderError::Local(selector.to_string()));
    }
    let target = doc
        .resolve(selector, &doc.root)
        .ok_or_else(|| RenderError::Unresolved(selector.to_string()))?;
    Ok(render_target(doc, target, format))
}

/// Render an already resolved target; one entry per selected name
#[must_use]
pub fn render_target(doc: &Document, target: Target<'_>, format: Format) -> Vec<Rendering> {
    let selected: Vec<usize> = match target.name {
        Some(index) => vec![index],
        None => (0..doc.names.len()).collect(),
    };

    selected
        .into_iter()
        .map(|index| {
            let name = &doc.names[index];
            let raw = match format {
                Format::Plain => plain(target.node, index, name),
                Format::Markdown => markdown(target.node, index, name),
            };
            Rendering {
                name: name.clone(),
                text: tidy(&raw, format),
            }
        })
        .collect()
}

fn plain(node: &Node, index: usize, name: &str) -> String {
    match &node.kind {
        NodeKind::Sentences(blocks) => blocks
            .get(index)
            .map(|block| content_text(block))
            .unwrap_or_default(),
        NodeKind::Apply { target, content } if target.applies_to(name) => content_text(content),
        NodeKind::Root(scope) | NodeKind::Section { scope, .. } => {
            let mut text = String::new();
            for child in scope.children() {
                text.push(' ');
                text.push_str(&plain(child, index, name));
            }
            text
        }
        _ => String::new(),
    }
}

fn markdown(node: &Node, index: usize, name: &str) -> String {
    match &node.kind {
        NodeKind::Root(scope) | NodeKind::Section { scope, .. } => {
            let mut text = String::new();
            if let NodeKind::Section { level, heading, .. } = &node.kind {
                text.push_str("\n\n");
                text.push_str(&"#".repeat(*level));
                let heading = content_text(heading);
                if !heading.is_empty() {
                    text.push(' ');
                    text.push_str(&heading);
                }
                text.push_str("\n\n");
            }
            for child in scope.children() {
                text.push(' ');
                text.push_str(&markdown(child, index, name));
            }
            if node.level().is_some_and(|level| level > 0) {
                text.push_str("\n\n");
            }
            text
        }
        _ => plain(node, index, name),
    }
}

/// Collapse whitespace within each line; Markdown also squeezes blank lines
fn tidy(raw: &str, format: Format) -> String {
    let lines = raw.lines().map(collapse_whitespace);

    match format {
        Format::Plain => lines.collect::<Vec<_>>().join("\n"),
        Format::Markdown => {
            let mut out: Vec<String> = Vec::new();
            for line in lines {
                let blank = line.is_empty();
                if blank && out.last().is_none_or(String::is_empty) {
                    continue;
                }
                out.push(line);
            }
            while out.last().is_some_and(String::is_empty) {
                out.pop();
            }
            out.join("\n")
        }
    }
}
