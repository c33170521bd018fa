//! Checks that need the whole tree and the declared names

use sand_ast::{ApplyTarget, Document, Node, NodeKind, ParseError};

/// Run every name-dependent check over a built document
///
/// Only meaningful once names are declared; the parser skips it otherwise.
pub fn validate(document: &Document) -> Vec<ParseError> {
    let mut errors = Vec::new();
    check_node(document, &document.root, &mut errors);

    for site in document.selector_sites() {
        if document.resolve(site.selector, site.base).is_none() {
            errors.push(ParseError::UnresolvedSelector(
                site.selector.to_string(),
                site.node.span,
            ));
        }
    }

    errors
}

fn check_node(document: &Document, node: &Node, errors: &mut Vec<ParseError>) {
    if let Some(alias) = &node.alias {
        if document.name_index(alias).is_some() {
            errors.push(ParseError::AliasConflictWithNames(alias.clone(), node.span));
        }
    }

    match &node.kind {
        NodeKind::Sentences(blocks) if blocks.len() != document.names.len() => {
            errors.push(ParseError::SentenceCount {
                expected: document.names.len(),
                found: blocks.len(),
                span: node.span,
            });
        }
        NodeKind::Apply {
            target: ApplyTarget::Names(names),
            ..
        } => {
            for name in names {
                if document.name_index(name).is_none() {
                    errors.push(ParseError::UnknownName(name.clone(), node.span));
                }
            }
        }
        NodeKind::Root(scope) | NodeKind::Section { scope, .. } => {
            for child in scope.children() {
                check_node(document, child, errors);
            }
        }
        _ => {}
    }
}
