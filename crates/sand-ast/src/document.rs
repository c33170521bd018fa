//! Document tree
//!
//! A document is a root scope holding sections, sentence blocks, apply-all
//! blocks and selector references. Sections own a scope of their own.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::{Segment, Selector, Span};

/// Parsed and validated Sand document
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub names: Vec<String>,
    pub root: Node,
}

/// Names an apply-all block is written for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyTarget {
    All,
    Names(Vec<String>),
}

impl ApplyTarget {
    #[must_use]
    pub fn applies_to(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Names(names) => names.iter().any(|n| n == name),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root(Scope),
    Section {
        level: usize,
        heading: String,
        scope: Scope,
    },
    /// One raw block per declared name, in declaration order
    Sentences(Vec<String>),
    Apply {
        target: ApplyTarget,
        content: String,
    },
    Selector(Selector),
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub alias: Option<String>,
    pub span: Span,
}

impl Node {
    #[must_use]
    pub fn root(extent: Span) -> Self {
        Self {
            kind: NodeKind::Root(Scope::new(extent)),
            alias: None,
            span: Span::new(extent.start, extent.start),
        }
    }

    #[must_use]
    pub fn section(level: usize, heading: String, alias: Option<String>, span: Span) -> Self {
        Self {
            kind: NodeKind::Section {
                level,
                heading,
                scope: Scope::new(span),
            },
            alias,
            span,
        }
    }

    /// Children of a root or section
    #[must_use]
    pub const fn scope(&self) -> Option<&Scope> {
        match &self.kind {
            NodeKind::Root(scope) | NodeKind::Section { scope, .. } => Some(scope),
            _ => None,
        }
    }

    pub fn scope_mut(&mut self) -> Option<&mut Scope> {
        match &mut self.kind {
            NodeKind::Root(scope) | NodeKind::Section { scope, .. } => Some(scope),
            _ => None,
        }
    }

    /// Nesting level: 0 for the root, the `#` count for sections
    #[must_use]
    pub const fn level(&self) -> Option<usize> {
        match &self.kind {
            NodeKind::Root(_) => Some(0),
            NodeKind::Section { level, .. } => Some(*level),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_selector(&self) -> bool {
        matches!(self.kind, NodeKind::Selector(_))
    }

    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self.kind {
            NodeKind::Root(_) => "document",
            NodeKind::Section { .. } => "section",
            NodeKind::Sentences(_) => "sentences",
            NodeKind::Apply { .. } => "apply",
            NodeKind::Selector(_) => "selector",
        }
    }
}

/// Ordered children plus an alias index over them
#[derive(Debug, Clone, Serialize)]
pub struct Scope {
    #[serde(skip)]
    aliases: FxHashMap<String, usize>,
    #[serde(skip)]
    extent: Span,
    children: Vec<Node>,
}

impl Scope {
    #[must_use]
    pub fn new(extent: Span) -> Self {
        Self {
            aliases: FxHashMap::default(),
            extent,
            children: Vec::new(),
        }
    }

    /// Append a child. If its alias is already taken the child is still
    /// appended, the alias keeps pointing at the earlier sibling and that
    /// sibling's index is returned as the error.
    pub fn push(&mut self, node: Node) -> Result<(), usize> {
        let mut conflict = None;
        if let Some(alias) = &node.alias {
            match self.aliases.get(alias) {
                Some(&existing) => conflict = Some(existing),
                None => {
                    self.aliases.insert(alias.clone(), self.children.len());
                }
            }
        }
        self.children.push(node);
        conflict.map_or(Ok(()), Err)
    }

    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    #[must_use]
    pub fn get(&self, alias: &str) -> Option<&Node> {
        self.aliases.get(alias).map(|&index| &self.children[index])
    }

    /// N-th child that is not a selector reference
    #[must_use]
    pub fn indexed(&self, index: usize) -> Option<&Node> {
        self.indexable().nth(index)
    }

    pub fn indexable(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(|child| !child.is_selector())
    }

    /// Source range covered by the owner and all of its children
    #[must_use]
    pub const fn extent(&self) -> Span {
        self.extent
    }

    pub fn set_extent(&mut self, extent: Span) {
        self.extent = extent;
    }
}

/// Result of resolving a selector
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub node: &'a Node,
    /// Index into [`Document::names`]; `None` means every name
    pub name: Option<usize>,
}

/// A selector reference together with the section it appears in
#[derive(Debug, Clone, Copy)]
pub struct SelectorSite<'a> {
    pub node: &'a Node,
    pub selector: &'a Selector,
    /// Root or section whose scope contains the reference; local selectors
    /// resolve from here
    pub base: &'a Node,
}

impl Document {
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn name_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    #[must_use]
    pub fn root_scope(&self) -> &Scope {
        match &self.root.kind {
            NodeKind::Root(scope) => scope,
            _ => unreachable!("document root is always a root node"),
        }
    }

    /// Walk `selector` from the root, or from `base` when it is local
    #[must_use]
    pub fn resolve<'a>(&'a self, selector: &Selector, base: &'a Node) -> Option<Target<'a>> {
        let mut node = if selector.local { base } else { &self.root };
        for segment in &selector.path {
            let scope = node.scope()?;
            node = match segment {
                Segment::Alias(alias) => scope.get(alias)?,
                Segment::Index(index) => scope.indexed(*index)?,
            };
        }
        let name = match &selector.name {
            Some(name) => Some(self.name_index(name)?),
            None => None,
        };
        Some(Target { node, name })
    }

    /// Every selector reference in document order
    #[must_use]
    pub fn selector_sites(&self) -> Vec<SelectorSite<'_>> {
        let mut sites = Vec::new();
        collect_sites(&self.root, &mut sites);
        sites
    }

    #[must_use]
    pub fn selector_at(&self, offset: usize) -> Option<SelectorSite<'_>> {
        self.selector_sites()
            .into_iter()
            .find(|site| site.node.span.contains(offset))
    }

    /// Innermost root or section whose extent contains `offset`
    #[must_use]
    pub fn scope_at(&self, offset: usize) -> &Node {
        let mut current = &self.root;
        while let Some(scope) = current.scope() {
            let next = scope.children().iter().find(|child| {
                child
                    .scope()
                    .is_some_and(|inner| inner.extent().contains(offset))
            });
            match next {
                Some(child) => current = child,
                None => break,
            }
        }
        current
    }
}

fn collect_sites<'a>(owner: &'a Node, sites: &mut Vec<SelectorSite<'a>>) {
    let Some(scope) = owner.scope() else {
        return;
    };
    for child in scope.children() {
        match &child.kind {
            NodeKind::Selector(selector) => sites.push(SelectorSite {
                node: child,
                selector,
                base: owner,
            }),
            NodeKind::Section { .. } => collect_sites(child, sites),
            _ => {}
        }
    }
}
