//! Selectors: paths into a document, optionally narrowed to one name

use std::fmt;

use serde::Serialize;

/// One step of a selector path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Segment {
    /// Child registered under this alias
    Alias(String),
    /// N-th child, counting everything except selector references
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alias(alias) => f.write_str(alias),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// `.` [`/`] (segment `.`)* [name]
///
/// `name == None` selects every declared name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selector {
    pub local: bool,
    pub path: Vec<Segment>,
    pub name: Option<String>,
}

impl Selector {
    #[must_use]
    pub const fn new(local: bool, path: Vec<Segment>, name: Option<String>) -> Self {
        Self { local, path, name }
    }

    /// `.`: the whole document for every name
    #[must_use]
    pub const fn whole() -> Self {
        Self::new(false, Vec::new(), None)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(".")?;
        if self.local {
            f.write_str("/")?;
        }
        for segment in &self.path {
            write!(f, "{segment}.")?;
        }
        if let Some(name) = &self.name {
            f.write_str(name)?;
        }
        Ok(())
    }
}
