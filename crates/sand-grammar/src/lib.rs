//! Loading the compiled tree-sitter grammar for Sand
//!
//! The grammar is either linked into the binary (a [`LanguageFn`]) or lives
//! in a shared library exporting `tree_sitter_sand`. Either way the handle
//! is turned into a [`Language`] and handed to a [`Parser`], which is the
//! check editors rely on before using the grammar.

use std::path::{Path, PathBuf};

use libloading::Library;
use thiserror::Error;
use tracing::{info, warn};
use tree_sitter::{LANGUAGE_VERSION, Language, MIN_COMPATIBLE_LANGUAGE_VERSION, Parser};
use tree_sitter_language::LanguageFn;

pub mod paths;

pub use paths::{find_library, grammar_library_name, grammar_search_paths};

/// Message reported when the grammar cannot be used, whatever the cause
pub const LOAD_FAILURE: &str = "Error loading Sand grammar";

/// Symbol exported by the compiled Sand grammar
pub const DEFAULT_SYMBOL: &str = "tree_sitter_sand";

/// Environment variable naming the grammar library to load
pub const GRAMMAR_ENV: &str = "SAND_GRAMMAR";

#[derive(Error, Debug)]
pub enum GrammarError {
    /// Library file does not exist
    #[error("grammar library not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Dynamic loader rejected the file
    #[error("failed to load grammar library {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("grammar library {} does not export `{symbol}`", path.display())]
    MissingSymbol { path: PathBuf, symbol: String },

    #[error("grammar ABI version {found} is not supported (expected {min} to {max})")]
    IncompatibleVersion {
        found: usize,
        min: usize,
        max: usize,
    },

    #[error("malformed grammar: {0}")]
    Malformed(String),
}

/// Where the grammar handle comes from
pub enum GrammarSource {
    /// Grammar linked into the binary
    Compiled(LanguageFn),
    /// Shared library plus the exported language function
    Library { path: PathBuf, symbol: String },
}

impl GrammarSource {
    /// Shared library exporting [`DEFAULT_SYMBOL`]
    pub fn library(path: impl Into<PathBuf>) -> Self {
        Self::Library {
            path: path.into(),
            symbol: DEFAULT_SYMBOL.to_string(),
        }
    }

    /// `$SAND_GRAMMAR` if set, otherwise the first `sand` library in the
    /// search paths
    ///
    /// # Errors
    ///
    /// Returns `GrammarError::NotFound` when neither yields a library
    pub fn discover() -> Result<Self, GrammarError> {
        if let Some(path) = std::env::var_os(GRAMMAR_ENV) {
            return Ok(Self::library(PathBuf::from(path)));
        }
        find_library("sand")
            .map(Self::library)
            .ok_or_else(|| GrammarError::NotFound(PathBuf::from(grammar_library_name("sand"))))
    }

    fn describe(&self) -> String {
        match self {
            Self::Compiled(_) => "compiled-in".to_string(),
            Self::Library { path, symbol } => format!("{}:{symbol}", path.display()),
        }
    }
}

impl std::fmt::Debug for GrammarSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compiled(_) => f.write_str("Compiled"),
            Self::Library { path, symbol } => f
                .debug_struct("Library")
                .field("path", path)
                .field("symbol", symbol)
                .finish(),
        }
    }
}

/// A grammar the parsing runtime accepted
pub struct LoadedGrammar {
    language: Language,
    // dropped after `language`
    library: Option<Library>,
}

impl LoadedGrammar {
    #[must_use]
    pub const fn language(&self) -> &Language {
        &self.language
    }

    #[must_use]
    pub fn abi_version(&self) -> usize {
        self.language.version()
    }

    #[must_use]
    pub fn node_kind_count(&self) -> usize {
        self.language.node_kind_count()
    }

    /// Fresh parser set up for this grammar
    ///
    /// # Errors
    ///
    /// Only fails if the runtime changes its mind about the grammar
    pub fn parser(&self) -> Result<Parser, GrammarError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|err| GrammarError::Malformed(err.to_string()))?;
        Ok(parser)
    }
}

impl std::fmt::Debug for LoadedGrammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedGrammar")
            .field("abi_version", &self.abi_version())
            .field("node_kind_count", &self.node_kind_count())
            .field("dynamic", &self.library.is_some())
            .finish()
    }
}

/// Obtain the grammar handle and have the runtime accept it
///
/// # Errors
///
/// Every failure is tagged with its cause and logged before it is returned
pub fn load(source: GrammarSource) -> Result<LoadedGrammar, GrammarError> {
    let described = source.describe();
    let result = match source {
        GrammarSource::Compiled(function) => accept(None, Language::new(function)),
        GrammarSource::Library { path, symbol } => load_library(&path, &symbol),
    };

    match &result {
        Ok(grammar) => info!(
            source = %described,
            abi_version = grammar.abi_version(),
            node_kinds = grammar.node_kind_count(),
            "loaded grammar"
        ),
        Err(err) => warn!(source = %described, error = %err, "grammar rejected"),
    }
    result
}

fn load_library(path: &Path, symbol: &str) -> Result<LoadedGrammar, GrammarError> {
    if !path.exists() {
        return Err(GrammarError::NotFound(path.to_path_buf()));
    }

    // SAFETY: loading a library runs its initialisers; grammar libraries
    // produced by tree-sitter have none beyond the C runtime's.
    let library = unsafe { Library::new(path) }.map_err(|source| GrammarError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    // SAFETY: tree-sitter grammars export `const TSLanguage *tree_sitter_<name>(void)`.
    let function = unsafe {
        library
            .get::<unsafe extern "C" fn() -> *const ()>(symbol.as_bytes())
            .map(|sym| *sym)
    }
    .map_err(|_| GrammarError::MissingSymbol {
        path: path.to_path_buf(),
        symbol: symbol.to_string(),
    })?;

    // SAFETY: the function pointer stays valid while `library` is alive, and
    // `LoadedGrammar` keeps it alive for as long as the language.
    let language = Language::new(unsafe { LanguageFn::from_raw(function) });
    accept(Some(library), language)
}

// `language` is declared last so it is dropped before `library`
fn accept(library: Option<Library>, language: Language) -> Result<LoadedGrammar, GrammarError> {
    check_version(language.version())?;
    check_node_kinds(language.node_kind_count())?;

    let grammar = LoadedGrammar {
        language,
        library,
    };
    grammar.parser()?;
    Ok(grammar)
}

/// Whether the runtime can use a grammar with this ABI version
///
/// # Errors
///
/// Returns `GrammarError::IncompatibleVersion` outside the supported range
pub fn check_version(found: usize) -> Result<(), GrammarError> {
    if found < MIN_COMPATIBLE_LANGUAGE_VERSION || found > LANGUAGE_VERSION {
        return Err(GrammarError::IncompatibleVersion {
            found,
            min: MIN_COMPATIBLE_LANGUAGE_VERSION,
            max: LANGUAGE_VERSION,
        });
    }
    Ok(())
}

/// A grammar without node kinds cannot produce a tree
///
/// # Errors
///
/// Returns `GrammarError::Malformed` when `count` is zero
pub fn check_node_kinds(count: usize) -> Result<(), GrammarError> {
    if count == 0 {
        return Err(GrammarError::Malformed("grammar defines no node kinds".to_string()));
    }
    Ok(())
}
