//! Session-lifetime cache of parsed files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use tracing::debug;

use purview_provider::ProviderError;

/// Log target for cache operations.
pub(crate) const CACHE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cache");

/// A file's source text together with its parsed syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    tree: tree_sitter::Tree,
    source: String,
}

impl ParsedFile {
    /// Returns the parsed syntax tree.
    #[must_use]
    pub const fn tree(&self) -> &tree_sitter::Tree {
        &self.tree
    }

    /// Returns the source text the tree was parsed from.
    #[must_use]
    pub fn source(&self) -> &str {
        self.source.as_str()
    }
}

struct CacheEntry {
    parsed: Arc<ParsedFile>,
    modified: SystemTime,
}

/// Cache of parsed files keyed by path, shared by a session's evaluators.
///
/// Entries are validated against the file's modification time and re-parsed
/// when it changes. Nothing is ever evicted: sessions are short-lived
/// analysis runs and the growth is an accepted trade-off.
#[derive(Default)]
pub struct ParseCache {
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
}

impl ParseCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parsed form of `path`, parsing it when the cache has no
    /// current entry.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Walk`] when the file cannot be read,
    /// [`ProviderError::Grammar`] when the grammar cannot be loaded into a
    /// parser, and [`ProviderError::Parse`] when parsing produces no tree.
    pub fn parse_file(
        &self,
        language: &str,
        grammar: &tree_sitter::Language,
        path: &Path,
    ) -> Result<Arc<ParsedFile>, ProviderError> {
        let modified = fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .map_err(|source| ProviderError::walk(path.to_owned(), source))?;

        if let Some(parsed) = self.lookup(path, modified) {
            return Ok(parsed);
        }

        let source = fs::read_to_string(path)
            .map_err(|error| ProviderError::walk(path.to_owned(), error))?;
        let parsed = Arc::new(parse(language, grammar, path, source)?);

        debug!(
            target: CACHE_TARGET,
            path = %path.display(),
            language,
            "parsed and cached file"
        );

        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        entries.insert(
            path.to_owned(),
            CacheEntry {
                parsed: Arc::clone(&parsed),
                modified,
            },
        );

        Ok(parsed)
    }

    /// Returns the number of cached files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .len()
    }

    /// Returns `true` when nothing is cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, path: &Path, modified: SystemTime) -> Option<Arc<ParsedFile>> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        entries
            .get(path)
            .filter(|entry| entry.modified == modified)
            .map(|entry| Arc::clone(&entry.parsed))
    }
}

impl std::fmt::Debug for ParseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseCache").field("len", &self.len()).finish()
    }
}

fn parse(
    language: &str,
    grammar: &tree_sitter::Language,
    path: &Path,
    source: String,
) -> Result<ParsedFile, ProviderError> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(grammar)
        .map_err(|error| ProviderError::grammar(language, error.to_string()))?;

    let tree = parser
        .parse(&source, None)
        .ok_or_else(|| ProviderError::parse(language, path.to_owned()))?;

    Ok(ParsedFile { tree, source })
}
