//! Per-session language tables: grammar handles and extension mappings.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;

/// Grammar and extension tables for the languages a session can query.
///
/// Populated once while the provider initialises and read-only afterwards,
/// so evaluators can consult it concurrently without locking.
#[derive(Default)]
pub struct LanguageTable {
    grammars: HashMap<String, tree_sitter::Language>,
    extensions: HashMap<String, String>,
}

impl std::fmt::Debug for LanguageTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageTable")
            .field("languages", &self.extensions)
            .finish_non_exhaustive()
    }
}

impl LanguageTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with the bundled grammars: Rust (`.rs`), Python
    /// (`.py`), and TypeScript (`.ts`).
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.register("rust", tree_sitter_rust::LANGUAGE.into(), "rs");
        table.register("python", tree_sitter_python::LANGUAGE.into(), "py");
        table.register(
            "typescript",
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            "ts",
        );
        table
    }

    /// Registers a language under the given identifier.
    ///
    /// `extension` is matched against file extensions without the leading
    /// dot. Registering an identifier twice replaces the earlier entry.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        grammar: tree_sitter::Language,
        extension: impl Into<String>,
    ) {
        let name = name.into();
        self.extensions.insert(name.clone(), extension.into());
        self.grammars.insert(name, grammar);
    }

    /// Returns the grammar handle registered for a language.
    #[must_use]
    pub fn grammar(&self, name: &str) -> Option<&tree_sitter::Language> {
        self.grammars.get(name)
    }

    /// Returns the file extension registered for a language.
    #[must_use]
    pub fn extension(&self, name: &str) -> Option<&str> {
        self.extensions.get(name).map(String::as_str)
    }

    /// Returns `true` when the path's extension matches the language's
    /// registered extension.
    #[must_use]
    pub fn matches_extension(&self, name: &str, path: &Path) -> bool {
        let Some(extension) = self.extension(name) else {
            return false;
        };
        path.extension().and_then(OsStr::to_str) == Some(extension)
    }

    /// Returns the registered language identifiers.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.grammars.keys().map(String::as_str)
    }
}
