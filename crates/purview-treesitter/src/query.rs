//! The `query` capability: structural search across the workspace.

use std::path::Path;

use schemars::JsonSchema;
use serde::Deserialize;
use streaming_iterator::StreamingIterator;
use tracing::debug;
use tree_sitter::{Query, QueryCursor};
use walkdir::WalkDir;

use purview_provider::{
    CancelToken, CodeLocation, EvaluateResponse, Incident, Position, ProviderError,
};

use crate::cache::ParsedFile;
use crate::provider::ProviderState;

/// Name the query capability is registered under.
pub const QUERY_CAPABILITY: &str = "query";

/// Log target for query evaluation.
pub(crate) const QUERY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::query");

/// Condition payload for the `query` capability.
///
/// The condition body sits under a key matching the capability name:
///
/// ```yaml
/// query:
///   language: rust
///   query: "(function_item) @func"
/// ```
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryCondition {
    /// The condition body.
    pub query: QuerySpec,
}

/// Body of a `query` condition.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QuerySpec {
    /// Identifier of a language registered with the session.
    pub language: String,
    /// Tree-sitter query expression in s-expression syntax.
    pub query: String,
}

/// Evaluates a query condition against the session's workspace.
///
/// Walks the workspace root in file-name order, parses every regular file
/// whose extension matches the condition's language, and runs the compiled
/// query over each tree. Each capture becomes one incident carrying the file
/// URI and the captured node's zero-based span; captures are not bound into
/// incident variables.
///
/// The query expression is rule-authored, so it is compiled once up front and
/// a compile failure aborts the evaluation. Unreadable files likewise abort
/// with the underlying error. The cancellation token is checked before each
/// file; a canceled evaluation returns the cancellation error, never a
/// partial incident list.
pub(crate) fn evaluate(
    state: &ProviderState,
    token: &CancelToken,
    condition: &QueryCondition,
) -> Result<EvaluateResponse, ProviderError> {
    let language = condition.query.language.as_str();
    let grammar = state
        .languages
        .grammar(language)
        .ok_or_else(|| ProviderError::unsupported_language(language))?;

    let query = Query::new(grammar, &condition.query.query)
        .map_err(|error| ProviderError::invalid_query(language, error.to_string()))?;

    let Some(root) = state.root.as_deref() else {
        debug!(target: QUERY_TARGET, "no workspace root configured; nothing to query");
        return Ok(EvaluateResponse::no_match());
    };

    let mut incidents = Vec::new();
    for walked in WalkDir::new(root).sort_by_file_name() {
        token.checkpoint(QUERY_CAPABILITY)?;

        let entry = walked.map_err(walk_failure)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !state.languages.matches_extension(language, path) {
            continue;
        }

        let parsed = state.cache.parse_file(language, grammar, path)?;
        collect_incidents(&query, &parsed, path, &mut incidents);
    }

    debug!(
        target: QUERY_TARGET,
        language,
        incidents = incidents.len(),
        "query evaluation finished"
    );

    Ok(EvaluateResponse::from_incidents(incidents))
}

/// Runs the compiled query over one parsed file, appending an incident per
/// capture.
fn collect_incidents(
    query: &Query,
    parsed: &ParsedFile,
    path: &Path,
    incidents: &mut Vec<Incident>,
) {
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(
        query,
        parsed.tree().root_node(),
        parsed.source().as_bytes(),
    );

    while let Some(matched) = matches.next() {
        for capture in matched.captures {
            let node = capture.node;
            let location =
                CodeLocation::new(position(node.start_position()), position(node.end_position()));
            incidents.push(Incident::new(file_uri(path)).with_code_location(location));
        }
    }
}

/// Converts a tree-sitter point into a zero-based wire position.
fn position(point: tree_sitter::Point) -> Position {
    // Line/column numbers will realistically never exceed u32::MAX.
    let line = u32::try_from(point.row).unwrap_or(u32::MAX);
    let character = u32::try_from(point.column).unwrap_or(u32::MAX);
    Position::new(line, character)
}

/// Builds a `file://` URI for an incident.
fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Maps a walk failure onto the provider error taxonomy.
fn walk_failure(error: walkdir::Error) -> ProviderError {
    let path = error.path().map(Path::to_path_buf).unwrap_or_default();
    let source = error
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("file tree loop detected"));
    ProviderError::walk(path, source)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::cache::ParseCache;
    use crate::language::LanguageTable;

    fn state_for(root: Option<PathBuf>) -> ProviderState {
        ProviderState {
            root,
            languages: LanguageTable::with_defaults(),
            cache: ParseCache::new(),
        }
    }

    fn condition(language: &str, query: &str) -> QueryCondition {
        QueryCondition {
            query: QuerySpec {
                language: language.to_owned(),
                query: query.to_owned(),
            },
        }
    }

    #[test]
    fn canceled_token_aborts_the_walk() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("main.rs"), "fn main() {}\n").expect("write");
        let state = state_for(Some(dir.path().to_path_buf()));

        let token = CancelToken::new();
        token.cancel();
        let err = evaluate(&state, &token, &condition("rust", "(function_item) @func"))
            .expect_err("canceled evaluation must not return partial results");

        assert!(err.is_canceled());
    }

    #[test]
    fn missing_root_evaluates_to_no_match() {
        let state = state_for(None);

        let response = evaluate(
            &state,
            &CancelToken::new(),
            &condition("rust", "(function_item) @func"),
        )
        .expect("evaluate");

        assert!(!response.matched);
        assert!(response.incidents.is_empty());
    }

    #[test]
    fn unknown_language_fails_before_walking() {
        let state = state_for(None);

        let err = evaluate(
            &state,
            &CancelToken::new(),
            &condition("go", "(function_declaration) @func"),
        )
        .expect_err("unsupported language");

        assert!(matches!(err, ProviderError::UnsupportedLanguage { ref language } if language == "go"));
    }

    #[test]
    fn malformed_query_expression_aborts_the_evaluation() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("main.rs"), "fn main() {}\n").expect("write");
        let state = state_for(Some(dir.path().to_path_buf()));

        let err = evaluate(
            &state,
            &CancelToken::new(),
            &condition("rust", "(function_item @unbalanced"),
        )
        .expect_err("invalid query");

        assert!(matches!(err, ProviderError::InvalidQuery { .. }));
    }
}
