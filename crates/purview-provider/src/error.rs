//! Provider-facing error taxonomy.
//!
//! All errors use `thiserror`-derived enums with structured context so the
//! rule engine can react to the failure class programmatically. I/O errors
//! are wrapped in `Arc` to satisfy the `result_large_err` Clippy lint.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors surfaced by capability registration, dispatch, and evaluation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// The requested capability is not registered with this provider.
    #[error("capability '{name}' is not supported by this provider")]
    UnsupportedCapability {
        /// Capability name that was looked up.
        name: String,
    },

    /// The condition payload did not decode into the capability's expected
    /// shape.
    #[error("malformed condition for capability '{capability}': {source}")]
    MalformedCondition {
        /// Capability whose condition failed to decode.
        capability: String,
        /// Underlying decode error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A capability with the same name is already registered.
    #[error("capability '{name}' is already registered")]
    DuplicateCapability {
        /// Capability name that was registered twice.
        name: String,
    },

    /// The condition names a language the provider has no grammar for.
    #[error("language '{language}' is not supported by this provider")]
    UnsupportedLanguage {
        /// Language identifier from the condition.
        language: String,
    },

    /// The evaluation was canceled before it could complete.
    #[error("'{operation}' was canceled")]
    Canceled {
        /// Operation that observed the cancellation.
        operation: String,
    },

    /// The backend session could not be established. Fatal to provider
    /// construction; never retried internally.
    #[error("backend session could not be established: {message}")]
    SessionInit {
        /// Human-readable failure description.
        message: String,
        /// Optional underlying error.
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },

    /// The condition schema for a capability could not be built.
    #[error("failed to build condition schema for capability '{capability}': {source}")]
    Schema {
        /// Capability whose schema generation failed.
        capability: String,
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },

    /// A file-tree walk or file read failed mid-evaluation.
    #[error("failed to read '{}': {source}", path.display())]
    Walk {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A registered grammar could not be loaded into a parser.
    #[error("grammar for language '{language}' could not be loaded: {message}")]
    Grammar {
        /// Language whose grammar failed to load.
        language: String,
        /// Description of the failure.
        message: String,
    },

    /// The rule-authored query expression did not compile.
    #[error("invalid query for language '{language}': {message}")]
    InvalidQuery {
        /// Language the query was compiled for.
        language: String,
        /// Description of the compile failure.
        message: String,
    },

    /// A source file could not be parsed with the language's grammar.
    #[error("failed to parse '{}' as {language}", path.display())]
    Parse {
        /// Language the file was parsed as.
        language: String,
        /// File that failed to parse.
        path: PathBuf,
    },
}

impl ProviderError {
    /// Builds an `UnsupportedCapability` error.
    #[must_use]
    pub fn unsupported_capability(name: impl Into<String>) -> Self {
        Self::UnsupportedCapability { name: name.into() }
    }

    /// Builds an `UnsupportedLanguage` error.
    #[must_use]
    pub fn unsupported_language(language: impl Into<String>) -> Self {
        Self::UnsupportedLanguage {
            language: language.into(),
        }
    }

    /// Builds a `Canceled` error for the named operation.
    #[must_use]
    pub fn canceled(operation: impl Into<String>) -> Self {
        Self::Canceled {
            operation: operation.into(),
        }
    }

    /// Builds a `SessionInit` error wrapping an underlying failure.
    #[must_use]
    pub fn session_init(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::SessionInit {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Builds a `Walk` error for the given path.
    #[must_use]
    pub fn walk(path: PathBuf, source: std::io::Error) -> Self {
        Self::Walk {
            path,
            source: Arc::new(source),
        }
    }

    /// Builds a `Grammar` error.
    #[must_use]
    pub fn grammar(language: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Grammar {
            language: language.into(),
            message: message.into(),
        }
    }

    /// Builds an `InvalidQuery` error.
    #[must_use]
    pub fn invalid_query(language: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            language: language.into(),
            message: message.into(),
        }
    }

    /// Builds a `Parse` error.
    #[must_use]
    pub fn parse(language: impl Into<String>, path: PathBuf) -> Self {
        Self::Parse {
            language: language.into(),
            path,
        }
    }

    /// Returns `true` when the error is a cancellation, letting callers
    /// distinguish "timed out" from "failed".
    #[must_use]
    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled { .. })
    }
}
