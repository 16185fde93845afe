//! The tree-sitter provider: configuration, session, and capability wiring.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lsp_types::{InitializeParams, InitializeResult};
use tracing::debug;

use purview_config::ProviderSettings;
use purview_lsp::{BackendSession, BackendSessionError, Session, SessionConfig, SessionError};
use purview_provider::{
    CancelToken, CapabilityDescriptor, CapabilityRegistry, Dispatcher, EvaluateResponse,
    ProviderError,
};

use crate::cache::ParseCache;
use crate::echo::{self, ECHO_CAPABILITY, EchoCondition};
use crate::language::LanguageTable;
use crate::query::{self, QUERY_CAPABILITY, QueryCondition};

/// Log target for provider lifecycle operations.
pub(crate) const PROVIDER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::provider");

/// Read-mostly state shared by this provider's capability evaluators.
#[derive(Debug)]
pub(crate) struct ProviderState {
    /// Workspace root resolved by the session, when one was configured.
    pub(crate) root: Option<PathBuf>,
    /// Grammar and extension tables, frozen after initialisation.
    pub(crate) languages: LanguageTable,
    /// Parsed-file cache shared across concurrent evaluations.
    pub(crate) cache: ParseCache,
}

/// Backend session for providers whose analysis runs entirely in-process.
///
/// The tree-sitter provider parses files itself; no external language server
/// is consulted, so the handshake is a formality and teardown has nothing to
/// release.
#[derive(Debug, Clone, Copy, Default)]
pub struct InProcessBackend;

impl BackendSession for InProcessBackend {
    fn initialize(
        &mut self,
        _params: InitializeParams,
    ) -> Result<InitializeResult, BackendSessionError> {
        Ok(InitializeResult::default())
    }

    fn shutdown(&mut self) -> Result<(), BackendSessionError> {
        Ok(())
    }
}

/// A provider exposing tree-sitter structural queries to the rule engine.
///
/// Construction wires the pieces together in order: provider settings are
/// read from normalised configuration, the backend session is established
/// (fatal on failure), the language tables and parse cache are set up, and
/// the capability registry is built — capabilities that fail to register are
/// logged and omitted without aborting the rest.
#[derive(Debug)]
pub struct TreeSitterProvider {
    session: Session,
    state: Arc<ProviderState>,
    dispatcher: Dispatcher,
}

impl TreeSitterProvider {
    /// Initialises a provider with the bundled language set.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::SessionInit`] when the backend session
    /// cannot be established; provider construction is fatal on that path
    /// and never retried.
    pub fn init(
        settings: &ProviderSettings,
        backend: Box<dyn BackendSession>,
    ) -> Result<Self, ProviderError> {
        Self::init_with_languages(settings, backend, LanguageTable::with_defaults())
    }

    /// Initialises a provider with a caller-assembled language table.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::SessionInit`] when the backend session
    /// cannot be established.
    pub fn init_with_languages(
        settings: &ProviderSettings,
        backend: Box<dyn BackendSession>,
        languages: LanguageTable,
    ) -> Result<Self, ProviderError> {
        let config = SessionConfig::from(settings);
        let session = Session::initialize(&config, backend).map_err(|source| {
            ProviderError::session_init("session initialisation failed", source)
        })?;

        let state = Arc::new(ProviderState {
            root: session.root().map(Path::to_path_buf),
            languages,
            cache: ParseCache::new(),
        });

        let dispatcher = Dispatcher::new(build_registry(&state));

        debug!(
            target: PROVIDER_TARGET,
            capabilities = dispatcher.registry().len(),
            "tree-sitter provider initialised"
        );

        Ok(Self {
            session,
            state,
            dispatcher,
        })
    }

    /// Evaluates a raw condition payload against a named capability.
    ///
    /// # Errors
    ///
    /// Propagates dispatch and evaluator errors unchanged; see
    /// [`Dispatcher::evaluate`].
    pub fn evaluate(
        &self,
        token: &CancelToken,
        capability: &str,
        payload: &[u8],
    ) -> Result<EvaluateResponse, ProviderError> {
        self.dispatcher.evaluate(token, capability, payload)
    }

    /// Returns the dispatcher, e.g. for schema publication to the rule
    /// engine.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the backend session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the languages this provider can query.
    #[must_use]
    pub fn languages(&self) -> &LanguageTable {
        &self.state.languages
    }

    /// Shuts the backend session down. Idempotent, like
    /// [`Session::shutdown`].
    ///
    /// # Errors
    ///
    /// Returns the backend's teardown failure from the first call.
    pub fn shutdown(&mut self) -> Result<(), SessionError> {
        self.session.shutdown()
    }
}

/// Builds the provider's capability registry.
///
/// Descriptor construction failures are logged and that capability is
/// omitted; the remaining capabilities still register.
fn build_registry(state: &Arc<ProviderState>) -> CapabilityRegistry {
    let query_state = Arc::clone(state);
    CapabilityRegistry::from_descriptors(vec![
        CapabilityDescriptor::new::<EchoCondition, _>(ECHO_CAPABILITY, echo::evaluate),
        CapabilityDescriptor::new::<QueryCondition, _>(QUERY_CAPABILITY, move |token, condition| {
            query::evaluate(&query_state, token, condition)
        }),
    ])
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn provider_for(dir: &TempDir) -> TreeSitterProvider {
        let settings = ProviderSettings {
            workspace_folders: vec![dir.path().to_path_buf()],
            ..ProviderSettings::default()
        };
        TreeSitterProvider::init(&settings, Box::new(InProcessBackend)).expect("provider init")
    }

    fn query_payload(language: &str, query: &str) -> Vec<u8> {
        format!("query:\n  language: {language}\n  query: \"{query}\"\n").into_bytes()
    }

    // -----------------------------------------------------------------------
    // Query capability, end to end
    // -----------------------------------------------------------------------

    #[test]
    fn one_matching_file_produces_one_incident_with_uri_and_span() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("main.rs"), "fn main() {}\n").expect("write");
        let provider = provider_for(&dir);

        let response = provider
            .evaluate(
                &CancelToken::new(),
                "query",
                &query_payload("rust", "(function_item) @func"),
            )
            .expect("evaluate");

        assert!(response.matched);
        assert_eq!(response.incidents.len(), 1);

        let incident = response.incidents.first().expect("one incident");
        assert!(incident.file_location.starts_with("file://"));
        assert!(incident.file_location.ends_with("/main.rs"));
        assert!(incident.variables.is_empty(), "captures are not bound");

        let location = incident.code_location.expect("span reported");
        assert_eq!(location.start.line, 0);
        assert_eq!(location.start.character, 0);
        assert_eq!(location.end.line, 0);
        assert_eq!(location.end.character, 12);
    }

    #[test]
    fn incidents_are_ordered_by_file_name() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("beta.rs"), "fn b() {}\n").expect("write");
        fs::write(dir.path().join("alpha.rs"), "fn a() {}\n").expect("write");
        let provider = provider_for(&dir);

        let response = provider
            .evaluate(
                &CancelToken::new(),
                "query",
                &query_payload("rust", "(function_item) @func"),
            )
            .expect("evaluate");

        let files: Vec<&str> = response
            .incidents
            .iter()
            .map(|incident| incident.file_location.as_str())
            .collect();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("/alpha.rs"));
        assert!(files[1].ends_with("/beta.rs"));
    }

    #[test]
    fn files_with_other_extensions_are_skipped() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("main.rs"), "fn main() {}\n").expect("write");
        fs::write(dir.path().join("notes.txt"), "fn decoy() {}\n").expect("write");
        let provider = provider_for(&dir);

        let response = provider
            .evaluate(
                &CancelToken::new(),
                "query",
                &query_payload("rust", "(function_item) @func"),
            )
            .expect("evaluate");

        assert_eq!(response.incidents.len(), 1);
    }

    #[rstest]
    #[case("python", "def hello():\n    pass\n", "hello.py", "(function_definition) @func")]
    #[case(
        "typescript",
        "function hello(): string { return 'hi'; }\n",
        "hello.ts",
        "(function_declaration) @func"
    )]
    fn other_bundled_languages_are_queryable(
        #[case] language: &str,
        #[case] source: &str,
        #[case] file_name: &str,
        #[case] query: &str,
    ) {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join(file_name), source).expect("write");
        let provider = provider_for(&dir);

        let response = provider
            .evaluate(&CancelToken::new(), "query", &query_payload(language, query))
            .expect("evaluate");

        assert!(response.matched, "{language} query should match");
        assert_eq!(response.incidents.len(), 1);
    }

    #[test]
    fn no_matches_is_a_non_error_unmatched_response() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("lib.rs"), "const X: u8 = 1;\n").expect("write");
        let provider = provider_for(&dir);

        let response = provider
            .evaluate(
                &CancelToken::new(),
                "query",
                &query_payload("rust", "(function_item) @func"),
            )
            .expect("evaluate");

        assert!(!response.matched);
        assert!(response.incidents.is_empty());
    }

    #[test]
    fn unsupported_language_surfaces_from_the_evaluator() {
        let dir = TempDir::new().expect("tempdir");
        let provider = provider_for(&dir);

        let err = provider
            .evaluate(
                &CancelToken::new(),
                "query",
                &query_payload("go", "(function_declaration) @func"),
            )
            .expect_err("unsupported language");

        assert!(matches!(err, ProviderError::UnsupportedLanguage { .. }));
    }

    #[test]
    fn repeated_evaluation_reuses_the_parse_cache() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("main.rs"), "fn main() {}\n").expect("write");
        let provider = provider_for(&dir);
        let payload = query_payload("rust", "(function_item) @func");

        provider
            .evaluate(&CancelToken::new(), "query", &payload)
            .expect("first evaluation");
        provider
            .evaluate(&CancelToken::new(), "query", &payload)
            .expect("second evaluation");

        assert_eq!(provider.state.cache.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Dispatch boundary
    // -----------------------------------------------------------------------

    #[test]
    fn echo_round_trips_through_dispatch() {
        let dir = TempDir::new().expect("tempdir");
        let provider = provider_for(&dir);

        let response = provider
            .evaluate(&CancelToken::new(), "echo", b"echo:\n  input: ping\n")
            .expect("evaluate");

        assert!(response.matched);
        let incident = response.incidents.first().expect("one incident");
        assert_eq!(
            incident.variables.get("output"),
            Some(&serde_json::json!("ping"))
        );
    }

    #[test]
    fn unknown_capability_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let provider = provider_for(&dir);

        let err = provider
            .evaluate(&CancelToken::new(), "dependency", b"{}")
            .expect_err("unknown capability");

        assert!(matches!(err, ProviderError::UnsupportedCapability { .. }));
    }

    #[test]
    fn malformed_query_payload_is_rejected_at_the_boundary() {
        let dir = TempDir::new().expect("tempdir");
        let provider = provider_for(&dir);

        let err = provider
            .evaluate(&CancelToken::new(), "query", b"query: just-a-string\n")
            .expect_err("malformed condition");

        assert!(matches!(err, ProviderError::MalformedCondition { .. }));
    }

    #[test]
    fn both_capabilities_publish_condition_schemas() {
        let dir = TempDir::new().expect("tempdir");
        let provider = provider_for(&dir);
        let registry = provider.dispatcher().registry();

        assert_eq!(registry.len(), 2);
        for name in ["echo", "query"] {
            let descriptor = registry.lookup(name).expect("capability registered");
            let schema = descriptor.condition_schema();
            assert!(
                schema.get("properties").and_then(|p| p.get(name)).is_some(),
                "schema for '{name}' should describe its condition key"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    #[test]
    fn provider_builds_from_normalised_raw_configuration() {
        let dir = TempDir::new().expect("tempdir");
        let raw = format!(
            "workspaceFolders:\n  - {}\nlspServerInitializationOptions: '{{}}'\n",
            dir.path().display()
        );
        let value: serde_yaml::Value = serde_yaml::from_str(&raw).expect("parse raw config");
        let serde_yaml::Value::Mapping(mapping) = value else {
            panic!("raw config is not a mapping");
        };

        let canonical = purview_config::normalize(&mapping).expect("normalise");
        let settings = ProviderSettings::from_config(&canonical).expect("settings");
        let provider =
            TreeSitterProvider::init(&settings, Box::new(InProcessBackend)).expect("init");

        assert_eq!(provider.session().root(), Some(dir.path()));
    }

    #[test]
    fn provider_root_follows_the_first_workspace_folder() {
        let dir = TempDir::new().expect("tempdir");
        let settings = ProviderSettings {
            workspace_folders: vec![dir.path().to_path_buf(), PathBuf::from("/elsewhere")],
            ..ProviderSettings::default()
        };
        let provider =
            TreeSitterProvider::init(&settings, Box::new(InProcessBackend)).expect("init");

        assert_eq!(provider.session().root(), Some(dir.path()));
    }

    #[test]
    fn shutdown_is_idempotent() {
        let dir = TempDir::new().expect("tempdir");
        let mut provider = provider_for(&dir);

        provider.shutdown().expect("first shutdown");
        provider.shutdown().expect("second shutdown is a no-op");
        assert!(!provider.session().is_active());
    }
}
