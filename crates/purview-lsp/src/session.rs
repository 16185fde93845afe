//! Session lifecycle: root resolution, initialisation, idempotent shutdown.

use std::path::{Path, PathBuf};

use lsp_types::{ClientCapabilities, InitializeParams, ServerCapabilities, Uri};
use thiserror::Error;
use tracing::{debug, warn};

use purview_config::ProviderSettings;

use crate::backend::{BackendSession, BackendSessionError};

/// Log target for session lifecycle operations.
pub(crate) const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Errors raised while establishing or tearing down a session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// The workspace root path could not be expressed as a URI.
    #[error("workspace root '{}' cannot be expressed as a URI: {message}", path.display())]
    RootUri {
        /// Path that failed to convert.
        path: PathBuf,
        /// Description of the conversion failure.
        message: String,
    },

    /// The backend rejected or failed the initialisation handshake. Fatal to
    /// provider construction; not retried.
    #[error("backend session initialisation failed: {source}")]
    Init {
        /// Underlying backend error.
        #[source]
        source: BackendSessionError,
    },

    /// The backend failed while releasing its resources.
    #[error("backend session shutdown failed: {source}")]
    Shutdown {
        /// Underlying backend error.
        #[source]
        source: BackendSessionError,
    },
}

/// Parameters for establishing a session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Workspace folders; only the first is used as the root.
    pub workspace_folders: Vec<PathBuf>,
    /// Opaque JSON blob forwarded as LSP `initializationOptions`.
    pub initialization_options: Option<String>,
}

impl SessionConfig {
    /// Creates a configuration rooted at the given folders.
    #[must_use]
    pub fn new(workspace_folders: Vec<PathBuf>) -> Self {
        Self {
            workspace_folders,
            initialization_options: None,
        }
    }

    /// Attaches the initialization-options blob.
    #[must_use]
    pub fn with_initialization_options(mut self, options: impl Into<String>) -> Self {
        self.initialization_options = Some(options.into());
        self
    }
}

impl From<&ProviderSettings> for SessionConfig {
    fn from(settings: &ProviderSettings) -> Self {
        Self {
            workspace_folders: settings.workspace_folders.clone(),
            initialization_options: settings.initialization_options.clone(),
        }
    }
}

enum SessionState {
    Active,
    ShutDown,
}

/// A live backend session and its negotiated state.
///
/// Created once at provider initialisation, shared read-mostly by the
/// provider's capability evaluators, and torn down at provider shutdown.
#[derive(Debug)]
pub struct Session {
    root: Option<PathBuf>,
    backend: Box<dyn BackendSession>,
    capabilities: ServerCapabilities,
    state: SessionState,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Active => "active",
            Self::ShutDown => "shut down",
        };
        formatter.write_str(label)
    }
}

impl Session {
    /// Establishes the backend session.
    ///
    /// The workspace root is the first configured folder; further folders are
    /// ignored (a deliberate single-root reduction). The
    /// initialization-options blob is forwarded when it parses as JSON and
    /// replaced by an empty object otherwise — a malformed blob is tolerated,
    /// not fatal.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::RootUri`] when the root path cannot be turned
    /// into a URI, or [`SessionError::Init`] when the backend handshake
    /// fails. Both are fatal to provider construction.
    pub fn initialize(
        config: &SessionConfig,
        mut backend: Box<dyn BackendSession>,
    ) -> Result<Self, SessionError> {
        let root = config.workspace_folders.first().cloned();
        if config.workspace_folders.len() > 1 {
            debug!(
                target: SESSION_TARGET,
                folders = config.workspace_folders.len(),
                "multiple workspace folders configured; using the first as the root"
            );
        }

        let params = initialize_params(root.as_deref(), config.initialization_options.as_deref())?;

        let result = backend
            .initialize(params)
            .map_err(|source| SessionError::Init { source })?;

        match &root {
            Some(path) => debug!(
                target: SESSION_TARGET,
                root = %path.display(),
                "backend session initialised"
            ),
            None => debug!(
                target: SESSION_TARGET,
                "backend session initialised without a workspace root"
            ),
        }

        Ok(Self {
            root,
            backend,
            capabilities: result.capabilities,
            state: SessionState::Active,
        })
    }

    /// Returns the workspace root, when one was configured.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Returns the capabilities the backend advertised during initialisation.
    #[must_use]
    pub const fn server_capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    /// Returns `true` until the first [`Session::shutdown`] call.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active)
    }

    /// Releases the backend session.
    ///
    /// Idempotent: the first call delegates to the backend; every later call
    /// is a no-op returning `Ok`, even when the first attempt reported an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Shutdown`] when the backend's teardown fails
    /// on the first call.
    pub fn shutdown(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::ShutDown => Ok(()),
            SessionState::Active => {
                self.state = SessionState::ShutDown;
                debug!(target: SESSION_TARGET, "shutting down backend session");
                self.backend
                    .shutdown()
                    .map_err(|source| SessionError::Shutdown { source })
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.is_active() {
            if let Err(error) = self.shutdown() {
                warn!(
                    target: SESSION_TARGET,
                    error = %error,
                    "backend shutdown failed while dropping the session"
                );
            }
        }
    }
}

/// Builds the LSP initialise parameters for the session.
#[expect(
    deprecated,
    reason = "rootUri remains the field most language servers key on during initialize"
)]
fn initialize_params(
    root: Option<&Path>,
    options: Option<&str>,
) -> Result<InitializeParams, SessionError> {
    let root_uri = root.map(file_uri).transpose()?;
    let initialization_options = options.map(parse_initialization_options);

    Ok(InitializeParams {
        process_id: Some(std::process::id()),
        root_uri,
        initialization_options,
        capabilities: ClientCapabilities::default(),
        ..InitializeParams::default()
    })
}

/// Converts a workspace path into a `file://` URI.
fn file_uri(path: &Path) -> Result<Uri, SessionError> {
    let text = format!("file://{}", path.display());
    text.parse().map_err(|_| SessionError::RootUri {
        path: path.to_owned(),
        message: format!("'{text}' is not a valid URI"),
    })
}

/// Parses the opaque initialization-options blob, tolerating malformed JSON.
fn parse_initialization_options(blob: &str) -> serde_json::Value {
    serde_json::from_str(blob).unwrap_or_else(|error| {
        warn!(
            target: SESSION_TARGET,
            error = %error,
            "initialization options are not valid JSON; sending an empty object"
        );
        serde_json::Value::Object(serde_json::Map::new())
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use lsp_types::InitializeResult;
    use mockall::mock;
    use rstest::rstest;

    use super::*;

    mock! {
        Backend {}
        impl BackendSession for Backend {
            fn initialize(
                &mut self,
                params: InitializeParams,
            ) -> Result<InitializeResult, BackendSessionError>;
            fn shutdown(&mut self) -> Result<(), BackendSessionError>;
        }
    }

    /// Test double that records the initialise parameters it receives.
    struct RecordingBackend {
        params: Arc<Mutex<Option<InitializeParams>>>,
        shutdowns: Arc<Mutex<usize>>,
    }

    impl RecordingBackend {
        fn new() -> (Self, Arc<Mutex<Option<InitializeParams>>>, Arc<Mutex<usize>>) {
            let params = Arc::new(Mutex::new(None));
            let shutdowns = Arc::new(Mutex::new(0));
            let backend = Self {
                params: Arc::clone(&params),
                shutdowns: Arc::clone(&shutdowns),
            };
            (backend, params, shutdowns)
        }
    }

    impl BackendSession for RecordingBackend {
        fn initialize(
            &mut self,
            params: InitializeParams,
        ) -> Result<InitializeResult, BackendSessionError> {
            *self.params.lock().expect("params lock") = Some(params);
            Ok(InitializeResult::default())
        }

        fn shutdown(&mut self) -> Result<(), BackendSessionError> {
            *self.shutdowns.lock().expect("shutdown lock") += 1;
            Ok(())
        }
    }

    fn recorded_params(cell: &Arc<Mutex<Option<InitializeParams>>>) -> InitializeParams {
        cell.lock()
            .expect("params lock")
            .clone()
            .expect("initialize was called")
    }

    // -----------------------------------------------------------------------
    // Initialisation
    // -----------------------------------------------------------------------

    #[test]
    #[expect(deprecated, reason = "asserting on the rootUri field the session populates")]
    fn root_is_the_first_workspace_folder() {
        let (backend, params, _) = RecordingBackend::new();
        let config = SessionConfig::new(vec![
            PathBuf::from("/workspace/app"),
            PathBuf::from("/workspace/lib"),
        ]);

        let session = Session::initialize(&config, Box::new(backend)).expect("initialise");

        assert_eq!(session.root(), Some(Path::new("/workspace/app")));
        let sent = recorded_params(&params);
        assert_eq!(
            sent.root_uri.map(|uri| uri.as_str().to_owned()),
            Some("file:///workspace/app".to_owned())
        );
    }

    #[test]
    #[expect(deprecated, reason = "asserting on the rootUri field the session populates")]
    fn empty_folder_list_omits_the_root_uri() {
        let (backend, params, _) = RecordingBackend::new();
        let config = SessionConfig::default();

        let session = Session::initialize(&config, Box::new(backend)).expect("initialise");

        assert_eq!(session.root(), None);
        assert!(recorded_params(&params).root_uri.is_none());
    }

    #[rstest]
    #[case::no_folders(Vec::new(), None)]
    #[case::single(vec![PathBuf::from("/a")], Some("/a"))]
    #[case::multi_root_reduced(vec![PathBuf::from("/a"), PathBuf::from("/b")], Some("/a"))]
    fn root_is_reduced_to_the_first_folder(
        #[case] folders: Vec<PathBuf>,
        #[case] expected: Option<&str>,
    ) {
        let (backend, _, _) = RecordingBackend::new();
        let config = SessionConfig::new(folders);

        let session = Session::initialize(&config, Box::new(backend)).expect("initialise");

        assert_eq!(session.root(), expected.map(Path::new));
    }

    #[test]
    fn valid_options_blob_is_forwarded_as_json() {
        let (backend, params, _) = RecordingBackend::new();
        let config = SessionConfig::new(vec![PathBuf::from("/workspace/app")])
            .with_initialization_options(r#"{"telemetry": false}"#);

        Session::initialize(&config, Box::new(backend)).expect("initialise");

        let options = recorded_params(&params)
            .initialization_options
            .expect("options forwarded");
        assert_eq!(options["telemetry"], false);
    }

    #[test]
    fn malformed_options_blob_degrades_to_an_empty_object() {
        let (backend, params, _) = RecordingBackend::new();
        let config = SessionConfig::new(vec![PathBuf::from("/workspace/app")])
            .with_initialization_options("not json at all");

        Session::initialize(&config, Box::new(backend)).expect("tolerated");

        let options = recorded_params(&params)
            .initialization_options
            .expect("options forwarded");
        assert_eq!(options, serde_json::json!({}));
    }

    #[test]
    fn backend_initialise_failure_is_fatal() {
        let mut backend = MockBackend::new();
        backend
            .expect_initialize()
            .returning(|_| Err(BackendSessionError::new("handshake rejected")));

        let config = SessionConfig::new(vec![PathBuf::from("/workspace/app")]);
        let err = Session::initialize(&config, Box::new(backend)).expect_err("init failure");

        assert!(matches!(err, SessionError::Init { .. }));
    }

    // -----------------------------------------------------------------------
    // Shutdown
    // -----------------------------------------------------------------------

    #[test]
    fn shutdown_reaches_the_backend_exactly_once() {
        let (backend, _, shutdowns) = RecordingBackend::new();
        let config = SessionConfig::new(vec![PathBuf::from("/workspace/app")]);
        let mut session = Session::initialize(&config, Box::new(backend)).expect("initialise");

        session.shutdown().expect("first shutdown");
        session.shutdown().expect("second shutdown is a no-op");
        session.shutdown().expect("third shutdown is a no-op");

        assert_eq!(*shutdowns.lock().expect("shutdown lock"), 1);
        assert!(!session.is_active());
    }

    #[test]
    fn failed_shutdown_still_marks_the_session_shut_down() {
        let mut backend = MockBackend::new();
        backend
            .expect_initialize()
            .returning(|_| Ok(InitializeResult::default()));
        backend
            .expect_shutdown()
            .times(1)
            .returning(|| Err(BackendSessionError::new("exit failed")));

        let config = SessionConfig::new(vec![PathBuf::from("/workspace/app")]);
        let mut session = Session::initialize(&config, Box::new(backend)).expect("initialise");

        let err = session.shutdown().expect_err("first shutdown fails");
        assert!(matches!(err, SessionError::Shutdown { .. }));

        session.shutdown().expect("second shutdown is a no-op");
        assert!(!session.is_active());
    }

    // -----------------------------------------------------------------------
    // Configuration conversion
    // -----------------------------------------------------------------------

    #[test]
    fn session_config_from_provider_settings() {
        let settings = ProviderSettings {
            workspace_folders: vec![PathBuf::from("/workspace/app")],
            initialization_options: Some("{}".to_owned()),
            ..ProviderSettings::default()
        };

        let config = SessionConfig::from(&settings);

        assert_eq!(config.workspace_folders, settings.workspace_folders);
        assert_eq!(config.initialization_options.as_deref(), Some("{}"));
    }
}
