//! Abstraction over concrete backend session implementations.

use std::error::Error;
use std::fmt;

use lsp_types::{InitializeParams, InitializeResult};
use thiserror::Error;

/// Errors reported by backend session implementations.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct BackendSessionError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl BackendSessionError {
    /// Builds an error without an underlying source.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error that wraps an underlying source.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-friendly description without the optional source.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Behaviour required from a concrete backend session binding.
///
/// Implementations wrap whatever wire transport reaches the backend — a
/// spawned language server speaking JSON-RPC over stdio, an in-process
/// engine, or a test double. The transport details stay behind this trait.
pub trait BackendSession: Send {
    /// Runs the initialisation handshake and returns the backend's response.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendSessionError`] when the backend cannot be reached
    /// or rejects the handshake.
    fn initialize(
        &mut self,
        params: InitializeParams,
    ) -> Result<InitializeResult, BackendSessionError>;

    /// Releases the backend's resources.
    ///
    /// Called at most once per session; [`crate::Session`] guarantees
    /// repeated shutdowns never reach the backend twice.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendSessionError`] when teardown fails; the session is
    /// considered shut down regardless.
    fn shutdown(&mut self) -> Result<(), BackendSessionError>;
}

impl fmt::Debug for dyn BackendSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("BackendSession")
    }
}
