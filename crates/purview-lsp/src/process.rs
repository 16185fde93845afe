//! Spawning and terminating backend server processes.
//!
//! [`BackendSession`](crate::BackendSession) implementations that run the
//! backend as a child process use these helpers for the process half of the
//! lifecycle; the wire protocol on the child's stdio stays their concern.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

/// Log target for process lifecycle operations.
pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// How long a child gets to exit on its own before it is killed.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

/// Errors from spawning a backend server process.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SpawnError {
    /// The configured executable does not exist on the search path.
    #[error("backend server binary not found: {command}")]
    BinaryNotFound {
        /// Command that was looked up.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The process could not be started for another reason.
    #[error("failed to start backend server: {message}")]
    Failed {
        /// Human-readable failure description.
        message: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

/// Command line for a backend server process.
#[derive(Debug, Clone)]
pub struct ServerCommand {
    /// The executable path or command name.
    pub command: PathBuf,
    /// Arguments to pass to the server.
    pub args: Vec<String>,
    /// Working directory for the spawned process.
    pub working_dir: Option<PathBuf>,
}

impl ServerCommand {
    /// Creates a command with no arguments.
    #[must_use]
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Sets the server arguments.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Sets a custom working directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Spawns the server with piped stdio.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError::BinaryNotFound`] when the executable is missing
    /// and [`SpawnError::Failed`] for any other spawn failure.
    pub fn spawn(&self) -> Result<Child, SpawnError> {
        debug!(
            target: PROCESS_TARGET,
            command = %self.command.display(),
            args = ?self.args,
            "spawning backend server process"
        );

        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SpawnError::BinaryNotFound {
                    command: self.command.display().to_string(),
                    source: Arc::new(e),
                }
            } else {
                SpawnError::Failed {
                    message: format!("failed to start {}", self.command.display()),
                    source: Arc::new(e),
                }
            }
        })
    }
}

/// Terminates a backend server child process, killing it after a short grace
/// period when it does not exit on its own.
pub fn terminate(child: &mut Child) {
    match child.try_wait() {
        Ok(Some(status)) => {
            debug!(target: PROCESS_TARGET, ?status, "backend server exited");
        }
        Ok(None) => {
            warn!(
                target: PROCESS_TARGET,
                "backend server did not exit gracefully, waiting before killing"
            );
            wait_then_kill(child);
        }
        Err(e) => {
            warn!(
                target: PROCESS_TARGET,
                error = %e,
                "failed to check backend server status, waiting before killing"
            );
            wait_then_kill(child);
        }
    }
}

fn wait_then_kill(child: &mut Child) {
    thread::sleep(SHUTDOWN_GRACE);
    match child.try_wait() {
        Ok(Some(status)) => {
            debug!(
                target: PROCESS_TARGET,
                ?status,
                "backend server exited during grace period"
            );
        }
        Ok(None) | Err(_) => {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
