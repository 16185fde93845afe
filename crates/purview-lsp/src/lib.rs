//! Backend session lifecycle management for Purview providers.
//!
//! A provider instance owns exactly one backend session: a language server
//! (or equivalent) process/connection, the workspace root it was initialised
//! against, and the capabilities it negotiated. This crate manages that
//! lifecycle:
//!
//! - [`BackendSession`] is the seam over the concrete wire transport. The
//!   JSON-RPC framing itself lives behind this trait and is not this crate's
//!   concern.
//! - [`Session`] resolves the workspace root (multi-root configurations are
//!   reduced to their first entry), builds the LSP initialise parameters, and
//!   drives the backend through initialisation and idempotent shutdown.
//! - [`ServerCommand`] spawns and terminates backend server processes for
//!   process-backed [`BackendSession`] implementations.
//!
//! Session initialisation failure is fatal to provider construction and is
//! never retried here. Callers serialise lifecycle transitions: `initialize`
//! and `shutdown` are not expected to race each other or in-flight
//! evaluations, which the `&mut self` receivers enforce.

mod backend;
mod process;
mod session;

pub use self::backend::{BackendSession, BackendSessionError};
pub use self::process::{ServerCommand, SpawnError, terminate};
pub use self::session::{Session, SessionConfig, SessionError};
