//! Well-known provider settings read out of a canonical configuration map.

use std::path::PathBuf;

use serde_yaml::Value;

use crate::error::ConfigError;
use crate::normalize::{ConfigMap, ConfigValue};

/// Settings every LSP-backed provider understands.
///
/// Extracted from a normalised configuration map; provider-specific keys
/// beyond these stay available to the provider through the map itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Workspace folders the provider analyses. The session reduces this to
    /// its first entry when resolving the workspace root.
    pub workspace_folders: Vec<PathBuf>,
    /// Path to the backend language server executable, when one is spawned.
    pub server_path: Option<PathBuf>,
    /// Arguments passed to the backend language server.
    pub server_args: Vec<String>,
    /// Opaque JSON blob forwarded as LSP `initializationOptions`.
    pub initialization_options: Option<String>,
}

impl ProviderSettings {
    /// Reads the well-known settings keys from a canonical map.
    ///
    /// Absent keys fall back to empty defaults; present keys must have the
    /// right shape.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValueType`] when a present key holds a value of
    /// the wrong shape (e.g. `workspaceFolders` is not a sequence of
    /// strings).
    pub fn from_config(config: &ConfigMap) -> Result<Self, ConfigError> {
        let workspace_folders = optional_string_sequence(config, "workspaceFolders")?
            .into_iter()
            .map(PathBuf::from)
            .collect();
        let server_path = optional_string(config, "lspServerPath")?.map(PathBuf::from);
        let server_args = optional_string_sequence(config, "lspServerArgs")?;
        let initialization_options =
            optional_string(config, "lspServerInitializationOptions")?;

        Ok(Self {
            workspace_folders,
            server_path,
            server_args,
            initialization_options,
        })
    }
}

fn optional_string(
    config: &ConfigMap,
    key: &'static str,
) -> Result<Option<String>, ConfigError> {
    config.get(key).map_or(Ok(None), |value| {
        value
            .as_str()
            .map(|content| Some(content.to_owned()))
            .ok_or_else(|| ConfigError::ValueType {
                key: key.to_owned(),
                expected: "string",
            })
    })
}

fn optional_string_sequence(
    config: &ConfigMap,
    key: &'static str,
) -> Result<Vec<String>, ConfigError> {
    let Some(value) = config.get(key) else {
        return Ok(Vec::new());
    };

    let wrong_shape = || ConfigError::ValueType {
        key: key.to_owned(),
        expected: "sequence of strings",
    };

    let sequence = value
        .as_scalar()
        .and_then(Value::as_sequence)
        .ok_or_else(wrong_shape)?;

    sequence
        .iter()
        .map(|item| item.as_str().map(str::to_owned).ok_or_else(wrong_shape))
        .collect()
}
