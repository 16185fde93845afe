//! Provider configuration normalization for Purview.
//!
//! Provider configuration arrives as a permissively deserialised YAML tree:
//! mapping keys are arbitrary values until proven otherwise. Before a provider
//! is constructed the tree is normalised with [`normalize`] into a
//! [`ConfigMap`] whose keys are strings at every depth — guaranteed by the
//! type, not by convention. [`ProviderSettings`] then reads the well-known
//! provider fields (workspace folders, server command, initialization
//! options) out of the canonical map.
//!
//! Normalization is all-or-nothing: a non-string key anywhere in the tree
//! fails the whole call with [`ConfigError::KeyType`] and no partial result.

mod error;
mod normalize;
mod settings;

pub use self::error::ConfigError;
pub use self::normalize::{ConfigMap, ConfigValue, normalize};
pub use self::settings::ProviderSettings;
