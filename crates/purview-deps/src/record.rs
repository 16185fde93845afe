//! The dependency record reported by extraction backends.

use serde::{Deserialize, Serialize};

/// A single dependency of an analysed project.
///
/// Serialised with PascalCase field names (`Name`, `Version`,
/// `ResolvedIdentifier`, `Indirect`) — the shape consumed by the
/// dependency-report collaborator downstream.
///
/// # Example
///
/// ```
/// use purview_deps::Dependency;
///
/// let dep = Dependency::direct("serde", "1.0.219", "registry+serde@1.0.219");
/// assert!(!dep.indirect);
/// assert_eq!(dep.name, "serde");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dependency {
    /// Package name as declared by the build system.
    pub name: String,
    /// Resolved version string.
    pub version: String,
    /// Backend-specific resolved identifier (registry coordinate, lock hash,
    /// or similar). May be empty when the backend cannot resolve one.
    pub resolved_identifier: String,
    /// `true` when the dependency is only pulled in transitively.
    pub indirect: bool,
}

impl Dependency {
    /// Creates a directly declared dependency.
    #[must_use]
    pub fn direct(
        name: impl Into<String>,
        version: impl Into<String>,
        resolved_identifier: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            resolved_identifier: resolved_identifier.into(),
            indirect: false,
        }
    }

    /// Creates a transitively required dependency.
    #[must_use]
    pub fn transitive(
        name: impl Into<String>,
        version: impl Into<String>,
        resolved_identifier: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            resolved_identifier: resolved_identifier.into(),
            indirect: true,
        }
    }

    /// Returns the identity key used to recognise duplicate records.
    ///
    /// The key is the plain concatenation of name, version, and resolved
    /// identifier. Empty components are legal; records whose concatenations
    /// coincide are treated as the same dependency.
    #[must_use]
    pub fn identity(&self) -> String {
        format!("{}{}{}", self.name, self.version, self.resolved_identifier)
    }
}
