//! Per-session capability registry.

use std::collections::HashMap;

use tracing::warn;

use crate::capability::CapabilityDescriptor;
use crate::error::ProviderError;

/// Log target for registry operations.
pub(crate) const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Table of the capabilities one provider session exposes.
///
/// Built once during session initialisation from a fixed, provider-specific
/// list of descriptors and immutable afterwards: lookups take `&self` and
/// need no synchronisation, so a registry behind an `Arc` can serve
/// concurrent evaluations.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    capabilities: HashMap<String, CapabilityDescriptor>,
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from descriptor construction results.
    ///
    /// Descriptor construction can fail per capability (schema generation is
    /// fallible); such failures are logged and the capability is omitted —
    /// they never prevent the remaining capabilities from registering.
    /// Duplicate names are likewise logged and skipped.
    #[must_use]
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = Result<CapabilityDescriptor, ProviderError>>,
    ) -> Self {
        let mut registry = Self::new();
        for result in descriptors {
            match result {
                Ok(descriptor) => {
                    let name = descriptor.name().to_owned();
                    if let Err(error) = registry.register(descriptor) {
                        warn!(
                            target: REGISTRY_TARGET,
                            capability = %name,
                            error = %error,
                            "skipping capability"
                        );
                    }
                }
                Err(error) => {
                    warn!(
                        target: REGISTRY_TARGET,
                        error = %error,
                        "skipping capability that failed to build"
                    );
                }
            }
        }
        registry
    }

    /// Registers a capability descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::DuplicateCapability`] when a capability with
    /// the same name is already registered.
    pub fn register(&mut self, descriptor: CapabilityDescriptor) -> Result<(), ProviderError> {
        let name = descriptor.name().to_owned();
        if self.capabilities.contains_key(&name) {
            return Err(ProviderError::DuplicateCapability { name });
        }
        self.capabilities.insert(name, descriptor);
        Ok(())
    }

    /// Looks up a capability by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&CapabilityDescriptor> {
        self.capabilities.get(name)
    }

    /// Returns all registered descriptors, for schema publication.
    pub fn capabilities(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.capabilities.values()
    }

    /// Returns the number of registered capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Returns `true` when no capabilities are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::response::EvaluateResponse;

    #[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
    struct NoOpCondition {}

    fn no_op(name: &str) -> Result<CapabilityDescriptor, ProviderError> {
        CapabilityDescriptor::new::<NoOpCondition, _>(name, |_token, _condition| {
            Ok(EvaluateResponse::no_match())
        })
    }

    fn schema_failure(name: &str) -> Result<CapabilityDescriptor, ProviderError> {
        let source = serde_json::from_str::<serde_json::Value>("{")
            .expect_err("invalid JSON produces an error");
        Err(ProviderError::Schema {
            capability: name.to_owned(),
            source,
        })
    }

    #[test]
    fn new_registry_is_empty() {
        let registry = CapabilityRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = CapabilityRegistry::new();
        registry.register(no_op("query").expect("descriptor")).expect("register");

        assert!(registry.lookup("query").is_some());
        assert!(registry.lookup("echo").is_none());
    }

    #[test]
    fn register_rejects_duplicate_name() {
        let mut registry = CapabilityRegistry::new();
        registry.register(no_op("query").expect("descriptor")).expect("first register");

        let err = registry
            .register(no_op("query").expect("descriptor"))
            .expect_err("duplicate must fail");
        assert!(matches!(err, ProviderError::DuplicateCapability { ref name } if name == "query"));
    }

    #[test]
    fn failed_descriptor_does_not_abort_the_rest() {
        let registry = CapabilityRegistry::from_descriptors(vec![
            no_op("echo"),
            schema_failure("broken"),
            no_op("query"),
        ]);

        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("echo").is_some());
        assert!(registry.lookup("query").is_some());
        assert!(registry.lookup("broken").is_none());
    }

    #[test]
    fn duplicate_descriptor_in_bulk_construction_is_skipped() {
        let registry =
            CapabilityRegistry::from_descriptors(vec![no_op("query"), no_op("query")]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn capabilities_iterates_registered_names() {
        let registry = CapabilityRegistry::from_descriptors(vec![no_op("echo"), no_op("query")]);
        let mut names: Vec<&str> = registry.capabilities().map(CapabilityDescriptor::name).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["echo", "query"]);
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        let registry = std::sync::Arc::new(CapabilityRegistry::from_descriptors(vec![
            no_op("query"),
        ]));

        let clone = std::sync::Arc::clone(&registry);
        let handle = std::thread::spawn(move || {
            let descriptor = clone.lookup("query").expect("lookup in thread");
            descriptor.evaluate(&CancelToken::new(), b"{}").expect("evaluate")
        });

        let response = handle.join().expect("thread joins");
        assert!(!response.matched);
    }
}
