//! Condition dispatch from the rule engine to capability evaluators.

use std::sync::Arc;

use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::ProviderError;
use crate::registry::CapabilityRegistry;
use crate::response::EvaluateResponse;

/// Log target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Routes evaluation requests to the registered capability evaluators.
///
/// The dispatcher holds the session's registry behind an `Arc` and evaluates
/// through `&self`, so one provider instance can service many overlapping
/// calls from the rule engine. It adds no retries of its own: evaluator
/// errors reach the caller unchanged.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<CapabilityRegistry>,
}

impl Dispatcher {
    /// Creates a dispatcher over a finished registry.
    #[must_use]
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Returns the underlying registry, e.g. for schema publication.
    #[must_use]
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Evaluates a raw condition payload against the named capability.
    ///
    /// A response with `matched = false` and no incidents is a valid non-error
    /// outcome: the condition evaluated and found nothing.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::UnsupportedCapability`] when the name is not
    ///   registered.
    /// - [`ProviderError::Canceled`] when the token is already canceled.
    /// - [`ProviderError::MalformedCondition`] when the payload does not
    ///   decode into the capability's condition shape.
    /// - Any error the evaluator itself returns, unchanged.
    pub fn evaluate(
        &self,
        token: &CancelToken,
        capability: &str,
        payload: &[u8],
    ) -> Result<EvaluateResponse, ProviderError> {
        let descriptor = self
            .registry
            .lookup(capability)
            .ok_or_else(|| ProviderError::unsupported_capability(capability))?;

        token.checkpoint(capability)?;

        debug!(
            target: DISPATCH_TARGET,
            capability,
            payload_len = payload.len(),
            "evaluating condition"
        );

        descriptor.evaluate(token, payload)
    }
}
