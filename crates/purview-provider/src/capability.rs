//! Capability descriptors: name, condition schema, and evaluator.

use std::fmt;

use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;

use crate::cancel::CancelToken;
use crate::error::ProviderError;
use crate::response::EvaluateResponse;

/// Type-erased evaluator stored in a descriptor.
///
/// Receives the cancellation token, the capability name, and the raw
/// condition payload; the typed wrapper built by
/// [`CapabilityDescriptor::new`] decodes the payload before calling the real
/// evaluator.
type ErasedEvaluator =
    Box<dyn Fn(&CancelToken, &str, &[u8]) -> Result<EvaluateResponse, ProviderError> + Send + Sync>;

/// One registered capability: its name, the JSON schema of its condition
/// shape, and the evaluator invoked for it.
///
/// Descriptors are immutable once constructed. The condition schema is
/// generated from the condition type and can be handed to the rule engine for
/// validation and documentation.
pub struct CapabilityDescriptor {
    name: String,
    condition_schema: serde_json::Value,
    evaluator: ErasedEvaluator,
}

impl CapabilityDescriptor {
    /// Builds a descriptor from a typed evaluator function.
    ///
    /// The condition type `C` defines both the schema published for this
    /// capability and the shape the raw payload is decoded into. Decoding
    /// happens in a wrapper installed here, so `evaluate` only ever sees a
    /// fully decoded condition; payloads that do not decode surface as
    /// [`ProviderError::MalformedCondition`] without reaching the evaluator.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Schema`] when the condition schema cannot be
    /// serialised. Callers registering a fixed capability list log and skip
    /// the failed capability rather than aborting the rest.
    pub fn new<C, F>(name: impl Into<String>, evaluate: F) -> Result<Self, ProviderError>
    where
        C: DeserializeOwned + JsonSchema,
        F: Fn(&CancelToken, &C) -> Result<EvaluateResponse, ProviderError> + Send + Sync + 'static,
    {
        let name = name.into();
        let condition_schema =
            serde_json::to_value(schema_for!(C)).map_err(|source| ProviderError::Schema {
                capability: name.clone(),
                source,
            })?;

        let evaluator: ErasedEvaluator = Box::new(move |token, capability, payload| {
            let condition: C = serde_yaml::from_slice(payload).map_err(|source| {
                ProviderError::MalformedCondition {
                    capability: capability.to_owned(),
                    source,
                }
            })?;
            evaluate(token, &condition)
        });

        Ok(Self {
            name,
            condition_schema,
            evaluator,
        })
    }

    /// Returns the capability name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the JSON schema describing this capability's condition shape.
    #[must_use]
    pub const fn condition_schema(&self) -> &serde_json::Value {
        &self.condition_schema
    }

    /// Decodes the payload and runs the evaluator.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MalformedCondition`] when the payload does
    /// not decode into the condition shape; evaluator errors are passed
    /// through unchanged.
    pub fn evaluate(
        &self,
        token: &CancelToken,
        payload: &[u8],
    ) -> Result<EvaluateResponse, ProviderError> {
        (self.evaluator)(token, &self.name, payload)
    }
}

impl fmt::Debug for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
