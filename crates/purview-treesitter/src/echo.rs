//! The `echo` capability: a minimal end-to-end exercise of dispatch.

use schemars::JsonSchema;
use serde::Deserialize;

use purview_provider::{CancelToken, EvaluateResponse, Incident, ProviderError};

/// Name the echo capability is registered under.
pub const ECHO_CAPABILITY: &str = "echo";

/// Condition payload for the `echo` capability.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EchoCondition {
    /// The condition body.
    pub echo: EchoSpec,
}

/// Body of an `echo` condition.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EchoSpec {
    /// Text to echo back through the incident variables.
    pub input: String,
}

/// Always matches, binding the condition's input to the `output` variable of
/// a single synthetic incident.
pub(crate) fn evaluate(
    _token: &CancelToken,
    condition: &EchoCondition,
) -> Result<EvaluateResponse, ProviderError> {
    Ok(EvaluateResponse::from_incidents(vec![
        Incident::new("file:///echo")
            .with_variable("output", serde_json::json!(condition.echo.input)),
    ]))
}
