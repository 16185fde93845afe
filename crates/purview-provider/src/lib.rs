//! Capability evaluation and dispatch framework for Purview providers.
//!
//! A provider exposes a fixed set of named **capabilities** — independently
//! invocable units of analysis logic. The rule engine drives them through a
//! uniform surface: it sends a capability name plus a raw condition payload
//! and receives an [`EvaluateResponse`] carrying zero or more [`Incident`]s.
//!
//! The pieces fit together like this:
//!
//! - [`CapabilityDescriptor`] pairs a capability name with a JSON condition
//!   schema (generated from the condition type) and a type-erased evaluator.
//!   The typed evaluator function is wrapped at registration time; payload
//!   decoding happens inside the wrapper so every evaluator sees a fully
//!   decoded condition.
//! - [`CapabilityRegistry`] holds the descriptors for one provider session.
//!   It is built once at session initialisation and read-only afterwards, so
//!   concurrent lookups need no locking.
//! - [`Dispatcher`] resolves a capability by name and invokes its evaluator,
//!   honouring the caller's [`CancelToken`].
//!
//! Evaluator failures surface to the rule engine unchanged; the dispatcher
//! never retries. A response with `matched = false` and no incidents is a
//! valid outcome meaning "condition evaluated, nothing found".

mod cancel;
mod capability;
mod dispatch;
mod error;
mod registry;
mod response;

pub use self::cancel::CancelToken;
pub use self::capability::CapabilityDescriptor;
pub use self::dispatch::Dispatcher;
pub use self::error::ProviderError;
pub use self::registry::CapabilityRegistry;
pub use self::response::{CodeLocation, EvaluateResponse, Incident, Position};
