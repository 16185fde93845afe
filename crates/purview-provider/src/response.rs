//! The response envelope returned to the rule engine.
//!
//! The serialised shape is a compatibility contract consumed downstream by
//! report generation: PascalCase member names and zero-based positions must
//! be preserved exactly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Result of evaluating one condition against one capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvaluateResponse {
    /// Whether the condition matched anywhere.
    pub matched: bool,
    /// One entry per reported match, in evaluation order.
    #[serde(default)]
    pub incidents: Vec<Incident>,
}

impl EvaluateResponse {
    /// The "condition evaluated, nothing found" outcome. Not an error.
    #[must_use]
    pub fn no_match() -> Self {
        Self::default()
    }

    /// Builds a response from accumulated incidents: matched exactly when at
    /// least one incident was produced.
    #[must_use]
    pub fn from_incidents(incidents: Vec<Incident>) -> Self {
        Self {
            matched: !incidents.is_empty(),
            incidents,
        }
    }
}

/// A single reported match: file, optional span, and bound variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Incident {
    /// URI of the file the incident was found in.
    pub file_location: String,
    /// Span of the matched region, when the capability reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_location: Option<CodeLocation>,
    /// Variables bound by the evaluation, keyed by name.
    #[serde(default)]
    pub variables: BTreeMap<String, serde_json::Value>,
}

impl Incident {
    /// Creates an incident for the given file URI with no span and no
    /// variables.
    #[must_use]
    pub fn new(file_location: impl Into<String>) -> Self {
        Self {
            file_location: file_location.into(),
            code_location: None,
            variables: BTreeMap::new(),
        }
    }

    /// Attaches the matched span.
    #[must_use]
    pub fn with_code_location(mut self, location: CodeLocation) -> Self {
        self.code_location = Some(location);
        self
    }

    /// Binds a named variable.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }
}

/// Start and end of a matched region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeLocation {
    /// Position of the first character of the match.
    pub start: Position,
    /// Position just past the last character of the match.
    pub end: Position,
}

impl CodeLocation {
    /// Creates a span from start and end positions.
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// A zero-based (line, character) position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Position {
    /// Zero-based line number.
    pub line: u32,
    /// Zero-based character offset within the line.
    pub character: u32,
}

impl Position {
    /// Creates a position.
    #[must_use]
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}
