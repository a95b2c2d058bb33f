//! Errors raised while building configurations.

use crate::config::GraphViolation;
use thiserror::Error;

/// Errors that can occur when building a machine configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Initial context not specified. Call .context(value) before .build()")]
    MissingContext,

    #[error("No states defined. Add at least one state or transition")]
    NoStates,

    #[error("Invalid state graph: {}", summarize(.0))]
    InvalidGraph(Vec<GraphViolation>),

    #[error("Configuration could not be canonicalized for hashing: {0}")]
    Canonicalize(String),

    #[error("Configuration document is malformed: {0}")]
    Document(String),
}

fn summarize(violations: &[GraphViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
