//! Construction-time graph validation.
//!
//! Uses Stillwater's `Validation` to report every problem with a graph in
//! one pass instead of stopping at the first.

use crate::core::StateGraph;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// A structural problem with a configured state graph.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphViolation {
    #[error("State graph declares no states")]
    EmptyGraph,

    #[error("Initial state '{initial}' is not in the state graph")]
    InitialNotInGraph { initial: String },

    #[error("Event '{event}' in state '{state}' targets unknown state '{target}'")]
    UnknownTarget {
        state: String,
        event: String,
        target: String,
    },

    #[error("State '{state}' is unreachable from the initial state")]
    UnreachableState { state: String },
}

/// Check `graph` against `initial`, accumulating all violations.
pub fn validate_graph(
    graph: &StateGraph,
    initial: &str,
) -> Validation<(), NonEmptyVec<GraphViolation>> {
    if graph.is_empty() {
        return Validation::fail(GraphViolation::EmptyGraph);
    }

    let mut checks: Vec<Validation<(), NonEmptyVec<GraphViolation>>> = Vec::new();

    if !graph.contains(initial) {
        checks.push(Validation::fail(GraphViolation::InitialNotInGraph {
            initial: initial.to_string(),
        }));
    }

    for state in graph.states() {
        for (event, target) in graph.transitions(state).into_iter().flatten() {
            if !graph.contains(target) {
                checks.push(Validation::fail(GraphViolation::UnknownTarget {
                    state: state.to_string(),
                    event: event.clone(),
                    target: target.clone(),
                }));
            }
        }
    }

    // Reachability is meaningless without a valid starting point.
    if graph.contains(initial) {
        let reachable = graph.reachable_from(initial);
        for state in graph.states().filter(|state| !reachable.contains(state)) {
            checks.push(Validation::fail(GraphViolation::UnreachableState {
                state: state.to_string(),
            }));
        }
    }

    Validation::all_vec(checks).map(|_| ())
}

/// Collapse a validation into a plain list of violations.
pub(crate) fn into_result(
    validation: Validation<(), NonEmptyVec<GraphViolation>>,
) -> Result<(), Vec<GraphViolation>> {
    match validation {
        Validation::Success(_) => Ok(()),
        Validation::Failure(errors) => Err(errors.iter().cloned().collect()),
    }
}
