//! Dependency-graph error types.

use thiserror::Error;

pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A strongly connected set of projects and series linked by `current`
    /// reads. Feedback must go through `latest` reads instead.
    #[error("Cycle detected among current reads: {}", members.join(" -> "))]
    CycleDetected { members: Vec<String> },

    #[error("Duplicate {kind} node: {name}")]
    DuplicateNode { kind: &'static str, name: String },

    #[error("Unknown {kind} node: {name}")]
    UnknownNode { kind: &'static str, name: String },
}
