use thiserror::Error;

use crate::PathRef;

/// Raised when adding a path to a [`crate::Garden`] would introduce a cycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CycleError {
    #[error("path {0:?} cannot use itself as an input")]
    SelfReference(PathRef),
    #[error("adding {dest:?} with input {input:?} would create a cycle: {input:?} already transitively requires {dest:?}")]
    AncestorCycle { dest: PathRef, input: PathRef },
}
