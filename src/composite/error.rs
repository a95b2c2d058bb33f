//! Composite construction errors.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompositeError {
    #[error("Composite member '{0}' is declared more than once")]
    DuplicateMember(String),
}
