// src/error.rs
//
// Error taxonomy for setup, clone and edit paths.
//
// Per-block operations (tick, patch) have no error path at all; only the
// paths that allocate or take caller-provided ids can fail.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::params::{ParamId, ParamKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// An allocation failed. The target is left in its last valid state.
    #[error("insufficient memory")]
    InsufficientMemory,

    /// A param id outside its kind's namespace. Indicates a caller bug.
    #[error("param id {id} is out of range for {kind:?} params")]
    InvalidParamId { kind: ParamKind, id: ParamId },

    /// The cable set is already at its configured maximum.
    #[error("patch cable limit reached")]
    TooManyCables,

    /// A ParamManager cannot hold another collection.
    #[error("param manager already holds the maximum number of collections")]
    CollectionLimitReached,
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Error::InsufficientMemory
    }
}

/// Result of a fallible engine operation.
pub type Result<T> = std::result::Result<T, Error>;
