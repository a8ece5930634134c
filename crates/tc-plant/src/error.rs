//! Plant-model error type.

use thiserror::Error;

use tc_core::{PathId, PointId, TcError};

/// Errors produced by `tc-plant`.
#[derive(Debug, Error)]
pub enum PlantError {
    #[error(transparent)]
    Core(#[from] TcError),

    #[error("duplicate element name {0:?}")]
    DuplicateName(String),

    #[error("path {path} references unknown point {point}")]
    DanglingPath { path: PathId, point: PointId },

    #[error("block {0:?} has no members")]
    EmptyBlock(String),
}

pub type PlantResult<T> = Result<T, PlantError>;
