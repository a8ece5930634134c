//! Kernel error type.
//!
//! Sub-crates define their own error enums and wrap `TcError` as one variant
//! where lookups of core objects can fail.

use thiserror::Error;

use crate::{BlockId, PathId, PointId};

/// The top-level error type for `tc-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum TcError {
    #[error("point {0} not found")]
    PointNotFound(PointId),

    #[error("path {0} not found")]
    PathNotFound(PathId),

    #[error("block {0} not found")]
    BlockNotFound(BlockId),
}

/// Shorthand result type for all `tc-*` crates.
pub type TcResult<T> = Result<T, TcError>;
