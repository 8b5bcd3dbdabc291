//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant where they need to surface it.

use thiserror::Error;

/// Errors produced by `mesa-core` primitives.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("simulation time must be finite, got {0}")]
    NonFiniteTime(f64),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `mesa-core`.
pub type CoreResult<T> = Result<T, CoreError>;
