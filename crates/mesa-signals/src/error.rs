//! Signal-subsystem error type.

use thiserror::Error;

use crate::SignalType;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error(
        "cyclical dependency detected: Computed({computed}) tries to change {observable} \
         while also depending on it"
    )]
    CyclicalDependency { computed: String, observable: String },

    #[error("{owner} has no observable named {name:?}")]
    UnknownObservable { owner: String, name: String },

    #[error("{owner} already has an observable named {name:?}")]
    DuplicateObservable { owner: String, name: String },

    #[error("{owner}.{name} does not emit {signal} signals")]
    UnsupportedSignal {
        owner:  String,
        name:   String,
        signal: SignalType,
    },

    #[error("index {index} out of range for {observable} of length {len}")]
    IndexOutOfRange {
        observable: String,
        index:      usize,
        len:        usize,
    },

    #[error("{0} cannot change while a `with` closure is reading it")]
    Borrowed(String),

    #[error("Computed({0}) has no value")]
    Unevaluated(String),

    /// A failure raised by the function wrapped in a `Computed`.
    #[error("computation failed: {0}")]
    Computation(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SignalError {
    /// Wrap an error raised inside a computed function.
    pub fn computation<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        SignalError::Computation(Box::new(err))
    }
}

pub type SignalResult<T> = Result<T, SignalError>;
