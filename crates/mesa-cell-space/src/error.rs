//! Cell-space error type.

use thiserror::Error;

use mesa_core::CellId;

use crate::Coordinate;

/// Errors produced by `mesa-cell-space`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpaceError {
    #[error("cell {0} is full (capacity {1})")]
    CellFull(Coordinate, usize),

    #[error("agent not found in cell {0}")]
    AgentNotFound(Coordinate),

    #[error("cell {0} is not connected to {1}")]
    NotConnected(Coordinate, Coordinate),

    #[error("cell {cell} already has a connection keyed {key}")]
    DuplicateConnection { cell: Coordinate, key: Coordinate },

    #[error("{0} does not exist in this space")]
    UnknownCell(CellId),

    #[error("a cell already exists at {0}")]
    DuplicateCoordinate(Coordinate),

    #[error("no empty cell available")]
    NoEmptyCell,

    #[error("cannot select from an empty collection")]
    EmptyCollection,

    #[error("neighborhood radius must be at least 1, got {0}")]
    InvalidRadius(usize),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type SpaceResult<T> = Result<T, SpaceError>;
