//! `mesa-cell-space` — discrete spaces made of connected cells.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`coordinate`] | `Coordinate`                                               |
//! | [`cell`]       | `Cell<A>`                                                  |
//! | [`space`]      | `DiscreteSpace<A>` (cell arena, empties, neighborhoods)    |
//! | [`collection`] | `CellCollection`, `AtMost`                                 |
//! | [`grid`]       | `Grid<A>` (Moore / Von Neumann / Hex), `GridConfig`, `Direction` |
//! | [`network`]    | `Graph` (CSR), `GraphBuilder`, `Network<A>`                |
//! | [`voronoi`]    | `VoronoiGrid<A>` (Delaunay adjacency + R-tree lookup)      |
//! | [`agent`]      | `CellAgent` trait                                          |
//! | [`error`]      | `SpaceError`, `SpaceResult<T>`                             |
//!
//! # Ownership
//!
//! Cells connect to each other in cycles, so no cell owns another.  Every
//! cell lives in the [`DiscreteSpace`] arena and connections are
//! `CellId` indices into it.  Topologies differ only in how they wire
//! cells at construction time; [`Grid`], [`Network`] and [`VoronoiGrid`]
//! all deref to the `DiscreteSpace` they built.
//!
//! Agents are whatever handle the model uses (`AgentId`, `Rc<..>`, …);
//! cells store them by value and compare them with `PartialEq`.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `Coordinate`, `GridConfig`. |

pub mod agent;
pub mod cell;
pub mod collection;
pub mod coordinate;
pub mod error;
pub mod grid;
pub mod network;
pub mod space;
pub mod voronoi;


pub use agent::CellAgent;
pub use cell::Cell;
pub use collection::{AtMost, CellCollection};
pub use coordinate::Coordinate;
pub use error::{SpaceError, SpaceResult};
pub use grid::{Direction, Grid, GridConfig, GridKind};
pub use network::{Graph, GraphBuilder, Network};
pub use space::DiscreteSpace;
pub use voronoi::VoronoiGrid;
