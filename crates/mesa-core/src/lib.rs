//! `mesa-core` — foundational types for the mesa agent-based modeling framework.
//!
//! This crate is a dependency of every other `mesa-*` crate.  It intentionally
//! has no `mesa-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `CellId`, `EventId`                        |
//! | [`time`]        | `SimTime`, `Tick`, `TimeUnit`                         |
//! | [`rng`]         | `SimRng` (seeded, splittable)                         |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{AgentId, CellId, EventId};
pub use rng::SimRng;
pub use time::{SimTime, Tick, TimeUnit};
