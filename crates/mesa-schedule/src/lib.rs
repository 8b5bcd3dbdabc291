//! `mesa-schedule` — the event queue behind the discrete-event simulators.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`event`]      | `Priority`, `Target`, `SimulationEvent`, `EventHandle`     |
//! | [`event_list`] | `EventList` (binary min-heap + pending-id set)             |
//! | [`error`]      | `ScheduleError`, `ScheduleResult<T>`                       |
//!
//! # Ordering model (summary)
//!
//! ```text
//! key(event) = (time, priority, id)      ascending
//! priority   = High(1) < Default(5) < Low(10)
//! id         = creation order within one EventList
//! ```
//!
//! Two events with the same time and priority therefore run in the order
//! they were scheduled.
//!
//! # Liveness
//!
//! An event does not keep its target alive unless asked to: a
//! [`Target::Weak`] or [`Target::Bound`] event whose referent has been
//! dropped resolves to `None`, and the simulator skips it silently.

pub mod error;
pub mod event;
pub mod event_list;


pub use error::{ScheduleError, ScheduleResult};
pub use event::{EventHandle, Priority, SimulationEvent, Target};
pub use event_list::EventList;
