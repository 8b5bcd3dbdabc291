//! `mesa-sim` — event-driven simulators for the mesa framework.
//!
//! # Event loop
//!
//! ```text
//! setup(model):
//!   AbmSimulator  → schedule model.step at start + 1, priority High
//!   DevsSimulator → nothing
//!
//! run_until(end):
//!   loop:
//!     ① pop the earliest pending event (queue empty → time = end, Done)
//!     ② event.time > end → put it back, time = end, Paused
//!     ③ time = event.time
//!     ④ event is the model step → schedule the next step first
//!     ⑤ resolve the target; dropped → skip silently
//!     ⑥ call target(&mut model, &mut scheduler); errors propagate
//! ```
//!
//! Everything runs on one thread.  Each event runs to completion before
//! the next is popped, so model state seen by an event is always the
//! result of every earlier event.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use mesa_sim::{AbmSimulator, Model, Scheduler, SimResult};
//!
//! struct Counter { steps: u32 }
//!
//! impl Model for Counter {
//!     fn step(&mut self, _: &mut Scheduler<Self>) -> SimResult<()> {
//!         self.steps += 1;
//!         Ok(())
//!     }
//! }
//!
//! let mut sim = AbmSimulator::new();
//! sim.setup(Counter { steps: 0 })?;
//! sim.run_for(10)?;
//! assert_eq!(sim.model().unwrap().steps, 10);
//! ```

pub mod error;
pub mod model;
pub mod observer;
pub mod scheduler;
pub mod simulator;

#[cfg(test)]
mod tests;

pub use error::{SimError, SimResult};
pub use mesa_schedule::{EventHandle, Priority, Target};
pub use model::{handler, method, Handler, Model};
pub use observer::{NoopObserver, SimObserver};
pub use scheduler::Scheduler;
pub use simulator::{Abm, AbmSimulator, Devs, DevsSimulator, Discipline, Simulator, SimulatorState};
