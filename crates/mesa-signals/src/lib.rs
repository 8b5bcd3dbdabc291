//! `mesa-signals` — reactive attributes for agents and models.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`runtime`]     | `Signals` — per-model evaluation context                  |
//! | [`hub`]         | `SignalHub`, `HasObservables`, `All`, `SignalType`, `Message` |
//! | [`observable`]  | `Observable<T>`                                           |
//! | [`list`]        | `ObservableList<T>`                                       |
//! | [`computed`]    | `Computed<T>`                                             |
//! | [`error`]       | `SignalError`, `SignalResult<T>`                          |
//!
//! # Model (summary)
//!
//! ```text
//! Observable.set(v)  ──notify "change"──▶ subscribers (weak handlers)
//!                                     └─▶ dependent Computeds: clean → dirty
//! Computed.get()     ── clean ──▶ cached value, no call
//!                    ── dirty ──▶ compare each recorded dependency with its
//!                                 current value; all equal → reuse cache,
//!                                 any differs → re-run the function
//! ```
//!
//! Dependencies are discovered by running the function: every
//! `Observable`/`Computed` read while a Computed evaluates registers itself
//! with that Computed.  The "currently evaluating" stack lives in a
//! [`Signals`] value shared by every owner of one model, not in global
//! state.
//!
//! # Example
//!
//! ```rust,ignore
//! let signals = Signals::new();
//! let agent = signals.hub("Agent");
//! let wealth = agent.observable("wealth", 10_i64)?;
//! let w = wealth.clone();
//! let rich = agent.computed("rich", move || Ok(w.get() > 50))?;
//! assert!(!rich.get()?);
//! wealth.set(100)?;
//! assert!(rich.get()?);
//! ```

pub mod computed;
pub mod error;
pub mod hub;
pub mod list;
pub mod observable;
pub mod runtime;

#[cfg(test)]
mod tests;

pub use computed::Computed;
pub use error::{SignalError, SignalResult};
pub use hub::{All, Handler, HasObservables, Message, NameSelector, SignalHub, SignalSelector, SignalType};
pub use list::ObservableList;
pub use observable::Observable;
pub use runtime::Signals;
