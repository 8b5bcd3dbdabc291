//! The `Model` trait and event handler helpers.

use std::rc::Rc;

use mesa_schedule::Target;

use crate::{Scheduler, SimResult};

/// The callable type every simulator event resolves to.
///
/// Handlers receive the model and the scheduler, so an event can mutate
/// model state and schedule further events.
pub type Handler<M> = dyn Fn(&mut M, &mut Scheduler<M>) -> SimResult<()>;

/// A simulated model.
///
/// [`AbmSimulator`][crate::AbmSimulator] calls [`step`](Self::step) once per
/// tick.  [`DevsSimulator`][crate::DevsSimulator] never calls it on its own;
/// pure discrete-event models can keep the default.
///
/// # Example
///
/// ```rust,ignore
/// struct Epidemic { infected: u32 }
///
/// impl Model for Epidemic {
///     fn step(&mut self, scheduler: &mut Scheduler<Self>) -> SimResult<()> {
///         self.infected += 1;
///         scheduler.schedule_event_relative(
///             handler(|m: &mut Epidemic, _| { m.infected -= 1; Ok(()) }),
///             7,
///             Priority::Default,
///         )?;
///         Ok(())
///     }
/// }
/// ```
pub trait Model: Sized + 'static {
    fn step(&mut self, scheduler: &mut Scheduler<Self>) -> SimResult<()> {
        let _ = scheduler;
        Ok(())
    }
}

/// Wrap a closure as a strongly held handler.
///
/// The returned `Rc` converts into a [`Target::Strong`]; pass
/// `Target::weak(&rc)` instead to let the event die with the caller's
/// reference.
pub fn handler<M, F>(f: F) -> Rc<Handler<M>>
where
    M: 'static,
    F: Fn(&mut M, &mut Scheduler<M>) -> SimResult<()> + 'static,
{
    Rc::new(f)
}

/// Bind `f` to `owner` without keeping `owner` alive.
///
/// When the event comes due after the last strong reference to `owner` is
/// gone, it is skipped silently.
pub fn method<M, T, F>(owner: &Rc<T>, f: F) -> Target<Handler<M>>
where
    M: 'static,
    T: 'static,
    F: Fn(&T, &mut M, &mut Scheduler<M>) -> SimResult<()> + 'static,
{
    let weak = Rc::downgrade(owner);
    let call: Rc<Handler<M>> = Rc::new(move |model: &mut M, scheduler: &mut Scheduler<M>| {
        match weak.upgrade() {
            Some(owner) => f(&owner, model, scheduler),
            None => Ok(()),
        }
    });
    Target::bound(owner, call)
}
