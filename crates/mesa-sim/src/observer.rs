//! Simulator observer trait for progress reporting and data collection.

use mesa_core::SimTime;
use mesa_schedule::EventHandle;

/// Callbacks invoked by [`Simulator::run_until_with`][crate::Simulator::run_until_with]
/// around the event loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example — progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter;
///
/// impl<M> SimObserver<M> for ProgressPrinter {
///     fn on_event(&mut self, event: &EventHandle, _model: &M) {
///         println!("{}: ran event {}", event.time, event.id);
///     }
/// }
/// ```
pub trait SimObserver<M> {
    /// Called after an event's target ran successfully.
    fn on_event(&mut self, _event: &EventHandle, _model: &M) {}

    /// Called when an event came due but its target had been dropped.
    fn on_skipped(&mut self, _event: &EventHandle) {}

    /// Called once when a run call returns without error.
    fn on_run_end(&mut self, _time: SimTime, _model: &M) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl<M> SimObserver<M> for NoopObserver {}
