//! The clock and event list handed to every event handler.

use mesa_core::{SimTime, TimeUnit};
use mesa_schedule::{EventHandle, EventList, Priority, Target};

use crate::{Handler, SimError, SimResult};

/// Simulated time plus the queue of pending events.
///
/// A [`Simulator`][crate::Simulator] owns one and lends it to each handler
/// as `&mut Scheduler<M>`, next to `&mut M`.  All scheduling goes through
/// here so the time-unit and no-past-events checks are applied before an
/// event is ever inserted.
pub struct Scheduler<M: 'static> {
    unit:   TimeUnit,
    time:   SimTime,
    events: EventList<Handler<M>>,
    /// The pending recurring model step, if the discipline has one.
    pub(crate) step_event: Option<EventHandle>,
}

impl<M: 'static> Scheduler<M> {
    pub(crate) fn new(unit: TimeUnit, start: SimTime) -> Self {
        Self {
            unit,
            time: start,
            events: EventList::new(),
            step_event: None,
        }
    }

    /// Current simulated time.
    #[inline]
    pub fn time(&self) -> SimTime {
        self.time
    }

    #[inline]
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Schedule at the current time.  Runs after every already-queued event
    /// with the same time and priority.
    pub fn schedule_event_now(
        &mut self,
        target:   impl Into<Target<Handler<M>>>,
        priority: Priority,
    ) -> SimResult<EventHandle> {
        self.insert(self.time, priority, target.into())
    }

    /// Schedule at an absolute time.
    ///
    /// # Errors
    ///
    /// [`SimError::EventInPast`] if `time` is earlier than now;
    /// [`SimError::TimeUnitMismatch`] if `time` is not valid for this
    /// simulator's discipline.
    pub fn schedule_event_absolute(
        &mut self,
        target:   impl Into<Target<Handler<M>>>,
        time:     impl Into<SimTime>,
        priority: Priority,
    ) -> SimResult<EventHandle> {
        self.insert(time.into(), priority, target.into())
    }

    /// Schedule `delta` after the current time.
    pub fn schedule_event_relative(
        &mut self,
        target:   impl Into<Target<Handler<M>>>,
        delta:    impl Into<SimTime>,
        priority: Priority,
    ) -> SimResult<EventHandle> {
        let time = self.time + delta.into();
        self.insert(time, priority, target.into())
    }

    /// Schedule exactly one time unit from now.
    pub fn schedule_event_next_tick(
        &mut self,
        target:   impl Into<Target<Handler<M>>>,
        priority: Priority,
    ) -> SimResult<EventHandle> {
        self.schedule_event_relative(target, SimTime::from(1u64), priority)
    }

    /// Cancel a pending event.  Returns `false` if it already ran or was
    /// cancelled before.
    ///
    /// Cancelling the recurring model step stops automatic tick advancement.
    pub fn cancel_event(&mut self, handle: EventHandle) -> bool {
        if self.step_event == Some(handle) {
            self.step_event = None;
        }
        self.events.cancel(handle)
    }

    /// Handle of the next scheduled model step, if one is pending.
    pub fn step_event(&self) -> Option<EventHandle> {
        self.step_event
    }

    /// Up to `n` upcoming events in execution order.
    pub fn peek_ahead(&self, n: usize) -> Vec<EventHandle> {
        self.events.peek_ahead(n).into_iter().map(|e| e.handle()).collect()
    }

    pub fn is_pending(&self, handle: EventHandle) -> bool {
        self.events.is_pending(handle)
    }

    /// Number of events still to run.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    // ── Simulator-side access ────────────────────────────────────────────

    pub(crate) fn events_mut(&mut self) -> &mut EventList<Handler<M>> {
        &mut self.events
    }

    pub(crate) fn set_time(&mut self, time: SimTime) {
        debug_assert!(time >= self.time, "simulated time must not go backwards");
        self.time = time;
    }

    pub(crate) fn reset(&mut self, start: SimTime) {
        self.events.clear();
        self.time = start;
        self.step_event = None;
    }

    fn insert(
        &mut self,
        time:     SimTime,
        priority: Priority,
        target:   Target<Handler<M>>,
    ) -> SimResult<EventHandle> {
        if !self.unit.accepts(time) {
            return Err(SimError::TimeUnitMismatch { time, unit: self.unit });
        }
        if time < self.time {
            return Err(SimError::EventInPast { time, now: self.time });
        }
        Ok(self.events.schedule(time, priority, target))
    }
}
