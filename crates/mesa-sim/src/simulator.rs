//! The `Simulator` struct and its event loop.

use std::marker::PhantomData;
use std::rc::Rc;

use tracing::{debug, trace};

use mesa_core::{SimTime, TimeUnit};
use mesa_schedule::{EventHandle, Priority, SimulationEvent, Target};

use crate::{handler, Handler, Model, NoopObserver, Scheduler, SimError, SimObserver, SimResult};

// ── Disciplines ───────────────────────────────────────────────────────────────

/// How a simulator measures and advances time.
pub trait Discipline: 'static {
    const UNIT: TimeUnit;

    /// Whether the model's `step` is re-scheduled for every tick.
    const RECURRING_STEP: bool;
}

/// Fixed-tick agent-based discipline: integer time, model `step` at High
/// priority on every tick, other events interleaved between ticks.
pub struct Abm;

impl Discipline for Abm {
    const UNIT: TimeUnit = TimeUnit::Integer;
    const RECURRING_STEP: bool = true;
}

/// Pure discrete-event discipline: real-valued time, no implicit step.
pub struct Devs;

impl Discipline for Devs {
    const UNIT: TimeUnit = TimeUnit::Real;
    const RECURRING_STEP: bool = false;
}

pub type AbmSimulator<M> = Simulator<M, Abm>;
pub type DevsSimulator<M> = Simulator<M, Devs>;

// ── SimulatorState ────────────────────────────────────────────────────────────

/// Lifecycle of a simulator.
///
/// ```text
/// Uninitialized ──setup──▶ Setup ──run──▶ Running ──▶ Paused ──run──▶ …
///        ▲                                     └──────▶ Done
///        └──────────────── reset ──────────────────────────┘
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SimulatorState {
    /// No model bound.
    Uninitialized,
    /// Model bound, nothing run yet.
    Setup,
    /// Inside a run call.
    Running,
    /// A run call returned with events still pending.
    Paused,
    /// The event list ran dry.
    Done,
}

// ── Simulator ─────────────────────────────────────────────────────────────────

/// Drives simulated time forward by executing due events.
///
/// Use the [`AbmSimulator`] or [`DevsSimulator`] aliases.
pub struct Simulator<M: Model, D: Discipline> {
    scheduler:  Scheduler<M>,
    start_time: SimTime,
    model:      Option<M>,
    state:      SimulatorState,
    /// The recurring step call, shared by every step event.
    step:       Option<Rc<Handler<M>>>,
    _discipline: PhantomData<D>,
}

impl<M: Model, D: Discipline> Default for Simulator<M, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model, D: Discipline> Simulator<M, D> {
    /// A simulator starting at time zero.
    pub fn new() -> Self {
        Self {
            scheduler:   Scheduler::new(D::UNIT, SimTime::ZERO),
            start_time:  SimTime::ZERO,
            model:       None,
            state:       SimulatorState::Uninitialized,
            step:        None,
            _discipline: PhantomData,
        }
    }

    /// A simulator starting at `start`.
    pub fn with_start_time(start: impl Into<SimTime>) -> SimResult<Self> {
        let start = start.into();
        if !D::UNIT.accepts(start) {
            return Err(SimError::TimeUnitMismatch { time: start, unit: D::UNIT });
        }
        let mut sim = Self::new();
        sim.scheduler = Scheduler::new(D::UNIT, start);
        sim.start_time = start;
        Ok(sim)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Bind a model.  For the ABM discipline this also schedules the first
    /// model step one tick after the start time.
    ///
    /// # Errors
    ///
    /// [`SimError::Setup`] if time has already advanced or events were
    /// scheduled before setup.
    pub fn setup(&mut self, model: M) -> SimResult<()> {
        if self.scheduler.time() != self.start_time {
            return Err(SimError::Setup(
                "current time differs from start time; reset the simulator first",
            ));
        }
        if self.scheduler.pending_events() > 0 {
            return Err(SimError::Setup(
                "events were scheduled before setup; call setup before any scheduling",
            ));
        }

        self.model = Some(model);
        self.state = SimulatorState::Setup;

        if D::RECURRING_STEP {
            let step = handler(|model: &mut M, scheduler: &mut Scheduler<M>| model.step(scheduler));
            let first = self
                .scheduler
                .schedule_event_next_tick(Target::Strong(Rc::clone(&step)), Priority::High)?;
            self.scheduler.step_event = Some(first);
            self.step = Some(step);
        }

        debug!(unit = %D::UNIT, start = %self.start_time, "simulator set up");
        Ok(())
    }

    /// Drop every event, rewind to the start time, and hand back the model.
    pub fn reset(&mut self) -> Option<M> {
        self.scheduler.reset(self.start_time);
        self.step = None;
        self.state = SimulatorState::Uninitialized;
        debug!(start = %self.start_time, "simulator reset");
        self.model.take()
    }

    // ── Running ───────────────────────────────────────────────────────────

    /// Execute every event due at or before `end`, then set time to `end`.
    pub fn run_until(&mut self, end: impl Into<SimTime>) -> SimResult<()> {
        self.run_until_with(end, &mut NoopObserver)
    }

    /// Run for `delta` time units from now.
    pub fn run_for(&mut self, delta: impl Into<SimTime>) -> SimResult<()> {
        let end = self.scheduler.time() + delta.into();
        self.run_until(end)
    }

    /// [`run_until`](Self::run_until) with observer callbacks.
    pub fn run_until_with<O: SimObserver<M>>(
        &mut self,
        end:      impl Into<SimTime>,
        observer: &mut O,
    ) -> SimResult<()> {
        let end = end.into();
        if self.model.is_none() {
            return Err(SimError::NotSetUp);
        }
        if !D::UNIT.accepts(end) {
            return Err(SimError::TimeUnitMismatch { time: end, unit: D::UNIT });
        }
        if end < self.scheduler.time() {
            return Err(SimError::HorizonInPast { end, now: self.scheduler.time() });
        }

        self.state = SimulatorState::Running;
        loop {
            let Ok(event) = self.scheduler.events_mut().pop() else {
                self.scheduler.set_time(end);
                self.state = SimulatorState::Done;
                break;
            };
            if event.time > end {
                self.scheduler.events_mut().reinsert(event);
                self.scheduler.set_time(end);
                self.state = SimulatorState::Paused;
                break;
            }
            if let Err(err) = self.execute(event, observer) {
                self.state = SimulatorState::Paused;
                return Err(err);
            }
        }

        if let Some(model) = &self.model {
            observer.on_run_end(self.scheduler.time(), model);
        }
        Ok(())
    }

    /// Execute exactly one event and advance time to it.
    ///
    /// Returns `Ok(false)` if no events were pending.
    pub fn run_next_event(&mut self) -> SimResult<bool> {
        if self.model.is_none() {
            return Err(SimError::NotSetUp);
        }
        let Ok(event) = self.scheduler.events_mut().pop() else {
            self.state = SimulatorState::Done;
            return Ok(false);
        };
        self.state = SimulatorState::Running;
        let result = self.execute(event, &mut NoopObserver);
        self.state = if self.scheduler.pending_events() == 0 {
            SimulatorState::Done
        } else {
            SimulatorState::Paused
        };
        result.map(|()| true)
    }

    /// Alias for [`run_next_event`](Self::run_next_event).
    pub fn step(&mut self) -> SimResult<bool> {
        self.run_next_event()
    }

    fn execute<O: SimObserver<M>>(
        &mut self,
        event:    SimulationEvent<Handler<M>>,
        observer: &mut O,
    ) -> SimResult<()> {
        let handle = event.handle();
        self.scheduler.set_time(event.time);

        // Keep exactly one step outstanding: the next one is queued before
        // the current one runs.
        if D::RECURRING_STEP && self.scheduler.step_event == Some(handle) {
            if let Some(step) = &self.step {
                let next = self
                    .scheduler
                    .schedule_event_next_tick(Target::Strong(Rc::clone(step)), Priority::High)?;
                self.scheduler.step_event = Some(next);
            }
        }

        let Some(call) = event.resolve() else {
            trace!(id = handle.id.0, time = %handle.time, "event target dropped; skipped");
            observer.on_skipped(&handle);
            return Ok(());
        };
        let model = self.model.as_mut().ok_or(SimError::NotSetUp)?;

        trace!(id = handle.id.0, time = %handle.time, priority = ?handle.priority, "executing event");
        call(model, &mut self.scheduler)?;
        observer.on_event(&handle, model);
        Ok(())
    }

    // ── Scheduling (delegates to the scheduler) ───────────────────────────

    pub fn schedule_event_now(
        &mut self,
        target:   impl Into<Target<Handler<M>>>,
        priority: Priority,
    ) -> SimResult<EventHandle> {
        self.scheduler.schedule_event_now(target, priority)
    }

    pub fn schedule_event_absolute(
        &mut self,
        target:   impl Into<Target<Handler<M>>>,
        time:     impl Into<SimTime>,
        priority: Priority,
    ) -> SimResult<EventHandle> {
        self.scheduler.schedule_event_absolute(target, time, priority)
    }

    pub fn schedule_event_relative(
        &mut self,
        target:   impl Into<Target<Handler<M>>>,
        delta:    impl Into<SimTime>,
        priority: Priority,
    ) -> SimResult<EventHandle> {
        self.scheduler.schedule_event_relative(target, delta, priority)
    }

    pub fn schedule_event_next_tick(
        &mut self,
        target:   impl Into<Target<Handler<M>>>,
        priority: Priority,
    ) -> SimResult<EventHandle> {
        self.scheduler.schedule_event_next_tick(target, priority)
    }

    pub fn cancel_event(&mut self, handle: EventHandle) -> bool {
        self.scheduler.cancel_event(handle)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn time(&self) -> SimTime {
        self.scheduler.time()
    }

    #[inline]
    pub fn start_time(&self) -> SimTime {
        self.start_time
    }

    #[inline]
    pub fn state(&self) -> SimulatorState {
        self.state
    }

    pub fn model(&self) -> Option<&M> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut M> {
        self.model.as_mut()
    }

    pub fn scheduler(&self) -> &Scheduler<M> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler<M> {
        &mut self.scheduler
    }
}
