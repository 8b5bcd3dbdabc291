//! Unit tests for mesa-sim.

use std::cell::Cell;
use std::rc::Rc;

use mesa_core::{SimTime, TimeUnit};

use crate::{
    handler, method, AbmSimulator, DevsSimulator, EventHandle, Handler, Model, Priority,
    Scheduler, SimError, SimObserver, SimResult, SimulatorState, Target,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Records every step and event as `(time, label)`.
#[derive(Default)]
struct Log {
    entries: Vec<(f64, &'static str)>,
}

impl Log {
    fn steps(&self) -> usize {
        self.entries.iter().filter(|(_, l)| *l == "step").count()
    }

    fn labels(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(_, l)| *l).collect()
    }
}

impl Model for Log {
    fn step(&mut self, scheduler: &mut Scheduler<Self>) -> SimResult<()> {
        self.entries.push((scheduler.time().as_f64(), "step"));
        Ok(())
    }
}

fn record(label: &'static str) -> Rc<Handler<Log>> {
    handler(move |m: &mut Log, s: &mut Scheduler<Log>| {
        m.entries.push((s.time().as_f64(), label));
        Ok(())
    })
}

fn abm() -> AbmSimulator<Log> {
    let mut sim = AbmSimulator::new();
    sim.setup(Log::default()).unwrap();
    sim
}

fn devs() -> DevsSimulator<Log> {
    let mut sim = DevsSimulator::new();
    sim.setup(Log::default()).unwrap();
    sim
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use super::*;

    #[test]
    fn new_simulator_is_uninitialized() {
        let sim: AbmSimulator<Log> = AbmSimulator::new();
        assert_eq!(sim.state(), SimulatorState::Uninitialized);
        assert_eq!(sim.time(), SimTime::ZERO);
        assert!(sim.model().is_none());
    }

    #[test]
    fn run_without_setup_fails() {
        let mut sim: DevsSimulator<Log> = DevsSimulator::new();
        assert!(matches!(sim.run_until(5.0), Err(SimError::NotSetUp)));
        assert!(matches!(sim.run_next_event(), Err(SimError::NotSetUp)));
    }

    #[test]
    fn setup_after_scheduling_is_rejected() {
        let mut sim: DevsSimulator<Log> = DevsSimulator::new();
        sim.schedule_event_absolute(record("early"), 1.0, Priority::Default).unwrap();
        assert!(matches!(sim.setup(Log::default()), Err(SimError::Setup(_))));
    }

    #[test]
    fn setup_after_time_advanced_is_rejected() {
        let mut sim = devs();
        sim.run_until(2.0).unwrap();
        assert!(matches!(sim.setup(Log::default()), Err(SimError::Setup(_))));
    }

    #[test]
    fn reset_returns_model_and_rewinds() {
        let mut sim = abm();
        sim.run_for(4).unwrap();

        let model = sim.reset().unwrap();
        assert_eq!(model.steps(), 4);
        assert_eq!(sim.time(), SimTime::ZERO);
        assert_eq!(sim.state(), SimulatorState::Uninitialized);
        assert_eq!(sim.scheduler().pending_events(), 0);

        // Usable again after reset.
        sim.setup(Log::default()).unwrap();
        sim.run_for(2).unwrap();
        assert_eq!(sim.model().unwrap().steps(), 2);
    }

    #[test]
    fn custom_start_time() {
        let mut sim: AbmSimulator<Log> = AbmSimulator::with_start_time(10).unwrap();
        sim.setup(Log::default()).unwrap();
        sim.run_until(12).unwrap();
        let times: Vec<f64> = sim.model().unwrap().entries.iter().map(|e| e.0).collect();
        assert_eq!(times, vec![11.0, 12.0]);
    }

    #[test]
    fn fractional_start_rejected_for_abm() {
        let result: SimResult<AbmSimulator<Log>> = AbmSimulator::with_start_time(0.5);
        assert!(matches!(result, Err(SimError::TimeUnitMismatch { .. })));
    }

    #[test]
    fn horizon_in_past_rejected() {
        let mut sim = devs();
        sim.run_until(5.0).unwrap();
        assert!(matches!(sim.run_until(3.0), Err(SimError::HorizonInPast { .. })));
    }
}

// ── ABM discipline ────────────────────────────────────────────────────────────

#[cfg(test)]
mod abm_discipline {
    use super::*;

    #[test]
    fn run_for_executes_one_step_per_tick() {
        let mut sim = abm();
        sim.run_for(3).unwrap();
        assert_eq!(sim.model().unwrap().steps(), 3);
        assert_eq!(sim.time(), SimTime::from(3));
        assert_eq!(sim.state(), SimulatorState::Paused);
    }

    #[test]
    fn first_step_is_one_tick_after_start() {
        let mut sim = abm();
        sim.run_until(0).unwrap();
        assert_eq!(sim.model().unwrap().steps(), 0);
        assert!(sim.scheduler().step_event().is_some());
        assert_eq!(sim.scheduler().step_event().unwrap().time, SimTime::from(1));
    }

    #[test]
    fn consecutive_runs_continue_the_clock() {
        let mut sim = abm();
        sim.run_for(2).unwrap();
        sim.run_for(3).unwrap();
        assert_eq!(sim.model().unwrap().steps(), 5);
        assert_eq!(sim.time(), SimTime::from(5));
    }

    #[test]
    fn fractional_times_are_rejected() {
        let mut sim = abm();
        let err = sim.schedule_event_absolute(record("x"), 1.5, Priority::Default).unwrap_err();
        assert!(matches!(err, SimError::TimeUnitMismatch { unit: TimeUnit::Integer, .. }));
        assert!(matches!(sim.run_until(2.5), Err(SimError::TimeUnitMismatch { .. })));
    }

    #[test]
    fn step_runs_before_default_events_at_the_same_tick() {
        let mut sim = abm();
        sim.schedule_event_absolute(record("event"), 2, Priority::Default).unwrap();
        sim.run_for(2).unwrap();
        assert_eq!(sim.model().unwrap().labels(), vec!["step", "step", "event"]);
    }

    #[test]
    fn events_interleave_with_steps() {
        let mut sim = abm();
        sim.schedule_event_absolute(record("a"), 1, Priority::Low).unwrap();
        sim.schedule_event_absolute(record("b"), 2, Priority::High).unwrap();
        sim.run_for(3).unwrap();
        // "b" was queued before the step at 2, so it wins the tie.
        assert_eq!(sim.model().unwrap().labels(), vec!["step", "a", "b", "step", "step"]);
    }

    #[test]
    fn cancelling_the_step_stops_ticks() {
        let mut sim = abm();
        sim.run_for(2).unwrap();
        let step = sim.scheduler().step_event().unwrap();
        assert!(sim.cancel_event(step));
        assert!(sim.scheduler().step_event().is_none());

        sim.run_for(5).unwrap();
        assert_eq!(sim.model().unwrap().steps(), 2);
        assert_eq!(sim.time(), SimTime::from(7));
        assert_eq!(sim.state(), SimulatorState::Done);
    }

    #[test]
    fn model_can_cancel_its_own_step() {
        struct Stopper {
            steps: u32,
        }

        impl Model for Stopper {
            fn step(&mut self, scheduler: &mut Scheduler<Self>) -> SimResult<()> {
                self.steps += 1;
                if self.steps == 3 {
                    if let Some(next) = scheduler.step_event() {
                        scheduler.cancel_event(next);
                    }
                }
                Ok(())
            }
        }

        let mut sim = AbmSimulator::new();
        sim.setup(Stopper { steps: 0 }).unwrap();
        sim.run_for(10).unwrap();
        assert_eq!(sim.model().unwrap().steps, 3);
        assert_eq!(sim.state(), SimulatorState::Done);
    }

    #[test]
    fn run_next_event_advances_one_step() {
        let mut sim = abm();
        assert!(sim.run_next_event().unwrap());
        assert_eq!(sim.time(), SimTime::from(1));
        assert_eq!(sim.model().unwrap().steps(), 1);
        // The next step is already queued.
        assert_eq!(sim.scheduler().pending_events(), 1);
        assert_eq!(sim.state(), SimulatorState::Paused);
    }
}

// ── DEVS discipline ───────────────────────────────────────────────────────────

#[cfg(test)]
mod devs_discipline {
    use super::*;

    #[test]
    fn setup_schedules_nothing() {
        let sim = devs();
        assert_eq!(sim.scheduler().pending_events(), 0);
        assert_eq!(sim.state(), SimulatorState::Setup);
    }

    #[test]
    fn events_run_at_their_times() {
        let mut sim = devs();
        sim.schedule_event_absolute(record("late"), 3.0, Priority::Default).unwrap();
        sim.schedule_event_absolute(record("early"), 1.5, Priority::Default).unwrap();
        sim.run_until(10.0).unwrap();

        assert_eq!(sim.model().unwrap().entries, vec![(1.5, "early"), (3.0, "late")]);
        assert_eq!(sim.time(), SimTime::from(10.0));
        assert_eq!(sim.state(), SimulatorState::Done);
    }

    #[test]
    fn run_stops_at_horizon() {
        let mut sim = devs();
        sim.schedule_event_absolute(record("a"), 1.0, Priority::Default).unwrap();
        sim.schedule_event_absolute(record("b"), 4.0, Priority::Default).unwrap();
        sim.run_until(2.5).unwrap();

        assert_eq!(sim.model().unwrap().labels(), vec!["a"]);
        assert_eq!(sim.time(), SimTime::from(2.5));
        assert_eq!(sim.state(), SimulatorState::Paused);
        assert_eq!(sim.scheduler().pending_events(), 1);
    }

    #[test]
    fn event_at_horizon_runs() {
        let mut sim = devs();
        sim.schedule_event_absolute(record("edge"), 2.0, Priority::Default).unwrap();
        sim.run_until(2.0).unwrap();
        assert_eq!(sim.model().unwrap().labels(), vec!["edge"]);
    }

    #[test]
    fn priority_then_insertion_order_at_equal_time() {
        let mut sim = devs();
        sim.schedule_event_absolute(record("default-1"), 1.0, Priority::Default).unwrap();
        sim.schedule_event_absolute(record("low"), 1.0, Priority::Low).unwrap();
        sim.schedule_event_absolute(record("high"), 1.0, Priority::High).unwrap();
        sim.schedule_event_absolute(record("default-2"), 1.0, Priority::Default).unwrap();
        sim.run_until(1.0).unwrap();
        assert_eq!(
            sim.model().unwrap().labels(),
            vec!["high", "default-1", "default-2", "low"]
        );
    }

    #[test]
    fn relative_and_now_scheduling() {
        let mut sim = devs();
        sim.run_until(2.0).unwrap();
        sim.schedule_event_relative(record("rel"), 0.5, Priority::Default).unwrap();
        sim.schedule_event_now(record("now"), Priority::Default).unwrap();
        sim.run_until(3.0).unwrap();
        assert_eq!(sim.model().unwrap().entries, vec![(2.0, "now"), (2.5, "rel")]);
    }

    #[test]
    fn scheduling_in_the_past_fails() {
        let mut sim = devs();
        sim.run_until(5.0).unwrap();
        let err = sim.schedule_event_absolute(record("x"), 4.0, Priority::Default).unwrap_err();
        assert!(matches!(err, SimError::EventInPast { .. }));
        let err = sim.schedule_event_relative(record("x"), -1.0, Priority::Default).unwrap_err();
        assert!(matches!(err, SimError::EventInPast { .. }));
    }

    #[test]
    fn non_finite_times_are_rejected() {
        let mut sim = devs();
        let err = sim.schedule_event_absolute(record("x"), f64::NAN, Priority::Default).unwrap_err();
        assert!(matches!(err, SimError::TimeUnitMismatch { unit: TimeUnit::Real, .. }));
    }

    #[test]
    fn run_next_event_on_empty_queue() {
        let mut sim = devs();
        assert!(!sim.run_next_event().unwrap());
        assert_eq!(sim.state(), SimulatorState::Done);
    }

    #[test]
    fn run_next_event_moves_the_clock() {
        let mut sim = devs();
        sim.schedule_event_absolute(record("a"), 0.25, Priority::Default).unwrap();
        sim.schedule_event_absolute(record("b"), 0.75, Priority::Default).unwrap();

        assert!(sim.step().unwrap());
        assert_eq!(sim.time(), SimTime::from(0.25));
        assert_eq!(sim.state(), SimulatorState::Paused);

        assert!(sim.step().unwrap());
        assert_eq!(sim.time(), SimTime::from(0.75));
        assert_eq!(sim.state(), SimulatorState::Done);
    }

    #[test]
    fn cancelled_event_never_runs() {
        let mut sim = devs();
        let gone = sim.schedule_event_absolute(record("gone"), 1.0, Priority::Default).unwrap();
        sim.schedule_event_absolute(record("kept"), 2.0, Priority::Default).unwrap();
        assert!(sim.cancel_event(gone));
        assert!(!sim.cancel_event(gone));
        sim.run_until(3.0).unwrap();
        assert_eq!(sim.model().unwrap().labels(), vec!["kept"]);
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod handlers {
    use super::*;

    #[test]
    fn handlers_can_schedule_follow_ups() {
        let mut sim = devs();
        let chain = handler(|m: &mut Log, s: &mut Scheduler<Log>| {
            m.entries.push((s.time().as_f64(), "first"));
            s.schedule_event_relative(record("second"), 1.0, Priority::Default)?;
            Ok(())
        });
        sim.schedule_event_absolute(chain, 1.0, Priority::Default).unwrap();
        sim.run_until(5.0).unwrap();
        assert_eq!(sim.model().unwrap().entries, vec![(1.0, "first"), (2.0, "second")]);
    }

    #[test]
    fn scheduling_now_from_a_handler_runs_in_the_same_run() {
        let mut sim = devs();
        let chain = handler(|m: &mut Log, s: &mut Scheduler<Log>| {
            m.entries.push((s.time().as_f64(), "outer"));
            s.schedule_event_now(record("inner"), Priority::Default)?;
            Ok(())
        });
        sim.schedule_event_absolute(chain, 1.0, Priority::Default).unwrap();
        sim.run_until(1.0).unwrap();
        assert_eq!(sim.model().unwrap().entries, vec![(1.0, "outer"), (1.0, "inner")]);
    }

    #[test]
    fn dropped_weak_handler_is_skipped() {
        let mut sim = devs();
        let h = record("weak");
        sim.schedule_event_absolute(Target::weak(&h), 1.0, Priority::Default).unwrap();
        drop(h);
        sim.run_until(2.0).unwrap();
        assert!(sim.model().unwrap().entries.is_empty());
        assert_eq!(sim.state(), SimulatorState::Done);
    }

    #[test]
    fn live_weak_handler_runs() {
        let mut sim = devs();
        let h = record("weak");
        sim.schedule_event_absolute(Target::weak(&h), 1.0, Priority::Default).unwrap();
        sim.run_until(2.0).unwrap();
        assert_eq!(sim.model().unwrap().labels(), vec!["weak"]);
    }

    #[test]
    fn bound_method_skipped_after_owner_dropped() {
        struct Agent {
            label: &'static str,
        }

        let mut sim = devs();
        let alive = Rc::new(Agent { label: "alive" });
        let dead = Rc::new(Agent { label: "dead" });

        let act = |a: &Agent, m: &mut Log, s: &mut Scheduler<Log>| -> SimResult<()> {
            m.entries.push((s.time().as_f64(), a.label));
            Ok(())
        };
        sim.schedule_event_absolute(method(&alive, act), 1.0, Priority::Default).unwrap();
        sim.schedule_event_absolute(method(&dead, act), 1.0, Priority::Default).unwrap();
        drop(dead);

        sim.run_until(2.0).unwrap();
        assert_eq!(sim.model().unwrap().labels(), vec!["alive"]);
    }

    #[test]
    fn handler_error_propagates_and_pauses() {
        let mut sim = devs();
        let failing = handler(|_: &mut Log, _: &mut Scheduler<Log>| Err(SimError::model(std::fmt::Error)));
        sim.schedule_event_absolute(failing, 1.0, Priority::Default).unwrap();
        sim.schedule_event_absolute(record("after"), 2.0, Priority::Default).unwrap();

        let err = sim.run_until(5.0).unwrap_err();
        assert!(matches!(err, SimError::Model(_)));
        assert_eq!(sim.state(), SimulatorState::Paused);
        assert_eq!(sim.time(), SimTime::from(1.0));

        // The remaining event is still pending and runs on the next call.
        sim.run_until(5.0).unwrap();
        assert_eq!(sim.model().unwrap().labels(), vec!["after"]);
    }

    #[test]
    fn model_step_error_propagates() {
        struct Failing;

        impl Model for Failing {
            fn step(&mut self, scheduler: &mut Scheduler<Self>) -> SimResult<()> {
                if scheduler.time() >= SimTime::from(2) {
                    return Err(SimError::model(std::fmt::Error));
                }
                Ok(())
            }
        }

        let mut sim = AbmSimulator::new();
        sim.setup(Failing).unwrap();
        assert!(sim.run_for(5).is_err());
        assert_eq!(sim.time(), SimTime::from(2));
    }

    #[test]
    fn strong_handler_shared_between_events() {
        let mut sim = devs();
        let h = record("tick");
        sim.schedule_event_absolute(Rc::clone(&h), 1.0, Priority::Default).unwrap();
        sim.schedule_event_absolute(Rc::clone(&h), 2.0, Priority::Default).unwrap();
        drop(h);
        sim.run_until(3.0).unwrap();
        assert_eq!(sim.model().unwrap().steps(), 0);
        assert_eq!(sim.model().unwrap().labels(), vec!["tick", "tick"]);
    }

    #[test]
    fn peek_ahead_lists_execution_order() {
        let mut sim = devs();
        let late = sim.schedule_event_absolute(record("late"), 2.0, Priority::Default).unwrap();
        let early = sim.schedule_event_absolute(record("early"), 1.0, Priority::Default).unwrap();
        let upcoming: Vec<EventHandle> = sim.scheduler().peek_ahead(5);
        assert_eq!(upcoming, vec![early, late]);
        assert!(sim.scheduler().is_pending(late));
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer {
    use super::*;

    #[derive(Default)]
    struct Counter {
        events:  usize,
        skipped: usize,
        ended:   Option<SimTime>,
    }

    impl SimObserver<Log> for Counter {
        fn on_event(&mut self, _event: &EventHandle, _model: &Log) {
            self.events += 1;
        }

        fn on_skipped(&mut self, _event: &EventHandle) {
            self.skipped += 1;
        }

        fn on_run_end(&mut self, time: SimTime, _model: &Log) {
            self.ended = Some(time);
        }
    }

    #[test]
    fn observer_sees_every_event() {
        let mut sim = abm();
        let dead = record("dead");
        sim.schedule_event_absolute(Target::weak(&dead), 2, Priority::Default).unwrap();
        drop(dead);

        let mut counter = Counter::default();
        sim.run_until_with(4, &mut counter).unwrap();

        assert_eq!(counter.events, 4);
        assert_eq!(counter.skipped, 1);
        assert_eq!(counter.ended, Some(SimTime::from(4)));
    }

    #[test]
    fn observer_not_ended_on_error() {
        let mut sim = devs();
        let failing = handler(|_: &mut Log, _: &mut Scheduler<Log>| Err(SimError::model(std::fmt::Error)));
        sim.schedule_event_absolute(failing, 1.0, Priority::Default).unwrap();

        let mut counter = Counter::default();
        assert!(sim.run_until_with(2.0, &mut counter).is_err());
        assert_eq!(counter.events, 0);
        assert_eq!(counter.ended, None);
    }

    #[test]
    fn handler_can_share_state_with_the_test() {
        let mut sim = devs();
        let hits = Rc::new(Cell::new(0u32));
        let seen = Rc::clone(&hits);
        let h = handler(move |_: &mut Log, _: &mut Scheduler<Log>| {
            seen.set(seen.get() + 1);
            Ok(())
        });
        for t in [0.5, 1.0, 1.5] {
            sim.schedule_event_absolute(Rc::clone(&h), t, Priority::Default).unwrap();
        }
        sim.run_until(2.0).unwrap();
        assert_eq!(hits.get(), 3);
    }
}
