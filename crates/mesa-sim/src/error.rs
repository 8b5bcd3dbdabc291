use mesa_cell_space::SpaceError;
use mesa_core::{SimTime, TimeUnit};
use mesa_schedule::ScheduleError;
use mesa_signals::SignalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulator has not been set up; call setup(model) first")]
    NotSetUp,

    #[error("cannot set up simulator: {0}")]
    Setup(&'static str),

    #[error("cannot schedule an event at {time}: current time is {now}")]
    EventInPast { time: SimTime, now: SimTime },

    #[error("cannot run until {end}: current time is {now}")]
    HorizonInPast { end: SimTime, now: SimTime },

    #[error("time unit mismatch: {time} is not a valid {unit} time")]
    TimeUnitMismatch { time: SimTime, unit: TimeUnit },

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Space(#[from] SpaceError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    /// A failure raised by model code running inside an event.
    #[error("model error: {0}")]
    Model(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SimError {
    /// Wrap any error raised by model code.
    pub fn model<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        SimError::Model(Box::new(err))
    }
}

pub type SimResult<T> = Result<T, SimError>;
