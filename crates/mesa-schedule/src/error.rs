use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("event list is empty")]
    Empty,
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
