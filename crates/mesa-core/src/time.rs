//! Simulation time model.
//!
//! # Design
//!
//! Simulated time is a [`SimTime`]: a finite `f64` with a total order, so
//! it can key a binary heap directly.  Two disciplines share it:
//!
//! - [`TimeUnit::Integer`] — fixed-tick simulation.  Only integral times are
//!   accepted (`3` and `3.0` are both fine, `2.5` is not).  [`Tick`] is the
//!   integer view of such a time.
//! - [`TimeUnit::Real`] — continuous discrete-event simulation.  Any finite
//!   time is accepted.
//!
//! Mixing disciplines is rejected where events are scheduled, never
//! silently coerced.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{CoreError, CoreResult};

// ── SimTime ───────────────────────────────────────────────────────────────────

/// A point on the simulation clock.
///
/// Ordered with `f64::total_cmp`.  Values built through [`SimTime::new`] are
/// guaranteed finite; the infallible `From` conversions can carry a
/// non-finite float, which the simulator rejects when scheduling.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    /// Build a time, rejecting NaN and infinities.
    pub fn new(value: f64) -> CoreResult<SimTime> {
        if value.is_finite() {
            Ok(SimTime(value))
        } else {
            Err(CoreError::NonFiniteTime(value))
        }
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// `true` if the time has no fractional part.
    #[inline]
    pub fn is_integral(self) -> bool {
        self.0.is_finite() && self.0.fract() == 0.0
    }

    /// The integer tick for an integral, non-negative time.
    pub fn as_tick(self) -> Option<Tick> {
        (self.is_integral() && self.0 >= 0.0).then(|| Tick(self.0 as u64))
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for SimTime {}

// `total_cmp` equality is bit equality.
impl Hash for SimTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::ops::Add for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: SimTime) -> SimTime {
        SimTime(self.0 + rhs.0)
    }
}

impl std::ops::Sub for SimTime {
    type Output = SimTime;
    #[inline]
    fn sub(self, rhs: SimTime) -> SimTime {
        SimTime(self.0 - rhs.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.0)
    }
}

impl From<f64> for SimTime {
    fn from(value: f64) -> SimTime {
        SimTime(value)
    }
}

impl From<f32> for SimTime {
    fn from(value: f32) -> SimTime {
        SimTime(value as f64)
    }
}

impl From<i32> for SimTime {
    fn from(value: i32) -> SimTime {
        SimTime(value as f64)
    }
}

impl From<i64> for SimTime {
    fn from(value: i64) -> SimTime {
        SimTime(value as f64)
    }
}

impl From<u32> for SimTime {
    fn from(value: u32) -> SimTime {
        SimTime(value as f64)
    }
}

impl From<u64> for SimTime {
    fn from(value: u64) -> SimTime {
        SimTime(value as f64)
    }
}

impl From<Tick> for SimTime {
    fn from(tick: Tick) -> SimTime {
        SimTime(tick.0 as f64)
    }
}

// ── Tick ──────────────────────────────────────────────────────────────────────

/// An absolute integer tick, the time unit of fixed-step simulation.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── TimeUnit ──────────────────────────────────────────────────────────────────

/// The time discipline of a simulator.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeUnit {
    /// Whole ticks only.
    Integer,
    /// Any finite real number.
    Real,
}

impl TimeUnit {
    /// Whether `time` is representable in this discipline.
    pub fn accepts(self, time: SimTime) -> bool {
        match self {
            TimeUnit::Integer => time.is_integral(),
            TimeUnit::Real => time.is_finite(),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUnit::Integer => f.write_str("integer"),
            TimeUnit::Real => f.write_str("real"),
        }
    }
}
