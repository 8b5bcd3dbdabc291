//! Scheduled events and the targets they call.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};

use mesa_core::{EventId, SimTime};

// ── Priority ──────────────────────────────────────────────────────────────────

/// Tie-break between events scheduled for the same time.  Lower sorts first.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Priority {
    High = 1,
    #[default]
    Default = 5,
    Low = 10,
}

impl Priority {
    #[inline]
    pub fn value(self) -> u8 {
        self as u8
    }
}

// ── Target ────────────────────────────────────────────────────────────────────

/// The callable an event invokes, and how strongly the event holds it.
///
/// `F` is usually a `dyn Fn(..)` type chosen by the simulator; the event
/// list itself never calls it.
pub enum Target<F: ?Sized> {
    /// A plain function.  The event owns a strong reference.
    Strong(Rc<F>),

    /// The caller owns the `Rc<F>`; once it is dropped the event is inert.
    Weak(Weak<F>),

    /// A call bound to an owner object.  The call itself is held strongly,
    /// but it only fires while `owner` is still alive.  The owner is never
    /// kept alive by the event.
    Bound { owner: Weak<dyn Any>, call: Rc<F> },
}

impl<F: ?Sized> Target<F> {
    /// Weakly reference a callable owned elsewhere.
    pub fn weak(f: &Rc<F>) -> Self {
        Target::Weak(Rc::downgrade(f))
    }

    /// Bind `call` to the lifetime of `owner`.
    pub fn bound<T: 'static>(owner: &Rc<T>, call: Rc<F>) -> Self {
        let owner: Rc<dyn Any> = owner.clone();
        Target::Bound { owner: Rc::downgrade(&owner), call }
    }

    /// The callable, if its referent is still alive.
    pub fn resolve(&self) -> Option<Rc<F>> {
        match self {
            Target::Strong(f) => Some(Rc::clone(f)),
            Target::Weak(f) => f.upgrade(),
            Target::Bound { owner, call } => (owner.strong_count() > 0).then(|| Rc::clone(call)),
        }
    }

    pub fn is_alive(&self) -> bool {
        match self {
            Target::Strong(_) => true,
            Target::Weak(f) => f.strong_count() > 0,
            Target::Bound { owner, .. } => owner.strong_count() > 0,
        }
    }

    /// `true` if this target wraps exactly the allocation `f`.
    pub fn refers_to(&self, f: &Rc<F>) -> bool {
        match self {
            Target::Strong(g) => Rc::ptr_eq(g, f),
            Target::Weak(g) => std::ptr::addr_eq(g.as_ptr(), Rc::as_ptr(f)),
            Target::Bound { call, .. } => Rc::ptr_eq(call, f),
        }
    }
}

impl<F: ?Sized> From<Rc<F>> for Target<F> {
    fn from(f: Rc<F>) -> Self {
        Target::Strong(f)
    }
}

impl<F: ?Sized> Clone for Target<F> {
    fn clone(&self) -> Self {
        match self {
            Target::Strong(f) => Target::Strong(Rc::clone(f)),
            Target::Weak(f) => Target::Weak(Weak::clone(f)),
            Target::Bound { owner, call } => Target::Bound {
                owner: Weak::clone(owner),
                call:  Rc::clone(call),
            },
        }
    }
}

impl<F: ?Sized> fmt::Debug for Target<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Target::Strong(_) => "Strong",
            Target::Weak(_) => "Weak",
            Target::Bound { .. } => "Bound",
        };
        f.debug_struct("Target")
            .field("kind", &kind)
            .field("alive", &self.is_alive())
            .finish()
    }
}

// ── EventHandle ───────────────────────────────────────────────────────────────

/// A cancellation token for a scheduled event.
///
/// Cheap to copy; carries enough of the event's key to report when it was
/// due without touching the queue.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct EventHandle {
    pub id:       EventId,
    pub time:     SimTime,
    pub priority: Priority,
}

// ── SimulationEvent ───────────────────────────────────────────────────────────

/// One unit of deferred execution.
///
/// Ordered by `(time, priority, id)` ascending; the target takes no part in
/// the ordering.
pub struct SimulationEvent<F: ?Sized> {
    pub time:     SimTime,
    pub priority: Priority,
    pub id:       EventId,
    pub target:   Target<F>,
}

impl<F: ?Sized> SimulationEvent<F> {
    pub fn handle(&self) -> EventHandle {
        EventHandle {
            id:       self.id,
            time:     self.time,
            priority: self.priority,
        }
    }

    /// See [`Target::resolve`].
    #[inline]
    pub fn resolve(&self) -> Option<Rc<F>> {
        self.target.resolve()
    }

    #[inline]
    fn key(&self) -> (SimTime, Priority, EventId) {
        (self.time, self.priority, self.id)
    }
}

impl<F: ?Sized> PartialEq for SimulationEvent<F> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<F: ?Sized> Eq for SimulationEvent<F> {}

impl<F: ?Sized> PartialOrd for SimulationEvent<F> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<F: ?Sized> Ord for SimulationEvent<F> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl<F: ?Sized> fmt::Debug for SimulationEvent<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationEvent")
            .field("time", &self.time)
            .field("priority", &self.priority)
            .field("id", &self.id)
            .field("target", &self.target)
            .finish()
    }
}
