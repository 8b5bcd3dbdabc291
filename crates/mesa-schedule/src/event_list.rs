//! `EventList` — time/priority-ordered queue of pending events.
//!
//! # Cancellation
//!
//! Removing an arbitrary element from a binary heap is O(n).  Instead the
//! list keeps the set of ids that are still pending: cancelling an event
//! just drops its id from that set, and the stale heap entry is discarded
//! when it reaches the top during [`pop`](EventList::pop).  Peeking never
//! mutates the heap.
//!
//! # Performance note
//!
//! `schedule` and `pop` are O(log E) amortised, `cancel` is O(1), and
//! `peek_ahead(n)` is O(E log E) because it sorts the live entries.  The
//! simulator only peeks when it has to decide whether an event lies past a
//! run horizon.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;
use tracing::trace;

use mesa_core::{EventId, SimTime};

use crate::{EventHandle, Priority, ScheduleError, ScheduleResult, SimulationEvent, Target};

/// A binary min-heap of [`SimulationEvent`]s.
pub struct EventList<F: ?Sized> {
    heap:    BinaryHeap<Reverse<SimulationEvent<F>>>,
    /// Ids of scheduled events that are neither popped nor cancelled.
    pending: FxHashSet<EventId>,
    next_id: EventId,
}

impl<F: ?Sized> Default for EventList<F> {
    fn default() -> Self {
        Self {
            heap:    BinaryHeap::new(),
            pending: FxHashSet::default(),
            next_id: EventId(0),
        }
    }
}

impl<F: ?Sized> EventList<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event and return its cancellation handle.
    ///
    /// The list does not check `time` against any clock; that is the
    /// simulator's job.
    pub fn schedule(
        &mut self,
        time:     SimTime,
        priority: Priority,
        target:   Target<F>,
    ) -> EventHandle {
        let id = self.next_id;
        self.next_id = id.next();

        let event = SimulationEvent { time, priority, id, target };
        let handle = event.handle();
        self.pending.insert(id);
        self.heap.push(Reverse(event));
        handle
    }

    /// Mark an event inert.
    ///
    /// Returns `false` if the event was already popped, cancelled, or never
    /// belonged to this list.
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        let removed = self.pending.remove(&handle.id);
        if removed {
            trace!(id = handle.id.0, time = %handle.time, "event cancelled");
        }
        removed
    }

    /// Remove and return the earliest pending event.
    ///
    /// Cancelled entries encountered on the way are discarded.
    pub fn pop(&mut self) -> ScheduleResult<SimulationEvent<F>> {
        while let Some(Reverse(event)) = self.heap.pop() {
            if self.pending.remove(&event.id) {
                return Ok(event);
            }
        }
        Err(ScheduleError::Empty)
    }

    /// Put back an event obtained from [`pop`](Self::pop), keeping its id so
    /// its position among equal-keyed events is unchanged.
    pub fn reinsert(&mut self, event: SimulationEvent<F>) -> EventHandle {
        let handle = event.handle();
        self.pending.insert(event.id);
        self.heap.push(Reverse(event));
        handle
    }

    /// The earliest pending event, without removing it.
    pub fn peek(&self) -> Option<&SimulationEvent<F>> {
        self.live().min()
    }

    /// Up to `n` upcoming pending events in execution order, without
    /// removing them.
    pub fn peek_ahead(&self, n: usize) -> Vec<&SimulationEvent<F>> {
        let mut upcoming: Vec<&SimulationEvent<F>> = self.live().collect();
        upcoming.sort_unstable();
        upcoming.truncate(n);
        upcoming
    }

    /// `true` if `handle` refers to an event that will still run.
    pub fn is_pending(&self, handle: EventHandle) -> bool {
        self.pending.contains(&handle.id)
    }

    /// Number of pending (not cancelled, not popped) events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every event.  Ids keep increasing across a clear so old handles
    /// can never match new events.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.pending.clear();
    }

    fn live(&self) -> impl Iterator<Item = &SimulationEvent<F>> + '_ {
        self.heap
            .iter()
            .map(|Reverse(event)| event)
            .filter(|event| self.pending.contains(&event.id))
    }
}
