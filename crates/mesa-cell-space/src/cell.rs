//! `Cell` — one location in a discrete space.

use mesa_core::CellId;

use crate::{Coordinate, SpaceError, SpaceResult};

/// An addressable location holding up to `capacity` agents and a set of
/// keyed, directed connections to other cells.
///
/// Cells are only ever mutated through their [`DiscreteSpace`], which keeps
/// the empty-cell index and neighborhood cache in step.
///
/// [`DiscreteSpace`]: crate::DiscreteSpace
#[derive(Clone, Debug)]
pub struct Cell<A> {
    id:          CellId,
    coordinate:  Coordinate,
    capacity:    Option<usize>,
    agents:      Vec<A>,
    /// `(key, neighbor)` in connection order.
    connections: Vec<(Coordinate, CellId)>,
}

impl<A> Cell<A> {
    pub(crate) fn new(id: CellId, coordinate: Coordinate, capacity: Option<usize>) -> Self {
        Self {
            id,
            coordinate,
            capacity,
            agents: Vec::new(),
            connections: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> CellId {
        self.id
    }

    #[inline]
    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    /// Maximum number of occupants; `None` is unbounded.
    #[inline]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Occupants in arrival order.
    #[inline]
    pub fn agents(&self) -> &[A] {
        &self.agents
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.agents.len() >= cap)
    }

    /// `(key, neighbor)` pairs in the order they were connected.
    pub fn connections(&self) -> impl Iterator<Item = (&Coordinate, CellId)> + '_ {
        self.connections.iter().map(|(key, id)| (key, *id))
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// The neighbor stored under `key`.
    pub fn neighbor(&self, key: &Coordinate) -> Option<CellId> {
        self.connections.iter().find(|(k, _)| k == key).map(|&(_, id)| id)
    }

    pub fn is_connected_to(&self, other: CellId) -> bool {
        self.connections.iter().any(|&(_, id)| id == other)
    }

    // ── Crate-side mutation ──────────────────────────────────────────────

    pub(crate) fn connect(&mut self, key: Coordinate, other: CellId) -> SpaceResult<()> {
        if self.neighbor(&key).is_some() {
            return Err(SpaceError::DuplicateConnection { cell: self.coordinate.clone(), key });
        }
        self.connections.push((key, other));
        Ok(())
    }

    /// Drop every connection to `other`.  Returns `false` if there was none.
    pub(crate) fn disconnect(&mut self, other: CellId) -> bool {
        let before = self.connections.len();
        self.connections.retain(|&(_, id)| id != other);
        self.connections.len() != before
    }

    pub(crate) fn push_agent(&mut self, agent: A) -> SpaceResult<()> {
        match self.capacity {
            Some(cap) if self.agents.len() >= cap => {
                return Err(SpaceError::CellFull(self.coordinate.clone(), cap));
            }
            _ => {}
        }
        self.agents.push(agent);
        Ok(())
    }
}

impl<A: PartialEq> Cell<A> {
    pub fn contains(&self, agent: &A) -> bool {
        self.agents.contains(agent)
    }

    pub(crate) fn take_agent(&mut self, agent: &A) -> SpaceResult<A> {
        match self.agents.iter().position(|a| a == agent) {
            Some(pos) => Ok(self.agents.remove(pos)),
            None => Err(SpaceError::AgentNotFound(self.coordinate.clone())),
        }
    }
}
