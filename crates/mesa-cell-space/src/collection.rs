//! `CellCollection` — a read-only view over a subset of a space's cells.

use std::rc::Rc;

use rand::Rng;

use mesa_core::CellId;

use crate::{Cell, DiscreteSpace, SpaceError, SpaceResult};

/// Size limit for [`CellCollection::select`].
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub enum AtMost {
    #[default]
    Unbounded,
    /// At most this many cells.
    Count(usize),
    /// At most this fraction of the collection, rounded down.
    Fraction(f64),
}

impl AtMost {
    fn limit(self, len: usize) -> usize {
        match self {
            AtMost::Unbounded => len,
            AtMost::Count(n) => n.min(len),
            AtMost::Fraction(f) => ((len as f64) * f.clamp(0.0, 1.0)) as usize,
        }
    }
}

/// Cells of one space, in a fixed order.
///
/// Borrowing the space keeps the view consistent: while a collection is
/// alive the space cannot be mutated, so the cell set and every occupant
/// list it shows are current.
pub struct CellCollection<'a, A> {
    space: &'a DiscreteSpace<A>,
    ids:   Rc<[CellId]>,
}

impl<A> Clone for CellCollection<'_, A> {
    fn clone(&self) -> Self {
        Self { space: self.space, ids: Rc::clone(&self.ids) }
    }
}

impl<'a, A> CellCollection<'a, A> {
    pub(crate) fn new(space: &'a DiscreteSpace<A>, ids: Rc<[CellId]>) -> Self {
        Self { space, ids }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[CellId] {
        &self.ids
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.ids.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Cell<A>> + '_ {
        let space = self.space;
        self.ids.iter().filter_map(move |&id| space.get(id))
    }

    /// Every occupant of every cell, in cell order.  Each call starts a
    /// fresh iteration.
    pub fn agents(&self) -> impl Iterator<Item = &'a A> + '_ {
        self.iter().flat_map(Cell::agents)
    }

    pub fn agent_count(&self) -> usize {
        self.iter().map(Cell::len).sum()
    }

    /// Occupants of `cell`, if it belongs to this collection.
    pub fn agents_of(&self, cell: CellId) -> Option<&'a [A]> {
        if !self.contains(cell) {
            return None;
        }
        self.space.get(cell).map(Cell::agents)
    }

    /// Cells for which `filter` holds, stopping once `at_most` cells were
    /// taken.
    pub fn select(&self, mut filter: impl FnMut(&Cell<A>) -> bool, at_most: AtMost) -> CellCollection<'a, A> {
        let limit = at_most.limit(self.len());
        let ids: Rc<[CellId]> = self
            .iter()
            .filter(|cell| filter(cell))
            .take(limit)
            .map(Cell::id)
            .collect();
        CellCollection::new(self.space, ids)
    }

    /// `select(filter, AtMost::Unbounded)`.
    pub fn filter(&self, filter: impl FnMut(&Cell<A>) -> bool) -> CellCollection<'a, A> {
        self.select(filter, AtMost::Unbounded)
    }

    /// A uniformly random cell.
    pub fn select_random_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> SpaceResult<&'a Cell<A>> {
        if self.ids.is_empty() {
            return Err(SpaceError::EmptyCollection);
        }
        let id = self.ids[rng.gen_range(0..self.ids.len())];
        self.space.cell(id)
    }

    /// A uniformly random occupant across all cells.
    pub fn select_random_agent<R: Rng + ?Sized>(&self, rng: &mut R) -> SpaceResult<&'a A> {
        let total = self.agent_count();
        if total == 0 {
            return Err(SpaceError::EmptyCollection);
        }
        let pick = rng.gen_range(0..total);
        self.agents().nth(pick).ok_or(SpaceError::EmptyCollection)
    }
}

impl<'a, A> IntoIterator for &CellCollection<'a, A> {
    type Item = &'a Cell<A>;
    type IntoIter = std::vec::IntoIter<&'a Cell<A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter().collect::<Vec<_>>().into_iter()
    }
}

impl<A> std::fmt::Debug for CellCollection<'_, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellCollection").field("cells", &self.ids.len()).finish()
    }
}
