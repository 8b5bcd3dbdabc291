//! `DiscreteSpace` — the arena that owns every cell of a space.
//!
//! # Empty cells
//!
//! The set of unoccupied cells is maintained incrementally on every agent
//! add/remove, so it is never stale.  Picking a random empty cell uses one
//! of two strategies:
//!
//! - many empties (more than [`cutoff_empties`](DiscreteSpace::cutoff_empties)):
//!   draw uniformly random cells until an empty one turns up;
//! - few empties: draw directly from the empty-cell index.
//!
//! Both are uniform over the empty cells.  The default cutoff
//! `7.953 * N^0.384` is the measured break-even point between the two.
//!
//! # Neighborhood cache
//!
//! `(cell, radius, include_center)` results are cached and the whole cache
//! is dropped on any topology change.  Occupancy changes do not touch it:
//! a neighborhood is a set of cells, and agents are read from the live
//! cells when the collection is used.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexSet;
use rand::Rng;
use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::debug;

use mesa_core::CellId;

use crate::{Cell, CellCollection, Coordinate, SpaceError, SpaceResult};

const CUTOFF_SCALE: f64 = 7.953;
const CUTOFF_EXPONENT: f64 = 0.384;

type NeighborhoodKey = (CellId, usize, bool);

/// Cells of one space, indexed by `CellId` and by coordinate.
pub struct DiscreteSpace<A> {
    /// Arena slot per `CellId`; `None` once removed.
    cells:   Vec<Option<Cell<A>>>,
    index:   FxHashMap<Coordinate, CellId>,
    empties: IndexSet<CellId, FxBuildHasher>,
    /// Sources of the connections into each cell.
    incoming: FxHashMap<CellId, IndexSet<CellId, FxBuildHasher>>,
    live:    usize,
    /// `Some` once set explicitly; otherwise derived from the cell count.
    cutoff_override: Option<f64>,
    neighborhoods:   RefCell<FxHashMap<NeighborhoodKey, Rc<[CellId]>>>,
}

impl<A> Default for DiscreteSpace<A> {
    fn default() -> Self {
        Self {
            cells:           Vec::new(),
            index:           FxHashMap::default(),
            empties:         IndexSet::default(),
            incoming:        FxHashMap::default(),
            live:            0,
            cutoff_override: None,
            neighborhoods:   RefCell::new(FxHashMap::default()),
        }
    }
}

impl<A> DiscreteSpace<A> {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Total directed connections across all cells.
    pub fn connection_count(&self) -> usize {
        self.iter().map(Cell::connection_count).sum()
    }

    /// Total agents across all cells.
    pub fn agent_count(&self) -> usize {
        self.iter().map(Cell::len).sum()
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn get(&self, id: CellId) -> Option<&Cell<A>> {
        self.cells.get(id.index()).and_then(Option::as_ref)
    }

    /// Like [`get`](Self::get) but an unknown id is an error.
    pub fn cell(&self, id: CellId) -> SpaceResult<&Cell<A>> {
        self.get(id).ok_or(SpaceError::UnknownCell(id))
    }

    pub fn cell_id(&self, coordinate: &Coordinate) -> Option<CellId> {
        self.index.get(coordinate).copied()
    }

    /// The cell at `coordinate`.
    pub fn at(&self, coordinate: &Coordinate) -> Option<&Cell<A>> {
        self.cell_id(coordinate).and_then(|id| self.get(id))
    }

    /// Every cell in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell<A>> + '_ {
        self.cells.iter().flatten()
    }

    pub fn all_cells(&self) -> CellCollection<'_, A> {
        CellCollection::new(self, self.iter().map(Cell::id).collect())
    }

    /// Cells with no occupants.
    pub fn empties(&self) -> CellCollection<'_, A> {
        CellCollection::new(self, self.empties.iter().copied().collect())
    }

    pub fn empty_count(&self) -> usize {
        self.empties.len()
    }

    /// Cells with a connection into `id`, in the order they connected.
    pub fn incoming(&self, id: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.incoming.get(&id).into_iter().flatten().copied()
    }

    // ── Topology ──────────────────────────────────────────────────────────

    /// Create an empty cell at `coordinate`.
    pub fn add_cell(&mut self, coordinate: impl Into<Coordinate>, capacity: Option<usize>) -> SpaceResult<CellId> {
        let coordinate = coordinate.into();
        if self.index.contains_key(&coordinate) {
            return Err(SpaceError::DuplicateCoordinate(coordinate));
        }
        let id = CellId::try_from(self.cells.len())
            .map_err(|_| SpaceError::Config("too many cells".into()))?;

        self.index.insert(coordinate.clone(), id);
        self.cells.push(Some(Cell::new(id, coordinate, capacity)));
        self.empties.insert(id);
        self.live += 1;
        self.invalidate();
        Ok(id)
    }

    /// Remove a cell, sever every connection into it, and return it with
    /// its occupants.
    pub fn remove_cell(&mut self, id: CellId) -> SpaceResult<Cell<A>> {
        let cell = self
            .cells
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(SpaceError::UnknownCell(id))?;

        for source in self.incoming.remove(&id).unwrap_or_default() {
            if let Some(other) = self.cells.get_mut(source.index()).and_then(Option::as_mut) {
                other.disconnect(id);
            }
        }
        for (_, target) in cell.connections() {
            if let Some(sources) = self.incoming.get_mut(&target) {
                sources.shift_remove(&id);
            }
        }
        self.index.remove(cell.coordinate());
        self.empties.swap_remove(&id);
        self.live -= 1;
        self.invalidate();
        debug!(cell = %cell.coordinate(), remaining = self.live, "cell removed");
        Ok(cell)
    }

    /// Directed connection `from → to` under `key` (default: `to`'s
    /// coordinate).
    pub fn connect(&mut self, from: CellId, to: CellId, key: Option<Coordinate>) -> SpaceResult<()> {
        let target = self.cell(to)?;
        let key = key.unwrap_or_else(|| target.coordinate().clone());
        self.cell_mut(from)?.connect(key, to)?;
        self.incoming.entry(to).or_default().insert(from);
        self.invalidate();
        Ok(())
    }

    /// Remove every connection `from → to`.
    pub fn disconnect(&mut self, from: CellId, to: CellId) -> SpaceResult<()> {
        let target = self.cell(to)?.coordinate().clone();
        let source = self.cell_mut(from)?;
        if !source.disconnect(to) {
            return Err(SpaceError::NotConnected(source.coordinate().clone(), target));
        }
        if let Some(sources) = self.incoming.get_mut(&to) {
            sources.shift_remove(&from);
        }
        self.invalidate();
        Ok(())
    }

    /// Connect `a` and `b` both ways, each keyed by the other's coordinate.
    pub fn add_connection(&mut self, a: CellId, b: CellId) -> SpaceResult<()> {
        self.connect(a, b, None)?;
        self.connect(b, a, None)
    }

    /// Undo [`add_connection`](Self::add_connection).
    pub fn remove_connection(&mut self, a: CellId, b: CellId) -> SpaceResult<()> {
        self.disconnect(a, b)?;
        self.disconnect(b, a)
    }

    // ── Occupancy ─────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// [`SpaceError::CellFull`] if the cell is at capacity.
    pub fn add_agent(&mut self, cell: CellId, agent: A) -> SpaceResult<()> {
        self.cell_mut(cell)?.push_agent(agent)?;
        self.empties.swap_remove(&cell);
        Ok(())
    }

    // ── Neighborhoods ─────────────────────────────────────────────────────

    /// Cells adjacent to `cell` within `radius` hops.
    ///
    /// Radius 1 is the direct connections.  Larger radii union the
    /// neighbors' `radius - 1` neighborhoods (centers included), so on
    /// directed topologies only forward-reachable cells appear.
    ///
    /// # Errors
    ///
    /// [`SpaceError::InvalidRadius`] for radius 0.
    pub fn neighborhood(&self, cell: CellId, radius: usize, include_center: bool) -> SpaceResult<CellCollection<'_, A>> {
        let ids = self.neighborhood_ids(cell, radius, include_center)?;
        Ok(CellCollection::new(self, ids))
    }

    /// Ids of [`neighborhood`](Self::neighborhood), shared with the cache.
    pub fn neighborhood_ids(&self, cell: CellId, radius: usize, include_center: bool) -> SpaceResult<Rc<[CellId]>> {
        if radius == 0 {
            return Err(SpaceError::InvalidRadius(radius));
        }
        let key = (cell, radius, include_center);
        if let Some(hit) = self.neighborhoods.borrow().get(&key) {
            return Ok(Rc::clone(hit));
        }

        let center = self.cell(cell)?;
        let mut found: IndexSet<CellId, FxBuildHasher> = IndexSet::default();
        if radius == 1 {
            found.extend(center.connections().map(|(_, id)| id));
            if include_center {
                found.insert(cell);
            }
        } else {
            for (_, neighbor) in center.connections() {
                found.extend(self.neighborhood_ids(neighbor, radius - 1, true)?.iter().copied());
            }
            if include_center {
                found.insert(cell);
            } else {
                found.shift_remove(&cell);
            }
        }

        let ids: Rc<[CellId]> = found.into_iter().collect();
        self.neighborhoods.borrow_mut().insert(key, Rc::clone(&ids));
        Ok(ids)
    }

    // ── Random placement ─────────────────────────────────────────────────

    /// Empty-count threshold above which random probing is used.
    pub fn cutoff_empties(&self) -> f64 {
        self.cutoff_override
            .unwrap_or_else(|| CUTOFF_SCALE * (self.live as f64).powf(CUTOFF_EXPONENT))
    }

    /// Override the strategy threshold.  Only performance depends on it.
    pub fn set_cutoff_empties(&mut self, cutoff: f64) {
        self.cutoff_override = Some(cutoff);
    }

    /// A uniformly random cell with no occupants.
    ///
    /// # Errors
    ///
    /// [`SpaceError::NoEmptyCell`] if every cell is occupied.
    pub fn select_random_empty_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> SpaceResult<CellId> {
        if self.empties.is_empty() {
            return Err(SpaceError::NoEmptyCell);
        }
        if self.empties.len() as f64 > self.cutoff_empties() {
            // At least one empty cell exists, so this terminates.
            loop {
                let slot = rng.gen_range(0..self.cells.len());
                match &self.cells[slot] {
                    Some(cell) if cell.is_empty() => return Ok(cell.id()),
                    _ => continue,
                }
            }
        }
        let pick = rng.gen_range(0..self.empties.len());
        self.empties.get_index(pick).copied().ok_or(SpaceError::NoEmptyCell)
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn cell_mut(&mut self, id: CellId) -> SpaceResult<&mut Cell<A>> {
        self.cells
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(SpaceError::UnknownCell(id))
    }

    fn invalidate(&self) {
        self.neighborhoods.borrow_mut().clear();
    }
}

impl<A: PartialEq> DiscreteSpace<A> {
    /// # Errors
    ///
    /// [`SpaceError::AgentNotFound`] if `agent` is not in `cell`.
    pub fn remove_agent(&mut self, cell: CellId, agent: &A) -> SpaceResult<A> {
        let target = self.cell_mut(cell)?;
        let removed = target.take_agent(agent)?;
        if target.is_empty() {
            self.empties.insert(cell);
        }
        Ok(removed)
    }

    /// Move `agent` from one cell to another.  Either both steps happen or
    /// neither does: the destination's capacity is checked first.
    pub fn move_agent(&mut self, from: CellId, to: CellId, agent: &A) -> SpaceResult<()> {
        if from == to {
            let cell = self.cell(from)?;
            if !cell.contains(agent) {
                return Err(SpaceError::AgentNotFound(cell.coordinate().clone()));
            }
            return Ok(());
        }
        let dest = self.cell(to)?;
        if let Some(cap) = dest.capacity().filter(|_| dest.is_full()) {
            return Err(SpaceError::CellFull(dest.coordinate().clone(), cap));
        }
        let moved = self.remove_agent(from, agent)?;
        self.add_agent(to, moved)
    }
}

impl<A> std::fmt::Debug for DiscreteSpace<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscreteSpace")
            .field("cells", &self.live)
            .field("empties", &self.empties.len())
            .finish()
    }
}
