//! Rectangular grids: orthogonal Moore, orthogonal Von Neumann, and hex.
//!
//! Cells are created in row-major order over `dimensions`, so the cell at
//! `[i, j]` of a `w × h` grid has `CellId(i * h + j)`.  Every grid
//! connection is keyed by its offset, e.g. `(-1, 0)`, which is what
//! [`Direction`] looks up.

use std::ops::{Deref, DerefMut};

use tracing::debug;

use mesa_core::CellId;

use crate::{Coordinate, DiscreteSpace, SpaceError, SpaceResult};

// ── Config ────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GridKind {
    /// Neighbors differ by at most 1 on every axis (3^d − 1 of them).
    Moore,
    /// Neighbors differ by exactly 1 on exactly one axis (2d of them).
    VonNeumann,
    /// Offset-row hexagons; 2D only.
    Hex,
}

/// Shape of a grid.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridConfig {
    /// Extent of each axis.
    pub dimensions: Vec<usize>,

    /// Wrap every axis around.
    pub torus: bool,

    /// Per-cell capacity; `None` is unbounded.
    pub capacity: Option<usize>,
}

impl GridConfig {
    pub fn new(dimensions: impl Into<Vec<usize>>) -> Self {
        Self { dimensions: dimensions.into(), torus: false, capacity: None }
    }

    pub fn torus(mut self, torus: bool) -> Self {
        self.torus = torus;
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Validate for a grid of `kind`.
    pub fn validate(&self, kind: GridKind) -> SpaceResult<()> {
        if self.dimensions.is_empty() {
            return Err(SpaceError::Config("dimensions must not be empty".into()));
        }
        if self.dimensions.contains(&0) {
            return Err(SpaceError::Config("every dimension must be at least 1".into()));
        }
        if self.capacity == Some(0) {
            return Err(SpaceError::Config("capacity must be at least 1".into()));
        }
        if kind == GridKind::Hex {
            if self.dimensions.len() != 2 {
                return Err(SpaceError::Config("hex grids are two-dimensional".into()));
            }
            // Row parity decides the offsets; an odd row count would pair
            // row 0 with another even row across the seam.
            if self.torus && self.dimensions[0] % 2 == 1 {
                return Err(SpaceError::Config("a hex torus needs an even number of rows".into()));
            }
        }
        Ok(())
    }
}

// ── Direction ─────────────────────────────────────────────────────────────────

/// Compass step on a 2D grid.  North is towards row 0.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    /// `(row, column)` offset.
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::N => (-1, 0),
            Direction::NE => (-1, 1),
            Direction::E => (0, 1),
            Direction::SE => (1, 1),
            Direction::S => (1, 0),
            Direction::SW => (1, -1),
            Direction::W => (0, -1),
            Direction::NW => (-1, -1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::N => Direction::S,
            Direction::NE => Direction::SW,
            Direction::E => Direction::W,
            Direction::SE => Direction::NW,
            Direction::S => Direction::N,
            Direction::SW => Direction::NE,
            Direction::W => Direction::E,
            Direction::NW => Direction::SE,
        }
    }
}

// ── Grid ──────────────────────────────────────────────────────────────────────

/// A [`DiscreteSpace`] whose cells form a regular lattice.
pub struct Grid<A> {
    space:      DiscreteSpace<A>,
    kind:       GridKind,
    dimensions: Vec<usize>,
    torus:      bool,
}

impl<A> Grid<A> {
    pub fn orthogonal_moore(config: &GridConfig) -> SpaceResult<Self> {
        Self::new(GridKind::Moore, config)
    }

    pub fn orthogonal_von_neumann(config: &GridConfig) -> SpaceResult<Self> {
        Self::new(GridKind::VonNeumann, config)
    }

    pub fn hex(config: &GridConfig) -> SpaceResult<Self> {
        Self::new(GridKind::Hex, config)
    }

    pub fn new(kind: GridKind, config: &GridConfig) -> SpaceResult<Self> {
        config.validate(kind)?;

        let mut space = DiscreteSpace::new();
        for coordinate in lattice(&config.dimensions) {
            space.add_cell(coordinate, config.capacity)?;
        }

        let mut grid = Self {
            space,
            kind,
            dimensions: config.dimensions.clone(),
            torus: config.torus,
        };
        grid.wire()?;

        debug!(
            kind = ?kind,
            dimensions = ?grid.dimensions,
            torus = grid.torus,
            cells = grid.space.len(),
            connections = grid.space.connection_count(),
            "grid built"
        );
        Ok(grid)
    }

    fn wire(&mut self) -> SpaceResult<()> {
        let dims = self.dimensions.clone();
        let moore = moore_offsets(dims.len());
        let von_neumann: Vec<Coordinate> = moore
            .iter()
            .filter(|o| o.iter().map(|v| v.abs()).sum::<i64>() == 1)
            .cloned()
            .collect();
        let (hex_even, hex_odd) = hex_offsets();

        let cells: Vec<(CellId, Coordinate)> =
            self.space.iter().map(|c| (c.id(), c.coordinate().clone())).collect();
        for (id, coordinate) in cells {
            let offsets = match self.kind {
                GridKind::Moore => &moore,
                GridKind::VonNeumann => &von_neumann,
                GridKind::Hex if coordinate[0] % 2 == 0 => &hex_even,
                GridKind::Hex => &hex_odd,
            };
            for offset in offsets {
                let Some(target) = self.resolve(&(&coordinate + offset)) else { continue };
                if target == id {
                    continue;
                }
                self.space.connect(id, target, Some(offset.clone()))?;
            }
        }
        Ok(())
    }

    /// Cell id of `raw`, wrapping on a torus; `None` if off the grid.
    fn resolve(&self, raw: &Coordinate) -> Option<CellId> {
        let mut axes = Vec::with_capacity(raw.dims());
        for (&v, &extent) in raw.iter().zip(&self.dimensions) {
            let extent = extent as i64;
            if self.torus {
                axes.push(v.rem_euclid(extent));
            } else if (0..extent).contains(&v) {
                axes.push(v);
            } else {
                return None;
            }
        }
        self.space.cell_id(&Coordinate::from(axes))
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn kind(&self) -> GridKind {
        self.kind
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    #[inline]
    pub fn torus(&self) -> bool {
        self.torus
    }

    /// Extent of axis 0.
    pub fn width(&self) -> usize {
        self.dimensions[0]
    }

    /// Extent of axis 1 (1 for a one-dimensional grid).
    pub fn height(&self) -> usize {
        self.dimensions.get(1).copied().unwrap_or(1)
    }

    /// Cell at `position`, wrapping on a torus.
    pub fn cell_at(&self, position: &[i64]) -> Option<CellId> {
        if position.len() != self.dimensions.len() {
            return None;
        }
        self.resolve(&Coordinate::new(position))
    }

    /// The neighbor one step in `direction`, if the grid connects it.
    pub fn neighbor_in(&self, cell: CellId, direction: Direction) -> Option<CellId> {
        let (dr, dc) = direction.offset();
        self.space.get(cell)?.neighbor(&Coordinate::from((dr, dc)))
    }

    pub fn into_space(self) -> DiscreteSpace<A> {
        self.space
    }
}

impl<A> Deref for Grid<A> {
    type Target = DiscreteSpace<A>;

    fn deref(&self) -> &DiscreteSpace<A> {
        &self.space
    }
}

impl<A> DerefMut for Grid<A> {
    fn deref_mut(&mut self) -> &mut DiscreteSpace<A> {
        &mut self.space
    }
}

// ── Offsets ───────────────────────────────────────────────────────────────────

/// Every point of the lattice in row-major order.
fn lattice(dimensions: &[usize]) -> Vec<Coordinate> {
    let mut points = vec![Vec::<i64>::new()];
    for &extent in dimensions {
        points = points
            .into_iter()
            .flat_map(|prefix| {
                (0..extent as i64).map(move |v| {
                    let mut next = prefix.clone();
                    next.push(v);
                    next
                })
            })
            .collect();
    }
    points.into_iter().map(Coordinate::from).collect()
}

/// `{-1, 0, 1}^d` without the origin, in lexicographic order.
fn moore_offsets(dims: usize) -> Vec<Coordinate> {
    let mut offsets = vec![Vec::<i64>::new()];
    for _ in 0..dims {
        offsets = offsets
            .into_iter()
            .flat_map(|prefix| {
                [-1, 0, 1].into_iter().map(move |v| {
                    let mut next = prefix.clone();
                    next.push(v);
                    next
                })
            })
            .collect();
    }
    offsets
        .into_iter()
        .filter(|o| o.iter().any(|&v| v != 0))
        .map(Coordinate::from)
        .collect()
}

/// Offsets for even and odd rows.
fn hex_offsets() -> (Vec<Coordinate>, Vec<Coordinate>) {
    let even: [(i64, i64); 6] = [(-1, -1), (-1, 0), (0, -1), (0, 1), (1, -1), (1, 0)];
    let odd: [(i64, i64); 6] = [(-1, 0), (-1, 1), (0, -1), (0, 1), (1, 0), (1, 1)];
    (
        even.into_iter().map(Coordinate::from).collect(),
        odd.into_iter().map(Coordinate::from).collect(),
    )
}
