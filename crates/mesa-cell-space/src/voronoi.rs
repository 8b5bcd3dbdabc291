//! Voronoi tessellations.
//!
//! Two centroids are neighbors iff they share an edge of the Delaunay
//! triangulation, which is exactly when their Voronoi regions share a
//! border.  The triangulation is built with Bowyer–Watson: insert points
//! one at a time, replacing every triangle whose circumcircle strictly
//! contains the new point.
//!
//! The outside of the convex hull is covered by ghost triangles, one per
//! hull edge, whose third vertex is a single point at infinity.  The
//! circumcircle of a ghost triangle is the open half-plane beyond its hull
//! edge plus the open edge itself, so hull edges are decided exactly rather
//! than by how large an enclosing triangle happens to be.
//!
//! Point location uses an R-tree over the centroids: the Voronoi region
//! containing a point is the region of its nearest centroid.

use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashSet;
use tracing::debug;

use mesa_core::CellId;

use crate::{Coordinate, DiscreteSpace, SpaceError, SpaceResult};

/// Relative tolerance for the collinearity test.
const COLLINEAR_EPS: f64 = 1e-12;

/// Vertex index standing for the point at infinity.
const GHOST: usize = usize::MAX;

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone)]
struct CentroidEntry {
    point: [f64; 2],
    cell:  CellId,
}

impl RTreeObject for CentroidEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for CentroidEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── VoronoiGrid ───────────────────────────────────────────────────────────────

/// A [`DiscreteSpace`] with one cell per centroid, connected along the
/// Delaunay triangulation.  Cell `i` has coordinate `(i)`; its centroid is
/// available through [`centroid`](Self::centroid).
pub struct VoronoiGrid<A> {
    space:     DiscreteSpace<A>,
    centroids: Vec<[f64; 2]>,
    index:     RTree<CentroidEntry>,
}

impl<A> VoronoiGrid<A> {
    /// # Errors
    ///
    /// [`SpaceError::Config`] for non-finite or duplicate centroids.
    pub fn new(centroids: Vec<[f64; 2]>, capacity: Option<usize>) -> SpaceResult<Self> {
        validate(&centroids)?;

        let mut space = DiscreteSpace::new();
        for i in 0..centroids.len() {
            space.add_cell(Coordinate::from(i as i64), capacity)?;
        }
        let edges = delaunay_edges(&centroids);
        for &(a, b) in &edges {
            space.add_connection(CellId(a as u32), CellId(b as u32))?;
        }

        let entries: Vec<CentroidEntry> = centroids
            .iter()
            .enumerate()
            .map(|(i, &point)| CentroidEntry { point, cell: CellId(i as u32) })
            .collect();
        let index = RTree::bulk_load(entries);

        debug!(cells = centroids.len(), edges = edges.len(), "voronoi grid built");
        Ok(Self { space, centroids, index })
    }

    pub fn centroid(&self, cell: CellId) -> Option<[f64; 2]> {
        self.centroids.get(cell.index()).copied()
    }

    pub fn centroids(&self) -> &[[f64; 2]] {
        &self.centroids
    }

    /// The cell whose region contains `point`.  Ties go to either cell.
    pub fn cell_at_point(&self, point: [f64; 2]) -> Option<CellId> {
        self.index
            .nearest_neighbor(&point)
            .map(|e| e.cell)
            .filter(|&cell| self.space.get(cell).is_some())
    }

    pub fn into_space(self) -> DiscreteSpace<A> {
        self.space
    }
}

impl<A> Deref for VoronoiGrid<A> {
    type Target = DiscreteSpace<A>;

    fn deref(&self) -> &DiscreteSpace<A> {
        &self.space
    }
}

impl<A> DerefMut for VoronoiGrid<A> {
    fn deref_mut(&mut self) -> &mut DiscreteSpace<A> {
        &mut self.space
    }
}

fn validate(points: &[[f64; 2]]) -> SpaceResult<()> {
    if let Some(p) = points.iter().find(|p| !p[0].is_finite() || !p[1].is_finite()) {
        return Err(SpaceError::Config(format!("centroid {p:?} is not finite")));
    }
    let mut seen = BTreeSet::new();
    for p in points {
        if !seen.insert((p[0].to_bits(), p[1].to_bits())) {
            return Err(SpaceError::Config(format!("duplicate centroid {p:?}")));
        }
    }
    Ok(())
}

// ── Delaunay ──────────────────────────────────────────────────────────────────

/// Undirected Delaunay edges `(i, j)` with `i < j`, sorted.
///
/// Triangles are vertex triples in counter-clockwise order; a ghost
/// triangle keeps `GHOST` last, with infinity to the left of its edge.
pub(crate) fn delaunay_edges(points: &[[f64; 2]]) -> Vec<(usize, usize)> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }
    if n == 2 || collinear(points) {
        return path_edges(points);
    }

    // Seed with the point furthest off the line through the first two.
    let (a, b) = (0, 1);
    let off_line = |i: usize| orient(points[a], points[b], points[i]).abs();
    let c = (2..n).max_by(|&i, &j| off_line(i).total_cmp(&off_line(j))).unwrap_or(2);
    let (b, c) = if orient(points[a], points[b], points[c]) > 0.0 { (b, c) } else { (c, b) };
    let mut triangles: Vec<[usize; 3]> =
        vec![[a, b, c], [b, a, GHOST], [c, b, GHOST], [a, c, GHOST]];

    for i in (0..n).filter(|&i| i != a && i != b && i != c) {
        let p = points[i];
        let (bad, good): (Vec<[usize; 3]>, Vec<[usize; 3]>) =
            triangles.into_iter().partition(|t| circumcircle_contains(t, points, p));

        // Cavity boundary: directed edges whose twin is not in the cavity.
        let inside: FxHashSet<(usize, usize)> = bad.iter().flat_map(directed_edges).collect();
        triangles = good;
        for (u, w) in bad.iter().flat_map(directed_edges) {
            if !inside.contains(&(w, u)) {
                triangles.push(ghost_last([u, w, i]));
            }
        }
    }

    let edges: BTreeSet<(usize, usize)> = triangles
        .iter()
        .filter(|t| t[2] != GHOST)
        .flat_map(|&[u, w, x]| [ordered(u, w), ordered(w, x), ordered(u, x)])
        .collect();
    edges.into_iter().collect()
}

fn directed_edges(t: &[usize; 3]) -> [(usize, usize); 3] {
    let [u, w, x] = *t;
    [(u, w), (w, x), (x, u)]
}

/// Rotate a triangle so that a ghost vertex comes last.
fn ghost_last(t: [usize; 3]) -> [usize; 3] {
    match t {
        [GHOST, u, w] => [u, w, GHOST],
        [u, GHOST, w] => [w, u, GHOST],
        t => t,
    }
}

fn circumcircle_contains(t: &[usize; 3], points: &[[f64; 2]], p: [f64; 2]) -> bool {
    let [u, w, x] = *t;
    if x == GHOST {
        let (a, b) = (points[u], points[w]);
        let side = orient(a, b, p);
        side > 0.0 || (side == 0.0 && strictly_between(a, b, p))
    } else {
        in_circle(points[u], points[w], points[x], p) > 0.0
    }
}

/// Twice the signed area of `abc`; positive when counter-clockwise.
#[inline]
fn orient(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Positive when `d` is strictly inside the circumcircle of the
/// counter-clockwise triangle `abc`.
fn in_circle(a: [f64; 2], b: [f64; 2], c: [f64; 2], d: [f64; 2]) -> f64 {
    let (adx, ady) = (a[0] - d[0], a[1] - d[1]);
    let (bdx, bdy) = (b[0] - d[0], b[1] - d[1]);
    let (cdx, cdy) = (c[0] - d[0], c[1] - d[1]);
    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;
    alift * (bdx * cdy - bdy * cdx) + blift * (cdx * ady - cdy * adx) + clift * (adx * bdy - ady * bdx)
}

/// `p` lies on the open segment `ab`, given that it is on the line.
fn strictly_between(a: [f64; 2], b: [f64; 2], p: [f64; 2]) -> bool {
    let from_a = (p[0] - a[0]) * (b[0] - a[0]) + (p[1] - a[1]) * (b[1] - a[1]);
    let from_b = (p[0] - b[0]) * (a[0] - b[0]) + (p[1] - b[1]) * (a[1] - b[1]);
    from_a > 0.0 && from_b > 0.0
}

/// `true` if every point lies on one line.
fn collinear(points: &[[f64; 2]]) -> bool {
    let a = points[0];
    let Some(b) = points.iter().copied().find(|&p| p != a) else { return true };
    let scale = dist2(a, b);
    points.iter().all(|&p| {
        let cross = (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
        cross.abs() <= COLLINEAR_EPS * scale.max(dist2(a, p)).max(1.0)
    })
}

/// Consecutive points along the line they share.
fn path_edges(points: &[[f64; 2]]) -> Vec<(usize, usize)> {
    let a = points[0];
    let dir = points
        .iter()
        .copied()
        .find(|&p| p != a)
        .map_or([1.0, 0.0], |b| [b[0] - a[0], b[1] - a[1]]);
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&i, &j| {
        let pi = (points[i][0] - a[0]) * dir[0] + (points[i][1] - a[1]) * dir[1];
        let pj = (points[j][0] - a[0]) * dir[0] + (points[j][1] - a[1]) * dir[1];
        pi.total_cmp(&pj)
    });
    let mut edges: Vec<(usize, usize)> = order.windows(2).map(|w| ordered(w[0], w[1])).collect();
    edges.sort_unstable();
    edges
}

#[inline]
fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

#[inline]
fn dist2(a: [f64; 2], b: [f64; 2]) -> f64 {
    let (dx, dy) = (a[0] - b[0], a[1] - b[1]);
    dx * dx + dy * dy
}
