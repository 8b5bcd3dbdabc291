//! Graph-backed spaces.
//!
//! # Data layout
//!
//! [`Graph`] stores outgoing adjacency in **Compressed Sparse Row (CSR)**
//! form.  The neighbors of node `n` are the contiguous slice
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! sorted by target.  [`Network`] creates one cell per node (cell `n` has
//! coordinate `(n)`) and one directed connection per edge.

use std::ops::{Deref, DerefMut};

use tracing::debug;

use mesa_core::CellId;

use crate::{Coordinate, DiscreteSpace, SpaceResult};

// ── Graph ─────────────────────────────────────────────────────────────────────

/// An immutable graph over nodes `0..node_count`.  Build with
/// [`GraphBuilder`].
#[derive(Clone, Debug)]
pub struct Graph {
    /// CSR row pointer.  Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    /// Target node of each edge, grouped by source.
    pub edge_to: Vec<u32>,

    directed: bool,
}

impl Graph {
    pub fn node_count(&self) -> usize {
        self.node_out_start.len() - 1
    }

    /// Stored edges.  An undirected edge counts twice, once per direction.
    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Nodes reachable over one outgoing edge of `node`.
    ///
    /// # Panics
    ///
    /// If `node >= node_count()`.
    #[inline]
    pub fn out_neighbors(&self, node: usize) -> &[u32] {
        let start = self.node_out_start[node] as usize;
        let end   = self.node_out_start[node + 1] as usize;
        &self.edge_to[start..end]
    }

    #[inline]
    pub fn out_degree(&self, node: usize) -> usize {
        self.out_neighbors(node).len()
    }

    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        from < self.node_count() && self.out_neighbors(from).binary_search(&(to as u32)).is_ok()
    }
}

// ── GraphBuilder ──────────────────────────────────────────────────────────────

/// Collect nodes and edges in any order, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use mesa_cell_space::GraphBuilder;
///
/// let mut b = GraphBuilder::undirected();
/// let a = b.add_node();
/// let c = b.add_node();
/// b.add_edge(a, c);
/// let g = b.build();
/// assert_eq!(g.node_count(), 2);
/// assert_eq!(g.edge_count(), 2); // both directions
/// ```
pub struct GraphBuilder {
    node_count: u32,
    raw_edges:  Vec<(u32, u32)>,
    directed:   bool,
}

impl GraphBuilder {
    pub fn undirected() -> Self {
        Self { node_count: 0, raw_edges: Vec::new(), directed: false }
    }

    pub fn directed() -> Self {
        Self { node_count: 0, raw_edges: Vec::new(), directed: true }
    }

    /// Make sure nodes `0..n` exist, including isolated ones.
    pub fn with_nodes(mut self, n: usize) -> Self {
        self.node_count = self.node_count.max(n as u32);
        self
    }

    /// Add a node and return its index (sequential from 0).
    pub fn add_node(&mut self) -> usize {
        self.node_count += 1;
        (self.node_count - 1) as usize
    }

    /// Add an edge.  Undirected builders store both directions.  Nodes that
    /// do not exist yet are created.
    pub fn add_edge(&mut self, from: usize, to: usize) {
        let (from, to) = (from as u32, to as u32);
        self.node_count = self.node_count.max(from.max(to) + 1);
        self.raw_edges.push((from, to));
        if !self.directed {
            self.raw_edges.push((to, from));
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count as usize
    }

    /// Consume the builder.  Self-loops and repeated edges are dropped.
    pub fn build(self) -> Graph {
        let node_count = self.node_count as usize;

        let mut raw = self.raw_edges;
        raw.retain(|&(from, to)| from != to);
        raw.sort_unstable();
        raw.dedup();

        let edge_to: Vec<u32> = raw.iter().map(|&(_, to)| to).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for &(from, _) in &raw {
            node_out_start[from as usize + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_to.len());

        Graph { node_out_start, edge_to, directed: self.directed }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::undirected()
    }
}

// ── Network ───────────────────────────────────────────────────────────────────

/// A [`DiscreteSpace`] with one cell per graph node, connected exactly as
/// the graph's edges.
pub struct Network<A> {
    space: DiscreteSpace<A>,
    graph: Graph,
}

impl<A> Network<A> {
    pub fn new(graph: Graph, capacity: Option<usize>) -> SpaceResult<Self> {
        let mut space = DiscreteSpace::new();
        for node in 0..graph.node_count() {
            space.add_cell(Coordinate::from(node as i64), capacity)?;
        }
        for node in 0..graph.node_count() {
            for &target in graph.out_neighbors(node) {
                space.connect(CellId(node as u32), CellId(target), None)?;
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            directed = graph.is_directed(),
            "network built"
        );
        Ok(Self { space, graph })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Cell of graph node `node`.
    pub fn node_cell(&self, node: usize) -> Option<CellId> {
        self.space.cell_id(&Coordinate::from(node as i64))
    }

    pub fn into_space(self) -> DiscreteSpace<A> {
        self.space
    }
}

impl<A> Deref for Network<A> {
    type Target = DiscreteSpace<A>;

    fn deref(&self) -> &DiscreteSpace<A> {
        &self.space
    }
}

impl<A> DerefMut for Network<A> {
    fn deref_mut(&mut self) -> &mut DiscreteSpace<A> {
        &mut self.space
    }
}
