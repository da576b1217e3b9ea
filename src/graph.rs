use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::iter::FusedIterator;

use thiserror::Error;

/// An edge endpoint was outside the vertex range of the graph.
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
#[error("invalid edge ({u}, {v}): vertices must be in 0..{n}")]
pub struct InvalidEdgeError {
    /// First endpoint as given.
    pub u: u32,
    /// Second endpoint as given.
    pub v: u32,
    /// Number of vertices of the graph.
    pub n: u32,
}

/// A simple undirected graph on vertices `0..n`.
///
/// The adjacency of every vertex is kept twice: as an insertion-ordered
/// list for enumeration and as a hash set for constant-time edge tests.
/// Self-loops are ignored and duplicate insertions have no effect, so the
/// graph is always simple. After construction it is only read by the
/// decomposition.
///
/// ```rust
/// use chpt_md::Graph;
///
/// let mut graph = Graph::new(4);
/// graph.add_edge(0, 1).unwrap();
/// graph.add_edge(1, 2).unwrap();
/// graph.add_edge(1, 2).unwrap();
///
/// assert!(graph.has_edge(2, 1));
/// assert_eq!(graph.edge_count(), 2);
/// assert_eq!(graph.neighbors(1), [0, 2]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Graph {
    neighbors: Vec<Vec<u32>>,
    adjacent: Vec<HashSet<u32>>,
    num_edges: usize,
}

impl Graph {
    /// Create an edgeless graph with `n` vertices.
    pub fn new(n: usize) -> Self {
        Graph { neighbors: vec![Vec::new(); n], adjacent: vec![HashSet::new(); n], num_edges: 0 }
    }

    /// Return the number of vertices.
    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Return the number of edges.
    pub fn edge_count(&self) -> usize {
        self.num_edges
    }

    /// Add the undirected edge `{u, v}`.
    ///
    /// Self-loops are silently ignored and adding an edge twice has no
    /// effect.
    ///
    /// # Errors
    ///
    /// Returns an [InvalidEdgeError] if `u` or `v` is not a vertex.
    pub fn add_edge(&mut self, u: u32, v: u32) -> Result<(), InvalidEdgeError> {
        let n = self.node_count() as u32;
        if u >= n || v >= n {
            return Err(InvalidEdgeError { u, v, n });
        }
        if u == v {
            return Ok(());
        }
        if self.adjacent[u as usize].insert(v) {
            self.adjacent[v as usize].insert(u);
            self.neighbors[u as usize].push(v);
            self.neighbors[v as usize].push(u);
            self.num_edges += 1;
        }
        Ok(())
    }

    /// Return whether the edge `{u, v}` is present.
    ///
    /// Vertices outside the graph are adjacent to nothing.
    pub fn has_edge(&self, u: u32, v: u32) -> bool {
        let n = self.node_count() as u32;
        if u >= n || v >= n {
            return false;
        }
        self.adjacent[u as usize].contains(&v)
    }

    /// Return the neighbors of `v` in insertion order.
    pub fn neighbors(&self, v: u32) -> &[u32] {
        self.neighbors.get(v as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Return the degree of `v`.
    pub fn degree(&self, v: u32) -> usize {
        self.neighbors(v).len()
    }

    /// Iterate over all edges, each once as `(u, v)` with `u < v`.
    pub fn edges(&self) -> EdgeIter<'_> {
        EdgeIter { graph: self, u: 0, i: 0 }
    }
}

impl Display for Graph {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Graph(n={}, m={})", self.node_count(), self.edge_count())?;
        for (u, neighbors) in self.neighbors.iter().enumerate() {
            writeln!(f, "  {u} -> {neighbors:?}")?;
        }
        Ok(())
    }
}

/// Iterator returned by [Graph::edges].
#[derive(Debug)]
pub struct EdgeIter<'a> {
    graph: &'a Graph,
    u: u32,
    i: usize,
}

impl Iterator for EdgeIter<'_> {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        while (self.u as usize) < self.graph.node_count() {
            let neighbors = self.graph.neighbors(self.u);
            while self.i < neighbors.len() {
                let v = neighbors[self.i];
                self.i += 1;
                if self.u < v {
                    return Some((self.u, v));
                }
            }
            self.u += 1;
            self.i = 0;
        }
        None
    }
}

impl FusedIterator for EdgeIter<'_> {}
