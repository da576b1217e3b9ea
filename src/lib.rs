//! This is a library to compute the [modular decomposition](https://en.wikipedia.org/wiki/Modular_decomposition)
//! of a simple, undirected graph in linear time.
//!
//! A node set *M* is a *module* if every node has the same neighborhood
//! outside *M*. The set of all nodes *V* and the sets with a single node
//! *{u}* are trivial modules.
//!
//! The algorithm is the one of Corneil, Habib, Paul and Tedder: an
//! extended lexicographic BFS produces a vertex order together with slice
//! lengths and label sets, and a recursion over the slices assembles the
//! decomposition tree around each pivot.
//!
//! # Examples
//!
//! The smallest prime graph is the path graph on 4 nodes.
//! ```rust
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use petgraph::graph::UnGraph;
//! use chpt_md::{ModuleKind, modular_decomposition};
//!
//! // a path graph with 4 nodes
//! let graph = UnGraph::<(), ()>::from_edges([(0, 1), (1, 2), (2, 3)]);
//! let md = modular_decomposition(&graph)?;
//!
//! assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Prime));
//! # Ok(())
//! # }
//! ```
//!
//! Determining whether a graph is a [cograph](https://en.wikipedia.org/wiki/Cograph).
//! ```rust
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use petgraph::graph::UnGraph;
//! use chpt_md::{ModuleKind, modular_decomposition};
//!
//! // a complete graph with 3 nodes
//! let graph = UnGraph::<(), ()>::from_edges([(0, 1), (0, 2), (1, 2)]);
//! let md = modular_decomposition(&graph)?;
//!
//! // a graph is a cograph exactly if none of its modules is prime
//! let is_cograph = md.module_kinds().all(|kind| *kind != ModuleKind::Prime);
//! assert!(is_cograph);
//! # Ok(())
//! # }
//! ```
//!
//! The [Graph] type can be used directly when the input is an edge list.
//! ```rust
//! use chpt_md::{compute, Graph, ModuleKind};
//!
//! let mut graph = Graph::new(4);
//! for (u, v) in [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)] {
//!     graph.add_edge(u, v).unwrap();
//! }
//!
//! let md = compute(&graph).expect("graph is not empty");
//! assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Series));
//! ```
//!
//! # Generics
//!
//! The algorithm is implemented for structs that implement the `petgraph`
//! traits `NodeCompactIndexable`, `IntoNeighbors`, and `GraphProp<EdgeType =
//! Undirected>`.
//!
//! # References
//! + \[CHPT08\]: Derek G. Corneil, Michel Habib, Christophe Paul, and Marc Tedder.
//!   “A Simple Linear-Time Modular Decomposition Algorithm”. (2008)
//! + \[HMPV00\]: Michel Habib, Ross McConnell, Christophe Paul, and Laurent Viennot.
//!   “Lex-BFS and partition refinement, with applications”. <https://doi.org/10.1016/S0304-3975(97)00241-7>.

#![forbid(unsafe_code)]
#![doc(test(attr(deny(warnings, rust_2018_idioms), allow(dead_code))))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

mod decompose;
mod graph;
mod lex_bfs;
mod md_tree;


pub use graph::EdgeIter;
pub use graph::Graph;
pub use graph::InvalidEdgeError;
pub use md_tree::MDTree;
pub use md_tree::ModuleIndex;
pub use md_tree::ModuleKind;
pub use md_tree::NullGraphError;

use petgraph::visit::{GraphProp, IntoNeighbors, NodeCompactIndexable};
use petgraph::Undirected;

/// Compute the modular decomposition tree of a [Graph].
///
/// Returns `None` iff the graph has no vertices. The leaves of the tree
/// carry the graph's vertex indices.
pub fn compute(graph: &Graph) -> Option<MDTree<u32>> {
    decompose::decompose(graph)
}

/// Computes the modular decomposition of the graph.
///
/// Self-loops and parallel edges of the input are ignored.
///
/// # Errors
///
/// Returns a `NullGraphError` if the input graph does not contain any nodes or edges.
pub fn modular_decomposition<G>(graph: G) -> Result<MDTree<G::NodeId>, NullGraphError>
where
    G: NodeCompactIndexable + IntoNeighbors + GraphProp<EdgeType = Undirected>,
{
    let n = graph.node_bound();
    let mut adjacency = Graph::new(n);
    for u in 0..n {
        for v in graph.neighbors(graph.from_index(u)) {
            let v = graph.to_index(v);
            if u != v {
                adjacency.add_edge(u as u32, v as u32).expect("node indices are compact");
            }
        }
    }

    let tree = compute(&adjacency).ok_or(NullGraphError)?;
    Ok(tree.map(|v| graph.from_index(v as usize)))
}

#[cfg(test)]
mod test {
    use petgraph::graph::{NodeIndex, UnGraph};

    use super::*;
    use crate::tests;

    #[derive(Default, Debug)]
    struct ModuleKindCounts {
        prime: usize,
        series: usize,
        parallel: usize,
        vertex: usize,
    }

    impl PartialEq<[usize; 4]> for ModuleKindCounts {
        fn eq(&self, &[prime, series, parallel, vertex]: &[usize; 4]) -> bool {
            self.prime == prime && self.series == series && self.parallel == parallel && self.vertex == vertex
        }
    }

    fn count_module_kinds(md: &MDTree<NodeIndex>) -> ModuleKindCounts {
        let mut counts = ModuleKindCounts::default();
        for kind in md.module_kinds() {
            match kind {
                ModuleKind::Prime => counts.prime += 1,
                ModuleKind::Series => counts.series += 1,
                ModuleKind::Parallel => counts.parallel += 1,
                ModuleKind::Node(_) => counts.vertex += 1,
            }
        }
        counts
    }

    /// The sorted vertex indices at the leaves below `module`.
    fn leaves_below(md: &MDTree<NodeIndex>, module: ModuleIndex) -> Vec<usize> {
        let mut leaves = vec![];
        let mut stack = vec![module];
        while let Some(module) = stack.pop() {
            if let Some(ModuleKind::Node(v)) = md.module_kind(module) {
                leaves.push(v.index());
            }
            stack.extend(md.children(module));
        }
        leaves.sort_unstable();
        leaves
    }

    #[test]
    fn empty_0() {
        let graph = tests::empty_graph(0);
        let md = modular_decomposition(&graph);
        assert!(md.is_err())
    }

    #[test]
    fn empty_1() {
        let graph = tests::empty_graph(1);
        let md = modular_decomposition(&graph).unwrap();
        assert_eq!(md.node_count(), 1);
        assert_eq!(count_module_kinds(&md), [0, 0, 0, 1]);
        assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Node(NodeIndex::new(0))));
    }

    #[test]
    fn empty_2() {
        let graph = tests::empty_graph(2);
        let md = modular_decomposition(&graph).unwrap();
        assert_eq!(md.node_count(), 3);
        assert_eq!(count_module_kinds(&md), [0, 0, 1, 2]);
        assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Parallel));
        assert_eq!(md.children(md.root()).count(), 2);
    }

    #[test]
    fn complete_2() {
        let graph = tests::complete_graph(2);
        let md = modular_decomposition(&graph).unwrap();
        assert_eq!(md.node_count(), 3);
        assert_eq!(count_module_kinds(&md), [0, 1, 0, 2]);
        assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Series));
        assert_eq!(md.children(md.root()).count(), 2);
    }

    #[test]
    fn complete_4() {
        let graph = tests::complete_graph(4);
        let md = modular_decomposition(&graph).unwrap();
        assert_eq!(count_module_kinds(&md), [0, 1, 0, 4]);
        assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Series));
        assert_eq!(md.children(md.root()).count(), 4);
    }

    #[test]
    fn complete_32() {
        let graph = tests::complete_graph(32);
        let md = modular_decomposition(&graph).unwrap();
        assert_eq!(count_module_kinds(&md), [0, 1, 0, 32]);
        assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Series));
        assert_eq!(md.children(md.root()).count(), 32);
    }

    #[test]
    fn independent_set_4() {
        let graph = tests::empty_graph(4);
        let md = modular_decomposition(&graph).unwrap();
        assert_eq!(count_module_kinds(&md), [0, 0, 1, 4]);
        assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Parallel));
        assert_eq!(md.children(md.root()).count(), 4);
    }

    #[test]
    fn path_4() {
        let graph = tests::path_graph(4);
        let md = modular_decomposition(&graph).unwrap();
        assert_eq!(md.node_count(), 5);
        assert_eq!(count_module_kinds(&md), [1, 0, 0, 4]);
        assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Prime));
        assert_eq!(md.children(md.root()).count(), 4);
    }

    #[test]
    fn path_32() {
        let graph = tests::path_graph(32);
        let md = modular_decomposition(&graph).unwrap();
        assert_eq!(count_module_kinds(&md), [1, 0, 0, 32]);
        assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Prime));
        assert_eq!(md.children(md.root()).count(), 32);
    }

    #[test]
    fn star_5() {
        // SERIES[ 0, PARALLEL[1, 2, 3, 4] ]
        let graph = tests::star_graph(5);
        let md = modular_decomposition(&graph).unwrap();
        assert_eq!(count_module_kinds(&md), [0, 1, 1, 5]);
        assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Series));

        let children: Vec<_> = md.children(md.root()).collect();
        assert_eq!(children.len(), 2);
        let center = children.iter().find(|&&c| md.module_kind(c) == Some(&ModuleKind::Node(NodeIndex::new(0))));
        let leaves = children.iter().find(|&&c| md.module_kind(c) == Some(&ModuleKind::Parallel));
        assert!(center.is_some());
        let leaves = *leaves.expect("star leaves form a parallel module");
        assert_eq!(leaves_below(&md, leaves), [1, 2, 3, 4]);
    }

    #[test]
    fn two_disjoint_triangles() {
        // PARALLEL[ SERIES[0, 1, 2], SERIES[3, 4, 5] ]
        let graph = UnGraph::<(), ()>::from_edges([(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)]);
        let md = modular_decomposition(&graph).unwrap();
        assert_eq!(count_module_kinds(&md), [0, 2, 1, 6]);
        assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Parallel));

        let mut triangles: Vec<Vec<usize>> = md.children(md.root()).map(|c| {
            assert_eq!(md.module_kind(c), Some(&ModuleKind::Series));
            leaves_below(&md, c)
        }).collect();
        triangles.sort();
        assert_eq!(triangles, [vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn two_disjoint_paths() {
        // PARALLEL[ PRIME[0, 1, 2, 3], PRIME[4, 5, 6, 7] ]
        let graph = UnGraph::<(), ()>::from_edges([(0, 1), (1, 2), (2, 3), (4, 5), (5, 6), (6, 7)]);
        let md = modular_decomposition(&graph).unwrap();
        assert_eq!(count_module_kinds(&md), [2, 0, 1, 8]);
        assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Parallel));

        let mut components: Vec<Vec<usize>> = md.children(md.root()).map(|c| {
            assert_eq!(md.module_kind(c), Some(&ModuleKind::Prime));
            leaves_below(&md, c)
        }).collect();
        components.sort();
        assert_eq!(components, [vec![0, 1, 2, 3], vec![4, 5, 6, 7]]);
    }

    #[test]
    fn cycle_5() {
        let graph = tests::cycle_graph(5);
        let md = modular_decomposition(&graph).unwrap();
        assert_eq!(count_module_kinds(&md), [1, 0, 0, 5]);
        assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Prime));
        assert_eq!(md.children(md.root()).count(), 5);
    }

    #[test]
    fn petersen() {
        let graph = tests::petersen_graph();
        let md = modular_decomposition(&graph).unwrap();
        assert_eq!(count_module_kinds(&md), [1, 0, 0, 10]);
        assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Prime));
        assert_eq!(md.children(md.root()).count(), 10);
        assert_eq!(leaves_below(&md, md.root()), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn complete_bipartite_3_3() {
        // SERIES[ PARALLEL[0, 1, 2], PARALLEL[3, 4, 5] ]
        let graph = tests::complete_bipartite_graph(3, 3);
        let md = modular_decomposition(&graph).unwrap();
        assert_eq!(count_module_kinds(&md), [0, 1, 2, 6]);
        assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Series));

        let mut sides: Vec<Vec<usize>> = md.children(md.root()).map(|c| {
            assert_eq!(md.module_kind(c), Some(&ModuleKind::Parallel));
            leaves_below(&md, c)
        }).collect();
        sides.sort();
        assert_eq!(sides, [vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn parallel_edges_and_self_loops_are_ignored() {
        let graph = UnGraph::<(), ()>::from_edges([(0, 1), (0, 1), (1, 0), (1, 1)]);
        let md = modular_decomposition(&graph).unwrap();
        assert_eq!(count_module_kinds(&md), [0, 1, 0, 2]);
        assert_eq!(md.module_kind(md.root()), Some(&ModuleKind::Series));
    }
}
