use tracing::instrument;

use crate::graph::Graph;

/// Result of the extended lexicographic BFS.
///
/// Besides the visit order `sigma` and its inverse, the extension records
/// for every position the length of the slice that started there and the
/// ordered list of earlier vertices that contributed to the position's
/// lexicographic label. Both are consumed by the decomposition and never
/// modified afterwards.
pub(crate) struct LexBfs {
    sigma: Vec<u32>,
    sigma_inv: Vec<u32>,
    xslice_len: Vec<u32>,
    lex_label: Vec<Vec<u32>>,
}

/// A part of the position partition. Positions of a part are contiguous in
/// `sigma`, starting at `head`. `subpart` is the part that positions split
/// off during the current visit move into; it is stale once a newer visit
/// has begun.
struct Part {
    head: u32,
    len: u32,
    subpart: u32,
}

impl LexBfs {
    /// Run the extended LexBFS from the default start vertex.
    pub(crate) fn compute(graph: &Graph) -> Self {
        Self::compute_from(graph, None)
    }

    /// Run the extended LexBFS, seeding the order with `start` if given.
    ///
    /// Partition refinement over the positions of `sigma`: visiting the
    /// vertex at position `i` removes the position from its part, records
    /// the part length as the slice length of `i`, and splits every later
    /// part into neighbors and non-neighbors of the visited vertex.
    /// Neighbors are swapped to the front of their part, so parts stay
    /// contiguous. Each edge is handled once, for O(n + m) in total.
    #[instrument(skip_all)]
    pub(crate) fn compute_from(graph: &Graph, start: Option<u32>) -> Self {
        let n = graph.node_count();

        let mut sigma: Vec<u32> = Vec::with_capacity(n);
        if let Some(start) = start.filter(|&start| (start as usize) < n) {
            sigma.push(start);
            sigma.extend((0..n as u32).filter(|&v| v != start));
        } else {
            sigma.extend(0..n as u32);
        }
        let mut sigma_inv = vec![0_u32; n];
        for (i, &v) in sigma.iter().enumerate() {
            sigma_inv[v as usize] = i as u32;
        }

        let mut parts = vec![Part { head: 0, len: n as u32, subpart: 0 }];
        let mut part_of = vec![0_u32; n];
        let mut xslice_len = vec![0_u32; n];
        let mut lex_label: Vec<Vec<u32>> = vec![Vec::new(); n];

        for i in 0..n {
            let num_parts_before = parts.len() as u32;

            let part_i = part_of[i] as usize;
            parts[part_i].head += 1;
            xslice_len[i] = parts[part_i].len;
            parts[part_i].len -= 1;

            let v = sigma[i];
            for &u in graph.neighbors(v) {
                let mut j = sigma_inv[u as usize] as usize;
                if j <= i {
                    continue;
                }

                lex_label[j].push(v);

                let p = part_of[j] as usize;
                let l = parts[p].head as usize;

                // Swap u to the head of its part, unless the part is about
                // to become empty anyway.
                if l < n - 1 && part_of[l + 1] == p as u32 {
                    if l != j {
                        let t = sigma[l];
                        sigma_inv[t as usize] = j as u32;
                        sigma_inv[u as usize] = l as u32;
                        sigma[j] = t;
                        sigma[l] = u;
                        lex_label.swap(j, l);
                        j = l;
                    }
                    parts[p].head += 1;
                }

                if parts[p].subpart < num_parts_before {
                    let subpart = parts.len() as u32;
                    parts[p].subpart = subpart;
                    parts.push(Part { head: j as u32, len: 0, subpart: 0 });
                }

                let subpart = parts[p].subpart;
                part_of[j] = subpart;
                parts[p].len -= 1;
                parts[subpart as usize].len += 1;
            }
        }

        LexBfs { sigma, sigma_inv, xslice_len, lex_label }
    }

    #[allow(unused)]
    pub(crate) fn len(&self) -> usize {
        self.sigma.len()
    }

    /// The vertex visited at position `i`.
    pub(crate) fn sigma(&self, i: usize) -> u32 {
        self.sigma[i]
    }

    /// The position at which `v` was visited.
    #[allow(unused)]
    pub(crate) fn position(&self, v: u32) -> usize {
        self.sigma_inv[v as usize] as usize
    }

    /// Length of the slice starting at position `i`.
    pub(crate) fn xslice_len(&self, i: usize) -> usize {
        self.xslice_len[i] as usize
    }

    /// The vertices that contributed to the label of position `i`, in
    /// visit order.
    pub(crate) fn label(&self, i: usize) -> &[u32] {
        &self.lex_label[i]
    }

    pub(crate) fn label_len(&self, i: usize) -> usize {
        self.lex_label[i].len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn graph_from_edges(n: usize, edges: &[(u32, u32)]) -> Graph {
        let mut graph = Graph::new(n);
        for &(u, v) in edges {
            graph.add_edge(u, v).unwrap();
        }
        graph
    }

    /// Check the LexBFS point property: for positions a < b < c with
    /// sigma(a)sigma(c) an edge and sigma(a)sigma(b) not, some position
    /// d < a has sigma(d)sigma(b) an edge and sigma(d)sigma(c) not.
    fn assert_lex_bfs_property(graph: &Graph, order: &LexBfs) {
        let n = order.len();
        for a in 0..n {
            for b in a + 1..n {
                for c in b + 1..n {
                    let (va, vb, vc) = (order.sigma(a), order.sigma(b), order.sigma(c));
                    if graph.has_edge(va, vc) && !graph.has_edge(va, vb) {
                        let witness = (0..a).any(|d| {
                            let vd = order.sigma(d);
                            graph.has_edge(vd, vb) && !graph.has_edge(vd, vc)
                        });
                        assert!(witness, "no witness for positions ({a}, {b}, {c})");
                    }
                }
            }
        }
    }

    fn assert_is_permutation(order: &LexBfs, n: usize) {
        assert_eq!(order.len(), n);
        let mut seen = vec![false; n];
        for i in 0..n {
            let v = order.sigma(i);
            assert_eq!(order.position(v), i);
            assert!(!seen[v as usize]);
            seen[v as usize] = true;
        }
    }

    #[test]
    fn empty_graph() {
        let graph = Graph::new(0);
        let order = LexBfs::compute(&graph);
        assert_eq!(order.len(), 0);
    }

    #[test]
    fn path_4() {
        let graph = graph_from_edges(4, &[(0, 1), (1, 2), (2, 3)]);
        let order = LexBfs::compute(&graph);

        assert_is_permutation(&order, 4);
        assert_eq!((0..4).map(|i| order.sigma(i)).collect::<Vec<_>>(), [0, 1, 2, 3]);
        assert_eq!((0..4).map(|i| order.xslice_len(i)).collect::<Vec<_>>(), [4, 1, 1, 1]);
        assert!(order.label(0).is_empty());
        assert_eq!(order.label(1), [0]);
        assert_eq!(order.label(2), [1]);
        assert_eq!(order.label(3), [2]);
        assert_lex_bfs_property(&graph, &order);
    }

    #[test]
    fn star_4() {
        let graph = graph_from_edges(4, &[(0, 1), (0, 2), (0, 3)]);
        let order = LexBfs::compute(&graph);

        assert_is_permutation(&order, 4);
        // All leaves share the label [0] and stay in one shrinking slice.
        assert_eq!((0..4).map(|i| order.xslice_len(i)).collect::<Vec<_>>(), [4, 3, 2, 1]);
        for i in 1..4 {
            assert_eq!(order.label(i), [0]);
        }
        assert_lex_bfs_property(&graph, &order);
    }

    #[test]
    fn start_vertex_is_respected() {
        let graph = graph_from_edges(4, &[(0, 1), (1, 2), (2, 3)]);
        let order = LexBfs::compute_from(&graph, Some(2));

        assert_is_permutation(&order, 4);
        assert_eq!(order.sigma(0), 2);
        // Neighbors of the start come right after it.
        let second = order.sigma(1);
        assert!(graph.has_edge(2, second));
        assert_lex_bfs_property(&graph, &order);
    }

    #[test]
    fn out_of_range_start_falls_back_to_default() {
        let graph = graph_from_edges(3, &[(0, 1), (1, 2)]);
        let order = LexBfs::compute_from(&graph, Some(9));
        assert_is_permutation(&order, 3);
        assert_eq!(order.sigma(0), 0);
    }

    #[test]
    fn property_holds_on_assorted_graphs() {
        let instances: Vec<(usize, Vec<(u32, u32)>)> = vec![
            (5, vec![(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]),
            (6, vec![(0, 3), (0, 4), (0, 5), (1, 3), (1, 4), (1, 5), (2, 3), (2, 4), (2, 5)]),
            (6, vec![(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)]),
            (7, vec![(0, 1), (0, 2), (1, 2), (2, 3), (3, 4), (4, 5), (4, 6), (5, 6)]),
        ];
        for (n, edges) in instances {
            let graph = graph_from_edges(n, &edges);
            for start in std::iter::once(None).chain((0..n as u32).map(Some)) {
                let order = LexBfs::compute_from(&graph, start);
                assert_is_permutation(&order, n);
                assert_lex_bfs_property(&graph, &order);
            }
        }
    }
}
