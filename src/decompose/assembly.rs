//! Assembly of one frame: cluster the slice roots, bound the intervals
//! that must be absorbed together, and grow the frame's tree outwards
//! from the pivot.

use std::collections::HashSet;

use crate::graph::Graph;
use crate::lex_bfs::LexBfs;

use super::{Arena, NodeId, Tag, TreeKind};

/// One root within a cluster, together with the vertex of its leftmost
/// leaf. The leftmost vertex stands in for the whole subtree in adjacency
/// queries.
pub(super) struct Module {
    pub(super) root: NodeId,
    pub(super) leftmost: u32,
}

/// Reusable per-frame storage. Allocated once per `compute` call and
/// cleared, not freed, between frames.
#[derive(Default)]
pub(super) struct Scratch {
    pub(super) clusters: Vec<Vec<Module>>,
    cluster_of: std::collections::HashMap<u32, u32>,
    left: Vec<u32>,
    right: Vec<u32>,
}

/// Group the roots of every slice into clusters: maximal runs of roots
/// sharing a component tag, or singletons for untagged roots. Consumes the
/// component tags and overwrites each root's tag with its slice index.
pub(super) fn build_clusters(arena: &mut Arena, scratch: &mut Scratch, slices: &[Vec<NodeId>]) {
    scratch.clusters.clear();
    scratch.cluster_of.clear();

    for (slice_index, slice_roots) in slices.iter().enumerate() {
        let mut previous_cc: Option<u32> = None;
        for &root in slice_roots {
            let cc = match arena.node(root).tag {
                Tag::Cc(cc) => Some(cc),
                _ => None,
            };
            let leftmost = arena.leftmost_leaf(root);
            arena.node_mut(root).tag = Tag::Slice(slice_index as u32);

            match cc {
                None => {
                    scratch.clusters.push(vec![Module { root, leftmost }]);
                    previous_cc = None;
                }
                Some(cc) => {
                    if previous_cc != Some(cc) {
                        scratch.clusters.push(Vec::new());
                    }
                    scratch.clusters.last_mut().expect("pushed above").push(Module { root, leftmost });
                    previous_cc = Some(cc);
                }
            }

            scratch.cluster_of.insert(leftmost, scratch.clusters.len() as u32 - 1);
        }
    }
}

/// For every cluster, the leftmost cluster index that has to be absorbed
/// together with it. Pre-pivot clusters are bounded by themselves; the
/// bound for a later slice stops at the first pre-pivot cluster that is
/// not uniformly adjacent to the slice's first vertex.
pub(super) fn compute_left(
    graph: &Graph,
    lex: &LexBfs,
    arena: &Arena,
    scratch: &mut Scratch,
    slice_starts: &[usize],
    p: usize,
) {
    scratch.left.clear();
    scratch.left.extend(0..=p as u32);

    let mut k = p + 1;
    for (s, &start) in slice_starts.iter().enumerate() {
        if s > 0 {
            let v = lex.sigma(start);
            let mut lp = 0;
            while lp < p {
                if !scratch.clusters[lp].iter().all(|m| graph.has_edge(m.leftmost, v)) {
                    break;
                }
                lp += 1;
            }
            while k < scratch.clusters.len()
                && arena.node(scratch.clusters[k][0].root).tag == Tag::Slice(s as u32)
            {
                scratch.left.push(lp as u32);
                k += 1;
            }
        }
    }
}

/// For every cluster, the rightmost cluster index that has to be absorbed
/// together with it, tightened by the lexicographic labels of the later
/// slices.
pub(super) fn compute_right(
    lex: &LexBfs,
    arena: &Arena,
    scratch: &mut Scratch,
    slice_starts: &[usize],
    label_offset: usize,
    p: usize,
    q: usize,
) {
    scratch.right.clear();
    scratch.right.extend(std::iter::repeat(p as u32).take(p + 1));
    scratch.right.extend(p as u32 + 1..=q as u32);

    let mut j = 0;
    for (s, &start) in slice_starts.iter().enumerate() {
        while j + 1 < scratch.clusters.len()
            && arena.node(scratch.clusters[j + 1][0].root).tag == Tag::Slice(s as u32)
        {
            j += 1;
        }
        if s > 0 {
            for &v in &lex.label(start)[label_offset..] {
                if let Some(&cluster) = scratch.cluster_of.get(&v) {
                    scratch.right[cluster as usize] = j as u32;
                }
            }
        } else {
            // Step over the pivot's own cluster.
            j += 1;
        }
    }
}

/// Grow the frame's tree outwards from the pivot cluster.
///
/// Each round chooses series (the next cluster to the left touches the
/// tree built so far) or parallel, closes the interval under the Left and
/// Right bounds, and wraps the absorbed clusters and the previous tree in
/// a fresh node. A round that is forced to absorb more than a single
/// cluster, or whose absorbed vertices break the chosen kind's module
/// property, collapses everything into one prime node over all leaves and
/// ends the frame.
pub(super) fn parse_and_assemble(
    graph: &Graph,
    arena: &mut Arena,
    scratch: &Scratch,
    p: usize,
    q: usize,
) -> Vec<NodeId> {
    let mut roots: Vec<NodeId> = scratch.clusters[p].iter().map(|m| m.root).collect();

    let mut l = p;
    let mut r = p;

    let mut current: HashSet<u32> = HashSet::new();
    for m in &scratch.clusters[p] {
        arena.collect_vertices(m.root, &mut current);
    }
    // Fixed representative for neighborhood comparisons: the pivot.
    let representative = scratch.clusters[p][0].leftmost;

    while l > 0 || r < q {
        let old_l = l;
        let old_r = r;

        let (mut lp, mut rp, kind) = if l > 0 && cluster_touches(graph, scratch, l - 1, &current) {
            (l - 1, r, TreeKind::Series)
        } else if r < q {
            (l, r + 1, TreeKind::Parallel)
        } else if l > 0 {
            (l - 1, r, TreeKind::Parallel)
        } else {
            (l, r, TreeKind::Series)
        };

        let mut expanded_left = false;
        let mut expanded_right = false;
        while lp < l || r < rp {
            if lp < l {
                l -= 1;
                expanded_left = true;
            } else {
                r += 1;
                expanded_right = true;
            }

            let idx = if l < old_l { l } else { r };
            if idx < scratch.left.len() {
                lp = lp.min(scratch.left[idx] as usize);
            }
            if idx < scratch.right.len() {
                rp = rp.max(scratch.right[idx] as usize);
            }
        }

        let mut new_vertices: HashSet<u32> = HashSet::new();
        for cluster in &scratch.clusters[l..old_l] {
            for m in cluster {
                arena.collect_vertices(m.root, &mut new_vertices);
            }
        }
        for cluster in &scratch.clusters[old_r + 1..=r] {
            for m in cluster {
                arena.collect_vertices(m.root, &mut new_vertices);
            }
        }

        let total_expansion = (old_l - l) + (r - old_r);
        let forced_both_directions = expanded_left && expanded_right;
        let violates_module_property = if new_vertices.is_empty() || current.is_empty() {
            false
        } else {
            match kind {
                TreeKind::Series => new_vertices
                    .iter()
                    .any(|&nv| current.iter().any(|&cv| !graph.has_edge(nv, cv))),
                TreeKind::Parallel => {
                    let all_in: HashSet<u32> = current.union(&new_vertices).copied().collect();
                    let expected = external_neighborhood(graph, representative, &all_in);
                    new_vertices.iter().any(|&nv| external_neighborhood(graph, nv, &all_in) != expected)
                }
                _ => false,
            }
        };

        if forced_both_directions || total_expansion > 1 || violates_module_property {
            // The step cannot be a plain series or parallel composition.
            // Collapse every cluster into a single prime node over all
            // leaves and end the frame.
            let root = arena.new_inner(TreeKind::Prime);
            for cluster in &scratch.clusters[..=q] {
                for m in cluster {
                    add_to_prime(arena, root, m.root);
                }
            }
            return vec![root];
        }

        let root = arena.new_inner(kind);
        for cluster in &scratch.clusters[l..old_l] {
            for m in cluster {
                add_flattened(arena, root, m.root, kind);
            }
        }
        if let Some(old_root) = roots.pop() {
            add_flattened(arena, root, old_root, kind);
        }
        for cluster in &scratch.clusters[old_r + 1..=r] {
            for m in cluster {
                add_flattened(arena, root, m.root, kind);
            }
        }

        roots.push(root);
        current.extend(new_vertices);
    }

    roots
}

/// Whether any leftmost vertex of the cluster is adjacent to the tree
/// built so far.
fn cluster_touches(graph: &Graph, scratch: &Scratch, cluster: usize, current: &HashSet<u32>) -> bool {
    scratch.clusters[cluster].iter().any(|m| current.iter().any(|&cv| graph.has_edge(m.leftmost, cv)))
}

fn external_neighborhood(graph: &Graph, v: u32, inside: &HashSet<u32>) -> HashSet<u32> {
    graph.neighbors(v).iter().copied().filter(|w| !inside.contains(w)).collect()
}

/// Add `node` as a child of `root`, splicing in its children instead when
/// both share the same degenerate kind.
fn add_flattened(arena: &mut Arena, root: NodeId, node: NodeId, kind: TreeKind) {
    if kind != TreeKind::Prime && arena.node(node).kind == kind {
        for c in 0..arena.node(node).children.len() {
            let child = arena.node(node).children[c];
            arena.add_child(root, child);
        }
    } else {
        arena.add_child(root, node);
    }
}

/// Add every leaf below `node` directly to the prime root.
fn add_to_prime(arena: &mut Arena, root: NodeId, node: NodeId) {
    if arena.node(node).kind.is_leaf() {
        arena.add_child(root, node);
    } else {
        for c in 0..arena.node(node).children.len() {
            let child = arena.node(node).children[c];
            add_to_prime(arena, root, child);
        }
    }
}
