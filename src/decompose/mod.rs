//! The recursive slice decomposition.
//!
//! The engine runs one extended LexBFS over the whole graph and then
//! recurses over contiguous ranges of the visit order. Every frame builds
//! the subtrees of its slices, restructures them so that the lexicographic
//! label sets become modules of the partitive forest (marking), and
//! assembles the slice roots around the pivot into the frame's tree
//! (parse-and-assemble).

mod assembly;
mod marking;

use std::collections::HashSet;

use tracing::{info, instrument};

use crate::graph::Graph;
use crate::lex_bfs::LexBfs;
use crate::md_tree::{MDNode, MDTree, ModuleIndex, ModuleKind};

use assembly::{Module, Scratch};

/// Index of a tree node in the per-call [Arena]. `NONE` marks a missing
/// parent.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
struct NodeId(u32);

impl NodeId {
    const NONE: NodeId = NodeId(u32::MAX);

    fn new(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize);
        NodeId(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }

    fn is_none(self) -> bool {
        self == Self::NONE
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum TreeKind {
    Leaf(u32),
    Series,
    Parallel,
    Prime,
}

impl TreeKind {
    fn is_leaf(self) -> bool {
        matches!(self, TreeKind::Leaf(_))
    }

    fn is_degenerate(self) -> bool {
        matches!(self, TreeKind::Series | TreeKind::Parallel)
    }
}

/// Marking state of a node. The labels only ever progress from `Empty`
/// towards `Dead` within one frame and are reset when the node's subtree
/// is handed to the enclosing frame.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Label {
    Empty,
    Homogeneous,
    Broken,
    Dead,
}

impl Label {
    fn is_homogeneous_or_empty(self) -> bool {
        matches!(self, Label::Empty | Label::Homogeneous)
    }

    fn is_dead_or_broken(self) -> bool {
        matches!(self, Label::Broken | Label::Dead)
    }
}

/// Side marker distinguishing children that were full in a marking pass.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Flag {
    O,
    Star,
}

/// The overloaded per-node tag. A connected-component tag groups slice
/// roots that must stay fused; cluster construction consumes it and
/// overwrites it with the slice index. The two meanings are never live at
/// the same time.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Tag {
    None,
    Cc(u32),
    Slice(u32),
}

struct TreeNode {
    kind: TreeKind,
    children: Vec<NodeId>,
    parent: NodeId,
    label: Label,
    flag: Flag,
    tag: Tag,
}

/// Arena of tree nodes, local to one `compute` call.
///
/// Parent links are arena indices and only meaningful while the enclosing
/// frame is marking; `leaf_of` maps every vertex to its unique leaf once
/// the leaf has been created.
struct Arena {
    nodes: Vec<TreeNode>,
    leaf_of: Vec<NodeId>,
}

impl Arena {
    fn with_capacity(n: usize) -> Self {
        Arena { nodes: Vec::with_capacity(2 * n), leaf_of: vec![NodeId::NONE; n] }
    }

    fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.index()]
    }

    fn new_node(&mut self, kind: TreeKind, label: Label, flag: Flag) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(TreeNode { kind, children: Vec::new(), parent: NodeId::NONE, label, flag, tag: Tag::None });
        id
    }

    fn new_inner(&mut self, kind: TreeKind) -> NodeId {
        debug_assert!(!kind.is_leaf());
        self.new_node(kind, Label::Empty, Flag::O)
    }

    fn new_leaf(&mut self, vertex: u32) -> NodeId {
        let id = self.new_node(TreeKind::Leaf(vertex), Label::Empty, Flag::O);
        debug_assert!(self.leaf_of[vertex as usize].is_none(), "vertex {vertex} already has a leaf");
        self.leaf_of[vertex as usize] = id;
        id
    }

    fn leaf(&self, vertex: u32) -> Option<NodeId> {
        let id = self.leaf_of[vertex as usize];
        (!id.is_none()).then_some(id)
    }

    fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = parent;
        self.node_mut(parent).children.push(child);
    }

    /// Reset label and flag in the whole subtree. Tags are left alone;
    /// they are reassigned before they are read again.
    fn reset_marks(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        node.label = Label::Empty;
        node.flag = Flag::O;
        for i in 0..self.node(id).children.len() {
            let child = self.node(id).children[i];
            self.reset_marks(child);
        }
    }

    /// The vertex of the leftmost leaf descendant.
    fn leftmost_leaf(&self, mut id: NodeId) -> u32 {
        loop {
            match self.node(id).kind {
                TreeKind::Leaf(v) => return v,
                _ => id = self.node(id).children[0],
            }
        }
    }

    fn collect_vertices(&self, id: NodeId, out: &mut HashSet<u32>) {
        match self.node(id).kind {
            TreeKind::Leaf(v) => {
                out.insert(v);
            }
            _ => {
                for &child in &self.node(id).children {
                    self.collect_vertices(child, out);
                }
            }
        }
    }
}

/// Compute the modular decomposition tree of `graph`.
///
/// Returns `None` iff the graph has no vertices.
#[instrument(skip_all)]
pub(crate) fn decompose(graph: &Graph) -> Option<MDTree<u32>> {
    let n = graph.node_count();
    if n == 0 {
        return None;
    }

    let lex = LexBfs::compute(graph);
    let mut decomposer =
        Decomposer { graph, lex, arena: Arena::with_capacity(n), scratch: Scratch::default() };
    let roots = decomposer.decompose_range(0, n, 0);
    assert_eq!(roots.len(), 1, "a frame covering the whole graph must produce a single root");

    let tree = decomposer.into_md_tree(roots[0]);
    info!(number_of_nodes = tree.node_count(), number_of_inner_nodes = tree.node_count() - n);
    debug_assert_eq!(tree.leaf_count(), n);
    Some(tree)
}

struct Decomposer<'g> {
    graph: &'g Graph,
    lex: LexBfs,
    arena: Arena,
    scratch: Scratch,
}

impl Decomposer<'_> {
    /// Decompose the vertices at positions `offset..offset + length`,
    /// returning the roots of their modular decomposition forest.
    ///
    /// `label_offset` is the length of the lexicographic label prefix
    /// shared by the whole range; only label entries beyond it carry
    /// adjacency information that is new to this frame.
    fn decompose_range(&mut self, offset: usize, length: usize, label_offset: usize) -> Vec<NodeId> {
        if length == 0 {
            return Vec::new();
        }
        if length == 1 {
            return vec![self.arena.new_leaf(self.lex.sigma(offset))];
        }
        if length == 2 {
            let x = self.lex.sigma(offset);
            let y = self.lex.sigma(offset + 1);
            let kind =
                if self.lex.label_len(offset + 1) > label_offset { TreeKind::Series } else { TreeKind::Parallel };
            let root = self.arena.new_inner(kind);
            let leaf_x = self.arena.new_leaf(x);
            let leaf_y = self.arena.new_leaf(y);
            self.arena.add_child(root, leaf_x);
            self.arena.add_child(root, leaf_y);
            return vec![root];
        }

        let x = self.lex.sigma(offset);

        // Recurse on the slices of the pivot.
        let mut slices: Vec<Vec<NodeId>> = Vec::new();
        let mut slice_starts: Vec<usize> = Vec::new();
        let mut i = offset + 1;
        while i < offset + length {
            slice_starts.push(i);
            let slice_len = self.lex.xslice_len(i);
            let sub_label_offset = self.lex.label_len(i);
            let slice_roots = self.decompose_range(i, slice_len, sub_label_offset);
            for &root in &slice_roots {
                self.arena.reset_marks(root);
            }
            slices.push(slice_roots);
            i += slice_len;
        }

        let first_of_last_slice = *slice_starts.last().expect("length >= 3 gives at least one slice");
        let connected = self.lex.label_len(first_of_last_slice) > label_offset;
        let x_isolated = self.lex.label_len(offset + 1) <= label_offset;

        if x_isolated {
            return vec![self.attach_isolated_pivot(x, &slices[0])];
        }
        if !connected {
            return vec![self.assemble_disconnected(x, &slices, &slice_starts, label_offset)];
        }

        self.assemble_component(x, &mut slices, &slice_starts, label_offset)
    }

    /// Marking and assembly for the pivot and the slices of its connected
    /// component.
    fn assemble_component(
        &mut self,
        x: u32,
        slices: &mut [Vec<NodeId>],
        slice_starts: &[usize],
        label_offset: usize,
    ) -> Vec<NodeId> {
        for (s, slice_roots) in slices.iter().enumerate() {
            marking::set_cc_tags(&mut self.arena, slice_roots, s == 0);
        }

        for &start in &slice_starts[1..] {
            if self.lex.label_len(start) > label_offset {
                marking::mark_one_set(&mut self.arena, &self.lex.label(start)[label_offset..]);
            }
        }

        for slice_roots in slices.iter() {
            for &root in slice_roots {
                marking::finish_marking(&mut self.arena, root);
            }
        }

        for (s, slice_roots) in slices.iter_mut().enumerate() {
            marking::extract_and_sort(&mut self.arena, slice_roots, s == 0);
        }

        assembly::build_clusters(&mut self.arena, &mut self.scratch, slices);

        let leaf_x = self.arena.new_leaf(x);
        let p = self.scratch.clusters.len();
        self.scratch.clusters.push(vec![Module { root: leaf_x, leftmost: x }]);
        let q = self.scratch.clusters.len() - 1;

        assembly::compute_left(self.graph, &self.lex, &self.arena, &mut self.scratch, slice_starts, p);
        assembly::compute_right(&self.lex, &self.arena, &mut self.scratch, slice_starts, label_offset, p, q);

        assembly::parse_and_assemble(self.graph, &mut self.arena, &self.scratch, p, q)
    }

    /// The pivot has no neighbor in the frame: the frame is the parallel
    /// composition of the pivot and the single remaining slice.
    fn attach_isolated_pivot(&mut self, x: u32, slice_roots: &[NodeId]) -> NodeId {
        if slice_roots.len() == 1 && self.arena.node(slice_roots[0]).kind == TreeKind::Parallel {
            let root = slice_roots[0];
            let leaf_x = self.arena.new_leaf(x);
            self.arena.add_child(root, leaf_x);
            root
        } else {
            let root = self.arena.new_inner(TreeKind::Parallel);
            let leaf_x = self.arena.new_leaf(x);
            self.arena.add_child(root, leaf_x);
            for &node in slice_roots {
                self.arena.add_child(root, node);
            }
            root
        }
    }

    /// Some slice is unreachable from the pivot: run the reachable slices
    /// through the regular marking and assembly pipeline to build the
    /// pivot's connected component, then put it next to the unreachable
    /// slices under a parallel node.
    fn assemble_disconnected(
        &mut self,
        x: u32,
        slices: &[Vec<NodeId>],
        slice_starts: &[usize],
        label_offset: usize,
    ) -> NodeId {
        let mut component_slices: Vec<Vec<NodeId>> = vec![slices[0].clone()];
        let mut component_starts: Vec<usize> = vec![slice_starts[0]];
        let mut unreachable_roots: Vec<NodeId> = Vec::new();
        for (s, slice_roots) in slices.iter().enumerate().skip(1) {
            if self.lex.label_len(slice_starts[s]) > label_offset {
                component_slices.push(slice_roots.clone());
                component_starts.push(slice_starts[s]);
            } else {
                unreachable_roots.extend_from_slice(slice_roots);
            }
        }

        let component = self.assemble_component(x, &mut component_slices, &component_starts, label_offset);
        assert_eq!(component.len(), 1, "a connected component must assemble to a single root");

        let root = self.arena.new_inner(TreeKind::Parallel);
        self.arena.add_child(root, component[0]);
        for &node in &unreachable_roots {
            if self.arena.node(node).kind == TreeKind::Parallel {
                for i in 0..self.arena.node(node).children.len() {
                    let child = self.arena.node(node).children[i];
                    self.arena.add_child(root, child);
                }
            } else {
                self.arena.add_child(root, node);
            }
        }
        root
    }

    /// Convert the finished arena subtree under `root` into the public
    /// tree, in preorder.
    fn into_md_tree(self, root: NodeId) -> MDTree<u32> {
        fn convert(arena: &Arena, id: NodeId, nodes: &mut Vec<MDNode<u32>>) -> ModuleIndex {
            let kind = match arena.node(id).kind {
                TreeKind::Leaf(v) => ModuleKind::Node(v),
                TreeKind::Series => ModuleKind::Series,
                TreeKind::Parallel => ModuleKind::Parallel,
                TreeKind::Prime => ModuleKind::Prime,
            };
            let index = ModuleIndex::new(nodes.len());
            nodes.push(MDNode { kind, children: Vec::new() });
            let children: Vec<ModuleIndex> =
                arena.node(id).children.iter().map(|&child| convert(arena, child, nodes)).collect();
            nodes[index.index()].children = children;
            index
        }

        let mut nodes = Vec::with_capacity(self.arena.nodes.len());
        let root = convert(&self.arena, root, &mut nodes);
        MDTree::from_parts(nodes, root).expect("non-empty frame produces a non-empty tree")
    }
}
