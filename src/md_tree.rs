use std::fmt::{Debug, Display, Formatter};

use petgraph::graph::DiGraph;
use thiserror::Error;

/// Module kinds of nodes in a [MDTree].
///
/// Each node of the tree stands for a module of the input graph, the set
/// of vertices at the leaves below it. The kind of an inner node is
/// determined by its quotient graph, obtained by picking one vertex from
/// each child module.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum ModuleKind<NodeId: Copy + PartialEq> {
    /// A prime module. Its quotient graph has only trivial modules.
    Prime,
    /// A series module. Its quotient graph is a complete graph.
    Series,
    /// A parallel module. Its quotient graph is an empty graph.
    Parallel,
    /// A trivial module with a single vertex, a leaf of the tree.
    Node(NodeId),
}

impl<NodeId: Debug + Copy + PartialEq> Debug for ModuleKind<NodeId> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleKind::Prime => write!(f, "Prime"),
            ModuleKind::Series => write!(f, "Series"),
            ModuleKind::Parallel => write!(f, "Parallel"),
            ModuleKind::Node(v) => write!(f, "{v:?}"),
        }
    }
}

impl<NodeId: Copy + PartialEq> ModuleKind<NodeId> {
    fn is_leaf(&self) -> bool {
        matches!(self, ModuleKind::Node(_))
    }
}

/// Module identifier, an index into a [MDTree].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ModuleIndex(u32);

impl Debug for ModuleIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ModuleIndex").field(&self.0).finish()
    }
}

impl ModuleIndex {
    /// Create new index from `usize`.
    pub fn new(x: usize) -> Self {
        debug_assert!(x < u32::MAX as usize);
        Self(x as u32)
    }

    /// Returns the index as `usize`.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

pub(crate) struct MDNode<NodeId: Copy + PartialEq> {
    pub(crate) kind: ModuleKind<NodeId>,
    pub(crate) children: Vec<ModuleIndex>,
}

/// A modular decomposition tree. The tree contains at least one node.
///
/// Nodes live in an arena indexed by [ModuleIndex]; children are kept in
/// order, so quotient structure read off the tree is reproducible.
pub struct MDTree<NodeId: Copy + PartialEq> {
    nodes: Vec<MDNode<NodeId>>,
    root: ModuleIndex,
}

impl<NodeId: Copy + PartialEq + Debug> Debug for MDTree<NodeId> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MDTree(root={:?}, nodes={})", self.root, self.node_count())
    }
}

impl<NodeId: Copy + PartialEq> MDTree<NodeId> {
    /// Assumes that `nodes` forms a single rooted tree with inner nodes
    /// carrying `Prime`, `Series` or `Parallel` and leaves carrying
    /// `Node(_)`. This is not checked explicitly.
    pub(crate) fn from_parts(nodes: Vec<MDNode<NodeId>>, root: ModuleIndex) -> Result<Self, NullGraphError> {
        if nodes.is_empty() {
            return Err(NullGraphError);
        }
        debug_assert!(root.index() < nodes.len());
        Ok(Self { nodes, root })
    }

    /// Return the number of nodes in the modular decomposition tree.
    #[inline(always)]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Return the root node index.
    #[inline(always)]
    pub fn root(&self) -> ModuleIndex {
        self.root
    }

    /// Access the [ModuleKind] of a module.
    ///
    /// If the module does not exist, return None.
    pub fn module_kind(&self, module: ModuleIndex) -> Option<&ModuleKind<NodeId>> {
        self.nodes.get(module.index()).map(|node| &node.kind)
    }

    /// Return an iterator yielding references to [ModuleKind]s for all nodes.
    pub fn module_kinds(&self) -> impl Iterator<Item = &ModuleKind<NodeId>> {
        self.nodes.iter().map(|node| &node.kind)
    }

    /// Return an iterator over the children of a module, in order.
    pub fn children(&self, module: ModuleIndex) -> impl Iterator<Item = ModuleIndex> + '_ {
        self.nodes.get(module.index()).map(|node| node.children.as_slice()).unwrap_or(&[]).iter().copied()
    }

    /// Return the number of leaves, which equals the number of vertices of
    /// the decomposed graph.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.kind.is_leaf()).count()
    }

    /// Return the height of the tree. A single leaf has height 0.
    pub fn height(&self) -> usize {
        self.height_below(self.root)
    }

    fn height_below(&self, module: ModuleIndex) -> usize {
        self.children(module).map(|child| 1 + self.height_below(child)).max().unwrap_or(0)
    }

    /// Convert to [DiGraph] with edges from parents to children.
    ///
    /// This allows the use of [petgraph] algorithms on the tree. Node
    /// indices of the digraph correspond to [ModuleIndex] values.
    pub fn into_digraph(self) -> DiGraph<ModuleKind<NodeId>, ()> {
        let mut digraph = DiGraph::with_capacity(self.nodes.len(), self.nodes.len().saturating_sub(1));
        for node in &self.nodes {
            digraph.add_node(node.kind);
        }
        for (index, node) in self.nodes.iter().enumerate() {
            for child in &node.children {
                digraph.add_edge(petgraph::graph::NodeIndex::new(index), petgraph::graph::NodeIndex::new(child.index()), ());
            }
        }
        digraph
    }

    /// Return an indented multi-line rendering for debugging.
    pub fn to_pretty_string(&self) -> String
    where
        NodeId: Debug,
    {
        fn walk<NodeId: Copy + PartialEq + Debug>(tree: &MDTree<NodeId>, module: ModuleIndex, depth: usize, out: &mut String) {
            for _ in 0..depth {
                out.push_str("  ");
            }
            out.push_str(&format!("{:?}\n", tree.nodes[module.index()].kind));
            for child in tree.children(module) {
                walk(tree, child, depth + 1, out);
            }
        }
        let mut out = String::new();
        walk(self, self.root, 0, &mut out);
        out
    }

    pub(crate) fn map<M: Copy + PartialEq>(self, f: impl Fn(NodeId) -> M) -> MDTree<M> {
        let nodes = self
            .nodes
            .into_iter()
            .map(|node| MDNode {
                kind: match node.kind {
                    ModuleKind::Prime => ModuleKind::Prime,
                    ModuleKind::Series => ModuleKind::Series,
                    ModuleKind::Parallel => ModuleKind::Parallel,
                    ModuleKind::Node(v) => ModuleKind::Node(f(v)),
                },
                children: node.children,
            })
            .collect();
        MDTree { nodes, root: self.root }
    }
}

impl MDTree<u32> {
    /// Render the tree as JSON.
    ///
    /// Inner nodes become `{"type":"SERIES","children":[...]}` objects
    /// (likewise `PARALLEL` and `PRIME`), leaves become
    /// `{"type":"NORMAL","vertex":k}`.
    pub fn to_json(&self) -> String {
        fn walk(tree: &MDTree<u32>, module: ModuleIndex, out: &mut String) {
            match &tree.nodes[module.index()].kind {
                ModuleKind::Node(v) => {
                    out.push_str(&format!("{{\"type\":\"NORMAL\",\"vertex\":{v}}}"));
                }
                kind => {
                    let name = match kind {
                        ModuleKind::Prime => "PRIME",
                        ModuleKind::Series => "SERIES",
                        ModuleKind::Parallel => "PARALLEL",
                        ModuleKind::Node(_) => unreachable!(),
                    };
                    out.push_str(&format!("{{\"type\":\"{name}\",\"children\":["));
                    for (i, child) in tree.children(module).enumerate() {
                        if i > 0 {
                            out.push(',');
                        }
                        walk(tree, child, out);
                    }
                    out.push_str("]}");
                }
            }
        }
        let mut out = String::new();
        walk(self, self.root, &mut out);
        out
    }
}

/// A graph does not contain any nodes or edges.
#[derive(Error, Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[error("graph does not contain any nodes or edges")]
pub struct NullGraphError;
