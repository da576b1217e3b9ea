//! Marking of the partitive forest.
//!
//! Every slice beyond the first contributes one label set: the vertices
//! that are adjacent to the slice from earlier in the frame. Marking
//! restructures the already-built subtrees so that each label set induces
//! a union of subtrees, splitting degenerate nodes that are only partially
//! covered. Finish-marking and extraction then turn the dead and broken
//! nodes into correctly ordered root sequences for cluster construction.

use std::collections::{HashSet, VecDeque};

use super::{Arena, Flag, Label, NodeId, Tag, TreeKind};

/// Assign connected-component tags to the roots of one slice.
///
/// A root that cannot be split by later marking passes is atomic and keeps
/// a tag of its own: a prime root always, a parallel root in the pivot
/// slice, a series root elsewhere. Any other root transfers the tag to its
/// children, one each, and carries none itself.
pub(super) fn set_cc_tags(arena: &mut Arena, roots: &[NodeId], pivot_slice: bool) {
    let mut i = 0;
    for &root in roots {
        let kind = arena.node(root).kind;
        let atomic = kind == TreeKind::Prime
            || (pivot_slice && kind == TreeKind::Parallel)
            || (!pivot_slice && kind == TreeKind::Series);
        if atomic {
            arena.node_mut(root).tag = Tag::Cc(i);
        } else {
            arena.node_mut(root).tag = Tag::None;
            for c in 0..arena.node(root).children.len() {
                let child = arena.node(root).children[c];
                arena.node_mut(child).tag = Tag::Cc(i);
                i += 1;
            }
        }
    }
}

/// Mark the forest with one label set.
///
/// The leaves named in `vertices` become full; a node all of whose
/// children are full becomes full itself. A node with both full and
/// non-full children is marked: if degenerate, its children are regrouped
/// into a full aggregate and a non-full aggregate of the same kind, and
/// the node is labelled dead with its full children flagged.
pub(super) fn mark_one_set(arena: &mut Arena, vertices: &[u32]) {
    let mut marked: HashSet<NodeId> = HashSet::new();
    let mut full: HashSet<NodeId> = HashSet::new();
    let mut explore: VecDeque<NodeId> = vertices.iter().filter_map(|&v| arena.leaf(v)).collect();

    while let Some(node) = explore.pop_front() {
        full.insert(node);
        if arena.node(node).label == Label::Empty {
            arena.node_mut(node).label = Label::Homogeneous;
        }

        let parent = arena.node(node).parent;
        if !parent.is_none() {
            marked.insert(parent);
            if arena.node(parent).children.iter().all(|child| full.contains(child)) {
                marked.remove(&parent);
                explore.push_back(parent);
            }
        }
    }

    for &node in &marked {
        if arena.node(node).kind.is_degenerate() {
            let kind = arena.node(node).kind;
            let (in_full, not_in_full): (Vec<NodeId>, Vec<NodeId>) =
                arena.node(node).children.clone().into_iter().partition(|child| full.contains(child));

            if in_full.len() >= 2 || not_in_full.len() >= 2 {
                arena.node_mut(node).children.clear();

                if in_full.len() >= 2 {
                    let aggregate = arena.new_node(kind, Label::Homogeneous, Flag::Star);
                    for child in in_full {
                        arena.add_child(aggregate, child);
                    }
                    arena.add_child(node, aggregate);
                } else if in_full.len() == 1 {
                    arena.add_child(node, in_full[0]);
                }

                if not_in_full.len() >= 2 {
                    let aggregate = arena.new_node(kind, Label::Empty, Flag::O);
                    for child in not_in_full {
                        arena.add_child(aggregate, child);
                    }
                    arena.add_child(node, aggregate);
                } else if not_in_full.len() == 1 {
                    arena.add_child(node, not_in_full[0]);
                }
            }
        }

        if arena.node(node).label != Label::Dead {
            arena.node_mut(node).label = Label::Dead;
            for c in 0..arena.node(node).children.len() {
                let child = arena.node(node).children[c];
                if full.contains(&child) {
                    arena.node_mut(child).flag = Flag::Star;
                }
            }
        }
    }
}

/// Postorder pass after all label sets of a frame have been marked.
///
/// A dead or broken node promotes a live parent to broken. A broken
/// degenerate node with more than one untouched child additionally groups
/// those children into a fresh sibling of its own kind, appended behind
/// the damaged children.
pub(super) fn finish_marking(arena: &mut Arena, node: NodeId) {
    let mut homogeneous_or_empty = 0;
    for c in 0..arena.node(node).children.len() {
        let child = arena.node(node).children[c];
        finish_marking(arena, child);
        if arena.node(child).label.is_homogeneous_or_empty() {
            homogeneous_or_empty += 1;
        }
    }

    if arena.node(node).label.is_dead_or_broken() {
        let parent = arena.node(node).parent;
        if !parent.is_none() && arena.node(parent).label != Label::Dead {
            arena.node_mut(parent).label = Label::Broken;
        }

        if arena.node(node).label == Label::Broken
            && arena.node(node).kind.is_degenerate()
            && homogeneous_or_empty > 1
        {
            let kind = arena.node(node).kind;
            let aggregate = arena.new_node(kind, Label::Empty, Flag::O);
            let (untouched, damaged): (Vec<NodeId>, Vec<NodeId>) = arena
                .node(node)
                .children
                .clone()
                .into_iter()
                .partition(|&child| arena.node(child).label.is_homogeneous_or_empty());
            for child in untouched {
                arena.add_child(aggregate, child);
            }
            arena.node_mut(node).children = damaged;
            arena.add_child(node, aggregate);
        }
    }
}

fn sort_dead_rec(arena: &mut Arena, node: NodeId, pivot_slice: bool) {
    if arena.node(node).label.is_dead_or_broken() {
        for c in 0..arena.node(node).children.len() {
            let child = arena.node(node).children[c];
            sort_dead_rec(arena, child, pivot_slice);
        }
    }
    if arena.node(node).label == Label::Dead {
        let (front, back): (Vec<NodeId>, Vec<NodeId>) = arena
            .node(node)
            .children
            .clone()
            .into_iter()
            .partition(|&child| pivot_slice != (arena.node(child).flag == Flag::O));
        let children = &mut arena.node_mut(node).children;
        children.clear();
        children.extend(front);
        children.extend(back);
    }
}

fn sort_broken_rec(arena: &mut Arena, node: NodeId, pivot_slice: bool) {
    if arena.node(node).label.is_dead_or_broken() {
        for c in 0..arena.node(node).children.len() {
            let child = arena.node(node).children[c];
            sort_broken_rec(arena, child, pivot_slice);
        }
    }
    if arena.node(node).label == Label::Broken {
        let (front, back): (Vec<NodeId>, Vec<NodeId>) = arena
            .node(node)
            .children
            .clone()
            .into_iter()
            .partition(|&child| pivot_slice != arena.node(child).label.is_homogeneous_or_empty());
        let children = &mut arena.node_mut(node).children;
        children.clear();
        children.extend(front);
        children.extend(back);
    }
}

/// Order the children of dead and broken nodes (full-flagged first in the
/// pivot slice, last elsewhere), then replace every dead or broken root by
/// its children, handing the root's component tag down.
pub(super) fn extract_and_sort(arena: &mut Arena, roots: &mut Vec<NodeId>, pivot_slice: bool) {
    for &root in roots.iter() {
        sort_dead_rec(arena, root, pivot_slice);
    }
    for &root in roots.iter() {
        sort_broken_rec(arena, root, pivot_slice);
    }

    let mut new_roots = Vec::with_capacity(roots.len());
    for &root in roots.iter() {
        if arena.node(root).label.is_dead_or_broken() {
            let cc = arena.node(root).tag;
            for c in 0..arena.node(root).children.len() {
                let child = arena.node(root).children[c];
                if let Tag::Cc(_) = cc {
                    arena.node_mut(child).tag = cc;
                }
                arena.node_mut(child).parent = NodeId::NONE;
                new_roots.push(child);
            }
        } else {
            new_roots.push(root);
        }
    }
    *roots = new_roots;
}
