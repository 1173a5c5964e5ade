//! Tree data structures for the answer search
//!
//! This module defines the arena-backed search tree. Nodes are addressed by
//! stable [`NodeId`] indices; each node stores its parent's index and an
//! insertion-ordered list of child indices, so parent back-references never
//! involve shared ownership.

use std::fmt;

/// Maximum number of children a node may ever hold
///
/// Expansion fans out into at most this many candidate answers, and a node
/// that already holds this many children is considered fully expanded.
pub const MAX_CHILDREN: usize = 3;

/// Stable handle to a node inside a [`SearchTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node in the answer search tree
///
/// Each node holds one candidate answer and the statistics accumulated for
/// it: how many backpropagation passes have touched it and the score sum
/// contributed by its own evaluations.
#[derive(Debug)]
pub struct Node {
    /// The candidate answer text at this node
    pub response: String,

    /// Number of backpropagation passes through this node
    pub visits: u64,

    /// Sum of evaluation scores applied directly to this node
    pub total_score: f64,

    /// Parent index (None for the root)
    pub parent: Option<NodeId>,

    /// Child indices in creation order, never more than [`MAX_CHILDREN`]
    pub children: Vec<NodeId>,
}

impl Node {
    fn new(response: String, parent: Option<NodeId>) -> Self {
        Node {
            response,
            visits: 0,
            total_score: 0.0,
            parent,
            children: Vec::new(),
        }
    }

    /// Returns true if this node holds the maximum number of children
    pub fn is_fully_expanded(&self) -> bool {
        self.children.len() == MAX_CHILDREN
    }

    /// Returns true if this node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Index of the root node in every tree
pub const ROOT: NodeId = NodeId(0);

/// Arena-backed search tree owned by the coordinator
///
/// The tree is created once per run with a seed answer at the root and only
/// ever grows: expansion appends nodes, nothing removes them.
pub struct SearchTree {
    nodes: Vec<Node>,
}

impl SearchTree {
    /// Creates a tree holding only the root node
    ///
    /// The root starts with one visit: the seed answer counts as its own
    /// initial evaluation, which is what allows the very first iteration to
    /// expand it.
    pub fn new(seed_response: impl Into<String>) -> Self {
        let mut root = Node::new(seed_response.into(), None);
        root.visits = 1;
        SearchTree { nodes: vec![root] }
    }

    /// Returns a reference to the node behind `id`
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns a mutable reference to the node behind `id`
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Number of nodes currently in the tree, the root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Appends a child node under `parent` and returns its id
    ///
    /// Returns `None` when the parent already holds [`MAX_CHILDREN`]
    /// children; the cap is a structural invariant, not a soft limit.
    pub fn add_child(&mut self, parent: NodeId, response: impl Into<String>) -> Option<NodeId> {
        if self.node(parent).is_fully_expanded() {
            return None;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(response.into(), Some(parent)));
        self.node_mut(parent).children.push(id);
        Some(id)
    }

    /// Mean evaluation score of a node, 0 when it was never visited
    ///
    /// Only scores applied directly to the node count. Ancestors accumulate
    /// visits during backpropagation but not their descendants' scores, so
    /// the mean of an interior node reflects just its own evaluations.
    pub fn mean_score(&self, id: NodeId) -> f64 {
        let node = self.node(id);
        if node.visits == 0 {
            return 0.0;
        }
        node.total_score / node.visits as f64
    }

    /// Depth of a node below the root (root = 0)
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Walks from the root to a leaf, greedily following the child with the
    /// highest mean score at each level
    ///
    /// This is the path reported at the end of a run. It ranks children by
    /// plain mean, not UCT: exploration pressure has no place in the final
    /// answer.
    pub fn best_path(&self) -> Vec<NodeId> {
        let mut path = vec![ROOT];
        let mut current = ROOT;

        while !self.node(current).is_leaf() {
            let mut best = self.node(current).children[0];
            let mut best_mean = self.mean_score(best);

            for &child in &self.node(current).children[1..] {
                let mean = self.mean_score(child);
                if mean > best_mean {
                    best = child;
                    best_mean = mean;
                }
            }

            path.push(best);
            current = best;
        }

        path
    }
}
