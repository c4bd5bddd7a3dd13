//! Search nodes and the arena that links them.
//!
//! Nodes never own their parent. Every node a search keeps lives in a
//! [`SearchTree`], addressed by a [`NodeId`], and records its parent's id.

use std::hash::{Hash, Hasher};

use indexmap::map::Entry;

use crate::PuzzleState;

type IndexMap<K, V> = indexmap::IndexMap<K, V, fxhash::FxBuildHasher>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A board together with its path cost `g`, estimate `h` and parent link.
///
/// Identity is the board alone: two nodes reaching the same board through
/// different paths compare and hash equal.
#[derive(Debug, Clone)]
pub struct SearchNode {
    pub state: PuzzleState,
    pub g: u32,
    pub h: u32,
    pub parent: Option<NodeId>,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl Eq for SearchNode {}

impl Hash for SearchNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.state.hash(state);
    }
}

impl SearchNode {
    pub fn new(state: PuzzleState) -> Self {
        Self {
            state,
            g: 0,
            h: 0,
            parent: None,
        }
    }

    pub fn f(&self) -> u32 {
        self.g + self.h
    }

    /// Fresh nodes for every board one slide away. Costs and parent are left for
    /// the engine to fill in.
    pub fn successors(&self) -> impl Iterator<Item = SearchNode> + '_ {
        self.state.successors().map(SearchNode::new)
    }
}

#[derive(Debug, Clone, Copy)]
struct Links {
    g: u32,
    h: u32,
    parent: Option<NodeId>,
}

/// Arena of search nodes keyed by board.
///
/// Ids are insertion indices and stay stable for the life of the tree, so the
/// tree doubles as a FIFO queue for breadth-first search.
#[derive(Debug, Clone, Default)]
pub struct SearchTree {
    nodes: IndexMap<PuzzleState, Links>,
}

impl SearchTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds `node` unless its board is already present. Returns the id holding the
    /// board and whether `node` was the one inserted.
    pub fn insert(&mut self, node: SearchNode) -> (NodeId, bool) {
        let links = Links {
            g: node.g,
            h: node.h,
            parent: node.parent,
        };
        match self.nodes.entry(node.state) {
            Entry::Occupied(entry) => (NodeId(entry.index()), false),
            Entry::Vacant(entry) => {
                let id = NodeId(entry.index());
                entry.insert(links);
                (id, true)
            }
        }
    }

    pub fn find(&self, state: &PuzzleState) -> Option<NodeId> {
        self.nodes.get_index_of(state).map(NodeId)
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        let (state, links) = self.nodes.get_index(id.0)?;
        Some(NodeRef {
            tree: self,
            id,
            state,
            links: *links,
        })
    }

    /// Moves a node under a cheaper parent. Cost and parent only ever change together.
    pub(crate) fn relink(&mut self, id: NodeId, g: u32, parent: NodeId) {
        if let Some((_, links)) = self.nodes.get_index_mut(id.0) {
            links.g = g;
            links.parent = Some(parent);
        }
    }

    /// Ids from the root down to `id`, walking parent links without recursion.
    pub fn genealogy(&self, id: NodeId) -> Vec<NodeId> {
        let mut ids = std::iter::successors(self.get(id), NodeRef::parent)
            .map(|node| node.id)
            .collect::<Vec<_>>();
        ids.reverse();
        ids
    }

    /// Builds a chain from nodes whose parents are their predecessors' positions.
    pub(crate) fn from_path(path: Vec<SearchNode>) -> (Self, Option<NodeId>) {
        let mut tree = Self::new();
        let mut last = None;
        for node in path {
            let (id, _) = tree.insert(node);
            last = Some(id);
        }
        (tree, last)
    }
}

/// A node borrowed out of its [`SearchTree`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a SearchTree,
    id: NodeId,
    state: &'a PuzzleState,
    links: Links,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn state(&self) -> &'a PuzzleState {
        self.state
    }

    pub fn g(&self) -> u32 {
        self.links.g
    }

    pub fn h(&self) -> u32 {
        self.links.h
    }

    pub fn f(&self) -> u32 {
        self.links.g + self.links.h
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.tree.get(self.links.parent?)
    }

    pub fn successors(&self) -> impl Iterator<Item = SearchNode> + 'a {
        self.state.successors().map(SearchNode::new)
    }

    pub fn to_node(&self) -> SearchNode {
        SearchNode {
            state: self.state.clone(),
            g: self.links.g,
            h: self.links.h,
            parent: self.links.parent,
        }
    }
}
