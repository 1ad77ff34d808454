//! Arena that owns the nodes of a generation graph.

use std::collections::HashSet;
use std::ops::Deref;

use slab::Slab;
use tracing::trace;

use crate::{GraphError, Node, NodeError, NodeId, Value};

/// Graph is an arena owning [`Node`]s addressed by [`NodeId`] handles.
///
/// Edges between nodes are handles into the arena, so cyclic structures need no
/// reference counting. Every edge in a graph points at a live node:
/// - edges are only added through [`Graph::attach`] or [`Graph::insert`], which
///   check the target handle
/// - removing a node detaches it from every remaining node
/// - each slot carries a generation, so a handle to a removed node stays dead
///   even after its slot is reused
///
/// # Examples
///
/// ```
/// use pattern_kernel::Graph;
///
/// let mut graph = Graph::new();
/// let group = graph.add("group")?;
/// let literal = graph.add("x")?;
/// graph.attach(group, literal)?.attach(literal, group)?;
///
/// let reached: Vec<_> = graph.reachable(group)?.collect();
/// assert_eq!(reached, vec![group, literal]);
/// # Ok::<(), pattern_kernel::GraphError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Graph {
    slots: Slab<Slot>,
    /// Generation the next node stored at each index receives.
    generations: Vec<u32>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Node,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Default::default()
    }

    /// Create an empty graph with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Slab::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
        }
    }

    /// Take ownership of a node and return its handle.
    ///
    /// Fails with [`GraphError::NodeNotFound`] if the node already has a neighbor
    /// that is not live in this graph.
    pub fn insert(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if let Some(dangling) = node.neighbors().find(|n| !self.contains(*n)) {
            return Err(GraphError::NodeNotFound(dangling));
        }
        Ok(self.store(node))
    }

    /// Create a node with the given label and return its handle.
    pub fn add(&mut self, label: impl Into<Value>) -> Result<NodeId, GraphError> {
        Ok(self.store(Node::with_label(label)?))
    }

    fn store(&mut self, node: Node) -> NodeId {
        let index = self.slots.vacant_key();
        if self.generations.len() <= index {
            self.generations.resize(index + 1, 0);
        }
        let generation = self.generations[index];
        self.slots.insert(Slot { generation, node });
        NodeId::new(index, generation)
    }

    /// Remove a node, detaching it from every remaining node.
    ///
    /// Returns `None` if the handle is not live.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        self.get(id)?;
        let Slot { generation, node } = self.slots.remove(id.index());
        self.generations[id.index()] = generation.wrapping_add(1);
        for (_, slot) in self.slots.iter_mut() {
            slot.node.detach(id);
        }
        trace!(%id, "removed node from graph");
        Some(node)
    }

    /// Get a node.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .map(|slot| &slot.node)
    }

    /// Get a mutable view of a node's label and attributes.
    pub fn get_mut(&mut self, id: NodeId) -> Option<NodeMut<'_>> {
        self.slot_mut(id).map(|node| NodeMut { node })
    }

    /// Get a node, failing with [`GraphError::NodeNotFound`] if the handle is not live.
    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.get(id).ok_or(GraphError::NodeNotFound(id))
    }

    /// Get a mutable view of a node, failing with [`GraphError::NodeNotFound`] if the
    /// handle is not live.
    pub fn node_mut(&mut self, id: NodeId) -> Result<NodeMut<'_>, GraphError> {
        self.get_mut(id).ok_or(GraphError::NodeNotFound(id))
    }

    /// Returns true if the handle names a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Attach `to` as a neighbor of `from`. Both handles must be live.
    pub fn attach(&mut self, from: NodeId, to: NodeId) -> Result<&mut Self, GraphError> {
        self.ensure(to)?;
        self.slot_mut(from)
            .ok_or(GraphError::NodeNotFound(from))?
            .attach(to);
        Ok(self)
    }

    /// Detach `to` from the neighbors of `from`.
    pub fn detach(&mut self, from: NodeId, to: NodeId) -> Result<&mut Self, GraphError> {
        self.slot_mut(from)
            .ok_or(GraphError::NodeNotFound(from))?
            .detach(to);
        Ok(self)
    }

    /// Returns true if `to` is a neighbor of `from`.
    pub fn contains_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.get(from).is_some_and(|node| node.contains(to))
    }

    /// Call `f` once per neighbor of `id` with the neighbor's handle and node.
    ///
    /// Every neighbor is resolved before `f` first runs, so on error `f` has not
    /// been called at all.
    pub fn map_neighbors(
        &self,
        id: NodeId,
        mut f: impl FnMut(NodeId, &Node),
    ) -> Result<(), GraphError> {
        let neighbors = self
            .node(id)?
            .neighbors()
            .map(|n| self.node(n).map(|node| (n, node)))
            .collect::<Result<Vec<_>, _>>()?;
        for (n, node) in neighbors {
            f(n, node);
        }
        Ok(())
    }

    /// Depth-first walk from `start`, yielding each reachable node once.
    ///
    /// Neighbors are visited in attach order. Cycles are followed at most once.
    pub fn reachable(&self, start: NodeId) -> Result<Reachable<'_>, GraphError> {
        self.ensure(start)?;
        Ok(Reachable {
            graph: self,
            stack: vec![start],
            visited: HashSet::new(),
        })
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over the handles of all live nodes.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().map(|(id, _)| id)
    }

    /// Iterate over all live nodes with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.slots
            .iter()
            .map(|(index, slot)| (NodeId::new(index, slot.generation), &slot.node))
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .map(|slot| &mut slot.node)
    }

    fn ensure(&self, id: NodeId) -> Result<(), GraphError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(GraphError::NodeNotFound(id))
        }
    }
}

/// Mutable view of a node inside a [`Graph`], limited to its label and attributes.
///
/// Edges are changed through [`Graph::attach`] and [`Graph::detach`]. Reads go
/// through `Deref` to [`Node`].
#[derive(Debug)]
pub struct NodeMut<'a> {
    node: &'a mut Node,
}

impl NodeMut<'_> {
    /// Replace the label. See [`Node::set_label`].
    pub fn set_label(&mut self, label: impl Into<Value>) -> Result<(), NodeError> {
        self.node.set_label(label)
    }

    /// Set an attribute, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.node.set(key, value)
    }

    /// Remove an attribute, returning it.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.node.remove(key)
    }
}

impl Deref for NodeMut<'_> {
    type Target = Node;

    fn deref(&self) -> &Node {
        self.node
    }
}

/// Iterator returned by [`Graph::reachable`].
#[derive(Debug)]
pub struct Reachable<'a> {
    graph: &'a Graph,
    stack: Vec<NodeId>,
    visited: HashSet<NodeId>,
}

impl Iterator for Reachable<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            if !self.visited.insert(id) {
                continue;
            }
            let Some(node) = self.graph.get(id) else {
                continue;
            };
            let pending: Vec<_> = node
                .neighbors()
                .filter(|n| !self.visited.contains(n))
                .collect();
            self.stack.extend(pending.into_iter().rev());
            return Some(id);
        }
        None
    }
}
