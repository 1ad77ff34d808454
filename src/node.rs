use std::collections::hash_map;
use std::collections::HashMap;
use std::fmt;
use std::iter::Copied;
use std::slice;

use crate::{NodeError, Value};

/// Label given to nodes created with [`Node::new`].
pub const DEFAULT_LABEL: &str = "node";

/// NodeId is a handle to a node owned by a [`Graph`](crate::Graph).
///
/// A handle is a slot index plus the generation of that slot. When a node is removed
/// its slot's generation advances, so handles to the removed node never resolve to
/// a node that later reuses the slot.
///
/// Neighbor relations store handles rather than references, so two nodes are the
/// same neighbor exactly when their handles are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    /// Create a handle from a slot index and generation.
    pub const fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the owning graph.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Generation of the slot this handle was issued for.
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({}v{})", self.index, self.generation)
    }
}

/// Node is a labelled vertex with an attribute bag and a set of neighbor handles.
///
/// Edges are non-owning: a node does not keep its neighbors alive. Lifetime is
/// managed by the [`Graph`](crate::Graph) arena, which lets the neighbor relation
/// contain cycles, including self-loops.
///
/// A node is not synchronized. Share it across threads behind a lock.
///
/// Equality compares labels, attributes and the neighbor *set*: attach order is
/// ignored.
#[derive(Debug, Clone)]
pub struct Node {
    /// `Value::Null` means the label is absent.
    label: Value,
    attributes: HashMap<String, Value>,
    /// Insertion ordered, no duplicates.
    neighbors: Vec<NodeId>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        // Neighbors hold no duplicates, so equal length plus inclusion is set equality.
        self.label == other.label
            && self.attributes == other.attributes
            && self.neighbors.len() == other.neighbors.len()
            && self.neighbors.iter().all(|n| other.contains(*n))
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl Node {
    /// Create an empty node labelled [`DEFAULT_LABEL`].
    pub fn new() -> Self {
        Self {
            label: Value::from(DEFAULT_LABEL),
            attributes: HashMap::new(),
            neighbors: Vec::new(),
        }
    }

    /// Create an empty node with the given label.
    ///
    /// Fails with [`NodeError::InvalidLabel`] if the label is a list or a map.
    pub fn with_label(label: impl Into<Value>) -> Result<Self, NodeError> {
        let mut node = Self::new();
        node.set_label(label)?;
        Ok(node)
    }

    /// The label, or `None` if it is absent.
    pub fn label(&self) -> Option<&Value> {
        (!self.label.is_null()).then_some(&self.label)
    }

    /// Replace the label. `Value::Null` clears it.
    ///
    /// A composite value is rejected and the previous label is kept.
    pub fn set_label(&mut self, label: impl Into<Value>) -> Result<(), NodeError> {
        let label = label.into();
        if !label.is_scalar() {
            return Err(NodeError::InvalidLabel(label.kind()));
        }
        self.label = label;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Neighbors

    /// Add a neighbor. Attaching a node that is already a neighbor does nothing.
    pub fn attach(&mut self, other: NodeId) -> &mut Self {
        if !self.contains(other) {
            self.neighbors.push(other);
        }
        self
    }

    /// Remove a neighbor if present.
    pub fn detach(&mut self, other: NodeId) -> &mut Self {
        self.neighbors.retain(|n| *n != other);
        self
    }

    /// Returns true if `other` is a neighbor.
    pub fn contains(&self, other: NodeId) -> bool {
        self.neighbors.contains(&other)
    }

    /// Number of distinct neighbors.
    pub fn count(&self) -> usize {
        self.neighbors.len()
    }

    /// Call `f` once per neighbor, in attach order.
    pub fn map(&self, f: impl FnMut(NodeId)) {
        self.neighbors.iter().copied().for_each(f);
    }

    /// Iterate over the neighbors in attach order.
    pub fn neighbors(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        self.neighbors.iter().copied()
    }

    /// Snapshot the neighbors into a restartable [`Traversal`].
    ///
    /// The traversal owns its snapshot, so the node may be mutated while it is in use
    /// without affecting it.
    pub fn traverse(&self) -> Traversal {
        Traversal::new(self.neighbors.clone())
    }

    // ------------------------------------------------------------------
    // Attributes
    //
    // Missing keys are reported as `None`. `require` is the signalling variant.

    /// Get an attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Get an attribute, failing with [`NodeError::KeyNotFound`] if it is missing.
    pub fn require(&self, key: &str) -> Result<&Value, NodeError> {
        self.attributes
            .get(key)
            .ok_or_else(|| NodeError::KeyNotFound(key.to_string()))
    }

    /// Set an attribute, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.attributes.insert(key.into(), value.into())
    }

    /// Returns true if the attribute is present.
    pub fn exists(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Remove an attribute, returning it.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    /// Iterate over the attributes in no particular order.
    pub fn attributes(&self) -> hash_map::Iter<'_, String, Value> {
        self.attributes.iter()
    }
}

impl<'a> IntoIterator for &'a Node {
    type Item = NodeId;
    type IntoIter = Copied<slice::Iter<'a, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.neighbors.iter().copied()
    }
}

/// Position of a [`Traversal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    /// Nothing has been consumed yet.
    NotStarted,
    /// Some neighbors have been consumed and more remain.
    InProgress,
    /// Every neighbor has been consumed.
    Exhausted,
}

/// Traversal is a restartable, finite pass over a snapshot of a node's neighbors.
///
/// # Examples
///
/// ```
/// use pattern_kernel::{Node, NodeId};
///
/// let mut node = Node::new();
/// let (a, b) = (NodeId::new(1, 0), NodeId::new(2, 0));
/// node.attach(a).attach(b);
///
/// let mut traversal = node.traverse();
/// assert_eq!(traversal.current(), Some(a));
/// assert_eq!(traversal.by_ref().collect::<Vec<_>>(), vec![a, b]);
/// assert!(!traversal.valid());
///
/// traversal.rewind();
/// assert_eq!(traversal.key(), Some(0));
/// ```
#[derive(Debug, Clone)]
pub struct Traversal {
    items: Vec<NodeId>,
    position: usize,
}

impl Traversal {
    fn new(items: Vec<NodeId>) -> Self {
        Self { items, position: 0 }
    }

    /// Restart from the first neighbor.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Returns false once every neighbor has been consumed.
    pub fn valid(&self) -> bool {
        self.position < self.items.len()
    }

    /// The neighbor the next call to `next` will yield.
    pub fn current(&self) -> Option<NodeId> {
        self.items.get(self.position).copied()
    }

    /// Zero-based position of [`Traversal::current`], or `None` once exhausted.
    pub fn key(&self) -> Option<usize> {
        self.valid().then_some(self.position)
    }

    /// Where the traversal is.
    pub fn state(&self) -> TraversalState {
        if !self.valid() {
            TraversalState::Exhausted
        } else if self.position == 0 {
            TraversalState::NotStarted
        } else {
            TraversalState::InProgress
        }
    }
}

impl Iterator for Traversal {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let item = self.current()?;
        self.position += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.items.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Traversal {}
