//! Error types for the engine, nodes and the node arena.

use thiserror::Error;

use crate::NodeId;

/// Errors returned by [`Generator`](crate::Generator) draws and engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RandomError {
    /// The effective upper bound is below the effective lower bound.
    #[error("invalid range: max {max} is less than min {min}")]
    InvalidRange {
        /// Effective lower bound of the rejected draw.
        min: i64,
        /// Effective upper bound of the rejected draw.
        max: i64,
    },
}

/// Errors returned by [`Node`](crate::Node) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// A composite value (list or map) was offered as a label.
    ///
    /// The operation is rejected and the previous label is kept.
    #[error("label must be a scalar or null, got a {0}")]
    InvalidLabel(&'static str),

    /// The attribute key is not present on the node.
    #[error("attribute not found: {0}")]
    KeyNotFound(String),
}

/// Errors returned by checked [`Graph`](crate::Graph) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The handle does not name a live node in this graph.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// A node operation failed.
    #[error(transparent)]
    Node(#[from] NodeError),
}
