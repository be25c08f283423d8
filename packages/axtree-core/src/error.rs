use thiserror::Error;

use crate::ids::{join_ids, NodeId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Node {0} is in the update more than once")]
    DuplicateNodeInUpdate(NodeId),
    #[error("Node {node} has duplicate child id {child}")]
    DuplicateChildId { node: NodeId, child: NodeId },
    #[error("Node {child} is listed as a child of both {first} and {second}")]
    MultipleParents {
        child: NodeId,
        first: NodeId,
        second: NodeId,
    },
    #[error("Node {node} is not marked for destruction, would be reparented to {new_parent}")]
    NotMarkedForDestruction { node: NodeId, new_parent: NodeId },
    #[error("Node {0} is the root and cannot be listed as a child")]
    RootListedAsChild(NodeId),
    #[error("Node {0} is not in the tree and not in the update")]
    MissingNodeData(NodeId),
    #[error("Nodes left pending by the update: {}", join_ids(.0))]
    PendingNodes(Vec<NodeId>),
    #[error("Update has no data for root {0} and the tree is empty")]
    MissingRoot(NodeId),
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
    #[error("serializer: source has no root")]
    SourceHasNoRoot,
    #[error("serializer: illegal reparenting of node {node} to {new_parent}")]
    IllegalReparenting { node: NodeId, new_parent: NodeId },
    #[error("serializer: illegal duplicate id {0}")]
    DuplicateSourceId(NodeId),
}

impl Error {
    /// Whether the error originates from the diffing serializer rather than
    /// from applying an update.
    pub fn is_serializer_anomaly(&self) -> bool {
        matches!(
            self,
            Error::SourceHasNoRoot | Error::IllegalReparenting { .. } | Error::DuplicateSourceId(_)
        )
    }
}
