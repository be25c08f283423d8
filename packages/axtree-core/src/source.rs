use crate::ids::NodeId;
use crate::node_data::NodeData;
use crate::tree::Tree;
use crate::tree_data::TreeData;

/// A tree the [`TreeSerializer`](crate::TreeSerializer) can read from.
///
/// Node handles are cheap clones owned by the source; the serializer only
/// ever keys its own state by [`NodeId`]. Structural changes are detected
/// by diffing; a host that changes other node data must report it through
/// [`TreeSerializer::invalidate_subtree`](crate::TreeSerializer::invalidate_subtree).
pub trait TreeSource {
    type Node: Clone;

    fn root(&self) -> Option<Self::Node>;
    fn id(&self, node: &Self::Node) -> NodeId;
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;
    fn is_ignored(&self, node: &Self::Node) -> bool;

    fn is_valid(&self, node: &Self::Node) -> bool {
        self.id(node).is_valid()
    }

    /// Full data for `node`. The serializer overwrites `child_ids`.
    fn serialize_node(&self, node: &Self::Node) -> NodeData;

    fn tree_data(&self) -> Option<TreeData>;

    /// Called for every id the serializer drops from its client model.
    fn on_node_cleared(&self, _id: NodeId) {}
}

impl TreeSource for Tree {
    type Node = NodeId;

    fn root(&self) -> Option<NodeId> {
        self.root_id()
    }

    fn id(&self, node: &NodeId) -> NodeId {
        *node
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.node(*node)?.parent().map(|parent| parent.id())
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.node(*node)
            .map(|node| node.child_ids().to_vec())
            .unwrap_or_default()
    }

    fn is_ignored(&self, node: &NodeId) -> bool {
        self.node(*node).is_some_and(|node| node.is_ignored())
    }

    fn is_valid(&self, node: &NodeId) -> bool {
        self.contains(*node)
    }

    fn serialize_node(&self, node: &NodeId) -> NodeData {
        self.node(*node)
            .map(|node| node.data().clone())
            .unwrap_or_else(|| NodeData::new(*node, Default::default()))
    }

    fn tree_data(&self) -> Option<TreeData> {
        Some(self.data().clone())
    }
}
