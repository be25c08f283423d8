use crate::ids::NodeId;
use crate::node_data::NodeData;
use crate::tree::Tree;
use crate::tree_data::TreeData;

/// Kind of structural change reported in [`TreeObserver::on_atomic_update_finished`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ChangeType {
    /// Created beneath another created node.
    NodeCreated,
    /// Root of a newly created subtree.
    SubtreeCreated,
    NodeChanged,
    /// Moved to a new parent with a rewritten child list.
    NodeReparented,
    /// Moved to a new parent together with its untouched descendants.
    SubtreeReparented,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Change {
    pub node: NodeId,
    pub kind: ChangeType,
}

/// Callbacks fired by [`Tree::unserialize`].
///
/// The `will_*` callbacks run before the tree is mutated and see the old
/// state. Everything else runs after the update has been applied, in this
/// order: created, changed, subtree reparented, node reparented, deleted,
/// then one `on_atomic_update_finished` batch. Cached derived views must
/// not be queried from the `will_*` callbacks.
#[allow(unused_variables)]
pub trait TreeObserver {
    fn on_tree_data_changed(&mut self, tree: &Tree, old: &TreeData, new: &TreeData) {}
    fn on_node_data_will_change(&mut self, tree: &Tree, old: &NodeData, new: &NodeData) {}
    fn on_subtree_will_be_deleted(&mut self, tree: &Tree, node: NodeId) {}
    fn on_node_will_be_deleted(&mut self, tree: &Tree, node: NodeId) {}
    fn on_node_created(&mut self, tree: &Tree, node: NodeId) {}
    fn on_node_changed(&mut self, tree: &Tree, node: NodeId) {}
    fn on_subtree_reparented(&mut self, tree: &Tree, node: NodeId) {}
    fn on_node_reparented(&mut self, tree: &Tree, node: NodeId) {}
    fn on_node_deleted(&mut self, tree: &Tree, node: NodeId) {}
    fn on_atomic_update_finished(&mut self, tree: &Tree, root_changed: bool, changes: &[Change]) {}
}
