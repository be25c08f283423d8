//! Shared helpers for the accessibility tree test suites: an exhaustive
//! generator of small trees, compact fixture builders, and an observer that
//! records every callback it receives.

use std::cell::RefCell;
use std::rc::Rc;

use axtree_core::{
    Change, NodeData, NodeId, Role, State, Tree, TreeData, TreeObserver, TreeUpdate,
};

/// Enumerates every tree of 1..=`max_node_count` nodes.
///
/// A tree of `n` nodes is described by the parent of each non-root node,
/// chosen among the nodes before it, which gives `(n - 1)!` shapes. With
/// `permutations` enabled every shape is also produced under each of the
/// `n!` assignments of the ids `1..=n`.
#[derive(Clone, Debug)]
pub struct TreeGenerator {
    max_node_count: usize,
    permutations: bool,
}

impl TreeGenerator {
    pub fn new(max_node_count: usize, permutations: bool) -> Self {
        Self {
            max_node_count,
            permutations,
        }
    }

    pub fn unique_tree_count(&self) -> usize {
        (1..=self.max_node_count)
            .map(|n| self.trees_of_size(n))
            .sum()
    }

    /// Number of nodes in the tree at `tree_index`.
    pub fn node_count(&self, tree_index: usize) -> usize {
        self.locate(tree_index).0
    }

    /// Every subset of non-root nodes can be marked ignored.
    pub fn ignored_permutation_count(&self, tree_index: usize) -> usize {
        1 << (self.node_count(tree_index) - 1)
    }

    pub fn build_unique_tree_update(&self, tree_index: usize) -> TreeUpdate {
        self.build_unique_tree_update_with_ignored(tree_index, 0)
    }

    /// Bit `j` of `ignored_index` marks the node at position `j + 1`
    /// (0 being the root) ignored.
    pub fn build_unique_tree_update_with_ignored(
        &self,
        tree_index: usize,
        ignored_index: usize,
    ) -> TreeUpdate {
        let (n, shape, permutation) = self.locate(tree_index);
        let ids = permuted_ids(n, permutation);

        let mut parents = vec![0usize; n];
        let mut rest = shape;
        for (position, parent) in parents.iter_mut().enumerate().skip(1) {
            *parent = rest % position;
            rest /= position;
        }

        let mut nodes: Vec<NodeData> = ids
            .iter()
            .map(|id| NodeData::new(*id, Role::GenericContainer))
            .collect();
        for position in 1..n {
            let child = nodes[position].id;
            nodes[parents[position]].child_ids.push(child);
            if ignored_index & (1 << (position - 1)) != 0 {
                nodes[position].add_state(State::Ignored);
            }
        }

        let mut update = TreeUpdate::new(ids[0], nodes);
        update.tree_data = Some(TreeData {
            title: format!("generated tree {tree_index}"),
            ..TreeData::default()
        });
        update
    }

    pub fn build_unique_tree(&self, tree_index: usize) -> Tree {
        tree_from_update(&self.build_unique_tree_update(tree_index))
    }

    pub fn build_unique_tree_with_ignored(&self, tree_index: usize, ignored_index: usize) -> Tree {
        tree_from_update(&self.build_unique_tree_update_with_ignored(tree_index, ignored_index))
    }

    fn trees_of_size(&self, n: usize) -> usize {
        let shapes = factorial(n - 1);
        if self.permutations {
            shapes * factorial(n)
        } else {
            shapes
        }
    }

    /// `(node count, shape index, permutation index)` for a tree index.
    fn locate(&self, mut tree_index: usize) -> (usize, usize, usize) {
        for n in 1..=self.max_node_count {
            let count = self.trees_of_size(n);
            if tree_index < count {
                let shapes = factorial(n - 1);
                return (n, tree_index % shapes, tree_index / shapes);
            }
            tree_index -= count;
        }
        panic!("tree index out of range for {} nodes", self.max_node_count);
    }
}

fn factorial(n: usize) -> usize {
    (1..=n).product()
}

/// The `index`-th permutation of `1..=n` in lexicographic order.
fn permuted_ids(n: usize, mut index: usize) -> Vec<NodeId> {
    let mut pool: Vec<i32> = (1..=n as i32).collect();
    let mut ids = Vec::with_capacity(n);
    for remaining in (1..=n).rev() {
        let block = factorial(remaining - 1);
        ids.push(NodeId(pool.remove(index / block)));
        index %= block;
    }
    ids
}

pub fn tree_from_update(update: &TreeUpdate) -> Tree {
    Tree::from_update(update).unwrap_or_else(|err| panic!("fixture rejected: {err}\n{update}"))
}

/// A generic container with the given children.
pub fn node(id: i32, children: &[i32]) -> NodeData {
    NodeData::new(id, Role::GenericContainer).with_children(children.iter().copied())
}

pub fn node_with_role(id: i32, role: Role, children: &[i32]) -> NodeData {
    NodeData::new(id, role).with_children(children.iter().copied())
}

pub fn ignored(mut data: NodeData) -> NodeData {
    data.add_state(State::Ignored);
    data
}

/// Update rooted at the first node.
pub fn update_of(nodes: Vec<NodeData>) -> TreeUpdate {
    let root = nodes.first().map_or(NodeId::INVALID, |node| node.id);
    TreeUpdate::new(root, nodes)
}

pub fn tree_of(nodes: Vec<NodeData>) -> Tree {
    tree_from_update(&update_of(nodes))
}

/// Structure only: `(1 (2 3))` for a root 1 with children 2 and 3.
/// Ignored nodes are prefixed with `*`.
pub fn tree_to_string(tree: &Tree) -> String {
    let Some(root) = tree.root() else {
        return "()".to_string();
    };
    let mut out = String::from("(");
    // (node, closing parens to emit after it)
    let mut stack = vec![(root, 0usize, false)];
    while let Some((current, closing, needs_space)) = stack.pop() {
        if needs_space {
            out.push(' ');
        }
        if current.is_ignored() {
            out.push('*');
        }
        out.push_str(&current.id().to_string());
        let children: Vec<_> = current.children().collect();
        if children.is_empty() {
            out.push_str(&")".repeat(closing));
            continue;
        }
        out.push_str(" (");
        let last = children.len() - 1;
        for (index, child) in children.into_iter().enumerate().rev() {
            let child_closing = if index == last { closing + 1 } else { 0 };
            stack.push((child, child_closing, index != 0));
        }
    }
    out.push(')');
    out
}

/// One recorded observer callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    TreeDataChanged,
    NodeDataWillChange(NodeId),
    SubtreeWillBeDeleted(NodeId),
    NodeWillBeDeleted(NodeId),
    NodeCreated(NodeId),
    NodeChanged(NodeId),
    SubtreeReparented(NodeId),
    NodeReparented(NodeId),
    NodeDeleted(NodeId),
    AtomicUpdateFinished {
        root_changed: bool,
        changes: Vec<Change>,
    },
}

#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub events: Vec<Event>,
}

impl RecordingObserver {
    pub fn shared() -> Rc<RefCell<RecordingObserver>> {
        Rc::new(RefCell::new(RecordingObserver::default()))
    }

    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

impl TreeObserver for RecordingObserver {
    fn on_tree_data_changed(&mut self, _tree: &Tree, _old: &TreeData, _new: &TreeData) {
        self.events.push(Event::TreeDataChanged);
    }

    fn on_node_data_will_change(&mut self, _tree: &Tree, old: &NodeData, _new: &NodeData) {
        self.events.push(Event::NodeDataWillChange(old.id));
    }

    fn on_subtree_will_be_deleted(&mut self, _tree: &Tree, node: NodeId) {
        self.events.push(Event::SubtreeWillBeDeleted(node));
    }

    fn on_node_will_be_deleted(&mut self, _tree: &Tree, node: NodeId) {
        self.events.push(Event::NodeWillBeDeleted(node));
    }

    fn on_node_created(&mut self, _tree: &Tree, node: NodeId) {
        self.events.push(Event::NodeCreated(node));
    }

    fn on_node_changed(&mut self, _tree: &Tree, node: NodeId) {
        self.events.push(Event::NodeChanged(node));
    }

    fn on_subtree_reparented(&mut self, _tree: &Tree, node: NodeId) {
        self.events.push(Event::SubtreeReparented(node));
    }

    fn on_node_reparented(&mut self, _tree: &Tree, node: NodeId) {
        self.events.push(Event::NodeReparented(node));
    }

    fn on_node_deleted(&mut self, _tree: &Tree, node: NodeId) {
        self.events.push(Event::NodeDeleted(node));
    }

    fn on_atomic_update_finished(&mut self, _tree: &Tree, root_changed: bool, changes: &[Change]) {
        self.events.push(Event::AtomicUpdateFinished {
            root_changed,
            changes: changes.to_vec(),
        });
    }
}
