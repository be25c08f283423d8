use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::attributes::{IntAttribute, IntListAttribute};
use crate::error::{Error, Result};
use crate::ids::{NodeId, SyntheticIds};
use crate::node::{Node, NodeRef};
use crate::node_data::NodeData;
use crate::observer::{Change, ChangeType, TreeObserver};
use crate::ordered_set::SetInfo;
use crate::table_info::{ExtraNodeIds, TableInfo};
use crate::tree_data::TreeData;
use crate::tree_update::TreeUpdate;

/// Options fixed at tree construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeConfig {
    /// Synthesize one column node per table column plus a header container
    /// when table info is computed.
    pub extra_table_nodes: bool,
}

/// Reverse index for node-id valued attributes: attribute -> target -> sources.
#[derive(Clone, Debug, Default)]
struct RelationIndex {
    int: HashMap<IntAttribute, HashMap<NodeId, BTreeSet<NodeId>>>,
    int_list: HashMap<IntListAttribute, HashMap<NodeId, BTreeSet<NodeId>>>,
}

impl RelationIndex {
    fn add(&mut self, data: &NodeData) {
        for (attr, target) in data.node_id_attributes() {
            self.int
                .entry(attr)
                .or_default()
                .entry(target)
                .or_default()
                .insert(data.id);
        }
        for (attr, targets) in data.node_id_list_attributes() {
            let by_target = self.int_list.entry(attr).or_default();
            for target in targets {
                by_target.entry(NodeId(*target)).or_default().insert(data.id);
            }
        }
    }

    fn remove(&mut self, data: &NodeData) {
        for (attr, target) in data.node_id_attributes() {
            if let Some(by_target) = self.int.get_mut(&attr) {
                remove_source(by_target, target, data.id);
            }
        }
        for (attr, targets) in data.node_id_list_attributes() {
            if let Some(by_target) = self.int_list.get_mut(&attr) {
                for target in targets {
                    remove_source(by_target, NodeId(*target), data.id);
                }
            }
        }
    }
}

fn remove_source(by_target: &mut HashMap<NodeId, BTreeSet<NodeId>>, target: NodeId, source: NodeId) {
    if let Some(sources) = by_target.get_mut(&target) {
        sources.remove(&source);
        if sources.is_empty() {
            by_target.remove(&target);
        }
    }
}

/// Everything an update will do, computed before the tree is touched.
struct UpdatePlan<'u> {
    root_changed: bool,
    new_root: NodeId,
    clear_node: Option<NodeId>,
    /// New parent of every node listed in some updated child list.
    listed_by: HashMap<NodeId, NodeId>,
    /// Existing nodes being destroyed, in notification order: each subtree
    /// root is followed by its dead descendants deepest first.
    deletions: Vec<Deletion>,
    dead: HashSet<NodeId>,
    created: Vec<&'u NodeData>,
    updated: Vec<&'u NodeData>,
    changed: Vec<NodeId>,
    /// Existing nodes given a new parent, flagged when their own child list
    /// was rewritten by the same update.
    moved: Vec<(NodeId, bool)>,
}

struct Deletion {
    subtree_root: NodeId,
    /// Post-order, so the deepest nodes come first.
    nodes: Vec<NodeId>,
}

/// A mutable accessibility tree, changed only through [`Tree::unserialize`].
pub struct Tree {
    pub(crate) config: TreeConfig,
    root: Option<NodeId>,
    pub(crate) nodes: HashMap<NodeId, Node>,
    data: TreeData,
    observers: Vec<Rc<RefCell<dyn TreeObserver>>>,
    error: String,
    relations: RelationIndex,
    pub(crate) table_cache: RefCell<HashMap<NodeId, Option<Rc<TableInfo>>>>,
    pub(crate) set_cache: RefCell<HashMap<NodeId, SetInfo>>,
    pub(crate) line_cache: RefCell<HashMap<NodeId, Rc<[usize]>>>,
    pub(crate) extra_node_ids: RefCell<HashMap<NodeId, ExtraNodeIds>>,
    pub(crate) synthetic_ids: RefCell<SyntheticIds>,
    pub(crate) updating: Cell<bool>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::with_config(TreeConfig::default())
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("size", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            config,
            root: None,
            nodes: HashMap::new(),
            data: TreeData::default(),
            observers: Vec::new(),
            error: String::new(),
            relations: RelationIndex::default(),
            table_cache: RefCell::new(HashMap::new()),
            set_cache: RefCell::new(HashMap::new()),
            line_cache: RefCell::new(HashMap::new()),
            extra_node_ids: RefCell::new(HashMap::new()),
            synthetic_ids: RefCell::new(SyntheticIds::default()),
            updating: Cell::new(false),
        }
    }

    /// Build a tree from an initial update.
    pub fn from_update(update: &TreeUpdate) -> Result<Self> {
        let mut tree = Self::new();
        tree.unserialize(update)?;
        Ok(tree)
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn add_observer(&mut self, observer: Rc<RefCell<dyn TreeObserver>>) {
        self.observers.push(observer);
    }

    pub fn remove_observer(&mut self, observer: &Rc<RefCell<dyn TreeObserver>>) {
        self.observers.retain(|o| !Rc::ptr_eq(o, observer));
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.root
    }

    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.root.and_then(|id| self.node(id))
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.nodes.get(&id).map(|node| NodeRef::new(self, node))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn data(&self) -> &TreeData {
        &self.data
    }

    /// Message of the last rejected update; empty after a successful one.
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Nodes whose node-id attribute `attr` points at `target`.
    pub fn reverse_relations(&self, attr: IntAttribute, target: NodeId) -> BTreeSet<NodeId> {
        self.relations
            .int
            .get(&attr)
            .and_then(|by_target| by_target.get(&target))
            .cloned()
            .unwrap_or_default()
    }

    /// Nodes whose node-id list attribute `attr` contains `target`.
    pub fn reverse_list_relations(
        &self,
        attr: IntListAttribute,
        target: NodeId,
    ) -> BTreeSet<NodeId> {
        self.relations
            .int_list
            .get(&attr)
            .and_then(|by_target| by_target.get(&target))
            .cloned()
            .unwrap_or_default()
    }

    pub fn lowest_common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let first = self.node(a)?;
        let mut chain: HashSet<NodeId> = first.ancestors().map(|n| n.id()).collect();
        chain.insert(a);
        let second = self.node(b)?;
        std::iter::once(second)
            .chain(second.ancestors())
            .map(|n| n.id())
            .find(|id| chain.contains(id))
    }

    /// Apply `update` atomically.
    ///
    /// The whole update is validated before anything is mutated, so on error
    /// the tree is unchanged and the message is kept in [`Tree::error`].
    pub fn unserialize(&mut self, update: &TreeUpdate) -> Result<()> {
        let plan = match self.plan(update) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(error = %err, "rejected tree update");
                self.error = err.to_string();
                return Err(err);
            }
        };
        self.error.clear();
        self.apply(update, plan);
        Ok(())
    }

    fn plan<'u>(&self, update: &'u TreeUpdate) -> Result<UpdatePlan<'u>> {
        let mut in_update: HashMap<NodeId, &'u NodeData> = HashMap::with_capacity(update.nodes.len());
        for data in &update.nodes {
            if in_update.insert(data.id, data).is_some() {
                return Err(Error::DuplicateNodeInUpdate(data.id));
            }
            if let Some(child) = data.duplicate_child() {
                return Err(Error::DuplicateChildId {
                    node: data.id,
                    child,
                });
            }
        }

        let root_changed = match self.root {
            None => true,
            Some(root) => update.root_id != root && in_update.contains_key(&update.root_id),
        };
        let new_root = match self.root {
            Some(root) if !root_changed => root,
            _ => {
                if !in_update.contains_key(&update.root_id) {
                    return Err(Error::MissingRoot(update.root_id));
                }
                update.root_id
            }
        };

        let clear_node = update
            .node_id_to_clear
            .filter(|id| !root_changed && self.nodes.contains_key(id));
        let mut cleared = HashSet::new();
        if let Some(clear) = clear_node {
            // The cleared node keeps its id but must get a fresh child list.
            if !in_update.contains_key(&clear) {
                return Err(Error::PendingNodes(vec![clear]));
            }
            self.collect_descendants(clear, &mut cleared);
        }
        let exists = |id: &NodeId| !root_changed && self.nodes.contains_key(id) && !cleared.contains(id);

        let mut listed_by: HashMap<NodeId, NodeId> = HashMap::new();
        for data in &update.nodes {
            for child in &data.child_ids {
                if *child == new_root {
                    return Err(Error::RootListedAsChild(*child));
                }
                if let Some(first) = listed_by.insert(*child, data.id) {
                    return Err(Error::MultipleParents {
                        child: *child,
                        first,
                        second: data.id,
                    });
                }
            }
        }

        // Children dropped from an updated child list head subtrees that are
        // destroyed unless some of their nodes are picked up elsewhere.
        let mut doomed = HashSet::new();
        for data in &update.nodes {
            if !exists(&data.id) {
                continue;
            }
            let new_children: HashSet<NodeId> = data.child_ids.iter().copied().collect();
            for old_child in &self.nodes[&data.id].data.child_ids {
                if !new_children.contains(old_child) && exists(old_child) {
                    doomed.insert(*old_child);
                    self.collect_descendants(*old_child, &mut doomed);
                }
            }
        }

        let new_parent = |id: NodeId| -> Option<NodeId> {
            if let Some(parent) = listed_by.get(&id) {
                return Some(*parent);
            }
            if !exists(&id) {
                return None;
            }
            let parent = self.nodes[&id].parent?;
            if in_update.contains_key(&parent) {
                None
            } else {
                Some(parent)
            }
        };
        let mut alive: HashMap<NodeId, bool> = HashMap::new();
        let mut is_alive = |id: NodeId| -> bool {
            let mut chain = Vec::new();
            let mut on_chain = HashSet::new();
            let mut current = id;
            let result = loop {
                if current == new_root {
                    break true;
                }
                if let Some(known) = alive.get(&current) {
                    break *known;
                }
                if !on_chain.insert(current) {
                    break false;
                }
                chain.push(current);
                match new_parent(current) {
                    Some(parent) => current = parent,
                    None => break false,
                }
            };
            for node in chain {
                alive.insert(node, result);
            }
            result
        };

        let mut moved = Vec::new();
        for data in &update.nodes {
            for child in &data.child_ids {
                if exists(child) {
                    let old_parent = self.nodes[child].parent;
                    if old_parent == Some(data.id) {
                        continue;
                    }
                    let released = match old_parent {
                        Some(parent) => in_update.contains_key(&parent) || !is_alive(parent),
                        None => false,
                    };
                    if !released || !doomed.contains(child) {
                        return Err(Error::NotMarkedForDestruction {
                            node: *child,
                            new_parent: data.id,
                        });
                    }
                    let rewritten = in_update
                        .get(child)
                        .is_some_and(|moved| moved.child_ids != self.nodes[child].data.child_ids);
                    moved.push((*child, rewritten));
                } else if !in_update.contains_key(child) {
                    return Err(Error::MissingNodeData(*child));
                }
            }
        }

        let pending: Vec<NodeId> = update
            .nodes
            .iter()
            .map(|data| data.id)
            .filter(|id| !is_alive(*id))
            .collect();
        if !pending.is_empty() {
            return Err(Error::PendingNodes(pending));
        }

        let mut dead: HashSet<NodeId> = if root_changed {
            self.nodes.keys().copied().collect()
        } else {
            cleared
                .iter()
                .copied()
                .chain(doomed.iter().copied().filter(|id| !is_alive(*id)))
                .collect()
        };
        dead.retain(|id| self.nodes.contains_key(id));
        let deletions = self.order_deletions(&dead);

        let mut created = Vec::new();
        let mut updated = Vec::new();
        let mut changed = Vec::new();
        for data in &update.nodes {
            if exists(&data.id) {
                if self.nodes[&data.id].data != *data {
                    changed.push(data.id);
                }
                updated.push(data);
            } else {
                created.push(data);
            }
        }

        Ok(UpdatePlan {
            root_changed,
            new_root,
            clear_node,
            listed_by,
            deletions,
            dead,
            created,
            updated,
            changed,
            moved,
        })
    }

    fn collect_descendants(&self, id: NodeId, out: &mut HashSet<NodeId>) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                for child in &node.data.child_ids {
                    if out.insert(*child) {
                        stack.push(*child);
                    }
                }
            }
        }
    }

    fn order_deletions(&self, dead: &HashSet<NodeId>) -> Vec<Deletion> {
        let mut roots: Vec<NodeId> = dead
            .iter()
            .copied()
            .filter(|id| {
                self.nodes[id]
                    .parent
                    .map_or(true, |parent| !dead.contains(&parent))
            })
            .collect();
        roots.sort();
        roots
            .into_iter()
            .map(|subtree_root| {
                let mut nodes = Vec::new();
                let mut stack = vec![(subtree_root, false)];
                while let Some((id, expanded)) = stack.pop() {
                    if expanded {
                        nodes.push(id);
                        continue;
                    }
                    stack.push((id, true));
                    for child in self.nodes[&id].data.child_ids.iter().rev() {
                        if dead.contains(child) {
                            stack.push((*child, false));
                        }
                    }
                }
                Deletion {
                    subtree_root,
                    nodes,
                }
            })
            .collect()
    }

    fn apply(&mut self, update: &TreeUpdate, plan: UpdatePlan<'_>) {
        let observers = self.observers.clone();

        let old_tree_data = match &update.tree_data {
            Some(data) if *data != self.data => Some(std::mem::replace(&mut self.data, data.clone())),
            _ => None,
        };
        if let Some(old) = &old_tree_data {
            for observer in &observers {
                observer
                    .borrow_mut()
                    .on_tree_data_changed(self, old, &self.data);
            }
        }

        self.updating.set(true);
        for deletion in &plan.deletions {
            for observer in &observers {
                observer
                    .borrow_mut()
                    .on_subtree_will_be_deleted(self, deletion.subtree_root);
            }
            for id in &deletion.nodes {
                for observer in &observers {
                    observer.borrow_mut().on_node_will_be_deleted(self, *id);
                }
            }
        }
        for data in &plan.updated {
            if self.nodes[&data.id].data != **data {
                let old = &self.nodes[&data.id].data;
                for observer in &observers {
                    observer.borrow_mut().on_node_data_will_change(self, old, data);
                }
            }
        }

        let changed: HashSet<NodeId> = plan.changed.iter().copied().collect();
        let mut ignored_toggled = Vec::new();
        for id in &plan.dead {
            if let Some(node) = self.nodes.remove(id) {
                self.relations.remove(&node.data);
            }
        }
        for data in &plan.updated {
            let parent = plan.listed_by.get(&data.id).copied();
            if let Some(node) = self.nodes.get_mut(&data.id) {
                if node.is_ignored() != data.is_ignored() {
                    ignored_toggled.push(data.id);
                }
                if changed.contains(&data.id) {
                    self.relations.remove(&node.data);
                    node.data = (*data).clone();
                    self.relations.add(&node.data);
                }
                if let Some(parent) = parent {
                    node.parent = Some(parent);
                }
            }
        }
        for data in &plan.created {
            let parent = plan.listed_by.get(&data.id).copied();
            self.relations.add(data);
            self.nodes.insert(data.id, Node::new((*data).clone(), parent));
        }
        for (id, _) in &plan.moved {
            if let Some(node) = self.nodes.get_mut(id) {
                node.parent = plan.listed_by.get(id).copied();
            }
        }
        self.root = Some(plan.new_root);
        if let Some(root) = self.nodes.get_mut(&plan.new_root) {
            root.parent = None;
            root.index_in_parent = 0;
            root.unignored_index_in_parent = 0;
        }

        let mut dirty: Vec<NodeId> = if plan.root_changed {
            self.nodes.keys().copied().collect()
        } else {
            let mut dirty: Vec<NodeId> = plan
                .updated
                .iter()
                .chain(plan.created.iter())
                .map(|data| data.id)
                .collect();
            dirty.extend(plan.clear_node);
            for id in &ignored_toggled {
                dirty.extend(self.nodes.get(id).and_then(|node| node.parent));
            }
            dirty
        };
        dirty.sort();
        dirty.dedup();
        self.refresh_unignored_caches(&dirty);

        self.table_cache.borrow_mut().clear();
        self.set_cache.borrow_mut().clear();
        self.line_cache.borrow_mut().clear();
        {
            let nodes = &self.nodes;
            self.extra_node_ids
                .borrow_mut()
                .retain(|table, _| nodes.contains_key(table));
        }
        self.updating.set(false);

        let created_ids: HashSet<NodeId> = plan.created.iter().map(|data| data.id).collect();
        let mut changes = Vec::new();
        for data in &plan.created {
            let kind = match plan.listed_by.get(&data.id) {
                Some(parent) if created_ids.contains(parent) => ChangeType::NodeCreated,
                _ => ChangeType::SubtreeCreated,
            };
            changes.push(Change {
                node: data.id,
                kind,
            });
            for observer in &observers {
                observer.borrow_mut().on_node_created(self, data.id);
            }
        }
        for id in &plan.changed {
            changes.push(Change {
                node: *id,
                kind: ChangeType::NodeChanged,
            });
            for observer in &observers {
                observer.borrow_mut().on_node_changed(self, *id);
            }
        }
        let subtree_moves = plan.moved.iter().filter(|(_, rewritten)| !rewritten);
        let node_moves = plan.moved.iter().filter(|(_, rewritten)| *rewritten);
        for (id, _) in subtree_moves {
            changes.push(Change {
                node: *id,
                kind: ChangeType::SubtreeReparented,
            });
            for observer in &observers {
                observer.borrow_mut().on_subtree_reparented(self, *id);
            }
        }
        for (id, _) in node_moves {
            changes.push(Change {
                node: *id,
                kind: ChangeType::NodeReparented,
            });
            for observer in &observers {
                observer.borrow_mut().on_node_reparented(self, *id);
            }
        }
        for deletion in &plan.deletions {
            for id in &deletion.nodes {
                for observer in &observers {
                    observer.borrow_mut().on_node_deleted(self, *id);
                }
            }
        }

        let deleted = plan.dead.len();
        debug!(
            created = plan.created.len(),
            changed = plan.changed.len(),
            reparented = plan.moved.len(),
            deleted,
            root_changed = plan.root_changed,
            "applied tree update"
        );
        if !changes.is_empty() || deleted > 0 || plan.root_changed || old_tree_data.is_some() {
            for observer in &observers {
                observer
                    .borrow_mut()
                    .on_atomic_update_finished(self, plan.root_changed, &changes);
            }
        }
    }

    /// Recompute index and unignored caches below the nearest unignored
    /// ancestor of every dirty node.
    fn refresh_unignored_caches(&mut self, dirty: &[NodeId]) {
        let mut anchors = Vec::new();
        let mut seen = HashSet::new();
        for id in dirty {
            let mut current = *id;
            while let Some(node) = self.nodes.get(&current) {
                match node.parent {
                    Some(parent) if node.is_ignored() => current = parent,
                    _ => break,
                }
            }
            if self.nodes.contains_key(&current) && seen.insert(current) {
                anchors.push(current);
            }
        }
        for anchor in anchors {
            self.refresh_below(anchor);
        }
    }

    fn refresh_below(&mut self, anchor: NodeId) {
        let mut counter = 0usize;
        // (node, next child position, counter when the node was entered)
        let mut stack = vec![(anchor, 0usize, 0usize)];
        while let Some(&(id, position, start)) = stack.last() {
            let child = self
                .nodes
                .get(&id)
                .and_then(|node| node.data.child_ids.get(position).copied());
            let Some(child) = child else {
                stack.pop();
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.unignored_child_count = counter - start;
                }
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }
            if let Some(node) = self.nodes.get_mut(&child) {
                node.index_in_parent = position;
                node.unignored_index_in_parent = counter;
                if node.is_ignored() {
                    stack.push((child, 0, counter));
                } else {
                    counter += 1;
                }
            }
        }
    }

    /// Check structural invariants and cached values. Intended for tests
    /// and debugging.
    pub fn validate_invariants(&self) -> Result<()> {
        let Some(root) = self.root else {
            return if self.nodes.is_empty() {
                Ok(())
            } else {
                Err(Error::InconsistentState("nodes without a root".into()))
            };
        };
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                return Err(Error::InconsistentState(format!(
                    "node {id} reachable more than once"
                )));
            }
            let node = self.nodes.get(&id).ok_or_else(|| {
                Error::InconsistentState(format!("child {id} not present in nodes"))
            })?;
            for (index, child) in node.data.child_ids.iter().enumerate() {
                let child_node = self.nodes.get(child).ok_or_else(|| {
                    Error::InconsistentState(format!("child {child} not present in nodes"))
                })?;
                if child_node.parent != Some(id) {
                    return Err(Error::InconsistentState(format!(
                        "child {child} does not point back at parent {id}"
                    )));
                }
                if child_node.index_in_parent != index {
                    return Err(Error::InconsistentState(format!(
                        "stale index in parent for {child}"
                    )));
                }
                stack.push(*child);
            }
            if let Some(view) = self.node(id) {
                if view.unignored_children().len() != node.unignored_child_count {
                    return Err(Error::InconsistentState(format!(
                        "stale unignored child count for {id}"
                    )));
                }
            }
        }
        if seen.len() != self.nodes.len() {
            return Err(Error::InconsistentState(format!(
                "{} nodes unreachable from the root",
                self.nodes.len() - seen.len()
            )));
        }
        Ok(())
    }

    /// Guard for lazily computed views, which must not be read while an
    /// update is being applied.
    pub(crate) fn cache_readable(&self) -> bool {
        let updating = self.updating.get();
        debug_assert!(
            !updating,
            "derived tree views queried while an update is being applied"
        );
        !updating
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(root) = self.root else {
            return Ok(());
        };
        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            writeln!(f, "{:indent$}{}", "", node.data, indent = depth * 2)?;
            for child in node.data.child_ids.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        Ok(())
    }
}
