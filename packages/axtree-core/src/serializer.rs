//! Incremental diffing of a [`TreeSource`] against a model of what the
//! client already holds.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::ids::NodeId;
use crate::source::TreeSource;
use crate::tree_data::TreeData;
use crate::tree_update::TreeUpdate;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SerializerConfig {
    /// Stop descending once a single update holds this many nodes.
    pub max_node_count: Option<usize>,
}

/// What the serializer believes the client has for one id.
#[derive(Clone, Debug)]
struct ClientTreeNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    ignored: bool,
    /// Client data is stale and must be resent.
    invalid: bool,
}

impl ClientTreeNode {
    fn new(parent: Option<NodeId>, ignored: bool) -> Self {
        Self {
            parent,
            children: Vec::new(),
            ignored,
            invalid: false,
        }
    }
}

/// Produces [`TreeUpdate`]s that bring a client in sync with a source tree,
/// sending only the nodes the client does not already know.
#[derive(Debug, Default)]
pub struct TreeSerializer {
    config: SerializerConfig,
    client_root: Option<NodeId>,
    client_nodes: HashMap<NodeId, ClientTreeNode>,
    client_tree_data: Option<TreeData>,
    /// Root of a client tree dropped by [`TreeSerializer::reset`] that the
    /// next update must tell the client to clear.
    pending_clear: Option<NodeId>,
    /// Tops of invalid client subtrees: invalidated nodes and nodes whose
    /// children were cut off by the node cap.
    stale: HashSet<NodeId>,
    warned_max_node_count: bool,
}

impl TreeSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    pub fn set_max_node_count(&mut self, max_node_count: Option<usize>) {
        self.config.max_node_count = max_node_count;
        self.warned_max_node_count = false;
    }

    pub fn is_in_client_tree(&self, id: NodeId) -> bool {
        self.client_nodes.contains_key(&id)
    }

    pub fn client_tree_size(&self) -> usize {
        self.client_nodes.len()
    }

    /// Forget everything the client is assumed to hold. The next update
    /// clears the old client root and resends the whole source tree.
    pub fn reset(&mut self) {
        if let Some(root) = self.client_root.take() {
            self.pending_clear = Some(root);
        }
        self.client_nodes.clear();
        self.stale.clear();
        self.client_tree_data = None;
    }

    /// Mark the client copy of `id` and its descendants stale so they are
    /// resent by the next serialization that starts at `id` or above it.
    pub fn invalidate_subtree(&mut self, id: NodeId) {
        if self.client_nodes.contains_key(&id) {
            self.stale.insert(id);
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(client) = self.client_nodes.get_mut(&current) {
                client.invalid = true;
                stack.extend(client.children.iter().copied());
            }
        }
    }

    /// Serialize everything under `node` that changed since the last call.
    ///
    /// Structure and ignored state are compared against the client model.
    /// Other node data is not: the host must call
    /// [`TreeSerializer::invalidate_subtree`] for nodes whose data changed.
    ///
    /// On an anomaly the serializer resets itself and returns the error;
    /// retrying then produces a full resend.
    pub fn serialize_changes<S: TreeSource>(
        &mut self,
        source: &S,
        node: &S::Node,
    ) -> Result<TreeUpdate> {
        let mut update = TreeUpdate::default();

        if let Some(data) = source.tree_data() {
            if self.client_tree_data.as_ref() != Some(&data) {
                self.client_tree_data = Some(data.clone());
                update.tree_data = Some(data);
            }
        }

        let mut lca = self.least_common_ancestor(source, node);
        while let Some(current) = lca.clone() {
            let current_id = source.id(&current);
            if !self.client_nodes.contains_key(&current_id) {
                break;
            }
            let stale_paths = self.stale_paths();
            match self.widen_for_reparenting(source, current, &stale_paths) {
                Widening::Unchanged => break,
                Widening::To(wider) => {
                    let wider_id = source.id(&wider);
                    debug!(node = %wider_id, "reparenting detected, clearing client subtree");
                    update.node_id_to_clear = Some(wider_id);
                    self.delete_client_descendants(source, wider_id);
                    lca = Some(wider);
                }
                Widening::Lost => lca = None,
            }
        }

        let start = match lca.filter(|lca| source.is_valid(lca)) {
            Some(lca) => lca,
            None => {
                if let Some(root) = self.client_root {
                    update.node_id_to_clear = Some(root);
                    self.drop_client_tree(source);
                }
                source.root().ok_or(Error::SourceHasNoRoot)?
            }
        };

        if let Err(err) = self.serialize_changed_nodes(source, start, &mut update) {
            warn!(error = %err, "serializer anomaly, resetting");
            self.reset();
            return Err(err);
        }

        if let Some(cleared) = self.pending_clear.take() {
            update.node_id_to_clear = Some(cleared);
        }
        update.root_id = self.client_root.unwrap_or(NodeId::INVALID);
        trace!(nodes = update.nodes.len(), clear = ?update.node_id_to_clear, "serialized changes");
        Ok(update)
    }

    /// Deepest source ancestor of `node` whose client copy is known and
    /// sits at the same position in both trees.
    fn least_common_ancestor<S: TreeSource>(&self, source: &S, node: &S::Node) -> Option<S::Node> {
        let mut current = Some(node.clone());
        while let Some(candidate) = current.clone() {
            if !source.is_valid(&candidate) {
                return None;
            }
            let known = self.client_nodes.get(&source.id(&candidate)).is_some_and(|client| {
                client
                    .parent
                    .and_then(|parent| self.client_nodes.get(&parent))
                    .map_or(true, |parent| !parent.invalid)
            });
            if known {
                let id = source.id(&candidate);
                return self.align_chains(source, candidate, id);
            }
            current = source.parent(&candidate);
        }
        None
    }

    /// Walk the source ancestors of `node` and the client ancestors of
    /// `client` from the top down; the last point of agreement wins.
    fn align_chains<S: TreeSource>(&self, source: &S, node: S::Node, client: NodeId) -> Option<S::Node> {
        let mut source_chain = Vec::new();
        let mut current = Some(node);
        while let Some(ancestor) = current {
            if !source.is_valid(&ancestor) {
                break;
            }
            current = source.parent(&ancestor);
            source_chain.push(ancestor);
        }

        let mut client_chain = Vec::new();
        let mut current = Some(client);
        while let Some(id) = current {
            let Some(client) = self.client_nodes.get(&id) else {
                break;
            };
            client_chain.push(id);
            current = client.parent;
        }

        let mut lca = None;
        for (ancestor, client_id) in source_chain.into_iter().rev().zip(client_chain.into_iter().rev()) {
            if source.id(&ancestor) != client_id {
                break;
            }
            lca = Some(ancestor);
        }
        lca
    }

    /// Scan below `lca` for children the client holds under another parent,
    /// returning the ancestor that covers both positions of every one.
    fn widen_for_reparenting<S: TreeSource>(
        &self,
        source: &S,
        lca: S::Node,
        stale_paths: &HashSet<NodeId>,
    ) -> Widening<S::Node> {
        let mut wider = lca.clone();
        let mut found = false;
        let mut stack = vec![lca];
        while let Some(node) = stack.pop() {
            let node_id = source.id(&node);
            for child in source.children(&node) {
                if let Some(client_child) = self.client_nodes.get(&source.id(&child)) {
                    let Some(client_parent) = client_child.parent else {
                        // The old client root now has a parent.
                        return Widening::Lost;
                    };
                    if client_parent != node_id {
                        match self.align_chains(source, wider.clone(), source.id(&child)) {
                            Some(covering) => wider = covering,
                            None => return Widening::Lost,
                        }
                        found = true;
                        continue;
                    }
                    if !client_child.invalid
                        && client_child.ignored == source.is_ignored(&child)
                        && !stale_paths.contains(&source.id(&child))
                    {
                        continue;
                    }
                }
                stack.push(child);
            }
        }
        if found {
            Widening::To(wider)
        } else {
            Widening::Unchanged
        }
    }

    fn serialize_changed_nodes<S: TreeSource>(
        &mut self,
        source: &S,
        start: S::Node,
        update: &mut TreeUpdate,
    ) -> Result<()> {
        let stale_paths = self.stale_paths();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            let id = source.id(&node);
            if !self.client_nodes.contains_key(&id) {
                if let Some(old_root) = self.client_root {
                    update.node_id_to_clear = Some(old_root);
                    self.drop_client_tree(source);
                }
                self.client_root = Some(id);
                self.client_nodes
                    .insert(id, ClientTreeNode::new(None, source.is_ignored(&node)));
            }

            // A capped node is still sent whole, but only with the children
            // the client already holds; nothing new below it is visited.
            let capped = match self.config.max_node_count {
                Some(max) if update.nodes.len() >= max => {
                    if !self.warned_max_node_count {
                        self.warned_max_node_count = true;
                        warn!(max, "node count limit reached, truncating serialization");
                    }
                    true
                }
                _ => false,
            };
            let children = source.children(&node);

            let mut new_child_ids = HashSet::with_capacity(children.len());
            for child in &children {
                let child_id = source.id(child);
                new_child_ids.insert(child_id);
                if let Some(client_child) = self.client_nodes.get(&child_id) {
                    if client_child.parent != Some(id) {
                        return Err(Error::IllegalReparenting {
                            node: child_id,
                            new_parent: id,
                        });
                    }
                }
            }

            let old_children = self
                .client_nodes
                .get(&id)
                .map(|client| client.children.clone())
                .unwrap_or_default();
            let mut reusable = HashSet::with_capacity(old_children.len());
            for old_child in old_children {
                if new_child_ids.contains(&old_child) {
                    reusable.insert(old_child);
                } else {
                    self.delete_client_subtree(source, old_child);
                }
            }

            let mut data = source.serialize_node(&node);
            let mut actual_child_ids = Vec::with_capacity(children.len());
            let mut to_visit = Vec::new();
            let mut skipped = false;
            for child in children {
                let child_id = source.id(&child);
                if !source.is_valid(&child) || !new_child_ids.remove(&child_id) {
                    continue;
                }
                let ignored = source.is_ignored(&child);
                if reusable.contains(&child_id) {
                    actual_child_ids.push(child_id);
                    let changed = stale_paths.contains(&child_id)
                        || self
                            .client_nodes
                            .get(&child_id)
                            .is_some_and(|client| client.invalid || client.ignored != ignored);
                    if changed && capped {
                        skipped = true;
                    } else if changed {
                        to_visit.push(child);
                    }
                } else if capped {
                    skipped = true;
                } else {
                    if self.client_nodes.contains_key(&child_id) {
                        return Err(Error::DuplicateSourceId(child_id));
                    }
                    actual_child_ids.push(child_id);
                    self.client_nodes
                        .insert(child_id, ClientTreeNode::new(Some(id), ignored));
                    to_visit.push(child);
                }
            }

            if let Some(client) = self.client_nodes.get_mut(&id) {
                client.children.clone_from(&actual_child_ids);
                client.ignored = source.is_ignored(&node);
                client.invalid = skipped;
            }
            if skipped {
                self.stale.insert(id);
            } else {
                self.stale.remove(&id);
            }
            data.child_ids = actual_child_ids;
            update.nodes.push(data);
            stack.extend(to_visit.into_iter().rev());
        }
        Ok(())
    }

    /// Every client node on the path from a stale subtree up to the root.
    fn stale_paths(&self) -> HashSet<NodeId> {
        let mut paths = HashSet::new();
        for id in &self.stale {
            let mut current = Some(*id);
            while let Some(node) = current {
                if !paths.insert(node) {
                    break;
                }
                current = self.client_nodes.get(&node).and_then(|client| client.parent);
            }
        }
        paths
    }

    /// Remove `id` and its descendants from the client model.
    fn delete_client_subtree<S: TreeSource>(&mut self, source: &S, id: NodeId) {
        self.delete_client_descendants(source, id);
        self.stale.remove(&id);
        if let Some(client) = self.client_nodes.remove(&id) {
            if let Some(parent) = client.parent.and_then(|parent| self.client_nodes.get_mut(&parent)) {
                parent.children.retain(|child| *child != id);
            }
            source.on_node_cleared(id);
        }
        if self.client_root == Some(id) {
            self.client_root = None;
        }
    }

    /// Remove the descendants of `id` from the client model, keeping `id`.
    fn delete_client_descendants<S: TreeSource>(&mut self, source: &S, id: NodeId) {
        let Some(client) = self.client_nodes.get_mut(&id) else {
            return;
        };
        let mut stack = std::mem::take(&mut client.children);
        while let Some(current) = stack.pop() {
            self.stale.remove(&current);
            if let Some(removed) = self.client_nodes.remove(&current) {
                stack.extend(removed.children);
                source.on_node_cleared(current);
            }
        }
    }

    fn drop_client_tree<S: TreeSource>(&mut self, source: &S) {
        if let Some(root) = self.client_root {
            self.delete_client_subtree(source, root);
        }
        self.client_nodes.clear();
        self.stale.clear();
        self.client_root = None;
    }
}

enum Widening<N> {
    Unchanged,
    To(N),
    /// No common ancestor remains; the whole client tree must go.
    Lost,
}
