//! Position in set and set size inference for items of ordered sets.

use crate::attributes::{IntAttribute, IntListAttribute, StringAttribute};
use crate::ids::NodeId;
use crate::node::NodeRef;
use crate::role::{ItemFamily, Role};
use crate::tree::Tree;

/// Authored or inferred set membership of one node; cached per node until
/// the next update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetInfo {
    /// 1-based position; `None` for containers.
    pub pos_in_set: Option<i32>,
    pub set_size: Option<i32>,
}

const DEFAULT_LEVEL: i32 = 1;

impl Tree {
    pub(crate) fn set_info(&self, id: NodeId) -> Option<SetInfo> {
        if !self.cache_readable() {
            return None;
        }
        if let Some(cached) = self.set_cache.borrow().get(&id) {
            return Some(*cached);
        }
        let node = self.node(id)?;
        if node.is_ignored() {
            return None;
        }
        if let Some(family) = node.role().item_family() {
            self.compute_item_set(node, family);
        } else if node.role().is_set_like() {
            let info = self.compute_container_set(node);
            self.set_cache.borrow_mut().insert(id, info);
        }
        self.set_cache.borrow().get(&id).copied()
    }

    fn compute_item_set(&self, item: NodeRef<'_>, family: ItemFamily) {
        let (container, items) = match ordered_set_of(item, family) {
            Some(set) => (Some(set), collect_items(set, family)),
            None if family == ItemFamily::RadioButton => (None, implicit_radio_group(item)),
            None => (None, Vec::new()),
        };
        if !items.iter().any(|candidate| candidate.id() == item.id()) {
            return;
        }
        let segment = level_segment(&items, item);
        self.number_segment(container, &segment);
    }

    fn compute_container_set(&self, container: NodeRef<'_>) -> SetInfo {
        let first_family = container
            .unignored_children()
            .into_iter()
            .find_map(|child| child.role().item_family())
            .filter(|family| container.role().accepts_items(*family));
        let set_size = match first_family {
            Some(family) => {
                let items = collect_items(container, family);
                let segment = items
                    .first()
                    .map(|first| level_segment(&items, *first))
                    .unwrap_or_default();
                self.number_segment(Some(container), &segment)
            }
            None => container.int_attribute(IntAttribute::SetSize),
        };
        SetInfo {
            pos_in_set: None,
            set_size,
        }
    }

    /// Assign positions to every item of a segment, cache them, and return
    /// the inferred size of the set.
    fn number_segment(&self, container: Option<NodeRef<'_>>, segment: &[NodeRef<'_>]) -> Option<i32> {
        if segment.is_empty() {
            return container.and_then(|set| set.int_attribute(IntAttribute::SetSize));
        }
        let mut positions = Vec::with_capacity(segment.len());
        let mut previous = 0i32;
        for item in segment {
            let pos = item
                .int_attribute(IntAttribute::PosInSet)
                .unwrap_or_else(|| previous.saturating_add(1));
            positions.push(pos);
            previous = pos;
        }

        let largest_pos = positions.iter().copied().max().unwrap_or(0);
        let largest_authored = segment
            .iter()
            .filter_map(|item| item.int_attribute(IntAttribute::SetSize))
            .max();
        let container_size = container.and_then(|set| set.int_attribute(IntAttribute::SetSize));
        let size = [Some(largest_pos), largest_authored, container_size]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(largest_pos);

        let mut cache = self.set_cache.borrow_mut();
        for (item, pos) in segment.iter().zip(positions) {
            cache.insert(
                item.id(),
                SetInfo {
                    pos_in_set: Some(pos),
                    set_size: Some(item.int_attribute(IntAttribute::SetSize).unwrap_or(size)),
                },
            );
        }
        Some(size)
    }
}

/// The nearest set-like ancestor reachable through structure-free wrappers.
fn ordered_set_of<'a>(item: NodeRef<'a>, family: ItemFamily) -> Option<NodeRef<'a>> {
    for ancestor in item.ancestors().filter(|node| !node.is_ignored()) {
        let role = ancestor.role();
        if role.is_set_like() {
            return role.accepts_items(family).then_some(ancestor);
        }
        if !role.is_generic_container() {
            return None;
        }
    }
    None
}

/// Items of `family` inside `set`, stopping at nested sets.
fn collect_items<'a>(set: NodeRef<'a>, family: ItemFamily) -> Vec<NodeRef<'a>> {
    let mut items = Vec::new();
    let mut stack = set.unignored_children();
    stack.reverse();
    while let Some(node) = stack.pop() {
        let role = node.role();
        if role.item_family() == Some(family) {
            items.push(node);
        } else if role.is_generic_container() && !role.is_set_like() {
            let mut children = node.unignored_children();
            children.reverse();
            stack.extend(children);
        }
    }
    items
}

/// Radio buttons outside any radio group: an explicit group list, else
/// siblings sharing the input name, else the run of adjacent radio buttons.
fn implicit_radio_group<'a>(radio: NodeRef<'a>) -> Vec<NodeRef<'a>> {
    let tree = radio.tree();
    let listed = radio.data().int_list_attribute(IntListAttribute::RadioGroupIds);
    if !listed.is_empty() {
        return listed
            .iter()
            .filter_map(|id| tree.node(NodeId(*id)))
            .filter(|node| node.role() == Role::RadioButton && !node.is_ignored())
            .collect();
    }
    let Some(parent) = radio.unignored_parent() else {
        return vec![radio];
    };
    let siblings = parent.unignored_children();
    if let Some(name) = radio.string_attribute(StringAttribute::InputName) {
        return siblings
            .into_iter()
            .filter(|node| {
                node.role() == Role::RadioButton
                    && node.string_attribute(StringAttribute::InputName) == Some(name)
            })
            .collect();
    }
    let Some(index) = siblings.iter().position(|node| node.id() == radio.id()) else {
        return vec![radio];
    };
    let is_unnamed_radio = |node: &NodeRef<'_>| {
        node.role() == Role::RadioButton
            && node.string_attribute(StringAttribute::InputName).is_none()
    };
    let start = siblings[..index]
        .iter()
        .rposition(|node| !is_unnamed_radio(node))
        .map_or(0, |p| p + 1);
    let end = siblings[index..]
        .iter()
        .position(|node| !is_unnamed_radio(node))
        .map_or(siblings.len(), |p| index + p);
    siblings[start..end].to_vec()
}

fn level_of(node: &NodeRef<'_>) -> i32 {
    node.int_attribute(IntAttribute::HierarchicalLevel)
        .unwrap_or(DEFAULT_LEVEL)
}

/// The run of same-level items containing `item`. A shallower item ends a
/// run; deeper items are skipped.
fn level_segment<'a>(items: &[NodeRef<'a>], item: NodeRef<'a>) -> Vec<NodeRef<'a>> {
    if !items
        .iter()
        .any(|node| node.int_attribute(IntAttribute::HierarchicalLevel).is_some())
    {
        return items.to_vec();
    }
    let target = level_of(&item);
    let mut segment = Vec::new();
    let mut found = false;
    for node in items {
        let level = level_of(node);
        if level < target {
            if found {
                break;
            }
            segment.clear();
        } else if level == target {
            segment.push(*node);
            found |= node.id() == item.id();
        }
    }
    segment
}
