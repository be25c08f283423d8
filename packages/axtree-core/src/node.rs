use std::fmt;
use std::rc::Rc;

use crate::attributes::{IntAttribute, StringAttribute};
use crate::ids::NodeId;
use crate::node_data::NodeData;
use crate::role::{Role, State};
use crate::table_info::{CellData, TableInfo};
use crate::tree::Tree;

/// Arena slot for one node. Children are the ids in `data.child_ids`.
#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) data: NodeData,
    pub(crate) parent: Option<NodeId>,
    pub(crate) index_in_parent: usize,
    /// For an unignored node, its index among the unignored children of its
    /// unignored parent. For an ignored node, the index its first unignored
    /// descendant would take.
    pub(crate) unignored_index_in_parent: usize,
    pub(crate) unignored_child_count: usize,
}

impl Node {
    pub(crate) fn new(data: NodeData, parent: Option<NodeId>) -> Self {
        Self {
            data,
            parent,
            index_in_parent: 0,
            unignored_index_in_parent: 0,
            unignored_child_count: 0,
        }
    }

    pub(crate) fn is_ignored(&self) -> bool {
        self.data.is_ignored()
    }
}

/// Borrowed view of a node in a [`Tree`], giving access to its data, raw
/// structure, ignored-aware structure and derived views.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a Tree,
    node: &'a Node,
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id())
            .field("role", &self.role())
            .finish()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id() == other.id()
    }
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(tree: &'a Tree, node: &'a Node) -> Self {
        Self { tree, node }
    }

    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    pub fn id(&self) -> NodeId {
        self.node.data.id
    }

    pub fn data(&self) -> &'a NodeData {
        &self.node.data
    }

    pub fn role(&self) -> Role {
        self.node.data.role
    }

    pub fn has_state(&self, state: State) -> bool {
        self.node.data.has_state(state)
    }

    pub fn is_ignored(&self) -> bool {
        self.node.is_ignored()
    }

    pub fn name(&self) -> &'a str {
        self.node.data.name()
    }

    pub fn int_attribute(&self, attr: IntAttribute) -> Option<i32> {
        self.node.data.int_attribute(attr)
    }

    pub fn string_attribute(&self, attr: StringAttribute) -> Option<&'a str> {
        self.node.data.string_attribute(attr)
    }

    // Raw structure.

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node.parent.and_then(|id| self.tree.node(id))
    }

    pub fn child_ids(&self) -> &'a [NodeId] {
        &self.node.data.child_ids
    }

    pub fn child_count(&self) -> usize {
        self.node.data.child_ids.len()
    }

    pub fn child_at(&self, index: usize) -> Option<NodeRef<'a>> {
        self.node
            .data
            .child_ids
            .get(index)
            .and_then(|id| self.tree.node(*id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.node
            .data
            .child_ids
            .iter()
            .filter_map(move |id| tree.node(*id))
    }

    pub fn index_in_parent(&self) -> usize {
        self.node.index_in_parent
    }

    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    pub fn is_descendant_of(&self, ancestor: NodeId) -> bool {
        self.id() == ancestor || self.ancestors().any(|node| node.id() == ancestor)
    }

    // Ignored-aware structure.

    pub fn unignored_child_count(&self) -> usize {
        self.node.unignored_child_count
    }

    pub fn unignored_index_in_parent(&self) -> usize {
        self.node.unignored_index_in_parent
    }

    pub fn unignored_parent(&self) -> Option<NodeRef<'a>> {
        self.ancestors().find(|node| !node.is_ignored())
    }

    pub fn unignored_child_at(&self, mut index: usize) -> Option<NodeRef<'a>> {
        for child in self.children() {
            if child.is_ignored() {
                let count = child.unignored_child_count();
                if index < count {
                    return child.unignored_child_at(index);
                }
                index -= count;
            } else if index == 0 {
                return Some(child);
            } else {
                index -= 1;
            }
        }
        None
    }

    pub fn unignored_children(&self) -> Vec<NodeRef<'a>> {
        let mut out = Vec::with_capacity(self.unignored_child_count());
        let mut stack: Vec<NodeRef<'a>> = self.children().collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            if node.is_ignored() {
                let before = stack.len();
                stack.extend(node.children());
                stack[before..].reverse();
            } else {
                out.push(node);
            }
        }
        out
    }

    pub fn first_unignored_child(&self) -> Option<NodeRef<'a>> {
        self.unignored_child_at(0)
    }

    pub fn last_unignored_child(&self) -> Option<NodeRef<'a>> {
        self.unignored_child_count()
            .checked_sub(1)
            .and_then(|index| self.unignored_child_at(index))
    }

    pub fn next_unignored_sibling(&self) -> Option<NodeRef<'a>> {
        let parent = self.unignored_parent()?;
        let step = if self.is_ignored() {
            self.unignored_child_count()
        } else {
            1
        };
        parent.unignored_child_at(self.unignored_index_in_parent() + step)
    }

    pub fn previous_unignored_sibling(&self) -> Option<NodeRef<'a>> {
        let parent = self.unignored_parent()?;
        let index = self.unignored_index_in_parent().checked_sub(1)?;
        parent.unignored_child_at(index)
    }

    pub fn next_unignored_in_tree_order(&self) -> Option<NodeRef<'a>> {
        if let Some(child) = self.first_unignored_child() {
            return Some(child);
        }
        let mut node = *self;
        loop {
            if let Some(sibling) = node.next_unignored_sibling() {
                return Some(sibling);
            }
            node = node.unignored_parent()?;
        }
    }

    pub fn previous_unignored_in_tree_order(&self) -> Option<NodeRef<'a>> {
        let Some(mut node) = self.previous_unignored_sibling() else {
            return self.unignored_parent();
        };
        while let Some(child) = node.last_unignored_child() {
            node = child;
        }
        Some(node)
    }

    // Text.

    /// Offsets in the node's text content at which a new line starts.
    pub fn line_start_offsets(&self) -> Rc<[usize]> {
        self.tree.line_start_offsets(self.id())
    }

    // Ordered sets.

    pub fn pos_in_set(&self) -> Option<i32> {
        self.tree.set_info(self.id()).and_then(|info| info.pos_in_set)
    }

    pub fn set_size(&self) -> Option<i32> {
        self.tree.set_info(self.id()).and_then(|info| info.set_size)
    }

    pub fn hierarchical_level(&self) -> Option<i32> {
        if let Some(level) = self.int_attribute(IntAttribute::HierarchicalLevel) {
            return Some(level);
        }
        if self.role() != Role::TreeItem {
            return None;
        }
        let nesting = self
            .ancestors()
            .filter(|node| !node.is_ignored() && node.role() == Role::TreeItem)
            .count();
        i32::try_from(nesting + 1).ok()
    }

    // Tables.

    pub fn is_table(&self) -> bool {
        self.role().is_table_like()
    }

    pub fn is_table_row(&self) -> bool {
        self.role().is_table_row()
    }

    pub fn is_table_cell_or_header(&self) -> bool {
        self.role().is_cell_or_table_header()
    }

    /// The nearest table-like node at or above this node.
    pub fn table(&self) -> Option<NodeRef<'a>> {
        if self.is_table() {
            return Some(*self);
        }
        self.ancestors()
            .filter(|node| !node.is_ignored())
            .find(|node| node.is_table())
    }

    pub fn table_info(&self) -> Option<Rc<TableInfo>> {
        if !self.is_table() {
            return None;
        }
        self.tree.table_info(self.id())
    }

    pub fn table_row_count(&self) -> Option<usize> {
        self.table_info().map(|info| info.row_count)
    }

    pub fn table_col_count(&self) -> Option<usize> {
        self.table_info().map(|info| info.col_count)
    }

    pub fn table_aria_row_count(&self) -> Option<i32> {
        self.table_info().and_then(|info| info.aria_row_count)
    }

    pub fn table_aria_col_count(&self) -> Option<i32> {
        self.table_info().and_then(|info| info.aria_col_count)
    }

    pub fn table_cell_count(&self) -> Option<usize> {
        self.table_info().map(|info| info.unique_cell_ids.len())
    }

    pub fn table_cell_from_indices(&self, row: usize, col: usize) -> Option<NodeRef<'a>> {
        let info = self.table_info()?;
        let id = *info.cell_ids.get(row)?.get(col)?;
        self.tree.node(id)
    }

    pub fn table_cell_from_index(&self, index: usize) -> Option<NodeRef<'a>> {
        let info = self.table_info()?;
        let id = *info.unique_cell_ids.get(index)?;
        self.tree.node(id)
    }

    pub fn table_col_header_ids(&self, col: usize) -> Vec<NodeId> {
        self.table_info()
            .and_then(|info| info.col_headers.get(col).cloned())
            .unwrap_or_default()
    }

    pub fn table_row_header_ids(&self, row: usize) -> Vec<NodeId> {
        self.table_info()
            .and_then(|info| info.row_headers.get(row).cloned())
            .unwrap_or_default()
    }

    pub fn table_unique_cell_ids(&self) -> Vec<NodeId> {
        self.table_info()
            .map(|info| info.unique_cell_ids.clone())
            .unwrap_or_default()
    }

    /// Index of this row among the rows of its table.
    pub fn table_row_index(&self) -> Option<usize> {
        if !self.is_table_row() {
            return None;
        }
        let info = self.table()?.table_info()?;
        info.row_id_to_index.get(&self.id()).copied()
    }

    fn cell_data(&self) -> Option<CellData> {
        if !self.is_table_cell_or_header() {
            return None;
        }
        let info = self.table()?.table_info()?;
        let index = *info.cell_id_to_index.get(&self.id())?;
        info.cell_data.get(index).copied()
    }

    pub fn table_cell_index(&self) -> Option<usize> {
        let info = self.table()?.table_info()?;
        info.cell_id_to_index.get(&self.id()).copied()
    }

    pub fn table_cell_row_index(&self) -> Option<usize> {
        self.cell_data().map(|cell| cell.row_index)
    }

    pub fn table_cell_col_index(&self) -> Option<usize> {
        self.cell_data().map(|cell| cell.col_index)
    }

    pub fn table_cell_row_span(&self) -> Option<usize> {
        self.cell_data().map(|cell| cell.row_span)
    }

    pub fn table_cell_col_span(&self) -> Option<usize> {
        self.cell_data().map(|cell| cell.col_span)
    }

    pub fn table_cell_aria_row_index(&self) -> Option<i32> {
        self.cell_data().map(|cell| cell.aria_row_index)
    }

    pub fn table_cell_aria_col_index(&self) -> Option<i32> {
        self.cell_data().map(|cell| cell.aria_col_index)
    }

    /// Column headers covering any column this cell spans, excluding itself.
    pub fn table_cell_col_header_ids(&self) -> Vec<NodeId> {
        let (Some(cell), Some(info)) = (self.cell_data(), self.table().and_then(|t| t.table_info()))
        else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for col in cell.col_index..cell.col_index + cell.col_span {
            for header in info.col_headers.get(col).into_iter().flatten() {
                if *header != self.id() && !out.contains(header) {
                    out.push(*header);
                }
            }
        }
        out
    }

    /// Row headers covering any row this cell spans, excluding itself.
    pub fn table_cell_row_header_ids(&self) -> Vec<NodeId> {
        let (Some(cell), Some(info)) = (self.cell_data(), self.table().and_then(|t| t.table_info()))
        else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for row in cell.row_index..cell.row_index + cell.row_span {
            for header in info.row_headers.get(row).into_iter().flatten() {
                if *header != self.id() && !out.contains(header) {
                    out.push(*header);
                }
            }
        }
        out
    }
}
