//! Grid structure inferred from a table-like subtree.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::attributes::{IntAttribute, IntListAttribute};
use crate::ids::NodeId;
use crate::node::NodeRef;
use crate::node_data::NodeData;
use crate::role::Role;
use crate::tree::Tree;

/// Upper bound applied to authored counts, indices and spans so malformed
/// input cannot request an unbounded grid.
pub const MAX_TABLE_DIMENSION: usize = 4096;

/// Position of one cell within its table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellData {
    pub id: NodeId,
    pub row_index: usize,
    pub col_index: usize,
    pub row_span: usize,
    pub col_span: usize,
    pub aria_row_index: i32,
    pub aria_col_index: i32,
}

/// Cached table structure, recomputed lazily after every update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableInfo {
    pub row_count: usize,
    pub col_count: usize,
    pub aria_row_count: Option<i32>,
    pub aria_col_count: Option<i32>,
    /// `row_count` x `col_count` grid; uncovered slots hold [`NodeId::INVALID`].
    pub cell_ids: Vec<Vec<NodeId>>,
    /// Cells in tree order.
    pub unique_cell_ids: Vec<NodeId>,
    pub cell_id_to_index: HashMap<NodeId, usize>,
    /// Parallel to `unique_cell_ids`.
    pub cell_data: Vec<CellData>,
    pub row_nodes: Vec<NodeId>,
    pub row_id_to_index: HashMap<NodeId, usize>,
    pub col_headers: Vec<Vec<NodeId>>,
    pub row_headers: Vec<Vec<NodeId>>,
    pub all_headers: Vec<NodeId>,
    /// Synthetic column nodes followed by the header container, present only
    /// when the tree enables extra table nodes.
    pub extra_nodes: Vec<NodeData>,
}

/// Synthetic ids handed to one table, kept across recomputation so that
/// the same column keeps the same id.
#[derive(Clone, Debug, Default)]
pub(crate) struct ExtraNodeIds {
    columns: Vec<NodeId>,
    header_container: Option<NodeId>,
}

impl Tree {
    pub(crate) fn table_info(&self, table: NodeId) -> Option<Rc<TableInfo>> {
        if !self.cache_readable() {
            return None;
        }
        if let Some(cached) = self.table_cache.borrow().get(&table) {
            return cached.clone();
        }
        let node = self.node(table)?;
        if !node.is_table() {
            return None;
        }
        let info = Some(Rc::new(self.compute_table_info(node)));
        self.table_cache.borrow_mut().insert(table, info.clone());
        info
    }

    fn compute_table_info(&self, table: NodeRef<'_>) -> TableInfo {
        let rows = collect_structural(table, |node| node.is_table_row());
        let mut info = TableInfo::default();
        let mut occupied: HashSet<(usize, usize)> = HashSet::new();
        let mut max_row = rows.len();
        let mut max_col = 0;
        let mut aria_row_cursor = 1i32;
        let mut max_aria_row = 0i32;
        let mut max_aria_col = 0i32;

        for (row_position, row) in rows.iter().enumerate() {
            info.row_id_to_index.insert(row.id(), row_position);
            info.row_nodes.push(row.id());
            let cells = collect_structural(*row, |node| node.is_table_cell_or_header());

            let explicit_aria_row = row
                .int_attribute(IntAttribute::AriaCellRowIndex)
                .or_else(|| {
                    cells
                        .iter()
                        .find_map(|cell| cell.int_attribute(IntAttribute::AriaCellRowIndex))
                });
            let aria_row = match explicit_aria_row {
                Some(explicit) if explicit >= aria_row_cursor => explicit,
                _ => aria_row_cursor,
            };
            aria_row_cursor = aria_row.saturating_add(1);
            max_aria_row = max_aria_row.max(aria_row);

            let mut col_cursor = 0usize;
            let mut aria_col_cursor = 1i32;
            for cell in cells {
                let row_span = clamped(cell.int_attribute(IntAttribute::TableCellRowSpan)).max(1);
                let col_span =
                    clamped(cell.int_attribute(IntAttribute::TableCellColumnSpan)).max(1);
                let row_index = cell
                    .int_attribute(IntAttribute::TableCellRowIndex)
                    .filter(|index| *index >= 0)
                    .map_or(row_position, |index| clamped(Some(index)));
                let col_index = match cell
                    .int_attribute(IntAttribute::TableCellColumnIndex)
                    .filter(|index| *index >= 0)
                {
                    Some(index) => clamped(Some(index)),
                    None => {
                        while occupied.contains(&(row_index, col_cursor)) {
                            col_cursor += 1;
                        }
                        col_cursor.min(MAX_TABLE_DIMENSION)
                    }
                };
                for r in row_index..(row_index + row_span).min(MAX_TABLE_DIMENSION) {
                    for c in col_index..(col_index + col_span).min(MAX_TABLE_DIMENSION) {
                        occupied.insert((r, c));
                    }
                }
                col_cursor = col_index + col_span;
                max_row = max_row.max(row_index + row_span);
                max_col = max_col.max(col_index + col_span);

                let aria_col = match cell.int_attribute(IntAttribute::AriaCellColumnIndex) {
                    Some(explicit) if explicit >= aria_col_cursor => explicit,
                    _ => aria_col_cursor,
                };
                let span = i32::try_from(col_span).unwrap_or(i32::MAX);
                aria_col_cursor = aria_col.saturating_add(span);
                max_aria_col = max_aria_col.max(aria_col.saturating_add(span - 1));

                info.cell_id_to_index
                    .insert(cell.id(), info.unique_cell_ids.len());
                info.unique_cell_ids.push(cell.id());
                info.cell_data.push(CellData {
                    id: cell.id(),
                    row_index,
                    col_index,
                    row_span,
                    col_span,
                    aria_row_index: aria_row,
                    aria_col_index: aria_col,
                });
            }
        }

        info.row_count = clamped(table.int_attribute(IntAttribute::TableRowCount))
            .max(max_row)
            .min(MAX_TABLE_DIMENSION);
        info.col_count = clamped(table.int_attribute(IntAttribute::TableColumnCount))
            .max(max_col)
            .min(MAX_TABLE_DIMENSION);
        info.aria_row_count = Some(aria_count(
            table.int_attribute(IntAttribute::AriaRowCount),
            max_aria_row,
        ));
        info.aria_col_count = Some(aria_count(
            table.int_attribute(IntAttribute::AriaColumnCount),
            max_aria_col,
        ));

        // Later cells overwrite earlier ones where spans overlap.
        info.cell_ids = vec![vec![NodeId::INVALID; info.col_count]; info.row_count];
        for cell in &info.cell_data {
            for r in cell.row_index..(cell.row_index + cell.row_span).min(info.row_count) {
                for c in cell.col_index..(cell.col_index + cell.col_span).min(info.col_count) {
                    info.cell_ids[r][c] = cell.id;
                }
            }
        }

        info.col_headers = vec![Vec::new(); info.col_count];
        info.row_headers = vec![Vec::new(); info.row_count];
        for (r, row) in info.cell_ids.iter().enumerate() {
            for (c, id) in row.iter().enumerate() {
                let Some(role) = self.node(*id).map(|node| node.role()) else {
                    continue;
                };
                let headers = match role {
                    Role::ColumnHeader => &mut info.col_headers[c],
                    Role::RowHeader => &mut info.row_headers[r],
                    _ => continue,
                };
                if !headers.contains(id) {
                    headers.push(*id);
                }
            }
        }
        info.all_headers = info
            .unique_cell_ids
            .iter()
            .copied()
            .filter(|id| {
                self.node(*id)
                    .is_some_and(|node| matches!(node.role(), Role::ColumnHeader | Role::RowHeader))
            })
            .collect();

        if self.config.extra_table_nodes {
            info.extra_nodes = self.build_extra_nodes(table.id(), &info);
        }
        info
    }

    fn build_extra_nodes(&self, table: NodeId, info: &TableInfo) -> Vec<NodeData> {
        let mut registry = self.extra_node_ids.borrow_mut();
        let ids = registry.entry(table).or_default();
        let mut synthetic = self.synthetic_ids.borrow_mut();
        while ids.columns.len() < info.col_count {
            ids.columns.push(synthetic.mint());
        }
        ids.columns.truncate(info.col_count);
        let header_container = *ids.header_container.get_or_insert_with(|| synthetic.mint());

        let mut extra = Vec::with_capacity(info.col_count + 1);
        for (col, id) in ids.columns.iter().enumerate() {
            let mut column = NodeData::new(*id, Role::Column);
            column.set_int_attribute(
                IntAttribute::TableColumnIndex,
                i32::try_from(col).unwrap_or(i32::MAX),
            );
            let mut members: Vec<i32> = Vec::new();
            for row in &info.cell_ids {
                let cell = row[col];
                if cell.is_valid() && !members.contains(&cell.0) {
                    members.push(cell.0);
                }
            }
            column.set_int_list_attribute(IntListAttribute::IndirectChildIds, members);
            extra.push(column);
        }
        let mut container = NodeData::new(header_container, Role::TableHeaderContainer);
        container.set_int_list_attribute(
            IntListAttribute::IndirectChildIds,
            info.all_headers.iter().map(|id| id.0).collect(),
        );
        extra.push(container);
        extra
    }
}

/// Unignored nodes matching `wanted` below `start`, looking through ignored
/// nodes and structure-free wrappers but not into nested tables.
fn collect_structural<'a>(
    start: NodeRef<'a>,
    wanted: impl Fn(&NodeRef<'a>) -> bool,
) -> Vec<NodeRef<'a>> {
    let mut found = Vec::new();
    let mut stack: Vec<NodeRef<'a>> = start.children().collect();
    stack.reverse();
    while let Some(node) = stack.pop() {
        if !node.is_ignored() && wanted(&node) {
            found.push(node);
        } else if !node.is_table() && (node.is_ignored() || node.role().is_row_container()) {
            let before = stack.len();
            stack.extend(node.children());
            stack[before..].reverse();
        }
    }
    found
}

fn clamped(value: Option<i32>) -> usize {
    value
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(0)
        .min(MAX_TABLE_DIMENSION)
}

fn aria_count(authored: Option<i32>, computed: i32) -> i32 {
    match authored {
        // -1 means the author declared the count unknown.
        Some(-1) => -1,
        Some(authored) => authored.max(computed),
        None => computed,
    }
}
