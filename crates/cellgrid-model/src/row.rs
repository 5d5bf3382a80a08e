use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellType};
use crate::error::RowError;
use crate::node::{CellNode, NodeId, NodeStore};
use crate::{CellRef, CellValue, ErrorValue, XLSX_LIMITS};

/// What `get`-style lookups do when no cell exists at the requested column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCellPolicy {
    /// Missing cells come back as `None`; blank cells come back as-is.
    ReturnNullAndBlank,
    /// Blank cells are reported as `None` too.
    ReturnBlankAsNull,
    /// Missing cells are created blank on the fly.
    CreateNullAsBlank,
}

/// Outcome of [`Row::remove_cell`].
#[derive(Clone, Debug, PartialEq)]
pub struct RemovedCell {
    /// The detached logical cell.
    pub cell: Cell,
    /// Whether a formula was deleted along with the cell. The owning workbook
    /// uses this to invalidate dependent caches.
    pub had_formula: bool,
}

/// A sparse, column-ordered collection of cells for one row.
///
/// Two orderings coexist: the logical map iterates in ascending column order,
/// while the backing [`NodeStore`] keeps the physical node sequence. Mutations
/// may leave the physical sequence out of date; [`Row::sync_nodes`] must run
/// before the row is externalized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    row_num: u32,
    cells: BTreeMap<u32, Cell>,
    nodes: NodeStore,
    /// Height override in points; `None` means the sheet default applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<f32>,
    /// Display the row with zero height.
    #[serde(default)]
    pub hidden: bool,
    /// Whole-row style index, for the few rows that carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<u32>,
    #[serde(default)]
    pub outline_level: u8,
}

impl Row {
    /// Create an empty row. The caller (the sheet) has validated `row_num`.
    pub(crate) fn new(row_num: u32) -> Self {
        Self {
            row_num,
            cells: BTreeMap::new(),
            nodes: NodeStore::new(),
            height: None,
            hidden: false,
            style: None,
            outline_level: 0,
        }
    }

    /// Rebuild a row from parsed nodes.
    ///
    /// Out-of-order and gapped nodes are accepted as-is; a node without an
    /// explicit reference takes the column one past the current maximum, so
    /// writers that omit `r` still land somewhere deterministic.
    pub(crate) fn from_nodes(row_num: u32, parsed: Vec<CellNode>) -> Self {
        let mut row = Self::new(row_num);
        row.nodes = NodeStore::from_nodes(parsed);

        let mut next_free = 0u32;
        let ids: Vec<NodeId> = row.nodes.order().to_vec();
        for id in ids {
            let node = row
                .nodes
                .get(id)
                .expect("freshly appended node")
                .clone();
            let col = node
                .a1_ref
                .as_deref()
                .and_then(|r| CellRef::from_a1(r).ok())
                .map(|c| c.col)
                .unwrap_or(next_free);
            next_free = next_free.max(col + 1);
            row.cells.insert(col, Cell::from_node(col, id, &node));
        }
        row
    }

    #[inline]
    pub fn row_num(&self) -> u32 {
        self.row_num
    }

    pub fn set_row_num(&mut self, row_num: u32) -> Result<(), RowError> {
        if row_num > XLSX_LIMITS.last_row_index() {
            return Err(RowError::RowOutOfRange {
                row: row_num,
                max: XLSX_LIMITS.last_row_index(),
            });
        }
        self.row_num = row_num;
        Ok(())
    }

    /// Create a blank cell at `col`.
    ///
    /// If a cell already exists there, its backing node is reset in place and
    /// a fresh logical cell is built over the same node, so held node handles
    /// stay valid. A brand-new cell appends a node to the physical sequence;
    /// if `col` turns out to be out of range the append is rolled back before
    /// the error propagates.
    pub fn create_cell(&mut self, col: u32) -> Result<&mut Cell, RowError> {
        self.create_cell_with_type(col, CellType::Blank)
    }

    /// Create a cell at `col` pre-typed with that type's default value
    /// (0, "", false, or #NULL!).
    pub fn create_cell_with_type(
        &mut self,
        col: u32,
        cell_type: CellType,
    ) -> Result<&mut Cell, RowError> {
        let (node_id, appended) = match self.cells.get(&col) {
            Some(existing) => {
                let id = existing.node_id();
                if let Some(node) = self.nodes.get_mut(id) {
                    node.reset();
                }
                (id, false)
            }
            None => (self.nodes.append(CellNode::default()), true),
        };

        if col > XLSX_LIMITS.last_col_index() {
            if appended {
                self.nodes.remove_last();
            }
            return Err(RowError::ColumnOutOfRange {
                col,
                max: XLSX_LIMITS.last_col_index(),
            });
        }

        let mut cell = Cell::blank(col, node_id);
        match cell_type {
            CellType::Blank | CellType::Formula => {}
            CellType::Numeric => cell.set_value(0.0),
            CellType::Text => cell.set_value(""),
            CellType::Bool => cell.set_value(false),
            CellType::Error => cell.set_value(ErrorValue::Null),
        }
        self.cells.insert(col, cell);
        Ok(self.cells.get_mut(&col).expect("cell was just inserted"))
    }

    pub fn cell(&self, col: u32) -> Option<&Cell> {
        self.cells.get(&col)
    }

    pub fn cell_mut(&mut self, col: u32) -> Option<&mut Cell> {
        self.cells.get_mut(&col)
    }

    /// Look up a cell under the given missing-cell policy.
    ///
    /// Takes `&mut self` because [`MissingCellPolicy::CreateNullAsBlank`] may
    /// create the cell; creation can fail with `ColumnOutOfRange`.
    pub fn cell_with_policy(
        &mut self,
        col: u32,
        policy: MissingCellPolicy,
    ) -> Result<Option<&Cell>, RowError> {
        match policy {
            MissingCellPolicy::ReturnNullAndBlank => Ok(self.cells.get(&col)),
            MissingCellPolicy::ReturnBlankAsNull => Ok(self
                .cells
                .get(&col)
                .filter(|c| c.cell_type() != CellType::Blank)),
            MissingCellPolicy::CreateNullAsBlank => {
                if !self.cells.contains_key(&col) {
                    self.create_cell(col)?;
                }
                Ok(self.cells.get(&col))
            }
        }
    }

    /// Remove the cell at `col` and detach its backing node from whatever
    /// physical position it currently occupies.
    ///
    /// Array-formula group members are demoted (formula cleared) before
    /// removal. The returned [`RemovedCell::had_formula`] flag tells the owner
    /// a formula disappeared so it can run its bookkeeping.
    pub fn remove_cell(&mut self, col: u32) -> Result<RemovedCell, RowError> {
        let Some(mut cell) = self.cells.remove(&col) else {
            return Err(RowError::CellNotInRow { col });
        };

        let had_formula = cell.cell_type() == CellType::Formula;
        if cell.is_part_of_array_group() {
            cell.remove_formula();
        }

        // The node may not sit at the logical position anymore; detach by
        // identity.
        self.nodes.remove(cell.node_id());
        Ok(RemovedCell { cell, had_formula })
    }

    /// Shift the cells of columns `[first..=last]` right by `step`, then blank
    /// the vacated columns at the origin.
    pub fn shift_cells_right(&mut self, first: u32, last: u32, step: u32) -> Result<(), RowError> {
        self.validate_shift(first, last, step)?;
        if u64::from(last) + u64::from(step) > u64::from(XLSX_LIMITS.last_col_index()) {
            return Err(RowError::ShiftBeyondLimit {
                first,
                last,
                step,
                max: XLSX_LIMITS.last_col_index(),
            });
        }

        // Highest column first, so a moved cell never lands on one that has
        // yet to move.
        for col in (first..=last).rev() {
            self.displace_cell(col, col + step);
        }
        for col in first..first + step {
            self.cells.remove(&col);
        }
        Ok(())
    }

    /// Shift the cells of columns `[first..=last]` left by `step`, then blank
    /// the vacated columns at the tail of the range.
    pub fn shift_cells_left(&mut self, first: u32, last: u32, step: u32) -> Result<(), RowError> {
        self.validate_shift(first, last, step)?;
        if first < step {
            return Err(RowError::ShiftBelowZero { first, last, step });
        }

        // Lowest column first for the mirror-image reason.
        for col in first..=last {
            self.displace_cell(col, col - step);
        }
        for col in last - step + 1..=last {
            self.cells.remove(&col);
        }
        Ok(())
    }

    fn validate_shift(&self, first: u32, last: u32, step: u32) -> Result<(), RowError> {
        if first > last {
            return Err(RowError::InvalidShiftRange { first, last });
        }
        if step == 0 {
            return Err(RowError::InvalidShiftStep { step });
        }
        Ok(())
    }

    /// Move the cell at `from` to `to`, overwriting any occupant. If there is
    /// no cell at `from`, the destination is vacated instead.
    fn displace_cell(&mut self, from: u32, to: u32) {
        match self.cells.remove(&from) {
            Some(mut cell) => {
                cell.set_column(to);
                if let Some(evicted) = self.cells.insert(to, cell) {
                    self.nodes.remove(evicted.node_id());
                }
            }
            None => {
                if let Some(evicted) = self.cells.remove(&to) {
                    self.nodes.remove(evicted.node_id());
                }
            }
        }
    }

    /// Column of the first cell, or `None` for an empty row.
    pub fn first_cell_col(&self) -> Option<u32> {
        self.cells.keys().next().copied()
    }

    /// Column of the last cell **plus one** (exclusive upper bound), or `None`
    /// for an empty row.
    pub fn last_cell_col(&self) -> Option<u32> {
        self.cells.keys().next_back().map(|c| c + 1)
    }

    /// Number of defined cells (not the span of the row).
    pub fn physical_cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Iterate cells in ascending column order.
    pub fn iter_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    pub fn iter_cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.values_mut()
    }

    /// Height override in points, if set.
    pub fn height_in_points(&self) -> Option<f32> {
        self.height
    }

    /// Set the height override; `None` reverts to the sheet default.
    pub fn set_height_in_points(&mut self, height: Option<f32>) {
        self.height = height;
    }

    /// Reconcile the physical node sequence with the logical cell order, then
    /// write every cell's state into its node.
    ///
    /// Fast path: when the physical order already matches the logical order
    /// (same nodes, by identity, in the same sequence), the reorder is
    /// skipped. Otherwise the physical order is rewritten to ascending-column
    /// order and leftover nodes (orphaned by overwrites) are dropped.
    ///
    /// Afterwards physical order == logical order, each logical cell resolves
    /// to exactly one live node, and calling this again without intervening
    /// mutation is a no-op on the ordering.
    pub fn sync_nodes(&mut self) {
        let logical: Vec<NodeId> = self.cells.values().map(Cell::node_id).collect();
        if self.nodes.order() != logical.as_slice() {
            self.nodes.reorder(logical);
        }

        let row_num = self.row_num;
        let nodes = &mut self.nodes;
        for cell in self.cells.values() {
            if let Some(node) = nodes.get_mut(cell.node_id()) {
                cell.write_node(row_num, node);
            }
        }
    }

    /// The backing node sequence, in its current physical order.
    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    /// Convenience: set a value, creating the cell if needed.
    pub fn set_value(&mut self, col: u32, value: impl Into<CellValue>) -> Result<(), RowError> {
        match self.cells.get_mut(&col) {
            Some(cell) => cell.set_value(value),
            None => {
                self.create_cell(col)?.set_value(value);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row_with_cols(cols: &[u32]) -> Row {
        let mut row = Row::new(0);
        for &col in cols {
            row.create_cell(col).unwrap();
        }
        row
    }

    #[test]
    fn create_cell_over_existing_keeps_node_identity() {
        let mut row = Row::new(0);
        row.create_cell(3).unwrap().set_value(1.5);
        let before = row.cell(3).unwrap().node_id();

        row.create_cell(3).unwrap();
        let after = row.cell(3).unwrap().node_id();
        assert_eq!(before, after);
        assert_eq!(row.cell(3).unwrap().value, CellValue::Blank);
        assert_eq!(row.nodes().len(), 1);
    }

    #[test]
    fn create_cell_out_of_range_rolls_back_the_append() {
        let mut row = row_with_cols(&[0, 1]);
        let err = row.create_cell(XLSX_LIMITS.max_cols).unwrap_err();
        assert_eq!(
            err,
            RowError::ColumnOutOfRange {
                col: XLSX_LIMITS.max_cols,
                max: XLSX_LIMITS.last_col_index()
            }
        );
        // No partial mutation: the physical sequence is untouched.
        assert_eq!(row.nodes().len(), 2);
        assert_eq!(row.physical_cell_count(), 2);
    }

    #[test]
    fn typed_creation_gets_default_values() {
        let mut row = Row::new(0);
        assert_eq!(
            row.create_cell_with_type(0, CellType::Numeric).unwrap().value,
            CellValue::Number(0.0)
        );
        assert_eq!(
            row.create_cell_with_type(1, CellType::Text).unwrap().value,
            CellValue::Text(String::new())
        );
        assert_eq!(
            row.create_cell_with_type(2, CellType::Bool).unwrap().value,
            CellValue::Bool(false)
        );
        assert_eq!(
            row.create_cell_with_type(3, CellType::Error).unwrap().value,
            CellValue::Error(ErrorValue::Null)
        );
        assert_eq!(
            row.create_cell_with_type(4, CellType::Blank).unwrap().value,
            CellValue::Blank
        );
    }

    #[test]
    fn missing_cell_policies() {
        let mut row = Row::new(0);
        row.create_cell(1).unwrap(); // blank
        row.set_value(2, 7.0).unwrap();

        assert!(row
            .cell_with_policy(0, MissingCellPolicy::ReturnNullAndBlank)
            .unwrap()
            .is_none());
        assert!(row
            .cell_with_policy(1, MissingCellPolicy::ReturnNullAndBlank)
            .unwrap()
            .is_some());
        assert!(row
            .cell_with_policy(1, MissingCellPolicy::ReturnBlankAsNull)
            .unwrap()
            .is_none());
        assert!(row
            .cell_with_policy(2, MissingCellPolicy::ReturnBlankAsNull)
            .unwrap()
            .is_some());

        let created = row
            .cell_with_policy(5, MissingCellPolicy::CreateNullAsBlank)
            .unwrap()
            .expect("created on demand");
        assert_eq!(created.cell_type(), CellType::Blank);
        assert_eq!(row.physical_cell_count(), 3);
    }

    #[test]
    fn remove_cell_rejects_foreign_columns() {
        let mut row = row_with_cols(&[0, 2]);
        assert_eq!(row.remove_cell(1), Err(RowError::CellNotInRow { col: 1 }));
    }

    #[test]
    fn remove_cell_reports_formula_deletion() {
        let mut row = Row::new(0);
        row.create_cell(0).unwrap().set_formula("SUM(B1:B9)");
        row.create_cell(1).unwrap().set_value(2.0);

        assert!(row.remove_cell(0).unwrap().had_formula);
        assert!(!row.remove_cell(1).unwrap().had_formula);
        assert_eq!(row.physical_cell_count(), 0);
        assert_eq!(row.nodes().len(), 0);
    }

    #[test]
    fn bounds_of_sparse_row() {
        let mut row = row_with_cols(&[3, 7, 11]);
        assert_eq!(row.first_cell_col(), Some(3));
        assert_eq!(row.last_cell_col(), Some(12));
        assert_eq!(row.physical_cell_count(), 3);

        row.remove_cell(11).unwrap();
        assert_eq!(row.last_cell_col(), Some(8));

        let empty = Row::new(0);
        assert_eq!(empty.first_cell_col(), None);
        assert_eq!(empty.last_cell_col(), None);
    }

    #[test]
    fn parsed_rows_accept_gaps_and_disorder() {
        let nodes = vec![
            CellNode {
                a1_ref: Some("E1".into()),
                raw_value: Some("5".into()),
                ..CellNode::default()
            },
            CellNode {
                a1_ref: Some("A1".into()),
                raw_value: Some("1".into()),
                ..CellNode::default()
            },
        ];
        let row = Row::from_nodes(0, nodes);
        let cols: Vec<u32> = row.iter_cells().map(Cell::column).collect();
        assert_eq!(cols, vec![0, 4]);
        // Physical order still reflects the file until the row is synced.
        assert_eq!(row.nodes().len(), 2);
        let first_physical = row.nodes().order()[0];
        assert_eq!(row.cell(4).unwrap().node_id(), first_physical);
    }

    #[test]
    fn parsed_node_without_reference_takes_next_free_column() {
        let nodes = vec![
            CellNode {
                a1_ref: Some("B1".into()),
                ..CellNode::default()
            },
            CellNode::default(),
        ];
        let row = Row::from_nodes(0, nodes);
        let cols: Vec<u32> = row.iter_cells().map(Cell::column).collect();
        assert_eq!(cols, vec![1, 2]);
    }
}
