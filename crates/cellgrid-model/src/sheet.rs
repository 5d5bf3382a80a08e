use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RowError, SheetError};
use crate::node::CellNode;
use crate::row::Row;
use crate::table::Table;
use crate::{Range, XLSX_LIMITS};

/// Identifier for a worksheet within its workbook.
pub type WorksheetId = u32;

/// Default row height in points for new sheets.
pub const DEFAULT_ROW_HEIGHT: f32 = 15.0;

/// An ordered collection of rows plus sheet-level resources.
///
/// Drawings, comments, and pivot parts are external collaborators and are not
/// modeled here; merged regions and tables are kept as plain value holders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Worksheet {
    pub id: WorksheetId,
    pub name: String,
    rows: BTreeMap<u32, Row>,
    merged: Vec<Range>,
    tables: Vec<Table>,
    #[serde(default = "default_row_height")]
    pub default_row_height: f32,
    #[serde(default)]
    pub hidden: bool,
}

fn default_row_height() -> f32 {
    DEFAULT_ROW_HEIGHT
}

impl Worksheet {
    pub fn new(id: WorksheetId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            rows: BTreeMap::new(),
            merged: Vec::new(),
            tables: Vec::new(),
            default_row_height: DEFAULT_ROW_HEIGHT,
            hidden: false,
        }
    }

    /// Create an empty row at `row_num`, replacing any existing row there.
    pub fn create_row(&mut self, row_num: u32) -> Result<&mut Row, RowError> {
        if row_num > XLSX_LIMITS.last_row_index() {
            return Err(RowError::RowOutOfRange {
                row: row_num,
                max: XLSX_LIMITS.last_row_index(),
            });
        }
        self.rows.insert(row_num, Row::new(row_num));
        Ok(self.rows.get_mut(&row_num).expect("row was just inserted"))
    }

    /// Accept a row parsed from an input file.
    ///
    /// When the source omitted an explicit row number (some writers skip it),
    /// the row is assigned the next sequential number after the sheet's
    /// current last row.
    pub fn add_parsed_row(
        &mut self,
        nodes: Vec<CellNode>,
        explicit_num: Option<u32>,
    ) -> Result<&mut Row, RowError> {
        let row_num = match explicit_num {
            Some(n) => n,
            None => self.last_row_num().map_or(0, |last| last + 1),
        };
        if row_num > XLSX_LIMITS.last_row_index() {
            return Err(RowError::RowOutOfRange {
                row: row_num,
                max: XLSX_LIMITS.last_row_index(),
            });
        }
        self.rows.insert(row_num, Row::from_nodes(row_num, nodes));
        Ok(self.rows.get_mut(&row_num).expect("row was just inserted"))
    }

    pub fn row(&self, row_num: u32) -> Option<&Row> {
        self.rows.get(&row_num)
    }

    pub fn row_mut(&mut self, row_num: u32) -> Option<&mut Row> {
        self.rows.get_mut(&row_num)
    }

    /// Remove and return the row at `row_num`.
    pub fn remove_row(&mut self, row_num: u32) -> Option<Row> {
        self.rows.remove(&row_num)
    }

    pub fn first_row_num(&self) -> Option<u32> {
        self.rows.keys().next().copied()
    }

    pub fn last_row_num(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    /// Number of physically defined rows.
    pub fn physical_number_of_rows(&self) -> usize {
        self.rows.len()
    }

    /// Iterate rows in ascending row order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    pub fn iter_rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.rows.values_mut()
    }

    /// Effective height of a row in points (override or sheet default).
    pub fn row_height_in_points(&self, row_num: u32) -> f32 {
        self.rows
            .get(&row_num)
            .and_then(Row::height_in_points)
            .unwrap_or(self.default_row_height)
    }

    /// Run every row's node reconciliation. The package layer calls this once
    /// before serializing the sheet part.
    pub fn sync_rows(&mut self) {
        for row in self.rows.values_mut() {
            row.sync_nodes();
        }
    }

    /// Add a merged region. Regions must span more than one cell and must not
    /// overlap an existing region. Returns the region's index.
    pub fn add_merged_region(&mut self, region: Range) -> Result<usize, SheetError> {
        if region.is_single_cell() {
            return Err(SheetError::MergeSingleCell { region });
        }
        if let Some(existing) = self.merged.iter().find(|m| m.intersects(&region)) {
            return Err(SheetError::MergeOverlap {
                candidate: region,
                existing: *existing,
            });
        }
        self.merged.push(region);
        Ok(self.merged.len() - 1)
    }

    pub fn remove_merged_region(&mut self, index: usize) -> Result<Range, SheetError> {
        if index >= self.merged.len() {
            return Err(SheetError::MergedRegionOutOfRange {
                index,
                count: self.merged.len(),
            });
        }
        Ok(self.merged.remove(index))
    }

    pub fn merged_regions(&self) -> &[Range] {
        &self.merged
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Attach a table to this sheet. The caller (the workbook) is responsible
    /// for workbook-wide name uniqueness and cache invalidation.
    pub(crate) fn push_table(&mut self, table: Table) {
        self.tables.push(table);
    }

    pub(crate) fn take_table(&mut self, name: &str) -> Option<Table> {
        let idx = self.tables.iter().position(|t| t.matches_name(name))?;
        Some(self.tables.remove(idx))
    }
}
