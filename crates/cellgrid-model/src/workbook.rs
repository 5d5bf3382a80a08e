use serde::{Deserialize, Serialize};

use crate::error::WorkbookError;
use crate::external::ExternalLinkTable;
use crate::names::{validate_defined_name, DefinedName, DefinedNameError, NameScope};
use crate::row::{MissingCellPolicy, RemovedCell};
use crate::sheet::{Worksheet, WorksheetId};
use crate::style::{SharedStringTable, StyleTable};
use crate::table::{validate_table_name, Table, TableError};

/// The owning aggregate: sheets plus the shared resource tables.
///
/// The style table, shared string table, defined names, and external link
/// table are shared by reference across the whole object tree; only the
/// workbook mutates them structurally. Readers (the evaluation adapter, the
/// formula engine) observe `structure_generation` to notice such mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
    pub styles: StyleTable,
    pub shared_strings: SharedStringTable,
    defined_names: Vec<DefinedName>,
    pub external_links: ExternalLinkTable,
    /// Default policy for `get`-style cell lookups.
    pub missing_cell_policy: MissingCellPolicy,
    /// Invalidation token: bumped whenever a formula is deleted or the
    /// name/table structure changes.
    #[serde(skip)]
    generation: u64,
    #[serde(skip)]
    next_sheet_id: WorksheetId,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            styles: StyleTable::new(),
            shared_strings: SharedStringTable::new(),
            defined_names: Vec::new(),
            external_links: ExternalLinkTable::new(),
            missing_cell_policy: MissingCellPolicy::ReturnNullAndBlank,
            generation: 0,
            next_sheet_id: 1,
        }
    }

    /// Current value of the structural invalidation token.
    pub fn structure_generation(&self) -> u64 {
        self.generation
    }

    fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    // ---- sheets ----------------------------------------------------------

    /// Append a sheet. Sheet names are unique case-insensitively, like the
    /// file format requires. Returns the new sheet's index.
    pub fn add_sheet(&mut self, name: impl Into<String>) -> Result<usize, WorkbookError> {
        let name = name.into();
        if self.sheet_index(&name).is_some() {
            return Err(WorkbookError::DuplicateSheetName(name));
        }
        let id = self.next_sheet_id;
        self.next_sheet_id = self.next_sheet_id.wrapping_add(1);
        self.sheets.push(Worksheet::new(id, name));
        Ok(self.sheets.len() - 1)
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// The single authoritative bounds check for sheet indices; every caller
    /// (the evaluation adapter included) funnels through here so out-of-range
    /// errors read the same workbook-wide.
    pub fn sheet_at(&self, index: usize) -> Result<&Worksheet, WorkbookError> {
        self.sheets.get(index).ok_or(WorkbookError::SheetOutOfRange {
            index,
            count: self.sheets.len(),
        })
    }

    pub fn sheet_at_mut(&mut self, index: usize) -> Result<&mut Worksheet, WorkbookError> {
        let count = self.sheets.len();
        self.sheets
            .get_mut(index)
            .ok_or(WorkbookError::SheetOutOfRange { index, count })
    }

    /// Find a sheet index by name (case-insensitive).
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn sheet_name(&self, index: usize) -> Result<&str, WorkbookError> {
        Ok(&self.sheet_at(index)?.name)
    }

    pub fn iter_sheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.sheets.iter()
    }

    /// Remove a sheet. Names scoped to it are dropped and higher sheet-scoped
    /// names are reindexed; structural caches are invalidated.
    pub fn remove_sheet(&mut self, index: usize) -> Result<Worksheet, WorkbookError> {
        if index >= self.sheets.len() {
            return Err(WorkbookError::SheetOutOfRange {
                index,
                count: self.sheets.len(),
            });
        }
        let sheet = self.sheets.remove(index);
        self.defined_names.retain_mut(|name| match name.scope {
            NameScope::Sheet(s) if s == index => false,
            NameScope::Sheet(s) if s > index => {
                name.scope = NameScope::Sheet(s - 1);
                true
            }
            _ => true,
        });
        self.bump_generation();
        Ok(sheet)
    }

    // ---- cells -----------------------------------------------------------

    /// Remove a cell, running the formula-deletion bookkeeping the row itself
    /// cannot reach: deleting a formula cell invalidates dependent caches via
    /// the structure generation.
    pub fn remove_cell(
        &mut self,
        sheet_index: usize,
        row_num: u32,
        col: u32,
    ) -> Result<RemovedCell, WorkbookError> {
        let count = self.sheets.len();
        let sheet = self
            .sheets
            .get_mut(sheet_index)
            .ok_or(WorkbookError::SheetOutOfRange {
                index: sheet_index,
                count,
            })?;
        let row = sheet
            .row_mut(row_num)
            .ok_or(crate::error::RowError::NoSuchRow { row: row_num })?;
        let removed = row.remove_cell(col).map_err(WorkbookError::Row)?;
        if removed.had_formula {
            self.bump_generation();
        }
        Ok(removed)
    }

    /// Reconcile every row of every sheet. The package layer calls this once
    /// before serializing the workbook.
    pub fn sync_all(&mut self) {
        for sheet in &mut self.sheets {
            sheet.sync_rows();
        }
    }

    // ---- defined names ---------------------------------------------------

    pub fn create_defined_name(
        &mut self,
        name: impl Into<String>,
        scope: NameScope,
        refers_to: impl Into<String>,
    ) -> Result<&DefinedName, DefinedNameError> {
        let name = name.into();
        let name = name.trim().to_string();
        validate_defined_name(&name).map_err(DefinedNameError::Invalid)?;
        if let NameScope::Sheet(index) = scope {
            if index >= self.sheets.len() {
                return Err(DefinedNameError::NoSuchSheet(index));
            }
        }
        if self
            .defined_names
            .iter()
            .any(|n| n.scope == scope && n.matches(&name))
        {
            return Err(DefinedNameError::Duplicate);
        }
        self.defined_names.push(DefinedName::new(name, scope, refers_to));
        self.bump_generation();
        Ok(self.defined_names.last().expect("name was just pushed"))
    }

    /// Remove a name at an exact scope. Returns whether anything was removed.
    pub fn remove_defined_name(&mut self, name: &str, scope: NameScope) -> bool {
        let Some(idx) = self
            .defined_names
            .iter()
            .position(|n| n.scope == scope && n.matches(name))
        else {
            return false;
        };
        self.defined_names.remove(idx);
        self.bump_generation();
        true
    }

    /// Exact-scope lookup (case-insensitive on the name text). Scope
    /// fallback rules live in the evaluation adapter.
    pub fn find_defined_name(&self, name: &str, scope: NameScope) -> Option<&DefinedName> {
        self.defined_names
            .iter()
            .find(|n| n.scope == scope && n.matches(name))
    }

    pub fn defined_names(&self) -> &[DefinedName] {
        &self.defined_names
    }

    // ---- tables ----------------------------------------------------------

    /// Register a table on a sheet. Table names are workbook-scoped.
    pub fn add_table(&mut self, sheet_index: usize, table: Table) -> Result<(), TableError> {
        validate_table_name(&table.name)?;
        if self
            .sheets
            .iter()
            .flat_map(|s| s.tables().iter())
            .any(|t| t.matches_name(&table.name) || t.matches_name(&table.display_name))
        {
            return Err(TableError::DuplicateName(table.name));
        }
        let sheet = self
            .sheets
            .get_mut(sheet_index)
            .ok_or(TableError::NoSuchSheet(sheet_index))?;
        sheet.push_table(table);
        self.bump_generation();
        Ok(())
    }

    /// Drop a table by name, wherever it lives. Returns whether one was found.
    pub fn remove_table(&mut self, name: &str) -> bool {
        for sheet in &mut self.sheets {
            if sheet.take_table(name).is_some() {
                self.bump_generation();
                return true;
            }
        }
        false
    }

    /// Case-insensitive workbook-wide table lookup.
    pub fn find_table(&self, name: &str) -> Option<(usize, &Table)> {
        self.sheets.iter().enumerate().find_map(|(i, sheet)| {
            sheet
                .tables()
                .iter()
                .find(|t| t.matches_name(name))
                .map(|t| (i, t))
        })
    }
}
