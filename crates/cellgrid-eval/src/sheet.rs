//! Read-only sheet views for the engine.
//!
//! The engine reads cell contents many times per evaluation; an
//! [`EvaluationSheet`] is an immutable snapshot of one worksheet's populated
//! cells, keyed for direct lookup, so repeated reads do not walk the row
//! tree again. How snapshots are shared between lookups is a policy choice
//! behind [`SheetWrapperSource`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use cellgrid_model::{CellRef, CellValue, Workbook};

use crate::error::EvalError;

/// One populated cell as the engine sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationCell {
    pub at: CellRef,
    pub value: CellValue,
    /// Formula body without the leading `=`, when the cell has one.
    pub formula: Option<String>,
}

/// Immutable snapshot of one worksheet.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationSheet {
    index: usize,
    name: String,
    cells: HashMap<CellRef, EvaluationCell>,
}

impl EvaluationSheet {
    /// Build a snapshot. Sheet bounds are checked by the workbook itself so
    /// out-of-range indices fail the same way everywhere.
    pub(crate) fn snapshot(wb: &Workbook, index: usize) -> Result<Self, EvalError> {
        let sheet = wb.sheet_at(index)?;
        let mut cells = HashMap::new();
        for row in sheet.iter_rows() {
            for cell in row.iter_cells() {
                let at = CellRef::new(row.row_num(), cell.column());
                cells.insert(
                    at,
                    EvaluationCell {
                        at,
                        value: cell.value.clone(),
                        formula: cell.formula.as_ref().map(|f| f.text.clone()),
                    },
                );
            }
        }
        Ok(Self {
            index,
            name: sheet.name.clone(),
            cells,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell(&self, at: CellRef) -> Option<&EvaluationCell> {
        self.cells.get(&at)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// Strategy for producing sheet snapshots.
pub trait SheetWrapperSource {
    fn sheet(&self, wb: &Workbook, index: usize) -> Result<Rc<EvaluationSheet>, EvalError>;
    /// Drop any retained snapshots.
    fn clear(&self);
}

/// Memoizing source: one snapshot per sheet index, reused until cleared.
/// This is the default; snapshots go stale if the workbook is edited, so the
/// owner must clear cached values after edits.
#[derive(Debug, Default)]
pub struct CachedSheets {
    cache: RefCell<HashMap<usize, Rc<EvaluationSheet>>>,
}

impl CachedSheets {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SheetWrapperSource for CachedSheets {
    fn sheet(&self, wb: &Workbook, index: usize) -> Result<Rc<EvaluationSheet>, EvalError> {
        if let Some(found) = self.cache.borrow().get(&index) {
            return Ok(Rc::clone(found));
        }
        let built = Rc::new(EvaluationSheet::snapshot(wb, index)?);
        self.cache.borrow_mut().insert(index, Rc::clone(&built));
        Ok(built)
    }

    fn clear(&self) {
        self.cache.borrow_mut().clear();
    }
}

/// Non-caching source: a fresh snapshot per call. Slower, never stale.
#[derive(Debug, Default)]
pub struct DirectSheets;

impl SheetWrapperSource for DirectSheets {
    fn sheet(&self, wb: &Workbook, index: usize) -> Result<Rc<EvaluationSheet>, EvalError> {
        Ok(Rc::new(EvaluationSheet::snapshot(wb, index)?))
    }

    fn clear(&self) {}
}
