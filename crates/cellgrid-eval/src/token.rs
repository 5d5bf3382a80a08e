//! Reference operand tokens handed to the formula engine.
//!
//! Tokens are resolved views of the textual references found in formulas:
//! sheet names become sheet indices, workbook prefixes become 1-based link
//! table positions, defined names become positions in the workbook's name
//! list. External sheet names stay textual because the tab order of a foreign
//! workbook is only known from its link entry, not from this workbook.

use cellgrid_model::{CellRef, Range};
use serde::{Deserialize, Serialize};

/// An inclusive run of sheet indices, for `Sheet1:Sheet3!A1` style spans.
/// A plain single-sheet reference has `first == last`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSpan {
    pub first: usize,
    pub last: usize,
}

impl SheetSpan {
    pub const fn single(index: usize) -> Self {
        Self {
            first: index,
            last: index,
        }
    }
}

/// External sheet addressing, by name. `last` is set for spans.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSheetNames {
    pub first: String,
    pub last: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RefToken {
    /// A single cell on the sheet owning the formula.
    Ref { cell: CellRef },
    /// A rectangular area on the sheet owning the formula.
    Area { area: Range },
    /// A single cell qualified with sheets of this workbook.
    Ref3d { span: SheetSpan, cell: CellRef },
    /// An area qualified with sheets of this workbook.
    Area3d { span: SheetSpan, area: Range },
    /// A single cell in an external workbook; `book` is the 1-based link
    /// table position.
    ExternalRef3d {
        book: usize,
        sheets: ExternalSheetNames,
        cell: CellRef,
    },
    /// An area in an external workbook.
    ExternalArea3d {
        book: usize,
        sheets: ExternalSheetNames,
        area: Range,
    },
    /// A defined name of this workbook, by position in the name list.
    Name { index: usize },
    /// A name defined in an external workbook. `sheet` carries the shifted
    /// scope from [`crate::ExternalNameRef`].
    ExternalName {
        book: usize,
        index: usize,
        sheet: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_span_collapses_both_ends() {
        let span = SheetSpan::single(3);
        assert_eq!(span.first, 3);
        assert_eq!(span.last, 3);
    }
}
