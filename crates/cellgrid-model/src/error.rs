use thiserror::Error;

use crate::Range;

/// Errors raised by row-level cell operations.
///
/// Index violations are fatal to the single call and are never partially
/// applied; `create_cell` rolls back its structural append before returning
/// one of these.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("invalid column index ({col}) outside allowable range (0..{max})")]
    ColumnOutOfRange { col: u32, max: u32 },
    #[error("invalid row number ({row}) outside allowable range (0..{max})")]
    RowOutOfRange { row: u32, max: u32 },
    #[error("cell at column {col} does not belong to this row")]
    CellNotInRow { col: u32 },
    #[error("row {row} is not defined in this sheet")]
    NoSuchRow { row: u32 },
    #[error("invalid shift range [{first}..{last}] (first must be <= last)")]
    InvalidShiftRange { first: u32, last: u32 },
    #[error("invalid shift step {step} (must be >= 1)")]
    InvalidShiftStep { step: u32 },
    #[error("cannot shift [{first}..{last}] left by {step}: column index would fall below zero")]
    ShiftBelowZero { first: u32, last: u32, step: u32 },
    #[error("cannot shift [{first}..{last}] right by {step}: column index would exceed {max}")]
    ShiftBeyondLimit {
        first: u32,
        last: u32,
        step: u32,
        max: u32,
    },
}

/// Errors raised by sheet-level operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SheetError {
    #[error("merged region {candidate} overlaps existing region {existing}")]
    MergeOverlap { candidate: Range, existing: Range },
    #[error("merged region {region} must span at least two cells")]
    MergeSingleCell { region: Range },
    #[error("no merged region at index {index} (count: {count})")]
    MergedRegionOutOfRange { index: usize, count: usize },
    #[error(transparent)]
    Row(#[from] RowError),
}

/// Errors raised by workbook-level operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WorkbookError {
    #[error("sheet index ({index}) is out of range (0..{count})")]
    SheetOutOfRange { index: usize, count: usize },
    #[error("sheet name '{0}' is already taken")]
    DuplicateSheetName(String),
    #[error("no sheet named '{0}'")]
    NoSuchSheet(String),
    #[error("external link position ({position}) is out of range (1..={count})")]
    LinkOutOfRange { position: usize, count: usize },
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error(transparent)]
    Row(#[from] RowError),
}
