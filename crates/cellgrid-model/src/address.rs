use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dimension limits of the SpreadsheetML (.xlsx) grid.
///
/// All bounds checks in the model go through one instance of this type so that
/// error messages stay uniform across the workbook.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetLimits {
    /// Number of rows per sheet.
    pub max_rows: u32,
    /// Number of columns per row.
    pub max_cols: u32,
}

/// Limits of the 2007+ (.xlsx) format: 1,048,576 rows by 16,384 columns.
pub const XLSX_LIMITS: SpreadsheetLimits = SpreadsheetLimits {
    max_rows: 1_048_576,
    max_cols: 16_384,
};

impl SpreadsheetLimits {
    /// 0-based index of the last valid row.
    #[inline]
    pub const fn last_row_index(&self) -> u32 {
        self.max_rows - 1
    }

    /// 0-based index of the last valid column.
    #[inline]
    pub const fn last_col_index(&self) -> u32 {
        self.max_cols - 1
    }
}

/// Errors produced when parsing A1-style references.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum RefParseError {
    #[error("empty reference")]
    Empty,
    #[error("reference has no column letters")]
    NoColumn,
    #[error("reference has no row digits")]
    NoRow,
    #[error("column out of bounds")]
    ColumnOutOfBounds,
    #[error("row out of bounds")]
    RowOutOfBounds,
    #[error("unexpected trailing characters")]
    Trailing,
}

/// A single cell coordinate, 0-indexed in both axes.
///
/// `CellRef { row: 0, col: 0 }` is `A1`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    #[inline]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Render as A1 notation (`A1`, `BC32`, ...).
    pub fn to_a1(self) -> String {
        let mut out = column_label(self.col);
        out.push_str(&(self.row + 1).to_string());
        out
    }

    /// Parse A1 notation. `$` anchors are accepted and ignored.
    pub fn from_a1(text: &str) -> Result<Self, RefParseError> {
        let (col, row, rest) = scan_a1(text.trim())?;
        if !rest.is_empty() {
            return Err(RefParseError::Trailing);
        }
        Ok(Self { row, col })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// An inclusive rectangular region, stored normalized
/// (`start.row <= end.row`, `start.col <= end.col`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: CellRef,
    pub end: CellRef,
}

impl Range {
    pub const fn new(a: CellRef, b: CellRef) -> Self {
        let (top, bottom) = if a.row <= b.row {
            (a.row, b.row)
        } else {
            (b.row, a.row)
        };
        let (left, right) = if a.col <= b.col {
            (a.col, b.col)
        } else {
            (b.col, a.col)
        };
        Self {
            start: CellRef::new(top, left),
            end: CellRef::new(bottom, right),
        }
    }

    /// Parse `A1:B2`, or a single cell `C3` (degenerate range).
    pub fn from_a1(text: &str) -> Result<Self, RefParseError> {
        match text.split_once(':') {
            Some((a, b)) => Ok(Self::new(CellRef::from_a1(a)?, CellRef::from_a1(b)?)),
            None => {
                let cell = CellRef::from_a1(text)?;
                Ok(Self::new(cell, cell))
            }
        }
    }

    #[inline]
    pub const fn contains(&self, cell: CellRef) -> bool {
        self.start.row <= cell.row
            && cell.row <= self.end.row
            && self.start.col <= cell.col
            && cell.col <= self.end.col
    }

    /// Whether two regions share at least one cell.
    pub const fn intersects(&self, other: &Range) -> bool {
        self.start.row <= other.end.row
            && other.start.row <= self.end.row
            && self.start.col <= other.end.col
            && other.start.col <= self.end.col
    }

    #[inline]
    pub const fn is_single_cell(&self) -> bool {
        self.start.row == self.end.row && self.start.col == self.end.col
    }

    #[inline]
    pub const fn cell_count(&self) -> u64 {
        ((self.end.row - self.start.row + 1) as u64) * ((self.end.col - self.start.col + 1) as u64)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

/// Convert a 0-based column index to its letter label (`0` -> `A`, `27` -> `AB`).
pub fn column_label(col: u32) -> String {
    let mut n = col + 1;
    let mut buf = [0u8; 7];
    let mut at = buf.len();
    while n > 0 {
        at -= 1;
        buf[at] = b'A' + ((n - 1) % 26) as u8;
        n = (n - 1) / 26;
    }
    // Buffer holds only ASCII letters.
    String::from_utf8_lossy(&buf[at..]).into_owned()
}

/// Parse a column label back to its 0-based index.
pub fn column_index(label: &str) -> Result<u32, RefParseError> {
    if label.is_empty() {
        return Err(RefParseError::NoColumn);
    }
    let mut acc: u64 = 0;
    for b in label.bytes() {
        if !b.is_ascii_alphabetic() {
            return Err(RefParseError::NoColumn);
        }
        acc = acc * 26 + u64::from(b.to_ascii_uppercase() - b'A') + 1;
        if acc > XLSX_LIMITS.max_cols as u64 {
            return Err(RefParseError::ColumnOutOfBounds);
        }
    }
    Ok((acc - 1) as u32)
}

/// Scan one A1 reference from the front of `text`.
///
/// Returns `(col, row, remainder)`; the remainder lets range parsing reuse the
/// same scanner.
fn scan_a1(text: &str) -> Result<(u32, u32, &str), RefParseError> {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return Err(RefParseError::Empty);
    }

    let mut i = 0;
    if bytes[i] == b'$' {
        i += 1;
    }
    let col_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    if i == col_start {
        return Err(RefParseError::NoColumn);
    }
    let col = column_index(&text[col_start..i])?;

    if i < bytes.len() && bytes[i] == b'$' {
        i += 1;
    }
    let row_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == row_start {
        return Err(RefParseError::NoRow);
    }
    let row_1: u32 = text[row_start..i]
        .parse()
        .map_err(|_| RefParseError::RowOutOfBounds)?;
    if row_1 == 0 || row_1 > XLSX_LIMITS.max_rows {
        return Err(RefParseError::RowOutOfBounds);
    }

    Ok((col, row_1 - 1, &text[i..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a1_round_trip() {
        for (row, col, a1) in [(0, 0, "A1"), (31, 54, "BC32"), (1_048_575, 16_383, "XFD1048576")] {
            let cell = CellRef::new(row, col);
            assert_eq!(cell.to_a1(), a1);
            assert_eq!(CellRef::from_a1(a1).unwrap(), cell);
        }
    }

    #[test]
    fn a1_accepts_anchors_and_lowercase() {
        assert_eq!(CellRef::from_a1("$b$2").unwrap(), CellRef::new(1, 1));
    }

    #[test]
    fn a1_rejects_out_of_bounds() {
        assert_eq!(CellRef::from_a1("XFE1"), Err(RefParseError::ColumnOutOfBounds));
        assert_eq!(CellRef::from_a1("A1048577"), Err(RefParseError::RowOutOfBounds));
        assert_eq!(CellRef::from_a1("A0"), Err(RefParseError::RowOutOfBounds));
    }

    #[test]
    fn range_normalizes_and_tests_membership() {
        let r = Range::from_a1("B3:A1").unwrap();
        assert_eq!(r.start, CellRef::new(0, 0));
        assert_eq!(r.end, CellRef::new(2, 1));
        assert!(r.contains(CellRef::new(1, 1)));
        assert!(!r.contains(CellRef::new(3, 0)));
        assert_eq!(r.to_string(), "A1:B3");
    }

    #[test]
    fn range_intersection() {
        let a = Range::from_a1("A1:C3").unwrap();
        let b = Range::from_a1("C3:D4").unwrap();
        let c = Range::from_a1("D4:E5").unwrap();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
