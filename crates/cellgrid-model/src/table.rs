use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Range;

/// Errors raised when validating or registering a table.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("table name cannot be empty")]
    EmptyName,
    #[error("table name exceeds the 255 character limit")]
    NameTooLong,
    #[error("table name must start with a letter or '_'")]
    InvalidStartChar,
    #[error("table name contains invalid character '{ch}'")]
    InvalidChar { ch: char },
    #[error("table name looks like a cell reference")]
    LooksLikeCellReference,
    #[error("a table named '{0}' already exists in the workbook")]
    DuplicateName(String),
    #[error("sheet index {0} does not exist")]
    NoSuchSheet(usize),
}

/// One column of a table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub id: u32,
    pub name: String,
}

/// A worksheet table (Excel ListObject), kept as a value holder.
///
/// Structured-reference expansion and table styling live elsewhere; the model
/// only needs names, the anchoring range, and the column headers for lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Internal (relationship) name; used for lookup.
    pub name: String,
    /// User-visible name shown in formulas.
    pub display_name: String,
    /// The full range the table occupies, headers and totals included.
    pub range: Range,
    #[serde(default)]
    pub header_row_count: u32,
    #[serde(default)]
    pub totals_row_count: u32,
    #[serde(default)]
    pub columns: Vec<TableColumn>,
}

impl Table {
    pub fn new(name: impl Into<String>, range: Range) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            range,
            header_row_count: 1,
            totals_row_count: 0,
            columns: Vec::new(),
        }
    }

    /// True when either the internal or the display name matches
    /// (case-insensitive, as in formula text).
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.display_name.eq_ignore_ascii_case(name)
    }

    /// 0-based index of the column titled `name`, if any.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Validate a table name against the Excel rules that matter for formulas:
/// non-empty, at most 255 characters, starts with a letter or `_`, remaining
/// characters alphanumeric / `_` / `.`, and not an A1 look-alike.
pub fn validate_table_name(name: &str) -> Result<(), TableError> {
    if name.is_empty() {
        return Err(TableError::EmptyName);
    }
    if name.chars().count() > 255 {
        return Err(TableError::NameTooLong);
    }

    let mut chars = name.chars();
    let first = chars.next().ok_or(TableError::EmptyName)?;
    if !(first.is_alphabetic() || first == '_') {
        return Err(TableError::InvalidStartChar);
    }
    for ch in chars {
        if !(ch.is_alphanumeric() || ch == '_' || ch == '.') {
            return Err(TableError::InvalidChar { ch });
        }
    }

    if Range::from_a1(name).is_ok() {
        return Err(TableError::LooksLikeCellReference);
    }
    Ok(())
}
