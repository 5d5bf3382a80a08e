use core::fmt;

use serde::{Deserialize, Serialize};

/// Excel error values, in their BIFF/OOXML order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorValue {
    Null,
    Div0,
    Value,
    Ref,
    Name,
    Num,
    Na,
}

impl ErrorValue {
    /// The literal as it appears in formulas and cell text.
    pub const fn literal(self) -> &'static str {
        match self {
            ErrorValue::Null => "#NULL!",
            ErrorValue::Div0 => "#DIV/0!",
            ErrorValue::Value => "#VALUE!",
            ErrorValue::Ref => "#REF!",
            ErrorValue::Name => "#NAME?",
            ErrorValue::Num => "#NUM!",
            ErrorValue::Na => "#N/A",
        }
    }

    /// Parse an error literal (case-sensitive, as written by Excel).
    pub fn from_literal(text: &str) -> Option<Self> {
        Some(match text {
            "#NULL!" => ErrorValue::Null,
            "#DIV/0!" => ErrorValue::Div0,
            "#VALUE!" => ErrorValue::Value,
            "#REF!" => ErrorValue::Ref,
            "#NAME?" => ErrorValue::Name,
            "#NUM!" => ErrorValue::Num,
            "#N/A" => ErrorValue::Na,
            _ => return None,
        })
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.literal())
    }
}

/// The value held by a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    /// No value set.
    Blank,
    /// IEEE-754 double.
    Number(f64),
    /// Plain string.
    Text(String),
    Bool(bool),
    Error(ErrorValue),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Blank
    }
}

impl CellValue {
    #[inline]
    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl From<ErrorValue> for CellValue {
    fn from(v: ErrorValue) -> Self {
        CellValue::Error(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_literals_round_trip() {
        for err in [
            ErrorValue::Null,
            ErrorValue::Div0,
            ErrorValue::Value,
            ErrorValue::Ref,
            ErrorValue::Name,
            ErrorValue::Num,
            ErrorValue::Na,
        ] {
            assert_eq!(ErrorValue::from_literal(err.literal()), Some(err));
        }
        assert_eq!(ErrorValue::from_literal("#BOGUS!"), None);
    }
}
