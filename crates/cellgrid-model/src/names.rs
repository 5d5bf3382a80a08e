use core::fmt;

use serde::{Deserialize, Serialize};

/// Maximum length of a defined name, per the file format.
pub const MAX_DEFINED_NAME_LEN: usize = 255;

/// Scope of a defined name: visible workbook-wide or only on one sheet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "sheet", rename_all = "snake_case")]
pub enum NameScope {
    Workbook,
    /// Sheet scope, by 0-based sheet index.
    Sheet(usize),
}

/// A named range / constant / formula.
///
/// Name text is case-preserving in storage and case-insensitive for lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefinedName {
    pub name: String,
    pub scope: NameScope,
    /// Definition formula, stored without a leading `=`. Resolved lazily into
    /// reference tokens by the evaluation layer.
    pub refers_to: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl DefinedName {
    pub fn new(name: impl Into<String>, scope: NameScope, refers_to: impl Into<String>) -> Self {
        let refers_to = refers_to.into();
        let trimmed = refers_to.trim();
        Self {
            name: name.into(),
            scope,
            refers_to: trimmed.strip_prefix('=').unwrap_or(trimmed).to_string(),
            hidden: false,
            comment: None,
        }
    }

    /// Case-insensitive name match.
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Validation failures for defined names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameValidationError {
    Empty,
    TooLong { len: usize },
    BadStartChar(char),
    BadChar { ch: char, at: usize },
    LooksLikeCellReference,
}

impl fmt::Display for NameValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameValidationError::Empty => f.write_str("defined name cannot be empty"),
            NameValidationError::TooLong { len } => {
                write!(f, "defined name is too long ({len} > {MAX_DEFINED_NAME_LEN})")
            }
            NameValidationError::BadStartChar(ch) => {
                write!(f, "defined name cannot start with '{ch}'")
            }
            NameValidationError::BadChar { ch, at } => {
                write!(f, "invalid character '{ch}' at index {at} in defined name")
            }
            NameValidationError::LooksLikeCellReference => {
                f.write_str("defined name cannot look like a cell reference")
            }
        }
    }
}

impl std::error::Error for NameValidationError {}

/// Errors raised by workbook defined-name operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefinedNameError {
    Invalid(NameValidationError),
    /// A name with the same text already exists at the same scope.
    Duplicate,
    NoSuchSheet(usize),
}

impl fmt::Display for DefinedNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinedNameError::Invalid(err) => write!(f, "{err}"),
            DefinedNameError::Duplicate => f.write_str("defined name already exists in scope"),
            DefinedNameError::NoSuchSheet(index) => {
                write!(f, "defined name scoped to missing sheet index {index}")
            }
        }
    }
}

impl std::error::Error for DefinedNameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DefinedNameError::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

/// Validate a defined name: non-empty, length-bounded, starts with a letter /
/// `_` / `\`, continues with letters, digits, `_` or `.`, and does not
/// collide with an A1-style cell reference.
pub fn validate_defined_name(name: &str) -> Result<(), NameValidationError> {
    if name.is_empty() {
        return Err(NameValidationError::Empty);
    }
    let len = name.chars().count();
    if len > MAX_DEFINED_NAME_LEN {
        return Err(NameValidationError::TooLong { len });
    }

    if crate::CellRef::from_a1(name).is_ok() {
        return Err(NameValidationError::LooksLikeCellReference);
    }

    let mut chars = name.chars().enumerate();
    let (_, first) = chars.next().ok_or(NameValidationError::Empty)?;
    if !(first.is_alphabetic() || first == '_' || first == '\\') {
        return Err(NameValidationError::BadStartChar(first));
    }
    for (at, ch) in chars {
        if !(ch.is_alphanumeric() || ch == '_' || ch == '.') {
            return Err(NameValidationError::BadChar { ch, at });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refers_to_is_normalized() {
        let n = DefinedName::new("Rates", NameScope::Workbook, " =Sheet1!$A$1:$A$9 ");
        assert_eq!(n.refers_to, "Sheet1!$A$1:$A$9");
    }

    #[test]
    fn validation_rules() {
        assert!(validate_defined_name("My_Name.1").is_ok());
        assert!(validate_defined_name("_hidden").is_ok());
        assert_eq!(validate_defined_name(""), Err(NameValidationError::Empty));
        assert_eq!(
            validate_defined_name("1st"),
            Err(NameValidationError::BadStartChar('1'))
        );
        assert_eq!(
            validate_defined_name("A1"),
            Err(NameValidationError::LooksLikeCellReference)
        );
        assert_eq!(
            validate_defined_name("a b"),
            Err(NameValidationError::BadChar { ch: ' ', at: 1 })
        );
    }
}
