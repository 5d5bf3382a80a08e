//! Name descriptors in the evaluation vocabulary.
//!
//! The engine addresses name scopes with a signed sheet index where `-1`
//! means workbook scope; the model stores the same thing as [`NameScope`].
//! Conversions between the two dialects live here.

use cellgrid_model::{DefinedName, NameScope};

/// Signed sheet index meaning "workbook scope".
pub const GLOBAL_SCOPE: i32 = -1;

/// Translate a model scope into the signed-index dialect.
pub fn scope_to_sheet_index(scope: NameScope) -> i32 {
    match scope {
        NameScope::Workbook => GLOBAL_SCOPE,
        NameScope::Sheet(index) => index as i32,
    }
}

/// Translate a signed sheet index into a model scope. Negative values other
/// than the global sentinel have no meaning.
pub fn sheet_index_to_scope(sheet_index: i32) -> Option<NameScope> {
    match sheet_index {
        GLOBAL_SCOPE => Some(NameScope::Workbook),
        i if i >= 0 => Some(NameScope::Sheet(i as usize)),
        _ => None,
    }
}

/// A resolved defined name of this workbook.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationName {
    pub name: String,
    /// Position in the workbook's name list; stable until the name list is
    /// structurally changed.
    pub index: usize,
    /// Scope in the signed-index dialect.
    pub sheet_index: i32,
    pub refers_to: String,
}

impl EvaluationName {
    pub(crate) fn from_defined(index: usize, name: &DefinedName) -> Self {
        Self {
            name: name.name.clone(),
            index,
            sheet_index: scope_to_sheet_index(name.scope),
            refers_to: name.refers_to.clone(),
        }
    }
}

/// A name resolved inside a linked external workbook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalNameRef {
    pub name: String,
    /// Position in the link entry's name list.
    pub index: usize,
    /// Scoping sheet, shifted up by one: `0` means unscoped, `n > 0` means
    /// the external workbook's sheet `n - 1`. Consumers of the descriptor
    /// rely on this offset; keep it.
    pub sheet: i32,
}

/// An external sheet (or span of sheets) resolved through the link table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalSheetRef {
    /// Link target the reference resolved to.
    pub workbook: String,
    /// 1-based position in the link table.
    pub book_index: usize,
    pub first_sheet: String,
    pub last_sheet: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_dialect_round_trips() {
        assert_eq!(scope_to_sheet_index(NameScope::Workbook), -1);
        assert_eq!(scope_to_sheet_index(NameScope::Sheet(4)), 4);
        assert_eq!(sheet_index_to_scope(-1), Some(NameScope::Workbook));
        assert_eq!(sheet_index_to_scope(2), Some(NameScope::Sheet(2)));
        assert_eq!(sheet_index_to_scope(-5), None);
    }
}
