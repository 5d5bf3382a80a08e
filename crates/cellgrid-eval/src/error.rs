use cellgrid_model::{CellRef, WorkbookError};
use thiserror::Error;

/// Errors surfaced to the formula engine.
///
/// Lookups that can legitimately be absent (names, tables) return `None`
/// through their APIs instead of one of these; errors here mean a structural
/// problem the caller must handle.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EvalError {
    /// A book reference resolved to nothing and nothing could be synthesized.
    #[error("could not resolve external workbook reference '{0}'")]
    UnresolvedExternalBook(String),
    /// An external defined name was not found in the referenced link entry.
    #[error("no external name '{name}' in linked workbook '{book}'")]
    NameNotFound { name: String, book: String },
    /// The reference style is structurally incompatible with this format.
    /// Always fatal; signals a caller bug, not a retryable condition.
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("malformed workbook reference '{0}'")]
    InvalidBookReference(String),
    #[error(transparent)]
    Workbook(#[from] WorkbookError),
    /// A generic failure enriched with the cell it occurred at.
    #[error("{source} (at {sheet}!{cell})")]
    AtCell {
        sheet: String,
        cell: CellRef,
        source: Box<EvalError>,
    },
    /// Catch-all for unexpected conditions without a more specific variant.
    #[error("{0}")]
    Generic(String),
}

impl EvalError {
    /// Attach cell-location context to a *generic* failure; more specific
    /// failures pass through unchanged so their meaning is not diluted.
    pub fn at_cell(self, sheet: impl Into<String>, cell: CellRef) -> EvalError {
        match self {
            EvalError::Generic(_) => EvalError::AtCell {
                sheet: sheet.into(),
                cell,
                source: Box::new(self),
            },
            other => other,
        }
    }
}
