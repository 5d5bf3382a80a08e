//! `cellgrid-eval` adapts a [`cellgrid_model::Workbook`] for consumption by a
//! formula engine.
//!
//! The engine speaks in positions: sheet indices, name list positions,
//! 1-based external link positions. Formulas speak in text: sheet names,
//! defined names, `[Book]` prefixes, table names. This crate owns the
//! translation, the scoping rules for name lookup, and the caches that make
//! repeated lookups cheap during an evaluation session.
//!
//! The adapter is read-only over the model except for one carve-out: an
//! absolute `file:///` workbook reference with no matching link entry gets a
//! placeholder entry synthesized on first sight, so later mentions of the
//! same book resolve to the same position.

mod adapter;
mod error;
mod names;
mod refparse;
mod sheet;
mod table_cache;
mod token;

pub use adapter::{EvaluationWorkbook, NoUdfs, UdfFinder};
pub use error::EvalError;
pub use names::{
    scope_to_sheet_index, sheet_index_to_scope, EvaluationName, ExternalNameRef, ExternalSheetRef,
    GLOBAL_SCOPE,
};
pub use refparse::{extract_ref_terms, parse_book_token, parse_reference, BookToken, ParsedRef};
pub use sheet::{CachedSheets, DirectSheets, EvaluationCell, EvaluationSheet, SheetWrapperSource};
pub use table_cache::TableCachePolicy;
pub use token::{ExternalSheetNames, RefToken, SheetSpan};
