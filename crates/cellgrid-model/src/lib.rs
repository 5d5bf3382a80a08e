//! `cellgrid-model` defines the in-memory object model for OOXML (.xlsx)
//! spreadsheets: workbooks, sheets, rows, and cells, plus the shared resource
//! tables (styles, shared strings, defined names, external links).
//!
//! The model keeps a logical, column-ordered view of each row alongside the
//! physically ordered backing node sequence that the XML package layer
//! serializes. The two may drift apart during mutation; rows reconcile them
//! lazily via [`Row::sync_nodes`] just before externalization.
//!
//! The crate is self-contained so it can be reused by:
//! - the evaluation adapter (`cellgrid-eval`) feeding a formula engine
//! - XML/ZIP package import/export layers (external collaborators)

mod address;
mod cell;
mod error;
pub mod external;
mod names;
pub mod node;
mod row;
mod sheet;
mod style;
pub mod table;
mod value;
mod workbook;

pub use address::{
    column_index, column_label, CellRef, Range, RefParseError, SpreadsheetLimits, XLSX_LIMITS,
};
pub use cell::{ArrayGroupId, Cell, CellFormula, CellType};
pub use error::{RowError, SheetError, WorkbookError};
pub use external::{file_url_to_name, ExternalDefinedName, ExternalLink, ExternalLinkTable};
pub use names::{
    validate_defined_name, DefinedName, DefinedNameError, NameScope, NameValidationError,
    MAX_DEFINED_NAME_LEN,
};
pub use row::{MissingCellPolicy, RemovedCell, Row};
pub use sheet::{Worksheet, WorksheetId, DEFAULT_ROW_HEIGHT};
pub use style::{SharedStringTable, Style, StyleTable};
pub use table::{validate_table_name, Table, TableColumn, TableError};
pub use value::{CellValue, ErrorValue};
pub use workbook::Workbook;
