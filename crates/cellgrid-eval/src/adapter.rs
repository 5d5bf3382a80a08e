//! The workbook as the formula engine sees it.
//!
//! [`EvaluationWorkbook`] borrows a [`Workbook`] and resolves the engine's
//! textual vocabulary (sheet names, defined names, workbook prefixes, table
//! names) into positional tokens. It never mutates the model, with one
//! deliberate exception: meeting an absolute file reference that has no link
//! entry yet synthesizes a placeholder entry so the reference stays
//! addressable for the rest of the session.

use std::rc::Rc;

use cellgrid_model::{
    CellRef, ExternalLink, Range, SpreadsheetLimits, Table, Workbook, WorkbookError, XLSX_LIMITS,
};

use crate::error::EvalError;
use crate::names::{
    sheet_index_to_scope, EvaluationName, ExternalNameRef, ExternalSheetRef, GLOBAL_SCOPE,
};
use crate::refparse::{extract_ref_terms, parse_book_token, parse_reference, BookToken, ParsedRef};
use crate::sheet::{CachedSheets, EvaluationSheet, SheetWrapperSource};
use crate::table_cache::{TableCachePolicy, TableNameCache};
use crate::token::{ExternalSheetNames, RefToken, SheetSpan};

/// Lookup for user-defined functions registered outside the workbook.
pub trait UdfFinder {
    /// Position of the function in the caller's registry, if present.
    fn find_function(&self, name: &str) -> Option<usize>;
}

/// The empty registry.
#[derive(Debug, Default)]
pub struct NoUdfs;

impl UdfFinder for NoUdfs {
    fn find_function(&self, _name: &str) -> Option<usize> {
        None
    }
}

/// Read-side adapter between a [`Workbook`] and a formula engine.
pub struct EvaluationWorkbook<'a, S: SheetWrapperSource = CachedSheets> {
    wb: &'a Workbook,
    sheets: S,
    tables: TableNameCache,
    udfs: Box<dyn UdfFinder>,
}

impl<'a> EvaluationWorkbook<'a, CachedSheets> {
    pub fn new(wb: &'a Workbook) -> Self {
        Self::with_sheet_source(wb, CachedSheets::new(), TableCachePolicy::default())
    }

    pub fn with_table_policy(wb: &'a Workbook, policy: TableCachePolicy) -> Self {
        Self::with_sheet_source(wb, CachedSheets::new(), policy)
    }
}

impl<'a, S: SheetWrapperSource> EvaluationWorkbook<'a, S> {
    pub fn with_sheet_source(wb: &'a Workbook, sheets: S, policy: TableCachePolicy) -> Self {
        Self {
            wb,
            sheets,
            tables: TableNameCache::new(policy),
            udfs: Box::new(NoUdfs),
        }
    }

    pub fn with_udf_finder(mut self, udfs: Box<dyn UdfFinder>) -> Self {
        self.udfs = udfs;
        self
    }

    pub fn workbook(&self) -> &'a Workbook {
        self.wb
    }

    pub fn spreadsheet_limits(&self) -> SpreadsheetLimits {
        XLSX_LIMITS
    }

    pub fn table_cache_policy(&self) -> TableCachePolicy {
        self.tables.policy()
    }

    pub fn udf_finder(&self) -> &dyn UdfFinder {
        self.udfs.as_ref()
    }

    // ---- sheets ----------------------------------------------------------

    /// Snapshot of the sheet at `index`, produced by the configured source.
    pub fn sheet(&self, index: usize) -> Result<Rc<EvaluationSheet>, EvalError> {
        self.sheets.sheet(self.wb, index)
    }

    pub fn sheet_name(&self, index: usize) -> Result<&'a str, EvalError> {
        Ok(self.wb.sheet_name(index)?)
    }

    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.wb.sheet_index(name)
    }

    // ---- defined names ---------------------------------------------------

    /// Look a name up at `sheet_index` scope (`-1` for workbook scope). A
    /// miss at a sheet scope falls back to workbook scope; the reverse never
    /// happens, so a workbook-scope query cannot see sheet-local names.
    pub fn name(&self, text: &str, sheet_index: i32) -> Option<EvaluationName> {
        let scope = sheet_index_to_scope(sheet_index)?;
        if let Some(found) = self.name_at_scope(text, scope) {
            return Some(found);
        }
        if sheet_index != GLOBAL_SCOPE {
            return self.name_at_scope(text, cellgrid_model::NameScope::Workbook);
        }
        None
    }

    fn name_at_scope(
        &self,
        text: &str,
        scope: cellgrid_model::NameScope,
    ) -> Option<EvaluationName> {
        self.wb
            .defined_names()
            .iter()
            .enumerate()
            .find(|(_, n)| n.scope == scope && n.matches(text))
            .map(|(index, n)| EvaluationName::from_defined(index, n))
    }

    /// Resolve a defined name's body into reference tokens.
    pub fn name_tokens(&self, name: &EvaluationName) -> Result<Vec<RefToken>, EvalError> {
        self.tokens_of(&name.refers_to, name.sheet_index)
    }

    // ---- external workbooks ----------------------------------------------

    /// Resolve a workbook qualifier to its 1-based link table position.
    ///
    /// Numeric qualifiers (`[3]`) are taken at face value. Named qualifiers
    /// are matched against link targets exactly; an absolute `file:///`
    /// reference is additionally retried as its bare file name, and when
    /// still unmatched a placeholder link entry is appended for it.
    pub fn resolve_external_workbook_index(&self, book_ref: &str) -> Result<usize, EvalError> {
        match parse_book_token(book_ref)? {
            BookToken::Numeric(position) => Ok(position),
            BookToken::Named(name) => {
                let links = &self.wb.external_links;
                if let Some(position) = links.position_of_target(&name) {
                    return Ok(position);
                }
                if let Some(bare) = cellgrid_model::file_url_to_name(&name) {
                    if let Some(position) = links.position_of_target(bare) {
                        return Ok(position);
                    }
                    return Ok(links.push(ExternalLink::new(bare)));
                }
                Err(EvalError::UnresolvedExternalBook(name))
            }
        }
    }

    /// Look a name up in the link entry at the 1-based `book_position`.
    ///
    /// The descriptor's sheet field is the stored scope shifted up by one
    /// (`0` = unscoped); downstream consumers rely on that offset.
    pub fn external_name(
        &self,
        name: &str,
        book_position: usize,
    ) -> Result<ExternalNameRef, EvalError> {
        let link = self
            .wb
            .external_links
            .link_at(book_position)
            .ok_or_else(|| EvalError::UnresolvedExternalBook(format!("[{book_position}]")))?;
        match link.defined_names.iter().position(|n| n.name == name) {
            Some(index) => {
                let stored = link.defined_names[index]
                    .sheet_id
                    .map_or(-1, |v| v as i32);
                Ok(ExternalNameRef {
                    name: name.to_string(),
                    index,
                    sheet: stored + 1,
                })
            }
            None => Err(EvalError::NameNotFound {
                name: name.to_string(),
                book: link.target,
            }),
        }
    }

    /// Resolve an external sheet reference through the link table.
    pub fn external_sheet(
        &self,
        book_ref: &str,
        first_sheet: &str,
        last_sheet: Option<&str>,
    ) -> Result<ExternalSheetRef, EvalError> {
        let book_index = self.resolve_external_workbook_index(book_ref)?;
        let link = self
            .wb
            .external_links
            .link_at(book_index)
            .ok_or_else(|| EvalError::UnresolvedExternalBook(book_ref.to_string()))?;
        Ok(ExternalSheetRef {
            workbook: link.target,
            book_index,
            first_sheet: first_sheet.to_string(),
            last_sheet: last_sheet.map(str::to_string),
        })
    }

    /// Resolve a qualified external name mention (`[Book.xlsx]!Name`) into
    /// its engine token.
    pub fn external_name_token(
        &self,
        book_ref: &str,
        name: &str,
    ) -> Result<RefToken, EvalError> {
        let book = self.resolve_external_workbook_index(book_ref)?;
        let resolved = self.external_name(name, book)?;
        Ok(RefToken::ExternalName {
            book,
            index: resolved.index,
            sheet: resolved.sheet,
        })
    }

    /// Sheet-name-plus-workbook-number addressing belongs to the binary
    /// format's vocabulary and has no counterpart in the link table model.
    pub fn external_sheet_by_number(
        &self,
        _sheet_name: &str,
        _book_position: usize,
    ) -> Result<ExternalSheetRef, EvalError> {
        Err(EvalError::NotSupported(
            "workbook-number external sheet addressing; qualify the reference with a workbook name"
                .into(),
        ))
    }

    // ---- tables ----------------------------------------------------------

    /// Case-insensitive table lookup by internal or display name, through
    /// the lazily built name index.
    pub fn table(&self, name: &str) -> Option<&'a Table> {
        let (sheet_index, table_position) = self.tables.locate(self.wb, name)?;
        let table = self
            .wb
            .sheet_at(sheet_index)
            .ok()?
            .tables()
            .get(table_position)?;
        // A session-cached position can go stale; serve it only while it
        // still names the right table.
        table.matches_name(name).then_some(table)
    }

    // ---- reference tokens ------------------------------------------------

    /// Resolve one textual reference into a token.
    pub fn reference_token(&self, text: &str) -> Result<RefToken, EvalError> {
        let parsed = parse_reference(text)?;
        self.token_from_parsed(parsed, text)
    }

    /// Resolve the reference operands of the formula held by a cell.
    ///
    /// Generic failures are enriched with the cell's location; structural
    /// failures (unresolved books, unsupported addressing) pass through
    /// unchanged so their meaning stays intact.
    pub fn formula_tokens(
        &self,
        sheet_index: usize,
        at: CellRef,
    ) -> Result<Vec<RefToken>, EvalError> {
        let sheet_name = self.wb.sheet_name(sheet_index)?.to_string();
        let sheet = self.sheets.sheet(self.wb, sheet_index)?;
        let formula = sheet
            .cell(at)
            .ok_or_else(|| EvalError::Generic(format!("no cell at {at}")))
            .and_then(|cell| {
                cell.formula
                    .clone()
                    .ok_or_else(|| EvalError::Generic("cell does not contain a formula".into()))
            })
            .map_err(|e| e.at_cell(&sheet_name, at))?;
        self.tokens_of(&formula, sheet_index as i32)
            .map_err(|e| e.at_cell(&sheet_name, at))
    }

    /// Invalidate every evaluation-side cache. Call after any workbook edit.
    pub fn clear_all_cached_result_values(&self) {
        self.sheets.clear();
        self.tables.clear();
    }

    fn tokens_of(&self, body: &str, sheet_index: i32) -> Result<Vec<RefToken>, EvalError> {
        let mut tokens = Vec::new();
        for term in extract_ref_terms(body) {
            if let Some(token) = self.classify_term(&term, sheet_index)? {
                tokens.push(token);
            }
        }
        Ok(tokens)
    }

    /// Decide what one extracted term denotes. Terms that are neither
    /// references nor known names (function calls, literals) yield nothing;
    /// the expression parser proper deals with those.
    fn classify_term(
        &self,
        term: &str,
        sheet_index: i32,
    ) -> Result<Option<RefToken>, EvalError> {
        if term.contains('!') || term.starts_with('[') || term.starts_with('\'') {
            return self.reference_token(term).map(Some);
        }
        if let Ok(range) = Range::from_a1(term) {
            let token = if term.contains(':') {
                RefToken::Area { area: range }
            } else {
                RefToken::Ref { cell: range.start }
            };
            return Ok(Some(token));
        }
        if let Some(name) = self.name(term, sheet_index) {
            return Ok(Some(RefToken::Name { index: name.index }));
        }
        Ok(None)
    }

    fn token_from_parsed(&self, parsed: ParsedRef, original: &str) -> Result<RefToken, EvalError> {
        let ParsedRef {
            book,
            sheet,
            last_sheet,
            range,
            is_area,
        } = parsed;
        match (book, sheet) {
            (Some(book), Some(first)) => {
                let book_index = self.resolve_external_workbook_index(&book)?;
                let sheets = ExternalSheetNames {
                    first,
                    last: last_sheet,
                };
                Ok(if is_area {
                    RefToken::ExternalArea3d {
                        book: book_index,
                        sheets,
                        area: range,
                    }
                } else {
                    RefToken::ExternalRef3d {
                        book: book_index,
                        sheets,
                        cell: range.start,
                    }
                })
            }
            (Some(_), None) => Err(EvalError::InvalidBookReference(original.to_string())),
            (None, Some(first)) => {
                let first_index = self
                    .wb
                    .sheet_index(&first)
                    .ok_or_else(|| EvalError::Workbook(WorkbookError::NoSuchSheet(first.clone())))?;
                let last_index = match &last_sheet {
                    Some(last) => self
                        .wb
                        .sheet_index(last)
                        .ok_or_else(|| EvalError::Workbook(WorkbookError::NoSuchSheet(last.clone())))?,
                    None => first_index,
                };
                let span = SheetSpan {
                    first: first_index.min(last_index),
                    last: first_index.max(last_index),
                };
                Ok(if is_area {
                    RefToken::Area3d { span, area: range }
                } else {
                    RefToken::Ref3d {
                        span,
                        cell: range.start,
                    }
                })
            }
            (None, None) => Ok(if is_area {
                RefToken::Area { area: range }
            } else {
                RefToken::Ref { cell: range.start }
            }),
        }
    }
}
