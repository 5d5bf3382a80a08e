//! The external workbook link table.
//!
//! Formulas referring to other workbooks carry a 1-based index into this
//! table inside their reference tokens; index 0 means "this workbook". The
//! table lives behind interior mutability because the evaluation adapter —
//! otherwise a pure reader — is allowed to synthesize a "not yet linked"
//! placeholder entry when it meets an absolute file reference with no
//! matching link (single-writer discipline otherwise unchanged).

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

/// A name defined inside a linked external workbook.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDefinedName {
    pub name: String,
    /// Sheet the name is scoped to in the external workbook, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<u32>,
}

/// One linked external workbook.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    /// Linked file name or path, as recorded in the link part.
    pub target: String,
    /// Sheet names of the external workbook, in tab order.
    #[serde(default)]
    pub sheet_names: Vec<String>,
    /// Names defined by the external workbook.
    #[serde(default)]
    pub defined_names: Vec<ExternalDefinedName>,
}

impl ExternalLink {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            sheet_names: Vec::new(),
            defined_names: Vec::new(),
        }
    }

    /// 0-based position of `sheet_name` in the external workbook's tab order.
    pub fn sheet_position(&self, sheet_name: &str) -> Option<usize> {
        self.sheet_names
            .iter()
            .position(|s| s.eq_ignore_ascii_case(sheet_name))
    }
}

/// Ordered collection of external links, 1-based in the formula vocabulary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalLinkTable {
    entries: RefCell<Vec<ExternalLink>>,
}

impl ExternalLinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Append a link, returning its 1-based index.
    pub fn push(&self, link: ExternalLink) -> usize {
        let mut entries = self.entries.borrow_mut();
        entries.push(link);
        entries.len()
    }

    /// Snapshot of the entry at the 1-based `position`.
    pub fn link_at(&self, position: usize) -> Option<ExternalLink> {
        if position == 0 {
            return None;
        }
        self.entries.borrow().get(position - 1).cloned()
    }

    /// 1-based position of the entry whose target matches `target` exactly
    /// (case-sensitive, as link targets are file names recorded verbatim).
    pub fn position_of_target(&self, target: &str) -> Option<usize> {
        self.entries
            .borrow()
            .iter()
            .position(|l| l.target == target)
            .map(|i| i + 1)
    }
}

/// Reduce a quoted absolute file URL (`'file:///C:/tmp/Book2.xlsx'`) to the
/// bare file name (`Book2.xlsx`). Returns `None` when `raw` is not of that
/// shape.
pub fn file_url_to_name(raw: &str) -> Option<&str> {
    let inner = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(raw);
    let path = inner.strip_prefix("file:///")?;
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    (!name.is_empty()).then_some(name)
}
