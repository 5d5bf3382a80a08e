use serde::{Deserialize, Serialize};

use crate::node::{CellNode, NodeId};
use crate::{CellRef, CellValue, ErrorValue};

/// Cell content classification, as exposed to callers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    Blank,
    Numeric,
    Text,
    Bool,
    Error,
    Formula,
}

/// Identifier of a multi-cell (array) formula group within a sheet.
pub type ArrayGroupId = u32;

/// A formula attached to a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellFormula {
    /// Formula text, stored without a leading `=`.
    pub text: String,
    /// Last computed result, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<CellValue>,
    /// Array formula group membership, if the cell is part of one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<ArrayGroupId>,
}

impl CellFormula {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        let text = trimmed.strip_prefix('=').unwrap_or(trimmed).to_string();
        Self {
            text,
            cached: None,
            group: None,
        }
    }
}

/// One logical cell: a value/formula plus a style reference, backed 1:1 by a
/// node in the owning row's [`crate::node::NodeStore`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// 0-based column index; unique within the owning row.
    col: u32,
    /// Handle of the backing node.
    node: NodeId,
    #[serde(default)]
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<CellFormula>,
    /// Index into the workbook style table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<u32>,
}

impl Cell {
    /// A fresh blank cell over `node`.
    pub fn blank(col: u32, node: NodeId) -> Self {
        Self {
            col,
            node,
            value: CellValue::Blank,
            formula: None,
            style: None,
        }
    }

    /// Rebuild a logical cell from a parsed node.
    pub fn from_node(col: u32, id: NodeId, node: &CellNode) -> Self {
        let mut cell = Self::blank(col, id);
        cell.style = node.style;
        cell.formula = node.formula.as_deref().map(CellFormula::new);

        if let Some(raw) = node.raw_value.as_deref() {
            let parsed = match node.type_tag.as_deref() {
                Some("b") => CellValue::Bool(raw != "0"),
                Some("e") => ErrorValue::from_literal(raw)
                    .map(CellValue::Error)
                    .unwrap_or(CellValue::Blank),
                Some("str") | Some("inlineStr") => CellValue::Text(raw.to_string()),
                // `n` or untyped: numeric.
                _ => raw
                    .parse::<f64>()
                    .map(CellValue::Number)
                    .unwrap_or_else(|_| CellValue::Text(raw.to_string())),
            };
            if cell.formula.is_some() {
                if let Some(f) = cell.formula.as_mut() {
                    f.cached = Some(parsed);
                }
            } else {
                cell.value = parsed;
            }
        }
        cell
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.col
    }

    /// The backing node handle. Stable across logical repositioning; row
    /// reconciliation keeps it resolvable.
    #[inline]
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub(crate) fn set_column(&mut self, col: u32) {
        self.col = col;
    }

    pub fn cell_type(&self) -> CellType {
        if self.formula.is_some() {
            return CellType::Formula;
        }
        match self.value {
            CellValue::Blank => CellType::Blank,
            CellValue::Number(_) => CellType::Numeric,
            CellValue::Text(_) => CellType::Text,
            CellValue::Bool(_) => CellType::Bool,
            CellValue::Error(_) => CellType::Error,
        }
    }

    pub fn set_value(&mut self, value: impl Into<CellValue>) {
        self.value = value.into();
    }

    pub fn set_formula(&mut self, text: impl Into<String>) {
        self.formula = Some(CellFormula::new(text));
    }

    /// Remove the formula, demoting the cell to a plain value cell.
    ///
    /// The cell object persists; a cached result is promoted into the value
    /// slot when the cell has no literal value of its own.
    pub fn remove_formula(&mut self) {
        if let Some(formula) = self.formula.take() {
            if self.value.is_blank() {
                if let Some(cached) = formula.cached {
                    self.value = cached;
                }
            }
        }
    }

    pub fn is_part_of_array_group(&self) -> bool {
        self.formula.as_ref().is_some_and(|f| f.group.is_some())
    }

    /// Write this cell's logical state into `node`.
    ///
    /// Called by row reconciliation; the node ends up carrying exactly what
    /// the serializer needs for one `<c>` element.
    pub(crate) fn write_node(&self, row: u32, node: &mut CellNode) {
        node.a1_ref = Some(CellRef::new(row, self.col).to_a1());
        node.style = self.style;
        node.formula = self.formula.as_ref().map(|f| f.text.clone());

        let effective = match (&self.formula, &self.value) {
            (Some(f), CellValue::Blank) => f.cached.clone().unwrap_or(CellValue::Blank),
            (_, value) => value.clone(),
        };
        match effective {
            CellValue::Blank => {
                node.type_tag = None;
                node.raw_value = None;
            }
            CellValue::Number(n) => {
                node.type_tag = None;
                node.raw_value = Some(format_number(n));
            }
            CellValue::Text(s) => {
                node.type_tag = Some("str".to_string());
                node.raw_value = Some(s);
            }
            CellValue::Bool(b) => {
                node.type_tag = Some("b".to_string());
                node.raw_value = Some(if b { "1" } else { "0" }.to_string());
            }
            CellValue::Error(e) => {
                node.type_tag = Some("e".to_string());
                node.raw_value = Some(e.literal().to_string());
            }
        }
    }
}

/// Shortest round-trippable decimal form, matching how the writer layer emits
/// numbers (no trailing `.0` for integers).
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
