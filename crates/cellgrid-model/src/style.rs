use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A cell format record.
///
/// Fonts, fills, and borders are owned by the package layer; the model keeps
/// their table indices opaque and only dedups whole records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(default)]
    pub font_id: u32,
    #[serde(default)]
    pub fill_id: u32,
    #[serde(default)]
    pub border_id: u32,
}

/// Deduplicated style table shared by all sheets of a workbook.
///
/// Index 0 is always the default style.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleTable {
    styles: Vec<Style>,
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleTable {
    pub fn new() -> Self {
        Self {
            styles: vec![Style::default()],
        }
    }

    /// Intern a style, returning the index of an existing identical record or
    /// of the freshly appended one.
    pub fn intern(&mut self, style: Style) -> u32 {
        if let Some(idx) = self.styles.iter().position(|s| *s == style) {
            return idx as u32;
        }
        self.styles.push(style);
        (self.styles.len() - 1) as u32
    }

    pub fn get(&self, index: u32) -> Option<&Style> {
        self.styles.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// The workbook's shared string table.
///
/// Strings are interned on write so repeated text is stored once; the reverse
/// map makes interning O(1) amortized.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedStringTable {
    strings: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl SharedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, returning its table index.
    pub fn intern(&mut self, text: &str) -> usize {
        if let Some(&idx) = self.index.get(text) {
            return idx;
        }
        let idx = self.strings.len();
        self.strings.push(text.to_string());
        self.index.insert(text.to_string(), idx);
        idx
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Rebuild the reverse map, e.g. after deserialization skipped it.
    pub fn rebuild_index(&mut self) {
        self.index = self
            .strings
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
    }
}
