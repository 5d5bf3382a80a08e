//! Lazily built case-insensitive table name index.
//!
//! Formulas may mention a table by its internal or display name in any
//! casing. The index maps folded names to the table's location (sheet index,
//! position within the sheet's table list) so repeated lookups do not rescan
//! every sheet.

use std::cell::RefCell;
use std::collections::HashMap;

use cellgrid_model::Workbook;

/// Staleness policy for the table name index.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TableCachePolicy {
    /// Build once, keep until explicitly cleared. Matches the assumption
    /// that the workbook is not edited during an evaluation session.
    #[default]
    SessionCached,
    /// Rebuild whenever the workbook's structure generation has moved since
    /// the index was built.
    TrackStructure,
}

#[derive(Debug)]
struct IndexState {
    built_at: u64,
    by_name: HashMap<String, (usize, usize)>,
}

#[derive(Debug)]
pub(crate) struct TableNameCache {
    policy: TableCachePolicy,
    state: RefCell<Option<IndexState>>,
}

impl TableNameCache {
    pub(crate) fn new(policy: TableCachePolicy) -> Self {
        Self {
            policy,
            state: RefCell::new(None),
        }
    }

    pub(crate) fn policy(&self) -> TableCachePolicy {
        self.policy
    }

    /// Locate a table by name, building or refreshing the index first when
    /// the policy requires it. Returns `(sheet_index, table_position)`.
    pub(crate) fn locate(&self, wb: &Workbook, name: &str) -> Option<(usize, usize)> {
        let mut state = self.state.borrow_mut();
        let stale = match (state.as_ref(), self.policy) {
            (None, _) => true,
            (Some(_), TableCachePolicy::SessionCached) => false,
            (Some(s), TableCachePolicy::TrackStructure) => {
                s.built_at != wb.structure_generation()
            }
        };
        if stale {
            *state = Some(build_index(wb));
        }
        state
            .as_ref()
            .and_then(|s| s.by_name.get(&name.to_ascii_lowercase()).copied())
    }

    pub(crate) fn clear(&self) {
        *self.state.borrow_mut() = None;
    }

    #[cfg(test)]
    pub(crate) fn is_built(&self) -> bool {
        self.state.borrow().is_some()
    }
}

fn build_index(wb: &Workbook) -> IndexState {
    let mut by_name = HashMap::new();
    for (sheet_index, sheet) in wb.iter_sheets().enumerate() {
        for (table_position, table) in sheet.tables().iter().enumerate() {
            let at = (sheet_index, table_position);
            by_name.insert(table.name.to_ascii_lowercase(), at);
            by_name.insert(table.display_name.to_ascii_lowercase(), at);
        }
    }
    IndexState {
        built_at: wb.structure_generation(),
        by_name,
    }
}

#[cfg(test)]
mod tests {
    use cellgrid_model::{Range, Table, Workbook};
    use pretty_assertions::assert_eq;

    use super::*;

    fn workbook_with_table(name: &str) -> Workbook {
        let mut wb = Workbook::new();
        wb.add_sheet("Sheet1").unwrap();
        wb.add_table(0, Table::new(name, Range::from_a1("A1:C9").unwrap()))
            .unwrap();
        wb
    }

    #[test]
    fn lookup_is_case_insensitive_and_lazy() {
        let wb = workbook_with_table("Sales");
        let cache = TableNameCache::new(TableCachePolicy::SessionCached);
        assert!(!cache.is_built());
        assert_eq!(cache.locate(&wb, "SALES"), Some((0, 0)));
        assert!(cache.is_built());
        assert_eq!(cache.locate(&wb, "missing"), None);
    }

    #[test]
    fn session_cache_ignores_structure_changes_until_cleared() {
        let mut wb = workbook_with_table("Sales");
        let cache = TableNameCache::new(TableCachePolicy::SessionCached);
        assert_eq!(cache.locate(&wb, "sales"), Some((0, 0)));

        wb.add_table(0, Table::new("Costs", Range::from_a1("E1:F9").unwrap()))
            .unwrap();
        assert_eq!(cache.locate(&wb, "costs"), None);

        cache.clear();
        assert_eq!(cache.locate(&wb, "costs"), Some((0, 1)));
    }

    #[test]
    fn tracking_cache_follows_the_generation() {
        let mut wb = workbook_with_table("Sales");
        let cache = TableNameCache::new(TableCachePolicy::TrackStructure);
        assert_eq!(cache.locate(&wb, "sales"), Some((0, 0)));

        wb.add_table(0, Table::new("Costs", Range::from_a1("E1:F9").unwrap()))
            .unwrap();
        assert_eq!(cache.locate(&wb, "costs"), Some((0, 1)));
    }
}
