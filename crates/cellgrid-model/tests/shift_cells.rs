use std::collections::BTreeMap;
use std::collections::BTreeSet;

use cellgrid_model::{Cell, CellValue, RowError, Worksheet, XLSX_LIMITS};
use proptest::prelude::*;

fn row_snapshot(sheet: &Worksheet) -> BTreeMap<u32, CellValue> {
    sheet
        .row(0)
        .unwrap()
        .iter_cells()
        .map(|c| (c.column(), c.value.clone()))
        .collect()
}

fn sheet_with_values(cells: &[(u32, f64)]) -> Worksheet {
    let mut sheet = Worksheet::new(1, "Sheet1");
    let row = sheet.create_row(0).unwrap();
    for &(col, v) in cells {
        row.create_cell(col).unwrap().set_value(v);
    }
    sheet
}

#[test]
fn shift_right_then_left_restores_the_mapping() {
    let mut sheet = sheet_with_values(&[(0, 10.0), (2, 20.0), (5, 50.0)]);
    let before = row_snapshot(&sheet);

    let row = sheet.row_mut(0).unwrap();
    row.shift_cells_right(0, 5, 2).unwrap();
    row.shift_cells_left(2, 7, 2).unwrap();

    assert_eq!(row_snapshot(&sheet), before);
}

#[test]
fn shift_right_vacates_exactly_step_columns_at_the_origin() {
    let mut sheet = sheet_with_values(&[(0, 1.0), (1, 2.0), (2, 3.0)]);
    let row = sheet.row_mut(0).unwrap();
    row.shift_cells_right(0, 2, 2).unwrap();

    assert!(row.cell(0).is_none());
    assert!(row.cell(1).is_none());
    let cols: Vec<u32> = row.iter_cells().map(Cell::column).collect();
    assert_eq!(cols, vec![2, 3, 4]);
    assert_eq!(row.cell(2).unwrap().value, CellValue::Number(1.0));
    assert_eq!(row.cell(4).unwrap().value, CellValue::Number(3.0));
}

#[test]
fn shift_overwrites_cells_beyond_the_range_end() {
    // A shift may land on a cell outside [first..=last]; the occupant is
    // replaced, matching the in-place semantics of the format's writers.
    let mut sheet = sheet_with_values(&[(0, 1.0), (3, 99.0)]);
    let row = sheet.row_mut(0).unwrap();
    row.shift_cells_right(0, 1, 3).unwrap();

    assert_eq!(row.cell(3).unwrap().value, CellValue::Number(1.0));
    assert_eq!(row.physical_cell_count(), 1);
}

#[test]
fn shift_parameter_validation() {
    let mut sheet = sheet_with_values(&[(1, 1.0)]);
    let row = sheet.row_mut(0).unwrap();

    assert_eq!(
        row.shift_cells_right(5, 2, 1),
        Err(RowError::InvalidShiftRange { first: 5, last: 2 })
    );
    assert_eq!(
        row.shift_cells_right(0, 2, 0),
        Err(RowError::InvalidShiftStep { step: 0 })
    );
    assert_eq!(
        row.shift_cells_left(1, 3, 2),
        Err(RowError::ShiftBelowZero {
            first: 1,
            last: 3,
            step: 2
        })
    );
    let max = XLSX_LIMITS.last_col_index();
    assert!(matches!(
        row.shift_cells_right(max - 1, max, 1),
        Err(RowError::ShiftBeyondLimit { .. })
    ));
}

proptest! {
    // Columns stay unique and the node/cell mapping stays a bijection under
    // arbitrary create/remove/shift sequences.
    #[test]
    fn column_uniqueness_under_mutation(
        ops in prop::collection::vec(
            prop_oneof![
                (0u32..40).prop_map(|c| (0u8, c, 0u32)),            // create
                (0u32..40).prop_map(|c| (1u8, c, 0u32)),            // remove
                ((0u32..20), (1u32..5)).prop_map(|(f, s)| (2u8, f, s)), // shift right
                ((5u32..25), (1u32..5)).prop_map(|(f, s)| (3u8, f, s)), // shift left
            ],
            1..40,
        )
    ) {
        let mut sheet = Worksheet::new(1, "Sheet1");
        sheet.create_row(0).unwrap();
        let row = sheet.row_mut(0).unwrap();

        for (kind, a, b) in ops {
            match kind {
                0 => {
                    row.create_cell(a).unwrap().set_value(f64::from(a));
                }
                1 => {
                    let _ = row.remove_cell(a);
                }
                2 => {
                    row.shift_cells_right(a, a + 10, b).unwrap();
                }
                _ => {
                    let step = b.min(a);
                    if step >= 1 {
                        row.shift_cells_left(a, a + 10, step).unwrap();
                    }
                }
            }

            // BTreeMap keys are unique by construction; the real invariant is
            // that every cell agrees with its key and nodes stay distinct.
            let cols: Vec<u32> = row.iter_cells().map(Cell::column).collect();
            let unique: BTreeSet<u32> = cols.iter().copied().collect();
            prop_assert_eq!(cols.len(), unique.len());

            let node_ids: BTreeSet<_> = row.iter_cells().map(Cell::node_id).collect();
            prop_assert_eq!(node_ids.len(), row.physical_cell_count());
        }

        row.sync_nodes();
        prop_assert_eq!(row.nodes().len(), row.physical_cell_count());
    }
}
