use cellgrid_model::{
    CellRef, CellValue, DefinedNameError, NameScope, NameValidationError, Range, Table, Workbook,
};
use pretty_assertions::assert_eq;

fn sample_workbook() -> Workbook {
    let mut wb = Workbook::new();
    wb.add_sheet("Data").unwrap();
    wb.add_sheet("Summary").unwrap();
    {
        let sheet = wb.sheet_at_mut(0).unwrap();
        let row = sheet.create_row(0).unwrap();
        row.create_cell(0).unwrap().set_value(1.5);
        row.create_cell(1).unwrap().set_formula("A1*2");
    }
    wb.create_defined_name("Rates", NameScope::Workbook, "=Data!$A$1:$A$9")
        .unwrap();
    wb.create_defined_name("Rates", NameScope::Sheet(1), "Summary!$B$1")
        .unwrap();
    wb.add_table(
        0,
        Table::new("SalesTable", Range::new(CellRef::new(0, 0), CellRef::new(9, 3))),
    )
    .unwrap();
    wb
}

#[test]
fn scoped_lookup_is_exact_per_scope() {
    let wb = sample_workbook();
    let global = wb.find_defined_name("rates", NameScope::Workbook).unwrap();
    assert_eq!(global.refers_to, "Data!$A$1:$A$9");

    let scoped = wb.find_defined_name("RATES", NameScope::Sheet(1)).unwrap();
    assert_eq!(scoped.refers_to, "Summary!$B$1");

    assert!(wb.find_defined_name("rates", NameScope::Sheet(0)).is_none());
}

#[test]
fn invalid_names_are_rejected_with_detail() {
    let mut wb = Workbook::new();
    wb.add_sheet("Sheet1").unwrap();
    let err = wb
        .create_defined_name("B2", NameScope::Workbook, "Sheet1!$A$1")
        .unwrap_err();
    assert_eq!(
        err,
        DefinedNameError::Invalid(NameValidationError::LooksLikeCellReference)
    );

    let err = wb
        .create_defined_name("X", NameScope::Sheet(5), "Sheet1!$A$1")
        .unwrap_err();
    assert_eq!(err, DefinedNameError::NoSuchSheet(5));
}

#[test]
fn removal_is_scope_precise() {
    let mut wb = sample_workbook();
    assert!(wb.remove_defined_name("rates", NameScope::Sheet(1)));
    assert!(wb.find_defined_name("rates", NameScope::Sheet(1)).is_none());
    // The workbook-scoped sibling is untouched.
    assert!(wb.find_defined_name("rates", NameScope::Workbook).is_some());
    assert!(!wb.remove_defined_name("rates", NameScope::Sheet(1)));
}

#[test]
fn workbook_round_trips_through_json() {
    let mut wb = sample_workbook();
    wb.sync_all();

    let json = serde_json::to_string(&wb).expect("serialize");
    let back: Workbook = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(back.sheet_count(), 2);
    assert_eq!(back.defined_names().len(), 2);
    assert_eq!(back.find_table("salestable").map(|(i, _)| i), Some(0));
    let sheet = back.sheet_at(0).unwrap();
    let row = sheet.row(0).unwrap();
    assert_eq!(row.cell(0).unwrap().value, CellValue::Number(1.5));
    assert_eq!(
        row.cell(1).unwrap().formula.as_ref().map(|f| f.text.as_str()),
        Some("A1*2")
    );
}
