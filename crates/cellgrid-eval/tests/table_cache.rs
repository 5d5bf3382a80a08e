use cellgrid_eval::{EvaluationWorkbook, TableCachePolicy};
use cellgrid_model::{Range, Table, Workbook};
use pretty_assertions::assert_eq;

fn workbook() -> Workbook {
    let mut wb = Workbook::new();
    wb.add_sheet("Sheet1").unwrap();
    wb.add_sheet("Sheet2").unwrap();
    let mut sales = Table::new("Table1", Range::from_a1("A1:D20").unwrap());
    sales.display_name = "Sales".into();
    wb.add_table(0, sales).unwrap();
    wb.add_table(1, Table::new("Costs", Range::from_a1("A1:B9").unwrap()))
        .unwrap();
    wb
}

#[test]
fn tables_resolve_by_either_name_in_any_case() {
    let wb = workbook();
    let eval = EvaluationWorkbook::new(&wb);

    assert_eq!(eval.table("sales").unwrap().name, "Table1");
    assert_eq!(eval.table("TABLE1").unwrap().display_name, "Sales");
    assert_eq!(
        eval.table("Costs").unwrap().range,
        Range::from_a1("A1:B9").unwrap()
    );
    assert!(eval.table("Nope").is_none());
}

#[test]
fn lookups_survive_an_explicit_cache_clear() {
    let wb = workbook();
    let eval = EvaluationWorkbook::new(&wb);
    assert!(eval.table("sales").is_some());

    eval.clear_all_cached_result_values();
    assert_eq!(eval.table("SALES").unwrap().name, "Table1");
    assert!(eval.table("costs").is_some());
}

#[test]
fn adapters_built_after_edits_see_the_current_tables() {
    let mut wb = workbook();
    {
        let eval = EvaluationWorkbook::new(&wb);
        assert!(eval.table("budget").is_none());
    }

    wb.add_table(0, Table::new("Budget", Range::from_a1("F1:G9").unwrap()))
        .unwrap();
    wb.remove_table("Costs");

    let eval = EvaluationWorkbook::new(&wb);
    assert!(eval.table("budget").is_some());
    assert!(eval.table("costs").is_none());
    assert_eq!(eval.table("sales").unwrap().display_name, "Sales");
}

#[test]
fn policy_choice_is_observable_on_the_adapter() {
    let wb = workbook();
    let session = EvaluationWorkbook::new(&wb);
    assert_eq!(session.table_cache_policy(), TableCachePolicy::SessionCached);

    let tracking = EvaluationWorkbook::with_table_policy(&wb, TableCachePolicy::TrackStructure);
    assert_eq!(
        tracking.table_cache_policy(),
        TableCachePolicy::TrackStructure
    );
    assert!(tracking.table("sales").is_some());
}
