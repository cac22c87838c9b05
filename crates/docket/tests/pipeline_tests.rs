//! End-to-end tests: spreadsheet on disk → enriched dataset → report/export.

mod common;

use calamine::{open_workbook_auto, Data, DataType, Reader};

use common::{TaskSheetBuilder, TestHarness};
use docket::enrich::{ForecastBucket, Status};
use docket::error::{DocketError, LoadError};
use docket::filter::StatusChoice;
use docket::pipeline::NoopProgress;

fn mixed_sheet() -> TaskSheetBuilder {
    TaskSheetBuilder::new()
        .overdue("P-1", "Alice", "TJSE", 29)
        .due_in("P-2", "Bruno", "TJPE", 10)
        .task_with_text_deadline("P-3", "Carla", "TRF5", "2025-05-20")
        .task_with_text_deadline("P-4", "Alice", "TJSE", "não informado")
        .overdue("P-5", "Bruno", "TJSE", 3)
}

#[test]
fn test_load_normalizes_columns_and_enriches() {
    let harness = TestHarness::with_sheet(&mixed_sheet());
    let (_, dataset) = harness.load();

    assert_eq!(
        dataset.columns,
        vec![
            "processo",
            "usuário responsável",
            "setor de origem",
            "final prazo",
            "observação"
        ]
    );
    assert_eq!(dataset.deadline_column, 3);
    assert_eq!(dataset.len(), 5);

    let p1 = &dataset.tasks[0];
    assert_eq!(p1.process_id(), "P-1");
    assert_eq!(p1.status, Status::Overdue);
    assert_eq!(p1.days_overdue, Some(29));
    assert_eq!(p1.days_remaining, None);
    assert_eq!(p1.forecast_bucket, None);

    let p2 = &dataset.tasks[1];
    assert_eq!(p2.status, Status::OnTime);
    assert_eq!(p2.days_remaining, Some(10));
    assert_eq!(p2.forecast_bucket, Some(ForecastBucket::Fortnight));

    let p3 = &dataset.tasks[2];
    assert_eq!(p3.days_remaining, Some(20));
    assert_eq!(p3.forecast_bucket, Some(ForecastBucket::Month));

    let p4 = &dataset.tasks[3];
    assert_eq!(p4.deadline, None);
    assert_eq!(p4.status, Status::OnTime);
    assert_eq!(p4.days_remaining, None);
    assert_eq!(p4.forecast_bucket, Some(ForecastBucket::Later));
}

#[test]
fn test_reference_date_moves_status() {
    let mut harness = TestHarness::with_sheet(&mixed_sheet());
    harness.config.reference_date = "2025-05-15".to_string();
    let (_, dataset) = harness.load();

    let p2 = &dataset.tasks[1];
    assert_eq!(p2.status, Status::Overdue);
    assert_eq!(p2.days_overdue, Some(5));

    let p3 = &dataset.tasks[2];
    assert_eq!(p3.status, Status::OnTime);
    assert_eq!(p3.days_remaining, Some(5));
    assert_eq!(p3.forecast_bucket, Some(ForecastBucket::Week));
}

#[test]
fn test_report_mixes_filtered_and_full_views() {
    let harness = TestHarness::with_sheet(&mixed_sheet());
    let (pipeline, dataset) = harness.load();

    let selection = dataset
        .default_selection()
        .with_status(StatusChoice::Only(Status::Overdue))
        .with_sectors(["TJSE"]);
    let report = pipeline.report(&dataset, &selection, &NoopProgress);

    assert_eq!(report.total_tasks, 5);
    assert_eq!(report.filtered_tasks, 2);
    assert_eq!(report.status_distribution[0].count, 2);
    assert_eq!(report.status_distribution[1].count, 0);

    // Full table: Alice 1/2, Bruno 1/2, Carla 0/1.
    let rates: Vec<(&str, f64)> = report
        .overdue_rate_by_user
        .iter()
        .map(|r| (r.user.as_str(), r.percentage))
        .collect();
    assert_eq!(rates, vec![("Alice", 50.0), ("Bruno", 50.0), ("Carla", 0.0)]);

    let forecast_total: usize = report.forecast.iter().map(|b| b.count).sum();
    assert_eq!(forecast_total, 3);

    let top: Vec<&str> = report
        .top_overdue
        .iter()
        .map(|r| r.process_id.as_str())
        .collect();
    assert_eq!(top, vec!["P-1", "P-5"]);

    assert_eq!(report.sector_markers.len(), 1);
    assert_eq!(report.sector_markers[0].label, "TJSE: 2 tarefas");
}

#[test]
fn test_filter_is_a_conjunction() {
    let harness = TestHarness::with_sheet(&mixed_sheet());
    let (_, dataset) = harness.load();

    let selection = dataset
        .default_selection()
        .with_users(["Alice", "Bruno"])
        .with_sectors(["TJSE"]);
    let ids: Vec<String> = dataset
        .filter(&selection)
        .iter()
        .map(|t| t.process_id().to_string())
        .collect();
    assert_eq!(ids, vec!["P-1", "P-4", "P-5"]);

    let none = dataset.default_selection().with_users(Vec::<String>::new());
    assert!(dataset.filter(&none).is_empty());
}

#[test]
fn test_export_top_sheet_ignores_filter() {
    let mut sheet = TaskSheetBuilder::new();
    for days in 1..=25 {
        let user = if days % 5 == 0 { "Bruno" } else { "Alice" };
        sheet = sheet.overdue(&format!("P-{:02}", days), user, "TJSE", days);
    }
    sheet = sheet.due_in("P-99", "Bruno", "TJPE", 4);

    let harness = TestHarness::with_sheet(&sheet);
    let (pipeline, dataset) = harness.load();
    let selection = dataset.default_selection().with_users(["Bruno"]);
    let path = harness.path("relatorio.xlsx");

    pipeline
        .export(&dataset, &selection, &path, &NoopProgress)
        .unwrap();

    let mut workbook = open_workbook_auto(&path).unwrap();
    assert_eq!(
        workbook.sheet_names(),
        vec!["Tarefas Filtradas".to_string(), "Top 20 Atrasos".to_string()]
    );

    let filtered = workbook.worksheet_range("Tarefas Filtradas").unwrap();
    assert_eq!(filtered.height(), 1 + 6);
    assert_eq!(
        filtered.get((0, 5)),
        Some(&Data::String("status".to_string()))
    );

    let top = workbook.worksheet_range("Top 20 Atrasos").unwrap();
    assert_eq!(top.height(), 1 + 20);
    assert_eq!(top.get((1, 0)), Some(&Data::String("P-25".to_string())));
    assert_eq!(top.get((1, 6)).and_then(|c| c.as_f64()), Some(25.0));
    assert_eq!(top.get((20, 6)).and_then(|c| c.as_f64()), Some(6.0));
    assert!(matches!(top.get((1, 3)), Some(Data::DateTime(_))));
    assert_eq!(
        top.get((1, 5)),
        Some(&Data::String("Em atraso".to_string()))
    );
}

#[test]
fn test_export_top_sheet_with_few_overdue_rows() {
    let mut sheet = TaskSheetBuilder::new();
    for days in 1..=5 {
        sheet = sheet.overdue(&format!("P-{}", days), "Alice", "TJSE", days);
    }
    let harness = TestHarness::with_sheet(&sheet);
    let (pipeline, dataset) = harness.load();

    let bytes = pipeline
        .export_bytes(&dataset, &dataset.default_selection())
        .unwrap();
    let path = harness.path("poucos.xlsx");
    std::fs::write(&path, bytes).unwrap();

    let mut workbook = open_workbook_auto(&path).unwrap();
    let top = workbook.worksheet_range("Top 20 Atrasos").unwrap();
    assert_eq!(top.height(), 1 + 5);
}

#[test]
fn test_ties_keep_source_order_in_top_listing() {
    let sheet = TaskSheetBuilder::new()
        .overdue("P-A", "Alice", "TJSE", 7)
        .overdue("P-B", "Bruno", "TJSE", 9)
        .overdue("P-C", "Carla", "TJSE", 7);
    let harness = TestHarness::with_sheet(&sheet);
    let (pipeline, dataset) = harness.load();

    let report = pipeline.report(&dataset, &dataset.default_selection(), &NoopProgress);
    let top: Vec<&str> = report
        .top_overdue
        .iter()
        .map(|r| r.process_id.as_str())
        .collect();
    assert_eq!(top, vec!["P-B", "P-A", "P-C"]);
}

#[test]
fn test_missing_column_fails_load() {
    let sheet = TaskSheetBuilder::new()
        .header(&["Processo", "Usuário Responsável", "Final Prazo"])
        .row(vec!["P-1".into(), "Alice".into(), "2025-04-01".into()]);
    let harness = TestHarness::with_sheet(&sheet);

    let err = harness.pipeline().load(&NoopProgress).unwrap_err();
    assert!(matches!(
        err,
        DocketError::Load(LoadError::MissingColumn(ref name)) if name == "setor de origem"
    ));
}

#[test]
fn test_missing_sheet_fails_load() {
    let mut harness = TestHarness::with_sheet(&mixed_sheet());
    harness.config.sheet = Some("Outra".to_string());

    let err = harness.pipeline().load(&NoopProgress).unwrap_err();
    assert!(matches!(
        err,
        DocketError::Load(LoadError::MissingSheet { .. })
    ));
}

#[test]
fn test_named_sheet_is_read() {
    let mut harness = TestHarness::with_sheet(&mixed_sheet().sheet("Planilha1"));
    harness.config.sheet = Some("Planilha1".to_string());

    let (_, dataset) = harness.load();
    assert_eq!(dataset.len(), 5);
}

#[test]
fn test_map_geojson_written() {
    let harness = TestHarness::with_sheet(&mixed_sheet());
    let (pipeline, dataset) = harness.load();
    let path = harness.path("mapa.geojson");

    pipeline
        .export_map(&dataset, &dataset.default_selection(), &path)
        .unwrap();

    let geojson: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let sectors: Vec<&str> = geojson["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["properties"]["sector"].as_str().unwrap())
        .collect();
    assert_eq!(sectors, vec!["TJSE", "TJPE", "TRF5"]);
}
