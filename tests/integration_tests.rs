use facility_financials::*;
use tempfile::TempDir;

fn statement_grid() -> SheetGrid {
    SheetGrid::from_strings(
        "Income Statement",
        vec![
            vec!["", "", ""],
            vec!["Account", "Budget", "Actual 2024-01"],
            vec!["Total Revenue", "", "1000000"],
            vec!["Salaries & Wages", "", "400,000"],
            vec!["Non-Labor Expense", "", "200,000"],
            vec!["Rent", "", "150,000"],
            vec!["Depreciation", "", "80,000"],
        ],
    )
}

fn monthly_grid() -> SheetGrid {
    SheetGrid::from_strings(
        "Monthly",
        vec![
            vec!["Month", "Revenue", "Labor", "Non-Labor", "Rent", "Census"],
            vec!["Jan 2024", "1,000,000", "400,000", "200,000", "150,000", "92"],
            vec!["2024-03", "1,050,000", "410,000", "205,000", "150,000", "94"],
            vec!["Total", "2,050,000", "810,000", "405,000", "300,000", ""],
        ],
    )
}

fn monthly_mapping() -> ColumnMapping {
    ColumnMapping {
        period: "Month".to_string(),
        revenue_total: "Revenue".to_string(),
        labor_expense: "Labor".to_string(),
        non_labor_expense: "Non-Labor".to_string(),
        rent: "Rent".to_string(),
        other_income: None,
        depreciation: None,
        interest: None,
        census: Some("Census".to_string()),
        adr: None,
    }
}

#[test]
fn test_statement_round_trip() {
    let grid = statement_grid();
    let headers = grid.headers();

    let detection = auto_detect(&headers, &grid.rows);
    assert_eq!(detection.actual_column, Some(2));
    assert_eq!(detection.preview_value("Total Revenue"), Some(1_000_000.0));

    let mut mapping = detection.mapping.clone();
    mapping.set(MappingField::Period, "Actual 2024-01");
    let mapping = mapping.confirm().unwrap();
    assert_eq!(mapping.revenue_total, "total revenue");
    assert_eq!(mapping.depreciation.as_deref(), Some("depreciation"));

    let periods = apply_mapping(&grid.rows, &headers, &mapping, "Alpine Vista").unwrap();
    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0].period, "2024-01");
    assert_eq!(periods[0].id, "Alpine Vista-2024-01");
    assert_eq!(periods[0].values.revenue_total, 1_000_000.0);
    assert_eq!(periods[0].values.labor_expense, 400_000.0);
    assert_eq!(periods[0].values.depreciation, Some(80_000.0));
}

#[test]
fn test_statement_with_month_name_header() {
    let grid = SheetGrid::from_strings(
        "Income Statement",
        vec![
            vec!["Account", "Budget", "Jan 2024 Actual"],
            vec!["Total Revenue", "950,000", "1,000,000"],
            vec!["Salaries & Wages", "380,000", "400,000"],
            vec!["Non-Labor Expense", "190,000", "200,000"],
            vec!["Rent", "150,000", "150,000"],
        ],
    );
    let headers = grid.headers();

    let detection = auto_detect(&headers, &grid.rows);
    let mut mapping = detection.mapping.clone();
    mapping.set(MappingField::Period, "Jan 2024 Actual");
    let mapping = mapping.confirm().unwrap();

    let periods = apply_mapping(&grid.rows, &headers, &mapping, "Alpine Vista").unwrap();
    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0].period, "2024-01");
    assert_eq!(periods[0].values.revenue_total, 1_000_000.0);
    assert_eq!(periods[0].values.labor_expense, 400_000.0);
    assert_eq!(periods[0].values.rent, 150_000.0);
}

#[test]
fn test_columnar_month_name_rows() {
    let grid = SheetGrid::from_strings(
        "Monthly",
        vec![
            vec!["Month", "Revenue", "Labor", "Non-Labor", "Rent", "Census"],
            vec!["March 2024", "1,000,000", "400,000", "200,000", "150,000", "92"],
            vec!["Feb-2024", "990,000", "395,000", "198,000", "150,000", "91"],
            vec!["Jan-24", "980,000", "390,000", "196,000", "150,000", "90"],
        ],
    );

    let periods = apply_mapping(&grid.rows, &grid.headers(), &monthly_mapping(), "Alpine Vista").unwrap();
    let mut keys: Vec<&str> = periods.iter().map(|p| p.period.as_str()).collect();
    keys.sort();
    assert_eq!(keys, vec!["2024-01", "2024-02", "2024-03"]);
}

#[test]
fn test_end_to_end_metrics_scenario() {
    let grid = statement_grid();
    let session = ImportSession::new(ImportSettings::default(), Workbook::new(vec![grid]));

    let mut mapping = session.detect().unwrap().mapping;
    mapping.set(MappingField::Period, "Actual 2024-01");
    let outcome = session.finish_partial(&mapping).unwrap();
    assert!(outcome.is_valid());
    assert!(outcome.validation.warnings.is_empty());

    let metrics = calculate_metrics(&outcome.periods()[0]);
    assert_eq!(metrics.opex, 600_000.0);
    assert_eq!(metrics.ebitda, 400_000.0);
    assert_eq!(metrics.ebitdar, 550_000.0);
    assert_eq!(metrics.noi, 250_000.0);
    assert!((metrics.ebitda_margin - 40.0).abs() < 1e-9);
    assert!((metrics.ebitdar_margin - 55.0).abs() < 1e-9);
    assert!((metrics.noi_margin - 25.0).abs() < 1e-9);
}

#[test]
fn test_columnar_import_reports_gap_and_skips_totals() {
    let session = ImportSession::new(ImportSettings::default(), Workbook::new(vec![monthly_grid()]));
    let outcome = session.finish(&monthly_mapping()).unwrap();

    let keys: Vec<&str> = outcome.periods().iter().map(|p| p.period.as_str()).collect();
    assert_eq!(keys, vec!["2024-01", "2024-03"]);
    assert_eq!(outcome.periods()[1].values.census, Some(94.0));

    assert_eq!(outcome.report.skipped_rows.len(), 1);
    assert_eq!(
        outcome.report.skipped_rows[0].reason,
        SkipReason::UnparseablePeriod("Total".to_string())
    );

    assert!(outcome.is_valid());
    assert_eq!(
        outcome.validation.warnings,
        vec!["Gap detected between 2024-01 and 2024-03".to_string()]
    );
}

#[test]
fn test_merge_into_dataset_is_idempotent() {
    let session = ImportSession::new(ImportSettings::default(), Workbook::new(vec![monthly_grid()]));
    let first = session.finish(&monthly_mapping()).unwrap();
    let again = first.periods().to_vec();

    let mut dataset = first.into_dataset("FY24").unwrap();
    let before = dataset.periods.clone();

    assert_eq!(dataset.add_periods(again), 0);
    assert_eq!(dataset.periods, before);
}

#[test]
fn test_missing_period_column_is_an_error() {
    let grid = monthly_grid();
    let mut mapping = monthly_mapping();
    mapping.period = "Fiscal Month".to_string();

    let err = apply_mapping(&grid.rows, &grid.headers(), &mapping, "Alpine Vista").unwrap_err();
    assert!(matches!(
        err,
        FacilityFinancialsError::PeriodColumnNotFound { ref header } if header == "Fiscal Month"
    ));
}

#[test]
fn test_state_persists_across_sessions() {
    let dir = TempDir::new().unwrap();

    let dataset_id = {
        let store = JsonFileStore::open(dir.path()).unwrap();
        let mut state = AppState::load(store).unwrap();

        let dataset = sample_dataset().unwrap();
        let id = dataset.id.clone();
        state.add_dataset(dataset).unwrap();

        state.load_layout(&id).unwrap();
        state
            .update_widget(&id, "kpi-cards", WidgetUpdate::visibility(false))
            .unwrap();
        id
    };

    let mut state = AppState::load(JsonFileStore::open(dir.path()).unwrap()).unwrap();
    state.set_current_dataset(&dataset_id).unwrap();

    let current = state.current_dataset().unwrap();
    assert_eq!(current.name, "Sample Financial Data");
    assert_eq!(current.periods.len(), 6);

    let layout = state.load_layout(&dataset_id).unwrap();
    assert!(!layout.widget("kpi-cards").unwrap().visible);
    assert!(state.store().usage().unwrap() > 0);
}

#[test]
fn test_filters_and_aggregates() {
    let dataset = sample_dataset().unwrap();
    let mut filter = PeriodFilter::new();
    filter
        .set_date_range(Some("2024-02"), Some("2024-04"), &dataset.periods)
        .unwrap();

    let selected: Vec<FacilityPeriod> = filter
        .filtered_periods(&dataset.periods)
        .into_iter()
        .cloned()
        .collect();
    assert_eq!(selected.len(), 3);

    let totals = aggregate_metrics(&selected);
    let expected_revenue: f64 = selected.iter().map(|p| p.values.revenue_total).sum();
    assert_eq!(totals.revenue_total, expected_revenue);
    assert!((totals.ebitda_margin - totals.ebitda / totals.revenue_total * 100.0).abs() < 1e-9);

    let summary = summarize_periods(&selected);
    assert_eq!(summary.periods.len(), 3);
    assert_eq!(summary.totals, totals);
}

#[test]
fn test_schema_generation() {
    let schema = serde_json::to_string_pretty(&ColumnMapping::generate_json_schema()).unwrap();
    assert!(schema.contains("revenueTotal"));
    assert!(schema.contains("nonLaborExpense"));

    let layout_schema = serde_json::to_string(&LayoutConfig::generate_json_schema()).unwrap();
    assert!(layout_schema.contains("kpi-cards"));
}
