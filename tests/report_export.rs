use calamine::{DataType, Reader, Xlsx, open_workbook};
use pravasi_registry::io::excel_write;
use pravasi_registry::model::seed_state;
use pravasi_registry::report::{
    Cell, ESTABLISHMENT_COLUMNS, ESTABLISHMENTS_SHEET, ReportScope, WORKER_COLUMNS,
    WORKERS_SHEET, build_report, report_file_name,
};
use tempfile::tempdir;

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn read_sheet(path: &std::path::Path, name: &str) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("workbook opened");
    let range = workbook
        .worksheet_range(name)
        .expect("sheet present")
        .expect("sheet readable");
    range
        .rows()
        .map(|row| row.iter().map(|cell| cell_to_string(Some(cell))).collect())
        .collect()
}

#[test]
fn district_report_has_expected_sheets_and_rows() {
    let state = seed_state();
    let workbook = build_report(&state, ReportScope::AllYears);

    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join(report_file_name(&state));
    excel_write::write_workbook(&xlsx_path, &workbook).expect("Excel written");
    assert!(xlsx_path.ends_with("Pravasi_Registry_RR_2024-25_District_Report.xlsx"));

    let workbook_reader: Xlsx<_> = open_workbook(&xlsx_path).expect("workbook opened");
    assert_eq!(
        workbook_reader.sheet_names().to_vec(),
        vec![WORKERS_SHEET.to_string(), ESTABLISHMENTS_SHEET.to_string()]
    );

    let workers = read_sheet(&xlsx_path, WORKERS_SHEET);
    assert_eq!(workers[0], WORKER_COLUMNS.map(String::from).to_vec());
    assert_eq!(workers.len(), 3);
    let rahul = &workers[1];
    assert_eq!(rahul[0], "2024-25");
    assert_eq!(rahul[1], "Rahul Kumar");
    assert_eq!(rahul[3], "32");
    assert_eq!(rahul[6], "123456789012");
    assert_eq!(rahul[10], "RR Bricks Co");
    assert_eq!(rahul[11], "Moinabad Road, RR Dist");
    assert_eq!(rahul[12], "2024-05-10");
    assert_eq!(rahul[14], "Yes");
    assert_eq!(workers[2][14], "No");

    let establishments = read_sheet(&xlsx_path, ESTABLISHMENTS_SHEET);
    assert_eq!(
        establishments[0],
        ESTABLISHMENT_COLUMNS.map(String::from).to_vec()
    );
    let archive_row = establishments
        .iter()
        .find(|row| row[0] == "2023-24")
        .expect("archived activation exported");
    assert_eq!(archive_row[1], "RR Bricks Co");
    assert_eq!(archive_row[2], "REG-001");
    assert_eq!(archive_row[3], "Brick Kiln");
    assert_eq!(archive_row[4], "Chevella Cross, RR Dist");
}

#[test]
fn dangling_references_export_as_empty_cells() {
    let mut state = seed_state();
    state.workers[0].establishment_id = "ye-missing".to_string();
    state.workers[1].year_id = "y-missing".to_string();
    state.yearly_establishments[0].master_id = "em-missing".to_string();

    let workbook = build_report(&state, ReportScope::AllYears);
    let workers = &workbook.tables[0];
    assert_eq!(workers.rows[0][10], Cell::Text(String::new()));
    assert_eq!(workers.rows[0][11], Cell::Text(String::new()));
    assert_eq!(workers.rows[1][0], Cell::Text(String::new()));

    let establishments = &workbook.tables[1];
    assert_eq!(establishments.rows[0][1], Cell::Text(String::new()));
    assert_eq!(
        establishments.rows[0][4],
        Cell::Text("Moinabad Road, RR Dist".to_string())
    );

    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("report.xlsx");
    excel_write::write_workbook(&xlsx_path, &workbook).expect("Excel written");
}

#[test]
fn empty_registry_still_writes_headers() {
    let mut state = seed_state();
    state.workers.clear();
    state.yearly_establishments.clear();

    let workbook = build_report(&state, ReportScope::CurrentYear);
    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("empty.xlsx");
    excel_write::write_workbook(&xlsx_path, &workbook).expect("Excel written");

    let workers = read_sheet(&xlsx_path, WORKERS_SHEET);
    assert_eq!(workers.len(), 1);
    assert_eq!(workers[0][0], "Work Year");
}
