//! Flattens the registry into the district report tables.
//!
//! Foreign keys are resolved by lookup; a dangling reference yields an empty
//! cell instead of failing the export.

use crate::pravasi::registry::model::AppState;

/// Sheet listing every worker registration.
pub const WORKERS_SHEET: &str = "Workers_Report";
/// Sheet listing every yearly establishment activation.
pub const ESTABLISHMENTS_SHEET: &str = "Establishments_Active";

pub const WORKER_COLUMNS: [&str; 16] = [
    "Work Year",
    "Worker Name",
    "Father Name",
    "Age",
    "Gender",
    "Caste",
    "Aadhaar No",
    "Mobile",
    "Native State",
    "Nature of Work",
    "Establishment",
    "Site Address",
    "Joining Date",
    "Expected Exit",
    "Family On Site",
    "Officer Notes",
];

pub const ESTABLISHMENT_COLUMNS: [&str; 7] = [
    "Work Year",
    "Establishment Name",
    "Govt Reg No",
    "Category",
    "Site Address",
    "Owner/In-Charge",
    "Contact Number",
];

/// Which registrations end up in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportScope {
    #[default]
    AllYears,
    CurrentYear,
}

/// A single worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }
}

/// A table that will be materialised as an Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Represents all tables required to materialise the Excel workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookData {
    pub tables: Vec<SheetTable>,
}

/// `Pravasi_Registry_RR_<label>_District_Report.xlsx` for the current year.
///
/// Characters that cannot appear in a file name (e.g. the `/` in "2025/26")
/// become `-`, so the result is always a single path component.
pub fn report_file_name(state: &AppState) -> String {
    let label: String = state
        .current_year()
        .map(|year| year.label.as_str())
        .unwrap_or_default()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    format!("Pravasi_Registry_RR_{label}_District_Report.xlsx")
}

pub fn build_report(state: &AppState, scope: ReportScope) -> WorkbookData {
    WorkbookData {
        tables: vec![
            build_workers_table(state, scope),
            build_establishments_table(state, scope),
        ],
    }
}

fn in_scope(state: &AppState, scope: ReportScope, year_id: &str) -> bool {
    match scope {
        ReportScope::AllYears => true,
        ReportScope::CurrentYear => state.current_year_id == year_id,
    }
}

fn year_label<'a>(state: &'a AppState, year_id: &str) -> &'a str {
    state
        .year(year_id)
        .map(|year| year.label.as_str())
        .unwrap_or_default()
}

fn build_workers_table(state: &AppState, scope: ReportScope) -> SheetTable {
    let rows = state
        .workers
        .iter()
        .filter(|worker| in_scope(state, scope, &worker.year_id))
        .map(|worker| {
            let link = state.yearly_establishment(&worker.establishment_id);
            let master = link.and_then(|link| state.master(&link.master_id));
            vec![
                Cell::text(year_label(state, &worker.year_id)),
                Cell::text(&worker.name),
                Cell::text(&worker.father_name),
                Cell::Number(f64::from(worker.age)),
                Cell::text(worker.gender.as_str()),
                Cell::text(&worker.caste),
                Cell::text(&worker.aadhaar_number),
                Cell::text(&worker.mobile),
                Cell::text(&worker.native_state),
                Cell::text(&worker.nature_of_work),
                Cell::text(master.map(|m| m.name.as_str()).unwrap_or_default()),
                Cell::text(link.map(|l| l.site_address.as_str()).unwrap_or_default()),
                Cell::text(worker.joining_date.to_string()),
                Cell::text(worker.expected_end_date.to_string()),
                Cell::text(if worker.has_family_at_site { "Yes" } else { "No" }),
                Cell::text(worker.notes.as_deref().unwrap_or_default()),
            ]
        })
        .collect();

    SheetTable {
        sheet_name: WORKERS_SHEET.to_string(),
        columns: WORKER_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

fn build_establishments_table(state: &AppState, scope: ReportScope) -> SheetTable {
    let rows = state
        .yearly_establishments
        .iter()
        .filter(|link| in_scope(state, scope, &link.year_id))
        .map(|link| {
            let master = state.master(&link.master_id);
            vec![
                Cell::text(year_label(state, &link.year_id)),
                Cell::text(master.map(|m| m.name.as_str()).unwrap_or_default()),
                Cell::text(
                    master
                        .map(|m| m.registration_number.as_str())
                        .unwrap_or_default(),
                ),
                Cell::text(master.map(|m| m.kind.as_str()).unwrap_or_default()),
                Cell::text(&link.site_address),
                Cell::text(&link.owner_name),
                Cell::text(&link.owner_mobile),
            ]
        })
        .collect();

    SheetTable {
        sheet_name: ESTABLISHMENTS_SHEET.to_string(),
        columns: ESTABLISHMENT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pravasi::registry::model::seed_state;

    #[test]
    fn seed_report_resolves_joins() {
        let workbook = build_report(&seed_state(), ReportScope::AllYears);
        let workers = &workbook.tables[0];
        assert_eq!(workers.rows.len(), 2);
        assert_eq!(workers.rows[0][0], Cell::text("2024-25"));
        assert_eq!(workers.rows[0][10], Cell::text("RR Bricks Co"));
        assert_eq!(workers.rows[0][11], Cell::text("Moinabad Road, RR Dist"));
        assert_eq!(workers.rows[0][14], Cell::text("Yes"));
        assert_eq!(workers.rows[1][14], Cell::text("No"));

        let establishments = &workbook.tables[1];
        assert_eq!(establishments.rows.len(), 2);
    }

    #[test]
    fn current_year_scope_drops_other_years() {
        let workbook = build_report(&seed_state(), ReportScope::CurrentYear);
        let establishments = &workbook.tables[1];
        assert_eq!(establishments.rows.len(), 1);
        assert_eq!(establishments.rows[0][4], Cell::text("Moinabad Road, RR Dist"));
    }

    #[test]
    fn file_name_uses_current_year_label() {
        assert_eq!(
            report_file_name(&seed_state()),
            "Pravasi_Registry_RR_2024-25_District_Report.xlsx"
        );
    }

    #[test]
    fn slashed_label_stays_a_single_path_component() {
        let mut state = seed_state();
        if let Some(year) = state.years.iter_mut().find(|y| y.id == "y2") {
            year.label = "2025/26".to_string();
        }
        let name = report_file_name(&state);
        assert_eq!(name, "Pravasi_Registry_RR_2025-26_District_Report.xlsx");
        assert_eq!(std::path::Path::new(&name).components().count(), 1);

        state.years[1].label = r#"a\b:c*d?"e<f>g|h"#.to_string();
        assert_eq!(
            report_file_name(&state),
            "Pravasi_Registry_RR_a-b-c-d--e-f-g-h_District_Report.xlsx"
        );
    }
}
