use serde::Serialize;

use super::ReportPreferences;
use crate::models::{ReportColumn, ReportRow};

/// Cell text for an absent omission or sector reference.
pub const PLACEHOLDER: &str = "-";

/// Rows honoring the non-compliant filter, in report order.
pub fn filter_rows<'a>(rows: &'a [ReportRow], prefs: &ReportPreferences) -> Vec<&'a ReportRow> {
    rows.iter()
        .filter(|row| !prefs.non_compliant_only || row.is_non_compliant())
        .collect()
}

/// Text of one cell as shown in the table and both exports.
pub fn render_cell(row: &ReportRow, column: ReportColumn) -> String {
    match column {
        ReportColumn::Standard => row.standard.clone(),
        ReportColumn::Requirement => row.requirement.clone(),
        ReportColumn::ComplianceScore => row.score_label(),
        ReportColumn::Remarks => row.remarks.clone(),
        ReportColumn::Omission => row
            .omission
            .as_ref()
            .map(|o| o.label())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        ReportColumn::SectorRef => row
            .sector_ref
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(PLACEHOLDER)
            .to_string(),
    }
}

/// One projected body row. Scores keep their numeric value so the
/// spreadsheet can store them as numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub score: f64,
}

/// Filtered and projected report: the single dataset every export
/// and the on-screen table are rendered from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportTable {
    pub columns: Vec<ReportColumn>,
    pub rows: Vec<TableRow>,
}

impl ExportTable {
    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Filter rows and project the visible columns in canonical order.
pub fn build_export_table(rows: &[ReportRow], prefs: &ReportPreferences) -> ExportTable {
    let columns = prefs.columns();
    let rows = filter_rows(rows, prefs)
        .into_iter()
        .map(|row| TableRow {
            cells: columns.iter().map(|c| render_cell(row, *c)).collect(),
            score: row.compliance_score,
        })
        .collect();
    ExportTable { columns, rows }
}
