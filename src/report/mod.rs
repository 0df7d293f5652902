//! Report transform pipeline.
//!
//! Everything here is a pure function of `(rows, preferences)`:
//! row filtering, column projection, chart aggregation, dashboard
//! insights, and the PDF/XLSX exports built from the projected table.
//! Nothing is cached; derived views are recomputed on every read.

pub mod chart;
pub mod export;
pub mod view;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::ReportColumn;

pub use chart::{chart_series, insights, ChartPoint, Insight, INSIGHT_WATCH_LIST};
pub use export::{
    export_file_name, export_pdf, export_xlsx, write_export, ExportArtifact, ExportError,
    ExportFormat,
};
pub use view::{build_export_table, filter_rows, render_cell, ExportTable, PLACEHOLDER};

/// User-selected display preferences for the report table and exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPreferences {
    /// Visible columns. `BTreeSet` iterates in canonical column order.
    pub visible_columns: BTreeSet<ReportColumn>,
    /// Keep only rows scoring 0.
    pub non_compliant_only: bool,
}

impl Default for ReportPreferences {
    fn default() -> Self {
        Self {
            visible_columns: ReportColumn::ALL.iter().copied().collect(),
            non_compliant_only: false,
        }
    }
}

impl ReportPreferences {
    /// Flip one column's visibility.
    pub fn toggle_column(&mut self, column: ReportColumn) {
        if !self.visible_columns.remove(&column) {
            self.visible_columns.insert(column);
        }
    }

    pub fn is_visible(&self, column: ReportColumn) -> bool {
        self.visible_columns.contains(&column)
    }

    /// Visible columns in canonical order.
    pub fn columns(&self) -> Vec<ReportColumn> {
        self.visible_columns.iter().copied().collect()
    }
}
