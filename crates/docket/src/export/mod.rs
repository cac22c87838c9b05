//! Two-sheet report export: the filtered view and the unfiltered top-N overdue.

pub mod xlsx;

use std::path::{Path, PathBuf};

use tracing::{debug, info_span};

use crate::config::ExportConfig;
use crate::enrich::EnrichedTask;
use crate::error::ExportError;
use crate::report::top_n_overdue;
use crate::sanitize;
use crate::source::Cell;

pub use xlsx::WorkbookWriter;

/// Derived columns appended after the source columns.
pub const DERIVED_COLUMNS: [&str; 4] = ["status", "dias_em_atraso", "dias_para_vencer", "faixa"];

pub const REPORT_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Source header plus derived columns, and where the deadline sits in it.
#[derive(Debug, Clone)]
pub struct ReportLayout<'a> {
    pub columns: &'a [String],
    pub deadline_column: usize,
    pub filtered_sheet: &'a str,
    pub top_sheet: &'a str,
}

impl<'a> ReportLayout<'a> {
    pub fn new(columns: &'a [String], deadline_column: usize, export: &'a ExportConfig) -> Self {
        Self {
            columns,
            deadline_column,
            filtered_sheet: &export.filtered_sheet,
            top_sheet: &export.top_sheet,
        }
    }

    fn header(&self) -> Vec<String> {
        self.columns
            .iter()
            .cloned()
            .chain(DERIVED_COLUMNS.iter().map(|c| c.to_string()))
            .collect()
    }

    /// Source cells with the deadline replaced by its parsed value, then the
    /// derived cells.
    fn row(&self, task: &EnrichedTask) -> Vec<Cell> {
        let mut row = task.task.row.clone();
        row.resize(self.columns.len(), Cell::Empty);
        if let Some(slot) = row.get_mut(self.deadline_column) {
            *slot = task.deadline.map(Cell::DateTime).unwrap_or(Cell::Empty);
        }
        row.push(Cell::Text(task.status.label().to_string()));
        row.push(optional_number(task.days_overdue));
        row.push(optional_number(task.days_remaining));
        row.push(
            task.forecast_bucket
                .map(|b| Cell::Text(b.label().to_string()))
                .unwrap_or(Cell::Empty),
        );
        row
    }
}

fn optional_number(value: Option<i64>) -> Cell {
    value.map(|v| Cell::Number(v as f64)).unwrap_or(Cell::Empty)
}

/// Builds the report workbook in memory.
///
/// Sheet one holds `filtered`; sheet two holds the top `top_n` overdue rows of
/// `full`, regardless of the filter that produced `filtered`.
pub fn report_workbook_bytes(
    layout: &ReportLayout<'_>,
    filtered: &[EnrichedTask],
    full: &[EnrichedTask],
    top_n: usize,
) -> Result<Vec<u8>, ExportError> {
    let header = layout.header();
    let mut workbook = WorkbookWriter::new();

    workbook.add_sheet(
        layout.filtered_sheet,
        &header,
        filtered.iter().map(|t| layout.row(t)).collect(),
    );

    let top = top_n_overdue(full, top_n);
    debug!(filtered = filtered.len(), top = top.len(), "Assembling report");
    workbook.add_sheet(
        layout.top_sheet,
        &header,
        top.into_iter().map(|t| layout.row(t)).collect(),
    );

    workbook.to_bytes()
}

/// Writes the report workbook to `path`, creating parent directories.
pub fn write_report(
    path: &Path,
    layout: &ReportLayout<'_>,
    filtered: &[EnrichedTask],
    full: &[EnrichedTask],
    top_n: usize,
) -> Result<PathBuf, ExportError> {
    let _span = info_span!("write_report", file = %sanitize::redact_path(path)).entered();

    let bytes = report_workbook_bytes(layout, filtered, full, top_n)?;
    write_file(path, &bytes)?;

    Ok(path.to_path_buf())
}

pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ExportError::WriteFile {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, bytes).map_err(|e| ExportError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}
