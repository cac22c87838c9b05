//! Builders for task spreadsheets used as pipeline input.

#![allow(dead_code)]

use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use docket::export::WorkbookWriter;
use docket::Cell;

/// Reference date used by the default test configuration.
pub fn reference_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 4, 30)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Deadline `days` whole days away from the reference date; negative is past.
pub fn deadline_in(days: i64) -> NaiveDateTime {
    reference_date() + Duration::days(days)
}

/// Builder for a task sheet with the usual Portuguese headers.
pub struct TaskSheetBuilder {
    sheet: String,
    header: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl TaskSheetBuilder {
    pub fn new() -> Self {
        Self {
            sheet: "Tarefas".to_string(),
            header: vec![
                "Processo".to_string(),
                " Usuário Responsável ".to_string(),
                "Setor de Origem".to_string(),
                "Final Prazo".to_string(),
                "Observação".to_string(),
            ],
            rows: vec![],
        }
    }

    pub fn sheet(mut self, name: &str) -> Self {
        self.sheet = name.to_string();
        self
    }

    pub fn header(mut self, header: &[&str]) -> Self {
        self.header = header.iter().map(|h| h.to_string()).collect();
        self
    }

    /// Adds a task with a date-typed deadline cell.
    pub fn task(self, id: &str, user: &str, sector: &str, deadline: NaiveDateTime) -> Self {
        self.row(vec![
            Cell::from(id),
            Cell::from(user),
            Cell::from(sector),
            Cell::DateTime(deadline),
            Cell::Empty,
        ])
    }

    /// Adds a task whose deadline cell holds text.
    pub fn task_with_text_deadline(self, id: &str, user: &str, sector: &str, deadline: &str) -> Self {
        self.row(vec![
            Cell::from(id),
            Cell::from(user),
            Cell::from(sector),
            Cell::from(deadline),
            Cell::Empty,
        ])
    }

    /// Adds a task `days` whole days past its deadline.
    pub fn overdue(self, id: &str, user: &str, sector: &str, days: i64) -> Self {
        self.task(id, user, sector, deadline_in(-days))
    }

    /// Adds a task due in `days` whole days.
    pub fn due_in(self, id: &str, user: &str, sector: &str, days: i64) -> Self {
        self.task(id, user, sector, deadline_in(days))
    }

    pub fn row(mut self, row: Vec<Cell>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Writes the sheet as an xlsx workbook.
    pub fn write(&self, path: &Path) {
        let mut workbook = WorkbookWriter::new();
        workbook.add_sheet(&self.sheet, &self.header, self.rows.clone());
        let bytes = workbook.to_bytes().expect("Failed to build workbook");
        std::fs::write(path, bytes).expect("Failed to write workbook");
    }
}

impl Default for TaskSheetBuilder {
    fn default() -> Self {
        Self::new()
    }
}
