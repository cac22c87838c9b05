//! Tabular task source: loaded cells, normalized table, task records.

pub mod workbook;

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::ColumnMapping;
use crate::error::LoadError;

pub use workbook::load_table;

/// A single loaded spreadsheet value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Value as a string, `None` for empty or whitespace-only cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) if s.trim().is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            // Whole numbers print without a fractional part, so ids read as ids
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(value: NaiveDateTime) -> Self {
        Cell::DateTime(value)
    }
}

/// Trims surrounding whitespace and lowercases a column name.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Loaded rows under normalized column names, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Builds a table, normalizing column names and padding or truncating
    /// every row to the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| normalize_column_name(c)).collect();
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = normalize_column_name(name);
        self.columns.iter().position(|c| *c == wanted)
    }

    fn require_column(&self, name: &str) -> Result<usize, LoadError> {
        self.column_index(name)
            .ok_or_else(|| LoadError::MissingColumn(normalize_column_name(name)))
    }

    /// Resolves the mapped columns and turns every row into a [`Task`].
    pub fn into_tasks(self, mapping: &ColumnMapping) -> Result<TaskTable, LoadError> {
        let process_idx = self.require_column(&mapping.process_id)?;
        let user_idx = self.require_column(&mapping.responsible_user)?;
        let sector_idx = self.require_column(&mapping.origin_sector)?;
        let deadline_idx = self.require_column(&mapping.deadline)?;

        let tasks = self
            .rows
            .into_iter()
            .map(|row| Task {
                process_id: row[process_idx].as_text().unwrap_or_default(),
                responsible_user: row[user_idx].as_text(),
                origin_sector: row[sector_idx].as_text(),
                deadline: row[deadline_idx].clone(),
                row,
            })
            .collect();

        Ok(TaskTable {
            columns: self.columns,
            deadline_column: deadline_idx,
            tasks,
        })
    }
}

/// One source row with its mapped attributes pulled out.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub process_id: String,
    pub responsible_user: Option<String>,
    pub origin_sector: Option<String>,
    /// Raw deadline value; parsed by the enricher.
    pub deadline: Cell,
    /// Every source column, aligned with [`TaskTable::columns`].
    pub row: Vec<Cell>,
}

/// Task records together with the source header they were read under.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskTable {
    pub columns: Vec<String>,
    /// Position of the deadline within [`Task::row`].
    pub deadline_column: usize,
    pub tasks: Vec<Task>,
}
