use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::{debug, info_span};

use crate::error::LoadError;
use crate::sanitize;

use super::{Cell, Table};

/// Reads one sheet of a workbook (xlsx, xlsm, xlsb, xls or ods) into a [`Table`].
///
/// The first row is the header. Rows where every cell is empty are dropped.
/// `sheet` selects a sheet by name; the first sheet is used when `None`.
pub fn load_table(path: &Path, sheet: Option<&str>) -> Result<Table, LoadError> {
    let _span = info_span!("load_table", file = %sanitize::redact_path(path)).entered();

    if !path.is_file() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| LoadError::OpenWorkbook {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|name| name.as_str() == wanted)
            .cloned()
            .ok_or_else(|| LoadError::MissingSheet {
                path: path.to_path_buf(),
                sheet: wanted.to_string(),
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| LoadError::NoSheets(path.to_path_buf()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| LoadError::ReadSheet {
            sheet: sheet_name.clone(),
            reason: e.to_string(),
        })?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| LoadError::EmptySheet(sheet_name.clone()))?
        .iter()
        .map(|cell| convert_cell(cell).to_string())
        .collect();

    let body: Vec<Vec<Cell>> = rows
        .map(|row| row.iter().map(convert_cell).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(Cell::is_empty))
        .collect();

    debug!(
        sheet = %sheet_name,
        columns = header.len(),
        rows = body.len(),
        "Loaded sheet"
    );

    Ok(Table::new(header, body))
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => Cell::DateTime(value),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}
