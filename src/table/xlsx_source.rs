use super::{utils, Cell, Table};
use crate::error::{GradeError, GradeResult};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::debug;

/// Excel stores every number as a float; whole values below this print as
/// integers so `2.0` labels infer as ordinal `2`.
const MAX_EXACT_INT: f64 = 9.0e15;

/// Text form of a header or label cell. Date cells print in a layout the
/// timestamp parser accepts.
fn label_text(cell: &Data) -> String {
    match cell {
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INT => {
            format!("{}", *f as i64)
        }
        other => other.to_string(),
    }
}

fn value_cell(cell: &Data) -> Cell {
    match cell {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::from_f64(*f),
        Data::String(s) => utils::parse_cell(s),
        // #N/A, #DIV/0! and friends read as blanks
        Data::Empty | Data::Error(_) => Cell::Missing,
        other => Cell::Text(other.to_string()),
    }
}

/// Read the first worksheet of a workbook. Row 1 holds the headers; column A
/// is the row index.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.display()))]
pub fn read_xlsx_path(path: &Path) -> GradeResult<Table> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| GradeError::parse(format!("opening {}: {}", path.display(), e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| GradeError::parse(format!("{} has no worksheets", path.display())))?
        .map_err(|e| GradeError::parse(format!("reading first worksheet: {}", e)))?;

    let mut sheet_rows = range.rows();
    let header = sheet_rows
        .next()
        .ok_or_else(|| GradeError::parse("worksheet is empty"))?;
    let columns: Vec<String> = header
        .iter()
        .skip(1)
        .map(|c| utils::clean_str(&label_text(c)).to_string())
        .collect();

    let mut raw_labels = Vec::new();
    let mut rows = Vec::new();
    for row in sheet_rows {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        raw_labels.push(row.first().map(label_text).unwrap_or_default());
        rows.push(row.iter().skip(1).map(value_cell).collect());
    }

    let labels = utils::infer_labels(&raw_labels)?;
    let table = Table::new(labels, columns, rows)?;
    debug!(
        rows = table.num_rows(),
        columns = table.num_columns(),
        kind = ?table.label_kind(),
        "parsed worksheet"
    );
    Ok(table)
}
