// src/grade/diff.rs
//! Elementwise absolute error between the truth table and an aligned
//! submission, plus the summary statistics graded on.

use super::align::AlignedTable;
use crate::error::{GradeError, GradeResult};
use crate::table::{Cell, RowLabel, Table};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How undefined cells (missing rows, blank cells) take part in the totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// The first undefined cell aborts grading with `MissingValue`.
    #[default]
    Reject,
    /// Undefined cells make `total_error` NaN; the maximum skips them.
    Propagate,
    /// Undefined cells add nothing to the total and never win the maximum.
    Zero,
}

/// `|submitted - truth|` per cell, row-major, same shape as the truth table.
/// NaN marks an undefined cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMatrix {
    n_rows: usize,
    n_cols: usize,
    values: Vec<f64>,
}

impl ErrorMatrix {
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        if row < self.n_rows && column < self.n_cols {
            Some(self.values[row * self.n_cols + column])
        } else {
            None
        }
    }

    /// All cells in row-major order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// The worst cell, by label and by position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellLocation {
    row_label: RowLabel,
    column_label: String,
    #[serde(skip)]
    row: usize,
    #[serde(skip)]
    column: usize,
}

impl CellLocation {
    pub fn row_label(&self) -> &RowLabel {
        &self.row_label
    }

    pub fn column_label(&self) -> &str {
        &self.column_label
    }

    /// Zero-based row position in the truth table.
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiffReport {
    total_error: f64,
    max_error: f64,
    location: CellLocation,
}

impl DiffReport {
    pub fn total_error(&self) -> f64 {
        self.total_error
    }

    pub fn max_error(&self) -> f64 {
        self.max_error
    }

    pub fn location(&self) -> &CellLocation {
        &self.location
    }

    pub(crate) fn into_parts(self) -> (f64, f64, CellLocation) {
        (self.total_error, self.max_error, self.location)
    }
}

/// Coerce a cell to a number, naming the offending row/column on failure.
pub(crate) fn numeric(
    cell: Option<&Cell>,
    row: &RowLabel,
    column: &str,
) -> GradeResult<Option<f64>> {
    match cell {
        None => Ok(None),
        Some(cell) => cell
            .to_numeric()
            .map_err(|raw| GradeError::NonNumericValue {
                row: row.clone(),
                column: column.to_string(),
                value: raw.to_string(),
            }),
    }
}

/// Build the error matrix. Cells are visited row-major, so the reported
/// `NonNumericValue`/`MissingValue` is always the first offending cell.
pub fn error_matrix(
    truth: &Table,
    aligned: &AlignedTable,
    policy: MissingPolicy,
) -> GradeResult<ErrorMatrix> {
    let (n_rows, n_cols) = (truth.num_rows(), truth.num_columns());
    if aligned.num_rows() != n_rows {
        return Err(GradeError::shape(format!(
            "aligned submission has {} rows, truth has {}",
            aligned.num_rows(),
            n_rows
        )));
    }

    let mut values = Vec::with_capacity(n_rows * n_cols);
    for (r, label) in truth.labels().iter().enumerate() {
        for (c, column) in truth.columns().iter().enumerate() {
            let t = numeric(truth.cell(r, c), label, column)?;
            let s = numeric(aligned.cell(r, c), label, column)?;
            match (t, s) {
                (Some(t), Some(s)) => {
                    let err = (s - t).abs();
                    // two finite values near f64::MAX can still differ by inf
                    if !err.is_finite() {
                        return Err(GradeError::NonNumericValue {
                            row: label.clone(),
                            column: column.clone(),
                            value: s.to_string(),
                        });
                    }
                    values.push(err);
                }
                _ if policy == MissingPolicy::Reject => {
                    return Err(GradeError::MissingValue {
                        row: label.clone(),
                        column: column.clone(),
                    })
                }
                _ => values.push(f64::NAN),
            }
        }
    }

    Ok(ErrorMatrix {
        n_rows,
        n_cols,
        values,
    })
}

/// Reduce an error matrix to total, maximum and the first cell (row-major)
/// holding the maximum.
pub fn summarize(
    truth: &Table,
    matrix: &ErrorMatrix,
    policy: MissingPolicy,
) -> GradeResult<DiffReport> {
    // explicit left fold from +0.0 keeps the summation order fixed
    let total_error = match policy {
        MissingPolicy::Zero => matrix
            .values
            .iter()
            .filter(|v| !v.is_nan())
            .fold(0.0, |acc, v| acc + v),
        MissingPolicy::Reject | MissingPolicy::Propagate => {
            matrix.values.iter().fold(0.0, |acc, v| acc + v)
        }
    };

    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in matrix.values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        // strict > keeps the first occurrence on ties
        if best.map_or(true, |(_, m)| v > m) {
            best = Some((i, v));
        }
    }
    let (flat, max_error) =
        best.ok_or_else(|| GradeError::shape("no cell has both a truth and a submitted value"))?;

    let (row, column) = (flat / matrix.n_cols, flat % matrix.n_cols);
    let location = CellLocation {
        row_label: truth.labels()[row].clone(),
        column_label: truth.columns()[column].clone(),
        row,
        column,
    };
    debug!(total_error, max_error, row, column, "summarized error matrix");

    Ok(DiffReport {
        total_error,
        max_error,
        location,
    })
}

/// Compare `aligned` to `truth`.
pub fn diff(truth: &Table, aligned: &AlignedTable, policy: MissingPolicy) -> GradeResult<DiffReport> {
    let matrix = error_matrix(truth, aligned, policy)?;
    summarize(truth, &matrix, policy)
}
