// src/table/mod.rs
//! In-memory tables: an ordered row index plus a fixed, ordered set of named
//! value columns. Both the truth dataset and every submission are loaded into
//! this shape before grading.

pub mod csv_source;
pub mod date_parser;
pub mod parquet_source;
pub mod utils;
pub mod xlsx_source;

use crate::error::{GradeError, GradeResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path};

/// A row index value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowLabel {
    Time(NaiveDateTime),
    Ordinal(i64),
    Text(String),
}

impl fmt::Display for RowLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowLabel::Time(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            RowLabel::Ordinal(n) => write!(f, "{}", n),
            RowLabel::Text(s) => f.write_str(s),
        }
    }
}

impl RowLabel {
    /// Re-read this label as `kind`. `None` when it can never be a label of
    /// that kind (e.g. a `total` row under an ordinal index).
    pub fn conform_to(&self, kind: LabelKind) -> Option<RowLabel> {
        match (kind, self) {
            (LabelKind::Time, RowLabel::Time(_))
            | (LabelKind::Ordinal, RowLabel::Ordinal(_))
            | (LabelKind::Text, RowLabel::Text(_)) => Some(self.clone()),
            (LabelKind::Time, RowLabel::Text(s)) => {
                date_parser::parse_timestamp(s).map(RowLabel::Time)
            }
            (LabelKind::Ordinal, RowLabel::Text(s)) => {
                utils::clean_str(s).parse().ok().map(RowLabel::Ordinal)
            }
            (LabelKind::Text, other) => Some(RowLabel::Text(other.to_string())),
            (LabelKind::Time, RowLabel::Ordinal(_)) | (LabelKind::Ordinal, RowLabel::Time(_)) => {
                None
            }
        }
    }
}

/// Kind of a whole row index. Decides which window regime applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    Time,
    Ordinal,
    Text,
}

impl LabelKind {
    fn of(labels: &[RowLabel]) -> Self {
        if !labels.is_empty() && labels.iter().all(|l| matches!(l, RowLabel::Time(_))) {
            LabelKind::Time
        } else if labels.iter().all(|l| matches!(l, RowLabel::Ordinal(_))) {
            LabelKind::Ordinal
        } else {
            LabelKind::Text
        }
    }
}

/// A single value cell as read from the source file. Coercion to a number is
/// deferred to grading so the failing row/column can be reported.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    /// NaN reads as missing; infinities are kept as text and fail coercion.
    pub fn from_f64(v: f64) -> Self {
        if v.is_nan() {
            Cell::Missing
        } else if v.is_finite() {
            Cell::Number(v)
        } else {
            Cell::Text(v.to_string())
        }
    }

    /// `Ok(None)` for an undefined cell, `Err(raw)` when the text is not a
    /// finite number.
    pub fn to_numeric(&self) -> Result<Option<f64>, &str> {
        match self {
            Cell::Number(v) => Ok(Some(*v)),
            Cell::Missing => Ok(None),
            Cell::Text(raw) => match utils::parse_cell(raw) {
                Cell::Number(v) => Ok(Some(v)),
                Cell::Missing => Ok(None),
                Cell::Text(_) => Err(raw.as_str()),
            },
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::from_f64(v)
    }
}

/// Row-major table. Invariant: every row has exactly `columns.len()` cells and
/// there is one label per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    labels: Vec<RowLabel>,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
    kind: LabelKind,
}

impl Table {
    pub fn new(
        labels: Vec<RowLabel>,
        columns: Vec<String>,
        rows: Vec<Vec<Cell>>,
    ) -> GradeResult<Self> {
        if labels.len() != rows.len() {
            return Err(GradeError::parse(format!(
                "{} row labels for {} rows",
                labels.len(),
                rows.len()
            )));
        }
        if let Some((label, row)) = labels
            .iter()
            .zip(&rows)
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(GradeError::parse(format!(
                "row {} has {} cells, expected {}",
                label,
                row.len(),
                columns.len()
            )));
        }
        let kind = LabelKind::of(&labels);
        Ok(Self {
            labels,
            columns,
            rows,
            kind,
        })
    }

    /// Build a table from plain numbers, e.g. a programmatic fixture.
    pub fn from_values<L, C>(labels: Vec<L>, columns: Vec<C>, values: Vec<Vec<f64>>) -> GradeResult<Self>
    where
        L: Into<RowLabel>,
        C: Into<String>,
    {
        Table::new(
            labels.into_iter().map(Into::into).collect(),
            columns.into_iter().map(Into::into).collect(),
            values
                .into_iter()
                .map(|row| row.into_iter().map(Cell::from_f64).collect())
                .collect(),
        )
    }

    /// Load a table from disk, picking the reader by file extension.
    pub fn load(path: impl AsRef<Path>) -> GradeResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => csv_source::read_csv_path(path),
            Some("parquet") | Some("pq") => parquet_source::read_parquet_path(path),
            Some("xlsx") | Some("xlsm") => xlsx_source::read_xlsx_path(path),
            _ => Err(GradeError::parse(format!(
                "unsupported file type: {}",
                path.display()
            ))),
        }
    }

    pub fn labels(&self) -> &[RowLabel] {
        &self.labels
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn label_kind(&self) -> LabelKind {
        self.kind
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}

impl From<NaiveDateTime> for RowLabel {
    fn from(ts: NaiveDateTime) -> Self {
        RowLabel::Time(ts)
    }
}

impl From<i64> for RowLabel {
    fn from(n: i64) -> Self {
        RowLabel::Ordinal(n)
    }
}

impl From<&str> for RowLabel {
    fn from(s: &str) -> Self {
        RowLabel::Text(s.to_string())
    }
}
