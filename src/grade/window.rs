// src/grade/window.rs
//! Comparison window around the worst cell, for plotting truth against the
//! submission.
//!
//! Time-indexed tables use the calendar day of the worst cell. Any other
//! index is cut into fixed blocks of `rows` positions, counted from the top
//! of the table, and the block holding the worst cell is used.

use super::align::AlignedTable;
use super::diff::{numeric, CellLocation};
use crate::error::GradeResult;
use crate::table::{LabelKind, RowLabel, Table};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rows in one day of quarter-hourly data.
pub const DAY_ROWS: usize = 96;

/// Truncation applied to a calendar-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayWindowPolicy {
    /// At most the first `rows` rows of the day.
    #[default]
    Capped,
    /// Every row of the day.
    Uncapped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    pub rows: usize,
    pub day_policy: DayWindowPolicy,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            rows: DAY_ROWS,
            day_policy: DayWindowPolicy::default(),
        }
    }
}

/// Which slice of the table the window covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowRegime {
    CalendarDay { day: NaiveDate },
    Block { index: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowPoint {
    /// 1-based position within the window.
    pub order: usize,
    pub truth_value: Option<f64>,
    pub submitted_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonWindow {
    regime: WindowRegime,
    points: Vec<WindowPoint>,
}

impl ComparisonWindow {
    pub fn regime(&self) -> WindowRegime {
        self.regime
    }

    pub fn points(&self) -> &[WindowPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub(crate) fn into_parts(self) -> (WindowRegime, Vec<WindowPoint>) {
        (self.regime, self.points)
    }
}

/// Positions of the rows falling on `day`, in table order.
fn day_positions(truth: &Table, day: NaiveDate, cfg: &WindowConfig) -> Vec<usize> {
    let limit = match cfg.day_policy {
        DayWindowPolicy::Capped => cfg.rows,
        DayWindowPolicy::Uncapped => usize::MAX,
    };
    truth
        .labels()
        .iter()
        .enumerate()
        .filter(|(_, label)| matches!(label, RowLabel::Time(ts) if ts.date() == day))
        .map(|(pos, _)| pos)
        .take(limit)
        .collect()
}

/// Positions of the fixed-size block holding `pos`, clipped to `n_rows`.
fn block_positions(n_rows: usize, pos: usize, block: usize) -> (usize, Vec<usize>) {
    let block = block.max(1);
    let index = pos / block;
    let start = index * block;
    let end = n_rows.min(start.saturating_add(block));
    (index, (start..end).collect())
}

/// Extract the comparison window for `location`'s column.
pub fn extract_window(
    truth: &Table,
    aligned: &AlignedTable,
    location: &CellLocation,
    cfg: &WindowConfig,
) -> GradeResult<ComparisonWindow> {
    let (regime, positions) = match (truth.label_kind(), location.row_label()) {
        (LabelKind::Time, RowLabel::Time(ts)) => {
            let day = ts.date();
            (WindowRegime::CalendarDay { day }, day_positions(truth, day, cfg))
        }
        _ => {
            let (index, positions) = block_positions(truth.num_rows(), location.row(), cfg.rows);
            (WindowRegime::Block { index }, positions)
        }
    };

    let column = location.column();
    let column_label = location.column_label();
    let mut points = Vec::with_capacity(positions.len());
    for (i, r) in positions.into_iter().enumerate() {
        let label = &truth.labels()[r];
        points.push(WindowPoint {
            order: i + 1,
            truth_value: numeric(truth.cell(r, column), label, column_label)?,
            submitted_value: numeric(aligned.cell(r, column), label, column_label)?,
        });
    }

    debug!(?regime, len = points.len(), column = column_label, "extracted window");
    Ok(ComparisonWindow { regime, points })
}
