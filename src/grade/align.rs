// src/grade/align.rs

use crate::error::{GradeError, GradeResult};
use crate::table::{Cell, RowLabel, Table};
use std::collections::{hash_map::Entry, HashMap};
use tracing::{debug, warn};

/// A submission re-indexed onto the truth table's row labels. Row `r` here
/// always corresponds to row `r` of the truth table.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    rows: Vec<Vec<Cell>>,
    matched_rows: usize,
    dropped_rows: usize,
}

impl AlignedTable {
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Truth rows that were found in the submission.
    pub fn matched_rows(&self) -> usize {
        self.matched_rows
    }

    /// Truth rows absent from the submission; all their cells are `Missing`.
    pub fn missing_rows(&self) -> usize {
        self.rows.len() - self.matched_rows
    }

    /// Submission rows whose label is not in the truth table.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }
}

/// Conform `submitted` to the shape of `truth`.
///
/// Column names must match exactly, in order. Rows are looked up by label:
/// truth rows absent from the submission become all-`Missing`, and extra
/// submission rows are dropped.
pub fn align(truth: &Table, submitted: &Table) -> GradeResult<AlignedTable> {
    if truth.num_rows() == 0 {
        return Err(GradeError::shape("truth table has no rows"));
    }
    if truth.num_columns() == 0 {
        return Err(GradeError::shape("truth table has no value columns"));
    }

    if truth.columns() != submitted.columns() {
        warn!(
            expected = ?truth.columns(),
            found = ?submitted.columns(),
            "column mismatch"
        );
        return Err(GradeError::SchemaMismatch {
            expected: truth.columns().to_vec(),
            found: submitted.columns().to_vec(),
        });
    }

    // One stray row (`total`, `notes`) makes a whole label column infer as
    // text; re-read each label as the truth's kind before matching.
    let kind = truth.label_kind();
    let mut by_label: HashMap<RowLabel, usize> = HashMap::with_capacity(submitted.num_rows());
    for (pos, label) in submitted.labels().iter().enumerate() {
        let Some(key) = label.conform_to(kind) else {
            debug!(%label, "row label cannot match the truth index");
            continue;
        };
        match by_label.entry(key) {
            Entry::Occupied(_) => return Err(GradeError::DuplicateRowLabel(label.clone())),
            Entry::Vacant(slot) => {
                slot.insert(pos);
            }
        }
    }

    let width = truth.num_columns();
    let mut matched_rows = 0;
    let rows: Vec<Vec<Cell>> = truth
        .labels()
        .iter()
        .map(|label| match by_label.get(label) {
            Some(&pos) => {
                matched_rows += 1;
                submitted.rows()[pos].clone()
            }
            None => vec![Cell::Missing; width],
        })
        .collect();

    if matched_rows == 0 {
        return Err(GradeError::shape(
            "submission shares no row labels with the truth table",
        ));
    }

    let dropped_rows = submitted.num_rows() - matched_rows;
    let aligned = AlignedTable {
        rows,
        matched_rows,
        dropped_rows,
    };
    if aligned.missing_rows() > 0 || dropped_rows > 0 {
        warn!(
            missing = aligned.missing_rows(),
            dropped = dropped_rows,
            "submission rows differ from truth index"
        );
    } else {
        debug!(rows = matched_rows, "submission aligned");
    }
    Ok(aligned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{csv_source::read_csv, LabelKind};

    fn truth() -> Table {
        Table::from_values(
            vec![0i64, 1, 2],
            vec!["A", "B"],
            vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
        )
        .unwrap()
    }

    #[test]
    fn column_order_matters() {
        let submitted = Table::from_values(
            vec![0i64, 1, 2],
            vec!["B", "A"],
            vec![vec![2.0, 1.0], vec![4.0, 3.0], vec![6.0, 5.0]],
        )
        .unwrap();
        let err = align(&truth(), &submitted).unwrap_err();
        assert_eq!(
            err,
            GradeError::SchemaMismatch {
                expected: vec!["A".into(), "B".into()],
                found: vec!["B".into(), "A".into()],
            }
        );
    }

    #[test]
    fn reindexes_by_label() {
        // shuffled, one row missing, one extra
        let submitted = Table::from_values(
            vec![2i64, 0, 9],
            vec!["A", "B"],
            vec![vec![50.0, 60.0], vec![10.0, 20.0], vec![0.0, 0.0]],
        )
        .unwrap();
        let aligned = align(&truth(), &submitted).unwrap();
        assert_eq!(aligned.num_rows(), 3);
        assert_eq!(aligned.cell(0, 0), Some(&Cell::Number(10.0)));
        assert_eq!(aligned.rows()[1], vec![Cell::Missing, Cell::Missing]);
        assert_eq!(aligned.cell(2, 1), Some(&Cell::Number(60.0)));
        assert_eq!(aligned.matched_rows(), 2);
        assert_eq!(aligned.missing_rows(), 1);
        assert_eq!(aligned.dropped_rows(), 1);
    }

    #[test]
    fn no_overlap_is_a_shape_error() {
        let submitted =
            Table::from_values(vec![7i64, 8], vec!["A", "B"], vec![vec![1.0, 2.0], vec![3.0, 4.0]])
                .unwrap();
        let err = align(&truth(), &submitted).unwrap_err();
        assert!(matches!(err, GradeError::EmptyOrShapeMismatch(_)));
    }

    #[test]
    fn empty_truth_is_a_shape_error() {
        let empty = Table::from_values(Vec::<i64>::new(), vec!["A", "B"], vec![]).unwrap();
        let err = align(&empty, &truth()).unwrap_err();
        assert!(matches!(err, GradeError::EmptyOrShapeMismatch(_)));
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let submitted =
            Table::from_values(vec![0i64, 0], vec!["A", "B"], vec![vec![1.0, 2.0], vec![3.0, 4.0]])
                .unwrap();
        let err = align(&truth(), &submitted).unwrap_err();
        assert_eq!(err, GradeError::DuplicateRowLabel(RowLabel::Ordinal(0)));
    }

    #[test]
    fn zero_column_truth_is_a_shape_error() {
        let truth = Table::new(
            vec![RowLabel::Ordinal(0), RowLabel::Ordinal(1)],
            vec![],
            vec![vec![], vec![]],
        )
        .unwrap();
        let err = align(&truth, &truth.clone()).unwrap_err();
        assert!(matches!(err, GradeError::EmptyOrShapeMismatch(_)));
    }

    #[test]
    fn stray_text_row_under_ordinal_index_is_dropped() -> anyhow::Result<()> {
        let truth = read_csv(",0,1\n0,1,2\n1,3,4\n2,5,6\n3,7,8\n".as_bytes())?;
        let submitted = read_csv(",0,1\n0,1,2\n1,3,4\n2,5,40\n3,7,8\ntotal,16,54\n".as_bytes())?;
        assert_eq!(truth.label_kind(), LabelKind::Ordinal);
        assert_eq!(submitted.label_kind(), LabelKind::Text);

        let aligned = align(&truth, &submitted)?;
        assert_eq!(aligned.matched_rows(), 4);
        assert_eq!(aligned.missing_rows(), 0);
        assert_eq!(aligned.dropped_rows(), 1);
        assert_eq!(aligned.cell(2, 1), Some(&Cell::Number(40.0)));
        Ok(())
    }

    #[test]
    fn stray_text_row_under_time_index_is_dropped() -> anyhow::Result<()> {
        let truth = read_csv(
            "time,occ\n2024-03-01 00:00:00,1\n2024-03-01 00:15:00,2\n".as_bytes(),
        )?;
        let submitted = read_csv(
            "time,occ\n2024-03-01 00:15,2.5\nnotes,0\n2024-03-01 00:00,1\n".as_bytes(),
        )?;
        assert_eq!(truth.label_kind(), LabelKind::Time);
        assert_eq!(submitted.label_kind(), LabelKind::Text);

        let aligned = align(&truth, &submitted)?;
        assert_eq!(aligned.matched_rows(), 2);
        assert_eq!(aligned.dropped_rows(), 1);
        assert_eq!(aligned.cell(0, 0), Some(&Cell::Number(1.0)));
        assert_eq!(aligned.cell(1, 0), Some(&Cell::Number(2.5)));
        Ok(())
    }

    #[test]
    fn labels_that_collide_after_conversion_are_duplicates() -> anyhow::Result<()> {
        let submitted = read_csv(",A,B\n0,1,2\n00,1,2\nx,0,0\n".as_bytes())?;
        let err = align(&truth(), &submitted).unwrap_err();
        assert_eq!(err, GradeError::DuplicateRowLabel(RowLabel::Text("00".into())));
        Ok(())
    }

    #[test]
    fn ordinal_submission_matches_text_truth() {
        let truth = Table::from_values(vec!["7", "x"], vec!["A"], vec![vec![1.0], vec![2.0]]).unwrap();
        let submitted = Table::from_values(vec![7i64], vec!["A"], vec![vec![1.5]]).unwrap();
        let aligned = align(&truth, &submitted).unwrap();
        assert_eq!(aligned.cell(0, 0), Some(&Cell::Number(1.5)));
        assert_eq!(aligned.missing_rows(), 1);
    }
}
