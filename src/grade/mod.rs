// src/grade/mod.rs
pub mod align;
pub mod diff;
pub mod report;
pub mod window;

pub use align::{align, AlignedTable};
pub use diff::{diff, CellLocation, DiffReport, ErrorMatrix, MissingPolicy};
pub use report::{build, FinalReport};
pub use window::{
    extract_window, ComparisonWindow, DayWindowPolicy, WindowConfig, WindowPoint, WindowRegime,
    DAY_ROWS,
};

use crate::error::GradeResult;
use crate::table::Table;
use tracing::{info, warn};

/// Knobs for one grading run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GradeOptions {
    pub missing: MissingPolicy,
    pub window: WindowConfig,
}

/// Grade `submitted` against `truth`: align, diff, window, report.
/// Any failure aborts the attempt; there is no partial report.
#[tracing::instrument(
    level = "info",
    skip_all,
    fields(rows = truth.num_rows(), columns = truth.num_columns())
)]
pub fn grade(truth: &Table, submitted: &Table, opts: &GradeOptions) -> GradeResult<FinalReport> {
    let result = align(truth, submitted)
        .and_then(|aligned| {
            let d = diff(truth, &aligned, opts.missing)?;
            let w = extract_window(truth, &aligned, d.location(), &opts.window)?;
            Ok(build(d, w))
        });

    match &result {
        Ok(report) => info!(
            total_error = report.total_error(),
            max_error = report.max_error(),
            row = %report.location().row_label(),
            column = report.location().column_label(),
            window_len = report.window().len(),
            "graded submission"
        ),
        Err(e) => warn!(error = %e, "grading failed"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GradeError;
    use crate::table::{csv_source::read_csv, RowLabel};
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,cleangrade=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn four_by_two(cols: [&str; 2], values: Vec<Vec<f64>>) -> Table {
        Table::from_values(vec![0i64, 1, 2, 3], cols.to_vec(), values).unwrap()
    }

    #[test]
    fn worked_example() {
        init_test_logging();
        let truth = four_by_two(
            ["0", "1"],
            vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0], vec![7.0, 8.0]],
        );
        let submitted = four_by_two(
            ["0", "1"],
            vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 40.0], vec![7.0, 8.0]],
        );
        let report = grade(&truth, &submitted, &GradeOptions::default()).unwrap();
        assert_eq!(report.total_error(), 34.0);
        assert_eq!(report.max_error(), 34.0);
        assert_eq!(report.location().row_label(), &RowLabel::Ordinal(2));
        assert_eq!(report.location().column_label(), "1");
        assert_eq!(report.window().len(), 4);
        assert!(report
            .window()
            .iter()
            .enumerate()
            .all(|(i, p)| p.order == i + 1));
    }

    #[test]
    fn swapped_columns_never_grade_as_zero() {
        init_test_logging();
        let values = vec![vec![0.1, 0.2], vec![0.3, 0.4], vec![0.5, 0.6], vec![0.7, 0.8]];
        let truth = four_by_two(["occ_a", "occ_b"], values.clone());
        let submitted = four_by_two(["occ_b", "occ_a"], values);
        let err = grade(&truth, &submitted, &GradeOptions::default()).unwrap_err();
        assert!(matches!(err, GradeError::SchemaMismatch { .. }));
    }

    #[test]
    fn totals_row_in_submission_is_ignored() -> anyhow::Result<()> {
        init_test_logging();
        let truth = read_csv(",0,1\n0,1,2\n1,3,4\n2,5,6\n3,7,8\n".as_bytes())?;
        let submitted = read_csv(",0,1\n0,1,2\n1,3,4\n2,5,40\n3,7,8\ntotal,16,54\n".as_bytes())?;
        let report = grade(&truth, &submitted, &GradeOptions::default())?;
        assert_eq!(report.total_error(), 34.0);
        assert_eq!(report.max_error(), 34.0);
        assert_eq!(report.location().row_label(), &RowLabel::Ordinal(2));
        assert_eq!(report.window().len(), 4);
        Ok(())
    }

    #[test]
    fn exact_copy_scores_zero() {
        init_test_logging();
        let truth = four_by_two(
            ["a", "b"],
            vec![vec![9.0, 2.0], vec![3.0, 4.5], vec![5.0, 6.0], vec![7.0, 8.0]],
        );
        let report = grade(&truth, &truth.clone(), &GradeOptions::default()).unwrap();
        assert_eq!(report.total_error(), 0.0);
        assert_eq!(report.max_error(), 0.0);
    }
}
