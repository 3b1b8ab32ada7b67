// src/error.rs

use crate::table::RowLabel;
use thiserror::Error;

/// Every way a grading attempt can fail. All variants are terminal for the
/// attempt: no partial report is ever produced alongside one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradeError {
    /// Submitted column names differ from the truth table in name or order.
    #[error("column mismatch: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A cell could not be coerced to a number.
    #[error("non-numeric value {value:?} at row {row}, column {column}")]
    NonNumericValue {
        row: RowLabel,
        column: String,
        value: String,
    },

    /// An undefined cell under `MissingPolicy::Reject`.
    #[error("missing value at row {row}, column {column}")]
    MissingValue { row: RowLabel, column: String },

    /// Re-indexing is ambiguous when the submission repeats a row label.
    #[error("row label {0} appears more than once in the submission")]
    DuplicateRowLabel(RowLabel),

    /// The input could not be turned into a table at all.
    #[error("could not parse table: {0}")]
    ParseFailure(String),

    /// Truth has no rows/columns, or the submission shares no rows with it.
    #[error("empty or mismatched table: {0}")]
    EmptyOrShapeMismatch(String),
}

pub type GradeResult<T> = Result<T, GradeError>;

impl GradeError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        GradeError::ParseFailure(msg.into())
    }

    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        GradeError::EmptyOrShapeMismatch(msg.into())
    }
}
