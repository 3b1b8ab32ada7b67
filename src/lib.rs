//! Grades a cleaned-up dataset against a ground-truth table: total and
//! worst-cell absolute error, plus a comparison window around the worst cell.

pub mod config;
pub mod error;
pub mod export;
pub mod gate;
pub mod grade;
pub mod session;
pub mod table;
pub mod truth;

pub use config::GraderConfig;
pub use error::{GradeError, GradeResult};
pub use grade::{grade, FinalReport, GradeOptions};
pub use session::GradingSession;
pub use table::Table;
