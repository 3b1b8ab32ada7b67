// src/truth.rs
//! Process-wide truth table.
//!
//! The truth dataset is loaded once, before any grading request is served, and
//! is read-only afterwards. Readers share `&'static Table` with no locking:
//! nothing can write to it once the cell is set.

use crate::error::GradeError;
use crate::table::Table;
use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use std::path::Path;
use tracing::info;

static TRUTH: OnceCell<Table> = OnceCell::new();

/// Load and validate a truth table without touching the process-wide cell.
pub fn load_truth(path: &Path) -> Result<Table> {
    let table = Table::load(path)
        .with_context(|| format!("loading truth table {}", path.display()))?;
    if table.is_empty() {
        return Err(GradeError::shape(format!(
            "truth table {} has {} rows and {} value columns",
            path.display(),
            table.num_rows(),
            table.num_columns()
        ))
        .into());
    }
    info!(
        path = %path.display(),
        rows = table.num_rows(),
        columns = table.num_columns(),
        kind = ?table.label_kind(),
        "loaded truth table"
    );
    Ok(table)
}

/// Initialise the process-wide truth table from `path`. The first successful
/// call wins; later calls return the already-loaded table without reading
/// `path`.
pub fn init(path: &Path) -> Result<&'static Table> {
    TRUTH.get_or_try_init(|| load_truth(path))
}

/// The truth table, if `init` has succeeded.
pub fn get() -> Option<&'static Table> {
    TRUTH.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn init_once_then_shared() -> Result<()> {
        let dir = tempdir()?;
        let first = dir.path().join("truth.csv");
        fs::write(&first, "idx,a\n0,1\n1,2\n")?;
        let second = dir.path().join("other.csv");
        fs::write(&second, "idx,a\n0,1\n")?;

        let table = init(&first)?;
        assert_eq!(table.num_rows(), 2);
        // later calls never reload
        let again = init(&second)?;
        assert!(std::ptr::eq(table, again));
        assert!(std::ptr::eq(get().unwrap(), table));

        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| get().map(Table::num_rows)))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), Some(2));
        }
        Ok(())
    }

    #[test]
    fn header_only_truth_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.csv");
        fs::write(&path, "idx,a,b\n")?;
        let err = load_truth(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GradeError>(),
            Some(GradeError::EmptyOrShapeMismatch(_))
        ));
        Ok(())
    }

    #[test]
    fn index_only_truth_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("index_only.csv");
        fs::write(&path, "idx\n0\n1\n2\n")?;
        let err = load_truth(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GradeError>(),
            Some(GradeError::EmptyOrShapeMismatch(_))
        ));
        assert!(format!("{}", err).contains("0 value columns"));
        Ok(())
    }

    #[test]
    fn unparseable_truth_keeps_cause() {
        let err = load_truth(Path::new("/no/such/truth.csv")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GradeError>(),
            Some(GradeError::ParseFailure(_))
        ));
        assert!(format!("{:#}", err).contains("loading truth table"));
    }
}
