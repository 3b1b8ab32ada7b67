use super::{utils, Table};
use crate::error::{GradeError, GradeResult};
use csv::ReaderBuilder;
use std::{fs::File, io::Read, path::Path};
use tracing::debug;

/// Read a table from CSV. The header row names the index column first and
/// the value columns after it; every data row starts with its row label.
#[tracing::instrument(level = "debug", skip(reader))]
pub fn read_csv<R: Read>(reader: R) -> GradeResult<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| GradeError::parse(format!("CSV header: {}", e)))?
        .clone();
    if headers.is_empty() {
        return Err(GradeError::parse("CSV has no header row"));
    }
    let columns: Vec<String> = headers
        .iter()
        .skip(1)
        .map(|h| utils::clean_str(h).to_string())
        .collect();

    let mut raw_labels = Vec::new();
    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        // record numbers are 1-based and exclude the header
        let record =
            result.map_err(|e| GradeError::parse(format!("CSV record {}: {}", idx + 1, e)))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        raw_labels.push(record.get(0).unwrap_or_default().to_string());
        rows.push(record.iter().skip(1).map(utils::parse_cell).collect());
    }

    let labels = utils::infer_labels(&raw_labels)?;
    let table = Table::new(labels, columns, rows)?;
    debug!(
        rows = table.num_rows(),
        columns = table.num_columns(),
        kind = ?table.label_kind(),
        "parsed CSV table"
    );
    Ok(table)
}

pub fn read_csv_path(path: &Path) -> GradeResult<Table> {
    let file = File::open(path)
        .map_err(|e| GradeError::parse(format!("opening {}: {}", path.display(), e)))?;
    read_csv(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, LabelKind, RowLabel};
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_time_indexed_csv() -> Result<()> {
        let content = "\
time,occ_a,occ_b
2024-03-01 00:00:00,0.10,0.20
2024-03-01 00:15:00,0.11,
2024-03-01 00:30:00,\"0.12\",x
";
        let table = read_csv(content.as_bytes())?;
        assert_eq!(table.label_kind(), LabelKind::Time);
        assert_eq!(table.columns(), ["occ_a", "occ_b"]);
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.cell(1, 1), Some(&Cell::Missing));
        assert_eq!(table.cell(2, 0), Some(&Cell::Number(0.12)));
        assert_eq!(table.cell(2, 1), Some(&Cell::Text("x".into())));
        Ok(())
    }

    #[test]
    fn reads_ordinal_csv_from_disk() -> Result<()> {
        let mut tmp = NamedTempFile::with_suffix(".csv")?;
        write!(tmp, ",A,B\n0,1,2\n1,3,4\n\n2,5,6\n")?;
        let table = Table::load(tmp.path())?;
        assert_eq!(table.label_kind(), LabelKind::Ordinal);
        assert_eq!(
            table.labels(),
            [RowLabel::Ordinal(0), RowLabel::Ordinal(1), RowLabel::Ordinal(2)]
        );
        assert_eq!(table.num_columns(), 2);
        Ok(())
    }

    #[test]
    fn ragged_record_is_a_parse_failure() {
        let err = read_csv("idx,a,b\n0,1,2\n1,3\n".as_bytes()).unwrap_err();
        match err {
            GradeError::ParseFailure(msg) => assert!(msg.contains("record 2"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_a_parse_failure() {
        let err = read_csv_path(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, GradeError::ParseFailure(_)));
    }
}
