use super::{utils, Cell, RowLabel, Table};
use crate::error::{GradeError, GradeResult};
use arrow::{
    array::{Array, ArrayRef, Float64Array, Int64Array, StringArray, TimestampMillisecondArray},
    compute::cast,
    datatypes::{DataType, Schema, TimeUnit},
    record_batch::RecordBatch,
};
use chrono::DateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{fs::File, path::Path};
use tracing::debug;

fn arrow_err(ctx: &str, e: impl std::fmt::Display) -> GradeError {
    GradeError::parse(format!("{}: {}", ctx, e))
}

fn cast_to(array: &ArrayRef, to: &DataType) -> GradeResult<ArrayRef> {
    cast(array.as_ref(), to).map_err(|e| arrow_err(&format!("casting to {}", to), e))
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef, what: &str) -> GradeResult<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| GradeError::parse(format!("unexpected array type for {}", what)))
}

/// Read a Parquet file whose first column is the row index.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.display()))]
pub fn read_parquet_path(path: &Path) -> GradeResult<Table> {
    let file = File::open(path).map_err(|e| arrow_err(&format!("opening {}", path.display()), e))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| arrow_err("parquet metadata", e))?;
    let schema = builder.schema().clone();
    let reader = builder
        .with_batch_size(8192)
        .build()
        .map_err(|e| arrow_err("parquet reader", e))?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch.map_err(|e| arrow_err("reading parquet batch", e))?);
    }
    debug!(batches = batches.len(), "read parquet batches");
    table_from_batches(&schema, &batches)
}

/// Convert Arrow record batches into a `Table`: column 0 is the index.
pub fn table_from_batches(schema: &Schema, batches: &[RecordBatch]) -> GradeResult<Table> {
    let fields = schema.fields();
    let index_field = fields
        .first()
        .ok_or_else(|| GradeError::parse("schema has no index column"))?;
    let columns: Vec<String> = fields.iter().skip(1).map(|f| f.name().clone()).collect();

    let labels = index_labels(index_field.data_type(), batches)?;

    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(labels.len());
    for batch in batches {
        let value_columns = (1..batch.num_columns())
            .map(|i| value_cells(batch.column(i)))
            .collect::<GradeResult<Vec<_>>>()?;
        for r in 0..batch.num_rows() {
            rows.push(value_columns.iter().map(|col| col[r].clone()).collect());
        }
    }

    Table::new(labels, columns, rows)
}

fn index_labels(dt: &DataType, batches: &[RecordBatch]) -> GradeResult<Vec<RowLabel>> {
    let mut labels = Vec::new();
    match dt {
        DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64 => {
            // zoned arrays hold UTC instants; casting with the zone kept
            // leaves them untouched and labels read as UTC wall time
            let tz = match dt {
                DataType::Timestamp(_, tz) => tz.clone(),
                _ => None,
            };
            let target = DataType::Timestamp(TimeUnit::Millisecond, tz);
            for batch in batches {
                let arr = cast_to(batch.column(0), &target)?;
                let ts = downcast::<TimestampMillisecondArray>(&arr, "index")?;
                for i in 0..ts.len() {
                    if ts.is_null(i) {
                        return Err(GradeError::parse(format!(
                            "row {} has an empty row label",
                            labels.len() + 1
                        )));
                    }
                    let naive = DateTime::from_timestamp_millis(ts.value(i))
                        .ok_or_else(|| GradeError::parse("row label timestamp out of range"))?
                        .naive_utc();
                    labels.push(RowLabel::Time(naive));
                }
            }
            Ok(labels)
        }
        dt if dt.is_integer() => {
            for batch in batches {
                let arr = cast_to(batch.column(0), &DataType::Int64)?;
                let ints = downcast::<Int64Array>(&arr, "index")?;
                for i in 0..ints.len() {
                    if ints.is_null(i) {
                        return Err(GradeError::parse(format!(
                            "row {} has an empty row label",
                            labels.len() + 1
                        )));
                    }
                    labels.push(RowLabel::Ordinal(ints.value(i)));
                }
            }
            Ok(labels)
        }
        _ => {
            let mut raw = Vec::new();
            for batch in batches {
                let arr = cast_to(batch.column(0), &DataType::Utf8)?;
                let strs = downcast::<StringArray>(&arr, "index")?;
                raw.extend(strs.iter().map(|s| s.unwrap_or_default().to_string()));
            }
            utils::infer_labels(&raw)
        }
    }
}

fn value_cells(array: &ArrayRef) -> GradeResult<Vec<Cell>> {
    if array.data_type().is_numeric() {
        let arr = cast_to(array, &DataType::Float64)?;
        let floats = downcast::<Float64Array>(&arr, "value column")?;
        Ok(floats
            .iter()
            .map(|v| v.map(Cell::from_f64).unwrap_or(Cell::Missing))
            .collect())
    } else {
        let arr = cast_to(array, &DataType::Utf8)?;
        let strs = downcast::<StringArray>(&arr, "value column")?;
        Ok(strs
            .iter()
            .map(|v| v.map(utils::parse_cell).unwrap_or(Cell::Missing))
            .collect())
    }
}
