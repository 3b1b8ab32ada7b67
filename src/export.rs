// src/export.rs
//! Write grading results to disk for a presentation layer: the report as
//! JSON, and the comparison window as a small Parquet table for charting.

use crate::grade::{FinalReport, WindowPoint};
use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array, UInt32Array},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
    sync::Arc,
};
use tracing::info;

pub fn write_report_json(report: &FinalReport, path: &Path) -> Result<()> {
    let json = report.to_json().context("serializing report")?;
    fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
    info!(path = %path.display(), "wrote report");
    Ok(())
}

fn window_schema() -> Schema {
    Schema::new(vec![
        Field::new("order", DataType::UInt32, false),
        Field::new("truth_value", DataType::Float64, true),
        Field::new("submitted_value", DataType::Float64, true),
    ])
}

/// One row per window point: `order`, `truth_value`, `submitted_value`.
pub fn window_batch(points: &[WindowPoint]) -> Result<RecordBatch> {
    let order = points
        .iter()
        .map(|p| u32::try_from(p.order).context("window order exceeds u32"))
        .collect::<Result<Vec<u32>>>()?;
    let truth: Vec<Option<f64>> = points.iter().map(|p| p.truth_value).collect();
    let submitted: Vec<Option<f64>> = points.iter().map(|p| p.submitted_value).collect();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt32Array::from(order)),
        Arc::new(Float64Array::from(truth)),
        Arc::new(Float64Array::from(submitted)),
    ];
    RecordBatch::try_new(Arc::new(window_schema()), columns).context("building window batch")
}

pub fn write_window_parquet(points: &[WindowPoint], path: &Path) -> Result<()> {
    let batch = window_batch(points)?;
    let file =
        File::create(path).with_context(|| format!("creating window file {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), batch.schema(), Some(props))
        .context("creating Arrow writer for window")?;
    writer.write(&batch).context("writing window batch")?;
    writer.close().context("closing window writer")?;
    info!(path = %path.display(), rows = points.len(), "wrote window");
    Ok(())
}
