// src/bin/grade_batch.rs
//
// Grade every submission matching a glob against the shared truth table.
// Each file is an independent attempt; only the truth table is shared.

use anyhow::{Context, Result};
use cleangrade::{grade, truth, GraderConfig, Table};
use glob::glob;
use rayon::prelude::*;
use std::{env, path::PathBuf, process::exit};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

struct Outcome {
    path: PathBuf,
    result: Result<(f64, f64, String)>,
}

fn grade_one(truth: &Table, config: &GraderConfig, path: PathBuf) -> Outcome {
    let result = (|| -> Result<(f64, f64, String)> {
        config.upload_gate().check_file(&path)?;
        let submitted = Table::load(&path)?;
        let report = grade(truth, &submitted, &config.grade_options())?;
        let loc = report.location();
        Ok((
            report.total_error(),
            report.max_error(),
            format!("{} / {}", loc.row_label(), loc.column_label()),
        ))
    })();
    Outcome { path, result }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cleangrade=info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <GLOB>   e.g. 'submissions/*.csv'", args[0]);
        exit(1);
    }
    let pattern = &args[1];

    // 1) shared, read-only truth
    let config = GraderConfig::from_env()?;
    let truth = truth::init(&config.truth_file)?;

    // 2) find submissions
    let paths: Vec<PathBuf> = glob(pattern)
        .with_context(|| format!("Failed to read glob pattern '{}'", pattern))?
        .filter_map(|entry| entry.ok())
        .collect();
    if paths.is_empty() {
        return Err(anyhow::anyhow!("No files match '{}'", pattern));
    }
    info!(files = paths.len(), "grading");

    // 3) in parallel: one independent attempt per file
    let mut outcomes: Vec<Outcome> = paths
        .into_par_iter()
        .map(|path| grade_one(truth, &config, path))
        .collect();
    outcomes.sort_by(|a, b| a.path.cmp(&b.path));

    // 4) summary table
    println!(
        "\n{: <40} {:>14} {:>12}  {}",
        "File", "Total error", "Max error", "Worst cell"
    );
    println!("{:-<100}", "");
    let mut failed = 0;
    for outcome in &outcomes {
        let name = outcome.path.display().to_string();
        match &outcome.result {
            Ok((total, max, at)) => {
                println!("{: <40} {:>14.4} {:>12.4}  {}", name, total, max, at)
            }
            Err(e) => {
                failed += 1;
                println!("{: <40} error: {:#}", name, e);
            }
        }
    }
    println!(
        "\n{} graded, {} failed",
        outcomes.len() - failed,
        failed
    );
    Ok(())
}
