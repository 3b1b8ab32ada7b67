use anyhow::{bail, Context, Result};
use cleangrade::{export, truth, GraderConfig, GradingSession, Table};
use std::{env, path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str =
    "usage: cleangrade <SUBMISSION> [ACCESS_CODE] [--json OUT] [--window-parquet OUT]";

struct Args {
    submission: PathBuf,
    access_code: Option<String>,
    json_out: Option<PathBuf>,
    window_out: Option<PathBuf>,
}

impl Args {
    fn parse(mut raw: impl Iterator<Item = String>) -> Result<Self> {
        let mut positional = Vec::new();
        let mut json_out = None;
        let mut window_out = None;
        while let Some(arg) = raw.next() {
            match arg.as_str() {
                "--json" => json_out = Some(raw.next().context("--json needs a path")?.into()),
                "--window-parquet" => {
                    window_out = Some(raw.next().context("--window-parquet needs a path")?.into())
                }
                "-h" | "--help" => bail!(USAGE),
                flag if flag.starts_with("--") => bail!("unknown flag {}\n{}", flag, USAGE),
                _ => positional.push(arg),
            }
        }
        let mut positional = positional.into_iter();
        let submission = positional.next().context(USAGE)?.into();
        let access_code = positional.next();
        if positional.next().is_some() {
            bail!(USAGE);
        }
        Ok(Self {
            submission,
            access_code,
            json_out,
            window_out,
        })
    }
}

fn run(args: Args) -> Result<()> {
    // ─── 1) config + truth ───────────────────────────────────────────
    let config = GraderConfig::from_env()?;
    let truth = truth::init(&config.truth_file)?;

    // ─── 2) gates ────────────────────────────────────────────────────
    config
        .authorizer()
        .check(args.access_code.as_deref().unwrap_or_default())?;
    config.upload_gate().check_file(&args.submission)?;

    // ─── 3) parse + grade ────────────────────────────────────────────
    let submitted = Table::load(&args.submission)?;
    info!(
        path = %args.submission.display(),
        rows = submitted.num_rows(),
        "loaded submission"
    );
    let mut session = GradingSession::new();
    let report = session.submit(truth, submitted, &config.grade_options())?;

    // ─── 4) outputs ──────────────────────────────────────────────────
    println!("{}", report.to_json()?);
    if let Some(path) = &args.json_out {
        export::write_report_json(&report, path)?;
    }
    if let Some(path) = &args.window_out {
        export::write_window_parquet(report.window(), path)?;
    }
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cleangrade=info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let result = Args::parse(env::args().skip(1)).and_then(run);
    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args> {
        Args::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_positionals_and_flags() {
        let args = parse(&["sub.csv", "code", "--json", "out.json"]).unwrap();
        assert_eq!(args.submission, PathBuf::from("sub.csv"));
        assert_eq!(args.access_code.as_deref(), Some("code"));
        assert_eq!(args.json_out, Some(PathBuf::from("out.json")));
        assert!(args.window_out.is_none());
    }

    #[test]
    fn rejects_bad_usage() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["a.csv", "code", "extra"]).is_err());
        assert!(parse(&["a.csv", "--json"]).is_err());
        assert!(parse(&["a.csv", "--verbose"]).is_err());
    }
}
