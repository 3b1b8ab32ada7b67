// src/config.rs

use crate::gate::{AccessCode, UploadGate, DEFAULT_MAX_UPLOAD_BYTES};
use crate::grade::{DayWindowPolicy, GradeOptions, MissingPolicy, WindowConfig, DAY_ROWS};
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};
use tracing::info;

pub const CONFIG_ENV: &str = "CLEANGRADE_CONFIG";
pub const TRUTH_FILE_ENV: &str = "CLEANGRADE_TRUTH_FILE";
pub const ACCESS_CODE_ENV: &str = "CLEANGRADE_ACCESS_CODE";

/// Grader settings, usually read from a YAML file:
///
/// ```yaml
/// truth_file: Raw_Occ.csv
/// access_code: ZDM-2025-Homework5
/// max_upload_bytes: 2097152
/// window_rows: 96
/// day_window: capped       # or uncapped
/// missing_values: reject   # or propagate / zero
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraderConfig {
    pub truth_file: PathBuf,
    pub access_code: Option<String>,
    pub max_upload_bytes: u64,
    pub window_rows: usize,
    pub day_window: DayWindowPolicy,
    pub missing_values: MissingPolicy,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            truth_file: PathBuf::from("truth.csv"),
            access_code: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            window_rows: DAY_ROWS,
            day_window: DayWindowPolicy::default(),
            missing_values: MissingPolicy::default(),
        }
    }
}

impl GraderConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(yaml).context("parsing grader config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Config file named by `CLEANGRADE_CONFIG` (defaults when unset), then
    /// `CLEANGRADE_TRUTH_FILE` / `CLEANGRADE_ACCESS_CODE` overrides.
    pub fn from_env() -> Result<Self> {
        let mut cfg = match env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };
        cfg.apply_overrides(|key| env::var(key).ok());
        cfg.validate()?;
        info!(
            truth_file = %cfg.truth_file.display(),
            gated = cfg.access_code.is_some(),
            day_window = ?cfg.day_window,
            missing_values = ?cfg.missing_values,
            "loaded config"
        );
        Ok(cfg)
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(TRUTH_FILE_ENV).filter(|s| !s.is_empty()) {
            self.truth_file = PathBuf::from(path);
        }
        if let Some(code) = lookup(ACCESS_CODE_ENV) {
            self.access_code = Some(code).filter(|s| !s.is_empty());
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (1..=DAY_ROWS).contains(&self.window_rows),
            "window_rows must be between 1 and {}, got {}",
            DAY_ROWS,
            self.window_rows
        );
        ensure!(self.max_upload_bytes > 0, "max_upload_bytes must be positive");
        Ok(())
    }

    pub fn grade_options(&self) -> GradeOptions {
        GradeOptions {
            missing: self.missing_values,
            window: WindowConfig {
                rows: self.window_rows,
                day_policy: self.day_window,
            },
        }
    }

    pub fn authorizer(&self) -> AccessCode {
        AccessCode::new(self.access_code.clone())
    }

    pub fn upload_gate(&self) -> UploadGate {
        UploadGate::new(self.max_upload_bytes)
    }
}
