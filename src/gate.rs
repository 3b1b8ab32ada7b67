// src/gate.rs
//! Checks that run before a submission reaches the grader: access code and
//! upload size.

use std::{fs, io, path::Path, path::PathBuf};
use thiserror::Error;

/// 2 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("access code rejected")]
    Unauthorized,
    #[error("file too large ({:.2} MB, limit {:.2} MB)", megabytes(.size), megabytes(.max))]
    FileTooLarge { size: u64, max: u64 },
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn megabytes(bytes: &u64) -> f64 {
    *bytes as f64 / (1024.0 * 1024.0)
}

pub trait Authorizer {
    fn is_authorized(&self, code: &str) -> bool;
}

/// A shared classroom code. With no code configured, everyone is let in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessCode {
    code: Option<String>,
}

impl AccessCode {
    pub fn new(code: Option<String>) -> Self {
        Self { code }
    }

    /// `Err(Unauthorized)` unless `code` passes.
    pub fn check(&self, code: &str) -> Result<(), GateError> {
        if self.is_authorized(code) {
            Ok(())
        } else {
            Err(GateError::Unauthorized)
        }
    }
}

impl Authorizer for AccessCode {
    fn is_authorized(&self, code: &str) -> bool {
        match &self.code {
            Some(expected) => expected == code.trim(),
            None => true,
        }
    }
}

/// Anything an upload can be measured from.
pub trait Upload {
    fn size_bytes(&self) -> io::Result<u64>;
}

impl Upload for [u8] {
    fn size_bytes(&self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }
}

impl Upload for Path {
    fn size_bytes(&self) -> io::Result<u64> {
        fs::metadata(self).map(|m| m.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadGate {
    max_bytes: u64,
}

impl Default for UploadGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl UploadGate {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn check_size(&self, size: u64) -> Result<(), GateError> {
        if size > self.max_bytes {
            Err(GateError::FileTooLarge {
                size,
                max: self.max_bytes,
            })
        } else {
            Ok(())
        }
    }

    pub fn check_file(&self, path: &Path) -> Result<(), GateError> {
        let size = path.size_bytes().map_err(|source| GateError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        self.check_size(size)
    }
}
