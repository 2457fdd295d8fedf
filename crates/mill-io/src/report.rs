//! Run reports for batch solves.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Outcome of solving one instance file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub file: String,
    /// Reported leader revenue
    pub result: i64,
    pub time_secs: f64,
}

impl RunRecord {
    pub fn new(file: impl Into<String>, result: i64, time_secs: f64) -> Self {
        Self {
            file: file.into(),
            result,
            time_secs,
        }
    }
}

impl fmt::Display for RunRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test file: {}", self.file)?;
        writeln!(f, "Result: {}", self.result)?;
        write!(f, "Time: {}", self.time_secs)
    }
}

/// Write records as plain text blocks, one after another.
pub fn write_records(path: impl AsRef<Path>, records: &[RunRecord]) -> Result<()> {
    let path = path.as_ref();
    let text: String = records.iter().map(|r| format!("{}\n", r)).collect();
    fs::write(path, text).with_context(|| format!("writing report: {}", path.display()))
}

/// Write any serializable result as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(value).context("serializing report")?;
    fs::write(path, json).with_context(|| format!("writing report: {}", path.display()))
}
