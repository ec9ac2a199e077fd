//! Simulation reports.
//!
//! A report is a pretty-printed JSON file holding the program source and a
//! snapshot of the machine at the time it was written.

use crate::cpu::{Cpu, StateSnapshot};
use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

/// A saved simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// The program source as loaded.
    pub code: String,
    /// Number of steps executed when the report was taken.
    pub steps: u64,
    /// Machine state.
    pub state: StateSnapshot,
}

impl Report {
    /// Capture the current machine state alongside its source.
    pub fn capture(cpu: &Cpu, code: &str) -> Self {
        Self {
            code: code.to_string(),
            steps: cpu.steps,
            state: cpu.get_state(),
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ReportError> {
        serde_json::to_string_pretty(self).map_err(|e| ReportError::JsonError(e.to_string()))
    }

    /// Parse from JSON.
    pub fn from_json(text: &str) -> Result<Self, ReportError> {
        serde_json::from_str(text).map_err(|e| ReportError::JsonError(e.to_string()))
    }
}

/// Load a report file from disk.
pub fn load_report<P: AsRef<Path>>(path: P) -> Result<Report, ReportError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ReportError::IoError(e.to_string()))?;
    Report::from_json(&text)
}

/// Save a report file to disk.
pub fn save_report<P: AsRef<Path>>(path: P, report: &Report) -> Result<(), ReportError> {
    let json = report.to_json()?;
    std::fs::write(path.as_ref(), json).map_err(|e| ReportError::IoError(e.to_string()))
}

/// Errors that can occur while reading or writing reports.
#[derive(Debug, Clone, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("JSON error: {0}")]
    JsonError(String),
}
