//! Program text handling.
//!
//! This module provides:
//! - The program store (text → instruction lines + label table)
//! - Listings (program → readable text, with or without microinstructions)
//! - Simulation reports (program + machine state ↔ JSON file)

pub mod program;
pub mod listing;
pub mod report;

pub use program::Program;
pub use listing::{listing, decode_listing};
pub use report::{Report, ReportError, load_report, save_report};
