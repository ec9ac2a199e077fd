//! TUI debugger.
//!
//! Provides an interactive terminal-based debugger with:
//! - Program listing with the current IP and breakpoints
//! - The microinstructions of the last step
//! - Register, flag and memory views
//! - Step/run/breakpoint controls

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
