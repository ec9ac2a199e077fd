//! # microsim86
//!
//! An educational simulator for a small subset of the 8086 instruction set.
//!
//! Programs are plain assembly text. Each line is lowered into a short list
//! of microinstructions (register moves, flag-computing arithmetic, jumps)
//! which are applied one step at a time, so every intermediate state can be
//! inspected.
//!
//! ```
//! use microsim::{Cpu, Register};
//!
//! let mut cpu = Cpu::new();
//! cpu.load("MOV AX, 5\nADD AX, 3");
//! cpu.run().unwrap();
//! assert_eq!(cpu.regs.get(Register::Ax), 8);
//! ```

pub mod cpu;
pub mod asm;
pub mod session;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuError, CpuState, Flags, Memory, Microinstruction, Register, Registers, StateSnapshot, decode};
pub use asm::{Program, Report, ReportError, listing, decode_listing, load_report, save_report};
pub use session::{Request, Response, Session, SessionConfig};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
