//! CPU emulation for the 8086 subset.
//!
//! This module implements the whole engine:
//! - 1 MiB flat memory with 20-bit address wrapping
//! - The register and flag bank
//! - Flag-computing 16-bit arithmetic
//! - The text-to-microinstruction decoder
//! - The fetch-decode-execute loop and state snapshots

pub mod memory;
pub mod registers;
pub mod alu;
pub mod decode;
pub mod execute;
pub mod snapshot;

pub use memory::{Memory, Width};
pub use registers::{ByteRegister, Flags, Register, RegisterError, Registers};
pub use decode::{decode, DecodeError, JumpCondition, Microinstruction};
pub use execute::{Cpu, CpuError, CpuState};
pub use snapshot::{RegisterSnapshot, StateSnapshot};
