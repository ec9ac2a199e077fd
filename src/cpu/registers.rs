//! Register and flag bank.
//!
//! The machine has:
//! - 8 general registers: AX, BX, CX, DX, SI, DI, SP, BP
//! - 4 segment registers: CS, DS, ES, SS (carried but never used for addressing)
//! - IP, an index into the loaded program. It is kept outside the 16-bit
//!   bank so it can move past any program without wrapping.
//! - TEMP, a scratch register only the decoder writes to
//! - 9 boolean flags

use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

/// Initial value of the stack pointer after a reset.
pub const SP_RESET: u16 = 0xFFFE;

/// A 16-bit register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Register {
    Ax,
    Bx,
    Cx,
    Dx,
    Si,
    Di,
    Sp,
    Bp,
    Cs,
    Ds,
    Es,
    Ss,
    /// Decoder-internal scratch storage, never shown in snapshots.
    Temp,
}

impl Register {
    /// Number of register slots in the bank.
    pub const COUNT: usize = 13;

    /// The general registers accepted as instruction operands.
    pub const GENERAL: [Register; 8] = [
        Register::Ax,
        Register::Bx,
        Register::Cx,
        Register::Dx,
        Register::Si,
        Register::Di,
        Register::Sp,
        Register::Bp,
    ];

    /// The segment registers.
    pub const SEGMENT: [Register; 4] = [Register::Cs, Register::Ds, Register::Es, Register::Ss];

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }

    /// Upper-case assembly name.
    pub fn name(self) -> &'static str {
        match self {
            Register::Ax => "AX",
            Register::Bx => "BX",
            Register::Cx => "CX",
            Register::Dx => "DX",
            Register::Si => "SI",
            Register::Di => "DI",
            Register::Sp => "SP",
            Register::Bp => "BP",
            Register::Cs => "CS",
            Register::Ds => "DS",
            Register::Es => "ES",
            Register::Ss => "SS",
            Register::Temp => "TEMP",
        }
    }

    /// Parse a general register name, ignoring case.
    pub fn from_name(name: &str) -> Result<Register, RegisterError> {
        let upper = name.trim().to_uppercase();
        Register::GENERAL
            .iter()
            .copied()
            .find(|reg| reg.name() == upper)
            .ok_or_else(|| RegisterError::Unknown(name.trim().to_string()))
    }

    /// Check whether `name` names a general register.
    pub fn is_general_name(name: &str) -> bool {
        Register::from_name(name).is_ok()
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An 8-bit view onto one half of AX, BX, CX or DX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteRegister {
    Ah,
    Al,
    Bh,
    Bl,
    Ch,
    Cl,
    Dh,
    Dl,
}

impl ByteRegister {
    pub const ALL: [ByteRegister; 8] = [
        ByteRegister::Ah,
        ByteRegister::Al,
        ByteRegister::Bh,
        ByteRegister::Bl,
        ByteRegister::Ch,
        ByteRegister::Cl,
        ByteRegister::Dh,
        ByteRegister::Dl,
    ];

    /// The 16-bit register this view is carved out of, and whether it is the high half.
    pub fn parent(self) -> (Register, bool) {
        match self {
            ByteRegister::Ah => (Register::Ax, true),
            ByteRegister::Al => (Register::Ax, false),
            ByteRegister::Bh => (Register::Bx, true),
            ByteRegister::Bl => (Register::Bx, false),
            ByteRegister::Ch => (Register::Cx, true),
            ByteRegister::Cl => (Register::Cx, false),
            ByteRegister::Dh => (Register::Dx, true),
            ByteRegister::Dl => (Register::Dx, false),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ByteRegister::Ah => "AH",
            ByteRegister::Al => "AL",
            ByteRegister::Bh => "BH",
            ByteRegister::Bl => "BL",
            ByteRegister::Ch => "CH",
            ByteRegister::Cl => "CL",
            ByteRegister::Dh => "DH",
            ByteRegister::Dl => "DL",
        }
    }
}

/// The nine status and control flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct Flags {
    /// Carry
    pub cf: bool,
    /// Parity (set when the low byte has an even number of ones)
    pub pf: bool,
    /// Auxiliary carry out of bit 3
    pub af: bool,
    /// Zero
    pub zf: bool,
    /// Sign
    pub sf: bool,
    /// Trap
    pub tf: bool,
    /// Interrupt enable
    #[serde(rename = "IF")]
    pub if_: bool,
    /// Direction
    pub df: bool,
    /// Overflow
    pub of: bool,
}

impl Flags {
    /// Flag names and values in display order.
    pub fn entries(&self) -> [(&'static str, bool); 9] {
        [
            ("CF", self.cf),
            ("PF", self.pf),
            ("AF", self.af),
            ("ZF", self.zf),
            ("SF", self.sf),
            ("TF", self.tf),
            ("IF", self.if_),
            ("DF", self.df),
            ("OF", self.of),
        ]
    }
}

/// The register file plus flags.
#[derive(Clone, Debug)]
pub struct Registers {
    values: [u16; Register::COUNT],
    ip: u32,
    pub flags: Flags,
}

impl Registers {
    /// Create a register file in its reset state.
    pub fn new() -> Self {
        let mut regs = Self {
            values: [0; Register::COUNT],
            ip: 0,
            flags: Flags::default(),
        };
        regs.reset();
        regs
    }

    /// Zero every register except SP, and clear IP and all flags.
    pub fn reset(&mut self) {
        self.values = [0; Register::COUNT];
        self.ip = 0;
        self.values[Register::Sp.slot()] = SP_RESET;
        self.flags = Flags::default();
    }

    #[inline]
    pub fn get(&self, reg: Register) -> u16 {
        self.values[reg.slot()]
    }

    /// Set a register. Values wider than 16 bits are truncated.
    #[inline]
    pub fn set(&mut self, reg: Register, value: u32) {
        self.values[reg.slot()] = (value & 0xFFFF) as u16;
    }

    /// Read an 8-bit view.
    pub fn get_byte(&self, reg: ByteRegister) -> u8 {
        let (parent, high) = reg.parent();
        let word = self.get(parent);
        if high {
            (word >> 8) as u8
        } else {
            (word & 0xFF) as u8
        }
    }

    /// The instruction pointer as a program index.
    #[inline]
    pub fn ip(&self) -> u32 {
        self.ip
    }

    /// Move IP to the next instruction. Returns the old value.
    ///
    /// Saturates instead of wrapping: an IP at the top of the range is past
    /// the end of every program and must stay there.
    pub fn advance_ip(&mut self) -> u32 {
        let old = self.ip;
        self.ip = old.saturating_add(1);
        old
    }

    /// Set IP to an absolute program index.
    pub fn jump(&mut self, target: u32) {
        self.ip = target;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors raised when naming a register.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("unknown register '{0}'")]
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_state() {
        let regs = Registers::new();

        for reg in Register::GENERAL.iter().chain(Register::SEGMENT.iter()) {
            let expected = if *reg == Register::Sp { SP_RESET } else { 0 };
            assert_eq!(regs.get(*reg), expected, "{}", reg);
        }
        assert_eq!(regs.ip(), 0);
        assert_eq!(regs.flags, Flags::default());
    }

    #[test]
    fn test_set_truncates() {
        let mut regs = Registers::new();
        regs.set(Register::Bx, 0x1_2345);
        assert_eq!(regs.get(Register::Bx), 0x2345);
    }

    #[test]
    fn test_byte_views() {
        let mut regs = Registers::new();
        regs.set(Register::Ax, 0xABCD);
        regs.set(Register::Dx, 0x0102);

        assert_eq!(regs.get_byte(ByteRegister::Ah), 0xAB);
        assert_eq!(regs.get_byte(ByteRegister::Al), 0xCD);
        assert_eq!(regs.get_byte(ByteRegister::Dh), 0x01);
        assert_eq!(regs.get_byte(ByteRegister::Dl), 0x02);
        assert_eq!(regs.get_byte(ByteRegister::Bl), 0);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Register::from_name("ax"), Ok(Register::Ax));
        assert_eq!(Register::from_name(" Bp "), Ok(Register::Bp));
        // Segment registers, IP and TEMP are not operand names
        assert!(Register::from_name("CS").is_err());
        assert!(Register::from_name("IP").is_err());
        assert_eq!(
            Register::from_name("temp"),
            Err(RegisterError::Unknown("temp".into()))
        );
    }

    #[test]
    fn test_advance_ip() {
        let mut regs = Registers::new();
        regs.jump(10);

        let old = regs.advance_ip();
        assert_eq!(old, 10);
        assert_eq!(regs.ip(), 11);
    }

    #[test]
    fn test_ip_does_not_wrap() {
        let mut regs = Registers::new();

        regs.jump(0xFFFF);
        regs.advance_ip();
        assert_eq!(regs.ip(), 0x1_0000);

        regs.jump(u32::MAX);
        regs.advance_ip();
        assert_eq!(regs.ip(), u32::MAX);
    }

    #[test]
    fn test_ip_is_not_a_bank_register() {
        let mut regs = Registers::new();
        for reg in Register::GENERAL.iter().chain(Register::SEGMENT.iter()) {
            regs.set(*reg, 0xFFFF);
        }
        regs.set(Register::Temp, 0xFFFF);

        assert_eq!(regs.ip(), 0);
    }
}
