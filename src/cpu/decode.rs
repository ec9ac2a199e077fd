//! Instruction decoder.
//!
//! Lowers one line of assembly text into an ordered list of
//! microinstructions. Decoding never fails: anything that cannot be lowered
//! becomes a single inert placeholder that carries the reason.

use crate::cpu::memory::ADDRESS_MASK;
use crate::cpu::registers::{Register, RegisterError};
use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

/// Condition tested by a jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpCondition {
    /// JMP
    Always,
    /// JZ: taken when ZF is set
    Zero,
    /// JNZ: taken when ZF is clear
    NotZero,
}

impl JumpCondition {
    pub fn mnemonic(self) -> &'static str {
        match self {
            JumpCondition::Always => "JMP",
            JumpCondition::Zero => "JZ",
            JumpCondition::NotZero => "JNZ",
        }
    }
}

/// One primitive state mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Microinstruction {
    // ==================== Data Transfer ====================

    /// dest := value, truncated to 16 bits when applied
    LoadImmediate { dest: Register, value: u32 },

    /// dest := src
    MoveRegister { dest: Register, src: Register },

    /// dest := word at [address]
    LoadMemory { dest: Register, address: u32 },

    /// word at [address] := src
    StoreMemory { address: u32, src: Register },

    // ==================== Arithmetic ====================

    /// dest := dest + src, all arithmetic flags
    Add { dest: Register, src: Register },

    /// dest := dest - src, all arithmetic flags
    Sub { dest: Register, src: Register },

    /// DX:AX := AX * src
    Mul { src: Register },

    /// AX := DX:AX / src, DX := DX:AX % src
    Div { src: Register },

    /// Flags of lhs - rhs, nothing stored
    Cmp { lhs: Register, rhs: Register },

    // ==================== Control Flow ====================

    /// IP := target when the condition holds
    Jump { target: u32, condition: JumpCondition },

    // ==================== Placeholders ====================

    /// Recognizable text the decoder has no lowering for.
    Unimplemented { line: String },

    /// An operand that could not be parsed.
    Malformed { message: String },
}

impl Microinstruction {
    /// True for the inert placeholders produced by failed decoding.
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            Microinstruction::Unimplemented { .. } | Microinstruction::Malformed { .. }
        )
    }
}

impl fmt::Display for Microinstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Microinstruction::LoadImmediate { dest, value } => write!(f, "MOV {}, {:#x}", dest, value),
            Microinstruction::MoveRegister { dest, src } => write!(f, "MOV {}, {}", dest, src),
            Microinstruction::LoadMemory { dest, address } => write!(f, "MOV {}, [{:#x}]", dest, address),
            Microinstruction::StoreMemory { address, src } => write!(f, "MOV [{:#x}], {}", address, src),
            Microinstruction::Add { dest, src } => write!(f, "ADD {}, {}", dest, src),
            Microinstruction::Sub { dest, src } => write!(f, "SUB {}, {}", dest, src),
            Microinstruction::Mul { src } => write!(f, "MUL {}", src),
            Microinstruction::Div { src } => write!(f, "DIV {}", src),
            Microinstruction::Cmp { lhs, rhs } => write!(f, "CMP {}, {}", lhs, rhs),
            Microinstruction::Jump { target, condition } => {
                write!(f, "{} {:#x}", condition.mnemonic(), target)
            }
            Microinstruction::Unimplemented { line } => write!(f, "Unimplemented: {}", line),
            Microinstruction::Malformed { message } => write!(f, "Error: {}", message),
        }
    }
}

/// Decode one line of assembly.
///
/// The first whitespace-delimited token is the mnemonic (case-insensitive);
/// the rest of the line is split on commas into operands.
pub fn decode(line: &str) -> Vec<Microinstruction> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }

    let (mnemonic, rest) = match line.split_once(char::is_whitespace) {
        Some((mnemonic, rest)) => (mnemonic, Some(rest.trim())),
        None => (line, None),
    };
    let mnemonic = mnemonic.to_uppercase();
    let operands: Vec<&str> = rest
        .map(|rest| rest.split(',').map(str::trim).collect())
        .unwrap_or_default();

    match lower(&mnemonic, &operands) {
        Ok(Some(micro)) => micro,
        Ok(None) => vec![Microinstruction::Unimplemented { line: line.to_string() }],
        Err(e) => vec![Microinstruction::Malformed { message: e.to_string() }],
    }
}

/// Dispatch on mnemonic and operand shape. `Ok(None)` means the shape is
/// not supported.
fn lower(mnemonic: &str, operands: &[&str]) -> Result<Option<Vec<Microinstruction>>, DecodeError> {
    use Microinstruction as M;

    let micro = match (mnemonic, operands) {
        ("MOV", [dest, src]) => return lower_mov(dest, src),

        ("ADD", [dest, src]) => {
            return lower_arith(dest, src, |dest, src| M::Add { dest, src });
        }

        ("SUB", [dest, src]) => {
            return lower_arith(dest, src, |dest, src| M::Sub { dest, src });
        }

        ("MUL", [src]) => vec![M::Mul { src: Register::from_name(src)? }],

        ("DIV", [src]) => vec![M::Div { src: Register::from_name(src)? }],

        ("CMP", [lhs, rhs]) => vec![M::Cmp {
            lhs: Register::from_name(lhs)?,
            rhs: Register::from_name(rhs)?,
        }],

        ("JMP", [target]) => vec![jump(target, JumpCondition::Always)?],
        ("JZ", [target]) => vec![jump(target, JumpCondition::Zero)?],
        ("JNZ", [target]) => vec![jump(target, JumpCondition::NotZero)?],

        _ => return Ok(None),
    };

    Ok(Some(micro))
}

fn lower_mov(dest: &str, src: &str) -> Result<Option<Vec<Microinstruction>>, DecodeError> {
    use Microinstruction as M;

    // Store form: [addr], reg
    if let Some(inner) = bracketed(dest) {
        if !Register::is_general_name(src) {
            return Ok(None);
        }
        return Ok(Some(vec![M::StoreMemory {
            address: parse_address(inner)?,
            src: Register::from_name(src)?,
        }]));
    }

    let micro = if let Some(value) = parse_literal(src) {
        M::LoadImmediate { dest: Register::from_name(dest)?, value }
    } else if Register::is_general_name(src) {
        M::MoveRegister {
            dest: Register::from_name(dest)?,
            src: Register::from_name(src)?,
        }
    } else if let Some(inner) = bracketed(src) {
        M::LoadMemory {
            dest: Register::from_name(dest)?,
            address: parse_address(inner)?,
        }
    } else {
        return Ok(None);
    };

    Ok(Some(vec![micro]))
}

/// ADD/SUB lowering. A literal source is first loaded into TEMP so the
/// arithmetic itself is always register to register.
fn lower_arith(
    dest: &str,
    src: &str,
    op: impl Fn(Register, Register) -> Microinstruction,
) -> Result<Option<Vec<Microinstruction>>, DecodeError> {
    if Register::is_general_name(src) {
        let dest = Register::from_name(dest)?;
        let src = Register::from_name(src)?;
        return Ok(Some(vec![op(dest, src)]));
    }

    match parse_literal(src) {
        Some(value) => {
            let dest = Register::from_name(dest)?;
            Ok(Some(vec![
                Microinstruction::LoadImmediate { dest: Register::Temp, value },
                op(dest, Register::Temp),
            ]))
        }
        None => Ok(None),
    }
}

/// Jump targets of any length are accepted. Anything past `u32::MAX` is
/// clamped there, which is past the end of every program.
fn jump(target: &str, condition: JumpCondition) -> Result<Microinstruction, DecodeError> {
    let target = parse_hex(target, |acc, digit| acc.saturating_mul(16).saturating_add(digit))?;
    Ok(Microinstruction::Jump { target, condition })
}

/// A decimal immediate: one or more ASCII digits, reduced modulo 2^32.
fn parse_literal(operand: &str) -> Option<u32> {
    if operand.is_empty() || !operand.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(
        operand
            .bytes()
            .fold(0u32, |acc, digit| acc.wrapping_mul(10).wrapping_add((digit - b'0') as u32)),
    )
}

/// The inside of a `[...]` operand.
fn bracketed(operand: &str) -> Option<&str> {
    operand
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

/// Addresses of any length are accepted and reduced to 20 bits.
fn parse_address(text: &str) -> Result<u32, DecodeError> {
    parse_hex(text, |acc, digit| ((acc << 4) | digit) & ADDRESS_MASK)
}

/// Fold the hex digits of `text` (optional `0x` prefix) with `push`.
fn parse_hex(text: &str, push: impl Fn(u32, u32) -> u32) -> Result<u32, DecodeError> {
    let invalid = || DecodeError::InvalidHex(text.to_string());
    let digits = strip_hex_prefix(text);
    if digits.is_empty() {
        return Err(invalid());
    }
    digits
        .chars()
        .try_fold(0u32, |acc, c| c.to_digit(16).map(|digit| push(acc, digit)))
        .ok_or_else(invalid)
}

fn strip_hex_prefix(text: &str) -> &str {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
}

/// Reasons an operand could not be lowered. Rendered into
/// [`Microinstruction::Malformed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid hexadecimal literal '{0}'")]
    InvalidHex(String),

    #[error(transparent)]
    Register(#[from] RegisterError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use Microinstruction as M;

    #[test]
    fn test_decode_mov_forms() {
        assert_eq!(decode("mov ax, 5"), vec![M::LoadImmediate { dest: Register::Ax, value: 5 }]);
        assert_eq!(
            decode("MOV BX, cx"),
            vec![M::MoveRegister { dest: Register::Bx, src: Register::Cx }]
        );
        assert_eq!(
            decode("MOV DX, [1F]"),
            vec![M::LoadMemory { dest: Register::Dx, address: 0x1F }]
        );
        assert_eq!(
            decode("MOV [20], SI"),
            vec![M::StoreMemory { address: 0x20, src: Register::Si }]
        );
    }

    #[test]
    fn test_literal_kept_as_written() {
        let micro = decode("MOV AX, 65537");
        assert_eq!(micro, vec![M::LoadImmediate { dest: Register::Ax, value: 0x1_0001 }]);
        assert_eq!(micro[0].to_string(), "MOV AX, 0x10001");
    }

    #[test]
    fn test_wide_jump_targets() {
        assert_eq!(
            decode("JMP 10000"),
            vec![M::Jump { target: 0x1_0000, condition: JumpCondition::Always }]
        );
        assert_eq!(
            decode("JZ 123456789ABC"),
            vec![M::Jump { target: u32::MAX, condition: JumpCondition::Zero }]
        );
    }

    #[test]
    fn test_wide_addresses_are_masked() {
        assert_eq!(
            decode("MOV AX, [123456789]"),
            vec![M::LoadMemory { dest: Register::Ax, address: 0x5_6789 }]
        );
        assert_eq!(
            decode("MOV [0x100000], BX"),
            vec![M::StoreMemory { address: 0, src: Register::Bx }]
        );
    }

    #[test]
    fn test_add_literal_uses_temp() {
        assert_eq!(
            decode("ADD AX, 3"),
            vec![
                M::LoadImmediate { dest: Register::Temp, value: 3 },
                M::Add { dest: Register::Ax, src: Register::Temp },
            ]
        );
        assert_eq!(decode("SUB cx, 10").len(), 2);
    }

    #[test]
    fn test_decode_jumps() {
        assert_eq!(
            decode("JMP 1a"),
            vec![M::Jump { target: 0x1A, condition: JumpCondition::Always }]
        );
        assert_eq!(
            decode("jnz 0x3"),
            vec![M::Jump { target: 3, condition: JumpCondition::NotZero }]
        );
    }

    #[test]
    fn test_unimplemented() {
        let micro = decode("PUSH AX");
        assert_eq!(micro, vec![M::Unimplemented { line: "PUSH AX".into() }]);
        assert!(micro[0].is_placeholder());
        assert_eq!(micro[0].to_string(), "Unimplemented: PUSH AX");

        // Known mnemonic, wrong operand count
        assert!(decode("MUL AX, BX")[0].is_placeholder());
        // Immediate store is not a supported shape
        assert!(matches!(decode("MOV [10], 5")[0], M::Unimplemented { .. }));
    }

    #[test]
    fn test_malformed() {
        let micro = decode("JMP zz");
        assert_eq!(micro, vec![M::Malformed { message: "invalid hexadecimal literal 'zz'".into() }]);
        assert_eq!(micro[0].to_string(), "Error: invalid hexadecimal literal 'zz'");

        assert!(matches!(decode("MOV AX, [xyz]")[0], M::Malformed { .. }));
        assert!(matches!(decode("MOV AX, []")[0], M::Malformed { .. }));
        assert!(matches!(decode("JMP 0x")[0], M::Malformed { .. }));
        assert!(matches!(decode("DIV QX")[0], M::Malformed { .. }));
        assert!(matches!(decode("MOV FOO, 5")[0], M::Malformed { .. }));
    }

    #[test]
    fn test_descriptions() {
        let text: Vec<String> = decode("ADD BX, 255").iter().map(|m| m.to_string()).collect();
        assert_eq!(text, vec!["MOV TEMP, 0xff", "ADD BX, TEMP"]);
        assert_eq!(decode("MOV [10], AX")[0].to_string(), "MOV [0x10], AX");
        assert_eq!(decode("JZ 4")[0].to_string(), "JZ 0x4");
    }

    #[test]
    fn test_blank_line() {
        assert!(decode("   ").is_empty());
    }
}
