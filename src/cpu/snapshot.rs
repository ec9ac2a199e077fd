//! Read-only views of machine state.
//!
//! The JSON shape matches what the web front end consumes: upper-case
//! register and flag keys, the first 256 bytes of memory as numbers, and the
//! text of the last step's microinstructions.

use crate::cpu::execute::{Cpu, CpuState};
use crate::cpu::registers::{ByteRegister, Flags, Register, Registers};
use serde::{Serialize, Deserialize};

/// Number of memory bytes included in a snapshot.
pub const SNAPSHOT_MEMORY_BYTES: usize = 256;

/// Register values, including the derived 8-bit views. TEMP is not included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct RegisterSnapshot {
    pub ax: u16,
    pub bx: u16,
    pub cx: u16,
    pub dx: u16,
    pub si: u16,
    pub di: u16,
    pub sp: u16,
    pub bp: u16,
    pub ip: u32,
    pub cs: u16,
    pub ds: u16,
    pub es: u16,
    pub ss: u16,
    pub ah: u8,
    pub al: u8,
    pub bh: u8,
    pub bl: u8,
    pub ch: u8,
    pub cl: u8,
    pub dh: u8,
    pub dl: u8,
}

impl RegisterSnapshot {
    pub fn capture(regs: &Registers) -> Self {
        Self {
            ax: regs.get(Register::Ax),
            bx: regs.get(Register::Bx),
            cx: regs.get(Register::Cx),
            dx: regs.get(Register::Dx),
            si: regs.get(Register::Si),
            di: regs.get(Register::Di),
            sp: regs.get(Register::Sp),
            bp: regs.get(Register::Bp),
            ip: regs.ip(),
            cs: regs.get(Register::Cs),
            ds: regs.get(Register::Ds),
            es: regs.get(Register::Es),
            ss: regs.get(Register::Ss),
            ah: regs.get_byte(ByteRegister::Ah),
            al: regs.get_byte(ByteRegister::Al),
            bh: regs.get_byte(ByteRegister::Bh),
            bl: regs.get_byte(ByteRegister::Bl),
            ch: regs.get_byte(ByteRegister::Ch),
            cl: regs.get_byte(ByteRegister::Cl),
            dh: regs.get_byte(ByteRegister::Dh),
            dl: regs.get_byte(ByteRegister::Dl),
        }
    }
}

/// Everything a front end shows after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub registers: RegisterSnapshot,
    pub flags: Flags,
    pub memory: Vec<u8>,
    pub current_instruction: Option<String>,
    pub microinstructions: Vec<String>,
    pub status: CpuState,
    pub ip: u32,
}

impl StateSnapshot {
    pub fn capture(cpu: &Cpu) -> Self {
        Self {
            registers: RegisterSnapshot::capture(&cpu.regs),
            flags: cpu.regs.flags,
            memory: cpu.mem.slice(0, SNAPSHOT_MEMORY_BYTES).to_vec(),
            current_instruction: cpu.current_instruction().map(str::to_string),
            microinstructions: cpu
                .last_microinstructions()
                .iter()
                .map(|m| m.to_string())
                .collect(),
            status: cpu.state,
            ip: cpu.regs.ip(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reset_snapshot() {
        let cpu = Cpu::new();
        let state = cpu.get_state();

        assert_eq!(state.registers.sp, 0xFFFE);
        assert_eq!(state.registers.ax, 0);
        assert_eq!(state.flags, Flags::default());
        assert_eq!(state.memory.len(), SNAPSHOT_MEMORY_BYTES);
        assert_eq!(state.status, CpuState::Ready);
        assert_eq!(state.ip, 0);
        assert!(state.current_instruction.is_none());
        assert!(state.microinstructions.is_empty());
    }

    #[test]
    fn test_snapshot_after_step() {
        let mut cpu = Cpu::new();
        cpu.load("MOV AX, 43981\nADD AX, 1");
        cpu.step().unwrap();
        cpu.step().unwrap();

        let state = cpu.get_state();
        assert_eq!(state.registers.ax, 0xABCE);
        assert_eq!(state.registers.ah, 0xAB);
        assert_eq!(state.registers.al, 0xCE);
        assert_eq!(state.current_instruction.as_deref(), Some("ADD AX, 1"));
        assert_eq!(state.microinstructions, vec!["MOV TEMP, 0x1", "ADD AX, TEMP"]);
        assert_eq!(state.ip, 2);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let value = serde_json::to_value(Cpu::new().get_state()).unwrap();

        assert_eq!(value["registers"]["SP"], json!(0xFFFE));
        assert_eq!(value["registers"]["AH"], json!(0));
        assert!(value["registers"].get("TEMP").is_none());
        assert_eq!(value["flags"]["IF"], json!(false));
        assert_eq!(value["flags"]["CF"], json!(false));
        assert_eq!(value["status"], json!("ready"));
        assert_eq!(value["current_instruction"], json!(null));
        assert_eq!(value["memory"].as_array().map(Vec::len), Some(256));
    }

    #[test]
    fn test_snapshot_does_not_mutate() {
        let mut cpu = Cpu::new();
        cpu.load("MOV AX, 1");
        let before = cpu.get_state();
        let again = cpu.get_state();
        assert_eq!(before, again);
    }
}
