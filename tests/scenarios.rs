//! End-to-end behaviour of the engine through its public API.

use microsim::{Cpu, CpuError, CpuState, Flags, Microinstruction, Program, Register};

fn loaded(source: &str) -> Cpu {
    let mut cpu = Cpu::new();
    cpu.load(source);
    cpu
}

fn step_n(cpu: &mut Cpu, n: usize) {
    for _ in 0..n {
        assert!(cpu.step().unwrap());
    }
}

#[test]
fn reset_state() {
    let mut cpu = loaded("MOV AX, 9\nMOV [0], AX\nCMP AX, BX");
    cpu.run().unwrap();
    cpu.reset();

    for reg in Register::GENERAL.iter().chain(Register::SEGMENT.iter()) {
        let expected = if *reg == Register::Sp { 0xFFFE } else { 0 };
        assert_eq!(cpu.regs.get(*reg), expected);
    }
    assert_eq!(cpu.regs.flags, Flags::default());
    assert_eq!(cpu.regs.ip(), 0);
    assert_eq!(cpu.state, CpuState::Ready);
    assert_eq!(cpu.mem.read16(0), 0);
    assert!(cpu.program().is_empty());
    assert!(cpu.last_microinstructions().is_empty());
}

#[test]
fn add_immediate() {
    let mut cpu = loaded("MOV AX, 5\nADD AX, 3");
    step_n(&mut cpu, 2);

    assert_eq!(cpu.regs.get(Register::Ax), 8);
    assert!(!cpu.regs.flags.zf);
    assert!(!cpu.regs.flags.cf);
    assert_eq!(cpu.regs.ip(), 2);
    assert!(!cpu.is_halted());
}

#[test]
fn sub_to_zero() {
    let mut cpu = loaded("MOV AX, 0\nSUB AX, 0");
    step_n(&mut cpu, 2);

    assert_eq!(cpu.regs.get(Register::Ax), 0);
    assert!(cpu.regs.flags.zf);
}

#[test]
fn div_zero_dividend() {
    let mut cpu = loaded("MOV BX, 10\nDIV BX");
    step_n(&mut cpu, 2);

    assert_eq!(cpu.regs.get(Register::Ax), 0);
    assert_eq!(cpu.regs.get(Register::Dx), 0);
}

#[test]
fn div_with_remainder() {
    let mut cpu = loaded("MOV AX, 100\nMOV DX, 1\nMOV CX, 7\nDIV CX");
    cpu.run().unwrap();

    let dividend = (1u32 << 16) + 100;
    assert_eq!(cpu.regs.get(Register::Ax) as u32, dividend / 7);
    assert_eq!(cpu.regs.get(Register::Dx) as u32, dividend % 7);
}

#[test]
fn div_by_zero_faults_without_changes() {
    let mut cpu = loaded("DIV AX");
    let before = cpu.regs.clone();

    assert_eq!(cpu.step(), Err(CpuError::DivisionByZero));
    assert_eq!(cpu.regs.get(Register::Ax), before.get(Register::Ax));
    assert_eq!(cpu.regs.get(Register::Dx), before.get(Register::Dx));
    assert_eq!(cpu.regs.ip(), 0);
    assert_eq!(cpu.regs.flags, before.flags);
}

#[test]
fn mul_by_zero_and_overflow() {
    let mut cpu = loaded("MOV AX, 1234\nMOV BX, 0\nMUL BX");
    cpu.run().unwrap();
    assert_eq!(cpu.regs.get(Register::Ax), 0);
    assert_eq!(cpu.regs.get(Register::Dx), 0);
    assert!(!cpu.regs.flags.cf);
    assert!(!cpu.regs.flags.of);

    let mut cpu = loaded("MOV AX, 512\nMOV BX, 512\nMUL BX");
    cpu.run().unwrap();
    assert_eq!(cpu.regs.get(Register::Ax), 0);
    assert_eq!(cpu.regs.get(Register::Dx), 4);
    assert!(cpu.regs.flags.cf);
    assert!(cpu.regs.flags.of);
}

#[test]
fn cmp_leaves_operands() {
    let mut cpu = loaded("MOV AX, 3\nMOV BX, 5\nCMP AX, BX");
    cpu.run().unwrap();

    assert_eq!(cpu.regs.get(Register::Ax), 3);
    assert_eq!(cpu.regs.get(Register::Bx), 5);
    assert!(cpu.regs.flags.cf);
    assert!(cpu.regs.flags.sf);
    assert!(!cpu.regs.flags.zf);
}

#[test]
fn conditional_jumps() {
    // JZ 4 lands on 4, the increment skips it
    let mut cpu = loaded("MOV AX, 2\nMOV BX, 2\nCMP AX, BX\nJZ 4\nMOV CX, 1\nMOV DX, 1");
    cpu.run().unwrap();
    assert_eq!(cpu.regs.get(Register::Cx), 0);
    assert_eq!(cpu.regs.get(Register::Dx), 1);

    // JNZ not taken falls through
    let mut cpu = loaded("MOV AX, 2\nMOV BX, 2\nCMP AX, BX\nJNZ 4\nMOV CX, 1\nMOV DX, 1");
    cpu.run().unwrap();
    assert_eq!(cpu.regs.get(Register::Cx), 1);
    assert_eq!(cpu.regs.get(Register::Dx), 1);
}

#[test]
fn labels_are_stripped() {
    let source = "START:\nMOV AX, 1\nNEXT: MOV BX, 2\nEND:";
    let program = Program::parse(source);
    assert_eq!(program.len(), 2);

    let cpu = loaded(source);
    assert_eq!(cpu.program().len(), 2);
    assert_eq!(cpu.program().label("NEXT"), Some(1));
}

#[test]
fn labels_do_not_resolve_jumps() {
    // "END" is not hex, so the jump is malformed and acts as a no-op
    let mut cpu = loaded("JMP END\nMOV AX, 1\nEND: MOV BX, 1");
    cpu.step().unwrap();

    assert!(matches!(cpu.last_microinstructions()[0], Microinstruction::Malformed { .. }));
    assert_eq!(cpu.regs.ip(), 1);
    cpu.run().unwrap();
    assert_eq!(cpu.regs.get(Register::Ax), 1);
}

#[test]
fn step_past_end_is_idempotent() {
    let mut cpu = loaded("MOV AX, 1");
    step_n(&mut cpu, 1);

    for _ in 0..3 {
        assert!(!cpu.step().unwrap());
        assert!(cpu.is_halted());
        assert_eq!(cpu.regs.ip(), 1);
    }
    assert_eq!(cpu.get_state().status, CpuState::Halted);
}

#[test]
fn byte_views_track_words() {
    let mut cpu = loaded("MOV CX, 258");
    cpu.run().unwrap();

    let state = cpu.get_state();
    assert_eq!(state.registers.ch, 1);
    assert_eq!(state.registers.cl, 2);
}

#[test]
fn memory_store_visible_in_snapshot() {
    let mut cpu = loaded("MOV AX, 513\nMOV [FE], AX");
    cpu.run().unwrap();

    let state = cpu.get_state();
    assert_eq!(state.memory[0xFE], 0x01);
    assert_eq!(state.memory[0xFF], 0x02);
}

#[test]
fn jumps_past_the_end_halt() {
    let mut cpu = loaded("MOV AX, 1\nJMP FFFF\nMOV BX, 7");
    cpu.run().unwrap();
    assert!(cpu.is_halted());
    assert_eq!(cpu.regs.get(Register::Bx), 0);
    assert_eq!(cpu.get_state().registers.ip, 0x1_0000);

    let mut cpu = loaded("JMP 10000\nMOV BX, 7");
    cpu.run().unwrap();
    assert!(cpu.is_halted());
    assert_eq!(cpu.regs.get(Register::Bx), 0);
}
