//! Execution engine.
//!
//! Implements the fetch-decode-execute cycle: fetch the line at IP, lower it
//! to microinstructions, apply them in order, then advance IP by one.

use crate::asm::Program;
use crate::cpu::{alu, Memory, Registers};
use crate::cpu::decode::{self, JumpCondition, Microinstruction};
use crate::cpu::registers::Register;
use crate::cpu::snapshot::StateSnapshot;
use log::{debug, info, trace, warn};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Coarse execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpuState {
    /// Just reset or loaded, or stopped between steps.
    Ready,
    /// Inside a run loop.
    Running,
    /// IP ran off the end of the program. Only a reset or load clears this.
    Halted,
}

/// The simulated machine.
#[derive(Clone)]
pub struct Cpu {
    /// Registers and flags.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Number of steps executed since the last reset.
    pub steps: u64,
    program: Program,
    current_instruction: Option<String>,
    last_micro: Vec<Microinstruction>,
}

impl Cpu {
    /// Create a new CPU in its reset state with no program.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Ready,
            steps: 0,
            program: Program::new(),
            current_instruction: None,
            last_micro: Vec::new(),
        }
    }

    /// Reset registers, flags, memory and status, and forget the program.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = CpuState::Ready;
        self.steps = 0;
        self.program = Program::new();
        self.current_instruction = None;
        self.last_micro.clear();
        info!("machine reset");
    }

    /// Reset, then load program text.
    pub fn load(&mut self, source: &str) {
        self.reset();
        self.program = Program::parse(source);
        info!(
            "loaded {} instructions, {} labels",
            self.program.len(),
            self.program.label_count()
        );
    }

    /// Execute a single instruction.
    ///
    /// Returns `Ok(false)` without touching anything else if the machine is
    /// halted or IP is past the end of the program; the machine is halted
    /// afterwards. On a fault the microinstructions before the faulting one
    /// stay applied and IP is not advanced.
    pub fn step(&mut self) -> Result<bool, CpuError> {
        let ip = self.regs.ip();
        let line = match self.program.get(ip as usize) {
            Some(line) if self.state != CpuState::Halted => line.to_string(),
            _ => {
                if self.state != CpuState::Halted {
                    debug!("halted at IP={:#06x}", ip);
                }
                self.state = CpuState::Halted;
                return Ok(false);
            }
        };

        // Decode
        let micro = decode::decode(&line);
        debug!("IP={:#06x}: {} ({} micro-ops)", ip, line, micro.len());
        self.current_instruction = Some(line);
        self.last_micro = micro.clone();

        // Execute
        for op in &micro {
            trace!("  {}", op);
            if let Err(e) = self.apply(op) {
                warn!("fault at IP={:#06x}: {}", ip, e);
                return Err(e);
            }
        }

        // Jumps land on their target and are still followed by the increment
        self.regs.advance_ip();
        self.steps += 1;

        Ok(true)
    }

    /// Run until the program is exhausted or a fault occurs.
    ///
    /// There is no step budget: a program that loops forever never returns.
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        self.run_while(|_| true)
    }

    /// Run for at most `max_steps` instructions.
    ///
    /// If the budget runs out first the machine stays `Running`.
    pub fn run_limited(&mut self, max_steps: u64) -> Result<u64, CpuError> {
        self.run_while(|executed| executed < max_steps)
    }

    fn run_while(&mut self, mut more: impl FnMut(u64) -> bool) -> Result<u64, CpuError> {
        if self.state == CpuState::Halted {
            return Ok(0);
        }
        self.state = CpuState::Running;

        let mut executed = 0;
        while self.state == CpuState::Running && more(executed) {
            if !self.step()? {
                break;
            }
            executed += 1;
        }

        Ok(executed)
    }

    /// Leave the run loop before the next step.
    pub fn stop(&mut self) {
        if self.state == CpuState::Running {
            self.state = CpuState::Ready;
        }
    }

    /// Apply one microinstruction.
    fn apply(&mut self, micro: &Microinstruction) -> Result<(), CpuError> {
        match *micro {
            // ==================== Data Transfer ====================

            Microinstruction::LoadImmediate { dest, value } => {
                self.regs.set(dest, value);
            }

            Microinstruction::MoveRegister { dest, src } => {
                let value = self.regs.get(src);
                self.regs.set(dest, value as u32);
            }

            Microinstruction::LoadMemory { dest, address } => {
                let value = self.mem.read16(address);
                self.regs.set(dest, value as u32);
            }

            Microinstruction::StoreMemory { address, src } => {
                let value = self.regs.get(src);
                self.mem.write16(address, value);
            }

            // ==================== Arithmetic ====================

            Microinstruction::Add { dest, src } => {
                let (a, b) = (self.regs.get(dest), self.regs.get(src));
                let result = alu::add(a, b, &mut self.regs.flags);
                self.regs.set(dest, result as u32);
            }

            Microinstruction::Sub { dest, src } => {
                let (a, b) = (self.regs.get(dest), self.regs.get(src));
                let result = alu::sub(a, b, &mut self.regs.flags);
                self.regs.set(dest, result as u32);
            }

            Microinstruction::Mul { src } => {
                let (a, b) = (self.regs.get(Register::Ax), self.regs.get(src));
                let (low, high) = alu::mul(a, b, &mut self.regs.flags);
                self.regs.set(Register::Ax, low as u32);
                self.regs.set(Register::Dx, high as u32);
            }

            Microinstruction::Div { src } => {
                let divisor = self.regs.get(src);
                let (quotient, remainder) = alu::div(
                    self.regs.get(Register::Dx),
                    self.regs.get(Register::Ax),
                    divisor,
                )
                .ok_or(CpuError::DivisionByZero)?;

                self.regs.set(Register::Ax, quotient as u32);
                self.regs.set(Register::Dx, remainder as u32);
            }

            Microinstruction::Cmp { lhs, rhs } => {
                let (a, b) = (self.regs.get(lhs), self.regs.get(rhs));
                alu::compare(a, b, &mut self.regs.flags);
            }

            // ==================== Control Flow ====================

            Microinstruction::Jump { target, condition } => {
                let taken = match condition {
                    JumpCondition::Always => true,
                    JumpCondition::Zero => self.regs.flags.zf,
                    JumpCondition::NotZero => !self.regs.flags.zf,
                };
                if taken {
                    self.regs.jump(target);
                }
            }

            // ==================== Placeholders ====================

            Microinstruction::Unimplemented { .. } | Microinstruction::Malformed { .. } => {
                warn!("skipping {}", micro);
            }
        }

        Ok(())
    }

    /// Capture a read-only view of the machine.
    pub fn get_state(&self) -> StateSnapshot {
        StateSnapshot::capture(self)
    }

    /// True when IP is past the last instruction, whether or not a step has
    /// observed it yet.
    pub fn at_end(&self) -> bool {
        self.program.get(self.regs.ip() as usize).is_none()
    }

    /// The loaded program.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The most recently fetched source line.
    pub fn current_instruction(&self) -> Option<&str> {
        self.current_instruction.as_deref()
    }

    /// The microinstructions decoded by the most recent step.
    pub fn last_microinstructions(&self) -> &[Microinstruction] {
        &self.last_micro
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is inside a run loop.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("steps", &self.steps)
            .field("regs", &self.regs)
            .field("program_len", &self.program.len())
            .finish()
    }
}

/// Errors that can occur during execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("division by zero")]
    DivisionByZero,
}
