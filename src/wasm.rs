//! WebAssembly bindings for the simulator.
//!
//! This module provides JavaScript-friendly wrappers around the engine. State
//! is handed over as the same JSON the session protocol produces.

use wasm_bindgen::prelude::*;
use crate::{Cpu, Register};
use crate::asm::listing::decode_listing;
use crate::asm::Program;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmMachine {
    cpu: Cpu,
}

#[wasm_bindgen]
impl WasmMachine {
    /// Create a new machine instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { cpu: Cpu::new() }
    }

    /// Reset, then load program text. Returns the instruction count.
    #[wasm_bindgen]
    pub fn load(&mut self, source: &str) -> usize {
        self.cpu.load(source);
        self.cpu.program().len()
    }

    /// Step one instruction. Returns false once the program is exhausted.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<bool, JsError> {
        self.cpu.step().map_err(|e| JsError::new(&e.to_string()))
    }

    /// Run for at most `max_steps` instructions. Returns how many ran.
    #[wasm_bindgen]
    pub fn run(&mut self, max_steps: u32) -> Result<u32, JsError> {
        let executed = self
            .cpu
            .run_limited(max_steps as u64)
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(executed as u32)
    }

    /// Reset the machine and forget the program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    /// Check if the machine is halted.
    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    /// Get the instruction pointer.
    #[wasm_bindgen]
    pub fn ip(&self) -> u32 {
        self.cpu.regs.ip()
    }

    /// Get a general register by name.
    #[wasm_bindgen]
    pub fn register(&self, name: &str) -> Result<u16, JsError> {
        let reg = Register::from_name(name).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(self.cpu.regs.get(reg))
    }

    /// Get the full state snapshot as JSON.
    #[wasm_bindgen]
    pub fn state_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu.get_state()).map_err(|e| JsError::new(&e.to_string()))
    }
}

impl Default for WasmMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a program with the microinstructions of each line.
#[wasm_bindgen]
pub fn wasm_decode(source: &str) -> String {
    decode_listing(&Program::parse(source))
}
