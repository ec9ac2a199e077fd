//! Flat 1 MiB memory.
//!
//! Every address is masked to 20 bits before use, so accesses past the end
//! wrap around instead of faulting.

use serde::{Serialize, Deserialize};

/// The size of the address space in bytes.
pub const MEMORY_SIZE: usize = 1 << 20;

/// Mask applied to every address.
pub const ADDRESS_MASK: u32 = 0xF_FFFF;

/// Access width for sized reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Width {
    Byte,
    Word,
}

impl Width {
    /// Number of bytes covered by this width.
    pub fn bytes(self) -> u32 {
        match self {
            Width::Byte => 1,
            Width::Word => 2,
        }
    }
}

/// Byte-addressable little-endian memory.
#[derive(Clone)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    /// Create a new memory with all bytes zeroed.
    pub fn new() -> Self {
        Self {
            bytes: vec![0; MEMORY_SIZE],
        }
    }

    #[inline]
    fn index(addr: u32) -> usize {
        (addr & ADDRESS_MASK) as usize
    }

    /// Read a single byte.
    #[inline]
    pub fn read8(&self, addr: u32) -> u8 {
        self.bytes[Self::index(addr)]
    }

    /// Write a single byte.
    #[inline]
    pub fn write8(&mut self, addr: u32, value: u8) {
        self.bytes[Self::index(addr)] = value;
    }

    /// Read `width` bytes starting at `addr`, little-endian.
    ///
    /// Each byte address is masked on its own, so a word read at the last
    /// byte picks up its high half from address 0.
    pub fn read(&self, addr: u32, width: Width) -> u16 {
        (0..width.bytes()).fold(0u16, |acc, i| {
            acc | (self.read8(addr.wrapping_add(i)) as u16) << (8 * i)
        })
    }

    /// Write the low `width` bytes of `value` starting at `addr`, little-endian.
    pub fn write(&mut self, addr: u32, value: u16, width: Width) {
        for i in 0..width.bytes() {
            self.write8(addr.wrapping_add(i), (value >> (8 * i)) as u8);
        }
    }

    /// Read a 16-bit word.
    #[inline]
    pub fn read16(&self, addr: u32) -> u16 {
        self.read(addr, Width::Word)
    }

    /// Write a 16-bit word.
    #[inline]
    pub fn write16(&mut self, addr: u32, value: u16) {
        self.write(addr, value, Width::Word);
    }

    /// Borrow `len` bytes starting at `start`, clamped to the end of memory.
    pub fn slice(&self, start: usize, len: usize) -> &[u8] {
        let start = start.min(MEMORY_SIZE);
        let end = start.saturating_add(len).min(MEMORY_SIZE);
        &self.bytes[start..end]
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero bytes
        let non_zero = self.bytes.iter().filter(|b| **b != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_bytes", &non_zero)
            .field("total_bytes", &MEMORY_SIZE)
            .finish()
    }
}
