use crate::decoder::Decoder;
use crate::exec::Executor;
use crate::memory::{AddressError, Bus};
use crate::registers::{RegisterFile, RA, SP};
use serde::{Deserialize, Serialize};

pub const STACK_START: u64 = 0x00F0_0000;
pub const STACK_SIZE: u64 = 1024 * 1024;
pub const CONSOLE_ADDR: u64 = 0x1000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    pub stack_start: u64,
    pub stack_size: u64,
    pub console_addr: u64, // single-byte stores here go to the run's output
    pub max_steps: Option<u64>,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            stack_start: STACK_START,
            stack_size: STACK_SIZE,
            console_addr: CONSOLE_ADDR,
            max_steps: Some(100_000_000),
        }
    }
}

impl CpuConfig {
    /// Top of the stack; also the initial `ra`/`sp` and the halt sentinel.
    /// `None` when the stack would wrap the address space.
    pub fn stack_end(&self) -> Option<u64> {
        self.stack_start.checked_add(self.stack_size)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cpu {
    pub pc: u64,
    pub regs: RegisterFile,
    pub fregs: RegisterFile, // kept for register-31 parity; never executed
    pub cycles: u64,         // instructions retired, read by `rpcc`
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    #[error("pc={pc:#018x}: invalid address {addr:#018x}")]
    Address { pc: u64, addr: u64 },
    #[error("pc={pc:#018x}: unimplemented instruction {mnemonic}")]
    Unimplemented { pc: u64, mnemonic: &'static str },
    #[error("pc={pc:#018x}: invalid program counter")]
    InvalidPc { pc: u64 },
}

impl Fault {
    pub fn address(pc: u64, e: AddressError) -> Self {
        Fault::Address { pc, addr: e.addr }
    }

    pub fn pc(&self) -> u64 {
        match *self {
            Fault::Address { pc, .. } | Fault::Unimplemented { pc, .. } | Fault::InvalidPc { pc } => pc,
        }
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical start-of-run state: registers cleared, `ra` and `sp` at the
    /// stack top, PC at `entry`.
    pub fn reset(&mut self, entry: u64, stack_end: u64) {
        self.regs.clear();
        self.fregs.clear();
        self.regs.set(RA, stack_end);
        self.regs.set(SP, stack_end);
        self.pc = entry;
        self.cycles = 0;
    }

    /// Fetch, advance PC by 4, decode and execute one instruction.
    pub fn step<B: Bus, D: Decoder, X: Executor>(
        &mut self,
        bus: &mut B,
        dec: &D,
        exec: &X,
    ) -> Result<(), Fault> {
        let pc = self.pc;
        if pc % 4 != 0 {
            return Err(Fault::InvalidPc { pc });
        }
        let raw32 = bus.read_u32(pc).map_err(|e| Fault::address(pc, e))?;
        let d = dec.decode(raw32);
        self.pc = pc.wrapping_add(4);
        exec.exec(self, bus, pc, raw32, d)?;
        self.cycles += 1;
        Ok(())
    }
}
