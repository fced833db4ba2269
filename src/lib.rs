pub mod alu;
pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod exec;
pub mod image;
pub mod instructions;
pub mod machine;
pub mod memory;
pub mod qualifier;
pub mod registers;

pub mod isa {
    pub mod axp; // Alpha AXP (EV6 integer subset executed)
}

pub use cpu::{Cpu, CpuConfig, Fault};
pub use decoder::{decode, DecodedInstruction, Decoder};
pub use disasm::{listing, render, Rendered};
pub use image::{LoadedImage, Segment, TextSegment};
pub use instructions::{Format, Opcode};
pub use machine::{Machine, RunReport, RunStatus};
pub use memory::{AddressError, AddressSpace, Bus, LayoutError};
