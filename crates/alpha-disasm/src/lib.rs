pub mod elf;
pub mod model;

pub use elf::{load_elf, Elf64, ProgramHeader, SectionHeader};
pub use model::{load, load_raw_bin, Loaded};
