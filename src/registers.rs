use serde::{Deserialize, Serialize};

/// Register hardwired to zero in both register files.
pub const ZERO: u8 = 31;
/// Return-address (link) register.
pub const RA: u8 = 26;
/// Stack pointer.
pub const SP: u8 = 30;

/// Software names of the integer registers, by index.
pub const REG_NAMES: [&str; 32] = [
    "v0", // r0
    "t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7", // r1-r8
    "s0", "s1", "s2", "s3", "s4", "s5", // r9-r14
    "fp", // r15
    "a0", "a1", "a2", "a3", "a4", "a5", // r16-r21
    "t8", "t9", "t10", "t11", // r22-r25
    "ra",   // r26
    "t12",  // r27
    "at",   // r28
    "gp",   // r29
    "sp",   // r30
    "zero", // r31
];

pub fn reg_name(r: u8) -> &'static str {
    REG_NAMES[(r & 31) as usize]
}

/// Inverse of [`reg_name`]; also accepts the numeric `rN` / `$N` forms.
pub fn reg_index(name: &str) -> Option<u8> {
    if let Some(i) = REG_NAMES.iter().position(|n| *n == name) {
        return Some(i as u8);
    }
    let num = name.strip_prefix('r').or_else(|| name.strip_prefix('$'))?;
    num.parse::<u8>().ok().filter(|n| *n < 32)
}

pub fn freg_name(r: u8) -> String {
    format!("f{}", r & 31)
}

/// 32 x 64-bit register file. Index 31 reads as zero and discards writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFile {
    r: [u64; 32],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        Self { r: [0; 32] }
    }

    #[inline]
    pub fn get(&self, idx: u8) -> u64 {
        if idx == ZERO {
            0
        } else {
            self.r[(idx & 31) as usize]
        }
    }

    #[inline]
    pub fn set(&mut self, idx: u8, val: u64) {
        if idx != ZERO {
            self.r[(idx & 31) as usize] = val;
        }
    }

    pub fn clear(&mut self) {
        self.r = [0; 32];
    }

    /// Snapshot of all 32 registers as observed through [`get`](Self::get).
    pub fn snapshot(&self) -> [u64; 32] {
        let mut out = self.r;
        out[ZERO as usize] = 0;
        out
    }
}
