use serde::{Deserialize, Serialize};

use crate::instructions::{Format, Opcode, FORMATS};
use crate::isa::axp::AxpDecoder;

/// Decoder output. Operand fields stay in the raw word; read them with
/// [`Fields`] according to the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecodedInstruction {
    pub opcode: Opcode,
    pub format: Format,
}

impl DecodedInstruction {
    /// Pairs `opcode` with the format of `primary`. Unallocated encodings
    /// carry no operand layout.
    pub fn new(opcode: Opcode, primary: u32) -> Self {
        let format = if opcode == Opcode::Unknown {
            Format::Unknown
        } else {
            FORMATS[(primary & 0x3F) as usize]
        };
        Self { opcode, format }
    }

    pub fn mnemonic(&self) -> &'static str {
        self.opcode.mnemonic()
    }
}

pub trait Decoder {
    /// Total: every word decodes, unallocated ones to [`Opcode::Unknown`].
    fn decode(&self, raw32: u32) -> DecodedInstruction;
}

/// Decodes `raw32` with the AXP tables.
pub fn decode(raw32: u32) -> DecodedInstruction {
    AxpDecoder.decode(raw32)
}

#[inline]
pub fn sign_ext(v: u64, bits: u32) -> u64 {
    let s = 64 - bits;
    ((v << s) as i64 >> s) as u64
}

/// Bitfield view over a raw instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fields(pub u32);

impl Fields {
    pub fn primary(self) -> u32 {
        self.0 >> 26
    }
    pub fn ra(self) -> u8 {
        ((self.0 >> 21) & 31) as u8
    }
    pub fn rb(self) -> u8 {
        ((self.0 >> 16) & 31) as u8
    }
    pub fn rc(self) -> u8 {
        (self.0 & 31) as u8
    }

    /// Operate-format literal (bits 20:13), present when bit 12 is set.
    pub fn literal(self) -> Option<u8> {
        (self.0 & 0x1000 != 0).then(|| ((self.0 >> 13) & 0xFF) as u8)
    }

    /// Raw 16-bit memory displacement (bits 15:0).
    pub fn disp16(self) -> u32 {
        self.0 & 0xFFFF
    }
    pub fn sdisp16(self) -> i64 {
        sign_ext(self.disp16() as u64, 16) as i64
    }

    /// Raw 21-bit branch displacement (bits 20:0).
    pub fn disp21(self) -> u32 {
        self.0 & 0x1F_FFFF
    }
    pub fn sdisp21(self) -> i64 {
        sign_ext(self.disp21() as u64, 21) as i64
    }

    /// Jump hint selector (bits 15:14) of opcode 0x1a.
    pub fn jump_kind(self) -> u32 {
        (self.0 >> 14) & 3
    }
    /// Branch-prediction hint bits (13:0) of opcode 0x1a.
    pub fn jump_hint(self) -> u32 {
        self.0 & 0x3FFF
    }

    /// 7-bit integer function code (bits 11:5).
    pub fn func7(self) -> u32 {
        (self.0 >> 5) & 0x7F
    }
    /// 11-bit floating function code (bits 15:5).
    pub fn func11(self) -> u32 {
        (self.0 >> 5) & 0x7FF
    }

    pub fn pal_func(self) -> u32 {
        self.0 & 0x03FF_FFFF
    }
}

/// Target of a branch at `addr`: the next instruction plus the signed
/// longword displacement.
pub fn branch_target(addr: u64, raw32: u32) -> u64 {
    let disp = Fields(raw32).sdisp21();
    addr.wrapping_add(4).wrapping_add((disp as u64).wrapping_mul(4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_of_operate_literal() {
        // addq t0,#0xff,t1
        let raw = (0x10 << 26) | (1 << 21) | (0xFF << 13) | 0x1000 | (0x20 << 5) | 2;
        let f = Fields(raw);
        assert_eq!(f.ra(), 1);
        assert_eq!(f.literal(), Some(0xFF));
        assert_eq!(f.func7(), 0x20);
        assert_eq!(f.rc(), 2);
    }

    #[test]
    fn sign_extension() {
        assert_eq!(Fields(0xFFFF).sdisp16(), -1);
        assert_eq!(Fields(0x7FFF).sdisp16(), 0x7FFF);
        assert_eq!(Fields(0x10_0000).sdisp21(), -0x10_0000);
    }
}
