//! Integer datapath helpers shared by the executor.
//!
//! All functions are pure; the executor only resolves operands and writes
//! results back.

use bitvec::prelude::*;
use num_traits::{AsPrimitive, PrimInt};

/// Architectural extensions this interpreter executes, as reported by
/// `amask`: BWX (byte/word), CIX (count), MVI (multimedia).
pub const AMASK_IMPLEMENTED: u64 = 0x001 | 0x004 | 0x100;
/// `implver` result (EV6 family).
pub const IMPLVER: u64 = 2;

#[inline]
pub fn sext32(v: u64) -> u64 {
    v as u32 as i32 as i64 as u64
}

/// Longword add/sub/multiply: operate on the low 32 bits, sign-extend.
pub fn addl(a: u64, b: u64) -> u64 {
    sext32(a.wrapping_add(b))
}
pub fn subl(a: u64, b: u64) -> u64 {
    sext32(a.wrapping_sub(b))
}
pub fn mull(a: u64, b: u64) -> u64 {
    sext32((a as u32).wrapping_mul(b as u32) as u64)
}

/// High 64 bits of the unsigned 128-bit product, from four 32x32 partial
/// products.
pub fn umulh(a: u64, b: u64) -> u64 {
    const LO: u64 = 0xFFFF_FFFF;
    let (a_lo, a_hi) = (a & LO, a >> 32);
    let (b_lo, b_hi) = (b & LO, b >> 32);

    let ll = a_lo * b_lo;
    let hl = a_hi * b_lo;
    let lh = a_lo * b_hi;
    let hh = a_hi * b_hi;

    // cannot overflow: (2^32-1) * 2 + (2^32-1)^2 == 2^64 - 1
    let mid = (ll >> 32) + (hl & LO) + lh;
    hh + (hl >> 32) + (mid >> 32)
}

/// Shift counts are not masked; counts of 64 or more shift everything out.
pub fn sll(a: u64, n: u64) -> u64 {
    if n >= 64 {
        0
    } else {
        a << n
    }
}
pub fn srl(a: u64, n: u64) -> u64 {
    if n >= 64 {
        0
    } else {
        a >> n
    }
}
pub fn sra(a: u64, n: u64) -> u64 {
    ((a as i64) >> n.min(63)) as u64
}

/// Per-byte unsigned `a >= b`, one result bit per byte.
pub fn cmpbge(a: u64, b: u64) -> u64 {
    let (x, y) = (a.to_le_bytes(), b.to_le_bytes());
    let mut out = 0u8;
    let bits = out.view_bits_mut::<Lsb0>();
    for i in 0..8 {
        bits.set(i, x[i] >= y[i]);
    }
    out as u64
}

/// Clears every byte of `a` whose bit is set in `sel`.
pub fn zap(a: u64, sel: u8) -> u64 {
    let mut bytes = a.to_le_bytes();
    for (i, hit) in sel.view_bits::<Lsb0>().iter().by_vals().enumerate() {
        if hit {
            bytes[i] = 0;
        }
    }
    u64::from_le_bytes(bytes)
}

pub fn zapnot(a: u64, sel: u8) -> u64 {
    zap(a, !sel)
}

/// Width of a byte-manipulation lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Byte,
    Word,
    Long,
    Quad,
}

impl Lane {
    pub const fn mask(self) -> u64 {
        match self {
            Lane::Byte => 0xFF,
            Lane::Word => 0xFFFF,
            Lane::Long => 0xFFFF_FFFF,
            Lane::Quad => u64::MAX,
        }
    }
}

/// Bit offset of the lane selected by the low three bits of `b`.
#[inline]
fn lane_shift(b: u64) -> u32 {
    ((b & 7) * 8) as u32
}

pub fn mask_low(a: u64, b: u64, lane: Lane) -> u64 {
    a & !(lane.mask() << lane_shift(b))
}

pub fn mask_high(a: u64, b: u64, lane: Lane) -> u64 {
    match lane_shift(b) {
        0 => a,
        m => a & !(lane.mask() >> (64 - m)),
    }
}

pub fn insert_low(a: u64, b: u64, lane: Lane) -> u64 {
    (a & lane.mask()) << lane_shift(b)
}

pub fn insert_high(a: u64, b: u64, lane: Lane) -> u64 {
    match lane_shift(b) {
        0 => 0,
        m => (a & lane.mask()) >> (64 - m),
    }
}

pub fn extract_low(a: u64, b: u64, lane: Lane) -> u64 {
    (a >> lane_shift(b)) & lane.mask()
}

pub fn extract_high(a: u64, b: u64, lane: Lane) -> u64 {
    (a << ((64 - lane_shift(b)) & 63)) & lane.mask()
}

/// Applies `pick` lane-wise over `T`-sized lanes of `a` and `b`.
fn lanes<T>(a: u64, b: u64, pick: fn(T, T) -> T) -> u64
where
    T: PrimInt + AsPrimitive<u64>,
    u64: AsPrimitive<T>,
{
    let width = T::zero().count_zeros() as usize;
    let mask = u64::MAX >> (64 - width);
    (0..64usize).step_by(width).fold(0, |acc, shift| {
        let x: T = ((a >> shift) & mask).as_();
        let y: T = ((b >> shift) & mask).as_();
        acc | ((pick(x, y).as_() & mask) << shift)
    })
}

pub fn minsb8(a: u64, b: u64) -> u64 {
    lanes::<i8>(a, b, std::cmp::min)
}
pub fn minsw4(a: u64, b: u64) -> u64 {
    lanes::<i16>(a, b, std::cmp::min)
}
pub fn minub8(a: u64, b: u64) -> u64 {
    lanes::<u8>(a, b, std::cmp::min)
}
pub fn minuw4(a: u64, b: u64) -> u64 {
    lanes::<u16>(a, b, std::cmp::min)
}
pub fn maxsb8(a: u64, b: u64) -> u64 {
    lanes::<i8>(a, b, std::cmp::max)
}
pub fn maxsw4(a: u64, b: u64) -> u64 {
    lanes::<i16>(a, b, std::cmp::max)
}
pub fn maxub8(a: u64, b: u64) -> u64 {
    lanes::<u8>(a, b, std::cmp::max)
}
pub fn maxuw4(a: u64, b: u64) -> u64 {
    lanes::<u16>(a, b, std::cmp::max)
}

/// Sum of absolute byte differences.
pub fn perr(a: u64, b: u64) -> u64 {
    a.to_le_bytes()
        .iter()
        .zip(b.to_le_bytes())
        .map(|(x, y)| x.abs_diff(y) as u64)
        .sum()
}

pub fn unpkbw(b: u64) -> u64 {
    (0..4).fold(0, |acc, i| acc | (((b >> (8 * i)) & 0xFF) << (16 * i)))
}
pub fn unpkbl(b: u64) -> u64 {
    (b & 0xFF) | (((b >> 8) & 0xFF) << 32)
}
pub fn pkwb(b: u64) -> u64 {
    (0..4).fold(0, |acc, i| acc | (((b >> (16 * i)) & 0xFF) << (8 * i)))
}
pub fn pklb(b: u64) -> u64 {
    (b & 0xFF) | (((b >> 32) & 0xFF) << 8)
}
