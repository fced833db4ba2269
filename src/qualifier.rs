//! Rounding and trap qualifiers of floating-point operates.
//!
//! The 11-bit function field of opcodes 0x14..0x16 carries two selectors on
//! top of the 6-bit operation: the trap mode in bits 10:8 and the rounding
//! mode in bits 7:6. Which combinations are legal depends on the operation
//! family, so both selectors are looked up per [`QualKind`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::instructions::Opcode;

/// Operation family that gates the legal qualifier combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualKind {
    /// IEEE S/T arithmetic.
    Ieee = 0,
    /// Quadword to IEEE conversion (`cvtqs`, `cvtqt`).
    IntToFloat = 1,
    /// IEEE to quadword conversion (`cvttq`).
    FloatToInt = 2,
    /// VAX F/G/D arithmetic and conversions.
    Vax = 3,
    /// VAX to quadword conversion (`cvtgq`).
    VaxToInt = 4,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Qualifier: u8 {
        const S = 1 << 0; // software completion
        const U = 1 << 1; // underflow enable
        const V = 1 << 2; // integer overflow enable
        const I = 1 << 3; // inexact enable
        const C = 1 << 4; // chopped
        const M = 1 << 5; // minus infinity
        const D = 1 << 6; // dynamic
    }
}

impl std::fmt::Display for Qualifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, _) in self.iter_names() {
            f.write_str(&name.to_ascii_lowercase())?;
        }
        Ok(())
    }
}

const NONE: Qualifier = Qualifier::empty();
const SU: Qualifier = Qualifier::S.union(Qualifier::U);
const SV: Qualifier = Qualifier::S.union(Qualifier::V);
const SUI: Qualifier = SU.union(Qualifier::I);
const SVI: Qualifier = SV.union(Qualifier::I);

/// Trap mode, indexed by bits 10:8 then by [`QualKind`].
const TRAP_MODES: [[Option<Qualifier>; 5]; 8] = [
    [Some(NONE), Some(NONE), Some(NONE), Some(NONE), Some(NONE)],
    [Some(Qualifier::U), None, Some(Qualifier::V), Some(Qualifier::U), Some(Qualifier::V)],
    [Some(NONE), Some(NONE), Some(NONE), Some(NONE), Some(NONE)],
    [Some(NONE), Some(NONE), Some(NONE), Some(NONE), Some(NONE)],
    [None, None, None, Some(Qualifier::S), Some(Qualifier::S)],
    [Some(SU), None, Some(SV), Some(SU), Some(SV)],
    [Some(NONE), Some(NONE), Some(NONE), Some(NONE), Some(NONE)],
    [Some(SUI), Some(SUI), Some(SVI), None, Some(SVI)],
];

/// Rounding mode, indexed by bits 7:6 then by [`QualKind`].
const ROUNDING_MODES: [[Option<Qualifier>; 5]; 4] = [
    [Some(Qualifier::C); 5],
    [Some(Qualifier::M), Some(Qualifier::M), Some(Qualifier::M), None, None],
    [Some(NONE); 5],
    [Some(Qualifier::D), Some(Qualifier::D), Some(Qualifier::D), None, None],
];

/// Combined qualifier for `func` (the 11-bit function field), or `None` when
/// either selector is illegal for `kind`.
pub fn qualifier(func: u32, kind: QualKind) -> Option<Qualifier> {
    let trap = TRAP_MODES[((func >> 8) & 7) as usize][kind as usize]?;
    let round = ROUNDING_MODES[((func >> 6) & 3) as usize][kind as usize]?;
    Some(trap | round)
}

/// Mnemonic suffix (`/sui`, `/c`, ...) for `op`; empty when the opcode takes
/// no qualifier, when the field selects the default modes, or when the
/// combination is illegal.
pub fn suffix(op: Opcode, func: u32) -> String {
    match op.qualifier_kind().and_then(|k| qualifier(func, k)) {
        Some(q) if !q.is_empty() => format!("/{q}"),
        _ => String::new(),
    }
}
