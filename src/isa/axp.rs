use crate::decoder::{DecodedInstruction, Decoder, Fields};
use crate::instructions::Opcode::{self, *};

/// Alpha AXP decoder.
///
/// Primary opcode (bits 31:26) selects either a fixed mnemonic or a
/// sub-table keyed by the group's function field. Sub-tables are expanded
/// into dense arrays at compile time so lookup is a single index.
#[derive(Debug, Default, Clone, Copy)]
pub struct AxpDecoder;

impl AxpDecoder {
    pub fn new() -> Self {
        Self
    }
}

const fn expand<const N: usize>(pairs: &[(u16, Opcode)]) -> [Opcode; N] {
    let mut t = [Unknown; N];
    let mut i = 0;
    while i < pairs.len() {
        t[pairs[i].0 as usize] = pairs[i].1;
        i += 1;
    }
    t
}

const INTA: &[(u16, Opcode)] = &[
    (0x00, Addl), (0x02, S4addl), (0x09, Subl), (0x0b, S4subl),
    (0x0f, Cmpbge), (0x12, S8addl), (0x1b, S8subl), (0x1d, Cmpult),
    (0x20, Addq), (0x22, S4addq), (0x29, Subq), (0x2b, S4subq),
    (0x2d, Cmpeq), (0x32, S8addq), (0x3b, S8subq), (0x3d, Cmpule),
    (0x40, AddlV), (0x49, SublV), (0x4d, Cmplt), (0x60, AddqV),
    (0x69, SubqV), (0x6d, Cmple),
];

const INTL: &[(u16, Opcode)] = &[
    (0x00, And), (0x08, Bic), (0x14, Cmovlbs), (0x16, Cmovlbc),
    (0x20, Bis), (0x24, Cmoveq), (0x26, Cmovne), (0x28, Ornot),
    (0x40, Xor), (0x44, Cmovlt), (0x46, Cmovge), (0x48, Eqv),
    (0x61, Amask), (0x64, Cmovle), (0x66, Cmovgt), (0x6c, Implver),
];

const INTS: &[(u16, Opcode)] = &[
    (0x02, Mskbl), (0x06, Extbl), (0x0b, Insbl), (0x12, Mskwl),
    (0x16, Extwl), (0x1b, Inswl), (0x22, Mskll), (0x26, Extll),
    (0x2b, Insll), (0x30, Zap), (0x31, Zapnot), (0x32, Mskql),
    (0x34, Srl), (0x36, Extql), (0x39, Sll), (0x3b, Insql),
    (0x3c, Sra), (0x52, Mskwh), (0x57, Inswh), (0x5a, Extwh),
    (0x62, Msklh), (0x67, Inslh), (0x6a, Extlh), (0x72, Mskqh),
    (0x77, Insqh), (0x7a, Extqh),
];

const INTM: &[(u16, Opcode)] = &[
    (0x00, Mull), (0x20, Mulq), (0x30, Umulh), (0x40, MullV), (0x60, MulqV),
];

const FPTI: &[(u16, Opcode)] = &[
    (0x00, Sextb), (0x01, Sextw), (0x30, Ctpop), (0x31, Perr),
    (0x32, Ctlz), (0x33, Cttz), (0x34, Unpkbw), (0x35, Unpkbl),
    (0x36, Pkwb), (0x37, Pklb), (0x38, Minsb8), (0x39, Minsw4),
    (0x3a, Minub8), (0x3b, Minuw4), (0x3c, Maxub8), (0x3d, Maxuw4),
    (0x3e, Maxsb8), (0x3f, Maxsw4), (0x70, Ftoit), (0x78, Ftois),
];

// Floating groups: exact 11-bit matches take precedence over the
// qualified forms, which are keyed by the low 6 bits only.
const ITFP: &[(u16, Opcode)] = &[(0x004, Itofs), (0x014, Itoff), (0x024, Itoft)];
const ITFP_Q: &[(u16, Opcode)] = &[(0x0a, Sqrtf), (0x0b, Sqrts), (0x2a, Sqrtg), (0x2b, Sqrtt)];

const FLTV: &[(u16, Opcode)] = &[
    (0x03c, CvtqfC), (0x03e, CvtqgC), (0x0a5, Cmpgeq), (0x0a6, Cmpglt),
    (0x0a7, Cmpgle), (0x0bc, Cvtqf), (0x0be, Cvtqg), (0x4a5, CmpgeqS),
    (0x4a6, CmpgltS), (0x4a7, CmpgleS),
];
const FLTV_Q: &[(u16, Opcode)] = &[
    (0x00, Addf), (0x01, Subf), (0x02, Mulf), (0x03, Divf),
    (0x1e, Cvtdg), (0x20, Addg), (0x21, Subg), (0x22, Mulg),
    (0x23, Divg), (0x2c, Cvtgf), (0x2d, Cvtgd), (0x2f, Cvtgq),
];

const FLTI: &[(u16, Opcode)] = &[
    (0x0a4, Cmptun), (0x0a5, Cmpteq), (0x0a6, Cmptlt), (0x0a7, Cmptle),
    (0x2ac, Cvtst), (0x5a4, CmptunSu), (0x5a5, CmpteqSu), (0x5a6, CmptltSu),
    (0x5a7, CmptleSu), (0x6ac, CvtstS),
];
const FLTI_Q: &[(u16, Opcode)] = &[
    (0x00, Adds), (0x01, Subs), (0x02, Muls), (0x03, Divs),
    (0x20, Addt), (0x21, Subt), (0x22, Mult), (0x23, Divt),
    (0x2c, Cvtts), (0x2f, Cvttq), (0x3c, Cvtqs), (0x3e, Cvtqt),
];

const FLTL: &[(u16, Opcode)] = &[
    (0x010, Cvtlq), (0x020, Cpys), (0x021, Cpysn), (0x022, Cpyse),
    (0x024, MtFpcr), (0x025, MfFpcr), (0x02a, Fcmoveq), (0x02b, Fcmovne),
    (0x02c, Fcmovlt), (0x02d, Fcmovge), (0x02e, Fcmovle), (0x02f, Fcmovgt),
    (0x030, Cvtql), (0x130, CvtqlV), (0x530, CvtqlSv),
];

/// Opcode 0x18 matches the whole low halfword.
const MISC: &[(u16, Opcode)] = &[
    (0x0000, Trapb), (0x0400, Excb), (0x4000, Mb), (0x4400, Wmb),
    (0x8000, Fetch), (0xa000, FetchM), (0xc000, Rpcc), (0xe000, Rc),
    (0xf000, Rs), (0xe800, Ecb), (0xf800, Wh64), (0xfc00, Wh64en),
];

const JUMPS: [Opcode; 4] = [Jmp, Jsr, Ret, JsrCoroutine];

static INTA_T: [Opcode; 128] = expand(INTA);
static INTL_T: [Opcode; 128] = expand(INTL);
static INTS_T: [Opcode; 128] = expand(INTS);
static INTM_T: [Opcode; 128] = expand(INTM);
static FPTI_T: [Opcode; 128] = expand(FPTI);
static ITFP_T: [Opcode; 2048] = expand(ITFP);
static ITFP_QT: [Opcode; 64] = expand(ITFP_Q);
static FLTV_T: [Opcode; 2048] = expand(FLTV);
static FLTV_QT: [Opcode; 64] = expand(FLTV_Q);
static FLTI_T: [Opcode; 2048] = expand(FLTI);
static FLTI_QT: [Opcode; 64] = expand(FLTI_Q);
static FLTL_T: [Opcode; 2048] = expand(FLTL);

/// Fixed mnemonics of primary opcodes without a sub-decode.
const PRIMARY: [Opcode; 64] = [
    CallPal, Opc01, Opc02, Opc03, Opc04, Opc05, Opc06, Opc07,
    Lda, Ldah, Ldbu, LdqU, Ldwu, Stw, Stb, StqU,
    Unknown, Unknown, Unknown, Unknown, Unknown, Unknown, Unknown, Unknown,
    Unknown, Pal19, Unknown, Pal1b, Unknown, Pal1d, Pal1e, Pal1f,
    Ldf, Ldg, Lds, Ldt, Stf, Stg, Sts, Stt,
    Ldl, Ldq, LdlL, LdqL, Stl, Stq, StlC, StqC,
    Br, Fbeq, Fblt, Fble, Bsr, Fbne, Fbge, Fbgt,
    Blbc, Beq, Blt, Ble, Blbs, Bne, Bge, Bgt,
];

fn qualified(exact: &[Opcode; 2048], masked: &[Opcode; 64], func: u32) -> Opcode {
    match exact[func as usize] {
        Unknown => masked[(func & 0x3F) as usize],
        op => op,
    }
}

impl Decoder for AxpDecoder {
    fn decode(&self, raw32: u32) -> DecodedInstruction {
        let f = Fields(raw32);
        let primary = f.primary();
        let op = match primary {
            0x10 => INTA_T[f.func7() as usize],
            0x11 => INTL_T[f.func7() as usize],
            0x12 => INTS_T[f.func7() as usize],
            0x13 => INTM_T[f.func7() as usize],
            0x14 => qualified(&ITFP_T, &ITFP_QT, f.func11()),
            0x15 => qualified(&FLTV_T, &FLTV_QT, f.func11()),
            0x16 => qualified(&FLTI_T, &FLTI_QT, f.func11()),
            0x17 => FLTL_T[f.func11() as usize],
            0x18 => {
                let low = (raw32 & 0xFFFF) as u16;
                MISC.iter()
                    .find(|(code, _)| *code == low)
                    .map_or(Unknown, |&(_, op)| op)
            }
            0x1A => JUMPS[f.jump_kind() as usize],
            0x1C => FPTI_T[f.func7() as usize],
            p => PRIMARY[p as usize],
        };
        DecodedInstruction::new(op, primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::Format;

    fn dec(raw: u32) -> DecodedInstruction {
        AxpDecoder::new().decode(raw)
    }

    #[test]
    fn nop_is_bis_operate() {
        let d = dec(0x47FF_041F);
        assert_eq!(d.opcode, Bis);
        assert_eq!(d.format, Format::Operate);
    }

    #[test]
    fn exact_floating_entry_wins_over_masked() {
        // cvtst shares its low six bits with cvtts
        let d = dec((0x16 << 26) | (0x2ac << 5));
        assert_eq!(d.opcode, Cvtst);
        let d = dec((0x16 << 26) | (0x5ac << 5));
        assert_eq!(d.opcode, Cvtts);
    }

    #[test]
    fn unmatched_misc_is_unknown() {
        let d = dec((0x18 << 26) | 0x1234);
        assert_eq!(d.opcode, Unknown);
        assert_eq!(d.format, Format::Unknown);
    }
}
