use pretty_assertions::assert_eq;
use proptest::prelude::*;

use alpha_rs::decoder::Fields;
use alpha_rs::instructions::FORMATS;
use alpha_rs::isa::axp::AxpDecoder;
use alpha_rs::{decode, Decoder, Format, Opcode};

fn opr(op: u32, ra: u32, rb: u32, func: u32, rc: u32) -> u32 {
    (op << 26) | (ra << 21) | (rb << 16) | (func << 5) | rc
}

#[test]
fn nop_word_is_bis() {
    let d = decode(0x47FF_041F);
    assert_eq!(d.opcode, Opcode::Bis);
    assert_eq!(d.format, Format::Operate);
}

#[test]
fn integer_groups_use_seven_bit_function() {
    assert_eq!(decode(opr(0x10, 1, 2, 0x20, 3)).opcode, Opcode::Addq);
    assert_eq!(decode(opr(0x10, 1, 2, 0x69, 3)).opcode, Opcode::SubqV);
    assert_eq!(decode(opr(0x11, 1, 2, 0x6c, 3)).opcode, Opcode::Implver);
    assert_eq!(decode(opr(0x12, 1, 2, 0x7a, 3)).opcode, Opcode::Extqh);
    assert_eq!(decode(opr(0x13, 1, 2, 0x30, 3)).opcode, Opcode::Umulh);
    assert_eq!(decode(opr(0x1c, 1, 2, 0x3f, 3)).opcode, Opcode::Maxsw4);
    // bits above the function field belong to the literal
    assert_eq!(decode(opr(0x10, 1, 0, 0x20, 3) | 0x1000 | (0xff << 13)).opcode, Opcode::Addq);
    assert_eq!(decode(opr(0x10, 1, 2, 0x01, 3)).opcode, Opcode::Unknown);
}

#[test]
fn floating_groups_use_eleven_bit_function() {
    assert_eq!(decode(opr(0x14, 31, 1, 0x024, 2)).opcode, Opcode::Itoft);
    assert_eq!(decode(opr(0x15, 1, 2, 0x4a5, 3)).opcode, Opcode::CmpgeqS);
    assert_eq!(decode(opr(0x16, 1, 2, 0x7a0, 3)).opcode, Opcode::Addt);
    assert_eq!(decode(opr(0x16, 1, 2, 0x5a6, 3)).opcode, Opcode::CmptltSu);
    assert_eq!(decode(opr(0x17, 1, 1, 0x530, 3)).opcode, Opcode::CvtqlSv);
    assert_eq!(decode(opr(0x17, 1, 1, 0x531, 3)).opcode, Opcode::Unknown);
    assert_eq!(decode(opr(0x16, 1, 2, 0x7a0, 3)).format, Format::FloatingPoint);
}

#[test]
fn misc_group_matches_whole_halfword() {
    assert_eq!(decode(0x6000_0000).opcode, Opcode::Trapb);
    assert_eq!(decode(0x6000_4000).opcode, Opcode::Mb);
    assert_eq!(decode(0x6000_4400).opcode, Opcode::Wmb);
    assert_eq!(decode(0x6000_c000).opcode, Opcode::Rpcc);
    assert_eq!(decode(0x6000_fc00).opcode, Opcode::Wh64en);
    let d = decode(0x6000_c001);
    assert_eq!((d.opcode, d.format), (Opcode::Unknown, Format::Unknown));
}

#[test]
fn jump_hint_selects_kind() {
    let base = (0x1a << 26) | (26 << 21) | (27 << 16);
    let kinds: Vec<Opcode> = (0..4).map(|k| decode(base | (k << 14)).opcode).collect();
    assert_eq!(kinds, vec![Opcode::Jmp, Opcode::Jsr, Opcode::Ret, Opcode::JsrCoroutine]);
    assert_eq!(decode(0x6BFA_8001).format, Format::MemoryBranch);
}

#[test]
fn fixed_primaries() {
    assert_eq!(decode(0).opcode, Opcode::CallPal);
    assert_eq!(decode(0).format, Format::PalCall);
    assert_eq!(decode(0x1b << 26).opcode, Opcode::Pal1b);
    assert_eq!(decode(0x1b << 26).format, Format::Unknown);
    assert_eq!(decode(0x2f << 26).opcode, Opcode::StqC);
    let bsr = decode(0x34 << 26);
    assert_eq!((bsr.opcode, bsr.format), (Opcode::Bsr, Format::Branch));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10000))]

    /// Every word decodes, the same way every time.
    #[test]
    fn decode_is_total_and_deterministic(w in any::<u32>()) {
        let dec = AxpDecoder::new();
        let a = dec.decode(w);
        let b = dec.decode(w);
        prop_assert_eq!(a, b);
    }

    /// Format follows the primary opcode unless the word is unallocated.
    #[test]
    fn format_follows_primary(w in any::<u32>()) {
        let d = decode(w);
        let primary = Fields(w).primary() as usize;
        if d.opcode == Opcode::Unknown {
            prop_assert_eq!(d.format, Format::Unknown);
        } else {
            prop_assert_eq!(d.format, FORMATS[primary]);
        }
    }
}
