use serde::Serialize;

use crate::decoder::{self, branch_target, DecodedInstruction, Fields};
use crate::image::LoadedImage;
use crate::instructions::{Format, Opcode};
use crate::qualifier;
use crate::registers::{freg_name, reg_name, ZERO};

/// One disassembled instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub address: u64,
    pub raw: u32,
    pub insn: DecodedInstruction,
    /// Raw operand fields (`rNN`, `fNN`, displacement, function code).
    pub fields: String,
    /// Canonical `mnemonic operands` text.
    pub canonical: String,
    /// Pseudo-instruction form, when the operands select one.
    pub alias: Option<String>,
}

impl Rendered {
    /// Canonical text followed by ` => alias` when there is one.
    pub fn text(&self) -> String {
        match &self.alias {
            Some(a) => format!("{} => {}", self.canonical, a),
            None => self.canonical.clone(),
        }
    }

    /// Preferred single form: the alias if any, else the canonical text.
    pub fn display(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.canonical)
    }
}

/// Renders `raw32` located at `addr`.
pub fn render(addr: u64, raw32: u32) -> (DecodedInstruction, String) {
    let r = render_full(addr, raw32);
    (r.insn, r.text())
}

pub fn render_full(addr: u64, raw32: u32) -> Rendered {
    let insn = decoder::decode(raw32);
    let f = Fields(raw32);
    let mn = insn.mnemonic();

    let (fields, canonical, alias) = match insn.format {
        Format::Unknown => (String::new(), mn.to_string(), None),
        Format::PalCall => {
            let pal = f.pal_func();
            (format!("{pal:08x}"), format!("{mn} {pal:#x}"), None)
        }
        Format::Branch => branch(addr, f, insn.opcode),
        Format::Memory => memory(f, insn.opcode),
        Format::MemoryBranch => {
            let (ra, rb, hint) = (f.ra(), f.rb(), f.jump_hint());
            (
                format!(".{:x} r{ra:02} r{rb:02} {hint:04x}", f.jump_kind()),
                format!("{mn} {},({}),{hint:#x}", reg_name(ra), reg_name(rb)),
                None,
            )
        }
        Format::MemoryFormatCompute => {
            let (ra, rb) = (f.ra(), f.rb());
            (
                format!(".{:04x} r{ra:02} r{rb:02}", f.disp16()),
                format!("{mn} {},{}", reg_name(ra), reg_name(rb)),
                None,
            )
        }
        Format::Operate => operate(f, insn.opcode),
        Format::FloatingPoint => floating(f, insn.opcode),
    };

    Rendered { address: addr, raw: raw32, insn, fields, canonical, alias }
}

fn branch(addr: u64, f: Fields, op: Opcode) -> (String, String, Option<String>) {
    let ra = f.ra();
    let target = branch_target(addr, f.0);
    let reg = match op {
        Opcode::Fbeq | Opcode::Fblt | Opcode::Fble | Opcode::Fbne | Opcode::Fbge | Opcode::Fbgt => {
            freg_name(ra)
        }
        _ => reg_name(ra).to_string(),
    };
    let alias = (op == Opcode::Br && ra == ZERO).then(|| format!("br {target:#x}"));
    (
        format!("r{ra:02} {:08x}", f.disp21()),
        format!("{} {reg},{target:#x}", op.mnemonic()),
        alias,
    )
}

fn memory(f: Fields, op: Opcode) -> (String, String, Option<String>) {
    let (ra, rb) = (f.ra(), f.rb());
    let disp = f.sdisp16();
    let mut args = if disp < 0 { format!("-{:#x}", -disp) } else { format!("{disp:#x}") };
    if rb != ZERO {
        args += &format!("({})", reg_name(rb));
    }

    let reg = match op {
        Opcode::Ldf
        | Opcode::Ldg
        | Opcode::Lds
        | Opcode::Ldt
        | Opcode::Stf
        | Opcode::Stg
        | Opcode::Sts
        | Opcode::Stt => freg_name(ra),
        _ => reg_name(ra).to_string(),
    };

    let alias = match op {
        Opcode::Lda if rb == ZERO => Some(format!("mov {args},{reg}")),
        Opcode::Ldah if rb == ZERO => Some(format!("movh {args},{reg}")),
        Opcode::LdqU if ra == ZERO && disp == 0 => Some("unop".to_string()),
        _ if ra == ZERO && disp != 0 => {
            let pse = match op {
                Opcode::Ldl => Some("prefetch"),
                Opcode::Ldq => Some("prefetch_en"),
                Opcode::Lds => Some("prefetch_m"),
                Opcode::Ldt => Some("prefetch_men"),
                _ => None,
            };
            pse.map(|p| format!("{p} {args}"))
        }
        _ => None,
    };

    (
        format!("r{ra:02} r{rb:02} {:04x}", f.disp16()),
        format!("{} {reg},{args}", op.mnemonic()),
        alias,
    )
}

fn operate(f: Fields, op: Opcode) -> (String, String, Option<String>) {
    let (ra, rb, rc) = (f.ra(), f.rb(), f.rc());
    let (fields, arg2, b_is_zero) = match f.literal() {
        Some(lit) => (
            format!(".{:02x} r{ra:02} #{lit:02x} r{rc:02}", f.func7()),
            format!("{lit:#x}"),
            false,
        ),
        None => (
            format!(".{:02x} r{ra:02} r{rb:02} r{rc:02}", f.func7()),
            reg_name(rb).to_string(),
            rb == ZERO,
        ),
    };
    let c = reg_name(rc);

    let alias = match op {
        _ if ra != ZERO => None,
        Opcode::Bis if b_is_zero && rc == ZERO => Some("nop".to_string()),
        Opcode::Bis if b_is_zero => Some(format!("clr {c}")),
        _ => {
            let pse = match op {
                Opcode::Bis => Some("mov"),
                Opcode::Addl => Some("sextl"),
                Opcode::Ornot => Some("not"),
                Opcode::Subl => Some("negl"),
                Opcode::SublV => Some("negl/v"),
                Opcode::Subq => Some("negq"),
                Opcode::SubqV => Some("negq/v"),
                _ => None,
            };
            pse.map(|p| format!("{p} {arg2},{c}"))
        }
    };

    (fields, canonical3(op, ra, &arg2, rc), alias)
}

fn canonical3(op: Opcode, ra: u8, arg2: &str, rc: u8) -> String {
    format!("{} {},{arg2},{}", op.mnemonic(), reg_name(ra), reg_name(rc))
}

/// Operand shape of a floating-point alias.
enum Shape {
    Bare,
    Dest,
    Pair,
}

fn floating(f: Fields, op: Opcode) -> (String, String, Option<String>) {
    let (fa, fb, fc) = (f.ra(), f.rb(), f.rc());
    let func = f.func11();
    let mn = format!("{}{}", op.mnemonic(), qualifier::suffix(op, func));

    let neg = |base: &str| Some((format!("{base}{}", qualifier::suffix(op, func)), Shape::Pair));
    let mut pse: Option<(String, Shape)> = None;
    if fa == ZERO {
        pse = match op {
            Opcode::Cpys if fb == ZERO && fc == ZERO => Some(("fnop".into(), Shape::Bare)),
            Opcode::Cpys if fb == ZERO => Some(("fclr".into(), Shape::Dest)),
            Opcode::Cpys => Some(("fabs".into(), Shape::Pair)),
            Opcode::Subf => neg("negf"),
            Opcode::Subg => neg("negg"),
            Opcode::Subs => neg("negs"),
            Opcode::Subt => neg("negt"),
            _ => None,
        };
    }
    if pse.is_none() && fa == fb {
        pse = match op {
            Opcode::Cpys => Some(("fmov".into(), Shape::Pair)),
            Opcode::Cpysn => Some(("fneg".into(), Shape::Pair)),
            Opcode::MtFpcr | Opcode::MfFpcr if fb == fc => Some((mn.clone(), Shape::Dest)),
            _ => None,
        };
    }

    let alias = pse.map(|(p, shape)| match shape {
        Shape::Bare => p,
        Shape::Dest => format!("{p} {}", freg_name(fc)),
        Shape::Pair => format!("{p} {},{}", freg_name(fb), freg_name(fc)),
    });

    (
        format!(".{func:03x} f{fa:02} f{fb:02} f{fc:02}"),
        format!("{mn} {},{},{}", freg_name(fa), freg_name(fb), freg_name(fc)),
        alias,
    )
}

/// Static listing of the text segment: one line per word with file offset,
/// bracketed address (when it differs from the offset), raw word, primary
/// opcode, raw fields and rendered text.
pub fn listing(image: &LoadedImage) -> Vec<String> {
    listing_entries(image)
        .into_iter()
        .map(|(off, r)| listing_line(off, &r))
        .collect()
}

/// Rendered instructions of the text segment paired with their file offsets.
/// Words not backed by any segment are skipped.
pub fn listing_entries(image: &LoadedImage) -> Vec<(u64, Rendered)> {
    let text = image.text;
    (0..text.size / 4)
        .filter_map(|i| {
            let addr = text.vaddr + i * 4;
            let raw = image.read_u32(addr)?;
            Some((text.file_offset + i * 4, render_full(addr, raw)))
        })
        .collect()
}

pub fn listing_line(off: u64, r: &Rendered) -> String {
    let mut line = format!("{off:08x}: ");
    if off != r.address {
        line += &format!("[{:08x}] ", r.address);
    }
    line += &format!("{:08x} => {:02x} {:<22} => {}", r.raw, r.raw >> 26, r.fields, r.text());
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nop_word() {
        let (d, text) = render(0, 0x47FF_041F);
        assert_eq!(d.opcode, Opcode::Bis);
        assert_eq!(text, "bis zero,zero,zero => nop");
    }

    #[test]
    fn listing_brackets_relocated_addresses() {
        let img = LoadedImage::from_words(0x1_2000_0000, &[0x47FF_041F]);
        let lines = listing(&img);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("00000000: [120000000] 47ff041f => 11 .20 r31 r31 r31"));
        assert!(lines[0].ends_with("=> bis zero,zero,zero => nop"));
    }
}
