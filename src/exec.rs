use crate::alu::{self, Lane};
use crate::cpu::{Cpu, Fault};
use crate::decoder::{DecodedInstruction, Fields};
use crate::instructions::{Format, Opcode};
use crate::memory::Bus;
use crate::registers::ZERO;

pub trait Executor {
    /// Executes one decoded instruction. `cpu.pc` already points past it;
    /// `at` is its own address, used for fault reports.
    fn exec<B: Bus>(
        &self,
        cpu: &mut Cpu,
        bus: &mut B,
        at: u64,
        raw32: u32,
        d: DecodedInstruction,
    ) -> Result<(), Fault>;
}

/// Integer-only executor: floating-point, PAL and interrupt-flag
/// instructions fault as unimplemented.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntExecutor;

fn unimplemented(at: u64, op: Opcode) -> Fault {
    Fault::Unimplemented { pc: at, mnemonic: op.mnemonic() }
}

impl Executor for IntExecutor {
    fn exec<B: Bus>(
        &self,
        cpu: &mut Cpu,
        bus: &mut B,
        at: u64,
        raw32: u32,
        d: DecodedInstruction,
    ) -> Result<(), Fault> {
        let f = Fields(raw32);
        match d.format {
            Format::Branch => branch(cpu, f, d.opcode, at),
            Format::MemoryBranch => {
                let target = cpu.regs.get(f.rb());
                cpu.regs.set(f.ra(), cpu.pc);
                cpu.pc = target;
                Ok(())
            }
            Format::Memory => memory(cpu, bus, f, d.opcode, at),
            Format::MemoryFormatCompute => misc(cpu, f, d.opcode, at),
            Format::Operate => operate(cpu, f, d.opcode, at),
            _ => Err(unimplemented(at, d.opcode)),
        }
    }
}

fn branch(cpu: &mut Cpu, f: Fields, op: Opcode, at: u64) -> Result<(), Fault> {
    let v = cpu.regs.get(f.ra());
    let taken = match op {
        Opcode::Br | Opcode::Bsr => {
            cpu.regs.set(f.ra(), cpu.pc);
            true
        }
        Opcode::Beq => v == 0,
        Opcode::Bne => v != 0,
        Opcode::Blt => (v as i64) < 0,
        Opcode::Ble => (v as i64) <= 0,
        Opcode::Bgt => (v as i64) > 0,
        Opcode::Bge => (v as i64) >= 0,
        Opcode::Blbc => v & 1 == 0,
        Opcode::Blbs => v & 1 == 1,
        _ => return Err(unimplemented(at, op)),
    };
    if taken {
        let off = (f.sdisp21() as u64).wrapping_mul(4);
        cpu.pc = cpu.pc.wrapping_add(off);
    }
    Ok(())
}

fn memory<B: Bus>(cpu: &mut Cpu, bus: &mut B, f: Fields, op: Opcode, at: u64) -> Result<(), Fault> {
    let (ra, rb) = (f.ra(), f.rb());
    let disp = f.sdisp16() as u64;
    let ea = cpu.regs.get(rb).wrapping_add(disp);
    let fault = |e| Fault::address(at, e);

    match op {
        Opcode::Lda => cpu.regs.set(ra, ea),
        Opcode::Ldah => cpu.regs.set(ra, cpu.regs.get(rb).wrapping_add(disp << 16)),

        // loads into r31/f31 are prefetch hints: no access at all
        Opcode::Ldbu
        | Opcode::Ldwu
        | Opcode::Ldl
        | Opcode::Ldq
        | Opcode::LdqU
        | Opcode::LdlL
        | Opcode::LdqL
        | Opcode::Ldf
        | Opcode::Ldg
        | Opcode::Lds
        | Opcode::Ldt
            if ra == ZERO => {}
        Opcode::Ldbu => {
            let v = bus.read_u8(ea).map_err(fault)?;
            cpu.regs.set(ra, v as u64);
        }
        Opcode::Ldwu => {
            let v = bus.read_u16(ea).map_err(fault)?;
            cpu.regs.set(ra, v as u64);
        }
        Opcode::Ldl | Opcode::LdlL => {
            let v = bus.read_u32(ea).map_err(fault)?;
            cpu.regs.set(ra, v as i32 as i64 as u64);
        }
        Opcode::Ldq | Opcode::LdqL => {
            let v = bus.read_u64(ea).map_err(fault)?;
            cpu.regs.set(ra, v);
        }
        Opcode::LdqU => {
            let v = bus.read_u64(ea & !7).map_err(fault)?;
            cpu.regs.set(ra, v);
        }

        Opcode::Stb => bus.write_u8(ea, cpu.regs.get(ra) as u8).map_err(fault)?,
        Opcode::Stw => bus.write_u16(ea, cpu.regs.get(ra) as u16).map_err(fault)?,
        Opcode::Stl => bus.write_u32(ea, cpu.regs.get(ra) as u32).map_err(fault)?,
        Opcode::Stq => bus.write_u64(ea, cpu.regs.get(ra)).map_err(fault)?,
        Opcode::StqU => bus.write_u64(ea & !7, cpu.regs.get(ra)).map_err(fault)?,
        // store-conditional always succeeds on a single hart
        Opcode::StlC => {
            bus.write_u32(ea, cpu.regs.get(ra) as u32).map_err(fault)?;
            cpu.regs.set(ra, 1);
        }
        Opcode::StqC => {
            bus.write_u64(ea, cpu.regs.get(ra)).map_err(fault)?;
            cpu.regs.set(ra, 1);
        }

        _ => return Err(unimplemented(at, op)),
    }
    Ok(())
}

fn misc(cpu: &mut Cpu, f: Fields, op: Opcode, at: u64) -> Result<(), Fault> {
    match op {
        Opcode::Trapb
        | Opcode::Excb
        | Opcode::Mb
        | Opcode::Wmb
        | Opcode::Fetch
        | Opcode::FetchM
        | Opcode::Ecb
        | Opcode::Wh64
        | Opcode::Wh64en => Ok(()),
        Opcode::Rpcc => {
            cpu.regs.set(f.ra(), cpu.cycles);
            Ok(())
        }
        _ => Err(unimplemented(at, op)),
    }
}

fn operate(cpu: &mut Cpu, f: Fields, op: Opcode, at: u64) -> Result<(), Fault> {
    use Opcode::*;

    let a = cpu.regs.get(f.ra());
    let b = match f.literal() {
        Some(lit) => lit as u64,
        None => cpu.regs.get(f.rb()),
    };

    let cmov = |cond: bool| cond.then_some(b);
    let res: Option<u64> = match op {
        Addl | AddlV => Some(alu::addl(a, b)),
        S4addl => Some(alu::addl(a << 2, b)),
        S8addl => Some(alu::addl(a << 3, b)),
        Subl | SublV => Some(alu::subl(a, b)),
        S4subl => Some(alu::subl(a << 2, b)),
        S8subl => Some(alu::subl(a << 3, b)),
        Addq | AddqV => Some(a.wrapping_add(b)),
        S4addq => Some((a << 2).wrapping_add(b)),
        S8addq => Some((a << 3).wrapping_add(b)),
        Subq | SubqV => Some(a.wrapping_sub(b)),
        S4subq => Some((a << 2).wrapping_sub(b)),
        S8subq => Some((a << 3).wrapping_sub(b)),
        Cmpeq => Some((a == b) as u64),
        Cmplt => Some(((a as i64) < (b as i64)) as u64),
        Cmple => Some(((a as i64) <= (b as i64)) as u64),
        Cmpult => Some((a < b) as u64),
        Cmpule => Some((a <= b) as u64),
        Cmpbge => Some(alu::cmpbge(a, b)),

        And => Some(a & b),
        Bic => Some(a & !b),
        Bis => Some(a | b),
        Ornot => Some(a | !b),
        Xor => Some(a ^ b),
        Eqv => Some(a ^ !b),
        Cmoveq => cmov(a == 0),
        Cmovne => cmov(a != 0),
        Cmovlt => cmov((a as i64) < 0),
        Cmovge => cmov((a as i64) >= 0),
        Cmovle => cmov((a as i64) <= 0),
        Cmovgt => cmov((a as i64) > 0),
        Cmovlbs => cmov(a & 1 == 1),
        Cmovlbc => cmov(a & 1 == 0),
        Amask => Some(b & !alu::AMASK_IMPLEMENTED),
        Implver => Some(alu::IMPLVER),

        Sll => Some(alu::sll(a, b)),
        Srl => Some(alu::srl(a, b)),
        Sra => Some(alu::sra(a, b)),
        Zap => Some(alu::zap(a, b as u8)),
        Zapnot => Some(alu::zapnot(a, b as u8)),
        Mskbl => Some(alu::mask_low(a, b, Lane::Byte)),
        Mskwl => Some(alu::mask_low(a, b, Lane::Word)),
        Mskll => Some(alu::mask_low(a, b, Lane::Long)),
        Mskql => Some(alu::mask_low(a, b, Lane::Quad)),
        Mskwh => Some(alu::mask_high(a, b, Lane::Word)),
        Msklh => Some(alu::mask_high(a, b, Lane::Long)),
        Mskqh => Some(alu::mask_high(a, b, Lane::Quad)),
        Insbl => Some(alu::insert_low(a, b, Lane::Byte)),
        Inswl => Some(alu::insert_low(a, b, Lane::Word)),
        Insll => Some(alu::insert_low(a, b, Lane::Long)),
        Insql => Some(alu::insert_low(a, b, Lane::Quad)),
        Inswh => Some(alu::insert_high(a, b, Lane::Word)),
        Inslh => Some(alu::insert_high(a, b, Lane::Long)),
        Insqh => Some(alu::insert_high(a, b, Lane::Quad)),
        Extbl => Some(alu::extract_low(a, b, Lane::Byte)),
        Extwl => Some(alu::extract_low(a, b, Lane::Word)),
        Extll => Some(alu::extract_low(a, b, Lane::Long)),
        Extql => Some(alu::extract_low(a, b, Lane::Quad)),
        Extwh => Some(alu::extract_high(a, b, Lane::Word)),
        Extlh => Some(alu::extract_high(a, b, Lane::Long)),
        Extqh => Some(alu::extract_high(a, b, Lane::Quad)),

        Mull | MullV => Some(alu::mull(a, b)),
        Mulq | MulqV => Some(a.wrapping_mul(b)),
        Umulh => Some(alu::umulh(a, b)),

        Sextb => Some(b as u8 as i8 as i64 as u64),
        Sextw => Some(b as u16 as i16 as i64 as u64),
        Ctpop => Some(b.count_ones() as u64),
        Ctlz => Some(b.leading_zeros() as u64),
        Cttz => Some(b.trailing_zeros() as u64),
        Perr => Some(alu::perr(a, b)),
        Unpkbw => Some(alu::unpkbw(b)),
        Unpkbl => Some(alu::unpkbl(b)),
        Pkwb => Some(alu::pkwb(b)),
        Pklb => Some(alu::pklb(b)),
        Minsb8 => Some(alu::minsb8(a, b)),
        Minsw4 => Some(alu::minsw4(a, b)),
        Minub8 => Some(alu::minub8(a, b)),
        Minuw4 => Some(alu::minuw4(a, b)),
        Maxsb8 => Some(alu::maxsb8(a, b)),
        Maxsw4 => Some(alu::maxsw4(a, b)),
        Maxub8 => Some(alu::maxub8(a, b)),
        Maxuw4 => Some(alu::maxuw4(a, b)),

        _ => return Err(unimplemented(at, op)),
    };

    let rc = f.rc();
    if rc != ZERO {
        if let Some(v) = res {
            cpu.regs.set(rc, v);
        }
    }
    Ok(())
}
