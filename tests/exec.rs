use pretty_assertions::assert_eq;

use alpha_rs::registers::{RA, SP, ZERO};
use alpha_rs::{CpuConfig, Fault, LoadedImage, Machine, RunStatus};

const BASE: u64 = 0x1_2000_0000;
const STACK_END: u64 = 0x0100_0000;
const RET: u32 = 0x6BFA_8001;
const NOP: u32 = 0x47FF_041F;

fn opr(op: u32, ra: u32, rb: u32, func: u32, rc: u32) -> u32 {
    (op << 26) | (ra << 21) | (rb << 16) | (func << 5) | rc
}

fn opl(op: u32, ra: u32, lit: u32, func: u32, rc: u32) -> u32 {
    (op << 26) | (ra << 21) | (lit << 13) | 0x1000 | (func << 5) | rc
}

fn mem(op: u32, ra: u32, rb: u32, disp: i16) -> u32 {
    (op << 26) | (ra << 21) | (rb << 16) | disp as u16 as u32
}

fn bra(op: u32, ra: u32, disp: i32) -> u32 {
    (op << 26) | (ra << 21) | (disp as u32 & 0x1F_FFFF)
}

fn machine(words: &[u32]) -> Machine {
    Machine::new(&LoadedImage::from_words(BASE, words), CpuConfig::default()).unwrap()
}

/// Runs `words` one instruction at a time from a fresh state.
fn stepped(words: &[u32], n: usize) -> Machine {
    let mut m = machine(words);
    m.reset();
    for _ in 0..n {
        m.step().unwrap();
    }
    m
}

#[test]
fn nop_then_ret_completes_with_registers_untouched() {
    let report = machine(&[NOP, RET]).run();
    assert_eq!(report.status, RunStatus::Halted);
    assert_eq!(report.steps, 2);
    assert_eq!(report.pc, STACK_END);
    assert_eq!(report.transcript, format!("pc={BASE:016x}: start\n\n---\ncompleted."));

    let mut expected = [0u64; 32];
    expected[RA as usize] = STACK_END;
    expected[SP as usize] = STACK_END;
    assert_eq!(report.registers, expected);
}

#[test]
fn console_store_emits_character() {
    let prog = [
        mem(0x09, 1, 31, 0x1000), // ldah t0,0x1000 -> console port
        mem(0x08, 2, 31, 0x41),   // lda t1,'A'
        mem(0x0e, 2, 1, 0),       // stb t1,0(t0)
        RET,
    ];
    let report = machine(&prog).run();
    assert!(report.succeeded());
    assert_eq!(report.output, "A");
    assert_eq!(report.transcript, format!("pc={BASE:016x}: start\nA\n---\ncompleted."));
}

#[test]
fn falling_off_text_faults_with_pc() {
    let report = machine(&[NOP]).run();
    let pc = BASE + 4;
    match &report.status {
        RunStatus::Faulted { pc: at, message } => {
            assert_eq!(*at, pc);
            assert_eq!(message, &Fault::InvalidPc { pc }.to_string());
            assert!(message.contains("0x0000000120000004"));
        }
        other => panic!("expected fault, got {other:?}"),
    }
    assert!(report.transcript.ends_with("invalid program counter\nexecution failed."));
}

#[test]
fn countdown_loop() {
    let prog = [
        mem(0x08, 1, 31, 5),         // lda t0,5
        opr(0x10, 2, 1, 0x20, 2),    // addq t1,t0,t1
        opl(0x10, 1, 1, 0x29, 1),    // subq t0,1,t0
        bra(0x3d, 1, -3),            // bne t0,loop
        RET,
    ];
    let report = machine(&prog).run();
    assert!(report.succeeded());
    assert_eq!(report.registers[2], 15);
    assert_eq!(report.registers[1], 0);
}

#[test]
fn bsr_links_next_pc() {
    let m = stepped(&[bra(0x34, 26, 1), NOP, NOP], 1);
    assert_eq!(m.cpu.pc, BASE + 8);
    assert_eq!(m.cpu.regs.get(RA), BASE + 4);
}

#[test]
fn br_to_zero_does_not_link() {
    let m = stepped(&[bra(0x30, 31, 1), NOP, NOP], 1);
    assert_eq!(m.cpu.pc, BASE + 8);
    assert_eq!(m.cpu.regs.get(ZERO), 0);
}

#[test]
fn jsr_uses_unmasked_base() {
    let prog = [
        mem(0x08, 27, 31, 0x13),                 // lda t12,0x13
        (0x1a << 26) | (26 << 21) | (27 << 16) | (1 << 14), // jsr ra,(t12)
    ];
    let m = stepped(&prog, 2);
    assert_eq!(m.cpu.pc, 0x13);
    assert_eq!(m.cpu.regs.get(RA), BASE + 8);
}

#[test]
fn loads_and_stores_on_stack() {
    let prog = [
        mem(0x08, 30, 30, -16),  // lda sp,-16(sp)
        mem(0x08, 1, 31, 0x1234),
        mem(0x2d, 1, 30, 8),     // stq t0,8(sp)
        mem(0x29, 2, 30, 8),     // ldq t1,8(sp)
        mem(0x0a, 3, 30, 8),     // ldbu t2,8(sp)
        mem(0x08, 4, 31, -1),    // lda t3,-1
        mem(0x2c, 4, 30, 0),     // stl t3,0(sp)
        mem(0x28, 5, 30, 0),     // ldl t4,0(sp)
        mem(0x0c, 6, 30, 2),     // ldwu t5,2(sp)
        mem(0x0d, 1, 30, 4),     // stw t0,4(sp)
        mem(0x0b, 7, 30, 5),     // ldq_u t6,5(sp)
    ];
    let m = stepped(&prog, prog.len());
    let r = |i| m.cpu.regs.get(i);
    assert_eq!(r(SP), STACK_END - 16);
    assert_eq!(r(2), 0x1234);
    assert_eq!(r(3), 0x34);
    assert_eq!(r(5), u64::MAX);
    assert_eq!(r(6), 0xFFFF);
    assert_eq!(r(7), 0x0000_1234_FFFF_FFFF);
}

#[test]
fn load_into_zero_touches_nothing() {
    // address 0 is unmapped, but a load into r31 is only a hint
    let m = stepped(&[mem(0x29, 31, 31, 0), mem(0x28, 31, 31, 0x40)], 2);
    assert_eq!(m.cpu.regs.get(ZERO), 0);
}

#[test]
fn floating_prefetch_is_a_no_op() {
    let lds = mem(0x22, 31, 30, -0x40); // lds f31,-0x40(sp)
    let ldt = mem(0x23, 31, 31, 0x80);  // ldt f31,0x80 (unmapped)
    assert_eq!(
        alpha_rs::render(BASE, lds).1,
        "lds f31,-0x40(sp) => prefetch_m -0x40(sp)"
    );
    let report = machine(&[lds, ldt, RET]).run();
    assert_eq!(report.status, RunStatus::Halted);
    assert_eq!(report.steps, 3);
}

#[test]
fn floating_load_into_live_register_is_unimplemented() {
    let report = machine(&[mem(0x23, 1, 30, -8), RET]).run();
    match report.status {
        RunStatus::Faulted { message, .. } => {
            assert!(message.contains("unimplemented instruction ldt"), "{message}")
        }
        other => panic!("expected fault, got {other:?}"),
    }
}

#[test]
fn unmapped_load_faults() {
    let report = machine(&[mem(0x29, 1, 31, 0x100), RET]).run();
    assert_eq!(
        report.status,
        RunStatus::Faulted {
            pc: BASE,
            message: Fault::Address { pc: BASE, addr: 0x100 }.to_string()
        }
    );
    assert!(report.transcript.ends_with("execution failed."));
}

#[test]
fn store_conditional_always_succeeds() {
    let prog = [mem(0x08, 1, 31, 9), mem(0x2f, 1, 30, -8), mem(0x29, 2, 30, -8)];
    let m = stepped(&prog, 3);
    assert_eq!(m.cpu.regs.get(1), 1);
    assert_eq!(m.cpu.regs.get(2), 9);
}

#[test]
fn cmov_leaves_destination_on_false() {
    let prog = [
        mem(0x08, 1, 31, 7),       // lda t0,7
        mem(0x08, 3, 31, 42),      // lda t2,42
        opr(0x11, 1, 1, 0x24, 3),  // cmoveq t0,t0,t2 (t0 != 0)
        opr(0x11, 1, 1, 0x26, 4),  // cmovne t0,t0,t3
    ];
    let m = stepped(&prog, 4);
    assert_eq!(m.cpu.regs.get(3), 42);
    assert_eq!(m.cpu.regs.get(4), 7);
}

#[test]
fn longword_ops_sign_extend() {
    let prog = [
        mem(0x09, 1, 31, 0x7fff),   // ldah t0,0x7fff
        mem(0x08, 1, 1, 0x7fff),    // lda t0,0x7fff(t0) -> 0x7fff7fff
        opr(0x10, 1, 1, 0x00, 2),   // addl t0,t0,t1
        opl(0x12, 1, 4, 0x39, 3),   // sll t0,4,t2
        opl(0x10, 31, 1, 0x09, 4),  // subl zero,1,t3
        opr(0x13, 1, 1, 0x30, 5),   // umulh t0,t0,t4
    ];
    let m = stepped(&prog, prog.len());
    assert_eq!(m.cpu.regs.get(1), 0x7fff_7fff);
    assert_eq!(m.cpu.regs.get(2), 0xFFFF_FFFF_FFFE_FFFE);
    assert_eq!(m.cpu.regs.get(3), 0x7_fff7_fff0);
    assert_eq!(m.cpu.regs.get(4), u64::MAX);
    assert_eq!(m.cpu.regs.get(5), 0);
}

#[test]
fn compares_and_byte_ops() {
    let prog = [
        mem(0x08, 1, 31, 0x1234),
        opl(0x10, 1, 0x12, 0x2d, 2), // cmpeq t0,0x12,t1
        opl(0x10, 31, 1, 0x1d, 3),   // cmpult zero,1,t2
        opl(0x12, 1, 1, 0x06, 4),    // extbl t0,1,t3
        opl(0x12, 1, 3, 0x0b, 5),    // insbl t0,3,t4
        opl(0x1c, 31, 0xff, 0x30, 6),// ctpop 0xff
        opl(0x1c, 31, 0x80, 0x00, 7),// sextb 0x80
    ];
    let m = stepped(&prog, prog.len());
    let r = |i| m.cpu.regs.get(i);
    assert_eq!(r(2), 0);
    assert_eq!(r(3), 1);
    assert_eq!(r(4), 0x12);
    assert_eq!(r(5), 0x3400_0000);
    assert_eq!(r(6), 8);
    assert_eq!(r(7), 0xFFFF_FFFF_FFFF_FF80);
}

#[test]
fn zero_register_stays_zero() {
    let prog = [
        opl(0x10, 31, 1, 0x20, 31), // addq zero,1,zero
        mem(0x08, 31, 31, 5),       // lda zero,5
        opl(0x11, 31, 0xff, 0x20, 31),
        mem(0x09, 31, 31, 1),       // ldah zero,1
    ];
    let m = stepped(&prog, prog.len());
    assert_eq!(m.cpu.regs.get(ZERO), 0);
}

#[test]
fn rpcc_reads_retired_count() {
    let m = stepped(&[NOP, NOP, 0x6000_c000 | (31 << 16) | (1 << 21)], 3);
    assert_eq!(m.cpu.regs.get(1), 2);
}

#[test]
fn step_limit_stops_infinite_loop() {
    let img = LoadedImage::from_words(BASE, &[bra(0x30, 31, -1)]);
    let config = CpuConfig { max_steps: Some(10), ..CpuConfig::default() };
    let report = Machine::new(&img, config).unwrap().run();
    assert_eq!(report.status, RunStatus::StepLimit);
    assert_eq!(report.steps, 10);
    assert!(!report.succeeded());
    assert!(report.transcript.ends_with("execution failed."));
}

#[test]
fn floating_operate_is_unimplemented() {
    let report = machine(&[opr(0x16, 1, 2, 0x0a0, 3), RET]).run();
    match report.status {
        RunStatus::Faulted { pc, message } => {
            assert_eq!(pc, BASE);
            assert!(message.contains("unimplemented instruction addt"), "{message}");
        }
        other => panic!("expected fault, got {other:?}"),
    }
}

#[test]
fn runs_are_independent() {
    let prog = [mem(0x08, 30, 30, -8), mem(0x2d, 26, 30, 0), mem(0x08, 30, 30, 8), RET];
    let mut m = machine(&prog);
    let first = m.run();
    let second = m.run();
    assert!(first.succeeded() && second.succeeded());
    assert_eq!(first.registers, second.registers);
    assert_eq!(first.transcript, second.transcript);
}
