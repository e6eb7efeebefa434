//! Instruction execution scenarios: flags, control flow, timing, and the
//! documented NMOS/CMOS differences.

use cpu_6502::flags::{B, C, D, I, N, U, V, Z};
use cpu_6502::{Bus, CpuError, Cpu6502, Sets, Step};

/// Flat 64KB RAM bus for testing.
struct TestBus {
    ram: [u8; 65536],
}

impl TestBus {
    fn new() -> Self {
        Self { ram: [0; 65536] }
    }

    fn load(&mut self, addr: u16, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            self.ram[addr as usize + i] = b;
        }
    }

    fn peek(&self, addr: u16) -> u8 {
        self.ram[addr as usize]
    }
}

impl Bus for TestBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.ram[addr as usize] = value;
    }
}

fn nmos() -> Cpu6502 {
    Cpu6502::new(Sets::CPU_6502).unwrap()
}

fn cmos() -> Cpu6502 {
    Cpu6502::new(Sets::CPU_R65C02).unwrap()
}

/// Run one instruction placed at $0200.
fn step_one(cpu: &mut Cpu6502, bus: &mut TestBus, bytes: &[u8]) -> Step {
    bus.load(0x0200, bytes);
    cpu.regs.pc = 0x0200;
    cpu.step(bus).unwrap()
}

#[test]
fn adc_with_carry_in() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    cpu.regs.a = 0x01;
    cpu.regs.p.set(C);
    step_one(&mut cpu, &mut bus, &[0x69, 0x02]); // adc #$02
    assert_eq!(cpu.regs.a, 0x04);
    assert!(!cpu.regs.p.test(N));
    assert!(!cpu.regs.p.test(Z));
    assert!(!cpu.regs.p.test(C));
    assert!(!cpu.regs.p.test(V));
    assert_eq!(cpu.regs.pc, 0x0202);
}

#[test]
fn adc_signed_overflow() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    cpu.regs.a = 0x7f;
    step_one(&mut cpu, &mut bus, &[0x69, 0x01]); // adc #$01
    assert_eq!(cpu.regs.a, 0x80);
    assert!(cpu.regs.p.test(N));
    assert!(!cpu.regs.p.test(Z));
    assert!(!cpu.regs.p.test(C));
    assert!(cpu.regs.p.test(V));
}

#[test]
fn sbc_borrow_semantics() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    cpu.regs.a = 0x10;
    cpu.regs.p.set(C); // no borrow in
    step_one(&mut cpu, &mut bus, &[0xe9, 0x20]); // sbc #$20
    assert_eq!(cpu.regs.a, 0xf0);
    assert!(!cpu.regs.p.test(C)); // borrow out
    assert!(cpu.regs.p.test(N));
    assert!(!cpu.regs.p.test(V));
}

#[test]
fn cmp_sets_carry_zero_negative_only() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    cpu.regs.a = 0x40;
    cpu.regs.p.set(V);
    step_one(&mut cpu, &mut bus, &[0xc9, 0x40]); // cmp #$40
    assert!(cpu.regs.p.test(C));
    assert!(cpu.regs.p.test(Z));
    assert!(!cpu.regs.p.test(N));
    assert!(cpu.regs.p.test(V)); // untouched
    assert_eq!(cpu.regs.a, 0x40); // untouched
}

#[test]
fn jsr_rts_round_trip() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    bus.load(0x1000, &[0x20, 0x34, 0x12]); // jsr $1234
    bus.load(0x1234, &[0x60]); // rts
    cpu.regs.pc = 0x1000;
    cpu.regs.s = 0xff;

    assert_eq!(cpu.step(&mut bus).unwrap(), Step::Continue);
    assert_eq!(cpu.regs.pc, 0x1234);
    assert_eq!(cpu.regs.s, 0xfd);
    // return address minus one, high byte pushed first
    assert_eq!(bus.peek(0x01ff), 0x10);
    assert_eq!(bus.peek(0x01fe), 0x02);

    assert_eq!(cpu.step(&mut bus).unwrap(), Step::Continue);
    assert_eq!(cpu.regs.pc, 0x1003);
    assert_eq!(cpu.regs.s, 0xff);
}

#[test]
fn jmp_indirect_nmos_page_wrap() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    bus.write(0x10ff, 0xad);
    bus.write(0x1000, 0xde);
    bus.write(0x1100, 0xcc);
    step_one(&mut cpu, &mut bus, &[0x6c, 0xff, 0x10]); // jmp ($10ff)
    assert_eq!(cpu.regs.pc, 0xdead);
    assert_eq!(cpu.cycle_count(), 5);
}

#[test]
fn jmp_indirect_cmos_is_fixed_and_slower() {
    let mut cpu = cmos();
    let mut bus = TestBus::new();
    bus.write(0x10ff, 0xad);
    bus.write(0x1000, 0xde);
    bus.write(0x1100, 0xcc);
    step_one(&mut cpu, &mut bus, &[0x6c, 0xff, 0x10]);
    assert_eq!(cpu.regs.pc, 0xccad);
    assert_eq!(cpu.cycle_count(), 6);
}

#[test]
fn absolute_x_page_cross_costs_one_cycle() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    cpu.regs.x = 0x20;
    step_one(&mut cpu, &mut bus, &[0xbd, 0x00, 0x12]); // lda $1200,x
    assert_eq!(cpu.cycle_count(), 4);

    let mut cpu = nmos();
    cpu.regs.x = 0x20;
    step_one(&mut cpu, &mut bus, &[0xbd, 0xf0, 0x12]); // lda $12f0,x crosses
    assert_eq!(cpu.cycle_count(), 5);
}

#[test]
fn store_never_pays_page_cross() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    cpu.regs.x = 0x20;
    cpu.regs.a = 0x99;
    step_one(&mut cpu, &mut bus, &[0x9d, 0xf0, 0x12]); // sta $12f0,x
    assert_eq!(cpu.cycle_count(), 5);
    assert_eq!(bus.peek(0x1310), 0x99);
}

#[test]
fn indexed_rmw_penalty_is_forced_on_nmos_only() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    cpu.regs.x = 0x00;
    step_one(&mut cpu, &mut bus, &[0x1e, 0x00, 0x12]); // asl $1200,x no cross
    assert_eq!(cpu.cycle_count(), 7);

    let mut cpu = cmos();
    cpu.regs.x = 0x00;
    step_one(&mut cpu, &mut bus, &[0x1e, 0x00, 0x12]);
    assert_eq!(cpu.cycle_count(), 6);

    let mut cpu = cmos();
    cpu.regs.x = 0x20;
    step_one(&mut cpu, &mut bus, &[0x1e, 0xf0, 0x12]); // crossing
    assert_eq!(cpu.cycle_count(), 7);
}

#[test]
fn branch_timing() {
    // not taken: 2 cycles
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    cpu.regs.p.set(Z);
    step_one(&mut cpu, &mut bus, &[0xd0, 0x10]); // bne +16
    assert_eq!(cpu.cycle_count(), 2);
    assert_eq!(cpu.regs.pc, 0x0202);

    // taken, same page: 3 cycles
    let mut cpu = nmos();
    cpu.regs.p.clear(Z);
    step_one(&mut cpu, &mut bus, &[0xd0, 0x10]);
    assert_eq!(cpu.cycle_count(), 3);
    assert_eq!(cpu.regs.pc, 0x0212);

    // taken, crossing a page: 4 cycles
    let mut cpu = nmos();
    cpu.regs.p.clear(Z);
    bus.load(0x02f0, &[0xd0, 0x20]); // bne +32 -> 0x0312
    cpu.regs.pc = 0x02f0;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.cycle_count(), 4);
    assert_eq!(cpu.regs.pc, 0x0312);
}

#[test]
fn branch_to_self_halts() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    cpu.regs.p.clear(Z);
    let step = step_one(&mut cpu, &mut bus, &[0xd0, 0xfe]); // bne *
    assert_eq!(step, Step::Halt { pc: 0x0200 });
    assert!(cpu.is_halted());
}

#[test]
fn jmp_to_self_halts() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    let step = step_one(&mut cpu, &mut bus, &[0x4c, 0x00, 0x02]); // jmp $0200
    assert_eq!(step, Step::Halt { pc: 0x0200 });
}

#[test]
fn undefined_opcode_is_an_error() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x02]);
    cpu.regs.pc = 0x0200;
    assert_eq!(
        cpu.step(&mut bus),
        Err(CpuError::UndefinedOpcode {
            opcode: 0x02,
            pc: 0x0200
        })
    );
    assert!(cpu.is_halted());
}

#[test]
fn stack_pushes_wrap_and_pop_in_reverse() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    bus.load(
        0x0200,
        &[
            0xa9, 0x11, 0x48, // lda #$11, pha
            0xa9, 0x22, 0x48, // lda #$22, pha
            0x68, // pla
            0x68, // pla
        ],
    );
    cpu.regs.pc = 0x0200;
    cpu.regs.s = 0x00; // force wrap through $0100/$01ff
    for _ in 0..4 {
        cpu.step(&mut bus).unwrap();
    }
    assert_eq!(bus.peek(0x0100), 0x11);
    assert_eq!(bus.peek(0x01ff), 0x22);
    assert_eq!(cpu.regs.s, 0xfe);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0x22);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.a, 0x11);
    assert_eq!(cpu.regs.s, 0x00);
}

#[test]
fn php_sets_break_and_reserved_on_the_stack() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    cpu.regs.p.0 = C | N; // B and U clear in the live register
    step_one(&mut cpu, &mut bus, &[0x08]); // php
    assert_eq!(bus.peek(0x01ff), C | N | B | U);
}

#[test]
fn plp_forces_break_and_reserved_in_emulation_mode() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    bus.write(0x01ff, 0x01); // only C set in the image
    cpu.regs.s = 0xfe;
    step_one(&mut cpu, &mut bus, &[0x28]); // plp
    assert_eq!(cpu.regs.p.0, 0x01 | B | U);
}

#[test]
fn brk_pushes_state_and_vectors_through_fffe() {
    let mut bus = TestBus::new();
    bus.write(0xfffe, 0x34);
    bus.write(0xffff, 0x12);

    let mut cpu = nmos();
    cpu.regs.p.0 = C | D | U | B;
    bus.load(0x0200, &[0x00, 0xff]); // brk + signature byte
    cpu.regs.pc = 0x0200;
    cpu.step(&mut bus).unwrap();

    assert_eq!(cpu.regs.pc, 0x1234);
    assert!(cpu.regs.p.test(I));
    assert!(cpu.regs.p.test(D)); // NMOS leaves decimal alone
    // pc past the signature byte, then status with B set
    assert_eq!(bus.peek(0x01ff), 0x02);
    assert_eq!(bus.peek(0x01fe), 0x02);
    assert_eq!(bus.peek(0x01fd), C | D | U | B);
    assert_eq!(cpu.cycle_count(), 7);

    let mut cpu = cmos();
    cpu.regs.p.set(D);
    bus.load(0x0200, &[0x00, 0xff]);
    cpu.regs.pc = 0x0200;
    cpu.step(&mut bus).unwrap();
    assert!(!cpu.regs.p.test(D)); // CMOS clears decimal
}

#[test]
fn rti_restores_status_and_pc_without_increment() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    // stack: p, pc low, pc high (popped in that order)
    bus.write(0x01fd, C | N);
    bus.write(0x01fe, 0x56);
    bus.write(0x01ff, 0x34);
    cpu.regs.s = 0xfc;
    step_one(&mut cpu, &mut bus, &[0x40]); // rti
    assert_eq!(cpu.regs.pc, 0x3456);
    assert_eq!(cpu.regs.p.0, C | N | B | U);
}

#[test]
fn synthetic_rts_returns_through_the_stack() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    bus.write(0x01fe, 0x33);
    bus.write(0x01ff, 0x12);
    cpu.regs.s = 0xfd;
    cpu.execute_rts(&mut bus);
    assert_eq!(cpu.regs.pc, 0x1234);
    assert_eq!(cpu.regs.s, 0xff);
}

#[test]
fn zero_page_indexing_wraps_in_the_zero_page() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    bus.write(0x007f, 0x42);
    cpu.regs.x = 0xff;
    step_one(&mut cpu, &mut bus, &[0xb5, 0x80]); // lda $80,x
    assert_eq!(cpu.regs.a, 0x42);
}

#[test]
fn zp_x_indirect_pointer_wraps_in_the_zero_page() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    bus.write(0x00ff, 0x00);
    bus.write(0x0000, 0x13); // high byte comes from $00, not $100
    bus.write(0x1300, 0x99);
    cpu.regs.x = 0x0f;
    step_one(&mut cpu, &mut bus, &[0xa1, 0xf0]); // lda ($f0,x)
    assert_eq!(cpu.regs.a, 0x99);
}

#[test]
fn bit_immediate_only_touches_zero() {
    let mut cpu = cmos();
    let mut bus = TestBus::new();
    cpu.regs.a = 0x01;
    cpu.regs.p.clear(N);
    cpu.regs.p.clear(V);
    step_one(&mut cpu, &mut bus, &[0x89, 0xc0]); // bit #$c0
    assert!(cpu.regs.p.test(Z));
    assert!(!cpu.regs.p.test(N));
    assert!(!cpu.regs.p.test(V));

    let mut cpu = cmos();
    cpu.regs.a = 0x01;
    bus.write(0x0040, 0xc0);
    step_one(&mut cpu, &mut bus, &[0x24, 0x40]); // bit $40
    assert!(cpu.regs.p.test(Z));
    assert!(cpu.regs.p.test(N));
    assert!(cpu.regs.p.test(V));
}

#[test]
fn trb_tsb_update_memory_and_zero() {
    let mut cpu = cmos();
    let mut bus = TestBus::new();
    bus.write(0x0040, 0b1100_1100);
    cpu.regs.a = 0b0000_1111;
    step_one(&mut cpu, &mut bus, &[0x14, 0x40]); // trb $40
    assert_eq!(bus.peek(0x0040), 0b1100_0000);
    assert!(!cpu.regs.p.test(Z)); // a & m was non-zero

    let mut cpu = cmos();
    bus.write(0x0040, 0b1100_0000);
    cpu.regs.a = 0b0000_1111;
    step_one(&mut cpu, &mut bus, &[0x04, 0x40]); // tsb $40
    assert_eq!(bus.peek(0x0040), 0b1100_1111);
    assert!(cpu.regs.p.test(Z));
}

#[test]
fn rockwell_bit_instructions() {
    let mut cpu = cmos();
    let mut bus = TestBus::new();
    bus.write(0x0040, 0xff);
    step_one(&mut cpu, &mut bus, &[0x37, 0x40]); // rmb3 $40
    assert_eq!(bus.peek(0x0040), 0xf7);

    let mut cpu = cmos();
    bus.write(0x0040, 0x00);
    step_one(&mut cpu, &mut bus, &[0xd7, 0x40]); // smb5 $40
    assert_eq!(bus.peek(0x0040), 0x20);

    // bbr4: branch taken when bit 4 is clear
    let mut cpu = cmos();
    bus.write(0x0040, 0x00);
    step_one(&mut cpu, &mut bus, &[0x4f, 0x40, 0x10]); // bbr4 $40,+16
    assert_eq!(cpu.regs.pc, 0x0213);

    // bbs4: not taken when bit 4 is clear
    let mut cpu = cmos();
    step_one(&mut cpu, &mut bus, &[0xcf, 0x40, 0x10]); // bbs4 $40,+16
    assert_eq!(cpu.regs.pc, 0x0203);
}

#[test]
fn cmos_stz_and_bra() {
    let mut cpu = cmos();
    let mut bus = TestBus::new();
    bus.write(0x1234, 0x77);
    step_one(&mut cpu, &mut bus, &[0x9c, 0x34, 0x12]); // stz $1234
    assert_eq!(bus.peek(0x1234), 0x00);

    let mut cpu = cmos();
    step_one(&mut cpu, &mut bus, &[0x80, 0x10]); // bra +16
    assert_eq!(cpu.regs.pc, 0x0212);
    assert_eq!(cpu.cycle_count(), 3);
}

#[test]
fn counters_accumulate_and_reset() {
    let mut cpu = nmos();
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xea, 0xea, 0xea]); // nop x3
    cpu.regs.pc = 0x0200;
    for _ in 0..3 {
        cpu.step(&mut bus).unwrap();
    }
    assert_eq!(cpu.instruction_count(), 3);
    assert_eq!(cpu.cycle_count(), 6);
    cpu.reset_counters();
    assert_eq!(cpu.instruction_count(), 0);
    assert_eq!(cpu.cycle_count(), 0);
}
