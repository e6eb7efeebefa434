//! 6502 CPU core: fetch-decode-execute against a [`Bus`].
//!
//! The core is table-driven: the opcode byte selects an instruction-set
//! [`Info`] row, the addressing mode produces up to two effective values
//! (`ea1` for memory operands, `ea2` for branch targets), and a semantic
//! routine keyed on [`Inst`] performs the operation. Cycle accounting is
//! seeded from the row's static timing and adjusted by the dynamic penalties
//! (page crossings, forced NMOS indexed read-modify-write, taken branches,
//! CMOS decimal fix-up).

use log::{error, warn};
use thiserror::Error;

use crate::instruction_set::{Info, Inst, InstructionSet, InstructionSetError, Mode, Sets};
use crate::registers::{Registers, B, C, D, I, N, U, V, Z};
use crate::Bus;

/// Base address of the stack page.
pub const STACK_BASE_ADDRESS: u16 = 0x0100;

/// Named interrupt and reset vectors.
pub const VECTOR_NMI: u16 = 0xfffa;
pub const VECTOR_RESET: u16 = 0xfffc;
pub const VECTOR_IRQ: u16 = 0xfffe;

/// Outcome of one instruction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Instruction retired; execution continues.
    Continue,
    /// The CPU latched a halt: a branch or jump targeted its own
    /// instruction, or an interrupt vector pointed at $0000.
    Halt {
        /// Address of the halting instruction.
        pc: u16,
    },
}

/// Fatal execution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("undefined opcode {opcode:02x} at {pc:04x}")]
    UndefinedOpcode { opcode: u8, pc: u16 },
    /// A scaffolding-only instruction (WDC/65CE02 extension) was dispatched.
    #[error("instruction {0:?} is not implemented")]
    UnimplementedInstruction(Inst),
}

/// The 6502 CPU.
///
/// Registers are public for the benefit of the surrounding machine, which
/// reads and mutates them while servicing operating-system traps.
pub struct Cpu6502 {
    /// CPU registers.
    pub regs: Registers,

    instruction_set: InstructionSet,

    // Family behavior switches, all derived from the CMOS profile bit.
    cmos: bool,
    absolute_ind_fixed: bool,
    interrupt_clears_decimal: bool,
    bcd_cmos: bool,

    halt_at: Option<u16>,
    instruction_count: u64,
    cycle_count: u64,
    /// Cycles charged by the instruction currently executing.
    instruction_cycles: u8,
    /// Address of the opcode currently executing.
    instruction_pc: u16,
    trace: bool,
}

impl Cpu6502 {
    /// Create a CPU for the given instruction-set profile, in reset state.
    pub fn new(sets: Sets) -> Result<Self, InstructionSetError> {
        let cmos = sets.contains(Sets::CMOS);
        Ok(Self {
            regs: Registers::new(),
            instruction_set: InstructionSet::new(sets)?,
            cmos,
            absolute_ind_fixed: cmos,
            interrupt_clears_decimal: cmos,
            bcd_cmos: cmos,
            halt_at: None,
            instruction_count: 0,
            cycle_count: 0,
            instruction_cycles: 0,
            instruction_pc: 0,
            trace: false,
        })
    }

    /// The instruction-set database backing this CPU.
    #[must_use]
    pub fn instruction_set(&self) -> &InstructionSet {
        &self.instruction_set
    }

    /// Reset the instruction and cycle counters.
    pub fn reset_counters(&mut self) {
        self.instruction_count = 0;
        self.cycle_count = 0;
    }

    /// Instructions retired since construction or the last counter reset.
    #[must_use]
    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    /// Cycles consumed since construction or the last counter reset.
    #[must_use]
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Enable or disable per-instruction trace output.
    pub fn set_trace(&mut self, value: bool) {
        self.trace = value;
    }

    /// Whether the halt latch is set.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halt_at.is_some()
    }

    /// Execute one instruction.
    ///
    /// Returns [`Step::Halt`] when the halt latch is set by this instruction
    /// (tight-loop detection), and an error for opcodes the active profile
    /// does not define.
    pub fn step(&mut self, bus: &mut impl Bus) -> Result<Step, CpuError> {
        let pc = self.regs.pc;
        self.instruction_pc = pc;

        let opcode = bus.read(pc);
        let Some(&info) = self.instruction_set.get(opcode) else {
            error!("undefined opcode {opcode:02x} at {pc:04x}");
            self.halt_at = Some(pc);
            return Err(CpuError::UndefinedOpcode { opcode, pc });
        };

        self.instruction_cycles = info.base_cycles + info.mode.added_cycles();
        if self.cmos && info.cmos_extra_cycle {
            self.instruction_cycles += 1;
        }

        if self.trace {
            let bytes = [
                opcode,
                bus.read(pc.wrapping_add(1)),
                bus.read(pc.wrapping_add(2)),
            ];
            println!("*** {pc:04x} {}", self.instruction_set.disassemble(pc, bytes));
        }

        self.regs.pc = pc.wrapping_add(1);
        let (ea1, ea2) = self.effective_address(bus, &info);
        self.execute(bus, &info, ea1, ea2)?;

        self.instruction_count += 1;
        self.cycle_count += u64::from(self.instruction_cycles);
        self.trace_registers();

        match self.halt_at {
            Some(pc) => Ok(Step::Halt { pc }),
            None => Ok(Step::Continue),
        }
    }

    /// Drive the CPU through one RTS outside the normal instruction stream,
    /// returning from a trapped system-call vector.
    pub fn execute_rts(&mut self, bus: &mut impl Bus) {
        self.rts(bus);
        self.trace_registers();
    }

    fn trace_registers(&mut self) {
        if self.trace {
            println!("--- cycle {}, {}", self.cycle_count, self.regs);
        }
    }

    // =========================================================================
    // Effective-address computation
    // =========================================================================

    /// Resolve the operand through its addressing mode, advancing `pc` past
    /// the operand bytes and charging any page-crossing penalty.
    ///
    /// Returns `(ea1, ea2)`: the memory operand address and the branch
    /// target. Only `ZpRelative` uses both.
    fn effective_address(&mut self, bus: &mut impl Bus, info: &Info) -> (u16, u16) {
        let mut ea1: u16 = 0;
        let mut ea2: u16 = 0;
        match info.mode {
            Mode::Implied | Mode::Accumulator => {}
            Mode::Immediate => {
                ea1 = self.regs.pc;
                self.regs.pc = self.regs.pc.wrapping_add(1);
            }
            Mode::ZeroPage => {
                ea1 = u16::from(self.fetch(bus));
            }
            Mode::ZeroPageX => {
                let base = self.fetch(bus);
                ea1 = u16::from(base.wrapping_add(self.regs.x));
            }
            Mode::ZeroPageY => {
                let base = self.fetch(bus);
                ea1 = u16::from(base.wrapping_add(self.regs.y));
            }
            Mode::ZpInd => {
                let ptr = self.fetch(bus);
                ea1 = self.read_zp_word(bus, ptr);
            }
            Mode::ZpXInd => {
                let ptr = self.fetch(bus).wrapping_add(self.regs.x);
                ea1 = self.read_zp_word(bus, ptr);
            }
            Mode::ZpIndY => {
                let ptr = self.fetch(bus);
                let base = self.read_zp_word(bus, ptr);
                ea1 = base.wrapping_add(u16::from(self.regs.y));
                if info.page_crossing_extra_cycle && (ea1 & 0xff00) != (base & 0xff00) {
                    self.instruction_cycles += 1;
                }
            }
            Mode::Absolute => {
                ea1 = self.fetch_word(bus);
            }
            Mode::AbsoluteX => {
                let base = self.fetch_word(bus);
                ea1 = base.wrapping_add(u16::from(self.regs.x));
                if (!self.cmos && info.nmos_extra_cycle_forced)
                    || (info.page_crossing_extra_cycle && (ea1 & 0xff00) != (base & 0xff00))
                {
                    self.instruction_cycles += 1;
                }
            }
            Mode::AbsoluteY => {
                let base = self.fetch_word(bus);
                ea1 = base.wrapping_add(u16::from(self.regs.y));
                if info.page_crossing_extra_cycle && (ea1 & 0xff00) != (base & 0xff00) {
                    self.instruction_cycles += 1;
                }
            }
            Mode::AbsoluteInd => {
                let base = self.fetch_word(bus);
                ea1 = u16::from(bus.read(base));
                let high_addr = if self.absolute_ind_fixed {
                    // CMOS increments the entire pointer
                    base.wrapping_add(1)
                } else {
                    // NMOS only increments the low byte
                    (base & 0xff00) | (base.wrapping_add(1) & 0x00ff)
                };
                ea1 |= u16::from(bus.read(high_addr)) << 8;
            }
            Mode::AbsXInd => {
                let base = self.fetch_word(bus).wrapping_add(u16::from(self.regs.x));
                ea1 = self.read_word(bus, base);
            }
            Mode::ZpRelative => {
                ea1 = u16::from(self.fetch(bus));
                ea2 = self.relative_target(bus);
            }
            Mode::Relative => {
                ea2 = self.relative_target(bus);
            }
            Mode::Relative16 => {
                let offset = self.fetch_word(bus);
                ea2 = self.regs.pc.wrapping_add(offset);
            }
            Mode::StVecIndY => {
                let offset = self.fetch(bus);
                let ptr = STACK_BASE_ADDRESS
                    .wrapping_add(u16::from(self.regs.s))
                    .wrapping_add(u16::from(offset));
                ea1 = self
                    .read_word(bus, ptr)
                    .wrapping_add(u16::from(self.regs.y));
            }
        }
        (ea1, ea2)
    }

    /// Fetch the next byte at `pc` and increment `pc`.
    fn fetch(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    /// Fetch a 16-bit word (little-endian) at `pc`.
    fn fetch_word(&mut self, bus: &mut impl Bus) -> u16 {
        let low = self.fetch(bus);
        let high = self.fetch(bus);
        u16::from_le_bytes([low, high])
    }

    /// Read a 16-bit word from memory (little-endian).
    fn read_word(&mut self, bus: &mut impl Bus, addr: u16) -> u16 {
        let low = bus.read(addr);
        let high = bus.read(addr.wrapping_add(1));
        u16::from_le_bytes([low, high])
    }

    /// Read a 16-bit word from the zero page; the pointer wraps within it.
    fn read_zp_word(&mut self, bus: &mut impl Bus, ptr: u8) -> u16 {
        let low = bus.read(u16::from(ptr));
        let high = bus.read(u16::from(ptr.wrapping_add(1)));
        u16::from_le_bytes([low, high])
    }

    /// Fetch a branch displacement and resolve it against the post-fetch pc.
    fn relative_target(&mut self, bus: &mut impl Bus) -> u16 {
        let offset = self.fetch(bus) as i8;
        self.regs.pc.wrapping_add(offset as u16)
    }

    // =========================================================================
    // Stack, branching, vectors
    // =========================================================================

    fn stack_push(&mut self, bus: &mut impl Bus, value: u8) {
        let addr = STACK_BASE_ADDRESS | u16::from(self.regs.s);
        self.regs.s = self.regs.s.wrapping_sub(1);
        bus.write(addr, value);
    }

    fn stack_pop(&mut self, bus: &mut impl Bus) -> u8 {
        self.regs.s = self.regs.s.wrapping_add(1);
        bus.read(STACK_BASE_ADDRESS | u16::from(self.regs.s))
    }

    fn halt(&mut self, at: u16) {
        warn!("halted at instruction at {at:04x}");
        self.halt_at = Some(at);
    }

    /// Take a branch: one extra cycle, two when crossing a page. A branch to
    /// its own instruction is a tight infinite loop and latches the halt.
    fn branch(&mut self, target: u16) {
        self.instruction_cycles += 1;
        if (self.regs.pc & 0xff00) != (target & 0xff00) {
            self.instruction_cycles += 1;
        }
        if target == self.instruction_pc {
            warn!("branch to self at {target:04x}");
            self.halt(target);
        }
        self.regs.pc = target;
    }

    fn branch_if(&mut self, condition: bool, target: u16) {
        if condition {
            self.branch(target);
        }
    }

    /// Push state and jump through an interrupt vector.
    fn go_vector(&mut self, bus: &mut impl Bus, vector: u16, brk: bool) {
        if vector == VECTOR_RESET {
            self.regs.s = self.regs.s.wrapping_sub(3);
        } else {
            self.stack_push(bus, (self.regs.pc >> 8) as u8);
            self.stack_push(bus, (self.regs.pc & 0xff) as u8);
            let mut p = self.regs.p.0;
            if self.regs.e {
                p |= U;
                if brk {
                    p |= B;
                } else {
                    p &= !B;
                }
            }
            self.stack_push(bus, p);
        }
        self.regs.p.set(I);
        if self.interrupt_clears_decimal {
            self.regs.p.clear(D);
        }
        self.regs.pc = self.read_word(bus, vector);
        if self.regs.pc == 0x0000 {
            warn!("vector {vector:04x} points at 0000");
            self.halt(self.instruction_pc);
        }
    }

    // =========================================================================
    // ALU helpers
    // =========================================================================

    /// ADC - add with carry, binary or decimal per the D flag.
    ///
    /// Decimal mode follows the NMOS corrective-adder model (US patent
    /// 3,991,307, Peddle et al.): each nibble is adjusted by +6 on digit
    /// carry, N and V are taken from the pre-correction intermediates and Z
    /// from the binary sum. CMOS recomputes N and Z from the corrected
    /// result and spends an extra cycle doing it.
    fn adc(&mut self, operand: u8) {
        let carry_in = u16::from(self.regs.p.test(C));
        let a = u16::from(self.regs.a);
        let m = u16::from(operand);

        let binary_sum = a + m + carry_in;
        let binary_sum_7_bit = (a & 0x7f) + (m & 0x7f) + carry_in;
        let carry_8 = binary_sum > 0xff;
        let carry_7 = binary_sum_7_bit > 0x7f;
        let binary_result = (binary_sum & 0xff) as u8;

        if !self.regs.p.test(D) {
            self.regs.set_nz(binary_result);
            self.regs.p.assign(C, carry_8);
            self.regs.p.assign(V, carry_8 != carry_7);
            self.regs.a = binary_result;
            return;
        }

        let mut lsd = (a & 0x0f) + (m & 0x0f) + carry_in;
        let mut msd = (a >> 4) + (m >> 4);
        let carry_4 = lsd > 0x09;
        if carry_4 {
            lsd += 0x06;
            msd += 0x01;
        }
        if !self.bcd_cmos {
            let partial = ((msd << 4) | (lsd & 0x0f)) as u8;
            self.regs.p.assign(N, partial & 0x80 != 0);
            self.regs.p.assign(Z, binary_result == 0);
        }
        let signed_msd = bcd_digit_sign_extend((a >> 4) as u8)
            + bcd_digit_sign_extend((m >> 4) as u8)
            + i8::from(carry_4);
        self.regs.p.assign(V, !(-8..=7).contains(&signed_msd));
        if msd > 0x09 {
            msd += 0x06;
        }
        self.regs.p.assign(C, msd > 0x0f);
        let result = ((msd << 4) | (lsd & 0x0f)) as u8;
        self.regs.a = result;
        if self.bcd_cmos {
            self.regs.set_nz(result);
            self.instruction_cycles += 1;
        }
    }

    /// SBC - subtract with borrow: ADC of the complemented operand, with the
    /// decimal correction running subtractively.
    fn sbc(&mut self, operand: u8) {
        let operand = operand ^ 0xff;
        let carry_in = u16::from(self.regs.p.test(C));
        let a = u16::from(self.regs.a);
        let m = u16::from(operand);

        let sum = a + m + carry_in;
        let sum_7_bit = (a & 0x7f) + (m & 0x7f) + carry_in;
        let carry_8 = sum > 0xff;
        let carry_7 = sum_7_bit > 0x7f;
        let binary_result = (sum & 0xff) as u8;

        self.regs.set_nz(binary_result);
        self.regs.p.assign(C, carry_8);
        self.regs.p.assign(V, carry_8 != carry_7);

        if !self.regs.p.test(D) {
            self.regs.a = binary_result;
            return;
        }

        let sum_4_bit = (a & 0x0f) + (m & 0x0f) + carry_in;
        let carry_4 = sum_4_bit > 0x0f;
        let mut result = u16::from(binary_result);
        if !carry_4 {
            if self.bcd_cmos {
                result = (result + 0xfa) & 0xff;
            } else {
                result = (result & 0xf0) | ((result + 0xfa) & 0x0f);
            }
        }
        if !carry_8 {
            result = (result + 0xa0) & 0xff;
        }
        let result = result as u8;
        if self.bcd_cmos {
            self.regs.set_nz(result);
            self.instruction_cycles += 1;
        }
        self.regs.a = result;
    }

    /// CMP/CPX/CPY - compare register with operand; A + ~M + 1, V untouched.
    fn compare(&mut self, register: u8, operand: u8) {
        let result = u16::from(register) + u16::from(operand ^ 0xff) + 1;
        self.regs.p.assign(C, result > 0xff);
        self.regs.set_nz((result & 0xff) as u8);
    }

    /// ASL - arithmetic shift left.
    fn asl(&mut self, value: u8) -> u8 {
        self.regs.p.assign(C, value & 0x80 != 0);
        let result = value << 1;
        self.regs.set_nz(result);
        result
    }

    /// LSR - logical shift right.
    fn lsr(&mut self, value: u8) -> u8 {
        self.regs.p.assign(C, value & 0x01 != 0);
        let result = value >> 1;
        self.regs.set_nz(result);
        result
    }

    /// ROL - rotate left through carry.
    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.regs.p.test(C));
        self.regs.p.assign(C, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.regs.set_nz(result);
        result
    }

    /// ROR - rotate right through carry.
    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = if self.regs.p.test(C) { 0x80 } else { 0 };
        self.regs.p.assign(C, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.regs.set_nz(result);
        result
    }

    /// Read the read-modify-write operand: the accumulator or memory.
    fn rmw_read(&mut self, bus: &mut impl Bus, info: &Info, ea: u16) -> u8 {
        if info.mode == Mode::Accumulator {
            self.regs.a
        } else {
            bus.read(ea)
        }
    }

    /// Write the read-modify-write result back where it came from.
    fn rmw_write(&mut self, bus: &mut impl Bus, info: &Info, ea: u16, value: u8) {
        if info.mode == Mode::Accumulator {
            self.regs.a = value;
        } else {
            bus.write(ea, value);
        }
    }

    fn rts(&mut self, bus: &mut impl Bus) {
        let low = self.stack_pop(bus);
        let high = self.stack_pop(bus);
        self.regs.pc = u16::from_le_bytes([low, high]).wrapping_add(1);
    }

    /// Pop the status register; emulation mode forces B and the reserved bit.
    fn pop_status(&mut self, bus: &mut impl Bus) {
        let p = self.stack_pop(bus);
        self.regs.p.0 = if self.regs.e { p | B | U } else { p };
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn execute(
        &mut self,
        bus: &mut impl Bus,
        info: &Info,
        ea1: u16,
        ea2: u16,
    ) -> Result<(), CpuError> {
        match info.inst {
            // Load/store
            Inst::Lda => {
                self.regs.a = bus.read(ea1);
                self.regs.set_nz(self.regs.a);
            }
            Inst::Ldx => {
                self.regs.x = bus.read(ea1);
                self.regs.set_nz(self.regs.x);
            }
            Inst::Ldy => {
                self.regs.y = bus.read(ea1);
                self.regs.set_nz(self.regs.y);
            }
            Inst::Sta => bus.write(ea1, self.regs.a),
            Inst::Stx => bus.write(ea1, self.regs.x),
            Inst::Sty => bus.write(ea1, self.regs.y),
            Inst::Stz => bus.write(ea1, 0x00),

            // Transfers
            Inst::Tax => {
                self.regs.x = self.regs.a;
                self.regs.set_nz(self.regs.x);
            }
            Inst::Tay => {
                self.regs.y = self.regs.a;
                self.regs.set_nz(self.regs.y);
            }
            Inst::Txa => {
                self.regs.a = self.regs.x;
                self.regs.set_nz(self.regs.a);
            }
            Inst::Tya => {
                self.regs.a = self.regs.y;
                self.regs.set_nz(self.regs.a);
            }
            Inst::Tsx => {
                self.regs.x = self.regs.s;
                self.regs.set_nz(self.regs.x);
            }
            Inst::Txs => self.regs.s = self.regs.x,

            // Stack
            Inst::Pha => self.stack_push(bus, self.regs.a),
            Inst::Phx => self.stack_push(bus, self.regs.x),
            Inst::Phy => self.stack_push(bus, self.regs.y),
            Inst::Php => {
                // break and reserved bits read as set on the stack
                self.stack_push(bus, self.regs.p.0 | 0x30);
            }
            Inst::Pla => {
                self.regs.a = self.stack_pop(bus);
                self.regs.set_nz(self.regs.a);
            }
            Inst::Plx => {
                self.regs.x = self.stack_pop(bus);
                self.regs.set_nz(self.regs.x);
            }
            Inst::Ply => {
                self.regs.y = self.stack_pop(bus);
                self.regs.set_nz(self.regs.y);
            }
            Inst::Plp => self.pop_status(bus),

            // Arithmetic and logic
            Inst::Adc => {
                let operand = bus.read(ea1);
                self.adc(operand);
            }
            Inst::Sbc => {
                let operand = bus.read(ea1);
                self.sbc(operand);
            }
            Inst::And => {
                self.regs.a &= bus.read(ea1);
                self.regs.set_nz(self.regs.a);
            }
            Inst::Ora => {
                self.regs.a |= bus.read(ea1);
                self.regs.set_nz(self.regs.a);
            }
            Inst::Eor => {
                self.regs.a ^= bus.read(ea1);
                self.regs.set_nz(self.regs.a);
            }
            Inst::Cmp => {
                let operand = bus.read(ea1);
                self.compare(self.regs.a, operand);
            }
            Inst::Cpx => {
                let operand = bus.read(ea1);
                self.compare(self.regs.x, operand);
            }
            Inst::Cpy => {
                let operand = bus.read(ea1);
                self.compare(self.regs.y, operand);
            }
            Inst::Bit => {
                let operand = bus.read(ea1);
                self.regs.p.assign(Z, self.regs.a & operand == 0);
                if info.mode != Mode::Immediate {
                    self.regs.p.assign(N, operand & 0x80 != 0);
                    self.regs.p.assign(V, operand & 0x40 != 0);
                }
            }
            Inst::Trb => {
                let operand = bus.read(ea1);
                self.regs.p.assign(Z, self.regs.a & operand == 0);
                bus.write(ea1, operand & !self.regs.a);
            }
            Inst::Tsb => {
                let operand = bus.read(ea1);
                self.regs.p.assign(Z, self.regs.a & operand == 0);
                bus.write(ea1, operand | self.regs.a);
            }

            // Shifts and rotates
            Inst::Asl => {
                let value = self.rmw_read(bus, info, ea1);
                let result = self.asl(value);
                self.rmw_write(bus, info, ea1, result);
            }
            Inst::Lsr => {
                let value = self.rmw_read(bus, info, ea1);
                let result = self.lsr(value);
                self.rmw_write(bus, info, ea1, result);
            }
            Inst::Rol => {
                let value = self.rmw_read(bus, info, ea1);
                let result = self.rol(value);
                self.rmw_write(bus, info, ea1, result);
            }
            Inst::Ror => {
                let value = self.rmw_read(bus, info, ea1);
                let result = self.ror(value);
                self.rmw_write(bus, info, ea1, result);
            }

            // Increment/decrement
            Inst::Inc => {
                let result = self.rmw_read(bus, info, ea1).wrapping_add(1);
                self.regs.set_nz(result);
                self.rmw_write(bus, info, ea1, result);
            }
            Inst::Dec => {
                let result = self.rmw_read(bus, info, ea1).wrapping_sub(1);
                self.regs.set_nz(result);
                self.rmw_write(bus, info, ea1, result);
            }
            Inst::Inx => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.regs.set_nz(self.regs.x);
            }
            Inst::Iny => {
                self.regs.y = self.regs.y.wrapping_add(1);
                self.regs.set_nz(self.regs.y);
            }
            Inst::Dex => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.regs.set_nz(self.regs.x);
            }
            Inst::Dey => {
                self.regs.y = self.regs.y.wrapping_sub(1);
                self.regs.set_nz(self.regs.y);
            }

            // Branches
            Inst::Bcc => self.branch_if(!self.regs.p.test(C), ea2),
            Inst::Bcs => self.branch_if(self.regs.p.test(C), ea2),
            Inst::Bne => self.branch_if(!self.regs.p.test(Z), ea2),
            Inst::Beq => self.branch_if(self.regs.p.test(Z), ea2),
            Inst::Bpl => self.branch_if(!self.regs.p.test(N), ea2),
            Inst::Bmi => self.branch_if(self.regs.p.test(N), ea2),
            Inst::Bvc => self.branch_if(!self.regs.p.test(V), ea2),
            Inst::Bvs => self.branch_if(self.regs.p.test(V), ea2),
            Inst::Bra => self.branch(ea2),

            // Rockwell bit instructions; the bit number lives in the
            // opcode's high nibble.
            Inst::Rmb => {
                let bit = (info.opcode >> 4) & 7;
                let operand = bus.read(ea1) & !(1 << bit);
                bus.write(ea1, operand);
            }
            Inst::Smb => {
                let bit = (info.opcode >> 4) & 7;
                let operand = bus.read(ea1) | (1 << bit);
                bus.write(ea1, operand);
            }
            Inst::Bbr => {
                let bit = (info.opcode >> 4) & 7;
                let operand = bus.read(ea1);
                self.branch_if(operand & (1 << bit) == 0, ea2);
            }
            Inst::Bbs => {
                let bit = (info.opcode >> 4) & 7;
                let operand = bus.read(ea1);
                self.branch_if(operand & (1 << bit) != 0, ea2);
            }

            // Jumps and returns
            Inst::Jmp => {
                if ea1 == self.instruction_pc {
                    self.halt(ea1);
                }
                self.regs.pc = ea1;
            }
            Inst::Jsr => {
                let return_addr = self.regs.pc.wrapping_sub(1);
                self.stack_push(bus, (return_addr >> 8) as u8);
                self.stack_push(bus, (return_addr & 0xff) as u8);
                self.regs.pc = ea1;
            }
            Inst::Rts => self.rts(bus),
            Inst::Rti => {
                self.pop_status(bus);
                let low = self.stack_pop(bus);
                let high = self.stack_pop(bus);
                self.regs.pc = u16::from_le_bytes([low, high]);
            }
            Inst::Brk => {
                // BRK is a two-byte instruction: skip the signature byte
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.go_vector(bus, VECTOR_IRQ, true);
            }

            // Flags
            Inst::Clc => self.regs.p.clear(C),
            Inst::Sec => self.regs.p.set(C),
            Inst::Cld => self.regs.p.clear(D),
            Inst::Sed => self.regs.p.set(D),
            Inst::Cli => self.regs.p.clear(I),
            Inst::Sei => self.regs.p.set(I),
            Inst::Clv => self.regs.p.clear(V),

            Inst::Nop => {}

            // WDC and 65CE02 scaffolding: present in the database for the
            // extended profiles, but without semantic routines.
            Inst::Asr
            | Inst::Asw
            | Inst::Aug
            | Inst::Bsr
            | Inst::Cle
            | Inst::Cpz
            | Inst::Dew
            | Inst::Dez
            | Inst::Inw
            | Inst::Inz
            | Inst::Ldz
            | Inst::Neg
            | Inst::Phw
            | Inst::Phz
            | Inst::Plz
            | Inst::Row
            | Inst::Rtn
            | Inst::See
            | Inst::Stp
            | Inst::Tab
            | Inst::Taz
            | Inst::Tba
            | Inst::Tsy
            | Inst::Tys
            | Inst::Tza
            | Inst::Wai => {
                return Err(CpuError::UnimplementedInstruction(info.inst));
            }
        }
        Ok(())
    }
}

/// Sign-extend a 4-bit BCD digit for the decimal-mode overflow computation.
fn bcd_digit_sign_extend(digit: u8) -> i8 {
    (digit | if digit & 0x08 != 0 { 0xf0 } else { 0x00 }) as i8
}
