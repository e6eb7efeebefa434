//! 6502-family instruction-set database.
//!
//! A single static master table describes every opcode variant across the
//! supported processor families. An [`InstructionSet`] is built for one
//! concrete processor profile by filtering the master table, and then serves
//! opcode and mnemonic lookups, disassembly, and timing metadata.
//!
//! Timing model: the effective cycle count of an instruction is
//! `base_cycles + address_mode_added_cycles(mode)`, plus the CMOS fix-up
//! cycle where flagged, plus the dynamic penalties (page crossing, forced
//! NMOS indexed read-modify-write, taken branches) applied by the CPU core.

use std::collections::BTreeMap;

use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Processor-family membership.
    ///
    /// A table row carries the family that introduces it; a processor profile
    /// is the union of the families it implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Sets: u8 {
        /// Original NMOS 6502 instruction set.
        const BASE = 1 << 0;
        /// Rockwell bit-manipulation instructions (RMB/SMB/BBR/BBS).
        const ROCKWELL_BIT = 1 << 1;
        /// 65C02 additions and fixes.
        const CMOS = 1 << 2;
        /// WDC 65C02 additions (STP, WAI).
        const WDC_CMOS = 1 << 3;
        /// WDC 65802/65816 (scaffolding; native mode not emulated).
        const WDC_16_BIT = 1 << 4;
        /// Commodore 65CE02 (scaffolding).
        const CBM_65CE02 = 1 << 5;
    }
}

impl Sets {
    pub const CPU_6502: Sets = Sets::BASE;
    pub const CPU_R6502: Sets = Sets::BASE.union(Sets::ROCKWELL_BIT);
    pub const CPU_65C02: Sets = Sets::BASE.union(Sets::CMOS);
    pub const CPU_R65C02: Sets = Sets::BASE.union(Sets::CMOS).union(Sets::ROCKWELL_BIT);
    pub const CPU_WDC65C02: Sets = Sets::CPU_R65C02.union(Sets::WDC_CMOS);
    pub const CPU_WDC65C816: Sets = Sets::CPU_65C02
        .union(Sets::WDC_CMOS)
        .union(Sets::WDC_16_BIT);
    pub const CPU_65CE02: Sets = Sets::CPU_R65C02.union(Sets::CBM_65CE02);
}

/// Semantic opcode identity, independent of addressing mode.
///
/// The Rockwell bit instructions appear once each; the bit number is encoded
/// in the opcode's high nibble and recovered at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inst {
    Adc, And, Asl, Asr, Asw, Aug,
    Bbr, Bbs, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Bra, Brk, Bsr, Bvc, Bvs,
    Clc, Cld, Cle, Cli, Clv, Cmp, Cpx, Cpy, Cpz,
    Dec, Dew, Dex, Dey, Dez,
    Eor,
    Inc, Inw, Inx, Iny, Inz,
    Jmp, Jsr,
    Lda, Ldx, Ldy, Ldz, Lsr,
    Neg, Nop,
    Ora,
    Pha, Php, Phw, Phx, Phy, Phz, Pla, Plp, Plx, Ply, Plz,
    Rmb, Rol, Ror, Row, Rti, Rtn, Rts,
    Sbc, Sec, Sed, See, Sei, Smb, Sta, Stp, Stx, Sty, Stz,
    Tab, Tax, Tay, Taz, Tba, Trb, Tsb, Tsx, Tsy, Txa, Txs, Tya, Tys, Tza,
    Wai,
}

/// Addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    /// ($nn) - CMOS.
    ZpInd,
    /// ($nn,x)
    ZpXInd,
    /// ($nn),y
    ZpIndY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// ($nnnn) - JMP only; page-wrap bug on NMOS.
    AbsoluteInd,
    /// ($nnnn,x) - CMOS.
    AbsXInd,
    Relative,
    /// $nn,rel - Rockwell BBR/BBS.
    ZpRelative,
    /// 16-bit branch displacement - Commodore 65CE02.
    Relative16,
    /// ($nn,s),y - Commodore 65CE02.
    StVecIndY,
}

impl Mode {
    /// Operand size in bytes (instruction length is this plus one).
    #[must_use]
    pub const fn operand_size_bytes(self) -> u8 {
        match self {
            Mode::Implied | Mode::Accumulator => 0,
            Mode::Immediate
            | Mode::ZeroPage
            | Mode::ZeroPageX
            | Mode::ZeroPageY
            | Mode::ZpInd
            | Mode::ZpXInd
            | Mode::ZpIndY
            | Mode::Relative
            | Mode::StVecIndY => 1,
            Mode::Absolute
            | Mode::AbsoluteX
            | Mode::AbsoluteY
            | Mode::AbsoluteInd
            | Mode::AbsXInd
            | Mode::ZpRelative
            | Mode::Relative16 => 2,
        }
    }

    /// Cycles the addressing mode adds on top of a row's base cycle count.
    #[must_use]
    pub const fn added_cycles(self) -> u8 {
        match self {
            Mode::Implied | Mode::Accumulator | Mode::Immediate | Mode::Relative => 0,
            Mode::ZeroPage => 1,
            Mode::Relative16 => 1,
            Mode::ZeroPageX
            | Mode::ZeroPageY
            | Mode::Absolute
            | Mode::AbsoluteX
            | Mode::AbsoluteY => 2,
            Mode::ZpInd | Mode::ZpIndY | Mode::ZpRelative => 3,
            Mode::ZpXInd | Mode::AbsoluteInd | Mode::StVecIndY => 4,
            Mode::AbsXInd => 5,
        }
    }

    /// MOS assembler operand prefix.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Mode::ZpInd | Mode::ZpXInd | Mode::ZpIndY | Mode::AbsoluteInd | Mode::AbsXInd
            | Mode::StVecIndY => "(",
            Mode::Immediate => "#",
            _ => "",
        }
    }

    /// MOS assembler operand suffix.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Mode::ZeroPageX | Mode::AbsoluteX => ",x",
            Mode::ZeroPageY | Mode::AbsoluteY => ",y",
            Mode::ZpInd | Mode::AbsoluteInd => ")",
            Mode::ZpXInd | Mode::AbsXInd => ",x)",
            Mode::ZpIndY | Mode::StVecIndY => "),y",
            _ => "",
        }
    }

    /// PAL65 assembler mnemonic suffix, used to key the mnemonic map.
    #[must_use]
    pub const fn pal65_suffix(self) -> &'static str {
        match self {
            Mode::Accumulator => "a",
            Mode::Immediate => "#",
            Mode::ZeroPageX | Mode::AbsoluteX => "x",
            Mode::ZeroPageY | Mode::AbsoluteY => "y",
            Mode::ZpInd | Mode::AbsoluteInd => "@",
            Mode::ZpXInd | Mode::AbsXInd => "x@",
            Mode::ZpIndY => "@y",
            Mode::StVecIndY => "s@y",
            _ => "",
        }
    }

    /// Short display name for the summary table.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Mode::Implied => "imp",
            Mode::Accumulator => "a",
            Mode::Immediate => "#",
            Mode::ZeroPage => "zp",
            Mode::ZeroPageX => "zp,x",
            Mode::ZeroPageY => "zp,y",
            Mode::ZpInd => "(zp)",
            Mode::ZpXInd => "(zp,x)",
            Mode::ZpIndY => "(zp),y",
            Mode::Absolute => "abs",
            Mode::AbsoluteX => "abs,x",
            Mode::AbsoluteY => "abs,y",
            Mode::AbsoluteInd => "(abs)",
            Mode::AbsXInd => "(abs,x)",
            Mode::Relative => "rel",
            Mode::ZpRelative => "zp,rel",
            Mode::Relative16 => "rel16",
            Mode::StVecIndY => "(s),y",
        }
    }

    /// Two modes may legally share a PAL65 mnemonic only when they are a
    /// short/long pair the assembler can distinguish by operand size: the
    /// zero-page/absolute pairs, and the 8/16-bit branch displacements of
    /// the 65CE02.
    #[must_use]
    pub const fn pal65_compatible(self, other: Mode) -> bool {
        matches!(
            (self, other),
            (Mode::ZeroPage, Mode::Absolute)
                | (Mode::Absolute, Mode::ZeroPage)
                | (Mode::ZeroPageX, Mode::AbsoluteX)
                | (Mode::AbsoluteX, Mode::ZeroPageX)
                | (Mode::ZeroPageY, Mode::AbsoluteY)
                | (Mode::AbsoluteY, Mode::ZeroPageY)
                | (Mode::Relative, Mode::Relative16)
                | (Mode::Relative16, Mode::Relative)
        )
    }
}

/// One opcode variant: a (semantic instruction, addressing mode) pair with
/// its encoding and timing metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Info {
    pub mnemonic: &'static str,
    pub sets: Sets,
    pub inst: Inst,
    pub mode: Mode,
    pub opcode: u8,
    /// Cycle count before the addressing-mode addition and penalties.
    pub base_cycles: u8,
    /// +1 cycle when the computed address crosses a page.
    pub page_crossing_extra_cycle: bool,
    /// Indexed read-modify-write always pays the penalty on NMOS.
    pub nmos_extra_cycle_forced: bool,
    /// 65C02 spends an extra cycle fixing the JMP (abs) bug.
    pub cmos_extra_cycle: bool,
}

// Timing flag shorthands for the master table.
const P: u8 = 1 << 0;
const F: u8 = 1 << 1;
const X: u8 = 1 << 2;

const fn row(
    mnemonic: &'static str,
    sets: Sets,
    inst: Inst,
    mode: Mode,
    opcode: u8,
    base_cycles: u8,
    flags: u8,
) -> Info {
    Info {
        mnemonic,
        sets,
        inst,
        mode,
        opcode,
        base_cycles,
        page_crossing_extra_cycle: flags & P != 0,
        nmos_extra_cycle_forced: flags & F != 0,
        cmos_extra_cycle: flags & X != 0,
    }
}

#[rustfmt::skip]
static MAIN_TABLE: [Info; 230] = {
    use Inst::*;
    use Mode::*;
    const BASE: Sets = Sets::BASE;
    const ROCK: Sets = Sets::ROCKWELL_BIT;
    const CMOS: Sets = Sets::CMOS;
    const WDC:  Sets = Sets::WDC_CMOS;
    const CBM:  Sets = Sets::CBM_65CE02;
    [
    row("adc",  BASE, Adc, Immediate,   0x69, 2, 0),
    row("adc",  BASE, Adc, ZeroPage,    0x65, 2, 0),
    row("adc",  BASE, Adc, ZeroPageX,   0x75, 2, 0),
    row("adc",  CMOS, Adc, ZpInd,       0x72, 2, 0),
    row("adc",  BASE, Adc, ZpXInd,      0x61, 2, 0),
    row("adc",  BASE, Adc, ZpIndY,      0x71, 2, P),
    row("adc",  BASE, Adc, Absolute,    0x6d, 2, 0),
    row("adc",  BASE, Adc, AbsoluteX,   0x7d, 2, P),
    row("adc",  BASE, Adc, AbsoluteY,   0x79, 2, P),

    row("and",  BASE, And, Immediate,   0x29, 2, 0),
    row("and",  BASE, And, ZeroPage,    0x25, 2, 0),
    row("and",  BASE, And, ZeroPageX,   0x35, 2, 0),
    row("and",  CMOS, And, ZpInd,       0x32, 2, 0),
    row("and",  BASE, And, ZpXInd,      0x21, 2, 0),
    row("and",  BASE, And, ZpIndY,      0x31, 2, P),
    row("and",  BASE, And, Absolute,    0x2d, 2, 0),
    row("and",  BASE, And, AbsoluteX,   0x3d, 2, P),
    row("and",  BASE, And, AbsoluteY,   0x39, 2, P),

    row("asl",  BASE, Asl, Accumulator, 0x0a, 2, 0),
    row("asl",  BASE, Asl, ZeroPage,    0x06, 4, 0),
    row("asl",  BASE, Asl, ZeroPageX,   0x16, 4, 0),
    row("asl",  BASE, Asl, Absolute,    0x0e, 4, 0),
    row("asl",  BASE, Asl, AbsoluteX,   0x1e, 4, F | P),

    row("asr",  CBM,  Asr, Accumulator, 0x43, 2, 0),
    row("asr",  CBM,  Asr, ZeroPage,    0x44, 3, 0),
    row("asr",  CBM,  Asr, ZeroPageX,   0x54, 3, 0),

    row("asw",  CBM,  Asw, Absolute,    0xcb, 5, 0),

    // 4-byte instruction on real silicon; scaffolding only.
    row("aug",  CBM,  Aug, Implied,     0x5c, 4, 0),

    // The Rockwell bit rows are replicated across 8 opcodes at +0x10 per
    // bit index during construction.
    row("bbr",  ROCK, Bbr, ZpRelative,  0x0f, 2, 0),
    row("bbs",  ROCK, Bbs, ZpRelative,  0x8f, 2, 0),
    row("rmb",  ROCK, Rmb, ZeroPage,    0x07, 4, 0),
    row("smb",  ROCK, Smb, ZeroPage,    0x87, 4, 0),

    row("bcc",  BASE, Bcc, Relative,    0x90, 2, 0),
    row("bcc",  CBM,  Bcc, Relative16,  0x93, 2, 0),
    row("bcs",  BASE, Bcs, Relative,    0xb0, 2, 0),
    row("bcs",  CBM,  Bcs, Relative16,  0xb3, 2, 0),
    row("beq",  BASE, Beq, Relative,    0xf0, 2, 0),
    row("beq",  CBM,  Beq, Relative16,  0xf3, 2, 0),

    row("bit",  CMOS, Bit, Immediate,   0x89, 2, 0),
    row("bit",  BASE, Bit, ZeroPage,    0x24, 2, 0),
    row("bit",  CMOS, Bit, ZeroPageX,   0x34, 2, 0),
    row("bit",  BASE, Bit, Absolute,    0x2c, 2, 0),
    row("bit",  CMOS, Bit, AbsoluteX,   0x3c, 2, P),

    row("bmi",  BASE, Bmi, Relative,    0x30, 2, 0),
    row("bmi",  CBM,  Bmi, Relative16,  0x33, 2, 0),
    row("bne",  BASE, Bne, Relative,    0xd0, 2, 0),
    row("bne",  CBM,  Bne, Relative16,  0xd3, 2, 0),
    row("bpl",  BASE, Bpl, Relative,    0x10, 2, 0),
    row("bpl",  CBM,  Bpl, Relative16,  0x13, 2, 0),

    row("brk",  BASE, Brk, Implied,     0x00, 7, 0),

    row("bra",  CMOS, Bra, Relative,    0x80, 2, 0),
    row("bra",  CBM,  Bra, Relative16,  0x83, 2, 0),

    row("bsr",  CBM,  Bsr, Relative16,  0x63, 4, 0),

    row("bvc",  BASE, Bvc, Relative,    0x50, 2, 0),
    row("bvc",  CBM,  Bvc, Relative16,  0x53, 2, 0),
    row("bvs",  BASE, Bvs, Relative,    0x70, 2, 0),
    row("bvs",  CBM,  Bvs, Relative16,  0x73, 2, 0),

    row("clc",  BASE, Clc, Implied,     0x18, 2, 0),
    row("cld",  BASE, Cld, Implied,     0xd8, 2, 0),
    row("cle",  CBM,  Cle, Implied,     0x02, 2, 0),
    row("cli",  BASE, Cli, Implied,     0x58, 2, 0),
    row("clv",  BASE, Clv, Implied,     0xb8, 2, 0),

    row("cmp",  BASE, Cmp, Immediate,   0xc9, 2, 0),
    row("cmp",  BASE, Cmp, ZeroPage,    0xc5, 2, 0),
    row("cmp",  BASE, Cmp, ZeroPageX,   0xd5, 2, 0),
    row("cmp",  CMOS, Cmp, ZpInd,       0xd2, 2, 0),
    row("cmp",  BASE, Cmp, ZpXInd,      0xc1, 2, 0),
    row("cmp",  BASE, Cmp, ZpIndY,      0xd1, 2, P),
    row("cmp",  BASE, Cmp, Absolute,    0xcd, 2, 0),
    row("cmp",  BASE, Cmp, AbsoluteX,   0xdd, 2, P),
    row("cmp",  BASE, Cmp, AbsoluteY,   0xd9, 2, P),

    row("cpx",  BASE, Cpx, Immediate,   0xe0, 2, 0),
    row("cpx",  BASE, Cpx, ZeroPage,    0xe4, 2, 0),
    row("cpx",  BASE, Cpx, Absolute,    0xec, 2, 0),

    row("cpy",  BASE, Cpy, Immediate,   0xc0, 2, 0),
    row("cpy",  BASE, Cpy, ZeroPage,    0xc4, 2, 0),
    row("cpy",  BASE, Cpy, Absolute,    0xcc, 2, 0),

    row("cpz",  CBM,  Cpz, Immediate,   0xc2, 2, 0),
    row("cpz",  CBM,  Cpz, ZeroPage,    0xd4, 2, 0),
    row("cpz",  CBM,  Cpz, Absolute,    0xdc, 2, 0),

    row("dec",  CMOS, Dec, Accumulator, 0x3a, 2, 0),
    row("dec",  BASE, Dec, ZeroPage,    0xc6, 4, 0),
    row("dec",  BASE, Dec, ZeroPageX,   0xd6, 4, 0),
    row("dec",  BASE, Dec, Absolute,    0xce, 4, 0),
    // INC/DEC abs,x stay at 7 cycles on CMOS, unlike the shifts.
    row("dec",  BASE, Dec, AbsoluteX,   0xde, 5, 0),

    row("dew",  CBM,  Dew, ZeroPage,    0xc3, 5, 0),
    row("dex",  BASE, Dex, Implied,     0xca, 2, 0),
    row("dey",  BASE, Dey, Implied,     0x88, 2, 0),
    row("dez",  CBM,  Dez, Implied,     0x3b, 2, 0),

    row("eor",  BASE, Eor, Immediate,   0x49, 2, 0),
    row("eor",  BASE, Eor, ZeroPage,    0x45, 2, 0),
    row("eor",  BASE, Eor, ZeroPageX,   0x55, 2, 0),
    row("eor",  CMOS, Eor, ZpInd,       0x52, 2, 0),
    row("eor",  BASE, Eor, ZpXInd,      0x41, 2, 0),
    row("eor",  BASE, Eor, ZpIndY,      0x51, 2, P),
    row("eor",  BASE, Eor, Absolute,    0x4d, 2, 0),
    row("eor",  BASE, Eor, AbsoluteX,   0x5d, 2, P),
    row("eor",  BASE, Eor, AbsoluteY,   0x59, 2, P),

    row("inc",  CMOS, Inc, Accumulator, 0x1a, 2, 0),
    row("inc",  BASE, Inc, ZeroPage,    0xe6, 4, 0),
    row("inc",  BASE, Inc, ZeroPageX,   0xf6, 4, 0),
    row("inc",  BASE, Inc, Absolute,    0xee, 4, 0),
    row("inc",  BASE, Inc, AbsoluteX,   0xfe, 5, 0),

    row("inw",  CBM,  Inw, ZeroPage,    0xe3, 5, 0),
    row("inx",  BASE, Inx, Implied,     0xe8, 2, 0),
    row("iny",  BASE, Iny, Implied,     0xc8, 2, 0),
    row("inz",  CBM,  Inz, Implied,     0x1b, 2, 0),

    row("jmp",  BASE, Jmp, Absolute,    0x4c, 1, 0),
    row("jmp",  BASE, Jmp, AbsoluteInd, 0x6c, 1, X),
    row("jmp",  CMOS, Jmp, AbsXInd,     0x7c, 1, 0),

    row("jsr",  BASE, Jsr, Absolute,    0x20, 4, 0),
    row("jsr",  CBM,  Jsr, AbsoluteInd, 0x22, 3, 0),
    row("jsr",  CBM,  Jsr, AbsXInd,     0x23, 2, 0),

    row("lda",  BASE, Lda, Immediate,   0xa9, 2, 0),
    row("lda",  BASE, Lda, ZeroPage,    0xa5, 2, 0),
    row("lda",  BASE, Lda, ZeroPageX,   0xb5, 2, 0),
    row("lda",  CMOS, Lda, ZpInd,       0xb2, 2, 0),
    row("lda",  BASE, Lda, ZpXInd,      0xa1, 2, 0),
    row("lda",  BASE, Lda, ZpIndY,      0xb1, 2, P),
    row("lda",  BASE, Lda, Absolute,    0xad, 2, 0),
    row("lda",  BASE, Lda, AbsoluteX,   0xbd, 2, P),
    row("lda",  BASE, Lda, AbsoluteY,   0xb9, 2, P),
    row("lda",  CBM,  Lda, StVecIndY,   0xe2, 2, 0),

    row("ldx",  BASE, Ldx, Immediate,   0xa2, 2, 0),
    row("ldx",  BASE, Ldx, ZeroPage,    0xa6, 2, 0),
    row("ldx",  BASE, Ldx, ZeroPageY,   0xb6, 2, 0),
    row("ldx",  BASE, Ldx, Absolute,    0xae, 2, 0),
    row("ldx",  BASE, Ldx, AbsoluteY,   0xbe, 2, P),

    row("ldy",  BASE, Ldy, Immediate,   0xa0, 2, 0),
    row("ldy",  BASE, Ldy, ZeroPage,    0xa4, 2, 0),
    row("ldy",  BASE, Ldy, ZeroPageX,   0xb4, 2, 0),
    row("ldy",  BASE, Ldy, Absolute,    0xac, 2, 0),
    row("ldy",  BASE, Ldy, AbsoluteX,   0xbc, 2, P),

    row("ldz",  CBM,  Ldz, Immediate,   0xa3, 2, 0),
    row("ldz",  CBM,  Ldz, Absolute,    0xab, 2, 0),
    row("ldz",  CBM,  Ldz, AbsoluteX,   0xbb, 2, P),

    row("lsr",  BASE, Lsr, Accumulator, 0x4a, 2, 0),
    row("lsr",  BASE, Lsr, ZeroPage,    0x46, 4, 0),
    row("lsr",  BASE, Lsr, ZeroPageX,   0x56, 4, 0),
    row("lsr",  BASE, Lsr, Absolute,    0x4e, 4, 0),
    row("lsr",  BASE, Lsr, AbsoluteX,   0x5e, 4, F | P),

    row("neg",  CBM,  Neg, Accumulator, 0x42, 2, 0),

    row("nop",  BASE, Nop, Implied,     0xea, 2, 0),

    row("ora",  BASE, Ora, Immediate,   0x09, 2, 0),
    row("ora",  BASE, Ora, ZeroPage,    0x05, 2, 0),
    row("ora",  BASE, Ora, ZeroPageX,   0x15, 2, 0),
    row("ora",  CMOS, Ora, ZpInd,       0x12, 2, 0),
    row("ora",  BASE, Ora, ZpXInd,      0x01, 2, 0),
    row("ora",  BASE, Ora, ZpIndY,      0x11, 2, P),
    row("ora",  BASE, Ora, Absolute,    0x0d, 2, 0),
    row("ora",  BASE, Ora, AbsoluteX,   0x1d, 2, P),
    row("ora",  BASE, Ora, AbsoluteY,   0x19, 2, P),

    row("pha",  BASE, Pha, Implied,     0x48, 3, 0),
    row("php",  BASE, Php, Implied,     0x08, 3, 0),
    row("phw",  CBM,  Phw, Immediate,   0xf4, 3, 0),
    row("phw",  CBM,  Phw, Absolute,    0xfc, 3, 0),
    row("phx",  CMOS, Phx, Implied,     0xda, 3, 0),
    row("phy",  CMOS, Phy, Implied,     0x5a, 3, 0),
    row("phz",  CBM,  Phz, Implied,     0xdb, 3, 0),

    row("pla",  BASE, Pla, Implied,     0x68, 4, 0),
    row("plp",  BASE, Plp, Implied,     0x28, 4, 0),
    row("plx",  CMOS, Plx, Implied,     0xfa, 4, 0),
    row("ply",  CMOS, Ply, Implied,     0x7a, 4, 0),
    row("plz",  CBM,  Plz, Implied,     0xfb, 4, 0),

    row("rol",  BASE, Rol, Accumulator, 0x2a, 2, 0),
    row("rol",  BASE, Rol, ZeroPage,    0x26, 4, 0),
    row("rol",  BASE, Rol, ZeroPageX,   0x36, 4, 0),
    row("rol",  BASE, Rol, Absolute,    0x2e, 4, 0),
    row("rol",  BASE, Rol, AbsoluteX,   0x3e, 4, F | P),

    // very early 6502 didn't have ROR
    row("ror",  BASE, Ror, Accumulator, 0x6a, 2, 0),
    row("ror",  BASE, Ror, ZeroPage,    0x66, 4, 0),
    row("ror",  BASE, Ror, ZeroPageX,   0x76, 4, 0),
    row("ror",  BASE, Ror, Absolute,    0x6e, 4, 0),
    row("ror",  BASE, Ror, AbsoluteX,   0x7e, 4, F | P),

    row("row",  CBM,  Row, Absolute,    0xeb, 4, 0),

    row("rti",  BASE, Rti, Implied,     0x40, 6, 0),
    row("rtn",  CBM,  Rtn, Immediate,   0x62, 5, 0),
    row("rts",  BASE, Rts, Implied,     0x60, 6, 0),

    row("sbc",  BASE, Sbc, Immediate,   0xe9, 2, 0),
    row("sbc",  BASE, Sbc, ZeroPage,    0xe5, 2, 0),
    row("sbc",  BASE, Sbc, ZeroPageX,   0xf5, 2, 0),
    row("sbc",  CMOS, Sbc, ZpInd,       0xf2, 2, 0),
    row("sbc",  BASE, Sbc, ZpXInd,      0xe1, 2, 0),
    row("sbc",  BASE, Sbc, ZpIndY,      0xf1, 2, P),
    row("sbc",  BASE, Sbc, Absolute,    0xed, 2, 0),
    row("sbc",  BASE, Sbc, AbsoluteX,   0xfd, 2, P),
    row("sbc",  BASE, Sbc, AbsoluteY,   0xf9, 2, P),

    row("sec",  BASE, Sec, Implied,     0x38, 2, 0),
    row("sed",  BASE, Sed, Implied,     0xf8, 2, 0),
    row("see",  CBM,  See, Implied,     0x03, 2, 0),
    row("sei",  BASE, Sei, Implied,     0x78, 2, 0),

    row("sta",  BASE, Sta, ZeroPage,    0x85, 2, 0),
    row("sta",  BASE, Sta, ZeroPageX,   0x95, 2, 0),
    row("sta",  CMOS, Sta, ZpInd,       0x92, 2, 0),
    row("sta",  BASE, Sta, ZpXInd,      0x81, 2, 0),
    // stores always pay the indexing cycle; it is baked into the base
    row("sta",  BASE, Sta, ZpIndY,      0x91, 3, 0),
    row("sta",  BASE, Sta, Absolute,    0x8d, 2, 0),
    row("sta",  BASE, Sta, AbsoluteX,   0x9d, 3, 0),
    row("sta",  BASE, Sta, AbsoluteY,   0x99, 3, 0),
    row("sta",  CBM,  Sta, StVecIndY,   0x82, 2, 0),

    row("stp",  WDC,  Stp, Implied,     0xdb, 3, 0),

    row("stx",  BASE, Stx, ZeroPage,    0x86, 2, 0),
    row("stx",  BASE, Stx, ZeroPageY,   0x96, 2, 0),
    row("stx",  BASE, Stx, Absolute,    0x8e, 2, 0),
    row("stx",  CBM,  Stx, AbsoluteY,   0x9b, 3, 0),

    row("sty",  BASE, Sty, ZeroPage,    0x84, 2, 0),
    row("sty",  BASE, Sty, ZeroPageX,   0x94, 2, 0),
    row("sty",  BASE, Sty, Absolute,    0x8c, 2, 0),
    row("sty",  CBM,  Sty, AbsoluteX,   0x8b, 3, 0),

    row("stz",  CMOS, Stz, ZeroPage,    0x64, 2, 0),
    row("stz",  CMOS, Stz, ZeroPageX,   0x74, 2, 0),
    row("stz",  CMOS, Stz, Absolute,    0x9c, 2, 0),
    row("stz",  CMOS, Stz, AbsoluteX,   0x9e, 3, 0),

    row("tab",  CBM,  Tab, Implied,     0x5b, 2, 0),
    row("tax",  BASE, Tax, Implied,     0xaa, 2, 0),
    row("tay",  BASE, Tay, Implied,     0xa8, 2, 0),
    row("taz",  CBM,  Taz, Implied,     0x4b, 2, 0),
    row("tba",  CBM,  Tba, Implied,     0x7b, 2, 0),

    row("trb",  CMOS, Trb, ZeroPage,    0x14, 4, 0),
    row("trb",  CMOS, Trb, Absolute,    0x1c, 4, 0),
    row("tsb",  CMOS, Tsb, ZeroPage,    0x04, 4, 0),
    row("tsb",  CMOS, Tsb, Absolute,    0x0c, 4, 0),

    row("tsx",  BASE, Tsx, Implied,     0xba, 2, 0),
    row("tsy",  CBM,  Tsy, Implied,     0x0b, 2, 0),
    row("txa",  BASE, Txa, Implied,     0x8a, 2, 0),
    row("txs",  BASE, Txs, Implied,     0x9a, 2, 0),
    row("tya",  BASE, Tya, Implied,     0x98, 2, 0),
    row("tys",  CBM,  Tys, Implied,     0x2b, 2, 0),
    row("tza",  CBM,  Tza, Implied,     0x6b, 2, 0),

    row("wai",  WDC,  Wai, Implied,     0xcb, 3, 0),
    ]
};

/// Errors surfaced while building an [`InstructionSet`] for a profile.
///
/// Both indicate an inconsistent master table for the requested profile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstructionSetError {
    #[error("duplicate opcode {0:02x}")]
    DuplicateOpcode(u8),
    #[error("duplicate PAL65 mnemonic {0}")]
    DuplicateMnemonic(String),
}

/// The instruction-set database for one processor profile.
///
/// Built once, then immutable; lookups are by opcode byte or by PAL65
/// mnemonic. The Rockwell bit rows are expanded into per-opcode entries, so
/// every entry's `opcode` field names its own slot.
pub struct InstructionSet {
    sets: Sets,
    by_opcode: [Option<Info>; 256],
    by_mnemonic: BTreeMap<String, Vec<Info>>,
}

impl InstructionSet {
    /// Build the database for the given profile.
    pub fn new(sets: Sets) -> Result<Self, InstructionSetError> {
        let mut by_opcode: [Option<Info>; 256] = [None; 256];
        let mut by_mnemonic: BTreeMap<String, Vec<Info>> = BTreeMap::new();

        for info in &MAIN_TABLE {
            if !sets.intersects(info.sets) {
                continue;
            }

            // Rockwell bit ops occupy 8 opcode slots per row, one per bit
            // index, spaced 0x10 apart.
            let slot_count: u8 = if is_bit_numbered(info.inst) { 8 } else { 1 };
            for bit in 0..slot_count {
                let opcode = info.opcode + (bit << 4);
                if by_opcode[opcode as usize].is_some() {
                    return Err(InstructionSetError::DuplicateOpcode(opcode));
                }
                by_opcode[opcode as usize] = Some(Info { opcode, ..*info });
            }

            let pal65_mnemonic = format!("{}{}", info.mnemonic, info.mode.pal65_suffix());
            if let Some(existing) = by_mnemonic.get(&pal65_mnemonic) {
                if !existing[0].mode.pal65_compatible(info.mode) {
                    return Err(InstructionSetError::DuplicateMnemonic(pal65_mnemonic));
                }
            }
            by_mnemonic.entry(pal65_mnemonic).or_default().push(*info);
        }

        Ok(Self {
            sets,
            by_opcode,
            by_mnemonic,
        })
    }

    /// The profile this database was built for.
    #[must_use]
    pub fn sets(&self) -> Sets {
        self.sets
    }

    /// Look up an opcode byte. `None` means the opcode is undefined for the
    /// profile.
    #[must_use]
    pub fn get(&self, opcode: u8) -> Option<&Info> {
        self.by_opcode[opcode as usize].as_ref()
    }

    /// Look up a PAL65 mnemonic (case-insensitive). Most mnemonics map to
    /// several addressing-mode variants.
    #[must_use]
    pub fn get_mnemonic(&self, mnemonic: &str) -> Option<&[Info]> {
        self.by_mnemonic
            .get(&mnemonic.to_ascii_lowercase())
            .map(Vec::as_slice)
    }

    /// Whether the mnemonic is known for this profile.
    #[must_use]
    pub fn valid_mnemonic(&self, mnemonic: &str) -> bool {
        self.by_mnemonic.contains_key(&mnemonic.to_ascii_lowercase())
    }

    /// Disassemble the instruction starting at `inst_bytes[0]`; `pc` is the
    /// address of the opcode (needed to render branch targets).
    #[must_use]
    pub fn disassemble(&self, pc: u16, inst_bytes: [u8; 3]) -> String {
        let opcode = inst_bytes[0];
        let Some(info) = self.get(opcode) else {
            return format!("undefined {opcode:02x}");
        };
        let mut s = display_mnemonic(info);
        match info.mode {
            Mode::Implied => {}
            Mode::Accumulator => s.push_str(" a"),
            Mode::Immediate
            | Mode::ZeroPage
            | Mode::ZeroPageX
            | Mode::ZeroPageY
            | Mode::ZpInd
            | Mode::ZpXInd
            | Mode::ZpIndY
            | Mode::StVecIndY => {
                s += &format!(
                    " {}${:02x}{}",
                    info.mode.prefix(),
                    inst_bytes[1],
                    info.mode.suffix()
                );
            }
            Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY | Mode::AbsoluteInd
            | Mode::AbsXInd => {
                let operand = u16::from_le_bytes([inst_bytes[1], inst_bytes[2]]);
                s += &format!(
                    " {}${operand:04x}{}",
                    info.mode.prefix(),
                    info.mode.suffix()
                );
            }
            Mode::Relative => {
                let target = branch_target(pc, 2, inst_bytes[1]);
                s += &format!(" ${target:04x}");
            }
            Mode::ZpRelative => {
                let target = branch_target(pc, 3, inst_bytes[2]);
                s += &format!(" ${:02x},${target:04x}", inst_bytes[1]);
            }
            Mode::Relative16 => {
                let offset = u16::from_le_bytes([inst_bytes[1], inst_bytes[2]]);
                let target = pc.wrapping_add(3).wrapping_add(offset);
                s += &format!(" ${target:04x}");
            }
        }
        s
    }

    /// Render the 16x16 opcode matrix. With `detail`, each defined cell also
    /// carries the PAL65 mode suffix and the static cycle count.
    #[must_use]
    pub fn opcode_matrix(&self, detail: bool) -> String {
        let width = if detail { 9 } else { 5 };
        let mut out = String::new();
        let mut count = 0;

        out.push_str("    ");
        for lsd in 0..0x10 {
            out += &format!("  {lsd:02x}{:pad$}", "", pad = width - 4);
        }
        out.push('\n');
        out.push_str("    ");
        for _ in 0..0x10 {
            out += &format!(" {:-<w$}", "", w = width - 1);
        }
        out.push('\n');
        for msd in 0..0x10u16 {
            out += &format!("{:02x} |", msd << 4);
            for lsd in 0..0x10u16 {
                let opcode = ((msd << 4) | lsd) as u8;
                match self.get(opcode) {
                    Some(info) => {
                        count += 1;
                        if detail {
                            let cycles = info.base_cycles + info.mode.added_cycles();
                            let cell =
                                format!("{}{}", display_mnemonic(info), info.mode.pal65_suffix());
                            out += &format!(" {cell:<6}{cycles} ");
                        } else {
                            out += &format!(" {:<4}", display_mnemonic(info));
                        }
                    }
                    None => out += &format!(" {:w$}", "", w = width - 1),
                }
            }
            out.push('\n');
        }
        out += &format!("\n{count} opcodes\n");
        out
    }

    /// Render the per-mnemonic summary: every addressing-mode variant with
    /// its opcode and static cycle count.
    #[must_use]
    pub fn summary_table(&self) -> String {
        let mut out = String::new();
        for (mnemonic, infos) in &self.by_mnemonic {
            out += &format!("{mnemonic:<6}");
            for info in infos {
                let cycles = info.base_cycles + info.mode.added_cycles();
                out += &format!(" {}:{:02x}/{cycles}", info.mode.name(), info.opcode);
            }
            out.push('\n');
        }
        out
    }
}

/// Whether the instruction encodes a bit number in the opcode's high nibble.
pub(crate) fn is_bit_numbered(inst: Inst) -> bool {
    matches!(inst, Inst::Rmb | Inst::Smb | Inst::Bbr | Inst::Bbs)
}

/// Mnemonic as displayed for a concrete opcode, with the bit digit appended
/// for the Rockwell bit instructions.
fn display_mnemonic(info: &Info) -> String {
    if is_bit_numbered(info.inst) {
        format!("{}{}", info.mnemonic, (info.opcode >> 4) & 7)
    } else {
        info.mnemonic.to_string()
    }
}

fn branch_target(pc: u16, inst_len: u16, offset: u8) -> u16 {
    pc.wrapping_add(inst_len).wrapping_add(offset as i8 as u16)
}
