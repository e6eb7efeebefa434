//! Instruction-set database invariants across the processor profiles.

use cpu_6502::{InstructionSet, Mode, Sets};

fn opcode_count(set: &InstructionSet) -> usize {
    (0..=255u8).filter(|&b| set.get(b).is_some()).count()
}

#[test]
fn every_profile_builds() {
    for sets in [
        Sets::CPU_6502,
        Sets::CPU_R6502,
        Sets::CPU_65C02,
        Sets::CPU_R65C02,
        Sets::CPU_WDC65C02,
        Sets::CPU_WDC65C816,
        Sets::CPU_65CE02,
    ] {
        InstructionSet::new(sets).unwrap();
    }
}

#[test]
fn opcode_counts_match_the_data_sheets() {
    // 151 documented NMOS opcodes; the 65C02 adds 27, Rockwell adds 32,
    // WDC adds STP and WAI.
    assert_eq!(opcode_count(&InstructionSet::new(Sets::CPU_6502).unwrap()), 151);
    assert_eq!(opcode_count(&InstructionSet::new(Sets::CPU_65C02).unwrap()), 178);
    assert_eq!(opcode_count(&InstructionSet::new(Sets::CPU_R65C02).unwrap()), 210);
    assert_eq!(
        opcode_count(&InstructionSet::new(Sets::CPU_WDC65C02).unwrap()),
        212
    );
}

#[test]
fn every_entry_names_its_own_opcode() {
    for sets in [Sets::CPU_6502, Sets::CPU_R65C02, Sets::CPU_65CE02] {
        let set = InstructionSet::new(sets).unwrap();
        for b in 0..=255u8 {
            if let Some(info) = set.get(b) {
                assert_eq!(info.opcode, b);
                assert!(info.mode.operand_size_bytes() <= 2);
            }
        }
    }
}

#[test]
fn disassembly_starts_with_the_mnemonic() {
    let set = InstructionSet::new(Sets::CPU_R65C02).unwrap();
    for b in 0..=255u8 {
        if let Some(info) = set.get(b) {
            let text = set.disassemble(0x1000, [b, 0, 0]);
            assert!(
                text.starts_with(info.mnemonic),
                "opcode {b:02x}: {text:?} does not start with {:?}",
                info.mnemonic
            );
        }
    }
}

#[test]
fn undefined_opcodes_disassemble_as_undefined() {
    let set = InstructionSet::new(Sets::CPU_6502).unwrap();
    assert_eq!(set.disassemble(0x1000, [0x02, 0, 0]), "undefined 02");
}

#[test]
fn disassembly_operand_rendering() {
    let set = InstructionSet::new(Sets::CPU_R65C02).unwrap();
    assert_eq!(set.disassemble(0x1000, [0xea, 0, 0]), "nop");
    assert_eq!(set.disassemble(0x1000, [0x0a, 0, 0]), "asl a");
    assert_eq!(set.disassemble(0x1000, [0xa9, 0x42, 0]), "lda #$42");
    assert_eq!(set.disassemble(0x1000, [0xa5, 0x42, 0]), "lda $42");
    assert_eq!(set.disassemble(0x1000, [0xb5, 0x42, 0]), "lda $42,x");
    assert_eq!(set.disassemble(0x1000, [0xb2, 0x42, 0]), "lda ($42)");
    assert_eq!(set.disassemble(0x1000, [0xa1, 0x42, 0]), "lda ($42,x)");
    assert_eq!(set.disassemble(0x1000, [0xb1, 0x42, 0]), "lda ($42),y");
    assert_eq!(set.disassemble(0x1000, [0xad, 0x34, 0x12]), "lda $1234");
    assert_eq!(set.disassemble(0x1000, [0x6c, 0x34, 0x12]), "jmp ($1234)");
    // relative targets resolve against the end of the instruction
    assert_eq!(set.disassemble(0x1000, [0xd0, 0x10, 0]), "bne $1012");
    assert_eq!(set.disassemble(0x1000, [0xd0, 0xfe, 0]), "bne $1000");
}

#[test]
fn rockwell_rows_replicate_across_bit_numbers() {
    let set = InstructionSet::new(Sets::CPU_R6502).unwrap();
    for bit in 0..8u8 {
        let rmb = set.get(0x07 + (bit << 4)).unwrap();
        assert_eq!((rmb.mnemonic, rmb.mode), ("rmb", Mode::ZeroPage));
        let smb = set.get(0x87 + (bit << 4)).unwrap();
        assert_eq!((smb.mnemonic, smb.mode), ("smb", Mode::ZeroPage));
        let bbr = set.get(0x0f + (bit << 4)).unwrap();
        assert_eq!((bbr.mnemonic, bbr.mode), ("bbr", Mode::ZpRelative));
        let bbs = set.get(0x8f + (bit << 4)).unwrap();
        assert_eq!((bbs.mnemonic, bbs.mode), ("bbs", Mode::ZpRelative));
    }
    assert_eq!(set.disassemble(0x1000, [0x37, 0x12, 0]), "rmb3 $12");
    assert_eq!(set.disassemble(0x1000, [0xcf, 0x12, 0x10]), "bbs4 $12,$1013");
}

#[test]
fn profiles_gate_family_opcodes() {
    let nmos = InstructionSet::new(Sets::CPU_6502).unwrap();
    assert!(nmos.get(0x72).is_none()); // adc (zp) is CMOS
    assert!(nmos.get(0x07).is_none()); // rmb0 is Rockwell
    assert!(nmos.get(0x80).is_none()); // bra is CMOS
    assert!(nmos.get(0xdb).is_none()); // stp is WDC

    let r6502 = InstructionSet::new(Sets::CPU_R6502).unwrap();
    assert!(r6502.get(0x07).is_some());
    assert!(r6502.get(0x72).is_none());

    let r65c02 = InstructionSet::new(Sets::CPU_R65C02).unwrap();
    assert!(r65c02.get(0x72).is_some());
    assert!(r65c02.get(0x07).is_some());
    assert!(r65c02.get(0xdb).is_none());

    let wdc = InstructionSet::new(Sets::CPU_WDC65C02).unwrap();
    assert_eq!(wdc.get(0xdb).unwrap().mnemonic, "stp");
    assert_eq!(wdc.get(0xcb).unwrap().mnemonic, "wai");
}

#[test]
fn mnemonic_lookup_is_case_insensitive_and_mode_suffixed() {
    let set = InstructionSet::new(Sets::CPU_6502).unwrap();

    // zero-page and absolute legally share the bare mnemonic
    let lda = set.get_mnemonic("lda").unwrap();
    assert_eq!(lda.len(), 2);
    let modes: Vec<Mode> = lda.iter().map(|i| i.mode).collect();
    assert!(modes.contains(&Mode::ZeroPage));
    assert!(modes.contains(&Mode::Absolute));

    assert_eq!(set.get_mnemonic("LDA#").unwrap()[0].opcode, 0xa9);
    assert_eq!(set.get_mnemonic("ldax").unwrap().len(), 2);
    assert_eq!(set.get_mnemonic("lda@y").unwrap()[0].opcode, 0xb1);
    assert_eq!(set.get_mnemonic("ldax@").unwrap()[0].opcode, 0xa1);
    assert_eq!(set.get_mnemonic("asla").unwrap()[0].opcode, 0x0a);
    assert!(set.get_mnemonic("lda@").is_none()); // (zp) needs CMOS
    assert!(set.valid_mnemonic("JMP"));
    assert!(!set.valid_mnemonic("xyzzy"));
}

#[test]
fn static_cycle_counts() {
    let set = InstructionSet::new(Sets::CPU_R65C02).unwrap();
    let total = |opcode: u8| {
        let info = set.get(opcode).unwrap();
        info.base_cycles + info.mode.added_cycles()
    };
    assert_eq!(total(0xa9), 2); // lda #
    assert_eq!(total(0xa5), 3); // lda zp
    assert_eq!(total(0xb5), 4); // lda zp,x
    assert_eq!(total(0xad), 4); // lda abs
    assert_eq!(total(0xbd), 4); // lda abs,x (+1 on page cross)
    assert_eq!(total(0xa1), 6); // lda (zp,x)
    assert_eq!(total(0xb1), 5); // lda (zp),y (+1 on page cross)
    assert_eq!(total(0xb2), 5); // lda (zp)
    assert_eq!(total(0x85), 3); // sta zp
    assert_eq!(total(0x9d), 5); // sta abs,x
    assert_eq!(total(0x91), 6); // sta (zp),y
    assert_eq!(total(0x06), 5); // asl zp
    assert_eq!(total(0x1e), 6); // asl abs,x (+penalties)
    assert_eq!(total(0xfe), 7); // inc abs,x
    assert_eq!(total(0x4c), 3); // jmp abs
    assert_eq!(total(0x6c), 5); // jmp (abs), +1 CMOS fix-up
    assert!(set.get(0x6c).unwrap().cmos_extra_cycle);
    assert_eq!(total(0x7c), 6); // jmp (abs,x)
    assert_eq!(total(0x20), 6); // jsr abs
    assert_eq!(total(0x60), 6); // rts
    assert_eq!(total(0x00), 7); // brk
    assert_eq!(total(0x48), 3); // pha
    assert_eq!(total(0x68), 4); // pla
    assert_eq!(total(0x14), 5); // trb zp
    assert_eq!(total(0x1c), 6); // trb abs
    assert_eq!(total(0x07), 5); // rmb0 zp
    assert_eq!(total(0x0f), 5); // bbr0 zp,rel
}

#[test]
fn page_crossing_flags_mark_read_not_write_modes() {
    let set = InstructionSet::new(Sets::CPU_6502).unwrap();
    assert!(set.get(0xbd).unwrap().page_crossing_extra_cycle); // lda abs,x
    assert!(set.get(0xb9).unwrap().page_crossing_extra_cycle); // lda abs,y
    assert!(set.get(0xb1).unwrap().page_crossing_extra_cycle); // lda (zp),y
    assert!(!set.get(0x9d).unwrap().page_crossing_extra_cycle); // sta abs,x
    assert!(!set.get(0x91).unwrap().page_crossing_extra_cycle); // sta (zp),y
    assert!(set.get(0x1e).unwrap().nmos_extra_cycle_forced); // asl abs,x
    assert!(!set.get(0xbd).unwrap().nmos_extra_cycle_forced);
}

#[test]
fn opcode_matrix_lists_every_defined_opcode() {
    let set = InstructionSet::new(Sets::CPU_6502).unwrap();
    let matrix = set.opcode_matrix(false);
    assert!(matrix.contains("brk"));
    assert!(matrix.contains("151 opcodes"));

    let detail = set.opcode_matrix(true);
    assert!(detail.contains("lda#"));
    assert!(detail.contains("151 opcodes"));
}

#[test]
fn summary_table_lists_modes_and_opcodes() {
    let set = InstructionSet::new(Sets::CPU_6502).unwrap();
    let table = set.summary_table();
    assert!(table.contains("lda#"));
    assert!(table.lines().any(|l| l.starts_with("jmp")));
    assert!(table.contains("abs:4c"));
}
