//! APEX system-page layout.
//!
//! APEX keeps its state and entry vectors in a fixed 256-byte page at
//! $BF00. Offsets $00-$4F belong to the loaded program; $50-$FF belong to
//! the operating system. Calls into the resident OS go through the jump
//! vectors at $D0-$E7, which the emulator traps by address instead of
//! executing 6502 code.

/// A memory page, and the granularity of SAV images.
pub const PAGE_SIZE: usize = 0x100;

/// Base address of the system page.
pub const SYS_PAGE_ADDRESS: u16 = 0xbf00;

/// Size of the program-owned area at the start of the system page.
pub const SYS_PAGE_PROGRAM_AREA_SIZE: usize = 0x50;

/// System-page offsets. Widths and meanings follow the APEX manual; the
/// emulator itself only touches a handful of them.
pub mod offsets {
    // offsets 0x00 through 0x4f belong to the program

    pub const VRSTRT: u16 = 0x00; // 3 (JMP)  program restart vector
    pub const VSTART: u16 = 0x03; // 3 (JMP)  program start vector
    pub const VEXIT: u16 = 0x06; //  3 (JMP)  program normal exit, usually KRENTR
    pub const VERROR: u16 = 0x09; // 3 (JMP)  program error exit, usually KRELOD
    pub const VABORT: u16 = 0x0c; // 3 (JMP)  user abort exit, usually KSAVER

    pub const USRMEM: u16 = 0x15; // 2        base addr of user program
    pub const PROSIZ: u16 = 0x17; // 1        user program size in pages

    pub const RERUNF: u16 = 0x20; // 1        rerun flag
    pub const DEXTO: u16 = 0x21; //  3        default extension for output files
    pub const DESTI: u16 = 0x24; //  3        default extension for input files
    pub const DEFAUL: u16 = 0x27; // 1        single bit default flags
    pub const SYBOMB: u16 = 0x28; // 1        $ff if prog bombs system
    pub const USRTOP: u16 = 0x29; // 1        last page+1 for user program

    pub const OTBUFD: u16 = 0x36; // 2        base of output buffer
    pub const OTBUFE: u16 = 0x38; // 2        end of output buffer
    pub const INBUFD: u16 = 0x3a; // 2        base of input buffer
    pub const INBUFE: u16 = 0x3c; // 2        end of input buffer

    // offsets 0x50 through 0xff belong to Apex

    pub const SYSENF: u16 = 0x50; // 1        flag showing re-entry condition
    pub const DEVMSK: u16 = 0x51; // 1        mask showing valid units
    pub const SYSDEV: u16 = 0x52; // 1        unit system is on
    pub const SYSBLK: u16 = 0x53; // 2        block system file is on
    pub const SWPBLK: u16 = 0x55; // 2        block swap file is in
    pub const SYSDAT: u16 = 0x57; // 3        system date
    pub const LINIDX: u16 = 0x5a; // 2        input line pointer ($ff = null)
    pub const NOWDEV: u16 = 0x5c; // 1        current byte I/O device
    pub const EXECUT: u16 = 0x5d; // 1        zero if exec mode is on
    pub const LOWER: u16 = 0x5e; //  1        lower case switch (0 = upper)

    pub const ERRDEV: u16 = 0x5f; // 1        error device number
    pub const ERRNUM: u16 = 0x60; // 1        device handler error number
    pub const LINPTR: u16 = 0x61; // 1        handler's input line pointer ($ff = null)
    pub const SAVBLK: u16 = 0x62; // 2        disk driver aux word
    pub const LOKMSK: u16 = 0x64; // 1        disk driver locked units mask
    pub const CONHOR: u16 = 0x65; //          console width, characters per line

    // I/O information block for unit drivers
    pub const UNIT: u16 = 0x68; //   1        current unit number
    pub const BLKNO: u16 = 0x69; //  2        current block number
    pub const NBLKS: u16 = 0x6b; //  1        number of blocks to transfer
    pub const FADDR: u16 = 0x6c; //  2        address pointer
    pub const ENDBLK: u16 = 0x6e; // 2        auxiliary parameter

    // output file information
    pub const OTLBLK: u16 = 0x70; // 2        first block of output file
    pub const OTHBLK: u16 = 0x72; // 2        last block of output file
    pub const OTFLG: u16 = 0x74; //  1        status flags
    pub const OTNO: u16 = 0x75; //   1        directory number of output file
    pub const OTDEV: u16 = 0x76; //  1        unit number of output file

    // input file information
    pub const INLBLK: u16 = 0x78; // 2        first block of input file
    pub const INHBLK: u16 = 0x7a; // 2        last block of input file
    pub const INFLG: u16 = 0x7c; //  1        status flags
    pub const INNO: u16 = 0x7d; //   1        directory number of input file
    pub const INDEV: u16 = 0x7e; //  1        unit number of input file

    pub const DRVTAB: u16 = 0xc0; // 16       8 pointers to I/O device handlers

    // entry vectors to resident code
    pub const KRENTR: u16 = 0xd0; // 3 (JMP)  boot in Apex (warm start)
    pub const KSAVER: u16 = 0xd3; // 3 (JMP)  preserve current user image
    pub const KRELOD: u16 = 0xd6; // 3 (JMP)  reload Apex (cold start)
    pub const KHAND: u16 = 0xd9; //  3 (JMP)  byte I/O routine
    pub const KSCAN: u16 = 0xdc; //  3 (JMP)  file lookup routine
    pub const KRESTD: u16 = 0xdf; // 3 (JMP)  reset disk driver
    pub const KREAD: u16 = 0xe2; //  3 (JMP)  read contiguous disk blocks
    pub const KWRITE: u16 = 0xe5; // 3 (JMP)  write contiguous disk blocks

    pub const KSSPND: u16 = 0xfd; // 3        suspend
}

/// First address of the vector-trap window.
pub const VECTOR_START: u16 = SYS_PAGE_ADDRESS + offsets::KRENTR;

/// One past the last address of the vector-trap window.
pub const VECTOR_END: u16 = SYS_PAGE_ADDRESS + offsets::KWRITE + 3;

/// Whether `pc` lies inside the vector-trap window, meaning the main loop
/// must service an APEX call instead of executing an instruction.
#[must_use]
pub fn in_vector_window(pc: u16) -> bool {
    (VECTOR_START..VECTOR_END).contains(&pc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_bounds() {
        assert!(!in_vector_window(0xbfcf));
        assert!(in_vector_window(0xbfd0));
        assert!(in_vector_window(0xbfe7));
        assert!(!in_vector_window(0xbfe8));
    }
}
