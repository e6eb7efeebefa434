//! APEX operating-system personality.
//!
//! Programs call the OS through the jump vectors in the system page. The
//! emulator never executes resident OS code; when the program counter lands
//! in the vector window the personality services the request directly,
//! mutating registers and memory, and the machine then drives a synthetic
//! RTS back to the caller.

use cpu_6502::flags::C;
use cpu_6502::Registers;
use log::{error, info};

use crate::devices::CharacterDevice;
use crate::machine::{ExitVector, Halt};
use crate::memory::Memory;
use crate::sys_page::{offsets, SYS_PAGE_ADDRESS};

/// Number of slots in the character-device table.
pub const MAX_CHAR_DEVICE: usize = 8;

/// The personality layer: OS state plus the installed character devices.
pub struct Apex {
    character_devices: [Option<CharacterDevice>; MAX_CHAR_DEVICE],
}

impl Apex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            character_devices: Default::default(),
        }
    }

    /// Set up system-page state in preparation to run a user program.
    pub fn init(&self, memory: &mut Memory) {
        memory.write_8(SYS_PAGE_ADDRESS + offsets::LINIDX, 0xff);
        // for unknown reasons, I2L uses the console device handler LINPTR,
        // but calls it LINIDX
        memory.write_8(SYS_PAGE_ADDRESS + offsets::LINPTR, 0xff);
    }

    /// Install a device at a table slot.
    ///
    /// # Panics
    ///
    /// Panics if `device_number` is not below [`MAX_CHAR_DEVICE`].
    pub fn install_character_device(&mut self, device_number: usize, device: CharacterDevice) {
        self.character_devices[device_number] = Some(device);
    }

    /// Service the APEX call whose vector `pc` points at.
    ///
    /// Returns `None` when the call was serviced and execution should resume
    /// through a synthetic RTS, or the halt that ends the program.
    pub fn vector_exec(&mut self, regs: &mut Registers, memory: &mut Memory) -> Option<Halt> {
        match regs.pc.wrapping_sub(SYS_PAGE_ADDRESS) {
            offsets::KRENTR => {
                info!("program exited via KRENTR");
                Some(Halt::Exit(ExitVector::Krentr))
            }
            offsets::KSAVER => {
                info!("program exited via KSAVER");
                Some(Halt::Exit(ExitVector::Ksaver))
            }
            offsets::KRELOD => {
                info!("program exited via KRELOD");
                Some(Halt::Exit(ExitVector::Krelod))
            }
            offsets::KHAND => self.khand(regs, memory),
            offsets::KSCAN => {
                // takes a pointer to an 11-character blank-padded file name
                // in (A, Y); success would fill in BLKNO and ENDBLK
                error!("KSCAN not implemented");
                Some(Halt::UnimplementedVector("KSCAN"))
            }
            offsets::KRESTD => {
                // reset disk driver: nothing to reset, report success
                regs.p.clear(C);
                None
            }
            offsets::KREAD => {
                error!("KREAD not implemented");
                Some(Halt::UnimplementedVector("KREAD"))
            }
            offsets::KWRITE => {
                error!("KWRITE not implemented");
                Some(Halt::UnimplementedVector("KWRITE"))
            }
            _ => {
                error!("unrecognized APEX entry vector {:04x}", regs.pc);
                Some(Halt::UnrecognizedVector { pc: regs.pc })
            }
        }
    }

    /// KHAND: byte I/O on the device selected by `NOWDEV`.
    ///
    /// X carries the handler entry offset; the byte travels in A. Success
    /// clears the emulated carry, failure sets it. A missing device or an
    /// unsupported function code is fatal.
    fn khand(&mut self, regs: &mut Registers, memory: &mut Memory) -> Option<Halt> {
        let function = regs.x;
        let nowdev = memory.read_8(SYS_PAGE_ADDRESS + offsets::NOWDEV);

        let device = self
            .character_devices
            .get_mut(nowdev as usize)
            .and_then(Option::as_mut);
        if let Some(device) = device {
            let ok = match function {
                0x00 => Some(device.open_for_input(regs)),
                0x03 => Some(device.open_for_output(regs)),
                0x06 => Some(device.input_byte(regs)),
                0x09 => Some(device.output_byte(regs)),
                0x0c => Some(device.close(regs)),
                // the non-blocking poll only exists on the console units
                0x0f if nowdev <= 1 => Some(device.input_byte_available(regs)),
                _ => None,
            };
            if let Some(ok) = ok {
                regs.p.assign(C, !ok);
                return None;
            }
        }
        error!(
            "bad KHAND call, NOWDEV {nowdev:02x}, A {:02x}, X {:02x}, Y {:02x}",
            regs.a, regs.x, regs.y
        );
        Some(Halt::HandlerFailure {
            nowdev,
            a: regs.a,
            x: regs.x,
            y: regs.y,
        })
    }
}

impl Default for Apex {
    fn default() -> Self {
        Self::new()
    }
}
