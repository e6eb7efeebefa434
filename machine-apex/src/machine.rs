//! The emulated machine: CPU, memory, and the APEX personality.
//!
//! The main loop alternates between CPU instruction execution and APEX
//! vector servicing depending on whether the program counter lies inside
//! the trap window. Every way the loop can end is a typed [`Halt`]; what to
//! do about it (exit codes, register dumps) is the host's decision.

use std::fmt;
use std::path::Path;

use cpu_6502::flags::D;
use cpu_6502::{CpuError, Cpu6502, InstructionSetError, Sets, Step};

use crate::apex::Apex;
use crate::devices::CharacterDevice;
use crate::memory::{LoadError, Memory};
use crate::sys_page::{in_vector_window, offsets, SYS_PAGE_ADDRESS};

/// Executable image formats the machine can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutableFormat {
    ApexSav,
    ApexBin,
    RawBinary,
}

/// The normal-exit entry vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitVector {
    /// Warm start: normal program exit.
    Krentr,
    /// Preserve-user-image request.
    Ksaver,
    /// Cold-reboot request.
    Krelod,
}

impl fmt::Display for ExitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExitVector::Krentr => "KRENTR",
            ExitVector::Ksaver => "KSAVER",
            ExitVector::Krelod => "KRELOD",
        })
    }
}

/// Why the machine stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Halt {
    /// The program ended through an APEX exit vector.
    Exit(ExitVector),
    /// The CPU latched a halt (branch or jump to itself).
    TightLoop { pc: u16 },
    /// Fatal CPU error (undefined opcode).
    Cpu(CpuError),
    /// A stubbed APEX vector (KSCAN, KREAD, KWRITE) was called.
    UnimplementedVector(&'static str),
    /// The program counter was inside the trap window but on no known
    /// vector.
    UnrecognizedVector { pc: u16 },
    /// KHAND was called with no device installed or an unsupported
    /// function code.
    HandlerFailure { nowdev: u8, a: u8, x: u8, y: u8 },
}

impl Halt {
    /// Whether this is an orderly program exit rather than a fault.
    #[must_use]
    pub fn is_normal_exit(&self) -> bool {
        matches!(self, Halt::Exit(_))
    }
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Halt::Exit(vector) => write!(f, "program exited via {vector}"),
            Halt::TightLoop { pc } => write!(f, "halted in a tight loop at {pc:04x}"),
            Halt::Cpu(e) => write!(f, "{e}"),
            Halt::UnimplementedVector(name) => write!(f, "{name} not implemented"),
            Halt::UnrecognizedVector { pc } => {
                write!(f, "unrecognized APEX entry vector {pc:04x}")
            }
            Halt::HandlerFailure { nowdev, a, x, y } => write!(
                f,
                "bad KHAND call, NOWDEV {nowdev:02x}, A {a:02x}, X {x:02x}, Y {y:02x}"
            ),
        }
    }
}

/// An APEX machine: 6502 plus flat memory plus the OS personality.
pub struct ApexMachine {
    pub cpu: Cpu6502,
    pub memory: Memory,
    pub apex: Apex,
}

impl ApexMachine {
    /// Build a machine for the given CPU profile, in reset state with no
    /// devices installed.
    pub fn new(sets: Sets) -> Result<Self, InstructionSetError> {
        Ok(Self {
            cpu: Cpu6502::new(sets)?,
            memory: Memory::new(),
            apex: Apex::new(),
        })
    }

    /// Install a character device in the APEX device table.
    pub fn install_character_device(&mut self, device_number: usize, device: CharacterDevice) {
        self.apex.install_character_device(device_number, device);
    }

    /// Prepare OS state for a program run. Decimal mode is cleared here no
    /// matter what the status register defaulted to.
    pub fn init(&mut self) {
        self.cpu.regs.p.clear(D);
        self.apex.init(&mut self.memory);
    }

    /// Load an executable and point the CPU at its entry.
    ///
    /// SAV and BIN images start through the system-page start vector; raw
    /// images are placed at `load_address` and enter at `execution_address`.
    pub fn load_executable(
        &mut self,
        format: ExecutableFormat,
        path: &Path,
        load_address: u16,
        execution_address: u16,
    ) -> Result<(), LoadError> {
        match format {
            ExecutableFormat::ApexSav => {
                self.memory.load_apex_sav(path)?;
                self.cpu.regs.pc = SYS_PAGE_ADDRESS + offsets::VSTART;
            }
            ExecutableFormat::ApexBin => {
                self.memory.load_apex_bin(path)?;
                self.cpu.regs.pc = SYS_PAGE_ADDRESS + offsets::VSTART;
            }
            ExecutableFormat::RawBinary => {
                self.memory.load_raw_bin(path, load_address)?;
                self.cpu.regs.pc = execution_address;
            }
        }
        Ok(())
    }

    /// Execute one unit of work: an APEX vector call (followed by the
    /// synthetic RTS) when the program counter is trapped, otherwise one
    /// CPU instruction.
    pub fn step(&mut self) -> Option<Halt> {
        if in_vector_window(self.cpu.regs.pc) {
            let halt = self
                .apex
                .vector_exec(&mut self.cpu.regs, &mut self.memory);
            if halt.is_some() {
                return halt;
            }
            self.cpu.execute_rts(&mut self.memory);
            None
        } else {
            match self.cpu.step(&mut self.memory) {
                Ok(Step::Continue) => None,
                Ok(Step::Halt { pc }) => Some(Halt::TightLoop { pc }),
                Err(e) => Some(Halt::Cpu(e)),
            }
        }
    }

    /// Run until the program halts.
    pub fn run(&mut self) -> Halt {
        loop {
            if let Some(halt) = self.step() {
                return halt;
            }
        }
    }
}
