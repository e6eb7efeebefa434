//! APEX machine emulation.
//!
//! This crate provides the user-mode APEX machine:
//! - flat 64 KiB memory with raw, APEX BIN, and APEX SAV loaders
//! - the APEX system page and entry-vector trap window
//! - character devices (console, printer, byte file, null)
//! - the main loop joining the 6502 core to the OS personality
//!
//! The disk-backed vectors (KSCAN, KREAD, KWRITE) are intentionally not
//! implemented; calling one ends the program.

mod apex;
mod devices;
mod machine;
mod memory;
pub mod sys_page;

pub use apex::{Apex, MAX_CHAR_DEVICE};
pub use devices::{CharacterDevice, Console, FileByte, NullDevice, Printer, EOF_CHARACTER};
pub use machine::{ApexMachine, ExecutableFormat, ExitVector, Halt};
pub use memory::{LoadError, Memory, MEMORY_SIZE};
