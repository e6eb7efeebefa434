//! Flat memory image with executable loaders.
//!
//! Memory is a plain 64 KiB byte array with no ROM/RAM partitioning;
//! write protection, if wanted, is the caller's business. Multi-byte
//! accessors are strictly little-endian. Three executable formats load into
//! it:
//!
//! - raw binary images placed at a caller-supplied address,
//! - APEX BIN, an ASCII-hex format where `*XXXX` tokens set the store
//!   cursor and `XX` tokens deposit bytes,
//! - APEX SAV, 256-byte page images whose first page carries the program's
//!   system-page header.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cpu_6502::Bus;
use log::info;
use thiserror::Error;

use crate::sys_page::{
    offsets, PAGE_SIZE, SYS_PAGE_ADDRESS, SYS_PAGE_PROGRAM_AREA_SIZE,
};

/// Size of the emulated address space.
pub const MEMORY_SIZE: usize = 0x10000;

/// Executable-loading failures.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("can't open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// BIN data byte seen before any `*XXXX` address token.
    #[error("object file doesn't start with an address")]
    MissingLoadAddress,
    #[error("load runs past the end of memory")]
    OutOfRange,
}

/// The flat memory image.
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
    trace: bool,
}

impl Memory {
    /// Create a zero-filled memory image.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: [0; MEMORY_SIZE],
            trace: false,
        }
    }

    /// Enable or disable write tracing.
    pub fn set_trace(&mut self, value: bool) {
        self.trace = value;
    }

    /// Read one byte.
    #[must_use]
    pub fn read_8(&self, addr: u16) -> u8 {
        self.bytes[addr as usize]
    }

    /// Read a little-endian 16-bit word.
    #[must_use]
    pub fn read_16_le(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read_8(addr), self.read_8(addr.wrapping_add(1))])
    }

    /// Write one byte, emitting a trace line when tracing is on.
    pub fn write_8(&mut self, addr: u16, data: u8) {
        if self.trace {
            println!("    wrote addr {addr:04x} data {data:02x}");
        }
        self.bytes[addr as usize] = data;
    }

    /// Write a little-endian 16-bit word.
    pub fn write_16_le(&mut self, addr: u16, data: u16) {
        let [low, high] = data.to_le_bytes();
        self.write_8(addr, low);
        self.write_8(addr.wrapping_add(1), high);
    }

    /// Load a headerless binary image at `load_address`.
    pub fn load_raw_bin(&mut self, path: &Path, load_address: u16) -> Result<(), LoadError> {
        let data = read_file(path)?;
        let start = load_address as usize;
        let end = start.checked_add(data.len()).ok_or(LoadError::OutOfRange)?;
        if end > MEMORY_SIZE {
            return Err(LoadError::OutOfRange);
        }
        self.bytes[start..end].copy_from_slice(&data);
        info!("loaded {} ({:#06x}) bytes", data.len(), data.len());
        Ok(())
    }

    /// Load an APEX BIN (ASCII hex) image.
    ///
    /// `*` introduces a 4-hex-digit store address; subsequent 2-hex-digit
    /// bytes are deposited at the advancing cursor. Anything outside
    /// `[0-9a-fA-F*]` is ignored.
    pub fn load_apex_bin(&mut self, path: &Path) -> Result<(), LoadError> {
        let data = read_file(path)?;
        let mut address: Option<u32> = None;
        let mut reading_address = false;
        let mut value: u16 = 0;
        let mut digit_count = 0;
        for &c in &data {
            if c == b'*' {
                reading_address = true;
                digit_count = 0;
                value = 0;
                continue;
            }
            let Some(digit) = (c as char).to_digit(16) else {
                continue;
            };
            value = (value << 4) | digit as u16;
            digit_count += 1;
            if reading_address {
                if digit_count < 4 {
                    continue;
                }
                address = Some(u32::from(value));
                reading_address = false;
            } else {
                if digit_count < 2 {
                    continue;
                }
                let addr = address.as_mut().ok_or(LoadError::MissingLoadAddress)?;
                if *addr as usize >= MEMORY_SIZE {
                    return Err(LoadError::OutOfRange);
                }
                self.bytes[*addr as usize] = value as u8;
                *addr += 1;
            }
            digit_count = 0;
            value = 0;
        }
        Ok(())
    }

    /// Load an APEX SAV page image.
    ///
    /// Page 0 is split: its first [`SYS_PAGE_PROGRAM_AREA_SIZE`] bytes are
    /// the program's system-page header and land at [`SYS_PAGE_ADDRESS`];
    /// the rest populates low memory from $0050. The remaining pages are
    /// laid down sequentially from the address stored at `SYS_PAGE+USRMEM`.
    pub fn load_apex_sav(&mut self, path: &Path) -> Result<(), LoadError> {
        let data = read_file(path)?;
        let mut address: usize = 0;
        let mut loaded_size = 0;
        let mut first_page = true;
        for page in data.chunks_exact(PAGE_SIZE) {
            if first_page {
                let split = SYS_PAGE_PROGRAM_AREA_SIZE;
                let sys_page = SYS_PAGE_ADDRESS as usize;
                self.bytes[sys_page..sys_page + split].copy_from_slice(&page[..split]);
                self.bytes[split..PAGE_SIZE].copy_from_slice(&page[split..]);
                address = usize::from(self.read_16_le(SYS_PAGE_ADDRESS + offsets::USRMEM));
                info!("loading at {address:04x}");
                first_page = false;
            } else {
                if address + PAGE_SIZE > MEMORY_SIZE {
                    return Err(LoadError::OutOfRange);
                }
                self.bytes[address..address + PAGE_SIZE].copy_from_slice(page);
                address += PAGE_SIZE;
                loaded_size += PAGE_SIZE;
            }
        }
        info!(
            "loading ended at {:04x}, size {loaded_size}",
            address.saturating_sub(1)
        );
        Ok(())
    }

    /// Dump `size` bytes of memory starting at `start` to a file, verbatim.
    pub fn dump_raw_bin(&self, path: &Path, start: u16, size: usize) -> Result<(), LoadError> {
        let start = start as usize;
        let end = start.checked_add(size).ok_or(LoadError::OutOfRange)?;
        if end > MEMORY_SIZE {
            return Err(LoadError::OutOfRange);
        }
        fs::write(path, &self.bytes[start..end]).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for Memory {
    fn read(&mut self, addr: u16) -> u8 {
        self.read_8(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.write_8(addr, value);
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
