//! APEX character devices.
//!
//! A device is a byte-streaming endpoint with the capability set
//! `{open_for_input, open_for_output, input_byte, output_byte,
//! input_byte_available, close}`. The set of kinds is small and closed, so
//! the devices are a tagged enum rather than trait objects. Bytes travel
//! through the emulated A register; each method reports success or failure,
//! which the personality layer reflects into the carry flag.
//!
//! APEX lines end in CR; the host uses LF. The console and the text-mode
//! file devices translate between the two conventions.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use cpu_6502::Registers;

/// The APEX end-of-file character (control-Z, ASCII SUB).
pub const EOF_CHARACTER: u8 = 0x1a;

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// A character device installed in the personality's device table.
pub enum CharacterDevice {
    Console(Console),
    Printer(Printer),
    File(FileByte),
    Null(NullDevice),
}

impl CharacterDevice {
    pub fn open_for_input(&mut self, _regs: &mut Registers) -> bool {
        match self {
            CharacterDevice::Console(_) | CharacterDevice::Null(_) => true,
            CharacterDevice::Printer(_) => false,
            CharacterDevice::File(dev) => dev.open_for_input(),
        }
    }

    pub fn open_for_output(&mut self, _regs: &mut Registers) -> bool {
        match self {
            CharacterDevice::Console(_) | CharacterDevice::Null(_) => true,
            CharacterDevice::Printer(dev) => dev.open_for_output(),
            CharacterDevice::File(dev) => dev.open_for_output(),
        }
    }

    pub fn input_byte(&mut self, regs: &mut Registers) -> bool {
        match self {
            CharacterDevice::Console(dev) => dev.input_byte(regs),
            CharacterDevice::Printer(_) => {
                regs.a = EOF_CHARACTER;
                false
            }
            CharacterDevice::File(dev) => dev.input_byte(regs),
            CharacterDevice::Null(_) => {
                regs.a = EOF_CHARACTER;
                true
            }
        }
    }

    pub fn output_byte(&mut self, regs: &mut Registers) -> bool {
        match self {
            CharacterDevice::Console(dev) => dev.output_byte(regs),
            CharacterDevice::Printer(dev) => dev.output_byte(regs),
            CharacterDevice::File(dev) => dev.output_byte(regs),
            CharacterDevice::Null(_) => true, // discard
        }
    }

    /// Non-blocking input poll. Not implemented for any host stream, so
    /// every device reports "no byte waiting".
    pub fn input_byte_available(&mut self, _regs: &mut Registers) -> bool {
        false
    }

    pub fn close(&mut self, _regs: &mut Registers) -> bool {
        match self {
            CharacterDevice::Printer(dev) => dev.close(),
            CharacterDevice::File(dev) => dev.close(),
            _ => true,
        }
    }
}

/// Console device: host standard input and output.
///
/// Streams are injectable so the translation logic is testable off the real
/// terminal.
pub struct Console {
    input: Box<dyn Read>,
    output: Box<dyn Write>,
    /// Set after emitting a CR-driven newline, so the LF of a CR/LF pair is
    /// swallowed instead of printing a blank line.
    prev_out_was_cr: bool,
}

impl Console {
    /// Console on the host's standard streams.
    #[must_use]
    pub fn new() -> Self {
        Self::with_streams(Box::new(io::stdin()), Box::new(io::stdout()))
    }

    /// Console on arbitrary streams.
    #[must_use]
    pub fn with_streams(input: Box<dyn Read>, output: Box<dyn Write>) -> Self {
        Self {
            input,
            output,
            prev_out_was_cr: false,
        }
    }

    fn input_byte(&mut self, regs: &mut Registers) -> bool {
        // Pending prompt text has to reach the terminal before we block.
        let _ = self.output.flush();
        let mut byte = [0u8; 1];
        match self.input.read(&mut byte) {
            Ok(0) => {
                regs.a = EOF_CHARACTER;
                true
            }
            Ok(_) => {
                regs.a = if byte[0] == LF { CR } else { byte[0] };
                true
            }
            Err(_) => false,
        }
    }

    fn output_byte(&mut self, regs: &mut Registers) -> bool {
        let c = regs.a;
        if c == CR {
            self.prev_out_was_cr = true;
            return self.output.write_all(&[LF]).is_ok();
        }
        let suppress = c == LF && self.prev_out_was_cr;
        self.prev_out_was_cr = false;
        if suppress {
            return true;
        }
        self.output.write_all(&[c]).is_ok()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

/// Printer device: write-only host file, CR translated to LF.
pub struct Printer {
    file: Option<File>,
    open: bool,
}

impl Printer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            file: None,
            open: false,
        }
    }

    /// Attach the host file the printer writes to.
    pub fn open_output_file(&mut self, path: &Path) -> io::Result<()> {
        self.file = Some(File::create(path)?);
        Ok(())
    }

    fn open_for_output(&mut self) -> bool {
        self.open = true;
        true
    }

    fn output_byte(&mut self, regs: &mut Registers) -> bool {
        if !self.open {
            return false;
        }
        let Some(file) = &mut self.file else {
            return false;
        };
        let c = if regs.a == CR { LF } else { regs.a };
        file.write_all(&[c]).is_ok()
    }

    fn close(&mut self) -> bool {
        self.open = false;
        if let Some(file) = &mut self.file {
            let _ = file.flush();
        }
        true
    }
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte-oriented file device with independent input and output sides, each
/// in text or binary mode.
pub struct FileByte {
    input: Option<File>,
    input_binary_mode: bool,
    input_open: bool,
    input_at_eof: bool,

    output: Option<File>,
    output_binary_mode: bool,
    output_open: bool,
}

impl FileByte {
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: None,
            input_binary_mode: false,
            input_open: false,
            input_at_eof: false,
            output: None,
            output_binary_mode: false,
            output_open: false,
        }
    }

    /// Attach the host file backing the input side.
    pub fn open_input_file(&mut self, path: &Path, binary_mode: bool) -> io::Result<()> {
        self.input = Some(File::open(path)?);
        self.input_binary_mode = binary_mode;
        Ok(())
    }

    /// Attach the host file backing the output side.
    pub fn open_output_file(&mut self, path: &Path, binary_mode: bool) -> io::Result<()> {
        self.output = Some(File::create(path)?);
        self.output_binary_mode = binary_mode;
        Ok(())
    }

    fn open_for_input(&mut self) -> bool {
        let Some(file) = &mut self.input else {
            return false;
        };
        if file.seek(SeekFrom::Start(0)).is_err() {
            return false;
        }
        self.input_open = true;
        self.input_at_eof = false;
        true
    }

    fn open_for_output(&mut self) -> bool {
        if self.output.is_none() {
            return false;
        }
        self.output_open = true;
        true
    }

    fn input_byte(&mut self, regs: &mut Registers) -> bool {
        if !self.input_open {
            return false;
        }
        if self.input_at_eof {
            regs.a = EOF_CHARACTER;
            return true;
        }
        let Some(file) = &mut self.input else {
            return false;
        };
        let mut byte = [0u8; 1];
        match file.read(&mut byte) {
            Ok(0) => {
                self.input_at_eof = true;
                regs.a = EOF_CHARACTER;
                true
            }
            Ok(_) => {
                let c = byte[0];
                regs.a = if !self.input_binary_mode && c == LF {
                    CR
                } else {
                    c
                };
                true
            }
            Err(_) => false,
        }
    }

    fn output_byte(&mut self, regs: &mut Registers) -> bool {
        if !self.output_open {
            return false;
        }
        let Some(file) = &mut self.output else {
            return false;
        };
        let c = if !self.output_binary_mode && regs.a == CR {
            LF
        } else {
            regs.a
        };
        file.write_all(&[c]).is_ok()
    }

    fn close(&mut self) -> bool {
        self.input_open = false;
        self.output_open = false;
        if let Some(file) = &mut self.output {
            let _ = file.flush();
        }
        true
    }
}

impl Default for FileByte {
    fn default() -> Self {
        Self::new()
    }
}

/// Discard sink and EOF source.
pub struct NullDevice;
