//! Memory bus abstraction.

/// A byte-addressable bus the CPU executes against.
///
/// The emulated address space is 16 bits wide and reads and writes are total
/// over it; side effects (write tracing, memory-mapped behavior) belong to the
/// implementor.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, addr: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, addr: u16, value: u8);
}
