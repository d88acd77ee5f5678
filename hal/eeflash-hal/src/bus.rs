//! Memory bus abstraction
//!
//! Controller drivers never dereference raw pointers themselves. Every
//! register access and every access to memory-mapped flash goes through a
//! [`MemoryBus`], so the same command sequencing runs against real hardware
//! or against a simulator on the host.

/// Volatile access to the physical address space
///
/// Addresses are absolute. Implementations must perform each access exactly
/// once and in program order; the controller reacts to individual accesses
/// (page buffer writes, command writes, write-one-to-clear flags).
pub trait MemoryBus {
    /// Read one byte
    fn read_u8(&self, address: u32) -> u8;

    /// Read one halfword (address must be 2-byte aligned)
    fn read_u16(&self, address: u32) -> u16;

    /// Read one word (address must be 4-byte aligned)
    fn read_u32(&self, address: u32) -> u32;

    /// Write one halfword (address must be 2-byte aligned)
    fn write_u16(&mut self, address: u32, value: u16);

    /// Write one word (address must be 4-byte aligned)
    fn write_u32(&mut self, address: u32, value: u32);

    /// Copy `buf.len()` bytes starting at `address` into `buf`
    fn read_bytes(&self, address: u32, buf: &mut [u8]) {
        for (offset, byte) in buf.iter_mut().enumerate() {
            *byte = self.read_u8(address + offset as u32);
        }
    }

    /// Memory barrier after cache maintenance
    ///
    /// Real hardware issues DSB/ISB here; the default does nothing.
    fn barrier(&self) {}

    /// Read-modify-write of a halfword register
    fn modify_u16(&mut self, address: u32, f: impl FnOnce(u16) -> u16) {
        let value = self.read_u16(address);
        self.write_u16(address, f(value));
    }

    /// Read-modify-write of a word register
    fn modify_u32(&mut self, address: u32, f: impl FnOnce(u32) -> u32) {
        let value = self.read_u32(address);
        self.write_u32(address, f(value));
    }
}

impl<B: MemoryBus + ?Sized> MemoryBus for &mut B {
    fn read_u8(&self, address: u32) -> u8 {
        (**self).read_u8(address)
    }

    fn read_u16(&self, address: u32) -> u16 {
        (**self).read_u16(address)
    }

    fn read_u32(&self, address: u32) -> u32 {
        (**self).read_u32(address)
    }

    fn write_u16(&mut self, address: u32, value: u16) {
        (**self).write_u16(address, value)
    }

    fn write_u32(&mut self, address: u32, value: u32) {
        (**self).write_u32(address, value)
    }

    fn read_bytes(&self, address: u32, buf: &mut [u8]) {
        (**self).read_bytes(address, buf)
    }

    fn barrier(&self) {
        (**self).barrier()
    }
}
