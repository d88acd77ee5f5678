//! Flash storage abstractions
//!
//! Provides the byte-range flash contract that the EEPROM emulator is
//! written against, plus the error type shared by every layer below it.

use crate::geometry::FlashGeometry;

/// Errors from flash operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Controller never reported completion within the polling bound
    HardwareTimeout,
    /// Range extends beyond the flash array
    OutOfBounds,
    /// Write target is not word aligned
    Misaligned,
    /// Data read back after programming does not match
    VerifyFailed,
}

/// Byte-addressed flash
///
/// Reads are plain memory copies. Erases work on whole rows and leave every
/// byte at `0xFF`. Writes only clear bits: the target range must have been
/// erased beforehand, `write` never erases on its own.
pub trait Flash {
    /// Geometry of the underlying flash array
    fn geometry(&self) -> FlashGeometry;

    /// Copy `buf.len()` bytes starting at `address` into `buf`
    fn read(&self, address: u32, buf: &mut [u8]) -> Result<(), FlashError>;

    /// Erase every row overlapping `[address, address + length)`
    fn erase(&mut self, address: u32, length: u32) -> Result<(), FlashError>;

    /// Program `data` at `address` (word aligned, previously erased)
    fn write(&mut self, address: u32, data: &[u8]) -> Result<(), FlashError>;

    /// Read a little-endian word
    fn read_word(&self, address: u32) -> Result<u32, FlashError> {
        let mut bytes = [0u8; 4];
        self.read(address, &mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }
}

impl<F: Flash + ?Sized> Flash for &mut F {
    fn geometry(&self) -> FlashGeometry {
        (**self).geometry()
    }

    fn read(&self, address: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        (**self).read(address, buf)
    }

    fn erase(&mut self, address: u32, length: u32) -> Result<(), FlashError> {
        (**self).erase(address, length)
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<(), FlashError> {
        (**self).write(address, data)
    }
}
