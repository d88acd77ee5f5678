//! Backing region of an emulated EEPROM

use eeflash_hal::FlashGeometry;

/// Flash range holding the committed EEPROM image
///
/// The image is stored raw: no header, no checksum. Its length has to be
/// known out-of-band and must match between commit and the next bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Region {
    /// First byte of the region
    pub address: u32,
    /// Length in bytes
    pub length: u32,
}

impl Region {
    pub const fn new(address: u32, length: u32) -> Self {
        Self { address, length }
    }

    /// Length as a buffer size
    pub const fn len(&self) -> usize {
        self.length as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Row-aligned span `[start, end)` that erasing this region touches
    pub const fn erase_span(&self, geometry: &FlashGeometry) -> (u32, u32) {
        geometry.erase_span(self.address, self.length)
    }
}
