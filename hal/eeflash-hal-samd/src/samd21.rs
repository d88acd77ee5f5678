//! SAMD21 NVMCTRL driver
//!
//! Commands go to CTRLA together with the CMDEX key and complete when
//! INTFLAG.READY is set. The ADDR register takes 16-bit word addresses.
//! There is no cache in front of the flash that needs maintenance.

use eeflash_hal::{FlashError, FlashGeometry, MemoryBus, NvmController, Poll};

use crate::family::{DetectError, Family};
use crate::regs::{samd21, CMDEX_KEY};

/// NVMCTRL of a SAMD21-class device
#[derive(Debug)]
pub struct Samd21Nvm<B> {
    bus: B,
    geometry: FlashGeometry,
    poll: Poll,
}

impl<B: MemoryBus> Samd21Nvm<B> {
    /// Create the driver, reading geometry from PARAM
    pub fn new(bus: B, poll: Poll) -> Result<Self, DetectError> {
        let geometry = Family::Samd21.read_geometry(&bus)?;
        Ok(Self {
            bus,
            geometry,
            poll,
        })
    }

    /// Release the bus
    pub fn free(self) -> B {
        self.bus
    }

    /// Issue a command and wait until the controller is ready again
    fn command(&mut self, cmd: u16) -> Result<(), FlashError> {
        self.bus.write_u16(samd21::CTRLA, CMDEX_KEY | cmd);
        let bus = &self.bus;
        self.poll
            .until(|| bus.read_u8(samd21::INTFLAG) & samd21::INTFLAG_READY != 0)
    }
}

impl<B: MemoryBus> NvmController for Samd21Nvm<B> {
    fn geometry(&self) -> FlashGeometry {
        self.geometry
    }

    fn read(&self, address: u32, buf: &mut [u8]) {
        self.bus.read_bytes(address, buf);
    }

    fn erase_row(&mut self, address: u32) -> Result<(), FlashError> {
        self.bus.write_u32(samd21::ADDR, address / 2);
        self.command(samd21::CMD_ER)
    }

    fn begin_write(&mut self) -> Result<(), FlashError> {
        self.bus
            .modify_u32(samd21::CTRLB, |ctrlb| ctrlb | samd21::CTRLB_MANW);
        Ok(())
    }

    fn write_page(&mut self, address: u32, words: &[u32]) -> Result<(), FlashError> {
        self.command(samd21::CMD_PBC)?;
        for (i, &word) in words.iter().enumerate() {
            self.bus.write_u32(address + 4 * i as u32, word);
        }
        self.command(samd21::CMD_WP)
    }

    fn end_write(&mut self) {}
}
