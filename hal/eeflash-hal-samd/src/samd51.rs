//! SAMD51 NVMCTRL driver
//!
//! Commands go to CTRLB with the CMDEX key and complete when INTFLAG.DONE
//! is set; DONE is sticky and is cleared before each command. ADDR takes
//! byte addresses and the erase granule is a block (1/64 of the array).
//!
//! Two coherency rules apply on this family:
//!
//! - The NVMCTRL AHB caches must be disabled while writing (silicon
//!   erratum). Their previous setting is restored afterwards.
//! - The CMCC unified cache sits in front of the flash and must be
//!   invalidated after every erase and page write, otherwise stale lines
//!   can be returned by later reads.

use eeflash_hal::{FlashError, FlashGeometry, MemoryBus, NvmController, Poll};

use crate::family::{DetectError, Family};
use crate::regs::{cmcc, samd51, CMDEX_KEY};

/// NVMCTRL and CMCC of a SAMD51-class device
#[derive(Debug)]
pub struct Samd51Nvm<B> {
    bus: B,
    geometry: FlashGeometry,
    poll: Poll,
    /// CTRLA cache-disable bits saved by `begin_write`
    saved_cachedis: Option<u16>,
}

impl<B: MemoryBus> Samd51Nvm<B> {
    /// Create the driver, reading geometry from PARAM
    pub fn new(bus: B, poll: Poll) -> Result<Self, DetectError> {
        let geometry = Family::Samd51.read_geometry(&bus)?;
        Ok(Self {
            bus,
            geometry,
            poll,
            saved_cachedis: None,
        })
    }

    /// Release the bus
    pub fn free(self) -> B {
        self.bus
    }

    /// Issue a command and wait for DONE
    fn command(&mut self, cmd: u16) -> Result<(), FlashError> {
        self.bus.write_u16(samd51::INTFLAG, samd51::INTFLAG_DONE);
        self.bus.write_u16(samd51::CTRLB, CMDEX_KEY | cmd);
        let bus = &self.bus;
        self.poll
            .until(|| bus.read_u16(samd51::INTFLAG) & samd51::INTFLAG_DONE != 0)
    }
}

impl<B: MemoryBus> NvmController for Samd51Nvm<B> {
    fn geometry(&self) -> FlashGeometry {
        self.geometry
    }

    fn read(&self, address: u32, buf: &mut [u8]) {
        self.bus.read_bytes(address, buf);
    }

    fn erase_row(&mut self, address: u32) -> Result<(), FlashError> {
        self.bus
            .write_u32(samd51::ADDR, self.geometry.row_start(address));
        self.command(samd51::CMD_EB)?;
        self.invalidate_cache()
    }

    fn begin_write(&mut self) -> Result<(), FlashError> {
        self.bus
            .modify_u16(samd51::CTRLA, |ctrla| ctrla & !samd51::CTRLA_WMODE_MASK);
        let bus = &self.bus;
        self.poll
            .until(|| bus.read_u16(samd51::STATUS) & samd51::STATUS_READY != 0)?;

        let ctrla = self.bus.read_u16(samd51::CTRLA);
        self.saved_cachedis = Some(ctrla & samd51::CTRLA_CACHEDIS_MASK);
        self.bus
            .write_u16(samd51::CTRLA, ctrla | samd51::CTRLA_CACHEDIS_MASK);
        Ok(())
    }

    fn write_page(&mut self, address: u32, words: &[u32]) -> Result<(), FlashError> {
        self.command(samd51::CMD_PBC)?;
        for (i, &word) in words.iter().enumerate() {
            self.bus.write_u32(address + 4 * i as u32, word);
        }
        self.command(samd51::CMD_WP)?;
        self.invalidate_cache()
    }

    fn end_write(&mut self) {
        if let Some(saved) = self.saved_cachedis.take() {
            self.bus.modify_u16(samd51::CTRLA, |ctrla| {
                (ctrla & !samd51::CTRLA_CACHEDIS_MASK) | saved
            });
        }
    }

    fn invalidate_cache(&mut self) -> Result<(), FlashError> {
        if self.bus.read_u32(cmcc::SR) & cmcc::SR_CSTS == 0 {
            return Ok(());
        }
        self.bus.modify_u32(cmcc::CTRL, |ctrl| ctrl & !cmcc::CTRL_CEN);
        let bus = &self.bus;
        self.poll
            .until(|| bus.read_u32(cmcc::SR) & cmcc::SR_CSTS == 0)?;
        self.bus.write_u32(cmcc::MAINT0, cmcc::MAINT0_INVALL);
        self.bus.modify_u32(cmcc::CTRL, |ctrl| ctrl | cmcc::CTRL_CEN);
        self.bus.barrier();
        Ok(())
    }
}
