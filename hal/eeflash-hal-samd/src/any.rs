//! Runtime-selected controller strategy

use eeflash_hal::{FlashError, FlashGeometry, MemoryBus, NvmController, Poll};

use crate::family::{DetectError, Family};
use crate::samd21::Samd21Nvm;
use crate::samd51::Samd51Nvm;

/// Either family's driver, chosen once from the device ID
#[derive(Debug)]
pub enum AnyNvm<B> {
    Samd21(Samd21Nvm<B>),
    Samd51(Samd51Nvm<B>),
}

impl<B: MemoryBus> AnyNvm<B> {
    /// Identify the device behind `bus` and build the matching driver
    pub fn detect(bus: B, poll: Poll) -> Result<Self, DetectError> {
        let family = Family::detect(&bus)?;
        Self::for_family(family, bus, poll)
    }

    /// Build the driver for a known family
    pub fn for_family(family: Family, bus: B, poll: Poll) -> Result<Self, DetectError> {
        Ok(match family {
            Family::Samd21 => AnyNvm::Samd21(Samd21Nvm::new(bus, poll)?),
            Family::Samd51 => AnyNvm::Samd51(Samd51Nvm::new(bus, poll)?),
        })
    }

    /// Family this driver was built for
    pub fn family(&self) -> Family {
        match self {
            AnyNvm::Samd21(_) => Family::Samd21,
            AnyNvm::Samd51(_) => Family::Samd51,
        }
    }

    /// Release the bus
    pub fn free(self) -> B {
        match self {
            AnyNvm::Samd21(nvm) => nvm.free(),
            AnyNvm::Samd51(nvm) => nvm.free(),
        }
    }
}

impl<B: MemoryBus> NvmController for AnyNvm<B> {
    fn geometry(&self) -> FlashGeometry {
        match self {
            AnyNvm::Samd21(nvm) => nvm.geometry(),
            AnyNvm::Samd51(nvm) => nvm.geometry(),
        }
    }

    fn read(&self, address: u32, buf: &mut [u8]) {
        match self {
            AnyNvm::Samd21(nvm) => nvm.read(address, buf),
            AnyNvm::Samd51(nvm) => nvm.read(address, buf),
        }
    }

    fn erase_row(&mut self, address: u32) -> Result<(), FlashError> {
        match self {
            AnyNvm::Samd21(nvm) => nvm.erase_row(address),
            AnyNvm::Samd51(nvm) => nvm.erase_row(address),
        }
    }

    fn begin_write(&mut self) -> Result<(), FlashError> {
        match self {
            AnyNvm::Samd21(nvm) => nvm.begin_write(),
            AnyNvm::Samd51(nvm) => nvm.begin_write(),
        }
    }

    fn write_page(&mut self, address: u32, words: &[u32]) -> Result<(), FlashError> {
        match self {
            AnyNvm::Samd21(nvm) => nvm.write_page(address, words),
            AnyNvm::Samd51(nvm) => nvm.write_page(address, words),
        }
    }

    fn end_write(&mut self) {
        match self {
            AnyNvm::Samd21(nvm) => nvm.end_write(),
            AnyNvm::Samd51(nvm) => nvm.end_write(),
        }
    }

    fn invalidate_cache(&mut self) -> Result<(), FlashError> {
        match self {
            AnyNvm::Samd21(nvm) => nvm.invalidate_cache(),
            AnyNvm::Samd51(nvm) => nvm.invalidate_cache(),
        }
    }
}
