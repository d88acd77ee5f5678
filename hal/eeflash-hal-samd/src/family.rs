//! Controller family detection and geometry decoding
//!
//! The family is read from the DSU device ID at startup; geometry comes from
//! the NVMCTRL PARAM register. Nothing here is decided at compile time.

use eeflash_hal::geometry::{FlashGeometry, PAGE_SIZES};
use eeflash_hal::MemoryBus;

use crate::regs::{dsu, param, samd21, samd51};

/// Errors while identifying the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DetectError {
    /// Device ID does not belong to a supported family
    UnknownDevice(u32),
    /// PARAM register describes an impossible geometry
    InvalidParam(u32),
}

/// Supported NVMCTRL families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Family {
    /// Cortex-M0+ parts: 4-page rows, commands in CTRLA
    Samd21,
    /// Cortex-M4 parts: 64 blocks, commands in CTRLB, CMCC cache
    Samd51,
}

impl Family {
    /// Classify a DSU device ID by its processor field
    pub fn from_device_id(did: u32) -> Result<Self, DetectError> {
        match did >> dsu::DID_PROCESSOR_SHIFT {
            dsu::PROCESSOR_CM0P => Ok(Family::Samd21),
            dsu::PROCESSOR_CM4 => Ok(Family::Samd51),
            _ => Err(DetectError::UnknownDevice(did)),
        }
    }

    /// Read the device ID through `bus` and classify it
    pub fn detect<B: MemoryBus>(bus: &B) -> Result<Self, DetectError> {
        Self::from_device_id(bus.read_u32(dsu::DID))
    }

    /// Address of this family's PARAM register
    pub const fn param_register(self) -> u32 {
        match self {
            Family::Samd21 => samd21::PARAM,
            Family::Samd51 => samd51::PARAM,
        }
    }

    /// Erase granule for a flash of the given page layout
    pub const fn row_size(self, page_size: u32, page_count: u32) -> u32 {
        match self {
            Family::Samd21 => page_size * samd21::PAGES_PER_ROW,
            Family::Samd51 => page_size * page_count / samd51::BLOCKS,
        }
    }

    /// Decode a PARAM register value
    pub fn geometry_from_param(self, value: u32) -> Result<FlashGeometry, DetectError> {
        let psz = (value >> param::PSZ_SHIFT) & param::PSZ_MASK;
        let page_size = PAGE_SIZES[psz as usize];
        let page_count = value & param::NVMP_MASK;
        // Word-granular programming needs at least one full word per page
        if page_size < eeflash_hal::geometry::WORD_SIZE || page_count == 0 {
            return Err(DetectError::InvalidParam(value));
        }
        FlashGeometry::new(page_size, page_count, self.row_size(page_size, page_count))
            .ok_or(DetectError::InvalidParam(value))
    }

    /// Read PARAM through `bus` and decode it
    pub fn read_geometry<B: MemoryBus>(self, bus: &B) -> Result<FlashGeometry, DetectError> {
        self.geometry_from_param(bus.read_u32(self.param_register()))
    }
}

/// Encode a PARAM value (inverse of [`Family::geometry_from_param`])
///
/// Returns `None` for page sizes outside [`PAGE_SIZES`].
pub fn encode_param(page_size: u32, page_count: u32) -> Option<u32> {
    let psz = PAGE_SIZES.iter().position(|&size| size == page_size)? as u32;
    Some((psz << param::PSZ_SHIFT) | (page_count & param::NVMP_MASK))
}
