//! EEPROM placement configuration
//!
//! Where the backing region and the validity flag live, plus the polling
//! policy for the controller. Checked against the detected flash geometry
//! before use.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use eeflash_hal::geometry::WORD_SIZE;
use eeflash_hal::{FlashGeometry, Poll};

use crate::flag::ValidityFlag;
use crate::region::Region;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Region has no bytes
    ZeroLength,
    /// Region extends past the end of flash
    RegionOutOfFlash,
    /// Region does not start on a word boundary
    RegionMisaligned,
    /// Flag word extends past the end of flash
    FlagOutOfFlash,
    /// Flag is not on a word boundary
    FlagMisaligned,
    /// Flag sits in a row that erasing the region would wipe
    FlagOverlapsRegion,
}

/// EEPROM placement and controller settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EepromConfig {
    /// First byte of the backing region
    pub region_address: u32,
    /// EEPROM size in bytes
    pub region_length: u32,
    /// Address of the validity flag word
    pub flag_address: u32,
    /// Maximum status reads per controller operation (None = wait forever)
    #[cfg_attr(feature = "serde", serde(default))]
    pub poll_limit: Option<u32>,
}

impl EepromConfig {
    pub const fn new(region_address: u32, region_length: u32, flag_address: u32) -> Self {
        Self {
            region_address,
            region_length,
            flag_address,
            poll_limit: None,
        }
    }

    /// Place a `length` byte region in the topmost rows of flash, with the
    /// flag at the start of the row just below it
    pub fn reserve_top(geometry: &FlashGeometry, length: u32) -> Result<Self, ConfigError> {
        if length == 0 {
            return Err(ConfigError::ZeroLength);
        }
        let row = geometry.row_size;
        let rows = length.div_ceil(row);
        let reserved = rows
            .checked_add(1)
            .and_then(|n| n.checked_mul(row))
            .filter(|&bytes| bytes <= geometry.total_capacity())
            .ok_or(ConfigError::RegionOutOfFlash)?;

        let region_address = geometry.total_capacity() - rows * row;
        let flag_address = geometry.total_capacity() - reserved;
        Ok(Self::new(region_address, length, flag_address))
    }

    /// Same placement with a bounded poll
    pub const fn with_poll_limit(mut self, limit: u32) -> Self {
        self.poll_limit = Some(limit);
        self
    }

    /// Polling policy for the controller
    pub const fn poll(&self) -> Poll {
        Poll::from_limit(self.poll_limit)
    }

    pub const fn region(&self) -> Region {
        Region::new(self.region_address, self.region_length)
    }

    pub const fn flag(&self) -> ValidityFlag {
        ValidityFlag::new(self.flag_address)
    }

    /// Check the placement against `geometry`
    pub fn validate(&self, geometry: &FlashGeometry) -> Result<(Region, ValidityFlag), ConfigError> {
        let region = self.region();
        if region.is_empty() {
            return Err(ConfigError::ZeroLength);
        }
        if !geometry.contains(region.address, region.length) {
            return Err(ConfigError::RegionOutOfFlash);
        }
        if region.address % WORD_SIZE != 0 {
            return Err(ConfigError::RegionMisaligned);
        }
        if self.flag_address % WORD_SIZE != 0 {
            return Err(ConfigError::FlagMisaligned);
        }
        if !geometry.contains(self.flag_address, WORD_SIZE) {
            return Err(ConfigError::FlagOutOfFlash);
        }
        let (start, end) = region.erase_span(geometry);
        if (start..end).contains(&self.flag_address) {
            return Err(ConfigError::FlagOverlapsRegion);
        }
        Ok((region, self.flag()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // SAMD21J18: 64 byte pages, 4096 of them, 256 byte rows
    fn geometry() -> FlashGeometry {
        FlashGeometry::new(64, 4096, 256).unwrap()
    }

    #[test]
    fn test_valid_placement() {
        let config = EepromConfig::new(0x3_F000, 1024, 0x3_EF00);
        let (region, flag) = config.validate(&geometry()).unwrap();
        assert_eq!(region, Region::new(0x3_F000, 1024));
        assert_eq!(flag.address(), 0x3_EF00);
    }

    #[test]
    fn test_rejects_empty_region() {
        let config = EepromConfig::new(0x3_F000, 0, 0x3_EF00);
        assert_eq!(config.validate(&geometry()), Err(ConfigError::ZeroLength));
    }

    #[test]
    fn test_rejects_region_past_end() {
        let config = EepromConfig::new(0x3_FF00, 1024, 0x3_EF00);
        assert_eq!(config.validate(&geometry()), Err(ConfigError::RegionOutOfFlash));
        let config = EepromConfig::new(u32::MAX - 4, 1024, 0);
        assert_eq!(config.validate(&geometry()), Err(ConfigError::RegionOutOfFlash));
    }

    #[test]
    fn test_rejects_misalignment() {
        let config = EepromConfig::new(0x3_F002, 1024, 0x3_EF00);
        assert_eq!(config.validate(&geometry()), Err(ConfigError::RegionMisaligned));
        let config = EepromConfig::new(0x3_F000, 1024, 0x3_EF01);
        assert_eq!(config.validate(&geometry()), Err(ConfigError::FlagMisaligned));
    }

    #[test]
    fn test_rejects_flag_past_end() {
        let config = EepromConfig::new(0x3_F000, 1024, 0x4_0000);
        assert_eq!(config.validate(&geometry()), Err(ConfigError::FlagOutOfFlash));
    }

    #[test]
    fn test_rejects_flag_in_erased_rows() {
        // Inside the region
        let config = EepromConfig::new(0x3_F000, 1024, 0x3_F100);
        assert_eq!(config.validate(&geometry()), Err(ConfigError::FlagOverlapsRegion));
        // Past the region end but in the same row
        let config = EepromConfig::new(0x3_F000, 1000, 0x3_F3F0);
        assert_eq!(config.validate(&geometry()), Err(ConfigError::FlagOverlapsRegion));
        // Before the region start but in the same row
        let config = EepromConfig::new(0x3_F080, 512, 0x3_F000);
        assert_eq!(config.validate(&geometry()), Err(ConfigError::FlagOverlapsRegion));
    }

    #[test]
    fn test_reserve_top() {
        let config = EepromConfig::reserve_top(&geometry(), 1000).unwrap();
        assert_eq!(config.region_address, 0x3_FC00);
        assert_eq!(config.region_length, 1000);
        assert_eq!(config.flag_address, 0x3_FB00);
        assert!(config.validate(&geometry()).is_ok());

        let samd51 = FlashGeometry::new(512, 1024, 8192).unwrap();
        let config = EepromConfig::reserve_top(&samd51, 1024).unwrap();
        assert_eq!(config.region_address, 0x7_E000);
        assert_eq!(config.flag_address, 0x7_C000);
        assert!(config.validate(&samd51).is_ok());
    }

    #[test]
    fn test_reserve_top_too_large() {
        let small = FlashGeometry::new(64, 8, 256).unwrap();
        assert_eq!(
            EepromConfig::reserve_top(&small, 512),
            Err(ConfigError::RegionOutOfFlash)
        );
        assert_eq!(EepromConfig::reserve_top(&small, 0), Err(ConfigError::ZeroLength));
        assert!(EepromConfig::reserve_top(&small, 256).is_ok());
    }

    #[test]
    fn test_poll_policy() {
        let config = EepromConfig::new(0, 256, 256);
        assert_eq!(config.poll(), Poll::unbounded());
        assert_eq!(config.with_poll_limit(10_000).poll(), Poll::bounded(10_000));
    }
}
