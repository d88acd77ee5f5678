//! Validity flag
//!
//! A single word, stored outside the backing region, that records whether
//! the region has ever been committed. Erased flash reads `0xFFFF_FFFF`,
//! which is "unknown". Programming [`VALID_MAGIC`] only clears bits, so the
//! flag is set in place without erasing its row and never goes back.

use eeflash_hal::{Flash, FlashError};

/// Flag value meaning "the region holds a committed image"
pub const VALID_MAGIC: u32 = 0x4545_5052; // "EEPR"

/// Location of the validity flag word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ValidityFlag {
    address: u32,
}

impl ValidityFlag {
    /// Flag word at `address` (must be word aligned)
    pub const fn new(address: u32) -> Self {
        Self { address }
    }

    pub const fn address(&self) -> u32 {
        self.address
    }

    /// Whether the flag word reads as valid
    pub fn is_set<F: Flash>(&self, flash: &F) -> Result<bool, FlashError> {
        Ok(flash.read_word(self.address)? == VALID_MAGIC)
    }

    /// Program the flag to valid if it is not already
    ///
    /// Fails with [`FlashError::VerifyFailed`] if the word held something
    /// other than the erased value, since bits cannot be set back to one
    /// without an erase.
    pub fn set<F: Flash>(&self, flash: &mut F) -> Result<(), FlashError> {
        if self.is_set(flash)? {
            return Ok(());
        }
        flash.write(self.address, &VALID_MAGIC.to_le_bytes())?;
        if self.is_set(flash)? {
            Ok(())
        } else {
            Err(FlashError::VerifyFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFlash;

    #[test]
    fn test_erased_flag_is_unknown() {
        let flash = MockFlash::<1024>::new();
        assert_eq!(ValidityFlag::new(0x100).is_set(&flash), Ok(false));
    }

    #[test]
    fn test_set_programs_once() {
        let mut flash = MockFlash::<1024>::new();
        let flag = ValidityFlag::new(0x100);
        flag.set(&mut flash).unwrap();
        assert_eq!(flag.is_set(&flash), Ok(true));
        assert_eq!(flash.write_calls().len(), 1);
        assert_eq!(flash.erase_calls().len(), 0);

        // Already valid: nothing is programmed
        flag.set(&mut flash).unwrap();
        assert_eq!(flash.write_calls().len(), 1);
    }

    #[test]
    fn test_garbage_flag_cannot_be_set() {
        let mut flash = MockFlash::<1024>::new();
        flash.poke(0x100, &[0x00, 0x00, 0x00, 0x00]);
        let flag = ValidityFlag::new(0x100);
        assert_eq!(flag.set(&mut flash), Err(FlashError::VerifyFailed));
        assert_eq!(flag.is_set(&flash), Ok(false));
    }

    #[test]
    fn test_out_of_range_flag() {
        let flash = MockFlash::<1024>::new();
        assert_eq!(
            ValidityFlag::new(1024).is_set(&flash),
            Err(FlashError::OutOfBounds)
        );
    }
}
