//! `embedded-storage` adapter
//!
//! Lets an [`Eeprom`] stand in wherever a generic byte store is expected.
//! Unlike the byte API, out-of-range access is reported as
//! [`EepromError::OutOfRange`]. Writes only update the shadow; call
//! [`Eeprom::commit`] to persist them.

use embedded_storage::{ReadStorage, Storage};

use eeflash_hal::Flash;

use crate::eeprom::{Eeprom, EepromError};

impl<F: Flash, const N: usize> ReadStorage for Eeprom<F, N> {
    type Error = EepromError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let offset = offset as usize;
        self.check_range(offset, bytes.len())?;
        bytes.copy_from_slice(&self.shadow()[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.length()
    }
}

impl<F: Flash, const N: usize> Storage for Eeprom<F, N> {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let offset = offset as usize;
        self.check_range(offset, bytes.len())?;
        self.write_bytes(offset, bytes);
        Ok(())
    }
}
