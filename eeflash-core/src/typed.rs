//! Typed values stored in the EEPROM
//!
//! Values are postcard-encoded into the shadow at a caller-chosen offset.
//! There is no framing: the caller owns the layout, and a value decodes
//! from whatever bytes start at its offset.

use serde::de::DeserializeOwned;
use serde::Serialize;

use eeflash_hal::Flash;

use crate::eeprom::{Eeprom, EepromError};

/// Maximum encoded size of a single value
pub const MAX_VALUE_SIZE: usize = 256;

impl<F: Flash, const N: usize> Eeprom<F, N> {
    /// Decode a `T` stored at `offset`
    pub fn get<T: DeserializeOwned>(&self, offset: usize) -> Result<T, EepromError> {
        self.check_range(offset, 0)?;
        let value =
            postcard::from_bytes(&self.shadow()[offset..]).map_err(|_| EepromError::Deserialize)?;
        Ok(value)
    }

    /// Encode `value` at `offset`, returning the number of bytes used
    ///
    /// Changes stay in RAM until [`commit`](Self::commit).
    pub fn put<T: Serialize>(&mut self, offset: usize, value: &T) -> Result<usize, EepromError> {
        let mut buffer = [0u8; MAX_VALUE_SIZE];
        let bytes = postcard::to_slice(value, &mut buffer).map_err(|_| EepromError::Serialize)?;
        self.check_range(offset, bytes.len())?;
        self.write_bytes(offset, bytes);
        debug!("Stored {} byte value at offset {}", bytes.len(), offset);
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::flag::ValidityFlag;
    use crate::mock::MockFlash;
    use crate::region::Region;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Settings {
        brightness: u8,
        volume: u16,
        offset: i32,
        enabled: bool,
    }

    const SETTINGS: Settings = Settings {
        brightness: 200,
        volume: 1000,
        offset: -42,
        enabled: true,
    };

    fn bound() -> Eeprom<MockFlash<1024>, 256> {
        let mut eeprom = Eeprom::new(MockFlash::new());
        eeprom
            .bind(Region::new(0, 256), ValidityFlag::new(0x300))
            .unwrap();
        eeprom
    }

    #[test]
    fn test_put_then_get() {
        let mut eeprom = bound();
        let used = eeprom.put(16, &SETTINGS).unwrap();
        assert!(used > 0);
        assert!(eeprom.is_dirty());
        assert_eq!(eeprom.get::<Settings>(16), Ok(SETTINGS));
    }

    #[test]
    fn test_survives_commit_and_rebind() {
        let mut eeprom = bound();
        eeprom.put(0, &SETTINGS).unwrap();
        eeprom.commit().unwrap();

        let mut eeprom: Eeprom<_, 256> = Eeprom::new(eeprom.into_flash());
        eeprom
            .bind(Region::new(0, 256), ValidityFlag::new(0x300))
            .unwrap();
        assert_eq!(eeprom.get::<Settings>(0), Ok(SETTINGS));
    }

    #[test]
    fn test_value_past_end() {
        let mut eeprom = bound();
        // brightness 1, volume 2 (varint), offset 1 (zigzag), enabled 1
        let used = 5;
        assert_eq!(
            eeprom.put(256 - used + 1, &SETTINGS),
            Err(EepromError::OutOfRange)
        );
        assert!(!eeprom.is_dirty());
        assert_eq!(eeprom.get::<u8>(257), Err(EepromError::OutOfRange));

        // Ending exactly at the last byte fits
        assert_eq!(eeprom.put(256 - used, &SETTINGS), Ok(used));
        assert_eq!(eeprom.get::<Settings>(256 - used), Ok(SETTINGS));
    }

    #[test]
    fn test_value_too_large() {
        let mut eeprom = bound();
        let big = [0xAAu8; 32];
        let values = [big; 9];
        assert_eq!(eeprom.put(0, &values), Err(EepromError::Serialize));
    }

    #[test]
    fn test_truncated_value_fails_to_decode() {
        let mut eeprom = bound();
        // u64 varint needs more bytes than remain; 0xFF continues forever
        assert_eq!(eeprom.get::<u64>(254), Err(EepromError::Deserialize));
        eeprom.update(255, 0x05);
        assert_eq!(eeprom.get::<u8>(255), Ok(5));
    }
}
