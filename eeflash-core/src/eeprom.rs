//! EEPROM emulation
//!
//! An [`Eeprom`] keeps a RAM shadow of its backing [`Region`]. Byte reads
//! and updates only touch the shadow; [`Eeprom::commit`] is the single
//! operation that writes flash, erasing the region and rewriting it in full.
//! Any number of updates between commits costs one erase cycle.
//!
//! # States
//!
//! ```text
//!            bind / bind_force_valid
//!  Unbound ───────────────────────────► Uninitialized ──load──► Clean
//!                                                               │  ▲
//!                                               update (changed)│  │commit
//!                                                               ▼  │
//!                                                               Dirty
//! ```
//!
//! Out-of-range indices and an unbound instance are not errors for the byte
//! API: reads return 0 and updates are ignored.

use heapless::Vec;

use eeflash_hal::geometry::ERASED_BYTE;
use eeflash_hal::{Flash, FlashError};

use crate::config::{ConfigError, EepromConfig};
use crate::flag::ValidityFlag;
use crate::region::Region;

/// Errors from binding and committing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EepromError {
    /// Flash operation failed
    Flash(FlashError),
    /// Region is longer than the shadow buffer capacity
    RegionTooLarge,
    /// Region or flag placement cannot be committed safely
    Placement(ConfigError),
    /// Range extends past the end of the EEPROM
    OutOfRange,
    /// Value does not fit or could not be serialized
    Serialize,
    /// Stored bytes do not decode as the requested type
    Deserialize,
}

impl From<FlashError> for EepromError {
    fn from(e: FlashError) -> Self {
        EepromError::Flash(e)
    }
}

impl From<ConfigError> for EepromError {
    fn from(e: ConfigError) -> Self {
        EepromError::Placement(e)
    }
}

/// Lifecycle state of an [`Eeprom`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EepromState {
    /// No backing region attached
    Unbound,
    /// Region attached but the shadow could not be loaded
    Uninitialized,
    /// Shadow matches flash (or the erased default)
    Clean,
    /// Shadow has changes not yet committed
    Dirty,
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    region: Region,
    flag: ValidityFlag,
}

/// Byte-addressable EEPROM emulated on flash
///
/// `N` is the shadow buffer capacity; the bound region must not be longer.
#[derive(Debug)]
pub struct Eeprom<F, const N: usize> {
    flash: F,
    binding: Option<Binding>,
    shadow: Vec<u8, N>,
    loaded: bool,
    dirty: bool,
}

impl<F: Flash, const N: usize> Eeprom<F, N> {
    /// Create an unbound instance owning `flash`
    pub fn new(flash: F) -> Self {
        Self {
            flash,
            binding: None,
            shadow: Vec::new(),
            loaded: false,
            dirty: false,
        }
    }

    /// Attach a backing region and load the shadow from it
    ///
    /// If `flag` is not valid the shadow is filled with `0xFF` instead of
    /// trusting whatever the region holds. Pending changes of a previous
    /// binding are discarded.
    pub fn bind(&mut self, region: Region, flag: ValidityFlag) -> Result<(), EepromError> {
        self.attach(region, flag)?;
        self.load()
    }

    /// Like [`bind`](Self::bind), but first programs `flag` to valid
    ///
    /// For callers that track validity themselves and know the region holds
    /// a real image.
    pub fn bind_force_valid(
        &mut self,
        region: Region,
        flag: ValidityFlag,
    ) -> Result<(), EepromError> {
        self.attach(region, flag)?;
        flag.set(&mut self.flash)?;
        self.load()
    }

    /// Reload the shadow from flash, dropping uncommitted changes
    pub fn reload(&mut self) -> Result<(), EepromError> {
        self.load()
    }

    fn attach(&mut self, region: Region, flag: ValidityFlag) -> Result<(), EepromError> {
        if region.len() > N {
            warn!("Region of {} bytes exceeds shadow capacity {}", region.length, N);
            return Err(EepromError::RegionTooLarge);
        }
        // Commit erases the region's rows and then programs the flag in
        // place, so both must be aligned and the flag kept out of those rows
        EepromConfig::new(region.address, region.length, flag.address())
            .validate(&self.flash.geometry())?;
        if self.dirty {
            warn!("Discarding uncommitted EEPROM changes");
        }
        self.binding = Some(Binding { region, flag });
        self.shadow.clear();
        self.loaded = false;
        self.dirty = false;
        Ok(())
    }

    /// Fill the shadow from flash or with the erased value, based on the flag
    fn load(&mut self) -> Result<(), EepromError> {
        let Some(binding) = self.binding else {
            return Ok(());
        };
        self.shadow.clear();
        self.loaded = false;
        self.dirty = false;

        let valid = binding.flag.is_set(&self.flash)?;
        let fill = if valid { 0 } else { ERASED_BYTE };
        self.shadow
            .resize(binding.region.len(), fill)
            .map_err(|_| EepromError::RegionTooLarge)?;
        if valid {
            if let Err(e) = self.flash.read(binding.region.address, &mut self.shadow) {
                self.shadow.clear();
                return Err(e.into());
            }
        }

        self.loaded = true;
        debug!(
            "EEPROM bound at {=u32:#x}, {} bytes, valid={}",
            binding.region.address,
            binding.region.length,
            valid
        );
        Ok(())
    }

    /// Byte at `index`, or 0 if out of range or unbound
    pub fn read(&self, index: usize) -> u8 {
        self.shadow.get(index).copied().unwrap_or(0)
    }

    /// Set the byte at `index`
    ///
    /// Only marks the EEPROM dirty if the value actually changes. Out of
    /// range indices are ignored.
    pub fn update(&mut self, index: usize, value: u8) {
        if let Some(byte) = self.shadow.get_mut(index) {
            if *byte != value {
                *byte = value;
                self.dirty = true;
            }
        }
    }

    /// Alias of [`update`](Self::update)
    pub fn write(&mut self, index: usize, value: u8) {
        self.update(index, value);
    }

    /// Copy bytes starting at `offset` into `buf`
    ///
    /// Positions past the end read as 0, like [`read`](Self::read).
    pub fn read_bytes(&self, offset: usize, buf: &mut [u8]) {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read(offset.saturating_add(i));
        }
    }

    /// Update bytes starting at `offset`
    ///
    /// Positions past the end are ignored, like [`update`](Self::update).
    pub fn write_bytes(&mut self, offset: usize, data: &[u8]) {
        for (i, &value) in data.iter().enumerate() {
            self.update(offset.saturating_add(i), value);
        }
    }

    /// Persist the shadow if it has changed
    ///
    /// Erases the whole region, writes the whole shadow, then sets the
    /// validity flag if it was not set yet. The dirty state is only cleared
    /// once all of that succeeded.
    pub fn commit(&mut self) -> Result<(), EepromError> {
        if !self.dirty {
            return Ok(());
        }
        let Some(binding) = self.binding else {
            return Ok(());
        };
        let region = binding.region;

        self.flash.erase(region.address, region.length)?;
        self.flash.write(region.address, &self.shadow)?;
        binding.flag.set(&mut self.flash)?;
        self.dirty = false;

        info!(
            "Committed {} EEPROM bytes at {=u32:#x}",
            region.length,
            region.address
        );
        Ok(())
    }

    /// Whether the validity flag reads as valid
    pub fn is_valid(&self) -> bool {
        match self.binding {
            Some(binding) => binding.flag.is_set(&self.flash).unwrap_or(false),
            None => false,
        }
    }

    /// Size of the EEPROM in bytes, 0 while unbound
    pub fn length(&self) -> usize {
        self.binding.map_or(0, |binding| binding.region.len())
    }

    /// Whether there are uncommitted changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Current lifecycle state
    pub fn state(&self) -> EepromState {
        match (self.binding.is_some(), self.loaded, self.dirty) {
            (false, _, _) => EepromState::Unbound,
            (true, false, _) => EepromState::Uninitialized,
            (true, true, false) => EepromState::Clean,
            (true, true, true) => EepromState::Dirty,
        }
    }

    /// Bound region, if any
    pub fn region(&self) -> Option<Region> {
        self.binding.map(|binding| binding.region)
    }

    /// Borrow the underlying flash
    pub fn flash(&self) -> &F {
        &self.flash
    }

    /// Give back the underlying flash; uncommitted changes are lost
    pub fn into_flash(self) -> F {
        self.flash
    }

    /// Shadow contents (empty unless loaded)
    pub(crate) fn shadow(&self) -> &[u8] {
        &self.shadow
    }

    /// Check that `[offset, offset + len)` lies inside the EEPROM
    pub(crate) fn check_range(&self, offset: usize, len: usize) -> Result<(), EepromError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.shadow.len() => Ok(()),
            _ => Err(EepromError::OutOfRange),
        }
    }
}
