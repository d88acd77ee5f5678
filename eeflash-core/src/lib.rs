//! Flash driver and EEPROM emulation core
//!
//! This crate contains everything above the controller strategy:
//!
//! - [`driver::FlashDriver`] - byte-range read / erase / write on top of any
//!   [`eeflash_hal::NvmController`]
//! - [`eeprom::Eeprom`] - RAM shadow with dirty tracking and a single
//!   erase+write commit
//! - [`flag::ValidityFlag`] - persisted "has been committed" word
//! - [`config::EepromConfig`] - region placement and polling settings
//!
//! # Example
//!
//! ```ignore
//! let nvm = AnyNvm::detect(unsafe { Mmio::new() }, config.poll())?;
//! let driver = FlashDriver::new(nvm);
//! let (region, flag) = config.validate(&driver.geometry())?;
//!
//! let mut eeprom: Eeprom<_, 1024> = Eeprom::new(driver);
//! eeprom.bind(region, flag)?;
//! eeprom.update(0, 42);
//! eeprom.commit()?;
//! ```

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod driver;
pub mod eeprom;
pub mod flag;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod region;
mod storage;
#[cfg(feature = "serde")]
mod typed;

pub use config::{ConfigError, EepromConfig};
pub use driver::FlashDriver;
pub use eeprom::{Eeprom, EepromError, EepromState};
pub use flag::{ValidityFlag, VALID_MAGIC};
pub use region::Region;
#[cfg(feature = "serde")]
pub use typed::MAX_VALUE_SIZE;

// Re-export the HAL traits so applications need only this crate
pub use eeflash_hal::{Flash, FlashError, FlashGeometry, NvmController, Poll};
