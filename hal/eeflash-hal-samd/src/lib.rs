//! SAMD21 / SAMD51 HAL for eeflash
//!
//! This crate provides the NVMCTRL drivers that implement
//! [`eeflash_hal::NvmController`] for the two supported families:
//!
//! - [`Samd21Nvm`] - SAMD21 class: 4-page rows, CTRLA commands, no cache
//! - [`Samd51Nvm`] - SAMD51 class: 64 blocks, CTRLB commands, NVMCTRL cache
//!   erratum workaround and CMCC invalidation
//! - [`AnyNvm`] - picks one of the above from the DSU device ID at startup
//!
//! # Features
//!
//! - `cortex-m` - Issue DSB/ISB after cache maintenance on real hardware
//! - `sim` - Register-level simulator ([`sim::SimBus`]) for host tests
//! - `defmt` - Enable debug formatting support
//!
//! # Usage
//!
//! ```ignore
//! let bus = unsafe { Mmio::new() };
//! let nvm = AnyNvm::detect(bus, Poll::bounded(1_000_000))?;
//! ```

#![no_std]

#[cfg(any(test, feature = "sim"))]
extern crate alloc;

pub mod any;
pub mod bus;
pub mod family;
pub mod regs;
pub mod samd21;
pub mod samd51;
#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use any::AnyNvm;
pub use bus::Mmio;
pub use family::{DetectError, Family};
pub use samd21::Samd21Nvm;
pub use samd51::Samd51Nvm;

// Re-export shared traits from eeflash-hal for convenience
pub use eeflash_hal::{FlashError, FlashGeometry, MemoryBus, NvmController, Poll};
