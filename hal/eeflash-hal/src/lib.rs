//! eeflash Hardware Abstraction Layer
//!
//! This crate defines the traits that sit between the EEPROM emulation core
//! and the chip-specific non-volatile memory controller drivers. The same
//! emulation code runs on every supported controller family and on the host
//! against a simulated controller.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  eeflash-core (Eeprom, FlashDriver)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  eeflash-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  eeflash-hal-samd (SAMD21 / SAMD51)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`bus::MemoryBus`] - Volatile access to registers and memory-mapped flash
//! - [`nvm::NvmController`] - Row erase / page write for one controller family
//! - [`flash::Flash`] - Byte-range read / erase / write used by the emulator

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod flash;
pub mod geometry;
pub mod nvm;
pub mod poll;

// Re-export key types at crate root for convenience
pub use bus::MemoryBus;
pub use flash::{Flash, FlashError};
pub use geometry::FlashGeometry;
pub use nvm::NvmController;
pub use poll::Poll;
