//! Volatile memory-mapped I/O
//!
//! The only place in the workspace that touches hardware addresses directly.

use eeflash_hal::MemoryBus;

/// Direct volatile access to the physical address space
#[derive(Debug)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Create the bus
    ///
    /// # Safety
    ///
    /// The caller must own the NVMCTRL and CMCC peripherals exclusively for
    /// the lifetime of the returned value, and must not keep references into
    /// flash ranges that are erased or written through it.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl MemoryBus for Mmio {
    fn read_u8(&self, address: u32) -> u8 {
        // SAFETY: exclusive peripheral ownership is asserted by `Mmio::new`
        unsafe { core::ptr::read_volatile(address as usize as *const u8) }
    }

    fn read_u16(&self, address: u32) -> u16 {
        // SAFETY: see `read_u8`
        unsafe { core::ptr::read_volatile(address as usize as *const u16) }
    }

    fn read_u32(&self, address: u32) -> u32 {
        // SAFETY: see `read_u8`
        unsafe { core::ptr::read_volatile(address as usize as *const u32) }
    }

    fn write_u16(&mut self, address: u32, value: u16) {
        // SAFETY: see `read_u8`
        unsafe { core::ptr::write_volatile(address as usize as *mut u16, value) }
    }

    fn write_u32(&mut self, address: u32, value: u32) {
        // SAFETY: see `read_u8`
        unsafe { core::ptr::write_volatile(address as usize as *mut u32, value) }
    }

    fn barrier(&self) {
        #[cfg(feature = "cortex-m")]
        {
            cortex_m::asm::dsb();
            cortex_m::asm::isb();
        }
    }
}
