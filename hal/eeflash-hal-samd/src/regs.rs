//! Register map for the SAMD21 and SAMD51 NVMCTRL, CMCC and DSU
//!
//! Only the registers and fields used by the drivers are listed.
//! Addresses are absolute.

/// Start of the memory-mapped flash array
pub const FLASH_BASE: u32 = 0x0000_0000;

/// Key that must accompany every NVMCTRL command (CMDEX field)
pub const CMDEX_KEY: u16 = 0xA5 << 8;

/// Mask of the command field in the command register
pub const CMD_MASK: u16 = 0x7F;

/// Device Service Unit
pub mod dsu {
    /// Device identification register (same address on both families)
    pub const DID: u32 = 0x4100_2018;
    /// Processor field position in DID
    pub const DID_PROCESSOR_SHIFT: u32 = 28;
    /// Cortex-M0+
    pub const PROCESSOR_CM0P: u32 = 0x1;
    /// Cortex-M4
    pub const PROCESSOR_CM4: u32 = 0x6;
}

/// NVMCTRL PARAM register fields (same layout on both families)
pub mod param {
    /// Number of pages
    pub const NVMP_MASK: u32 = 0xFFFF;
    /// Page size index position
    pub const PSZ_SHIFT: u32 = 16;
    /// Page size index width
    pub const PSZ_MASK: u32 = 0x7;
}

/// SAMD21 NVMCTRL
pub mod samd21 {
    pub const NVMCTRL: u32 = 0x4100_4000;
    /// Control A: command register (16 bit)
    pub const CTRLA: u32 = NVMCTRL + 0x00;
    /// Control B (32 bit)
    pub const CTRLB: u32 = NVMCTRL + 0x04;
    pub const PARAM: u32 = NVMCTRL + 0x08;
    /// Interrupt flags (8 bit)
    pub const INTFLAG: u32 = NVMCTRL + 0x14;
    /// Address register, in 16-bit words
    pub const ADDR: u32 = NVMCTRL + 0x1C;

    /// Manual write: page buffer is only committed by an explicit WP
    pub const CTRLB_MANW: u32 = 1 << 7;

    pub const INTFLAG_READY: u8 = 1 << 0;

    /// Erase Row
    pub const CMD_ER: u16 = 0x02;
    /// Write Page
    pub const CMD_WP: u16 = 0x04;
    /// Page Buffer Clear
    pub const CMD_PBC: u16 = 0x44;

    /// Pages per erase row
    pub const PAGES_PER_ROW: u32 = 4;
}

/// SAMD51 NVMCTRL
pub mod samd51 {
    pub const NVMCTRL: u32 = 0x4100_4000;
    /// Control A (16 bit)
    pub const CTRLA: u32 = NVMCTRL + 0x00;
    /// Control B: command register (16 bit)
    pub const CTRLB: u32 = NVMCTRL + 0x04;
    pub const PARAM: u32 = NVMCTRL + 0x08;
    /// Interrupt flags (16 bit, write one to clear)
    pub const INTFLAG: u32 = NVMCTRL + 0x10;
    /// Status (16 bit)
    pub const STATUS: u32 = NVMCTRL + 0x12;
    /// Address register, in bytes
    pub const ADDR: u32 = NVMCTRL + 0x14;

    /// Write mode field; zero selects manual writes
    pub const CTRLA_WMODE_MASK: u16 = 0b11 << 4;
    /// Automatic double-word write mode
    pub const CTRLA_WMODE_ADW: u16 = 0b01 << 4;
    /// AHB0 cache disable
    pub const CTRLA_CACHEDIS0: u16 = 1 << 14;
    /// AHB1 cache disable
    pub const CTRLA_CACHEDIS1: u16 = 1 << 15;
    pub const CTRLA_CACHEDIS_MASK: u16 = CTRLA_CACHEDIS0 | CTRLA_CACHEDIS1;

    pub const INTFLAG_DONE: u16 = 1 << 0;
    pub const STATUS_READY: u16 = 1 << 0;

    /// Erase Block
    pub const CMD_EB: u16 = 0x01;
    /// Write Page
    pub const CMD_WP: u16 = 0x03;
    /// Page Buffer Clear
    pub const CMD_PBC: u16 = 0x15;

    /// The flash array is split into this many erase blocks
    pub const BLOCKS: u32 = 64;
}

/// Cortex-M Cache Controller (SAMD51 only)
pub mod cmcc {
    pub const BASE: u32 = 0x4100_6000;
    pub const CTRL: u32 = BASE + 0x08;
    pub const SR: u32 = BASE + 0x0C;
    pub const MAINT0: u32 = BASE + 0x20;

    /// Cache enable
    pub const CTRL_CEN: u32 = 1 << 0;
    /// Cache controller status: set while the cache is enabled
    pub const SR_CSTS: u32 = 1 << 0;
    /// Invalidate all cache entries
    pub const MAINT0_INVALL: u32 = 1 << 0;
}
