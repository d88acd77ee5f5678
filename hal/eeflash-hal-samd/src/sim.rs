//! Register-level NVMCTRL simulator
//!
//! [`SimBus`] models the flash array, the page buffer, the NVMCTRL command
//! interface of either family and (for SAMD51) the CMCC. It executes
//! commands synchronously and records what the driver did, so host tests
//! can check command sequencing as well as the resulting flash contents.
//!
//! Programming behaves like real NOR flash: a page write can only clear
//! bits, so writing over data that was not erased first corrupts it.

use alloc::vec;
use alloc::vec::Vec;

use eeflash_hal::geometry::{ERASED_BYTE, WORD_SIZE};
use eeflash_hal::{FlashGeometry, MemoryBus};

use crate::family::{encode_param, Family};
use crate::regs::{cmcc, dsu, samd21, samd51, CMDEX_KEY, CMD_MASK};

/// DSU device ID reported by the simulated SAMD21 (SAMD21G18A)
pub const SAMD21_DEVICE_ID: u32 = 0x1001_0305;

/// DSU device ID reported by the simulated SAMD51 (SAMD51J19A)
pub const SAMD51_DEVICE_ID: u32 = 0x6006_0003;

/// Something the driver did to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// A keyed command was executed
    Command {
        /// Command code without the key
        cmd: u16,
        /// Byte address the command acted on
        address: u32,
        /// Both NVMCTRL AHB caches were disabled at the time (SAMD51)
        caches_disabled: bool,
    },
    /// Command register written without the CMDEX key
    BadKey(u16),
    /// Page buffer written while automatic page writes were enabled
    AutoWrite(u32),
    /// Page buffer write outside the page latched by earlier writes
    PageCrossing(u32),
    /// CMCC invalidated while disabled
    CacheInvalidated,
    /// CMCC invalidate requested while the cache was still enabled
    InvalidateWhileEnabled,
}

/// Simulated memory bus with a SAMD21 or SAMD51 NVMCTRL behind it
#[derive(Debug, Clone)]
pub struct SimBus {
    family: Family,
    geometry: FlashGeometry,
    device_id: u32,
    flash: Vec<u8>,
    page_buffer: Vec<u8>,
    latched_page: Option<u32>,
    ctrla: u16,
    ctrlb: u32,
    addr: u32,
    intflag: u16,
    cmcc_enabled: bool,
    stalled: bool,
    events: Vec<SimEvent>,
}

impl SimBus {
    /// Simulate a controller with the given page layout
    ///
    /// Returns `None` if the layout is not valid for the family. Flash
    /// starts fully erased.
    pub fn new(family: Family, page_size: u32, page_count: u32) -> Option<Self> {
        let param = encode_param(page_size, page_count)?;
        let geometry = family.geometry_from_param(param).ok()?;
        Some(Self::with_geometry(family, geometry))
    }

    /// 16 KiB SAMD21: 64-byte pages, 256-byte rows
    pub fn samd21() -> Self {
        Self::with_geometry(
            Family::Samd21,
            FlashGeometry {
                page_size: 64,
                page_count: 256,
                row_size: 256,
            },
        )
    }

    /// 64 KiB SAMD51: 512-byte pages, 1 KiB blocks
    pub fn samd51() -> Self {
        Self::with_geometry(
            Family::Samd51,
            FlashGeometry {
                page_size: 512,
                page_count: 128,
                row_size: 1024,
            },
        )
    }

    fn with_geometry(family: Family, geometry: FlashGeometry) -> Self {
        let (device_id, ctrla) = match family {
            Family::Samd21 => (SAMD21_DEVICE_ID, 0),
            // Powers up in automatic write mode so drivers relying on the
            // reset value of WMODE are caught
            Family::Samd51 => (SAMD51_DEVICE_ID, samd51::CTRLA_WMODE_ADW),
        };
        Self {
            family,
            geometry,
            device_id,
            flash: vec![ERASED_BYTE; geometry.total_capacity() as usize],
            page_buffer: vec![ERASED_BYTE; geometry.page_size as usize],
            latched_page: None,
            ctrla,
            ctrlb: 0,
            addr: 0,
            intflag: 0,
            cmcc_enabled: family == Family::Samd51,
            stalled: false,
            events: Vec::new(),
        }
    }

    /// Simulated family
    pub fn family(&self) -> Family {
        self.family
    }

    /// Simulated geometry
    pub fn geometry(&self) -> FlashGeometry {
        self.geometry
    }

    /// Raw flash contents
    pub fn flash(&self) -> &[u8] {
        &self.flash
    }

    /// Overwrite flash contents directly, bypassing the controller
    pub fn poke(&mut self, address: u32, data: &[u8]) {
        let start = address as usize;
        self.flash[start..start + data.len()].copy_from_slice(data);
    }

    /// Fill the whole array with `byte`, bypassing the controller
    pub fn fill(&mut self, byte: u8) {
        self.flash.fill(byte);
    }

    /// Change the reported device ID
    pub fn set_device_id(&mut self, device_id: u32) {
        self.device_id = device_id;
    }

    /// While stalled, commands are swallowed and completion flags stay low
    pub fn set_stalled(&mut self, stalled: bool) {
        self.stalled = stalled;
    }

    /// Current NVMCTRL CTRLA value
    pub fn ctrla(&self) -> u16 {
        self.ctrla
    }

    /// Preset CTRLA (e.g. to start with some caches disabled)
    pub fn set_ctrla(&mut self, ctrla: u16) {
        self.ctrla = ctrla;
    }

    /// Whether the CMCC is enabled
    pub fn cmcc_enabled(&self) -> bool {
        self.cmcc_enabled
    }

    /// Enable or disable the CMCC
    pub fn set_cmcc_enabled(&mut self, enabled: bool) {
        self.cmcc_enabled = enabled;
    }

    /// Everything recorded so far
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Number of executed commands with code `cmd`
    pub fn command_count(&self, cmd: u16) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, SimEvent::Command { cmd: c, .. } if *c == cmd))
            .count()
    }

    /// Number of row (block) erases executed
    pub fn erase_count(&self) -> usize {
        match self.family {
            Family::Samd21 => self.command_count(samd21::CMD_ER),
            Family::Samd51 => self.command_count(samd51::CMD_EB),
        }
    }

    /// Number of page writes executed
    pub fn page_write_count(&self) -> usize {
        match self.family {
            Family::Samd21 => self.command_count(samd21::CMD_WP),
            Family::Samd51 => self.command_count(samd51::CMD_WP),
        }
    }

    /// Number of CMCC invalidations performed correctly
    pub fn invalidate_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| **event == SimEvent::CacheInvalidated)
            .count()
    }

    /// Events that indicate a driver bug
    pub fn violations(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter().filter(|event| {
            matches!(
                event,
                SimEvent::BadKey(_)
                    | SimEvent::AutoWrite(_)
                    | SimEvent::PageCrossing(_)
                    | SimEvent::InvalidateWhileEnabled
            )
        })
    }

    fn in_flash(&self, address: u32) -> bool {
        (address as usize) < self.flash.len()
    }

    fn manual_write(&self) -> bool {
        match self.family {
            Family::Samd21 => self.ctrlb & samd21::CTRLB_MANW != 0,
            Family::Samd51 => self.ctrla & samd51::CTRLA_WMODE_MASK == 0,
        }
    }

    fn caches_disabled(&self) -> bool {
        self.family == Family::Samd51
            && self.ctrla & samd51::CTRLA_CACHEDIS_MASK == samd51::CTRLA_CACHEDIS_MASK
    }

    fn param(&self) -> u32 {
        encode_param(self.geometry.page_size, self.geometry.page_count).unwrap_or(0)
    }

    fn read_register(&self, address: u32) -> u32 {
        if address == dsu::DID {
            return self.device_id;
        }
        match self.family {
            Family::Samd21 => match address {
                samd21::CTRLA => self.ctrla as u32,
                samd21::CTRLB => self.ctrlb,
                samd21::PARAM => self.param(),
                samd21::INTFLAG if !self.stalled => samd21::INTFLAG_READY as u32,
                samd21::ADDR => self.addr,
                _ => 0,
            },
            Family::Samd51 => match address {
                samd51::CTRLA => self.ctrla as u32,
                samd51::PARAM => self.param(),
                samd51::INTFLAG => self.intflag as u32,
                samd51::STATUS if !self.stalled => samd51::STATUS_READY as u32,
                samd51::ADDR => self.addr,
                cmcc::CTRL | cmcc::SR if self.cmcc_enabled => 1,
                _ => 0,
            },
        }
    }

    fn write_page_buffer(&mut self, address: u32, value: u32) {
        let page = self.geometry.page_start(address);
        if !self.manual_write() {
            self.events.push(SimEvent::AutoWrite(address));
        }
        if self.latched_page.is_some_and(|latched| latched != page) {
            self.events.push(SimEvent::PageCrossing(address));
        }
        self.latched_page = Some(page);
        let offset = (address - page) as usize;
        self.page_buffer[offset..offset + WORD_SIZE as usize]
            .copy_from_slice(&value.to_le_bytes());
    }

    fn execute(&mut self, value: u16) {
        if value & !CMD_MASK != CMDEX_KEY {
            self.events.push(SimEvent::BadKey(value));
            return;
        }
        if self.stalled {
            return;
        }
        let cmd = value & CMD_MASK;
        let address = match self.family {
            Family::Samd21 => self.addr * 2,
            Family::Samd51 => self.addr,
        };
        let address = match (self.family, cmd) {
            (Family::Samd21, samd21::CMD_ER) | (Family::Samd51, samd51::CMD_EB) => {
                self.erase_row(address)
            }
            (Family::Samd21, samd21::CMD_WP) | (Family::Samd51, samd51::CMD_WP) => {
                self.program_page(address)
            }
            (Family::Samd21, samd21::CMD_PBC) | (Family::Samd51, samd51::CMD_PBC) => {
                self.page_buffer.fill(ERASED_BYTE);
                self.latched_page = None;
                address
            }
            _ => address,
        };
        if self.family == Family::Samd51 {
            self.intflag |= samd51::INTFLAG_DONE;
        }
        self.events.push(SimEvent::Command {
            cmd,
            address,
            caches_disabled: self.caches_disabled(),
        });
    }

    fn erase_row(&mut self, address: u32) -> u32 {
        let row = self.geometry.row_start(address);
        let start = row as usize;
        let end = (start + self.geometry.row_size as usize).min(self.flash.len());
        if start < end {
            self.flash[start..end].fill(ERASED_BYTE);
        }
        row
    }

    fn program_page(&mut self, address: u32) -> u32 {
        let page = self
            .latched_page
            .take()
            .unwrap_or_else(|| self.geometry.page_start(address));
        let start = page as usize;
        for (offset, &byte) in self.page_buffer.iter().enumerate() {
            if let Some(cell) = self.flash.get_mut(start + offset) {
                *cell &= byte;
            }
        }
        self.page_buffer.fill(ERASED_BYTE);
        page
    }
}

impl MemoryBus for SimBus {
    fn read_u8(&self, address: u32) -> u8 {
        if self.in_flash(address) {
            self.flash[address as usize]
        } else {
            self.read_register(address) as u8
        }
    }

    fn read_u16(&self, address: u32) -> u16 {
        if self.in_flash(address) {
            let a = address as usize;
            u16::from_le_bytes([self.flash[a], self.flash[a + 1]])
        } else {
            self.read_register(address) as u16
        }
    }

    fn read_u32(&self, address: u32) -> u32 {
        if self.in_flash(address) {
            let a = address as usize;
            u32::from_le_bytes([
                self.flash[a],
                self.flash[a + 1],
                self.flash[a + 2],
                self.flash[a + 3],
            ])
        } else {
            self.read_register(address)
        }
    }

    fn write_u16(&mut self, address: u32, value: u16) {
        match (self.family, address) {
            (Family::Samd21, samd21::CTRLA) => {
                self.ctrla = value;
                self.execute(value);
            }
            (Family::Samd51, samd51::CTRLA) => self.ctrla = value,
            (Family::Samd51, samd51::CTRLB) => self.execute(value),
            (Family::Samd51, samd51::INTFLAG) => self.intflag &= !value,
            _ => {}
        }
    }

    fn write_u32(&mut self, address: u32, value: u32) {
        if self.in_flash(address) {
            self.write_page_buffer(address, value);
            return;
        }
        match (self.family, address) {
            (Family::Samd21, samd21::CTRLB) => self.ctrlb = value,
            (Family::Samd21, samd21::ADDR) => self.addr = value & 0x3F_FFFF,
            (Family::Samd51, samd51::ADDR) => self.addr = value,
            (Family::Samd51, cmcc::CTRL) => self.cmcc_enabled = value & cmcc::CTRL_CEN != 0,
            (Family::Samd51, cmcc::MAINT0) if value & cmcc::MAINT0_INVALL != 0 => {
                let event = if self.cmcc_enabled {
                    SimEvent::InvalidateWhileEnabled
                } else {
                    SimEvent::CacheInvalidated
                };
                self.events.push(event);
            }
            _ => {}
        }
    }
}
