//! In-memory [`Flash`] double
//!
//! Behaves like NOR flash (erase sets rows to `0xFF`, programming only
//! clears bits) and records every erase and write call so tests can check
//! how often the emulator touched flash.

use core::cell::Cell;

use heapless::Vec;

use eeflash_hal::geometry::{ERASED_BYTE, WORD_SIZE};
use eeflash_hal::{Flash, FlashError, FlashGeometry};

/// Page size of the mock
pub const MOCK_PAGE_SIZE: u32 = 64;

/// Row size of the mock (4 pages, SAMD21 style)
pub const MOCK_ROW_SIZE: u32 = 256;

/// Maximum number of recorded calls of each kind
pub const MAX_RECORDED_CALLS: usize = 64;

/// Flash of `CAP` bytes held in RAM
///
/// `CAP` should be a multiple of [`MOCK_ROW_SIZE`].
#[derive(Debug, Clone)]
pub struct MockFlash<const CAP: usize> {
    memory: [u8; CAP],
    erases: Vec<(u32, u32), MAX_RECORDED_CALLS>,
    writes: Vec<(u32, usize), MAX_RECORDED_CALLS>,
    overwrites: usize,
    fail_next: Option<FlashError>,
    fail_next_read: Cell<Option<FlashError>>,
}

impl<const CAP: usize> Default for MockFlash<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize> MockFlash<CAP> {
    /// Fully erased flash
    pub fn new() -> Self {
        Self {
            memory: [ERASED_BYTE; CAP],
            erases: Vec::new(),
            writes: Vec::new(),
            overwrites: 0,
            fail_next: None,
            fail_next_read: Cell::new(None),
        }
    }

    /// Raw contents
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Overwrite contents directly, without recording a call
    pub fn poke(&mut self, address: u32, data: &[u8]) {
        let start = address as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    /// Recorded `erase(address, length)` calls
    pub fn erase_calls(&self) -> &[(u32, u32)] {
        &self.erases
    }

    /// Recorded `write(address, data.len())` calls
    pub fn write_calls(&self) -> &[(u32, usize)] {
        &self.writes
    }

    /// Bytes programmed over cells that were not erased
    pub fn overwrites(&self) -> usize {
        self.overwrites
    }

    /// Forget recorded calls
    pub fn clear_calls(&mut self) {
        self.erases.clear();
        self.writes.clear();
        self.overwrites = 0;
    }

    /// Make the next erase or write fail with `error`
    pub fn fail_next(&mut self, error: FlashError) {
        self.fail_next = Some(error);
    }

    /// Make the next read fail with `error`
    pub fn fail_next_read(&mut self, error: FlashError) {
        self.fail_next_read.set(Some(error));
    }

    fn check(&mut self, address: u32, length: u32) -> Result<(), FlashError> {
        if let Some(error) = self.fail_next.take() {
            return Err(error);
        }
        if self.geometry().contains(address, length) {
            Ok(())
        } else {
            Err(FlashError::OutOfBounds)
        }
    }
}

impl<const CAP: usize> Flash for MockFlash<CAP> {
    fn geometry(&self) -> FlashGeometry {
        FlashGeometry {
            page_size: MOCK_PAGE_SIZE,
            page_count: CAP as u32 / MOCK_PAGE_SIZE,
            row_size: MOCK_ROW_SIZE,
        }
    }

    fn read(&self, address: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        if let Some(error) = self.fail_next_read.take() {
            return Err(error);
        }
        if !self.geometry().contains(address, buf.len() as u32) {
            return Err(FlashError::OutOfBounds);
        }
        let start = address as usize;
        buf.copy_from_slice(&self.memory[start..start + buf.len()]);
        Ok(())
    }

    fn erase(&mut self, address: u32, length: u32) -> Result<(), FlashError> {
        self.check(address, length)?;
        let _ = self.erases.push((address, length));
        let (start, end) = self.geometry().erase_span(address, length);
        let end = (end as usize).min(CAP);
        self.memory[start as usize..end].fill(ERASED_BYTE);
        Ok(())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<(), FlashError> {
        if address % WORD_SIZE != 0 {
            return Err(FlashError::Misaligned);
        }
        self.check(address, data.len() as u32)?;
        let _ = self.writes.push((address, data.len()));
        let start = address as usize;
        for (cell, &byte) in self.memory[start..start + data.len()].iter_mut().zip(data) {
            if *cell != ERASED_BYTE {
                self.overwrites += 1;
            }
            *cell &= byte;
        }
        Ok(())
    }
}
