//! Flash driver
//!
//! Turns the row / page primitives of an [`NvmController`] into byte-range
//! operations:
//!
//! - `read` is a plain copy, no controller involvement
//! - `erase` walks the range one row at a time
//! - `write` rounds up to whole words and feeds the page buffer at most one
//!   page at a time, never crossing a page boundary
//!
//! `write` does not erase. Callers erase first.

use eeflash_hal::geometry::{ERASED_BYTE, PAGE_SIZES, WORD_SIZE};
use eeflash_hal::{Flash, FlashError, FlashGeometry, NvmController};

/// Largest page the controllers can report, in words
const MAX_PAGE_WORDS: usize = (PAGE_SIZES[PAGE_SIZES.len() - 1] / WORD_SIZE) as usize;

/// Byte-range flash access through a controller strategy
#[derive(Debug)]
pub struct FlashDriver<C> {
    nvm: C,
    geometry: FlashGeometry,
}

impl<C: NvmController> FlashDriver<C> {
    /// Wrap a controller; geometry is read once here
    pub fn new(nvm: C) -> Self {
        let geometry = nvm.geometry();
        Self { nvm, geometry }
    }

    /// Borrow the controller
    pub fn controller(&self) -> &C {
        &self.nvm
    }

    /// Release the controller
    pub fn free(self) -> C {
        self.nvm
    }

    /// Feed `data` to the page buffer, one page-bounded chunk at a time
    fn program(&mut self, mut address: u32, data: &[u8]) -> Result<(), FlashError> {
        let mut words = data.chunks(WORD_SIZE as usize).map(word_from_bytes);
        let mut remaining = data.len().div_ceil(WORD_SIZE as usize);
        let mut buffer = [0u32; MAX_PAGE_WORDS];

        while remaining > 0 {
            let page_end = self.geometry.page_start(address) + self.geometry.page_size;
            let room = ((page_end - address) / WORD_SIZE) as usize;
            let count = room.min(remaining);
            for slot in &mut buffer[..count] {
                *slot = words.next().unwrap_or(u32::MAX);
            }
            self.nvm.write_page(address, &buffer[..count])?;
            address += count as u32 * WORD_SIZE;
            remaining -= count;
        }
        Ok(())
    }
}

/// Assemble a little-endian word byte by byte; missing bytes stay erased
///
/// The source slice has no alignment requirement.
fn word_from_bytes(chunk: &[u8]) -> u32 {
    let mut bytes = [ERASED_BYTE; WORD_SIZE as usize];
    bytes[..chunk.len()].copy_from_slice(chunk);
    u32::from_le_bytes(bytes)
}

impl<C: NvmController> Flash for FlashDriver<C> {
    fn geometry(&self) -> FlashGeometry {
        self.geometry
    }

    fn read(&self, address: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        if !self.geometry.contains(address, buf.len() as u32) {
            return Err(FlashError::OutOfBounds);
        }
        self.nvm.read(address, buf);
        Ok(())
    }

    fn erase(&mut self, address: u32, length: u32) -> Result<(), FlashError> {
        if !self.geometry.contains(address, length) {
            return Err(FlashError::OutOfBounds);
        }
        let row_size = self.geometry.row_size;
        let mut row = self.geometry.row_start(address);
        let mut remaining = length + (address - row);

        while remaining > row_size {
            self.nvm.erase_row(row)?;
            row += row_size;
            remaining -= row_size;
        }
        self.nvm.erase_row(row)
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<(), FlashError> {
        if address % WORD_SIZE != 0 {
            return Err(FlashError::Misaligned);
        }
        let padded = data.len().div_ceil(WORD_SIZE as usize) as u32 * WORD_SIZE;
        if !self.geometry.contains(address, padded) {
            return Err(FlashError::OutOfBounds);
        }
        if data.is_empty() {
            return Ok(());
        }

        self.nvm.begin_write()?;
        let result = self.program(address, data);
        self.nvm.end_write();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    /// Controller double recording row erases and page writes
    struct RecordingNvm {
        memory: [u8; 2048],
        erased_rows: Vec<u32, 16>,
        pages: Vec<(u32, usize), 64>,
        sessions: u32,
        in_session: bool,
    }

    impl RecordingNvm {
        fn new() -> Self {
            Self {
                memory: [0xFF; 2048],
                erased_rows: Vec::new(),
                pages: Vec::new(),
                sessions: 0,
                in_session: false,
            }
        }
    }

    impl NvmController for RecordingNvm {
        fn geometry(&self) -> FlashGeometry {
            FlashGeometry::new(64, 32, 256).unwrap()
        }

        fn read(&self, address: u32, buf: &mut [u8]) {
            let start = address as usize;
            buf.copy_from_slice(&self.memory[start..start + buf.len()]);
        }

        fn erase_row(&mut self, address: u32) -> Result<(), FlashError> {
            assert_eq!(address % 256, 0);
            self.erased_rows.push(address).unwrap();
            let start = address as usize;
            self.memory[start..start + 256].fill(0xFF);
            Ok(())
        }

        fn begin_write(&mut self) -> Result<(), FlashError> {
            self.in_session = true;
            self.sessions += 1;
            Ok(())
        }

        fn write_page(&mut self, address: u32, words: &[u32]) -> Result<(), FlashError> {
            assert!(self.in_session);
            assert_eq!(address % 4, 0);
            // Never crosses a page boundary
            assert_eq!(address / 64, (address + 4 * words.len() as u32 - 1) / 64);
            self.pages.push((address, words.len())).unwrap();
            for (i, word) in words.iter().enumerate() {
                let start = address as usize + 4 * i;
                for (cell, byte) in self.memory[start..start + 4]
                    .iter_mut()
                    .zip(word.to_le_bytes())
                {
                    *cell &= byte;
                }
            }
            Ok(())
        }

        fn end_write(&mut self) {
            self.in_session = false;
        }
    }

    #[test]
    fn test_erase_single_row() {
        let mut driver = FlashDriver::new(RecordingNvm::new());
        driver.erase(0x100, 256).unwrap();
        assert_eq!(&driver.controller().erased_rows[..], &[0x100]);
    }

    #[test]
    fn test_erase_multiple_rows() {
        let mut driver = FlashDriver::new(RecordingNvm::new());
        driver.erase(0, 1024).unwrap();
        assert_eq!(&driver.controller().erased_rows[..], &[0, 256, 512, 768]);
    }

    #[test]
    fn test_erase_partial_rows() {
        let mut driver = FlashDriver::new(RecordingNvm::new());
        // Touches rows 0x000 and 0x100 only
        driver.erase(0x80, 0x100).unwrap();
        assert_eq!(&driver.controller().erased_rows[..], &[0x000, 0x100]);
    }

    #[test]
    fn test_erase_zero_length_erases_containing_row() {
        let mut driver = FlashDriver::new(RecordingNvm::new());
        driver.erase(0x210, 0).unwrap();
        assert_eq!(&driver.controller().erased_rows[..], &[0x200]);
    }

    #[test]
    fn test_erase_out_of_bounds() {
        let mut driver = FlashDriver::new(RecordingNvm::new());
        assert_eq!(driver.erase(1792, 512), Err(FlashError::OutOfBounds));
        assert!(driver.controller().erased_rows.is_empty());
    }

    #[test]
    fn test_write_splits_at_page_boundaries() {
        let mut driver = FlashDriver::new(RecordingNvm::new());
        let data = [0x5A; 150];
        driver.write(0x30, &data).unwrap();

        let nvm = driver.controller();
        // 0x30..0x40 (4 words), 0x40..0x80 (16), 0x80..0xC0 (16), then 2 words
        assert_eq!(&nvm.pages[..], &[(0x30, 4), (0x40, 16), (0x80, 16), (0xC0, 2)]);
        assert_eq!(nvm.sessions, 1);
        assert!(!nvm.in_session);
        assert!(nvm.memory[0x30..0x30 + 150].iter().all(|&b| b == 0x5A));
        // Padding of the last word leaves flash erased
        assert_eq!(&nvm.memory[0x30 + 150..0x30 + 152], &[0xFF, 0xFF]);
    }

    #[test]
    fn test_write_unaligned_source() {
        let mut driver = FlashDriver::new(RecordingNvm::new());
        let backing = [0u8, 1, 2, 3, 4, 5, 6];
        driver.write(0, &backing[1..]).unwrap();
        let mut out = [0u8; 8];
        driver.read(0, &mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4, 5, 6, 0xFF, 0xFF]);
    }

    #[test]
    fn test_write_rejects_misaligned_target() {
        let mut driver = FlashDriver::new(RecordingNvm::new());
        assert_eq!(driver.write(2, &[0]), Err(FlashError::Misaligned));
        assert_eq!(driver.controller().sessions, 0);
    }

    #[test]
    fn test_write_empty_is_noop() {
        let mut driver = FlashDriver::new(RecordingNvm::new());
        driver.write(0, &[]).unwrap();
        assert_eq!(driver.controller().sessions, 0);
    }

    #[test]
    fn test_read_is_plain_copy() {
        let mut nvm = RecordingNvm::new();
        nvm.memory[10..13].copy_from_slice(&[7, 8, 9]);
        let driver = FlashDriver::new(nvm);
        let mut buf = [0u8; 3];
        driver.read(10, &mut buf).unwrap();
        assert_eq!(buf, [7, 8, 9]);
        assert_eq!(driver.read(2047, &mut buf), Err(FlashError::OutOfBounds));
    }
}
