//! Flash geometry
//!
//! Page and row sizes of a non-volatile memory controller. Geometry is read
//! once from the hardware and never changes afterwards.

/// Page sizes selectable by the 3-bit `PSZ` parameter field
pub const PAGE_SIZES: [u32; 8] = [8, 16, 32, 64, 128, 256, 512, 1024];

/// Value of an erased flash byte
pub const ERASED_BYTE: u8 = 0xFF;

/// Value of an erased flash word
pub const ERASED_WORD: u32 = 0xFFFF_FFFF;

/// Size of a programmable word in bytes
pub const WORD_SIZE: u32 = 4;

/// Page / row layout of a flash array
///
/// Invariant: `row_size` is a non-zero multiple of `page_size`, and
/// `page_size` is one of [`PAGE_SIZES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashGeometry {
    /// Bytes per write-buffer page
    pub page_size: u32,
    /// Number of pages implemented by the controller
    pub page_count: u32,
    /// Bytes per erase granule
    pub row_size: u32,
}

impl FlashGeometry {
    /// Create a geometry, checking the row/page invariant
    ///
    /// Returns `None` if `page_size` is not a supported page size or
    /// `row_size` is not a non-zero multiple of it.
    pub const fn new(page_size: u32, page_count: u32, row_size: u32) -> Option<Self> {
        let mut supported = false;
        let mut i = 0;
        while i < PAGE_SIZES.len() {
            if PAGE_SIZES[i] == page_size {
                supported = true;
            }
            i += 1;
        }
        if !supported || row_size == 0 || row_size % page_size != 0 {
            return None;
        }
        Some(Self {
            page_size,
            page_count,
            row_size,
        })
    }

    /// Total flash capacity in bytes
    pub const fn total_capacity(&self) -> u32 {
        self.page_size * self.page_count
    }

    /// Number of pages in one row
    pub const fn pages_per_row(&self) -> u32 {
        self.row_size / self.page_size
    }

    /// Number of 32-bit words in one page
    pub const fn words_per_page(&self) -> u32 {
        self.page_size / WORD_SIZE
    }

    /// Start address of the row containing `address`
    pub const fn row_start(&self, address: u32) -> u32 {
        address - address % self.row_size
    }

    /// Start address of the page containing `address`
    pub const fn page_start(&self, address: u32) -> u32 {
        address - address % self.page_size
    }

    /// Whether `[address, address + length)` lies inside the flash array
    pub const fn contains(&self, address: u32, length: u32) -> bool {
        match address.checked_add(length) {
            Some(end) => end <= self.total_capacity(),
            None => false,
        }
    }

    /// Row-aligned span `[start, end)` touched by an erase of
    /// `[address, address + length)`
    ///
    /// A zero-length range still covers the row containing `address`.
    pub const fn erase_span(&self, address: u32, length: u32) -> (u32, u32) {
        let start = self.row_start(address);
        let last = if length == 0 { address } else { address + length - 1 };
        (start, self.row_start(last) + self.row_size)
    }
}
