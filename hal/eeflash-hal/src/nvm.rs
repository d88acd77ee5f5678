//! Non-volatile memory controller abstraction
//!
//! Each controller family implements the same small contract: erase one
//! row, write one page through the page buffer, and keep any cache in front
//! of the flash coherent. Command encodings, unlock keys and errata
//! workarounds stay inside the implementation.

use crate::flash::FlashError;
use crate::geometry::FlashGeometry;

/// Per-family flash controller strategy
///
/// A page write session looks like:
///
/// ```text
/// begin_write()
///   write_page(addr0, words)   // page buffer clear, fill, write page
///   write_page(addr1, words)
///   ...
/// end_write()
/// ```
///
/// `end_write` must be called even if a `write_page` fails, so that
/// controller settings changed by `begin_write` are restored.
pub trait NvmController {
    /// Geometry read from the controller's parameter register
    fn geometry(&self) -> FlashGeometry;

    /// Copy flash contents into `buf`; flash is ordinary readable memory
    fn read(&self, address: u32, buf: &mut [u8]);

    /// Erase the row containing `address` and wait for completion
    fn erase_row(&mut self, address: u32) -> Result<(), FlashError>;

    /// Switch the controller to explicit page writes
    fn begin_write(&mut self) -> Result<(), FlashError>;

    /// Clear the page buffer, fill it with `words` starting at `address`,
    /// commit the page and wait for completion
    ///
    /// `address` is word aligned and `words` never crosses a page boundary.
    fn write_page(&mut self, address: u32, words: &[u32]) -> Result<(), FlashError>;

    /// Restore whatever `begin_write` changed
    fn end_write(&mut self);

    /// Invalidate caches that could serve stale flash contents
    ///
    /// Families without such a cache keep the default no-op.
    fn invalidate_cache(&mut self) -> Result<(), FlashError> {
        Ok(())
    }
}
