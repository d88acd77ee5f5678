//! Busy-wait polling of hardware completion flags
//!
//! Flash controllers signal completion through status bits that have to be
//! spun on. By default the spin is unbounded, matching the hardware contract.
//! A bound turns a stuck controller into [`FlashError::HardwareTimeout`]
//! instead of a hang.

use crate::flash::FlashError;

/// Polling policy for controller status flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Poll {
    /// Maximum number of status reads, `None` spins forever
    limit: Option<u32>,
}

impl Poll {
    /// Spin until the flag is set, however long that takes
    pub const fn unbounded() -> Self {
        Self { limit: None }
    }

    /// Give up after `limit` unsuccessful status reads
    pub const fn bounded(limit: u32) -> Self {
        Self { limit: Some(limit) }
    }

    /// Build from an optional limit (as found in configuration)
    pub const fn from_limit(limit: Option<u32>) -> Self {
        Self { limit }
    }

    /// The configured limit, if any
    pub const fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Spin until `ready` returns true
    pub fn until(&self, mut ready: impl FnMut() -> bool) -> Result<(), FlashError> {
        match self.limit {
            None => {
                while !ready() {
                    core::hint::spin_loop();
                }
                Ok(())
            }
            Some(limit) => {
                for _ in 0..limit {
                    if ready() {
                        return Ok(());
                    }
                    core::hint::spin_loop();
                }
                // One last look so a limit of zero still observes a ready flag
                if ready() {
                    Ok(())
                } else {
                    Err(FlashError::HardwareTimeout)
                }
            }
        }
    }
}
