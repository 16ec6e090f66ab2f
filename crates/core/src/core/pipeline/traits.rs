//! Common Data Bus Interfaces.
//!
//! This module defines the two sides of the result bus. It provides:
//! 1. **Result Source Interface:** Units that buffer results waiting for the bus.
//! 2. **Subscriber Interface:** Components that snoop every broadcast for matching tags.

use super::cdb::CdbPacket;

/// A component that produces results for the common data bus.
pub trait ResultSource {
    /// Returns true if a result is ready to cross the bus this cycle.
    fn has_result(&self) -> bool;

    /// Removes and returns the oldest ready result.
    ///
    /// # Returns
    ///
    /// `None` if the source has nothing ready, for example after a squash.
    fn deliver(&mut self) -> Option<CdbPacket>;
}

/// A component that snoops every bus broadcast.
pub trait CdbSubscriber {
    /// Observes the packet broadcast this cycle.
    fn read_cdb(&mut self, packet: &CdbPacket);
}
