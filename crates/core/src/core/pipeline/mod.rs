//! Out-of-order pipeline implementation.
//!
//! This module contains the Tomasulo machinery driven once per cycle by the CPU.
//! It includes the following components:
//! 1. **RAT:** Register renaming and single-issue dispatch.
//! 2. **Reservation Stations:** Functional unit instances with operand wakeup.
//! 3. **LSQ:** Address generation, store-to-load forwarding and the memory port.
//! 4. **CDB:** Arbitration and broadcast of one result per cycle.
//! 5. **ROB:** In-order commit and misprediction rewind.
//! 6. **Tracker:** Diagnostic stage notifications.

/// Common data bus, result buffers and arbitration.
pub mod cdb;

/// Load/store queue.
pub mod lsq;

/// Register alias table and the rename/dispatch stage.
pub mod rat;

/// Reorder buffer.
pub mod rob;

/// Reservation-station functional units.
pub mod station;

/// Stage-transition tracking.
pub mod tracker;

/// Traits for bus sources and subscribers.
pub mod traits;

pub use self::cdb::{Cdb, CdbPacket};
pub use self::lsq::{LoadStoreQueue, LsqEvent};
pub use self::rat::{Dispatch, Rat, Renamed};
pub use self::rob::{Rob, RobTag};
pub use self::station::{FunctionalUnit, Operand, UnitPool};
pub use self::tracker::{NullTracker, Stage, Tracker};
