/// Common data bus arbitration.
pub mod cdb;

/// In-order retirement against a sequential reference.
pub mod commit_order;
