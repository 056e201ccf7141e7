//! In-process hot layer for the dwell engine.
//!
//! [`MemoryPresenceStore`] keeps tracking records in a sharded concurrent map.
//! It is the right backend for a single engine process; replicas that must
//! share one hot layer use `dwell-store-sqlite` instead.

mod store;

pub use store::MemoryPresenceStore;

#[cfg(test)]
mod tests;
