//! SQLite backends for the dwell engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.
//!
//! - [`SqliteStore`]: the cold layer (zone thresholds and the violation log).
//! - [`SqlitePresenceStore`]: a hot layer that several engine processes can
//!   share through one database file.

mod encode;
mod presence;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use presence::SqlitePresenceStore;
pub use store::SqliteStore;
