//! The dwell-time violation engine.
//!
//! [`Engine::process`] takes one presence event at a time and returns it
//! enriched with a `be_status`. Around it sit the zone threshold resolver, the
//! background violation persister, the alert queue and the statistics
//! collector, all owned by one engine instance.
//!
//! The engine does no network listening of its own; `dwell-api` and
//! `dwell-server` put it behind HTTP.

pub mod alerts;
pub mod config;
pub mod engine;
pub mod error;
pub mod persister;
pub mod resolver;
pub mod stats;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Error, Result};
