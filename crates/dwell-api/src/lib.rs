//! JSON REST API for the dwell engine.
//!
//! Exposes an axum [`Router`] over a shared [`Engine`]. Auth, TLS and the
//! listening socket are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = dwell_api::api_router(Arc::clone(&engine));
//! axum::serve(listener, app).await?;
//! ```

pub mod alerts;
pub mod error;
pub mod events;
pub mod tracking;
pub mod zones;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use dwell_core::store::{PresenceStore, ViolationLog, ZoneConfigSource};
use dwell_engine::Engine;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Shared handler state.
pub type SharedEngine<P, D> = Arc<Engine<P, D>>;

/// Build the API router for `engine`.
pub fn api_router<P, D>(engine: SharedEngine<P, D>) -> Router<()>
where
  P: PresenceStore + 'static,
  D: ZoneConfigSource + ViolationLog + 'static,
{
  Router::new()
    .route("/health", get(events::health))
    // Ingestion
    .route("/events", post(events::ingest::<P, D>))
    .route("/stats", get(events::stats::<P, D>))
    // Zone threshold cache
    .route("/zones/thresholds", delete(zones::invalidate_all::<P, D>))
    .route(
      "/zones/{zone_id}/threshold",
      put(zones::update::<P, D>).delete(zones::invalidate_one::<P, D>),
    )
    // Tracking
    .route(
      "/tracking/{subject_id}/{zone_id}",
      get(tracking::get_one::<P, D>).delete(tracking::clear::<P, D>),
    )
    // Alerts
    .route("/alerts", get(alerts::list::<P, D>))
    .route("/alerts/{alert_id}/approve", post(alerts::approve::<P, D>))
    .route("/alerts/{alert_id}/reject", post(alerts::reject::<P, D>))
    .layer(TraceLayer::new_for_http())
    .with_state(engine)
}

#[cfg(test)]
mod tests;
