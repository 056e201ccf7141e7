//! Ingestion and read-only status endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/health` | Always `{"status":"ok"}` |
//! | `POST` | `/events` | Body: a presence event; returns the enriched event |
//! | `GET`  | `/stats` | Statistics snapshot |

use axum::{Json, extract::State};
use dwell_core::{
  event::{EnrichedEvent, PresenceEvent},
  store::{PresenceStore, ViolationLog, ZoneConfigSource},
};
use dwell_engine::stats::StatsSnapshot;
use serde_json::{Value, json};

use crate::SharedEngine;

/// `GET /health`
pub async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// `POST /events`
///
/// Always 200 for a well-formed JSON body: missing identifiers come back as
/// `be_status: "INVALID"`, store outages as `"ERROR"`.
pub async fn ingest<P, D>(
  State(engine): State<SharedEngine<P, D>>,
  Json(event): Json<PresenceEvent>,
) -> Json<EnrichedEvent>
where
  P: PresenceStore + 'static,
  D: ZoneConfigSource + ViolationLog + 'static,
{
  Json(engine.process(event).await)
}

/// `GET /stats`
pub async fn stats<P, D>(State(engine): State<SharedEngine<P, D>>) -> Json<StatsSnapshot>
where
  P: PresenceStore + 'static,
  D: ZoneConfigSource + ViolationLog + 'static,
{
  Json(engine.statistics())
}
