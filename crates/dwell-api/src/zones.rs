//! Handlers for the zone threshold cache.
//!
//! These only touch the engine's local cache. The durable configuration is
//! owned elsewhere; callers use these after changing it.

use axum::{
  Json,
  extract::{Path, State},
};
use dwell_core::store::{PresenceStore, ViolationLog, ZoneConfigSource};
use serde::{Deserialize, Serialize};

use crate::{SharedEngine, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ThresholdBody {
  pub threshold_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct ZoneThreshold {
  pub zone_id:           String,
  pub threshold_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct Invalidated {
  pub removed: usize,
}

/// `PUT /zones/:zone_id/threshold`, body: `{"threshold_seconds":n}`
pub async fn update<P, D>(
  State(engine): State<SharedEngine<P, D>>,
  Path(zone_id): Path<String>,
  Json(body): Json<ThresholdBody>,
) -> Result<Json<ZoneThreshold>, ApiError>
where
  P: PresenceStore + 'static,
  D: ZoneConfigSource + ViolationLog + 'static,
{
  engine.update_zone_cache(&zone_id, body.threshold_seconds)?;
  Ok(Json(ZoneThreshold { zone_id, threshold_seconds: body.threshold_seconds }))
}

/// `DELETE /zones/:zone_id/threshold`
pub async fn invalidate_one<P, D>(
  State(engine): State<SharedEngine<P, D>>,
  Path(zone_id): Path<String>,
) -> Json<Invalidated>
where
  P: PresenceStore + 'static,
  D: ZoneConfigSource + ViolationLog + 'static,
{
  Json(Invalidated { removed: engine.invalidate_zone_cache(Some(&zone_id)) })
}

/// `DELETE /zones/thresholds`
pub async fn invalidate_all<P, D>(State(engine): State<SharedEngine<P, D>>) -> Json<Invalidated>
where
  P: PresenceStore + 'static,
  D: ZoneConfigSource + ViolationLog + 'static,
{
  Json(Invalidated { removed: engine.invalidate_zone_cache(None) })
}
