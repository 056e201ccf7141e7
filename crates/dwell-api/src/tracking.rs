//! Handlers for `/tracking/:subject_id/:zone_id`.

use axum::{
  Json,
  extract::{Path, State},
};
use dwell_core::{
  store::{PresenceStore, ViolationLog, ZoneConfigSource},
  tracking::TrackingRecord,
};
use serde::Serialize;

use crate::{SharedEngine, error::ApiError};

/// `GET /tracking/:subject_id/:zone_id`: 404 if there is no live record.
pub async fn get_one<P, D>(
  State(engine): State<SharedEngine<P, D>>,
  Path((subject_id, zone_id)): Path<(String, String)>,
) -> Result<Json<TrackingRecord>, ApiError>
where
  P: PresenceStore + 'static,
  D: ZoneConfigSource + ViolationLog + 'static,
{
  let record = engine
    .tracking(&subject_id, &zone_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no live tracking for {subject_id}@{zone_id}")))?;
  Ok(Json(record))
}

#[derive(Debug, Serialize)]
pub struct Cleared {
  pub cleared: bool,
}

/// `DELETE /tracking/:subject_id/:zone_id`: `{"cleared":false}` when there
/// was nothing live to clear.
pub async fn clear<P, D>(
  State(engine): State<SharedEngine<P, D>>,
  Path((subject_id, zone_id)): Path<(String, String)>,
) -> Result<Json<Cleared>, ApiError>
where
  P: PresenceStore + 'static,
  D: ZoneConfigSource + ViolationLog + 'static,
{
  let cleared = engine.clear_tracking(&subject_id, &zone_id).await?;
  Ok(Json(Cleared { cleared }))
}
