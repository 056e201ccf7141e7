//! Handlers for the manual-review alert queue.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/alerts` | Pending alerts, oldest first |
//! | `POST` | `/alerts/:alert_id/approve` | 404 if not pending |
//! | `POST` | `/alerts/:alert_id/reject` | 404 if not pending |

use axum::{
  Json,
  extract::{Path, State},
};
use dwell_core::store::{PresenceStore, ViolationLog, ZoneConfigSource};
use dwell_engine::alerts::{Alert, Decision};
use uuid::Uuid;

use crate::{SharedEngine, error::ApiError};

/// `GET /alerts`
pub async fn list<P, D>(State(engine): State<SharedEngine<P, D>>) -> Json<Vec<Alert>>
where
  P: PresenceStore + 'static,
  D: ZoneConfigSource + ViolationLog + 'static,
{
  Json(engine.alerts())
}

/// `POST /alerts/:alert_id/approve`
pub async fn approve<P, D>(
  State(engine): State<SharedEngine<P, D>>,
  Path(alert_id): Path<Uuid>,
) -> Result<Json<Alert>, ApiError>
where
  P: PresenceStore + 'static,
  D: ZoneConfigSource + ViolationLog + 'static,
{
  review(&engine, alert_id, Decision::Approve)
}

/// `POST /alerts/:alert_id/reject`
pub async fn reject<P, D>(
  State(engine): State<SharedEngine<P, D>>,
  Path(alert_id): Path<Uuid>,
) -> Result<Json<Alert>, ApiError>
where
  P: PresenceStore + 'static,
  D: ZoneConfigSource + ViolationLog + 'static,
{
  review(&engine, alert_id, Decision::Reject)
}

fn review<P, D>(
  engine: &SharedEngine<P, D>,
  alert_id: Uuid,
  decision: Decision,
) -> Result<Json<Alert>, ApiError>
where
  P: PresenceStore + 'static,
  D: ZoneConfigSource + ViolationLog + 'static,
{
  engine
    .review_alert(alert_id, decision)
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("alert {alert_id} is not pending")))
}
