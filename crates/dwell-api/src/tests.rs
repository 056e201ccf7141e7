//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use dwell_engine::{Engine, EngineConfig};
use dwell_store_memory::MemoryPresenceStore;
use dwell_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{SharedEngine, api_router};

type TestEngine = SharedEngine<MemoryPresenceStore, SqliteStore>;

async fn make_engine() -> TestEngine {
  let durable = SqliteStore::open_in_memory().await.unwrap();
  durable.upsert_zone("Z1", 10).await.unwrap();
  Arc::new(
    Engine::new(
      Arc::new(MemoryPresenceStore::new()),
      Arc::new(durable),
      EngineConfig::default(),
    )
    .unwrap(),
  )
}

async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };
  let resp   = app.oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes  = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value  = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
  };
  (status, value)
}

async fn post_event(engine: &TestEngine, subject: &str, zone: &str, second: u32) -> Value {
  let event = json!({
    "subject_id": subject,
    "zone_id": zone,
    "observed_at": format!("2024-05-01T08:00:{second:02}Z"),
  });
  let (status, body) = call(api_router(Arc::clone(engine)), "POST", "/events", Some(event)).await;
  assert_eq!(status, StatusCode::OK);
  body
}

// ── Health / stats ──────────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_ok() {
  let engine = make_engine().await;
  let (status, body) = call(api_router(engine), "GET", "/health", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn stats_reflect_processed_events() {
  let engine = make_engine().await;
  post_event(&engine, "U1", "Z1", 0).await;
  post_event(&engine, "U1", "Z1", 5).await;

  let (status, body) = call(api_router(engine), "GET", "/stats", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["messages_processed"], 2);
  assert_eq!(body["warnings_issued"], 1);
  assert_eq!(body["zone_cache_size"], 1);
  assert_eq!(body["alert_capacity"], 100);
}

// ── Events ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn events_walk_through_an_episode() {
  let engine = make_engine().await;

  let entered = post_event(&engine, "U1", "Z1", 0).await;
  assert_eq!(entered["be_status"], "ENTERED");
  assert_eq!(entered["duration_seconds"], 0);
  assert_eq!(entered["subject_name"], "U1");
  assert!(entered.get("processed_at").is_some());

  let warning = post_event(&engine, "U1", "Z1", 5).await;
  assert_eq!(warning["be_status"], "WARNING");
  assert_eq!(warning["time_remaining"], 5);
  assert!(warning.get("threshold_seconds").is_none());

  let violation = post_event(&engine, "U1", "Z1", 11).await;
  assert_eq!(violation["be_status"], "VIOLATION");
  assert_eq!(violation["threshold_seconds"], 10);
  assert_eq!(violation["severity"], "LOW");
  assert!(violation.get("time_remaining").is_none());

  let ongoing = post_event(&engine, "U1", "Z1", 15).await;
  assert_eq!(ongoing["be_status"], "VIOLATION_ONGOING");
}

#[tokio::test]
async fn event_without_zone_is_invalid_not_rejected() {
  let engine = make_engine().await;
  let (status, body) = call(
    api_router(Arc::clone(&engine)),
    "POST",
    "/events",
    Some(json!({ "subject_id": "U1" })),
  )
  .await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["be_status"], "INVALID");
  assert_eq!(engine.statistics().errors, 1);
}

// ── Zones ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn zone_threshold_update_and_invalidate() {
  let engine = make_engine().await;

  let (status, body) = call(
    api_router(Arc::clone(&engine)),
    "PUT",
    "/zones/Z1/threshold",
    Some(json!({ "threshold_seconds": 3 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["threshold_seconds"], 3);

  post_event(&engine, "U1", "Z1", 0).await;
  assert_eq!(post_event(&engine, "U1", "Z1", 4).await["be_status"], "VIOLATION");

  let (_, body) = call(api_router(Arc::clone(&engine)), "DELETE", "/zones/Z1/threshold", None).await;
  assert_eq!(body["removed"], 1);

  post_event(&engine, "U2", "Z2", 0).await;
  let (_, body) = call(api_router(Arc::clone(&engine)), "DELETE", "/zones/thresholds", None).await;
  assert_eq!(body["removed"], 1);
}

#[tokio::test]
async fn negative_threshold_is_bad_request() {
  let engine = make_engine().await;
  let (status, body) = call(
    api_router(engine),
    "PUT",
    "/zones/Z1/threshold",
    Some(json!({ "threshold_seconds": -1 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("-1"));
}

// ── Tracking ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tracking_inspect_and_clear() {
  let engine = make_engine().await;

  let (status, _) = call(api_router(Arc::clone(&engine)), "GET", "/tracking/U1/Z1", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  post_event(&engine, "U1", "Z1", 0).await;
  post_event(&engine, "U1", "Z1", 11).await;

  let (status, body) = call(api_router(Arc::clone(&engine)), "GET", "/tracking/U1/Z1", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["alerted"], true);
  assert_eq!(body["threshold_seconds"], 10);

  let (_, body) = call(api_router(Arc::clone(&engine)), "DELETE", "/tracking/U1/Z1", None).await;
  assert_eq!(body["cleared"], true);

  let again = post_event(&engine, "U1", "Z1", 12).await;
  assert_eq!(again["be_status"], "ENTERED");
}

// ── Alerts ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn alerts_can_be_reviewed_once() {
  let engine = make_engine().await;
  post_event(&engine, "U1", "Z1", 0).await;
  post_event(&engine, "U1", "Z1", 20).await;

  let (status, body) = call(api_router(Arc::clone(&engine)), "GET", "/alerts", None).await;
  assert_eq!(status, StatusCode::OK);
  let alerts = body.as_array().unwrap();
  assert_eq!(alerts.len(), 1);
  assert_eq!(alerts[0]["severity"], "HIGH");
  let id = alerts[0]["alert_id"].as_str().unwrap().to_owned();

  let approve = format!("/alerts/{id}/approve");
  let (status, body) = call(api_router(Arc::clone(&engine)), "POST", &approve, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["alert_id"], id.as_str());

  let reject = format!("/alerts/{id}/reject");
  let (status, body) = call(api_router(Arc::clone(&engine)), "POST", &reject, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].is_string());
}
