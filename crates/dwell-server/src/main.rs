//! dwell server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the durable
//! SQLite store and the configured presence backend, and serves the engine's
//! JSON API over HTTP until Ctrl-C or SIGTERM. Queued violations are then
//! drained within the configured grace period.

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use dwell_core::store::PresenceStore;
use dwell_engine::Engine;
use dwell_store_memory::MemoryPresenceStore;
use dwell_store_sqlite::{SqlitePresenceStore, SqliteStore};
use settings::{PresenceBackend, ServerConfig};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Dwell-time violation engine")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the resolved configuration as JSON and exit.
  #[arg(long)]
  check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  if cli.check_config {
    println!("{}", serde_json::to_string_pretty(&server_cfg)?);
    return Ok(());
  }

  let store_path = server_cfg.store_path();
  let durable = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  for zone in &server_cfg.zones {
    durable
      .upsert_zone(&zone.zone_id, zone.threshold_secs)
      .await
      .with_context(|| format!("failed to seed zone {}", zone.zone_id))?;
    tracing::info!(zone_id = %zone.zone_id, threshold_secs = zone.threshold_secs, "seeded zone");
  }
  let durable = Arc::new(durable);

  match server_cfg.presence {
    PresenceBackend::Memory => {
      tracing::info!("tracking presence in memory");
      serve(Arc::new(MemoryPresenceStore::new()), durable, &server_cfg).await
    }
    PresenceBackend::Sqlite => {
      let path = server_cfg.presence_path();
      let presence = SqlitePresenceStore::open(&path)
        .await
        .with_context(|| format!("failed to open presence store at {path:?}"))?;
      tracing::info!(?path, "tracking presence in SQLite");
      serve(Arc::new(presence), durable, &server_cfg).await
    }
  }
}

async fn serve<P>(
  presence: Arc<P>,
  durable: Arc<SqliteStore>,
  server_cfg: &ServerConfig,
) -> anyhow::Result<()>
where
  P: PresenceStore + 'static,
{
  let engine = Arc::new(
    Engine::new(presence, durable, server_cfg.engine.clone())
      .context("invalid engine configuration")?,
  );

  let app     = dwell_api::api_router(Arc::clone(&engine));
  let address = server_cfg.address();

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("Listening on http://{address}");

  let served = axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error");

  // Drain even when the listener failed, so queued violations get a chance.
  let drain = engine.shutdown().await;
  let stats = engine.statistics();
  tracing::info!(
    clean = drain.clean,
    abandoned = drain.abandoned,
    messages_processed = stats.messages_processed,
    violations_detected = stats.violations_detected,
    violations_persisted = stats.violations_persisted,
    "shutdown complete"
  );

  served
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
      Ok(mut sigterm) => {
        sigterm.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => tracing::info!("received Ctrl-C, shutting down"),
    _ = terminate => tracing::info!("received SIGTERM, shutting down"),
  }
}
