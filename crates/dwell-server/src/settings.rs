//! Server settings: an optional TOML file layered under `DWELL__*`
//! environment variables.

use std::path::{Path, PathBuf};

use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use dwell_engine::EngineConfig;
use serde::{Deserialize, Serialize};

/// Where tracking records live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceBackend {
  /// In this process only.
  #[default]
  Memory,
  /// In a SQLite file that several engine processes may share.
  Sqlite,
}

/// A durable threshold override written at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSeed {
  pub zone_id:        String,
  pub threshold_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  /// Durable store: zone thresholds and the violation log.
  pub store_path:    PathBuf,
  pub presence:      PresenceBackend,
  /// SQLite file for the `sqlite` presence backend. Defaults to `store_path`.
  pub presence_path: Option<PathBuf>,
  pub engine:        EngineConfig,
  pub zones:         Vec<ZoneSeed>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:          "127.0.0.1".to_string(),
      port:          8080,
      store_path:    PathBuf::from("dwell.db"),
      presence:      PresenceBackend::default(),
      presence_path: None,
      engine:        EngineConfig::default(),
      zones:         Vec::new(),
    }
  }
}

impl ServerConfig {
  /// Read `path` if it exists, then apply environment overrides such as
  /// `DWELL__PORT=9000` or `DWELL__ENGINE__IDLE_TTL_SECS=60`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_builder(Config::builder().add_source(File::from(path).required(false)))
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
    builder
      .add_source(Environment::with_prefix("DWELL").separator("__"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn presence_path(&self) -> PathBuf {
    expand_tilde(self.presence_path.as_deref().unwrap_or(&self.store_path))
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
