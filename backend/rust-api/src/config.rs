use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::models::identity::IdentityProviderConfig;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub upload: UploadSettings,
    #[serde(default)]
    pub practice: PracticeSettings,
    #[serde(default)]
    pub identity: IdentityProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8081".to_string()
}

/// Simulated upload and file picker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
    /// Delay between two progress ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Files larger than this fail the upload. `0` disables the check.
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,
    #[serde(default = "default_accepted_extensions")]
    pub accepted_extensions: Vec<String>,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_file_size_bytes: default_max_file_size_bytes(),
            accepted_extensions: default_accepted_extensions(),
            max_files: default_max_files(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_max_file_size_bytes() -> u64 {
    // 500 MiB
    500 * 1024 * 1024
}

fn default_accepted_extensions() -> Vec<String> {
    ["mp4", "mov", "avi", "webm"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_max_files() -> usize {
    1
}

/// Practice page session lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeSettings {
    /// A session untouched for this long is closed.
    #[serde(default = "default_session_idle_ttl_secs")]
    pub session_idle_ttl_secs: u64,
}

impl Default for PracticeSettings {
    fn default() -> Self {
        Self {
            session_idle_ttl_secs: default_session_idle_ttl_secs(),
        }
    }
}

impl PracticeSettings {
    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_ttl_secs)
    }
}

fn default_session_idle_ttl_secs() -> u64 {
    // 30 minutes
    30 * 60
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Root .env first, then the local one
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/*.toml + ENV overrides (APP__UPLOAD__TICK_INTERVAL_MS=...)
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("upload.accepted_extensions")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;

        if config.identity.user_pool_id.is_empty() {
            tracing::warn!("identity.user_pool_id is not set, clients will run guest-only");
        }

        if config.upload.tick_interval_ms == 0 {
            return Err(config::ConfigError::Message(
                "upload.tick_interval_ms must be greater than zero".to_string(),
            ));
        }

        if config.practice.session_idle_ttl_secs == 0 {
            return Err(config::ConfigError::Message(
                "practice.session_idle_ttl_secs must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }
}
