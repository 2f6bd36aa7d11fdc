//! Configuration module for the catalog API.
//!
//! Loads configuration from `config.toml` with environment variable overrides.

use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::error::AppError;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub rtdb: RtdbConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Upstream catalog service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// How long a fetched upstream config stays fresh.
    #[serde(default = "default_config_ttl_secs")]
    pub config_ttl_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            image_base_url: default_image_base_url(),
            timeout_secs: default_timeout_secs(),
            config_ttl_secs: default_config_ttl_secs(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn config_ttl(&self) -> Duration {
        Duration::from_secs(self.config_ttl_secs)
    }
}

fn default_base_url() -> String {
    "https://api.streamflix.app".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_config_ttl_secs() -> u64 {
    3600
}

/// Realtime database (episode stream) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RtdbConfig {
    /// `.ws` endpoint without query string.
    #[serde(default = "default_rtdb_url")]
    pub url: String,
    #[serde(default = "default_rtdb_namespace")]
    pub namespace: String,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: u32,
    /// Overall deadline for one episode resolution session.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
    #[serde(default = "default_max_buffer_chars")]
    pub max_buffer_chars: usize,
}

impl Default for RtdbConfig {
    fn default() -> Self {
        Self {
            url: default_rtdb_url(),
            namespace: default_rtdb_namespace(),
            protocol_version: default_protocol_version(),
            deadline_secs: default_deadline_secs(),
            max_buffer_chars: default_max_buffer_chars(),
        }
    }
}

impl RtdbConfig {
    /// Full endpoint URL including namespace and protocol version.
    pub fn endpoint(&self) -> String {
        rtdb_protocol::endpoint_url(&self.url, &self.namespace, self.protocol_version)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

fn default_rtdb_url() -> String {
    "wss://chilflix-410be-default-rtdb.asia-southeast1.firebasedatabase.app/.ws".to_string()
}

fn default_rtdb_namespace() -> String {
    "chilflix-410be-default-rtdb".to_string()
}

fn default_protocol_version() -> u32 {
    rtdb_protocol::PROTOCOL_VERSION
}

fn default_deadline_secs() -> u64 {
    30
}

fn default_max_buffer_chars() -> usize {
    rtdb_protocol::DEFAULT_MAX_CHARS
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `config.toml` in current directory (optional)
    /// 3. Environment variables with `CATALOG_` prefix
    /// 4. `PORT`, if set, for the listen port
    ///
    /// Environment variables use double underscore for nesting:
    /// - `CATALOG_SERVER__PORT=9000` sets `server.port`
    /// - `CATALOG_RTDB__DEADLINE_SECS=10` sets `rtdb.deadline_secs`
    pub fn load() -> Result<Self, AppError> {
        Self::load_from("config.toml")
    }

    /// Load configuration from a specific file path.
    pub fn load_from(config_path: &str) -> Result<Self, AppError> {
        let mut builder = ConfigLoader::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("upstream.base_url", default_base_url())?
            .set_default("upstream.timeout_secs", default_timeout_secs() as i64)?
            .set_default("rtdb.deadline_secs", default_deadline_secs() as i64)?
            .add_source(File::with_name(config_path).required(false))
            // CATALOG_SERVER__PORT=9000 -> server.port = 9000
            .add_source(
                Environment::with_prefix("CATALOG")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.rtdb.deadline_secs == 0 {
            return Err(AppError::Internal(
                "rtdb.deadline_secs must be greater than zero".to_string(),
            ));
        }

        if !self.rtdb.url.starts_with("ws://") && !self.rtdb.url.starts_with("wss://") {
            tracing::warn!(url = %self.rtdb.url, "Realtime database URL is not a WebSocket URL");
        }

        Ok(())
    }

    /// Get the server socket address
    pub fn server_addr(&self) -> std::net::SocketAddr {
        use std::net::{IpAddr, Ipv4Addr, SocketAddr};
        let ip: IpAddr = self.server.host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid host '{}', using 0.0.0.0", self.server.host);
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        });
        SocketAddr::new(ip, self.server.port)
    }
}
