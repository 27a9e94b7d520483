//! Configuration for the `registry-hub` server

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// Errors loading the configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read
    #[error("reading config {path}")]
    Read {
        /// Path of the config file
        path: Utf8PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML, or has unknown keys
    #[error("parsing config")]
    Parse(#[from] toml_edit::de::Error),
}

/// Server configuration
///
/// ```toml
/// listen = "127.0.0.1:3000"
/// data = "registries.json"
/// probe_timeout = 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Address to serve the API on
    pub listen: SocketAddr,

    /// Path of the registry file
    pub data: Utf8PathBuf,

    /// Seconds allowed for each call to a registry
    pub probe_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data: Utf8PathBuf::from("registries.json"),
            probe_timeout: 5,
        }
    }
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml_edit::de::from_str(text)?)
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist
    pub async fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Self::from_toml(&text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(%path, "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_owned(),
                source,
            }),
        }
    }

    /// Bound on each registry call
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout)
    }
}
