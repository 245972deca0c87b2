//! Layered daemon configuration.
//!
//! Sources are merged in order (later overrides earlier):
//! 1. Built-in defaults
//! 2. The TOML config file, when present
//! 3. Environment variables with the `REPOSYNC_` prefix
//!
//! Example config file:
//! ```toml
//! interval_secs = 60
//!
//! [[connections]]
//! url = "https://github.com"
//! token = "ghp_..."
//!
//! [[connections]]
//! url = "https://ghe.example.com"
//! token = "..."
//! repositoryQuery = ["none"]
//! repos = ["platform/build", "platform/deploy"]
//! ```

use std::path::Path;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use reposync::ConnectionConfig;
use serde::Deserialize;

/// Top-level daemon settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds between two sync cycles of one connection.
    pub interval_secs: u64,
    /// Configured code-host instances.
    pub connections: Vec<ConnectionConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            connections: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from `path` (if it exists) and the environment.
    ///
    /// An unreadable or malformed source is logged and the defaults are
    /// used instead.
    pub fn load(path: &Path) -> Self {
        let mut builder = ConfigBuilder::builder();

        if path.exists() {
            tracing::debug!(path = %path.display(), "loading config file");
            builder = builder.add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(Environment::with_prefix("REPOSYNC").try_parsing(true));

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Settings>() {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to deserialize config, using defaults");
                    Settings::default()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to build config, using defaults");
                Settings::default()
            }
        }
    }
}
