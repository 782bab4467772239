use crate::bridge::{EdgeOrientation, ExportOptions, ImportOptions};
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    pub server: ServerConfig,
    pub export: ExportConfig,
    pub import: ImportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub root_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub batch_size: usize,
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    pub orientation: EdgeOrientation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                data_dir: PathBuf::from("./data/graph-bridge"),
                host: "localhost".to_string(),
                port: 2424,
                root_password: "root".to_string(),
            },
            export: ExportConfig {
                batch_size: crate::bridge::export::DEFAULT_BATCH_SIZE,
                max_concurrency: num_cpus::get(),
            },
            import: ImportConfig {
                orientation: EdgeOrientation::Preserved,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from a variable lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("BRIDGE_PORT") {
            Some(v) => v.parse::<u16>().with_context(|| format!("invalid BRIDGE_PORT '{}'", v))?,
            None => defaults.server.port,
        };
        let batch_size = match lookup("BRIDGE_BATCH_SIZE") {
            Some(v) => v
                .parse::<usize>()
                .with_context(|| format!("invalid BRIDGE_BATCH_SIZE '{}'", v))?,
            None => defaults.export.batch_size,
        };
        let max_concurrency = match lookup("BRIDGE_MAX_CONCURRENCY") {
            Some(v) => v
                .parse::<usize>()
                .with_context(|| format!("invalid BRIDGE_MAX_CONCURRENCY '{}'", v))?,
            None => defaults.export.max_concurrency,
        };
        let orientation = match lookup("BRIDGE_EDGE_ORIENTATION") {
            Some(v) => v.parse::<EdgeOrientation>().map_err(anyhow::Error::msg)?,
            None => defaults.import.orientation,
        };

        Ok(Self {
            server: ServerConfig {
                data_dir: lookup("BRIDGE_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.server.data_dir),
                host: lookup("BRIDGE_HOST").unwrap_or(defaults.server.host),
                port,
                root_password: lookup("BRIDGE_ROOT_PASSWORD").unwrap_or(defaults.server.root_password),
            },
            export: ExportConfig {
                batch_size,
                max_concurrency,
            },
            import: ImportConfig { orientation },
            logging: LoggingConfig {
                level: lookup("LOG_LEVEL").unwrap_or(defaults.logging.level),
                format: lookup("LOG_FORMAT").unwrap_or(defaults.logging.format),
            },
        })
    }

    /// `remote:` URL for a database on the configured host
    pub fn db_url(&self, database: &str) -> String {
        format!("remote:{}:{}/{}", self.server.host, self.server.port, database)
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            batch_size: self.export.batch_size,
            max_concurrency: self.export.max_concurrency,
            ..ExportOptions::default()
        }
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            orientation: self.import.orientation,
            ..ImportOptions::default()
        }
    }
}
