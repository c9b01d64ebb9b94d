use std::fs;
use std::path::{Path, PathBuf};

use layers::LayerConfig;
use routing::RoutingConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "bikemap.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of `bikemap.toml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub layer: LayerConfig,
    pub routing: RoutingConfig,
}

impl AppConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Loads `path` if given, otherwise `bikemap.toml` when present, otherwise
    /// defaults. An explicitly named file must exist and parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                info!("no {DEFAULT_CONFIG_PATH} found; using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        match Self::from_toml_str(&contents) {
            Ok(config) => {
                info!(path = %path.display(), "loaded configuration");
                Ok(config)
            }
            Err(source) => Err(ConfigError::Toml { path, source }),
        }
    }
}
