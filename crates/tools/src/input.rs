use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use stations::{RewardTable, StationSnapshot};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("decoding {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn read(path: &Path) -> Result<String, InputError> {
    fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn json_error(path: &Path) -> impl FnOnce(serde_json::Error) -> InputError + '_ {
    move |source| InputError::Json {
        path: path.to_path_buf(),
        source,
    }
}

/// Loads a JSON array of station records.
pub fn load_stations(path: &Path) -> Result<StationSnapshot, InputError> {
    let json = read(path)?;
    let snapshot = StationSnapshot::from_json(&json).map_err(json_error(path))?;
    info!(path = %path.display(), stations = snapshot.len(), "loaded stations");
    Ok(snapshot)
}

pub fn load_rewards(path: &Path) -> Result<RewardTable, InputError> {
    RewardTable::from_json(&read(path)?).map_err(json_error(path))
}

/// Loads any JSON document, e.g. a replay script.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    serde_json::from_str(&read(path)?).map_err(json_error(path))
}
