//! Reading and writing meshes, histories and analysis tables.
//!
//! Meshes and histories are stored as JSON through the [`traits::MeshFile`]
//! interface; per-vertex gradients and plotting segments are exported as CSV.

pub mod csv;
pub mod json;
pub mod traits;

use std::path::Path;
use thiserror::Error;

/// Failure to load a configuration or parameter file, with the offending path.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

pub(crate) fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, FileError> {
    let content = std::fs::read_to_string(path).map_err(|e| FileError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| FileError::Toml {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}
