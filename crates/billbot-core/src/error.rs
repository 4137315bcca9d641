use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid reference table: {0}")]
    InvalidReference(String),

    #[error("invalid letter templates: {0}")]
    InvalidTemplates(String),
}

/// Read and deserialize a JSON config file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, CoreError> {
    if !path.exists() {
        return Err(CoreError::ConfigNotFound(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path)?;
    let value = serde_json::from_str(&raw)?;
    tracing::debug!(path = %path.display(), "loaded JSON config");
    Ok(value)
}
