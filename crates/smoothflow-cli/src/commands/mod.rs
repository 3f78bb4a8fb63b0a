//! Subcommand implementations.

pub(crate) mod bound;
pub(crate) mod certify;
pub(crate) mod fit;

use crate::error::{CliError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read and parse a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| CliError::InvalidInput {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
