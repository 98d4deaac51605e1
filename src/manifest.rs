use std::fs;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Record of a completed fetch, written next to the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchManifest {
    pub source_url: String,
    pub archive: String,
    pub extraction_dir: String,
    pub nested_dir: String,
    pub nested_archives: Vec<String>,
    pub downloaded_bytes: Option<u64>,
    pub fetched_at: String,
    pub tool: String,
}

pub fn write_manifest(path: &Utf8Path, manifest: &FetchManifest) -> Result<(), DataError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| DataError::Filesystem(err.to_string()))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    let content = serde_json::to_vec_pretty(manifest)
        .map_err(|err| DataError::Filesystem(err.to_string()))?;
    fs::write(tmp_path.as_std_path(), &content)
        .map_err(|err| DataError::Filesystem(err.to_string()))?;
    fs::rename(tmp_path.as_std_path(), path.as_std_path())
        .map_err(|err| DataError::Filesystem(err.to_string()))?;
    Ok(())
}

pub fn read_manifest(path: &Utf8Path) -> Result<FetchManifest, DataError> {
    let content = fs::read_to_string(path.as_std_path())
        .map_err(|err| DataError::Filesystem(format!("read {path}: {err}")))?;
    serde_json::from_str(&content).map_err(|err| DataError::Filesystem(err.to_string()))
}

pub fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
