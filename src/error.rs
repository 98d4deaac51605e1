use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum DataError {
    #[error("download request failed: {0}")]
    Transfer(String),

    #[error("remote host returned status {status}: {message}")]
    TransferStatus { status: u16, message: String },

    #[error("failed to extract archive: {0}")]
    Extraction(String),

    #[error("archive not found: {0}")]
    #[diagnostic(help("run without --skip-download to fetch it first"))]
    MissingArchive(PathBuf),

    #[error("sample directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("sample index {index} out of range for store of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("failed to read sample {path}: {message}")]
    SampleRead { path: PathBuf, message: String },

    #[error("sample {path} has no field `{field}`")]
    MissingField { path: PathBuf, field: String },

    #[error("sample {0} has an empty label")]
    EmptyLabel(PathBuf),

    #[error("image in {0} has no positive maximum, cannot normalize")]
    DegenerateImage(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
