use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::config::ResolvedConfig;
use crate::error::DataError;
use crate::fs_util::{self, NestedLayout};
use crate::manifest::{FetchManifest, iso_timestamp, write_manifest};
use crate::remote::ArchiveClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Download,
    Extract,
    Nested,
    Record,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Download => "Download",
            Phase::Extract => "Extract",
            Phase::Nested => "Nested",
            Phase::Record => "Record",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Phase { phase: Phase, message: String },
    /// Cumulative bytes received; `total` is set once the server announces a length.
    Transfer { downloaded: u64, total: Option<u64> },
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub url: String,
    pub archive: String,
    pub downloaded_bytes: Option<u64>,
    pub extraction_dir: String,
    pub extracted_files: usize,
    pub nested_dir: String,
    pub nested_archives: Vec<String>,
    pub manifest: String,
}

/// Download-then-extract pipeline over an [`ArchiveClient`].
#[derive(Clone)]
pub struct Fetcher<C: ArchiveClient> {
    client: C,
}

impl<C: ArchiveClient> Fetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn download(
        &self,
        url: &str,
        destination: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<u64, DataError> {
        sink.event(ProgressEvent::Phase {
            phase: Phase::Download,
            message: format!("fetching {url}"),
        });
        self.client.download(url, destination, sink)
    }

    pub fn extract_archive(
        &self,
        archive: &Path,
        output_dir: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<PathBuf>, DataError> {
        sink.event(ProgressEvent::Phase {
            phase: Phase::Extract,
            message: format!("unpacking {}", archive.display()),
        });
        fs_util::extract_zip(archive, output_dir)
    }

    pub fn extract_nested_archives(
        &self,
        root_dir: &Path,
        nested_dir: &Path,
        layout: NestedLayout,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<PathBuf>, DataError> {
        sink.event(ProgressEvent::Phase {
            phase: Phase::Nested,
            message: format!("scanning {} for nested archives", root_dir.display()),
        });
        fs_util::extract_nested_archives(root_dir, nested_dir, layout)
    }

    /// Runs download, top-level extraction, nested extraction and writes the manifest.
    ///
    /// Stops at the first failure; nothing already written is rolled back.
    pub fn run(
        &self,
        config: &ResolvedConfig,
        sink: &dyn ProgressSink,
    ) -> Result<FetchResult, DataError> {
        let archive = config.archive.as_std_path();
        let downloaded_bytes = if config.skip_download {
            if !archive.is_file() {
                return Err(DataError::MissingArchive(archive.to_path_buf()));
            }
            info!(archive = %config.archive, "download skipped, using local archive");
            None
        } else {
            Some(self.download(&config.url, archive, sink)?)
        };

        let extraction_dir = config.extraction_dir();
        let extracted = self.extract_archive(archive, extraction_dir.as_std_path(), sink)?;
        info!(dir = %extraction_dir, files = extracted.len(), "archive extracted");

        let nested_dir = config.nested_output_dir();
        let nested = self.extract_nested_archives(
            extraction_dir.as_std_path(),
            nested_dir.as_std_path(),
            config.nested_layout,
            sink,
        )?;
        let nested_archives: Vec<String> = nested
            .iter()
            .map(|path| path.display().to_string())
            .collect();

        let manifest_path = config.manifest_path();
        sink.event(ProgressEvent::Phase {
            phase: Phase::Record,
            message: format!("writing {manifest_path}"),
        });
        let manifest = FetchManifest {
            source_url: config.url.clone(),
            archive: config.archive.to_string(),
            extraction_dir: extraction_dir.to_string(),
            nested_dir: nested_dir.to_string(),
            nested_archives: nested_archives.clone(),
            downloaded_bytes,
            fetched_at: iso_timestamp(),
            tool: format!("mri-data/{}", env!("CARGO_PKG_VERSION")),
        };
        write_manifest(&manifest_path, &manifest)?;

        Ok(FetchResult {
            url: config.url.clone(),
            archive: config.archive.to_string(),
            downloaded_bytes,
            extraction_dir: extraction_dir.to_string(),
            extracted_files: extracted.len(),
            nested_dir: nested_dir.to_string(),
            nested_archives,
            manifest: manifest_path.to_string(),
        })
    }
}
