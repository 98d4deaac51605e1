use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tempfile::Builder;
use tracing::info;

use crate::app::{ProgressEvent, ProgressSink};
use crate::error::DataError;

const CHUNK_SIZE: usize = 64 * 1024;

pub trait ArchiveClient: Send + Sync {
    /// Streams `url` into `destination` and returns the number of bytes written.
    fn download(
        &self,
        url: &str,
        destination: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<u64, DataError>;
}

#[derive(Clone)]
pub struct HttpArchiveClient {
    client: Client,
}

impl HttpArchiveClient {
    pub fn new() -> Result<Self, DataError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("mri-data/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| DataError::Transfer(err.to_string()))?,
        );
        // Archives run to hundreds of megabytes; only the connect phase is bounded.
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(30))
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| DataError::Transfer(err.to_string()))?;
        Ok(Self { client })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, DataError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "archive request failed".to_string());
        Err(DataError::TransferStatus { status, message })
    }
}

impl ArchiveClient for HttpArchiveClient {
    fn download(
        &self,
        url: &str,
        destination: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<u64, DataError> {
        info!(%url, destination = %destination.display(), "downloading archive");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| DataError::Transfer(err.to_string()))?;
        let mut response = Self::handle_status(response)?;
        let total = response.content_length();
        sink.event(ProgressEvent::Transfer {
            downloaded: 0,
            total,
        });

        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|err| DataError::Filesystem(err.to_string()))?;
        let mut temp = Builder::new()
            .prefix(".mri-data-download")
            .tempfile_in(parent)
            .map_err(|err| DataError::Filesystem(err.to_string()))?;

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut downloaded = 0u64;
        loop {
            let read = response
                .read(&mut buffer)
                .map_err(|err| DataError::Transfer(err.to_string()))?;
            if read == 0 {
                break;
            }
            temp.write_all(&buffer[..read])
                .map_err(|err| DataError::Filesystem(err.to_string()))?;
            downloaded += read as u64;
            sink.event(ProgressEvent::Transfer { downloaded, total });
        }
        temp.flush()
            .map_err(|err| DataError::Filesystem(err.to_string()))?;

        temp.persist(destination)
            .map_err(|err| DataError::Filesystem(err.to_string()))?;
        info!(bytes = downloaded, "download complete");
        Ok(downloaded)
    }
}
