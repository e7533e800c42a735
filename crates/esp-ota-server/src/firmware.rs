//! Firmware image served to out-of-date devices.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Outcome of comparing a device's reported version with the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDecision {
    UpToDate,
    UpdateRequired,
}

impl UpdateDecision {
    /// Exact byte equality. There is no version ordering, so a device
    /// reporting a newer version than the target is still sent the image.
    pub fn for_version(reported: &[u8], target: &str) -> Self {
        if reported == target.as_bytes() {
            Self::UpToDate
        } else {
            Self::UpdateRequired
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FirmwareError {
    #[error("firmware path has no file name: {0}")]
    NoFileName(PathBuf),
    #[error("firmware file name cannot be sent in a header: {0}")]
    InvalidFileName(String),
    #[error("failed to open firmware {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("firmware path is not a regular file: {0}")]
    NotAFile(PathBuf),
}

impl IntoResponse for FirmwareError {
    fn into_response(self) -> Response {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

/// The single update image, identified by its path on disk.
#[derive(Debug, Clone)]
pub struct FirmwareImage {
    path: PathBuf,
    file_name: String,
    disposition: HeaderValue,
}

impl FirmwareImage {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, FirmwareError> {
        let path = path.into();
        let file_name = path
            .file_name()
            .ok_or_else(|| FirmwareError::NoFileName(path.clone()))?
            .to_string_lossy()
            .into_owned();

        let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
        let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{escaped}\""))
            .map_err(|_| FirmwareError::InvalidFileName(file_name.clone()))?;

        Ok(Self {
            path,
            file_name,
            disposition,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_disposition(&self) -> &HeaderValue {
        &self.disposition
    }

    /// Opens the file for one transfer. Nothing is cached between requests.
    pub async fn open(&self) -> Result<FirmwareDownload, FirmwareError> {
        let open_error = |source| FirmwareError::Open {
            path: self.path.clone(),
            source,
        };

        let file = File::open(&self.path).await.map_err(open_error)?;
        let metadata = file.metadata().await.map_err(open_error)?;
        if !metadata.is_file() {
            return Err(FirmwareError::NotAFile(self.path.clone()));
        }

        Ok(FirmwareDownload {
            file,
            len: metadata.len(),
            disposition: self.disposition.clone(),
        })
    }
}

/// An opened image, ready to be streamed as an attachment.
#[derive(Debug)]
pub struct FirmwareDownload {
    file: File,
    len: u64,
    disposition: HeaderValue,
}

impl IntoResponse for FirmwareDownload {
    fn into_response(self) -> Response {
        // Dropping the body on client disconnect closes the file.
        let body = Body::from_stream(ReaderStream::new(self.file));
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
                (header::CONTENT_LENGTH, HeaderValue::from(self.len)),
                (header::CONTENT_DISPOSITION, self.disposition),
            ],
            body,
        )
            .into_response()
    }
}
