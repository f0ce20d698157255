//! Errors surfaced by the rotator.

use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;
use crate::source::SourceError;
use crate::storage::StorageError;
use crate::transform::TransformError;

/// Why a rotation request failed.
///
/// The error channel receives the `Display` text of this type.
#[derive(Debug, Error)]
pub enum RotateError {
    /// Rejected before any work started.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The source could not be opened or downloaded.
    #[error("Cannot open image source: {0}")]
    SourceUnavailable(String),

    #[error("Cannot decode image: {0}")]
    Decode(DecodeError),

    /// An allocation ceiling was hit while decoding or rotating.
    #[error("Out of memory: {0}")]
    ResourceExhausted(String),

    #[error("Could not determine MIME type")]
    UnknownFormat,

    /// No cache root is available, or the output file could not be created.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Cannot encode rotated image: {0}")]
    Encode(#[from] EncodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The background worker panicked or was cancelled.
    #[error("Rotation worker failed: {0}")]
    Worker(String),

    /// No tokio runtime to spawn work on.
    #[error("No async runtime available: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),

    /// The HTTP client for remote sources could not be set up.
    #[error("Cannot build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl From<DecodeError> for RotateError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::OutOfMemory(message) => RotateError::ResourceExhausted(message),
            other => RotateError::Decode(other),
        }
    }
}

impl From<TransformError> for RotateError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::InvalidAngle(_) => RotateError::InvalidArgument(err.to_string()),
            TransformError::ResourceExhausted { .. } => {
                RotateError::ResourceExhausted(err.to_string())
            }
            TransformError::InvalidPixelData { .. } => {
                RotateError::Decode(DecodeError::CorruptedFile(err.to_string()))
            }
        }
    }
}

impl From<StorageError> for RotateError {
    fn from(err: StorageError) -> Self {
        RotateError::StorageUnavailable(err.to_string())
    }
}

impl From<SourceError> for RotateError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Empty => RotateError::InvalidArgument(err.to_string()),
            SourceError::Open { .. } | SourceError::Fetch { .. } => {
                RotateError::SourceUnavailable(err.to_string())
            }
        }
    }
}
