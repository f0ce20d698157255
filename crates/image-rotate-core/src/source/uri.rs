use std::fmt;
use std::path::Path;

use reqwest::Url;

use super::SourceError;

pub const FILE_URI_PREFIX: &str = "file://";
pub const CONTENT_URI_PREFIX: &str = "content://";

/// Where an image comes from, classified by URI prefix.
///
/// Only `file://` and `content://` are local. Every other string, including
/// ones that are not valid URLs at all, is handed to the remote fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceUri {
    File(String),
    Content(String),
    Remote(String),
}

impl SourceUri {
    /// Classify a URI. Blank input is rejected.
    pub fn parse(uri: &str) -> Result<Self, SourceError> {
        if uri.trim().is_empty() {
            return Err(SourceError::Empty);
        }

        let uri = uri.to_string();
        Ok(if uri.starts_with(FILE_URI_PREFIX) {
            SourceUri::File(uri)
        } else if uri.starts_with(CONTENT_URI_PREFIX) {
            SourceUri::Content(uri)
        } else {
            SourceUri::Remote(uri)
        })
    }

    /// `file://` URI for an absolute filesystem path.
    pub fn from_path(path: &Path) -> Option<Self> {
        Url::from_file_path(path)
            .ok()
            .map(|url| SourceUri::File(url.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            SourceUri::File(uri) | SourceUri::Content(uri) | SourceUri::Remote(uri) => uri,
        }
    }

    pub fn is_local(&self) -> bool {
        !matches!(self, SourceUri::Remote(_))
    }
}

impl fmt::Display for SourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
