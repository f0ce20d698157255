use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Url;

use super::SourceUri;

/// Opens local sources.
///
/// Hosts with their own content providers implement this to serve
/// `content://` URIs. Remote URIs never reach a resolver.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    /// Read the whole source into memory.
    async fn open(&self, uri: &SourceUri) -> io::Result<Vec<u8>>;

    /// Filesystem path backing the source, if there is one.
    ///
    /// Metadata can only be copied from sources that have a path.
    fn local_path(&self, uri: &SourceUri) -> Option<PathBuf>;
}

/// Resolves `file://` URIs against the local filesystem.
///
/// `content://` URIs are reported as unsupported.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileContentResolver;

#[async_trait]
impl ContentResolver for FileContentResolver {
    async fn open(&self, uri: &SourceUri) -> io::Result<Vec<u8>> {
        match uri {
            SourceUri::File(raw) => {
                let path = file_path(raw).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, format!("not a file path: {raw}"))
                })?;
                tokio::fs::read(path).await
            }
            other => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("no content provider for {other}"),
            )),
        }
    }

    fn local_path(&self, uri: &SourceUri) -> Option<PathBuf> {
        match uri {
            SourceUri::File(raw) => file_path(raw),
            _ => None,
        }
    }
}

fn file_path(raw: &str) -> Option<PathBuf> {
    Url::parse(raw).ok()?.to_file_path().ok()
}
