//! Resolving source URIs to image bytes.
//!
//! Local URIs go through a [`ContentResolver`]; everything else is fetched
//! with [`RemoteFetcher`].

mod remote;
mod resolver;
mod uri;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

pub use remote::RemoteFetcher;
pub use resolver::{ContentResolver, FileContentResolver};
pub use uri::{SourceUri, CONTENT_URI_PREFIX, FILE_URI_PREFIX};

/// Errors from resolving a source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Please specify a URI")]
    Empty,

    #[error("Cannot open {uri}: {source}")]
    Open { uri: String, source: io::Error },

    #[error("Cannot download {uri}: {source}")]
    Fetch { uri: String, source: reqwest::Error },
}

/// Routes a source to the resolver or the fetcher.
#[derive(Clone)]
pub struct SourceOpener {
    resolver: Arc<dyn ContentResolver>,
    fetcher: RemoteFetcher,
}

impl SourceOpener {
    pub fn new(resolver: Arc<dyn ContentResolver>, fetcher: RemoteFetcher) -> Self {
        Self { resolver, fetcher }
    }

    pub async fn open(&self, uri: &SourceUri) -> Result<Vec<u8>, SourceError> {
        match uri {
            SourceUri::Remote(url) => {
                self.fetcher
                    .fetch(url)
                    .await
                    .map_err(|source| SourceError::Fetch {
                        uri: url.clone(),
                        source,
                    })
            }
            local => self
                .resolver
                .open(local)
                .await
                .map_err(|source| SourceError::Open {
                    uri: local.to_string(),
                    source,
                }),
        }
    }

    /// Path metadata may be read from; always `None` for remote sources.
    pub fn local_path(&self, uri: &SourceUri) -> Option<PathBuf> {
        if uri.is_local() {
            self.resolver.local_path(uri)
        } else {
            None
        }
    }
}

impl std::fmt::Debug for SourceOpener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceOpener")
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}
