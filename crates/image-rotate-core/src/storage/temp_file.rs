//! Allocation of uniquely named output files in a cache directory.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use thiserror::Error;
use tracing::debug;

use super::SpaceProbe;
use crate::encode::OutputFormat;

/// Errors from choosing a cache root or creating a file in it.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Neither cache root exists.
    #[error("No cache directory available")]
    NoCacheDirectory,

    /// The chosen root exists but the file could not be created.
    #[error("Cannot create temporary file in {dir}: {source}")]
    CreateFailed { dir: PathBuf, source: io::Error },
}

/// The two cache roots output files may be written to.
///
/// A root only counts as available if it exists as a directory at the time
/// of the call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheDirectories {
    pub internal: Option<PathBuf>,
    pub external: Option<PathBuf>,
}

impl CacheDirectories {
    pub fn new(internal: Option<PathBuf>, external: Option<PathBuf>) -> Self {
        Self { internal, external }
    }

    /// Every configured root, internal first, whether or not it exists.
    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        self.internal
            .as_deref()
            .into_iter()
            .chain(self.external.as_deref())
    }

    /// Pick the root to write into.
    ///
    /// With both roots available the external one wins only if it has
    /// strictly more free space; unknown free space counts as zero.
    pub fn select_root(&self, probe: &dyn SpaceProbe) -> Result<&Path, StorageError> {
        let internal = self.internal.as_deref().filter(|p| p.is_dir());
        let external = self.external.as_deref().filter(|p| p.is_dir());

        match (internal, external) {
            (None, None) => Err(StorageError::NoCacheDirectory),
            (Some(dir), None) | (None, Some(dir)) => Ok(dir),
            (Some(internal), Some(external)) => {
                let internal_free = probe.available_space(internal).unwrap_or(0);
                let external_free = probe.available_space(external).unwrap_or(0);
                debug!(internal_free, external_free, "comparing cache roots");
                if external_free > internal_free {
                    Ok(external)
                } else {
                    Ok(internal)
                }
            }
        }
    }
}

/// Create an empty output file named `<prefix><random><extension>`.
///
/// The file is created exclusively, so an existing file is never reused or
/// overwritten. It is deleted when the returned handle drops unless the
/// caller persists it.
pub fn create_temp_file(
    dirs: &CacheDirectories,
    probe: &dyn SpaceProbe,
    prefix: &str,
    format: OutputFormat,
) -> Result<NamedTempFile, StorageError> {
    let dir = dirs.select_root(probe)?;

    Builder::new()
        .prefix(prefix)
        .suffix(format.extension())
        .tempfile_in(dir)
        .map_err(|source| StorageError::CreateFailed {
            dir: dir.to_path_buf(),
            source,
        })
}
