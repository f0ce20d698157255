//! Carry allowlisted EXIF fields from a source image into a rotated JPEG.

use std::fs::{self, File};
use std::io::{BufReader, Cursor, Write};
use std::path::{Path, PathBuf};

use exif::experimental::Writer;
use exif::{Exif, Field, In, Reader, Value};
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};
use tempfile::Builder;
use thiserror::Error;

use super::EXIF_TAGS;

/// Errors from copying metadata. Callers treat all of them as non-fatal.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The source file could not be opened.
    #[error("Cannot read metadata source {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The source EXIF block is malformed, or the new block could not be built.
    #[error("EXIF error: {0}")]
    Exif(#[from] exif::Error),

    /// The destination cannot hold an EXIF segment.
    #[error("Destination {path} is not a JPEG: {message}")]
    UnsupportedDestination { path: PathBuf, message: String },

    /// Reading or rewriting the destination failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Copy allowlisted EXIF tags from `source` into the JPEG at `dest`.
///
/// Tags absent (or empty) in the source are skipped. A source without any
/// EXIF block copies nothing and leaves `dest` untouched. Any EXIF segment
/// already in `dest` is replaced. On error `dest` keeps its old contents.
///
/// # Returns
///
/// Number of tags written.
pub fn copy_metadata(source: &Path, dest: &Path) -> Result<usize, MetadataError> {
    let Some(exif) = read_exif(source)? else {
        return Ok(0);
    };

    let fields = allowed_fields(&exif);
    if fields.is_empty() {
        return Ok(0);
    }

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, exif.little_endian())?;

    let dest_bytes = fs::read(dest)?;
    let mut jpeg = Jpeg::from_bytes(Bytes::from(dest_bytes)).map_err(|e| {
        MetadataError::UnsupportedDestination {
            path: dest.to_path_buf(),
            message: e.to_string(),
        }
    })?;
    jpeg.set_exif(Some(Bytes::from(tiff.into_inner())));
    replace_file(dest, &jpeg.encoder().bytes())?;

    Ok(fields.len())
}

/// Write `bytes` to a sibling temp file and rename it over `dest`.
///
/// The temp file is named after `dest`, so a leftover is still caught by
/// the cache sweep.
fn replace_file(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = dest.file_name().unwrap_or_default();

    let mut temp = Builder::new().prefix(prefix).suffix(".part").tempfile_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

/// Read the EXIF block of an image file; `None` if it has none.
fn read_exif(path: &Path) -> Result<Option<Exif>, MetadataError> {
    let file = File::open(path).map_err(|source| MetadataError::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    match Reader::new().read_from_container(&mut BufReader::new(file)) {
        Ok(exif) => Ok(Some(exif)),
        Err(exif::Error::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Allowlisted fields of the primary image that carry a value.
fn allowed_fields(exif: &Exif) -> Vec<&Field> {
    EXIF_TAGS
        .iter()
        .filter_map(|tag| exif.get_field(*tag, In::PRIMARY))
        .filter(|field| has_value(&field.value))
        .collect()
}

#[allow(unreachable_patterns)]
fn has_value(value: &Value) -> bool {
    match value {
        Value::Ascii(strings) => strings.iter().any(|s| !s.is_empty()),
        Value::Byte(v) | Value::Undefined(v, _) => !v.is_empty(),
        Value::Short(v) => !v.is_empty(),
        Value::Long(v) => !v.is_empty(),
        Value::Rational(v) => !v.is_empty(),
        Value::SByte(v) => !v.is_empty(),
        Value::SShort(v) => !v.is_empty(),
        Value::SLong(v) => !v.is_empty(),
        Value::SRational(v) => !v.is_empty(),
        Value::Float(v) => !v.is_empty(),
        Value::Double(v) => !v.is_empty(),
        // Unknown types cannot be re-encoded
        _ => false,
    }
}
