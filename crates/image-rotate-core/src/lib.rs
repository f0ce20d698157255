//! Image Rotate Core - rotate images and keep their camera metadata
//!
//! This crate rotates a source image (local file, content reference or
//! remote URL) by an arbitrary angle, writes the result to a cache
//! directory under a fixed name prefix, and carries an allowlist of EXIF
//! tags over for JPEG sources. Leftover output files are swept at startup
//! and teardown.

pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod rotator;
pub mod source;
pub mod storage;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::RotateConfig;
pub use decode::{decode_image, DecodeLimits, DecodedImage};
pub use encode::OutputFormat;
pub use error::RotateError;
pub use metadata::{copy_metadata, EXIF_TAGS};
pub use pipeline::{RotatedOutput, RotationRequest, RotationState};
pub use rotator::{ImageRotator, ImageRotatorBuilder};
pub use source::{ContentResolver, FileContentResolver, SourceUri};
pub use storage::{sweep_directories, CacheDirectories, DiskSpaceProbe, SpaceProbe, SweepReport};
pub use transform::{apply_rotation, compute_rotated_bounds, InterpolationFilter};
