//! Image encoding for rotated output files.
//!
//! This module provides functionality for:
//! - Mapping a source MIME type to an output encoding and file extension
//! - Compressing RGBA buffers to PNG, WebP or JPEG
//!
//! # Examples
//!
//! ```ignore
//! use image_rotate_core::encode::{encode_to_vec, OutputFormat, DEFAULT_QUALITY};
//!
//! let format = OutputFormat::from_mime_type(image.mime_type);
//! let bytes = encode_to_vec(&image, format, DEFAULT_QUALITY).unwrap();
//! ```

mod codec;
mod format;

pub use codec::{encode_image, encode_to_vec, EncodeError, DEFAULT_QUALITY};
pub use format::{OutputFormat, EXIF_MIME_TYPE};
