//! Image decoding for the rotation pipeline.
//!
//! This module provides functionality for:
//! - Sniffing the container format of arbitrary image bytes
//! - Decoding to a straight-alpha RGBA buffer under an allocation ceiling
//! - Reporting the detected MIME type alongside the pixels
//!
//! # Examples
//!
//! ```ignore
//! use image_rotate_core::decode::{decode_image, DecodeLimits};
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let image = decode_image(&bytes, &DecodeLimits::default()).unwrap();
//! println!("Decoded {}x{} {:?}", image.width, image.height, image.mime_type);
//! ```

mod bitmap;
mod types;

pub use bitmap::decode_image;
pub use types::{mime_type_for, DecodeError, DecodeLimits, DecodedImage};
