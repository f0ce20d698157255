//! Encoding rotated buffers to PNG, WebP or JPEG.
//!
//! JPEG has no alpha channel, so transparent canvas corners are flattened
//! onto black before compression. PNG and WebP keep the alpha channel.
//! The `image` crate only ships a lossless WebP encoder, so `quality` only
//! affects JPEG output.

use std::borrow::Cow;
use std::io::Write;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use super::OutputFormat;
use crate::decode::DecodedImage;

/// Compression quality used for every rotated image.
pub const DEFAULT_QUALITY: u8 = 90;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The codec rejected the image or the writer failed
    #[error("{format:?} encoding failed: {message}")]
    EncodingFailed {
        format: OutputFormat,
        message: String,
    },
}

/// Encode an RGBA image into `writer`.
///
/// # Arguments
///
/// * `image` - RGBA pixel buffer to compress
/// * `format` - Target encoding
/// * `quality` - JPEG quality (1-100); clamped into range
/// * `writer` - Destination for the encoded bytes
pub fn encode_image<W: Write>(
    image: &DecodedImage,
    format: OutputFormat,
    quality: u8,
    writer: W,
) -> Result<(), EncodeError> {
    let (width, height) = (image.width, image.height);
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = width as usize * height as usize * DecodedImage::CHANNELS;
    if image.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: image.pixels.len(),
        });
    }

    let failed = |e: image::ImageError| EncodeError::EncodingFailed {
        format,
        message: e.to_string(),
    };

    // Formats without alpha get the buffer flattened onto black
    let (pixels, color) = if format.has_alpha() {
        (Cow::Borrowed(image.pixels.as_slice()), ExtendedColorType::Rgba8)
    } else {
        (Cow::Owned(image.to_rgb_pixels()), ExtendedColorType::Rgb8)
    };

    match format {
        OutputFormat::Jpeg => JpegEncoder::new_with_quality(writer, quality.clamp(1, 100))
            .write_image(&pixels, width, height, color)
            .map_err(failed),
        OutputFormat::Png => PngEncoder::new(writer)
            .write_image(&pixels, width, height, color)
            .map_err(failed),
        OutputFormat::WebP => WebPEncoder::new_lossless(writer)
            .write_image(&pixels, width, height, color)
            .map_err(failed),
    }
}

/// Encode into a fresh byte vector.
pub fn encode_to_vec(
    image: &DecodedImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = Vec::new();
    encode_image(image, format, quality, &mut buffer)?;
    Ok(buffer)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
