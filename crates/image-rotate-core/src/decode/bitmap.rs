//! Content-sniffing decoder for the formats the pipeline accepts.

use std::io::Cursor;

use image::{ImageError, ImageReader, Limits};

use super::types::mime_type_for;
use super::{DecodeError, DecodeLimits, DecodedImage};

/// Decode image bytes of any supported format into an RGBA buffer.
///
/// The format is detected from the content, not from a file name. EXIF
/// orientation is left untouched: pixels come back exactly as stored.
///
/// # Arguments
///
/// * `bytes` - Encoded image bytes (JPEG, PNG, WebP, GIF or BMP)
/// * `limits` - Allocation ceiling for the decoded buffer
///
/// # Errors
///
/// - `DecodeError::InvalidFormat` - bytes are empty or not a known format
/// - `DecodeError::CorruptedFile` - the format is known but the data is bad
/// - `DecodeError::DimensionsUnknown` - the image decoded to zero pixels
/// - `DecodeError::OutOfMemory` - the buffer would exceed `limits`
pub fn decode_image(bytes: &[u8], limits: &DecodeLimits) -> Result<DecodedImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let format = reader.format().ok_or(DecodeError::InvalidFormat)?;

    let mut decoder_limits = Limits::default();
    decoder_limits.max_alloc = limits.max_alloc;
    reader.limits(decoder_limits);

    let img = reader.decode().map_err(map_image_error)?;
    if img.width() == 0 || img.height() == 0 {
        return Err(DecodeError::DimensionsUnknown);
    }

    let rgba = img.into_rgba8();
    Ok(DecodedImage::from_rgba_image(rgba).with_mime_type(mime_type_for(format)))
}

fn map_image_error(err: ImageError) -> DecodeError {
    match err {
        ImageError::Limits(e) => DecodeError::OutOfMemory(e.to_string()),
        ImageError::Unsupported(_) => DecodeError::InvalidFormat,
        other => DecodeError::CorruptedFile(other.to_string()),
    }
}
