//! Core types for image decoding.

use image::ImageFormat;
use thiserror::Error;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not a recognized image format.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The decoder could not determine usable dimensions.
    #[error("Could not determine image dimensions")]
    DimensionsUnknown,

    /// Out of memory during decoding.
    #[error("Out of memory during decoding: {0}")]
    OutOfMemory(String),
}

/// Allocation ceiling shared by the decoder and the rotation transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum bytes a single pixel buffer may occupy. `None` disables the check.
    pub max_alloc: Option<u64>,
}

impl DecodeLimits {
    /// 512 MiB, matching the image crate's own default allocation limit.
    pub const DEFAULT_MAX_ALLOC: u64 = 512 * 1024 * 1024;

    pub fn new(max_alloc: Option<u64>) -> Self {
        Self { max_alloc }
    }

    /// Returns true if a buffer of `bytes` fits under the ceiling.
    pub fn allows(&self, bytes: u64) -> bool {
        match self.max_alloc {
            Some(max) => bytes <= max,
            None => true,
        }
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_alloc: Some(Self::DEFAULT_MAX_ALLOC),
        }
    }
}

/// Map a detected container format to the MIME type it is reported as.
///
/// Returns `None` for formats the pipeline has no output mapping for.
pub fn mime_type_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Png => Some("image/png"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::Bmp => Some("image/bmp"),
        _ => None,
    }
}

/// A decoded image with RGBA pixel data.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGBA pixel data in row-major order (4 bytes per pixel, straight alpha).
    /// Length should be width * height * 4.
    pub pixels: Vec<u8>,
    /// MIME type detected from the source bytes, if the format has one.
    pub mime_type: Option<&'static str>,
}

impl DecodedImage {
    /// Bytes per pixel of the RGBA buffer.
    pub const CHANNELS: usize = 4;

    /// Create a new DecodedImage with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * Self::CHANNELS,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
            mime_type: None,
        }
    }

    /// Attach the detected source MIME type.
    pub fn with_mime_type(mut self, mime_type: Option<&'static str>) -> Self {
        self.mime_type = mime_type;
        self
    }

    /// Create a DecodedImage from an image::RgbaImage.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img.into_raw();
        Self {
            width,
            height,
            pixels,
            mime_type: None,
        }
    }

    /// Convert to an image::RgbaImage for further processing.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Flatten onto black, dropping the alpha channel.
    ///
    /// Used for encoders without transparency; uncovered canvas becomes black.
    pub fn to_rgb_pixels(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.pixel_count() as usize * 3);
        for px in self.pixels.chunks_exact(Self::CHANNELS) {
            let alpha = px[3] as u16;
            for &c in &px[..3] {
                rgb.push(((c as u16 * alpha + 127) / 255) as u8);
            }
        }
        rgb
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Get the size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}
