//! Output format selection from a MIME type.

/// MIME type of the only output encoding that carries EXIF metadata.
pub const EXIF_MIME_TYPE: &str = "image/jpeg";

/// Encoding used for the rotated output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    WebP,
    /// Fallback for every other input type (JPEG, GIF, BMP, unknown).
    Jpeg,
}

impl OutputFormat {
    /// Pick the output encoding for a detected source MIME type.
    pub fn from_mime_type(mime_type: Option<&str>) -> Self {
        match mime_type {
            Some("image/png") => OutputFormat::Png,
            Some("image/webp") => OutputFormat::WebP,
            _ => OutputFormat::Jpeg,
        }
    }

    /// File extension including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => ".png",
            OutputFormat::WebP => ".webp",
            OutputFormat::Jpeg => ".jpg",
        }
    }

    /// MIME type of the encoded output.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    /// Whether the encoding keeps an alpha channel.
    pub fn has_alpha(self) -> bool {
        !matches!(self, OutputFormat::Jpeg)
    }
}
