//! EXIF tags carried from the source image into the rotated copy.

use exif::Tag;

/// Tags eligible for copy-through, in copy order.
///
/// Everything else in the source EXIF (maker notes, thumbnails, software
/// strings, ...) is dropped.
pub const EXIF_TAGS: [Tag; 25] = [
    Tag::FNumber,
    Tag::DateTime,
    Tag::DateTimeDigitized,
    Tag::ExposureTime,
    Tag::Flash,
    Tag::FocalLength,
    Tag::GPSAltitude,
    Tag::GPSAltitudeRef,
    Tag::GPSDateStamp,
    Tag::GPSLatitude,
    Tag::GPSLatitudeRef,
    Tag::GPSLongitude,
    Tag::GPSLongitudeRef,
    Tag::GPSProcessingMethod,
    Tag::GPSTimeStamp,
    Tag::ImageLength,
    Tag::ImageWidth,
    Tag::PhotographicSensitivity,
    Tag::Make,
    Tag::Model,
    Tag::Orientation,
    Tag::SubSecTime,
    Tag::SubSecTimeDigitized,
    Tag::SubSecTimeOriginal,
    Tag::WhiteBalance,
];

/// Returns true if `tag` may be copied into a rotated image.
pub fn is_allowed(tag: Tag) -> bool {
    EXIF_TAGS.contains(&tag)
}
