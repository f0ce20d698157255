//! EXIF metadata propagation.
//!
//! Only the JPEG output encoding carries EXIF. For those outputs the fields
//! in [`EXIF_TAGS`] are read from the source file and written verbatim into
//! the rotated copy; everything else is dropped.

mod allowlist;
mod copy;

pub use allowlist::{is_allowed, EXIF_TAGS};
pub use copy::{copy_metadata, MetadataError};
