//! Fixtures shared by unit tests.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};

use exif::experimental::Writer;
use exif::{Field, In, Reader, Tag, Value};
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};

use crate::decode::DecodedImage;
use crate::encode::{encode_to_vec, OutputFormat, DEFAULT_QUALITY};
use crate::storage::SpaceProbe;

/// Opaque image with red rising left to right and green rising top to bottom.
pub(crate) fn gradient_rgba(width: u32, height: u32) -> DecodedImage {
    let max_x = width.saturating_sub(1).max(1);
    let max_y = height.saturating_sub(1).max(1);
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[
                (x * 255 / max_x) as u8,
                (y * 255 / max_y) as u8,
                128,
                255,
            ]);
        }
    }
    DecodedImage::new(width, height, pixels)
}

pub(crate) fn encode_png_bytes(image: &DecodedImage) -> Vec<u8> {
    encode_to_vec(image, OutputFormat::Png, DEFAULT_QUALITY).unwrap()
}

pub(crate) fn encode_jpeg_bytes(image: &DecodedImage) -> Vec<u8> {
    encode_to_vec(image, OutputFormat::Jpeg, DEFAULT_QUALITY).unwrap()
}

pub(crate) fn ascii_field(tag: Tag, value: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![value.as_bytes().to_vec()]),
    }
}

/// JPEG of `image` carrying an EXIF block with `fields`.
pub(crate) fn jpeg_with_exif(image: &DecodedImage, fields: Vec<Field>) -> Vec<u8> {
    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();

    let mut jpeg = Jpeg::from_bytes(Bytes::from(encode_jpeg_bytes(image))).unwrap();
    jpeg.set_exif(Some(Bytes::from(tiff.into_inner())));
    jpeg.encoder().bytes().to_vec()
}

/// Display values of every primary-IFD field; empty when there is no EXIF.
pub(crate) fn read_exif_fields(path: &Path) -> HashMap<Tag, String> {
    let file = File::open(path).unwrap();
    match Reader::new().read_from_container(&mut BufReader::new(file)) {
        Ok(exif) => exif
            .fields()
            .filter(|f| f.ifd_num == In::PRIMARY)
            .map(|f| (f.tag, f.display_value().to_string()))
            .collect(),
        Err(exif::Error::NotFound(_)) => HashMap::new(),
        Err(e) => panic!("unreadable EXIF in {}: {}", path.display(), e),
    }
}

/// Space probe answering from a fixed table; unknown paths report nothing.
#[derive(Debug, Default)]
pub(crate) struct FixedSpaceProbe {
    space: HashMap<PathBuf, u64>,
}

impl FixedSpaceProbe {
    pub(crate) fn with(mut self, path: &Path, bytes: u64) -> Self {
        self.space.insert(path.to_path_buf(), bytes);
        self
    }
}

impl SpaceProbe for FixedSpaceProbe {
    fn available_space(&self, path: &Path) -> Option<u64> {
        self.space.get(path).copied()
    }
}
