//! Fixtures for the rotator integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};

use exif::experimental::Writer;
use exif::{Field, In, Reader, Tag, Value};
use image::{ImageFormat, Rgba, RgbaImage};
use image_rotate_core::{ImageRotator, RotateConfig, SourceUri, SpaceProbe};
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const PREFIX: &str = "rotated_image_";

pub fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 255 / width) as u8, (y * 255 / height) as u8, 90, 255])
    })
}

pub fn encode(image: &RgbaImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    match format {
        // The JPEG encoder has no alpha support
        ImageFormat::Jpeg => image::DynamicImage::ImageRgba8(image.clone())
            .to_rgb8()
            .write_to(&mut out, format)
            .unwrap(),
        _ => image.write_to(&mut out, format).unwrap(),
    }
    out.into_inner()
}

pub fn ascii(tag: Tag, value: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![value.as_bytes().to_vec()]),
    }
}

/// A camera-style JPEG with an EXIF block.
pub fn jpeg_with_exif(width: u32, height: u32, fields: &[Field]) -> Vec<u8> {
    let mut writer = Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();

    let plain = encode(&gradient(width, height), ImageFormat::Jpeg);
    let mut jpeg = Jpeg::from_bytes(Bytes::from(plain)).unwrap();
    jpeg.set_exif(Some(Bytes::from(tiff.into_inner())));
    jpeg.encoder().bytes().to_vec()
}

/// Display values of the primary-IFD EXIF fields; empty without EXIF.
pub fn exif_fields(path: &Path) -> HashMap<Tag, String> {
    let file = File::open(path).unwrap();
    match Reader::new().read_from_container(&mut BufReader::new(file)) {
        Ok(exif) => exif
            .fields()
            .filter(|f| f.ifd_num == In::PRIMARY)
            .map(|f| (f.tag, f.display_value().to_string()))
            .collect(),
        Err(_) => HashMap::new(),
    }
}

pub fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

pub fn file_uri(path: &Path) -> String {
    SourceUri::from_path(path).unwrap().to_string()
}

pub fn uri_to_path(uri: &str) -> PathBuf {
    reqwest::Url::parse(uri).unwrap().to_file_path().unwrap()
}

pub fn prefixed_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with(PREFIX))
                .unwrap_or(false)
        })
        .collect()
}

pub fn config(cache: &TempDir) -> RotateConfig {
    let mut config = RotateConfig::default();
    config.internal_cache_dir = Some(cache.path().to_path_buf());
    config.sweep_on_start = false;
    config
}

pub fn rotator(cache: &TempDir) -> ImageRotator {
    ImageRotator::new(config(cache)).unwrap()
}

/// Probe answering from a fixed table.
#[derive(Default)]
pub struct TableProbe(pub HashMap<PathBuf, u64>);

impl SpaceProbe for TableProbe {
    fn available_space(&self, path: &Path) -> Option<u64> {
        self.0.get(path).copied()
    }
}

/// Serve one HTTP response on a local port, then close.
///
/// Returns the URL to request.
pub async fn serve_once(status: &'static str, body: Vec<u8>) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let head = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
            body.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&body).await.unwrap();
        socket.shutdown().await.ok();
    });

    (format!("http://{addr}/image"), handle)
}
