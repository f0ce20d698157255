//! Arbitrary-angle image rotation with bilinear and Lanczos3 interpolation.
//!
//! Right-angle rotations (any multiple of 90 degrees after normalization)
//! are lossless pixel permutations. Every other angle is resampled:
//! - **Bilinear**: the default smoothing filter
//! - **Lanczos3**: sharper, slower
//!
//! # Algorithm
//!
//! The rotation uses inverse mapping: for each pixel centre in the output
//! canvas we compute which source position it came from and interpolate.
//! With `y` pointing down, a positive angle θ turns the image clockwise and
//! the inverse transform is:
//! ```text
//! src_x =  (dst_x - dst_cx) * cos(θ) + (dst_y - dst_cy) * sin(θ) + src_cx
//! src_y = -(dst_x - dst_cx) * sin(θ) + (dst_y - dst_cy) * cos(θ) + src_cy
//! ```
//!
//! Interpolation works on premultiplied alpha so that the transparent area
//! outside the source never bleeds dark fringes into the edges.

use std::str::FromStr;

use image::imageops;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{DecodeLimits, DecodedImage};

/// Angles closer than this to a right angle take the lossless path.
const ANGLE_EPSILON: f64 = 0.001;

/// Interpolation filter for rotation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationFilter {
    /// Bilinear interpolation over the 2x2 neighbourhood.
    #[default]
    Bilinear,
    /// Lanczos3 interpolation over the 6x6 neighbourhood.
    Lanczos3,
}

impl FromStr for InterpolationFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bilinear" => Ok(InterpolationFilter::Bilinear),
            "lanczos3" | "lanczos" => Ok(InterpolationFilter::Lanczos3),
            other => Err(format!("unknown interpolation filter: {other}")),
        }
    }
}

/// Errors that can occur while rotating a pixel buffer.
#[derive(Debug, Error)]
pub enum TransformError {
    /// NaN or infinite angle.
    #[error("Rotation angle must be finite, got {0}")]
    InvalidAngle(f64),

    /// The rotated canvas could not be allocated.
    #[error("Out of memory: cannot allocate a {width}x{height} rotated canvas")]
    ResourceExhausted { width: u32, height: u32 },

    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },
}

/// Reduce any finite angle to `[0, 360)`.
pub fn normalize_angle(angle_degrees: f64) -> f64 {
    let normalized = angle_degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Number of clockwise quarter turns if the angle is a right angle.
fn quarter_turns(normalized: f64) -> Option<u8> {
    if (360.0 - normalized).abs() < ANGLE_EPSILON {
        return Some(0);
    }
    (0u8..4).find(|k| (normalized - 90.0 * *k as f64).abs() < ANGLE_EPSILON)
}

/// Compute the dimensions of the bounding box for a rotated image.
///
/// When an image is rotated, the corners extend beyond the original bounds.
/// This function calculates the smallest whole-pixel canvas that contains the
/// entire rotated image. The exact extent is rounded up, never down, so no
/// source pixel is clipped.
///
/// # Arguments
///
/// * `width` - Original image width
/// * `height` - Original image height
/// * `angle_degrees` - Rotation angle in degrees (positive = clockwise)
///
/// # Returns
///
/// Tuple of (new_width, new_height) for the rotated bounding box.
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    let normalized = normalize_angle(angle_degrees);

    match quarter_turns(normalized) {
        Some(0) | Some(2) => return (width, height),
        Some(_) => return (height, width),
        None => {}
    }

    let angle_rad = normalized.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    // new_w = |w*cos| + |h*sin|, new_h = |w*sin| + |h*cos|
    // The small slack keeps float noise from adding a whole pixel.
    let new_w = (w * cos + h * sin - 1e-6).ceil() as u32;
    let new_h = (w * sin + h * cos - 1e-6).ceil() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Apply rotation to an image.
///
/// The image is rotated clockwise around its center. The output canvas is
/// expanded to fit the entire rotated image (no clipping); the area not
/// covered by the source is fully transparent.
///
/// # Arguments
///
/// * `image` - Source image to rotate
/// * `angle_degrees` - Rotation angle in degrees, any finite value
/// * `filter` - Interpolation method for non-right angles
/// * `limits` - Allocation ceiling for the output canvas
///
/// # Errors
///
/// - `TransformError::InvalidAngle` - the angle is NaN or infinite
/// - `TransformError::ResourceExhausted` - the canvas exceeds `limits` or
///   cannot be allocated
/// - `TransformError::InvalidPixelData` - the buffer length is inconsistent
pub fn apply_rotation(
    image: &DecodedImage,
    angle_degrees: f64,
    filter: InterpolationFilter,
    limits: &DecodeLimits,
) -> Result<DecodedImage, TransformError> {
    if !angle_degrees.is_finite() {
        return Err(TransformError::InvalidAngle(angle_degrees));
    }

    let expected = image.width as usize * image.height as usize * DecodedImage::CHANNELS;
    if image.pixels.len() != expected {
        return Err(TransformError::InvalidPixelData {
            expected,
            actual: image.pixels.len(),
        });
    }

    let normalized = normalize_angle(angle_degrees);
    if let Some(turns) = quarter_turns(normalized) {
        return rotate_quarter_turns(image, turns, limits);
    }

    let (src_w, src_h) = (image.width as f64, image.height as f64);
    let (dst_w, dst_h) = compute_rotated_bounds(image.width, image.height, normalized);

    let mut output = allocate_canvas(dst_w, dst_h, limits)?;

    let angle_rad = normalized.to_radians();
    let cos = angle_rad.cos();
    let sin = angle_rad.sin();

    // Centers of source and destination images
    let src_cx = src_w / 2.0;
    let src_cy = src_h / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    for dst_y in 0..dst_h {
        for dst_x in 0..dst_w {
            // Pixel centre relative to the canvas center
            let dx = dst_x as f64 + 0.5 - dst_cx;
            let dy = dst_y as f64 + 0.5 - dst_cy;

            // Back into source index space, where pixel i is centred at i
            let src_x = dx * cos + dy * sin + src_cx - 0.5;
            let src_y = -dx * sin + dy * cos + src_cy - 0.5;

            let pixel = match filter {
                InterpolationFilter::Bilinear => sample_bilinear(image, src_x, src_y),
                InterpolationFilter::Lanczos3 => sample_lanczos3(image, src_x, src_y),
            };

            let dst_idx = (dst_y as usize * dst_w as usize + dst_x as usize) * 4;
            output[dst_idx..dst_idx + 4].copy_from_slice(&pixel);
        }
    }

    Ok(DecodedImage {
        width: dst_w,
        height: dst_h,
        pixels: output,
        mime_type: image.mime_type,
    })
}

fn rotate_quarter_turns(
    image: &DecodedImage,
    turns: u8,
    limits: &DecodeLimits,
) -> Result<DecodedImage, TransformError> {
    if turns == 0 {
        return Ok(image.clone());
    }

    let canvas_bytes = image.byte_size() as u64;
    if !limits.allows(canvas_bytes) {
        let (width, height) = compute_rotated_bounds(image.width, image.height, 90.0 * turns as f64);
        return Err(TransformError::ResourceExhausted { width, height });
    }

    let rgba = image
        .to_rgba_image()
        .ok_or(TransformError::InvalidPixelData {
            expected: image.pixel_count() as usize * DecodedImage::CHANNELS,
            actual: image.pixels.len(),
        })?;

    let rotated = match turns {
        1 => imageops::rotate90(&rgba),
        2 => imageops::rotate180(&rgba),
        _ => imageops::rotate270(&rgba),
    };

    Ok(DecodedImage::from_rgba_image(rotated).with_mime_type(image.mime_type))
}

/// Allocate a zeroed (fully transparent) RGBA canvas without aborting on OOM.
fn allocate_canvas(
    width: u32,
    height: u32,
    limits: &DecodeLimits,
) -> Result<Vec<u8>, TransformError> {
    let exhausted = TransformError::ResourceExhausted { width, height };

    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(DecodedImage::CHANNELS))
        .ok_or(TransformError::ResourceExhausted { width, height })?;

    if !limits.allows(len as u64) {
        return Err(exhausted);
    }

    let mut canvas = Vec::new();
    canvas.try_reserve_exact(len).map_err(|_| exhausted)?;
    canvas.resize(len, 0);
    Ok(canvas)
}

/// Get a pixel if the coordinates fall inside the image.
#[inline]
fn pixel_at(image: &DecodedImage, px: i64, py: i64) -> Option<&[u8]> {
    if px < 0 || py < 0 || px >= image.width as i64 || py >= image.height as i64 {
        return None;
    }
    let idx = (py as usize * image.width as usize + px as usize) * 4;
    Some(&image.pixels[idx..idx + 4])
}

/// Weighted sum of premultiplied samples.
///
/// Samples outside the source contribute weight but no coverage.
#[derive(Default)]
struct Accumulator {
    color: [f64; 3],
    alpha: f64,
    weight: f64,
}

impl Accumulator {
    #[inline]
    fn add(&mut self, image: &DecodedImage, px: i64, py: i64, weight: f64) {
        self.weight += weight;
        if let Some(p) = pixel_at(image, px, py) {
            let a = p[3] as f64 * weight;
            self.alpha += a;
            for i in 0..3 {
                self.color[i] += p[i] as f64 * a;
            }
        }
    }

    fn finish(&self) -> [u8; 4] {
        if self.weight.abs() < f64::EPSILON || self.alpha <= f64::EPSILON {
            return [0, 0, 0, 0];
        }

        let mut result = [0u8; 4];
        for i in 0..3 {
            result[i] = (self.color[i] / self.alpha).clamp(0.0, 255.0).round() as u8;
        }
        result[3] = (self.alpha / self.weight).clamp(0.0, 255.0).round() as u8;
        result
    }
}

/// Sample a pixel using bilinear interpolation.
///
/// Bilinear interpolation considers the 4 nearest pixels and weights
/// their contribution based on distance.
fn sample_bilinear(image: &DecodedImage, x: f64, y: f64) -> [u8; 4] {
    let (w, h) = (image.width as f64, image.height as f64);

    // Entirely outside the source, including the half-pixel fringe
    if x <= -1.0 || x >= w || y <= -1.0 || y >= h {
        return [0, 0, 0, 0];
    }

    let x0 = x.floor();
    let y0 = y.floor();

    // Fractional distances
    let fx = x - x0;
    let fy = y - y0;

    let (x0, y0) = (x0 as i64, y0 as i64);

    let mut acc = Accumulator::default();
    acc.add(image, x0, y0, (1.0 - fx) * (1.0 - fy));
    acc.add(image, x0 + 1, y0, fx * (1.0 - fy));
    acc.add(image, x0, y0 + 1, (1.0 - fx) * fy);
    acc.add(image, x0 + 1, y0 + 1, fx * fy);
    acc.finish()
}

/// Sample a pixel using Lanczos3 interpolation.
///
/// Lanczos3 considers a 6x6 neighborhood of pixels, providing
/// higher quality results especially for sharp edges.
fn sample_lanczos3(image: &DecodedImage, x: f64, y: f64) -> [u8; 4] {
    let (w, h) = (image.width as i64, image.height as i64);

    // Check bounds with kernel radius - fall back to bilinear near edges
    if x < 2.0 || x >= (w - 3) as f64 || y < 2.0 || y >= (h - 3) as f64 {
        return sample_bilinear(image, x, y);
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut acc = Accumulator::default();
    for ky in -2..=3 {
        for kx in -2..=3 {
            let px = x0 + kx;
            let py = y0 + ky;
            let weight = lanczos_weight(x - px as f64, 3.0) * lanczos_weight(y - py as f64, 3.0);
            acc.add(image, px, py, weight);
        }
    }
    acc.finish()
}

/// Lanczos kernel weight function.
///
/// ```text
/// L(x) = sinc(x) * sinc(x/a)  for |x| < a
/// L(x) = 0                     for |x| >= a
/// ```
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;

    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
