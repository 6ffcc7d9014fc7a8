//! Geometric transforms applied to the uploaded image before OCR
//!
//! Rotation follows the usual photo-editor convention: positive angles turn
//! the image counter-clockwise and the canvas grows so nothing is cropped.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use tracing::debug;

use crate::config::{RotationInterpolation, RotationSettings};

/// Options for rendering a rotated image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationOptions {
    /// Colour of canvas area not covered by the source image
    pub fill: Rgba<u8>,
    /// Resampling filter for non right-angle rotations
    pub interpolation: RotationInterpolation,
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self::from(&RotationSettings::default())
    }
}

impl From<&RotationSettings> for RotationOptions {
    fn from(settings: &RotationSettings) -> Self {
        Self {
            fill: Rgba(settings.fill),
            interpolation: settings.interpolation,
        }
    }
}

/// Rotate `image` counter-clockwise by `degrees`, expanding the canvas to fit.
///
/// Multiples of 90 degrees are lossless and keep the source colour type.
/// Any other angle produces an RGBA image.
pub fn rotate_expand(image: &DynamicImage, degrees: i64, options: &RotationOptions) -> DynamicImage {
    match degrees.rem_euclid(360) {
        0 => image.clone(),
        90 => image.rotate270(),
        180 => image.rotate180(),
        270 => image.rotate90(),
        reduced => rotate_arbitrary(image, reduced as f64, options),
    }
}

/// Canvas size needed to hold a `width` x `height` image rotated by `degrees`
pub fn expanded_dimensions(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let (sin, cos) = rounded_sin_cos(degrees);
    let (hw, hh) = (width as f64 / 2.0, height as f64 / 2.0);
    let corners = [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)];

    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for (x, y) in corners {
        let rx = x * cos + y * sin;
        let ry = -x * sin + y * cos;
        min_x = min_x.min(rx);
        max_x = max_x.max(rx);
        min_y = min_y.min(ry);
        max_y = max_y.max(ry);
    }

    let new_w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let new_h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    (new_w, new_h)
}

/// Map an unbounded angle into the slider's (-180, 180] range
pub fn normalize_degrees(degrees: i64) -> i64 {
    let reduced = degrees.rem_euclid(360);
    if reduced > 180 {
        reduced - 360
    } else {
        reduced
    }
}

/// sin/cos with float noise around exact values removed
fn rounded_sin_cos(degrees: f64) -> (f64, f64) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let round = |v: f64| (v * 1e12).round() / 1e12;
    (round(sin), round(cos))
}

fn rotate_arbitrary(image: &DynamicImage, degrees: f64, options: &RotationOptions) -> DynamicImage {
    let source = image.to_rgba8();
    let (width, height) = source.dimensions();
    let (new_w, new_h) = expanded_dimensions(width, height, degrees);

    debug!(
        "Rotating {}x{} image by {} degrees onto {}x{} canvas",
        width, height, degrees, new_w, new_h
    );

    // imageproc rotates clockwise for positive angles
    let theta = -(degrees.to_radians() as f32);
    let projection = Projection::translate(new_w as f32 / 2.0, new_h as f32 / 2.0)
        * Projection::rotate(theta)
        * Projection::translate(-(width as f32) / 2.0, -(height as f32) / 2.0);

    let interpolation = match options.interpolation {
        RotationInterpolation::Nearest => Interpolation::Nearest,
        RotationInterpolation::Bilinear => Interpolation::Bilinear,
    };

    let mut out = RgbaImage::from_pixel(new_w, new_h, options.fill);
    warp_into(&source, &projection, interpolation, options.fill, &mut out);

    DynamicImage::ImageRgba8(out)
}
