//! Pixel sampling for crop rendering.
//!
//! Cropping uses inverse mapping: for each pixel of the output, the matching
//! position in the source image is computed (undoing pan, zoom and rotation)
//! and the source is interpolated there.
//!
//! Positions are in source pixel-index space, where pixel centres sit on
//! integer coordinates. Anything more than half a pixel outside the source
//! samples as fully transparent.

use serde::{Deserialize, Serialize};

use crate::decode::ImageAsset;

/// Interpolation filter used when rendering a crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterpolationFilter {
    /// Fast bilinear interpolation.
    #[default]
    Bilinear,
    /// High-quality Lanczos3 interpolation.
    Lanczos3,
}

impl InterpolationFilter {
    /// Sample `image` at (x, y) with this filter.
    pub fn sample(self, image: &ImageAsset, x: f64, y: f64) -> [u8; 4] {
        match self {
            InterpolationFilter::Bilinear => sample_bilinear(image, x, y),
            InterpolationFilter::Lanczos3 => sample_lanczos3(image, x, y),
        }
    }
}

/// Size of the axis-aligned box containing an image rotated by `angle_degrees`.
pub fn rotated_extent(width: f64, height: f64, angle_degrees: f64) -> (f64, f64) {
    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    let (sin, cos) = (sin.abs(), cos.abs());
    (width * cos + height * sin, width * sin + height * cos)
}

/// Get a pixel as [f64; 4] from an image at the given coordinates.
#[inline]
fn get_pixel_f64(image: &ImageAsset, px: u32, py: u32) -> [f64; 4] {
    let idx = (py as usize * image.width as usize + px as usize) * 4;
    [
        image.pixels[idx] as f64,
        image.pixels[idx + 1] as f64,
        image.pixels[idx + 2] as f64,
        image.pixels[idx + 3] as f64,
    ]
}

#[inline]
fn inside(image: &ImageAsset, x: f64, y: f64) -> bool {
    x >= -0.5
        && x <= image.width as f64 - 0.5
        && y >= -0.5
        && y <= image.height as f64 - 0.5
}

/// Sample a pixel using bilinear interpolation over the 4 nearest pixels.
///
/// Edge pixels are extended by half a pixel so that a crop reaching the
/// border of the source keeps its outermost row and column.
pub(crate) fn sample_bilinear(image: &ImageAsset, x: f64, y: f64) -> [u8; 4] {
    if image.is_empty() || !inside(image, x, y) {
        return [0; 4];
    }

    let max_x = (image.width - 1) as f64;
    let max_y = (image.height - 1) as f64;
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(image.width - 1);
    let y1 = (y0 + 1).min(image.height - 1);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = get_pixel_f64(image, x0, y0);
    let p10 = get_pixel_f64(image, x1, y0);
    let p01 = get_pixel_f64(image, x0, y1);
    let p11 = get_pixel_f64(image, x1, y1);

    let mut result = [0u8; 4];
    for i in 0..4 {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }

    result
}

/// Sample a pixel using Lanczos3 interpolation over a 6x6 neighbourhood.
///
/// Falls back to bilinear where the kernel would leave the image.
pub(crate) fn sample_lanczos3(image: &ImageAsset, x: f64, y: f64) -> [u8; 4] {
    let (w, h) = (image.width as i64, image.height as i64);

    if x < 2.0 || x >= (w - 3) as f64 || y < 2.0 || y >= (h - 3) as f64 {
        return sample_bilinear(image, x, y);
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut sum = [0.0f64; 4];
    let mut weight_sum = 0.0;

    for ky in -2..=3 {
        for kx in -2..=3 {
            let px = x0 + kx;
            let py = y0 + ky;

            if px >= 0 && px < w && py >= 0 && py < h {
                let weight = lanczos_weight(x - px as f64, 3.0) * lanczos_weight(y - py as f64, 3.0);
                let pixel = get_pixel_f64(image, px as u32, py as u32);
                for i in 0..4 {
                    sum[i] += pixel[i] * weight;
                }
                weight_sum += weight;
            }
        }
    }

    let mut result = [0u8; 4];
    if weight_sum > 0.0 {
        for i in 0..4 {
            result[i] = (sum[i] / weight_sum).clamp(0.0, 255.0).round() as u8;
        }
    }

    result
}

/// Lanczos kernel weight: `sinc(x) * sinc(x/a)` for |x| < a, else 0.
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
