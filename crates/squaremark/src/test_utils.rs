//! Shared test utilities for image-based unit tests.

use image::{ImageBuffer, Luma};

use crate::segment::IntensityImage;

/// One synthetic square: centre, half side length and rotation (radians).
#[derive(Debug, Clone, Copy)]
pub(crate) struct SquareSpec {
    pub center: [f64; 2],
    pub half_side: f64,
    pub angle: f64,
}

impl SquareSpec {
    pub(crate) fn axis_aligned(cx: f64, cy: f64, half_side: f64) -> Self {
        Self {
            center: [cx, cy],
            half_side,
            angle: 0.0,
        }
    }

    pub(crate) fn rotated(cx: f64, cy: f64, half_side: f64, angle: f64) -> Self {
        Self {
            center: [cx, cy],
            half_side,
            angle,
        }
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        let (s, c) = self.angle.sin_cos();
        let dx = x - self.center[0];
        let dy = y - self.center[1];
        let u = c * dx + s * dy;
        let v = -s * dx + c * dy;
        u.abs() <= self.half_side + 1e-9 && v.abs() <= self.half_side + 1e-9
    }
}

/// Render filled squares into an intensity image sampled at pixel centres.
///
/// With `bright_markers == false` the markers are 0.0 on a 1.0 background
/// (printed paper); otherwise the values are swapped.
pub(crate) fn draw_squares(
    w: u32,
    h: u32,
    squares: &[SquareSpec],
    bright_markers: bool,
) -> IntensityImage {
    let (marker, bg) = if bright_markers { (1.0, 0.0) } else { (0.0, 1.0) };
    ImageBuffer::from_fn(w, h, |x, y| {
        let inside = squares
            .iter()
            .any(|sq| sq.contains(x as f64, y as f64));
        Luma([if inside { marker } else { bg }])
    })
}

/// Pixel coordinates covered by `square` inside a `w x h` image.
pub(crate) fn covered_pixels(w: u32, h: u32, square: &SquareSpec) -> Vec<[f64; 2]> {
    let mut out = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if square.contains(x as f64, y as f64) {
                out.push([x as f64, y as f64]);
            }
        }
    }
    out
}
