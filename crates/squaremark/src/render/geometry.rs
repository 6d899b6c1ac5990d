//! Square footprints, bounding boxes and frame scaling.

use std::f64::consts::FRAC_PI_4;

use nalgebra::{Point2, Vector2};

use super::RenderError;
use crate::Point;

/// Corners of the square with half-diagonal `radius` centred on `center`.
///
/// `orientation` points from the centre toward the middle of an edge, so the
/// first corner sits at `orientation + pi/4`; the rest follow at 90° steps
/// counter-clockwise.
pub fn square_corners(center: Point, radius: f64, orientation: f64) -> [Point; 4] {
    let theta = orientation + FRAC_PI_4;
    let c = Point2::from(center);
    let v = Vector2::new(radius * theta.cos(), radius * theta.sin());
    let perp = Vector2::new(-v.y, v.x);
    [
        (c + v).into(),
        (c + perp).into(),
        (c - v).into(),
        (c - perp).into(),
    ]
}

/// Axis-aligned box `[x0, x1] x [y0, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

impl Bounds {
    /// Tight box around `points`; `None` for an empty iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let init = Self {
            x0: first.x,
            x1: first.x,
            y0: first.y,
            y1: first.y,
        };
        Some(it.fold(init, |b, p| Self {
            x0: b.x0.min(p.x),
            x1: b.x1.max(p.x),
            y0: b.y0.min(p.y),
            y1: b.y1.max(p.y),
        }))
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn center(&self) -> Point {
        Point::new(0.5 * (self.x0 + self.x1), 0.5 * (self.y0 + self.y1))
    }

    /// Scale each axis about the box midpoint.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        let (x0, x1) = apply_scale_centered(sx, self.x0, self.x1);
        let (y0, y1) = apply_scale_centered(sy, self.y0, self.y1);
        Self { x0, x1, y0, y1 }
    }

    /// Grow outward by `d` on every side.
    pub fn expanded(&self, d: f64) -> Self {
        Self {
            x0: self.x0 - d,
            x1: self.x1 + d,
            y0: self.y0 - d,
            y1: self.y1 + d,
        }
    }

    /// Give a zero-extent axis a usable size, keeping the midpoint.
    ///
    /// A zero axis takes the other axis' extent; if both are zero the box
    /// becomes a unit square.
    pub fn with_min_extent(&self) -> Self {
        let (w, h) = (self.width(), self.height());
        let (tw, th) = match (w > 0.0, h > 0.0) {
            (true, true) => return *self,
            (true, false) => (w, w),
            (false, true) => (h, h),
            (false, false) => (1.0, 1.0),
        };
        let c = self.center();
        Self {
            x0: c.x - 0.5 * tw,
            x1: c.x + 0.5 * tw,
            y0: c.y - 0.5 * th,
            y1: c.y + 0.5 * th,
        }
    }
}

/// Scale the interval `[min, max]` by `s` about its midpoint.
pub fn apply_scale_centered(s: f64, min: f64, max: f64) -> (f64, f64) {
    (
        0.5 * (min * (1.0 + s) + max * (1.0 - s)),
        0.5 * (min * (1.0 - s) + max * (1.0 + s)),
    )
}

/// Per-axis enlargement that brings `width / height` to `ratio`.
///
/// Both factors are `>= 1` and at most one exceeds 1: the short side is
/// stretched, the long side is never shrunk.
pub fn scale_from_ratio(ratio: f64, width: f64, height: f64) -> Result<(f64, f64), RenderError> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(RenderError::InvalidOption(format!(
            "frame ratio must be finite and > 0, got {}",
            ratio
        )));
    }
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(RenderError::InvalidOption(format!(
            "cannot fit a ratio to a {}x{} box",
            width, height
        )));
    }

    let desired_width = height * ratio;
    if width < desired_width {
        return Ok((desired_width / width, 1.0));
    }
    let desired_height = width / ratio;
    if height < desired_height {
        return Ok((1.0, desired_height / height));
    }
    Ok((1.0, 1.0))
}
