//! squaremark — pure-Rust extraction and re-rendering of square fiducial markers.
//!
//! Works on photographed or rendered arrays of small, disjoint square markers.
//! The pipeline stages are:
//!
//! 1. **Segment** – threshold a grayscale image and label connected foreground
//!    regions (4- or 8-connectivity).
//! 2. **Fit** – per region, first-moment centroid and max-distance radius.
//! 3. **Orientation** – nearest-neighbour direction per marker, with optional
//!    anisotropic weighting of the neighbour search.
//! 4. **Render** – draw each marker as a rotated square and fit a frame around
//!    the drawing, optionally to a target aspect ratio.
//!
//! # Public API
//! - [`Extractor`] runs segment → fit → (orientation) on one image.
//! - [`estimate_orientations`] / [`assign_orientations`] for a later pass.
//! - [`render_markers`] produces a [`VectorDocument`] (SVG or EPS).
//! - [`MarkerFile`] is the JSON persistence contract shared by all workflows.

mod api;
mod debug;
mod error;
mod fit;
mod marker_file;
mod orientation;
mod render;
mod segment;
#[cfg(test)]
pub(crate) mod test_utils;

use std::f64::consts::PI;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

pub use api::{ExtractConfig, Extractor};
pub use debug::colorize_labels;
pub use error::{Error, Stage};
pub use fit::{fit_markers, fit_region, FitError};
pub use marker_file::{MarkerFile, MarkerFileError};
pub use orientation::{
    assign_orientations, estimate_orientations, nearest_neighbors, OrientationError,
    OrientationWeights,
};
pub use render::{
    apply_scale_centered, render_markers, scale_from_ratio, square_corners, Bounds,
    DocumentFormat, RenderError, RenderOptions, Shape, VectorDocument,
};
pub use segment::{
    binarize, intensity_from_gray, intensity_from_raw, label_regions, segment, Connectivity,
    IntensityImage, Polarity, RegionLabels, SegmentConfig, SegmentError,
};

/// A 2D point in image pixel coordinates (`x` = column, `y` = row).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Point2<f64>> for Point {
    fn from(p: Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<Point> for Point2<f64> {
    fn from(p: Point) -> Self {
        Point2::new(p.x, p.y)
    }
}

impl From<[f64; 2]> for Point {
    fn from(xy: [f64; 2]) -> Self {
        Self { x: xy[0], y: xy[1] }
    }
}

/// A square marker: centroid, half-diagonal and rotation.
///
/// Position and radius are fixed once fitted; only `orientation` is updated
/// afterwards (by orientation estimation or a manual override).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Region centroid in pixel coordinates.
    #[serde(deserialize_with = "crate::marker_file::unwrap_envelope")]
    pub position: Point,
    /// Maximum pixel distance from the centroid (the square's half-diagonal).
    pub radius: f64,
    /// Direction in radians, in (-pi, pi]. `None` until estimated.
    #[serde(default)]
    pub orientation: Option<f64>,
}

impl Marker {
    /// Create an unoriented marker.
    pub fn new(position: Point, radius: f64) -> Self {
        Self {
            position,
            radius,
            orientation: None,
        }
    }

    /// Builder-style variant of [`Marker::set_orientation`]; `None` for a
    /// non-finite angle.
    pub fn with_orientation(mut self, angle: f64) -> Option<Self> {
        self.set_orientation(angle).then_some(self)
    }

    /// Set the orientation, normalised to (-pi, pi].
    ///
    /// Returns `false` and leaves the marker untouched for non-finite angles.
    pub fn set_orientation(&mut self, angle: f64) -> bool {
        if !angle.is_finite() {
            return false;
        }
        self.orientation = Some(normalize_angle(angle));
        true
    }

    /// Point the marker at `target`, the way a user drags the orientation
    /// arrow toward the cursor. Returns `false` if `target` coincides with the
    /// marker position (direction undefined) or is not finite.
    pub fn orient_towards(&mut self, target: Point) -> bool {
        let dx = target.x - self.position.x;
        let dy = target.y - self.position.y;
        if !dx.is_finite() || !dy.is_finite() || (dx == 0.0 && dy == 0.0) {
            return false;
        }
        self.set_orientation(dy.atan2(dx))
    }
}

/// Wrap an angle into (-pi, pi].
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn normalize_angle_wraps_into_half_open_range() {
        assert_abs_diff_eq!(normalize_angle(3.0 * PI), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_angle(-PI), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_angle(-FRAC_PI_2), -FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_angle(5.0 * FRAC_PI_2), FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn orient_towards_only_touches_orientation() {
        let mut m = Marker::new(Point::new(3.0, 4.0), 2.5);
        assert!(m.orient_towards(Point::new(3.0, 10.0)));
        assert_eq!(m.position, Point::new(3.0, 4.0));
        assert_eq!(m.radius, 2.5);
        assert_abs_diff_eq!(m.orientation.unwrap(), FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn orient_towards_self_is_rejected() {
        let mut m = Marker::new(Point::new(1.0, 1.0), 1.0)
            .with_orientation(0.5)
            .unwrap();
        assert!(!m.orient_towards(Point::new(1.0, 1.0)));
        assert_eq!(m.orientation, Some(0.5));
    }

    #[test]
    fn set_orientation_rejects_non_finite() {
        let mut m = Marker::new(Point::new(0.0, 0.0), 1.0);
        assert!(!m.set_orientation(f64::NAN));
        assert!(!m.set_orientation(f64::INFINITY));
        assert_eq!(m.orientation, None);
    }

    #[test]
    fn with_orientation_rejects_non_finite() {
        let m = Marker::new(Point::new(0.0, 0.0), 1.0);
        assert!(m.clone().with_orientation(f64::NAN).is_none());
        assert!(m.clone().with_orientation(f64::NEG_INFINITY).is_none());
        let oriented = m.with_orientation(3.0 * PI).unwrap();
        assert_abs_diff_eq!(oriented.orientation.unwrap(), PI, epsilon = 1e-12);
    }

    #[test]
    fn unset_orientation_serializes_as_null() {
        let m = Marker::new(Point::new(1.5, -2.0), 3.0);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(
            json,
            r#"{"position":{"x":1.5,"y":-2.0},"radius":3.0,"orientation":null}"#
        );
        let missing: Marker =
            serde_json::from_str(r#"{"position":{"x":0.0,"y":0.0},"radius":1.0}"#).unwrap();
        assert_eq!(missing.orientation, None);
    }
}
